pub mod intent;
pub mod listing;

pub use intent::Intent;
pub use listing::{ContactInfo, ListingRecord, PropertyType, RoomCount};
