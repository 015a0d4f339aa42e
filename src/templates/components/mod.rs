pub mod card;

pub use card::{listing_card, rooms_label};
