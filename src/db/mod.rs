pub mod connection;
pub mod listings;

pub use connection::{init_db, Database};
pub use listings::{get_listing, insert_listing, load_all_listings, seed_demo_listings, NewListing};
