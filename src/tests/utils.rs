use crate::config::Config;
use crate::db::connection::{init_db, Database};
use crate::db::seed_demo_listings;
use crate::domain::{ContactInfo, ListingRecord, PropertyType, RoomCount};
use crate::matching::{ListingMatcher, MatcherConfig};
use crate::router::App;
use astra::{Body, Request, Response};
use http::Method;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Returns a fresh test database using the production schema
pub fn make_db(prefix: &str) -> Database {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let path = std::env::temp_dir().join(format!(
        "{prefix}_{}_{}_{nanos}.sqlite",
        std::process::id(),
        DB_COUNTER.fetch_add(1, Ordering::SeqCst)
    ));
    let db = Database::new(path.to_string_lossy().into_owned());
    init_db(&db, "sql/schema.sql").expect("Failed to initialize DB");
    db
}

pub fn make_app(db: Database) -> App {
    let config = Config::default();
    App {
        db,
        matcher: ListingMatcher::new(MatcherConfig {
            fallback: config.match_fallback,
        }),
        config,
    }
}

/// A plain one-bed apartment; tests override what they care about.
pub fn listing(id: i64) -> ListingRecord {
    ListingRecord {
        id,
        title: format!("Listing {id}"),
        description: "A place to live.".to_string(),
        address: format!("{id} Elm St"),
        location: None,
        price: 1000.0,
        bedrooms: RoomCount::Exact(1),
        bathrooms: RoomCount::Exact(1.0),
        square_feet: Some(700),
        property_type: PropertyType::Apartment,
        amenities: BTreeSet::new(),
        available_date: None,
        contact: ContactInfo {
            email: format!("owner{id}@example.com"),
            phone: None,
        },
        created_at: NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
            + chrono::Duration::days(id),
    }
}

pub fn amenities(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn body_string(mut resp: Response) -> String {
    let mut body_bytes = Vec::new();
    resp.body_mut()
        .reader()
        .read_to_end(&mut body_bytes)
        .unwrap();
    String::from_utf8(body_bytes).unwrap()
}

pub fn body_json(resp: Response) -> serde_json::Value {
    serde_json::from_str(&body_string(resp)).expect("response body is not JSON")
}

pub fn get(path: &str) -> Request {
    let mut req = Request::new(Body::from(String::new()));
    *req.uri_mut() = path.parse().unwrap();
    req
}

pub fn post_json(path: &str, body: &str) -> Request {
    let mut req = Request::new(Body::from(body.to_string()));
    *req.method_mut() = Method::POST;
    *req.uri_mut() = path.parse().unwrap();
    req.headers_mut()
        .insert("Content-Type", "application/json".parse().unwrap());
    req
}

/// App over a fresh database holding the six demo listings.
pub fn seeded_app(prefix: &str) -> App {
    let db = make_db(prefix);
    seed_demo_listings(&db, "sql/seed.sql").expect("Failed to seed DB");
    make_app(db)
}
