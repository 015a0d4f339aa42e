use crate::db::connection::Database;
use crate::domain::listing::check_price;
use crate::domain::{ContactInfo, ListingRecord, PropertyType, RoomCount};
use crate::errors::{RecordError, ServerError};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;

const SELECT_LISTINGS: &str = r#"
    SELECT id, title, description, address, location, price,
           bedrooms, bathrooms, is_multi_unit,
           min_bedrooms, max_bedrooms, min_bathrooms, max_bathrooms,
           square_feet, property_type, available_date,
           contact_email, contact_phone, created_at
    FROM listings
"#;

const SELECT_AMENITIES: &str = r#"
    SELECT la.listing_id, a.name
    FROM listing_amenities la
    JOIN amenities a ON a.id = la.amenity_id
"#;

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A `listings` row exactly as stored. Nothing is trusted until it has been
/// converted into a `ListingRecord`.
#[derive(Debug)]
struct ListingRow {
    id: i64,
    title: Option<String>,
    description: Option<String>,
    address: Option<String>,
    location: Option<String>,
    price: Option<f64>,
    bedrooms: Option<i64>,
    bathrooms: Option<f64>,
    is_multi_unit: bool,
    min_bedrooms: Option<i64>,
    max_bedrooms: Option<i64>,
    min_bathrooms: Option<f64>,
    max_bathrooms: Option<f64>,
    square_feet: Option<i64>,
    property_type: Option<String>,
    available_date: Option<String>,
    contact_email: Option<String>,
    contact_phone: Option<String>,
    created_at: Option<String>,
}

impl ListingRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            address: row.get(3)?,
            location: row.get(4)?,
            price: row.get(5)?,
            bedrooms: row.get(6)?,
            bathrooms: row.get(7)?,
            is_multi_unit: row.get::<_, Option<bool>>(8)?.unwrap_or(false),
            min_bedrooms: row.get(9)?,
            max_bedrooms: row.get(10)?,
            min_bathrooms: row.get(11)?,
            max_bathrooms: row.get(12)?,
            square_feet: row.get(13)?,
            property_type: row.get(14)?,
            available_date: row.get(15)?,
            contact_email: row.get(16)?,
            contact_phone: row.get(17)?,
            created_at: row.get(18)?,
        })
    }

    fn into_record(self, amenities: BTreeSet<String>) -> Result<ListingRecord, RecordError> {
        let id = self.id;
        let missing = |field: &'static str| RecordError::MissingField { id, field };
        let invalid = |reason: String| RecordError::Invalid { id, reason };

        let to_u32 = |value: i64, field: &str| {
            u32::try_from(value).map_err(|_| invalid(format!("{field} {value} out of range")))
        };

        // Multi-unit listings carry a min/max range; everything else a single count.
        let bedrooms = match (self.is_multi_unit, self.min_bedrooms, self.max_bedrooms, self.bedrooms) {
            (true, Some(min), Some(max), _) => RoomCount::Range {
                min: to_u32(min, "min_bedrooms")?,
                max: to_u32(max, "max_bedrooms")?,
            },
            (_, _, _, Some(n)) => RoomCount::Exact(to_u32(n, "bedrooms")?),
            (_, Some(min), Some(max), None) => RoomCount::Range {
                min: to_u32(min, "min_bedrooms")?,
                max: to_u32(max, "max_bedrooms")?,
            },
            _ => return Err(missing("bedrooms")),
        };

        let bathrooms = match (self.is_multi_unit, self.min_bathrooms, self.max_bathrooms, self.bathrooms) {
            (true, Some(min), Some(max), _) => RoomCount::Range { min, max },
            (_, _, _, Some(n)) => RoomCount::Exact(n),
            (_, Some(min), Some(max), None) => RoomCount::Range { min, max },
            _ => return Err(missing("bathrooms")),
        };

        let square_feet = self
            .square_feet
            .map(|sq| to_u32(sq, "square_feet"))
            .transpose()?;

        let available_date = self
            .available_date
            .filter(|d| !d.trim().is_empty())
            .map(|d| {
                NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
                    .map_err(|e| invalid(format!("available_date `{d}`: {e}")))
            })
            .transpose()?;

        let created_raw = self.created_at.ok_or_else(|| missing("created_at"))?;
        let created_at = parse_timestamp(&created_raw)
            .ok_or_else(|| invalid(format!("created_at `{created_raw}` is not a timestamp")))?;

        let record = ListingRecord {
            id,
            title: self.title.ok_or_else(|| missing("title"))?,
            description: self.description.unwrap_or_default(),
            address: self.address.ok_or_else(|| missing("address"))?,
            location: self.location.filter(|l| !l.trim().is_empty()),
            price: self.price.ok_or_else(|| missing("price"))?,
            bedrooms,
            bathrooms,
            square_feet,
            property_type: self
                .property_type
                .as_deref()
                .map_or(PropertyType::Other, PropertyType::parse),
            amenities,
            available_date,
            contact: ContactInfo {
                email: self.contact_email.ok_or_else(|| missing("contact_email"))?,
                phone: self.contact_phone.filter(|p| !p.trim().is_empty()),
            },
            created_at,
        };

        record.validate()?;
        Ok(record)
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn amenities_by_listing(
    conn: &Connection,
    listing_id: Option<i64>,
) -> Result<HashMap<i64, BTreeSet<String>>, ServerError> {
    let sql = match listing_id {
        Some(_) => format!("{SELECT_AMENITIES} WHERE la.listing_id = ?1"),
        None => SELECT_AMENITIES.to_string(),
    };

    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let map_row = |row: &Row<'_>| -> rusqlite::Result<(i64, String)> {
        Ok((row.get(0)?, row.get(1)?))
    };
    let rows = match listing_id {
        Some(id) => stmt.query_map(params![id], map_row),
        None => stmt.query_map([], map_row),
    }
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out: HashMap<i64, BTreeSet<String>> = HashMap::new();
    for r in rows {
        let (id, name) = r.map_err(|e| ServerError::DbError(e.to_string()))?;
        out.entry(id).or_default().insert(name);
    }
    Ok(out)
}

/// Every listing that decodes cleanly, ordered by id. Rows with missing or
/// nonsensical required fields are logged and left out rather than failing
/// the whole load.
pub fn load_all_listings(db: &Database) -> Result<Vec<ListingRecord>, ServerError> {
    db.with_conn(|conn| {
        let mut amenities = amenities_by_listing(conn, None)?;

        let mut stmt = conn
            .prepare(&format!("{SELECT_LISTINGS} ORDER BY id"))
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map([], ListingRow::from_row)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for r in rows {
            let row = r.map_err(|e| ServerError::DbError(e.to_string()))?;
            let names = amenities.remove(&row.id).unwrap_or_default();
            match row.into_record(names) {
                Ok(record) => out.push(record),
                Err(e) => tracing::warn!(error = %e, "skipping listing row"),
            }
        }
        Ok(out)
    })
}

/// `Ok(None)` both when the id doesn't exist and when the row is malformed.
pub fn get_listing(db: &Database, id: i64) -> Result<Option<ListingRecord>, ServerError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                &format!("{SELECT_LISTINGS} WHERE id = ?1"),
                params![id],
                ListingRow::from_row,
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let names = amenities_by_listing(conn, Some(id))?
            .remove(&id)
            .unwrap_or_default();

        match row.into_record(names) {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                tracing::warn!(error = %e, "listing row is malformed");
                Ok(None)
            }
        }
    })
}

/// Fields a poster supplies; id and timestamps are assigned on insert.
#[derive(Debug, Clone, Deserialize)]
pub struct NewListing {
    pub title: String,
    pub description: String,
    pub address: String,
    pub location: Option<String>,
    pub price: f64,
    pub bedrooms: RoomCount<u32>,
    pub bathrooms: RoomCount<f64>,
    pub square_feet: Option<u32>,
    pub property_type: PropertyType,
    #[serde(default)]
    pub amenities: Vec<String>,
    pub available_date: Option<NaiveDate>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

impl NewListing {
    /// The same checks a stored listing has to pass before it can be matched.
    pub fn validate(&self) -> Result<(), String> {
        check_price(self.price)?;
        self.bedrooms.check("bedroom")?;
        self.bathrooms.check("bathroom")
    }
}

pub fn insert_listing(db: &Database, listing: &NewListing) -> Result<i64, ServerError> {
    insert_listing_at(db, listing, Utc::now().naive_utc())
}

/// Inserts a listing with an explicit creation time and links its amenities,
/// creating amenity rows as needed. Returns the new id.
pub fn insert_listing_at(
    db: &Database,
    listing: &NewListing,
    created_at: NaiveDateTime,
) -> Result<i64, ServerError> {
    listing.validate().map_err(ServerError::BadRequest)?;

    let stamp = created_at.format(DATETIME_FORMAT).to_string();
    let (bedrooms, min_bedrooms, max_bedrooms, is_multi_unit) = match listing.bedrooms {
        RoomCount::Exact(n) => (Some(n), None, None, false),
        RoomCount::Range { min, max } => (None, Some(min), Some(max), true),
    };
    let (bathrooms, min_bathrooms, max_bathrooms) = match listing.bathrooms {
        RoomCount::Exact(n) => (Some(n), None, None),
        RoomCount::Range { min, max } => (None, Some(min), Some(max)),
    };
    let is_multi_unit = is_multi_unit || min_bathrooms.is_some();

    db.with_conn(|conn| {
        let tx = conn
            .transaction()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        tx.execute(
            r#"
            INSERT INTO listings (
                title, description, address, location, price,
                bedrooms, bathrooms, is_multi_unit,
                min_bedrooms, max_bedrooms, min_bathrooms, max_bathrooms,
                square_feet, property_type, available_date,
                contact_email, contact_phone, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?18, ?18
            )
            "#,
            params![
                listing.title,
                listing.description,
                listing.address,
                listing.location,
                listing.price,
                bedrooms,
                bathrooms,
                is_multi_unit,
                min_bedrooms,
                max_bedrooms,
                min_bathrooms,
                max_bathrooms,
                listing.square_feet,
                listing.property_type.as_str(),
                listing.available_date.map(|d| d.format("%Y-%m-%d").to_string()),
                listing.contact_email,
                listing.contact_phone,
                stamp,
            ],
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

        let listing_id = tx.last_insert_rowid();

        for name in listing.amenities.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            tx.execute(
                "INSERT INTO amenities (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
                params![name],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;

            tx.execute(
                r#"
                INSERT OR IGNORE INTO listing_amenities (listing_id, amenity_id)
                SELECT ?1, id FROM amenities WHERE name = ?2
                "#,
                params![listing_id, name],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;
        }

        tx.commit()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        tracing::info!(listing_id, title = %listing.title, "listing inserted");
        Ok(listing_id)
    })
}

/// Applies the demo seed file when the store is empty. Returns how many
/// listings the store holds afterwards.
pub fn seed_demo_listings(db: &Database, seed_path: &str) -> Result<i64, ServerError> {
    let existing = count_listings(db)?;
    if existing > 0 {
        tracing::info!(existing, "listings present, skipping demo seed");
        return Ok(existing);
    }

    let seed_sql = fs::read_to_string(seed_path)
        .map_err(|e| ServerError::DbError(format!("Failed to read seed file: {e}")))?;

    db.with_conn(|conn| {
        conn.execute_batch(&seed_sql)
            .map_err(|e| ServerError::DbError(format!("Failed to apply seed: {e}")))
    })?;

    let seeded = count_listings(db)?;
    tracing::info!(seeded, seed = seed_path, "demo listings seeded");
    Ok(seeded)
}

pub fn count_listings(db: &Database) -> Result<i64, ServerError> {
    db.with_conn(|conn| {
        conn.query_row("SELECT COUNT(*) FROM listings", [], |row| row.get(0))
            .map_err(|e| ServerError::DbError(e.to_string()))
    })
}
