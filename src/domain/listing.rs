use crate::errors::RecordError;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Apartment,
    House,
    Room,
    Studio,
    Condo,
    #[serde(other)]
    Other,
}

impl PropertyType {
    /// Case-insensitive; anything unrecognised becomes `Other`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "apartment" => PropertyType::Apartment,
            "house" => PropertyType::House,
            "room" => PropertyType::Room,
            "studio" => PropertyType::Studio,
            "condo" => PropertyType::Condo,
            _ => PropertyType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartment",
            PropertyType::House => "house",
            PropertyType::Room => "room",
            PropertyType::Studio => "studio",
            PropertyType::Condo => "condo",
            PropertyType::Other => "other",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            PropertyType::Apartment => "apartments",
            PropertyType::House => "houses",
            PropertyType::Room => "rooms",
            PropertyType::Studio => "studios",
            PropertyType::Condo => "condos",
            PropertyType::Other => "listings",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bedroom or bathroom count. Multi-unit buildings advertise a range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomCount<T> {
    Exact(T),
    Range { min: T, max: T },
}

impl<T: Copy + Into<f64>> RoomCount<T> {
    /// Inclusive (min, max), widened to f64 so beds and baths compare alike.
    pub fn bounds(&self) -> (f64, f64) {
        match *self {
            RoomCount::Exact(n) => (n.into(), n.into()),
            RoomCount::Range { min, max } => (min.into(), max.into()),
        }
    }

    /// A count the matcher can work with: finite, non-negative, and a range
    /// that isn't reversed. `what` names the count in the error.
    pub fn check(&self, what: &str) -> Result<(), String> {
        let (min, max) = self.bounds();
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(format!("{what} count must be a non-negative number"));
        }
        if min > max {
            return Err(format!("{what} range {min}-{max} is reversed"));
        }
        Ok(())
    }
}

/// Monthly rent must be a finite, non-negative amount.
pub fn check_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price < 0.0 {
        return Err(format!("price {price} is not a valid amount"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: String,
    pub phone: Option<String>,
}

/// One housing unit as read from the listing store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub address: String,
    /// Neighbourhood or city, when the poster gave one.
    pub location: Option<String>,
    pub price: f64,
    pub bedrooms: RoomCount<u32>,
    pub bathrooms: RoomCount<f64>,
    pub square_feet: Option<u32>,
    pub property_type: PropertyType,
    pub amenities: BTreeSet<String>,
    pub available_date: Option<NaiveDate>,
    pub contact: ContactInfo,
    pub created_at: NaiveDateTime,
}

impl ListingRecord {
    /// Checks the invariants the matcher relies on: price >= 0 and
    /// well-formed, non-negative room counts.
    pub fn validate(&self) -> Result<(), RecordError> {
        let invalid = |reason: String| RecordError::Invalid {
            id: self.id,
            reason,
        };

        check_price(self.price).map_err(invalid)?;
        self.bedrooms.check("bedroom").map_err(invalid)?;
        self.bathrooms.check("bathroom").map_err(invalid)?;

        Ok(())
    }

    /// Address plus location text, lowercased, for keyword lookups.
    pub fn searchable_place(&self) -> String {
        match &self.location {
            Some(loc) => format!("{} {}", self.address, loc).to_lowercase(),
            None => self.address.to_lowercase(),
        }
    }
}
