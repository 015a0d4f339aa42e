use crate::domain::listing::{PropertyType, RoomCount};
use std::collections::BTreeSet;

/// What a user asked for, as far as the interpreter could tell.
/// Every field is optional; an absent field means "unconstrained".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Intent {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<RoomCount<u32>>,
    pub bathrooms: Option<RoomCount<f64>>,
    pub amenities: BTreeSet<String>,
    pub property_type: Option<PropertyType>,
    pub locations: BTreeSet<String>,
    pub raw_text: String,
}

impl Intent {
    pub fn has_price(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    /// True when nothing at all was extracted.
    pub fn is_empty(&self) -> bool {
        !self.has_price()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.amenities.is_empty()
            && self.property_type.is_none()
            && self.locations.is_empty()
    }

    /// The amount ties are measured against: the ceiling if there is one,
    /// otherwise the floor.
    pub fn budget_reference(&self) -> Option<f64> {
        self.max_price.or(self.min_price)
    }
}
