// src/matching/scoring.rs

use crate::domain::{Intent, ListingRecord, RoomCount};
use crate::matching::interpreter::canonical_amenity;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;

const PRICE_FIT: f64 = 3.0;
const MAX_PRICE_PENALTY: f64 = 3.0;
const ROOM_EXACT: f64 = 2.0;
const ROOM_OFF_BY_ONE: f64 = 1.0;
const AMENITY_MATCH: f64 = 1.0;
const TYPE_MATCH: f64 = 2.0;
const TYPE_MISMATCH: f64 = -1.0;
const LOCATION_MATCH: f64 = 2.0;

/// Which part of the query a listing satisfied, and how much it counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum MatchReason {
    Price { points: f64 },
    Bedrooms { points: f64 },
    Bathrooms { points: f64 },
    Amenity { name: String },
    PropertyType { points: f64 },
    Location { keyword: String },
    /// Nothing matched; the listing is shown because it is recent.
    RecentFallback,
}

/// Everything the ranking needs to know about one listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreCard {
    pub total: f64,
    /// Price sub-score, the first tie-breaker.
    pub price_fit: f64,
    /// Distance from the stated budget, the second tie-breaker.
    pub budget_gap: f64,
    pub reasons: Vec<MatchReason>,
}

/// Over-budget listings lose up to 3 points in proportion to how far past
/// the bound they are. A zero bound takes the full penalty.
fn bound_penalty(gap: f64, bound: f64) -> f64 {
    if bound <= 0.0 {
        return MAX_PRICE_PENALTY;
    }
    (gap / bound * MAX_PRICE_PENALTY).min(MAX_PRICE_PENALTY)
}

pub fn price_fit(intent: &Intent, price: f64) -> f64 {
    if !intent.has_price() {
        return 0.0;
    }
    if let Some(max) = intent.max_price {
        if price > max {
            return -bound_penalty(price - max, max);
        }
    }
    if let Some(min) = intent.min_price {
        if price < min {
            return -bound_penalty(min - price, min);
        }
    }
    PRICE_FIT
}

/// Interval comparison: any overlap is a full match, a gap of at most one
/// room earns partial credit, anything further earns nothing.
pub fn room_fit<W, H>(wanted: &RoomCount<W>, have: &RoomCount<H>) -> f64
where
    W: Copy + Into<f64>,
    H: Copy + Into<f64>,
{
    let (want_min, want_max) = wanted.bounds();
    let (have_min, have_max) = have.bounds();

    let gap = if want_max < have_min {
        have_min - want_max
    } else if have_max < want_min {
        want_min - have_max
    } else {
        0.0
    };

    if gap == 0.0 {
        ROOM_EXACT
    } else if gap <= 1.0 {
        ROOM_OFF_BY_ONE
    } else {
        0.0
    }
}

pub fn score_listing(intent: &Intent, listing: &ListingRecord) -> ScoreCard {
    let mut total = 0.0;
    let mut reasons = Vec::new();

    let price_points = price_fit(intent, listing.price);
    if price_points != 0.0 {
        total += price_points;
        reasons.push(MatchReason::Price {
            points: price_points,
        });
    }

    if let Some(wanted) = &intent.bedrooms {
        let points = room_fit(wanted, &listing.bedrooms);
        if points > 0.0 {
            total += points;
            reasons.push(MatchReason::Bedrooms { points });
        }
    }

    if let Some(wanted) = &intent.bathrooms {
        let points = room_fit(wanted, &listing.bathrooms);
        if points > 0.0 {
            total += points;
            reasons.push(MatchReason::Bathrooms { points });
        }
    }

    if !intent.amenities.is_empty() {
        let offered: BTreeSet<String> = listing
            .amenities
            .iter()
            .map(|a| canonical_amenity(a))
            .collect();
        for name in intent.amenities.iter().filter(|a| offered.contains(*a)) {
            total += AMENITY_MATCH;
            reasons.push(MatchReason::Amenity { name: name.clone() });
        }
    }

    if let Some(wanted) = intent.property_type {
        let points = if listing.property_type == wanted {
            TYPE_MATCH
        } else {
            TYPE_MISMATCH
        };
        total += points;
        reasons.push(MatchReason::PropertyType { points });
    }

    if !intent.locations.is_empty() {
        let place = listing.searchable_place();
        if let Some(keyword) = intent.locations.iter().find(|k| place.contains(k.as_str())) {
            total += LOCATION_MATCH;
            reasons.push(MatchReason::Location {
                keyword: keyword.clone(),
            });
        }
    }

    let budget_gap = intent
        .budget_reference()
        .map_or(0.0, |budget| (listing.price - budget).abs());

    ScoreCard {
        total,
        price_fit: price_points,
        budget_gap,
        reasons,
    }
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// The fields listings are ordered by.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankKey {
    pub total: f64,
    pub price_fit: f64,
    pub budget_gap: f64,
    pub id: i64,
}

impl RankKey {
    /// Best first: higher total, then higher price fit, then closer to the
    /// budget, then lower id.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        cmp_f64(other.total, self.total)
            .then_with(|| cmp_f64(other.price_fit, self.price_fit))
            .then_with(|| cmp_f64(self.budget_gap, other.budget_gap))
            .then_with(|| self.id.cmp(&other.id))
    }
}
