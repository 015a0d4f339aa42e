// src/tests/matching_tests/ranking_tests.rs

use crate::domain::{PropertyType, RoomCount};
use crate::errors::MatchError;
use crate::matching::scoring::{room_fit, score_listing};
use crate::matching::{
    interpret, FallbackPolicy, ListingMatcher, MatchReason, MatchResult, MatcherConfig,
};
use crate::tests::utils::{amenities, listing};

fn ids(matches: &[MatchResult<'_>]) -> Vec<i64> {
    matches.iter().map(|m| m.listing.id).collect()
}

fn score_of(query: &str, record: &crate::domain::ListingRecord) -> f64 {
    score_listing(&interpret(query), record).total
}

const SCENARIO: &str = "2 bedroom apartment under $1500 near Riverside with parking";

#[test]
fn scenario_listing_beats_pricier_listing_elsewhere() {
    let mut good = listing(1);
    good.price = 1400.0;
    good.bedrooms = RoomCount::Exact(2);
    good.property_type = PropertyType::Apartment;
    good.address = "123 Riverside Ave".to_string();
    good.amenities = amenities(&["parking", "laundry"]);

    let mut worse = good.clone();
    worse.id = 2;
    worse.price = 1800.0;
    worse.address = "456 Oak St".to_string();
    worse.amenities = amenities(&[]);

    assert!(score_of(SCENARIO, &good) > score_of(SCENARIO, &worse));

    let listings = vec![worse, good];
    let matches = ListingMatcher::default()
        .find_matches(SCENARIO, &listings, 5)
        .unwrap();
    assert_eq!(ids(&matches), vec![1, 2]);
    assert!(matches[0]
        .reasons
        .contains(&MatchReason::Location { keyword: "riverside".into() }));
}

#[test]
fn empty_query_and_empty_listings_is_not_an_error() {
    let matches = ListingMatcher::default().find_matches("", &[], 5).unwrap();
    assert!(matches.is_empty());
}

#[test]
fn zero_top_n_is_rejected() {
    let listings = vec![listing(1)];
    let err = ListingMatcher::default()
        .find_matches("apartment", &listings, 0)
        .unwrap_err();
    assert!(matches!(err, MatchError::InvalidArgument(_)));
}

#[test]
fn same_input_same_output() {
    let listings: Vec<_> = (1..=8)
        .map(|id| {
            let mut l = listing(id);
            l.price = 800.0 + (id as f64) * 150.0;
            l.bedrooms = RoomCount::Exact((id % 4) as u32);
            l
        })
        .collect();
    let matcher = ListingMatcher::default();

    let first = matcher.find_matches("2 bed under $1400", &listings, 5).unwrap();
    let second = matcher.find_matches("2 bed under $1400", &listings, 5).unwrap();

    assert_eq!(ids(&first), ids(&second));
    let scores: Vec<f64> = first.iter().map(|m| m.score).collect();
    let again: Vec<f64> = second.iter().map(|m| m.score).collect();
    assert_eq!(scores, again);
}

#[test]
fn larger_top_n_only_extends_the_ranking() {
    let listings: Vec<_> = (1..=6)
        .map(|id| {
            let mut l = listing(id);
            l.price = 900.0 + (id as f64) * 100.0;
            l
        })
        .collect();
    let matcher = ListingMatcher::default();

    let full = ids(&matcher.find_matches("apartment under $1200", &listings, 6).unwrap());
    for n in 1..=6 {
        let partial = ids(&matcher.find_matches("apartment under $1200", &listings, n).unwrap());
        assert_eq!(partial.as_slice(), &full[..n.min(full.len())]);
    }
}

#[test]
fn over_budget_is_penalised_but_not_excluded() {
    let mut at_max = listing(1);
    at_max.price = 1500.0;
    at_max.address = "1 Riverside Ave".into();

    let mut over = at_max.clone();
    over.id = 2;
    over.price = 2250.0;

    let query = "under $1500 near Riverside";
    assert!(score_of(query, &at_max) >= score_of(query, &over));

    let listings = vec![at_max, over];
    let matches = ListingMatcher::default()
        .find_matches(query, &listings, 5)
        .unwrap();
    // 2 for location, minus 1.5 for being 50% over: still positive.
    assert_eq!(ids(&matches), vec![1, 2]);
    assert!((matches[1].score - 0.5).abs() < 1e-9);
}

#[test]
fn penalty_is_capped_at_three_points() {
    let mut far_over = listing(1);
    far_over.price = 10_000.0;
    let card = score_listing(&interpret("under $1000"), &far_over);
    assert_eq!(card.price_fit, -3.0);
}

#[test]
fn below_the_floor_is_penalised_like_above_the_ceiling() {
    let mut l = listing(1);
    l.price = 1500.0;

    let card = score_listing(&interpret("something over $2000"), &l);
    // 500 short of a 2000 floor: 500 / 2000 * 3.
    assert!((card.price_fit + 0.75).abs() < 1e-9);
    assert!((card.total + 0.75).abs() < 1e-9);
}

#[test]
fn price_inside_a_range_counts_once() {
    let mut l = listing(1);
    l.price = 1200.0;

    let card = score_listing(&interpret("between $1000 and $1500"), &l);
    assert_eq!(card.price_fit, 3.0);
    assert_eq!(card.total, 3.0);
    let price_reasons = card
        .reasons
        .iter()
        .filter(|r| matches!(r, MatchReason::Price { .. }))
        .count();
    assert_eq!(price_reasons, 1);
}

#[test]
fn extra_matched_amenity_never_lowers_the_score() {
    let query = "apartment with parking, a gym and a pool";
    let mut base = listing(1);
    base.amenities = amenities(&["Parking"]);

    let mut richer = base.clone();
    richer.amenities = amenities(&["Parking", "Fitness Center"]);

    let mut unrelated = base.clone();
    unrelated.amenities = amenities(&["Parking", "Rooftop Deck"]);

    assert!(score_of(query, &richer) > score_of(query, &base));
    assert_eq!(score_of(query, &unrelated), score_of(query, &base));
}

#[test]
fn equal_scores_without_budget_fall_back_to_id_order() {
    let mut a = listing(7);
    a.amenities = amenities(&["parking"]);
    let mut b = listing(3);
    b.amenities = amenities(&["parking"]);
    let mut c = listing(5);
    c.amenities = amenities(&["parking"]);

    let listings = vec![a, b, c];
    let matches = ListingMatcher::default()
        .find_matches("anything with parking", &listings, 5)
        .unwrap();
    assert_eq!(ids(&matches), vec![3, 5, 7]);
}

#[test]
fn equal_scores_prefer_better_price_fit() {
    let query = "2 bedroom under $1000 near Riverside with parking and laundry";

    let mut pricey = listing(1);
    pricey.price = 2000.0;
    pricey.bedrooms = RoomCount::Exact(2);
    pricey.address = "9 Riverside Ave".into();
    pricey.amenities = amenities(&["parking", "laundry"]);

    let mut cheap = listing(2);
    cheap.price = 900.0;
    cheap.bedrooms = RoomCount::Exact(5);
    cheap.address = "9 Oak St".into();

    assert_eq!(score_of(query, &pricey), score_of(query, &cheap));

    let listings = vec![pricey, cheap];
    let matches = ListingMatcher::default()
        .find_matches(query, &listings, 5)
        .unwrap();
    assert_eq!(ids(&matches), vec![2, 1]);
}

#[test]
fn equal_scores_prefer_price_closer_to_budget() {
    let mut far = listing(1);
    far.price = 1000.0;
    let mut close = listing(2);
    close.price = 1450.0;

    let listings = vec![far, close];
    let matches = ListingMatcher::default()
        .find_matches("under $1500", &listings, 5)
        .unwrap();
    assert_eq!(ids(&matches), vec![2, 1]);
}

#[test]
fn room_counts_give_partial_credit_when_off_by_one() {
    assert_eq!(room_fit(&RoomCount::Exact(2u32), &RoomCount::Exact(2u32)), 2.0);
    assert_eq!(room_fit(&RoomCount::Exact(2u32), &RoomCount::Exact(3u32)), 1.0);
    assert_eq!(room_fit(&RoomCount::Exact(2u32), &RoomCount::Exact(4u32)), 0.0);
    assert_eq!(
        room_fit(&RoomCount::Exact(2u32), &RoomCount::Range { min: 1u32, max: 3u32 }),
        2.0
    );
    assert_eq!(room_fit(&RoomCount::Exact(2.0), &RoomCount::Exact(1.5)), 1.0);
}

#[test]
fn property_type_mismatch_costs_a_point() {
    let mut house = listing(1);
    house.property_type = PropertyType::House;
    assert_eq!(score_of("apartment", &house), -1.0);
    assert_eq!(score_of("house", &house), 2.0);
    assert_eq!(score_of("", &house), 0.0);
}

#[test]
fn malformed_listings_are_skipped_not_fatal() {
    let mut broken = listing(1);
    broken.price = -50.0;
    let mut fine = listing(2);
    fine.amenities = amenities(&["pool"]);

    let listings = vec![broken, fine];
    let matches = ListingMatcher::default()
        .find_matches("with a pool", &listings, 5)
        .unwrap();
    assert_eq!(ids(&matches), vec![2]);
}

#[test]
fn nothing_matching_falls_back_to_most_recent() {
    // listing(id) is created `id` days after the epoch used in the helper.
    let listings: Vec<_> = (1..=4).map(listing).collect();
    let matches = ListingMatcher::default()
        .find_matches("zzz", &listings, 2)
        .unwrap();

    assert_eq!(ids(&matches), vec![4, 3]);
    assert!(matches.iter().all(|m| m.is_fallback()));
}

#[test]
fn fallback_can_be_switched_off() {
    let listings: Vec<_> = (1..=4).map(listing).collect();
    let matcher = ListingMatcher::new(MatcherConfig {
        fallback: FallbackPolicy::None,
    });
    assert!(matcher.find_matches("zzz", &listings, 2).unwrap().is_empty());
}

#[test]
fn answer_truncates_for_display_and_hides_scores_unless_asked() {
    let listings: Vec<_> = (1..=6)
        .map(|id| {
            let mut l = listing(id);
            l.amenities = amenities(&["gym"]);
            l
        })
        .collect();
    let matcher = ListingMatcher::default();

    let reply = matcher.answer("gym", &listings, 5, 3, false).unwrap();
    assert_eq!(reply.listings.len(), 3);
    assert!(reply.matches.is_none());
    let json = serde_json::to_value(&reply).unwrap();
    assert!(json.get("matches").is_none());

    let reply = matcher.answer("gym", &listings, 5, 3, true).unwrap();
    let diagnostics = reply.matches.unwrap();
    assert_eq!(diagnostics.len(), 5);
    assert_eq!(diagnostics[0].score, 1.0);

    assert!(matcher.answer("gym", &listings, 5, 0, false).is_err());
}
