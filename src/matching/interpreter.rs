// src/matching/interpreter.rs
//
// Turns a free-text chat message into an `Intent`. Each category (price,
// bedrooms, ...) is handled by its own `Extractor`. Within a category the
// earliest match in the text wins; categories never look at each other.

use crate::domain::{Intent, PropertyType, RoomCount};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::BTreeSet;

/// The message in the two shapes extractors need.
pub struct Query<'a> {
    /// Original text, case preserved (capitalised place names).
    pub raw: &'a str,
    /// See [`normalize`].
    pub normalized: String,
}

impl<'a> Query<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            normalized: normalize(raw),
        }
    }
}

/// A structured piece of intent produced by one extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Price { min: Option<f64>, max: Option<f64> },
    Bedrooms(RoomCount<u32>),
    Bathrooms(RoomCount<f64>),
    Amenities(BTreeSet<String>),
    PropertyType(PropertyType),
    Locations(BTreeSet<String>),
}

impl Fragment {
    fn merge_into(self, intent: &mut Intent) {
        match self {
            Fragment::Price { min, max } => {
                intent.min_price = min;
                intent.max_price = max;
            }
            Fragment::Bedrooms(count) => intent.bedrooms = Some(count),
            Fragment::Bathrooms(count) => intent.bathrooms = Some(count),
            Fragment::Amenities(names) => intent.amenities.extend(names),
            Fragment::PropertyType(kind) => intent.property_type = Some(kind),
            Fragment::Locations(places) => intent.locations.extend(places),
        }
    }
}

/// One independent extraction rule.
pub trait Extractor: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, query: &Query<'_>) -> Option<Fragment>;
}

lazy_static! {
    static ref RULES: Vec<Box<dyn Extractor>> = vec![
        Box::new(PriceRule),
        Box::new(BedroomRule),
        Box::new(BathroomRule),
        Box::new(AmenityRule),
        Box::new(PropertyTypeRule),
        Box::new(LocationRule),
    ];
}

/// Never fails: text with no recognisable signal yields an empty intent.
pub fn interpret(raw_text: &str) -> Intent {
    let query = Query::new(raw_text);
    let mut intent = Intent {
        raw_text: raw_text.to_string(),
        ..Intent::default()
    };

    for rule in RULES.iter() {
        if let Some(fragment) = rule.extract(&query) {
            tracing::trace!(rule = rule.name(), ?fragment, "extracted");
            fragment.merge_into(&mut intent);
        }
    }

    intent
}

/// Lowercases, drops thousands separators ("1,500" -> "1500"), keeps `$`,
/// `.` and `-`, turns every other punctuation mark into a space and
/// collapses runs of whitespace.
pub fn normalize(raw: &str) -> String {
    let chars: Vec<char> = raw.to_lowercase().chars().collect();
    let mut out = String::with_capacity(chars.len());

    for (i, &c) in chars.iter().enumerate() {
        if c.is_alphanumeric() || matches!(c, '$' | '.' | '-') {
            out.push(c);
        } else if c == ','
            && i > 0
            && chars[i - 1].is_ascii_digit()
            && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())
        {
            continue;
        } else {
            out.push(' ');
        }
    }

    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ---------------------------------------------------------------------------
// Price
// ---------------------------------------------------------------------------

/// `$`? amount `k`? -- three capture groups.
const AMOUNT: &str = r"(\$)?\s?(\d+(?:\.\d+)?)(k)?\b";

#[derive(Debug, Clone, Copy)]
enum PriceShape {
    Between,
    Under,
    Over,
    Budget,
}

lazy_static! {
    /// Checked in this order; a later pattern only wins by matching earlier
    /// in the text.
    static ref PRICE_PATTERNS: Vec<(PriceShape, Regex)> = vec![
        (
            PriceShape::Between,
            Regex::new(&format!(r"\b(?:between|from)\s+{AMOUNT}\s*(?:and|to|-)\s*{AMOUNT}")).unwrap(),
        ),
        (
            PriceShape::Between,
            Regex::new(r"(\$)\s?(\d+(?:\.\d+)?)(k)?\s*(?:-|to)\s*(\$)?\s?(\d+(?:\.\d+)?)(k)?\b").unwrap(),
        ),
        (
            PriceShape::Under,
            Regex::new(&format!(
                r"\b(?:under|below|less than|no more than|up to|at most|max(?:imum)?|cheaper than)\s*{AMOUNT}"
            ))
            .unwrap(),
        ),
        (
            PriceShape::Over,
            Regex::new(&format!(
                r"\b(?:over|above|more than|at least|min(?:imum)?|starting at)\s*{AMOUNT}"
            ))
            .unwrap(),
        ),
        (PriceShape::Budget, Regex::new(r"(\$)\s?(\d+(?:\.\d+)?)(k)?\b").unwrap()),
        (
            PriceShape::Budget,
            Regex::new(r"\b()(\d+(?:\.\d+)?)(k)?\s*(?:dollars|bucks|usd)\b").unwrap(),
        ),
        (
            PriceShape::Budget,
            Regex::new(&format!(
                r"\b(?:budget|price|rent)(?:\s+(?:is|of|around|about))?\s*{AMOUNT}"
            ))
            .unwrap(),
        ),
    ];
}

/// Reads the three groups of an `AMOUNT` starting at `first`.
/// Bare numbers under 100 with neither `$` nor `k` ("under 5 minutes") are
/// not taken as prices.
fn amount_at(caps: &Captures<'_>, first: usize) -> Option<f64> {
    let has_dollar = caps.get(first).is_some_and(|m| !m.as_str().is_empty());
    let has_k = caps.get(first + 2).is_some();
    let value: f64 = caps.get(first + 1)?.as_str().parse().ok()?;
    let value = if has_k { value * 1000.0 } else { value };

    if !value.is_finite() || (!has_dollar && !has_k && value < 100.0) {
        return None;
    }
    Some(value)
}

struct PriceRule;

impl PriceRule {
    fn fragment(shape: PriceShape, caps: &Captures<'_>) -> Option<Fragment> {
        match shape {
            PriceShape::Between => {
                let a = amount_at(caps, 1)?;
                let b = amount_at(caps, 4)?;
                let (min, max) = if a <= b { (a, b) } else { (b, a) };
                Some(Fragment::Price {
                    min: Some(min),
                    max: Some(max),
                })
            }
            PriceShape::Under | PriceShape::Budget => Some(Fragment::Price {
                min: None,
                max: Some(amount_at(caps, 1)?),
            }),
            PriceShape::Over => Some(Fragment::Price {
                min: Some(amount_at(caps, 1)?),
                max: None,
            }),
        }
    }
}

impl Extractor for PriceRule {
    fn name(&self) -> &'static str {
        "price"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        let text = query.normalized.as_str();
        let mut best: Option<(usize, Fragment)> = None;

        for (shape, pattern) in PRICE_PATTERNS.iter() {
            for caps in pattern.captures_iter(text) {
                let Some(fragment) = Self::fragment(*shape, &caps) else {
                    continue;
                };
                let start = caps.get(0).map_or(usize::MAX, |m| m.start());
                // Strictly earlier only: on equal positions the earlier rule keeps it.
                if best.as_ref().map_or(true, |(pos, _)| start < *pos) {
                    best = Some((start, fragment));
                }
                break;
            }
        }

        best.map(|(_, fragment)| fragment)
    }
}

// ---------------------------------------------------------------------------
// Bedrooms / bathrooms
// ---------------------------------------------------------------------------

const COUNT_WORD: &str = r"(\d+|one|two|three|four|five|six)";
const BATH_COUNT: &str = r"(\d+(?:\.\d+)?|one|two|three|four)";
const BED_UNIT: &str = r"(?:bedrooms?|beds?|bdrms?|br|bd)\b";
const BATH_UNIT: &str = r"(?:bathrooms?|baths?|ba)\b";

lazy_static! {
    static ref BED_RANGE: Regex =
        Regex::new(&format!(r"\b{COUNT_WORD}\s*(?:-|to)\s*{COUNT_WORD}\s*-?\s*{BED_UNIT}")).unwrap();
    static ref BED_SINGLE: Regex =
        Regex::new(&format!(r"\b{COUNT_WORD}\s*-?\s*{BED_UNIT}")).unwrap();
    static ref BATH_RANGE: Regex =
        Regex::new(&format!(r"\b{BATH_COUNT}\s*(?:-|to)\s*{BATH_COUNT}\s*-?\s*{BATH_UNIT}")).unwrap();
    static ref BATH_SINGLE: Regex =
        Regex::new(&format!(r"\b{BATH_COUNT}\s*-?\s*{BATH_UNIT}")).unwrap();
}

fn parse_count(token: &str) -> Option<f64> {
    match token {
        "one" => Some(1.0),
        "two" => Some(2.0),
        "three" => Some(3.0),
        "four" => Some(4.0),
        "five" => Some(5.0),
        "six" => Some(6.0),
        digits => digits.parse().ok(),
    }
}

/// Earliest of a range match and a single-count match, as (min, max).
fn find_count(text: &str, range: &Regex, single: &Regex) -> Option<(f64, f64)> {
    let ranged = range.captures(text).and_then(|caps| {
        let a = parse_count(caps.get(1)?.as_str())?;
        let b = parse_count(caps.get(2)?.as_str())?;
        Some((caps.get(0)?.start(), a.min(b), a.max(b)))
    });
    let single = single.captures(text).and_then(|caps| {
        let n = parse_count(caps.get(1)?.as_str())?;
        Some((caps.get(0)?.start(), n, n))
    });

    match (ranged, single) {
        (Some(r), Some(s)) if s.0 < r.0 => Some((s.1, s.2)),
        (Some(r), _) => Some((r.1, r.2)),
        (None, Some(s)) => Some((s.1, s.2)),
        (None, None) => None,
    }
}

struct BedroomRule;

impl Extractor for BedroomRule {
    fn name(&self) -> &'static str {
        "bedrooms"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        let (min, max) = find_count(&query.normalized, &BED_RANGE, &BED_SINGLE)?;
        let (min, max) = (min as u32, max as u32);
        Some(Fragment::Bedrooms(if min == max {
            RoomCount::Exact(min)
        } else {
            RoomCount::Range { min, max }
        }))
    }
}

struct BathroomRule;

impl Extractor for BathroomRule {
    fn name(&self) -> &'static str {
        "bathrooms"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        let (min, max) = find_count(&query.normalized, &BATH_RANGE, &BATH_SINGLE)?;
        Some(Fragment::Bathrooms(if min == max {
            RoomCount::Exact(min)
        } else {
            RoomCount::Range { min, max }
        }))
    }
}

// ---------------------------------------------------------------------------
// Amenities
// ---------------------------------------------------------------------------

/// Canonical amenity name, then the phrasings that mean it.
const AMENITY_VOCABULARY: &[(&str, &[&str])] = &[
    ("parking", &["parking", "garage", "carport"]),
    ("laundry", &["laundry", "washer", "dryer"]),
    ("gym", &["gym", "fitness"]),
    ("pool", &["pool", "swimming pool"]),
    (
        "pet friendly",
        &["pet friendly", "pets allowed", "pets ok", "pets okay", "dog friendly", "cat friendly"],
    ),
    ("furnished", &["furnished"]),
    ("air conditioning", &["air conditioning", "air conditioned", "central air", "ac"]),
    ("dishwasher", &["dishwasher"]),
    ("balcony", &["balcony", "patio"]),
    ("wifi", &["wifi", "wi-fi", "internet"]),
    ("utilities included", &["utilities included", "all utilities"]),
    ("elevator", &["elevator"]),
];

/// Builds `\b(?:a|b c)\b` where spaces inside a phrase also accept hyphens.
fn phrase_regex(phrases: &[&str]) -> Regex {
    let alternatives: Vec<String> = phrases
        .iter()
        .map(|p| {
            p.split(|c: char| c == ' ' || c == '-')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[\s-]+")
        })
        .collect();
    Regex::new(&format!(r"\b(?:{})\b", alternatives.join("|"))).unwrap()
}

lazy_static! {
    static ref AMENITY_PATTERNS: Vec<(&'static str, Regex)> = AMENITY_VOCABULARY
        .iter()
        .map(|(canonical, phrases)| (*canonical, phrase_regex(phrases)))
        .collect();
}

/// Maps a listing's amenity label onto the query vocabulary so that
/// "Washer/Dryer" and "laundry" compare equal. Unknown labels come back
/// normalised.
pub fn canonical_amenity(label: &str) -> String {
    let normalized = normalize(label);
    AMENITY_PATTERNS
        .iter()
        .find(|(_, re)| re.is_match(&normalized))
        .map(|(canonical, _)| canonical.to_string())
        .unwrap_or(normalized)
}

struct AmenityRule;

impl Extractor for AmenityRule {
    fn name(&self) -> &'static str {
        "amenities"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        let found: BTreeSet<String> = AMENITY_PATTERNS
            .iter()
            .filter(|(_, re)| re.is_match(&query.normalized))
            .map(|(canonical, _)| canonical.to_string())
            .collect();

        (!found.is_empty()).then_some(Fragment::Amenities(found))
    }
}

// ---------------------------------------------------------------------------
// Property type
// ---------------------------------------------------------------------------

const PROPERTY_TYPE_VOCABULARY: &[(PropertyType, &[&str])] = &[
    (PropertyType::Apartment, &["apartment", "apartments", "apt", "apts", "flat", "flats"]),
    (
        PropertyType::House,
        &["house", "houses", "home", "homes", "townhouse", "townhouses", "townhome"],
    ),
    (PropertyType::Room, &["room", "rooms"]),
    (PropertyType::Studio, &["studio", "studios"]),
    (PropertyType::Condo, &["condo", "condos", "condominium"]),
];

lazy_static! {
    static ref PROPERTY_TYPE_PATTERNS: Vec<(PropertyType, Regex)> = PROPERTY_TYPE_VOCABULARY
        .iter()
        .map(|(kind, words)| (*kind, phrase_regex(words)))
        .collect();
}

struct PropertyTypeRule;

impl Extractor for PropertyTypeRule {
    fn name(&self) -> &'static str {
        "property_type"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        PROPERTY_TYPE_PATTERNS
            .iter()
            .filter_map(|(kind, re)| re.find(&query.normalized).map(|m| (m.start(), *kind)))
            .min_by_key(|(start, _)| *start)
            .map(|(_, kind)| Fragment::PropertyType(kind))
    }
}

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "with", "without", "for", "to", "in", "near", "around", "by",
    "close", "under", "below", "over", "above", "between", "less", "more", "than", "at", "least",
    "most", "max", "min", "from", "of", "on", "that", "this", "it", "its", "is", "are", "be",
    "i", "i'm", "im", "me", "my", "we", "our", "us", "you", "your", "looking", "look", "find",
    "show", "need", "needs", "want", "wants", "would", "like", "could", "can", "do", "does",
    "any", "some", "something", "anything", "place", "places", "hi", "hey", "hello", "please",
    "thanks", "what", "where", "which", "who", "how", "have", "has", "got", "budget", "price",
    "rent", "month", "monthly", "per", "mo", "dollars", "bucks", "usd", "cheap", "affordable",
    "nice", "big", "small", "large", "quiet", "new", "spacious", "cozy", "modern", "clean", "safe",
    "available", "area", "asap", "bedroom", "bedrooms", "bed", "beds", "br", "bath", "baths",
    "bathroom", "bathrooms", "ba", "also", "just", "really", "very", "good", "great", "one", "two",
    "three", "four", "five", "six", "now", "soon", "today", "unit", "units", "building",
    "buildings", "complex", "suite", "floor", "if", "possible", "ideally",
];

lazy_static! {
    static ref EXPLICIT_PLACE: Regex =
        Regex::new(r"\b(?:near|in|around|close to)\s+([a-z][a-z\-]*(?:\s+[a-z][a-z\-]*){0,2})").unwrap();
    static ref WORD_TOKEN: Regex = Regex::new(r"[A-Za-z][A-Za-z'\-]*").unwrap();
}

/// Words that can never be (part of) a place name.
fn is_stop_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOP_WORDS.contains(&lower.as_str())
        || AMENITY_PATTERNS.iter().any(|(_, re)| re.is_match(&lower))
        || PROPERTY_TYPE_PATTERNS.iter().any(|(_, re)| re.is_match(&lower))
}

/// "near riverside with parking" -> "riverside".
fn explicit_places(normalized: &str) -> impl Iterator<Item = String> + '_ {
    EXPLICIT_PLACE.captures_iter(normalized).filter_map(|caps| {
        let words: Vec<&str> = caps
            .get(1)?
            .as_str()
            .split_whitespace()
            .skip_while(|w| matches!(*w, "the" | "a" | "an"))
            .take_while(|w| !is_stop_word(w))
            .collect();
        (!words.is_empty()).then(|| words.join(" "))
    })
}

/// True when nothing but whitespace or sentence punctuation precedes `start`.
fn starts_sentence(raw: &str, start: usize) -> bool {
    raw[..start]
        .trim_end()
        .chars()
        .last()
        .map_or(true, |c| matches!(c, '.' | '!' | '?'))
}

/// Runs of adjacent capitalised words in the original text, e.g.
/// "Oak Park" or "Riverside". A capital that only marks the start of a
/// sentence ("Hoping for ...") counts only when the next word continues the
/// name.
fn capitalized_places(raw: &str) -> Vec<String> {
    let tokens: Vec<_> = WORD_TOKEN.find_iter(raw).collect();
    let candidate = |i: usize| {
        let word = tokens[i].as_str();
        word.chars().next().is_some_and(char::is_uppercase) && !is_stop_word(word)
    };
    let follows_previous = |i: usize| {
        i > 0
            && raw[tokens[i - 1].end()..tokens[i].start()]
                .chars()
                .all(char::is_whitespace)
    };

    let mut places = Vec::new();
    let mut run: Vec<String> = Vec::new();

    for (i, token) in tokens.iter().enumerate() {
        let mut keep = candidate(i);
        if keep && starts_sentence(raw, token.start()) {
            keep = i + 1 < tokens.len() && candidate(i + 1) && follows_previous(i + 1);
        }

        if (!keep || !follows_previous(i)) && !run.is_empty() {
            places.push(run.join(" "));
            run.clear();
        }
        if keep {
            run.push(token.as_str().to_lowercase());
        }
    }
    if !run.is_empty() {
        places.push(run.join(" "));
    }

    places
}

struct LocationRule;

impl Extractor for LocationRule {
    fn name(&self) -> &'static str {
        "location"
    }

    fn extract(&self, query: &Query<'_>) -> Option<Fragment> {
        let places: BTreeSet<String> = explicit_places(&query.normalized)
            .chain(capitalized_places(query.raw))
            .collect();

        (!places.is_empty()).then_some(Fragment::Locations(places))
    }
}
