// src/matching/response.rs

use crate::domain::{Intent, RoomCount};
use crate::matching::scoring::price_fit;
use crate::matching::{interpret, MatchResult};

pub const NO_MATCHES_MESSAGE: &str = "I couldn't find any listings that match your search. \
     Try broadening your search, for example by raising your budget or dropping an amenity.";

/// Phrases a short reply for the chat window. Mentions how many listings
/// came back and up to two of the constraints understood from the message.
/// Scores and match reasons never appear in the text.
pub fn generate_response(raw_text: &str, matches: &[MatchResult<'_>]) -> String {
    if matches.is_empty() {
        return NO_MATCHES_MESSAGE.to_string();
    }

    let count = matches.len();

    if matches.iter().all(MatchResult::is_fallback) {
        return if count == 1 {
            "I couldn't find an exact match, but here is the most recent listing.".to_string()
        } else {
            format!("I couldn't find an exact match, but here are the {count} most recent listings.")
        };
    }

    let intent = interpret(raw_text);
    let mut reply = format!("I found {count} {}", noun(&intent, count));

    // Soft-penalised listings may sit outside the stated bounds.
    let within_budget = matches
        .iter()
        .all(|m| price_fit(&intent, m.listing.price) >= 0.0);
    let descriptors = describe(&intent, within_budget);
    match descriptors.as_slice() {
        [] => {}
        [only] => {
            reply.push(' ');
            reply.push_str(only);
        }
        [first, second, ..] => {
            reply.push(' ');
            reply.push_str(first);
            match (first.starts_with("with "), second.strip_prefix("with ")) {
                (true, Some(rest)) => {
                    reply.push_str(" and ");
                    reply.push_str(rest);
                }
                _ => {
                    reply.push(' ');
                    reply.push_str(second);
                }
            }
        }
    }
    reply.push('.');

    let top = matches[0].listing;
    reply.push_str(&format!(
        " The best fit is \"{}\" at {} per month.",
        top.title,
        format_price(top.price)
    ));

    reply
}

fn noun(intent: &Intent, count: usize) -> &'static str {
    match (intent.property_type, count) {
        (Some(kind), 1) => kind.as_str(),
        (Some(kind), _) => kind.plural(),
        (None, 1) => "listing",
        (None, _) => "listings",
    }
}

/// Constraint phrases in priority order: price, bedrooms, bathrooms,
/// location, amenities. The price reads "around $X" once any result falls
/// outside the stated bounds.
fn describe(intent: &Intent, within_budget: bool) -> Vec<String> {
    let mut out = Vec::new();

    match (intent.min_price, intent.max_price) {
        _ if !within_budget => {
            if let Some(budget) = intent.budget_reference() {
                out.push(format!("around {}", format_price(budget)));
            }
        }
        (Some(min), Some(max)) => out.push(format!(
            "between {} and {}",
            format_price(min),
            format_price(max)
        )),
        (None, Some(max)) => out.push(format!("under {}", format_price(max))),
        (Some(min), None) => out.push(format!("over {}", format_price(min))),
        (None, None) => {}
    }

    if let Some(beds) = &intent.bedrooms {
        out.push(format!("with {}", count_phrase(beds, "bedroom")));
    }
    if let Some(baths) = &intent.bathrooms {
        out.push(format!("with {}", count_phrase(baths, "bathroom")));
    }

    if let Some(place) = intent.locations.iter().next() {
        out.push(format!("near {}", title_case(place)));
    }

    if !intent.amenities.is_empty() {
        let names: Vec<&str> = intent.amenities.iter().map(String::as_str).collect();
        out.push(format!("with {}", join_and(&names)));
    }

    out
}

fn count_phrase<T: Copy + Into<f64>>(count: &RoomCount<T>, unit: &str) -> String {
    let (min, max) = count.bounds();
    if min == max {
        let plural = if min == 1.0 { "" } else { "s" };
        format!("{min} {unit}{plural}")
    } else {
        format!("{min}-{max} {unit}s")
    }
}

fn join_and(items: &[&str]) -> String {
    match items {
        [] => String::new(),
        [one] => one.to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

fn title_case(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `1500.0` -> `$1,500`, `1234.5` -> `$1,234.50`.
pub fn format_price(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if whole < 0 { "-" } else { "" };
    if frac == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped}.{:02}", frac.abs())
    }
}
