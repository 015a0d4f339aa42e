// src/matching/mod.rs
//
// Rule-based chat matcher: message -> Intent -> scored listings -> reply.
// Everything here is a pure function of its inputs; a `ListingMatcher` can be
// shared across worker threads freely.

pub mod interpreter;
pub mod response;
pub mod scoring;

pub use interpreter::interpret;
pub use response::generate_response;
pub use scoring::MatchReason;

use crate::domain::{Intent, ListingRecord};
use crate::errors::MatchError;
use scoring::{score_listing, RankKey, ScoreCard};
use serde::Serialize;
use std::str::FromStr;

/// What to return when no listing scores above zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// The most recently created listings.
    #[default]
    Recency,
    /// Nothing; the reply says no match was found.
    None,
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "recency" | "recent" => Ok(FallbackPolicy::Recency),
            "none" | "off" => Ok(FallbackPolicy::None),
            other => Err(format!("unknown fallback policy `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatcherConfig {
    pub fallback: FallbackPolicy,
}

/// One listing's standing for one query. Borrows the listing; never outlives
/// the request that produced it.
#[derive(Debug, Clone)]
pub struct MatchResult<'a> {
    pub listing: &'a ListingRecord,
    pub score: f64,
    pub reasons: Vec<MatchReason>,
    price_fit: f64,
    budget_gap: f64,
}

impl<'a> MatchResult<'a> {
    fn new(listing: &'a ListingRecord, card: ScoreCard) -> Self {
        Self {
            listing,
            score: card.total,
            reasons: card.reasons,
            price_fit: card.price_fit,
            budget_gap: card.budget_gap,
        }
    }

    fn rank_key(&self) -> RankKey {
        RankKey {
            total: self.score,
            price_fit: self.price_fit,
            budget_gap: self.budget_gap,
            id: self.listing.id,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.reasons.contains(&MatchReason::RecentFallback)
    }
}

/// Scores and reasons, only sent when the caller asks for them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchDiagnostic {
    pub listing_id: i64,
    pub score: f64,
    pub reasons: Vec<MatchReason>,
}

impl From<&MatchResult<'_>> for MatchDiagnostic {
    fn from(m: &MatchResult<'_>) -> Self {
        Self {
            listing_id: m.listing.id,
            score: m.score,
            reasons: m.reasons.clone(),
        }
    }
}

/// What goes back to the chat client.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub listings: Vec<ListingRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matches: Option<Vec<MatchDiagnostic>>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingMatcher {
    config: MatcherConfig,
}

impl ListingMatcher {
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Ranks `listings` against `raw_text` and returns at most `top_n`
    /// results, best first. When nothing scores above zero the fallback
    /// policy decides what comes back.
    pub fn find_matches<'a>(
        &self,
        raw_text: &str,
        listings: &'a [ListingRecord],
        top_n: usize,
    ) -> Result<Vec<MatchResult<'a>>, MatchError> {
        if top_n == 0 {
            return Err(MatchError::InvalidArgument(
                "top_n must be greater than zero".into(),
            ));
        }

        let intent = interpret(raw_text);
        tracing::debug!(?intent, listings = listings.len(), top_n, "matching query");

        Ok(self.rank(&intent, listings, top_n))
    }

    /// Ranking for an already interpreted query.
    pub fn rank<'a>(
        &self,
        intent: &Intent,
        listings: &'a [ListingRecord],
        top_n: usize,
    ) -> Vec<MatchResult<'a>> {
        let scored: Vec<MatchResult<'a>> = listings
            .iter()
            .filter(|listing| match listing.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping malformed listing");
                    false
                }
            })
            .map(|listing| MatchResult::new(listing, score_listing(intent, listing)))
            .collect();

        let (mut matches, unmatched): (Vec<_>, Vec<_>) =
            scored.into_iter().partition(|m| m.score > 0.0);

        if matches.is_empty() {
            return self.fallback(unmatched, top_n);
        }

        matches.sort_by(|a, b| a.rank_key().rank_cmp(&b.rank_key()));
        matches.truncate(top_n);

        tracing::debug!(returned = matches.len(), "ranked matches");
        matches
    }

    fn fallback<'a>(
        &self,
        mut scored: Vec<MatchResult<'a>>,
        top_n: usize,
    ) -> Vec<MatchResult<'a>> {
        match self.config.fallback {
            FallbackPolicy::None => Vec::new(),
            FallbackPolicy::Recency => {
                scored.sort_by(|a, b| {
                    b.listing
                        .created_at
                        .cmp(&a.listing.created_at)
                        .then_with(|| a.listing.id.cmp(&b.listing.id))
                });
                scored.truncate(top_n);
                for m in &mut scored {
                    m.reasons.push(MatchReason::RecentFallback);
                }

                tracing::debug!(returned = scored.len(), "no positive scores, using recent listings");
                scored
            }
        }
    }

    /// The whole chat turn: rank up to `match_n` listings, phrase a reply,
    /// and hand back the first `display_n` listings.
    pub fn answer(
        &self,
        raw_text: &str,
        listings: &[ListingRecord],
        match_n: usize,
        display_n: usize,
        explain: bool,
    ) -> Result<ChatReply, MatchError> {
        if display_n == 0 {
            return Err(MatchError::InvalidArgument(
                "display count must be greater than zero".into(),
            ));
        }

        let matches = self.find_matches(raw_text, listings, match_n)?;
        let message = generate_response(raw_text, &matches);

        Ok(ChatReply {
            message,
            listings: matches
                .iter()
                .take(display_n)
                .map(|m| m.listing.clone())
                .collect(),
            matches: explain.then(|| matches.iter().map(MatchDiagnostic::from).collect()),
        })
    }
}
