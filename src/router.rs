use crate::config::Config;
use crate::db::{get_listing, insert_listing, load_all_listings, Database, NewListing};
use crate::domain::ListingRecord;
use crate::errors::{MatchError, ServerError};
use crate::matching::ListingMatcher;
use crate::responses::{html_response, json_error, json_response, ResultResp};
use crate::templates;
use astra::Request;
use serde::Deserialize;
use serde_json::json;
use std::io::Read;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Shown to the end user whenever a chat request fails on our side.
pub const CHAT_FAILURE_MESSAGE: &str =
    "I'm sorry, I couldn't process that request due to an error. Please try a different search.";

const RECENT_ON_HOME: usize = 6;

/// Shared, read-only state handed to every request.
pub struct App {
    pub db: Database,
    pub matcher: ListingMatcher,
    pub config: Config,
}

pub fn handle(mut req: Request, app: &App) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    match (method.as_str(), path.as_str()) {
        ("GET", "/") | ("GET", "/chat") => home(app),
        ("POST", "/chat/ask") => chat_ask(&mut req, app),
        ("GET", "/api/listings") => json_response(200, &load_all_listings(&app.db)?),
        ("POST", "/api/listings") => create_listing(&mut req, app),
        ("GET", p) if p.starts_with("/listings/") => listing_detail(p, app),
        _ => Err(ServerError::NotFound),
    }
}

fn home(app: &App) -> ResultResp {
    let mut listings = load_all_listings(&app.db)?;
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
    listings.truncate(RECENT_ON_HOME);

    html_response(templates::pages::home_page(&listings))
}

fn listing_detail(path: &str, app: &App) -> ResultResp {
    let id: i64 = path
        .trim_start_matches("/listings/")
        .trim_end_matches('/')
        .parse()
        .map_err(|_| ServerError::NotFound)?;

    match get_listing(&app.db, id)? {
        Some(listing) => html_response(templates::pages::listing_page(&listing)),
        None => Err(ServerError::NotFound),
    }
}

/// `POST /api/listings`. Body is a `NewListing`; answers `201 {"id": ..}`.
fn create_listing(req: &mut Request, app: &App) -> ResultResp {
    let body = match read_body(req, app.config.max_body_bytes) {
        Ok(body) => body,
        Err(ServerError::BadRequest(msg)) => return json_error(400, &msg),
        Err(e) => return Err(e),
    };

    let listing: NewListing = match serde_json::from_slice(&body) {
        Ok(listing) => listing,
        Err(e) => return json_error(400, &format!("Invalid listing: {e}")),
    };

    match insert_listing(&app.db, &listing) {
        Ok(id) => json_response(201, &json!({ "id": id })),
        Err(ServerError::BadRequest(msg)) => json_error(400, &msg),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    top_n: Option<i64>,
    #[serde(default)]
    explain: bool,
}

/// `POST /chat/ask`. Always answers in JSON.
fn chat_ask(req: &mut Request, app: &App) -> ResultResp {
    let body = match read_body(req, app.config.max_body_bytes) {
        Ok(body) => body,
        Err(ServerError::BadRequest(msg)) => return json_error(400, &msg),
        Err(e) => return Err(e),
    };

    let Some(chat) = serde_json::from_slice::<ChatRequest>(&body)
        .ok()
        .filter(|c| c.message.is_some())
    else {
        return json_error(400, "No message provided");
    };
    let message = chat.message.unwrap_or_default();

    let match_n = match requested_top_n(chat.top_n, app.config.match_top_n) {
        Ok(n) => n,
        Err(e) => return json_error(400, &e.to_string()),
    };

    let listings = match load_all_listings(&app.db) {
        Ok(listings) => listings,
        Err(e) => {
            tracing::error!(error = %e, "failed to load listings for chat");
            return chat_failure(&[], app);
        }
    };

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        app.matcher.answer(
            &message,
            &listings,
            match_n,
            app.config.display_top_n,
            chat.explain,
        )
    }));

    match outcome {
        Ok(Ok(reply)) => {
            tracing::info!(matched = reply.listings.len(), "chat answered");
            json_response(200, &reply)
        }
        Ok(Err(e @ MatchError::InvalidArgument(_))) => json_error(400, &e.to_string()),
        Err(_) => {
            tracing::error!(message = %message, "matcher panicked");
            chat_failure(&listings, app)
        }
    }
}

/// Generic 500 for the chat client. Still offers a few listings so the page
/// isn't empty.
fn chat_failure(listings: &[ListingRecord], app: &App) -> ResultResp {
    let shown: Vec<&ListingRecord> = listings.iter().take(app.config.display_top_n).collect();
    json_response(
        500,
        &json!({ "message": CHAT_FAILURE_MESSAGE, "listings": shown }),
    )
}

/// A client-supplied `top_n` overrides the configured default; zero or
/// negative values are rejected rather than clamped.
fn requested_top_n(requested: Option<i64>, default: usize) -> Result<usize, MatchError> {
    match requested {
        None => Ok(default),
        Some(n) if n > 0 => usize::try_from(n)
            .map_err(|_| MatchError::InvalidArgument(format!("top_n {n} is too large"))),
        Some(n) => Err(MatchError::InvalidArgument(format!(
            "top_n must be greater than zero, got {n}"
        ))),
    }
}

fn read_body(req: &mut Request, limit: u64) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.body_mut()
        .reader()
        .take(limit + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("Failed to read body: {e}")))?;

    if buf.len() as u64 > limit {
        return Err(ServerError::BadRequest("Request body too large".into()));
    }
    Ok(buf)
}
