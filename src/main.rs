use crate::config::Config;
use crate::db::{init_db, seed_demo_listings, Database};
use crate::matching::{ListingMatcher, MatcherConfig};
use crate::router::{handle, App};
use anyhow::{Context, Result};
use astra::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod domain;
mod errors;
mod matching;
mod responses;
mod router;
mod templates;


fn main() -> Result<()> {
    // 1️⃣ Logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,housing_chat=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2️⃣ Configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(?config, "configuration loaded");

    // 3️⃣ Database from schema.sql, plus demo data if asked for
    let db = Database::new(config.database_path.clone());
    init_db(&db, &config.schema_path).context("Database initialization failed")?;
    if config.seed_demo_data {
        seed_demo_listings(&db, &config.seed_path).context("Seeding demo listings failed")?;
    }

    let app = App {
        db,
        matcher: ListingMatcher::new(MatcherConfig {
            fallback: config.match_fallback,
        }),
        config,
    };

    // 4️⃣ Start the server
    let addr = app.config.bind_addr;
    tracing::info!("Starting server at http://{addr}");

    let server = Server::bind(&addr).max_workers(app.config.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &app) {
        Ok(resp) => resp,
        Err(err) => responses::html_error_response(err),
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("Server shut down cleanly.");
    Ok(())
}
