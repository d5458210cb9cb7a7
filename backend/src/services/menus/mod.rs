//! # Menus Service Module
//!
//! HTTP endpoints for weekly menu ingestion and per-day menu retrieval.
//!
//! ## Sub-modules:
//! - `vendor`: client for the dining vendor's weekly menu feed.
//! - `partition`: groups a week of vendor items by served date.
//! - `reconcile`: upserts date groups into snapshots and menu items.
//! - `ingest`: the authenticated ingestion trigger.
//! - `get`: reads a snapshot back, grouped by station.

pub mod get;
pub mod ingest;
pub mod partition;
pub mod reconcile;
pub mod vendor;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/menus";

/// Configures and returns the Actix `Scope` for menu routes.
///
/// # Registered Routes:
///
/// *   **`GET /menus?hall=&meal=&date=`**: the stored menu for one hall, meal and
///     date, grouped by station. `400` on missing or malformed parameters,
///     `404` when nothing was ingested for that triple.
///
/// *   **`POST /menus/ingest`**: fetches and reconciles the current week for the
///     configured hall. Requires `Authorization: Bearer <INGEST_SECRET>`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(get::process))
        .route("/ingest", post().to(ingest::process))
}
