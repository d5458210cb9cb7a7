//! Shared application state handed to every request handler.
//!
//! Built once in `main.rs` after the configuration is loaded and the database
//! is migrated, then registered with Actix as `web::Data<AppState>`. Handlers
//! reach storage and the vendor feed only through this struct.

use crate::config::Config;
use crate::services::menus::vendor::MenuFeed;
use crate::store::MenuStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: MenuStore,
    /// The weekly menu source. `VendorClient` in production.
    pub feed: Arc<dyn MenuFeed>,
    /// The single dining hall this deployment ingests.
    pub dining_hall: String,
    /// Bearer token that `POST /menus/ingest` must present.
    pub ingest_secret: String,
}

impl AppState {
    pub fn new(config: &Config, store: MenuStore, feed: Arc<dyn MenuFeed>) -> Self {
        Self {
            store,
            feed,
            dining_hall: config.dining_hall.clone(),
            ingest_secret: config.ingest_secret.clone(),
        }
    }
}
