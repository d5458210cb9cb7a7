mod config;
mod error;
mod services;
mod state;
mod store;

use crate::config::Config;
use crate::services::menus::vendor::VendorClient;
use crate::state::AppState;
use crate::store::MenuStore;
use actix_web::{middleware, web, App, HttpServer};
use env_logger::Env;
use log::info;
use std::sync::Arc;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env()?;

    let store = MenuStore::open(&config.database_path)?;
    store.migrate()?;
    info!("Menu store ready at {}", config.database_path.display());

    let feed = Arc::new(VendorClient::new(config.vendor.clone()));
    let state = AppState::new(&config, store, feed);

    info!(
        "Server running at http://{}:{} for {}",
        config.host, config.port, config.dining_hall
    );

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state.clone()))
            .service(services::menus::configure_routes())
            .service(services::health::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    Ok(())
}
