//! # Health
//!
//! `GET /health` answers `{"ok": true}` while the process is serving.

use actix_web::web::{get, scope};
use actix_web::{HttpResponse, Responder, Scope};

const API_PATH: &str = "/health";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(process))
}

async fn process() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}
