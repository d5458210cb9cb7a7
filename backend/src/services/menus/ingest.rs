//! # Weekly Ingestion Trigger
//!
//! `POST /menus/ingest` pulls the current week for the configured dining hall
//! and reconciles it into storage. It is meant to be called by a scheduler
//! holding the ingest secret, or by hand.
//!
//! ## Workflow
//!
//! 1.  **Authorization**: the `Authorization` header must be `Bearer <INGEST_SECRET>`.
//!
//! 2.  **Per meal, sequentially** (breakfast, lunch, dinner):
//!     - fetch the week from the vendor,
//!     - group the items by date,
//!     - reconcile every date group into snapshots and menu items.
//!
//! 3.  **Failures**: every meal is checked against the configuration before
//!     the first fetch, so a configuration error stops the run before any
//!     network call or write. A feed or
//!     ingestion failure only stops its own meal. The remaining meals still
//!     run, then the first failure is returned. Work already committed is
//!     kept, and because every write is an upsert the trigger can simply be
//!     called again.

use crate::error::AppError;
use crate::services::menus::partition::group_by_date;
use crate::services::menus::reconcile::reconcile;
use crate::services::menus::vendor::MenuFeed;
use crate::state::AppState;
use crate::store::MenuStore;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Local, NaiveDate};
use common::model::meal::Meal;
use common::model::menu::IngestResult;
use log::{error, info, warn};

pub(crate) async fn process(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    authorize(&req, &state.ingest_secret)?;

    let today = Local::now().date_naive();
    let result =
        ingest_week(state.feed.as_ref(), &state.store, &state.dining_hall, today).await?;
    Ok(HttpResponse::Ok().json(result))
}

fn authorize(req: &HttpRequest, secret: &str) -> Result<(), AppError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .unwrap_or("");

    if token.is_empty() || token != secret {
        warn!("Rejected ingest trigger from {:?}", req.peer_addr());
        return Err(AppError::Unauthorized("Bad ingest secret".to_string()));
    }
    Ok(())
}

/// Ingests the week containing `today` for every meal of `dining_hall`.
pub async fn ingest_week(
    feed: &dyn MenuFeed,
    store: &MenuStore,
    dining_hall: &str,
    today: NaiveDate,
) -> Result<IngestResult, AppError> {
    for meal in Meal::ALL {
        feed.check_meal(meal)?;
    }

    let mut first_failure = None;
    for meal in Meal::ALL {
        match ingest_meal(feed, store, dining_hall, meal, today).await {
            Ok(_) => {}
            Err(e @ AppError::Configuration(_)) => return Err(e),
            Err(e) => {
                error!("Ingestion of {dining_hall} {meal} failed: {e}");
                first_failure.get_or_insert(e);
            }
        }
    }

    match first_failure {
        Some(e) => Err(e),
        None => {
            info!("Ingested week of {today} for {dining_hall}");
            Ok(IngestResult::ingested())
        }
    }
}

async fn ingest_meal(
    feed: &dyn MenuFeed,
    store: &MenuStore,
    dining_hall: &str,
    meal: Meal,
    today: NaiveDate,
) -> Result<IngestResult, AppError> {
    let items = feed.fetch_week(meal, today).await?;
    info!("Fetched {} {meal} items", items.len());

    let groups = group_by_date(items)?;
    reconcile(store, dining_hall, meal, groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::menus::configure_routes;
    use crate::services::menus::vendor::fakes::{vendor_item, StaticFeed};
    use actix_web::http::StatusCode;
    use crate::config::VendorConfig;
    use crate::services::menus::vendor::VendorClient;
    use actix_web::test as actix_test;
    use actix_web::App;
    use std::collections::HashMap;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 8).unwrap()
    }

    fn week_feed() -> StaticFeed {
        StaticFeed::default()
            .with(
                Meal::Breakfast,
                vec![vendor_item(10, "Oatmeal", "2026-01-08T00:00:00Z", Some("Roots"))],
            )
            .with(
                Meal::Dinner,
                vec![
                    vendor_item(1, "Pasta", "2026-01-08T00:00:00Z", Some("Trattoria")),
                    vendor_item(2, "Salad", "2026-01-09T00:00:00Z", None),
                ],
            )
    }

    #[actix_web::test]
    async fn processes_meals_in_order() {
        let store = MenuStore::open_in_memory().unwrap();
        let feed = week_feed();

        let result = ingest_week(&feed, &store, "Stevenson", today()).await.unwrap();

        assert_eq!(result, IngestResult::ingested());
        assert_eq!(
            *feed.calls.lock().unwrap(),
            vec![Meal::Breakfast, Meal::Lunch, Meal::Dinner]
        );
        assert_eq!(store.count_snapshots().unwrap(), 3);
        assert_eq!(store.count_items().unwrap(), 3);
    }

    #[actix_web::test]
    async fn rerunning_the_week_is_idempotent() {
        let store = MenuStore::open_in_memory().unwrap();
        let feed = week_feed();

        ingest_week(&feed, &store, "Stevenson", today()).await.unwrap();
        ingest_week(&feed, &store, "Stevenson", today()).await.unwrap();

        assert_eq!(store.count_snapshots().unwrap(), 3);
        assert_eq!(store.count_items().unwrap(), 3);
    }

    #[actix_web::test]
    async fn failed_fetch_writes_nothing_for_that_meal_only() {
        let store = MenuStore::open_in_memory().unwrap();
        let feed = week_feed().failing(Meal::Dinner);

        let err = ingest_week(&feed, &store, "Stevenson", today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::FeedFetch(_)));
        assert_eq!(store.count_snapshots().unwrap(), 1);
        assert!(store
            .find_snapshot("Stevenson", Meal::Dinner, today())
            .unwrap()
            .is_none());
        assert!(store
            .find_snapshot("Stevenson", Meal::Breakfast, today())
            .unwrap()
            .is_some());
    }

    #[actix_web::test]
    async fn malformed_date_aborts_its_meal() {
        let store = MenuStore::open_in_memory().unwrap();
        let feed = week_feed().with(
            Meal::Lunch,
            vec![
                vendor_item(20, "Soup", "2026-01-08T00:00:00Z", None),
                vendor_item(21, "Stew", "not a date", None),
            ],
        );

        let err = ingest_week(&feed, &store, "Stevenson", today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Ingestion { .. }));
        assert!(store
            .find_snapshot("Stevenson", Meal::Lunch, today())
            .unwrap()
            .is_none());
        assert_eq!(store.count_snapshots().unwrap(), 3);
    }

    #[actix_web::test]
    async fn unmapped_meal_stops_the_run_before_any_fetch() {
        let store = MenuStore::open_in_memory().unwrap();
        let feed = week_feed().unmapped(Meal::Lunch);

        let err = ingest_week(&feed, &store, "Stevenson", today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("lunch")));
        assert!(feed.calls.lock().unwrap().is_empty());
        assert_eq!(store.count_snapshots().unwrap(), 0);
    }

    #[actix_web::test]
    async fn vendor_client_with_partial_meal_ids_never_reaches_the_network() {
        let store = MenuStore::open_in_memory().unwrap();
        // Nothing listens here, so any request would come back as FeedFetch.
        let client = VendorClient::new(VendorConfig {
            base_url: "http://127.0.0.1:9/api/menu-items/week".to_string(),
            location_id: "111".to_string(),
            meal_ids: HashMap::from([
                (Meal::Breakfast, "182".to_string()),
                (Meal::Dinner, "184".to_string()),
            ]),
        });

        let err = ingest_week(&client, &store, "Stevenson", today())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Configuration(ref m) if m.contains("lunch")));
        assert_eq!(store.count_snapshots().unwrap(), 0);
    }

    fn state(feed: StaticFeed, store: MenuStore) -> AppState {
        AppState {
            store,
            feed: Arc::new(feed),
            dining_hall: "Stevenson".to_string(),
            ingest_secret: "s3cret".to_string(),
        }
    }

    #[actix_web::test]
    async fn trigger_requires_the_ingest_secret() {
        let store = MenuStore::open_in_memory().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(week_feed(), store.clone())))
                .service(configure_routes()),
        )
        .await;

        for header in [None, Some("Bearer wrong"), Some("s3cret")] {
            let mut req = actix_test::TestRequest::post().uri("/menus/ingest");
            if let Some(value) = header {
                req = req.insert_header((AUTHORIZATION, value));
            }
            let resp = actix_test::call_service(&app, req.to_request()).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        }
        assert_eq!(store.count_snapshots().unwrap(), 0);
    }

    #[actix_web::test]
    async fn trigger_reports_ingested() {
        let store = MenuStore::open_in_memory().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(week_feed(), store.clone())))
                .service(configure_routes()),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/menus/ingest")
            .insert_header((AUTHORIZATION, "Bearer s3cret"))
            .to_request();
        let body: serde_json::Value = actix_test::call_and_read_body_json(&app, req).await;

        assert_eq!(body, serde_json::json!({ "status": "ingested" }));
        assert!(store.count_snapshots().unwrap() > 0);
    }

    #[actix_web::test]
    async fn trigger_surfaces_feed_failures() {
        let store = MenuStore::open_in_memory().unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state(
                    week_feed().failing(Meal::Breakfast),
                    store,
                )))
                .service(configure_routes()),
        )
        .await;

        let req = actix_test::TestRequest::post()
            .uri("/menus/ingest")
            .insert_header((AUTHORIZATION, "Bearer s3cret"))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }
}
