//! # Menu Retrieval Service
//!
//! Backs `GET /menus?hall=&meal=&date=`: loads the snapshot for one dining
//! hall, meal and date, and groups its items into stations for the client.
//!
//! Items without a station (or with a blank one) are collected under
//! `"Other"`. Stations appear in the order their first item was stored, and
//! items keep their stored order inside a station.
//!
//! A storage failure is logged and answered like a missing menu. The client
//! only ever sees a whole menu or a not-found.

use crate::error::AppError;
use crate::state::AppState;
use crate::store::MenuStore;
use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use common::model::meal::Meal;
use common::model::menu::{MenuItem, SnapshotView, Station, StationItem, OTHER_STATION};
use common::requests::MenuQuery;
use log::error;

pub(crate) async fn process(
    state: web::Data<AppState>,
    query: web::Query<MenuQuery>,
) -> Result<HttpResponse, AppError> {
    let (hall, meal, served_date) = parse_query(query.into_inner())?;
    let view = get_snapshot(&state.store, &hall, meal, served_date)?;
    Ok(HttpResponse::Ok().json(view))
}

fn parse_query(query: MenuQuery) -> Result<(String, Meal, NaiveDate), AppError> {
    let present = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
    let (Some(hall), Some(meal), Some(date)) =
        (present(query.hall), present(query.meal), present(query.date))
    else {
        return Err(AppError::BadRequest(
            "Missing query parameters: hall, meal, date are required".to_string(),
        ));
    };

    let meal = meal
        .parse::<Meal>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let served_date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::BadRequest(format!("invalid date '{date}', expected YYYY-MM-DD"))
    })?;

    Ok((hall, meal, served_date))
}

pub fn get_snapshot(
    store: &MenuStore,
    dining_hall: &str,
    meal: Meal,
    served_date: NaiveDate,
) -> Result<SnapshotView, AppError> {
    let not_found =
        || AppError::NotFound(format!("no {meal} menu for {dining_hall} on {served_date}"));

    let snapshot = match store.find_snapshot(dining_hall, meal, served_date) {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => return Err(not_found()),
        Err(e) => {
            error!("Snapshot lookup for {dining_hall} {meal} {served_date} failed: {e}");
            return Err(not_found());
        }
    };

    let items = store.items_for_snapshot(&snapshot.id).map_err(|e| {
        error!("Loading items of snapshot {} failed: {e}", snapshot.id);
        not_found()
    })?;

    Ok(SnapshotView {
        snapshot,
        stations: group_stations(items),
    })
}

pub fn group_stations(items: Vec<MenuItem>) -> Vec<Station> {
    let mut stations: Vec<Station> = Vec::new();

    for item in items {
        let name = item
            .station_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(OTHER_STATION)
            .to_string();
        let entry = StationItem {
            id: item.id,
            name: item.name,
            external_item_id: item.external_item_id,
        };

        match stations.iter_mut().find(|station| station.name == name) {
            Some(station) => station.items.push(entry),
            None => stations.push(Station {
                name,
                items: vec![entry],
            }),
        }
    }

    stations
}
