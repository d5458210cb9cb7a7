use crate::model::meal::Meal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Station label used for items the vendor did not assign to any station.
pub const OTHER_STATION: &str = "Other";

/// What one dining hall served for one meal on one calendar date.
///
/// The `(dining_hall, meal, served_date)` triple is unique in storage. A
/// snapshot is created the first time that day and meal is ingested and is
/// returned unchanged by every later ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuSnapshot {
    pub id: String,
    pub dining_hall: String,
    pub meal: Meal,
    /// Serialized as `YYYY-MM-DD`.
    pub served_date: NaiveDate,
}

/// A dish served within a snapshot.
///
/// `external_item_id` is the vendor's identifier for the dish and is unique
/// per snapshot, which is what lets a re-fetched day update in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub snapshot_id: String,
    pub name: String,
    pub external_item_id: String,
    pub station_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationItem {
    pub id: String,
    pub name: String,
    pub external_item_id: String,
}

/// Items of a snapshot sharing a station label. Built at read time, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub name: String,
    pub items: Vec<StationItem>,
}

/// Response body of `GET /menus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotView {
    pub snapshot: MenuSnapshot,
    pub stations: Vec<Station>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestStatus {
    Ingested,
}

/// Response body of `POST /menus/ingest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestResult {
    pub status: IngestStatus,
}

impl IngestResult {
    pub fn ingested() -> Self {
        Self {
            status: IngestStatus::Ingested,
        }
    }
}
