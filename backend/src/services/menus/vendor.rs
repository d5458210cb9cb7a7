//! # Vendor Feed Client
//!
//! Fetches a week of menu items for one meal from the dining vendor's
//! `menu-items/week` endpoint.
//!
//! The vendor expects `date` as `M/D/YYYY` with no zero padding (`1/8/2026`),
//! alongside `locationId` and `mealId`. All three travel as percent-encoded
//! query parameters. The response is a JSON array of items, each carrying at
//! least an id, a name, an ISO-like `date` and an optional `stationName`.
//!
//! Items are returned exactly as the vendor sent them. Checking dates is the
//! partitioner's job. There is no caching and no retry.

use crate::config::VendorConfig;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use common::model::meal::Meal;
use log::info;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// The vendor's id for a dish, kept as whatever JSON scalar the vendor sent.
/// A missing id reads as `null`. It is stored as text, rendered the way a
/// JavaScript `String(id)` would render it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ExternalId(pub Value);

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(i), _, _) => write!(f, "{i}"),
                (None, Some(u), _) => write!(f, "{u}"),
                // 2.0 prints as 2
                (None, None, Some(x)) if x.fract() == 0.0 && x.abs() < 1e21 => {
                    write!(f, "{x:.0}")
                }
                _ => write!(f, "{n}"),
            },
            other => write!(f, "{other}"),
        }
    }
}

/// One raw record of the weekly feed. Lives for a single ingestion pass.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorMenuItem {
    #[serde(default)]
    pub id: ExternalId,
    #[serde(default)]
    pub name: String,
    pub date: Option<String>,
    pub station_name: Option<String>,
}

/// Source of weekly menu items. Implemented by [`VendorClient`] in production.
#[async_trait]
pub trait MenuFeed: Send + Sync {
    /// Fails with [`AppError::Configuration`] when `meal` cannot be fetched
    /// at all. Called for every meal before a run touches the network.
    fn check_meal(&self, _meal: Meal) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch_week(
        &self,
        meal: Meal,
        reference_date: NaiveDate,
    ) -> Result<Vec<VendorMenuItem>, AppError>;
}

pub struct VendorClient {
    http: reqwest::Client,
    config: VendorConfig,
}

impl VendorClient {
    pub fn new(config: VendorConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn resolve_meal(&self, meal: Meal) -> Result<&str, AppError> {
        if self.config.base_url.trim().is_empty() {
            return Err(AppError::Configuration("vendor base URL is empty".to_string()));
        }
        if self.config.location_id.trim().is_empty() {
            return Err(AppError::Configuration("vendor location id is empty".to_string()));
        }
        self.config.meal_id(meal)
    }

    fn request(
        &self,
        meal: Meal,
        reference_date: NaiveDate,
    ) -> Result<reqwest::RequestBuilder, AppError> {
        let meal_id = self.resolve_meal(meal)?;

        Ok(self.http.get(&self.config.base_url).query(&[
            ("date", format_vendor_date(reference_date)),
            ("locationId", self.config.location_id.clone()),
            ("mealId", meal_id.to_string()),
        ]))
    }
}

#[async_trait]
impl MenuFeed for VendorClient {
    fn check_meal(&self, meal: Meal) -> Result<(), AppError> {
        self.resolve_meal(meal).map(|_| ())
    }

    async fn fetch_week(
        &self,
        meal: Meal,
        reference_date: NaiveDate,
    ) -> Result<Vec<VendorMenuItem>, AppError> {
        let request = self.request(meal, reference_date)?;
        info!("Fetching {meal} menu for the week of {reference_date}");

        let response = request
            .send()
            .await
            .map_err(|e| AppError::FeedFetch(format!("request for {meal} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::FeedFetch(format!(
                "vendor returned HTTP {status} for {meal}"
            )));
        }

        response
            .json::<Vec<VendorMenuItem>>()
            .await
            .map_err(|e| AppError::FeedFetch(format!("unexpected {meal} body: {e}")))
    }
}

/// `2026-01-08` becomes `1/8/2026`.
pub fn format_vendor_date(date: NaiveDate) -> String {
    format!("{}/{}/{}", date.month(), date.day(), date.year())
}
