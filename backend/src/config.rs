//! Process configuration, read once from the environment at startup.
//!
//! Every required key is checked before the server starts. When several are
//! missing or invalid they are reported together in a single
//! [`AppError::Configuration`], so a fresh deployment can be fixed in one pass.

use crate::error::AppError;
use common::model::meal::Meal;
use std::collections::HashMap;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_PATH: &str = "dining.sqlite";
const DEFAULT_DINING_HALL: &str = "Stevenson";

/// Settings needed to talk to the vendor's weekly menu endpoint.
#[derive(Debug, Clone)]
pub struct VendorConfig {
    pub base_url: String,
    pub location_id: String,
    /// Vendor meal ids, e.g. `dinner -> "184"`. Startup requires one per meal.
    pub meal_ids: HashMap<Meal, String>,
}

impl VendorConfig {
    pub fn meal_id(&self, meal: Meal) -> Result<&str, AppError> {
        self.meal_ids
            .get(&meal)
            .map(String::as_str)
            .ok_or_else(|| AppError::Configuration(format!("no vendor meal id for {meal}")))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub dining_hall: String,
    pub ingest_secret: String,
    pub vendor: VendorConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `from_env` passes
    /// `std::env::var`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut problems = Vec::new();
        let mut required = |key: &str| match lookup(key).filter(|v| !v.trim().is_empty()) {
            Some(value) => Some(value.trim().to_string()),
            None => {
                problems.push(format!("missing {key}"));
                None
            }
        };

        let base_url = required("VENDOR_BASE_URL");
        let location_id = required("VENDOR_LOCATION_ID");
        let raw_meal_ids = required("VENDOR_MEAL_IDS");
        let ingest_secret = required("INGEST_SECRET");

        let meal_ids = match raw_meal_ids.as_deref().map(parse_meal_ids) {
            Some(Ok(ids)) => Some(ids),
            Some(Err(e)) => {
                problems.push(format!("invalid VENDOR_MEAL_IDS: {e}"));
                None
            }
            None => None,
        };

        let port = match lookup("PORT") {
            Some(raw) => match raw.trim().parse::<u16>() {
                Ok(port) => port,
                Err(e) => {
                    problems.push(format!("invalid PORT '{raw}': {e}"));
                    DEFAULT_PORT
                }
            },
            None => DEFAULT_PORT,
        };

        match (base_url, location_id, meal_ids, ingest_secret) {
            (Some(base_url), Some(location_id), Some(meal_ids), Some(ingest_secret))
                if problems.is_empty() =>
            {
                Ok(Self {
                    host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
                    port,
                    database_path: PathBuf::from(
                        lookup("DATABASE_PATH")
                            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
                    ),
                    dining_hall: lookup("DINING_HALL")
                        .unwrap_or_else(|| DEFAULT_DINING_HALL.to_string()),
                    ingest_secret,
                    vendor: VendorConfig {
                        base_url,
                        location_id,
                        meal_ids,
                    },
                })
            }
            _ => Err(AppError::Configuration(problems.join(", "))),
        }
    }
}

/// Parses `breakfast=182,lunch=183,dinner=184`. Every meal must be mapped,
/// since each ingestion run fetches all of them.
fn parse_meal_ids(raw: &str) -> Result<HashMap<Meal, String>, String> {
    let mut ids = HashMap::new();
    for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (meal, id) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected meal=id, got '{pair}'"))?;
        let meal: Meal = meal.parse().map_err(|e| format!("{e}"))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("empty id for {meal}"));
        }
        ids.insert(meal, id.to_string());
    }
    let unmapped: Vec<&str> = Meal::ALL
        .iter()
        .filter(|meal| !ids.contains_key(*meal))
        .map(|meal| meal.as_str())
        .collect();
    if !unmapped.is_empty() {
        return Err(format!("no id for {}", unmapped.join(", ")));
    }
    Ok(ids)
}
