//! # Partitioner
//!
//! Splits a flat week of vendor items into one group per served date. Pure:
//! no storage, no network.

use crate::error::AppError;
use crate::services::menus::vendor::VendorMenuItem;
use chrono::NaiveDate;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Vendor items served on one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DateGroup {
    pub served_date: NaiveDate,
    pub items: Vec<VendorMenuItem>,
}

/// Splits a week of vendor items by the date part of their `date` field.
///
/// Groups come out in the order their date was first seen, and items keep
/// their feed order inside each group. A single item without a readable date
/// fails the whole call.
pub fn group_by_date(items: Vec<VendorMenuItem>) -> Result<Vec<DateGroup>, AppError> {
    let mut groups: Vec<DateGroup> = Vec::new();
    let mut positions: HashMap<NaiveDate, usize> = HashMap::new();

    for item in items {
        let served_date = served_date(&item)?;
        match positions.entry(served_date) {
            Entry::Occupied(entry) => groups[*entry.get()].items.push(item),
            Entry::Vacant(entry) => {
                entry.insert(groups.len());
                groups.push(DateGroup {
                    served_date,
                    items: vec![item],
                });
            }
        }
    }

    Ok(groups)
}

/// `2026-01-08T00:00:00Z`, `2026-01-08 00:00:00` and `2026-01-08` all give 2026-01-08.
fn served_date(item: &VendorMenuItem) -> Result<NaiveDate, AppError> {
    let raw = item
        .date
        .as_deref()
        .ok_or_else(|| AppError::ingestion(format!("vendor item {}", item.id), "missing date"))?;

    let day = raw
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(raw)
        .trim();

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| AppError::ingestion(format!("vendor item {} dated '{raw}'", item.id), e))
}
