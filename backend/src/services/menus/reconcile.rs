//! # Snapshot Reconciler
//!
//! Merges one meal's worth of partitioned vendor items into storage.
//!
//! For every date group, in order:
//! 1. Upsert the snapshot for `(dining_hall, meal, served_date)`. The store
//!    does this in one `INSERT … ON CONFLICT … RETURNING` statement, so
//!    concurrent runs cannot create a second row for the same key.
//! 2. Map each vendor item to a menu item row keyed by the vendor's id.
//! 3. Upsert the rows in one transaction against `(snapshot_id, external_item_id)`.
//!
//! Items stored by an earlier run that are missing from the current feed are
//! not pruned. A storage failure stops at the failing group; groups already
//! written stay written, and rerunning the ingestion completes the rest.

use crate::error::AppError;
use crate::services::menus::partition::DateGroup;
use crate::services::menus::vendor::VendorMenuItem;
use crate::store::{MenuStore, NewMenuItem};
use common::model::meal::Meal;
use common::model::menu::IngestResult;
use log::info;

pub fn reconcile(
    store: &MenuStore,
    dining_hall: &str,
    meal: Meal,
    groups: Vec<DateGroup>,
) -> Result<IngestResult, AppError> {
    for group in groups {
        let context = format!("{dining_hall} {meal} on {}", group.served_date);

        let snapshot = store
            .upsert_snapshot(dining_hall, meal, group.served_date)
            .map_err(|e| AppError::ingestion(format!("snapshot of {context}"), e))?;

        let rows: Vec<NewMenuItem> = group.items.into_iter().map(to_new_item).collect();
        let written = store
            .upsert_items(&snapshot.id, &rows)
            .map_err(|e| AppError::ingestion(format!("items of {context}"), e))?;

        info!("Reconciled {context}: {written} items");
    }

    Ok(IngestResult::ingested())
}

fn to_new_item(item: VendorMenuItem) -> NewMenuItem {
    NewMenuItem {
        external_item_id: item.id.to_string(),
        name: item.name,
        station_name: item.station_name,
    }
}
