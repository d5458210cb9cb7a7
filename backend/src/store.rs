//! # Menu Store
//!
//! SQLite persistence for menu snapshots and their items.
//!
//! The store is the only place that knows the table layout. It hands out typed
//! records (`MenuSnapshot`, `MenuItem`) and never raw rows.
//!
//! ## Schema
//! - `menu_snapshots`: one row per `(dining_hall, meal, served_date)`, enforced
//!   by a unique constraint.
//! - `menu_items`: one row per `(snapshot_id, external_item_id)`, enforced by a
//!   unique constraint, deleted with its snapshot.
//!
//! ## Concurrency
//! Both upserts rely on `ON CONFLICT` against those constraints, so two
//! processes ingesting the same week against the same database file converge
//! on the same rows. The busy timeout makes a second writer wait for the
//! first instead of failing with `SQLITE_BUSY`.

use chrono::NaiveDate;
use common::model::meal::Meal;
use common::model::menu::{MenuItem, MenuSnapshot};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// A menu item about to be written. The store assigns the row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMenuItem {
    pub name: String,
    pub external_item_id: String,
    pub station_name: Option<String>,
}

/// Handle to the menu database. Cheap to clone; clones share one connection.
#[derive(Clone)]
pub struct MenuStore {
    conn: Arc<Mutex<Connection>>,
}

impl MenuStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let store = Self::from_connection(Connection::open_in_memory()?)?;
        store.migrate()?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn migrate(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "\
            CREATE TABLE IF NOT EXISTS menu_snapshots (
                id TEXT PRIMARY KEY,
                dining_hall TEXT NOT NULL,
                meal TEXT NOT NULL CHECK (meal IN ('breakfast', 'lunch', 'dinner')),
                served_date TEXT NOT NULL,
                UNIQUE(dining_hall, meal, served_date)
            );
            CREATE TABLE IF NOT EXISTS menu_items (
                id TEXT PRIMARY KEY,
                snapshot_id TEXT NOT NULL REFERENCES menu_snapshots(id) ON DELETE CASCADE,
                name TEXT NOT NULL,
                external_item_id TEXT NOT NULL,
                station_name TEXT,
                UNIQUE(snapshot_id, external_item_id)
            );
            CREATE INDEX IF NOT EXISTS idx_menu_items_snapshot ON menu_items(snapshot_id);
            ",
        )?;
        Ok(())
    }

    /// Inserts the snapshot for `(dining_hall, meal, served_date)` or returns the
    /// one already stored, in a single statement.
    ///
    /// The `DO UPDATE` rewrites `dining_hall` with its own value so that
    /// `RETURNING` yields the existing row; a `DO NOTHING` would return nothing.
    pub fn upsert_snapshot(
        &self,
        dining_hall: &str,
        meal: Meal,
        served_date: NaiveDate,
    ) -> Result<MenuSnapshot, StoreError> {
        let conn = self.lock()?;
        let snapshot = conn.query_row(
            "INSERT INTO menu_snapshots (id, dining_hall, meal, served_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(dining_hall, meal, served_date) DO UPDATE SET
                dining_hall = menu_snapshots.dining_hall
             RETURNING id, dining_hall, meal, served_date",
            params![new_id(), dining_hall, StoredMeal(meal), served_date],
            snapshot_from_row,
        )?;
        Ok(snapshot)
    }

    /// Upserts a batch of items under one snapshot in one transaction.
    ///
    /// Rows matching `(snapshot_id, external_item_id)` get the new name and
    /// station. Items stored earlier but missing from `items` are kept.
    pub fn upsert_items(
        &self,
        snapshot_id: &str,
        items: &[NewMenuItem],
    ) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO menu_items (id, snapshot_id, name, external_item_id, station_name)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(snapshot_id, external_item_id) DO UPDATE SET
                    name = excluded.name,
                    station_name = excluded.station_name",
            )?;
            for item in items {
                written += stmt.execute(params![
                    new_id(),
                    snapshot_id,
                    item.name,
                    item.external_item_id,
                    item.station_name,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    pub fn find_snapshot(
        &self,
        dining_hall: &str,
        meal: Meal,
        served_date: NaiveDate,
    ) -> Result<Option<MenuSnapshot>, StoreError> {
        let conn = self.lock()?;
        let snapshot = conn
            .query_row(
                "SELECT id, dining_hall, meal, served_date FROM menu_snapshots
                 WHERE dining_hall = ?1 AND meal = ?2 AND served_date = ?3",
                params![dining_hall, StoredMeal(meal), served_date],
                snapshot_from_row,
            )
            .optional()?;
        Ok(snapshot)
    }

    /// Items of one snapshot in the order they were first stored.
    pub fn items_for_snapshot(&self, snapshot_id: &str) -> Result<Vec<MenuItem>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, snapshot_id, name, external_item_id, station_name
             FROM menu_items WHERE snapshot_id = ?1 ORDER BY rowid",
        )?;
        let items = stmt
            .query_map(params![snapshot_id], |row| {
                Ok(MenuItem {
                    id: row.get(0)?,
                    snapshot_id: row.get(1)?,
                    name: row.get(2)?,
                    external_item_id: row.get(3)?,
                    station_name: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    #[cfg(test)]
    pub fn count_snapshots(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(1) FROM menu_snapshots", [], |row| row.get(0))?)
    }

    /// Runs raw SQL against the store, e.g. to install a failing trigger.
    #[cfg(test)]
    pub fn execute_batch(&self, sql: &str) -> Result<(), StoreError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    #[cfg(test)]
    pub fn count_items(&self) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(1) FROM menu_items", [], |row| row.get(0))?)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn snapshot_from_row(row: &Row<'_>) -> rusqlite::Result<MenuSnapshot> {
    Ok(MenuSnapshot {
        id: row.get(0)?,
        dining_hall: row.get(1)?,
        meal: row.get::<_, StoredMeal>(2)?.0,
        served_date: row.get(3)?,
    })
}

/// Column adapter so a stored meal that is not one of the three known values
/// fails the row conversion instead of being guessed.
struct StoredMeal(Meal);

impl FromSql for StoredMeal {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse::<Meal>()
            .map(StoredMeal)
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

impl ToSql for StoredMeal {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    fn item(external_id: &str, name: &str, station: Option<&str>) -> NewMenuItem {
        NewMenuItem {
            name: name.to_string(),
            external_item_id: external_id.to_string(),
            station_name: station.map(str::to_string),
        }
    }

    #[test]
    fn snapshot_upsert_returns_existing_row() {
        let store = MenuStore::open_in_memory().unwrap();
        let first = store.upsert_snapshot("Stevenson", Meal::Dinner, date(8)).unwrap();
        let second = store.upsert_snapshot("Stevenson", Meal::Dinner, date(8)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count_snapshots().unwrap(), 1);
    }

    #[test]
    fn snapshots_differing_only_by_meal_are_distinct() {
        let store = MenuStore::open_in_memory().unwrap();
        let lunch = store.upsert_snapshot("Stevenson", Meal::Lunch, date(8)).unwrap();
        let dinner = store.upsert_snapshot("Stevenson", Meal::Dinner, date(8)).unwrap();

        assert_ne!(lunch.id, dinner.id);
        assert_eq!(store.count_snapshots().unwrap(), 2);
        assert_eq!(
            store.find_snapshot("Stevenson", Meal::Lunch, date(8)).unwrap(),
            Some(lunch)
        );
    }

    #[test]
    fn item_upsert_overwrites_in_place_and_keeps_absent_rows() {
        let store = MenuStore::open_in_memory().unwrap();
        let snapshot = store.upsert_snapshot("Stevenson", Meal::Dinner, date(8)).unwrap();

        store
            .upsert_items(
                &snapshot.id,
                &[item("1", "Pasta", Some("Trattoria")), item("2", "Salad", None)],
            )
            .unwrap();
        let before = store.items_for_snapshot(&snapshot.id).unwrap();

        store
            .upsert_items(&snapshot.id, &[item("1", "Baked Ziti", Some("Trattoria Dinner"))])
            .unwrap();
        let after = store.items_for_snapshot(&snapshot.id).unwrap();

        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id, before[0].id);
        assert_eq!(after[0].name, "Baked Ziti");
        assert_eq!(after[0].station_name.as_deref(), Some("Trattoria Dinner"));
        assert_eq!(after[1], before[1]);
    }

    #[test]
    fn missing_snapshot_is_none() {
        let store = MenuStore::open_in_memory().unwrap();
        assert_eq!(store.find_snapshot("Stevenson", Meal::Breakfast, date(9)).unwrap(), None);
    }

    #[test]
    fn two_handles_on_one_file_share_constraints() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menus.sqlite");
        let a = MenuStore::open(&path).unwrap();
        a.migrate().unwrap();
        let b = MenuStore::open(&path).unwrap();
        b.migrate().unwrap();

        let from_a = a.upsert_snapshot("Stevenson", Meal::Lunch, date(10)).unwrap();
        let from_b = b.upsert_snapshot("Stevenson", Meal::Lunch, date(10)).unwrap();
        a.upsert_items(&from_a.id, &[item("7", "Soup", None)]).unwrap();
        b.upsert_items(&from_b.id, &[item("7", "Soup", Some("Kettle"))]).unwrap();

        assert_eq!(from_a.id, from_b.id);
        assert_eq!(a.count_snapshots().unwrap(), 1);
        assert_eq!(a.count_items().unwrap(), 1);
    }
}
