//! Ephemeral table store - optimistic local CRUD without a backend
//!
//! Pages use this to demo create/update/delete flows against a named
//! table without mutating shared backend state. Contents are per
//! process: always lost on restart, by design. Synthetic ids start at
//! 1000 (and always stay above any adopted row's id) so demo rows are
//! recognizable next to seeded ones.

use crate::Row;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Smallest synthetic id ever handed out
const FIRST_SYNTHETIC_ID: i64 = 1000;

/// Tables the store serves. Anything else is programmer error.
const TABLES: &[&str] = &[
    "resources",
    "events",
    "forums",
    "notifications",
    "sectors",
    "users",
    "content",
    "sector_connections",
];

struct TableState {
    /// Newest-first: `create` prepends.
    rows: Vec<Row>,
    next_id: i64,
    initialized: bool,
}

impl TableState {
    fn empty() -> Self {
        Self {
            rows: Vec::new(),
            next_id: FIRST_SYNTHETIC_ID,
            initialized: false,
        }
    }

    fn adopt(&mut self, rows: Vec<Row>) {
        let max_id = rows.iter().filter_map(row_id).max().unwrap_or(0);
        self.next_id = (max_id + 1).max(FIRST_SYNTHETIC_ID);
        self.rows = rows;
    }
}

fn row_id(row: &Row) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

/// In-memory table-keyed record store.
pub struct TempStore {
    tables: Mutex<HashMap<&'static str, TableState>>,
}

impl TempStore {
    /// A store pre-seeded with the demo fixtures.
    pub fn new() -> Self {
        let store = Self::empty();
        store.load_fixtures();
        store
    }

    /// A store with every known table registered but no rows (tests).
    pub fn empty() -> Self {
        let mut tables = HashMap::new();
        for table in TABLES {
            tables.insert(*table, TableState::empty());
        }
        Self {
            tables: Mutex::new(tables),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<&'static str, TableState>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Panics on unknown table names: the table set is fixed and a miss
    /// is a bug at the call site, not a runtime condition.
    fn with_table<R>(&self, table: &str, f: impl FnOnce(&mut TableState) -> R) -> R {
        let mut tables = self.lock();
        let state = tables
            .get_mut(table)
            .unwrap_or_else(|| panic!("unknown temp table: {table}"));
        f(state)
    }

    /// Adopt existing rows as the table's content. One-time per table
    /// per process: later calls (and calls with no rows) are ignored,
    /// leaving whatever the table already holds.
    pub fn initialize(&self, table: &str, rows: Vec<Row>) {
        self.with_table(table, |state| {
            if state.initialized || rows.is_empty() {
                return;
            }
            state.adopt(rows);
            state.initialized = true;
        });
    }

    /// Insert a record with a fresh synthetic id and creation stamp.
    /// The new record goes first: iteration order is newest-created
    /// first.
    pub fn create(&self, table: &str, mut record: Row) -> Row {
        self.with_table(table, |state| {
            let id = state.next_id;
            state.next_id += 1;
            record.insert("id".to_string(), Value::from(id));
            record.insert(
                "created_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            state.rows.insert(0, record.clone());
            record
        })
    }

    /// Overlay a patch onto the matching record and stamp `updated_at`.
    /// `None` signals "not found" - absence is not an error here.
    pub fn update(&self, table: &str, id: i64, patch: Row) -> Option<Row> {
        self.with_table(table, |state| {
            let row = state.rows.iter_mut().find(|row| row_id(row) == Some(id))?;
            for (key, value) in patch {
                row.insert(key, value);
            }
            row.insert(
                "updated_at".to_string(),
                Value::String(chrono::Utc::now().to_rfc3339()),
            );
            Some(row.clone())
        })
    }

    /// Remove and return the matching record; `None` when absent, so a
    /// second delete of the same id is a quiet no-op.
    pub fn delete(&self, table: &str, id: i64) -> Option<Row> {
        self.with_table(table, |state| {
            let index = state.rows.iter().position(|row| row_id(row) == Some(id))?;
            Some(state.rows.remove(index))
        })
    }

    /// Current contents, newest-created first.
    pub fn get_all(&self, table: &str) -> Vec<Row> {
        self.with_table(table, |state| state.rows.clone())
    }

    fn load_fixtures(&self) {
        for (table, rows) in fixtures() {
            self.with_table(table, |state| state.adopt(rows));
        }
    }
}

impl Default for TempStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide store instance shared by every page.
pub fn temp_store() -> &'static TempStore {
    static STORE: OnceLock<TempStore> = OnceLock::new();
    STORE.get_or_init(TempStore::new)
}

fn rows(values: Vec<Value>) -> Vec<Row> {
    values
        .into_iter()
        .filter_map(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect()
}

/// Sample rows shown when a page opts into local CRUD before any
/// backend rows were adopted.
fn fixtures() -> Vec<(&'static str, Vec<Row>)> {
    use serde_json::json;
    vec![
        (
            "sectors",
            rows(vec![
                json!({
                    "id": 1,
                    "name": "AgroBank",
                    "type": "Finance",
                    "contact": "contact@agrobank.com",
                    "region": "National",
                    "description": "Micro-financing and crop insurance services"
                }),
                json!({
                    "id": 2,
                    "name": "Harvest Logistics",
                    "type": "Logistics",
                    "contact": "support@harvestlogistics.com",
                    "region": "North India",
                    "description": "Cold chain and transportation partners"
                }),
                json!({
                    "id": 3,
                    "name": "Seed Innovators",
                    "type": "Technology",
                    "contact": "hello@seedinnovators.com",
                    "region": "West India",
                    "description": "R&D for climate resilient seeds"
                }),
            ]),
        ),
        (
            "resources",
            rows(vec![
                json!({
                    "id": 1,
                    "title": "Organic Farming Guide",
                    "category": "Guides",
                    "description": "Complete guide to organic farming practices",
                    "link": "https://example.com/organic-guide",
                    "file_name": null,
                    "file_blob": null,
                    "created_by": 2,
                    "author_name": "Ravi Kumar",
                    "created_at": "2024-01-15T10:00:00Z"
                }),
                json!({
                    "id": 2,
                    "title": "Crop Insurance Schemes",
                    "category": "Finance",
                    "description": "Government crop insurance schemes explained",
                    "link": null,
                    "file_name": "insurance_schemes.pdf",
                    "file_blob": null,
                    "created_by": 2,
                    "author_name": "Ravi Kumar",
                    "created_at": "2024-01-10T14:30:00Z"
                }),
                json!({
                    "id": 3,
                    "title": "Drip Irrigation Manual",
                    "category": "Technology",
                    "description": "Installation and maintenance guide for drip irrigation",
                    "link": "https://example.com/drip-irrigation",
                    "file_name": null,
                    "file_blob": null,
                    "created_by": 3,
                    "author_name": "Meera Patel",
                    "created_at": "2024-01-08T09:15:00Z"
                }),
            ]),
        ),
        (
            "events",
            rows(vec![
                json!({
                    "id": 1,
                    "name": "Organic Farming Workshop",
                    "description": "Learn organic farming techniques from experts",
                    "start_date": "2024-02-15T09:00:00Z",
                    "end_date": "2024-02-15T17:00:00Z",
                    "location": "Community Center, Pune",
                    "sector_id": 1,
                    "created_by": 2,
                    "creator_name": "Ravi Kumar",
                    "created_at": "2024-01-20T11:00:00Z"
                }),
                json!({
                    "id": 2,
                    "name": "Financial Literacy Camp",
                    "description": "Understanding loans and insurance for farmers",
                    "start_date": "2024-02-20T10:00:00Z",
                    "end_date": "2024-02-20T16:00:00Z",
                    "location": "District Hall, Nashik",
                    "sector_id": 1,
                    "created_by": 3,
                    "creator_name": "Meera Patel",
                    "created_at": "2024-01-18T13:30:00Z"
                }),
            ]),
        ),
        (
            "forums",
            rows(vec![
                json!({
                    "id": 1,
                    "title": "Pest Control Discussion",
                    "description": "Share experiences with organic pest control methods",
                    "created_by": 2,
                    "author_name": "Ravi Kumar",
                    "sector": "Technology",
                    "created_at": "2024-01-12T08:00:00Z"
                }),
                json!({
                    "id": 2,
                    "title": "Water Conservation Techniques",
                    "description": "Discuss efficient water usage in agriculture",
                    "created_by": 3,
                    "author_name": "Meera Patel",
                    "sector": "Technology",
                    "created_at": "2024-01-11T16:45:00Z"
                }),
            ]),
        ),
        (
            "notifications",
            rows(vec![
                json!({
                    "id": 1,
                    "user_id": null,
                    "title": "New Government Scheme",
                    "message": "PM Kisan Samman Nidhi next installment released",
                    "level": "info",
                    "user_name": "All users",
                    "created_at": "2024-01-25T10:30:00Z"
                }),
                json!({
                    "id": 2,
                    "user_id": 2,
                    "title": "Workshop Reminder",
                    "message": "Organic farming workshop tomorrow at 9 AM",
                    "level": "reminder",
                    "user_name": "Ravi Kumar",
                    "created_at": "2024-02-14T18:00:00Z"
                }),
            ]),
        ),
        (
            "sector_connections",
            rows(vec![
                json!({
                    "id": 1,
                    "user_id": 2,
                    "sector_id": 1,
                    "status": "active",
                    "notes": "Regular customer for crop insurance",
                    "user_name": "Ravi Kumar",
                    "sector_name": "AgroBank",
                    "sector_type": "Finance",
                    "created_at": "2024-01-05T12:00:00Z"
                }),
                json!({
                    "id": 2,
                    "user_id": 2,
                    "sector_id": 2,
                    "status": "pending",
                    "notes": "Interested in cold storage facilities",
                    "user_name": "Ravi Kumar",
                    "sector_name": "Harvest Logistics",
                    "sector_type": "Logistics",
                    "created_at": "2024-01-22T15:30:00Z"
                }),
            ]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_fixtures_loaded() {
        let store = TempStore::new();
        assert_eq!(store.get_all("sectors").len(), 3);
        assert_eq!(store.get_all("events").len(), 2);
        assert!(store.get_all("users").is_empty());
    }

    #[test]
    fn test_create_assigns_synthetic_id_and_prepends() {
        let store = TempStore::new();
        let created = store.create(
            "sectors",
            record(json!({ "name": "Test Co", "type": "Finance" })),
        );

        let id = created["id"].as_i64().unwrap();
        assert!(id >= 1000);
        assert!(created["created_at"].is_string());

        let all = store.get_all("sectors");
        assert_eq!(all.len(), 4);
        assert_eq!(all[0]["name"], json!("Test Co"));
    }

    #[test]
    fn test_created_ids_increase() {
        let store = TempStore::new();
        let a = store.create("users", record(json!({ "name": "A" })));
        let b = store.create("users", record(json!({ "name": "B" })));
        assert_eq!(
            b["id"].as_i64().unwrap(),
            a["id"].as_i64().unwrap() + 1
        );
        // Newest first.
        assert_eq!(store.get_all("users")[0]["name"], json!("B"));
    }

    #[test]
    fn test_update_overlays_patch() {
        let store = TempStore::new();
        let updated = store
            .update("sectors", 1, record(json!({ "region": "Pan-India" })))
            .unwrap();

        // Patched field changed, untouched fields survive.
        assert_eq!(updated["region"], json!("Pan-India"));
        assert_eq!(updated["name"], json!("AgroBank"));
        assert!(updated["updated_at"].is_string());

        let matching: Vec<_> = store
            .get_all("sectors")
            .into_iter()
            .filter(|row| row["id"] == json!(1))
            .collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0]["region"], json!("Pan-India"));
    }

    #[test]
    fn test_update_missing_returns_none() {
        let store = TempStore::new();
        assert!(store.update("sectors", 999, Row::new()).is_none());
    }

    #[test]
    fn test_delete_is_idempotent_on_absence() {
        let store = TempStore::new();
        let deleted = store.delete("sectors", 2).unwrap();
        assert_eq!(deleted["name"], json!("Harvest Logistics"));

        assert!(
            !store
                .get_all("sectors")
                .iter()
                .any(|row| row["id"] == json!(2))
        );
        assert!(store.delete("sectors", 2).is_none());
    }

    #[test]
    fn test_initialize_adopts_rows_once() {
        let store = TempStore::empty();
        store.initialize(
            "users",
            vec![record(json!({ "id": 7, "name": "Seeded" }))],
        );
        assert_eq!(store.get_all("users").len(), 1);

        // A second initialize must not clobber the adopted state.
        store.initialize(
            "users",
            vec![record(json!({ "id": 8, "name": "Other" }))],
        );
        assert_eq!(store.get_all("users")[0]["name"], json!("Seeded"));
    }

    #[test]
    fn test_initialize_seeds_next_id_above_max() {
        let store = TempStore::empty();
        store.initialize(
            "users",
            vec![record(json!({ "id": 2500, "name": "High" }))],
        );
        let created = store.create("users", record(json!({ "name": "Next" })));
        assert_eq!(created["id"], json!(2501));
    }

    #[test]
    fn test_empty_initialize_keeps_fixtures() {
        let store = TempStore::new();
        store.initialize("sectors", Vec::new());
        assert_eq!(store.get_all("sectors").len(), 3);
    }

    #[test]
    #[should_panic(expected = "unknown temp table")]
    fn test_unknown_table_panics() {
        TempStore::new().get_all("spaceships");
    }

    #[test]
    fn test_process_wide_store_is_shared() {
        let created = temp_store().create("content", record(json!({ "title": "Shared" })));
        let id = created["id"].as_i64().unwrap();
        assert!(
            temp_store()
                .get_all("content")
                .iter()
                .any(|row| row["id"] == json!(id))
        );
    }
}
