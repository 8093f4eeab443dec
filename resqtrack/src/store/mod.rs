//! Tabular storage: one table per collection, read and rewritten whole.
//!
//! Every mutation is a read-modify-write cycle that holds the collection's
//! lock from the read until the rewrite has landed, so concurrent callers in
//! the same process serialize instead of overwriting each other's rows.

mod csv_backend;
mod memory;

pub use csv_backend::CsvBackend;
pub use memory::MemoryBackend;

use crate::error::{ResqError, Result};
use crate::schema;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

/// One record: field name -> stored text.
pub type Row = BTreeMap<String, String>;

/// A collection's header plus its rows in storage order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub fields: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    /// Zero rows, shaped by the registered schema (no fields for ad-hoc collections).
    pub fn empty(collection: &str) -> Self {
        Table {
            fields: schema::headers_for(collection),
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn last(&self) -> Option<&Row> {
        self.rows.last()
    }

    /// Values of one field, in row order. Missing values read as "".
    pub fn column<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(field).map(String::as_str).unwrap_or(""))
    }

    /// Conform `row` to the collection's shape and push it last.
    pub fn insert(&mut self, collection: &str, row: Row) -> Result<()> {
        let row = self.conform_row(collection, row)?;
        self.rows.push(row);
        Ok(())
    }

    /// Bring every row to exactly the table's field set.
    ///
    /// Known collections reject fields outside their schema. Ad-hoc
    /// collections grow their header instead, and earlier rows are padded.
    pub(crate) fn conform(&mut self, collection: &str) -> Result<()> {
        if schema::fields_for(collection).is_some() {
            self.fields = schema::headers_for(collection);
        }
        let rows = std::mem::take(&mut self.rows);
        let mut conformed = Vec::with_capacity(rows.len());
        for row in rows {
            conformed.push(self.conform_row(collection, row)?);
        }
        for row in &mut conformed {
            for field in &self.fields {
                row.entry(field.clone()).or_default();
            }
        }
        self.rows = conformed;
        Ok(())
    }

    fn conform_row(&mut self, collection: &str, mut row: Row) -> Result<Row> {
        match schema::fields_for(collection) {
            Some(fields) => {
                if let Some(extra) = row.keys().find(|k| !fields.contains(&k.as_str())) {
                    return Err(ResqError::Validation(format!(
                        "Unexpected field '{extra}' for collection '{collection}'"
                    )));
                }
                for field in fields {
                    row.entry(field.to_string()).or_default();
                }
            }
            None => {
                for key in row.keys() {
                    if !self.fields.contains(key) {
                        self.fields.push(key.clone());
                    }
                }
                for field in &self.fields {
                    row.entry(field.clone()).or_default();
                }
            }
        }
        Ok(row)
    }
}

/// Where tables physically live.
///
/// Backends only move whole tables in and out; shaping, validation and
/// locking are the store's job.
pub trait TableBackend: Send + Sync {
    /// Create the collection's storage with its schema header if it is absent.
    fn ensure(&self, collection: &str) -> Result<()>;

    /// Load the whole table. An empty file may come back with no fields.
    fn read(&self, collection: &str) -> Result<Table>;

    /// Replace the whole table.
    fn write(&self, collection: &str, table: &Table) -> Result<()>;
}

/// Schema-aware table store over an injected backend.
pub struct TabularStore {
    backend: Box<dyn TableBackend>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl TabularStore {
    pub fn new(backend: impl TableBackend + 'static) -> Self {
        TabularStore {
            backend: Box::new(backend),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// CSV files under `dir`, one per collection.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        Self::new(CsvBackend::new(dir))
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::default())
    }

    fn lock_for(&self, collection: &str) -> Result<Arc<Mutex<()>>> {
        schema::check_name(collection)?;
        Ok(self
            .locks
            .lock()
            .entry(collection.to_string())
            .or_default()
            .clone())
    }

    pub fn ensure(&self, collection: &str) -> Result<()> {
        let lock = self.lock_for(collection)?;
        let _guard = lock.lock();
        self.backend.ensure(collection)
    }

    /// Every row in storage order. Missing or empty storage reads as an
    /// empty table with the registered field list.
    pub fn read_all(&self, collection: &str) -> Result<Table> {
        let lock = self.lock_for(collection)?;
        let _guard = lock.lock();
        self.load(collection)
    }

    /// Replace the stored table with `table`, keeping row order.
    pub fn write_all(&self, collection: &str, mut table: Table) -> Result<()> {
        let lock = self.lock_for(collection)?;
        let _guard = lock.lock();
        table.conform(collection)?;
        self.backend.write(collection, &table)
    }

    /// Run `f` against the current table under the collection lock and
    /// write the result back if `f` succeeds. An error from `f` leaves
    /// storage untouched.
    ///
    /// `f` must not call back into this store for the same collection.
    pub fn modify<T, F>(&self, collection: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        self.transact(collection, |table| f(table).map(|value| (value, true)))
    }

    /// Push `row` last and return the full table as written.
    pub fn append(&self, collection: &str, row: Row) -> Result<Table> {
        self.modify(collection, |table| {
            table.insert(collection, row)?;
            Ok(table.clone())
        })
    }

    /// Remove every matching row. Returns how many were removed.
    pub fn delete_where<P>(&self, collection: &str, predicate: P) -> Result<usize>
    where
        P: Fn(&Row) -> bool,
    {
        self.transact(collection, |table| {
            let before = table.rows.len();
            table.rows.retain(|row| !predicate(row));
            let removed = before - table.rows.len();
            Ok((removed, removed > 0))
        })
    }

    /// Overwrite `updates` on every matching row, leaving other fields as
    /// they are. Returns how many rows matched.
    pub fn update_where<P>(&self, collection: &str, predicate: P, updates: &Row) -> Result<usize>
    where
        P: Fn(&Row) -> bool,
    {
        self.transact(collection, |table| {
            let mut matched = 0;
            for row in table.rows.iter_mut() {
                if !predicate(&*row) {
                    continue;
                }
                for (field, value) in updates {
                    row.insert(field.clone(), value.clone());
                }
                matched += 1;
            }
            Ok((matched, matched > 0))
        })
    }

    fn transact<T, F>(&self, collection: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<(T, bool)>,
    {
        let lock = self.lock_for(collection)?;
        let _guard = lock.lock();

        let mut table = self.load(collection)?;
        let (value, dirty) = f(&mut table)?;
        if dirty {
            table.conform(collection)?;
            self.backend.write(collection, &table)?;
            log::debug!("Wrote {} rows to '{collection}'", table.rows.len());
        }
        Ok(value)
    }

    /// Read through the backend and check the header against the schema.
    fn load(&self, collection: &str) -> Result<Table> {
        let mut table = self.backend.read(collection)?;

        if table.fields.is_empty() && table.rows.is_empty() {
            return Ok(Table::empty(collection));
        }

        if let Some(fields) = schema::fields_for(collection) {
            let matches = table.fields.len() == fields.len()
                && fields.iter().all(|f| table.fields.iter().any(|h| h == f));
            if !matches {
                return Err(ResqError::malformed(
                    collection,
                    format!(
                        "header [{}] does not match schema [{}]",
                        table.fields.join(", "),
                        fields.join(", ")
                    ),
                ));
            }
            table.fields = schema::headers_for(collection);
        }

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pairs: &[(&str, &str)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn case_row(id: &str, status: &str) -> Row {
        row(&[
            ("case_id", id),
            ("reporter_name", "Asha"),
            ("reporter_phone", "555-0101"),
            ("location", "MG Road"),
            ("animal_type", "Dog"),
            ("urgency", "High"),
            ("notes", "limping"),
            ("media_url", ""),
            ("status", status),
            ("assigned_hospital", ""),
            ("created_at", "2024-05-01 10:00:00"),
        ])
    }

    fn by_case_id(id: &'static str) -> impl Fn(&Row) -> bool {
        move |r: &Row| r.get("case_id").map(String::as_str) == Some(id)
    }

    #[test]
    fn test_read_fresh_collection_is_schema_shaped() {
        let store = TabularStore::in_memory();
        let table = store.read_all("donations").unwrap();
        assert!(table.is_empty());
        assert_eq!(
            table.fields,
            vec!["donor_name", "donor_email", "amount", "category", "created_at"]
        );
    }

    #[test]
    fn test_append_then_read_round_trips() {
        let store = TabularStore::in_memory();
        store.append("cases", case_row("RSQ-00001", "Reported")).unwrap();
        let returned = store.append("cases", case_row("RSQ-00002", "Reported")).unwrap();

        let table = store.read_all("cases").unwrap();
        assert_eq!(table, returned);
        assert_eq!(table.last(), Some(&case_row("RSQ-00002", "Reported")));
    }

    #[test]
    fn test_append_fills_missing_fields() {
        let store = TabularStore::in_memory();
        let table = store
            .append("donations", row(&[("donor_name", "Ravi"), ("amount", "250")]))
            .unwrap();
        let last = table.last().unwrap();
        assert_eq!(last.len(), 5);
        assert_eq!(last["donor_email"], "");
    }

    #[test]
    fn test_append_rejects_unknown_field() {
        let store = TabularStore::in_memory();
        let err = store
            .append("hospitals", row(&[("name", "City Vet"), ("rating", "5")]))
            .unwrap_err();
        assert!(matches!(err, ResqError::Validation(_)));
        assert!(store.read_all("hospitals").unwrap().is_empty());
    }

    #[test]
    fn test_update_where_touches_only_matching_row() {
        let store = TabularStore::in_memory();
        for id in ["RSQ-00001", "RSQ-00002", "RSQ-00003"] {
            store.append("cases", case_row(id, "Reported")).unwrap();
        }

        let updates = row(&[("status", "Resolved")]);
        let matched = store
            .update_where("cases", by_case_id("RSQ-00002"), &updates)
            .unwrap();
        assert_eq!(matched, 1);

        let table = store.read_all("cases").unwrap();
        assert_eq!(table.rows[0], case_row("RSQ-00001", "Reported"));
        assert_eq!(table.rows[1], case_row("RSQ-00002", "Resolved"));
        assert_eq!(table.rows[2], case_row("RSQ-00003", "Reported"));
    }

    #[test]
    fn test_delete_where_preserves_order() {
        let store = TabularStore::in_memory();
        for id in ["RSQ-00001", "RSQ-00002", "RSQ-00003"] {
            store.append("cases", case_row(id, "Reported")).unwrap();
        }

        let removed = store.delete_where("cases", by_case_id("RSQ-00002")).unwrap();
        assert_eq!(removed, 1);

        let table = store.read_all("cases").unwrap();
        let ids: Vec<&str> = table.column("case_id").collect();
        assert_eq!(ids, vec!["RSQ-00001", "RSQ-00003"]);
    }

    #[test]
    fn test_modify_error_leaves_storage_untouched() {
        let store = TabularStore::in_memory();
        store.append("cases", case_row("RSQ-00001", "Reported")).unwrap();

        let result: Result<()> = store.modify("cases", |table| {
            table.rows.clear();
            Err(ResqError::Validation("abort".into()))
        });
        assert!(result.is_err());
        assert_eq!(store.read_all("cases").unwrap().len(), 1);
    }

    #[test]
    fn test_write_all_replaces_content() {
        let store = TabularStore::in_memory();
        store.append("cases", case_row("RSQ-00001", "Reported")).unwrap();

        let mut table = Table::empty("cases");
        table.rows.push(case_row("RSQ-00007", "Rescued"));
        store.write_all("cases", table).unwrap();

        let read = store.read_all("cases").unwrap();
        assert_eq!(read.rows, vec![case_row("RSQ-00007", "Rescued")]);
    }

    #[test]
    fn test_ad_hoc_collection_grows_header() {
        let store = TabularStore::in_memory();
        store.append("volunteers", row(&[("name", "Meera")])).unwrap();
        let table = store
            .append("volunteers", row(&[("name", "Kabir"), ("shift", "night")]))
            .unwrap();

        assert_eq!(table.fields, vec!["name", "shift"]);
        assert_eq!(table.rows[0]["shift"], "");
        assert_eq!(table.rows[1]["shift"], "night");
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        let store = Arc::new(TabularStore::in_memory());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let name = format!("donor-{t}-{i}");
                        store
                            .append("donations", row(&[("donor_name", name.as_str())]))
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.read_all("donations").unwrap().len(), 200);
    }
}
