use super::{Table, TableBackend};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Tables held in process memory. Used by tests and throwaway stores.
#[derive(Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Table>>,
}

impl TableBackend for MemoryBackend {
    fn ensure(&self, collection: &str) -> Result<()> {
        self.tables
            .write()
            .entry(collection.to_string())
            .or_insert_with(|| Table::empty(collection));
        Ok(())
    }

    fn read(&self, collection: &str) -> Result<Table> {
        if let Some(table) = self.tables.read().get(collection) {
            return Ok(table.clone());
        }
        self.ensure(collection)?;
        Ok(Table::empty(collection))
    }

    fn write(&self, collection: &str, table: &Table) -> Result<()> {
        self.tables
            .write()
            .insert(collection.to_string(), table.clone());
        Ok(())
    }
}
