pub mod error;
pub mod geocoding;
pub mod id;
pub mod media;
pub mod records;
pub mod schema;
pub mod store;
pub mod timestamp;

pub use error::{ResqError, Result};
pub use records::Records;
pub use schema::Collection;
pub use store::{CsvBackend, MemoryBackend, Row, Table, TableBackend, TabularStore};
