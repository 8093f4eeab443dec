use super::{Row, Table, TableBackend};
use crate::error::Result;
use crate::schema;
use std::path::{Path, PathBuf};

/// One `<collection>.csv` per collection under a root directory.
///
/// Files are created lazily with the schema header. Writes go to a temp
/// file in the same directory and are renamed over the original.
pub struct CsvBackend {
    root: PathBuf,
}

impl CsvBackend {
    pub fn new(root: impl AsRef<Path>) -> Self {
        CsvBackend {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, collection: &str) -> Result<PathBuf> {
        schema::check_name(collection)?;
        Ok(self.root.join(format!("{collection}.csv")))
    }
}

impl TableBackend for CsvBackend {
    fn ensure(&self, collection: &str) -> Result<()> {
        let path = self.path_for(collection)?;
        if path.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.root)?;
        let headers = schema::headers_for(collection);
        write_table(
            &self.root,
            &path,
            &Table {
                fields: headers.clone(),
                rows: Vec::new(),
            },
        )?;

        if headers.is_empty() {
            log::info!("Created empty {}", path.display());
        } else {
            log::info!("Created {} with schema: {:?}", path.display(), headers);
        }
        Ok(())
    }

    fn read(&self, collection: &str) -> Result<Table> {
        self.ensure(collection)?;
        let bytes = std::fs::read(self.path_for(collection)?)?;
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Table::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(bytes.as_slice());
        let fields: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let row: Row = fields
                .iter()
                .cloned()
                .zip(record.iter().map(String::from))
                .collect();
            rows.push(row);
        }

        Ok(Table { fields, rows })
    }

    fn write(&self, collection: &str, table: &Table) -> Result<()> {
        let path = self.path_for(collection)?;
        std::fs::create_dir_all(&self.root)?;
        write_table(&self.root, &path, table)
    }
}

fn write_table(dir: &Path, path: &Path, table: &Table) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
        if !table.fields.is_empty() {
            writer.write_record(&table.fields)?;
            for row in &table.rows {
                writer.write_record(
                    table
                        .fields
                        .iter()
                        .map(|f| row.get(f).map(String::as_str).unwrap_or("")),
                )?;
            }
        }
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
