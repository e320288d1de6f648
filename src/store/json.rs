use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{row_key, Database, Row, StoreError, Table};

/// Store format version for compatibility checking
pub const STORE_VERSION: &str = "1.0.0";

/// Serializable store format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreData {
    pub version: String,
    pub updated_at: String,
    #[serde(default)]
    pub tables: BTreeMap<String, Vec<Row>>,
}

/// Test directory tables kept in one JSON document
///
/// Without a backing path the store lives in memory only. With a path, every
/// successful `upsert` rewrites the document atomically (temp file + rename),
/// so a crash never leaves a half-written store behind.
#[derive(Debug, Default)]
pub struct JsonStore {
    path: Option<PathBuf>,
    tables: BTreeMap<Table, Vec<Row>>,
}

impl JsonStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the store at `path`, starting empty if the file does not exist yet
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be read, or
    /// `StoreError::Json` if it is not a valid store document.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let mut store = if path.exists() {
            Self::load_from_file(path)?
        } else {
            debug!(path = %path.display(), "Store file not found, starting empty");
            Self::new()
        };
        store.path = Some(path.to_path_buf());
        Ok(store)
    }

    /// Load a store from a JSON file (read-only unless reopened with [`JsonStore::open`])
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Json` on failure.
    pub fn load_from_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a store from a JSON string
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Json` for malformed JSON or `StoreError::UnknownTable`
    /// for tables this version does not know about.
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let data: StoreData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != STORE_VERSION {
            warn!(
                expected = STORE_VERSION,
                found = %data.version,
                "Store version mismatch"
            );
        }

        let mut tables = BTreeMap::new();
        for (name, rows) in data.tables {
            tables.insert(name.parse::<Table>()?, rows);
        }

        Ok(Self { path: None, tables })
    }

    /// Export the store to JSON
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&Self::data(&self.tables))?)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of rows in `table`
    pub fn len(&self, table: Table) -> usize {
        self.tables.get(&table).map_or(0, Vec::len)
    }

    fn data(tables: &BTreeMap<Table, Vec<Row>>) -> StoreData {
        StoreData {
            version: STORE_VERSION.to_string(),
            updated_at: chrono::Utc::now().to_rfc3339(),
            tables: tables
                .iter()
                .map(|(table, rows)| (table.name().to_string(), rows.clone()))
                .collect(),
        }
    }

    fn persist(&self, tables: &BTreeMap<Table, Vec<Row>>) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&Self::data(tables))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl Database for JsonStore {
    fn read(&self, table: Table) -> Result<Vec<Row>, StoreError> {
        Ok(self.tables.get(&table).cloned().unwrap_or_default())
    }

    fn upsert(&mut self, table: Table, rows: &[Row]) -> Result<usize, StoreError> {
        // Validate every key before touching anything
        let mut keyed = Vec::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            let key = row_key(table, row).map_err(|column| StoreError::MissingKey {
                table,
                column,
                row: i,
            })?;
            keyed.push((key, row));
        }

        let mut tables = self.tables.clone();
        let existing = tables.entry(table).or_default();

        let mut index: BTreeMap<Vec<String>, usize> = existing
            .iter()
            .enumerate()
            .filter_map(|(i, row)| row_key(table, row).ok().map(|k| (k, i)))
            .collect();

        for (key, row) in keyed {
            if let Some(&i) = index.get(&key) {
                existing[i] = row.clone();
            } else {
                index.insert(key, existing.len());
                existing.push(row.clone());
            }
        }

        self.persist(&tables)?;
        self.tables = tables;

        debug!(table = %table, rows = rows.len(), "Upserted rows");
        Ok(rows.len())
    }
}
