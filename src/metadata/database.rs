//! Metadata table engine
//!
//! A key-addressed table of [`MetadataEntry`] rows. The table is either volatile
//! or backed by a JSON file that is rewritten atomically (temporary file, then
//! rename) on every mutation. One instance is opened per process and shared by
//! `Arc`; [`MetadataDatabase::close`] is the teardown.

use log::{error, info};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::error::MetadataError;
use crate::metadata::entry::MetadataEntry;

type Rows = BTreeMap<String, MetadataEntry>;

struct Table {
    rows: Rows,
    open: bool,
}

pub struct MetadataDatabase {
    file: Option<PathBuf>,
    table: Mutex<Table>,
}

impl MetadataDatabase {
    /// A table that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            table: Mutex::new(Table {
                rows: Rows::new(),
                open: true,
            }),
        }
    }

    /// Opens (or initializes) the table stored at `file`.
    ///
    /// Missing parent directories are created and an absent file starts an
    /// empty table, which is written out immediately.
    pub fn open(file: impl Into<PathBuf>) -> Result<Self, MetadataError> {
        let file = file.into();
        if let Some(parent) = file.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let rows: Rows = match fs::read(&file) {
            Ok(bytes) if bytes.is_empty() => Rows::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Rows::new(),
            Err(e) => return Err(e.into()),
        };
        write_table(&file, &rows)?;

        info!(
            "Opened metadata table {} ({} entries)",
            file.display(),
            rows.len()
        );

        Ok(Self {
            file: Some(file),
            table: Mutex::new(Table { rows, open: true }),
        })
    }

    pub fn get(&self, key: &str) -> Result<Option<MetadataEntry>, MetadataError> {
        let table = self.lock()?;
        Ok(table.rows.get(key).cloned())
    }

    /// Read-modify-write of one row under the table lock.
    ///
    /// `f` receives the current row and returns its replacement. If the table
    /// cannot be persisted the previous row is restored and the error returned.
    pub fn update<F>(&self, key: &str, f: F) -> Result<MetadataEntry, MetadataError>
    where
        F: FnOnce(Option<&MetadataEntry>) -> Result<MetadataEntry, MetadataError>,
    {
        let mut table = self.lock()?;
        let next = f(table.rows.get(key))?;
        let previous = table.rows.insert(key.to_string(), next.clone());

        if let Err(e) = self.persist(&table.rows) {
            match previous {
                Some(row) => table.rows.insert(key.to_string(), row),
                None => table.rows.remove(key),
            };
            error!("Failed to persist metadata for {}: {}", key, e);
            return Err(e);
        }

        Ok(next)
    }

    /// Removes a row. Returns whether a row existed.
    pub fn remove(&self, key: &str) -> Result<bool, MetadataError> {
        let mut table = self.lock()?;
        let Some(previous) = table.rows.remove(key) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&table.rows) {
            table.rows.insert(key.to_string(), previous);
            error!("Failed to persist removal of {}: {}", key, e);
            return Err(e);
        }

        Ok(true)
    }

    pub fn len(&self) -> Result<usize, MetadataError> {
        Ok(self.lock()?.rows.len())
    }

    pub fn is_empty(&self) -> Result<bool, MetadataError> {
        Ok(self.lock()?.rows.is_empty())
    }

    /// Writes the whole table to its backing file.
    pub fn flush(&self) -> Result<(), MetadataError> {
        let table = self.lock()?;
        self.persist(&table.rows)
    }

    /// Flushes and closes the table; every later call fails with
    /// [`MetadataError::Closed`].
    pub fn close(&self) -> Result<(), MetadataError> {
        self.flush()?;
        let mut table = self.lock()?;
        table.open = false;
        info!("Metadata table closed ({} entries)", table.rows.len());
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Table>, MetadataError> {
        let table = self.table.lock().map_err(|_| MetadataError::LockPoisoned)?;
        if !table.open {
            return Err(MetadataError::Closed);
        }
        Ok(table)
    }

    fn persist(&self, rows: &Rows) -> Result<(), MetadataError> {
        match &self.file {
            Some(file) => write_table(file, rows),
            None => Ok(()),
        }
    }
}

fn temp_path(file: &Path) -> PathBuf {
    file.with_extension(format!(
        "{}.tmp",
        file.extension().and_then(|ext| ext.to_str()).unwrap_or("")
    ))
}

fn write_table(file: &Path, rows: &Rows) -> Result<(), MetadataError> {
    let temp = temp_path(file);
    let json = serde_json::to_vec_pretty(rows)?;

    let result = fs::File::create(&temp)
        .and_then(|mut f| {
            f.write_all(&json)?;
            f.sync_all()
        })
        .and_then(|_| fs::rename(&temp, file));

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }
    Ok(())
}
