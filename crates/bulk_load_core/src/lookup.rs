//! Run-scoped name → id lookup tables.
//!
//! Provisioning writes one CSV per identifier kind into `tmp/`; every later
//! step resolves configured names through them. The files are disposable and
//! are removed again on teardown.

use std::fs::{self, File};
use std::io;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup table {path} is unavailable: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to write lookup table {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("no {table} entry for {key}")]
    Missing { table: &'static str, key: String },
    #[error("failed to clear {path}: {source}")]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub trait LookupRow: Serialize + DeserializeOwned {
    const TABLE: &'static str;
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRow {
    pub asset_model_name: String,
    pub asset_model_id: String,
}

impl LookupRow for ModelRow {
    const TABLE: &'static str = "asset model";
    const HEADERS: &'static [&'static str] = &["asset_model_name", "asset_model_id"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyRow {
    pub asset_model_name: String,
    pub child_asset_model_id: String,
    pub hierarchy_id: String,
}

impl LookupRow for HierarchyRow {
    const TABLE: &'static str = "hierarchy";
    const HEADERS: &'static [&'static str] =
        &["asset_model_name", "child_asset_model_id", "hierarchy_id"];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRow {
    pub asset_name: String,
    pub asset_id: String,
}

impl LookupRow for AssetRow {
    const TABLE: &'static str = "asset";
    const HEADERS: &'static [&'static str] = &["asset_name", "asset_id"];
}

/// Truncates a table on creation and flushes after every row, so an aborted
/// run still leaves the ids it obtained on disk.
pub struct LookupWriter<R: LookupRow> {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
    _row: PhantomData<R>,
}

impl<R: LookupRow> LookupWriter<R> {
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, LookupError> {
        let path = path.into();
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(|source| LookupError::Write {
                path: path.clone(),
                source,
            })?;
        writer
            .write_record(R::HEADERS)
            .and_then(|()| writer.flush().map_err(csv::Error::from))
            .map_err(|source| LookupError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            writer,
            rows: 0,
            _row: PhantomData,
        })
    }

    pub fn append(&mut self, row: &R) -> Result<(), LookupError> {
        self.writer
            .serialize(row)
            .and_then(|()| self.writer.flush().map_err(csv::Error::from))
            .map_err(|source| LookupError::Write {
                path: self.path.clone(),
                source,
            })?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table<R> {
    rows: Vec<R>,
}

pub type ModelTable = Table<ModelRow>;
pub type HierarchyTable = Table<HierarchyRow>;
pub type AssetTable = Table<AssetRow>;

impl<R: LookupRow> Table<R> {
    pub fn load(path: &Path) -> Result<Self, LookupError> {
        let unavailable = |source| LookupError::Unavailable {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(unavailable)?;
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<R>, _>>()
            .map_err(unavailable)?;
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<R>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    fn first_match(
        &self,
        key: impl FnOnce() -> String,
        predicate: impl Fn(&R) -> bool,
    ) -> Result<&R, LookupError> {
        self.rows
            .iter()
            .find(|row| predicate(*row))
            .ok_or_else(|| LookupError::Missing {
                table: R::TABLE,
                key: key(),
            })
    }
}

impl Table<ModelRow> {
    pub fn model_id(&self, model_name: &str) -> Result<&str, LookupError> {
        self.first_match(
            || format!("'{model_name}'"),
            |row| row.asset_model_name == model_name,
        )
        .map(|row| row.asset_model_id.as_str())
    }
}

impl Table<HierarchyRow> {
    pub fn hierarchy_id(
        &self,
        parent_model_name: &str,
        child_model_id: &str,
    ) -> Result<&str, LookupError> {
        self.first_match(
            || format!("'{parent_model_name}' → {child_model_id}"),
            |row| {
                row.asset_model_name == parent_model_name
                    && row.child_asset_model_id == child_model_id
            },
        )
        .map(|row| row.hierarchy_id.as_str())
    }
}

impl Table<AssetRow> {
    pub fn asset_id(&self, asset_name: &str) -> Result<&str, LookupError> {
        self.first_match(
            || format!("'{asset_name}'"),
            |row| row.asset_name == asset_name,
        )
        .map(|row| row.asset_id.as_str())
    }
}

/// Removes every regular file directly inside `dir`. A missing directory
/// counts as already clear.
pub fn clear_dir(dir: &Path) -> Result<usize, LookupError> {
    let clear_error = |source| LookupError::Clear {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(error) => return Err(clear_error(error)),
    };

    let mut removed = 0usize;
    for entry in entries {
        let entry = entry.map_err(clear_error)?;
        if entry.file_type().map_err(clear_error)?.is_file() {
            fs::remove_file(entry.path()).map_err(clear_error)?;
            removed += 1;
        }
    }
    Ok(removed)
}
