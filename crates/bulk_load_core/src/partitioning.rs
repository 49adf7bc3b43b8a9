use std::fs::File;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use crate::storage_keys::data_file_name;

#[derive(Debug, Error)]
pub enum PartitionError {
    #[error("rows_per_file must be greater than zero")]
    ZeroRowsPerFile,
    #[error("failed to write data file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Number of data files `total_rows` rows occupy at `rows_per_file` each.
pub fn file_count(total_rows: u64, rows_per_file: usize) -> u64 {
    if rows_per_file == 0 {
        return 0;
    }
    total_rows.div_ceil(rows_per_file as u64)
}

struct OpenFile {
    path: PathBuf,
    writer: csv::Writer<File>,
    rows: usize,
}

/// Writes header-less CSV rows into `historical_data_<n>.csv` files holding at
/// most `rows_per_file` rows each. A file is only opened once its first row
/// arrives, so no empty trailing file is ever produced.
pub struct PartitionedCsvWriter {
    dir: PathBuf,
    rows_per_file: usize,
    current: Option<OpenFile>,
    files: Vec<PathBuf>,
    total_rows: u64,
}

impl PartitionedCsvWriter {
    pub fn new(dir: impl Into<PathBuf>, rows_per_file: usize) -> Result<Self, PartitionError> {
        if rows_per_file == 0 {
            return Err(PartitionError::ZeroRowsPerFile);
        }
        Ok(Self {
            dir: dir.into(),
            rows_per_file,
            current: None,
            files: Vec::new(),
            total_rows: 0,
        })
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows
    }

    pub fn write_row<I>(&mut self, fields: I) -> Result<(), PartitionError>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        if self.current.is_none() {
            self.open_next()?;
        }

        let full = match self.current.as_mut() {
            Some(open) => {
                open.writer
                    .write_record(fields)
                    .map_err(|source| PartitionError::Write {
                        path: open.path.clone(),
                        source,
                    })?;
                open.rows += 1;
                open.rows >= self.rows_per_file
            }
            None => false,
        };
        self.total_rows += 1;

        if full {
            self.close_current()?;
        }
        Ok(())
    }

    /// Closes the last partial file and returns every file written, in order.
    pub fn finish(mut self) -> Result<Vec<PathBuf>, PartitionError> {
        self.close_current()?;
        Ok(self.files)
    }

    fn open_next(&mut self) -> Result<(), PartitionError> {
        let path = self.dir.join(data_file_name(self.files.len() + 1));
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(|source| PartitionError::Write {
                path: path.clone(),
                source,
            })?;
        self.files.push(path.clone());
        self.current = Some(OpenFile {
            path,
            writer,
            rows: 0,
        });
        Ok(())
    }

    fn close_current(&mut self) -> Result<(), PartitionError> {
        let Some(mut open) = self.current.take() else {
            return Ok(());
        };
        open.writer
            .flush()
            .map_err(|error| PartitionError::Write {
                path: open.path.clone(),
                source: csv::Error::from(error),
            })?;
        info!(
            component = "partitioning",
            event = "data_file_created",
            path = %open.path.display(),
            rows = open.rows,
        );
        Ok(())
    }
}
