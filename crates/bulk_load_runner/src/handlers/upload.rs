use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bulk_load_core::settings::{BulkImportConfig, Workspace};
use bulk_load_core::storage_keys::data_object_key;
use tracing::info;

use crate::adapters::object_store::ObjectStore;
use crate::error::{Result, RunnerError, ServiceResultExt};

/// Regular files directly inside `dir`, sorted by name. A missing directory
/// has no files.
pub fn list_data_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let io_error = |source| RunnerError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(io_error(error)),
    };

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_error)?;
        if entry.file_type().map_err(io_error)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Uploads every file in `data/` to the configured bucket and returns the
/// object keys in upload order.
pub fn upload_data_files(
    config: &BulkImportConfig,
    workspace: &Workspace,
    store: &dyn ObjectStore,
) -> Result<Vec<String>> {
    let files = list_data_files(&workspace.data_dir())?;
    let mut keys = Vec::with_capacity(files.len());
    for path in files {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = data_object_key(&config.data.prefix, &file_name);
        store
            .upload_file(&config.data.bucket, &key, &path)
            .during("PutObject")?;
        info!(
            component = "uploader",
            event = "data_file_uploaded",
            bucket = %config.data.bucket,
            key = %key,
        );
        keys.push(key);
    }

    info!(
        component = "uploader",
        event = "upload_completed",
        files = keys.len(),
    );
    Ok(keys)
}
