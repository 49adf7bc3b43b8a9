use std::path::Path;

pub trait ObjectStore {
    fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), String>;
    /// Every key under `prefix`, across all listing pages.
    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, String>;
}
