use bulk_load_core::contract::{BulkImportJobRequest, JobSummary};

pub trait BulkImportService {
    /// Submits a job and returns its id.
    fn create_bulk_import_job(&self, request: &BulkImportJobRequest) -> Result<String, String>;
    fn list_bulk_import_jobs(&self) -> Result<Vec<JobSummary>, String>;
}
