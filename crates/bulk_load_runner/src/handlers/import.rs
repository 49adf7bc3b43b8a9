use bulk_load_core::contract::{job_request, JobSummary, JobTracker};
use bulk_load_core::settings::BulkImportConfig;
use bulk_load_core::status::JobStatus;
use serde::Serialize;
use tracing::{info, warn};

use crate::adapters::bulk_import::BulkImportService;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::pacing::{Clock, Pause};
use crate::error::{Result, ServiceResultExt};
use crate::handlers::poll::Pacing;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub submitted: Vec<String>,
    pub finished: Vec<(String, JobStatus)>,
}

impl ImportReport {
    pub fn completed_cleanly(&self) -> bool {
        self.finished
            .iter()
            .all(|(_, status)| *status == JobStatus::Completed)
    }
}

/// Submits one bulk-import job per object under the configured prefix and
/// waits until every job reaches a terminal status.
pub fn run_bulk_import(
    config: &BulkImportConfig,
    store: &dyn ObjectStore,
    service: &dyn BulkImportService,
    clock: &dyn Clock,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<ImportReport> {
    let keys = store
        .list_keys(&config.data.bucket, &config.data.prefix)
        .during("ListObjectsV2")?;
    if keys.is_empty() {
        warn!(
            component = "importer",
            event = "no_data_found",
            bucket = %config.data.bucket,
            prefix = %config.data.prefix,
        );
        return Ok(ImportReport::default());
    }
    info!(component = "importer", event = "objects_listed", jobs = keys.len());

    let mut submitted = Vec::with_capacity(keys.len());
    for key in &keys {
        let request = job_request(config, key, clock.now_unix_seconds());
        let job_id = service
            .create_bulk_import_job(&request)
            .during("CreateBulkImportJob")?;
        info!(
            component = "importer",
            event = "job_created",
            job_id = %job_id,
            job_name = %request.job_name,
            key = %key,
        );
        submitted.push(job_id);
        pause.pause(pacing.job_submit_gap);
    }

    let mut tracker = JobTracker::new(submitted.iter().cloned());
    loop {
        let summaries = service
            .list_bulk_import_jobs()
            .during("ListBulkImportJobs")?;
        for (job_id, status) in tracker.observe(&summaries) {
            info!(
                component = "importer",
                event = "job_finished",
                job_id = %job_id,
                status = %status,
            );
        }
        if tracker.is_done() {
            break;
        }
        pause.pause(pacing.job_poll_interval);
    }

    Ok(ImportReport {
        submitted,
        finished: tracker.into_finished(),
    })
}

pub fn list_jobs(service: &dyn BulkImportService) -> Result<Vec<JobSummary>> {
    service
        .list_bulk_import_jobs()
        .during("ListBulkImportJobs")
}
