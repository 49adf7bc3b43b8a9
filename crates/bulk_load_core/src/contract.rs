use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::settings::BulkImportConfig;
use crate::status::JobStatus;

/// Columns a bulk-import CSV file may carry, in the service's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnName {
    Alias,
    AssetId,
    PropertyId,
    DataType,
    TimestampSeconds,
    TimestampNanoOffset,
    Quality,
    Value,
}

impl ColumnName {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Alias => "ALIAS",
            Self::AssetId => "ASSET_ID",
            Self::PropertyId => "PROPERTY_ID",
            Self::DataType => "DATA_TYPE",
            Self::TimestampSeconds => "TIMESTAMP_SECONDS",
            Self::TimestampNanoOffset => "TIMESTAMP_NANO_OFFSET",
            Self::Quality => "QUALITY",
            Self::Value => "VALUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub bucket: String,
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReportLocation {
    pub bucket: String,
    pub prefix: String,
}

/// Everything needed to submit one bulk-import job for one object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkImportJobRequest {
    pub job_name: String,
    pub job_role_arn: String,
    pub files: Vec<SourceFile>,
    pub error_report_location: ErrorReportLocation,
    pub column_names: Vec<ColumnName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: String,
    pub name: String,
    pub status: String,
}

pub fn job_name(now_unix_seconds: i64) -> String {
    format!("job_{now_unix_seconds}")
}

pub fn job_request(
    config: &BulkImportConfig,
    key: &str,
    now_unix_seconds: i64,
) -> BulkImportJobRequest {
    BulkImportJobRequest {
        job_name: job_name(now_unix_seconds),
        job_role_arn: config.job.role_arn.clone(),
        files: vec![SourceFile {
            bucket: config.data.bucket.clone(),
            key: key.to_string(),
        }],
        error_report_location: ErrorReportLocation {
            bucket: config.job.error_bucket.clone(),
            prefix: config.job.error_prefix.clone(),
        },
        column_names: config.data.column_names.clone(),
    }
}

/// Tracks submitted jobs until each one reports a terminal status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobTracker {
    outstanding: Vec<String>,
    finished: Vec<(String, JobStatus)>,
}

impl JobTracker {
    pub fn new(job_ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            outstanding: job_ids.into_iter().collect(),
            finished: Vec::new(),
        }
    }

    pub fn outstanding(&self) -> &[String] {
        &self.outstanding
    }

    pub fn finished(&self) -> &[(String, JobStatus)] {
        &self.finished
    }

    pub fn is_done(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Applies one listing of job statuses, retiring every tracked job whose
    /// status is terminal. Returns the jobs retired by this call.
    pub fn observe(&mut self, summaries: &[JobSummary]) -> Vec<(String, JobStatus)> {
        let statuses: BTreeMap<&str, &str> = summaries
            .iter()
            .map(|summary| (summary.id.as_str(), summary.status.as_str()))
            .collect();

        let mut retired = Vec::new();
        self.outstanding.retain(|job_id| {
            let status = statuses
                .get(job_id.as_str())
                .map(|raw| JobStatus::parse(raw))
                .unwrap_or(JobStatus::Unlisted);
            if status.is_terminal() {
                retired.push((job_id.clone(), status));
                false
            } else {
                true
            }
        });

        self.finished.extend(retired.iter().cloned());
        retired
    }

    pub fn into_finished(self) -> Vec<(String, JobStatus)> {
        self.finished
    }
}
