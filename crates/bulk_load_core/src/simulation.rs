//! Synthetic historical readings for provisioned asset properties.

use std::path::PathBuf;

use chrono::{NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::info;

use crate::contract::ColumnName;
use crate::partitioning::{file_count, PartitionError, PartitionedCsvWriter};
use crate::settings::{DateRange, SimulationConfig};

pub const DATA_TYPE_DOUBLE: &str = "DOUBLE";
pub const QUALITY_GOOD: &str = "GOOD";
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("no simulation range configured for property '{property}' of model '{model}'")]
    MissingPropertyRange { property: String, model: String },
    #[error(transparent)]
    Partition(#[from] PartitionError),
}

/// One (asset, property) pair that receives a time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyTarget {
    pub asset_id: String,
    pub property_id: String,
    pub property_name: String,
    pub model_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reading<'a> {
    pub asset_id: &'a str,
    pub property_id: &'a str,
    pub timestamp_seconds: i64,
    pub value: f64,
}

impl Reading<'_> {
    /// Renders the reading as CSV fields in the configured column order.
    pub fn render(&self, columns: &[ColumnName]) -> Vec<String> {
        columns
            .iter()
            .map(|column| match column {
                ColumnName::Alias => String::new(),
                ColumnName::AssetId => self.asset_id.to_string(),
                ColumnName::PropertyId => self.property_id.to_string(),
                ColumnName::DataType => DATA_TYPE_DOUBLE.to_string(),
                ColumnName::TimestampSeconds => self.timestamp_seconds.to_string(),
                ColumnName::TimestampNanoOffset => "0".to_string(),
                ColumnName::Quality => QUALITY_GOOD.to_string(),
                ColumnName::Value => self.value.to_string(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSummary {
    pub targets: usize,
    pub rows: u64,
    pub files: Vec<PathBuf>,
}

fn day_start_epoch(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

/// Sample instants from the start of `from` through the end of `to` (UTC).
pub fn sample_timestamps(range: &DateRange, interval_seconds: u64) -> impl Iterator<Item = i64> {
    let start = day_start_epoch(range.from);
    let end_exclusive = day_start_epoch(range.to) + SECONDS_PER_DAY;
    let step = usize::try_from(interval_seconds.max(1)).unwrap_or(usize::MAX);
    (start..end_exclusive).step_by(step)
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn simulation_rng(config: &SimulationConfig) -> StdRng {
    match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Generates one series per target over the configured date range and streams
/// the rows into `writer`. Targets are processed in order; every timestamp of
/// one target is written before the next target starts.
pub fn generate_historical_data<R: Rng>(
    targets: &[PropertyTarget],
    config: &SimulationConfig,
    columns: &[ColumnName],
    writer: &mut PartitionedCsvWriter,
    rng: &mut R,
) -> Result<u64, SimulationError> {
    let interval = config.sampling_interval_seconds;
    let mut rows = 0u64;
    for target in targets {
        let range = config
            .range_for(&target.property_name, &target.model_name)
            .ok_or_else(|| SimulationError::MissingPropertyRange {
                property: target.property_name.clone(),
                model: target.model_name.clone(),
            })?;

        for timestamp_seconds in sample_timestamps(&config.date_range, interval) {
            let reading = Reading {
                asset_id: &target.asset_id,
                property_id: &target.property_id,
                timestamp_seconds,
                value: round_to_hundredths(rng.gen_range(range.min..=range.max)),
            };
            writer.write_row(reading.render(columns))?;
            rows += 1;
        }
    }
    Ok(rows)
}

/// Convenience wrapper: partitions into `rows_per_file` files under `dir`.
pub fn simulate_to_dir(
    targets: &[PropertyTarget],
    config: &SimulationConfig,
    columns: &[ColumnName],
    dir: impl Into<PathBuf>,
    rows_per_file: usize,
) -> Result<SimulationSummary, SimulationError> {
    let mut writer = PartitionedCsvWriter::new(dir, rows_per_file)?;
    let mut rng = simulation_rng(config);
    let per_target =
        sample_timestamps(&config.date_range, config.sampling_interval_seconds).count();
    info!(
        component = "simulation",
        event = "generation_started",
        from = %config.date_range.from,
        to = %config.date_range.to,
        targets = targets.len(),
        expected_files = file_count((targets.len() * per_target) as u64, rows_per_file),
    );
    let rows = generate_historical_data(targets, config, columns, &mut writer, &mut rng)?;
    let files = writer.finish()?;
    Ok(SimulationSummary {
        targets: targets.len(),
        rows,
        files,
    })
}
