//! Declarative inputs: the asset hierarchy, bulk-import parameters and the
//! data simulation ranges, plus the per-model property schema files.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::contract::ColumnName;
use crate::storage_keys::{
    property_schema_file_name, ASSETS_TABLE, ASSET_MODELS_TABLE, HIERARCHIES_TABLE,
};

pub const HIERARCHY_CONFIG_FILE: &str = "assets_models.yml";
pub const BULK_IMPORT_CONFIG_FILE: &str = "bulk_import.yml";
pub const SIMULATION_CONFIG_FILE: &str = "data_simulation.yml";
pub const DEFAULT_SAMPLING_INTERVAL_SECONDS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: ::config::ConfigError,
    },
    #[error("failed to read property schema {path}: {source}")]
    SchemaIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid property schema {path}: {source}")]
    SchemaFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

impl ConfigError {
    fn invalid(path: &Path, message: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }
}

// ── hierarchy ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetModelDef {
    pub name: String,
    #[serde(default)]
    pub children: Option<Vec<String>>,
}

impl AssetModelDef {
    pub fn child_names(&self) -> &[String] {
        self.children.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDef {
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub associated_assets: Option<Vec<String>>,
}

impl AssetDef {
    pub fn child_names(&self) -> &[String] {
        self.associated_assets.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    pub asset_models: Vec<AssetModelDef>,
    #[serde(default)]
    pub assets: Vec<AssetDef>,
}

impl HierarchyConfig {
    pub fn asset(&self, name: &str) -> Option<&AssetDef> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.asset_models.iter().any(|model| model.name == name)
    }

    /// Every configured (parent asset, child asset) association, in file order.
    pub fn associations(&self) -> impl Iterator<Item = (&AssetDef, &str)> {
        self.assets.iter().flat_map(|parent| {
            parent
                .child_names()
                .iter()
                .map(move |child| (parent, child.as_str()))
        })
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        let mut model_names = HashSet::new();
        for model in &self.asset_models {
            if !model_names.insert(model.name.as_str()) {
                return Err(ConfigError::invalid(
                    path,
                    format!("asset model '{}' is defined more than once", model.name),
                ));
            }
        }

        for model in &self.asset_models {
            if let Some(child) = model
                .child_names()
                .iter()
                .find(|child| !model_names.contains(child.as_str()))
            {
                return Err(ConfigError::invalid(
                    path,
                    format!(
                        "asset model '{}' lists unknown child model '{child}'",
                        model.name
                    ),
                ));
            }
        }

        let mut asset_names = HashSet::new();
        for asset in &self.assets {
            if !asset_names.insert(asset.name.as_str()) {
                return Err(ConfigError::invalid(
                    path,
                    format!("asset '{}' is defined more than once", asset.name),
                ));
            }
            if !model_names.contains(asset.model.as_str()) {
                return Err(ConfigError::invalid(
                    path,
                    format!(
                        "asset '{}' references unknown model '{}'",
                        asset.name, asset.model
                    ),
                ));
            }
        }

        for (parent, child) in self.associations() {
            if !asset_names.contains(child) {
                return Err(ConfigError::invalid(
                    path,
                    format!(
                        "asset '{}' associates unknown asset '{child}'",
                        parent.name
                    ),
                ));
            }
        }

        Ok(())
    }
}

// ── bulk import ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataLocation {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    pub column_names: Vec<ColumnName>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSettings {
    pub role_arn: String,
    pub error_bucket: String,
    #[serde(default)]
    pub error_prefix: String,
    pub rows_per_job: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkImportConfig {
    pub data: DataLocation,
    pub job: JobSettings,
}

impl BulkImportConfig {
    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.job.rows_per_job == 0 {
            return Err(ConfigError::invalid(
                path,
                "job.rows_per_job must be greater than zero",
            ));
        }
        if self.data.column_names.is_empty() {
            return Err(ConfigError::invalid(
                path,
                "data.column_names must not be empty",
            ));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = self
            .data
            .column_names
            .iter()
            .find(|column| !seen.insert(**column))
        {
            return Err(ConfigError::invalid(
                path,
                format!("data.column_names lists {} twice", duplicate.as_str()),
            ));
        }
        Ok(())
    }
}

// ── simulation ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyRange {
    pub name: String,
    pub model: String,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub date_range: DateRange,
    #[serde(default = "default_sampling_interval")]
    pub sampling_interval_seconds: u64,
    #[serde(default)]
    pub seed: Option<u64>,
    pub properties: Vec<PropertyRange>,
}

fn default_sampling_interval() -> u64 {
    DEFAULT_SAMPLING_INTERVAL_SECONDS
}

impl SimulationConfig {
    pub fn range_for(&self, property_name: &str, model_name: &str) -> Option<&PropertyRange> {
        self.properties
            .iter()
            .find(|range| range.name == property_name && range.model == model_name)
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.date_range.from > self.date_range.to {
            return Err(ConfigError::invalid(
                path,
                format!(
                    "date_range.from {} is after date_range.to {}",
                    self.date_range.from, self.date_range.to
                ),
            ));
        }
        if self.sampling_interval_seconds == 0 {
            return Err(ConfigError::invalid(
                path,
                "sampling_interval_seconds must be greater than zero",
            ));
        }
        // gen_range panics on spans that overflow f64
        if let Some(range) = self.properties.iter().find(|range| {
            !range.min.is_finite() || !range.max.is_finite() || !(range.max - range.min).is_finite()
        }) {
            return Err(ConfigError::invalid(
                path,
                format!(
                    "property '{}' of model '{}' needs finite bounds with a finite span",
                    range.name, range.model
                ),
            ));
        }
        if let Some(range) = self
            .properties
            .iter()
            .find(|range| range.min > range.max)
        {
            return Err(ConfigError::invalid(
                path,
                format!(
                    "property '{}' of model '{}' has min {} above max {}",
                    range.name, range.model, range.min, range.max
                ),
            ));
        }
        Ok(())
    }
}

// ── loading ────────────────────────────────────────────────────────

fn load_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    ::config::Config::builder()
        .add_source(::config::File::from(path))
        .build()
        .and_then(|config| config.try_deserialize())
        .map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })
}

pub fn load_hierarchy_config(path: &Path) -> Result<HierarchyConfig, ConfigError> {
    let config: HierarchyConfig = load_file(path)?;
    config.validate(path)?;
    Ok(config)
}

pub fn load_bulk_import_config(path: &Path) -> Result<BulkImportConfig, ConfigError> {
    let config: BulkImportConfig = load_file(path)?;
    config.validate(path)?;
    Ok(config)
}

pub fn load_simulation_config(path: &Path) -> Result<SimulationConfig, ConfigError> {
    let config: SimulationConfig = load_file(path)?;
    config.validate(path)?;
    Ok(config)
}

// ── property schemas ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropertyDataType {
    String,
    Integer,
    Double,
    Boolean,
    Struct,
}

impl PropertyDataType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Struct => "STRUCT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyKind {
    Measurement {},
    Attribute {
        #[serde(default, rename = "defaultValue")]
        default_value: Option<String>,
    },
}

/// One entry of a model's `*_properties.json` schema file.
///
/// Only `measurement` and `attribute` properties are modeled, since those are
/// the ones the simulator can feed. A `transform` or `metric` entry fails to
/// parse, and measurement options such as `processingConfig` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDefinition {
    pub name: String,
    pub data_type: PropertyDataType,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
}

/// Reads the property schema for `model_name`; models without a schema file
/// get no properties.
pub fn load_property_schema(
    schema_dir: &Path,
    model_name: &str,
) -> Result<Vec<PropertyDefinition>, ConfigError> {
    let path = schema_dir.join(property_schema_file_name(model_name));
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => return Err(ConfigError::SchemaIo { path, source }),
    };
    serde_json::from_str(&contents).map_err(|source| ConfigError::SchemaFormat { path, source })
}

// ── workspace ──────────────────────────────────────────────────────

/// Directory layout shared by every step: `config/`, `schema/`, `tmp/`, `data/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join("config")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.root.join("schema")
    }

    pub fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    pub fn hierarchy_config_path(&self) -> PathBuf {
        self.config_dir().join(HIERARCHY_CONFIG_FILE)
    }

    pub fn bulk_import_config_path(&self) -> PathBuf {
        self.config_dir().join(BULK_IMPORT_CONFIG_FILE)
    }

    pub fn simulation_config_path(&self) -> PathBuf {
        self.config_dir().join(SIMULATION_CONFIG_FILE)
    }

    pub fn model_table_path(&self) -> PathBuf {
        self.tmp_dir().join(ASSET_MODELS_TABLE)
    }

    pub fn hierarchy_table_path(&self) -> PathBuf {
        self.tmp_dir().join(HIERARCHIES_TABLE)
    }

    pub fn asset_table_path(&self) -> PathBuf {
        self.tmp_dir().join(ASSETS_TABLE)
    }

    pub fn ensure_dirs(&self) -> io::Result<()> {
        fs::create_dir_all(self.tmp_dir())?;
        fs::create_dir_all(self.data_dir())
    }
}
