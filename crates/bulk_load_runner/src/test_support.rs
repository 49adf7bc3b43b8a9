//! In-memory stand-ins for the service ports, shared by handler tests.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use bulk_load_core::contract::{BulkImportJobRequest, JobSummary};
use bulk_load_core::settings::{
    AssetDef, AssetModelDef, HierarchyConfig, PropertyDataType, PropertyDefinition, PropertyKind,
};
use bulk_load_core::status::ResourceState;

use crate::adapters::asset_service::{
    AssetLink, AssetModelUpdate, AssetService, AssetSummary, HierarchySummary, ModelSummary,
    PropertySummary,
};
use crate::adapters::bulk_import::BulkImportService;
use crate::adapters::object_store::ObjectStore;
use crate::adapters::pacing::{Clock, Pause};

pub fn measurement(name: &str) -> PropertyDefinition {
    PropertyDefinition {
        name: name.to_string(),
        data_type: PropertyDataType::Double,
        unit: None,
        kind: PropertyKind::Measurement {},
    }
}

/// Line model with one child press model; one line asset linked to two presses.
pub fn press_line_config() -> HierarchyConfig {
    HierarchyConfig {
        asset_models: vec![
            AssetModelDef {
                name: "Sample_Press Line".to_string(),
                children: Some(vec!["Sample_Stamping Press".to_string()]),
            },
            AssetModelDef {
                name: "Sample_Stamping Press".to_string(),
                children: None,
            },
        ],
        assets: vec![
            AssetDef {
                name: "Line 1".to_string(),
                model: "Sample_Press Line".to_string(),
                associated_assets: Some(vec!["Press 1".to_string(), "Press 2".to_string()]),
            },
            AssetDef {
                name: "Press 1".to_string(),
                model: "Sample_Stamping Press".to_string(),
                associated_assets: None,
            },
            AssetDef {
                name: "Press 2".to_string(),
                model: "Sample_Stamping Press".to_string(),
                associated_assets: None,
            },
        ],
    }
}

#[derive(Debug, Clone)]
pub struct FakeModel {
    pub id: String,
    pub name: String,
    pub properties: Vec<PropertyDefinition>,
    pub hierarchies: Vec<HierarchySummary>,
    pending_checks: u32,
}

#[derive(Debug, Clone)]
pub struct FakeAsset {
    pub id: String,
    pub name: String,
    pub model_id: String,
    pending_checks: u32,
}

#[derive(Debug, Clone)]
struct FakeJob {
    id: String,
    name: String,
    running_listings: u32,
}

#[derive(Debug, Default)]
struct SiteWiseState {
    next_id: u32,
    models: Vec<FakeModel>,
    assets: Vec<FakeAsset>,
    associations: Vec<(String, String, String)>,
    jobs: Vec<FakeJob>,
    job_requests: Vec<BulkImportJobRequest>,
    job_listings: usize,
    calls: Vec<String>,
}

impl SiteWiseState {
    fn next_id(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }

    fn model_mut(&mut self, model_id: &str) -> Result<&mut FakeModel, String> {
        self.models
            .iter_mut()
            .find(|model| model.id == model_id)
            .ok_or_else(|| format!("ResourceNotFoundException: asset model {model_id}"))
    }

    fn asset_mut(&mut self, asset_id: &str) -> Result<&mut FakeAsset, String> {
        self.assets
            .iter_mut()
            .find(|asset| asset.id == asset_id)
            .ok_or_else(|| format!("ResourceNotFoundException: asset {asset_id}"))
    }
}

/// Asset-management and bulk-import fake. Models and assets report CREATING
/// for `activation_checks` describes after every change; jobs report RUNNING
/// for `running_listings` listings.
#[derive(Debug, Default)]
pub struct FakeSiteWise {
    state: Mutex<SiteWiseState>,
    activation_checks: u32,
    failing_model: Option<String>,
    running_listings: u32,
}

impl FakeSiteWise {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_activation_checks(mut self, checks: u32) -> Self {
        self.activation_checks = checks;
        self
    }

    pub fn with_failing_model(mut self, model_name: &str) -> Self {
        self.failing_model = Some(model_name.to_string());
        self
    }

    pub fn with_running_listings(mut self, listings: u32) -> Self {
        self.running_listings = listings;
        self
    }

    fn state(&self) -> std::sync::MutexGuard<'_, SiteWiseState> {
        self.state.lock().expect("poisoned mutex")
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn models(&self) -> Vec<FakeModel> {
        self.state().models.clone()
    }

    pub fn assets(&self) -> Vec<FakeAsset> {
        self.state().assets.clone()
    }

    pub fn associations(&self) -> Vec<(String, String, String)> {
        self.state().associations.clone()
    }

    pub fn job_requests(&self) -> Vec<BulkImportJobRequest> {
        self.state().job_requests.clone()
    }

    pub fn job_listings(&self) -> usize {
        self.state().job_listings
    }
}

impl AssetService for FakeSiteWise {
    fn create_asset_model(
        &self,
        name: &str,
        properties: &[PropertyDefinition],
    ) -> Result<String, String> {
        let mut state = self.state();
        state.calls.push(format!("CreateAssetModel {name}"));
        let id = state.next_id("model");
        state.models.push(FakeModel {
            id: id.clone(),
            name: name.to_string(),
            properties: properties.to_vec(),
            hierarchies: Vec::new(),
            pending_checks: self.activation_checks,
        });
        Ok(id)
    }

    fn update_asset_model(&self, update: &AssetModelUpdate<'_>) -> Result<(), String> {
        let mut state = self.state();
        state
            .calls
            .push(format!("UpdateAssetModel {}", update.model_name));
        let mut hierarchies = Vec::with_capacity(update.hierarchies.len());
        for definition in update.hierarchies {
            hierarchies.push(HierarchySummary {
                id: state.next_id("hierarchy"),
                name: definition.name.clone(),
                child_asset_model_id: definition.child_asset_model_id.clone(),
            });
        }
        let checks = self.activation_checks;
        let model = state.model_mut(update.model_id)?;
        model.name = update.model_name.to_string();
        model.properties = update.properties.to_vec();
        model.hierarchies = hierarchies;
        model.pending_checks = checks;
        Ok(())
    }

    fn asset_model_state(&self, model_id: &str) -> Result<ResourceState, String> {
        let failing = self.failing_model.clone();
        let mut state = self.state();
        let model = state.model_mut(model_id)?;
        if failing.as_deref() == Some(model.name.as_str()) {
            return Ok(ResourceState::Failed);
        }
        if model.pending_checks > 0 {
            model.pending_checks -= 1;
            return Ok(ResourceState::Creating);
        }
        Ok(ResourceState::Active)
    }

    fn asset_model_hierarchies(&self, model_id: &str) -> Result<Vec<HierarchySummary>, String> {
        Ok(self.state().model_mut(model_id)?.hierarchies.clone())
    }

    fn delete_asset_model(&self, model_id: &str) -> Result<(), String> {
        let mut state = self.state();
        state.calls.push(format!("DeleteAssetModel {model_id}"));
        let before = state.models.len();
        state.models.retain(|model| model.id != model_id);
        if state.models.len() == before {
            return Err(format!("ResourceNotFoundException: asset model {model_id}"));
        }
        Ok(())
    }

    fn list_asset_models(&self) -> Result<Vec<ModelSummary>, String> {
        Ok(self
            .state()
            .models
            .iter()
            .map(|model| ModelSummary {
                id: model.id.clone(),
                name: model.name.clone(),
            })
            .collect())
    }

    fn list_asset_model_properties(&self, model_id: &str) -> Result<Vec<PropertySummary>, String> {
        let mut state = self.state();
        let model = state.model_mut(model_id)?;
        Ok(model
            .properties
            .iter()
            .enumerate()
            .map(|(index, property)| PropertySummary {
                id: format!("{}-property-{index}", model.id),
                name: property.name.clone(),
            })
            .collect())
    }

    fn create_asset(&self, name: &str, model_id: &str) -> Result<String, String> {
        let mut state = self.state();
        state.calls.push(format!("CreateAsset {name}"));
        state.model_mut(model_id)?;
        let id = state.next_id("asset");
        state.assets.push(FakeAsset {
            id: id.clone(),
            name: name.to_string(),
            model_id: model_id.to_string(),
            pending_checks: self.activation_checks,
        });
        Ok(id)
    }

    fn asset_state(&self, asset_id: &str) -> Result<ResourceState, String> {
        let mut state = self.state();
        let asset = state.asset_mut(asset_id)?;
        if asset.pending_checks > 0 {
            asset.pending_checks -= 1;
            return Ok(ResourceState::Creating);
        }
        Ok(ResourceState::Active)
    }

    fn delete_asset(&self, asset_id: &str) -> Result<(), String> {
        let mut state = self.state();
        state.calls.push(format!("DeleteAsset {asset_id}"));
        if state
            .associations
            .iter()
            .any(|(parent, _, child)| parent == asset_id || child == asset_id)
        {
            return Err(format!("ConflictingOperationException: asset {asset_id} is associated"));
        }
        state.asset_mut(asset_id)?;
        state.assets.retain(|asset| asset.id != asset_id);
        Ok(())
    }

    fn list_assets(&self, model_id: &str) -> Result<Vec<AssetSummary>, String> {
        Ok(self
            .state()
            .assets
            .iter()
            .filter(|asset| asset.model_id == model_id)
            .map(|asset| AssetSummary {
                id: asset.id.clone(),
                name: asset.name.clone(),
            })
            .collect())
    }

    fn associate_assets(&self, link: &AssetLink<'_>) -> Result<(), String> {
        let mut state = self.state();
        state.calls.push(format!(
            "AssociateAssets {} {}",
            link.parent_asset_id, link.child_asset_id
        ));
        state.associations.push((
            link.parent_asset_id.to_string(),
            link.hierarchy_id.to_string(),
            link.child_asset_id.to_string(),
        ));
        Ok(())
    }

    fn disassociate_assets(&self, link: &AssetLink<'_>) -> Result<(), String> {
        let mut state = self.state();
        state.calls.push(format!(
            "DisassociateAssets {} {}",
            link.parent_asset_id, link.child_asset_id
        ));
        let before = state.associations.len();
        state.associations.retain(|(parent, hierarchy, child)| {
            !(parent == link.parent_asset_id
                && hierarchy == link.hierarchy_id
                && child == link.child_asset_id)
        });
        if state.associations.len() == before {
            return Err(format!(
                "ResourceNotFoundException: {} is not associated with {}",
                link.child_asset_id, link.parent_asset_id
            ));
        }
        Ok(())
    }
}

impl BulkImportService for FakeSiteWise {
    fn create_bulk_import_job(&self, request: &BulkImportJobRequest) -> Result<String, String> {
        let mut state = self.state();
        let id = state.next_id("job");
        state.jobs.push(FakeJob {
            id: id.clone(),
            name: request.job_name.clone(),
            running_listings: self.running_listings,
        });
        state.job_requests.push(request.clone());
        Ok(id)
    }

    fn list_bulk_import_jobs(&self) -> Result<Vec<JobSummary>, String> {
        let mut state = self.state();
        state.job_listings += 1;
        Ok(state
            .jobs
            .iter_mut()
            .map(|job| {
                let status = if job.running_listings > 0 {
                    job.running_listings -= 1;
                    "RUNNING"
                } else {
                    "COMPLETED"
                };
                JobSummary {
                    id: job.id.clone(),
                    name: job.name.clone(),
                    status: status.to_string(),
                }
            })
            .collect())
    }
}

/// Object store keyed by `(bucket, key)`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryStore {
    pub fn with_objects(bucket: &str, keys: &[&str]) -> Self {
        let store = Self::default();
        {
            let mut objects = store.objects.lock().expect("poisoned mutex");
            for key in keys {
                objects.insert((bucket.to_string(), key.to_string()), Vec::new());
            }
        }
        store
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

impl ObjectStore for MemoryStore {
    fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), String> {
        let bytes = fs::read(path).map_err(|error| error.to_string())?;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert((bucket.to_string(), key.to_string()), bytes);
        Ok(())
    }

    fn list_keys(&self, bucket: &str, prefix: &str) -> Result<Vec<String>, String> {
        Ok(self
            .objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .filter(|(object_bucket, key)| object_bucket == bucket && key.starts_with(prefix))
            .map(|(_, key)| key.clone())
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct RecordingPause {
    pauses: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().expect("poisoned mutex").clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        self.pauses.lock().expect("poisoned mutex").push(duration);
    }
}

/// Starts at `start` and advances one second per reading.
#[derive(Debug)]
pub struct SteppingClock {
    next: Mutex<i64>,
}

impl SteppingClock {
    pub fn starting_at(start: i64) -> Self {
        Self {
            next: Mutex::new(start),
        }
    }
}

impl Clock for SteppingClock {
    fn now_unix_seconds(&self) -> i64 {
        let mut next = self.next.lock().expect("poisoned mutex");
        let now = *next;
        *next += 1;
        now
    }
}
