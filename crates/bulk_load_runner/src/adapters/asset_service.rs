use bulk_load_core::settings::PropertyDefinition;
use bulk_load_core::status::ResourceState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySummary {
    pub id: String,
    pub name: String,
}

/// A hierarchy edge as read back from a model after activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchySummary {
    pub id: String,
    pub name: String,
    pub child_asset_model_id: String,
}

/// A hierarchy edge to declare on a parent model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyDefinition {
    pub name: String,
    pub child_asset_model_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetModelUpdate<'a> {
    pub model_id: &'a str,
    pub model_name: &'a str,
    pub properties: &'a [PropertyDefinition],
    pub hierarchies: &'a [HierarchyDefinition],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetLink<'a> {
    pub parent_asset_id: &'a str,
    pub hierarchy_id: &'a str,
    pub child_asset_id: &'a str,
}

/// Asset-model and asset operations of the asset-management service.
///
/// Listing operations return every page.
pub trait AssetService {
    fn create_asset_model(
        &self,
        name: &str,
        properties: &[PropertyDefinition],
    ) -> Result<String, String>;
    fn update_asset_model(&self, update: &AssetModelUpdate<'_>) -> Result<(), String>;
    fn asset_model_state(&self, model_id: &str) -> Result<ResourceState, String>;
    fn asset_model_hierarchies(&self, model_id: &str) -> Result<Vec<HierarchySummary>, String>;
    fn delete_asset_model(&self, model_id: &str) -> Result<(), String>;
    fn list_asset_models(&self) -> Result<Vec<ModelSummary>, String>;
    fn list_asset_model_properties(&self, model_id: &str) -> Result<Vec<PropertySummary>, String>;

    fn create_asset(&self, name: &str, model_id: &str) -> Result<String, String>;
    fn asset_state(&self, asset_id: &str) -> Result<ResourceState, String>;
    fn delete_asset(&self, asset_id: &str) -> Result<(), String>;
    fn list_assets(&self, model_id: &str) -> Result<Vec<AssetSummary>, String>;
    fn associate_assets(&self, link: &AssetLink<'_>) -> Result<(), String>;
    fn disassociate_assets(&self, link: &AssetLink<'_>) -> Result<(), String>;
}
