use bulk_load_core::lookup::{AssetTable, HierarchyTable, LookupError, ModelTable};
use bulk_load_core::settings::{AssetDef, HierarchyConfig, Workspace};

use crate::adapters::asset_service::AssetLink;
use crate::error::Result;

/// A configured parent/child association with every id resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub parent_name: String,
    pub child_name: String,
    pub parent_asset_id: String,
    pub hierarchy_id: String,
    pub child_asset_id: String,
}

impl ResolvedLink {
    pub fn as_link(&self) -> AssetLink<'_> {
        AssetLink {
            parent_asset_id: &self.parent_asset_id,
            hierarchy_id: &self.hierarchy_id,
            child_asset_id: &self.child_asset_id,
        }
    }
}

pub struct LinkTables {
    models: ModelTable,
    hierarchies: HierarchyTable,
    assets: AssetTable,
}

impl LinkTables {
    pub fn load(workspace: &Workspace) -> Result<Self> {
        Ok(Self {
            models: ModelTable::load(&workspace.model_table_path())?,
            hierarchies: HierarchyTable::load(&workspace.hierarchy_table_path())?,
            assets: AssetTable::load(&workspace.asset_table_path())?,
        })
    }

    pub fn new(models: ModelTable, hierarchies: HierarchyTable, assets: AssetTable) -> Self {
        Self {
            models,
            hierarchies,
            assets,
        }
    }

    pub fn models(&self) -> &ModelTable {
        &self.models
    }

    pub fn assets(&self) -> &AssetTable {
        &self.assets
    }

    /// The hierarchy is looked up by the parent's model name and the model id
    /// of the child asset, whose model comes from the configuration.
    pub fn resolve(
        &self,
        config: &HierarchyConfig,
        parent: &AssetDef,
        child_name: &str,
    ) -> Result<ResolvedLink> {
        let child = config.asset(child_name).ok_or_else(|| LookupError::Missing {
            table: "configured asset",
            key: format!("'{child_name}'"),
        })?;
        let child_model_id = self.models.model_id(&child.model)?;

        Ok(ResolvedLink {
            parent_name: parent.name.clone(),
            child_name: child_name.to_string(),
            parent_asset_id: self.assets.asset_id(&parent.name)?.to_string(),
            hierarchy_id: self
                .hierarchies
                .hierarchy_id(&parent.model, child_model_id)?
                .to_string(),
            child_asset_id: self.assets.asset_id(child_name)?.to_string(),
        })
    }

    /// Resolves every configured association, in configuration order.
    pub fn resolve_all(&self, config: &HierarchyConfig) -> Result<Vec<ResolvedLink>> {
        config
            .associations()
            .map(|(parent, child)| self.resolve(config, parent, child))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use bulk_load_core::lookup::{AssetRow, HierarchyRow, ModelRow};
    use bulk_load_core::settings::AssetModelDef;

    use super::*;
    use crate::error::RunnerError;

    fn config() -> HierarchyConfig {
        HierarchyConfig {
            asset_models: vec![
                AssetModelDef {
                    name: "Line".to_string(),
                    children: Some(vec!["Press".to_string()]),
                },
                AssetModelDef {
                    name: "Press".to_string(),
                    children: None,
                },
            ],
            assets: vec![
                AssetDef {
                    name: "Line 1".to_string(),
                    model: "Line".to_string(),
                    associated_assets: Some(vec!["Press 1".to_string()]),
                },
                AssetDef {
                    name: "Press 1".to_string(),
                    model: "Press".to_string(),
                    associated_assets: None,
                },
            ],
        }
    }

    fn tables(with_press_asset: bool) -> LinkTables {
        let mut assets = vec![AssetRow {
            asset_name: "Line 1".to_string(),
            asset_id: "asset-line".to_string(),
        }];
        if with_press_asset {
            assets.push(AssetRow {
                asset_name: "Press 1".to_string(),
                asset_id: "asset-press".to_string(),
            });
        }
        LinkTables::new(
            ModelTable::from_rows(vec![
                ModelRow {
                    asset_model_name: "Line".to_string(),
                    asset_model_id: "model-line".to_string(),
                },
                ModelRow {
                    asset_model_name: "Press".to_string(),
                    asset_model_id: "model-press".to_string(),
                },
            ]),
            HierarchyTable::from_rows(vec![HierarchyRow {
                asset_model_name: "Line".to_string(),
                child_asset_model_id: "model-press".to_string(),
                hierarchy_id: "hier-1".to_string(),
            }]),
            AssetTable::from_rows(assets),
        )
    }

    #[test]
    fn resolves_every_configured_association() {
        let links = tables(true).resolve_all(&config()).unwrap();
        assert_eq!(
            links,
            vec![ResolvedLink {
                parent_name: "Line 1".to_string(),
                child_name: "Press 1".to_string(),
                parent_asset_id: "asset-line".to_string(),
                hierarchy_id: "hier-1".to_string(),
                child_asset_id: "asset-press".to_string(),
            }]
        );
    }

    #[test]
    fn missing_child_asset_id_is_reported() {
        let error = tables(false)
            .resolve_all(&config())
            .expect_err("child id is missing");
        assert!(matches!(
            error,
            RunnerError::Lookup(LookupError::Missing { table: "asset", .. })
        ));
    }
}
