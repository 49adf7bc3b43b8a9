use bulk_load_core::lookup::{
    AssetRow, HierarchyRow, LookupError, LookupWriter, ModelRow, ModelTable,
};
use bulk_load_core::settings::{load_property_schema, HierarchyConfig, Workspace};
use serde::Serialize;
use tracing::info;

use crate::adapters::asset_service::{AssetModelUpdate, AssetService, HierarchyDefinition};
use crate::adapters::pacing::Pause;
use crate::error::{Result, RunnerError, ServiceResultExt};
use crate::handlers::links::LinkTables;
use crate::handlers::poll::{wait_until_active, Pacing};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub models: usize,
    pub hierarchies: usize,
    pub assets: usize,
    pub associations: usize,
}

/// Creates every configured model, declares the model hierarchy, creates the
/// assets and associates them. Each step reads the ids the previous one
/// persisted to the lookup tables in `tmp/`.
pub fn provision_hierarchy(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<ProvisionReport> {
    workspace.ensure_dirs().map_err(|source| RunnerError::Io {
        path: workspace.root().to_path_buf(),
        source,
    })?;

    let models = create_asset_models(config, workspace, service, pacing, pause)?;
    let hierarchies = define_hierarchies(config, workspace, service, pacing, pause)?;
    let assets = create_assets(config, workspace, service, pacing, pause)?;
    let associations = associate_assets(config, workspace, service)?;

    let report = ProvisionReport {
        models,
        hierarchies,
        assets,
        associations,
    };
    info!(
        component = "provisioner",
        event = "provisioning_completed",
        models = report.models,
        hierarchies = report.hierarchies,
        assets = report.assets,
        associations = report.associations,
    );
    Ok(report)
}

fn create_asset_models(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<usize> {
    let mut table = LookupWriter::<ModelRow>::create(workspace.model_table_path())?;
    for model in &config.asset_models {
        let properties = load_property_schema(&workspace.schema_dir(), &model.name)?;
        let model_id = service
            .create_asset_model(&model.name, &properties)
            .during("CreateAssetModel")?;
        info!(
            component = "provisioner",
            event = "asset_model_created",
            name = %model.name,
            id = %model_id,
            properties = properties.len(),
        );

        wait_until_active(
            "asset model",
            &model.name,
            "DescribeAssetModel",
            pacing,
            pause,
            || service.asset_model_state(&model_id),
        )?;
        table.append(&ModelRow {
            asset_model_name: model.name.clone(),
            asset_model_id: model_id,
        })?;
    }
    Ok(table.rows())
}

fn define_hierarchies(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<usize> {
    let models = ModelTable::load(&workspace.model_table_path())?;
    let mut table = LookupWriter::<HierarchyRow>::create(workspace.hierarchy_table_path())?;

    for model in &config.asset_models {
        let model_id = models.model_id(&model.name)?;
        let properties = load_property_schema(&workspace.schema_dir(), &model.name)?;
        let hierarchies = model
            .child_names()
            .iter()
            .map(|child| {
                models.model_id(child).map(|child_id| HierarchyDefinition {
                    name: child.clone(),
                    child_asset_model_id: child_id.to_string(),
                })
            })
            .collect::<std::result::Result<Vec<_>, LookupError>>()?;

        service
            .update_asset_model(&AssetModelUpdate {
                model_id,
                model_name: &model.name,
                properties: &properties,
                hierarchies: &hierarchies,
            })
            .during("UpdateAssetModel")?;
        wait_until_active(
            "asset model",
            &model.name,
            "DescribeAssetModel",
            pacing,
            pause,
            || service.asset_model_state(model_id),
        )?;

        for hierarchy in service
            .asset_model_hierarchies(model_id)
            .during("DescribeAssetModel")?
        {
            table.append(&HierarchyRow {
                asset_model_name: model.name.clone(),
                child_asset_model_id: hierarchy.child_asset_model_id,
                hierarchy_id: hierarchy.id,
            })?;
        }
        info!(
            component = "provisioner",
            event = "asset_model_updated",
            name = %model.name,
            hierarchies = hierarchies.len(),
        );
    }
    Ok(table.rows())
}

fn create_assets(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<usize> {
    let models = ModelTable::load(&workspace.model_table_path())?;
    let mut table = LookupWriter::<AssetRow>::create(workspace.asset_table_path())?;

    for asset in &config.assets {
        let model_id = models.model_id(&asset.model)?;
        let asset_id = service
            .create_asset(&asset.name, model_id)
            .during("CreateAsset")?;
        info!(
            component = "provisioner",
            event = "asset_created",
            name = %asset.name,
            id = %asset_id,
        );

        wait_until_active("asset", &asset.name, "DescribeAsset", pacing, pause, || {
            service.asset_state(&asset_id)
        })?;
        table.append(&AssetRow {
            asset_name: asset.name.clone(),
            asset_id,
        })?;
    }
    Ok(table.rows())
}

fn associate_assets(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
) -> Result<usize> {
    let links = LinkTables::load(workspace)?.resolve_all(config)?;
    for link in &links {
        service
            .associate_assets(&link.as_link())
            .during("AssociateAssets")?;
        info!(
            component = "provisioner",
            event = "assets_associated",
            parent = %link.parent_name,
            child = %link.child_name,
        );
    }
    Ok(links.len())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use bulk_load_core::lookup::{AssetTable, HierarchyTable};
    use tempfile::TempDir;

    use super::*;
    use crate::test_support::{press_line_config, FakeSiteWise, RecordingPause};

    fn write_press_schema(workspace: &Workspace) {
        fs::create_dir_all(workspace.schema_dir()).unwrap();
        fs::write(
            workspace
                .schema_dir()
                .join("sample_stamping_press_properties.json"),
            r#"[{"name": "Temperature", "dataType": "DOUBLE", "unit": "Celsius", "type": {"measurement": {}}}]"#,
        )
        .unwrap();
    }

    #[test]
    fn provisions_models_hierarchies_assets_and_links() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        write_press_schema(&workspace);
        let service = FakeSiteWise::new().with_activation_checks(2);
        let pause = RecordingPause::default();

        let report = provision_hierarchy(
            &press_line_config(),
            &workspace,
            &service,
            &Pacing::default(),
            &pause,
        )
        .expect("provisioning should succeed");

        assert_eq!(
            report,
            ProvisionReport {
                models: 2,
                hierarchies: 1,
                assets: 3,
                associations: 2,
            }
        );

        let models = service.models();
        assert!(models[0].properties.is_empty());
        assert_eq!(models[1].properties[0].name, "Temperature");
        assert_eq!(models[0].hierarchies.len(), 1);
        assert_eq!(models[0].hierarchies[0].child_asset_model_id, models[1].id);

        let hierarchies = HierarchyTable::load(&workspace.hierarchy_table_path()).unwrap();
        let hierarchy_id = hierarchies
            .hierarchy_id("Sample_Press Line", &models[1].id)
            .unwrap();
        let assets = AssetTable::load(&workspace.asset_table_path()).unwrap();
        let line = assets.asset_id("Line 1").unwrap();
        assert_eq!(
            service.associations(),
            vec![
                (
                    line.to_string(),
                    hierarchy_id.to_string(),
                    assets.asset_id("Press 1").unwrap().to_string()
                ),
                (
                    line.to_string(),
                    hierarchy_id.to_string(),
                    assets.asset_id("Press 2").unwrap().to_string()
                ),
            ]
        );

        // two CREATING checks per model create, model update and asset create
        assert_eq!(pause.pauses().len(), 2 * (2 + 2 + 3));
    }

    #[test]
    fn failed_model_aborts_and_keeps_earlier_rows() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path());
        let service = FakeSiteWise::new().with_failing_model("Sample_Stamping Press");

        let error = provision_hierarchy(
            &press_line_config(),
            &workspace,
            &service,
            &Pacing::immediate(),
            &RecordingPause::default(),
        )
        .expect_err("failed model should abort");

        assert!(matches!(
            error,
            RunnerError::ResourceFailed { kind: "asset model", ref name } if name == "Sample_Stamping Press"
        ));
        let models = ModelTable::load(&workspace.model_table_path()).unwrap();
        assert_eq!(models.rows().len(), 1);
        assert!(models.model_id("Sample_Press Line").is_ok());
        assert!(service.assets().is_empty());
    }
}
