use bulk_load_core::lookup::clear_dir;
use bulk_load_core::settings::{BulkImportConfig, HierarchyConfig, SimulationConfig, Workspace};
use bulk_load_core::simulation::{simulate_to_dir, PropertyTarget, SimulationSummary};
use tracing::info;

use crate::adapters::asset_service::AssetService;
use crate::error::{Result, RunnerError, ServiceResultExt};

/// One target per (property, asset) pair of every configured model the
/// service knows about. Unconfigured models are skipped.
pub fn collect_property_targets(
    config: &HierarchyConfig,
    service: &dyn AssetService,
) -> Result<Vec<PropertyTarget>> {
    let mut targets = Vec::new();
    for model in service.list_asset_models().during("ListAssetModels")? {
        if !config.has_model(&model.name) {
            continue;
        }
        let assets = service.list_assets(&model.id).during("ListAssets")?;
        let properties = service
            .list_asset_model_properties(&model.id)
            .during("ListAssetModelProperties")?;

        for property in &properties {
            for asset in &assets {
                targets.push(PropertyTarget {
                    asset_id: asset.id.clone(),
                    property_id: property.id.clone(),
                    property_name: property.name.clone(),
                    model_name: model.name.clone(),
                });
            }
        }
    }
    Ok(targets)
}

/// Regenerates `data/` from scratch for the provisioned assets.
pub fn simulate_historical_data(
    hierarchy: &HierarchyConfig,
    simulation: &SimulationConfig,
    bulk_import: &BulkImportConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
) -> Result<SimulationSummary> {
    workspace.ensure_dirs().map_err(|source| RunnerError::Io {
        path: workspace.root().to_path_buf(),
        source,
    })?;
    let stale = clear_dir(&workspace.data_dir())?;
    if stale > 0 {
        info!(component = "simulator", event = "stale_data_removed", files = stale);
    }

    let targets = collect_property_targets(hierarchy, service)?;
    info!(
        component = "simulator",
        event = "property_targets_collected",
        targets = targets.len(),
    );

    let summary = simulate_to_dir(
        &targets,
        simulation,
        &bulk_import.data.column_names,
        workspace.data_dir(),
        bulk_import.job.rows_per_job,
    )?;
    info!(
        component = "simulator",
        event = "simulation_completed",
        rows = summary.rows,
        files = summary.files.len(),
    );
    Ok(summary)
}
