use bulk_load_core::lookup::clear_dir;
use bulk_load_core::settings::{HierarchyConfig, Workspace};
use serde::Serialize;
use tracing::info;

use crate::adapters::asset_service::{AssetModelUpdate, AssetService};
use crate::adapters::pacing::Pause;
use crate::error::{Result, ServiceResultExt};
use crate::handlers::links::LinkTables;
use crate::handlers::poll::{wait_until_active, Pacing};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TeardownReport {
    pub disassociated: usize,
    pub assets_deleted: usize,
    pub models_deleted: usize,
    pub files_removed: usize,
}

/// Reverses provisioning: unlinks and deletes the assets, strips every model
/// down to its name, deletes the models and finally empties `data/` and `tmp/`.
pub fn teardown_hierarchy(
    config: &HierarchyConfig,
    workspace: &Workspace,
    service: &dyn AssetService,
    pacing: &Pacing,
    pause: &dyn Pause,
) -> Result<TeardownReport> {
    let tables = LinkTables::load(workspace)?;

    let links = tables.resolve_all(config)?;
    for link in &links {
        service
            .disassociate_assets(&link.as_link())
            .during("DisassociateAssets")?;
        info!(
            component = "teardown",
            event = "assets_disassociated",
            parent = %link.parent_name,
            child = %link.child_name,
        );
    }

    for asset in &config.assets {
        let asset_id = tables.assets().asset_id(&asset.name)?;
        service.delete_asset(asset_id).during("DeleteAsset")?;
        info!(component = "teardown", event = "asset_deleted", name = %asset.name);
    }
    // deletes propagate asynchronously
    pause.pause(pacing.settle_delay);

    for model in &config.asset_models {
        let model_id = tables.models().model_id(&model.name)?;
        service
            .update_asset_model(&AssetModelUpdate {
                model_id,
                model_name: &model.name,
                properties: &[],
                hierarchies: &[],
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
    }

    for model in &config.asset_models {
        let model_id = tables.models().model_id(&model.name)?;
        service
            .delete_asset_model(model_id)
            .during("DeleteAssetModel")?;
        info!(component = "teardown", event = "asset_model_deleted", name = %model.name);
        pause.pause(pacing.settle_delay);
    }

    let files_removed = cleanup_filesystem(workspace)?;
    let report = TeardownReport {
        disassociated: links.len(),
        assets_deleted: config.assets.len(),
        models_deleted: config.asset_models.len(),
        files_removed,
    };
    info!(
        component = "teardown",
        event = "teardown_completed",
        assets = report.assets_deleted,
        models = report.models_deleted,
        files = report.files_removed,
    );
    Ok(report)
}

/// Removes generated data files and lookup tables.
pub fn cleanup_filesystem(workspace: &Workspace) -> Result<usize> {
    let data_files = clear_dir(&workspace.data_dir())?;
    let tmp_files = clear_dir(&workspace.tmp_dir())?;
    Ok(data_files + tmp_files)
}
