use std::path::PathBuf;
use std::process::ExitCode;

use aws_config::SdkConfig;
use bulk_load_core::settings::{
    load_bulk_import_config, load_hierarchy_config, load_simulation_config, Workspace,
};
use bulk_load_runner::adapters::aws::{load_sdk_config, S3ObjectStore, SiteWiseAdapter};
use bulk_load_runner::adapters::pacing::{SystemClock, ThreadPause};
use bulk_load_runner::error::Result;
use bulk_load_runner::handlers::import::{list_jobs, run_bulk_import};
use bulk_load_runner::handlers::poll::Pacing;
use bulk_load_runner::handlers::provision::provision_hierarchy;
use bulk_load_runner::handlers::simulate::simulate_historical_data;
use bulk_load_runner::handlers::teardown::teardown_hierarchy;
use bulk_load_runner::handlers::upload::upload_data_files;
use bulk_load_runner::logging::{init_logging, LogFormat};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

/// Provision an IoT SiteWise asset hierarchy and bulk-load simulated history.
#[derive(Parser)]
#[command(author, version)]
struct Cli {
    /// Directory holding config/, schema/, tmp/ and data/.
    #[arg(long, env = "SITEWISE_BULK_ROOT", default_value = ".", global = true)]
    root: PathBuf,
    /// Named AWS profile; the default credential chain is used when absent.
    #[arg(long, env = "AWS_PROFILE", global = true)]
    profile: Option<String>,
    #[arg(long, global = true)]
    region: Option<String>,
    #[arg(long, value_enum, default_value_t = LogFormat::Json, global = true)]
    log_format: LogFormat,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum Command {
    /// Create asset models, hierarchy definitions, assets and associations.
    Provision,
    /// Delete everything `provision` created and clear tmp/ and data/.
    Teardown,
    /// Generate historical data files for the provisioned assets.
    Simulate,
    /// Upload the generated data files to S3.
    Upload,
    /// Run one bulk-import job per uploaded object and wait for completion.
    Import,
    /// Print every bulk-import job.
    ListJobs,
}

fn print_json(value: &impl Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(error) => warn!(component = "cli", event = "output_failed", error = %error),
    }
}

fn run(command: Command, workspace: &Workspace, sdk_config: &SdkConfig) -> Result<()> {
    let sitewise = SiteWiseAdapter::new(aws_sdk_iotsitewise::Client::new(sdk_config));
    let pacing = Pacing::default();
    let pause = ThreadPause;

    match command {
        Command::Provision => {
            let hierarchy = load_hierarchy_config(&workspace.hierarchy_config_path())?;
            let report = provision_hierarchy(&hierarchy, workspace, &sitewise, &pacing, &pause)?;
            print_json(&report);
        }
        Command::Teardown => {
            let hierarchy = load_hierarchy_config(&workspace.hierarchy_config_path())?;
            let report = teardown_hierarchy(&hierarchy, workspace, &sitewise, &pacing, &pause)?;
            print_json(&report);
        }
        Command::Simulate => {
            let hierarchy = load_hierarchy_config(&workspace.hierarchy_config_path())?;
            let simulation = load_simulation_config(&workspace.simulation_config_path())?;
            let bulk_import = load_bulk_import_config(&workspace.bulk_import_config_path())?;
            let summary = simulate_historical_data(
                &hierarchy,
                &simulation,
                &bulk_import,
                workspace,
                &sitewise,
            )?;
            print_json(&json!({
                "targets": summary.targets,
                "rows": summary.rows,
                "files": summary
                    .files
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>(),
            }));
        }
        Command::Upload => {
            let bulk_import = load_bulk_import_config(&workspace.bulk_import_config_path())?;
            let store = S3ObjectStore::new(aws_sdk_s3::Client::new(sdk_config));
            let keys = upload_data_files(&bulk_import, workspace, &store)?;
            print_json(&json!({ "bucket": bulk_import.data.bucket, "keys": keys }));
        }
        Command::Import => {
            let bulk_import = load_bulk_import_config(&workspace.bulk_import_config_path())?;
            let store = S3ObjectStore::new(aws_sdk_s3::Client::new(sdk_config));
            let report =
                run_bulk_import(&bulk_import, &store, &sitewise, &SystemClock, &pacing, &pause)?;
            if !report.completed_cleanly() {
                warn!(
                    component = "cli",
                    event = "jobs_not_completed",
                    message = "some jobs did not complete cleanly; check the error report location",
                );
            }
            print_json(&report);
        }
        Command::ListJobs => {
            print_json(&list_jobs(&sitewise)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_format);

    let sdk_config = load_sdk_config(cli.profile.as_deref(), cli.region.as_deref()).await;
    let workspace = Workspace::new(&cli.root);
    info!(
        component = "cli",
        event = "command_started",
        command = ?cli.command,
        root = %workspace.root().display(),
    );

    match run(cli.command, &workspace, &sdk_config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(component = "cli", event = "command_failed", error = %error);
            ExitCode::FAILURE
        }
    }
}
