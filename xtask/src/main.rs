use std::process::{exit, Command, ExitStatus};

use clap::{Parser, Subcommand, ValueEnum};

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Task runner for the SiteWise bulk-load workspace",
    long_about = "A unified CLI for CI checks and for driving the sitewise_bulk\n\
                  steps (provision, simulate, upload, import, teardown)."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one sitewise_bulk step
    Step {
        #[arg(value_enum)]
        step: BulkStep,
        #[command(flatten)]
        target: Target,
    },
    /// Provision, simulate, upload and import in sequence
    Pipeline {
        #[command(flatten)]
        target: Target,
        /// Tear the hierarchy down again once the import finished
        #[arg(long)]
        teardown: bool,
    },
    /// Run CI checks (fmt, clippy, tests, release build)
    Ci {
        /// Job to run
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
}

#[derive(clap::Args, Clone)]
struct Target {
    /// Directory holding config/, schema/, tmp/ and data/
    #[arg(long, env = "SITEWISE_BULK_ROOT", default_value = ".")]
    root: String,
    /// AWS profile passed through to sitewise_bulk
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    region: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BulkStep {
    Provision,
    Teardown,
    Simulate,
    Upload,
    Import,
    ListJobs,
}

impl BulkStep {
    fn subcommand(self) -> &'static str {
        match self {
            Self::Provision => "provision",
            Self::Teardown => "teardown",
            Self::Simulate => "simulate",
            Self::Upload => "upload",
            Self::Import => "import",
            Self::ListJobs => "list-jobs",
        }
    }
}

#[derive(Clone, ValueEnum)]
enum CiJob {
    /// Formatting, clippy, and tests
    Check,
    /// Release build of the sitewise_bulk binary
    Build,
    /// Run check + build
    All,
}

// ── helpers ────────────────────────────────────────────────────────

fn step(label: &str) {
    eprintln!("\n=== {label} ===");
}

fn cargo(args: &[&str]) -> ExitStatus {
    eprintln!("+ cargo {}", args.join(" "));
    Command::new("cargo")
        .args(args)
        .status()
        .expect("failed to execute cargo")
}

fn run_cargo(args: &[&str]) {
    let status = cargo(args);
    if !status.success() {
        exit(status.code().unwrap_or(1));
    }
}

fn run_bulk_step(bulk_step: BulkStep, target: &Target) {
    step(&format!("sitewise_bulk {}", bulk_step.subcommand()));
    let mut args = vec![
        "run",
        "-p",
        "bulk_load_runner",
        "--bin",
        "sitewise_bulk",
        "--release",
        "--",
        "--root",
        target.root.as_str(),
    ];
    if let Some(profile) = &target.profile {
        args.extend(["--profile", profile.as_str()]);
    }
    if let Some(region) = &target.region {
        args.extend(["--region", region.as_str()]);
    }
    args.push(bulk_step.subcommand());
    run_cargo(&args);
}

// ── CI jobs ────────────────────────────────────────────────────────

fn ci_check() {
    step("Check formatting");
    run_cargo(&["fmt", "--all", "--", "--check"]);

    step("Clippy");
    run_cargo(&[
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ]);

    step("Test bulk_load_core");
    run_cargo(&["test", "-p", "bulk_load_core"]);

    step("Test bulk_load_runner");
    run_cargo(&["test", "-p", "bulk_load_runner"]);
}

fn ci_build() {
    step("Build sitewise_bulk");
    run_cargo(&[
        "build",
        "-p",
        "bulk_load_runner",
        "--bin",
        "sitewise_bulk",
        "--release",
    ]);
}

// ── main ───────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Step { step: bulk_step, target } => run_bulk_step(bulk_step, &target),
        Commands::Pipeline { target, teardown } => {
            for bulk_step in [
                BulkStep::Provision,
                BulkStep::Simulate,
                BulkStep::Upload,
                BulkStep::Import,
            ] {
                run_bulk_step(bulk_step, &target);
            }
            if teardown {
                run_bulk_step(BulkStep::Teardown, &target);
            }
            eprintln!("\nPipeline finished.");
        }
        Commands::Ci { job } => {
            match job {
                CiJob::Check => ci_check(),
                CiJob::Build => ci_build(),
                CiJob::All => {
                    ci_check();
                    ci_build();
                }
            }
            eprintln!("\nCI job passed.");
        }
    }
}
