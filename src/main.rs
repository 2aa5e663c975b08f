//! arc2zen command-line entry point.
//!
//! Loads settings, runs the migration and prints the report summary.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use arc2zen::app::Migrator;
use arc2zen::managers::container_manager::parse_mapping_arg;
use arc2zen::services::importer::ImportMode;
use arc2zen::services::settings_engine::{parse_setting_arg, SettingsEngine, SettingsEngineTrait};
use arc2zen::types::destination::DestinationProfile;
use arc2zen::types::errors::MigrationError;
use arc2zen::types::report::MigrationReport;

#[derive(Debug, Parser)]
#[command(name = "arc2zen", version, about = "Migrate Arc spaces, pins and folders into a Zen profile")]
struct Cli {
    /// Arc sidebar document (StorableSidebar.json)
    #[arg(long, value_name = "PATH")]
    sidebar: PathBuf,

    /// Zen profile directory holding places.sqlite
    #[arg(long, value_name = "DIR")]
    profile: PathBuf,

    /// Run the whole import and roll it back
    #[arg(long)]
    dry_run: bool,

    /// JSON settings file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Override one setting by dotted key, e.g. extractor.min_score=5
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_setting_arg)]
    settings: Vec<(String, serde_json::Value)>,

    /// Write the effective settings back to --config
    #[arg(long, requires = "config")]
    save_config: bool,

    /// Map a space to an existing container id
    #[arg(long = "container", value_name = "NAME=ID", value_parser = parse_mapping_arg)]
    containers: Vec<(String, i64)>,

    /// Write the extracted tree as JSON
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<MigrationReport, MigrationError> {
    let mut engine = SettingsEngine::new(cli.config.clone());
    engine.load()?;
    for (key, value) in cli.settings {
        engine.set_value(&key, value)?;
    }
    if cli.save_config {
        engine.save()?;
    }
    let migrator = Migrator::new(engine.get_settings().clone());

    let extraction = migrator.extract(&cli.sidebar)?;
    if let Some(path) = &cli.export {
        Migrator::export_tree(&extraction.tree, path)?;
    }

    let overrides: BTreeMap<String, i64> = cli.containers.into_iter().collect();
    let mode = if cli.dry_run {
        ImportMode::DryRun
    } else {
        ImportMode::Commit
    };
    migrator.import(extraction, &DestinationProfile::new(&cli.profile), &overrides, mode)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(report) => {
            print!("{}", report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "migration failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
