mod cli;
mod logging;
mod terminal;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Commands};
use dotenv::dotenv;
use reel_sync::catalog::{CatalogReconciler, SqliteCatalog};
use reel_sync::scanner::Scanner;
use reel_sync::{report, AppConfig, ProgressReporter, SilentReporter, SyncOrchestrator};
use std::path::Path;
use std::process;
use std::time::Instant;
use terminal::CliReporter;
use tracing::{error, info};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let interactive = terminal::is_interactive();
    if interactive {
        terminal::hide_cursor();
    }
    let result = run(&args, interactive);
    if interactive {
        terminal::show_cursor();
    }

    if let Err(err) = result {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run(args: &Cli, interactive: bool) -> anyhow::Result<()> {
    let config =
        reel_sync::config::load_configuration().context("Error loading configuration")?;

    let cli_reporter;
    let reporter: &dyn ProgressReporter = if interactive {
        cli_reporter = CliReporter::new();
        &cli_reporter
    } else {
        &SilentReporter
    };

    let dry_run = !args.apply;
    match args.command.as_ref().unwrap_or(&Commands::Run) {
        Commands::Run => {
            announce(dry_run);
            run_sync(&config, args.year, dry_run, reporter)?;
            run_catalog(&config, args.year, dry_run, reporter)?;
        }
        Commands::Sync => {
            announce(dry_run);
            run_sync(&config, args.year, dry_run, reporter)?;
        }
        Commands::Catalog => {
            announce(dry_run);
            run_catalog(&config, args.year, dry_run, reporter)?;
        }
        Commands::PrintConfig => {
            println!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn announce(dry_run: bool) {
    if dry_run {
        info!("Dry run, nothing will be changed. Pass --apply to make changes.");
    }
}

fn run_sync(
    config: &AppConfig,
    year: Option<i32>,
    dry_run: bool,
    reporter: &dyn ProgressReporter,
) -> anyhow::Result<()> {
    let orchestrator = SyncOrchestrator::new(config.clone(), dry_run);
    let summary = orchestrator.run(year, reporter)?;

    report::print_sync_summary(&summary);
    if let Some(csv_path) = &config.report_csv {
        report::append_sync_csv(&summary, Path::new(csv_path))
            .with_context(|| format!("Error writing report {}", csv_path))?;
    }
    Ok(())
}

fn run_catalog(
    config: &AppConfig,
    year: Option<i32>,
    dry_run: bool,
    reporter: &dyn ProgressReporter,
) -> anyhow::Result<()> {
    let opened = if dry_run {
        SqliteCatalog::open_for_preview(&config.catalog_path)
    } else {
        SqliteCatalog::open(&config.catalog_path)
    };
    let mut catalog =
        opened.with_context(|| format!("Error opening catalog {}", config.catalog_path))?;
    let mut reconciler = CatalogReconciler::new(
        &mut catalog,
        Scanner::new(&config.ignore_patterns),
        &config.media_type,
        dry_run,
    );

    let started = Instant::now();
    let plan = reconciler.plan(&config.local_root, year, reporter)?;
    let summary = reconciler.apply(&plan)?;
    reporter.on_catalog_complete(summary.writes(), started.elapsed().as_secs_f64());

    if dry_run {
        report::print_catalog_plan(&plan);
    }
    report::print_catalog_summary(&summary);
    Ok(())
}
