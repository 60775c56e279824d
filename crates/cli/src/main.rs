mod cli;
mod exit;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use lakesync_catalog::{
    CatalogError, CompletionPoller, CrawlJobLauncher, MaintenanceDriver, Mode, ParameterContext,
};
use lakesync_core::{load_dotenv, EngineConfig};
use lakesync_glue::{AwsClients, GlueCrawlService, SsmParameterStore};
use lakesync_storage::{CsvReferenceDate, ObjectBackend, ObjectSnapshotStore};

use crate::cli::CliArgs;
use crate::exit::Exit;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    load_dotenv();
    let args = CliArgs::parse();

    let exit = match run(&args).await {
        Ok(exit) => exit,
        Err(e) => {
            error!("{e:#}");
            Exit::Configuration
        }
    };
    println!("{}", serde_json::json!({ "status": exit.verdict() }));
    exit.into()
}

/// Everything up to the driver is setup; a failure there is a configuration
/// error. The driver's own errors are classified by the driver.
async fn run(args: &CliArgs) -> Result<Exit> {
    let invocation = args.invocation()?;
    let mode = match invocation.validate() {
        Ok(mode) => mode,
        Err(e) => {
            error!(error = %e, "Invalid invocation");
            return Ok(Exit::Configuration);
        }
    };

    let config = EngineConfig::from_env();
    config.log_summary();

    let group = args
        .group
        .clone()
        .or_else(|| config.group.clone())
        .context("no catalog group: pass --group or set GROUP")?;
    let poll = args.poll_settings(&config.crawl)?;

    let clients = AwsClients::new(&config.aws)
        .await
        .context("failed to initialise AWS clients")?;
    let backend = Arc::new(
        ObjectBackend::from_config(&config.aws, args.local_root.as_deref())
            .context("failed to initialise object store")?,
    );

    let params = Arc::new(SsmParameterStore::new(clients.ssm.clone()));
    let crawler = Arc::new(GlueCrawlService::new(clients.glue.clone()));
    let context = ParameterContext::new(
        group,
        config.params.clone(),
        config.snapshot.reference_date_key.clone(),
        params.clone(),
        Arc::new(CsvReferenceDate::new(backend.clone())),
    );

    let driver = MaintenanceDriver::new(
        Arc::new(context),
        Arc::new(ObjectSnapshotStore::new(backend)),
        CrawlJobLauncher::new(params, crawler.clone(), config.params.clone()),
        CompletionPoller::new(crawler),
    )
    .with_snapshot_format(config.snapshot.format.clone())
    .with_poll_settings(poll);

    Ok(execute(&driver, mode, args.require_ready).await)
}

async fn execute(driver: &MaintenanceDriver, mode: Mode, require_ready: bool) -> Exit {
    match driver.run_mode(mode).await {
        Ok(report) => {
            info!("\n{report}");
            Exit::from_report(&report, require_ready)
        }
        Err(e) => {
            log_run_error(&e);
            Exit::from_error(&e)
        }
    }
}

fn log_run_error(err: &CatalogError) {
    if err.is_configuration() {
        error!(error = %err, "Configuration error, run aborted");
    } else {
        error!(error = %err, "Run failed");
    }
}
