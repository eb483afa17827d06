mod config;

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use ferry_core::{ReferenceData, ZonedClock};
use ferry_engine::{
    ChromeRenderer, JsonFileStore, Renderer, ReqwestRenderer, RouteStore, Scheduler,
    ScrapePipeline,
};
use ferry_logging::{ferry_error, ferry_info};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{AppConfig, RenderBackend};

#[derive(Parser)]
#[command(name = "ferry", version, about = "Scrape and publish daily ferry schedules")]
struct Cli {
    /// Configuration file (RON). Defaults apply when it does not exist.
    #[arg(short, long, default_value = "ferry.ron")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape and clean up on start and then on a timer, until Ctrl-C.
    Serve,
    /// Run a single scrape cycle and print its report.
    Once,
    /// Purge stored routes older than the retention window.
    Cleanup,
    /// Print stored route metadata, optionally for the given codes only.
    Routes { codes: Vec<String> },
    /// Print one stored route with all its sailings.
    Route { code: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = config::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    ferry_logging::initialize(&config.log_destination(), config.log_level());

    let store: Arc<dyn RouteStore> = Arc::new(JsonFileStore::new(config.store_dir.clone()));

    match cli.command {
        Command::Serve => serve(&config, store).await,
        Command::Once => {
            let pipeline = build_pipeline(&config, store)?;
            let cancel = CancellationToken::new();
            cancel_on_ctrl_c(cancel.clone());
            let report = pipeline.run_cycle(&cancel).await;
            ferry_info!("{}", report);
            print_json(&report)
        }
        Command::Cleanup => {
            let pipeline = build_pipeline(&config, store)?;
            let removed = pipeline.run_cleanup().await.context("purging old routes")?;
            println!("removed {removed} route(s)");
            Ok(())
        }
        Command::Routes { codes } => {
            let codes: Vec<String> = codes.iter().map(|c| c.to_uppercase()).collect();
            let filter = (!codes.is_empty()).then_some(codes.as_slice());
            let info = store.list_route_info(filter).context("listing routes")?;
            print_json(&info)
        }
        Command::Route { code } => {
            let code = code.to_uppercase();
            match store.get_route(&code).context("reading route")? {
                Some(record) => print_json(&record),
                None => bail!("no stored route {code}"),
            }
        }
    }
}

async fn serve(config: &AppConfig, store: Arc<dyn RouteStore>) -> anyhow::Result<()> {
    let pipeline = Arc::new(build_pipeline(config, store)?);
    let shutdown = CancellationToken::new();
    cancel_on_ctrl_c(shutdown.clone());

    let state = Scheduler::new(pipeline, config.scheduler_settings())
        .run(shutdown)
        .await;
    ferry_info!(
        "Stopped after {} job(s); {} trigger(s) dropped while busy",
        state.completed(),
        state.dropped_triggers()
    );
    Ok(())
}

/// Cancels `token` on Ctrl-C, aborting in-flight fetches.
fn cancel_on_ctrl_c(token: CancellationToken) {
    cancel_on(tokio::signal::ctrl_c(), token);
}

fn cancel_on<S>(signal: S, token: CancellationToken)
where
    S: Future<Output = io::Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        match signal.await {
            Ok(()) => ferry_info!("Shutdown requested"),
            Err(err) => ferry_error!("Cannot listen for Ctrl-C, shutting down: {}", err),
        }
        token.cancel();
    });
}

fn build_pipeline(config: &AppConfig, store: Arc<dyn RouteStore>) -> anyhow::Result<ScrapePipeline> {
    let reference = match &config.reference_path {
        Some(path) => ReferenceData::from_path(path)
            .with_context(|| format!("loading reference data {}", path.display()))?,
        None => ReferenceData::builtin().context("loading built-in reference data")?,
    };
    ferry_info!(
        "Reference data v{} with {} route(s)",
        reference.version(),
        reference.routes().len()
    );

    let renderer: Arc<dyn Renderer> = match config.render.backend {
        RenderBackend::Browser => Arc::new(ChromeRenderer::new(config.browser_settings())),
        RenderBackend::Http => Arc::new(
            ReqwestRenderer::new(config.render_settings()).context("building HTTP client")?,
        ),
    };
    let clock = ZonedClock::new(&config.timezone);

    Ok(ScrapePipeline::new(
        renderer,
        store,
        Arc::new(reference),
        Arc::new(clock),
        config.pipeline_settings(),
    ))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
