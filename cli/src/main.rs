//! CLI entrypoint for insight-quorum
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use insight_application::{
    AgentRegistry, AnalyzeInput, AnalyzeUseCase, DataProvider, Dispatcher, IntegrationManager,
    NoDataProvider, ProcessorCoordinator, ProcessorRegistry,
};
use insight_domain::{Critic, OutputFormat, Query, QueryContext};
use insight_infrastructure::{
    ConfigLoader, FileConfig, FixtureDataProvider, JsonlEventLogger, build_generator,
};
use insight_presentation::{
    Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging: stderr by verbosity (RUST_LOG wins when set), plus an
/// optional daily-rolling file
fn init_logging(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "insight-quorum.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(filter());
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();

    guard
}

fn load_config(cli: &Cli) -> Result<FileConfig> {
    let overrides = cli.config_overrides();
    let config = if cli.no_config {
        ConfigLoader::load_without_files(&overrides)
    } else {
        ConfigLoader::load(cli.config.as_deref(), &overrides)
    };
    config.context("Failed to load configuration")
}

fn build_use_case(file_config: &FileConfig) -> Result<AnalyzeUseCase> {
    let config = file_config.to_insight_config()?;

    // === Dependency Injection ===
    let provider: Arc<dyn DataProvider> = match &file_config.data.fixture {
        Some(path) => Arc::new(FixtureDataProvider::load(path)?),
        None => {
            info!("No data fixture configured, specialists answer without live data");
            Arc::new(NoDataProvider)
        }
    };
    let generator = build_generator(&file_config.generation);
    info!("Text generation backend: {}", generator.name());

    let stages = ProcessorRegistry::with_defaults(provider, generator, &config.orchestration);
    let coordinator = Arc::new(
        ProcessorCoordinator::new(stages, config.pipelines.clone())
            .with_max_run_age(config.orchestration.run_max_age),
    );
    let integration = Arc::new(IntegrationManager::new(
        coordinator,
        config.orchestration.default_pipeline.clone(),
    ));
    let agents = Arc::new(AgentRegistry::from_config(&config, integration));
    let dispatcher = Dispatcher::new(agents, config.orchestration.clone());

    let mut use_case = AnalyzeUseCase::new(dispatcher, Critic::new(config.critic.clone()));
    if let Some(path) = &file_config.logging.event_log {
        match JsonlEventLogger::new(path) {
            Some(logger) => {
                info!("Event log: {}", logger.path().display());
                use_case = use_case.with_event_logger(Arc::new(logger));
            }
            None => warn!("Event logging disabled: cannot open {}", path.display()),
        }
    }
    Ok(use_case)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    let file_config = load_config(&cli)?;
    let _log_guard = init_logging(cli.verbose, file_config.logging.log_dir.as_deref());

    info!("Starting insight-quorum");

    for issue in file_config.validate().iter().filter(|i| !i.is_error()) {
        warn!("{}", issue);
    }

    let Some(question) = cli.query.as_deref() else {
        bail!("A question is required, e.g. insight-quorum \"Order revenue for May\"");
    };

    if !file_config.output.color {
        ConsoleFormatter::disable_color();
    }

    let use_case = build_use_case(&file_config)?;

    // Ctrl-C cancels the analysis; the partial result is still printed
    let cancellation = CancellationToken::new();
    {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancellation.cancel();
            }
        });
    }

    let mut context = QueryContext::new();
    if let Some(user) = &cli.user {
        context = context.with_user(user.clone());
    }
    if let Some(session) = &cli.session {
        context = context.with_session(session.clone());
    }
    let input =
        AnalyzeInput::new(Query::with_context(question, context)).with_cancellation(cancellation);

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(file_config.output.format)
        .unwrap_or_default();
    let show_progress =
        !cli.quiet && file_config.output.show_progress && format != OutputFormat::Json;

    let result = if !show_progress {
        use_case.execute(input).await
    } else if cli.verbose > 0 {
        // log lines would tear the progress bars
        use_case.execute_with_progress(input, &SimpleProgress).await
    } else {
        let progress = ProgressReporter::new();
        use_case.execute_with_progress(input, &progress).await
    };

    println!("{}", ConsoleFormatter.render(&result, format));

    Ok(())
}
