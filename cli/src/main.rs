//! CLI entrypoint for council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    AskUseCase, ConsultInput, ConsultUseCase, ConsultationLogger, Dispatcher, NoProgress,
    QueryOptions,
};
use council_domain::{Attachment, OutputFormat, Question};
use council_infrastructure::{
    ConfigLoader, FileConfig, JsonlConsultationLogger, adhoc_seats, build_seats,
};
use council_presentation::{Cli, ConsoleFormatter, ProgressMode, StreamPrinter};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    let Some(question) = cli.question.as_deref() else {
        bail!("A question is required. Run `council --help` for usage.");
    };
    let question = Question::try_new(question)?;

    // === Configuration ===
    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?
    };
    if !cli.seat.is_empty() {
        config.seats = adhoc_seats(&cli.seat);
    }
    if !config.output.color {
        colored::control::set_override(false);
    }

    info!(seats = config.seats.len(), "Starting council");

    // === Dependency Injection ===
    let seats = build_seats(&config)?;
    let dispatcher = Dispatcher::new(seats)?;

    let cancellation = CancellationToken::new();
    spawn_ctrl_c_handler(cancellation.clone());

    let options = QueryOptions::new()
        .with_attachments(read_attachments(&cli.attach)?)
        .with_cancellation(cancellation);

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    if let Some(seat) = cli.ask.as_deref() {
        return ask(&dispatcher, seat, &question, &options, format).await;
    }

    let mut use_case = ConsultUseCase::new(dispatcher);
    if let Some(logger) = consultation_logger(&config) {
        use_case = use_case.with_logger(logger);
    }

    let input = ConsultInput::new(question).with_options(options);
    let progress = ProgressMode::detect(cli.quiet, std::io::stderr().is_terminal()).notifier();
    let output = use_case.execute_with_progress(input, progress.as_ref()).await;

    println!("{}", ConsoleFormatter::render(&output, format));

    if output.deliberation.all_failed() {
        let errors = output
            .deliberation
            .failed_responses()
            .map(|r| {
                format!(
                    "{}: {}",
                    r.source_name,
                    r.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");
        bail!("Every seat failed ({errors})");
    }

    Ok(())
}

/// Stream a single seat's answer to stdout.
async fn ask(
    dispatcher: &Dispatcher,
    seat: &str,
    question: &Question,
    options: &QueryOptions,
    format: OutputFormat,
) -> Result<()> {
    let use_case = AskUseCase::for_seat(dispatcher, seat)?;

    if format == OutputFormat::Json {
        let response = use_case.execute(question, options, &NoProgress).await?;
        println!("{}", ConsoleFormatter::format_response_json(&response));
    } else {
        use_case.execute(question, options, &StreamPrinter).await?;
    }
    Ok(())
}

fn read_attachments(paths: &[PathBuf]) -> Result<Vec<Attachment>> {
    paths
        .iter()
        .map(|path| {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read attachment {}", path.display()))?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            Ok(Attachment::from_file_name(name, data)?)
        })
        .collect()
}

fn consultation_logger(config: &FileConfig) -> Option<Arc<dyn ConsultationLogger>> {
    let path = config.logging.consultation_log.as_ref()?;
    match JsonlConsultationLogger::new(path) {
        Some(logger) => Some(Arc::new(logger)),
        None => {
            warn!(path = %path.display(), "Consultation log disabled");
            None
        }
    }
}

/// Cancel in-flight seats on the first Ctrl-C.
fn spawn_ctrl_c_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling pending seats");
            token.cancel();
        }
    });
}
