use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use taskboard::{
    chat::ChatBroadcaster, config::ServerConfig, storage::Storage, view::Templates, web,
    AppContext,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "taskboard",
    about = "Taskboard — web front-end for browsing and rendering queued tasks",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port
    #[arg(long, env = "TASKBOARD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "TASKBOARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Bind address for the HTTP server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TASKBOARD_BIND")]
    bind_address: Option<String>,

    /// Tasks shown per list page (default: 10)
    #[arg(long, env = "TASKBOARD_PAGE_SIZE")]
    page_size: Option<i64>,

    /// Filesystem path of the default task form template (overrides the built-in)
    #[arg(long, env = "TASKBOARD_FORM_TEMPLATE")]
    form_template: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TASKBOARD_LOG")]
    log: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TASKBOARD_LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the web server (default when no subcommand given).
    ///
    /// Runs taskboard in the foreground.
    ///
    /// Examples:
    ///   taskboard serve
    ///   taskboard
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    match args.command {
        Some(Command::Serve) | None => serve(args).await,
    }
}

async fn serve(args: Args) -> Result<()> {
    let config = Arc::new(ServerConfig::new(
        args.port,
        args.data_dir,
        args.bind_address,
        args.page_size,
        args.form_template,
        args.log,
        args.log_file,
    ));

    let _log_guard = setup_logging(&config.log, config.log_file.as_deref(), &config.log_format);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "starting taskboard"
    );

    let storage = Arc::new(
        Storage::new_with_slow_query(
            &config.data_dir,
            config.observability.slow_query_threshold_ms,
        )
        .await
        .context("opening task database")?,
    );

    // Template load failure is fatal — the daemon cannot render without it.
    let templates = Arc::new(
        Templates::load(config.form_template.as_deref())
            .context("loading task form template")?,
    );

    let ctx = Arc::new(AppContext {
        config,
        storage,
        templates,
        chat: Arc::new(ChatBroadcaster::new()),
        started_at: std::time::Instant::now(),
    });

    web::start_web_server(ctx).await
}

/// Initialise the tracing subscriber. Returns the appender guard when logging
/// to a file so buffered lines are flushed on shutdown.
fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("taskboard.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt()
                    .json()
                    .with_env_filter(log_level)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_env_filter(log_level)
                    .compact()
                    .init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
                .init();
        }
        return Some(guard);
    }

    if use_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(log_level)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(log_level)
            .compact()
            .init();
    }
    None
}
