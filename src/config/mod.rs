use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 8380;
const DEFAULT_PAGE_SIZE: i64 = 10;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("taskboard"))
        .unwrap_or_else(|| PathBuf::from(".taskboard"))
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Server observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// HTTP server port (default: 8380).
    port: Option<u16>,
    /// Bind address (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Tasks shown per list page (default: 10).
    page_size: Option<i64>,
    /// Filesystem path of the default task form template. Overrides the
    /// built-in template; a path that cannot be loaded aborts startup.
    form_template: Option<PathBuf>,
    /// Log level filter string, e.g. "debug", "info,taskboard=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── ServerConfig ─────────────────────────────────────────────────────────────

/// Resolved server configuration, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_address: String,
    /// Directory holding config.toml and the SQLite database.
    pub data_dir: PathBuf,
    /// Default tasks per list page; a request's `size` query param overrides it.
    pub page_size: i64,
    /// Optional override path for the default task form template.
    pub form_template: Option<PathBuf>,
    pub log: String,
    pub log_format: String,
    pub log_file: Option<PathBuf>,
    pub observability: ObservabilityConfig,
}

impl ServerConfig {
    /// Merge CLI/env values over the TOML file over built-in defaults.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        bind_address: Option<String>,
        page_size: Option<i64>,
        form_template: Option<PathBuf>,
        log: Option<String>,
        log_file: Option<PathBuf>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);
        let file = load_toml(&data_dir).unwrap_or_default();

        Self {
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            bind_address: bind_address
                .or(file.bind_address)
                .unwrap_or_else(default_bind_address),
            page_size: page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE).max(1),
            form_template: form_template.or(file.form_template),
            log: log.or(file.log).unwrap_or_else(|| "info".to_string()),
            log_format: file.log_format.unwrap_or_else(|| "pretty".to_string()),
            log_file,
            observability: file.observability.unwrap_or_default(),
            data_dir,
        }
    }
}
