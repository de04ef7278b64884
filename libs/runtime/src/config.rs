use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::paths::home_dir::resolve_home_dir;

/// Prefix for environment overrides, e.g. `CLINIC__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "CLINIC__";

/// Handler timeout used when `server.timeout_sec` is 0.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_PORT: u16 = 8090;
const DEFAULT_POOL_SIZE: u32 = 10;
const HOME_SUBDIR: &str = ".clinic_schedule";

/// Everything `clinic-server` reads at startup.
///
/// `modules` is keyed by module name; each entry is decoded on demand with
/// [`AppConfig::module_config`] so the runtime does not depend on module crates.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// Absent means no persistent storage; the server then needs `--mock`.
    pub database: Option<DatabaseConfig>,
    /// Absent means [`default_logging_config`].
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub modules: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Base for relative sqlite paths and log files. Absolute after loading.
    pub home_dir: String,
    pub host: String,
    pub port: u16,
    /// Handler timeout in seconds; 0 means [`DEFAULT_REQUEST_TIMEOUT`].
    #[serde(default)]
    pub timeout_sec: u64,
    /// Answer cross-origin requests from any origin (front-end dev servers).
    #[serde(default)]
    pub cors_enabled: bool,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        match self.timeout_sec {
            0 => DEFAULT_REQUEST_TIMEOUT,
            secs => Duration::from_secs(secs),
        }
    }

    /// `host:port` as a socket address. `host` must be an IP literal.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address '{}:{}'", self.host, self.port))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            // Empty resolves to $HOME/.clinic_schedule (%APPDATA% on Windows).
            home_dir: String::new(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            timeout_sec: 0,
            cors_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// `sqlite://database/clinic.db` (relative to `home_dir`) or `postgres://...`.
    pub url: String,
    pub max_conns: Option<u32>,
    /// SQLite only.
    pub busy_timeout_ms: Option<u32>,
}

impl DatabaseConfig {
    pub fn pool_size(&self) -> u32 {
        self.max_conns.unwrap_or(DEFAULT_POOL_SIZE)
    }

    pub fn busy_timeout(&self) -> Option<Duration> {
        self.busy_timeout_ms
            .map(|ms| Duration::from_millis(u64::from(ms)))
    }
}

/// Subsystem name (`default`, `clinic_schedule`, `sea_orm`, ...) to its settings.
pub type LoggingConfig = HashMap<String, Section>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Section {
    pub console_level: String,
    /// Relative to `home_dir` unless absolute.
    pub file: String,
    #[serde(default)]
    pub file_level: String,
    pub max_age_days: Option<u32>,
    #[serde(default)]
    pub max_backups: Option<usize>,
    #[serde(default)]
    pub max_size_mb: Option<u64>,
}

pub fn default_logging_config() -> LoggingConfig {
    HashMap::from([(
        "default".to_string(),
        Section {
            console_level: "info".to_string(),
            file: "logs/clinic.log".to_string(),
            file_level: "debug".to_string(),
            max_age_days: Some(7),
            max_backups: Some(3),
            max_size_mb: Some(100),
        },
    )])
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: Some(DatabaseConfig {
                url: "sqlite://database/clinic.db".to_string(),
                max_conns: Some(DEFAULT_POOL_SIZE),
                busy_timeout_ms: Some(5000),
            }),
            logging: Some(default_logging_config()),
            modules: HashMap::new(),
        }
    }
}

impl AppConfig {
    /// Server defaults, then the YAML file, then `CLINIC__*` environment.
    ///
    /// Optional sections stay empty unless the file or environment sets them.
    pub fn load_layered<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        use figment::{
            providers::{Env, Format, Serialized, Yaml},
            Figment,
        };

        let path = config_path.as_ref();
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }

        let base = AppConfig {
            server: ServerConfig::default(),
            database: None,
            logging: None,
            modules: HashMap::new(),
        };

        let mut config: AppConfig = Figment::new()
            .merge(Serialized::defaults(base))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to parse yaml config '{}'", path.display()))?;

        config.normalize_home_dir()?;
        Ok(config)
    }

    /// [`AppConfig::load_layered`] when a path is given, built-in defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_layered(path),
            None => {
                let mut config = Self::default();
                config.normalize_home_dir()?;
                Ok(config)
            }
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config to YAML")
    }

    /// Decode `modules.<module_name>`; a missing entry yields `T::default()`.
    pub fn module_config<T>(&self, module_name: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        match self.modules.get(module_name) {
            Some(raw) => serde_json::from_value(raw.clone())
                .with_context(|| format!("Invalid config for module '{module_name}'")),
            None => Ok(T::default()),
        }
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(port) = args.port {
            self.server.port = port;
        }

        if args.verbose > 0 {
            let level = if args.verbose == 1 { "debug" } else { "trace" };
            let logging = self.logging.get_or_insert_with(default_logging_config);
            if let Some(default_section) = logging.get_mut("default") {
                default_section.console_level = level.to_string();
            }
        }
    }

    fn normalize_home_dir(&mut self) -> Result<()> {
        let configured = Some(self.server.home_dir.trim())
            .filter(|raw| !raw.is_empty())
            .map(str::to_owned);
        let resolved = resolve_home_dir(configured, HOME_SUBDIR, true)
            .context("Failed to resolve server.home_dir")?;
        self.server.home_dir = resolved.to_string_lossy().to_string();
        Ok(())
    }
}

/// Flags from the `clinic-server` command line that touch configuration.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config: Option<String>,
    pub port: Option<u16>,
    pub print_config: bool,
    pub verbose: u8,
    pub mock: bool,
}
