use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use clinic_schedule::config::ClinicScheduleConfig;
use clinic_schedule::domain::partition;
use clinic_schedule::ClinicSchedule;

mod ingress;
mod shutdown;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "clinic_schedule";

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
/// - Adds `mode=rwc` when no query is given so the file is created on first run.
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create database dir {}", dir.display()))?;
        }
    }

    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Clinic Server - slot partitioning and appointment scheduling
#[derive(Parser)]
#[command(name = "clinic-server")]
#[command(about = "Clinic Server - slot partitioning and appointment scheduling")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep everything in process memory instead of the configured database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
    /// Print the slots a window would be partitioned into, without storing them
    Preview {
        /// Window start, HH:mm
        #[arg(long)]
        start: String,
        /// Window end, HH:mm
        #[arg(long)]
        end: String,
        /// Slot length in minutes
        #[arg(long, default_value_t = 30)]
        duration: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Preview is pure and needs neither config nor logging.
    if let Some(Commands::Preview {
        start,
        end,
        duration,
    }) = &cli.command
    {
        return preview(start, end, *duration);
    }

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config
        .logging
        .clone()
        .unwrap_or_else(runtime::default_logging_config);
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Clinic Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
        Commands::Preview { .. } => Ok(()),
    }
}

fn preview(start: &str, end: &str, duration: i64) -> Result<()> {
    partition::validate_window(start, end, duration)
        .map_err(|e| anyhow!("Cannot partition window: {e}"))?;

    let slots = partition::partition(start, end, duration);
    if slots.is_empty() {
        return Err(anyhow!(
            "Window {start}-{end} cannot fit a single {duration} minute slot"
        ));
    }
    for slot in &slots {
        println!("{}-{}", slot.start, slot.end);
    }
    println!("{} slots", slots.len());
    Ok(())
}

/// Detect DB backend from URL scheme.
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

async fn connect_database(db_config: &DatabaseConfig, base_dir: &Path) -> Result<DatabaseConnection> {
    let backend = detect_from_dsn(db_config)?;

    let mut dsn = db_config.url.trim().to_owned();
    if backend == "sqlite" {
        dsn = absolutize_sqlite_dsn(&dsn, base_dir, true)?;
    }

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(db_config.pool_size())
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    if let Some(busy) = db_config.busy_timeout() {
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))?;
    tracing::info!("Connected DB backend: {}", backend);
    Ok(db)
}

async fn build_module(config: &AppConfig, args: &CliArgs) -> Result<ClinicSchedule> {
    let module_cfg: ClinicScheduleConfig = config.module_config(MODULE_NAME)?;

    if args.mock {
        tracing::warn!("--mock set: using in-memory storage, nothing is persisted");
        return Ok(ClinicSchedule::in_memory(module_cfg));
    }

    let db_config = config
        .database
        .as_ref()
        .ok_or_else(|| anyhow!("No database configured; pass --mock to run without one"))?;
    let db = connect_database(db_config, Path::new(&config.server.home_dir)).await?;
    clinic_schedule::migrate(&db).await?;
    Ok(ClinicSchedule::with_database(db, module_cfg))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");
    let module = build_module(&config, &args).await?;

    let api = module.register_rest(axum::Router::new())?;
    let router = ingress::build_router(api, ingress::IngressOptions::from_server(&config.server));

    let addr = config.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown::graceful())
        .await
        .map_err(|e| anyhow!(e))?;

    tracing::info!("Clinic Server stopped");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    let module_cfg: ClinicScheduleConfig = config.module_config(MODULE_NAME)?;
    config.server.bind_addr()?;
    if let Some(db) = &config.database {
        detect_from_dsn(db)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Module config: {module_cfg:?}");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
