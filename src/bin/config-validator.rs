//! # Batch Action Configuration Validator
//!
//! Loads `batch-actions.yaml` for an environment, validates it and prints the
//! effective settings with secrets masked.

use anyhow::{bail, Context, Result};
use batch_action_core::config::{BatchActionsConfig, ConfigManager};
use batch_action_core::database::DatabaseConnection;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

const ENVIRONMENTS: [&str; 3] = ["development", "test", "production"];

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate batch action configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory (default: ./config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format (table, json, yaml)
    #[arg(long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate the configuration for the selected environment
    Validate,

    /// Validate every known environment
    All,

    /// Print the effective configuration
    Show,

    /// Connect to the configured database and apply migrations
    Ping {
        /// Skip applying migrations
        #[arg(long)]
        no_migrate: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::All) => validate_all_environments(&cli),
        Some(Commands::Show) => show_config(&cli),
        Some(Commands::Ping { no_migrate }) => ping_database(&cli, *no_migrate),
        Some(Commands::Validate) | None => validate_environment(&cli, &cli.environment),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {e:#}");
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli, environment: &str) -> Result<std::sync::Arc<ConfigManager>> {
    ConfigManager::load_from_directory_with_env(cli.config_dir.clone(), environment)
        .with_context(|| format!("failed to load configuration for '{environment}'"))
}

fn validate_environment(cli: &Cli, environment: &str) -> Result<()> {
    println!("🔧 Validating batch action configuration");
    println!("Environment: {environment}");
    if let Some(config_dir) = &cli.config_dir {
        println!("Config Directory: {}", config_dir.display());
    }
    println!();

    let manager = load(cli, environment)?;
    print_summary(manager.config());
    check_database(manager.config())?;

    println!("\n🎉 Configuration for '{environment}' is valid");
    Ok(())
}

fn validate_all_environments(cli: &Cli) -> Result<()> {
    let mut failures = Vec::new();

    for environment in ENVIRONMENTS {
        match load(cli, environment) {
            Ok(_) => println!("✅ {environment}"),
            Err(e) => {
                println!("❌ {environment}: {e:#}");
                failures.push(environment);
            }
        }
    }

    if !failures.is_empty() {
        bail!("invalid configuration for: {}", failures.join(", "));
    }
    Ok(())
}

fn show_config(cli: &Cli) -> Result<()> {
    let manager = load(cli, &cli.environment)?;
    let sanitized = manager.debug_config();

    match cli.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&sanitized)?),
        "yaml" => print!("{}", serde_yaml::to_string(&sanitized)?),
        _ => print_summary(manager.config()),
    }
    Ok(())
}

fn ping_database(cli: &Cli, no_migrate: bool) -> Result<()> {
    let manager = load(cli, &cli.environment)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async {
        let connection = DatabaseConnection::new(&manager.config().database)
            .await
            .context("failed to connect to database")?;
        if !connection.health_check().await? {
            bail!("database health check returned an unexpected result");
        }
        println!("✅ Database reachable");

        if !no_migrate {
            connection
                .run_migrations()
                .await
                .context("failed to apply migrations")?;
            println!("✅ Migrations applied");
        }
        connection.close().await;
        Ok(())
    })
}

fn print_summary(config: &BatchActionsConfig) {
    println!("🗄️  Database");
    println!("   max_connections: {}", config.database.max_connections);
    println!("📦 Dataset mapping");
    println!("   chunk_size: {}", config.dataset_mapping.chunk_size);
    println!(
        "   progress_write_interval_chunks: {}",
        config.dataset_mapping.progress_write_interval_chunks
    );
    println!(
        "   max_errors_per_chunk: {}",
        config.dataset_mapping.max_errors_per_chunk
    );
    println!(
        "   max_retained_errors: {}",
        config.dataset_mapping.max_retained_errors
    );
    println!("🧪 Evaluation");
    println!("   batch_size: {}", config.evaluation.batch_size);
    println!("   max_concurrency: {}", config.evaluation.max_concurrency);
    println!("📝 Summary");
    println!("   max_error_lines: {}", config.summary.max_error_lines);
    println!("   max_log_chars: {}", config.summary.max_log_chars);
}

fn check_database(config: &BatchActionsConfig) -> Result<()> {
    match config.database.url.as_deref() {
        Some("") => bail!("database.url is configured but empty"),
        Some(url) if url.starts_with("${") => {
            if config.database_url().is_empty() {
                println!("   ⚠️  {url} is not set in this environment");
            } else {
                println!("   ✅ Database URL resolved from environment");
            }
        }
        Some(_) => println!("   ✅ Database URL configured"),
        None => println!("   ℹ️  Database URL not configured (reads DATABASE_URL)"),
    }
    Ok(())
}
