//! Flasky deployment tool.
//!
//! Applies database migrations, reconciles the role catalog, backfills
//! self-follow edges, and seeds demo accounts.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use flasky_auth::rbac::RoleCatalog;
use flasky_core::config::AppConfig;
use flasky_core::error::AppError;
use flasky_core::traits::SystemClock;
use flasky_database::DatabasePool;
use flasky_database::migration::run_migrations;
use flasky_service::{LogNotificationSink, Services};

/// Flasky deployment and maintenance commands
#[derive(Debug, Parser)]
#[command(name = "flasky", version, about, long_about = None)]
struct Cli {
    /// Configuration environment; selects `config/{env}.toml`
    #[arg(short, long)]
    env: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Migrate the database, reconcile roles, and backfill self-follows
    Deploy,
    /// Create or update the User, Moderator, and Administrator roles
    ReconcileRoles,
    /// Give every user the edge to itself
    AddSelfFollows,
    /// Create confirmed demo accounts with random profiles
    SeedUsers {
        /// Number of accounts to create
        #[arg(short, long, default_value_t = 100)]
        count: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_configuration(cli.env.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(cli.command, config).await {
        tracing::error!("Command failed: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration(env: Option<&str>) -> Result<AppConfig, AppError> {
    let env = env
        .map(str::to_string)
        .or_else(|| std::env::var("FLASKY_ENV").ok())
        .unwrap_or_else(|| "development".to_string());

    AppConfig::load(&env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(command: Commands, config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Flasky v{}", env!("CARGO_PKG_VERSION"));

    let db = DatabasePool::connect(&config.database).await?;
    let services = Services::new(
        &config,
        db.stores(),
        Arc::new(SystemClock),
        Arc::new(LogNotificationSink::new(config.mail.sender.clone())),
    )?;
    let catalog = RoleCatalog::standard();

    let result = match command {
        Commands::Deploy => {
            run_migrations(db.pool()).await?;
            services.roles.reconcile_roles(&catalog).await?;
            let created = services.follows.add_self_follows().await?;
            tracing::info!(self_follows_created = created, "Deploy complete");
            Ok(())
        }
        Commands::ReconcileRoles => services
            .roles
            .reconcile_roles(&catalog)
            .await
            .map(|roles| {
                for role in roles {
                    tracing::info!(role = %role.name, permissions = %role.permissions, default = role.is_default);
                }
            }),
        Commands::AddSelfFollows => services.follows.add_self_follows().await.map(|created| {
            tracing::info!(created, "Self-follow edges added");
        }),
        Commands::SeedUsers { count } => {
            services.identity.seed_fake_users(count).await.map(|created| {
                tracing::info!(created, "Demo users seeded");
            })
        }
    };

    db.close().await;
    result
}
