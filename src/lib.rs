pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod expiry;
pub mod models;
pub mod services;
pub mod sources;

use anyhow::Context;
use clap::Parser;
use cli::{
    Cli, Commands, cmd_add_show, cmd_list_episodes, cmd_list_shows, cmd_lookup, cmd_migrate,
    cmd_remove_show, cmd_set_enabled, cmd_update,
};
pub use config::Config;
pub use db::{Store, StoreError};
pub use models::{Episode, Show, ShowStatus};
pub use sources::{Source, SourceError, SourceSelector};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(Config::find_path);
    let mut config = Config::load(config_path.as_deref())?;
    if let Some(database) = &cli.database {
        config.general.database_path.clone_from(database);
    }
    config.validate()?;

    init_tracing(&log_level(&config.general.log_level, cli.verbose, cli.quiet));
    match &config_path {
        Some(path) => info!("Loaded config from: {}", path.display()),
        None => info!("No config file found, using defaults"),
    }
    debug!(database = %config.general.database_path, "Configuration loaded");

    match cli.command {
        Commands::Update {
            force,
            show,
            remove_before,
        } => cmd_update(&config, force, show, remove_before).await,

        Commands::List { date, days, search } => {
            cmd_list_episodes(&config, date, days, search.as_deref()).await
        }

        Commands::Shows => cmd_list_shows(&config).await,

        Commands::Add { url } => cmd_add_show(&config, &url).await,

        Commands::Remove { id } => cmd_remove_show(&config, id).await,

        Commands::Enable { id } => cmd_set_enabled(&config, id, true).await,

        Commands::Disable { id } => cmd_set_enabled(&config, id, false).await,

        Commands::Lookup { term } => cmd_lookup(&config, &term.join(" ")).await,

        Commands::Migrate => cmd_migrate(&config).await,

        Commands::Init => {
            let path = cli.config.unwrap_or_else(Config::default_config_path);
            if Config::create_default_if_missing(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?
            {
                println!("✓ Config file created at {}", path.display());
            } else {
                println!("Config file already exists at {}", path.display());
            }
            Ok(())
        }
    }
}

/// Level directive for the subscriber: `-q` wins, each `-v` raises the configured level.
fn log_level(configured: &str, verbose: u8, quiet: bool) -> String {
    if quiet {
        return "error".to_string();
    }

    match verbose {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
