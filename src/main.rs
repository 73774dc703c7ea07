use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gator::commands::{Command, State};
use gator::config::Config;
use gator::db::Database;
use gator::fetcher::Fetcher;
use gator::handlers;

#[derive(Parser)]
#[command(author, version, about = "A command-line RSS aggregator", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.gatorconfig.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Command to run (login, register, reset, users, agg, addfeed, feeds,
    /// follow, following, unfollow, browse)
    command: String,

    /// Arguments passed to the command
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; stdout is reserved for command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("error reading config {}", config_path.display()))?;
    debug!("Loaded config from {}", config_path.display());

    // Initialize database
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.db_url.clone());
    let db = Database::new(&database_url)
        .await
        .context("error connecting to database")?;
    db.initialize()
        .await
        .context("error initializing database")?;

    let fetcher = Fetcher::new()?;
    let mut state = State::new(config, db, fetcher);

    let commands = handlers::default_commands();
    commands
        .run(&mut state, Command::new(cli.command, cli.args))
        .await
        .context("error running command")?;

    Ok(())
}
