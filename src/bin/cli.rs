//! groupwatch CLI
//!
//! Local entry point. The browser shim hands pages over with `ingest`; every
//! other command works on the saved state under `output/` and `logs/`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use groupwatch::{
    error::{AppError, Result},
    models::Config,
    pipeline,
    services::{LogNotifier, Notifier, TelegramNotifier},
    storage::{NotificationTracker, RecordStore, SnapshotStore},
};

/// groupwatch - Group Post Watcher
#[derive(Parser, Debug)]
#[command(
    name = "groupwatch",
    version,
    about = "Extracts, deduplicates and forwards group posts"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "groupwatch.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a rendered page for processing
    Ingest {
        /// URL the page was rendered from
        #[arg(long)]
        url: String,

        /// File holding the page markup
        #[arg(long)]
        file: PathBuf,
    },

    /// Extract post records from saved pages into the store
    Collect,

    /// Forward unseen posts
    Notify {
        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Run collect → notify, continuously unless --once
    Run {
        /// Run a single cycle and exit
        #[arg(long)]
        once: bool,

        /// Log messages instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Discover joined groups from a saved groups page
    Groups {
        /// File holding the groups page markup
        #[arg(long)]
        file: PathBuf,
    },

    /// Validate the configuration file
    Validate,

    /// Show state file info
    Info,

    /// Print the default configuration
    Config,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn build_notifier(config: &Config, dry_run: bool) -> Result<Box<dyn Notifier>> {
    if dry_run {
        return Ok(Box::new(LogNotifier));
    }
    if config.notify.bot_token.is_empty() || config.notify.chat_id.is_empty() {
        return Err(AppError::config(
            "TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set (or use --dry-run)",
        ));
    }
    Ok(Box::new(TelegramNotifier::new(&config.notify)?))
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = Config::load(&cli.config)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".to_string());
    init_logging(cli.verbose, &level);

    log::info!("groupwatch starting...");

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env(|key| std::env::var(key).ok());
    log::info!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Ingest { url, file } => {
            let markup = std::fs::read_to_string(&file)?;
            pipeline::ingest_page(&config, &url, &markup)?;
        }

        Command::Collect => {
            config.validate()?;
            pipeline::run_collect(&config)?;
        }

        Command::Notify { dry_run } => {
            config.validate()?;
            let notifier = build_notifier(&config, dry_run)?;
            pipeline::run_notify(&config, notifier.as_ref()).await?;
        }

        Command::Run { once, dry_run } => {
            config.validate()?;
            let notifier = build_notifier(&config, dry_run)?;
            if once {
                let stats = pipeline::run_cycle(&config, notifier.as_ref()).await;
                if let Some(error) = stats.error {
                    return Err(AppError::config(format!("cycle ended early: {error}")));
                }
            } else {
                pipeline::run_forever(&config, notifier.as_ref(), None).await?;
            }
        }

        Command::Groups { file } => {
            let markup = std::fs::read_to_string(&file)?;
            let urls = pipeline::run_discover_groups(&config, &markup)?;
            log::info!("Discovered {} groups", urls.len());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (selectors, id patterns and paths)");
        }

        Command::Info => {
            let paths = &config.paths;

            let records = RecordStore::open(&paths.store_file).load()?;
            log::info!("Store: {} ({} posts)", paths.store_file.display(), records.len());

            let tracker = NotificationTracker::load(&paths.sent_file)?;
            log::info!("Sent log: {} ({} links)", paths.sent_file.display(), tracker.len());

            let pending = SnapshotStore::new(&paths.snapshot_dir).list()?;
            log::info!(
                "Snapshots: {} ({} pending)",
                paths.snapshot_dir.display(),
                pending.len()
            );

            match std::fs::read_to_string(&paths.stats_file) {
                Ok(content) => {
                    if let Ok(stats) = serde_json::from_str::<serde_json::Value>(&content) {
                        if let Some(finished) = stats.get("finished_at") {
                            log::info!("Last cycle: {}", finished);
                        }
                        if let Some(error) = stats.get("error").filter(|e| !e.is_null()) {
                            log::info!("Last cycle error: {}", error);
                        }
                    }
                }
                Err(_) => log::info!("No cycle has run yet."),
            }
        }

        Command::Config => {
            print!("{}", Config::default().to_toml()?);
        }
    }

    log::info!("Done!");

    Ok(())
}
