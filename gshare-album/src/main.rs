//! gshare-album - share a local image into the shared media store
//!
//! The shared store is simulated under the resolved root folder:
//! `<root>/shared` stands in for external storage and `<root>/gshare.db`
//! (plus `<root>/blobs`) is the media index. Lifecycle events are printed
//! to stdout as JSON lines; logs go to stderr or the configured log file.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gshare_album::index::SqliteMediaIndex;
use gshare_album::platform::ConfiguredPermissions;
use gshare_album::{EventBusListener, MimePolicy, Platform, SessionConfig, ShareSession, TransferResult};
use gshare_common::config::{load_module_config, LoggingConfig, RootFolderInitializer, RootFolderResolver};
use gshare_common::events::EventBus;

const MODULE_NAME: &str = "gshare-album";

/// How long to wait for the index to process the scan notification
const SCAN_WAIT: Duration = Duration::from_secs(5);

/// Command-line arguments for gshare-album
#[derive(Parser, Debug)]
#[command(name = "gshare-album")]
#[command(about = "Copy a local image into the shared media store")]
#[command(version)]
struct Args {
    /// Config file (default: ~/.config/gshare/gshare-album.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root folder holding the media index and shared storage
    #[arg(short, long, global = true)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Share one file
    Share {
        /// Source file
        path: PathBuf,

        /// Display name prefix
        #[arg(long)]
        prefix: Option<String>,

        /// Skip when the display name is already indexed
        #[arg(long)]
        skip_duplicates: bool,

        /// Simulated platform API level
        #[arg(long)]
        api_level: Option<u32>,

        /// Deny the permission request
        #[arg(long)]
        deny: bool,

        /// Record the sniffed mime type instead of image/jpeg
        #[arg(long)]
        infer_mime: bool,
    },

    /// Print every index entry as a JSON line
    List,
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(std::sync::Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_module_config(MODULE_NAME, args.config.as_deref())
        .context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    info!("Starting {} {}", MODULE_NAME, env!("CARGO_PKG_VERSION"));

    // Resolve and prepare the root folder
    let root_folder = RootFolderResolver::new(MODULE_NAME)
        .with_cli_override(args.root_folder.clone())
        .with_toml_root(config.root_folder.clone())
        .resolve();
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .map_err(|e| anyhow::anyhow!("Failed to initialize root folder: {}", e))?;
    info!("Root folder: {}", initializer.root_folder().display());

    let index = Arc::new(
        SqliteMediaIndex::open(
            &initializer.database_path(),
            initializer.root_folder().join("blobs"),
        )
        .await
        .context("Failed to open media index")?,
    );

    match args.command {
        Command::List => {
            for entry in index.list().await? {
                println!("{}", serde_json::to_string(&entry)?);
            }
            Ok(())
        }
        Command::Share {
            path,
            prefix,
            skip_duplicates,
            api_level,
            deny,
            infer_mime,
        } => {
            let permissions = if deny {
                ConfiguredPermissions::deny_all()
            } else {
                ConfiguredPermissions::from_ids(&config.platform.granted_permissions)
            };
            let api_level = api_level.unwrap_or(config.platform.api_level);
            let platform = Platform::new(
                api_level,
                initializer.shared_storage_path(),
                Arc::new(permissions),
                index.clone(),
            );

            let mut session_config = SessionConfig::from(&config.session);
            if let Some(prefix) = prefix {
                session_config.name_prefix = prefix;
            }
            if skip_duplicates {
                session_config.suppress_duplicates = true;
            }
            if infer_mime {
                session_config.mime_policy = MimePolicy::Inferred;
            }

            share(&platform, &index, session_config, path).await
        }
    }
}

async fn share(
    platform: &Arc<Platform>,
    index: &SqliteMediaIndex,
    session_config: SessionConfig,
    path: PathBuf,
) -> Result<()> {
    let bus = EventBus::new(100);
    let mut events = bus.subscribe();
    let mut scans = index.subscribe_scans();

    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to serialize event: {}", e),
            }
            if event.is_terminal() {
                break;
            }
        }
    });

    let mut session = ShareSession::with_config(platform, session_config);
    session.set_listener(Arc::new(EventBusListener::new(bus)));

    let handle = session.transfer(&path)?;
    info!(transfer_id = %handle.id(), "Transfer started");
    let result = handle.wait().await;
    session.release();

    if let Err(e) = printer.await {
        warn!("Event printer stopped: {}", e);
    }

    match result {
        TransferResult::Success(_) => {
            match tokio::time::timeout(SCAN_WAIT, scans.recv()).await {
                Ok(Ok(scan)) => println!("{}", serde_json::to_string(&scan)?),
                Ok(Err(e)) => warn!("Scan notification lost: {}", e),
                Err(_) => warn!("Scan not processed within {:?}", SCAN_WAIT),
            }
            Ok(())
        }
        TransferResult::Skipped(_) => Ok(()),
        TransferResult::Denied(path) => bail!("Permission denied for {}", path.display()),
        TransferResult::Failed(path, error) => {
            bail!("Transfer of {} failed: {}", path.display(), error)
        }
    }
}
