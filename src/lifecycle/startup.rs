//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging
//! - Start the config watcher and signal listener
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::watcher::ConfigWatcher;
use crate::config::{load_config, ConfigError, DigestAlgorithm};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::observability::init_logging;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to watch configuration file: {0}")]
    Watch(#[from] notify::Error),

    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Boot the download server from a config file and serve until a signal
/// arrives.
pub async fn start(config_path: &Path) -> Result<(), StartupError> {
    let config = load_config(config_path)?;

    init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "secdownload starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        uri_prefix = %config.download.uri_prefix,
        root_path = %config.download.root_path.display(),
        timeout = config.download.timeout,
        digest = config.download.digest.as_str(),
        "Configuration loaded"
    );
    if config.download.digest == DigestAlgorithm::Md5 {
        tracing::warn!("Signing with MD5; set download.digest = \"sha256\" once links can be reissued");
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // Dropping the watcher stops it, so it lives until `start` returns.
    let (watcher, config_updates) = ConfigWatcher::new(config_path);
    let _watcher = watcher.run()?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        trigger.trigger();
    });

    HttpServer::new(config)
        .run(listener, config_updates, server_shutdown)
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
