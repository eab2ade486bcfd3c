//! Hot reload of the `[download]` section.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::DownloadConfig;

/// Watches the config file and forwards each valid `[download]` section.
///
/// Listener, timeout and admin settings are read once at startup.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<DownloadConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for the server.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<DownloadConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned handle must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let reload_path = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    reload(&reload_path, &update_tx);
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn reload(path: &Path, update_tx: &mpsc::UnboundedSender<DownloadConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Config file changed, publishing download settings");
            let _ = update_tx.send(config.download);
        }
        Err(e) => {
            tracing::error!(error = %e, "Config reload failed, keeping current settings");
        }
    }
}
