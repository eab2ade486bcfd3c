//! Live download settings.
//!
//! Readers take a snapshot with [`SettingsHandle::load`] and keep it for the
//! whole request. Writers never touch a published value: they build a new
//! `DownloadConfig`, validate it, and swap the pointer.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::schema::{DownloadConfig, DownloadConfigPatch};
use crate::config::validation::{validate_download, ValidationError};

/// Shared, atomically replaceable handle to the download settings.
#[derive(Clone)]
pub struct SettingsHandle {
    inner: Arc<ArcSwap<DownloadConfig>>,
}

impl SettingsHandle {
    pub fn new(config: DownloadConfig) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(config)),
        }
    }

    /// Current settings snapshot.
    pub fn load(&self) -> Arc<DownloadConfig> {
        self.inner.load_full()
    }

    /// Replace the settings wholesale after validating them.
    pub fn replace(&self, config: DownloadConfig) -> Result<(), Vec<ValidationError>> {
        validate_download(&config)?;
        self.inner.store(Arc::new(config));
        tracing::info!("Download settings replaced");
        Ok(())
    }

    /// Merge `patch` into the current settings. Keys absent from the patch keep
    /// their value. The merged result is validated before it is published; on
    /// error the live settings are left untouched.
    pub fn merge(&self, patch: &DownloadConfigPatch) -> Result<Arc<DownloadConfig>, Vec<ValidationError>> {
        let mut outcome = Err(Vec::new());
        self.inner.rcu(|current| {
            let next = patch.apply_to(current);
            match validate_download(&next) {
                Ok(()) => {
                    let next = Arc::new(next);
                    outcome = Ok(Arc::clone(&next));
                    next
                }
                Err(errors) => {
                    outcome = Err(errors);
                    Arc::clone(current)
                }
            }
        });
        let current = outcome?;

        tracing::info!(
            changed_secret = patch.secret.is_some(),
            uri_prefix = %current.uri_prefix,
            root_path = %current.root_path.display(),
            timeout = current.timeout,
            digest = current.digest.as_str(),
            "Download settings merged"
        );
        Ok(current)
    }
}

impl std::fmt::Debug for SettingsHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("SettingsHandle").field(&self.load()).finish()
    }
}
