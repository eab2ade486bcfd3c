//! The validation pipeline and its dispatch step.

use crate::config::{DownloadConfig, SettingsHandle};
use crate::token::guard::{check_file_path, check_traversal, strip_prefix};
use crate::token::signature::verify;
use crate::token::url::normalize_request_path;
use crate::token::{check_expiry, parse_token, unix_now, DownloadToken};
use crate::validator::outcome::{Rejection, ServeTarget, Stage, ValidationOutcome};

/// Validates signed download requests against the live settings.
///
/// Cheap to clone; every clone observes settings swaps.
#[derive(Debug, Clone)]
pub struct Validator {
    settings: SettingsHandle,
}

impl Validator {
    pub fn new(settings: SettingsHandle) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Validate a request target (path and optional query) at the current time.
    pub async fn validate(&self, target: &str) -> ValidationOutcome {
        self.validate_at(target, unix_now()).await
    }

    /// Validate a request target as if the clock read `now`.
    ///
    /// One settings snapshot is used for every stage of the request.
    pub async fn validate_at(&self, target: &str, now: u64) -> ValidationOutcome {
        validate_with(&self.settings.load(), target, now).await
    }
}

/// Validate against a settings snapshot the caller already holds, so the
/// response can be built from the same snapshot.
pub async fn validate_with(config: &DownloadConfig, target: &str, now: u64) -> ValidationOutcome {
    let result = match check_token(config, target, now) {
        Ok(token) => resolve_file(config, &token).await,
        Err(rejection) => Err(rejection),
    };
    result.into()
}

/// Run every string-level stage: normalize, guard, strip prefix, parse,
/// verify, check expiry. Touches neither the filesystem nor the clock.
pub fn check_token(config: &DownloadConfig, target: &str, now: u64) -> Result<DownloadToken, Rejection> {
    let path = normalize_request_path(target)?;
    check_traversal(&path)?;
    let remainder = strip_prefix(&path, config.prefix())?;

    let token = parse_token(remainder)?;
    check_file_path(&token.file_path)?;

    verify(config, &token)?;
    check_expiry(&token.expiry, now, config.timeout)?;

    Ok(token)
}

/// Resolve a verified token under `root_path` and require a regular file.
///
/// Symlinks are followed: a link to a file is served, a link to a directory
/// is not.
pub async fn resolve_file(config: &DownloadConfig, token: &DownloadToken) -> Result<ServeTarget, Rejection> {
    let resolved = config.root_path.join(&token.file_path);

    match tokio::fs::metadata(&resolved).await {
        Ok(metadata) if metadata.is_file() => Ok(ServeTarget {
            file_path: token.file_path.clone(),
            resolved,
        }),
        Ok(_) => Err(Rejection::not_found(
            Stage::FileChecking,
            format!("{} is not a regular file", resolved.display()),
        )),
        Err(e) => Err(Rejection::not_found(
            Stage::FileChecking,
            format!("{}: {}", resolved.display(), e),
        )),
    }
}
