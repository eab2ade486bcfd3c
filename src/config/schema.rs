//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the download
//! server. All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the download server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Signed link settings. This is the only section that is hot-reloaded.
    pub download: DownloadConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for the HTTP layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to produce the response head, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Digest used to compute link signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    /// Legacy mod_secdownload signatures. Kept as the default so that links
    /// issued by existing deployments stay valid.
    #[default]
    Md5,
    Sha256,
}

impl DigestAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }

    /// Length of the lowercase hex digest.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Md5 => 32,
            Self::Sha256 => 64,
        }
    }
}

impl std::str::FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown digest algorithm: {other}")),
        }
    }
}

/// Signed link settings shared by every request.
///
/// Published behind an `ArcSwap` and never mutated in place; see
/// [`crate::config::SettingsHandle`].
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Shared signing key.
    pub secret: String,

    /// URL prefix in front of the token, e.g. "dl". Slashes are trimmed on use.
    #[serde(alias = "uriPrefix")]
    pub uri_prefix: String,

    /// Directory that signed paths are resolved against.
    #[serde(alias = "rootPath")]
    pub root_path: PathBuf,

    /// Maximum distance in seconds between the link timestamp and now.
    pub timeout: u64,

    /// Value of the `Server` header on error responses.
    pub server: String,

    /// Signature digest.
    pub digest: DigestAlgorithm,
}

impl DownloadConfig {
    /// The prefix with leading and trailing slashes removed.
    pub fn prefix(&self) -> &str {
        self.uri_prefix.trim_matches('/')
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            uri_prefix: "dl".to_string(),
            root_path: PathBuf::from("."),
            timeout: 3600,
            server: concat!("secdownload/", env!("CARGO_PKG_VERSION")).to_string(),
            digest: DigestAlgorithm::default(),
        }
    }
}

// Keeps the secret out of logs.
impl std::fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("secret", &"<redacted>")
            .field("uri_prefix", &self.uri_prefix)
            .field("root_path", &self.root_path)
            .field("timeout", &self.timeout)
            .field("server", &self.server)
            .field("digest", &self.digest)
            .finish()
    }
}

/// Partial update for [`DownloadConfig`]. Only the keys that are present are
/// applied; see [`crate::config::SettingsHandle::merge`].
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfigPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(alias = "uriPrefix", skip_serializing_if = "Option::is_none")]
    pub uri_prefix: Option<String>,
    #[serde(alias = "rootPath", skip_serializing_if = "Option::is_none")]
    pub root_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<DigestAlgorithm>,
}

impl DownloadConfigPatch {
    /// Return a copy of `base` with the present keys overridden.
    pub fn apply_to(&self, base: &DownloadConfig) -> DownloadConfig {
        let mut next = base.clone();
        if let Some(secret) = &self.secret {
            next.secret = secret.clone();
        }
        if let Some(prefix) = &self.uri_prefix {
            next.uri_prefix = prefix.clone();
        }
        if let Some(root) = &self.root_path {
            next.root_path = root.clone();
        }
        if let Some(timeout) = self.timeout {
            next.timeout = timeout;
        }
        if let Some(server) = &self.server {
            next.server = server.clone();
        }
        if let Some(digest) = self.digest {
            next.digest = digest;
        }
        next
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_none()
            && self.uri_prefix.is_none()
            && self.root_path.is_none()
            && self.timeout.is_none()
            && self.server.is_none()
            && self.digest.is_none()
    }
}
