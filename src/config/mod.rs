//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → [download] section published through store.rs
//!
//! On file change or admin merge:
//!     watcher.rs detects change / admin PATCH arrives
//!     → new DownloadConfig built and validated
//!     → atomic swap of Arc<DownloadConfig>
//!     → in-flight requests keep the snapshot they started with
//! ```
//!
//! # Design Decisions
//! - Config is immutable once published; changes swap the whole value
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, AppConfig, DigestAlgorithm, DownloadConfig, DownloadConfigPatch, ListenerConfig,
    ObservabilityConfig, TimeoutConfig,
};
pub use store::SettingsHandle;
pub use validation::ValidationError;
