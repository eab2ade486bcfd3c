//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! validator / http / config / admin
//!     → tracing events (request_id, stage, kind)
//!     → logging.rs (EnvFilter + fmt subscriber)
//!     → stdout
//! ```
//!
//! # Design Decisions
//! - `RUST_LOG` wins over `observability.log_level`
//! - Rejections log at warn, served downloads at info

pub mod logging;

pub use logging::init_logging;
