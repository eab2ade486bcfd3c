//! Signed, time-limited download links.
//!
//! A link has the form `/<prefix>/<hash>/<time-hex>/<file-path>` where
//! `hash = digest(secret + "/" + file-path + time-hex)`. The validator checks
//! the signature and the link's age before the file is streamed from the
//! configured document root.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod token;
pub mod validator;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use validator::{ValidationOutcome, Validator};
