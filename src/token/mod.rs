//! Signed download tokens.
//!
//! # Data Flow
//! ```text
//! request target "/dl/<sig>/<hex>/<path>?q"
//!     → url.rs (drop query, strip "/", percent-decode, trim "/")
//!     → guard.rs (traversal guard, prefix strip)
//!     → parser.rs (split into DownloadToken, normalize file path)
//!     → guard.rs (traversal guard on the canonical file path)
//!     → signature.rs (recompute + constant-time compare)
//!     → expiry.rs (|now - timestamp| <= timeout)
//! ```
//!
//! # Design Decisions
//! - Every stage is a pure function over strings and the settings snapshot
//! - Path checks run on decoded text before any join with the root directory
//! - The signature is verified before the expiry, so a forged link is always
//!   reported as a security rejection

pub mod expiry;
pub mod guard;
pub mod parser;
pub mod signature;
pub mod url;

pub use expiry::{check_expiry, unix_now};
pub use parser::{parse_token, DownloadToken, Expiry};
pub use signature::{compute_signature, sign_link, SignedLink};
