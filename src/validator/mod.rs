//! Request validation subsystem.
//!
//! # State Machine
//! ```text
//! Start → Normalizing → TraversalChecking → PrefixChecking → Parsing
//!       → Verifying → ExpiryChecking → FileChecking → Serve
//!
//! Any stage may leave directly for a terminal rejection:
//!     BadRequest (400) | Security (403) | Expired (410) | NotFound (404)
//! ```
//!
//! # Design Decisions
//! - The result is a value (`ValidationOutcome`), never a side effect; the
//!   HTTP layer maps it to a response through `http::response::OutcomeHandlers`
//! - Security rejections are indistinguishable to the client whichever check
//!   produced them; the stage is only recorded in the log

pub mod outcome;
pub mod pipeline;

pub use outcome::{RejectKind, RejectReason, Rejection, ServeTarget, Stage, ValidationOutcome};
pub use pipeline::{check_token, resolve_file, validate_with, Validator};
