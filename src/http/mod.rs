//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, download handler)
//!     → request.rs (request ID assigned and echoed)
//!     → validator (ValidationOutcome)
//!     → response.rs (outcome handler table: file stream or error page)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{OutcomeHandlers, RejectHandler, ServeHandler};
pub use server::HttpServer;
