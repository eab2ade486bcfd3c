//! Turning a [`ValidationOutcome`] into an HTTP response.
//!
//! # Responsibilities
//! - Hold one handler per outcome kind; callers may replace any of them
//! - Default download handler: attachment headers, no caching, streamed body
//! - Default rejection handlers: fixed status, `Server` header, static HTML
//!
//! # Design Decisions
//! - Rejection bodies are constants; diagnostics never reach the client
//! - File bodies are streamed, never buffered

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{
    CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, EXPIRES, PRAGMA, SERVER,
};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use futures_util::future::{BoxFuture, FutureExt};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tokio_util::io::ReaderStream;

use crate::config::DownloadConfig;
use crate::validator::{RejectKind, RejectReason, ServeTarget, ValidationOutcome};

/// A date far in the past, so no cache keeps the response.
pub const EXPIRES_IN_PAST: &str = "Thu, 19 Nov 1981 08:52:00 GMT";
pub const NO_CACHE: &str = "no-store, no-cache, must-revalidate, post-check=0, pre-check=0";

/// Handler for a verified download.
pub type ServeHandler =
    Arc<dyn Fn(ServeTarget, Arc<DownloadConfig>) -> BoxFuture<'static, Response> + Send + Sync>;

/// Handler for one rejection class.
pub type RejectHandler = Arc<dyn Fn(&RejectReason, &DownloadConfig) -> Response + Send + Sync>;

/// Dispatch table from outcome kind to handler.
#[derive(Clone)]
pub struct OutcomeHandlers {
    serve: ServeHandler,
    bad_request: RejectHandler,
    security: RejectHandler,
    expired: RejectHandler,
    not_found: RejectHandler,
}

impl Default for OutcomeHandlers {
    fn default() -> Self {
        Self {
            serve: Arc::new(|target, config| serve_file(target, config).boxed()),
            bad_request: default_reject(RejectKind::BadRequest),
            security: default_reject(RejectKind::Security),
            expired: default_reject(RejectKind::Expired),
            not_found: default_reject(RejectKind::NotFound),
        }
    }
}

fn default_reject(kind: RejectKind) -> RejectHandler {
    Arc::new(move |_: &RejectReason, config: &DownloadConfig| error_page(kind, config))
}

impl OutcomeHandlers {
    /// Replace the download handler.
    pub fn on_serve<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ServeTarget, Arc<DownloadConfig>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.serve = Arc::new(move |target, config| handler(target, config).boxed());
        self
    }

    /// Replace the handler for one rejection class.
    pub fn on_reject<F>(mut self, kind: RejectKind, handler: F) -> Self
    where
        F: Fn(&RejectReason, &DownloadConfig) -> Response + Send + Sync + 'static,
    {
        let handler: RejectHandler = Arc::new(handler);
        match kind {
            RejectKind::BadRequest => self.bad_request = handler,
            RejectKind::Security => self.security = handler,
            RejectKind::Expired => self.expired = handler,
            RejectKind::NotFound => self.not_found = handler,
        }
        self
    }

    /// Run the handler registered for `outcome`.
    pub async fn respond(&self, outcome: ValidationOutcome, config: Arc<DownloadConfig>) -> Response {
        match outcome {
            ValidationOutcome::Serve(target) => (self.serve)(target, config).await,
            ValidationOutcome::BadRequest(reason) => (self.bad_request)(&reason, &config),
            ValidationOutcome::Security(reason) => (self.security)(&reason, &config),
            ValidationOutcome::Expired(reason) => (self.expired)(&reason, &config),
            ValidationOutcome::NotFound(reason) => (self.not_found)(&reason, &config),
        }
    }
}

impl std::fmt::Debug for OutcomeHandlers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutcomeHandlers").finish_non_exhaustive()
    }
}

/// HTTP status for a rejection class.
pub fn status_for(kind: RejectKind) -> StatusCode {
    match kind {
        RejectKind::BadRequest => StatusCode::BAD_REQUEST,
        RejectKind::Security => StatusCode::FORBIDDEN,
        RejectKind::Expired => StatusCode::GONE,
        RejectKind::NotFound => StatusCode::NOT_FOUND,
    }
}

fn page_text(kind: RejectKind) -> (&'static str, &'static str) {
    match kind {
        RejectKind::BadRequest => ("400 Bad Request", "The request could not be understood."),
        RejectKind::Security => ("403 Forbidden", "You are not allowed to access this resource."),
        RejectKind::Expired => ("410 Gone", "This download link is no longer valid."),
        RejectKind::NotFound => ("404 Not Found", "The requested file could not be found."),
    }
}

/// Default rejection response: fixed status, `text/html`, configured `Server`.
pub fn error_page(kind: RejectKind, config: &DownloadConfig) -> Response {
    let (title, message) = page_text(kind);
    let body = format!(
        "<!DOCTYPE html><html lang=\"en\"><head><title>{title}</title></head>\
         <body><h1>{title}</h1><p>{message}</p></body></html>"
    );

    let mut response = (status_for(kind), body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
    if let Ok(server) = HeaderValue::from_str(&config.server) {
        headers.insert(SERVER, server);
    }
    response
}

/// `Content-Disposition` for a download of `basename`.
///
/// Plain names keep the bare `filename=` form. Anything else gets an ASCII
/// fallback plus an RFC 5987 `filename*`.
pub fn content_disposition(basename: &str) -> HeaderValue {
    let plain = !basename.is_empty()
        && basename
            .bytes()
            .all(|b| b.is_ascii_graphic() && !matches!(b, b'"' | b';' | b',' | b'\\'));
    if plain {
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename={basename}")) {
            return value;
        }
    }

    let fallback: String = basename
        .chars()
        .map(|c| if c.is_ascii_graphic() && !matches!(c, '"' | '\\') { c } else { '_' })
        .collect();
    let encoded = utf8_percent_encode(basename, NON_ALPHANUMERIC);
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Default download handler: stream the file with attachment and no-cache
/// headers.
pub async fn serve_file(target: ServeTarget, config: Arc<DownloadConfig>) -> Response {
    let file = match tokio::fs::File::open(&target.resolved).await {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %target.resolved.display(), error = %e, "File vanished before streaming");
            return error_page(RejectKind::NotFound, &config);
        }
    };
    let len = file.metadata().await.ok().map(|m| m.len());

    let basename = target
        .file_path
        .rsplit('/')
        .next()
        .unwrap_or(target.file_path.as_str());
    let mime = mime_guess::from_path(&target.resolved).first_or_octet_stream();

    let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_DISPOSITION, content_disposition(basename));
    if let Ok(value) = HeaderValue::from_str(mime.essence_str()) {
        headers.insert(CONTENT_TYPE, value);
    }
    headers.insert(EXPIRES, HeaderValue::from_static(EXPIRES_IN_PAST));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_CACHE));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    if let Some(len) = len {
        headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    }
    response
}
