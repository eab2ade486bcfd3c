//! Validation results.

use std::fmt;
use std::path::PathBuf;

/// Pipeline stage that produced a rejection. Used for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalizing,
    TraversalChecking,
    PrefixChecking,
    Parsing,
    Verifying,
    ExpiryChecking,
    FileChecking,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normalizing => "normalizing",
            Self::TraversalChecking => "traversal_checking",
            Self::PrefixChecking => "prefix_checking",
            Self::Parsing => "parsing",
            Self::Verifying => "verifying",
            Self::ExpiryChecking => "expiry_checking",
            Self::FileChecking => "file_checking",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection classes. Each maps to exactly one HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectKind {
    BadRequest,
    Security,
    Expired,
    NotFound,
}

impl RejectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "bad_request",
            Self::Security => "security",
            Self::Expired => "expired",
            Self::NotFound => "not_found",
        }
    }
}

impl fmt::Display for RejectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-side diagnostic attached to a rejection.
///
/// `detail` may contain attacker-controlled text. It goes to the log and must
/// never be written into a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectReason {
    pub stage: Stage,
    pub detail: String,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.detail)
    }
}

/// A failed stage: the class of rejection plus its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub kind: RejectKind,
    pub reason: RejectReason,
}

impl Rejection {
    pub fn new(kind: RejectKind, stage: Stage, detail: impl Into<String>) -> Self {
        Self {
            kind,
            reason: RejectReason {
                stage,
                detail: detail.into(),
            },
        }
    }

    pub fn bad_request(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(RejectKind::BadRequest, stage, detail)
    }

    pub fn security(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(RejectKind::Security, stage, detail)
    }

    pub fn expired(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(RejectKind::Expired, stage, detail)
    }

    pub fn not_found(stage: Stage, detail: impl Into<String>) -> Self {
        Self::new(RejectKind::NotFound, stage, detail)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.kind, self.reason)
    }
}

impl std::error::Error for Rejection {}

/// File cleared for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeTarget {
    /// Canonical relative path that was signed.
    pub file_path: String,
    /// `root_path` joined with `file_path`.
    pub resolved: PathBuf,
}

/// The single result of validating a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Serve(ServeTarget),
    BadRequest(RejectReason),
    Security(RejectReason),
    Expired(RejectReason),
    NotFound(RejectReason),
}

impl ValidationOutcome {
    /// The rejection class, or `None` for `Serve`.
    pub fn reject_kind(&self) -> Option<RejectKind> {
        match self {
            Self::Serve(_) => None,
            Self::BadRequest(_) => Some(RejectKind::BadRequest),
            Self::Security(_) => Some(RejectKind::Security),
            Self::Expired(_) => Some(RejectKind::Expired),
            Self::NotFound(_) => Some(RejectKind::NotFound),
        }
    }

    /// The diagnostic of a rejection, or `None` for `Serve`.
    pub fn reason(&self) -> Option<&RejectReason> {
        match self {
            Self::Serve(_) => None,
            Self::BadRequest(reason)
            | Self::Security(reason)
            | Self::Expired(reason)
            | Self::NotFound(reason) => Some(reason),
        }
    }

    pub fn is_serve(&self) -> bool {
        matches!(self, Self::Serve(_))
    }
}

impl From<Rejection> for ValidationOutcome {
    fn from(rejection: Rejection) -> Self {
        let Rejection { kind, reason } = rejection;
        match kind {
            RejectKind::BadRequest => Self::BadRequest(reason),
            RejectKind::Security => Self::Security(reason),
            RejectKind::Expired => Self::Expired(reason),
            RejectKind::NotFound => Self::NotFound(reason),
        }
    }
}

impl From<Result<ServeTarget, Rejection>> for ValidationOutcome {
    fn from(result: Result<ServeTarget, Rejection>) -> Self {
        match result {
            Ok(target) => Self::Serve(target),
            Err(rejection) => rejection.into(),
        }
    }
}
