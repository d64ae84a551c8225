// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Typed failures raised by the report engine (transport, identity, cancellation)
// role: errors
// outputs: ReportError enum and Result alias used by api/search/audit/resolve/report
// invariants:
// - FetchFailure always carries the HTTP status and the URL that produced it
// - Enrichment problems are reported through ReportError but never abort a run (caller decides)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
  /// Non-success HTTP status on any page fetch.
  #[error("{context} failed ({status}) at {url}")]
  FetchFailure { context: String, status: u16, url: String },

  /// The request never produced a response (DNS, connect, TLS, timeout).
  #[error("{context} request to {url} failed: {message}")]
  Network { context: String, url: String, message: String },

  /// Only raised when strict JSON handling is enabled.
  #[error("{context} returned a non-JSON body at {url}")]
  MalformedResponse { context: String, url: String },

  #[error("invalid URL {url}: {message}")]
  InvalidUrl { url: String, message: String },

  #[error("current user id not found in /users/me response")]
  IdentityUnavailable,

  #[error("no user found for assignee input: {0}")]
  AssigneeNotFound(String),

  #[error("run cancelled")]
  Cancelled,

  #[error("report run already finished; start a new run")]
  RunFinished,
}

impl ReportError {
  /// HTTP status of a failed page fetch, when there was one.
  pub fn status(&self) -> Option<u16> {
    match self {
      ReportError::FetchFailure { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, ReportError>;
