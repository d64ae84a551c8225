// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: HTTP client adapter for the helpdesk API (session headers, GET, text-then-JSON parsing)
// role: transport/http
// inputs: absolute URLs; SessionCredentials from flags or env (ZD_SESSION_COOKIE, ZD_CSRF_TOKEN)
// outputs: HttpReply { status, url, text, data } for every response, whatever its status
// side_effects: Network calls via ureq; ScriptedTransport (tests) records calls in memory
// invariants:
// - Every request carries accept, x-csrf-token and x-requested-with headers
// - Non-success statuses are replies, not errors; callers decide what is fatal
// - A body that is not JSON yields data = None, never a parse error here
// errors: TransportError only when no response was obtained at all
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub const ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";
pub const REQUESTED_WITH: &str = "XMLHttpRequest";
const USER_AGENT: &str = concat!("zd-weekly-report/", env!("CARGO_PKG_VERSION"));

/// One HTTP response, read fully as text and opportunistically parsed as JSON.
#[derive(Debug, Clone)]
pub struct HttpReply {
  pub status: u16,
  pub url: String,
  pub text: String,
  pub data: Option<Value>,
}

impl HttpReply {
  pub fn from_body(url: &str, status: u16, text: String) -> Self {
    let data = serde_json::from_str::<Value>(&text).ok();
    Self {
      status,
      url: url.to_string(),
      text,
      data,
    }
  }

  pub fn ok(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

// --- Trait seam for the helpdesk transport ---
pub trait Transport {
  fn get(&self, url: &str) -> Result<HttpReply, TransportError>;
}

impl<T: Transport + ?Sized> Transport for std::rc::Rc<T> {
  fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
    (**self).get(url)
  }
}

/// Cookie session plus the CSRF token the helpdesk expects on XHR-style calls.
#[derive(Clone, Default)]
pub struct SessionCredentials {
  pub cookie: Option<String>,
  pub csrf_token: String,
}

impl std::fmt::Debug for SessionCredentials {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SessionCredentials")
      .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
      .field("csrf_token", &if self.csrf_token.is_empty() { "" } else { "<redacted>" })
      .finish()
  }
}

fn non_blank(v: Option<String>) -> Option<String> {
  v.filter(|s| !s.trim().is_empty())
}

/// Discover session credentials: explicit values first, then ZD_SESSION_COOKIE / ZD_CSRF_TOKEN.
pub fn discover_credentials(cookie: Option<String>, csrf_token: Option<String>) -> SessionCredentials {
  let cookie = non_blank(cookie).or_else(|| non_blank(std::env::var("ZD_SESSION_COOKIE").ok()));
  let csrf_token = non_blank(csrf_token)
    .or_else(|| non_blank(std::env::var("ZD_CSRF_TOKEN").ok()))
    .unwrap_or_default();

  SessionCredentials { cookie, csrf_token }
}

pub struct UreqTransport {
  agent: ureq::Agent,
  credentials: SessionCredentials,
}

impl UreqTransport {
  pub fn new(credentials: SessionCredentials, timeout: Option<Duration>) -> Self {
    let agent: ureq::Agent = ureq::Agent::config_builder()
      .http_status_as_error(false)
      .timeout_global(timeout)
      .build()
      .into();

    Self { agent, credentials }
  }
}

impl Transport for UreqTransport {
  fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
    let mut req = self
      .agent
      .get(url)
      .header("accept", ACCEPT)
      .header("x-csrf-token", self.credentials.csrf_token.as_str())
      .header("x-requested-with", REQUESTED_WITH)
      .header("user-agent", USER_AGENT);

    if let Some(cookie) = &self.credentials.cookie {
      req = req.header("cookie", cookie.as_str());
    }

    let mut resp = req.call().map_err(|e| TransportError(e.to_string()))?;
    let status = resp.status().as_u16();
    let text = resp
      .body_mut()
      .read_to_string()
      .map_err(|e| TransportError(format!("reading body: {e}")))?;

    Ok(HttpReply::from_body(url, status, text))
  }
}

/// In-memory transport serving canned bodies per URL and logging every call.
#[cfg(any(test, feature = "testutil"))]
#[derive(Default)]
pub struct ScriptedTransport {
  routes: std::collections::HashMap<String, (u16, String)>,
  unreachable: std::collections::HashSet<String>,
  calls: std::cell::RefCell<Vec<String>>,
}

#[cfg(any(test, feature = "testutil"))]
impl ScriptedTransport {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_json(mut self, url: &str, status: u16, body: Value) -> Self {
    self.routes.insert(url.to_string(), (status, body.to_string()));
    self
  }

  pub fn with_text(mut self, url: &str, status: u16, body: &str) -> Self {
    self.routes.insert(url.to_string(), (status, body.to_string()));
    self
  }

  pub fn with_unreachable(mut self, url: &str) -> Self {
    self.unreachable.insert(url.to_string());
    self
  }

  pub fn calls(&self) -> Vec<String> {
    self.calls.borrow().clone()
  }
}

#[cfg(any(test, feature = "testutil"))]
impl Transport for ScriptedTransport {
  fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
    self.calls.borrow_mut().push(url.to_string());

    if self.unreachable.contains(url) {
      return Err(TransportError(format!("connection refused: {url}")));
    }

    match self.routes.get(url) {
      Some((status, body)) => Ok(HttpReply::from_body(url, *status, body.clone())),
      None => Ok(HttpReply::from_body(url, 404, String::new())),
    }
  }
}
