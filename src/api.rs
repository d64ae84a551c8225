// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Helpdesk REST endpoints and the run-scoped client that turns replies into JSON or typed failures
// role: api/client
// inputs: base URL; a Transport; strict-JSON policy; a CancelToken shared with the run
// outputs: Absolute endpoint URLs; serde_json::Value payloads; the current user's id
// side_effects: Network calls through the Transport
// invariants:
// - Cancellation is checked before every request
// - Non-success status => ReportError::FetchFailure { status, url }
// - Lenient mode maps a non-JSON body to Value::Null; strict mode raises MalformedResponse
// errors: ReportError (FetchFailure, Network, MalformedResponse, IdentityUnavailable, Cancelled)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde_json::Value;
use url::form_urlencoded;

use crate::cancel::CancelToken;
use crate::error::{ReportError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::http::Transport;
use crate::resolve::EntityKind;

/// Characters of a failed response body kept for the debug log.
const ERROR_BODY_PREVIEW: usize = 200;

/// URL builders for the handful of endpoints the report engine consumes.
#[derive(Debug, Clone)]
pub struct Endpoints {
  root: String,
}

impl Endpoints {
  pub fn new(base_url: &str) -> Result<Self> {
    let parsed = url::Url::parse(base_url.trim()).map_err(|e| ReportError::InvalidUrl {
      url: base_url.to_string(),
      message: e.to_string(),
    })?;

    if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
      return Err(ReportError::InvalidUrl {
        url: base_url.to_string(),
        message: "expected an http(s) base URL".into(),
      });
    }

    let root = parsed.as_str().trim_end_matches('/').to_string();
    Ok(Self { root })
  }

  pub fn root(&self) -> &str {
    &self.root
  }

  pub fn me(&self) -> String {
    format!("{}/api/v2/users/me.json", self.root)
  }

  pub fn search(&self, query: &str, sort_by: Option<&str>, sort_order: Option<&str>) -> String {
    let mut params = form_urlencoded::Serializer::new(String::new());
    params.append_pair("query", query);
    if let Some(by) = sort_by {
      params.append_pair("sort_by", by);
    }
    if let Some(order) = sort_order {
      params.append_pair("sort_order", order);
    }

    format!("{}/api/v2/search.json?{}", self.root, params.finish())
  }

  pub fn ticket_audits(&self, ticket_id: i64) -> String {
    format!("{}/api/v2/tickets/{}/audits.json", self.root, ticket_id)
  }

  pub fn show_many(&self, kind: EntityKind, ids: &[i64]) -> String {
    let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
    let query = form_urlencoded::Serializer::new(String::new())
      .append_pair("ids", &joined)
      .finish();

    format!("{}/api/v2/{}/show_many.json?{}", self.root, kind.collection(), query)
  }
}

/// Run-scoped access to the helpdesk: transport, endpoints, JSON policy and cancellation.
pub struct HelpdeskClient {
  transport: Box<dyn Transport>,
  endpoints: Endpoints,
  strict_json: bool,
  cancel: CancelToken,
}

impl HelpdeskClient {
  pub fn new(transport: Box<dyn Transport>, endpoints: Endpoints) -> Self {
    Self {
      transport,
      endpoints,
      strict_json: false,
      cancel: CancelToken::new(),
    }
  }

  pub fn strict_json(mut self, strict: bool) -> Self {
    self.strict_json = strict;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn endpoints(&self) -> &Endpoints {
    &self.endpoints
  }

  pub fn cancel_token(&self) -> &CancelToken {
    &self.cancel
  }

  /// GET `url` and return its JSON payload, labelling failures with `context`.
  pub fn fetch_json(&self, url: &str, context: &str) -> Result<Value> {
    self.cancel.check()?;
    tracing::debug!(%url, "GET");

    let reply = self.transport.get(url).map_err(|e| ReportError::Network {
      context: context.to_string(),
      url: url.to_string(),
      message: e.to_string(),
    })?;

    if !reply.ok() {
      let body: String = reply.text.chars().take(ERROR_BODY_PREVIEW).collect();
      tracing::debug!(status = reply.status, url = %reply.url, %body, "request failed");
      return Err(ReportError::FetchFailure {
        context: context.to_string(),
        status: reply.status,
        url: reply.url,
      });
    }

    match reply.data {
      Some(v) => Ok(v),
      None if self.strict_json => Err(ReportError::MalformedResponse {
        context: context.to_string(),
        url: reply.url,
      }),
      None => {
        tracing::debug!(url = %reply.url, "non-JSON body treated as empty");
        Ok(Value::Null)
      }
    }
  }

  pub fn current_user_id(&self) -> Result<i64> {
    let url = self.endpoints.me();
    let data = self.fetch_json(&url, "Current user lookup")?;
    data.fetch("user.id").to_id().ok_or(ReportError::IdentityUnavailable)
  }
}
