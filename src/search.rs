// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Cursor-following pagination primitive and the exhaustive search collector built on it
// role: collection/pagination
// inputs: HelpdeskClient; prebuilt search expression; sort options; expected result_type
// outputs: Raw result records (serde_json::Value) in encounter order
// side_effects: One GET per page, strictly sequential
// invariants:
// - Pages are followed until next_page is null, absent or blank; nothing is requested after that page
// - Only items whose result_type matches the expected kind are kept
// - Any failing page aborts the whole collection (no partial result)
// - No page bound: one agent/one week keeps results small, but a pathological query grows without limit
// errors: ReportError from HelpdeskClient::fetch_json
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::HelpdeskClient;
use crate::error::Result;
use crate::ext::serde_json::JsonFetch;

pub const RESULT_TYPE_TICKET: &str = "ticket";
pub const RESULT_TYPE_USER: &str = "user";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSort {
  pub by: String,
  pub order: String,
}

impl Default for SearchSort {
  fn default() -> Self {
    Self {
      by: "updated_at".into(),
      order: "desc".into(),
    }
  }
}

/// Read the opaque next-page cursor; blank strings count as absent.
pub fn next_cursor(page: &Value) -> Option<String> {
  page
    .fetch("next_page")
    .to::<String>()
    .filter(|s| !s.trim().is_empty())
}

/// Follow `next_page` from `first_url` until exhausted, collecting what `on_page` extracts from each page.
pub fn follow_cursor<T, F>(client: &HelpdeskClient, first_url: String, label: &str, mut on_page: F) -> Result<Vec<T>>
where
  F: FnMut(&Value) -> Vec<T>,
{
  let mut out: Vec<T> = Vec::new();
  let mut next = Some(first_url);
  let mut page = 0usize;

  while let Some(url) = next {
    page += 1;
    let context = format!("{} page {}", label, page);
    tracing::debug!("{}...", context);

    let data = client.fetch_json(&url, &context)?;
    out.extend(on_page(&data));
    next = next_cursor(&data);
  }

  Ok(out)
}

/// Keep only the records of the expected entity kind from one search page.
pub fn results_of_kind(page: &Value, kind: &str) -> Vec<Value> {
  page
    .fetch("results")
    .items()
    .iter()
    .filter(|r| r.fetch("result_type").to::<String>().as_deref() == Some(kind))
    .cloned()
    .collect()
}

/// Collect every ticket matching `query` across all result pages.
pub fn search_all(client: &HelpdeskClient, query: &str, sort: &SearchSort) -> Result<Vec<Value>> {
  let url = client
    .endpoints()
    .search(query, Some(sort.by.as_str()), Some(sort.order.as_str()));
  tracing::info!(%query, "searching");

  let tickets = follow_cursor(client, url, "Search", |page| results_of_kind(page, RESULT_TYPE_TICKET))?;
  tracing::info!(%query, count = tickets.len(), "search complete");

  Ok(tickets)
}
