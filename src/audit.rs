// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Scan per-ticket audit trails for takeover events inside the week window, with batch cooldowns
// role: collection/audit-scan
// inputs: HelpdeskClient; candidate tickets (raw search records); target user id; window start ISO; AuditOptions
// outputs: TakeoverScan { events, candidate_total, candidate_audited, cooldown_pauses }
// side_effects: Sequential GETs of /tickets/{id}/audits.json pages; sleeps through cooldowns via the run's CancelToken
// invariants:
// - Candidates are processed in received order, capped at max_tickets
// - Audits with missing created_at or created_at < window start (string order) are skipped
// - A cooldown happens after every batch_size processed tickets, never after the last one
// - Every matching event is emitted; one ticket may yield several events
// errors: Any audit page failure or cancellation aborts the scan
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::time::Duration;

use serde_json::Value;

use crate::api::HelpdeskClient;
use crate::error::Result;
use crate::ext::serde_json::JsonFetch;
use crate::model::TakeoverEvent;
use crate::search::follow_cursor;

pub const ASSIGNEE_FIELD: &str = "assignee_id";

#[derive(Debug, Clone)]
pub struct AuditOptions {
  pub max_tickets: usize,
  pub batch_size: usize,
  pub cooldown: Duration,
}

impl Default for AuditOptions {
  fn default() -> Self {
    Self {
      max_tickets: 200,
      batch_size: 100,
      cooldown: Duration::from_secs(30),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct TakeoverScan {
  pub events: Vec<TakeoverEvent>,
  pub candidate_total: usize,
  /// Candidates taken after the cap, including id-less ones that had no audits to fetch.
  pub candidate_audited: usize,
  pub cooldown_pauses: usize,
}

/// True when `event` moves the assignee from someone else to `my_user_id`.
///
/// Values compare as strings so numeric and string-encoded ids match.
pub fn is_takeover(event: &Value, my_user_id: &str) -> bool {
  if event.fetch("type").to::<String>().as_deref() != Some("Change") {
    return false;
  }
  if event.fetch("field_name").to::<String>().as_deref() != Some(ASSIGNEE_FIELD) {
    return false;
  }

  let Some(previous) = event.fetch("previous_value").to_plain_string() else {
    return false;
  };
  if previous.trim().is_empty() {
    return false;
  }

  let value = event.fetch("value").to_plain_string();
  value.as_deref() == Some(my_user_id) && previous != my_user_id
}

/// Takeover events found in one page of audits.
fn takeovers_in_page(page: &Value, ticket: &Value, ticket_id: i64, my_user_id: &str, window_start_iso: &str) -> Vec<TakeoverEvent> {
  let mut out = Vec::new();

  for audit in page.fetch("audits").items() {
    let Some(created_at) = audit.fetch("created_at").to::<String>() else {
      continue;
    };
    if created_at.as_str() < window_start_iso {
      continue;
    }

    for event in audit.fetch("events").items() {
      if !is_takeover(event, my_user_id) {
        continue;
      }
      out.push(TakeoverEvent {
        ticket_id,
        organization_id: ticket.fetch("organization_id").to_id(),
        requester_id: ticket.fetch("requester_id").to_id(),
        previous_assignee_id: event.fetch("previous_value").to_plain_string().unwrap_or_default(),
        new_assignee_id: event.fetch("value").to_plain_string().unwrap_or_default(),
        takeover_at: created_at.clone(),
        organization_name: None,
        requester_name: None,
      });
    }
  }

  out
}

pub fn detect_takeovers(
  client: &HelpdeskClient,
  candidates: &[Value],
  my_user_id: &str,
  window_start_iso: &str,
  opts: &AuditOptions,
) -> Result<TakeoverScan> {
  let limited = &candidates[..candidates.len().min(opts.max_tickets)];
  let batch_size = opts.batch_size.max(1);

  let mut scan = TakeoverScan {
    candidate_total: candidates.len(),
    candidate_audited: limited.len(),
    ..TakeoverScan::default()
  };

  // Id-less candidates are skipped but still count as audited and toward the batch cadence.
  for (i, ticket) in limited.iter().enumerate() {
    if let Some(ticket_id) = ticket.fetch("id").to_id().filter(|id| *id > 0) {
      tracing::info!("Audits {}/{} (ticket {})...", i + 1, limited.len(), ticket_id);

      let url = client.endpoints().ticket_audits(ticket_id);
      let label = format!("Audit fetch for ticket {}", ticket_id);
      let events = follow_cursor(client, url, &label, |page| {
        takeovers_in_page(page, ticket, ticket_id, my_user_id, window_start_iso)
      })?;
      scan.events.extend(events);
    } else {
      tracing::debug!(position = i + 1, "candidate without id skipped");
    }

    let processed = i + 1;
    if processed % batch_size == 0 && processed < limited.len() {
      tracing::info!(
        processed,
        total = limited.len(),
        "cooling down for {}s",
        opts.cooldown.as_secs()
      );
      client.cancel_token().sleep(opts.cooldown)?;
      scan.cooldown_pauses += 1;
    }
  }

  Ok(scan)
}
