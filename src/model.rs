// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Define the JSON model (ticket rows, takeover events, report results, run meta, snapshot) shared by engine and rendering
// role: model/types
// outputs: Serializable structs with stable field names; optional enrichment fields serialize as null
// invariants: ticket_id is never null in emitted rows; takeover report total == total_unique_tickets
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TicketRow {
  pub ticket_id: i64,
  pub organization_id: Option<i64>,
  pub requester_id: Option<i64>,
  pub organization_name: Option<String>,
  pub requester_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TakeoverEvent {
  pub ticket_id: i64,
  pub organization_id: Option<i64>,
  pub requester_id: Option<i64>,
  pub previous_assignee_id: String,
  pub new_assignee_id: String,
  pub takeover_at: String,
  pub organization_name: Option<String>,
  pub requester_name: Option<String>,
}

impl TakeoverEvent {
  /// Identity projection used when takeovers join the cross-report union.
  pub fn as_ticket_row(&self) -> TicketRow {
    TicketRow {
      ticket_id: self.ticket_id,
      organization_id: self.organization_id,
      requester_id: self.requester_id,
      organization_name: self.organization_name.clone(),
      requester_name: self.requester_name.clone(),
    }
  }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ReportResult {
  pub name: String,
  pub query: String,
  pub total: usize,
  pub ticket_rows: Vec<TicketRow>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TakeoverReport {
  pub name: String,
  pub query: String,
  pub total: usize,
  pub candidate_total: usize,
  /// Candidates within the audit cap; id-less candidates count here without being scanned.
  pub candidate_audited: usize,
  pub total_unique_tickets: usize,
  pub total_takeover_events: usize,
  pub cooldown_pauses: usize,
  pub ticket_rows: Vec<TakeoverEvent>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunMeta {
  pub base_url: String,
  pub assignee: String,
  pub assignee_input: Option<String>,
  pub current_user_id: i64,
  pub week_starts_on: String,
  pub week_starts_on_index: u32,
  pub anchor_date: String,
  pub start_of_week_date: String,
  pub start_of_week_iso: String,
  pub timezone: String,
  pub max_tickets_to_audit: usize,
  pub audit_batch_size: usize,
  pub audit_cooldown_secs: u64,
  pub generated_at: String,
}

/// One bucket of a cross-report tally (by organization or by requester).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CountEntry {
  pub id: Option<i64>,
  pub name: Option<String>,
  pub tickets: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Aggregates {
  pub total_distinct_tickets: usize,
  pub by_organization: Vec<CountEntry>,
  pub by_requester: Vec<CountEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EnrichmentStatus {
  Resolved { organizations: usize, users: usize },
  Failed { warning: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Snapshot {
  pub meta: RunMeta,
  pub taken: ReportResult,
  pub solved: ReportResult,
  pub open: ReportResult,
  pub carried_over: ReportResult,
  pub takeovers: TakeoverReport,
  pub aggregates: Aggregates,
  pub enrichment: EnrichmentStatus,
}
