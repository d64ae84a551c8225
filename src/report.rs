// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Orchestrate one weekly run (assignee, four ticket queries, takeover scan, enrichment, aggregates) into a Snapshot
// role: orchestration/assembler
// inputs: HelpdeskClient; RunParams (assignee input, week window, audit and enrichment settings)
// outputs: Snapshot (meta + five reports + aggregates + enrichment status)
// side_effects: Sequential network calls through the client; tracing progress events
// invariants:
// - Stages run strictly in order; one request in flight at a time
// - Emitted rows always carry a ticket_id; rows without one are dropped
// - Aggregates count the union of all rows deduplicated by ticket_id (first occurrence wins)
// - Enrichment failure degrades to null names plus a warning, never a failed run
// - A run executes once; it ends Completed or Failed { stage, message }
// errors: ReportError from any fatal stage; RunFinished when execute is called twice
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::api::HelpdeskClient;
use crate::audit::{AuditOptions, detect_takeovers};
use crate::error::{ReportError, Result};
use crate::ext::serde_json::JsonFetch;
use crate::model::{
  Aggregates, CountEntry, EnrichmentStatus, ReportResult, RunMeta, Snapshot, TakeoverEvent, TakeoverReport, TicketRow,
};
use crate::resolve::{EntityKind, resolve_names};
use crate::search::{RESULT_TYPE_USER, SearchSort, results_of_kind, search_all};
use crate::window::{WeekStart, WeekWindow};

pub const ASSIGNEE_FALLBACK_KEYWORD: &str = "me";
const REPORT_STEPS: usize = 5;

static NUMERIC_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
  Taken,
  Solved,
  Open,
  CarriedOver,
  Takeovers,
}

impl ReportKind {
  /// Position in the run's progress sequence (1-based).
  pub fn step(self) -> usize {
    match self {
      ReportKind::Taken => 1,
      ReportKind::Solved => 2,
      ReportKind::Open => 3,
      ReportKind::CarriedOver => 4,
      ReportKind::Takeovers => 5,
    }
  }

  pub fn name(self) -> &'static str {
    match self {
      ReportKind::Taken => "Assigned + Created This Week",
      ReportKind::Solved => "Assigned + Solved + Updated This Week",
      ReportKind::Open => "Open Tickets Remaining",
      ReportKind::CarriedOver => "Carried Over From Prior Weeks",
      ReportKind::Takeovers => "Takeovers This Week",
    }
  }

  /// Search expression for this report; `date` is the week's first day (YYYY-MM-DD).
  pub fn query(self, keyword: &str, date: &str) -> String {
    match self {
      ReportKind::Taken => format!("type:ticket assignee:{} created>={}", keyword, date),
      ReportKind::Solved => format!("type:ticket assignee:{} status:solved updated>={}", keyword, date),
      ReportKind::Open => format!("type:ticket assignee:{} status:open", keyword),
      ReportKind::CarriedOver => format!("type:ticket assignee:{} status<solved created<{}", keyword, date),
      ReportKind::Takeovers => format!("type:ticket assignee:{} updated>={}", keyword, date),
    }
  }
}

/// Everything one run needs besides the client.
#[derive(Debug, Clone)]
pub struct RunParams {
  /// Trimmed user input; None when blank.
  pub assignee_input: Option<String>,
  pub week_start: WeekStart,
  pub anchor: NaiveDate,
  pub window: WeekWindow,
  pub timezone: String,
  pub sort: SearchSort,
  pub audit: AuditOptions,
  pub enrich_batch_size: usize,
  pub generated_at: String,
}

impl RunParams {
  pub fn keyword(&self) -> &str {
    self
      .assignee_input
      .as_deref()
      .filter(|s| !s.is_empty())
      .unwrap_or(ASSIGNEE_FALLBACK_KEYWORD)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
  Pending,
  ResolvingAssignee,
  Querying { report: String },
  ScanningAudits,
  Enriching,
  Assembling,
  Completed,
  Failed { stage: String, message: String },
}

impl RunState {
  fn stage_label(&self) -> String {
    match self {
      RunState::Querying { report } => format!("querying {}", report),
      RunState::ResolvingAssignee => "resolving assignee".into(),
      RunState::ScanningAudits => "scanning audits".into(),
      RunState::Enriching => "enriching".into(),
      RunState::Assembling => "assembling".into(),
      RunState::Pending => "pending".into(),
      RunState::Completed => "completed".into(),
      RunState::Failed { stage, .. } => stage.clone(),
    }
  }
}

/// One weekly report run. Holds the run's mutable context; build a new one per run.
pub struct ReportRun<'a> {
  client: &'a HelpdeskClient,
  params: RunParams,
  state: RunState,
}

impl<'a> ReportRun<'a> {
  pub fn new(client: &'a HelpdeskClient, params: RunParams) -> Self {
    Self {
      client,
      params,
      state: RunState::Pending,
    }
  }

  pub fn state(&self) -> &RunState {
    &self.state
  }

  pub fn execute(&mut self) -> Result<Snapshot> {
    if self.state != RunState::Pending {
      return Err(ReportError::RunFinished);
    }

    match self.run_stages() {
      Ok(snapshot) => {
        self.state = RunState::Completed;
        Ok(snapshot)
      }
      Err(e) => {
        let stage = self.state.stage_label();
        tracing::debug!(%stage, status = ?e.status(), error = %e, "run failed");
        self.state = RunState::Failed {
          stage,
          message: e.to_string(),
        };
        Err(e)
      }
    }
  }

  fn run_stages(&mut self) -> Result<Snapshot> {
    let keyword = self.params.keyword().to_string();
    let date = self.params.window.start_of_week_date.clone();

    self.state = RunState::ResolvingAssignee;
    tracing::info!(assignee = %keyword, "Resolving target assignee user...");
    let user_id = resolve_assignee(self.client, &keyword)?;

    let mut taken = self.query_stage(ReportKind::Taken, &keyword, &date)?;
    let mut solved = self.query_stage(ReportKind::Solved, &keyword, &date)?;
    let mut open = self.query_stage(ReportKind::Open, &keyword, &date)?;
    let mut carried_over = self.query_stage(ReportKind::CarriedOver, &keyword, &date)?;

    self.state = RunState::ScanningAudits;
    tracing::info!("Running report {}/{} (audits)...", REPORT_STEPS, REPORT_STEPS);
    let mut takeovers = self.run_takeover_report(&keyword, &date, user_id)?;

    self.state = RunState::Enriching;
    let enrichment = self.enrich(
      &mut [&mut taken, &mut solved, &mut open, &mut carried_over],
      &mut takeovers.ticket_rows,
    );

    self.state = RunState::Assembling;
    let aggregates = aggregate(&[&taken, &solved, &open, &carried_over], &takeovers);
    let meta = self.meta(&keyword, user_id);

    tracing::info!(
      distinct = aggregates.total_distinct_tickets,
      takeovers = takeovers.total_takeover_events,
      "run complete"
    );

    Ok(Snapshot {
      meta,
      taken,
      solved,
      open,
      carried_over,
      takeovers,
      aggregates,
      enrichment,
    })
  }

  fn query_stage(&mut self, kind: ReportKind, keyword: &str, date: &str) -> Result<ReportResult> {
    self.state = RunState::Querying {
      report: kind.name().into(),
    };
    tracing::info!("Running report {}/{}: {}", kind.step(), REPORT_STEPS, kind.name());
    self.run_ticket_report(kind, keyword, date)
  }

  fn run_ticket_report(&self, kind: ReportKind, keyword: &str, date: &str) -> Result<ReportResult> {
    let query = kind.query(keyword, date);
    let tickets = search_all(self.client, &query, &self.params.sort)?;
    let ticket_rows: Vec<TicketRow> = tickets.iter().filter_map(pick_ticket_identity).collect();

    Ok(ReportResult {
      name: kind.name().into(),
      query,
      total: ticket_rows.len(),
      ticket_rows,
    })
  }

  fn run_takeover_report(&self, keyword: &str, date: &str, user_id: i64) -> Result<TakeoverReport> {
    let query = ReportKind::Takeovers.query(keyword, date);
    let candidates = search_all(self.client, &query, &self.params.sort)?;
    let scan = detect_takeovers(
      self.client,
      &candidates,
      &user_id.to_string(),
      &self.params.window.start_of_week_iso,
      &self.params.audit,
    )?;

    let unique: HashSet<i64> = scan.events.iter().map(|e| e.ticket_id).collect();

    Ok(TakeoverReport {
      name: ReportKind::Takeovers.name().into(),
      query,
      total: unique.len(),
      candidate_total: scan.candidate_total,
      candidate_audited: scan.candidate_audited,
      total_unique_tickets: unique.len(),
      total_takeover_events: scan.events.len(),
      cooldown_pauses: scan.cooldown_pauses,
      ticket_rows: scan.events,
    })
  }

  /// Resolve names for every org/requester id across all reports; failures leave names null.
  fn enrich(&self, reports: &mut [&mut ReportResult], events: &mut [TakeoverEvent]) -> EnrichmentStatus {
    let mut org_ids: Vec<i64> = Vec::new();
    let mut user_ids: Vec<i64> = Vec::new();
    for row in reports.iter().flat_map(|r| r.ticket_rows.iter()) {
      org_ids.extend(row.organization_id);
      user_ids.extend(row.requester_id);
    }
    for ev in events.iter() {
      org_ids.extend(ev.organization_id);
      user_ids.extend(ev.requester_id);
    }

    tracing::info!(
      organizations = org_ids.len(),
      requesters = user_ids.len(),
      "Enriching organization and requester names..."
    );

    let batch = self.params.enrich_batch_size;
    let resolved = resolve_names(self.client, &org_ids, EntityKind::Organization, batch)
      .and_then(|orgs| resolve_names(self.client, &user_ids, EntityKind::User, batch).map(|users| (orgs, users)));

    let (orgs, users) = match resolved {
      Ok(maps) => maps,
      Err(e) => {
        tracing::warn!(error = %e, "enrichment failed; names left empty");
        return EnrichmentStatus::Failed { warning: e.to_string() };
      }
    };

    let lookup = |map: &BTreeMap<i64, String>, id: Option<i64>| id.and_then(|i| map.get(&i).cloned());
    for row in reports.iter_mut().flat_map(|r| r.ticket_rows.iter_mut()) {
      row.organization_name = lookup(&orgs, row.organization_id);
      row.requester_name = lookup(&users, row.requester_id);
    }
    for ev in events.iter_mut() {
      ev.organization_name = lookup(&orgs, ev.organization_id);
      ev.requester_name = lookup(&users, ev.requester_id);
    }

    EnrichmentStatus::Resolved {
      organizations: orgs.len(),
      users: users.len(),
    }
  }

  fn meta(&self, keyword: &str, user_id: i64) -> RunMeta {
    let p = &self.params;
    RunMeta {
      base_url: self.client.endpoints().root().to_string(),
      assignee: keyword.to_string(),
      assignee_input: p.assignee_input.clone().filter(|s| !s.is_empty()),
      current_user_id: user_id,
      week_starts_on: p.week_start.name().to_string(),
      week_starts_on_index: p.week_start.index(),
      anchor_date: p.anchor.format("%Y-%m-%d").to_string(),
      start_of_week_date: p.window.start_of_week_date.clone(),
      start_of_week_iso: p.window.start_of_week_iso.clone(),
      timezone: p.timezone.clone(),
      max_tickets_to_audit: p.audit.max_tickets,
      audit_batch_size: p.audit.batch_size,
      audit_cooldown_secs: p.audit.cooldown.as_secs(),
      generated_at: p.generated_at.clone(),
    }
  }
}

/// Map an assignee keyword to a numeric user id.
///
/// Blank or `me` asks the helpdesk who we are; digits are taken as the id; anything else is a
/// user search whose first user hit wins.
pub fn resolve_assignee(client: &HelpdeskClient, keyword: &str) -> Result<i64> {
  let keyword = keyword.trim();
  if keyword.is_empty() || keyword == ASSIGNEE_FALLBACK_KEYWORD {
    return client.current_user_id();
  }

  if NUMERIC_ID.is_match(keyword) {
    if let Ok(id) = keyword.parse::<i64>() {
      return Ok(id);
    }
  }

  let url = client.endpoints().search(&format!("type:user {}", keyword), None, None);
  let data = client.fetch_json(&url, "Assignee lookup")?;

  results_of_kind(&data, RESULT_TYPE_USER)
    .first()
    .and_then(|u| u.fetch("id").to_id())
    .filter(|id| *id > 0)
    .ok_or_else(|| ReportError::AssigneeNotFound(keyword.to_string()))
}

/// Identity projection of a raw ticket record; None when it has no usable id.
pub fn pick_ticket_identity(ticket: &Value) -> Option<TicketRow> {
  let ticket_id = ticket.fetch("id").to_id().filter(|id| *id > 0)?;
  Some(TicketRow {
    ticket_id,
    organization_id: ticket.fetch("organization_id").to_id(),
    requester_id: ticket.fetch("requester_id").to_id(),
    organization_name: None,
    requester_name: None,
  })
}

/// Keep the first row seen for each ticket_id, preserving order.
pub fn dedupe_by_ticket<I>(rows: I) -> Vec<TicketRow>
where
  I: IntoIterator<Item = TicketRow>,
{
  let mut seen = HashSet::new();
  rows.into_iter().filter(|r| seen.insert(r.ticket_id)).collect()
}

fn tally<F>(rows: &[TicketRow], key: F) -> Vec<CountEntry>
where
  F: Fn(&TicketRow) -> (Option<i64>, Option<String>),
{
  let mut counts: HashMap<Option<i64>, CountEntry> = HashMap::new();
  for row in rows {
    let (id, name) = key(row);
    let entry = counts.entry(id).or_insert_with(|| CountEntry { id, name: None, tickets: 0 });
    entry.tickets += 1;
    if entry.name.is_none() {
      entry.name = name;
    }
  }

  let mut out: Vec<CountEntry> = counts.into_values().collect();
  out.sort_by_key(|e| (Reverse(e.tickets), e.id.is_none(), e.id));
  out
}

/// Cross-report counts over the deduplicated union of every row.
pub fn aggregate(reports: &[&ReportResult], takeovers: &TakeoverReport) -> Aggregates {
  let union = reports
    .iter()
    .flat_map(|r| r.ticket_rows.iter().cloned())
    .chain(takeovers.ticket_rows.iter().map(TakeoverEvent::as_ticket_row));
  let distinct = dedupe_by_ticket(union);

  Aggregates {
    total_distinct_tickets: distinct.len(),
    by_organization: tally(&distinct, |r| (r.organization_id, r.organization_name.clone())),
    by_requester: tally(&distinct, |r| (r.requester_id, r.requester_name.clone())),
  }
}
