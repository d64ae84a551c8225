use anyhow::Result;
use serde::Serialize;

use crate::model::{CountEntry, Snapshot, TakeoverEvent, TicketRow};

const ID_LIST_LIMIT: usize = 40;
const TAKEOVER_SAMPLE_LIMIT: usize = 20;
const TOP_ENTRIES: usize = 5;

/// "#1, #2, ... (+N more)" for the first `limit` ids, or "None".
pub fn id_list<I>(ids: I, limit: usize) -> String
where
  I: IntoIterator<Item = i64>,
{
  let all: Vec<i64> = ids.into_iter().collect();
  if all.is_empty() {
    return "None".into();
  }

  let mut parts: Vec<String> = all.iter().take(limit).map(|id| format!("#{}", id)).collect();
  if all.len() > limit {
    parts.push(format!("... (+{} more)", all.len() - limit));
  }
  parts.join(", ")
}

fn takeover_line(ev: &TakeoverEvent) -> String {
  format!(
    "- #{}: {} -> {} at {}",
    ev.ticket_id, ev.previous_assignee_id, ev.new_assignee_id, ev.takeover_at
  )
}

fn top_lines(entries: &[CountEntry], missing: &str) -> Vec<String> {
  if entries.is_empty() {
    return vec!["- None".into()];
  }

  entries
    .iter()
    .take(TOP_ENTRIES)
    .map(|e| {
      let label = match (&e.name, e.id) {
        (Some(name), _) => name.clone(),
        (None, Some(id)) => format!("#{}", id),
        (None, None) => missing.to_string(),
      };
      format!("- {}: {}", label, e.tickets)
    })
    .collect()
}

/// Copy-ready plain-text summary of a snapshot.
pub fn build_draft(snap: &Snapshot) -> String {
  let meta = &snap.meta;
  let tk = &snap.takeovers;
  let ids = |rows: &[TicketRow]| id_list(rows.iter().map(|r| r.ticket_id), ID_LIST_LIMIT);

  let mut lines: Vec<String> = vec![
    "Zendesk Weekly Report".into(),
    format!("Generated: {}", meta.generated_at),
    format!(
      "Assignee: {} [keyword: {}]",
      meta.assignee_input.as_deref().unwrap_or("(blank -> me)"),
      meta.assignee
    ),
    format!("Week anchor date: {}", meta.anchor_date),
    format!("Week starts on: {}", meta.week_starts_on),
    format!("Range start: {}", meta.start_of_week_date),
    String::new(),
    "Summary".into(),
    format!("- {}: {}", snap.taken.name, snap.taken.total),
    format!("- {}: {}", snap.solved.name, snap.solved.total),
    format!("- {}: {}", snap.open.name, snap.open.total),
    format!("- {}: {}", snap.carried_over.name, snap.carried_over.total),
    format!(
      "- {}: {} unique tickets ({} events)",
      tk.name, tk.total_unique_tickets, tk.total_takeover_events
    ),
    format!("- Takeover audits coverage: {}/{}", tk.candidate_audited, tk.candidate_total),
    format!("- Distinct tickets across reports: {}", snap.aggregates.total_distinct_tickets),
    String::new(),
    "Ticket IDs".into(),
    format!("- Created: {}", ids(&snap.taken.ticket_rows)),
    format!("- Solved/Updated: {}", ids(&snap.solved.ticket_rows)),
    format!("- Open Remaining: {}", ids(&snap.open.ticket_rows)),
    format!("- Carried Over: {}", ids(&snap.carried_over.ticket_rows)),
    format!(
      "- Takeover Tickets: {}",
      id_list(tk.ticket_rows.iter().map(|e| e.ticket_id), ID_LIST_LIMIT)
    ),
    String::new(),
    "Top Organizations".into(),
  ];

  lines.extend(top_lines(&snap.aggregates.by_organization, "(no organization)"));
  lines.push(String::new());
  lines.push("Top Requesters".into());
  lines.extend(top_lines(&snap.aggregates.by_requester, "(unknown requester)"));
  lines.push(String::new());
  lines.push("Takeover Events (sample)".into());

  if tk.ticket_rows.is_empty() {
    lines.push("- None".into());
  } else {
    lines.extend(tk.ticket_rows.iter().take(TAKEOVER_SAMPLE_LIMIT).map(takeover_line));
    if tk.ticket_rows.len() > TAKEOVER_SAMPLE_LIMIT {
      lines.push(format!(
        "- ... (+{} more takeover events)",
        tk.ticket_rows.len() - TAKEOVER_SAMPLE_LIMIT
      ));
    }
  }

  lines.join("\n")
}

fn text_block<T: Serialize>(title: &str, value: &T) -> Result<String> {
  Ok(format!("=== {} ===\n{}\n", title, serde_json::to_string_pretty(value)?))
}

/// Raw payload dump: one titled pretty-JSON block per section.
pub fn text_blocks(snap: &Snapshot) -> Result<String> {
  let blocks = vec![
    text_block("Run Meta", &snap.meta)?,
    text_block(&snap.taken.name, &snap.taken)?,
    text_block(&snap.solved.name, &snap.solved)?,
    text_block(&snap.open.name, &snap.open)?,
    text_block(&snap.carried_over.name, &snap.carried_over)?,
    text_block(&snap.takeovers.name, &snap.takeovers)?,
    text_block("Aggregates", &snap.aggregates)?,
  ];
  Ok(blocks.join("\n"))
}
