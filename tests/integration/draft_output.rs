use crate::helpdesk::{weekly_cmd, weekly_server};

#[test]
fn draft_format_renders_copy_ready_text() {
  let server = weekly_server();
  let out = weekly_cmd(&server).args(["--format", "draft"]).output().unwrap();
  assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
  let draft = String::from_utf8(out.stdout).unwrap();

  insta::assert_snapshot!(draft.trim_end(), @r###"
  Zendesk Weekly Report
  Generated: 2025-08-15T12:00:00.000Z
  Assignee: (blank -> me) [keyword: me]
  Week anchor date: 2025-08-13
  Week starts on: Monday
  Range start: 2025-08-11

  Summary
  - Assigned + Created This Week: 3
  - Assigned + Solved + Updated This Week: 2
  - Open Tickets Remaining: 1
  - Carried Over From Prior Weeks: 0
  - Takeovers This Week: 1 unique tickets (1 events)
  - Takeover audits coverage: 3/3
  - Distinct tickets across reports: 4

  Ticket IDs
  - Created: #1001, #1002, #1003
  - Solved/Updated: #1001, #2001
  - Open Remaining: #1002
  - Carried Over: None
  - Takeover Tickets: #1001

  Top Organizations
  - Acme: 2
  - Globex: 1
  - Initech: 1

  Top Requesters
  - Ana: 2
  - bo@example.test: 1
  - Cy: 1

  Takeover Events (sample)
  - #1001: 200 -> 555 at 2025-08-12T09:30:00Z
  "###);
}

#[test]
fn blocks_format_writes_titled_sections_to_file() {
  let server = weekly_server();
  let td = test_support::tempdir();
  let target = td.path().join("reports").join("week.txt");

  weekly_cmd(&server)
    .args(["--format", "blocks", "--out", target.to_str().unwrap()])
    .assert()
    .success()
    .stdout(predicates::str::is_empty());

  let text = std::fs::read_to_string(&target).unwrap();
  assert!(text.starts_with("=== Run Meta ===\n{"));
  for title in [
    "=== Assigned + Created This Week ===",
    "=== Assigned + Solved + Updated This Week ===",
    "=== Open Tickets Remaining ===",
    "=== Carried Over From Prior Weeks ===",
    "=== Takeovers This Week ===",
    "=== Aggregates ===",
  ] {
    assert!(text.contains(title), "missing block {title}");
  }
}
