use predicates::prelude::*;
use serde_json::json;

use test_support::MockHelpdesk;

use crate::helpdesk::{run_json, ticket, weekly_cmd, weekly_routes, weekly_server, BIN};

#[test]
fn missing_base_url_fails_before_any_request() {
  test_support::cmd_bin(BIN)
    .args(["--anchor", "2025-08-13"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("--base-url"));
}

#[test]
fn server_error_on_search_page_exits_non_zero_with_status_and_url() {
  let server = MockHelpdesk::builder()
    .json("/api/v2/users/me.json", json!({"user": {"id": 555}}))
    .status("/api/v2/search.json", Some("status:open"), 500, "<html>oops</html>")
    .json("/api/v2/search.json", json!({"results": [ticket(1001, 10, 100)]}))
    .start();

  weekly_cmd(&server)
    .assert()
    .failure()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("weekly report run failed while querying Open Tickets Remaining"))
    .stderr(predicate::str::contains("(500)"))
    .stderr(predicate::str::contains(server.base_url()));

  // stages after the failing query never ran
  assert_eq!(server.hits("/api/v2/tickets/1001/audits.json"), 0);
}

#[test]
fn audit_failure_aborts_the_run() {
  let server = MockHelpdesk::builder()
    .json("/api/v2/users/me.json", json!({"user": {"id": 555}}))
    .json("/api/v2/search.json", json!({"results": [
      {"result_type": "ticket", "id": 1001},
      {"result_type": "ticket", "id": 1002}
    ]}))
    .json("/api/v2/tickets/1001/audits.json", json!({"audits": []}))
    .status("/api/v2/tickets/1002/audits.json", None, 500, "{}")
    .start();

  weekly_cmd(&server)
    .assert()
    .failure()
    .stderr(predicate::str::contains("while scanning audits"))
    .stderr(predicate::str::contains("Audit fetch for ticket 1002"));
  assert_eq!(server.hits("/api/v2/organizations/show_many.json"), 0);
}

#[test]
fn enrichment_failure_is_a_warning_not_an_error() {
  let server = weekly_routes()
    .status("/api/v2/organizations/show_many.json", None, 503, "busy")
    .start();

  let v = run_json(&mut weekly_cmd(&server));

  assert_eq!(v["enrichment"]["status"], "failed");
  assert!(v["enrichment"]["warning"].as_str().unwrap().contains("503"));
  assert_eq!(v["taken"]["total"], 3);
  assert!(v["taken"]["ticket_rows"][0]["organization_name"].is_null());
  assert_eq!(v["aggregates"]["total_distinct_tickets"], 4);
}

#[test]
fn unknown_assignee_is_fatal() {
  let server = MockHelpdesk::builder()
    .json("/api/v2/search.json", json!({"results": []}))
    .start();

  weekly_cmd(&server)
    .args(["--assignee", "nobody at all"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("no user found for assignee input: nobody at all"));
  assert_eq!(server.requests().len(), 1);
}

#[test]
fn strict_json_rejects_html_pages() {
  let server = MockHelpdesk::builder()
    .status("/api/v2/users/me.json", None, 200, "<html>login</html>")
    .start();

  // lenient: the identity page is empty, so the id is missing
  weekly_cmd(&server)
    .assert()
    .failure()
    .stderr(predicate::str::contains("current user id not found"));

  weekly_cmd(&server)
    .arg("--strict-json")
    .assert()
    .failure()
    .stderr(predicate::str::contains("non-JSON body"));
}

#[test]
fn unparseable_anchor_is_rejected() {
  let server = weekly_server();
  test_support::cmd_bin(BIN)
    .args(["--base-url", server.base_url(), "--tz", "utc", "--anchor", "not a date at all"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("not a date at all"));
  assert!(server.requests().is_empty());
}
