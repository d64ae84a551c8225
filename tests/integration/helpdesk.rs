// Shared mock-helpdesk scenario for the CLI tests.
//
// Week of 2025-08-13 (Monday start, UTC): "me" is user 555; the four ticket queries return
// 3 (over two pages), 2, 1 and 0 tickets; ticket 1001 holds one in-window takeover from 200.

use serde_json::{json, Value};
use test_support::{read_fixture_json, MockHelpdesk, MockHelpdeskBuilder};

pub const BIN: &str = "zd-weekly-report";
pub const NOW: &str = "2025-08-15T12:00:00Z";

pub fn ticket(id: i64, org: i64, requester: i64) -> Value {
  json!({"result_type": "ticket", "id": id, "organization_id": org, "requester_id": requester})
}

fn page(results: Vec<Value>, next: Option<&str>) -> Value {
  json!({"results": results, "next_page": next})
}

/// Routes of the standard week, without the name lookups.
pub fn weekly_routes() -> MockHelpdeskBuilder {
  let audits_1001: Value = read_fixture_json("audits_1001.json");

  MockHelpdesk::builder()
    .json("/api/v2/users/me.json", json!({"user": {"id": 555, "name": "Agent Me"}}))
    .json_for_query(
      "/api/v2/search.json",
      "status:solved",
      page(vec![ticket(1001, 10, 100), ticket(2001, 30, 102)], None),
    )
    .json_for_query(
      "/api/v2/search.json",
      "status:open",
      page(vec![ticket(1002, 10, 101)], None),
    )
    .json_for_query("/api/v2/search.json", "status<solved", page(vec![], None))
    .json_for_query(
      "/api/v2/search.json",
      "created>=2025-08-11",
      page(
        vec![ticket(1001, 10, 100), json!({"result_type": "user", "id": 9}), ticket(1002, 10, 101)],
        Some("{base}/api/v2/search.json?query=taken+page+2"),
      ),
    )
    .json_for_query(
      "/api/v2/search.json",
      "taken page 2",
      page(vec![ticket(1003, 20, 100)], None),
    )
    .json_for_query(
      "/api/v2/search.json",
      "updated>=2025-08-11",
      page(
        vec![ticket(1001, 10, 100), ticket(1002, 10, 101), ticket(1003, 20, 100)],
        None,
      ),
    )
    .json_for_query(
      "/api/v2/search.json",
      "type:user",
      json!({"results": [{"result_type": "user", "id": 4242, "name": "Jane Doe"}]}),
    )
    .json("/api/v2/tickets/1001/audits.json", audits_1001)
    .json("/api/v2/tickets/1002/audits.json", json!({"audits": []}))
    .json("/api/v2/tickets/1003/audits.json", json!({"audits": []}))
}

pub fn with_names(builder: MockHelpdeskBuilder) -> MockHelpdeskBuilder {
  builder
    .json(
      "/api/v2/organizations/show_many.json",
      json!({"organizations": [
        {"id": 10, "name": "Acme"},
        {"id": 20, "name": "Globex"},
        {"id": 30, "name": "Initech"}
      ]}),
    )
    .json(
      "/api/v2/users/show_many.json",
      json!({"users": [
        {"id": 100, "name": "Ana"},
        {"id": 101, "name": null, "email": "bo@example.test"},
        {"id": 102, "name": "Cy"}
      ]}),
    )
}

pub fn weekly_server() -> MockHelpdesk {
  with_names(weekly_routes()).start()
}

/// Binary invocation pinned to the standard week with no cooldown.
pub fn weekly_cmd(server: &MockHelpdesk) -> assert_cmd::Command {
  let mut cmd = test_support::cmd_bin(BIN);
  cmd.args([
    "--base-url",
    server.base_url(),
    "--anchor",
    "2025-08-13",
    "--tz",
    "utc",
    "--audit-cooldown-secs",
    "0",
    "--session-cookie",
    "_helpdesk_session=test",
    "--csrf-token",
    "csrf-test",
    "--now-override",
    NOW,
  ]);
  cmd
}

pub fn run_json(cmd: &mut assert_cmd::Command) -> Value {
  let out = cmd.output().unwrap();
  assert!(
    out.status.success(),
    "run failed: {}",
    String::from_utf8_lossy(&out.stderr)
  );
  serde_json::from_slice(&out.stdout).expect("stdout is JSON")
}
