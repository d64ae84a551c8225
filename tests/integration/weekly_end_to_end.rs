use crate::helpdesk::{run_json, weekly_cmd, weekly_server};

#[test]
fn weekly_snapshot_matches_mock_helpdesk() {
  let server = weekly_server();
  let v = run_json(&mut weekly_cmd(&server));

  let meta = &v["meta"];
  assert_eq!(meta["current_user_id"], 555);
  assert_eq!(meta["assignee"], "me");
  assert!(meta["assignee_input"].is_null());
  assert_eq!(meta["week_starts_on"], "Monday");
  assert_eq!(meta["week_starts_on_index"], 1);
  assert_eq!(meta["anchor_date"], "2025-08-13");
  assert_eq!(meta["start_of_week_date"], "2025-08-11");
  assert_eq!(meta["start_of_week_iso"], "2025-08-11T00:00:00.000Z");
  assert_eq!(meta["generated_at"], "2025-08-15T12:00:00.000Z");
  assert_eq!(meta["base_url"], server.base_url());

  assert_eq!(v["taken"]["total"], 3);
  assert_eq!(v["solved"]["total"], 2);
  assert_eq!(v["open"]["total"], 1);
  assert_eq!(v["carried_over"]["total"], 0);
  assert_eq!(
    v["taken"]["query"],
    "type:ticket assignee:me created>=2025-08-11"
  );
  assert_eq!(
    v["carried_over"]["query"],
    "type:ticket assignee:me status<solved created<2025-08-11"
  );

  let tk = &v["takeovers"];
  assert_eq!(tk["total_unique_tickets"], 1);
  assert_eq!(tk["total_takeover_events"], 1);
  assert_eq!(tk["total"], 1);
  assert_eq!(tk["candidate_total"], 3);
  assert_eq!(tk["candidate_audited"], 3);
  assert_eq!(tk["ticket_rows"][0]["ticket_id"], 1001);
  assert_eq!(tk["ticket_rows"][0]["previous_assignee_id"], "200");
  assert_eq!(tk["ticket_rows"][0]["new_assignee_id"], "555");
  assert_eq!(tk["ticket_rows"][0]["takeover_at"], "2025-08-12T09:30:00Z");

  insta::with_settings!({ sort_maps => true }, {
    insta::assert_json_snapshot!(v["aggregates"], @r###"
    {
      "by_organization": [
        {
          "id": 10,
          "name": "Acme",
          "tickets": 2
        },
        {
          "id": 20,
          "name": "Globex",
          "tickets": 1
        },
        {
          "id": 30,
          "name": "Initech",
          "tickets": 1
        }
      ],
      "by_requester": [
        {
          "id": 100,
          "name": "Ana",
          "tickets": 2
        },
        {
          "id": 101,
          "name": "bo@example.test",
          "tickets": 1
        },
        {
          "id": 102,
          "name": "Cy",
          "tickets": 1
        }
      ],
      "total_distinct_tickets": 4
    }
    "###);
  });
}

#[test]
fn requests_follow_stage_order_and_cursor() {
  let server = weekly_server();
  run_json(&mut weekly_cmd(&server));

  let paths: Vec<String> = server
    .requests()
    .iter()
    .map(|t| t.split('?').next().unwrap_or_default().to_string())
    .collect();

  assert_eq!(paths[0], "/api/v2/users/me.json");
  // four ticket queries (taken has two pages) plus the takeover candidate search
  assert_eq!(server.hits("/api/v2/search.json"), 6);
  assert_eq!(server.hits("/api/v2/tickets/1001/audits.json"), 1);
  assert_eq!(server.hits("/api/v2/tickets/1002/audits.json"), 1);
  assert_eq!(server.hits("/api/v2/tickets/1003/audits.json"), 1);
  assert_eq!(server.hits("/api/v2/organizations/show_many.json"), 1);
  assert_eq!(server.hits("/api/v2/users/show_many.json"), 1);

  let first_audit = paths.iter().position(|p| p.contains("/audits.json")).unwrap();
  let first_lookup = paths.iter().position(|p| p.contains("show_many")).unwrap();
  let last_search = paths.iter().rposition(|p| p == "/api/v2/search.json").unwrap();
  assert!(last_search < first_audit);
  assert!(first_audit < first_lookup);
}

#[test]
fn numeric_assignee_skips_identity_lookup() {
  let server = weekly_server();
  let v = run_json(weekly_cmd(&server).args(["--assignee", "555"]));

  assert_eq!(v["meta"]["current_user_id"], 555);
  assert_eq!(v["meta"]["assignee"], "555");
  assert_eq!(v["meta"]["assignee_input"], "555");
  assert_eq!(server.hits("/api/v2/users/me.json"), 0);
}

#[test]
fn named_assignee_resolves_through_user_search() {
  let server = weekly_server();
  let v = run_json(weekly_cmd(&server).args(["--assignee", "jane"]));

  assert_eq!(v["meta"]["current_user_id"], 4242);
  assert_eq!(v["taken"]["query"], "type:ticket assignee:jane created>=2025-08-11");
  // audits show 200 -> 555, which is not a takeover by 4242
  assert_eq!(v["takeovers"]["total_takeover_events"], 0);
}

#[test]
fn audit_cap_limits_scanned_candidates() {
  let server = weekly_server();
  let v = run_json(weekly_cmd(&server).args(["--max-audits", "1"]));

  assert_eq!(v["takeovers"]["candidate_total"], 3);
  assert_eq!(v["takeovers"]["candidate_audited"], 1);
  assert_eq!(server.hits("/api/v2/tickets/1002/audits.json"), 0);
}

#[test]
fn zero_second_cooldown_still_counts_pauses() {
  let server = weekly_server();
  let v = run_json(weekly_cmd(&server).args(["--audit-batch-size", "1"]));

  assert_eq!(v["takeovers"]["cooldown_pauses"], 2);
  assert_eq!(v["meta"]["audit_batch_size"], 1);
  assert_eq!(v["meta"]["audit_cooldown_secs"], 0);
}
