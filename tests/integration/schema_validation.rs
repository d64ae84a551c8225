use jsonschema::validator_for;

use crate::helpdesk::{run_json, weekly_cmd, weekly_routes, weekly_server};

fn compile_schema(name: &str) -> jsonschema::Validator {
  let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("schemas")
    .join(name);
  let data = std::fs::read(&path).expect("schema file");
  let schema: serde_json::Value = serde_json::from_slice(&data).expect("valid schema JSON");
  validator_for(&schema).expect("compile schema")
}

#[test]
fn resolved_snapshot_conforms_to_schema() {
  let server = weekly_server();
  let v = run_json(&mut weekly_cmd(&server));

  let compiled = compile_schema("weekly-report.snapshot.schema.json");
  if let Err(e) = compiled.validate(&v) {
    panic!("schema validation failed: {e}");
  }
}

#[test]
fn enrichment_failed_snapshot_conforms_to_schema() {
  let server = weekly_routes()
    .status("/api/v2/users/show_many.json", None, 500, "{}")
    .status("/api/v2/organizations/show_many.json", None, 500, "{}")
    .start();
  let v = run_json(&mut weekly_cmd(&server));

  assert_eq!(v["enrichment"]["status"], "failed");
  let compiled = compile_schema("weekly-report.snapshot.schema.json");
  assert!(compiled.is_valid(&v));
}
