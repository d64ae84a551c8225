use crate::helpdesk::BIN;

#[test]
fn cli_generates_man_page() {
  let out = test_support::cmd_bin(BIN).args(["--gen-man"]).output().unwrap();
  assert!(out.status.success());
  let s = String::from_utf8_lossy(&out.stdout);
  // clap_mangen emits a roff manpage starting with .TH; roff escapes hyphens as \-
  assert!(s.contains(".TH"));
  let plain = s.replace("\\-", "-");
  assert!(plain.contains("zd-weekly-report"));
  assert!(plain.contains("--base-url"));
  assert!(plain.contains("--max-audits"));
}

#[test]
fn gen_man_needs_no_base_url() {
  test_support::cmd_bin(BIN).arg("--gen-man").assert().success();
}
