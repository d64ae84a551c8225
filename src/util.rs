// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Utilities for logging setup, "now" handling, output writing, and man page rendering
// role: utilities/helpers
// inputs: RUST_LOG; optional now override; output target; clap CommandFactory
// outputs: Installed tracing subscriber, timestamps, written files, man page text
// side_effects: init_tracing installs a global subscriber; write_output creates parent directories
// invariants:
// - Logs go to stderr so stdout stays machine-readable
// - write_output("-") writes to stdout with a trailing newline
// errors: IO errors bubble with context
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, SecondsFormat, Utc};
use clap::CommandFactory;
use tracing_subscriber::{EnvFilter, fmt};

pub const DEFAULT_LOG_FILTER: &str = "warn,zd_weekly_report=info";

/// Install the global tracing subscriber (stderr, `RUST_LOG` or the default filter).
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
  let _ = fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .try_init();
}

/// Returns the effective "now" given an optional override.
///
/// When `override_now` is `Some`, that instant is returned; otherwise
/// the current local time is used.
pub fn effective_now(override_now: Option<DateTime<Local>>) -> DateTime<Local> {
  override_now.unwrap_or_else(Local::now)
}

/// UTC timestamp with millisecond precision, e.g. `2025-08-15T12:00:00.000Z`.
pub fn iso_millis_utc(dt: DateTime<Local>) -> String {
  dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Write `content` to stdout (`-`) or to a file, creating parent directories.
pub fn write_output(out: &str, content: &str) -> Result<()> {
  if out == "-" {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", content).context("writing to stdout")?;
    return Ok(());
  }

  let path = Path::new(out);
  if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
    std::fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
  }
  std::fs::write(path, format!("{}\n", content)).with_context(|| format!("writing {}", path.display()))?;
  tracing::info!(path = %path.display(), "report written");

  Ok(())
}

/// Render a section-1 man page for a clap `CommandFactory` implementor.
/// Returns the troff content as a UTF-8 string.
pub fn render_man_page<T: CommandFactory>() -> Result<String> {
  let cmd = T::command();
  let man = clap_mangen::Man::new(cmd);
  let mut buf: Vec<u8> = Vec::new();

  man.render(&mut buf)?;

  Ok(String::from_utf8_lossy(&buf).to_string())
}
