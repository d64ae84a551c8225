use anyhow::{Result, bail};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::api::Endpoints;
use crate::search::SearchSort;
use crate::window::{WeekStart, WindowZone};

pub const BASE_URL_ENV: &str = "ZD_BASE_URL";

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum OutputFormat {
  /// Full snapshot as pretty JSON
  Json,
  /// Copy-ready plain-text summary
  Draft,
  /// One titled JSON block per report section
  Blocks,
}

#[derive(Parser, Debug)]
#[command(
    name = "zd-weekly-report",
    version,
    about = "Weekly helpdesk ticket report for one agent (taken, solved, open, carried over, takeovers)",
    long_about = None
)]
pub struct Cli {
  /// Helpdesk root URL, e.g. https://acme.zendesk.com (falls back to ZD_BASE_URL)
  #[arg(long)]
  pub base_url: Option<String>,

  /// Assignee: numeric user id, "me", or free text for a user search (blank = me)
  #[arg(long)]
  pub assignee: Option<String>,

  /// Any date inside the week to report: YYYY-MM-DD or a phrase like "last friday" (default: today)
  #[arg(long)]
  pub anchor: Option<String>,

  /// First day of the week: weekday name or 0-6 (0 = Sunday)
  #[arg(long, value_enum, default_value_t = WeekStart::Monday)]
  pub week_start: WeekStart,

  /// Timezone whose midnight starts the week: local, utc, or an IANA name
  #[arg(long, default_value = "local")]
  pub tz: String,

  /// Cap on candidate tickets whose audits are scanned for takeovers
  #[arg(long, default_value_t = 200)]
  pub max_audits: usize,

  /// Tickets scanned between cooldown pauses
  #[arg(long, default_value_t = 100)]
  pub audit_batch_size: usize,

  /// Cooldown between audit batches, in seconds
  #[arg(long, default_value_t = 30)]
  pub audit_cooldown_secs: u64,

  /// Ids per show-many lookup when resolving names (1-100)
  #[arg(long, default_value_t = 100)]
  pub enrich_batch_size: usize,

  /// Search sort field
  #[arg(long, default_value = "updated_at")]
  pub sort_by: String,

  /// Search sort order (asc or desc)
  #[arg(long, default_value = "desc")]
  pub sort_order: String,

  /// Treat non-JSON response bodies as errors instead of empty pages
  #[arg(long)]
  pub strict_json: bool,

  /// Per-request timeout in seconds (default: transport default)
  #[arg(long)]
  pub http_timeout_secs: Option<u64>,

  /// Cancel the run after this many seconds
  #[arg(long)]
  pub max_runtime_secs: Option<u64>,

  /// Session cookie header value (falls back to ZD_SESSION_COOKIE)
  #[arg(long)]
  pub session_cookie: Option<String>,

  /// CSRF token header value (falls back to ZD_CSRF_TOKEN)
  #[arg(long)]
  pub csrf_token: Option<String>,

  /// Output format
  #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
  pub format: OutputFormat,

  /// Output file path (default stdout "-")
  #[arg(long, default_value = "-")]
  pub out: String,

  /// Emit a troff man page to stdout (internal; for packaging)
  #[arg(long, hide = true)]
  pub gen_man: bool,

  /// Override the "now" instant for anchor parsing and generated_at (hidden; tests only)
  #[arg(long = "now-override", hide = true)]
  pub now_override: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EffectiveConfig {
  pub base_url: String,
  pub assignee_input: Option<String>,
  pub anchor: Option<String>,
  pub week_start: WeekStart,
  pub tz: String,
  pub max_audits: usize,
  pub audit_batch_size: usize,
  pub audit_cooldown_secs: u64,
  pub enrich_batch_size: usize,
  pub sort: SearchSort,
  pub strict_json: bool,
  pub http_timeout_secs: Option<u64>,
  pub max_runtime_secs: Option<u64>,
  pub format: OutputFormat,
  pub out: String,
  pub now_override: Option<String>,
  #[serde(skip)]
  pub session_cookie: Option<String>,
  #[serde(skip)]
  pub csrf_token: Option<String>,
}

fn non_blank(v: Option<String>) -> Option<String> {
  v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

pub fn normalize(cli: Cli) -> Result<EffectiveConfig> {
  let base_url = match non_blank(cli.base_url).or_else(|| non_blank(std::env::var(BASE_URL_ENV).ok())) {
    Some(url) => url,
    None => bail!("Provide --base-url or set {}", BASE_URL_ENV),
  };
  // Must be an absolute http(s) URL.
  let base_url = Endpoints::new(&base_url)?.root().to_string();

  if cli.audit_batch_size == 0 {
    bail!("--audit-batch-size must be at least 1");
  }
  if !(1..=100).contains(&cli.enrich_batch_size) {
    bail!("--enrich-batch-size must be between 1 and 100");
  }

  let sort_order = cli.sort_order.trim().to_lowercase();
  if sort_order != "asc" && sort_order != "desc" {
    bail!("--sort-order must be asc or desc");
  }
  let sort_by = cli.sort_by.trim().to_string();
  if sort_by.is_empty() {
    bail!("--sort-by must not be empty");
  }

  let tz = WindowZone::parse(&cli.tz)?.label();

  Ok(EffectiveConfig {
    base_url,
    assignee_input: non_blank(cli.assignee),
    anchor: non_blank(cli.anchor),
    week_start: cli.week_start,
    tz,
    max_audits: cli.max_audits,
    audit_batch_size: cli.audit_batch_size,
    audit_cooldown_secs: cli.audit_cooldown_secs,
    enrich_batch_size: cli.enrich_batch_size,
    sort: SearchSort {
      by: sort_by,
      order: sort_order,
    },
    strict_json: cli.strict_json,
    http_timeout_secs: cli.http_timeout_secs.filter(|s| *s > 0),
    max_runtime_secs: cli.max_runtime_secs.filter(|s| *s > 0),
    format: cli.format,
    out: cli.out,
    now_override: cli.now_override,
    session_cookie: cli.session_cookie,
    csrf_token: cli.csrf_token,
  })
}
