use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod api;
mod audit;
mod cancel;
mod cli;
mod error;
mod ext;
mod http;
mod model;
mod render;
mod report;
mod resolve;
mod search;
mod util;
mod window;

use crate::api::{Endpoints, HelpdeskClient};
use crate::audit::AuditOptions;
use crate::cancel::CancelToken;
use crate::cli::{Cli, OutputFormat, normalize};
use crate::http::{UreqTransport, discover_credentials};
use crate::report::{ReportRun, RunParams, RunState};
use crate::window::{WindowZone, compute_week_window, parse_anchor, parse_now_override};

fn main() -> Result<()> {
  let cli = Cli::parse();

  if cli.gen_man {
    let page = util::render_man_page::<Cli>()?;
    print!("{}", page);
    return Ok(());
  }

  util::init_tracing();

  // Phase 1: normalize CLI
  let cfg = normalize(cli)?;
  tracing::debug!(config = ?cfg, "effective configuration");

  // Phase 2: resolve now, anchor and week window
  let now = util::effective_now(parse_now_override(cfg.now_override.as_deref()));
  let zone = WindowZone::parse(&cfg.tz)?;
  let anchor = parse_anchor(cfg.anchor.as_deref(), now, &zone)?;
  let window = compute_week_window(anchor, cfg.week_start, &zone)?;
  tracing::info!(
    anchor = %anchor,
    start = %window.start_of_week_date,
    start_iso = %window.start_of_week_iso,
    "week window"
  );

  // Phase 3: build the client
  let credentials = discover_credentials(cfg.session_cookie.clone(), cfg.csrf_token.clone());
  if credentials.cookie.is_none() {
    tracing::warn!("no session cookie configured; requests are likely to be rejected");
  }
  let transport = UreqTransport::new(credentials, cfg.http_timeout_secs.map(Duration::from_secs));
  let cancel = CancelToken::new();
  let client = HelpdeskClient::new(Box::new(transport), Endpoints::new(&cfg.base_url)?)
    .strict_json(cfg.strict_json)
    .with_cancel(cancel.clone());

  if let Some(secs) = cfg.max_runtime_secs {
    // Detached: the process exits when the run ends, deadline or not.
    let _ = cancel.cancel_after(Duration::from_secs(secs));
  }

  // Phase 4: run the report
  let params = RunParams {
    assignee_input: cfg.assignee_input.clone(),
    week_start: cfg.week_start,
    anchor,
    window,
    timezone: zone.label(),
    sort: cfg.sort.clone(),
    audit: AuditOptions {
      max_tickets: cfg.max_audits,
      batch_size: cfg.audit_batch_size,
      cooldown: Duration::from_secs(cfg.audit_cooldown_secs),
    },
    enrich_batch_size: cfg.enrich_batch_size,
    generated_at: util::iso_millis_utc(now),
  };
  let mut run = ReportRun::new(&client, params);
  let snapshot = match run.execute() {
    Ok(snapshot) => snapshot,
    Err(e) => {
      let stage = match run.state() {
        RunState::Failed { stage, .. } => stage.as_str(),
        _ => "starting",
      };
      return Err(anyhow::Error::new(e).context(format!("weekly report run failed while {}", stage)));
    }
  };

  // Phase 5: render and write
  let content = match cfg.format {
    OutputFormat::Json => serde_json::to_string_pretty(&snapshot)?,
    OutputFormat::Draft => render::build_draft(&snapshot),
    OutputFormat::Blocks => render::text_blocks(&snapshot)?,
  };
  util::write_output(&cfg.out, &content)
}
