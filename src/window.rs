use anyhow::{Context, Result, bail};
use chrono::{
  DateTime, Datelike, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset,
  SecondsFormat, TimeZone, Utc, Weekday,
};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use two_timer::{Config as PhraseConfig, parse as parse_natural};

// Week-window types live here to keep the engine free of calendar logic.

#[derive(Copy, Clone, Eq, PartialEq, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[value(rename_all = "lowercase")]
pub enum WeekStart {
  #[value(alias = "0", alias = "sun")]
  Sunday,
  #[value(alias = "1", alias = "mon")]
  Monday,
  #[value(alias = "2", alias = "tue")]
  Tuesday,
  #[value(alias = "3", alias = "wed")]
  Wednesday,
  #[value(alias = "4", alias = "thu")]
  Thursday,
  #[value(alias = "5", alias = "fri")]
  Friday,
  #[value(alias = "6", alias = "sat")]
  Saturday,
}

impl WeekStart {
  pub fn weekday(self) -> Weekday {
    match self {
      WeekStart::Sunday => Weekday::Sun,
      WeekStart::Monday => Weekday::Mon,
      WeekStart::Tuesday => Weekday::Tue,
      WeekStart::Wednesday => Weekday::Wed,
      WeekStart::Thursday => Weekday::Thu,
      WeekStart::Friday => Weekday::Fri,
      WeekStart::Saturday => Weekday::Sat,
    }
  }

  /// Day index with 0 = Sunday.
  pub fn index(self) -> u32 {
    self.weekday().num_days_from_sunday()
  }

  pub fn name(self) -> &'static str {
    match self {
      WeekStart::Sunday => "Sunday",
      WeekStart::Monday => "Monday",
      WeekStart::Tuesday => "Tuesday",
      WeekStart::Wednesday => "Wednesday",
      WeekStart::Thursday => "Thursday",
      WeekStart::Friday => "Friday",
      WeekStart::Saturday => "Saturday",
    }
  }
}

/// Zone whose midnight starts the week: `local`, `utc`, or an IANA name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowZone {
  Local,
  Utc,
  Named(chrono_tz::Tz),
}

impl WindowZone {
  pub fn parse(raw: &str) -> Result<Self> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("local") {
      return Ok(WindowZone::Local);
    }
    if raw.eq_ignore_ascii_case("utc") {
      return Ok(WindowZone::Utc);
    }

    match raw.parse::<chrono_tz::Tz>() {
      Ok(tz) => Ok(WindowZone::Named(tz)),
      Err(_) => bail!("unknown timezone '{}': expected local, utc, or an IANA name", raw),
    }
  }

  pub fn label(&self) -> String {
    match self {
      WindowZone::Local => "local".into(),
      WindowZone::Utc => "UTC".into(),
      WindowZone::Named(tz) => tz.name().to_string(),
    }
  }

  /// Wall-clock reading of `now` in this zone.
  pub fn wall_clock(&self, now: DateTime<Local>) -> NaiveDateTime {
    match self {
      WindowZone::Local => now.naive_local(),
      WindowZone::Utc => now.with_timezone(&Utc).naive_local(),
      WindowZone::Named(tz) => now.with_timezone(tz).naive_local(),
    }
  }

  /// Calendar date of `now` as seen in this zone.
  pub fn today(&self, now: DateTime<Local>) -> NaiveDate {
    self.wall_clock(now).date()
  }

  fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
    match self {
      WindowZone::Local => localize_in(&Local, naive),
      WindowZone::Utc => localize_in(&Utc, naive),
      WindowZone::Named(tz) => localize_in(tz, naive),
    }
  }
}

// Midnight can fall in a DST gap; take the first valid instant after it.
fn localize_in<Z: TimeZone>(tz: &Z, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
  let resolved = match tz.from_local_datetime(&naive) {
    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => Some(dt),
    LocalResult::None => tz.from_local_datetime(&(naive + Duration::hours(1))).earliest(),
  };
  resolved.map(|dt| dt.with_timezone(&dt.offset().fix()))
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WeekWindow {
  pub start_of_week: DateTime<FixedOffset>,
  pub start_of_week_date: String,
  pub start_of_week_iso: String,
}

/// The most recent `start` weekday on or before `anchor`.
pub fn week_start(anchor: NaiveDate, start: Weekday) -> NaiveDate {
  let diff = (anchor.weekday().num_days_from_sunday() + 7 - start.num_days_from_sunday()) % 7;
  anchor - Duration::days(i64::from(diff))
}

pub fn compute_week_window(anchor: NaiveDate, start: WeekStart, zone: &WindowZone) -> Result<WeekWindow> {
  let first_day = week_start(anchor, start.weekday());
  let midnight = first_day.and_time(NaiveTime::MIN);
  let start_of_week = zone
    .localize(midnight)
    .with_context(|| format!("no valid local time for {} in {}", first_day, zone.label()))?;

  Ok(WeekWindow {
    start_of_week,
    start_of_week_date: first_day.format("%Y-%m-%d").to_string(),
    start_of_week_iso: start_of_week
      .with_timezone(&Utc)
      .to_rfc3339_opts(SecondsFormat::Millis, true),
  })
}

/// Resolve `--anchor`: blank means today, `YYYY-MM-DD` is taken literally, anything else goes through
/// the natural-language parser (e.g. "last friday", "2 weeks ago").
pub fn parse_anchor(raw: Option<&str>, now: DateTime<Local>, zone: &WindowZone) -> Result<NaiveDate> {
  let phrase = raw.map(str::trim).unwrap_or_default();
  if phrase.is_empty() {
    return Ok(zone.today(now));
  }

  if let Ok(date) = NaiveDate::parse_from_str(phrase, "%Y-%m-%d") {
    return Ok(date);
  }

  // Phrases are relative to the zone's wall clock, like a blank anchor.
  let config = PhraseConfig::new().now(zone.wall_clock(now));
  match parse_natural(&phrase.to_lowercase(), Some(config)) {
    Ok((start, _end, _)) => Ok(start.date()),
    Err(e) => bail!("invalid --anchor '{}': expected YYYY-MM-DD or a date phrase ({:?})", phrase, e),
  }
}

/// Parse a `--now-override` string into a local DateTime.
/// Accepts RFC3339 (e.g. 2025-08-15T12:00:00Z) or a naive local timestamp
/// formatted as `%Y-%m-%dT%H:%M:%S`.
pub fn parse_now_override(s: Option<&str>) -> Option<DateTime<Local>> {
  s.and_then(|raw| {
    DateTime::parse_from_rfc3339(raw)
      .ok()
      .map(|dt| dt.with_timezone(&Local))
      .or_else(|| {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
          .ok()
          .and_then(|ndt| ndt.and_local_timezone(Local).single())
      })
  })
}
