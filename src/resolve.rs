// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Resolve organization/user ids to display names through batched show-many lookups
// role: enrichment/resolver
// inputs: HelpdeskClient; raw ids (may repeat, may be non-positive); entity kind; batch size (<= 100)
// outputs: BTreeMap<id, display name>
// side_effects: One GET per batch, sequential
// invariants:
// - Ids are deduplicated in first-seen order and only positive ids are looked up
// - Each request carries at most `batch_size` ids
// - Display name preference: name, then the kind's alternate field, then the raw id
// errors: First failing batch fails the whole resolution; callers treat that as non-fatal
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use std::collections::{BTreeMap, HashSet};

use crate::api::HelpdeskClient;
use crate::error::Result;
use crate::ext::serde_json::JsonFetch;

pub const MAX_SHOW_MANY_IDS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
  Organization,
  User,
}

impl EntityKind {
  /// Path segment of the show-many endpoint, also the key of the reply's array.
  pub fn collection(self) -> &'static str {
    match self {
      EntityKind::Organization => "organizations",
      EntityKind::User => "users",
    }
  }

  fn fallback_field(self) -> Option<&'static str> {
    match self {
      EntityKind::Organization => None,
      EntityKind::User => Some("email"),
    }
  }

  fn label(self) -> &'static str {
    match self {
      EntityKind::Organization => "Organization lookup",
      EntityKind::User => "User lookup",
    }
  }
}

/// Distinct positive ids, first occurrence wins.
pub fn distinct_ids(ids: &[i64]) -> Vec<i64> {
  let mut seen = HashSet::new();
  ids
    .iter()
    .copied()
    .filter(|id| *id > 0 && seen.insert(*id))
    .collect()
}

pub fn resolve_names(
  client: &HelpdeskClient,
  ids: &[i64],
  kind: EntityKind,
  batch_size: usize,
) -> Result<BTreeMap<i64, String>> {
  let unique = distinct_ids(ids);
  let mut names = BTreeMap::new();
  if unique.is_empty() {
    return Ok(names);
  }

  let batch_size = batch_size.clamp(1, MAX_SHOW_MANY_IDS);
  let batches = unique.len().div_ceil(batch_size);

  for (i, chunk) in unique.chunks(batch_size).enumerate() {
    let context = format!("{} batch {}/{}", kind.label(), i + 1, batches);
    tracing::debug!(ids = chunk.len(), "{}", context);

    let url = client.endpoints().show_many(kind, chunk);
    let data = client.fetch_json(&url, &context)?;

    for entity in data.fetch(kind.collection()).items() {
      let Some(id) = entity.fetch("id").to_id() else {
        continue;
      };

      let display = entity
        .fetch("name")
        .to_plain_string()
        .filter(|s| !s.is_empty())
        .or_else(|| {
          kind
            .fallback_field()
            .and_then(|f| entity.fetch(f).to_plain_string())
            .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| id.to_string());

      names.insert(id, display);
    }
  }

  tracing::info!(kind = kind.collection(), resolved = names.len(), "names resolved");
  Ok(names)
}
