// === Module Header (agents-tooling) START ===
// header: Parsed by scripts/check_module_headers.sh for purpose/role presence; keep keys on single-line entries.
// purpose: Dotted-path access into helpdesk JSON payloads with typed extraction and loose string/id coercion
// role: extension/serde_json
// outputs: JsonFetch trait and JsonFetched wrapper (to, to_id, to_plain_string, items)
// invariants: No panics; missing paths yield None; string coercion mirrors how the helpdesk echoes ids (numbers or strings)
// tie_breakers: contracts > orchestration > correctness > performance > minimal_diffs
// === Module Header END ===

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Wrapper around a JSON location to allow typed extraction via a clear second step.
pub struct JsonFetched<'a> {
  inner: Option<&'a Value>,
}

impl<'a> JsonFetched<'a> {
  /// Attempt to deserialize the fetched value as `T`.
  pub fn to<T>(&self) -> Option<T>
  where
    T: DeserializeOwned,
  {
    self.inner.and_then(|v| serde_json::from_value::<T>(v.clone()).ok())
  }

  /// Read an entity id. Accepts JSON integers and all-digit strings; anything else is None.
  pub fn to_id(&self) -> Option<i64> {
    match self.inner? {
      Value::Number(n) => n.as_i64(),
      Value::String(s) => s.trim().parse::<i64>().ok(),
      _ => None,
    }
  }

  /// Render the value the way a loosely-typed client would stringify it.
  ///
  /// Strings come back verbatim, numbers and booleans via their JSON text.
  /// `null`, arrays and objects yield None.
  pub fn to_plain_string(&self) -> Option<String> {
    match self.inner? {
      Value::String(s) => Some(s.clone()),
      Value::Number(n) => Some(n.to_string()),
      Value::Bool(b) => Some(b.to_string()),
      _ => None,
    }
  }

  /// Borrow the elements when the location holds an array; empty otherwise.
  pub fn items(&self) -> &'a [Value] {
    self.inner.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
  }
}

/// Extension to fetch nested values via dotted paths like "user.id".
pub trait JsonFetch {
  fn fetch(&self, path: &str) -> JsonFetched<'_>;
}

impl JsonFetch for Value {
  fn fetch(&self, path: &str) -> JsonFetched<'_> {
    if path.is_empty() {
      return JsonFetched { inner: Some(self) };
    }

    let mut cur = self;

    for key in path.split('.') {
      match cur.get(key) {
        Some(next) => cur = next,
        None => return JsonFetched { inner: None },
      }
    }

    JsonFetched { inner: Some(cur) }
  }
}
