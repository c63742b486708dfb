use arcstr::ArcStr;
use crxpack_common::LogicalId;
use crxpack_error::{BuildResult, CrxError};
use dashmap::DashSet;
use memchr::memmem;
use string_wizard::MagicString;

const MARKER_PREFIX: &str = "%SCRIPT_REF:";
const MARKER_SUFFIX: u8 = b'%';

/// Markers handed out to generated code, standing in for output paths that are only known once
/// the whole bundle is named.
#[derive(Debug, Default)]
pub struct PlaceholderLedger {
  issued: DashSet<LogicalId>,
}

impl PlaceholderLedger {
  pub fn marker(logical_id: &LogicalId) -> String {
    format!("{MARKER_PREFIX}{logical_id}%")
  }

  pub fn issue(&self, logical_id: &LogicalId) -> String {
    self.issued.insert(logical_id.clone());
    Self::marker(logical_id)
  }

  pub fn is_issued(&self, logical_id: &LogicalId) -> bool {
    self.issued.contains(logical_id)
  }

  /// Replaces every issued marker in `code` with `/<path>`. Marker-like text that was never
  /// issued is left alone. Returns `None` when nothing was replaced.
  pub fn substitute(
    &self,
    chunk: &str,
    code: &str,
    resolve: impl Fn(&LogicalId) -> Option<ArcStr>,
  ) -> BuildResult<Option<String>> {
    let bytes = code.as_bytes();
    let mut magic_string: Option<MagicString> = None;

    for start in memmem::find_iter(bytes, MARKER_PREFIX) {
      let id_start = start + MARKER_PREFIX.len();
      let Some(id_len) = memchr::memchr(MARKER_SUFFIX, &bytes[id_start..]) else {
        continue;
      };
      let end = id_start + id_len + 1;
      let raw_id = &code[id_start..id_start + id_len];
      let logical_id = LogicalId::from_raw(raw_id);
      if !self.is_issued(&logical_id) {
        continue;
      }

      let path = resolve(&logical_id)
        .ok_or_else(|| CrxError::dangling_placeholder(chunk, logical_id.as_str()))?;
      magic_string.get_or_insert_with(|| MagicString::new(code)).update(
        start,
        end,
        format!("/{path}"),
      );
    }

    Ok(magic_string.map(|s| s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn substitutes_issued_markers_by_offset() {
    let ledger = PlaceholderLedger::default();
    let id = LogicalId::from_raw("AbCd1234");
    let marker = ledger.issue(&id);
    let code = format!("const a = \"{marker}\";\nconst b = \"{marker}\";");

    let output = ledger
      .substitute("assets/content.js", &code, |_| Some(ArcStr::from("assets/inject.js")))
      .unwrap()
      .unwrap();
    assert_eq!(output, "const a = \"/assets/inject.js\";\nconst b = \"/assets/inject.js\";");
  }

  #[test]
  fn leaves_unissued_marker_like_text() {
    let ledger = PlaceholderLedger::default();
    let code = "const s = \"%SCRIPT_REF:notissued%\"; const t = \"100%\";";
    let output = ledger.substitute("a.js", code, |_| None).unwrap();
    assert_eq!(output, None);
  }

  #[test]
  fn unresolved_marker_is_an_error() {
    let ledger = PlaceholderLedger::default();
    let marker = ledger.issue(&LogicalId::from_raw("AbCd1234"));
    let err = ledger.substitute("assets/content.js", &marker, |_| None).unwrap_err();
    let err = err.find_crx_error().unwrap();
    assert_eq!(err.code(), "DANGLING_PLACEHOLDER");
    assert!(err.to_string().contains("assets/content.js"));
  }
}
