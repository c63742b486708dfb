use arcstr::ArcStr;
use crxpack_utils::xxhash::short_hash;

use crate::{ModuleId, ScriptKind};

/// Stable identity of a dynamic script: a short hash of its kind and resolved module id.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone)]
pub struct LogicalId(ArcStr);

impl LogicalId {
  pub const LEN: usize = 8;

  pub fn from_script(kind: ScriptKind, id: &ModuleId) -> Self {
    Self(short_hash(&format!("{kind}&{id}"), Self::LEN).into())
  }

  /// Wraps an id read back from generated code or a virtual module id.
  pub fn from_raw(raw: impl Into<ArcStr>) -> Self {
    Self(raw.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for LogicalId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

#[test]
fn test_logical_id_is_deterministic() {
  let id = ModuleId::from("/src/inject.ts");
  let a = LogicalId::from_script(ScriptKind::Script, &id);
  assert_eq!(a, LogicalId::from_script(ScriptKind::Script, &id));
  assert_ne!(a, LogicalId::from_script(ScriptKind::Module, &id));
  assert_eq!(a.as_str().len(), LogicalId::LEN);
}
