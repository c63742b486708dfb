use std::path::Path;

use arcstr::ArcStr;
use crxpack_utils::path_ext::{strip_query, PathExt};
use serde::{Deserialize, Serialize};

/// Source-level identity of a module, e.g. `/src/content.ts` or `/src/inject.ts?scriptId=AbC12dEf`.
/// Ids of project files are `/`-prefixed and relative to the project root.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(ArcStr);

impl ModuleId {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  /// The id with any query removed, relative to `root`. Absolute paths outside of `root` are kept.
  pub fn stabilize(&self, root: &Path) -> String {
    Path::new(strip_query(self)).root_relative_id(root)
  }

  pub fn query(&self) -> Option<&str> {
    self.0.split_once('?').map(|(_, query)| query)
  }

  pub fn inner(&self) -> &ArcStr {
    &self.0
  }
}

impl std::ops::Deref for ModuleId {
  type Target = str;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl AsRef<str> for ModuleId {
  fn as_ref(&self) -> &str {
    self
  }
}

impl std::fmt::Display for ModuleId {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}

impl From<ArcStr> for ModuleId {
  fn from(value: ArcStr) -> Self {
    Self::new(value)
  }
}

impl From<&str> for ModuleId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for ModuleId {
  fn from(value: String) -> Self {
    Self::new(value)
  }
}

#[test]
fn test_stabilize() {
  let root = Path::new("/project");
  assert_eq!(ModuleId::from("/project/src/content.ts").stabilize(root), "/src/content.ts");
  assert_eq!(ModuleId::from("/src/inject.ts?scriptId=abc").stabilize(root), "/src/inject.ts");
  assert_eq!(ModuleId::from("/src/inject.ts?scriptId=abc").query(), Some("scriptId=abc"));
}
