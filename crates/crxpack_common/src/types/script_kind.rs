use std::fmt::Display;

use crxpack_utils::file_name::FileNameKind;

/// How a script is loaded by the extension runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
  /// Loaded as an ES module, e.g. from an extension page.
  Module,
  /// Injected into an isolated world through a loader that imports the module at runtime.
  Script,
  /// Injected as a self-contained classic script.
  Iife,
}

impl ScriptKind {
  /// Parses the query of a dynamic script request: `script` or `script&module`.
  pub fn from_query(query: &str) -> Option<Self> {
    let mut params = query.split('&');
    if params.next() != Some("script") {
      return None;
    }
    let mut kind = Self::Script;
    for param in params {
      match param {
        "module" => kind = Self::Module,
        "iife" => kind = Self::Iife,
        _ => {}
      }
    }
    Some(kind)
  }

  pub fn file_name_kind(self) -> FileNameKind {
    match self {
      Self::Module => FileNameKind::Module,
      Self::Script => FileNameKind::Loader,
      Self::Iife => FileNameKind::Iife,
    }
  }
}

impl Display for ScriptKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Module => write!(f, "module"),
      Self::Script => write!(f, "loader"),
      Self::Iife => write!(f, "iife"),
    }
  }
}

#[test]
fn test_from_query() {
  assert_eq!(ScriptKind::from_query("script"), Some(ScriptKind::Script));
  assert_eq!(ScriptKind::from_query("script&module"), Some(ScriptKind::Module));
  assert_eq!(ScriptKind::from_query("script&iife"), Some(ScriptKind::Iife));
  assert_eq!(ScriptKind::from_query("raw"), None);
  assert_eq!(ScriptKind::from_query("url&script"), None);
}
