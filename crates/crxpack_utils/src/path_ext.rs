use std::{borrow::Cow, path::Path};

use sugar_path::SugarPath;

pub trait PathExt {
  fn expect_to_slash(&self) -> String;

  /// `/`-prefixed, slash-separated path of `self` relative to `root`. This is the key content
  /// scripts and member modules are looked up by.
  fn root_relative_id(&self, root: &Path) -> String;

  /// File name used to name artifacts derived from this path, e.g. loaders.
  fn representative_file_name(&self) -> Cow<'_, str>;
}

impl PathExt for Path {
  fn expect_to_slash(&self) -> String {
    self
      .to_slash()
      .unwrap_or_else(|| panic!("Failed to convert {:?} to slash str", self.display()))
      .into_owned()
  }

  fn root_relative_id(&self, root: &Path) -> String {
    let normalized = self.normalize();
    let relative = normalized.strip_prefix(root).unwrap_or(&normalized).to_slash_lossy();
    format!("/{}", relative.trim_start_matches("./").trim_start_matches('/'))
  }

  fn representative_file_name(&self) -> Cow<'_, str> {
    self.file_name().map_or_else(|| self.to_string_lossy(), |name| name.to_string_lossy())
  }
}

/// Drops a `?query` or `#hash` suffix from a module id or manifest path.
pub fn strip_query(id: &str) -> &str {
  id.split(['?', '#']).next().unwrap_or(id)
}

#[test]
fn test_root_relative_id() {
  let root = Path::new("/project");
  assert_eq!(Path::new("/project/src/content.ts").root_relative_id(root), "/src/content.ts");
  assert_eq!(Path::new("src/content.ts").root_relative_id(root), "/src/content.ts");
  assert_eq!(Path::new("/src/content.ts").root_relative_id(root), "/src/content.ts");
  assert_eq!(Path::new("/src/lib/../inject.ts").root_relative_id(root), "/src/inject.ts");
}

#[test]
fn test_representative_file_name() {
  let path = Path::new("/project").join("src").join("content.ts");
  assert_eq!(path.representative_file_name(), "content.ts");
}

#[test]
fn test_strip_query() {
  assert_eq!(strip_query("src/popup.html?x=1"), "src/popup.html");
  assert_eq!(strip_query("src/popup.html#top"), "src/popup.html");
  assert_eq!(strip_query("src/content.ts"), "src/content.ts");
}
