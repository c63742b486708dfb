use arcstr::ArcStr;

/// Opaque reference to a file emitted into the bundler. Resolved to an output file name once the
/// bundle has been generated.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct FileRef(ArcStr);

impl FileRef {
  pub fn new(value: impl Into<ArcStr>) -> Self {
    Self(value.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl std::fmt::Display for FileRef {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    self.0.fmt(f)
  }
}
