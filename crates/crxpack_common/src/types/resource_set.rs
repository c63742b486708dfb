use arcstr::ArcStr;
use crxpack_utils::indexmap::FxIndexSet;

/// Files a root needs at runtime, accumulated while walking the bundle graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
  pub assets: FxIndexSet<ArcStr>,
  pub css: FxIndexSet<ArcStr>,
  pub imports: FxIndexSet<ArcStr>,
}

impl ResourceSet {
  pub fn merge(&mut self, other: &ResourceSet) {
    self.assets.extend(other.assets.iter().cloned());
    self.css.extend(other.css.iter().cloned());
    self.imports.extend(other.imports.iter().cloned());
  }

  /// Assets and imports in insertion order. CSS is handled separately by callers.
  pub fn files(&self) -> impl Iterator<Item = &ArcStr> {
    self.assets.iter().chain(self.imports.iter())
  }
}
