use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::ModuleId;

/// A code unit of the finished bundle graph.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputChunk {
  pub filename: ArcStr,
  #[serde(default)]
  pub code: String,
  /// Module the chunk was emitted for, if it is a root.
  #[serde(default)]
  pub facade_module_id: Option<ModuleId>,
  #[serde(default)]
  pub is_entry: bool,
  /// File names of statically imported chunks.
  #[serde(default)]
  pub imports: Vec<ArcStr>,
  #[serde(default)]
  pub dynamic_imports: Vec<ArcStr>,
  #[serde(default)]
  pub exports: Vec<String>,
  /// Member modules rendered into this chunk, in execution order.
  #[serde(default)]
  pub modules: Vec<ModuleId>,
  /// Static assets imported by the member modules.
  #[serde(default)]
  pub imported_assets: Vec<ArcStr>,
  #[serde(default)]
  pub imported_css: Vec<ArcStr>,
}

impl OutputChunk {
  /// Chunks without any import or export run as a single self-contained script.
  pub fn is_self_contained(&self) -> bool {
    self.imports.is_empty() && self.dynamic_imports.is_empty() && self.exports.is_empty()
  }
}
