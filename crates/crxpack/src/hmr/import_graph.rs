use std::{collections::VecDeque, fmt::Debug};

use arcstr::ArcStr;
use crxpack_common::{ModuleId, OutputBundle};
use rustc_hash::{FxHashMap, FxHashSet};

/// Module-level import relations of the dev server's module graph.
pub trait ImportGraph: Debug + Send + Sync {
  /// Modules that import `id` directly.
  fn importers(&self, id: &ModuleId) -> Vec<ModuleId>;
}

#[derive(Debug, Default, Clone)]
pub struct StaticImportGraph {
  importers: FxHashMap<ModuleId, FxHashSet<ModuleId>>,
}

impl StaticImportGraph {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn add_import(&mut self, importer: impl Into<ModuleId>, imported: impl Into<ModuleId>) {
    self.importers.entry(imported.into()).or_default().insert(importer.into());
  }

  /// Approximates module relations from a generated bundle: a chunk's facade imports every other
  /// member of the chunk and the facades of the chunks it imports.
  pub fn from_bundle(bundle: &OutputBundle) -> Self {
    let mut graph = Self::new();
    for chunk in bundle.chunks() {
      let Some(facade) = chunk.facade_module_id.as_ref().or_else(|| chunk.modules.last()) else {
        continue;
      };
      for module in chunk.modules.iter().filter(|module| *module != facade) {
        graph.add_import(facade.clone(), module.clone());
      }
      for imported in chunk.imports.iter().chain(&chunk.dynamic_imports) {
        let Some(imported) = bundle.chunk(imported) else { continue };
        for module in &imported.modules {
          graph.add_import(facade.clone(), module.clone());
        }
      }
    }
    graph
  }
}

impl ImportGraph for StaticImportGraph {
  fn importers(&self, id: &ModuleId) -> Vec<ModuleId> {
    self.importers.get(id).map(|importers| importers.iter().cloned().collect()).unwrap_or_default()
  }
}

/// What the last generated bundle says about its modules: the file each module was rendered
/// into, and the import relations between them.
#[derive(Debug, Default)]
pub struct BundleModules {
  files: FxHashMap<ModuleId, ArcStr>,
  graph: StaticImportGraph,
}

impl BundleModules {
  pub fn from_bundle(bundle: &OutputBundle) -> Self {
    let mut files = FxHashMap::default();
    for chunk in bundle.chunks() {
      for module in &chunk.modules {
        files.entry(module.clone()).or_insert_with(|| chunk.filename.clone());
      }
    }
    Self { files, graph: StaticImportGraph::from_bundle(bundle) }
  }

  /// Package file the module `id` was rendered into.
  pub fn file_name(&self, id: &ModuleId) -> Option<&ArcStr> {
    self.files.get(id)
  }

  pub fn graph(&self) -> &StaticImportGraph {
    &self.graph
  }
}

/// Whether `root` is `changed` or imports it, directly or transitively.
pub fn is_importer(graph: &dyn ImportGraph, root: &ModuleId, changed: &ModuleId) -> bool {
  let mut seen = FxHashSet::default();
  let mut queue = VecDeque::from([changed.clone()]);
  while let Some(id) = queue.pop_front() {
    if &id == root {
      return true;
    }
    if seen.insert(id.clone()) {
      queue.extend(graph.importers(&id));
    }
  }
  false
}

#[cfg(test)]
mod tests {
  use crxpack_common::OutputChunk;

  use super::*;

  #[test]
  fn walks_importers_transitively() {
    let mut graph = StaticImportGraph::new();
    graph.add_import("/src/background.ts", "/src/api.ts");
    graph.add_import("/src/api.ts", "/src/util.ts");
    graph.add_import("/src/content.ts", "/src/dom.ts");
    graph.add_import("/src/util.ts", "/src/api.ts");

    let background = ModuleId::from("/src/background.ts");
    assert!(is_importer(&graph, &background, &"/src/util.ts".into()));
    assert!(is_importer(&graph, &background, &background));
    assert!(!is_importer(&graph, &background, &"/src/dom.ts".into()));
  }

  #[test]
  fn bundle_relations_follow_members_and_imported_chunks() {
    let mut bundle = OutputBundle::new();
    bundle.insert(OutputChunk {
      filename: "assets/content.js".into(),
      facade_module_id: Some("/src/content.ts".into()),
      imports: vec!["assets/shared.js".into()],
      modules: vec!["/src/dom.ts".into(), "/src/content.ts".into()],
      ..Default::default()
    });
    bundle.insert(OutputChunk {
      filename: "assets/shared.js".into(),
      modules: vec!["/src/shared.ts".into()],
      ..Default::default()
    });

    let modules = BundleModules::from_bundle(&bundle);
    let content = ModuleId::from("/src/content.ts");
    assert!(is_importer(modules.graph(), &content, &"/src/dom.ts".into()));
    assert!(is_importer(modules.graph(), &content, &"/src/shared.ts".into()));
    assert!(!is_importer(modules.graph(), &"/src/shared.ts".into(), &content));
    assert_eq!(modules.file_name(&"/src/dom.ts".into()).map(ArcStr::as_str), Some("assets/content.js"));
    assert_eq!(modules.file_name(&"/src/missing.ts".into()), None);
  }
}
