use arcstr::ArcStr;
use crxpack_common::{OutputBundle, ResourceSet};
use crxpack_error::{BuildResult, CrxError};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::dynamic_script::DynamicScriptRegistry;

/// Walks the finished bundle graph from a root file and collects every file the root needs at
/// runtime. Traversal is keyed by output file name.
pub struct FileResourceResolver<'a> {
  bundle: &'a OutputBundle,
  scripts: &'a DynamicScriptRegistry,
  resolved: FxHashMap<ArcStr, ResourceSet>,
}

impl<'a> FileResourceResolver<'a> {
  pub fn new(bundle: &'a OutputBundle, scripts: &'a DynamicScriptRegistry) -> Self {
    Self { bundle, scripts, resolved: FxHashMap::default() }
  }

  /// Closure of `file_name`, excluding the file itself. Results are cached per root.
  pub fn resolve(&mut self, file_name: &ArcStr) -> BuildResult<ResourceSet> {
    if let Some(resources) = self.resolved.get(file_name) {
      return Ok(resources.clone());
    }
    let mut resources = ResourceSet::default();
    let mut seen = FxHashSet::default();
    self.visit(file_name, &mut resources, &mut seen)?;
    // A cycle back to the root lists it among its own imports.
    resources.imports.shift_remove(file_name);
    self.resolved.insert(file_name.clone(), resources.clone());
    Ok(resources)
  }

  fn visit(
    &self,
    file_name: &ArcStr,
    resources: &mut ResourceSet,
    seen: &mut FxHashSet<ArcStr>,
  ) -> BuildResult<()> {
    if !seen.insert(file_name.clone()) {
      return Ok(());
    }

    let Some(chunk) = self.bundle.chunk(file_name) else {
      return Ok(());
    };

    for target in chunk.imports.iter().chain(&chunk.dynamic_imports) {
      resources.imports.insert(target.clone());
      self.visit(target, resources, seen)?;
    }

    for module in &chunk.modules {
      if chunk.facade_module_id.as_ref() == Some(module) {
        continue;
      }
      let Some(record) = self.scripts.record_by_module_id(module) else {
        continue;
      };
      let script_file = record
        .file_name
        .ok_or_else(|| CrxError::unresolved_dynamic_script(record.id.to_string()))?;
      resources.imports.insert(script_file.clone());
      self.visit(&script_file, resources, seen)?;
    }

    resources.assets.extend(chunk.imported_assets.iter().cloned());
    resources.css.extend(chunk.imported_css.iter().cloned());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crxpack_common::{CrxOptions, OutputChunk};

  use super::*;
  use crate::{clock::BuildPhaseClock, utils::normalize_options::normalize_options};

  fn chunk(filename: &str, imports: &[&str], dynamic_imports: &[&str]) -> OutputChunk {
    OutputChunk {
      filename: filename.into(),
      imports: imports.iter().map(|&file| file.into()).collect(),
      dynamic_imports: dynamic_imports.iter().map(|&file| file.into()).collect(),
      ..Default::default()
    }
  }

  fn registry() -> DynamicScriptRegistry {
    let options = normalize_options(CrxOptions {
      root: Some("/project".into()),
      ..Default::default()
    })
    .unwrap();
    DynamicScriptRegistry::new(Arc::new(options), BuildPhaseClock::new())
  }

  #[test]
  fn closure_follows_static_and_dynamic_imports() {
    let mut bundle = OutputBundle::new();
    bundle.insert(chunk("a.js", &["b.js"], &["d.js"]));
    bundle.insert(chunk("b.js", &["c.js"], &[]));
    bundle.insert(chunk("c.js", &[], &[]));
    bundle.insert(chunk("d.js", &[], &[]));
    bundle.insert(chunk("unrelated.js", &["c.js"], &[]));

    let scripts = registry();
    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let resources = resolver.resolve(&"a.js".into()).unwrap();
    let mut imports = resources.imports.iter().map(ArcStr::as_str).collect::<Vec<_>>();
    imports.sort_unstable();
    assert_eq!(imports, ["b.js", "c.js", "d.js"]);
  }

  #[test]
  fn cycles_terminate() {
    let mut bundle = OutputBundle::new();
    bundle.insert(chunk("a.js", &["b.js"], &[]));
    bundle.insert(chunk("b.js", &["a.js"], &[]));

    let scripts = registry();
    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let resources = resolver.resolve(&"a.js".into()).unwrap();
    assert_eq!(resources.imports.iter().map(ArcStr::as_str).collect::<Vec<_>>(), ["b.js"]);
  }

  #[test]
  fn side_assets_are_kept_apart_from_css() {
    let mut bundle = OutputBundle::new();
    let mut a = chunk("a.js", &["b.js"], &[]);
    a.imported_css.push("assets/a.css".into());
    let mut b = chunk("b.js", &[], &[]);
    b.imported_assets.push("assets/logo.png".into());
    bundle.insert(a);
    bundle.insert(b);

    let scripts = registry();
    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let resources = resolver.resolve(&"a.js".into()).unwrap();
    assert!(resources.css.contains("assets/a.css"));
    assert!(resources.assets.contains("assets/logo.png"));
    assert!(!resources.assets.contains("assets/a.css"));
  }

  #[test]
  fn unnamed_dynamic_script_member_is_an_error() {
    let scripts = registry();
    let logical_id = scripts.resolve("./inject.ts?script", &"/src/content.ts".into()).unwrap();

    let mut bundle = OutputBundle::new();
    let mut a = chunk("a.js", &[], &[]);
    a.modules.push(scripts.virtual_id(&logical_id).unwrap());
    bundle.insert(a);

    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let err = resolver.resolve(&"a.js".into()).unwrap_err();
    assert_eq!(err.find_crx_error().unwrap().code(), "UNRESOLVED_DYNAMIC_SCRIPT");
  }
}
