use std::sync::atomic::{AtomicUsize, Ordering};

use arcstr::ArcStr;
use crxpack_common::{ExecutionWorld, FileRef, ModuleId, NormalizedCrxOptions, OutputBundle};
use crxpack_error::{BuildResult, CrxError};
use dashmap::DashMap;
use itertools::Itertools;

use crate::{
  host::{BundleHost, EmittedAsset},
  loader::{content_hmr_port, emit_script_loader, DevClientFiles},
};

#[derive(Debug, Clone)]
pub struct ContentScriptRecord {
  pub id: ModuleId,
  /// Union of the match patterns of every declaration naming this script.
  pub matches: Vec<String>,
  pub world: ExecutionWorld,
  pub compiled_ref: Option<FileRef>,
  pub file_name: Option<ArcStr>,
  pub loader_file_name: Option<ArcStr>,
  seq: usize,
}

impl ContentScriptRecord {
  pub fn public_file_name(&self) -> Option<&ArcStr> {
    self.loader_file_name.as_ref().or(self.file_name.as_ref())
  }

  pub fn is_main_world(&self) -> bool {
    self.world == ExecutionWorld::Main
  }
}

/// Scripts the manifest declares under `content_scripts`, keyed by module id.
#[derive(Debug, Default)]
pub struct ContentScriptTable {
  records: DashMap<ModuleId, ContentScriptRecord>,
  seq: AtomicUsize,
}

impl ContentScriptTable {
  pub fn declare(&self, id: ModuleId, matches: &[String], world: ExecutionWorld) {
    let mut record = self.records.entry(id.clone()).or_insert_with(|| ContentScriptRecord {
      id,
      matches: vec![],
      world,
      compiled_ref: None,
      file_name: None,
      loader_file_name: None,
      seq: self.seq.fetch_add(1, Ordering::Relaxed),
    });
    for pattern in matches {
      if !record.matches.contains(pattern) {
        record.matches.push(pattern.clone());
      }
    }
  }

  pub fn emit(&self, id: &ModuleId, host: &dyn BundleHost) -> BuildResult<FileRef> {
    let mut record =
      self.records.get_mut(id).ok_or_else(|| CrxError::missing_root(&**id, id.to_string()))?;
    if let Some(reference) = &record.compiled_ref {
      return Ok(reference.clone());
    }
    let reference = host.emit_chunk(id)?;
    record.compiled_ref = Some(reference.clone());
    Ok(reference)
  }

  pub fn get(&self, id: &ModuleId) -> Option<ContentScriptRecord> {
    self.records.get(id).map(|record| record.clone())
  }

  /// Records in declaration order.
  pub fn records(&self) -> Vec<ContentScriptRecord> {
    self.records.iter().map(|record| record.clone()).sorted_by_key(|record| record.seq).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Declarations are rebuilt from the manifest on every build.
  pub(crate) fn begin_build(&self) {
    self.records.clear();
  }

  pub(crate) fn assign_file_names(
    &self,
    host: &dyn BundleHost,
    bundle: &OutputBundle,
  ) -> BuildResult<()> {
    for mut record in self.records.iter_mut() {
      let Some(reference) = record.compiled_ref.clone() else {
        continue;
      };
      let file_name = host
        .file_name(&reference)
        .filter(|file_name| bundle.contains(file_name))
        .ok_or_else(|| CrxError::missing_root(&*record.id, reference.as_str()))?;
      record.file_name = Some(file_name);
    }
    Ok(())
  }

  pub(crate) fn attach_loaders(
    &self,
    host: &dyn BundleHost,
    bundle: &mut OutputBundle,
    options: &NormalizedCrxOptions,
  ) -> BuildResult<()> {
    let dev = DevClientFiles::new(options);
    let records = self.records();

    if options.is_serve() && records.iter().any(|record| !record.is_main_world()) {
      let client = content_hmr_port(options.content_hmr_timeout);
      host.emit_asset(bundle, EmittedAsset::fixed(dev.client.as_str(), client))?;
      if let (Some(preamble), Some(code)) = (&dev.preamble, &options.preamble_code) {
        host.emit_asset(bundle, EmittedAsset::fixed(preamble.as_str(), code.as_str()))?;
      }
    }

    for record in records {
      let Some(file_name) = &record.file_name else {
        continue;
      };
      let loader = emit_script_loader(
        host,
        bundle,
        options,
        &dev,
        &record.id,
        file_name,
        record.is_main_world(),
      )?;
      if let Some(mut stored) = self.records.get_mut(&record.id) {
        stored.loader_file_name = loader;
      }
    }
    Ok(())
  }
}

#[test]
fn test_declarations_merge_matches() {
  let table = ContentScriptTable::default();
  let id = ModuleId::from("/src/content.ts");
  table.declare(id.clone(), &["https://a.com/*".to_string()], ExecutionWorld::Isolated);
  table.declare(
    id.clone(),
    &["https://a.com/*".to_string(), "https://b.com/*".to_string()],
    ExecutionWorld::Isolated,
  );
  table.declare("/src/main.ts".into(), &[], ExecutionWorld::Main);

  let records = table.records();
  assert_eq!(records.len(), 2);
  assert_eq!(records[0].matches, ["https://a.com/*", "https://b.com/*"]);
  assert!(records[1].is_main_world());
}
