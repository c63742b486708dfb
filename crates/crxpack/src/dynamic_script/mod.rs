mod placeholder;
mod record;

use std::{
  fmt::Debug,
  path::{Path, PathBuf},
  sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
  },
};

use arcstr::ArcStr;
use crxpack_common::{BuildMode, FileRef, LogicalId, ModuleId, OutputBundle, ScriptKind};
use crxpack_error::{BuildResult, CrxError};
use crxpack_utils::{
  file_name::get_file_name,
  path_ext::{strip_query, PathExt},
};
use dashmap::DashMap;
use futures::{
  future::{BoxFuture, Shared},
  FutureExt,
};
use rayon::iter::{IntoParallelRefMutIterator, ParallelIterator};
use rustc_hash::FxHashSet;

pub use self::{
  placeholder::PlaceholderLedger,
  record::{parse_virtual_id, DynamicScriptRecord, SCRIPT_ID_QUERY},
};
use crate::{
  clock::{BuildPhase, BuildPhaseClock, Tick},
  host::BundleHost,
  loader::{emit_script_loader, DevClientFiles},
  SharedOptions,
};

type SharedTick = Shared<BoxFuture<'static, Tick>>;

/// Scripts requested at runtime through `import x from './script.ts?script'`. Each gets a stable
/// logical id at resolution and a file name once the bundle has been generated.
#[derive(Clone)]
pub struct DynamicScriptRegistry {
  inner: Arc<RegistryInner>,
}

struct RegistryInner {
  options: SharedOptions,
  clock: BuildPhaseClock,
  records: DashMap<LogicalId, DynamicScriptRecord>,
  by_virtual_id: DashMap<ModuleId, LogicalId>,
  placeholders: PlaceholderLedger,
  waiters: DashMap<(LogicalId, u64), SharedTick>,
  seq: AtomicUsize,
}

impl Debug for DynamicScriptRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("DynamicScriptRegistry")
      .field("records", &self.inner.records.len())
      .field("waiters", &self.inner.waiters.len())
      .finish_non_exhaustive()
  }
}

impl DynamicScriptRegistry {
  pub fn new(options: SharedOptions, clock: BuildPhaseClock) -> Self {
    Self {
      inner: Arc::new(RegistryInner {
        options,
        clock,
        records: DashMap::default(),
        by_virtual_id: DashMap::default(),
        placeholders: PlaceholderLedger::default(),
        waiters: DashMap::default(),
        seq: AtomicUsize::new(0),
      }),
    }
  }

  pub fn is_script_request(specifier: &str) -> bool {
    specifier.split_once('?').is_some_and(|(_, query)| ScriptKind::from_query(query).is_some())
  }

  /// Registers the script `specifier` points at and returns its logical id. Equivalent requests
  /// yield the same id regardless of the importer they come from.
  pub fn resolve(&self, specifier: &str, importer: &ModuleId) -> BuildResult<LogicalId> {
    let unresolved = || CrxError::unresolved_script_import(specifier, &**importer);
    let (path, query) = specifier.split_once('?').ok_or_else(unresolved)?;
    let kind = ScriptKind::from_query(query).ok_or_else(unresolved)?;

    let resolved = if path.starts_with("./") || path.starts_with("../") {
      let importer_dir = Path::new(strip_query(importer)).parent().unwrap_or(Path::new("/"));
      importer_dir.join(path)
    } else if path.starts_with('/') {
      PathBuf::from(path)
    } else {
      return Err(unresolved().into());
    };

    let id = ModuleId::new(resolved.root_relative_id(&self.inner.options.root));
    let logical_id = LogicalId::from_script(kind, &id);

    let virtual_id = self
      .inner
      .records
      .entry(logical_id.clone())
      .or_insert_with(|| {
        tracing::debug!(%logical_id, %id, %kind, "registered dynamic script");
        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        DynamicScriptRecord::new(logical_id.clone(), kind, id, seq)
      })
      .virtual_id();
    self.inner.by_virtual_id.insert(virtual_id, logical_id.clone());

    Ok(logical_id)
  }

  pub fn record(&self, logical_id: &LogicalId) -> Option<DynamicScriptRecord> {
    self.inner.records.get(logical_id).map(|record| record.clone())
  }

  /// Record backing a member module of a chunk, looked up by its virtual module id.
  pub fn record_by_module_id(&self, id: &ModuleId) -> Option<DynamicScriptRecord> {
    let logical_id = self.inner.by_virtual_id.get(id)?.clone();
    self.record(&logical_id)
  }

  /// Records in registration order.
  pub fn records(&self) -> Vec<DynamicScriptRecord> {
    let mut records =
      self.inner.records.iter().map(|record| record.clone()).collect::<Vec<_>>();
    records.sort_by_key(|record| record.seq);
    records
  }

  pub fn virtual_id(&self, logical_id: &LogicalId) -> BuildResult<ModuleId> {
    self
      .record(logical_id)
      .map(|record| record.virtual_id())
      .ok_or_else(|| CrxError::unknown_dynamic_script(logical_id.as_str()).into())
  }

  /// Code of a virtual module. In production the default export is a placeholder substituted
  /// once the bundle is named; in development the deterministic dev file name is inlined.
  pub fn load(&self, id: &ModuleId) -> BuildResult<Option<String>> {
    let Some(logical_id) = parse_virtual_id(id) else {
      return Ok(None);
    };
    let record = self
      .record(&logical_id)
      .ok_or_else(|| CrxError::unknown_dynamic_script(logical_id.as_str()))?;

    let path = match self.inner.options.mode {
      BuildMode::Build => self.inner.placeholders.issue(&logical_id),
      BuildMode::Serve => format!("/{}", get_file_name(&record.id, record.kind.file_name_kind())),
    };
    let path = serde_json::to_string(&path).map_err(CrxError::json)?;
    Ok(Some(format!("export default {path};\n")))
  }

  /// Asks the bundler to compile the script as an additional root. Only the first call per build
  /// reaches the bundler.
  pub fn emit(&self, logical_id: &LogicalId, host: &dyn BundleHost) -> BuildResult<FileRef> {
    let mut record = self
      .inner
      .records
      .get_mut(logical_id)
      .ok_or_else(|| CrxError::unknown_dynamic_script(logical_id.as_str()))?;
    if let Some(reference) = &record.compiled_ref {
      return Ok(reference.clone());
    }
    let reference = host.emit_chunk(&record.id)?;
    tracing::trace!(%logical_id, %reference, "emitted dynamic script");
    record.compiled_ref = Some(reference.clone());
    Ok(reference)
  }

  /// Emits every record registered since the last build, e.g. by a request that arrived after
  /// the previous bundle was generated.
  pub(crate) fn emit_pending(&self, host: &dyn BundleHost) -> BuildResult<usize> {
    let pending = self
      .records()
      .into_iter()
      .filter(|record| record.compiled_ref.is_none())
      .map(|record| record.logical_id)
      .collect::<Vec<_>>();
    for logical_id in &pending {
      self.emit(logical_id, host)?;
    }
    if !pending.is_empty() {
      tracing::debug!(count = pending.len(), "emitted pending dynamic scripts");
    }
    Ok(pending.len())
  }

  /// Drops scripts no longer imported by the last bundle and clears per-build outputs. Scripts
  /// registered after the last bundle was generated are kept for the upcoming one.
  pub(crate) fn begin_build(&self) {
    self.inner.records.retain(|logical_id, record| {
      let stale = record.compiled_ref.is_some() && !record.reachable;
      if stale {
        tracing::debug!(%logical_id, id = %record.id, "dropped unreachable dynamic script");
      }
      !stale
    });
    self.inner.by_virtual_id.retain(|_, logical_id| self.inner.records.contains_key(logical_id));
    self.inner.records.iter_mut().for_each(|mut record| record.reset_outputs());
  }

  pub(crate) fn assign_file_names(
    &self,
    host: &dyn BundleHost,
    bundle: &OutputBundle,
  ) -> BuildResult<()> {
    let members = bundle.chunks().flat_map(|chunk| chunk.modules.iter()).collect::<FxHashSet<_>>();
    for mut record in self.inner.records.iter_mut() {
      record.reachable = members.contains(&record.virtual_id());
      let Some(reference) = record.compiled_ref.clone() else {
        continue;
      };
      let file_name = host
        .file_name(&reference)
        .filter(|file_name| bundle.contains(file_name))
        .ok_or_else(|| CrxError::unresolved_dynamic_script(record.id.to_string()))?;
      record.file_name = Some(file_name);
    }
    Ok(())
  }

  /// Emits a loader for every `script` kind record, or wraps the script in place when it does not
  /// need one.
  pub(crate) fn emit_loaders(
    &self,
    host: &dyn BundleHost,
    bundle: &mut OutputBundle,
  ) -> BuildResult<()> {
    let options = &self.inner.options;
    let dev = DevClientFiles::new(options);
    for record in self.records() {
      if record.kind != ScriptKind::Script || record.loader_file_name.is_some() {
        continue;
      }
      let Some(file_name) = &record.file_name else {
        continue;
      };
      let loader = emit_script_loader(host, bundle, options, &dev, &record.id, file_name, false)?;
      if let Some(mut stored) = self.inner.records.get_mut(&record.logical_id) {
        stored.loader_file_name = loader;
      }
    }
    Ok(())
  }

  /// Rewrites every issued placeholder in the bundle to the path of the script it stands for.
  pub(crate) fn substitute_placeholders(&self, bundle: &mut OutputBundle) -> BuildResult<()> {
    let mut chunks = bundle.chunks_mut().collect::<Vec<_>>();
    chunks.par_iter_mut().try_for_each(|chunk| -> BuildResult<()> {
      let substituted = self.inner.placeholders.substitute(&chunk.filename, &chunk.code, |id| {
        self.record(id)?.public_file_name().cloned()
      })?;
      if let Some(code) = substituted {
        chunk.code = code;
      }
      Ok(())
    })
  }

  fn try_finalize(&self, logical_id: &LogicalId) -> BuildResult<Option<ArcStr>> {
    let record = self
      .inner
      .records
      .get(logical_id)
      .ok_or_else(|| CrxError::unknown_dynamic_script(logical_id.as_str()))?;
    Ok(record.public_file_name().cloned())
  }

  /// Output file name of the script. Only valid once the bundle has been named.
  pub fn finalize(&self, logical_id: &LogicalId) -> BuildResult<ArcStr> {
    self
      .try_finalize(logical_id)?
      .ok_or_else(|| CrxError::dynamic_script_not_ready(logical_id.as_str()).into())
  }

  /// Like [Self::finalize], but suspends until a bundle containing the script is ready. A script
  /// the build in flight may have missed, or that missed the last bundle, requests one rebuild.
  /// Concurrent waiters on the same id share a single wait.
  pub async fn finalize_when_ready(&self, logical_id: &LogicalId) -> BuildResult<ArcStr> {
    let clock = &self.inner.clock;
    let mut requested = false;
    loop {
      if let Some(file_name) = self.try_finalize(logical_id)? {
        return Ok(file_name);
      }
      if requested {
        return self.finalize(logical_id);
      }

      let state = clock.state();
      let generation = if state.phase == BuildPhase::BuildStart {
        state.generation
      } else {
        // Any build starting from here on emits the script.
        clock.request_rebuild();
        requested = true;
        state.generation + 1
      };

      match self.wait_for_tick(logical_id, generation).await {
        Tick::BundleReady(_) => {}
        Tick::Cancelled(generation) => return Err(CrxError::cancelled(generation).into()),
      }
    }
  }

  async fn wait_for_tick(&self, logical_id: &LogicalId, generation: u64) -> Tick {
    let clock = &self.inner.clock;
    let key = (logical_id.clone(), generation);
    let tick = self
      .inner
      .waiters
      .entry(key.clone())
      .or_insert_with(|| clock.tick(generation).boxed().shared())
      .clone();
    let tick = tick.await;
    self.inner.waiters.remove(&key);
    tick
  }

  pub fn pending_waiters(&self) -> usize {
    self.inner.waiters.len()
  }
}
