use std::{future::pending, path::Path, sync::Arc};

use async_trait::async_trait;
use crxpack_common::{CrxEvent, HmrPayload, HmrUpdate, ManifestV3, ModuleId, OutputBundle};
use crxpack_utils::{
  file_name::{get_file_name, prefix, FileNameKind},
  path_ext::{strip_query, PathExt},
};
use serde_json::Value;
use tokio::{
  sync::{mpsc, watch},
  task::JoinHandle,
  time::{sleep_until, Instant},
};

use super::{
  buffer::HmrBuffer,
  channel::RuntimeHub,
  import_graph::{is_importer, BundleModules, ImportGraph},
};
use crate::{
  clock::{BuildPhaseClock, ClockState},
  plugin::{CrxPlugin, HookManifestOutput, PluginName, TransformContext},
  session::BuildSession,
};

/// Custom events of UI frameworks the runtime clients understand.
fn is_framework_event(event: &str) -> bool {
  event.starts_with("vue:") || event.starts_with("svelte:") || event == "file-changed"
}

/// Package file the last bundle rendered the module behind `path` into.
fn bundled_path(modules: &BundleModules, path: &str) -> Option<String> {
  modules.file_name(&ModuleId::from(strip_query(path))).map(|file_name| prefix("/", file_name))
}

/// Like [bundled_path], falling back to the name the dev build serves an unbundled module under.
fn package_path(modules: &BundleModules, path: &str) -> String {
  bundled_path(modules, path)
    .unwrap_or_else(|| prefix("/", &get_file_name(path, FileNameKind::Module)))
}

fn data_path(data: Option<&Value>) -> Option<&str> {
  data?.get("path")?.as_str()
}

/// Source modules a dev server payload reports as changed.
fn changed_modules(payload: &HmrPayload) -> Vec<ModuleId> {
  match payload {
    HmrPayload::Update { updates } => {
      updates.iter().map(|update| ModuleId::from(strip_query(&update.path))).collect()
    }
    HmrPayload::FullReload { path: Some(path) } => vec![ModuleId::from(strip_query(path))],
    HmrPayload::Custom { event, data } if event == "file-changed" => {
      data_path(data.as_ref()).map(|path| ModuleId::from(strip_query(path))).into_iter().collect()
    }
    _ => vec![],
  }
}

/// What the coordinator needs from the declared manifest and the last generated bundle.
#[derive(Debug)]
pub struct HmrTargets {
  background: watch::Sender<Option<ModuleId>>,
  bundle: watch::Sender<Arc<BundleModules>>,
}

impl Default for HmrTargets {
  fn default() -> Self {
    Self {
      background: watch::Sender::new(None),
      bundle: watch::Sender::new(Arc::default()),
    }
  }
}

impl HmrTargets {
  pub fn background(&self) -> Option<ModuleId> {
    self.background.borrow().clone()
  }

  pub fn set_background(&self, id: Option<ModuleId>) {
    self.background.send_replace(id);
  }

  /// Snapshot of the last bundle recorded with [Self::record_bundle].
  pub fn bundle_modules(&self) -> Arc<BundleModules> {
    Arc::clone(&self.bundle.borrow())
  }

  pub fn record_bundle(&self, bundle: &OutputBundle) {
    self.bundle.send_replace(Arc::new(BundleModules::from_bundle(bundle)));
  }
}

/// Records the service worker of the declared manifest for the coordinator. Runs after user
/// plugins so it sees their edits.
#[derive(Debug, Default)]
pub struct HmrPlugin {
  targets: Arc<HmrTargets>,
}

impl HmrPlugin {
  pub fn new(targets: Arc<HmrTargets>) -> Self {
    Self { targets }
  }
}

#[async_trait]
impl CrxPlugin for HmrPlugin {
  fn name(&self) -> PluginName<'_> {
    "crx:hmr".into()
  }

  async fn transform_manifest(
    &self,
    ctx: &TransformContext<'_>,
    manifest: ManifestV3,
  ) -> HookManifestOutput {
    let worker = manifest.background.as_ref().and_then(|bg| bg.service_worker.as_deref());
    let root = &ctx.options().root;
    self.targets.set_background(worker.map(|worker| Path::new(worker).root_relative_id(root).into()));
    Ok(None)
  }
}

/// A payload and the last ready generation at the time it was published.
type Published = (u64, HmrPayload);

/// Publishes dev server payloads into the coordinator.
#[derive(Debug, Clone)]
pub struct HmrHandle {
  tx: mpsc::Sender<Published>,
  clock: BuildPhaseClock,
}

impl HmrHandle {
  /// Waits for buffer space. Returns `false` once the coordinator has stopped.
  pub async fn publish(&self, payload: HmrPayload) -> bool {
    let seen_ready = self.clock.state().last_ready;
    self.tx.send((seen_ready, payload)).await.is_ok()
  }

  pub fn try_publish(&self, payload: HmrPayload) -> bool {
    let seen_ready = self.clock.state().last_ready;
    match self.tx.try_send((seen_ready, payload)) {
      Ok(()) => true,
      Err(mpsc::error::TrySendError::Full((_, payload))) => {
        tracing::warn!(kind = payload.kind(), "hmr channel is full, payload dropped");
        false
      }
      Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
  }
}

/// Turns the dev server's change notifications into extension-scoped instructions. Payloads are
/// withheld until the next `bundleReady` tick, translated as one window, and fanned out over the
/// runtime channel.
///
/// Without an explicit [ImportGraph] the relations of the last recorded bundle are used.
#[derive(Debug)]
pub struct HmrCoordinator {
  session: BuildSession,
  targets: Arc<HmrTargets>,
  graph: Option<Arc<dyn ImportGraph>>,
  hub: RuntimeHub,
}

impl HmrCoordinator {
  pub fn new(
    session: BuildSession,
    targets: Arc<HmrTargets>,
    graph: Option<Arc<dyn ImportGraph>>,
    hub: RuntimeHub,
  ) -> Self {
    Self { session, targets, graph, hub }
  }

  fn is_background_change(&self, graph: &dyn ImportGraph, changed: &[ModuleId]) -> bool {
    self
      .targets
      .background()
      .is_some_and(|background| changed.iter().any(|id| is_importer(graph, &background, id)))
  }

  /// Roots of scripts that already have a compiled unit in the current build.
  fn loaded_scripts(&self) -> Vec<ModuleId> {
    let content = self.session.content_scripts.records().into_iter();
    let dynamic = self.session.dynamic_scripts.records().into_iter();
    content
      .filter(|record| record.compiled_ref.is_some())
      .map(|record| record.id)
      .chain(dynamic.filter(|record| record.compiled_ref.is_some()).map(|record| record.id))
      .collect()
  }

  /// Points an update at the package file its module was bundled into. Modules missing from the
  /// package have nothing to update.
  fn remap_update(modules: &BundleModules, update: HmrUpdate) -> Option<HmrUpdate> {
    let Some(path) = bundled_path(modules, &update.path) else {
      tracing::trace!(path = %update.path, "update for a module outside the package dropped");
      return None;
    };
    let accepted_path = bundled_path(modules, &update.accepted_path).unwrap_or_else(|| path.clone());
    Some(HmrUpdate { path, accepted_path, ..update })
  }

  /// Decides what one window of payloads means for the extension runtime.
  pub fn translate(&self, payloads: Vec<HmrPayload>) -> Vec<HmrPayload> {
    let modules = self.targets.bundle_modules();
    let graph: &dyn ImportGraph = match &self.graph {
      Some(graph) => &**graph,
      None => modules.graph(),
    };

    let changed = payloads.iter().flat_map(changed_modules).collect::<Vec<_>>();
    if self.is_background_change(graph, &changed) {
      tracing::debug!("background changed, sending runtime reload");
      return vec![CrxEvent::FullReload.into_payload()];
    }
    if payloads.iter().any(|payload| matches!(payload, HmrPayload::FullReload { path: None })) {
      return vec![CrxEvent::FullReload.into_payload()];
    }

    let scripts = self.loaded_scripts();
    let is_script_module = |path: &str| {
      let id = ModuleId::from(strip_query(path));
      scripts.iter().any(|script| is_importer(graph, script, &id))
    };

    let mut translated = vec![];
    for payload in payloads {
      match payload {
        HmrPayload::Update { updates } => {
          let updates = updates
            .into_iter()
            .filter(|update| is_script_module(&update.path))
            .filter_map(|update| Self::remap_update(&modules, update))
            .collect::<Vec<_>>();
          if !updates.is_empty() {
            translated.push(CrxEvent::Update { updates }.into_payload());
          }
        }
        HmrPayload::Prune { paths } if !paths.is_empty() => {
          let paths = paths.iter().map(|path| package_path(&modules, path)).collect();
          translated.push(CrxEvent::Prune { paths }.into_payload());
        }
        HmrPayload::Custom { event, mut data } if is_framework_event(&event) => {
          if let Some(Value::Object(data)) = &mut data {
            if let Some(Value::String(path)) = data.get_mut("path") {
              *path = package_path(&modules, path);
            }
          }
          translated.push(HmrPayload::Custom { event, data });
        }
        HmrPayload::FullReload { path: Some(path) } => {
          tracing::trace!(%path, "dropped page reload");
        }
        _ => {}
      }
    }
    translated
  }

  /// Sends every buffered payload published before generation `ready` became ready.
  fn flush(&self, buffer: &mut HmrBuffer, ready: u64) {
    let window = buffer.on_bundle_ready(ready);
    if window.is_empty() {
      return;
    }
    let received = window.len();
    let payloads = self.translate(window);
    tracing::debug!(generation = ready, received, sent = payloads.len(), "flushed hmr window");
    for payload in payloads {
      let reached = self.hub.send_payload(payload);
      tracing::trace!(reached, "sent hmr payload");
    }
  }

  /// Starts the coordinator task. It stops once every handle is dropped.
  ///
  /// The task observes the clock from this call on, so payloads published through the returned
  /// handle are never missed by the tick that follows them.
  pub fn spawn(self) -> (HmrHandle, JoinHandle<()>) {
    let clock = self.session.clock.clone();
    let mut ticks = clock.subscribe();
    let flushed = ticks.borrow_and_update().last_ready;
    let (tx, rx) = mpsc::channel(self.session.options.hmr_channel_capacity);
    let task = tokio::spawn(self.run(rx, ticks, flushed));
    (HmrHandle { tx, clock }, task)
  }

  async fn run(
    self,
    mut rx: mpsc::Receiver<Published>,
    mut ticks: watch::Receiver<ClockState>,
    mut flushed: u64,
  ) {
    let mut buffer = HmrBuffer::new(self.session.options.hmr_buffer_timeout);

    loop {
      let deadline = buffer.deadline();
      tokio::select! {
        biased;
        published = rx.recv() => {
          let Some((seen_ready, payload)) = published else { break };
          buffer.push(payload, seen_ready, Instant::now());
          // Its tick was observed before the payload was received.
          if seen_ready < flushed {
            self.flush(&mut buffer, flushed);
          }
        }
        changed = ticks.changed() => {
          if changed.is_err() {
            break;
          }
          let ready = ticks.borrow_and_update().last_ready;
          if ready > flushed {
            flushed = ready;
            self.flush(&mut buffer, ready);
          }
        }
        () = async {
          match deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => pending().await,
          }
        } => {
          let dropped = buffer.expire(Instant::now());
          if dropped > 0 {
            tracing::warn!(dropped, "no bundle became ready in time, hmr payloads dropped");
          }
        }
      }
    }
    tracing::trace!("hmr coordinator stopped");
  }
}
