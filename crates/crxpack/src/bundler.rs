use std::sync::Arc;

use crxpack_common::{CrxOptions, ManifestSource, ManifestV3, OutputBundle};
use crxpack_error::BuildResult;
use crxpack_fs::FileSystem;
use tokio::task::JoinHandle;

use crate::{
  clock::BuildPhase,
  file_writer::write_bundle,
  hmr::{HmrCoordinator, HmrHandle, HmrPlugin, HmrTargets, ImportGraph, RuntimeHub},
  host::BundleHost,
  manifest::{BackgroundLoaderPlugin, ManifestPipeline},
  plugin::{PluginDriver, SharedPlugin},
  resources::WebAccessibleResourcesPlugin,
  session::BuildSession,
  SharedOptions,
};

#[derive(Debug)]
pub struct BundleOutput {
  pub bundle: OutputBundle,
  /// The manifest as written to `manifest.json`.
  pub manifest: ManifestV3,
  pub generation: u64,
}

/// Packages the output of a [BundleHost] as a browser extension.
pub struct CrxBundler {
  session: BuildSession,
  driver: PluginDriver,
  host: Arc<dyn BundleHost>,
  fs: Arc<dyn FileSystem>,
  manifest: ManifestSource,
  hmr_targets: Arc<HmrTargets>,
}

impl CrxBundler {
  pub fn new(
    options: CrxOptions,
    manifest: impl Into<ManifestSource>,
    host: Arc<dyn BundleHost>,
    fs: Arc<dyn FileSystem>,
  ) -> BuildResult<Self> {
    Self::with_plugins(options, manifest, host, fs, vec![])
  }

  /// Built-in plugins run after `plugins`, so they see every user edit of the manifest.
  pub fn with_plugins(
    options: CrxOptions,
    manifest: impl Into<ManifestSource>,
    host: Arc<dyn BundleHost>,
    fs: Arc<dyn FileSystem>,
    mut plugins: Vec<SharedPlugin>,
  ) -> BuildResult<Self> {
    let session = BuildSession::new(options)?;
    let hmr_targets = Arc::new(HmrTargets::default());

    let mut builtin_post_plugins: Vec<SharedPlugin> = vec![];
    if session.options.is_serve() {
      builtin_post_plugins.push(Arc::new(HmrPlugin::new(Arc::clone(&hmr_targets))));
    }
    builtin_post_plugins.push(Arc::new(BackgroundLoaderPlugin));
    builtin_post_plugins.push(Arc::new(WebAccessibleResourcesPlugin));
    plugins.extend(builtin_post_plugins);

    Ok(Self {
      session,
      driver: PluginDriver::new(plugins),
      host,
      fs,
      manifest: manifest.into(),
      hmr_targets,
    })
  }

  pub fn session(&self) -> &BuildSession {
    &self.session
  }

  pub fn options(&self) -> &SharedOptions {
    &self.session.options
  }

  pub async fn generate(&mut self) -> BuildResult<BundleOutput> {
    self.build(false).await
  }

  pub async fn write(&mut self) -> BuildResult<BundleOutput> {
    self.build(true).await
  }

  /// Waits until something asks for a rebuild, e.g. a dynamic script requested after the last
  /// bundle was generated, and writes the next build.
  pub async fn rebuild_when_requested(&mut self) -> BuildResult<BundleOutput> {
    self.session.clock.rebuild_requested().await;
    self.build(true).await
  }

  /// Starts the HMR coordinator for this bundler's session. Without `graph`, module relations
  /// come from the last generated bundle.
  pub fn spawn_hmr(
    &self,
    graph: Option<Arc<dyn ImportGraph>>,
    hub: RuntimeHub,
  ) -> (HmrHandle, JoinHandle<()>) {
    HmrCoordinator::new(self.session.clone(), Arc::clone(&self.hmr_targets), graph, hub).spawn()
  }

  async fn build(&mut self, is_write: bool) -> BuildResult<BundleOutput> {
    let generation = self.session.begin_build();
    self.host.begin_build();

    match self.build_generation(generation, is_write).await {
      Ok(output) => {
        if self.session.options.is_serve() {
          self.hmr_targets.record_bundle(&output.bundle);
        }
        self.session.clock.bundle_ready(generation);
        self.driver.on_build_phase(BuildPhase::BundleReady, generation).await?;
        Ok(output)
      }
      Err(errors) => {
        // Releases every dynamic script waiting on this generation.
        self.session.clock.cancel(generation);
        Err(errors)
      }
    }
  }

  async fn build_generation(&self, generation: u64, is_write: bool) -> BuildResult<BundleOutput> {
    let session = &self.session;
    let options = &session.options;
    let host = &*self.host;
    self.driver.on_build_phase(BuildPhase::BuildStart, generation).await?;

    let mut pipeline = ManifestPipeline::new(session);
    pipeline.load(&self.manifest)?;
    pipeline.declare(&self.driver).await?;
    pipeline.emit(host)?;
    session.dynamic_scripts.emit_pending(host)?;

    let mut bundle = host.generate(&session.dynamic_scripts).await?;
    pipeline.compiled()?;

    session.content_scripts.assign_file_names(host, &bundle)?;
    session.dynamic_scripts.assign_file_names(host, &bundle)?;
    session.content_scripts.attach_loaders(host, &mut bundle, options)?;
    session.dynamic_scripts.emit_loaders(host, &mut bundle)?;
    session.dynamic_scripts.substitute_placeholders(&mut bundle)?;

    let manifest = pipeline.render(&self.driver, host, &*self.fs, &mut bundle).await?;

    if is_write {
      write_bundle(&*self.fs, &options.out_dir, &bundle)?;
    }
    tracing::debug!(generation, outputs = bundle.len(), "build finished");
    Ok(BundleOutput { bundle, manifest, generation })
  }
}
