use std::path::Path;

use crxpack_common::{
  BuildMode, FileRef, ManifestEnv, ManifestSource, ManifestV3, ModuleId, OutputBundle,
};
use crxpack_error::{BuildResult, CrxError};
use crxpack_fs::FileSystem;
use crxpack_utils::{match_pattern::is_glob, path_ext::PathExt};
use serde_json::Value;

use super::{assets::copy_missing_assets, manifest_files::manifest_files};
use crate::{
  host::{BundleHost, EmittedAsset, STUB_ID},
  plugin::{PluginDriver, RenderContext, TransformContext},
  session::BuildSession,
};

pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
  Init,
  Declared,
  Emitting,
  Compiled,
  Rendered,
}

impl PipelinePhase {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Init => "init",
      Self::Declared => "declared",
      Self::Emitting => "emitting",
      Self::Compiled => "compiled",
      Self::Rendered => "rendered",
    }
  }
}

/// Drives one build's manifest from its descriptor to the written `manifest.json`.
#[derive(Debug)]
pub struct ManifestPipeline<'a> {
  session: &'a BuildSession,
  phase: PipelinePhase,
  manifest: Option<ManifestV3>,
  worker_ref: Option<FileRef>,
  stub_ref: Option<FileRef>,
  emitted: bool,
}

impl<'a> ManifestPipeline<'a> {
  pub fn new(session: &'a BuildSession) -> Self {
    Self {
      session,
      phase: PipelinePhase::Init,
      manifest: None,
      worker_ref: None,
      stub_ref: None,
      emitted: false,
    }
  }

  pub fn phase(&self) -> PipelinePhase {
    self.phase
  }

  pub fn manifest(&self) -> Option<&ManifestV3> {
    self.manifest.as_ref()
  }

  fn expect_phase(&self, expected: PipelinePhase) -> BuildResult<()> {
    if self.phase == expected {
      Ok(())
    } else {
      Err(CrxError::invalid_pipeline_phase(expected.as_str(), self.phase.as_str()).into())
    }
  }

  fn take_manifest(&mut self) -> BuildResult<ManifestV3> {
    self.manifest.take().ok_or_else(|| {
      CrxError::invalid_pipeline_phase("loaded", self.phase.as_str()).context("no manifest").into()
    })
  }

  fn module_id(&self, path: &str) -> ModuleId {
    ModuleId::new(Path::new(path).root_relative_id(&self.session.options.root))
  }

  /// Evaluates the descriptor. Anything other than Manifest V3 is rejected.
  pub fn load(&mut self, source: &ManifestSource) -> BuildResult<()> {
    self.expect_phase(PipelinePhase::Init)?;

    let manifest = match source {
      ManifestSource::Static(manifest) => manifest.clone(),
      ManifestSource::Json(json) => {
        let value: Value = serde_json::from_str(json).map_err(CrxError::json)?;
        let version = value.get("manifest_version").and_then(Value::as_u64).unwrap_or_default();
        if version != 3 {
          return Err(CrxError::unsupported_manifest_version(version).into());
        }
        serde_json::from_value(value).map_err(CrxError::json)?
      }
      ManifestSource::Computed(compute) => {
        compute(&ManifestEnv { mode: self.session.options.mode })
          .map_err(|err| CrxError::collaborator("crx:manifest", "compute_manifest", err))?
      }
    };
    if manifest.manifest_version != 3 {
      return Err(CrxError::unsupported_manifest_version(manifest.manifest_version).into());
    }

    tracing::debug!(name = %manifest.name, version = %manifest.version, "loaded manifest");
    self.manifest = Some(manifest);
    Ok(())
  }

  /// Hands the manifest to every plugin's `transform_manifest`.
  pub async fn declare(&mut self, driver: &PluginDriver) -> BuildResult<()> {
    self.expect_phase(PipelinePhase::Init)?;
    let manifest = self.take_manifest()?;
    let ctx = TransformContext { session: self.session };
    self.manifest = Some(driver.transform_manifest(&ctx, manifest).await?);
    self.phase = PipelinePhase::Declared;
    Ok(())
  }

  /// Registers every script and page the manifest names as a bundle root. Runs once per build.
  pub fn emit(&mut self, host: &dyn BundleHost) -> BuildResult<()> {
    if self.emitted {
      return Ok(());
    }
    self.expect_phase(PipelinePhase::Declared)?;
    self.phase = PipelinePhase::Emitting;

    let manifest = self.manifest.as_ref().ok_or_else(|| {
      CrxError::invalid_pipeline_phase("loaded", PipelinePhase::Declared.as_str())
    })?;
    let is_build = self.session.options.mode == BuildMode::Build;

    let content_scripts = &self.session.content_scripts;
    for declaration in &manifest.content_scripts {
      let world = declaration.world.unwrap_or_default();
      for js in &declaration.js {
        let id = self.module_id(js);
        content_scripts.declare(id.clone(), &declaration.matches, world);
        content_scripts.emit(&id, host)?;
      }
    }

    // The dev server serves the worker and pages itself.
    let mut worker_ref = None;
    if is_build {
      if let Some(worker) = manifest.background.as_ref().and_then(|bg| bg.service_worker.as_ref()) {
        worker_ref = Some(host.emit_chunk(&self.module_id(worker))?);
      }
      for page in manifest.html_files() {
        host.emit_chunk(&self.module_id(&page))?;
      }
    }

    let stub_ref = if manifest.declares_scripts() {
      None
    } else {
      tracing::debug!("manifest declares no scripts, emitting stub");
      Some(host.emit_chunk(&STUB_ID.into())?)
    };

    self.worker_ref = worker_ref;
    self.stub_ref = stub_ref;
    self.emitted = true;
    Ok(())
  }

  pub fn compiled(&mut self) -> BuildResult<()> {
    self.expect_phase(PipelinePhase::Emitting)?;
    self.phase = PipelinePhase::Compiled;
    Ok(())
  }

  /// Output file names for every emitted root.
  fn replace_file_names(
    &self,
    host: &dyn BundleHost,
    manifest: &mut ManifestV3,
  ) -> BuildResult<()> {
    for declaration in &mut manifest.content_scripts {
      for js in &mut declaration.js {
        let id = self.module_id(js);
        let file_name = self
          .session
          .content_scripts
          .get(&id)
          .and_then(|record| record.public_file_name().cloned())
          .ok_or_else(|| CrxError::missing_root(&*id, js.as_str()))?;
        *js = file_name.to_string();
      }
    }

    if let Some(worker_ref) = &self.worker_ref {
      if let Some(background) = &mut manifest.background {
        let worker = background.service_worker.clone().unwrap_or_default();
        let file_name = host
          .file_name(worker_ref)
          .ok_or_else(|| CrxError::missing_emitted_file("background.service_worker", worker))?;
        background.service_worker = Some(file_name.to_string());
      }
    }
    Ok(())
  }

  /// Renders the final manifest into `bundle` once every output is named.
  pub async fn render(
    &mut self,
    driver: &PluginDriver,
    host: &dyn BundleHost,
    fs: &dyn FileSystem,
    bundle: &mut OutputBundle,
  ) -> BuildResult<ManifestV3> {
    self.expect_phase(PipelinePhase::Compiled)?;
    let mut manifest = self.take_manifest()?;
    let session = self.session;
    let options = &session.options;

    self.replace_file_names(host, &mut manifest)?;

    let mut ctx = RenderContext { session, host, bundle: &mut *bundle };
    let manifest = driver.render_manifest(&mut ctx, manifest).await?;

    let files = manifest_files(&manifest, &options.root, fs)?;
    copy_missing_assets(&files, options, fs, host, bundle)?;
    verify_emitted_paths(&manifest, bundle, options.mode)?;

    let mut json = serde_json::to_string_pretty(&manifest).map_err(CrxError::json)?;
    json.push('\n');
    host.emit_asset(bundle, EmittedAsset::fixed(MANIFEST_FILE_NAME, json))?;

    if let Some(stub) = self.stub_ref.as_ref().and_then(|stub| host.file_name(stub)) {
      bundle.remove(&stub);
      tracing::trace!(%stub, "removed stub chunk");
    }

    self.phase = PipelinePhase::Rendered;
    self.manifest = Some(manifest.clone());
    Ok(manifest)
  }
}

/// Every concrete path the manifest hands to the browser must be an output of the package.
pub fn verify_emitted_paths(
  manifest: &ManifestV3,
  bundle: &OutputBundle,
  mode: BuildMode,
) -> BuildResult<()> {
  let check = |field: &str, file: &str| -> BuildResult<()> {
    if is_glob(file) || bundle.contains(file) {
      Ok(())
    } else {
      Err(CrxError::missing_emitted_file(field, file).into())
    }
  };

  for script in &manifest.content_scripts {
    for js in &script.js {
      check("content_scripts.js", js)?;
    }
  }
  if let Some(worker) = manifest.background.as_ref().and_then(|bg| bg.service_worker.as_ref()) {
    check("background.service_worker", worker)?;
  }

  // Development styles and resources are served by the dev server.
  if mode == BuildMode::Build {
    for script in &manifest.content_scripts {
      for css in &script.css {
        check("content_scripts.css", css)?;
      }
    }
    for resource in manifest.web_accessible_resources.iter().flatten().flat_map(|entry| entry.resources())
    {
      check("web_accessible_resources.resources", resource)?;
    }
  }
  Ok(())
}
