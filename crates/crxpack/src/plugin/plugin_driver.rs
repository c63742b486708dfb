use std::time::Duration;

use crxpack_common::ManifestV3;
use crxpack_error::{BuildResult, CrxError};

use super::{RenderContext, SharedPlugin, TransformContext};
use crate::clock::BuildPhase;

/// Phase notifications must not hold up the build for longer than this.
const PHASE_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs plugin hooks strictly one after another, in registration order.
#[derive(Debug, Default)]
pub struct PluginDriver {
  plugins: Vec<SharedPlugin>,
}

impl PluginDriver {
  pub fn new(plugins: Vec<SharedPlugin>) -> Self {
    Self { plugins }
  }

  pub fn plugins(&self) -> &[SharedPlugin] {
    &self.plugins
  }

  pub async fn transform_manifest(
    &self,
    ctx: &TransformContext<'_>,
    mut manifest: ManifestV3,
  ) -> BuildResult<ManifestV3> {
    for plugin in &self.plugins {
      let output = plugin
        .transform_manifest(ctx, manifest.clone())
        .await
        .map_err(|err| CrxError::collaborator(plugin.name(), "transform_manifest", err))?;
      if let Some(output) = output {
        manifest = output;
      }
    }
    Ok(manifest)
  }

  pub async fn render_manifest(
    &self,
    ctx: &mut RenderContext<'_>,
    mut manifest: ManifestV3,
  ) -> BuildResult<ManifestV3> {
    for plugin in &self.plugins {
      let output = plugin
        .render_manifest(ctx, manifest.clone())
        .await
        .map_err(|err| CrxError::collaborator(plugin.name(), "render_manifest", err))?;
      if let Some(output) = output {
        manifest = output;
      }
    }
    Ok(manifest)
  }

  pub async fn on_build_phase(&self, phase: BuildPhase, generation: u64) -> BuildResult<()> {
    for plugin in &self.plugins {
      match tokio::time::timeout(PHASE_HOOK_TIMEOUT, plugin.on_build_phase(phase, generation)).await
      {
        Ok(result) => {
          result.map_err(|err| CrxError::collaborator(plugin.name(), "on_build_phase", err))?;
        }
        Err(_) => tracing::warn!(
          plugin = %plugin.name(),
          phase = phase.as_str(),
          "build phase hook timed out, continuing without it"
        ),
      }
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use async_trait::async_trait;
  use crxpack_common::CrxOptions;

  use super::*;
  use crate::{
    plugin::{CrxPlugin, HookManifestOutput, PluginName},
    session::BuildSession,
  };

  #[derive(Debug)]
  struct Rename(&'static str);

  #[async_trait]
  impl CrxPlugin for Rename {
    fn name(&self) -> PluginName<'_> {
      "rename".into()
    }

    async fn transform_manifest(
      &self,
      _ctx: &TransformContext<'_>,
      mut manifest: ManifestV3,
    ) -> HookManifestOutput {
      manifest.name = self.0.to_string();
      Ok(Some(manifest))
    }
  }

  /// Records the name it was handed, then edits its copy without returning it.
  #[derive(Debug, Default)]
  struct Observe(Mutex<Vec<String>>);

  #[async_trait]
  impl CrxPlugin for Observe {
    fn name(&self) -> PluginName<'_> {
      "observe".into()
    }

    async fn transform_manifest(
      &self,
      _ctx: &TransformContext<'_>,
      mut manifest: ManifestV3,
    ) -> HookManifestOutput {
      self.0.lock().unwrap().push(manifest.name.clone());
      manifest.name = "discarded".to_string();
      Ok(None)
    }
  }

  #[derive(Debug)]
  struct Fail;

  #[async_trait]
  impl CrxPlugin for Fail {
    fn name(&self) -> PluginName<'_> {
      "fail".into()
    }

    async fn transform_manifest(
      &self,
      _ctx: &TransformContext<'_>,
      _manifest: ManifestV3,
    ) -> HookManifestOutput {
      anyhow::bail!("missing field")
    }
  }

  #[tokio::test]
  async fn hooks_run_in_order_on_their_own_copy() {
    let observe = Arc::new(Observe::default());
    let driver = PluginDriver::new(vec![
      Arc::clone(&observe) as SharedPlugin,
      Arc::new(Rename("renamed")),
      Arc::clone(&observe) as SharedPlugin,
    ]);
    let session = BuildSession::new(CrxOptions::default()).unwrap();
    let ctx = TransformContext { session: &session };

    let manifest = driver.transform_manifest(&ctx, ManifestV3::new("demo", "1.0.0")).await.unwrap();
    assert_eq!(manifest.name, "renamed");
    assert_eq!(*observe.0.lock().unwrap(), ["demo", "renamed"]);
  }

  #[tokio::test]
  async fn errors_name_the_failing_plugin() {
    let driver = PluginDriver::new(vec![Arc::new(Rename("renamed")), Arc::new(Fail)]);
    let session = BuildSession::new(CrxOptions::default()).unwrap();
    let ctx = TransformContext { session: &session };

    let err = driver.transform_manifest(&ctx, ManifestV3::new("demo", "1.0.0")).await.unwrap_err();
    let err = err.find_crx_error().unwrap();
    assert_eq!(err.code(), "PLUGIN_ERROR");
    assert_eq!(err.to_string(), "[fail] transform_manifest: missing field");
  }
}
