use async_trait::async_trait;
use crxpack_common::{ManifestBackground, ManifestV3};
use crxpack_error::BuildResult;

use crate::{
  host::EmittedAsset,
  loader::{background_loader, SERVICE_WORKER_LOADER},
  plugin::{CrxPlugin, HookManifestOutput, PluginName, RenderContext},
};

/// Points `background.service_worker` at a module loader. During development the loader pulls
/// the worker and its HMR client from the dev server.
#[derive(Debug)]
pub struct BackgroundLoaderPlugin;

impl BackgroundLoaderPlugin {
  fn render(ctx: &mut RenderContext<'_>, mut manifest: ManifestV3) -> BuildResult<ManifestV3> {
    let options = ctx.options();
    let worker = manifest.background.as_ref().and_then(|bg| bg.service_worker.as_deref());
    let Some(source) = background_loader(options.mode, worker, options.server_port)? else {
      return Ok(manifest);
    };

    let reference =
      ctx.host.emit_asset(ctx.bundle, EmittedAsset::fixed(SERVICE_WORKER_LOADER, source))?;
    tracing::debug!(%reference, worker, "emitted service worker loader");

    let background = manifest.background.get_or_insert_with(ManifestBackground::default);
    background.service_worker = Some(SERVICE_WORKER_LOADER.to_string());
    background.kind = Some("module".to_string());
    Ok(manifest)
  }
}

#[async_trait]
impl CrxPlugin for BackgroundLoaderPlugin {
  fn name(&self) -> PluginName<'_> {
    "crx:background".into()
  }

  async fn render_manifest(
    &self,
    ctx: &mut RenderContext<'_>,
    manifest: ManifestV3,
  ) -> HookManifestOutput {
    Self::render(ctx, manifest).map(Some).map_err(crxpack_error::BuildError::into_anyhow)
  }
}
