use std::{borrow::Cow, fmt::Debug, sync::Arc};

use crxpack_common::ManifestV3;

use super::{RenderContext, TransformContext};
use crate::clock::BuildPhase;

pub type PluginName<'a> = Cow<'a, str>;
/// `Ok(None)` keeps the manifest the plugin was handed.
pub type HookManifestOutput = anyhow::Result<Option<ManifestV3>>;
pub type HookNoopReturn = anyhow::Result<()>;
pub type SharedPlugin = Arc<dyn CrxPlugin>;

/// A collaborator of the manifest pipeline. Every manifest hook receives its own copy of the
/// manifest and returns the edited copy.
#[async_trait::async_trait]
pub trait CrxPlugin: Debug + Send + Sync {
  fn name(&self) -> PluginName<'_>;

  async fn transform_manifest(
    &self,
    _ctx: &TransformContext<'_>,
    _manifest: ManifestV3,
  ) -> HookManifestOutput {
    Ok(None)
  }

  async fn render_manifest(
    &self,
    _ctx: &mut RenderContext<'_>,
    _manifest: ManifestV3,
  ) -> HookManifestOutput {
    Ok(None)
  }

  async fn on_build_phase(&self, _phase: BuildPhase, _generation: u64) -> HookNoopReturn {
    Ok(())
  }
}
