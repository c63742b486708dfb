use std::{fmt::Debug, sync::Arc};

use crate::{BuildMode, ManifestV3};

/// Environment a computed manifest is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManifestEnv {
  pub mode: BuildMode,
}

type ComputeManifest = dyn Fn(&ManifestEnv) -> anyhow::Result<ManifestV3> + Send + Sync;

/// Where the manifest descriptor comes from.
#[derive(Clone)]
pub enum ManifestSource {
  Static(ManifestV3),
  Json(String),
  Computed(Arc<ComputeManifest>),
}

impl ManifestSource {
  pub fn computed(
    f: impl Fn(&ManifestEnv) -> anyhow::Result<ManifestV3> + Send + Sync + 'static,
  ) -> Self {
    Self::Computed(Arc::new(f))
  }
}

impl Debug for ManifestSource {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Static(manifest) => f.debug_tuple("Static").field(manifest).finish(),
      Self::Json(json) => f.debug_tuple("Json").field(json).finish(),
      Self::Computed(_) => f.write_str("Computed(..)"),
    }
  }
}

impl From<ManifestV3> for ManifestSource {
  fn from(manifest: ManifestV3) -> Self {
    Self::Static(manifest)
  }
}
