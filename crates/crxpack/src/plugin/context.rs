use crxpack_common::{NormalizedCrxOptions, OutputBundle};

use crate::{host::BundleHost, session::BuildSession};

pub struct TransformContext<'a> {
  pub session: &'a BuildSession,
}

impl TransformContext<'_> {
  pub fn options(&self) -> &NormalizedCrxOptions {
    &self.session.options
  }
}

/// Handed to `render_manifest` once every output has its final file name.
pub struct RenderContext<'a> {
  pub session: &'a BuildSession,
  pub host: &'a dyn BundleHost,
  pub bundle: &'a mut OutputBundle,
}

impl RenderContext<'_> {
  pub fn options(&self) -> &NormalizedCrxOptions {
    &self.session.options
  }
}
