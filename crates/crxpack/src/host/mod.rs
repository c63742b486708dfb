mod prebuilt;

use std::fmt::Debug;

use arcstr::ArcStr;
use async_trait::async_trait;
use crxpack_common::{FileRef, ModuleId, OutputBundle};
use crxpack_error::BuildResult;

pub use self::prebuilt::{PrebuiltBundleHost, PrebuiltChunk, PrebuiltGraph};
use crate::dynamic_script::DynamicScriptRegistry;

/// Placeholder root emitted when a manifest declares no scripts, so the bundler always has an
/// input. Removed from the bundle before it is written.
pub const STUB_ID: &str = "/@crx/stub";
pub const STUB_CODE: &str = "console.log('stub')";

#[derive(Debug, Clone)]
pub struct EmittedAsset {
  /// Name the bundler derives a hashed file name from.
  pub name: Option<String>,
  /// Exact output file name, bypassing naming.
  pub file_name: Option<ArcStr>,
  pub source: Vec<u8>,
}

impl EmittedAsset {
  pub fn named(name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
    Self { name: Some(name.into()), file_name: None, source: source.into() }
  }

  pub fn fixed(file_name: impl Into<ArcStr>, source: impl Into<Vec<u8>>) -> Self {
    Self { name: None, file_name: Some(file_name.into()), source: source.into() }
  }
}

/// The bundler this crate drives. It compiles roots into a bundle graph and names the outputs;
/// everything extension specific happens on top of it.
#[async_trait]
pub trait BundleHost: Debug + Send + Sync {
  /// Adds `id` as an additional root of the current build.
  fn emit_chunk(&self, id: &ModuleId) -> BuildResult<FileRef>;

  /// Adds an asset to `bundle`, which has already been generated.
  fn emit_asset(&self, bundle: &mut OutputBundle, asset: EmittedAsset) -> BuildResult<FileRef>;

  /// Output file name of an emitted file. `None` until the bundle has been generated, or when the
  /// emitted root never made it into the bundle.
  fn file_name(&self, reference: &FileRef) -> Option<ArcStr>;

  /// Compiles every emitted root. Dynamic script requests met while loading modules are
  /// registered with `scripts`.
  async fn generate(&self, scripts: &DynamicScriptRegistry) -> BuildResult<OutputBundle>;

  /// Forgets the roots emitted by the previous build.
  fn begin_build(&self) {}
}
