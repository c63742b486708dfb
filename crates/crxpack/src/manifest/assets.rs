use crxpack_common::{NormalizedCrxOptions, OutputBundle};
use crxpack_error::{BuildResult, CrxError};
use crxpack_fs::FileSystem;

use super::manifest_files::ManifestFiles;
use crate::host::{BundleHost, EmittedAsset};

/// Emits manifest assets the bundle lacks, read from the project root or else the public dir.
pub fn copy_missing_assets(
  files: &ManifestFiles,
  options: &NormalizedCrxOptions,
  fs: &dyn FileSystem,
  host: &dyn BundleHost,
  bundle: &mut OutputBundle,
) -> BuildResult<()> {
  for file in files.assets() {
    if bundle.contains(file) {
      continue;
    }

    let mut path = options.root.join(file);
    if !fs.exists(&path) {
      path = options.public_dir.join(file);
      if !fs.exists(&path) {
        return Err(
          CrxError::missing_manifest_asset(
            file.as_str(),
            options.root.clone(),
            options.public_dir.clone(),
          )
          .into(),
        );
      }
      tracing::debug!(%file, "manifest asset found in public dir");
    }

    let source = fs.read(&path)?;
    host.emit_asset(bundle, EmittedAsset::fixed(file.as_str(), source))?;
    tracing::trace!(%file, "copied manifest asset");
  }
  Ok(())
}
