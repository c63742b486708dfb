use std::path::Path;

use crxpack_common::OutputBundle;
use crxpack_error::{BuildResult, CrxError};
use crxpack_fs::FileSystem;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

/// Writes every output of `bundle` below `out_dir`. File names are package-relative, so the
/// written tree mirrors the paths in the manifest.
pub fn write_bundle(fs: &dyn FileSystem, out_dir: &Path, bundle: &OutputBundle) -> BuildResult<()> {
  let outputs = bundle.iter().collect::<Vec<_>>();
  outputs.par_iter().try_for_each(|output| -> BuildResult<()> {
    let dest = out_dir.join(output.filename().as_str());
    fs.write(&dest, output.content_as_bytes()).map_err(|err| {
      CrxError::io(err).context(format!("Failed to write {}", dest.display()))
    })?;
    Ok(())
  })?;
  tracing::debug!(out_dir = %out_dir.display(), files = outputs.len(), "wrote bundle");
  Ok(())
}

#[cfg(test)]
mod tests {
  use crxpack_common::OutputAsset;
  use crxpack_fs::MemoryFileSystem;

  use super::*;

  #[test]
  fn mirrors_file_names_below_out_dir() {
    let fs = MemoryFileSystem::default();
    let mut bundle = OutputBundle::new();
    bundle.insert(OutputAsset::new("manifest.json", "{}"));
    bundle.insert(OutputAsset::new("assets/logo.png", b"png".as_slice()));

    write_bundle(&fs, Path::new("/project/dist"), &bundle).unwrap();
    assert_eq!(fs.read(Path::new("/project/dist/manifest.json")).unwrap(), b"{}");
    assert!(fs.exists(Path::new("/project/dist/assets/logo.png")));
  }
}
