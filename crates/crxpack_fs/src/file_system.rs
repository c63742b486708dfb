use std::{
  io,
  path::{Path, PathBuf},
};

/// File system abstraction used to read manifest assets and write the package.
pub trait FileSystem: Send + Sync {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

  /// Writes `content` to `path`, creating missing parent directories.
  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()>;

  fn exists(&self, path: &Path) -> bool;

  /// Files below `dir`, recursively, as paths relative to `dir`. A missing `dir` yields nothing.
  fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let bytes = self.read(path)?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
  }
}
