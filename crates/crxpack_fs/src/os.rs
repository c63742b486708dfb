use std::{
  fs, io,
  path::{Path, PathBuf},
};

use crate::FileSystem;

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
  }

  fn exists(&self, path: &Path) -> bool {
    path.exists()
  }

  fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = vec![];
    if !dir.is_dir() {
      return Ok(files);
    }
    let mut pending = vec![dir.to_path_buf()];
    while let Some(current) = pending.pop() {
      for entry in fs::read_dir(&current)? {
        let path = entry?.path();
        if path.is_dir() {
          pending.push(path);
        } else if let Ok(relative) = path.strip_prefix(dir) {
          files.push(relative.to_path_buf());
        }
      }
    }
    files.sort();
    Ok(files)
  }
}
