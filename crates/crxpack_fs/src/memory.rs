use std::{
  io::{self, Read, Write},
  path::{Path, PathBuf},
};

use vfs::{MemoryFS, VfsPath};

use crate::FileSystem;

/// In-memory file system. Paths are interpreted relative to a virtual `/`.
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
  root: VfsPath,
}

impl Default for MemoryFileSystem {
  fn default() -> Self {
    Self { root: VfsPath::new(MemoryFS::new()) }
  }
}

impl MemoryFileSystem {
  pub fn new() -> Self {
    Self::default()
  }

  /// Seeds the file system, e.g. with project files in tests.
  pub fn with_files<'a>(files: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> io::Result<Self> {
    let fs = Self::default();
    for (path, content) in files {
      fs.write(Path::new(path), content)?;
    }
    Ok(fs)
  }

  fn vfs_path(&self, path: &Path) -> io::Result<VfsPath> {
    let path = path.to_string_lossy().replace('\\', "/");
    let path = path.trim_start_matches('/');
    if path.is_empty() {
      return Ok(self.root.clone());
    }
    self.root.join(path).map_err(into_io_error)
  }
}

fn into_io_error(err: vfs::VfsError) -> io::Error {
  io::Error::other(err.to_string())
}

impl FileSystem for MemoryFileSystem {
  fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
    let path = self.vfs_path(path)?;
    if !path.is_file().map_err(into_io_error)? {
      return Err(io::Error::new(io::ErrorKind::NotFound, format!("{} not found", path.as_str())));
    }
    let mut file = path.open_file().map_err(into_io_error)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
  }

  fn write(&self, path: &Path, content: &[u8]) -> io::Result<()> {
    let path = self.vfs_path(path)?;
    path.parent().create_dir_all().map_err(into_io_error)?;
    let mut file = path.create_file().map_err(into_io_error)?;
    file.write_all(content)?;
    file.flush()
  }

  fn exists(&self, path: &Path) -> bool {
    self.vfs_path(path).and_then(|p| p.exists().map_err(into_io_error)).unwrap_or(false)
  }

  fn walk_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
    let dir = self.vfs_path(dir)?;
    if !dir.is_dir().map_err(into_io_error)? {
      return Ok(vec![]);
    }
    let prefix = format!("{}/", dir.as_str());
    let mut files = vec![];
    for entry in dir.walk_dir().map_err(into_io_error)? {
      let entry = entry.map_err(into_io_error)?;
      if entry.is_file().map_err(into_io_error)? {
        let relative = entry.as_str().strip_prefix(&prefix).unwrap_or(entry.as_str());
        files.push(PathBuf::from(relative));
      }
    }
    files.sort();
    Ok(files)
  }
}

#[test]
fn test_memory_file_system() {
  let fs = MemoryFileSystem::with_files([("/project/icons/16.png", b"png".as_slice())]).unwrap();
  assert!(fs.exists(Path::new("/project/icons/16.png")));
  assert!(!fs.exists(Path::new("/project/icons/32.png")));
  assert_eq!(fs.read(Path::new("/project/icons/16.png")).unwrap(), b"png");

  fs.write(Path::new("/dist/manifest.json"), b"{}\n").unwrap();
  assert_eq!(fs.read_to_string(Path::new("/dist/manifest.json")).unwrap(), "{}\n");
  assert_eq!(
    fs.read(Path::new("/dist/missing.json")).unwrap_err().kind(),
    io::ErrorKind::NotFound
  );
}

#[test]
fn test_walk_dir() {
  let fs = MemoryFileSystem::with_files([
    ("/project/_locales/en/messages.json", b"{}".as_slice()),
    ("/project/_locales/de/messages.json", b"{}".as_slice()),
  ])
  .unwrap();
  assert_eq!(
    fs.walk_dir(Path::new("/project/_locales")).unwrap(),
    vec![PathBuf::from("de/messages.json"), PathBuf::from("en/messages.json")]
  );
  assert!(fs.walk_dir(Path::new("/project/missing")).unwrap().is_empty());
}
