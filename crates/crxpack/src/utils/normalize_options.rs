use std::{path::PathBuf, time::Duration};

use crxpack_common::{CrxOptions, NormalizedCrxOptions};
use crxpack_error::BuildResult;

pub const DEFAULT_CONTENT_HMR_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_HMR_BUFFER_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HMR_CHANNEL_CAPACITY: usize = 1024;

pub fn normalize_options(raw_options: CrxOptions) -> BuildResult<NormalizedCrxOptions> {
  let root = match raw_options.root {
    Some(root) => root,
    None => std::env::current_dir()?,
  };
  // Avoid UNC paths on Windows, asset lookups join onto the root.
  let root = dunce::simplified(&root).to_path_buf();

  let public_dir = root.join(raw_options.public_dir.unwrap_or_else(|| PathBuf::from("public")));
  let out_dir = root.join(raw_options.out_dir.unwrap_or_else(|| PathBuf::from("dist")));

  let content_scripts = raw_options.content_scripts.unwrap_or_default();
  let hmr = raw_options.hmr.unwrap_or_default();

  // Bounded channels reject a zero capacity.
  let hmr_channel_capacity = hmr.channel_capacity.unwrap_or(DEFAULT_HMR_CHANNEL_CAPACITY).max(1);

  Ok(NormalizedCrxOptions {
    root,
    public_dir,
    out_dir,
    mode: raw_options.mode.unwrap_or_default(),
    server_port: raw_options.server_port,
    inject_css: content_scripts.inject_css.unwrap_or(true),
    content_hmr_timeout: content_scripts.hmr_timeout.unwrap_or(DEFAULT_CONTENT_HMR_TIMEOUT),
    preamble_code: content_scripts.preamble_code,
    hmr_buffer_timeout: hmr.buffer_timeout.unwrap_or(DEFAULT_HMR_BUFFER_TIMEOUT),
    hmr_channel_capacity,
  })
}

#[test]
fn test_defaults() {
  let options =
    normalize_options(CrxOptions { root: Some(PathBuf::from("/project")), ..Default::default() })
      .unwrap();
  assert_eq!(options.public_dir, PathBuf::from("/project/public"));
  assert_eq!(options.out_dir, PathBuf::from("/project/dist"));
  assert!(options.inject_css);
  assert!(!options.is_serve());
  assert_eq!(options.content_hmr_timeout, DEFAULT_CONTENT_HMR_TIMEOUT);
  assert_eq!(options.hmr_channel_capacity, DEFAULT_HMR_CHANNEL_CAPACITY);
}
