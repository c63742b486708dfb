use std::{path::PathBuf, time::Duration};

use crate::BuildMode;

#[derive(Debug, Clone)]
pub struct NormalizedCrxOptions {
  pub root: PathBuf,
  pub public_dir: PathBuf,
  pub out_dir: PathBuf,
  pub mode: BuildMode,
  pub server_port: Option<u16>,

  // --- Content scripts
  pub inject_css: bool,
  pub content_hmr_timeout: Duration,
  pub preamble_code: Option<String>,

  // --- Hmr
  pub hmr_buffer_timeout: Duration,
  pub hmr_channel_capacity: usize,
}

impl NormalizedCrxOptions {
  #[inline]
  pub fn is_serve(&self) -> bool {
    self.mode.is_serve()
  }
}
