use std::{path::PathBuf, time::Duration};

use crate::BuildMode;

#[derive(Default, Debug, Clone)]
pub struct CrxOptions {
  pub root: Option<PathBuf>,
  /// Fallback directory for manifest assets. Relative to `root`.
  pub public_dir: Option<PathBuf>,
  /// Relative to `root`.
  pub out_dir: Option<PathBuf>,
  pub mode: Option<BuildMode>,
  pub server_port: Option<u16>,
  pub content_scripts: Option<ContentScriptOptions>,
  pub hmr: Option<HmrOptions>,
}

#[derive(Default, Debug, Clone)]
pub struct ContentScriptOptions {
  /// Fold CSS imported by a declared content script into its manifest `css` list.
  pub inject_css: Option<bool>,
  /// Interval at which content scripts ping the runtime channel.
  pub hmr_timeout: Option<Duration>,
  /// Code run before the dev client, e.g. a framework refresh preamble.
  pub preamble_code: Option<String>,
}

#[derive(Default, Debug, Clone)]
pub struct HmrOptions {
  /// Buffered change events are dropped when no bundle is ready within this window.
  pub buffer_timeout: Option<Duration>,
  pub channel_capacity: Option<usize>,
}
