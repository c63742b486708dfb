use std::path::PathBuf;

use clap::Args;

use crate::types::build_mode::BuildMode;

#[derive(Args)]
pub struct InputArgs {
  /// Manifest V3 JSON file.
  #[clap(long, short = 'm')]
  pub manifest: PathBuf,

  /// Bundle graph description, as dumped by the bundler.
  #[clap(long, short = 'g')]
  pub graph: PathBuf,

  #[clap(long)]
  pub root: Option<PathBuf>,

  #[clap(long)]
  pub public_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct OutputArgs {
  #[clap(long, short = 'd')]
  pub out_dir: Option<PathBuf>,

  #[clap(long, value_enum)]
  pub mode: Option<BuildMode>,

  /// Dev server port development loaders import from.
  #[clap(long, short = 'p')]
  pub port: Option<u16>,

  /// Declare content script CSS as web accessible instead of injecting it.
  #[clap(long)]
  pub no_inject_css: bool,

  #[clap(long, short = 's')]
  pub silent: bool,
}
