use clap::ValueEnum;

#[derive(PartialEq, Eq, Clone, Copy, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum BuildMode {
  Build,
  Serve,
}

impl From<BuildMode> for crxpack::BuildMode {
  fn from(value: BuildMode) -> Self {
    match value {
      BuildMode::Build => crxpack::BuildMode::Build,
      BuildMode::Serve => crxpack::BuildMode::Serve,
    }
  }
}
