use std::fmt::Display;

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  /// Production build written to disk.
  #[default]
  Build,
  /// Development build backed by a dev server.
  Serve,
}

impl BuildMode {
  #[inline]
  pub fn is_serve(self) -> bool {
    matches!(self, Self::Serve)
  }
}

impl Display for BuildMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Build => write!(f, "build"),
      Self::Serve => write!(f, "serve"),
    }
  }
}

impl std::str::FromStr for BuildMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "build" | "production" => Ok(Self::Build),
      "serve" | "development" => Ok(Self::Serve),
      _ => Err(format!("unknown build mode \"{s}\", expected \"build\" or \"serve\"")),
    }
  }
}
