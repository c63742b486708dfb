use std::{
  fmt::Display,
  ops::{Deref, DerefMut},
};

use crate::CrxError;

/// A non-empty collection of errors that aborted a build.
#[derive(Debug)]
pub struct BuildError(pub Vec<anyhow::Error>);

impl BuildError {
  /// Returns the first error in the collection that is a [CrxError].
  pub fn find_crx_error(&self) -> Option<&CrxError> {
    self.0.iter().find_map(|err| err.downcast_ref::<CrxError>())
  }

  /// Collapses the collection into one error, e.g. to hand it back through a plugin hook.
  pub fn into_anyhow(mut self) -> anyhow::Error {
    if self.0.len() == 1 {
      return self.0.remove(0);
    }
    anyhow::anyhow!("{self}")
  }
}

impl Deref for BuildError {
  type Target = Vec<anyhow::Error>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![error])
  }
}

impl From<Vec<anyhow::Error>> for BuildError {
  fn from(errors: Vec<anyhow::Error>) -> Self {
    Self(errors)
  }
}

impl From<CrxError> for BuildError {
  fn from(error: CrxError) -> Self {
    Self(vec![error.into()])
  }
}

impl From<std::io::Error> for BuildError {
  fn from(error: std::io::Error) -> Self {
    CrxError::io(error).into()
  }
}

impl Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for (i, err) in self.0.iter().enumerate() {
      if i > 0 {
        writeln!(f)?;
      }
      write!(f, "{err}")?;
    }
    Ok(())
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

