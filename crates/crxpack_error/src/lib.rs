mod build_error;
mod error;
mod error_code;
mod error_kind;

pub use crate::{
  build_error::{BuildError, BuildResult},
  error::CrxError,
  error_kind::ErrorKind,
};
