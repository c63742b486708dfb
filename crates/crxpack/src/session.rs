use std::sync::Arc;

use crxpack_common::CrxOptions;
use crxpack_error::BuildResult;

use crate::{
  clock::BuildPhaseClock, content_scripts::ContentScriptTable,
  dynamic_script::DynamicScriptRegistry, utils::normalize_options::normalize_options,
  SharedOptions,
};

/// Everything one watch session shares between builds: options, the build-phase clock and the
/// script tables. Sessions never share state with each other.
#[derive(Debug, Clone)]
pub struct BuildSession {
  pub options: SharedOptions,
  pub clock: BuildPhaseClock,
  pub dynamic_scripts: DynamicScriptRegistry,
  pub content_scripts: Arc<ContentScriptTable>,
}

impl BuildSession {
  pub fn new(options: CrxOptions) -> BuildResult<Self> {
    Ok(Self::with_options(Arc::new(normalize_options(options)?)))
  }

  pub fn with_options(options: SharedOptions) -> Self {
    let clock = BuildPhaseClock::new();
    Self {
      dynamic_scripts: DynamicScriptRegistry::new(Arc::clone(&options), clock.clone()),
      content_scripts: Arc::default(),
      options,
      clock,
    }
  }

  /// Resets per-build state and opens a new generation on the clock.
  pub(crate) fn begin_build(&self) -> u64 {
    self.dynamic_scripts.begin_build();
    self.content_scripts.begin_build();
    self.clock.build_start()
  }
}
