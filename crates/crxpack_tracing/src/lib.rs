use std::sync::atomic::{AtomicBool, Ordering};

use tracing::Level;

static IS_INIT: AtomicBool = AtomicBool::new(false);

/// Installs the global subscriber once. Respects `RUST_LOG`; `crxpack*` targets log down to
/// `TRACE` when the env filter lets them through.
pub fn init() {
  use tracing_subscriber::{filter::Targets, fmt, prelude::*, EnvFilter};

  if IS_INIT.swap(true, Ordering::SeqCst) {
    return;
  }

  tracing_subscriber::registry()
    .with(fmt::layer().with_target(true))
    .with(EnvFilter::from_default_env())
    .with(Targets::new().with_targets(vec![("crxpack", Level::TRACE)]))
    .init();
}
