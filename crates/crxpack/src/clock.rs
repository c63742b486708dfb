use std::{
  future::Future,
  sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
  },
};

use tokio::sync::{watch, Notify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
  Idle,
  BuildStart,
  BundleReady,
  Cancelled,
}

impl BuildPhase {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Idle => "idle",
      Self::BuildStart => "buildStart",
      Self::BundleReady => "bundleReady",
      Self::Cancelled => "cancelled",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
  pub generation: u64,
  pub phase: BuildPhase,
  /// Latest generation that reached `bundleReady`. Never decreases, so observers that miss
  /// intermediate states still see every ready bundle.
  pub last_ready: u64,
  pub last_cancelled: u64,
}

/// A terminal event of one build generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
  BundleReady(u64),
  Cancelled(u64),
}

/// Milestones a build passes through. Each `build_start` opens a new generation which ends with
/// either `bundle_ready` or `cancel`.
#[derive(Debug, Clone)]
pub struct BuildPhaseClock {
  inner: Arc<ClockInner>,
}

#[derive(Debug)]
struct ClockInner {
  state: watch::Sender<ClockState>,
  rebuild_pending: AtomicBool,
  rebuild: Notify,
}

impl Default for BuildPhaseClock {
  fn default() -> Self {
    Self::new()
  }
}

impl BuildPhaseClock {
  pub fn new() -> Self {
    let (state, _) = watch::channel(ClockState {
      generation: 0,
      phase: BuildPhase::Idle,
      last_ready: 0,
      last_cancelled: 0,
    });
    Self {
      inner: Arc::new(ClockInner {
        state,
        rebuild_pending: AtomicBool::new(false),
        rebuild: Notify::new(),
      }),
    }
  }

  pub fn state(&self) -> ClockState {
    *self.inner.state.borrow()
  }

  pub fn subscribe(&self) -> watch::Receiver<ClockState> {
    self.inner.state.subscribe()
  }

  /// Opens a new generation. A pending rebuild request is satisfied by it.
  pub fn build_start(&self) -> u64 {
    let mut generation = 0;
    self.inner.state.send_modify(|state| {
      state.generation += 1;
      state.phase = BuildPhase::BuildStart;
      generation = state.generation;
    });
    self.inner.rebuild_pending.store(false, Ordering::SeqCst);
    tracing::debug!(generation, "buildStart");
    generation
  }

  /// Ends `generation` successfully. Ticks for a superseded generation are ignored.
  pub fn bundle_ready(&self, generation: u64) -> bool {
    let ticked = self.inner.state.send_if_modified(|state| {
      if state.generation != generation || state.phase != BuildPhase::BuildStart {
        return false;
      }
      state.phase = BuildPhase::BundleReady;
      state.last_ready = generation;
      true
    });
    if ticked {
      tracing::debug!(generation, "bundleReady");
    }
    ticked
  }

  /// Aborts `generation`, releasing everything waiting on it.
  pub fn cancel(&self, generation: u64) -> bool {
    let cancelled = self.inner.state.send_if_modified(|state| {
      if state.generation != generation || state.phase != BuildPhase::BuildStart {
        return false;
      }
      state.phase = BuildPhase::Cancelled;
      state.last_cancelled = generation;
      true
    });
    if cancelled {
      tracing::debug!(generation, "build cancelled");
    }
    cancelled
  }

  /// Resolves once `generation` (or a later one) reaches a terminal phase. The returned future
  /// owns its receiver, so it can be shared between waiters.
  pub fn tick(&self, generation: u64) -> impl Future<Output = Tick> + Send + 'static {
    let mut rx = self.subscribe();
    async move {
      let result = rx
        .wait_for(|state| state.last_ready >= generation || state.last_cancelled >= generation)
        .await
        .map(|state| *state);
      match result {
        Ok(state) if state.last_ready >= generation => Tick::BundleReady(state.last_ready),
        Ok(state) => Tick::Cancelled(state.last_cancelled),
        Err(_) => Tick::Cancelled(generation),
      }
    }
  }

  /// Asks the driver for another build. Joins the build in flight or an already pending request;
  /// returns `true` only when a new request was recorded.
  pub fn request_rebuild(&self) -> bool {
    if self.state().phase == BuildPhase::BuildStart {
      tracing::trace!("rebuild requested while building, joining current build");
      return false;
    }
    if self.inner.rebuild_pending.swap(true, Ordering::SeqCst) {
      tracing::trace!("rebuild already requested");
      return false;
    }
    tracing::debug!("rebuild requested");
    self.inner.rebuild.notify_one();
    true
  }

  pub fn is_rebuild_pending(&self) -> bool {
    self.inner.rebuild_pending.load(Ordering::SeqCst)
  }

  /// Resolves once a rebuild is pending. Used by watch-mode drivers.
  pub async fn rebuild_requested(&self) {
    while !self.is_rebuild_pending() {
      self.inner.rebuild.notified().await;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stale_ticks_are_ignored() {
    let clock = BuildPhaseClock::new();
    let first = clock.build_start();
    let second = clock.build_start();
    assert!(!clock.bundle_ready(first));
    assert!(clock.bundle_ready(second));
    assert_eq!(clock.state().phase, BuildPhase::BundleReady);
    assert!(!clock.bundle_ready(second));
  }

  #[test]
  fn last_ready_survives_the_next_build_start() {
    let clock = BuildPhaseClock::new();
    let mut rx = clock.subscribe();
    rx.borrow_and_update();

    let generation = clock.build_start();
    clock.bundle_ready(generation);
    clock.build_start();

    let state = *rx.borrow_and_update();
    assert_eq!(state.phase, BuildPhase::BuildStart);
    assert_eq!(state.last_ready, generation);
  }

  #[tokio::test]
  async fn tick_waits_for_the_in_flight_generation() {
    let clock = BuildPhaseClock::new();
    let generation = clock.build_start();
    let tick = tokio::spawn(clock.tick(generation));
    tokio::task::yield_now().await;
    assert!(!tick.is_finished());
    clock.bundle_ready(generation);
    assert_eq!(tick.await.unwrap(), Tick::BundleReady(generation));
  }

  #[tokio::test]
  async fn cancel_releases_waiters() {
    let clock = BuildPhaseClock::new();
    let generation = clock.build_start();
    let tick = tokio::spawn(clock.tick(generation));
    clock.cancel(generation);
    assert_eq!(tick.await.unwrap(), Tick::Cancelled(generation));
  }

  #[tokio::test]
  async fn cancellation_is_not_lost_when_the_next_build_starts() {
    let clock = BuildPhaseClock::new();
    let generation = clock.build_start();
    let tick = clock.tick(generation);
    clock.cancel(generation);
    clock.build_start();
    assert_eq!(tick.await, Tick::Cancelled(generation));
  }

  #[test]
  fn rebuild_requests_are_idempotent() {
    let clock = BuildPhaseClock::new();
    assert!(clock.request_rebuild());
    assert!(!clock.request_rebuild());
    assert!(clock.is_rebuild_pending());

    let generation = clock.build_start();
    assert!(!clock.is_rebuild_pending());
    assert!(!clock.request_rebuild(), "joins the build in flight");

    clock.bundle_ready(generation);
    assert!(clock.request_rebuild());
  }
}
