use std::time::Duration;

use crxpack_common::HmrPayload;
use tokio::time::Instant;

#[derive(Debug)]
struct Buffered {
  /// Last ready generation the publisher could have observed.
  seen_ready: u64,
  payload: HmrPayload,
}

/// Change notifications withheld until the next `bundleReady` tick. The window opens with the
/// first buffered payload and is dropped whole when no tick arrives within `timeout`.
#[derive(Debug)]
pub struct HmrBuffer {
  payloads: Vec<Buffered>,
  opened_at: Option<Instant>,
  timeout: Duration,
}

impl HmrBuffer {
  pub fn new(timeout: Duration) -> Self {
    Self { payloads: vec![], opened_at: None, timeout }
  }

  /// Buffers `payload`, published while `seen_ready` was the latest ready generation.
  pub fn push(&mut self, payload: HmrPayload, seen_ready: u64, now: Instant) {
    self.opened_at.get_or_insert(now);
    self.payloads.push(Buffered { seen_ready, payload });
  }

  /// Instant at which the open window expires.
  pub fn deadline(&self) -> Option<Instant> {
    self.opened_at.map(|opened_at| opened_at + self.timeout)
  }

  /// Drains, in publish order, every payload published before generation `ready` became ready.
  /// Later payloads stay for the following tick and keep the window open.
  pub fn on_bundle_ready(&mut self, ready: u64) -> Vec<HmrPayload> {
    let (released, kept) =
      std::mem::take(&mut self.payloads).into_iter().partition::<Vec<_>, _>(|buffered| {
        buffered.seen_ready < ready
      });
    self.payloads = kept;
    if self.payloads.is_empty() {
      self.opened_at = None;
    }
    released.into_iter().map(|buffered| buffered.payload).collect()
  }

  /// Drops the window if it is past its deadline, returning the number of dropped payloads.
  pub fn expire(&mut self, now: Instant) -> usize {
    match self.deadline() {
      Some(deadline) if now >= deadline => {
        self.opened_at = None;
        std::mem::take(&mut self.payloads).len()
      }
      _ => 0,
    }
  }

  pub fn len(&self) -> usize {
    self.payloads.len()
  }

  pub fn is_empty(&self) -> bool {
    self.payloads.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn prune(path: &str) -> HmrPayload {
    HmrPayload::Prune { paths: vec![path.to_string()] }
  }

  #[test]
  fn releases_payloads_in_publish_order() {
    let start = Instant::now();
    let mut buffer = HmrBuffer::new(Duration::from_secs(30));
    buffer.push(prune("/a.ts"), 1, start);
    buffer.push(prune("/b.ts"), 1, start + Duration::from_secs(1));
    assert_eq!(buffer.expire(start + Duration::from_secs(10)), 0);
    assert!(buffer.on_bundle_ready(1).is_empty(), "published after bundle 1");
    assert_eq!(buffer.on_bundle_ready(2), vec![prune("/a.ts"), prune("/b.ts")]);
    assert!(buffer.is_empty());
    assert_eq!(buffer.deadline(), None);
  }

  #[test]
  fn payloads_published_after_the_tick_wait_for_the_next_one() {
    let start = Instant::now();
    let mut buffer = HmrBuffer::new(Duration::from_secs(30));
    buffer.push(prune("/a.ts"), 0, start);
    buffer.push(prune("/b.ts"), 1, start);
    assert_eq!(buffer.on_bundle_ready(1), vec![prune("/a.ts")]);
    assert_eq!(buffer.len(), 1);
    assert!(buffer.deadline().is_some());
    assert_eq!(buffer.on_bundle_ready(2), vec![prune("/b.ts")]);
  }

  #[test]
  fn window_expires_from_its_first_payload() {
    let start = Instant::now();
    let mut buffer = HmrBuffer::new(Duration::from_secs(30));
    buffer.push(prune("/a.ts"), 0, start);
    buffer.push(prune("/b.ts"), 0, start + Duration::from_secs(20));
    assert_eq!(buffer.deadline(), Some(start + Duration::from_secs(30)));
    assert_eq!(buffer.expire(start + Duration::from_secs(30)), 2);
    assert!(buffer.on_bundle_ready(1).is_empty());

    // A fresh window starts with the next payload.
    buffer.push(prune("/c.ts"), 1, start + Duration::from_secs(40));
    assert_eq!(buffer.deadline(), Some(start + Duration::from_secs(70)));
  }
}
