use std::{
  sync::{
    atomic::{AtomicU64, Ordering},
    Arc, Weak,
  },
  time::Duration,
};

use crxpack_common::{HmrPayload, RuntimeMessage};
use dashmap::DashMap;
use tokio::sync::mpsc;

/// The long-lived channel opened by the background context. Content scripts connect a
/// [`RuntimePort`] and receive every broadcast message.
#[derive(Debug, Clone, Default)]
pub struct RuntimeHub {
  inner: Arc<HubInner>,
}

#[derive(Debug, Default)]
struct HubInner {
  ports: DashMap<u64, mpsc::UnboundedSender<RuntimeMessage>>,
  next_id: AtomicU64,
}

impl RuntimeHub {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn connect(&self) -> RuntimePort {
    let (tx, rx) = mpsc::unbounded_channel();
    let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
    self.inner.ports.insert(id, tx);
    tracing::trace!(port = id, "runtime port connected");
    RuntimePort { id, hub: Arc::downgrade(&self.inner), rx }
  }

  pub fn connections(&self) -> usize {
    self.inner.ports.len()
  }

  /// Sends `message` to every connected port and forgets ports whose receiver is gone. Returns
  /// the number of ports reached.
  pub fn broadcast(&self, message: &RuntimeMessage) -> usize {
    let mut reached = 0;
    self.inner.ports.retain(|_, port| {
      let alive = port.send(message.clone()).is_ok();
      reached += usize::from(alive);
      alive
    });
    reached
  }

  pub fn send_payload(&self, payload: HmrPayload) -> usize {
    self.broadcast(&RuntimeMessage::Hmr { payload })
  }
}

/// A content script's end of the runtime channel.
#[derive(Debug)]
pub struct RuntimePort {
  id: u64,
  hub: Weak<HubInner>,
  rx: mpsc::UnboundedReceiver<RuntimeMessage>,
}

impl RuntimePort {
  pub async fn recv(&mut self) -> Option<RuntimeMessage> {
    self.rx.recv().await
  }

  pub fn try_recv(&mut self) -> Option<RuntimeMessage> {
    self.rx.try_recv().ok()
  }

  /// Fails once the background context is gone or has forgotten this port.
  pub fn ping(&self) -> bool {
    self.hub.upgrade().is_some_and(|hub| hub.ports.get(&self.id).is_some_and(|port| !port.is_closed()))
  }

  /// Pings every `interval` and resolves with [`RuntimeMessage::RuntimeReload`] once a ping fails.
  /// The channel gives no other signal when the extension is reloaded or removed.
  pub async fn watchdog(&self, interval: Duration) -> RuntimeMessage {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
      ticker.tick().await;
      if !self.ping() {
        tracing::warn!(port = self.id, "runtime channel is dead, reloading page");
        return RuntimeMessage::RuntimeReload;
      }
    }
  }
}

impl Drop for RuntimePort {
  fn drop(&mut self) {
    if let Some(hub) = self.hub.upgrade() {
      hub.ports.remove(&self.id);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fans_out_and_forgets_dropped_ports() {
    let hub = RuntimeHub::new();
    let mut first = hub.connect();
    let second = hub.connect();
    assert_eq!(hub.connections(), 2);

    drop(second);
    assert_eq!(hub.broadcast(&RuntimeMessage::Ping), 1);
    assert_eq!(first.try_recv(), Some(RuntimeMessage::Ping));
    assert_eq!(hub.connections(), 1);
  }

  #[tokio::test(start_paused = true)]
  async fn watchdog_fires_when_the_background_goes_away() {
    let hub = RuntimeHub::new();
    let port = hub.connect();
    assert!(port.ping());

    drop(hub);
    assert!(!port.ping());
    let message = port.watchdog(Duration::from_secs(5)).await;
    assert_eq!(message, RuntimeMessage::RuntimeReload);
  }
}
