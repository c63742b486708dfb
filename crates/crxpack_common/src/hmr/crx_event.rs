use serde_json::{json, Value};

use crate::{HmrPayload, HmrUpdate};

pub const CRX_EVENT_PREFIX: &str = "crx:";

/// Extension-scoped reload instruction, sent to runtime contexts as a custom HMR payload.
#[derive(Debug, Clone, PartialEq)]
pub enum CrxEvent {
  /// Reinitialize the extension runtime.
  FullReload,
  /// Swap modules of loaded content scripts. Paths are package-relative.
  Update { updates: Vec<HmrUpdate> },
  Prune { paths: Vec<String> },
}

impl CrxEvent {
  pub fn event_name(&self) -> &'static str {
    match self {
      Self::FullReload => "crx:full-reload",
      Self::Update { .. } => "crx:update",
      Self::Prune { .. } => "crx:prune",
    }
  }

  fn data(&self) -> Value {
    match self {
      Self::FullReload => json!({}),
      Self::Update { updates } => json!({ "updates": updates }),
      Self::Prune { paths } => json!({ "paths": paths }),
    }
  }

  /// `{ type: "custom", event: "crx:<kind>", data }`
  pub fn into_payload(self) -> HmrPayload {
    let data = self.data();
    HmrPayload::Custom { event: self.event_name().to_string(), data: Some(data) }
  }
}

#[test]
fn test_wire_format() {
  let payload = CrxEvent::Prune { paths: vec!["/src/a.ts.js".to_string()] }.into_payload();
  assert_eq!(
    serde_json::to_value(payload).unwrap(),
    json!({ "type": "custom", "event": "crx:prune", "data": { "paths": ["/src/a.ts.js"] } })
  );
  assert_eq!(
    serde_json::to_value(CrxEvent::FullReload.into_payload()).unwrap(),
    json!({ "type": "custom", "event": "crx:full-reload", "data": {} })
  );
}
