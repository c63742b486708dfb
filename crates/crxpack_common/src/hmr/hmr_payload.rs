use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Change notification as published by the dev server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrPayload {
  Connected,
  Update {
    updates: Vec<HmrUpdate>,
  },
  Prune {
    paths: Vec<String>,
  },
  FullReload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    path: Option<String>,
  },
  Custom {
    event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
  },
  Error {
    err: Value,
  },
}

impl HmrPayload {
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Connected => "connected",
      Self::Update { .. } => "update",
      Self::Prune { .. } => "prune",
      Self::FullReload { .. } => "full-reload",
      Self::Custom { .. } => "custom",
      Self::Error { .. } => "error",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HmrUpdateKind {
  JsUpdate,
  CssUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmrUpdate {
  #[serde(rename = "type")]
  pub kind: HmrUpdateKind,
  pub path: String,
  pub accepted_path: String,
  #[serde(default)]
  pub timestamp: u64,
}

#[test]
fn test_payload_wire_format() {
  let payload: HmrPayload = serde_json::from_str(
    r#"{"type":"update","updates":[{"type":"js-update","path":"/src/a.ts","acceptedPath":"/src/a.ts","timestamp":1}]}"#,
  )
  .unwrap();
  let HmrPayload::Update { updates } = &payload else { unreachable!() };
  assert_eq!(updates[0].kind, HmrUpdateKind::JsUpdate);
  assert_eq!(
    serde_json::to_value(HmrPayload::FullReload { path: None }).unwrap(),
    serde_json::json!({ "type": "full-reload" })
  );
}
