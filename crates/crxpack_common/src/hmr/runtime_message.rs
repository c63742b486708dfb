use serde::{Deserialize, Serialize};

use crate::HmrPayload;

/// Messages carried over the runtime channel between the background context and content scripts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RuntimeMessage {
  Hmr { payload: HmrPayload },
  Ping,
  Pong,
  /// The runtime is going away; content scripts reload their page after a short delay.
  RuntimeReload,
}
