use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionWorld {
  #[default]
  Isolated,
  Main,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentScriptDeclaration {
  #[serde(default)]
  pub matches: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub js: Vec<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub css: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub world: Option<ExecutionWorld>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

impl ContentScriptDeclaration {
  pub fn is_main_world(&self) -> bool {
    matches!(self.world, Some(ExecutionWorld::Main))
  }
}
