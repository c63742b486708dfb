use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputAsset {
  pub filename: ArcStr,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default, with = "source_as_string")]
  pub source: Vec<u8>,
}

impl OutputAsset {
  pub fn new(filename: impl Into<ArcStr>, source: impl Into<Vec<u8>>) -> Self {
    Self { filename: filename.into(), name: None, source: source.into() }
  }

  pub fn content_as_bytes(&self) -> &[u8] {
    &self.source
  }
}

/// Graph descriptions carry asset sources as text.
mod source_as_string {
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(source: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&String::from_utf8_lossy(source))
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    Ok(String::deserialize(deserializer)?.into_bytes())
  }
}
