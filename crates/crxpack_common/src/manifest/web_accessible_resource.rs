use serde::{Deserialize, Serialize};

/// Placeholder resource standing in for every dynamic script's files.
pub const DYNAMIC_RESOURCE: &str = "<dynamic_resource>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WebAccessibleResource {
  ByMatch(WebAccessibleResourceByMatch),
  ById(WebAccessibleResourceById),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAccessibleResourceByMatch {
  pub matches: Vec<String>,
  pub resources: Vec<String>,
  #[serde(default)]
  pub use_dynamic_url: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAccessibleResourceById {
  pub extension_ids: Vec<String>,
  pub resources: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub use_dynamic_url: Option<bool>,
}

impl WebAccessibleResource {
  pub fn resources(&self) -> &[String] {
    match self {
      Self::ByMatch(entry) => &entry.resources,
      Self::ById(entry) => &entry.resources,
    }
  }

  /// Declares the files of every dynamic script visible to pages matching `matches`.
  pub fn dynamic(matches: Option<Vec<String>>, use_dynamic_url: Option<bool>) -> Self {
    Self::ByMatch(WebAccessibleResourceByMatch {
      matches: matches
        .unwrap_or_else(|| vec!["http://*/*".to_string(), "https://*/*".to_string()]),
      resources: vec![DYNAMIC_RESOURCE.to_string()],
      use_dynamic_url: use_dynamic_url.unwrap_or(true),
    })
  }
}

/// Entry for a manifest's `web_accessible_resources` that scopes dynamic scripts to `matches`.
/// Defaults to every http(s) page with `use_dynamic_url`.
pub fn define_dynamic_resource(
  matches: Option<Vec<String>>,
  use_dynamic_url: Option<bool>,
) -> WebAccessibleResource {
  WebAccessibleResource::dynamic(matches, use_dynamic_url)
}

#[test]
fn test_untagged_variants() {
  let entries: Vec<WebAccessibleResource> = serde_json::from_str(
    r#"[
      { "matches": ["https://a.com/*"], "resources": ["a.png"] },
      { "extension_ids": ["abc"], "resources": ["b.png"] }
    ]"#,
  )
  .unwrap();
  assert!(matches!(&entries[0], WebAccessibleResource::ByMatch(entry) if !entry.use_dynamic_url));
  assert!(matches!(&entries[1], WebAccessibleResource::ById(entry) if entry.extension_ids == ["abc"]));
}

#[test]
fn test_dynamic_defaults() {
  let WebAccessibleResource::ByMatch(entry) = WebAccessibleResource::dynamic(None, None) else {
    unreachable!()
  };
  assert_eq!(entry.matches, ["http://*/*", "https://*/*"]);
  assert_eq!(entry.resources, [DYNAMIC_RESOURCE]);
  assert!(entry.use_dynamic_url);
}
