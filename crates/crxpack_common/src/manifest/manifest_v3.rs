use crxpack_utils::indexmap::FxIndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ContentScriptDeclaration, WebAccessibleResource};

/// A Manifest V3 document. Fields this crate reads or rewrites are typed; everything else is kept
/// verbatim in `rest` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestV3 {
  pub manifest_version: u64,
  pub name: String,
  pub version: String,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub icons: Option<FxIndexMap<String, String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_locale: Option<String>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub action: Option<ManifestAction>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub background: Option<ManifestBackground>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub content_scripts: Vec<ContentScriptDeclaration>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub web_accessible_resources: Option<Vec<WebAccessibleResource>>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options_page: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options_ui: Option<ManifestOptionsUi>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub devtools_page: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sandbox: Option<ManifestSandbox>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub side_panel: Option<ManifestSidePanel>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub chrome_url_overrides: Option<FxIndexMap<String, String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub declarative_net_request: Option<DeclarativeNetRequest>,

  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

impl ManifestV3 {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      manifest_version: 3,
      name: name.into(),
      version: version.into(),
      icons: None,
      default_locale: None,
      action: None,
      background: None,
      content_scripts: vec![],
      web_accessible_resources: None,
      options_page: None,
      options_ui: None,
      devtools_page: None,
      sandbox: None,
      side_panel: None,
      chrome_url_overrides: None,
      declarative_net_request: None,
      rest: Map::new(),
    }
  }

  /// Extension pages declared by the manifest, without query or hash, sorted and deduplicated.
  pub fn html_files(&self) -> Vec<String> {
    let mut files = vec![];
    if let Some(popup) = self.action.as_ref().and_then(|action| action.default_popup.as_ref()) {
      files.push(popup);
    }
    if let Some(overrides) = &self.chrome_url_overrides {
      files.extend(overrides.values());
    }
    files.extend(self.devtools_page.as_ref());
    files.extend(self.options_page.as_ref());
    if let Some(page) = self.options_ui.as_ref().and_then(|ui| ui.page.as_ref()) {
      files.push(page);
    }
    if let Some(sandbox) = &self.sandbox {
      files.extend(sandbox.pages.iter());
    }
    if let Some(path) = self.side_panel.as_ref().and_then(|panel| panel.default_path.as_ref()) {
      files.push(path);
    }

    let mut files = files
      .into_iter()
      .map(|file| crxpack_utils::path_ext::strip_query(file).to_string())
      .collect::<Vec<_>>();
    files.sort();
    files.dedup();
    files
  }

  /// Whether the manifest declares anything the bundler has to compile.
  pub fn declares_scripts(&self) -> bool {
    self.content_scripts.iter().any(|script| !script.js.is_empty())
      || self.background.as_ref().is_some_and(|bg| bg.service_worker.is_some())
      || !self.html_files().is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestAction {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_popup: Option<String>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestBackground {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub service_worker: Option<String>,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestOptionsUi {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub page: Option<String>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSandbox {
  #[serde(default)]
  pub pages: Vec<String>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestSidePanel {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub default_path: Option<String>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeNetRequest {
  #[serde(default)]
  pub rule_resources: Vec<RuleResource>,
  #[serde(flatten)]
  pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResource {
  pub id: String,
  pub enabled: bool,
  pub path: String,
}

#[test]
fn test_unknown_fields_round_trip() {
  let json = r#"{
    "manifest_version": 3,
    "name": "demo",
    "version": "1.0.0",
    "permissions": ["storage"],
    "action": { "default_popup": "src/popup.html", "default_title": "Demo" }
  }"#;
  let manifest: ManifestV3 = serde_json::from_str(json).unwrap();
  assert_eq!(manifest.rest["permissions"], serde_json::json!(["storage"]));
  let value = serde_json::to_value(&manifest).unwrap();
  assert_eq!(value["action"]["default_title"], "Demo");
  assert_eq!(value["permissions"], serde_json::json!(["storage"]));
}

#[test]
fn test_html_files() {
  let mut manifest = ManifestV3::new("demo", "1.0.0");
  manifest.action = Some(ManifestAction {
    default_popup: Some("src/popup.html?tab=1".to_string()),
    ..Default::default()
  });
  manifest.options_page = Some("src/options.html".to_string());
  manifest.options_ui =
    Some(ManifestOptionsUi { page: Some("src/options.html".to_string()), ..Default::default() });
  manifest.sandbox = Some(ManifestSandbox {
    pages: vec!["src/sandbox.html#a".to_string()],
    ..Default::default()
  });
  assert_eq!(
    manifest.html_files(),
    vec!["src/options.html", "src/popup.html", "src/sandbox.html"]
  );
}
