use std::path::Path;

use crxpack_common::ManifestV3;
use crxpack_fs::FileSystem;
use crxpack_utils::{match_pattern::is_glob, path_ext::PathExt};
use itertools::Itertools;
use serde_json::Value;

const LOCALE_MESSAGES: &str = "_locales/**/messages.json";

/// Every file a manifest references, grouped by the field that references it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ManifestFiles {
  pub content_scripts: Vec<String>,
  pub content_styles: Vec<String>,
  pub background: Vec<String>,
  pub html: Vec<String>,
  pub icons: Vec<String>,
  pub locales: Vec<String>,
  pub rulesets: Vec<String>,
  pub web_accessible_resources: Vec<String>,
}

impl ManifestFiles {
  /// Static files the bundler does not produce itself.
  pub fn assets(&self) -> impl Iterator<Item = &String> {
    self
      .icons
      .iter()
      .chain(&self.locales)
      .chain(&self.rulesets)
      .chain(&self.web_accessible_resources)
  }
}

fn dedup(files: impl IntoIterator<Item = String>) -> Vec<String> {
  files.into_iter().unique().collect()
}

/// Icon paths: a single string or a size-to-path map.
fn icon_paths(value: &Value) -> Vec<String> {
  match value {
    Value::String(path) => vec![path.clone()],
    Value::Object(icons) => icons.values().filter_map(Value::as_str).map(String::from).collect(),
    _ => vec![],
  }
}

/// Project files under `root` matching `glob`, as root-relative slash paths.
fn glob_files(fs: &dyn FileSystem, root: &Path, glob: &str) -> std::io::Result<Vec<String>> {
  let files = fs
    .walk_dir(root)?
    .into_iter()
    .map(|path| path.expect_to_slash())
    .filter(|path| !path.starts_with("node_modules/") && fast_glob::glob_match(glob, path))
    .sorted()
    .collect();
  Ok(files)
}

pub fn manifest_files(
  manifest: &ManifestV3,
  root: &Path,
  fs: &dyn FileSystem,
) -> std::io::Result<ManifestFiles> {
  let locales = if manifest.default_locale.is_some() {
    glob_files(fs, root, LOCALE_MESSAGES)?
  } else {
    vec![]
  };

  let rulesets = manifest
    .declarative_net_request
    .iter()
    .flat_map(|dnr| dnr.rule_resources.iter().map(|rule| rule.path.clone()));

  let mut icons = manifest.icons.iter().flat_map(|icons| icons.values().cloned()).collect::<Vec<_>>();
  if let Some(default_icon) = manifest.action.as_ref().and_then(|action| action.rest.get("default_icon"))
  {
    icons.extend(icon_paths(default_icon));
  }

  let mut web_accessible_resources = vec![];
  for resource in manifest.web_accessible_resources.iter().flatten().flat_map(|entry| entry.resources())
  {
    if resource == "*" || resource == "**/*" {
      continue;
    }
    if is_glob(resource) {
      web_accessible_resources.extend(glob_files(fs, root, resource)?);
    } else {
      web_accessible_resources.push(resource.clone());
    }
  }

  Ok(ManifestFiles {
    content_scripts: dedup(manifest.content_scripts.iter().flat_map(|script| script.js.clone())),
    content_styles: dedup(manifest.content_scripts.iter().flat_map(|script| script.css.clone())),
    background: manifest
      .background
      .iter()
      .filter_map(|background| background.service_worker.clone())
      .collect(),
    html: manifest.html_files(),
    icons: dedup(icons),
    locales: dedup(locales),
    rulesets: dedup(rulesets),
    web_accessible_resources,
  })
}
