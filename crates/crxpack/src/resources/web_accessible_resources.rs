use arcstr::ArcStr;
use async_trait::async_trait;
use crxpack_common::{
  ManifestV3, ModuleId, ResourceSet, ScriptKind, WebAccessibleResource,
  WebAccessibleResourceByMatch, DYNAMIC_RESOURCE,
};
use crxpack_error::{BuildResult, CrxError};
use crxpack_utils::{
  indexmap::{FxIndexMap, FxIndexSet},
  match_pattern::get_match_pattern_origin,
};
use rustc_hash::FxHashMap;

use super::FileResourceResolver;
use crate::plugin::{CrxPlugin, HookManifestOutput, PluginName, RenderContext};

const DEFAULT_DYNAMIC_MATCHES: [&str; 2] = ["http://*/*", "https://*/*"];

/// A file pages load at runtime, whose closure has to be web accessible.
#[derive(Debug, Clone)]
pub struct ResourceRoot {
  pub id: ModuleId,
  pub file_name: ArcStr,
  /// Match patterns of the declaring content scripts. Ignored for dynamic scripts.
  pub matches: Vec<String>,
  pub is_dynamic: bool,
  /// The root is imported by a loader, so the root itself must be accessible.
  pub has_loader: bool,
  pub is_module: bool,
}

#[derive(Debug, Default)]
pub struct RenderedResources {
  pub entries: Vec<WebAccessibleResource>,
  /// CSS found in the closure of each root, keyed by the root's file name.
  pub css: FxHashMap<ArcStr, Vec<ArcStr>>,
}

/// Origin-level match patterns, deduplicated. Patterns that do not cover a whole origin are
/// dropped; special patterns such as `<all_urls>` are kept.
fn origins(matches: &[String]) -> Vec<String> {
  matches
    .iter()
    .filter_map(|pattern| get_match_pattern_origin(pattern))
    .filter(|origin| origin.ends_with("/*") || origin.starts_with('<'))
    .collect::<FxIndexSet<_>>()
    .into_iter()
    .collect()
}

fn strip_dynamic_resource(entry: &mut WebAccessibleResource) -> bool {
  let resources = match entry {
    WebAccessibleResource::ByMatch(entry) => &mut entry.resources,
    WebAccessibleResource::ById(entry) => &mut entry.resources,
  };
  let before = resources.len();
  resources.retain(|resource| resource != DYNAMIC_RESOURCE);
  before != resources.len()
}

/// Development declaration: the extension origin changes on every reload, so everything is
/// made accessible to every page.
pub fn dev_web_accessible_resources(
  declared: Vec<WebAccessibleResource>,
) -> Vec<WebAccessibleResource> {
  let mut entries = declared
    .into_iter()
    .filter_map(|mut entry| {
      strip_dynamic_resource(&mut entry);
      (!entry.resources().is_empty()).then_some(entry)
    })
    .collect::<Vec<_>>();
  entries.push(WebAccessibleResource::ByMatch(WebAccessibleResourceByMatch {
    matches: vec!["<all_urls>".to_string()],
    resources: vec!["**/*".to_string(), "*".to_string()],
    use_dynamic_url: true,
  }));
  entries
}

/// Unions by-match entries sharing `(use_dynamic_url, sorted matches)`. By-id entries are kept
/// as they are, ahead of the merged ones.
pub fn merge_web_accessible_resources(
  entries: Vec<WebAccessibleResource>,
) -> Vec<WebAccessibleResource> {
  let mut merged: FxIndexMap<(bool, Vec<String>), FxIndexSet<String>> = FxIndexMap::default();
  let mut combined = vec![];

  for entry in entries {
    match entry {
      WebAccessibleResource::ByMatch(WebAccessibleResourceByMatch {
        mut matches,
        resources,
        use_dynamic_url,
      }) => {
        matches.sort();
        merged.entry((use_dynamic_url, matches)).or_default().extend(resources);
      }
      by_id @ WebAccessibleResource::ById(_) => combined.push(by_id),
    }
  }

  combined.extend(merged.into_iter().filter(|(_, resources)| !resources.is_empty()).map(
    |((use_dynamic_url, matches), resources)| {
      WebAccessibleResource::ByMatch(WebAccessibleResourceByMatch {
        matches,
        resources: resources.into_iter().collect(),
        use_dynamic_url,
      })
    },
  ));
  combined
}

/// Production declaration: every root's closure, grouped by the pages allowed to load it.
pub fn render_web_accessible_resources(
  declared: Vec<WebAccessibleResource>,
  roots: &[ResourceRoot],
  resolver: &mut FileResourceResolver<'_>,
  inject_css: bool,
) -> BuildResult<RenderedResources> {
  let mut dynamic_matches = FxIndexSet::default();
  let mut dynamic_url = false;
  let mut entries = vec![];
  for mut entry in declared {
    if strip_dynamic_resource(&mut entry) {
      if let WebAccessibleResource::ByMatch(by_match) = &entry {
        dynamic_matches.extend(by_match.matches.iter().cloned());
        dynamic_url = by_match.use_dynamic_url;
      }
    }
    if !entry.resources().is_empty() {
      entries.push(entry);
    }
  }
  if dynamic_matches.is_empty() {
    dynamic_matches.extend(DEFAULT_DYNAMIC_MATCHES.map(String::from));
  }

  let mut css_by_root = FxHashMap::default();
  let mut module_resources: FxIndexMap<ArcStr, WebAccessibleResourceByMatch> =
    FxIndexMap::default();

  for root in roots {
    let ResourceSet { assets, css, mut imports } = resolver.resolve(&root.file_name)?;
    if root.has_loader {
      imports.insert(root.file_name.clone());
    }

    let mut resources =
      assets.iter().chain(imports.iter()).map(ToString::to_string).collect::<Vec<_>>();
    if root.is_dynamic || !inject_css {
      resources.extend(css.iter().map(ToString::to_string));
    }
    css_by_root.insert(root.file_name.clone(), css.into_iter().collect());

    if resources.is_empty() {
      continue;
    }
    let entry = if root.is_dynamic {
      WebAccessibleResourceByMatch {
        matches: dynamic_matches.iter().cloned().collect(),
        resources,
        use_dynamic_url: dynamic_url,
      }
    } else {
      WebAccessibleResourceByMatch {
        matches: root.matches.clone(),
        resources,
        use_dynamic_url: true,
      }
    };

    if root.is_module {
      module_resources.insert(root.file_name.clone(), entry);
    } else {
      entries.push(WebAccessibleResource::ByMatch(WebAccessibleResourceByMatch {
        matches: origins(&entry.matches),
        ..entry
      }));
    }
  }

  // Module scripts already reachable through another entry need no entry of their own.
  for entry in &entries {
    if let WebAccessibleResource::ByMatch(entry) = entry {
      for resource in &entry.resources {
        module_resources.shift_remove(resource.as_str());
      }
    }
  }
  entries.extend(module_resources.into_values().map(WebAccessibleResource::ByMatch));

  Ok(RenderedResources { entries: merge_web_accessible_resources(entries), css: css_by_root })
}

/// Fills `web_accessible_resources` from the bundle graph and folds discovered CSS into declared
/// content scripts.
#[derive(Debug)]
pub struct WebAccessibleResourcesPlugin;

impl WebAccessibleResourcesPlugin {
  fn roots(ctx: &RenderContext<'_>) -> BuildResult<Vec<ResourceRoot>> {
    let mut roots = vec![];
    for record in ctx.session.content_scripts.records() {
      if record.matches.is_empty() {
        continue;
      }
      let file_name = record
        .file_name
        .clone()
        .ok_or_else(|| CrxError::missing_root(&*record.id, record.id.to_string()))?;
      roots.push(ResourceRoot {
        has_loader: record.loader_file_name.is_some(),
        id: record.id,
        file_name,
        matches: record.matches,
        is_dynamic: false,
        is_module: false,
      });
    }

    for record in ctx.session.dynamic_scripts.records() {
      if record.compiled_ref.is_none() {
        continue;
      }
      let file_name = record
        .file_name
        .clone()
        .ok_or_else(|| CrxError::unresolved_dynamic_script(record.id.to_string()))?;
      roots.push(ResourceRoot {
        has_loader: record.loader_file_name.is_some(),
        is_module: record.kind == ScriptKind::Module,
        id: record.id,
        file_name,
        matches: vec![],
        is_dynamic: true,
      });
    }
    Ok(roots)
  }

  fn render(ctx: &RenderContext<'_>, mut manifest: ManifestV3) -> BuildResult<ManifestV3> {
    let declared = manifest.web_accessible_resources.take().unwrap_or_default();
    let options = ctx.options();

    let entries = if options.is_serve() {
      dev_web_accessible_resources(declared)
    } else {
      let roots = Self::roots(ctx)?;
      let mut resolver = FileResourceResolver::new(&*ctx.bundle, &ctx.session.dynamic_scripts);
      let rendered =
        render_web_accessible_resources(declared, &roots, &mut resolver, options.inject_css)?;

      if options.inject_css {
        let compiled_by_public = ctx
          .session
          .content_scripts
          .records()
          .into_iter()
          .filter_map(|record| Some((record.public_file_name()?.clone(), record.file_name?)))
          .collect::<FxHashMap<_, _>>();
        for declaration in &mut manifest.content_scripts {
          for js in &declaration.js {
            let Some(css) = compiled_by_public
              .get(js.as_str())
              .and_then(|file_name| rendered.css.get(file_name))
            else {
              continue;
            };
            for file in css {
              if !declaration.css.iter().any(|existing| existing == file.as_str()) {
                declaration.css.push(file.to_string());
              }
            }
          }
        }
      }
      rendered.entries
    };

    tracing::debug!(entries = entries.len(), "rendered web accessible resources");
    manifest.web_accessible_resources = (!entries.is_empty()).then_some(entries);
    Ok(manifest)
  }
}

#[async_trait]
impl CrxPlugin for WebAccessibleResourcesPlugin {
  fn name(&self) -> PluginName<'_> {
    "crx:web-accessible-resources".into()
  }

  async fn render_manifest(
    &self,
    ctx: &mut RenderContext<'_>,
    manifest: ManifestV3,
  ) -> HookManifestOutput {
    Self::render(ctx, manifest).map(Some).map_err(crxpack_error::BuildError::into_anyhow)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use crxpack_common::{CrxOptions, OutputBundle, OutputChunk};

  use super::*;
  use crate::{
    clock::BuildPhaseClock, dynamic_script::DynamicScriptRegistry,
    utils::normalize_options::normalize_options,
  };

  fn by_match(matches: &[&str], resources: &[&str], use_dynamic_url: bool) -> WebAccessibleResource {
    WebAccessibleResource::ByMatch(WebAccessibleResourceByMatch {
      matches: matches.iter().map(ToString::to_string).collect(),
      resources: resources.iter().map(ToString::to_string).collect(),
      use_dynamic_url,
    })
  }

  fn registry() -> DynamicScriptRegistry {
    let options = normalize_options(CrxOptions {
      root: Some("/project".into()),
      ..Default::default()
    })
    .unwrap();
    DynamicScriptRegistry::new(Arc::new(options), BuildPhaseClock::new())
  }

  #[test]
  fn entries_with_the_same_key_are_merged() {
    let merged = merge_web_accessible_resources(vec![
      by_match(&["https://b.com/*", "https://a.com/*"], &["a.js"], true),
      by_match(&["https://a.com/*", "https://b.com/*"], &["b.js", "a.js"], true),
      by_match(&["https://a.com/*", "https://b.com/*"], &["c.js"], false),
      by_match(&["https://c.com/*"], &["d.js"], true),
    ]);
    assert_eq!(
      merged,
      vec![
        by_match(&["https://a.com/*", "https://b.com/*"], &["a.js", "b.js"], true),
        by_match(&["https://a.com/*", "https://b.com/*"], &["c.js"], false),
        by_match(&["https://c.com/*"], &["d.js"], true),
      ]
    );
  }

  #[test]
  fn dev_declaration_allows_everything() {
    let entries = dev_web_accessible_resources(vec![
      WebAccessibleResource::dynamic(None, None),
      by_match(&["https://a.com/*"], &["logo.png"], false),
    ]);
    assert_eq!(
      entries,
      vec![
        by_match(&["https://a.com/*"], &["logo.png"], false),
        by_match(&["<all_urls>"], &["**/*", "*"], true),
      ]
    );
  }

  #[test]
  fn dynamic_scripts_use_the_declared_match_group() {
    let mut bundle = OutputBundle::new();
    bundle.insert(OutputChunk {
      filename: "assets/inject.js".into(),
      imports: vec!["assets/shared.js".into()],
      ..Default::default()
    });
    bundle.insert(OutputChunk { filename: "assets/shared.js".into(), ..Default::default() });

    let scripts = registry();
    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let roots = [ResourceRoot {
      id: "/src/inject.ts".into(),
      file_name: "assets/inject.js".into(),
      matches: vec![],
      is_dynamic: true,
      has_loader: true,
      is_module: false,
    }];
    let declared = vec![WebAccessibleResource::dynamic(
      Some(vec!["https://a.com/*".to_string()]),
      Some(false),
    )];

    let rendered = render_web_accessible_resources(declared, &roots, &mut resolver, true).unwrap();
    assert_eq!(
      rendered.entries,
      vec![by_match(&["https://a.com/*"], &["assets/shared.js", "assets/inject.js"], false)]
    );
  }

  #[test]
  fn content_script_css_is_declared_only_without_injection() {
    let mut bundle = OutputBundle::new();
    bundle.insert(OutputChunk {
      filename: "assets/content.js".into(),
      imports: vec!["assets/shared.js".into()],
      imported_css: vec!["assets/content.css".into()],
      ..Default::default()
    });
    let scripts = registry();
    let roots = [ResourceRoot {
      id: "/src/content.ts".into(),
      file_name: "assets/content.js".into(),
      matches: vec!["https://a.com/app/*".to_string(), "https://a.com/other".to_string()],
      is_dynamic: false,
      has_loader: true,
      is_module: false,
    }];

    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let injected = render_web_accessible_resources(vec![], &roots, &mut resolver, true).unwrap();
    assert_eq!(
      injected.entries,
      vec![by_match(&["https://a.com/*"], &["assets/shared.js", "assets/content.js"], true)]
    );
    assert_eq!(
      injected.css[&ArcStr::from("assets/content.js")],
      vec![ArcStr::from("assets/content.css")]
    );

    let declared = render_web_accessible_resources(vec![], &roots, &mut resolver, false).unwrap();
    assert_eq!(
      declared.entries,
      vec![by_match(
        &["https://a.com/*"],
        &["assets/shared.js", "assets/content.js", "assets/content.css"],
        true
      )]
    );
  }

  #[test]
  fn module_scripts_already_declared_are_dropped() {
    let mut bundle = OutputBundle::new();
    bundle.insert(OutputChunk {
      filename: "assets/content.js".into(),
      imports: vec!["assets/module.js".into()],
      ..Default::default()
    });
    bundle.insert(OutputChunk {
      filename: "assets/module.js".into(),
      imports: vec!["assets/dep.js".into()],
      ..Default::default()
    });
    let scripts = registry();
    let mut resolver = FileResourceResolver::new(&bundle, &scripts);
    let roots = [
      ResourceRoot {
        id: "/src/content.ts".into(),
        file_name: "assets/content.js".into(),
        matches: vec!["https://a.com/*".to_string()],
        is_dynamic: false,
        has_loader: false,
        is_module: false,
      },
      ResourceRoot {
        id: "/src/module.ts".into(),
        file_name: "assets/module.js".into(),
        matches: vec![],
        is_dynamic: true,
        has_loader: false,
        is_module: true,
      },
    ];

    let rendered = render_web_accessible_resources(vec![], &roots, &mut resolver, true).unwrap();
    assert_eq!(
      rendered.entries,
      vec![by_match(&["https://a.com/*"], &["assets/module.js", "assets/dep.js"], true)]
    );
  }
}
