mod common;

use std::{
  path::Path,
  sync::{Arc, Mutex},
};

use async_trait::async_trait;
use crxpack::{
  define_dynamic_resource, BuildMode, BuildPhase, CrxPlugin, FileSystem, HookManifestOutput,
  HookNoopReturn, ManifestSource, ManifestV3, PluginName, RenderContext, TransformContext,
  WebAccessibleResource, WebAccessibleResourceByMatch, DYNAMIC_RESOURCE, MANIFEST_FILE_NAME,
  SERVICE_WORKER_LOADER,
};

fn sorted(resources: &[String]) -> Vec<String> {
  let mut resources = resources.to_vec();
  resources.sort();
  resources
}

fn by_match(entry: &WebAccessibleResource) -> &WebAccessibleResourceByMatch {
  match entry {
    WebAccessibleResource::ByMatch(entry) => entry,
    WebAccessibleResource::ById(_) => panic!("expected a by-match entry"),
  }
}

#[tokio::test]
async fn renders_a_production_package() {
  let fs = common::project_fs();
  let mut bundler =
    common::bundler(BuildMode::Build, common::manifest(), common::GRAPH, &fs, vec![]);
  let output = bundler.write().await.unwrap();
  let session = bundler.session();

  let content = session.content_scripts.get(&"/src/content.ts".into()).unwrap();
  assert_eq!(content.file_name.as_deref(), Some("assets/content-a1.js"));
  let content_loader = content.loader_file_name.clone().unwrap();

  let inject = &session.dynamic_scripts.records()[0];
  assert_eq!(&*inject.id, "/src/inject.ts");
  assert_eq!(inject.file_name.as_deref(), Some("assets/inject-e5.js"));
  let inject_loader = inject.loader_file_name.clone().unwrap();

  // Declared scripts point at their loaders and pick up the CSS they import.
  let manifest = &output.manifest;
  assert_eq!(manifest.content_scripts[0].js, [content_loader.to_string()]);
  assert_eq!(manifest.content_scripts[0].css, ["assets/content-c3.css"]);

  let background = manifest.background.as_ref().unwrap();
  assert_eq!(background.service_worker.as_deref(), Some(SERVICE_WORKER_LOADER));
  assert_eq!(background.kind.as_deref(), Some("module"));
  assert_eq!(
    output.bundle.get(SERVICE_WORKER_LOADER).unwrap().content_as_bytes(),
    b"import './assets/background-f6.js';\n"
  );

  // The placeholder of the dynamic script became the path of its loader.
  let code = &output.bundle.chunk("assets/content-a1.js").unwrap().code;
  assert!(code.contains(&format!("export default \"/{inject_loader}\";")), "{code}");
  assert!(!code.contains("%SCRIPT_REF:"));

  let entries = manifest.web_accessible_resources.as_ref().unwrap();
  assert_eq!(entries.len(), 2);

  let content_entry = by_match(&entries[0]);
  assert_eq!(content_entry.matches, ["https://example.com/*"]);
  assert!(content_entry.use_dynamic_url);
  assert_eq!(
    sorted(&content_entry.resources),
    [
      "assets/content-a1.js",
      "assets/inject-e5.js",
      "assets/logo-d4.png",
      "assets/shared-b2.js",
    ]
  );

  let dynamic_entry = by_match(&entries[1]);
  assert_eq!(dynamic_entry.matches, ["http://*/*", "https://*/*"]);
  assert!(!dynamic_entry.use_dynamic_url);
  assert_eq!(
    sorted(&dynamic_entry.resources),
    ["assets/inject-e5.js", "assets/logo-d4.png", "assets/shared-b2.js"]
  );

  // Every manifest path names a written file.
  let out_dir = Path::new("/project/dist");
  let written = fs.read(&out_dir.join(MANIFEST_FILE_NAME)).unwrap();
  let written: ManifestV3 = serde_json::from_slice(&written).unwrap();
  assert_eq!(&written, manifest);
  assert_eq!(fs.read(&out_dir.join("icons/16.png")).unwrap(), b"png");
  for file in manifest.content_scripts[0].js.iter().chain(&manifest.content_scripts[0].css) {
    assert!(fs.exists(&out_dir.join(file)), "{file}");
  }
  for entry in entries {
    for resource in entry.resources() {
      assert!(fs.exists(&out_dir.join(resource)), "{resource}");
    }
  }
}

#[tokio::test]
async fn stub_never_reaches_the_package() {
  let fs = common::project_fs();
  let manifest = ManifestV3::new("empty", "0.1.0");
  let mut bundler = common::bundler(BuildMode::Build, manifest.into(), "{}", &fs, vec![]);
  let output = bundler.write().await.unwrap();

  assert_eq!(output.bundle.filenames().map(|name| name.as_str()).collect::<Vec<_>>(), [
    MANIFEST_FILE_NAME
  ]);
  assert_eq!(output.manifest.web_accessible_resources, None);
  assert!(!fs.exists(Path::new("/project/dist/stub.js")));
}

#[tokio::test]
async fn rejects_manifest_v2() {
  let fs = common::project_fs();
  let manifest = ManifestSource::Json(r#"{"manifest_version":2,"name":"old","version":"1"}"#.into());
  let mut bundler = common::bundler(BuildMode::Build, manifest, common::GRAPH, &fs, vec![]);

  let err = bundler.write().await.unwrap_err();
  assert_eq!(err.find_crx_error().unwrap().code(), "UNSUPPORTED_MANIFEST_VERSION");
  assert_eq!(bundler.session().clock.state().phase, BuildPhase::Cancelled);
}

#[tokio::test]
async fn missing_manifest_asset_names_both_lookups() {
  let fs = Arc::new(crxpack::MemoryFileSystem::new());
  let mut bundler =
    common::bundler(BuildMode::Build, common::manifest(), common::GRAPH, &fs, vec![]);

  let err = bundler.write().await.unwrap_err();
  let err = err.find_crx_error().unwrap();
  assert_eq!(err.code(), "MISSING_MANIFEST_ASSET");
  assert!(err.to_string().contains("icons/16.png"), "{err}");
}

/// Declares where dynamic scripts may be loaded, as an application would.
#[derive(Debug)]
struct DeclareDynamicResources;

#[async_trait]
impl CrxPlugin for DeclareDynamicResources {
  fn name(&self) -> PluginName<'_> {
    "declare-dynamic-resources".into()
  }

  async fn transform_manifest(
    &self,
    _ctx: &TransformContext<'_>,
    mut manifest: ManifestV3,
  ) -> HookManifestOutput {
    manifest.web_accessible_resources = Some(vec![define_dynamic_resource(
      Some(vec!["https://a.com/*".to_string()]),
      Some(false),
    )]);
    Ok(Some(manifest))
  }
}

#[tokio::test]
async fn declared_dynamic_resource_scopes_dynamic_scripts() {
  let fs = common::project_fs();
  let mut bundler = common::bundler(
    BuildMode::Build,
    common::manifest(),
    common::GRAPH,
    &fs,
    vec![Arc::new(DeclareDynamicResources)],
  );
  let output = bundler.generate().await.unwrap();

  let entries = output.manifest.web_accessible_resources.unwrap();
  let dynamic_entry = entries
    .iter()
    .map(by_match)
    .find(|entry| !entry.resources.iter().any(|file| file == "assets/content-a1.js"))
    .unwrap();
  assert!(dynamic_entry.resources.iter().any(|file| file == "assets/inject-e5.js"));
  assert_eq!(dynamic_entry.matches, ["https://a.com/*"]);
  assert!(!dynamic_entry.use_dynamic_url);
  let resources = entries.iter().flat_map(WebAccessibleResource::resources).collect::<Vec<_>>();
  assert!(!resources.iter().any(|file| *file == DYNAMIC_RESOURCE));

  // Nothing is written by `generate`.
  assert!(!fs.exists(Path::new("/project/dist/manifest.json")));
}

#[derive(Debug)]
struct BrokenRender;

#[async_trait]
impl CrxPlugin for BrokenRender {
  fn name(&self) -> PluginName<'_> {
    "broken".into()
  }

  async fn render_manifest(
    &self,
    _ctx: &mut RenderContext<'_>,
    _manifest: ManifestV3,
  ) -> HookManifestOutput {
    anyhow::bail!("cannot render")
  }
}

#[tokio::test]
async fn collaborator_errors_fail_the_build() {
  let fs = common::project_fs();
  let mut bundler = common::bundler(
    BuildMode::Build,
    common::manifest(),
    common::GRAPH,
    &fs,
    vec![Arc::new(BrokenRender)],
  );

  let err = bundler.write().await.unwrap_err();
  let err = err.find_crx_error().unwrap();
  assert_eq!(err.code(), "PLUGIN_ERROR");
  assert_eq!(err.to_string(), "[broken] render_manifest: cannot render");
  assert!(!fs.exists(Path::new("/project/dist/manifest.json")));
}

#[derive(Debug, Default)]
struct RecordPhases(Mutex<Vec<(BuildPhase, u64)>>);

#[async_trait]
impl CrxPlugin for RecordPhases {
  fn name(&self) -> PluginName<'_> {
    "record-phases".into()
  }

  async fn on_build_phase(&self, phase: BuildPhase, generation: u64) -> HookNoopReturn {
    self.0.lock().unwrap().push((phase, generation));
    Ok(())
  }
}

#[tokio::test]
async fn plugins_observe_every_build_phase() {
  let fs = common::project_fs();
  let phases = Arc::new(RecordPhases::default());
  let mut bundler = common::bundler(
    BuildMode::Build,
    common::manifest(),
    common::GRAPH,
    &fs,
    vec![Arc::clone(&phases) as crxpack::SharedPlugin],
  );
  bundler.write().await.unwrap();
  bundler.write().await.unwrap();

  assert_eq!(*phases.0.lock().unwrap(), [
    (BuildPhase::BuildStart, 1),
    (BuildPhase::BundleReady, 1),
    (BuildPhase::BuildStart, 2),
    (BuildPhase::BundleReady, 2),
  ]);
}
