#![allow(dead_code)]

use std::sync::Arc;

use crxpack::{
  BuildMode, CrxBundler, CrxOptions, FileSystem, ManifestSource, MemoryFileSystem,
  PrebuiltBundleHost, SharedPlugin, StaticImportGraph,
};

pub const ROOT: &str = "/project";

/// A content script importing a shared chunk and requesting `inject.ts` as a dynamic script, a
/// service worker, and a chunk for a script nobody requests yet.
pub const GRAPH: &str = r#"{
  "chunks": [
    {
      "filename": "assets/content-a1.js",
      "code": "import './shared-b2.js';\n",
      "facadeModuleId": "/src/content.ts",
      "isEntry": true,
      "imports": ["assets/shared-b2.js"],
      "modules": ["/src/dom.ts", "/src/content.ts"],
      "importedCss": ["assets/content-c3.css"],
      "dynamicScripts": ["./inject.ts?script"]
    },
    {
      "filename": "assets/shared-b2.js",
      "code": "export const s = 1;\n",
      "exports": ["s"],
      "modules": ["/src/shared.ts"],
      "importedAssets": ["assets/logo-d4.png"]
    },
    {
      "filename": "assets/inject-e5.js",
      "code": "import './shared-b2.js';\n",
      "facadeModuleId": "/src/inject.ts",
      "imports": ["assets/shared-b2.js"],
      "modules": ["/src/inject.ts"]
    },
    {
      "filename": "assets/background-f6.js",
      "code": "console.log('background');\n",
      "facadeModuleId": "/src/background.ts",
      "isEntry": true,
      "modules": ["/src/api.ts", "/src/background.ts"]
    },
    {
      "filename": "assets/late-g7.js",
      "code": "console.log('late');\n",
      "facadeModuleId": "/src/late.ts",
      "modules": ["/src/late.ts"]
    }
  ],
  "assets": [
    { "filename": "assets/content-c3.css", "source": "body { color: red; }" },
    { "filename": "assets/logo-d4.png", "source": "png" }
  ]
}"#;

pub const MANIFEST: &str = r#"{
  "manifest_version": 3,
  "name": "demo",
  "version": "1.0.0",
  "icons": { "16": "icons/16.png" },
  "background": { "service_worker": "src/background.ts" },
  "content_scripts": [
    { "matches": ["https://example.com/path/*"], "js": ["src/content.ts"] }
  ]
}"#;

pub fn manifest() -> ManifestSource {
  ManifestSource::Json(MANIFEST.to_string())
}

/// Project files: the manifest icon lives in the public dir.
pub fn project_fs() -> Arc<MemoryFileSystem> {
  Arc::new(MemoryFileSystem::with_files([("/project/public/icons/16.png", b"png".as_slice())]).unwrap())
}

pub fn bundler(
  mode: BuildMode,
  manifest: ManifestSource,
  graph: &str,
  fs: &Arc<MemoryFileSystem>,
  plugins: Vec<SharedPlugin>,
) -> CrxBundler {
  let host = Arc::new(PrebuiltBundleHost::from_json(graph, ROOT).unwrap());
  CrxBundler::with_plugins(
    CrxOptions {
      root: Some(ROOT.into()),
      mode: Some(mode),
      server_port: Some(5173),
      ..Default::default()
    },
    manifest,
    host,
    Arc::clone(fs) as Arc<dyn FileSystem>,
    plugins,
  )
  .unwrap()
}

pub fn import_graph() -> StaticImportGraph {
  let mut graph = StaticImportGraph::new();
  graph.add_import("/src/content.ts", "/src/dom.ts");
  graph.add_import("/src/background.ts", "/src/api.ts");
  graph
}
