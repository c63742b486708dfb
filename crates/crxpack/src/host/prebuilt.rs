use std::path::{Path, PathBuf};

use arcstr::ArcStr;
use async_trait::async_trait;
use crxpack_common::{FileRef, ModuleId, OutputAsset, OutputBundle, OutputChunk};
use crxpack_error::{BuildResult, CrxError};
use crxpack_utils::xxhash::{short_hash, xxhash_with_base};
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::{BundleHost, EmittedAsset, STUB_CODE, STUB_ID};
use crate::dynamic_script::DynamicScriptRegistry;

const STUB_FILE_NAME: &str = "stub.js";

/// A bundle graph produced ahead of time, e.g. dumped by a bundler as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrebuiltGraph {
  #[serde(default)]
  pub chunks: Vec<PrebuiltChunk>,
  #[serde(default)]
  pub assets: Vec<OutputAsset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltChunk {
  #[serde(flatten)]
  pub chunk: OutputChunk,
  /// Dynamic script requests made by the member modules, e.g. `./inject.ts?script`.
  #[serde(default)]
  pub dynamic_scripts: Vec<String>,
}

/// [BundleHost] over a [PrebuiltGraph]. Roots are matched against the facade modules of the
/// graph's chunks; dynamic script requests are resolved and their virtual modules inlined into
/// the requesting chunk.
#[derive(Debug)]
pub struct PrebuiltBundleHost {
  graph: PrebuiltGraph,
  root: PathBuf,
  /// Root-relative facade id to chunk file name.
  facades: FxHashMap<String, ArcStr>,
  emitted_chunks: DashMap<FileRef, ModuleId>,
  emitted_assets: DashMap<FileRef, ArcStr>,
}

impl PrebuiltBundleHost {
  pub fn new(graph: PrebuiltGraph, root: impl Into<PathBuf>) -> Self {
    let root = root.into();
    let facades = graph
      .chunks
      .iter()
      .filter_map(|prebuilt| {
        let facade = prebuilt.chunk.facade_module_id.as_ref()?;
        Some((facade.stabilize(&root), prebuilt.chunk.filename.clone()))
      })
      .collect();
    Self {
      graph,
      root,
      facades,
      emitted_chunks: DashMap::default(),
      emitted_assets: DashMap::default(),
    }
  }

  pub fn from_json(json: &str, root: impl Into<PathBuf>) -> BuildResult<Self> {
    let graph = serde_json::from_str(json).map_err(CrxError::json)?;
    Ok(Self::new(graph, root))
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  fn stub_emitted(&self) -> bool {
    self.emitted_chunks.iter().any(|entry| &**entry.value() == STUB_ID)
  }

  fn asset_file_name(name: &str, source: &[u8]) -> String {
    let base_name = name.rsplit('/').next().unwrap_or(name);
    let (stem, ext) = match base_name.split_once('.') {
      Some((stem, ext)) => (stem, format!(".{ext}")),
      None => (base_name, String::new()),
    };
    let mut hash = xxhash_with_base(source, 62);
    hash.truncate(8);
    format!("assets/{stem}-{hash}{ext}")
  }
}

#[async_trait]
impl BundleHost for PrebuiltBundleHost {
  fn emit_chunk(&self, id: &ModuleId) -> BuildResult<FileRef> {
    let id = ModuleId::new(id.stabilize(&self.root));
    let reference = FileRef::new(short_hash(&format!("chunk&{id}"), 8));
    self.emitted_chunks.insert(reference.clone(), id);
    Ok(reference)
  }

  fn emit_asset(&self, bundle: &mut OutputBundle, asset: EmittedAsset) -> BuildResult<FileRef> {
    let EmittedAsset { name, file_name, source } = asset;
    let file_name: ArcStr = match (file_name, &name) {
      (Some(file_name), _) => file_name,
      (None, Some(name)) => Self::asset_file_name(name, &source).into(),
      (None, None) => Self::asset_file_name("asset", &source).into(),
    };

    let reference = FileRef::new(short_hash(&format!("asset&{file_name}"), 8));
    self.emitted_assets.insert(reference.clone(), file_name.clone());
    bundle.insert(OutputAsset { filename: file_name, name, source });
    Ok(reference)
  }

  fn file_name(&self, reference: &FileRef) -> Option<ArcStr> {
    if let Some(file_name) = self.emitted_assets.get(reference) {
      return Some(file_name.clone());
    }
    let id = self.emitted_chunks.get(reference)?;
    if &**id == STUB_ID {
      return Some(STUB_FILE_NAME.into());
    }
    self.facades.get(&**id).cloned()
  }

  async fn generate(&self, scripts: &DynamicScriptRegistry) -> BuildResult<OutputBundle> {
    let mut bundle = OutputBundle::new();

    for PrebuiltChunk { chunk, dynamic_scripts } in &self.graph.chunks {
      let mut chunk = chunk.clone();
      let importer = chunk
        .facade_module_id
        .clone()
        .or_else(|| chunk.modules.first().cloned())
        .unwrap_or_else(|| ModuleId::new(format!("/{}", chunk.filename)));

      for specifier in dynamic_scripts {
        let logical_id = scripts.resolve(specifier, &importer)?;
        scripts.emit(&logical_id, self)?;
        let virtual_id = scripts.virtual_id(&logical_id)?;
        if let Some(code) = scripts.load(&virtual_id)? {
          chunk.code.push_str(&code);
        }
        chunk.modules.push(virtual_id);
      }
      bundle.insert(chunk);
    }

    if self.stub_emitted() {
      bundle.insert(OutputChunk {
        filename: STUB_FILE_NAME.into(),
        code: STUB_CODE.to_string(),
        facade_module_id: Some(STUB_ID.into()),
        is_entry: true,
        modules: vec![STUB_ID.into()],
        ..Default::default()
      });
    }

    for asset in &self.graph.assets {
      bundle.insert(asset.clone());
    }

    tracing::debug!(outputs = bundle.len(), "generated bundle");
    Ok(bundle)
  }

  fn begin_build(&self) {
    self.emitted_chunks.clear();
    self.emitted_assets.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_graph_json() {
    let host = PrebuiltBundleHost::from_json(
      r#"{
        "chunks": [{
          "filename": "assets/content.js",
          "facadeModuleId": "/project/src/content.ts",
          "isEntry": true,
          "imports": ["assets/shared.js"],
          "dynamicScripts": ["./inject.ts?script"]
        }],
        "assets": [{ "filename": "assets/logo.png", "source": "png" }]
      }"#,
      "/project",
    )
    .unwrap();

    let reference = host.emit_chunk(&"/src/content.ts".into()).unwrap();
    assert_eq!(host.file_name(&reference).as_deref(), Some("assets/content.js"));
    assert_eq!(host.graph.chunks[0].dynamic_scripts, ["./inject.ts?script"]);
  }

  #[test]
  fn emitted_assets_are_named_by_content() {
    let host = PrebuiltBundleHost::new(PrebuiltGraph::default(), "/project");
    let mut bundle = OutputBundle::new();

    let hashed = host.emit_asset(&mut bundle, EmittedAsset::named("content.ts-loader.js", "a")).unwrap();
    let file_name = host.file_name(&hashed).unwrap();
    assert!(file_name.starts_with("assets/content-"));
    assert!(file_name.ends_with(".ts-loader.js"));

    let fixed =
      host.emit_asset(&mut bundle, EmittedAsset::fixed("service-worker-loader.js", "b")).unwrap();
    assert_eq!(host.file_name(&fixed).as_deref(), Some("service-worker-loader.js"));
    assert_eq!(bundle.len(), 2);
  }

  #[test]
  fn unknown_roots_have_no_file_name() {
    let host = PrebuiltBundleHost::new(PrebuiltGraph::default(), "/project");
    let reference = host.emit_chunk(&"/src/missing.ts".into()).unwrap();
    assert_eq!(host.file_name(&reference), None);
  }
}
