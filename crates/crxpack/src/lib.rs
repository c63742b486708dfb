mod bundler;
mod clock;
mod content_scripts;
mod dynamic_script;
mod file_writer;
mod hmr;
mod host;
mod loader;
mod manifest;
mod plugin;
mod resources;
mod session;
mod utils;

use std::sync::Arc;

use crxpack_common::NormalizedCrxOptions;

pub use crate::{
  bundler::{BundleOutput, CrxBundler},
  clock::{BuildPhase, BuildPhaseClock, ClockState, Tick},
  content_scripts::{ContentScriptRecord, ContentScriptTable},
  dynamic_script::{
    parse_virtual_id, DynamicScriptRecord, DynamicScriptRegistry, PlaceholderLedger,
    SCRIPT_ID_QUERY,
  },
  file_writer::write_bundle,
  hmr::{
    is_importer, BundleModules, HmrBuffer, HmrCoordinator, HmrHandle, HmrPlugin, HmrTargets,
    ImportGraph, RuntimeHub, RuntimePort, StaticImportGraph,
  },
  host::{BundleHost, EmittedAsset, PrebuiltBundleHost, PrebuiltChunk, PrebuiltGraph, STUB_ID},
  loader::{background_loader, content_loader, main_world_loader, SERVICE_WORKER_LOADER},
  manifest::{
    manifest_files, verify_emitted_paths, BackgroundLoaderPlugin, ManifestFiles, ManifestPipeline,
    PipelinePhase, MANIFEST_FILE_NAME,
  },
  plugin::{
    CrxPlugin, HookManifestOutput, HookNoopReturn, PluginDriver, PluginName, RenderContext,
    SharedPlugin, TransformContext,
  },
  resources::{
    dev_web_accessible_resources, merge_web_accessible_resources, render_web_accessible_resources,
    FileResourceResolver, RenderedResources, ResourceRoot, WebAccessibleResourcesPlugin,
  },
  session::BuildSession,
  utils::normalize_options::normalize_options,
};
pub use crxpack_common::*;
pub use crxpack_error::{BuildError, BuildResult, CrxError, ErrorKind};
pub use crxpack_fs::{FileSystem, MemoryFileSystem, OsFileSystem};

pub type SharedOptions = Arc<NormalizedCrxOptions>;
