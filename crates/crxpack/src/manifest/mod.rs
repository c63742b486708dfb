mod assets;
mod background;
mod manifest_files;
mod pipeline;

pub use self::{
  assets::copy_missing_assets,
  background::BackgroundLoaderPlugin,
  manifest_files::{manifest_files, ManifestFiles},
  pipeline::{verify_emitted_paths, ManifestPipeline, PipelinePhase, MANIFEST_FILE_NAME},
};
