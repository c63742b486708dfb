mod buffer;
mod channel;
mod coordinator;
mod import_graph;

pub use self::{
  buffer::HmrBuffer,
  channel::{RuntimeHub, RuntimePort},
  coordinator::{HmrCoordinator, HmrHandle, HmrPlugin, HmrTargets},
  import_graph::{is_importer, BundleModules, ImportGraph, StaticImportGraph},
};
