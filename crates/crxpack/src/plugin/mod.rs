mod context;
mod crx_plugin;
mod plugin_driver;

pub use self::{
  context::{RenderContext, TransformContext},
  crx_plugin::{CrxPlugin, HookManifestOutput, HookNoopReturn, PluginName, SharedPlugin},
  plugin_driver::PluginDriver,
};
