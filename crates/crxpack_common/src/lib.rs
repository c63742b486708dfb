mod hmr;
mod manifest;
mod options;
mod types;

pub use crate::{
  hmr::{
    crx_event::{CrxEvent, CRX_EVENT_PREFIX},
    hmr_payload::{HmrPayload, HmrUpdate, HmrUpdateKind},
    runtime_message::RuntimeMessage,
  },
  manifest::{
    content_script::{ContentScriptDeclaration, ExecutionWorld},
    manifest_source::{ManifestEnv, ManifestSource},
    manifest_v3::{
      DeclarativeNetRequest, ManifestAction, ManifestBackground, ManifestOptionsUi, ManifestSandbox,
      ManifestSidePanel, ManifestV3, RuleResource,
    },
    web_accessible_resource::{
      define_dynamic_resource, WebAccessibleResource, WebAccessibleResourceById,
      WebAccessibleResourceByMatch, DYNAMIC_RESOURCE,
    },
  },
  options::{
    crx_options::{ContentScriptOptions, CrxOptions, HmrOptions},
    normalized_crx_options::NormalizedCrxOptions,
  },
  types::{
    build_mode::BuildMode,
    file_ref::FileRef,
    logical_id::LogicalId,
    module_id::ModuleId,
    output::Output,
    output_asset::OutputAsset,
    output_bundle::OutputBundle,
    output_chunk::OutputChunk,
    resource_set::ResourceSet,
    script_kind::ScriptKind,
  },
};
