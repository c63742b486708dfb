pub mod build_mode;
pub mod file_ref;
pub mod logical_id;
pub mod module_id;
pub mod output;
pub mod output_asset;
pub mod output_bundle;
pub mod output_chunk;
pub mod resource_set;
pub mod script_kind;
