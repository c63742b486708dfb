pub mod content_script;
pub mod manifest_source;
pub mod manifest_v3;
pub mod web_accessible_resource;
