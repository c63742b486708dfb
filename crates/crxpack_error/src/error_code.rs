// --- Manifest
pub const UNSUPPORTED_MANIFEST_VERSION: &str = "UNSUPPORTED_MANIFEST_VERSION";
pub const INVALID_MANIFEST: &str = "INVALID_MANIFEST";
pub const PLUGIN_ERROR: &str = "PLUGIN_ERROR";
pub const MISSING_MANIFEST_ASSET: &str = "MISSING_MANIFEST_ASSET";
pub const MISSING_EMITTED_FILE: &str = "MISSING_EMITTED_FILE";
pub const INVALID_PIPELINE_PHASE: &str = "INVALID_PIPELINE_PHASE";

// --- Resources
pub const MISSING_ROOT: &str = "MISSING_ROOT";
pub const INVALID_MATCH_PATTERN: &str = "INVALID_MATCH_PATTERN";

// --- Dynamic scripts
pub const UNRESOLVED_DYNAMIC_SCRIPT: &str = "UNRESOLVED_DYNAMIC_SCRIPT";
pub const DYNAMIC_SCRIPT_NOT_READY: &str = "DYNAMIC_SCRIPT_NOT_READY";
pub const UNKNOWN_DYNAMIC_SCRIPT: &str = "UNKNOWN_DYNAMIC_SCRIPT";
pub const UNRESOLVED_SCRIPT_IMPORT: &str = "UNRESOLVED_SCRIPT_IMPORT";
pub const DANGLING_PLACEHOLDER: &str = "DANGLING_PLACEHOLDER";

// --- Dev
pub const BUILD_CANCELLED: &str = "BUILD_CANCELLED";
pub const SERVER_PORT_UNDEFINED: &str = "SERVER_PORT_UNDEFINED";

// --- Custom
pub const IO_ERROR: &str = "IO_ERROR";
pub const JSON_ERROR: &str = "JSON_ERROR";
