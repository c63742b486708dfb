use std::{fmt::Display, path::PathBuf};

use crate::error_code;

#[derive(Debug)]
pub enum ErrorKind {
  // --- Manifest
  UnsupportedManifestVersion {
    version: u64,
  },
  InvalidManifest {
    field: String,
    constraint: String,
  },
  /// A collaborator's `transform_manifest`/`render_manifest` hook returned an error.
  Collaborator {
    plugin: String,
    hook: &'static str,
    source: anyhow::Error,
  },
  MissingManifestAsset {
    file: String,
    root: PathBuf,
    public_dir: PathBuf,
  },
  MissingEmittedFile {
    field: String,
    file: String,
  },
  InvalidPipelinePhase {
    expected: &'static str,
    found: &'static str,
  },

  // --- Resources
  MissingRoot {
    script: String,
    file_name: String,
  },
  InvalidMatchPattern {
    pattern: String,
  },

  // --- Dynamic scripts
  UnresolvedDynamicScript {
    id: String,
  },
  DynamicScriptNotReady {
    logical_id: String,
  },
  UnknownDynamicScript {
    logical_id: String,
  },
  UnresolvedScriptImport {
    specifier: String,
    importer: String,
  },
  DanglingPlaceholder {
    chunk: String,
    logical_id: String,
  },

  // --- Dev
  Cancelled {
    generation: u64,
  },
  ServerPortUndefined,

  // --- Custom
  Io(std::io::Error),
  Json {
    message: String,
  },
}

impl Display for ErrorKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ErrorKind::UnsupportedManifestVersion { version } => {
        write!(f, "Manifest v{version} is not supported, please use Manifest v3")
      }
      ErrorKind::InvalidManifest { field, constraint } => {
        write!(f, "Invalid manifest field \"{field}\": {constraint}")
      }
      ErrorKind::Collaborator { plugin, hook, source } => write!(f, "[{plugin}] {hook}: {source}"),
      ErrorKind::MissingManifestAsset { file, root, public_dir } => write!(
        f,
        "Could not load manifest asset \"{file}\".\nManifest assets must exist in one of these directories:\nProject root: \"{}\"\nPublic dir: \"{}\"",
        root.display(),
        public_dir.display()
      ),
      ErrorKind::MissingEmittedFile { field, file } => {
        write!(f, "Manifest field \"{field}\" references \"{file}\", which is not in the output bundle")
      }
      ErrorKind::InvalidPipelinePhase { expected, found } => {
        write!(f, "Manifest pipeline expected phase \"{expected}\" but is in \"{found}\"")
      }
      ErrorKind::MissingRoot { script, file_name } => {
        write!(f, "Content script \"{script}\" names \"{file_name}\", which is not in the bundle graph")
      }
      ErrorKind::InvalidMatchPattern { pattern } => write!(f, "Invalid match pattern \"{pattern}\""),
      ErrorKind::UnresolvedDynamicScript { id } => {
        write!(f, "Dynamic script file name is undefined for \"{id}\"")
      }
      ErrorKind::DynamicScriptNotReady { logical_id } => {
        write!(f, "Dynamic script \"{logical_id}\" has no file name before the bundle is named")
      }
      ErrorKind::UnknownDynamicScript { logical_id } => {
        write!(f, "Dynamic script \"{logical_id}\" was never registered")
      }
      ErrorKind::UnresolvedScriptImport { specifier, importer } => {
        write!(f, "Could not resolve dynamic script \"{specifier}\" from \"{importer}\"")
      }
      ErrorKind::DanglingPlaceholder { chunk, logical_id } => write!(
        f,
        "Chunk \"{chunk}\" references dynamic script \"{logical_id}\", which has no resolved file name"
      ),
      ErrorKind::Cancelled { generation } => write!(f, "Build #{generation} was cancelled"),
      ErrorKind::ServerPortUndefined => write!(f, "Server port is undefined in watch mode"),
      ErrorKind::Io(source) => source.fmt(f),
      ErrorKind::Json { message } => write!(f, "Json error: {message}"),
    }
  }
}

impl ErrorKind {
  pub fn code(&self) -> &'static str {
    match self {
      ErrorKind::UnsupportedManifestVersion { .. } => error_code::UNSUPPORTED_MANIFEST_VERSION,
      ErrorKind::InvalidManifest { .. } => error_code::INVALID_MANIFEST,
      ErrorKind::Collaborator { .. } => error_code::PLUGIN_ERROR,
      ErrorKind::MissingManifestAsset { .. } => error_code::MISSING_MANIFEST_ASSET,
      ErrorKind::MissingEmittedFile { .. } => error_code::MISSING_EMITTED_FILE,
      ErrorKind::InvalidPipelinePhase { .. } => error_code::INVALID_PIPELINE_PHASE,
      ErrorKind::MissingRoot { .. } => error_code::MISSING_ROOT,
      ErrorKind::InvalidMatchPattern { .. } => error_code::INVALID_MATCH_PATTERN,
      ErrorKind::UnresolvedDynamicScript { .. } => error_code::UNRESOLVED_DYNAMIC_SCRIPT,
      ErrorKind::DynamicScriptNotReady { .. } => error_code::DYNAMIC_SCRIPT_NOT_READY,
      ErrorKind::UnknownDynamicScript { .. } => error_code::UNKNOWN_DYNAMIC_SCRIPT,
      ErrorKind::UnresolvedScriptImport { .. } => error_code::UNRESOLVED_SCRIPT_IMPORT,
      ErrorKind::DanglingPlaceholder { .. } => error_code::DANGLING_PLACEHOLDER,
      ErrorKind::Cancelled { .. } => error_code::BUILD_CANCELLED,
      ErrorKind::ServerPortUndefined => error_code::SERVER_PORT_UNDEFINED,
      ErrorKind::Io(_) => error_code::IO_ERROR,
      ErrorKind::Json { .. } => error_code::JSON_ERROR,
    }
  }

  /// Fatal errors abort the build. Everything this crate models is fatal except a cancelled
  /// build, which is superseded by the next one.
  pub fn is_fatal(&self) -> bool {
    !matches!(self, ErrorKind::Cancelled { .. })
  }
}
