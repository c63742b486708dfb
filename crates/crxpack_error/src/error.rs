use std::{fmt::Display, path::PathBuf};

use crate::ErrorKind;

#[derive(Debug)]
pub struct CrxError {
  contexts: Vec<String>,
  pub kind: ErrorKind,
}

impl CrxError {
  fn with_kind(kind: ErrorKind) -> Self {
    Self { contexts: vec![], kind }
  }

  #[must_use]
  pub fn context(mut self, context: impl Into<String>) -> Self {
    self.contexts.push(context.into());
    self
  }

  pub fn code(&self) -> &'static str {
    self.kind.code()
  }

  // --- Manifest

  pub fn unsupported_manifest_version(version: u64) -> Self {
    Self::with_kind(ErrorKind::UnsupportedManifestVersion { version })
  }

  pub fn invalid_manifest(field: impl Into<String>, constraint: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidManifest { field: field.into(), constraint: constraint.into() })
  }

  pub fn collaborator(plugin: impl Into<String>, hook: &'static str, source: anyhow::Error) -> Self {
    Self::with_kind(ErrorKind::Collaborator { plugin: plugin.into(), hook, source })
  }

  pub fn missing_manifest_asset(file: impl Into<String>, root: PathBuf, public_dir: PathBuf) -> Self {
    Self::with_kind(ErrorKind::MissingManifestAsset { file: file.into(), root, public_dir })
  }

  pub fn missing_emitted_file(field: impl Into<String>, file: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::MissingEmittedFile { field: field.into(), file: file.into() })
  }

  pub fn invalid_pipeline_phase(expected: &'static str, found: &'static str) -> Self {
    Self::with_kind(ErrorKind::InvalidPipelinePhase { expected, found })
  }

  // --- Resources

  pub fn missing_root(script: impl Into<String>, file_name: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::MissingRoot { script: script.into(), file_name: file_name.into() })
  }

  pub fn invalid_match_pattern(pattern: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::InvalidMatchPattern { pattern: pattern.into() })
  }

  // --- Dynamic scripts

  pub fn unresolved_dynamic_script(id: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedDynamicScript { id: id.into() })
  }

  pub fn dynamic_script_not_ready(logical_id: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::DynamicScriptNotReady { logical_id: logical_id.into() })
  }

  pub fn unknown_dynamic_script(logical_id: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::UnknownDynamicScript { logical_id: logical_id.into() })
  }

  pub fn unresolved_script_import(specifier: impl Into<String>, importer: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::UnresolvedScriptImport {
      specifier: specifier.into(),
      importer: importer.into(),
    })
  }

  pub fn dangling_placeholder(chunk: impl Into<String>, logical_id: impl Into<String>) -> Self {
    Self::with_kind(ErrorKind::DanglingPlaceholder {
      chunk: chunk.into(),
      logical_id: logical_id.into(),
    })
  }

  // --- Dev

  pub fn cancelled(generation: u64) -> Self {
    Self::with_kind(ErrorKind::Cancelled { generation })
  }

  pub fn server_port_undefined() -> Self {
    Self::with_kind(ErrorKind::ServerPortUndefined)
  }

  // --- Custom

  pub fn io(e: std::io::Error) -> Self {
    Self::with_kind(ErrorKind::Io(e))
  }

  pub fn json(message: impl Display) -> Self {
    Self::with_kind(ErrorKind::Json { message: message.to_string() })
  }
}

impl std::error::Error for CrxError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match &self.kind {
      ErrorKind::Collaborator { source, .. } => Some(source.as_ref()),
      ErrorKind::Io(source) => Some(source),
      _ => None,
    }
  }
}

impl Display for CrxError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for ctx in self.contexts.iter().rev() {
      writeln!(f, "context: {ctx}")?;
    }

    self.kind.fmt(f)
  }
}

#[test]
fn test_collaborator_error_names_plugin() {
  let err = CrxError::collaborator("my-plugin", "render_manifest", anyhow::anyhow!("boom"));
  assert_eq!(err.to_string(), "[my-plugin] render_manifest: boom");
  assert_eq!(err.code(), "PLUGIN_ERROR");
}

#[test]
fn test_context_is_printed_before_kind() {
  let err = CrxError::server_port_undefined().context("rendering background loader");
  assert_eq!(
    err.to_string(),
    "context: rendering background loader\nServer port is undefined in watch mode"
  );
}
