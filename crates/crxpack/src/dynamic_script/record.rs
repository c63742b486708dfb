use arcstr::ArcStr;
use crxpack_common::{FileRef, LogicalId, ModuleId, ScriptKind};

pub const SCRIPT_ID_QUERY: &str = "scriptId=";

#[derive(Debug, Clone)]
pub struct DynamicScriptRecord {
  pub logical_id: LogicalId,
  pub kind: ScriptKind,
  /// Resolved module id of the script, e.g. `/src/inject.ts`.
  pub id: ModuleId,
  pub compiled_ref: Option<FileRef>,
  pub loader_ref: Option<FileRef>,
  pub file_name: Option<ArcStr>,
  pub loader_file_name: Option<ArcStr>,
  /// Set when the importing chunk was found in the last generated bundle.
  pub(crate) reachable: bool,
  pub(crate) seq: usize,
}

impl DynamicScriptRecord {
  pub(crate) fn new(logical_id: LogicalId, kind: ScriptKind, id: ModuleId, seq: usize) -> Self {
    Self {
      logical_id,
      kind,
      id,
      compiled_ref: None,
      loader_ref: None,
      file_name: None,
      loader_file_name: None,
      reachable: false,
      seq,
    }
  }

  /// Id of the virtual module importers load in place of the script: `<id>?scriptId=<logicalId>`.
  pub fn virtual_id(&self) -> ModuleId {
    ModuleId::new(format!("{}?{SCRIPT_ID_QUERY}{}", self.id, self.logical_id))
  }

  /// The file the extension runtime injects: the loader when there is one, otherwise the script.
  pub fn public_file_name(&self) -> Option<&ArcStr> {
    self.loader_file_name.as_ref().or(self.file_name.as_ref())
  }

  pub(crate) fn reset_outputs(&mut self) {
    self.compiled_ref = None;
    self.loader_ref = None;
    self.file_name = None;
    self.loader_file_name = None;
    self.reachable = false;
  }
}

/// Logical id carried by a virtual module id, if it is one.
pub fn parse_virtual_id(id: &str) -> Option<LogicalId> {
  let (_, query) = id.split_once('?')?;
  query.split('&').find_map(|param| param.strip_prefix(SCRIPT_ID_QUERY)).map(LogicalId::from_raw)
}

#[test]
fn test_virtual_id_round_trip() {
  let record = DynamicScriptRecord::new(
    LogicalId::from_raw("AbCd1234"),
    ScriptKind::Script,
    ModuleId::from("/src/inject.ts"),
    0,
  );
  assert_eq!(&*record.virtual_id(), "/src/inject.ts?scriptId=AbCd1234");
  assert_eq!(parse_virtual_id(&record.virtual_id()), Some(record.logical_id));
  assert_eq!(parse_virtual_id("/src/inject.ts"), None);
}
