use arcstr::ArcStr;
use crxpack_utils::indexmap::FxIndexMap;

use crate::{ModuleId, Output, OutputChunk};

/// The finished bundle, keyed by output file name in emission order.
#[derive(Debug, Clone, Default)]
pub struct OutputBundle {
  outputs: FxIndexMap<ArcStr, Output>,
}

impl OutputBundle {
  pub fn new() -> Self {
    Self::default()
  }

  /// Inserts `output`, replacing any output with the same file name.
  pub fn insert(&mut self, output: impl Into<Output>) {
    let output = output.into();
    self.outputs.insert(output.filename().clone(), output);
  }

  pub fn get(&self, filename: &str) -> Option<&Output> {
    self.outputs.get(filename)
  }

  pub fn get_mut(&mut self, filename: &str) -> Option<&mut Output> {
    self.outputs.get_mut(filename)
  }

  pub fn chunk(&self, filename: &str) -> Option<&OutputChunk> {
    self.get(filename).and_then(Output::as_chunk)
  }

  pub fn chunk_mut(&mut self, filename: &str) -> Option<&mut OutputChunk> {
    match self.outputs.get_mut(filename)? {
      Output::Chunk(chunk) => Some(chunk.as_mut()),
      Output::Asset(_) => None,
    }
  }

  /// Root chunk emitted for `module_id`.
  pub fn chunk_by_facade(&self, module_id: &ModuleId) -> Option<&OutputChunk> {
    self
      .chunks()
      .find(|chunk| chunk.facade_module_id.as_ref().is_some_and(|facade| facade == module_id))
  }

  pub fn contains(&self, filename: &str) -> bool {
    self.outputs.contains_key(filename)
  }

  pub fn remove(&mut self, filename: &str) -> Option<Output> {
    self.outputs.shift_remove(filename)
  }

  pub fn chunks(&self) -> impl Iterator<Item = &OutputChunk> {
    self.outputs.values().filter_map(Output::as_chunk)
  }

  pub fn chunks_mut(&mut self) -> impl Iterator<Item = &mut OutputChunk> {
    self.outputs.values_mut().filter_map(|output| match output {
      Output::Chunk(chunk) => Some(chunk.as_mut()),
      Output::Asset(_) => None,
    })
  }

  pub fn iter(&self) -> impl Iterator<Item = &Output> {
    self.outputs.values()
  }

  pub fn filenames(&self) -> impl Iterator<Item = &ArcStr> {
    self.outputs.keys()
  }

  pub fn len(&self) -> usize {
    self.outputs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.outputs.is_empty()
  }
}

impl IntoIterator for OutputBundle {
  type Item = Output;
  type IntoIter = indexmap::map::IntoValues<ArcStr, Output>;

  fn into_iter(self) -> Self::IntoIter {
    self.outputs.into_values()
  }
}
