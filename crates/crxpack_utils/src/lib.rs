pub mod file_name;
pub mod match_pattern;
pub mod path_ext;
pub mod xxhash;

pub mod indexmap {
  use std::hash::BuildHasherDefault;

  use indexmap::{IndexMap, IndexSet};
  use rustc_hash::FxHasher;

  pub type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;
  pub type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;
}
