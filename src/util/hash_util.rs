// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Hash-probe table collaborator used by dictionary construction (C5). Per
//! §1 this is external — the core only depends on `ProbeTable<K>` — but a
//! `HashMap`-backed default is shipped so the crate works standalone.

use std::collections::HashMap;
use std::hash::Hash;

/// `probe(keys, out_indexes) -> inserted_count`: for each key, writes its
/// (possibly newly assigned) index into the matching slot of `out_indexes`
/// and returns how many keys were new.
pub trait ProbeTable<K: Eq + Hash + Clone> {
  fn probe(&mut self, keys: &[K], out_indexes: &mut [i32]) -> usize;

  fn len(&self) -> usize;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Target number of keys probed per batch, chosen so the probed key slice
/// stays within `insertsTargetCacheFootprint` (~8 KiB) of a `u32`-ish key
/// (§4.4 "Chunking").
pub const INSERTS_TARGET_CACHE_FOOTPRINT: usize = 8 * 1024;

pub fn chunk_size_for<K>() -> usize {
  let sz = ::std::mem::size_of::<K>().max(1);
  (INSERTS_TARGET_CACHE_FOOTPRINT / sz).max(1)
}

/// Default `HashMap`-backed probe table. Appends are linear (next available
/// index), probes are amortized O(1); no eviction (§4.4 "Eviction/capacity").
#[derive(Default)]
pub struct HashMapProbeTable<K: Eq + Hash + Clone> {
  index_of: HashMap<K, i32>
}

impl<K: Eq + Hash + Clone> HashMapProbeTable<K> {
  pub fn new() -> Self {
    HashMapProbeTable { index_of: HashMap::new() }
  }
}

impl<K: Eq + Hash + Clone> ProbeTable<K> for HashMapProbeTable<K> {
  fn probe(&mut self, keys: &[K], out_indexes: &mut [i32]) -> usize {
    assert_eq!(keys.len(), out_indexes.len());
    let mut inserted = 0;
    let chunk = chunk_size_for::<K>();
    for (chunk_keys, chunk_out) in keys.chunks(chunk).zip(out_indexes.chunks_mut(chunk)) {
      for (k, out) in chunk_keys.iter().zip(chunk_out.iter_mut()) {
        let next_index = self.index_of.len() as i32;
        let idx = *self.index_of.entry(k.clone()).or_insert_with(|| next_index);
        if idx == next_index {
          inserted += 1;
        }
        *out = idx;
      }
    }
    inserted
  }

  fn len(&self) -> usize {
    self.index_of.len()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_probe_table_assigns_stable_indexes() {
    let mut table: HashMapProbeTable<i32> = HashMapProbeTable::new();
    let keys = vec![10, 20, 10, 30, 20];
    let mut out = vec![0; keys.len()];
    let inserted = table.probe(&keys, &mut out);
    assert_eq!(inserted, 3);
    assert_eq!(out[0], out[2], "repeated key gets the same index");
    assert_eq!(out[1], out[4]);
    assert_eq!(table.len(), 3);
  }

  #[test]
  fn test_chunk_size_for_is_positive() {
    assert!(chunk_size_for::<i64>() > 0);
    assert!(chunk_size_for::<[u8; 4096]>() >= 1);
  }
}
