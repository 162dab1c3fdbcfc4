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

//! Random-data helpers shared by unit and integration tests.

use rand::distributions::range::SampleRange;
use rand::{thread_rng, Rng};

use data_type::ByteArray;

/// Appends `n` random values in `[min, max)` to `dst`.
pub fn random_numbers_range<T: PartialOrd + SampleRange + Copy>(n: usize, min: T, max: T, dst: &mut Vec<T>) {
  let mut rng = thread_rng();
  for _ in 0..n {
    dst.push(rng.gen_range(min, max));
  }
}

/// Returns `n` random byte arrays of length `len`, useful for exercising
/// byte-array column buffers and dictionaries in tests.
pub fn random_byte_arrays(n: usize, len: usize) -> Vec<ByteArray> {
  let mut rng = thread_rng();
  (0..n)
    .map(|_| {
      let bytes: Vec<u8> = (0..len).map(|_| rng.gen::<u8>()).collect();
      ByteArray::from(bytes)
    })
    .collect()
}

/// Returns `n` random booleans.
pub fn random_bools(n: usize) -> Vec<bool> {
  let mut rng = thread_rng();
  (0..n).map(|_| rng.gen::<bool>()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_random_numbers_range_bounds() {
    let mut dst: Vec<i32> = Vec::new();
    random_numbers_range(1000, 0, 10, &mut dst);
    assert_eq!(dst.len(), 1000);
    assert!(dst.iter().all(|v| *v >= 0 && *v < 10));
  }

  #[test]
  fn test_random_byte_arrays_length() {
    let arrays = random_byte_arrays(5, 8);
    assert_eq!(arrays.len(), 5);
    assert!(arrays.iter().all(|a| a.len() == 8));
  }
}
