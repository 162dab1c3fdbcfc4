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

//! Accumulation, encoding and pure scan operations over repetition/definition
//! level streams (C2). Levels round-trip through `i16` in memory (matching
//! the reader/writer API) even though an on-wire level value never exceeds
//! one byte (§4.1).

use byteorder::{ByteOrder, LittleEndian};

use basic::Encoding;
use encodings::rle::{RleDecoder, RleEncoder};
use errors::Result;
use util::bit_util::num_required_bits;
use util::memory::ByteBufferPtr;

/// Counts levels equal to `value`. Portable scalar fallback; a SIMD kernel
/// over the same `[i16]` slice is a drop-in replacement behind this same
/// signature (§4.1 "may use SIMD; a portable scalar fallback is required").
pub fn count_levels_equal(levels: &[i16], value: i16) -> usize {
  levels.iter().filter(|&&l| l == value).count()
}

/// Counts levels not equal to `value`.
pub fn count_levels_not_equal(levels: &[i16], value: i16) -> usize {
  levels.len() - count_levels_equal(levels, value)
}

/// Builds a histogram `h` such that `h[level] == count of that level`,
/// sized `max_level + 1`. Used for `def_level_histogram` /
/// `rep_level_histogram` (C9).
pub fn level_histogram(levels: &[i16], max_level: i16) -> Vec<i64> {
  let mut histogram = vec![0i64; (max_level as usize) + 1];
  for &l in levels {
    histogram[l as usize] += 1;
  }
  histogram
}

/// Encodes a stream of levels with the hybrid RLE/bit-packing scheme,
/// prefixed with a 4-byte little-endian length (the on-disk layout for a
/// data page's level section).
pub struct LevelEncoder {
  bit_width: u8,
  rle: Option<RleEncoder>
}

impl LevelEncoder {
  /// Upper bound on the encoded size (including the length prefix) for
  /// `num_buffered_values` levels bounded by `max_level`. Generous by
  /// design: callers use this only to size a scratch buffer.
  pub fn max_buffer_size(_encoding: Encoding, max_level: i16, num_buffered_values: usize) -> usize {
    let bit_width = num_required_bits(max_level as i64) as usize;
    4 + 8 + num_buffered_values * (bit_width + 1)
  }

  /// `buffer` is accepted for API parity with callers that pre-size a
  /// scratch area; its contents are not reused, this encoder manages its
  /// own growable internal buffer.
  pub fn new(_encoding: Encoding, max_level: i16, buffer: Vec<u8>) -> Self {
    let _ = buffer;
    let bit_width = num_required_bits(max_level as i64);
    LevelEncoder { bit_width: bit_width, rle: Some(RleEncoder::new(bit_width)) }
  }

  pub fn put(&mut self, levels: &[i16]) -> Result<usize> {
    let rle = self.rle.as_mut().expect("LevelEncoder already consumed");
    for &l in levels {
      rle.put(l as u64)?;
    }
    Ok(levels.len())
  }

  pub fn consume(mut self) -> Result<Vec<u8>> {
    let rle = self.rle.take().expect("LevelEncoder already consumed");
    let encoded = rle.consume()?;
    let mut out = Vec::with_capacity(4 + encoded.len());
    out.extend_from_slice(&[0u8; 4]);
    LittleEndian::write_i32(&mut out[0..4], encoded.len() as i32);
    out.extend_from_slice(encoded.all());
    Ok(out)
  }
}

/// Decodes a length-prefixed hybrid RLE/bit-packed level stream.
pub struct LevelDecoder {
  bit_width: u8,
  rle: Option<RleDecoder>
}

impl LevelDecoder {
  pub fn new(_encoding: Encoding, max_level: i16) -> Self {
    let bit_width = num_required_bits(max_level as i64);
    LevelDecoder { bit_width: bit_width, rle: None }
  }

  /// Reads the 4-byte length prefix and sets the decoder up to read from
  /// the following `len` bytes of `data`. Returns the total number of bytes
  /// consumed (`4 + len`), so the caller can advance past this section.
  pub fn set_data(&mut self, data: &[u8]) -> usize {
    if self.bit_width == 0 {
      // `max_level == 0`: nothing is ever encoded, every value is implicitly
      // at level 0.
      self.rle = Some({
        let mut d = RleDecoder::new(0);
        d.set_data(ByteBufferPtr::new(Vec::new()));
        d
      });
      return 0;
    }
    let len = LittleEndian::read_i32(&data[0..4]) as usize;
    let mut decoder = RleDecoder::new(self.bit_width);
    decoder.set_data(ByteBufferPtr::new(data[4..4 + len].to_vec()));
    self.rle = Some(decoder);
    4 + len
  }

  pub fn get(&mut self, buffer: &mut [i16]) -> Result<usize> {
    if self.bit_width == 0 {
      for slot in buffer.iter_mut() {
        *slot = 0;
      }
      return Ok(buffer.len());
    }
    let rle = self.rle.as_mut().expect("set_data() must be called first");
    let mut tmp = vec![0i32; buffer.len()];
    let n = rle.get_batch(&mut tmp)?;
    for i in 0..n {
      buffer[i] = tmp[i] as i16;
    }
    Ok(n)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_count_levels() {
    let levels = [0i16, 1, 1, 2, 0, 2, 2];
    assert_eq!(count_levels_equal(&levels, 2), 3);
    assert_eq!(count_levels_not_equal(&levels, 0), 5);
  }

  #[test]
  fn test_level_histogram_sums_to_len() {
    let levels = [0i16, 1, 2, 1, 0, 2, 2, 2];
    let h = level_histogram(&levels, 2);
    assert_eq!(h.len(), 3);
    assert_eq!(h.iter().sum::<i64>(), levels.len() as i64);
    assert_eq!(h[2], 4);
  }

  #[test]
  fn test_level_encoder_decoder_roundtrip() {
    let levels: Vec<i16> = vec![0, 1, 1, 0, 1, 0, 0, 1, 1, 1, 1, 1, 1, 1, 1, 0];
    let max_buf = LevelEncoder::max_buffer_size(Encoding::RLE, 1, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, 1, vec![0; max_buf]);
    encoder.put(&levels).unwrap();
    let encoded = encoder.consume().unwrap();

    let mut decoder = LevelDecoder::new(Encoding::RLE, 1);
    let consumed = decoder.set_data(&encoded);
    assert_eq!(consumed, encoded.len());

    let mut out = vec![0i16; levels.len()];
    let n = decoder.get(&mut out).unwrap();
    assert_eq!(n, levels.len());
    assert_eq!(out, levels);
  }

  #[test]
  fn test_level_decoder_zero_max_level() {
    let mut decoder = LevelDecoder::new(Encoding::RLE, 0);
    let consumed = decoder.set_data(&[]);
    assert_eq!(consumed, 0);
    let mut out = vec![5i16; 4];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, vec![0, 0, 0, 0]);
  }
}
