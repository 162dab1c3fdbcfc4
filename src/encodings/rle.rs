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

//! Hybrid RLE / bit-packing codec. This backs repetition/definition level
//! streams (C2) and dictionary-index pages (C5); it is the concrete default
//! for the `Encoding` collaborator described in §1 ("RLE/bit-packing ...
//! consumed via an Encoding trait").
//!
//! Wire format: a sequence of runs, each starting with a ULEB128 header.
//! `header & 1 == 0` marks an RLE run: `header >> 1` is the repeat count,
//! followed by `ceil(bit_width / 8)` little-endian bytes holding the
//! repeated value. `header & 1 == 1` marks a bit-packed run: `header >> 1`
//! is the number of groups of 8 values, followed by
//! `num_groups * bit_width` bytes of tightly packed values.

use errors::Result;
use util::bit_util::{BitReader, BitWriter};
use util::memory::{ByteBuffer, ByteBufferPtr};

fn write_vlq_int(buf: &mut ByteBuffer, mut value: u64) {
  use std::io::Write;
  loop {
    let mut byte = (value & 0x7F) as u8;
    value >>= 7;
    if value != 0 {
      byte |= 0x80;
    }
    let _ = buf.write(&[byte]);
    if value == 0 {
      break;
    }
  }
}

fn read_vlq_int(data: &[u8], pos: &mut usize) -> Option<u64> {
  let mut value: u64 = 0;
  let mut shift = 0;
  loop {
    if *pos >= data.len() {
      return None;
    }
    let byte = data[*pos];
    *pos += 1;
    value |= ((byte & 0x7F) as u64) << shift;
    if byte & 0x80 == 0 {
      break;
    }
    shift += 7;
  }
  Some(value)
}

fn value_byte_width(bit_width: u8) -> usize {
  ((bit_width as usize) + 7) / 8
}

/// Encodes a sequence of small non-negative integers with the hybrid
/// RLE/bit-packing scheme. Runs are decided greedily: maximal runs of an
/// equal value become RLE runs, everything else is bit-packed in groups of
/// 8.
pub struct RleEncoder {
  bit_width: u8,
  buffer: ByteBuffer,
  pending: Vec<u64>
}

impl RleEncoder {
  pub fn new(bit_width: u8) -> Self {
    RleEncoder { bit_width: bit_width, buffer: ByteBuffer::new(), pending: Vec::new() }
  }

  pub fn put(&mut self, value: u64) -> Result<bool> {
    self.pending.push(value);
    Ok(true)
  }

  /// Flushes all buffered values and returns the encoded bytes.
  pub fn consume(mut self) -> Result<ByteBufferPtr> {
    self.flush_pending();
    Ok(self.buffer.consume())
  }

  fn flush_pending(&mut self) {
    let values = ::std::mem::replace(&mut self.pending, Vec::new());
    let mut i = 0;
    while i < values.len() {
      let mut run_len = 1;
      while i + run_len < values.len() && values[i + run_len] == values[i] {
        run_len += 1;
      }
      if run_len >= 8 {
        self.write_rle_run(values[i], run_len);
        i += run_len;
      } else {
        // Accumulate a bit-packed run until the next repeat of length >= 8
        // (or the end of input), in groups of 8.
        let start = i;
        let mut j = i;
        while j < values.len() {
          let mut k = 1;
          while j + k < values.len() && values[j + k] == values[j] {
            k += 1;
          }
          if k >= 8 {
            break;
          }
          j += k;
        }
        let bit_packed_len = j - start;
        self.write_bit_packed_run(&values[start..start + bit_packed_len]);
        i = j;
      }
    }
  }

  fn write_rle_run(&mut self, value: u64, run_len: usize) {
    write_vlq_int(&mut self.buffer, (run_len as u64) << 1);
    let width = value_byte_width(self.bit_width);
    let bytes = value.to_le_bytes();
    use std::io::Write;
    let _ = self.buffer.write(&bytes[..width]);
  }

  fn write_bit_packed_run(&mut self, values: &[u64]) {
    let num_groups = (values.len() + 7) / 8;
    write_vlq_int(&mut self.buffer, ((num_groups as u64) << 1) | 1);
    let mut writer = BitWriter::new();
    for i in 0..num_groups * 8 {
      let v = if i < values.len() { values[i] } else { 0 };
      writer.put_value(v, self.bit_width);
    }
    let packed = writer.consume();
    use std::io::Write;
    let _ = self.buffer.write(packed.all());
  }
}

/// Decodes the hybrid RLE/bit-packing format produced by `RleEncoder`.
pub struct RleDecoder {
  bit_width: u8,
  data: ByteBufferPtr,
  pos: usize,
  // State for the run currently being consumed.
  rle_value: u64,
  rle_left: usize,
  bit_packed_reader: Option<BitReader>,
  bit_packed_left: usize
}

impl RleDecoder {
  pub fn new(bit_width: u8) -> Self {
    RleDecoder {
      bit_width: bit_width,
      data: ByteBufferPtr::new(Vec::new()),
      pos: 0,
      rle_value: 0,
      rle_left: 0,
      bit_packed_reader: None,
      bit_packed_left: 0
    }
  }

  pub fn set_data(&mut self, data: ByteBufferPtr) {
    self.data = data;
    self.pos = 0;
    self.rle_left = 0;
    self.bit_packed_left = 0;
    self.bit_packed_reader = None;
  }

  fn load_next_run(&mut self) -> Result<bool> {
    let all = self.data.all();
    if self.pos >= all.len() {
      return Ok(false);
    }
    let header = read_vlq_int(all, &mut self.pos)
      .ok_or_else(|| eof_err!("Truncated RLE header"))?;
    if header & 1 == 0 {
      let run_len = (header >> 1) as usize;
      let width = value_byte_width(self.bit_width);
      if self.pos + width > all.len() {
        return Err(eof_err!("Truncated RLE run value"));
      }
      let mut bytes = [0u8; 8];
      bytes[..width].copy_from_slice(&all[self.pos..self.pos + width]);
      self.pos += width;
      self.rle_value = u64::from_le_bytes(bytes);
      self.rle_left = run_len;
    } else {
      let num_groups = (header >> 1) as usize;
      let num_values = num_groups * 8;
      let byte_len = (num_values * self.bit_width as usize + 7) / 8;
      if self.pos + byte_len > all.len() {
        return Err(eof_err!("Truncated bit-packed run"));
      }
      let slice = self.data.range(self.pos, byte_len);
      self.pos += byte_len;
      self.bit_packed_reader = Some(BitReader::new(slice));
      self.bit_packed_left = num_values;
    }
    Ok(true)
  }

  /// Decodes up to `buffer.len()` values, returning how many were written.
  pub fn get_batch(&mut self, buffer: &mut [i32]) -> Result<usize> {
    let mut n = 0;
    while n < buffer.len() {
      if self.rle_left == 0 && self.bit_packed_left == 0 {
        if !self.load_next_run()? {
          break;
        }
      }
      if self.rle_left > 0 {
        buffer[n] = self.rle_value as i32;
        self.rle_left -= 1;
        n += 1;
      } else if self.bit_packed_left > 0 {
        let reader = self.bit_packed_reader.as_mut().unwrap();
        let v = reader.get_value(self.bit_width).unwrap_or(0);
        buffer[n] = v as i32;
        self.bit_packed_left -= 1;
        n += 1;
      }
    }
    Ok(n)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn roundtrip(values: &[u64], bit_width: u8) -> Vec<i32> {
    let mut encoder = RleEncoder::new(bit_width);
    for v in values {
      encoder.put(*v).unwrap();
    }
    let bytes = encoder.consume().unwrap();

    let mut decoder = RleDecoder::new(bit_width);
    decoder.set_data(bytes);
    let mut out = vec![0i32; values.len()];
    let n = decoder.get_batch(&mut out).unwrap();
    assert_eq!(n, values.len());
    out
  }

  #[test]
  fn test_rle_roundtrip_all_same() {
    let values = vec![3u64; 100];
    let out = roundtrip(&values, 2);
    assert!(out.iter().all(|v| *v == 3));
  }

  #[test]
  fn test_rle_roundtrip_mixed() {
    let values: Vec<u64> = vec![0, 1, 2, 1, 0, 3, 3, 3, 3, 3, 3, 3, 3, 3, 1, 2, 0];
    let out = roundtrip(&values, 2);
    let expected: Vec<i32> = values.iter().map(|v| *v as i32).collect();
    assert_eq!(out, expected);
  }

  #[test]
  fn test_rle_roundtrip_all_distinct_bit_packed() {
    let values: Vec<u64> = (0..40).map(|i| i % 4).collect();
    let out = roundtrip(&values, 2);
    let expected: Vec<i32> = values.iter().map(|v| *v as i32).collect();
    assert_eq!(out, expected);
  }
}
