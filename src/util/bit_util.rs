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

//! Bit-level packing helpers that back the RLE/bit-packed level and
//! dictionary-index encodings (treated as part of the external `Encoding`
//! collaborator per §1, but needed here to have something runnable).

use util::memory::{ByteBuffer, ByteBufferPtr};

/// Number of bits needed to represent values `0..=max_level`.
pub fn num_required_bits(max_level: i64) -> u8 {
  let mut bits = 0u8;
  let mut n = max_level;
  while n > 0 {
    bits += 1;
    n >>= 1;
  }
  bits
}

/// Reads packed little-endian bit groups out of a byte slice, `bit_width`
/// bits at a time.
pub struct BitReader {
  buffer: ByteBufferPtr,
  byte_offset: usize,
  bit_offset: u8
}

impl BitReader {
  pub fn new(buffer: ByteBufferPtr) -> Self {
    BitReader { buffer: buffer, byte_offset: 0, bit_offset: 0 }
  }

  pub fn reset(&mut self, buffer: ByteBufferPtr) {
    self.buffer = buffer;
    self.byte_offset = 0;
    self.bit_offset = 0;
  }

  pub fn get_value(&mut self, bit_width: u8) -> Option<u64> {
    if bit_width == 0 {
      return Some(0);
    }
    let data = self.buffer.all();
    let mut value: u64 = 0;
    let mut bits_read = 0u8;
    while bits_read < bit_width {
      if self.byte_offset >= data.len() {
        return None;
      }
      let byte = data[self.byte_offset];
      let bits_left_in_byte = 8 - self.bit_offset;
      let bits_needed = bit_width - bits_read;
      let take = ::std::cmp::min(bits_left_in_byte, bits_needed);
      let mask = ((1u16 << take) - 1) as u8;
      let shifted = (byte >> self.bit_offset) & mask;
      value |= (shifted as u64) << bits_read;
      bits_read += take;
      self.bit_offset += take;
      if self.bit_offset == 8 {
        self.bit_offset = 0;
        self.byte_offset += 1;
      }
    }
    Some(value)
  }

  pub fn get_batch(&mut self, dst: &mut [u8], bit_width: u8) -> usize {
    let mut n = 0;
    for slot in dst.iter_mut() {
      match self.get_value(bit_width) {
        Some(v) => {
          *slot = v as u8;
          n += 1;
        },
        None => break
      }
    }
    n
  }
}

/// Writes packed little-endian bit groups into a growable byte buffer.
pub struct BitWriter {
  buffer: ByteBuffer,
  current_byte: u8,
  bit_offset: u8
}

impl BitWriter {
  pub fn new() -> Self {
    BitWriter { buffer: ByteBuffer::new(), current_byte: 0, bit_offset: 0 }
  }

  pub fn put_value(&mut self, value: u64, bit_width: u8) {
    if bit_width == 0 {
      return;
    }
    let mut remaining = bit_width;
    let mut v = value;
    while remaining > 0 {
      let bits_left_in_byte = 8 - self.bit_offset;
      let take = ::std::cmp::min(bits_left_in_byte, remaining);
      let mask = ((1u16 << take) - 1) as u64;
      let bits = (v & mask) as u8;
      self.current_byte |= bits << self.bit_offset;
      self.bit_offset += take;
      v >>= take;
      remaining -= take;
      if self.bit_offset == 8 {
        self.flush_byte();
      }
    }
  }

  fn flush_byte(&mut self) {
    use std::io::Write;
    let _ = self.buffer.write(&[self.current_byte]);
    self.current_byte = 0;
    self.bit_offset = 0;
  }

  pub fn consume(mut self) -> ByteBufferPtr {
    if self.bit_offset > 0 {
      self.flush_byte();
    }
    self.buffer.consume()
  }

  pub fn bytes_written(&self) -> usize {
    self.buffer.size() + if self.bit_offset > 0 { 1 } else { 0 }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_num_required_bits() {
    assert_eq!(num_required_bits(0), 0);
    assert_eq!(num_required_bits(1), 1);
    assert_eq!(num_required_bits(3), 2);
    assert_eq!(num_required_bits(4), 3);
    assert_eq!(num_required_bits(255), 8);
  }

  #[test]
  fn test_bit_writer_reader_roundtrip() {
    let values: Vec<u64> = vec![0, 1, 2, 3, 0, 3, 2, 1, 0];
    let width = 2;
    let mut writer = BitWriter::new();
    for v in &values {
      writer.put_value(*v, width);
    }
    let buf = writer.consume();

    let mut reader = BitReader::new(buf);
    for v in &values {
      assert_eq!(reader.get_value(width), Some(*v));
    }
  }

  #[test]
  fn test_bit_reader_exhausted_returns_none() {
    let mut writer = BitWriter::new();
    writer.put_value(1, 1);
    let buf = writer.consume();
    let mut reader = BitReader::new(buf);
    assert_eq!(reader.get_value(1), Some(1));
    // One byte was allocated for a single bit; remaining 7 bits read as 0
    // until the backing slice itself is exhausted.
    for _ in 0..7 {
      assert_eq!(reader.get_value(1), Some(0));
    }
    assert_eq!(reader.get_value(1), None);
  }
}
