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

//! Encoders, the write-side counterpart of `decoding.rs`. Same note applies:
//! per-kind behavior is spelled out as separate `impl Encoder<Kind> for
//! PlainEncoder<Kind>` blocks rather than specialized default methods.

use std::hash::Hash;
use std::marker::PhantomData;

use byteorder::{ByteOrder, LittleEndian};

use basic::Encoding;
use data_type::*;
use encodings::rle::RleEncoder;
use errors::Result;
use util::bit_util::BitWriter;
use util::hash_util::{HashMapProbeTable, ProbeTable};
use util::memory::{ByteBuffer, ByteBufferPtr};

/// A Parquet-style encoder for the data type `T`.
pub trait Encoder<T: DataType> {
  /// Appends `values` to this encoder's pending buffer.
  fn put(&mut self, values: &[T::T]) -> Result<()>;

  /// Returns everything encoded so far and resets internal state, matching
  /// the page writer's flush-per-page usage (C6).
  fn flush_buffer(&mut self) -> Result<ByteBufferPtr>;

  fn encoding(&self) -> Encoding;

  /// Rough estimate of the encoded size of values buffered so far, used to
  /// decide when a page is full (§4.6 "Size estimation").
  fn estimated_data_encoded_size(&self) -> usize;
}

/// Builds an encoder for a self-describing encoding. Dictionary encoding is
/// constructed directly via `DictEncoder::new()` since it needs no extra
/// wiring beyond the data type.
pub fn get_encoder<T: DataType>(encoding: Encoding) -> Result<Box<Encoder<T>>>
where
  PlainEncoder<T>: Encoder<T>,
  DeltaBitPackEncoder<T>: Encoder<T>
{
  let encoder: Box<Encoder<T>> = match encoding {
    Encoding::PLAIN => Box::new(PlainEncoder::new()),
    Encoding::DELTA_BINARY_PACKED => Box::new(DeltaBitPackEncoder::new()),
    Encoding::PLAIN_DICTIONARY | Encoding::RLE_DICTIONARY => {
      return Err(general_err!("Use DictEncoder::new() directly for dictionary encoding"));
    },
    e => return Err(nyi_err!("Encoding {} has no encoder wired up for this physical type", e))
  };
  Ok(encoder)
}

// ----------------------------------------------------------------------
// PLAIN encoding

/// Plain encoding, covering every physical type. See
/// [`PlainDecoder`](`super::decoding::PlainDecoder`).
pub struct PlainEncoder<T: DataType> {
  buffer: ByteBuffer,
  bit_writer: Option<BitWriter>,
  num_values: usize,
  _phantom: PhantomData<T>
}

impl<T: DataType> PlainEncoder<T> {
  pub fn new() -> Self {
    PlainEncoder { buffer: ByteBuffer::new(), bit_writer: None, num_values: 0, _phantom: PhantomData }
  }
}

macro_rules! impl_plain_encoder_fixed_width {
  ($ty:ident, $native:ty, $write:ident) => {
    impl Encoder<$ty> for PlainEncoder<$ty> {
      fn put(&mut self, values: &[$native]) -> Result<()> {
        use std::io::Write;
        let mut tmp = [0u8; 8];
        for v in values {
          let width = ::std::mem::size_of::<$native>();
          LittleEndian::$write(&mut tmp[..width], *v);
          self.buffer.write(&tmp[..width])?;
        }
        self.num_values += values.len();
        Ok(())
      }

      fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        self.num_values = 0;
        Ok(::std::mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
      }

      fn encoding(&self) -> Encoding {
        Encoding::PLAIN
      }

      fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.size()
      }
    }
  };
}

impl_plain_encoder_fixed_width!(Int32Type, i32, write_i32);
impl_plain_encoder_fixed_width!(Int64Type, i64, write_i64);
impl_plain_encoder_fixed_width!(FloatType, f32, write_f32);
impl_plain_encoder_fixed_width!(DoubleType, f64, write_f64);

impl Encoder<Int96Type> for PlainEncoder<Int96Type> {
  fn put(&mut self, values: &[Int96]) -> Result<()> {
    use std::io::Write;
    for v in values {
      let mut tmp = [0u8; 4];
      for word in v.data() {
        LittleEndian::write_u32(&mut tmp, *word);
        self.buffer.write(&tmp)?;
      }
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(::std::mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.buffer.size()
  }
}

impl Encoder<BoolType> for PlainEncoder<BoolType> {
  fn put(&mut self, values: &[bool]) -> Result<()> {
    let writer = self.bit_writer.get_or_insert_with(BitWriter::new);
    for v in values {
      writer.put_value(*v as u64, 1);
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    match self.bit_writer.take() {
      Some(writer) => Ok(writer.consume()),
      None => Ok(ByteBufferPtr::new(Vec::new()))
    }
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.bit_writer.as_ref().map(|w| w.bytes_written()).unwrap_or(0)
  }
}

impl Encoder<ByteArrayType> for PlainEncoder<ByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    use std::io::Write;
    let mut len_bytes = [0u8; 4];
    for v in values {
      LittleEndian::write_u32(&mut len_bytes, v.len() as u32);
      self.buffer.write(&len_bytes)?;
      self.buffer.write(v.data())?;
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(::std::mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.buffer.size()
  }
}

impl Encoder<FixedLenByteArrayType> for PlainEncoder<FixedLenByteArrayType> {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    use std::io::Write;
    for v in values {
      self.buffer.write(v.data())?;
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    Ok(::std::mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
  }

  fn encoding(&self) -> Encoding {
    Encoding::PLAIN
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.buffer.size()
  }
}

// ----------------------------------------------------------------------
// RLE_DICTIONARY / PLAIN_DICTIONARY encoding (C5)

/// Dictionary encoder. Assigns each distinct value an id via a `ProbeTable`
/// (the §1 `ProbeTable<K>` collaborator; `HashMapProbeTable` is the default)
/// and writes an RLE/bit-packed stream of ids. `write_dict()` serializes the
/// accumulated dictionary itself (a plain-encoded page written once, ahead
/// of the index pages, per C5).
pub struct DictEncoder<T: DataType>
where
  T::T: Eq + Hash
{
  probe_table: HashMapProbeTable<T::T>,
  uniques: Vec<T::T>,
  indices: Vec<i32>
}

impl<T: DataType> DictEncoder<T>
where
  T::T: Eq + Hash
{
  pub fn new() -> Self {
    DictEncoder { probe_table: HashMapProbeTable::new(), uniques: Vec::new(), indices: Vec::new() }
  }

  pub fn num_entries(&self) -> usize {
    self.uniques.len()
  }

  /// Serializes the dictionary itself as a plain-encoded page. Call once
  /// per column chunk, before the index pages that reference it.
  pub fn write_dict(&self) -> Result<ByteBufferPtr>
  where
    PlainEncoder<T>: Encoder<T>
  {
    let mut encoder: PlainEncoder<T> = PlainEncoder::new();
    encoder.put(&self.uniques)?;
    encoder.flush_buffer()
  }
}

/// A dictionary encoder exposed as a trait object. Lets `column::writer`
/// hold `Box<Dictionary<T>>` generically over every physical kind without
/// restating `T::T: Eq + Hash` on the containing struct; only constructing
/// the concrete `DictEncoder<T>` requires that bound.
pub trait Dictionary<T: DataType>: Encoder<T> {
  fn write_dict(&self) -> Result<ByteBufferPtr>;
  fn num_entries(&self) -> usize;
}

impl<T: DataType> Dictionary<T> for DictEncoder<T>
where
  T::T: Eq + Hash,
  PlainEncoder<T>: Encoder<T>
{
  fn write_dict(&self) -> Result<ByteBufferPtr> {
    DictEncoder::write_dict(self)
  }

  fn num_entries(&self) -> usize {
    DictEncoder::num_entries(self)
  }
}

/// Decides, per physical kind, whether `ColumnWriterImpl::new` may build a
/// `DictEncoder` when the caller asks for dictionary encoding. `FloatType`
/// and `DoubleType` opt out: their native `f32`/`f64` have no total equality,
/// so `DictEncoder<T>`'s `T::T: Eq + Hash` bound can never be met for them.
pub trait SupportsDictionary: DataType {
  fn try_dictionary_encoder() -> Option<Box<Dictionary<Self>>>;
}

macro_rules! impl_supports_dictionary {
  ($ty:ident) => {
    impl SupportsDictionary for $ty {
      fn try_dictionary_encoder() -> Option<Box<Dictionary<Self>>> {
        Some(Box::new(DictEncoder::new()))
      }
    }
  };
}

impl_supports_dictionary!(BoolType);
impl_supports_dictionary!(Int32Type);
impl_supports_dictionary!(Int64Type);
impl_supports_dictionary!(Int96Type);
impl_supports_dictionary!(ByteArrayType);
impl_supports_dictionary!(FixedLenByteArrayType);

impl SupportsDictionary for FloatType {
  fn try_dictionary_encoder() -> Option<Box<Dictionary<Self>>> {
    None
  }
}

impl SupportsDictionary for DoubleType {
  fn try_dictionary_encoder() -> Option<Box<Dictionary<Self>>> {
    None
  }
}

impl<T: DataType> Encoder<T> for DictEncoder<T>
where
  T::T: Eq + Hash
{
  fn put(&mut self, values: &[T::T]) -> Result<()> {
    let mut out = vec![0i32; values.len()];
    self.probe_table.probe(values, &mut out);
    // `probe` only assigns ids; recover newly-seen values in insertion
    // order by replaying against `uniques.len()`.
    for (v, id) in values.iter().zip(out.iter()) {
      if *id as usize == self.uniques.len() {
        self.uniques.push(v.clone());
      }
    }
    self.indices.extend(out);
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    let bit_width = ::util::bit_util::num_required_bits(self.uniques.len().max(1) as i64 - 1).max(1);
    let mut rle = RleEncoder::new(bit_width);
    for idx in self.indices.drain(..) {
      rle.put(idx as u64)?;
    }
    let encoded = rle.consume()?;
    let mut out = Vec::with_capacity(1 + encoded.len());
    out.push(bit_width);
    out.extend_from_slice(encoded.all());
    Ok(ByteBufferPtr::new(out))
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE_DICTIONARY
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.indices.len() * 4
  }
}

// ----------------------------------------------------------------------
// RLE encoding (data page v2 boolean columns only)

/// RLE/bit-packing hybrid encoding of values. Only `BoolType` is wired up,
/// mirroring `RleValueDecoder`.
pub struct RleValueEncoder<T: DataType> {
  rle: Option<RleEncoder>,
  num_values: usize,
  _phantom: PhantomData<T>
}

impl<T: DataType> RleValueEncoder<T> {
  pub fn new() -> Self {
    RleValueEncoder { rle: None, num_values: 0, _phantom: PhantomData }
  }
}

impl Encoder<BoolType> for RleValueEncoder<BoolType> {
  fn put(&mut self, values: &[bool]) -> Result<()> {
    let rle = self.rle.get_or_insert_with(|| RleEncoder::new(1));
    for v in values {
      rle.put(*v as u64)?;
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    let rle = self.rle.take().unwrap_or_else(|| RleEncoder::new(1));
    let encoded = rle.consume()?;
    let mut out = Vec::with_capacity(4 + encoded.len());
    out.extend_from_slice(&[0u8; 4]);
    LittleEndian::write_i32(&mut out[0..4], encoded.len() as i32);
    out.extend_from_slice(encoded.all());
    Ok(ByteBufferPtr::new(out))
  }

  fn encoding(&self) -> Encoding {
    Encoding::RLE
  }

  fn estimated_data_encoded_size(&self) -> usize {
    (self.num_values + 7) / 8
  }
}

// ----------------------------------------------------------------------
// DELTA_BINARY_PACKED encoding (integers only). See `DeltaBitPackDecoder`
// for the simplified zigzag-varint wire format used here.
pub struct DeltaBitPackEncoder<T: DataType> {
  buffer: ByteBuffer,
  last_value: i64,
  started: bool,
  num_values: usize,
  _phantom: PhantomData<T>
}

impl<T: DataType> DeltaBitPackEncoder<T> {
  pub fn new() -> Self {
    DeltaBitPackEncoder {
      buffer: ByteBuffer::new(),
      last_value: 0,
      started: false,
      num_values: 0,
      _phantom: PhantomData
    }
  }

  fn write_zigzag(&mut self, value: i64) {
    use std::io::Write;
    let mut zigzag = ((value << 1) ^ (value >> 63)) as u64;
    loop {
      let mut byte = (zigzag & 0x7F) as u8;
      zigzag >>= 7;
      if zigzag != 0 {
        byte |= 0x80;
      }
      let _ = self.buffer.write(&[byte]);
      if zigzag == 0 {
        break;
      }
    }
  }
}

macro_rules! impl_delta_encoder {
  ($ty:ident, $native:ty) => {
    impl Encoder<$ty> for DeltaBitPackEncoder<$ty> {
      fn put(&mut self, values: &[$native]) -> Result<()> {
        for &v in values {
          let v = v as i64;
          if !self.started {
            self.write_zigzag(v);
            self.last_value = v;
            self.started = true;
          } else {
            self.write_zigzag(v - self.last_value);
            self.last_value = v;
          }
        }
        self.num_values += values.len();
        Ok(())
      }

      fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
        self.num_values = 0;
        self.started = false;
        Ok(::std::mem::replace(&mut self.buffer, ByteBuffer::new()).consume())
      }

      fn encoding(&self) -> Encoding {
        Encoding::DELTA_BINARY_PACKED
      }

      fn estimated_data_encoded_size(&self) -> usize {
        self.buffer.size()
      }
    }
  };
}

impl_delta_encoder!(Int32Type, i32);
impl_delta_encoder!(Int64Type, i64);

// ----------------------------------------------------------------------
// DELTA_LENGTH_BYTE_ARRAY encoding

/// Delta-length byte array encoding: a zigzag-varint delta stream of
/// lengths followed by the concatenated payloads. See
/// `DeltaLengthByteArrayDecoder`.
pub struct DeltaLengthByteArrayEncoder {
  lengths: DeltaBitPackEncoder<Int32Type>,
  payload: ByteBuffer,
  num_values: usize
}

impl DeltaLengthByteArrayEncoder {
  pub fn new() -> Self {
    DeltaLengthByteArrayEncoder { lengths: DeltaBitPackEncoder::new(), payload: ByteBuffer::new(), num_values: 0 }
  }
}

impl Encoder<ByteArrayType> for DeltaLengthByteArrayEncoder {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    use std::io::Write;
    for v in values {
      self.lengths.put(&[v.len() as i32])?;
      self.payload.write(v.data())?;
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    let lengths = self.lengths.flush_buffer()?;
    let mut out = Vec::with_capacity(lengths.len() + self.payload.size());
    out.extend_from_slice(lengths.all());
    out.extend_from_slice(self.payload.data());
    self.payload = ByteBuffer::new();
    Ok(ByteBufferPtr::new(out))
  }

  fn encoding(&self) -> Encoding {
    Encoding::DELTA_LENGTH_BYTE_ARRAY
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.payload.size()
  }
}

// ----------------------------------------------------------------------
// DELTA_BYTE_ARRAY encoding

/// Prefix-shares each value with the one before it; the shared-prefix
/// length stream is zigzag-varint delta encoded, the suffixes are
/// delta-length-byte-array encoded. See `DeltaByteArrayDecoder`.
pub struct DeltaByteArrayEncoder {
  prefix_lengths: DeltaBitPackEncoder<Int32Type>,
  suffixes: DeltaLengthByteArrayEncoder,
  previous: ByteArray,
  num_values: usize
}

impl DeltaByteArrayEncoder {
  pub fn new() -> Self {
    DeltaByteArrayEncoder {
      prefix_lengths: DeltaBitPackEncoder::new(),
      suffixes: DeltaLengthByteArrayEncoder::new(),
      previous: ByteArray::default(),
      num_values: 0
    }
  }

  fn shared_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
  }
}

impl Encoder<ByteArrayType> for DeltaByteArrayEncoder {
  fn put(&mut self, values: &[ByteArray]) -> Result<()> {
    for v in values {
      let prefix_len = Self::shared_prefix_len(self.previous.data(), v.data());
      self.prefix_lengths.put(&[prefix_len as i32])?;
      let suffix = ByteArray::new(v.data()[prefix_len..].to_vec());
      self.suffixes.put(&[suffix])?;
      self.previous = v.clone();
    }
    self.num_values += values.len();
    Ok(())
  }

  fn flush_buffer(&mut self) -> Result<ByteBufferPtr> {
    self.num_values = 0;
    self.previous = ByteArray::default();
    let prefixes = self.prefix_lengths.flush_buffer()?;
    let suffixes = self.suffixes.flush_buffer()?;
    let mut out = Vec::with_capacity(4 + prefixes.len() + suffixes.len());
    let mut header = [0u8; 4];
    LittleEndian::write_u32(&mut header, prefixes.len() as u32);
    out.extend_from_slice(&header);
    out.extend_from_slice(prefixes.all());
    out.extend_from_slice(suffixes.all());
    Ok(ByteBufferPtr::new(out))
  }

  fn encoding(&self) -> Encoding {
    Encoding::DELTA_BYTE_ARRAY
  }

  fn estimated_data_encoded_size(&self) -> usize {
    self.suffixes.estimated_data_encoded_size()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use encodings::decoding::{DeltaByteArrayDecoder, DeltaLengthByteArrayDecoder, Decoder, PlainDecoder};

  #[test]
  fn test_plain_encoder_int32_flush_resets_buffer() {
    let mut encoder: PlainEncoder<Int32Type> = PlainEncoder::new();
    encoder.put(&[1, 2, 3]).unwrap();
    let first = encoder.flush_buffer().unwrap();
    assert_eq!(first.len(), 12);
    encoder.put(&[4]).unwrap();
    let second = encoder.flush_buffer().unwrap();
    assert_eq!(second.len(), 4);
  }

  #[test]
  fn test_dict_encoder_assigns_stable_ids_and_round_trips() {
    let mut encoder: DictEncoder<Int32Type> = DictEncoder::new();
    encoder.put(&[10, 20, 10, 30]).unwrap();
    assert_eq!(encoder.num_entries(), 3);

    let dict_bytes = encoder.write_dict().unwrap();
    let index_bytes = encoder.flush_buffer().unwrap();

    let mut dict_decoder: PlainDecoder<Int32Type> = PlainDecoder::new(-1);
    dict_decoder.set_data(dict_bytes, encoder.num_entries()).unwrap();
    let mut dict: ::encodings::decoding::DictDecoder<Int32Type> = ::encodings::decoding::DictDecoder::new();
    dict.set_dict(Box::new(dict_decoder)).unwrap();
    dict.set_data(index_bytes, 4).unwrap();
    let mut out = vec![0i32; 4];
    dict.get(&mut out).unwrap();
    assert_eq!(out, vec![10, 20, 10, 30]);
  }

  #[test]
  fn test_delta_byte_array_roundtrip_with_shared_prefixes() {
    let values: Vec<ByteArray> = vec!["apple".into(), "application".into(), "banana".into()];
    let mut encoder = DeltaByteArrayEncoder::new();
    encoder.put(&values).unwrap();
    let encoded = encoder.flush_buffer().unwrap();

    let mut decoder = DeltaByteArrayDecoder::new();
    decoder.set_data(encoded, values.len()).unwrap();
    let mut out = vec![ByteArray::default(); values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }

  #[test]
  fn test_delta_length_byte_array_roundtrip() {
    let values: Vec<ByteArray> = vec!["a".into(), "bb".into(), "ccc".into(), "".into()];
    let mut encoder = DeltaLengthByteArrayEncoder::new();
    encoder.put(&values).unwrap();
    let encoded = encoder.flush_buffer().unwrap();

    let mut decoder = DeltaLengthByteArrayDecoder::new();
    decoder.set_data(encoded, values.len()).unwrap();
    let mut out = vec![ByteArray::default(); values.len()];
    decoder.get(&mut out).unwrap();
    assert_eq!(out, values);
  }
}
