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

//! Write-side counterpart of `column::reader`: buffers one leaf column's
//! triples, cuts pages once the buffered size crosses a threshold (§4.6) and
//! folds every value into running min/max/null-count/distinct-count
//! statistics (§4.9). `row_group::RowGroupWriter` (C9) owns one of these per
//! leaf column and assembles the finished pages into a column chunk.

use std::mem;

use basic::{Encoding, Type};
use data_type::*;
use encodings::encoding::{Dictionary, Encoder, PlainEncoder, SupportsDictionary};
use encodings::levels::LevelEncoder;
use errors::Result;
use schema::types::ColumnDescPtr;
use util::memory::ByteBufferPtr;
use super::page::Page;

/// Default page-size threshold (§4.6). `RowGroupWriter` may override this
/// per `file::properties::WriterProperties::data_page_size`.
pub const DEFAULT_PAGE_SIZE: usize = 1024 * 1024;

/// Running statistics for one column chunk, accumulated across every page
/// written so far. `row_group::RowGroupWriter` turns these into a
/// `file::metadata::Statistics` once the chunk is closed, plain-encoding
/// `min`/`max` the same way a data page would.
pub struct ColumnWriterStatistics<T: DataType> {
  pub min: Option<T::T>,
  pub max: Option<T::T>,
  pub null_count: u64,
  pub distinct_count: Option<u64>,
  pub num_values: u64,
  pub unencoded_byte_array_bytes: Option<u64>
}

impl<T: DataType> ColumnWriterStatistics<T> {
  fn new() -> Self {
    let tracks_byte_array_bytes = match T::get_physical_type() {
      Type::BYTE_ARRAY | Type::FIXED_LEN_BYTE_ARRAY => Some(0u64),
      _ => None
    };
    ColumnWriterStatistics {
      min: None,
      max: None,
      null_count: 0,
      distinct_count: None,
      num_values: 0,
      unencoded_byte_array_bytes: tracks_byte_array_bytes
    }
  }

  fn update(&mut self, value: &T::T) {
    self.num_values += 1;
    if let Some(ref mut bytes) = self.unencoded_byte_array_bytes {
      *bytes += T::value_size(value) as u64;
    }
    let is_new_min = match self.min {
      None => true,
      Some(ref m) => value < m
    };
    if is_new_min {
      self.min = Some(value.clone());
    }
    let is_new_max = match self.max {
      None => true,
      Some(ref m) => value > m
    };
    if is_new_max {
      self.max = Some(value.clone());
    }
  }
}

/// Everything needed to build one `file::metadata::ColumnChunkMetaData`
/// once a column is done being written.
pub struct ColumnChunkWriteResult<T: DataType> {
  pub pages: Vec<Page>,
  pub stats: ColumnWriterStatistics<T>
}

/// Page-emitting writer for one leaf column. `write_batch` mirrors the real
/// shape of the data it consumes: `values` holds only the non-null entries
/// for this call, `def_levels`/`rep_levels` (when the column is optional or
/// repeated) carry one entry per logical triple, including nulls.
pub struct ColumnWriterImpl<T: DataType> {
  descr: ColumnDescPtr,
  page_size_threshold: usize,
  dict_encoder: Option<Box<Dictionary<T>>>,
  encoder: Box<Encoder<T>>,
  pending_values: Vec<T::T>,
  pending_def_levels: Vec<i16>,
  pending_rep_levels: Vec<i16>,
  pages: Vec<Page>,
  stats: ColumnWriterStatistics<T>
}

impl<T: DataType + SupportsDictionary> ColumnWriterImpl<T>
where
  PlainEncoder<T>: Encoder<T>
{
  /// Builds a column writer. `use_dictionary` requests dictionary encoding;
  /// it is silently downgraded to `PLAIN` for physical kinds that don't
  /// support it (`FloatType`, `DoubleType` — see `SupportsDictionary`).
  pub fn new(descr: ColumnDescPtr, use_dictionary: bool, page_size_threshold: usize) -> Result<Self> {
    let dict_encoder = if use_dictionary { T::try_dictionary_encoder() } else { None };
    Ok(ColumnWriterImpl {
      descr: descr,
      page_size_threshold: page_size_threshold,
      dict_encoder: dict_encoder,
      encoder: Box::new(PlainEncoder::new()),
      pending_values: Vec::new(),
      pending_def_levels: Vec::new(),
      pending_rep_levels: Vec::new(),
      pages: Vec::new(),
      stats: ColumnWriterStatistics::new()
    })
  }

  pub fn column_descriptor(&self) -> &ColumnDescPtr {
    &self.descr
  }

  /// Appends one batch of values. Returns the number of values consumed
  /// (i.e. `values.len()`), matching the historical `write_batch` contract.
  pub fn write_batch(&mut self, values: &[T::T], def_levels: Option<&[i16]>, rep_levels: Option<&[i16]>) -> Result<usize> {
    let num_levels = def_levels.map(|d| d.len()).or_else(|| rep_levels.map(|r| r.len())).unwrap_or(values.len());
    let num_nulls = num_levels.saturating_sub(values.len());
    self.stats.null_count += num_nulls as u64;

    for v in values {
      self.stats.update(v);
    }
    self.pending_values.extend_from_slice(values);
    if let Some(d) = def_levels {
      self.pending_def_levels.extend_from_slice(d);
    }
    if let Some(r) = rep_levels {
      self.pending_rep_levels.extend_from_slice(r);
    }

    if self.estimated_buffered_size() >= self.page_size_threshold {
      self.flush_page()?;
    }
    Ok(values.len())
  }

  fn estimated_buffered_size(&self) -> usize {
    let value_size = match self.dict_encoder {
      Some(ref d) => d.estimated_data_encoded_size(),
      None => self.encoder.estimated_data_encoded_size()
    };
    value_size + 2 * self.pending_def_levels.len() + 2 * self.pending_rep_levels.len()
  }

  fn encode_levels(max_level: i16, levels: &[i16]) -> Result<Vec<u8>> {
    let max_buffer_size = LevelEncoder::max_buffer_size(Encoding::RLE, max_level, levels.len());
    let mut encoder = LevelEncoder::new(Encoding::RLE, max_level, vec![0; max_buffer_size]);
    encoder.put(levels)?;
    encoder.consume()
  }

  fn flush_page(&mut self) -> Result<()> {
    if self.pending_values.is_empty() && self.pending_def_levels.is_empty() && self.pending_rep_levels.is_empty() {
      return Ok(());
    }

    let num_values = if !self.pending_def_levels.is_empty() {
      self.pending_def_levels.len()
    } else if !self.pending_rep_levels.is_empty() {
      self.pending_rep_levels.len()
    } else {
      self.pending_values.len()
    };

    let mut buffer = Vec::new();
    if self.descr.max_rep_level() > 0 {
      let rep_levels = mem::replace(&mut self.pending_rep_levels, Vec::new());
      let encoded = Self::encode_levels(self.descr.max_rep_level(), &rep_levels)?;
      buffer.extend_from_slice(&encoded);
    }
    if self.descr.max_def_level() > 0 {
      let def_levels = mem::replace(&mut self.pending_def_levels, Vec::new());
      let encoded = Self::encode_levels(self.descr.max_def_level(), &def_levels)?;
      buffer.extend_from_slice(&encoded);
    }

    let values = mem::replace(&mut self.pending_values, Vec::new());
    let encoding = match self.dict_encoder {
      Some(ref mut dict) => {
        dict.put(&values)?;
        let indices = dict.flush_buffer()?;
        buffer.extend_from_slice(indices.all());
        Encoding::RLE_DICTIONARY
      },
      None => {
        self.encoder.put(&values)?;
        let encoded = self.encoder.flush_buffer()?;
        buffer.extend_from_slice(encoded.all());
        self.encoder.encoding()
      }
    };

    self.pages.push(Page::DataPage {
      buf: ByteBufferPtr::new(buffer),
      num_values: num_values as u32,
      encoding: encoding,
      def_level_encoding: Encoding::RLE,
      rep_level_encoding: Encoding::RLE
    });
    Ok(())
  }

  /// Flushes any buffered values, prepends the dictionary page (if this
  /// column uses one) and hands the finished chunk to the caller.
  pub fn close_column(mut self) -> Result<ColumnChunkWriteResult<T>> {
    self.flush_page()?;

    if let Some(dict) = self.dict_encoder.take() {
      let dict_bytes = dict.write_dict()?;
      let num_entries = dict.num_entries();
      self.stats.distinct_count = Some(num_entries as u64);
      self.pages.insert(0, Page::DictionaryPage {
        buf: dict_bytes,
        num_values: num_entries as u32,
        encoding: Encoding::RLE_DICTIONARY,
        is_sorted: false
      });
    }

    Ok(ColumnChunkWriteResult { pages: self.pages, stats: self.stats })
  }
}

/// Type-erased result of closing a column, once min/max have been
/// plain-encoded. `row_group::RowGroupWriter` turns this into a
/// `file::metadata::ColumnChunkMetaData`/`Statistics` pair.
pub struct ClosedColumnChunk {
  pub pages: Vec<Page>,
  pub num_values: u64,
  pub null_count: u64,
  pub distinct_count: Option<u64>,
  pub min_bytes: Option<Vec<u8>>,
  pub max_bytes: Option<Vec<u8>>,
  pub unencoded_byte_array_bytes: Option<u64>
}

fn close_typed<T: DataType>(result: ColumnChunkWriteResult<T>) -> Result<ClosedColumnChunk>
where
  PlainEncoder<T>: Encoder<T>
{
  let plain_encode = |value: &T::T| -> Result<Vec<u8>> {
    let mut encoder: PlainEncoder<T> = PlainEncoder::new();
    encoder.put(::std::slice::from_ref(value))?;
    Ok(encoder.flush_buffer()?.all().to_vec())
  };
  let min_bytes = match result.stats.min {
    Some(ref v) => Some(plain_encode(v)?),
    None => None
  };
  let max_bytes = match result.stats.max {
    Some(ref v) => Some(plain_encode(v)?),
    None => None
  };
  Ok(ClosedColumnChunk {
    pages: result.pages,
    num_values: result.stats.num_values,
    null_count: result.stats.null_count,
    distinct_count: result.stats.distinct_count,
    min_bytes: min_bytes,
    max_bytes: max_bytes,
    unencoded_byte_array_bytes: result.stats.unencoded_byte_array_bytes
  })
}

/// One column writer per physical kind, analogous to `column::reader::ColumnReader`.
/// `record::shredder` matches on the variant it expects (known from the
/// schema leaf's physical type) and calls the typed `write_batch` directly.
pub enum ColumnWriter {
  Bool(ColumnWriterImpl<BoolType>),
  Int32(ColumnWriterImpl<Int32Type>),
  Int64(ColumnWriterImpl<Int64Type>),
  Int96(ColumnWriterImpl<Int96Type>),
  Float(ColumnWriterImpl<FloatType>),
  Double(ColumnWriterImpl<DoubleType>),
  ByteArray(ColumnWriterImpl<ByteArrayType>),
  FixedLenByteArray(ColumnWriterImpl<FixedLenByteArrayType>)
}

pub fn get_column_writer(descr: ColumnDescPtr, use_dictionary: bool, page_size_threshold: usize) -> Result<ColumnWriter> {
  match descr.physical_type() {
    Type::BOOLEAN => Ok(ColumnWriter::Bool(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::INT32 => Ok(ColumnWriter::Int32(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::INT64 => Ok(ColumnWriter::Int64(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::INT96 => Ok(ColumnWriter::Int96(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::FLOAT => Ok(ColumnWriter::Float(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::DOUBLE => Ok(ColumnWriter::Double(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::BYTE_ARRAY => Ok(ColumnWriter::ByteArray(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?)),
    Type::FIXED_LEN_BYTE_ARRAY =>
      Ok(ColumnWriter::FixedLenByteArray(ColumnWriterImpl::new(descr, use_dictionary, page_size_threshold)?))
  }
}

impl ColumnWriter {
  pub fn close_column(self) -> Result<ClosedColumnChunk> {
    match self {
      ColumnWriter::Bool(w) => close_typed(w.close_column()?),
      ColumnWriter::Int32(w) => close_typed(w.close_column()?),
      ColumnWriter::Int64(w) => close_typed(w.close_column()?),
      ColumnWriter::Int96(w) => close_typed(w.close_column()?),
      ColumnWriter::Float(w) => close_typed(w.close_column()?),
      ColumnWriter::Double(w) => close_typed(w.close_column()?),
      ColumnWriter::ByteArray(w) => close_typed(w.close_column()?),
      ColumnWriter::FixedLenByteArray(w) => close_typed(w.close_column()?)
    }
  }

  pub fn column_descriptor(&self) -> &ColumnDescPtr {
    match *self {
      ColumnWriter::Bool(ref w) => w.column_descriptor(),
      ColumnWriter::Int32(ref w) => w.column_descriptor(),
      ColumnWriter::Int64(ref w) => w.column_descriptor(),
      ColumnWriter::Int96(ref w) => w.column_descriptor(),
      ColumnWriter::Float(ref w) => w.column_descriptor(),
      ColumnWriter::Double(ref w) => w.column_descriptor(),
      ColumnWriter::ByteArray(ref w) => w.column_descriptor(),
      ColumnWriter::FixedLenByteArray(ref w) => w.column_descriptor()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::{LogicalType, Repetition, Type as PhysicalType};
  use data_type::Int32Type;
  use schema::types::{ColumnDescriptor, ColumnPath, Type as SchemaType};
  use std::rc::Rc;

  fn required_int32_descr() -> ColumnDescPtr {
    let primitive = SchemaType::primitive_type_builder("a", PhysicalType::INT32)
      .with_repetition(Repetition::REQUIRED)
      .with_logical_type(LogicalType::INT_32)
      .build()
      .unwrap();
    Rc::new(ColumnDescriptor::new(Rc::new(primitive), None, 0, 0, ColumnPath::new(Vec::new())))
  }

  fn optional_int32_descr() -> ColumnDescPtr {
    let primitive = SchemaType::primitive_type_builder("a", PhysicalType::INT32)
      .with_repetition(Repetition::OPTIONAL)
      .with_logical_type(LogicalType::INT_32)
      .build()
      .unwrap();
    Rc::new(ColumnDescriptor::new(Rc::new(primitive), None, 1, 0, ColumnPath::new(Vec::new())))
  }

  #[test]
  fn test_write_batch_required_tracks_min_max() {
    let mut writer: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(required_int32_descr(), false, DEFAULT_PAGE_SIZE).unwrap();
    writer.write_batch(&[5, 1, 9, 3], None, None).unwrap();
    let result = writer.close_column().unwrap();
    assert_eq!(result.stats.min, Some(1));
    assert_eq!(result.stats.max, Some(9));
    assert_eq!(result.stats.null_count, 0);
    assert_eq!(result.pages.len(), 1);
  }

  #[test]
  fn test_write_batch_optional_counts_nulls() {
    let mut writer: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(optional_int32_descr(), false, DEFAULT_PAGE_SIZE).unwrap();
    writer.write_batch(&[10, 20], Some(&[1, 0, 1]), None).unwrap();
    let result = writer.close_column().unwrap();
    assert_eq!(result.stats.null_count, 1);
    assert_eq!(result.stats.num_values, 2);
  }

  #[test]
  fn test_dictionary_writer_emits_dictionary_page_first() {
    let mut writer: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(required_int32_descr(), true, DEFAULT_PAGE_SIZE).unwrap();
    writer.write_batch(&[1, 1, 2, 3, 2], None, None).unwrap();
    let result = writer.close_column().unwrap();
    assert_eq!(result.stats.distinct_count, Some(3));
    match result.pages[0] {
      Page::DictionaryPage { num_values, .. } => assert_eq!(num_values, 3),
      _ => panic!("expected dictionary page first")
    }
    assert_eq!(result.pages.len(), 2);
  }

  #[test]
  fn test_small_page_threshold_cuts_multiple_pages() {
    let mut writer: ColumnWriterImpl<Int32Type> = ColumnWriterImpl::new(required_int32_descr(), false, 8).unwrap();
    writer.write_batch(&[1, 2, 3, 4], None, None).unwrap();
    writer.write_batch(&[5, 6, 7, 8], None, None).unwrap();
    let result = writer.close_column().unwrap();
    assert!(result.pages.len() >= 2);
  }
}
