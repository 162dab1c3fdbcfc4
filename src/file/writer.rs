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

//! Writer/assembler (C10): `SerializedFileWriter` stitches `row_group`
//! output into one file. State machine per §4.9: `Open -> Writing` on the
//! first `write_rows`, `Writing -> Flushing` on `flush()` or a row-group
//! size boundary, `Flushing -> Writing` once that row group's pages are on
//! disk, `Writing -> Closed` on `close()`.
//!
//! File layout (§6): `magic(4) · [row-group bodies] · [row-group indexes] ·
//! footer-metadata · footer-length(4) · magic(4)`. Row-group bodies are
//! written as each row group is flushed; the index blocks for every row
//! group are only written once, at `close()`, so they can all live after
//! every page in the file as the layout requires.

use std::io::{Seek, SeekFrom, Write};
use std::rc::Rc;

use byteorder::{LittleEndian, WriteBytesExt};

use basic::{Compression, Encoding};
use column::page::Page;
use compression::{create_codec, Codec};
use errors::Result;
use file::metadata::{
  encode_column_index, encode_offset_index, BinaryMetadataCodec, ColumnChunkMetaData, ColumnIndex, FileMetaData,
  MetadataCodec, OffsetIndex, RowGroupMetaData, Statistics
};
use file::properties::WriterProperties;
use record::api::Row;
use row_group::{ClosedRowGroup, RowGroupColumnResult, RowGroupWriter};
use schema::types::{ColumnPath, SchemaDescriptor};

const MAGIC: &'static [u8; 4] = b"PAR1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
  Open,
  Writing,
  Flushing,
  Closed
}

/// One column chunk's worth of bookkeeping collected while its pages are
/// written, before the index blocks (written later, at `close()`) fix up
/// its offsets.
struct PendingColumn {
  path: ColumnPath,
  physical_type: ::basic::Type,
  encodings: Vec<Encoding>,
  num_values: u64,
  total_uncompressed_size: u64,
  total_compressed_size: u64,
  data_page_offset: u64,
  dictionary_page_offset: Option<u64>,
  statistics: Option<Statistics>,
  unencoded_byte_array_bytes: Option<u64>,
  bloom_filter_bytes: Option<Vec<u8>>,
  page_offsets: Vec<u64>,
  compressed_page_sizes: Vec<u64>,
  first_row_indexes: Vec<u64>
}

struct PendingRowGroup {
  num_rows: u64,
  total_byte_size: u64,
  columns: Vec<PendingColumn>
}

pub(crate) fn encode_encoding_tag(e: Encoding) -> u8 {
  match e {
    Encoding::PLAIN => 0,
    Encoding::PLAIN_DICTIONARY => 1,
    Encoding::RLE => 2,
    Encoding::RLE_DICTIONARY => 3,
    Encoding::BIT_PACKED => 4,
    Encoding::DELTA_BINARY_PACKED => 5,
    Encoding::DELTA_LENGTH_BYTE_ARRAY => 6,
    Encoding::DELTA_BYTE_ARRAY => 7,
    Encoding::BYTE_STREAM_SPLIT => 8
  }
}

/// Inverse of `encode_encoding_tag`; `file::reader` uses this to decode the
/// page headers `write_page` lays down.
pub(crate) fn decode_encoding_tag(tag: u8) -> Result<Encoding> {
  match tag {
    0 => Ok(Encoding::PLAIN),
    1 => Ok(Encoding::PLAIN_DICTIONARY),
    2 => Ok(Encoding::RLE),
    3 => Ok(Encoding::RLE_DICTIONARY),
    4 => Ok(Encoding::BIT_PACKED),
    5 => Ok(Encoding::DELTA_BINARY_PACKED),
    6 => Ok(Encoding::DELTA_LENGTH_BYTE_ARRAY),
    7 => Ok(Encoding::DELTA_BYTE_ARRAY),
    8 => Ok(Encoding::BYTE_STREAM_SPLIT),
    _ => Err(general_err!("invalid page encoding tag {}", tag))
  }
}

/// Writes one page's header (kind, value count, encodings) followed by the
/// compressed page body. Returns the byte offset the page was written at
/// plus the uncompressed/compressed body lengths.
fn write_page<W: Write + Seek>(out: &mut W, page: &Page, codec: &mut Codec) -> Result<(u64, u32, u32)> {
  let offset = out.seek(SeekFrom::Current(0))?;
  let raw = page.buffer().all();
  let mut compressed = Vec::new();
  codec.compress(raw, &mut compressed)?;

  match *page {
    Page::DataPage { encoding, def_level_encoding, rep_level_encoding, num_values, .. } => {
      out.write_u8(0)?;
      out.write_u32::<LittleEndian>(num_values)?;
      out.write_u8(encode_encoding_tag(encoding))?;
      out.write_u8(encode_encoding_tag(def_level_encoding))?;
      out.write_u8(encode_encoding_tag(rep_level_encoding))?;
    },
    Page::DictionaryPage { encoding, num_values, is_sorted, .. } => {
      out.write_u8(1)?;
      out.write_u32::<LittleEndian>(num_values)?;
      out.write_u8(encode_encoding_tag(encoding))?;
      out.write_u8(if is_sorted { 1 } else { 0 })?;
    }
  }
  out.write_u32::<LittleEndian>(raw.len() as u32)?;
  out.write_u32::<LittleEndian>(compressed.len() as u32)?;
  out.write_all(&compressed)?;

  Ok((offset, raw.len() as u32, compressed.len() as u32))
}

/// `file::writer::SerializedFileWriter<W>` implements the Writer API
/// (§6), dispatching row accumulation to `row_group::RowGroupWriter` and
/// handling everything page-framing/footer-shaped itself.
pub struct SerializedFileWriter<W: Write + Seek> {
  out: W,
  schema: Rc<SchemaDescriptor>,
  props: Rc<WriterProperties>,
  state: WriterState,
  current: Option<RowGroupWriter>,
  pending_row_groups: Vec<PendingRowGroup>,
  key_value_metadata: Vec<(String, String)>
}

impl<W: Write + Seek> SerializedFileWriter<W> {
  pub fn open(mut out: W, schema: Rc<SchemaDescriptor>, props: Rc<WriterProperties>) -> Result<Self> {
    out.write_all(MAGIC)?;
    debug!("opened file writer, schema has {} leaf columns", schema.num_columns());
    Ok(SerializedFileWriter {
      out: out,
      schema: schema,
      props: props,
      state: WriterState::Open,
      current: None,
      pending_row_groups: Vec::new(),
      key_value_metadata: Vec::new()
    })
  }

  pub fn state(&self) -> WriterState {
    self.state
  }

  pub fn write_rows(&mut self, rows: &[Row]) -> Result<usize> {
    if self.state == WriterState::Closed {
      return Err(general_err!("cannot write to a closed file writer"));
    }
    if self.current.is_none() {
      self.current = Some(RowGroupWriter::new(self.schema.clone(), self.props.clone()));
    }
    self.state = WriterState::Writing;

    let n = rows.len();
    self.current.as_mut().unwrap().write_rows(rows.to_vec());
    if self.current.as_ref().unwrap().should_flush() {
      self.flush()?;
    }
    Ok(n)
  }

  /// Forces a row-group boundary: closes the in-progress row group (if any
  /// rows were written to it), writing its pages to `out` immediately.
  /// Index blocks for this row group are deferred to `close()`.
  pub fn flush(&mut self) -> Result<()> {
    if self.state == WriterState::Closed {
      return Err(general_err!("cannot flush a closed file writer"));
    }
    let rg_writer = match self.current.take() {
      Some(w) => w,
      None => return Ok(())
    };
    if rg_writer.num_rows() == 0 {
      return Ok(());
    }

    self.state = WriterState::Flushing;
    debug!("flushing row group with {} rows", rg_writer.num_rows());
    let closed = rg_writer.close()?;
    let pending = self.write_row_group_body(closed)?;
    self.pending_row_groups.push(pending);
    self.state = WriterState::Writing;
    Ok(())
  }

  pub fn set_key_value_metadata(&mut self, key: String, value: String) -> Result<()> {
    self.key_value_metadata.push((key, value));
    Ok(())
  }

  /// Appends an already-closed row group without going through the
  /// `write_rows`/`flush` row-count bookkeeping. `sorting_writer` uses this
  /// to land its single globally-merged row group regardless of how many
  /// rows it holds relative to `max_row_group_length`.
  pub(crate) fn append_closed_row_group(&mut self, closed: ClosedRowGroup) -> Result<()> {
    if closed.num_rows == 0 {
      return Ok(());
    }
    if self.state == WriterState::Closed {
      return Err(general_err!("cannot append a row group to a closed file writer"));
    }
    self.state = WriterState::Flushing;
    let pending = self.write_row_group_body(closed)?;
    self.pending_row_groups.push(pending);
    self.state = WriterState::Writing;
    Ok(())
  }

  /// Finalizes every row group, writes the deferred index blocks, the
  /// footer and the closing magic. Takes `&mut self` (rather than `self`)
  /// so callers can still reach the underlying writer, e.g. via
  /// `into_inner()`, once closed.
  pub fn close(&mut self) -> Result<()> {
    if self.state == WriterState::Closed {
      return Ok(());
    }
    self.flush()?;

    let pending = ::std::mem::replace(&mut self.pending_row_groups, Vec::new());
    let mut row_groups = Vec::with_capacity(pending.len());
    for rg in pending {
      let mut columns = Vec::with_capacity(rg.columns.len());
      for col in rg.columns {
        columns.push(self.write_indexes_and_bloom(col)?);
      }
      row_groups.push(RowGroupMetaData { columns: columns, num_rows: rg.num_rows, total_byte_size: rg.total_byte_size });
    }

    let meta = FileMetaData {
      schema: self.schema.root_schema_ptr(),
      row_groups: row_groups,
      created_by: self.props.created_by().map(|s| s.to_string()),
      key_value_metadata: self.key_value_metadata.clone(),
      version: 1
    };
    let bytes = BinaryMetadataCodec.encode(&meta)?;
    self.out.write_all(&bytes)?;
    self.out.write_u32::<LittleEndian>(bytes.len() as u32)?;
    self.out.write_all(MAGIC)?;

    self.state = WriterState::Closed;
    info!("closed file writer, wrote {} row groups", meta.row_groups.len());
    Ok(())
  }

  pub fn into_inner(self) -> W {
    self.out
  }

  fn write_row_group_body(&mut self, closed: ClosedRowGroup) -> Result<PendingRowGroup> {
    let mut total_byte_size = 0u64;
    let mut columns = Vec::with_capacity(closed.columns.len());
    for col in closed.columns {
      let pending = self.write_column_chunk(col)?;
      total_byte_size += pending.total_compressed_size;
      columns.push(pending);
    }
    Ok(PendingRowGroup { num_rows: closed.num_rows, total_byte_size: total_byte_size, columns: columns })
  }

  fn write_column_chunk(&mut self, col: RowGroupColumnResult) -> Result<PendingColumn> {
    let mut codec = create_codec(self.props.codec())?;
    let mut encodings = Vec::new();
    let mut data_page_offset = None;
    let mut dictionary_page_offset = None;
    let mut total_uncompressed_size = 0u64;
    let mut total_compressed_size = 0u64;
    let mut page_offsets = Vec::new();
    let mut compressed_page_sizes = Vec::new();
    let mut first_row_indexes = Vec::new();
    let mut rows_seen = 0u64;

    for page in &col.chunk.pages {
      if !encodings.contains(&page.encoding()) {
        encodings.push(page.encoding());
      }
      let (offset, raw_len, compressed_len) = write_page(&mut self.out, page, &mut *codec)?;
      total_uncompressed_size += raw_len as u64;
      total_compressed_size += compressed_len as u64;

      match *page {
        Page::DictionaryPage { .. } => {
          dictionary_page_offset = Some(offset);
        },
        Page::DataPage { num_values, .. } => {
          if data_page_offset.is_none() {
            data_page_offset = Some(offset);
          }
          page_offsets.push(offset);
          compressed_page_sizes.push(compressed_len as u64);
          // Approximates one row per value; accurate for non-repeated
          // columns, an undercount for repeated ones since a value page
          // may span a partial row at either edge.
          first_row_indexes.push(rows_seen);
          rows_seen += num_values as u64;
        }
      }
    }

    let statistics = Some(Statistics {
      min: if self.props.skip_page_bounds(&col.path) { None } else { col.chunk.min_bytes },
      max: if self.props.skip_page_bounds(&col.path) { None } else { col.chunk.max_bytes },
      null_count: Some(col.chunk.null_count),
      distinct_count: col.chunk.distinct_count,
      def_level_histogram: col.def_level_histogram,
      rep_level_histogram: col.rep_level_histogram
    });

    Ok(PendingColumn {
      path: col.path,
      physical_type: col.physical_type,
      encodings: encodings,
      num_values: col.chunk.num_values,
      total_uncompressed_size: total_uncompressed_size,
      total_compressed_size: total_compressed_size,
      data_page_offset: data_page_offset.unwrap_or(0),
      dictionary_page_offset: dictionary_page_offset,
      statistics: statistics,
      unencoded_byte_array_bytes: col.chunk.unencoded_byte_array_bytes,
      bloom_filter_bytes: col.bloom_filter,
      page_offsets: page_offsets,
      compressed_page_sizes: compressed_page_sizes,
      first_row_indexes: first_row_indexes
    })
  }

  /// Writes this column's column index, offset index and (if configured) a
  /// bloom filter block, then folds everything collected for it into the
  /// footer's `ColumnChunkMetaData`. Only called from `close()`, after
  /// every row group's pages are already on disk — the layout requires all
  /// index blocks to follow all page bodies.
  fn write_indexes_and_bloom(&mut self, col: PendingColumn) -> Result<ColumnChunkMetaData> {
    let (min, max, null_count) = match col.statistics {
      Some(ref s) => (s.min.clone(), s.max.clone(), s.null_count.unwrap_or(0)),
      None => (None, None, 0)
    };
    let column_index = ColumnIndex { min_values: vec![min], max_values: vec![max], null_counts: vec![null_count] };
    let column_index_bytes = encode_column_index(&column_index)?;
    let column_index_offset = self.out.seek(SeekFrom::Current(0))?;
    self.out.write_all(&column_index_bytes)?;

    let offset_index = OffsetIndex {
      page_offsets: col.page_offsets,
      compressed_page_sizes: col.compressed_page_sizes,
      first_row_indexes: col.first_row_indexes
    };
    let offset_index_bytes = encode_offset_index(&offset_index)?;
    let offset_index_offset = self.out.seek(SeekFrom::Current(0))?;
    self.out.write_all(&offset_index_bytes)?;

    let (bloom_filter_offset, bloom_filter_length) = match col.bloom_filter_bytes {
      Some(ref bytes) => {
        let offset = self.out.seek(SeekFrom::Current(0))?;
        self.out.write_all(bytes)?;
        (Some(offset), Some(bytes.len() as u64))
      },
      None => (None, None)
    };

    Ok(ColumnChunkMetaData {
      path: col.path,
      physical_type: col.physical_type,
      encodings: col.encodings,
      codec: self.props.codec(),
      num_values: col.num_values,
      total_uncompressed_size: col.total_uncompressed_size,
      total_compressed_size: col.total_compressed_size,
      data_page_offset: col.data_page_offset,
      dictionary_page_offset: col.dictionary_page_offset,
      statistics: col.statistics,
      unencoded_byte_array_bytes: col.unencoded_byte_array_bytes,
      bloom_filter_offset: bloom_filter_offset,
      bloom_filter_length: bloom_filter_length,
      column_index_offset: Some(column_index_offset),
      column_index_length: Some(column_index_bytes.len() as u64),
      offset_index_offset: Some(offset_index_offset),
      offset_index_length: Some(offset_index_bytes.len() as u64),
      key_value_metadata: Vec::new()
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::{Repetition, Type as PhysicalType};
  use file::properties::WriterProperties;
  use record::api::RowField;
  use schema::types::{SchemaDescriptor, Type as SchemaType};
  use std::io::Cursor;

  fn flat_schema() -> Rc<SchemaDescriptor> {
    let id = Rc::new(
      SchemaType::primitive_type_builder("id", PhysicalType::INT32)
        .with_repetition(Repetition::REQUIRED)
        .build()
        .unwrap()
    );
    let name = Rc::new(
      SchemaType::primitive_type_builder("name", PhysicalType::BYTE_ARRAY)
        .with_repetition(Repetition::OPTIONAL)
        .build()
        .unwrap()
    );
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id, name]).build().unwrap());
    Rc::new(SchemaDescriptor::new(root))
  }

  fn row(id: i32, name: Option<&str>) -> Row {
    let mut fields = vec![("id".to_string(), RowField::Int(id))];
    if let Some(n) = name {
      fields.push(("name".to_string(), RowField::Str(n.to_string())));
    }
    Row::new(fields)
  }

  #[test]
  fn test_close_writes_leading_and_trailing_magic() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::default());
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, Some("a")), row(2, None)]).unwrap();
    writer.close().unwrap();

    let bytes = writer.into_inner().into_inner();
    assert_eq!(&bytes[0..4], MAGIC);
    assert_eq!(&bytes[bytes.len() - 4..], MAGIC);
  }

  #[test]
  fn test_close_footer_length_points_at_decodable_metadata() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::default());
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, Some("a")), row(2, None), row(3, Some("c"))]).unwrap();
    writer.close().unwrap();

    let bytes = writer.into_inner().into_inner();
    let len = bytes.len();
    let footer_len_bytes = &bytes[len - 8..len - 4];
    let footer_len = (footer_len_bytes[0] as u32)
      | ((footer_len_bytes[1] as u32) << 8)
      | ((footer_len_bytes[2] as u32) << 16)
      | ((footer_len_bytes[3] as u32) << 24);
    let footer_start = len - 8 - footer_len as usize;
    let meta = BinaryMetadataCodec.decode(&bytes[footer_start..len - 8]).unwrap();
    assert_eq!(meta.row_groups.len(), 1);
    assert_eq!(meta.row_groups[0].num_rows, 3);
    assert_eq!(meta.row_groups[0].columns.len(), 2);
    assert_eq!(meta.row_groups[0].columns[1].statistics.as_ref().unwrap().null_count, Some(1));
  }

  #[test]
  fn test_max_row_group_length_forces_automatic_flush() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::builder().set_max_row_group_length(2).build());
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, None)]).unwrap();
    writer.write_rows(&[row(2, None)]).unwrap();
    assert_eq!(writer.pending_row_groups.len(), 1);
    writer.write_rows(&[row(3, None)]).unwrap();
    writer.close().unwrap();

    let bytes = writer.into_inner().into_inner();
    let len = bytes.len();
    let footer_len_bytes = &bytes[len - 8..len - 4];
    let footer_len = (footer_len_bytes[0] as u32)
      | ((footer_len_bytes[1] as u32) << 8)
      | ((footer_len_bytes[2] as u32) << 16)
      | ((footer_len_bytes[3] as u32) << 24);
    let footer_start = len - 8 - footer_len as usize;
    let meta = BinaryMetadataCodec.decode(&bytes[footer_start..len - 8]).unwrap();
    assert_eq!(meta.row_groups.len(), 2);
    assert_eq!(meta.row_groups[0].num_rows, 2);
    assert_eq!(meta.row_groups[1].num_rows, 1);
  }
}
