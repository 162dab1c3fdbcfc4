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

//! Footer metadata model plus its codec (§4.12). `FileMetaData` and its
//! children are plain structs — no thrift here, see DESIGN.md for why the
//! teacher's thrift codegen was dropped. `MetadataCodec` is the external
//! collaborator; `BinaryMetadataCodec` is the one default implementation,
//! a small versioned length-prefixed encoding (magic `PQM1`).

use std::io;
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use basic::{Compression, Encoding, LogicalType, Repetition, TimeUnit, Type as PhysicalType};
use errors::Result;
use schema::types::{ColumnPath, Type as SchemaType};

/// Per-page or per-column-chunk value-range/null-count summary (§4.8
/// "Statistics"). `min`/`max` are plain-encoded value bytes, matching what a
/// data page itself would encode for the same value — see
/// `column::writer::close_typed`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Statistics {
  pub min: Option<Vec<u8>>,
  pub max: Option<Vec<u8>>,
  pub null_count: Option<u64>,
  pub distinct_count: Option<u64>,
  pub def_level_histogram: Vec<u64>,
  pub rep_level_histogram: Vec<u64>
}

/// One column chunk's worth of footer bookkeeping (§4.9 "Footer").
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnChunkMetaData {
  pub path: ColumnPath,
  pub physical_type: PhysicalType,
  pub encodings: Vec<Encoding>,
  pub codec: Compression,
  pub num_values: u64,
  pub total_uncompressed_size: u64,
  pub total_compressed_size: u64,
  pub data_page_offset: u64,
  pub dictionary_page_offset: Option<u64>,
  pub statistics: Option<Statistics>,
  pub unencoded_byte_array_bytes: Option<u64>,
  pub bloom_filter_offset: Option<u64>,
  pub bloom_filter_length: Option<u64>,
  pub column_index_offset: Option<u64>,
  pub column_index_length: Option<u64>,
  pub offset_index_offset: Option<u64>,
  pub offset_index_length: Option<u64>,
  pub key_value_metadata: Vec<(String, String)>
}

/// Per-page min/max/null-count arrays for one column chunk (§4.9 "Index
/// blocks"). Written as its own block between the chunk's pages and the
/// footer; its file offset/length are recorded on `ColumnChunkMetaData`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ColumnIndex {
  pub min_values: Vec<Option<Vec<u8>>>,
  pub max_values: Vec<Option<Vec<u8>>>,
  pub null_counts: Vec<u64>
}

/// Per-page `(file_offset, compressed_size, first_row_index)` triples for
/// one column chunk (§4.9 "Index blocks").
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OffsetIndex {
  pub page_offsets: Vec<u64>,
  pub compressed_page_sizes: Vec<u64>,
  pub first_row_indexes: Vec<u64>
}

#[derive(Clone, Debug, PartialEq)]
pub struct RowGroupMetaData {
  pub columns: Vec<ColumnChunkMetaData>,
  pub num_rows: u64,
  pub total_byte_size: u64
}

/// The whole-file footer record (§4.9 "Footer").
#[derive(Clone, Debug, PartialEq)]
pub struct FileMetaData {
  pub schema: Rc<SchemaType>,
  pub row_groups: Vec<RowGroupMetaData>,
  pub created_by: Option<String>,
  pub key_value_metadata: Vec<(String, String)>,
  pub version: i32
}

/// External collaborator: serializes/deserializes a `FileMetaData` footer.
/// The core treats this as opaque — see §1 "the on-wire metadata
/// serialization format ... is treated as an opaque serializer".
pub trait MetadataCodec {
  fn encode(&self, meta: &FileMetaData) -> Result<Vec<u8>>;
  fn decode(&self, bytes: &[u8]) -> Result<FileMetaData>;
}

const MAGIC: &'static [u8; 4] = b"PQM1";

/// Default `MetadataCodec`: magic, then every field length-prefixed in
/// declaration order. Not meant to be wire-compatible with any other
/// implementation — it only has to round-trip with itself.
pub struct BinaryMetadataCodec;

impl MetadataCodec for BinaryMetadataCodec {
  fn encode(&self, meta: &FileMetaData) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    write_type(&mut buf, &meta.schema)?;
    write_u32(&mut buf, meta.row_groups.len() as u32)?;
    for rg in &meta.row_groups {
      write_row_group(&mut buf, rg)?;
    }
    write_opt_string(&mut buf, &meta.created_by)?;
    write_kv_list(&mut buf, &meta.key_value_metadata)?;
    write_i32(&mut buf, meta.version)?;
    Ok(buf)
  }

  fn decode(&self, bytes: &[u8]) -> Result<FileMetaData> {
    let mut cur = Cursor::new(bytes);
    let magic = cur.take(4)?;
    if magic != &MAGIC[..] {
      return Err(general_err!("metadata footer has bad magic: {:?}", magic));
    }
    let schema = Rc::new(read_type(&mut cur)?);
    let num_row_groups = cur.read_u32()?;
    let mut row_groups = Vec::with_capacity(num_row_groups as usize);
    for _ in 0..num_row_groups {
      row_groups.push(read_row_group(&mut cur)?);
    }
    let created_by = cur.read_opt_string()?;
    let key_value_metadata = cur.read_kv_list()?;
    let version = cur.read_i32()?;
    Ok(FileMetaData { schema: schema, row_groups: row_groups, created_by: created_by, key_value_metadata: key_value_metadata, version: version })
  }
}

pub fn encode_column_index(index: &ColumnIndex) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  write_u32(&mut buf, index.min_values.len() as u32)?;
  for v in &index.min_values {
    write_opt_bytes(&mut buf, v)?;
  }
  write_u32(&mut buf, index.max_values.len() as u32)?;
  for v in &index.max_values {
    write_opt_bytes(&mut buf, v)?;
  }
  write_u64_vec(&mut buf, &index.null_counts)?;
  Ok(buf)
}

pub fn decode_column_index(bytes: &[u8]) -> Result<ColumnIndex> {
  let mut cur = Cursor::new(bytes);
  let n_min = cur.read_u32()?;
  let mut min_values = Vec::with_capacity(n_min as usize);
  for _ in 0..n_min {
    min_values.push(cur.read_opt_bytes()?);
  }
  let n_max = cur.read_u32()?;
  let mut max_values = Vec::with_capacity(n_max as usize);
  for _ in 0..n_max {
    max_values.push(cur.read_opt_bytes()?);
  }
  let null_counts = cur.read_u64_vec()?;
  Ok(ColumnIndex { min_values: min_values, max_values: max_values, null_counts: null_counts })
}

pub fn encode_offset_index(index: &OffsetIndex) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  write_u64_vec(&mut buf, &index.page_offsets)?;
  write_u64_vec(&mut buf, &index.compressed_page_sizes)?;
  write_u64_vec(&mut buf, &index.first_row_indexes)?;
  Ok(buf)
}

pub fn decode_offset_index(bytes: &[u8]) -> Result<OffsetIndex> {
  let mut cur = Cursor::new(bytes);
  let page_offsets = cur.read_u64_vec()?;
  let compressed_page_sizes = cur.read_u64_vec()?;
  let first_row_indexes = cur.read_u64_vec()?;
  Ok(OffsetIndex { page_offsets: page_offsets, compressed_page_sizes: compressed_page_sizes, first_row_indexes: first_row_indexes })
}

// ----------------------------------------------------------------------
// Encoding helpers

fn write_row_group(buf: &mut Vec<u8>, rg: &RowGroupMetaData) -> Result<()> {
  write_u64(buf, rg.num_rows)?;
  write_u64(buf, rg.total_byte_size)?;
  write_u32(buf, rg.columns.len() as u32)?;
  for col in &rg.columns {
    write_column_chunk(buf, col)?;
  }
  Ok(())
}

fn read_row_group(cur: &mut Cursor) -> Result<RowGroupMetaData> {
  let num_rows = cur.read_u64()?;
  let total_byte_size = cur.read_u64()?;
  let num_columns = cur.read_u32()?;
  let mut columns = Vec::with_capacity(num_columns as usize);
  for _ in 0..num_columns {
    columns.push(read_column_chunk(cur)?);
  }
  Ok(RowGroupMetaData { columns: columns, num_rows: num_rows, total_byte_size: total_byte_size })
}

fn write_column_chunk(buf: &mut Vec<u8>, col: &ColumnChunkMetaData) -> Result<()> {
  write_string_list(buf, col.path.parts())?;
  write_u8(buf, physical_type_tag(col.physical_type));
  write_u32(buf, col.encodings.len() as u32)?;
  for e in &col.encodings {
    write_u8(buf, encoding_tag(*e));
  }
  write_u8(buf, compression_tag(col.codec));
  write_u64(buf, col.num_values)?;
  write_u64(buf, col.total_uncompressed_size)?;
  write_u64(buf, col.total_compressed_size)?;
  write_u64(buf, col.data_page_offset)?;
  write_opt_u64(buf, col.dictionary_page_offset)?;
  write_opt_statistics(buf, &col.statistics)?;
  write_opt_u64(buf, col.unencoded_byte_array_bytes)?;
  write_opt_u64(buf, col.bloom_filter_offset)?;
  write_opt_u64(buf, col.bloom_filter_length)?;
  write_opt_u64(buf, col.column_index_offset)?;
  write_opt_u64(buf, col.column_index_length)?;
  write_opt_u64(buf, col.offset_index_offset)?;
  write_opt_u64(buf, col.offset_index_length)?;
  write_kv_list(buf, &col.key_value_metadata)?;
  Ok(())
}

fn read_column_chunk(cur: &mut Cursor) -> Result<ColumnChunkMetaData> {
  let path = ColumnPath::new(cur.read_string_list()?);
  let physical_type = physical_type_from_tag(cur.read_u8()?)?;
  let num_encodings = cur.read_u32()?;
  let mut encodings = Vec::with_capacity(num_encodings as usize);
  for _ in 0..num_encodings {
    encodings.push(encoding_from_tag(cur.read_u8()?)?);
  }
  let codec = compression_from_tag(cur.read_u8()?)?;
  let num_values = cur.read_u64()?;
  let total_uncompressed_size = cur.read_u64()?;
  let total_compressed_size = cur.read_u64()?;
  let data_page_offset = cur.read_u64()?;
  let dictionary_page_offset = cur.read_opt_u64()?;
  let statistics = cur.read_opt_statistics()?;
  let unencoded_byte_array_bytes = cur.read_opt_u64()?;
  let bloom_filter_offset = cur.read_opt_u64()?;
  let bloom_filter_length = cur.read_opt_u64()?;
  let column_index_offset = cur.read_opt_u64()?;
  let column_index_length = cur.read_opt_u64()?;
  let offset_index_offset = cur.read_opt_u64()?;
  let offset_index_length = cur.read_opt_u64()?;
  let key_value_metadata = cur.read_kv_list()?;
  Ok(ColumnChunkMetaData {
    path: path, physical_type: physical_type, encodings: encodings, codec: codec,
    num_values: num_values, total_uncompressed_size: total_uncompressed_size,
    total_compressed_size: total_compressed_size, data_page_offset: data_page_offset,
    dictionary_page_offset: dictionary_page_offset, statistics: statistics,
    unencoded_byte_array_bytes: unencoded_byte_array_bytes,
    bloom_filter_offset: bloom_filter_offset, bloom_filter_length: bloom_filter_length,
    column_index_offset: column_index_offset, column_index_length: column_index_length,
    offset_index_offset: offset_index_offset, offset_index_length: offset_index_length,
    key_value_metadata: key_value_metadata
  })
}

fn write_opt_statistics(buf: &mut Vec<u8>, stats: &Option<Statistics>) -> Result<()> {
  match *stats {
    None => write_u8(buf, 0),
    Some(ref s) => {
      write_u8(buf, 1);
      write_opt_bytes(buf, &s.min)?;
      write_opt_bytes(buf, &s.max)?;
      write_opt_u64(buf, s.null_count)?;
      write_opt_u64(buf, s.distinct_count)?;
      write_u64_vec(buf, &s.def_level_histogram)?;
      write_u64_vec(buf, &s.rep_level_histogram)?;
    }
  }
  Ok(())
}

impl<'a> Cursor<'a> {
  fn read_opt_statistics(&mut self) -> Result<Option<Statistics>> {
    match self.read_u8()? {
      0 => Ok(None),
      _ => {
        let min = self.read_opt_bytes()?;
        let max = self.read_opt_bytes()?;
        let null_count = self.read_opt_u64()?;
        let distinct_count = self.read_opt_u64()?;
        let def_level_histogram = self.read_u64_vec()?;
        let rep_level_histogram = self.read_u64_vec()?;
        Ok(Some(Statistics {
          min: min, max: max, null_count: null_count, distinct_count: distinct_count,
          def_level_histogram: def_level_histogram, rep_level_histogram: rep_level_histogram
        }))
      }
    }
  }
}

fn write_type(buf: &mut Vec<u8>, ty: &SchemaType) -> Result<()> {
  match *ty {
    SchemaType::Primitive { ref name, repetition, physical_type, ref logical_type, type_length, id } => {
      write_u8(buf, 0);
      write_string(buf, name)?;
      write_u8(buf, repetition_tag(repetition));
      write_opt_i32(buf, id)?;
      write_u8(buf, physical_type_tag(physical_type));
      write_logical_type(buf, logical_type)?;
      write_i32(buf, type_length)?;
    },
    SchemaType::Group { ref name, repetition, ref logical_type, ref fields, id } => {
      write_u8(buf, 1);
      write_string(buf, name)?;
      write_u8(buf, repetition_tag(repetition));
      write_opt_i32(buf, id)?;
      write_logical_type(buf, logical_type)?;
      write_u32(buf, fields.len() as u32)?;
      for f in fields {
        write_type(buf, f)?;
      }
    }
  }
  Ok(())
}

fn read_type(cur: &mut Cursor) -> Result<SchemaType> {
  let tag = cur.read_u8()?;
  let name = cur.read_string()?;
  let repetition = repetition_from_tag(cur.read_u8()?)?;
  let id = cur.read_opt_i32()?;
  match tag {
    0 => {
      let physical_type = physical_type_from_tag(cur.read_u8()?)?;
      let logical_type = read_logical_type(cur)?;
      let type_length = cur.read_i32()?;
      let mut builder = SchemaType::primitive_type_builder(&name, physical_type)
        .with_repetition(repetition)
        .with_logical_type(logical_type)
        .with_length(type_length);
      if let Some(id) = id {
        builder = builder.with_id(id);
      }
      builder.build()
    },
    1 => {
      let logical_type = read_logical_type(cur)?;
      let num_fields = cur.read_u32()?;
      let mut fields = Vec::with_capacity(num_fields as usize);
      for _ in 0..num_fields {
        fields.push(Rc::new(read_type(cur)?));
      }
      let mut builder = SchemaType::group_type_builder(&name)
        .with_repetition(repetition)
        .with_logical_type(logical_type)
        .with_fields(&mut fields);
      if let Some(id) = id {
        builder = builder.with_id(id);
      }
      builder.build()
    },
    other => Err(general_err!("unknown schema node tag {}", other))
  }
}

fn write_logical_type(buf: &mut Vec<u8>, lt: &LogicalType) -> Result<()> {
  match *lt {
    LogicalType::NONE => write_u8(buf, 0),
    LogicalType::UTF8 => write_u8(buf, 1),
    LogicalType::MAP => write_u8(buf, 2),
    LogicalType::MAP_KEY_VALUE => write_u8(buf, 3),
    LogicalType::LIST => write_u8(buf, 4),
    LogicalType::ENUM => write_u8(buf, 5),
    LogicalType::DECIMAL { precision, scale } => {
      write_u8(buf, 6);
      write_i32(buf, precision)?;
      write_i32(buf, scale)?;
    },
    LogicalType::DATE => write_u8(buf, 7),
    LogicalType::TIME_MILLIS => write_u8(buf, 8),
    LogicalType::TIME_MICROS => write_u8(buf, 9),
    LogicalType::TIMESTAMP_MILLIS => write_u8(buf, 10),
    LogicalType::TIMESTAMP_MICROS => write_u8(buf, 11),
    LogicalType::TIMESTAMP { unit, is_adjusted_to_utc } => {
      write_u8(buf, 12);
      write_u8(buf, time_unit_tag(unit));
      write_u8(buf, if is_adjusted_to_utc { 1 } else { 0 });
    },
    LogicalType::TIME { unit, is_adjusted_to_utc } => {
      write_u8(buf, 13);
      write_u8(buf, time_unit_tag(unit));
      write_u8(buf, if is_adjusted_to_utc { 1 } else { 0 });
    },
    LogicalType::UINT_8 => write_u8(buf, 14),
    LogicalType::UINT_16 => write_u8(buf, 15),
    LogicalType::UINT_32 => write_u8(buf, 16),
    LogicalType::UINT_64 => write_u8(buf, 17),
    LogicalType::INT_8 => write_u8(buf, 18),
    LogicalType::INT_16 => write_u8(buf, 19),
    LogicalType::INT_32 => write_u8(buf, 20),
    LogicalType::INT_64 => write_u8(buf, 21),
    LogicalType::INTEGER { bit_width, is_signed } => {
      write_u8(buf, 22);
      write_i32(buf, bit_width)?;
      write_u8(buf, if is_signed { 1 } else { 0 });
    },
    LogicalType::JSON => write_u8(buf, 23),
    LogicalType::BSON => write_u8(buf, 24),
    LogicalType::INTERVAL => write_u8(buf, 25),
    LogicalType::UUID => write_u8(buf, 26),
    LogicalType::VARIANT => write_u8(buf, 27)
  }
  Ok(())
}

fn read_logical_type(cur: &mut Cursor) -> Result<LogicalType> {
  let tag = cur.read_u8()?;
  Ok(match tag {
    0 => LogicalType::NONE,
    1 => LogicalType::UTF8,
    2 => LogicalType::MAP,
    3 => LogicalType::MAP_KEY_VALUE,
    4 => LogicalType::LIST,
    5 => LogicalType::ENUM,
    6 => {
      let precision = cur.read_i32()?;
      let scale = cur.read_i32()?;
      LogicalType::DECIMAL { precision: precision, scale: scale }
    },
    7 => LogicalType::DATE,
    8 => LogicalType::TIME_MILLIS,
    9 => LogicalType::TIME_MICROS,
    10 => LogicalType::TIMESTAMP_MILLIS,
    11 => LogicalType::TIMESTAMP_MICROS,
    12 => {
      let unit = time_unit_from_tag(cur.read_u8()?)?;
      let is_adjusted_to_utc = cur.read_u8()? != 0;
      LogicalType::TIMESTAMP { unit: unit, is_adjusted_to_utc: is_adjusted_to_utc }
    },
    13 => {
      let unit = time_unit_from_tag(cur.read_u8()?)?;
      let is_adjusted_to_utc = cur.read_u8()? != 0;
      LogicalType::TIME { unit: unit, is_adjusted_to_utc: is_adjusted_to_utc }
    },
    14 => LogicalType::UINT_8,
    15 => LogicalType::UINT_16,
    16 => LogicalType::UINT_32,
    17 => LogicalType::UINT_64,
    18 => LogicalType::INT_8,
    19 => LogicalType::INT_16,
    20 => LogicalType::INT_32,
    21 => LogicalType::INT_64,
    22 => {
      let bit_width = cur.read_i32()?;
      let is_signed = cur.read_u8()? != 0;
      LogicalType::INTEGER { bit_width: bit_width, is_signed: is_signed }
    },
    23 => LogicalType::JSON,
    24 => LogicalType::BSON,
    25 => LogicalType::INTERVAL,
    26 => LogicalType::UUID,
    27 => LogicalType::VARIANT,
    other => return Err(general_err!("unknown logical type tag {}", other))
  })
}

fn physical_type_tag(t: PhysicalType) -> u8 {
  match t {
    PhysicalType::BOOLEAN => 0,
    PhysicalType::INT32 => 1,
    PhysicalType::INT64 => 2,
    PhysicalType::INT96 => 3,
    PhysicalType::FLOAT => 4,
    PhysicalType::DOUBLE => 5,
    PhysicalType::BYTE_ARRAY => 6,
    PhysicalType::FIXED_LEN_BYTE_ARRAY => 7
  }
}

fn physical_type_from_tag(tag: u8) -> Result<PhysicalType> {
  Ok(match tag {
    0 => PhysicalType::BOOLEAN,
    1 => PhysicalType::INT32,
    2 => PhysicalType::INT64,
    3 => PhysicalType::INT96,
    4 => PhysicalType::FLOAT,
    5 => PhysicalType::DOUBLE,
    6 => PhysicalType::BYTE_ARRAY,
    7 => PhysicalType::FIXED_LEN_BYTE_ARRAY,
    other => return Err(general_err!("unknown physical type tag {}", other))
  })
}

fn repetition_tag(r: Repetition) -> u8 {
  match r {
    Repetition::REQUIRED => 0,
    Repetition::OPTIONAL => 1,
    Repetition::REPEATED => 2
  }
}

fn repetition_from_tag(tag: u8) -> Result<Repetition> {
  Ok(match tag {
    0 => Repetition::REQUIRED,
    1 => Repetition::OPTIONAL,
    2 => Repetition::REPEATED,
    other => return Err(general_err!("unknown repetition tag {}", other))
  })
}

fn encoding_tag(e: Encoding) -> u8 {
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

fn encoding_from_tag(tag: u8) -> Result<Encoding> {
  Ok(match tag {
    0 => Encoding::PLAIN,
    1 => Encoding::PLAIN_DICTIONARY,
    2 => Encoding::RLE,
    3 => Encoding::RLE_DICTIONARY,
    4 => Encoding::BIT_PACKED,
    5 => Encoding::DELTA_BINARY_PACKED,
    6 => Encoding::DELTA_LENGTH_BYTE_ARRAY,
    7 => Encoding::DELTA_BYTE_ARRAY,
    8 => Encoding::BYTE_STREAM_SPLIT,
    other => return Err(general_err!("unknown encoding tag {}", other))
  })
}

fn compression_tag(c: Compression) -> u8 {
  match c {
    Compression::UNCOMPRESSED => 0,
    Compression::SNAPPY => 1,
    Compression::GZIP => 2,
    Compression::BROTLI => 3
  }
}

fn compression_from_tag(tag: u8) -> Result<Compression> {
  Ok(match tag {
    0 => Compression::UNCOMPRESSED,
    1 => Compression::SNAPPY,
    2 => Compression::GZIP,
    3 => Compression::BROTLI,
    other => return Err(general_err!("unknown compression tag {}", other))
  })
}

fn time_unit_tag(u: TimeUnit) -> u8 {
  match u {
    TimeUnit::MILLIS => 0,
    TimeUnit::MICROS => 1,
    TimeUnit::NANOS => 2
  }
}

fn time_unit_from_tag(tag: u8) -> Result<TimeUnit> {
  Ok(match tag {
    0 => TimeUnit::MILLIS,
    1 => TimeUnit::MICROS,
    2 => TimeUnit::NANOS,
    other => return Err(general_err!("unknown time unit tag {}", other))
  })
}

fn write_u8(buf: &mut Vec<u8>, v: u8) {
  buf.push(v);
}

fn write_i32(buf: &mut Vec<u8>, v: i32) -> Result<()> {
  buf.write_i32::<LittleEndian>(v).map_err(io_err)
}

fn write_u32(buf: &mut Vec<u8>, v: u32) -> Result<()> {
  buf.write_u32::<LittleEndian>(v).map_err(io_err)
}

fn write_u64(buf: &mut Vec<u8>, v: u64) -> Result<()> {
  buf.write_u64::<LittleEndian>(v).map_err(io_err)
}

fn write_opt_i32(buf: &mut Vec<u8>, v: Option<i32>) -> Result<()> {
  match v {
    None => { write_u8(buf, 0); Ok(()) },
    Some(v) => { write_u8(buf, 1); write_i32(buf, v) }
  }
}

fn write_opt_u64(buf: &mut Vec<u8>, v: Option<u64>) -> Result<()> {
  match v {
    None => { write_u8(buf, 0); Ok(()) },
    Some(v) => { write_u8(buf, 1); write_u64(buf, v) }
  }
}

fn write_bytes(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
  write_u32(buf, bytes.len() as u32)?;
  buf.extend_from_slice(bytes);
  Ok(())
}

fn write_opt_bytes(buf: &mut Vec<u8>, v: &Option<Vec<u8>>) -> Result<()> {
  match *v {
    None => { write_u8(buf, 0); Ok(()) },
    Some(ref v) => { write_u8(buf, 1); write_bytes(buf, v) }
  }
}

fn write_string(buf: &mut Vec<u8>, s: &str) -> Result<()> {
  write_bytes(buf, s.as_bytes())
}

fn write_opt_string(buf: &mut Vec<u8>, v: &Option<String>) -> Result<()> {
  match *v {
    None => { write_u8(buf, 0); Ok(()) },
    Some(ref s) => { write_u8(buf, 1); write_string(buf, s) }
  }
}

fn write_string_list(buf: &mut Vec<u8>, list: &[String]) -> Result<()> {
  write_u32(buf, list.len() as u32)?;
  for s in list {
    write_string(buf, s)?;
  }
  Ok(())
}

fn write_kv_list(buf: &mut Vec<u8>, list: &[(String, String)]) -> Result<()> {
  write_u32(buf, list.len() as u32)?;
  for &(ref k, ref v) in list {
    write_string(buf, k)?;
    write_string(buf, v)?;
  }
  Ok(())
}

fn write_u64_vec(buf: &mut Vec<u8>, v: &[u64]) -> Result<()> {
  write_u32(buf, v.len() as u32)?;
  for x in v {
    write_u64(buf, *x)?;
  }
  Ok(())
}

fn io_err(e: io::Error) -> ::errors::ParquetError {
  ::errors::ParquetError::from(e)
}

/// Tiny forward-only cursor over an encoded metadata block.
struct Cursor<'a> {
  data: &'a [u8],
  pos: usize
}

impl<'a> Cursor<'a> {
  fn new(data: &'a [u8]) -> Self {
    Cursor { data: data, pos: 0 }
  }

  fn take(&mut self, n: usize) -> Result<&'a [u8]> {
    if self.pos + n > self.data.len() {
      return Err(eof_err!("metadata cursor ran out of bytes"));
    }
    let slice = &self.data[self.pos..self.pos + n];
    self.pos += n;
    Ok(slice)
  }

  fn read_u8(&mut self) -> Result<u8> {
    Ok(self.take(1)?[0])
  }

  fn read_i32(&mut self) -> Result<i32> {
    let mut s = self.take(4)?;
    s.read_i32::<LittleEndian>().map_err(io_err)
  }

  fn read_u32(&mut self) -> Result<u32> {
    let mut s = self.take(4)?;
    s.read_u32::<LittleEndian>().map_err(io_err)
  }

  fn read_u64(&mut self) -> Result<u64> {
    let mut s = self.take(8)?;
    s.read_u64::<LittleEndian>().map_err(io_err)
  }

  fn read_opt_i32(&mut self) -> Result<Option<i32>> {
    match self.read_u8()? {
      0 => Ok(None),
      _ => Ok(Some(self.read_i32()?))
    }
  }

  fn read_opt_u64(&mut self) -> Result<Option<u64>> {
    match self.read_u8()? {
      0 => Ok(None),
      _ => Ok(Some(self.read_u64()?))
    }
  }

  fn read_bytes(&mut self) -> Result<Vec<u8>> {
    let len = self.read_u32()? as usize;
    Ok(self.take(len)?.to_vec())
  }

  fn read_opt_bytes(&mut self) -> Result<Option<Vec<u8>>> {
    match self.read_u8()? {
      0 => Ok(None),
      _ => Ok(Some(self.read_bytes()?))
    }
  }

  fn read_string(&mut self) -> Result<String> {
    let bytes = self.read_bytes()?;
    String::from_utf8(bytes).map_err(|e| general_err!("invalid utf8 in metadata: {}", e))
  }

  fn read_opt_string(&mut self) -> Result<Option<String>> {
    match self.read_u8()? {
      0 => Ok(None),
      _ => Ok(Some(self.read_string()?))
    }
  }

  fn read_string_list(&mut self) -> Result<Vec<String>> {
    let len = self.read_u32()? as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
      out.push(self.read_string()?);
    }
    Ok(out)
  }

  fn read_kv_list(&mut self) -> Result<Vec<(String, String)>> {
    let len = self.read_u32()? as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
      let k = self.read_string()?;
      let v = self.read_string()?;
      out.push((k, v));
    }
    Ok(out)
  }

  fn read_u64_vec(&mut self) -> Result<Vec<u64>> {
    let len = self.read_u32()? as usize;
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
      out.push(self.read_u64()?);
    }
    Ok(out)
  }
}
