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

//! Reader (C6 driven through `row_group`'s assembly side): parses the
//! footer, then walks every row group's column chunks back into pages the
//! way `file::writer::write_page` laid them out, handing the result to
//! `row_group::read_row_group` for Dremel reassembly (§4.6).
//!
//! The core does no query execution (§1 Non-goals) beyond the equality
//! `lookup` a bloom filter can short-circuit; there is no predicate
//! pushdown, no scan planning, no projection other than what
//! `schema::convert` does ahead of a read.

use std::io::{Read, Seek, SeekFrom};
use std::rc::Rc;

use byteorder::{LittleEndian, ReadBytesExt};

use basic::{Encoding, Type as PhysicalType};
use column::page::{InMemoryPageReader, Page, PageReader};
use compression::{create_codec, Codec};
use data_type::{BoolType, ByteArrayType, DoubleType, FloatType, Int64Type, Int32Type};
use encodings::encoding::{Encoder, PlainEncoder};
use errors::Result;
use file::bloom_filter::{BloomFilter, SplitBlockBloomFilter};
use file::metadata::{decode_offset_index, BinaryMetadataCodec, ColumnChunkMetaData, FileMetaData, MetadataCodec};
use file::writer::decode_encoding_tag;
use record::api::{Row, RowField};
use row_group::read_row_group;
use schema::types::SchemaDescriptor;
use util::memory::ByteBufferPtr;

const MAGIC: &'static [u8; 4] = b"PAR1";

/// One decoded row group: its rows, already assembled, plus per-column
/// bloom filters kept around for `SerializedFileReader::lookup`.
pub struct RowGroup {
  pub num_rows: u64,
  pub rows: Vec<Row>,
  bloom_filters: Vec<(String, PhysicalType, SplitBlockBloomFilter)>
}

impl RowGroup {
  pub fn num_rows(&self) -> u64 {
    self.num_rows
  }

  pub fn rows(&self) -> &[Row] {
    &self.rows
  }
}

/// Reader API (§6). `open` eagerly decodes the whole file: every page of
/// every row group is read, decompressed and reassembled into `Row`s up
/// front, trading streaming for a much simpler single-pass implementation
/// (acceptable here since the core never needs to serve a read larger than
/// one file at a time).
pub struct SerializedFileReader {
  schema: Rc<SchemaDescriptor>,
  metadata: FileMetaData,
  row_groups: Vec<RowGroup>
}

impl SerializedFileReader {
  pub fn open<R: Read + Seek>(mut input: R, file_size: u64) -> Result<Self> {
    if file_size < 8 {
      return Err(general_err!("file of {} bytes is too small to contain a footer", file_size));
    }

    input.seek(SeekFrom::Start(0))?;
    let mut leading_magic = [0u8; 4];
    input.read_exact(&mut leading_magic)?;
    if &leading_magic != MAGIC {
      return Err(general_err!("invalid leading magic bytes"));
    }

    input.seek(SeekFrom::Start(file_size - 8))?;
    let footer_len = input.read_u32::<LittleEndian>()?;
    let mut trailing_magic = [0u8; 4];
    input.read_exact(&mut trailing_magic)?;
    if &trailing_magic != MAGIC {
      return Err(general_err!("invalid trailing magic bytes"));
    }

    if (footer_len as u64) > file_size - 8 {
      return Err(general_err!("footer length {} overruns the file", footer_len));
    }
    let footer_start = file_size - 8 - footer_len as u64;
    input.seek(SeekFrom::Start(footer_start))?;
    let mut footer_bytes = vec![0u8; footer_len as usize];
    input.read_exact(&mut footer_bytes)?;
    let metadata = BinaryMetadataCodec.decode(&footer_bytes)?;

    let schema = Rc::new(SchemaDescriptor::new(metadata.schema.clone()));
    let mut row_groups = Vec::with_capacity(metadata.row_groups.len());
    for rg in &metadata.row_groups {
      let mut page_readers: Vec<Box<PageReader>> = Vec::with_capacity(rg.columns.len());
      let mut bloom_filters = Vec::new();
      for col in &rg.columns {
        page_readers.push(Box::new(read_column_chunk_pages(&mut input, col)?));
        if let (Some(offset), Some(len)) = (col.bloom_filter_offset, col.bloom_filter_length) {
          input.seek(SeekFrom::Start(offset))?;
          let mut bytes = vec![0u8; len as usize];
          input.read_exact(&mut bytes)?;
          bloom_filters.push((col.path.string(), col.physical_type, SplitBlockBloomFilter::from_bytes(&bytes)));
        }
      }
      let rows = read_row_group(&schema, page_readers)?;
      row_groups.push(RowGroup { num_rows: rg.num_rows, rows: rows, bloom_filters: bloom_filters });
    }

    Ok(SerializedFileReader { schema: schema, metadata: metadata, row_groups: row_groups })
  }

  pub fn schema(&self) -> &SchemaDescriptor {
    &self.schema
  }

  pub fn file_metadata(&self) -> &FileMetaData {
    &self.metadata
  }

  pub fn row_groups(&self) -> &[RowGroup] {
    &self.row_groups
  }

  /// Equality point lookup (§6). Skips any row group whose bloom filter for
  /// `column` says the key is definitely absent; everything else falls back
  /// to a linear scan of that row group's already-assembled rows. No index
  /// beyond the bloom filter is consulted — the core exposes statistics,
  /// not a query planner (§1 Non-goals).
  pub fn lookup(&self, column: &str, key: &RowField) -> Result<Option<&Row>> {
    for rg in &self.row_groups {
      let bloom = rg.bloom_filters.iter().find(|&&(ref path, _, _)| path == column);
      if let Some(&(_, physical_type, ref filter)) = bloom {
        let key_bytes = plain_encode_for_bloom(physical_type, key)?;
        if !filter.might_contain(&key_bytes) {
          continue;
        }
      }
      for row in &rg.rows {
        if row.get(column) == Some(key) {
          return Ok(Some(row));
        }
      }
    }
    Ok(None)
  }
}

/// Plain-encodes `value` the same way `row_group::build_bloom_filter` did
/// when it inserted values into the filter, so `might_contain` sees bytes in
/// the same shape it was built from.
fn plain_encode_for_bloom(physical_type: PhysicalType, value: &RowField) -> Result<Vec<u8>> {
  match (physical_type, value) {
    (PhysicalType::BOOLEAN, &RowField::Bool(v)) => plain_encode::<BoolType>(v),
    (PhysicalType::INT32, &RowField::Int(v)) => plain_encode::<Int32Type>(v),
    (PhysicalType::INT64, &RowField::Long(v)) => plain_encode::<Int64Type>(v),
    (PhysicalType::FLOAT, &RowField::Float(v)) => plain_encode::<FloatType>(v),
    (PhysicalType::DOUBLE, &RowField::Double(v)) => plain_encode::<DoubleType>(v),
    (PhysicalType::BYTE_ARRAY, &RowField::Str(ref s)) => plain_encode::<ByteArrayType>(s.as_bytes().to_vec().into()),
    (PhysicalType::BYTE_ARRAY, &RowField::Bytes(ref b)) => plain_encode::<ByteArrayType>(b.clone()),
    _ => Err(general_err!("lookup value does not match column {:?}'s physical type", physical_type))
  }
}

fn plain_encode<T: ::data_type::DataType>(value: T::T) -> Result<Vec<u8>>
where
  PlainEncoder<T>: Encoder<T>
{
  let mut encoder: PlainEncoder<T> = PlainEncoder::new();
  encoder.put(&[value])?;
  Ok(encoder.flush_buffer()?.all().to_vec())
}

/// Reads one column chunk's dictionary page (if any) followed by every data
/// page named in its offset index, decompressing each with a fresh codec
/// instance (§4.1: a codec owns no state across calls).
fn read_column_chunk_pages<R: Read + Seek>(input: &mut R, col: &ColumnChunkMetaData) -> Result<InMemoryPageReader> {
  let mut codec = create_codec(col.codec)?;
  let mut pages = Vec::new();

  if let Some(offset) = col.dictionary_page_offset {
    pages.push(read_page(input, offset, &mut *codec)?);
  }

  match (col.offset_index_offset, col.offset_index_length) {
    (Some(off), Some(len)) => {
      input.seek(SeekFrom::Start(off))?;
      let mut bytes = vec![0u8; len as usize];
      input.read_exact(&mut bytes)?;
      let offset_index = decode_offset_index(&bytes)?;
      for &page_offset in &offset_index.page_offsets {
        pages.push(read_page(input, page_offset, &mut *codec)?);
      }
    },
    _ => pages.push(read_page(input, col.data_page_offset, &mut *codec)?)
  }

  Ok(InMemoryPageReader::new(pages))
}

/// Decodes one page at `offset`, mirroring `file::writer::write_page`'s
/// layout: `tag(1) num_values(4) [kind-specific fields] raw_len(4)
/// compressed_len(4) compressed_bytes`.
fn read_page<R: Read + Seek>(input: &mut R, offset: u64, codec: &mut Codec) -> Result<Page> {
  input.seek(SeekFrom::Start(offset))?;
  let tag = input.read_u8()?;
  let num_values = input.read_u32::<LittleEndian>()?;

  let is_dictionary = match tag {
    0 => false,
    1 => true,
    _ => return Err(general_err!("invalid page type tag {}", tag))
  };

  let encoding = decode_encoding_tag(input.read_u8()?)?;
  let (def_level_encoding, rep_level_encoding, is_sorted) = if is_dictionary {
    let is_sorted = input.read_u8()? != 0;
    (Encoding::PLAIN, Encoding::PLAIN, is_sorted)
  } else {
    let def_level_encoding = decode_encoding_tag(input.read_u8()?)?;
    let rep_level_encoding = decode_encoding_tag(input.read_u8()?)?;
    (def_level_encoding, rep_level_encoding, false)
  };

  let raw_len = input.read_u32::<LittleEndian>()?;
  let compressed_len = input.read_u32::<LittleEndian>()?;
  let mut compressed = vec![0u8; compressed_len as usize];
  input.read_exact(&mut compressed)?;
  let mut raw = Vec::with_capacity(raw_len as usize);
  codec.decompress(&compressed, &mut raw)?;

  Ok(if is_dictionary {
    Page::DictionaryPage { buf: ByteBufferPtr::new(raw), num_values: num_values, encoding: encoding, is_sorted: is_sorted }
  } else {
    Page::DataPage {
      buf: ByteBufferPtr::new(raw),
      num_values: num_values,
      encoding: encoding,
      def_level_encoding: def_level_encoding,
      rep_level_encoding: rep_level_encoding
    }
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::Repetition;
  use file::properties::WriterProperties;
  use file::writer::SerializedFileWriter;
  use schema::types::Type as SchemaType;
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
  fn test_open_reads_back_exactly_what_was_written() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::default());
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, Some("Alice")), row(2, Some("Bob")), row(3, Some("Charlie"))]).unwrap();
    writer.close().unwrap();
    let bytes = writer.into_inner().into_inner();
    let file_size = bytes.len() as u64;

    let reader = SerializedFileReader::open(Cursor::new(bytes), file_size).unwrap();
    assert_eq!(reader.schema().num_columns(), 2);
    assert_eq!(reader.row_groups().len(), 1);
    let rows = reader.row_groups()[0].rows();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("id"), Some(&RowField::Int(1)));
    assert_eq!(rows[0].get("name"), Some(&RowField::Str("Alice".to_string())));
    assert_eq!(rows[2].get("name"), Some(&RowField::Str("Charlie".to_string())));
  }

  #[test]
  fn test_open_reads_across_multiple_row_groups() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::builder().set_max_row_group_length(1).build());
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, None)]).unwrap();
    writer.write_rows(&[row(2, None)]).unwrap();
    writer.close().unwrap();
    let bytes = writer.into_inner().into_inner();
    let file_size = bytes.len() as u64;

    let reader = SerializedFileReader::open(Cursor::new(bytes), file_size).unwrap();
    assert_eq!(reader.row_groups().len(), 2);
    assert_eq!(reader.row_groups()[0].num_rows(), 1);
    assert_eq!(reader.row_groups()[1].num_rows(), 1);
  }

  #[test]
  fn test_lookup_finds_row_by_bloom_filtered_column() {
    use file::properties::BloomFilterSpec;
    use schema::types::ColumnPath;

    let schema = flat_schema();
    let props = Rc::new(
      WriterProperties::builder()
        .add_bloom_filter(BloomFilterSpec { path: ColumnPath::new(vec!["id".to_string()]), num_bits: 4096 })
        .build()
    );
    let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
    writer.write_rows(&[row(1, Some("Alice")), row(2, Some("Bob"))]).unwrap();
    writer.close().unwrap();
    let bytes = writer.into_inner().into_inner();
    let file_size = bytes.len() as u64;

    let reader = SerializedFileReader::open(Cursor::new(bytes), file_size).unwrap();
    let found = reader.lookup("id", &RowField::Int(2)).unwrap();
    assert_eq!(found.and_then(|r| r.get("name")), Some(&RowField::Str("Bob".to_string())));

    let missing = reader.lookup("id", &RowField::Int(999)).unwrap();
    assert!(missing.is_none());
  }

  #[test]
  fn test_open_rejects_corrupt_magic() {
    let bytes = vec![0u8; 16];
    let err = SerializedFileReader::open(Cursor::new(bytes), 16).unwrap_err();
    assert!(format!("{}", err).contains("magic"));
  }
}
