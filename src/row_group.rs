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

//! Row-group builder (C9): the seam between the record API and the column
//! layer. `RowGroupWriter` buffers whole rows, optionally sorts/dedupes them
//! (§6 "sorting_columns" / "drop_duplicated_rows"), shreds them via
//! `record::shredder` and drives one `ColumnWriterImpl` per leaf to produce
//! pages and statistics. `read_leaf_triples`/`read_row_group` are the inverse:
//! they drive one `ColumnReaderImpl` per leaf back into `LeafTriples` and hand
//! the result to `record::assembler::assemble_rows`.

use std::cmp::Ordering;
use std::rc::Rc;

use basic::Type as PhysicalType;
use column::page::PageReader;
use column::reader::ColumnReaderImpl;
use column::writer::{ClosedColumnChunk, ColumnWriterImpl};
use data_type::*;
use encodings::encoding::{Encoder, PlainEncoder, SupportsDictionary};
use encodings::levels::level_histogram;
use errors::Result;
use file::bloom_filter::{BloomFilter, SplitBlockBloomFilter};
use file::properties::{SortingColumn, WriterProperties};
use record::api::{Row, RowField};
use record::assembler::assemble_rows;
use record::shredder::{shred_rows, LeafTriples};
use record::triplet::TypedTriplet;
use schema::types::{ColumnDescPtr, ColumnPath, SchemaDescriptor};

/// Everything needed to fold one finished leaf column into
/// `file::metadata::ColumnChunkMetaData`/`Statistics`.
pub struct RowGroupColumnResult {
  pub path: ColumnPath,
  pub physical_type: PhysicalType,
  pub chunk: ClosedColumnChunk,
  pub def_level_histogram: Vec<u64>,
  pub rep_level_histogram: Vec<u64>,
  pub bloom_filter: Option<Vec<u8>>
}

/// One closed row group, ready to be appended to a file by `file::writer`.
pub struct ClosedRowGroup {
  pub num_rows: u64,
  pub columns: Vec<RowGroupColumnResult>
}

/// Buffers whole rows and only shreds/writes them at `close()`, so sorting
/// (§6 "sorting_columns") can reorder the buffered rows before any column
/// writer sees them.
pub struct RowGroupWriter {
  schema: Rc<SchemaDescriptor>,
  props: Rc<WriterProperties>,
  buffered_rows: Vec<Row>
}

impl RowGroupWriter {
  pub fn new(schema: Rc<SchemaDescriptor>, props: Rc<WriterProperties>) -> Self {
    RowGroupWriter { schema: schema, props: props, buffered_rows: Vec::new() }
  }

  pub fn write_rows(&mut self, rows: Vec<Row>) {
    self.buffered_rows.extend(rows);
  }

  pub fn num_rows(&self) -> usize {
    self.buffered_rows.len()
  }

  /// True once this row group holds `max_row_group_length` rows; `file::writer`
  /// checks this after every `write_rows` to decide whether to close and
  /// start a fresh row group.
  pub fn should_flush(&self) -> bool {
    self.buffered_rows.len() >= self.props.max_row_group_length()
  }

  pub fn close(mut self) -> Result<ClosedRowGroup> {
    let sorting_columns = self.props.sorting_columns();
    if !sorting_columns.is_empty() {
      let sorting_columns = sorting_columns.to_vec();
      self.buffered_rows.sort_by(|a, b| compare_rows(a, b, &sorting_columns));
      if self.props.drop_duplicated_rows() {
        self.buffered_rows.dedup_by(|a, b| compare_rows(a, b, &sorting_columns) == Ordering::Equal);
      }
    }

    let num_rows = self.buffered_rows.len() as u64;
    let leaves = shred_rows(&self.schema, &self.buffered_rows)?;
    let mut columns = Vec::with_capacity(leaves.len());
    for (descr, triples) in self.schema.columns().iter().zip(leaves.into_iter()) {
      columns.push(close_column(descr.clone(), triples, &self.props)?);
    }
    Ok(ClosedRowGroup { num_rows: num_rows, columns: columns })
  }
}

fn is_null_field(field: Option<&RowField>) -> bool {
  match field {
    None | Some(&RowField::Null) => true,
    _ => false
  }
}

/// Resolves a dotted path against an assembled row. A path that crosses a
/// `List` (a repeated leaf or a repeated group) projects through every
/// element instead of stopping there, so e.g. `["items","x"]` against
/// `items: List([Group{x:1}, Group{x:2}])` yields `List([1, 2])` rather than
/// `None`, keeping the list's cardinality intact.
pub(crate) fn field_at_path(row: &Row, parts: &[String]) -> Option<RowField> {
  if parts.is_empty() {
    return None;
  }
  resolve_field(row.get(&parts[0]), &parts[1..])
}

fn resolve_field(field: Option<&RowField>, rest: &[String]) -> Option<RowField> {
  let field = match field {
    Some(f) => f,
    None => return None
  };
  if rest.is_empty() {
    return Some(field.clone());
  }
  match *field {
    RowField::Group(ref inner) => resolve_field(inner.get(&rest[0]), &rest[1..]),
    RowField::List(ref items) => {
      let mut out = Vec::with_capacity(items.len());
      for item in items {
        match resolve_field(Some(item), rest) {
          Some(v) => out.push(v),
          None => return None
        }
      }
      Some(RowField::List(out))
    },
    _ => None
  }
}

fn compare_field_values(a: &RowField, b: &RowField) -> Ordering {
  match (a, b) {
    (&RowField::Bool(x), &RowField::Bool(y)) => x.cmp(&y),
    (&RowField::Byte(x), &RowField::Byte(y)) => x.cmp(&y),
    (&RowField::Short(x), &RowField::Short(y)) => x.cmp(&y),
    (&RowField::Int(x), &RowField::Int(y)) => x.cmp(&y),
    (&RowField::Long(x), &RowField::Long(y)) => x.cmp(&y),
    (&RowField::Float(x), &RowField::Float(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    (&RowField::Double(x), &RowField::Double(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    (&RowField::Str(ref x), &RowField::Str(ref y)) => x.cmp(y),
    (&RowField::Bytes(ref x), &RowField::Bytes(ref y)) => x.cmp(y),
    (&RowField::Timestamp(x), &RowField::Timestamp(y)) => x.cmp(&y),
    _ => Ordering::Equal
  }
}

/// Orders two rows by `sorting_columns`, first column first; nulls sort to
/// whichever end `SortingColumn::nulls_first` names regardless of
/// `descending` (§6 matches the historical convention that nulls ordering
/// is independent of value direction).
pub(crate) fn compare_rows(a: &Row, b: &Row, sorting_columns: &[SortingColumn]) -> Ordering {
  for col in sorting_columns {
    let av = field_at_path(a, col.path.parts());
    let bv = field_at_path(b, col.path.parts());
    let ord = match (is_null_field(av.as_ref()), is_null_field(bv.as_ref())) {
      (true, true) => Ordering::Equal,
      (true, false) => if col.nulls_first { Ordering::Less } else { Ordering::Greater },
      (false, true) => if col.nulls_first { Ordering::Greater } else { Ordering::Less },
      (false, false) => {
        let mut o = compare_field_values(&av.unwrap(), &bv.unwrap());
        if col.descending {
          o = o.reverse();
        }
        o
      }
    };
    if ord != Ordering::Equal {
      return ord;
    }
  }
  Ordering::Equal
}

fn split_triples<T: DataType>(triples: &[TypedTriplet<T>]) -> (Vec<T::T>, Vec<i16>, Vec<i16>) {
  let mut values = Vec::with_capacity(triples.len());
  let mut def_levels = Vec::with_capacity(triples.len());
  let mut rep_levels = Vec::with_capacity(triples.len());
  for t in triples {
    def_levels.push(t.def_level);
    rep_levels.push(t.rep_level);
    if let Some(ref v) = t.value {
      values.push(v.clone());
    }
  }
  (values, def_levels, rep_levels)
}

fn level_histogram_u64(levels: &[i16], max_level: i16, flat_count: usize) -> Vec<u64> {
  if max_level > 0 {
    level_histogram(levels, max_level).into_iter().map(|c| c as u64).collect()
  } else {
    vec![flat_count as u64]
  }
}

fn levels_arg(levels: &[i16], max_level: i16) -> Option<&[i16]> {
  if max_level > 0 {
    Some(levels)
  } else {
    None
  }
}

fn build_bloom_filter<T: DataType>(
  triples: &[TypedTriplet<T>],
  path: &ColumnPath,
  props: &WriterProperties
) -> Result<Option<Vec<u8>>>
where
  PlainEncoder<T>: Encoder<T>
{
  let spec = match props.bloom_filter_spec(path) {
    Some(spec) => spec,
    None => return Ok(None)
  };
  let mut filter = SplitBlockBloomFilter::new(spec.num_bits);
  for t in triples {
    if let Some(ref v) = t.value {
      let mut encoder: PlainEncoder<T> = PlainEncoder::new();
      encoder.put(::std::slice::from_ref(v))?;
      let bytes = encoder.flush_buffer()?;
      filter.insert(bytes.all());
    }
  }
  Ok(Some(filter.to_bytes()))
}

/// Writes one leaf's triples through a fresh `ColumnWriterImpl<T>` and folds
/// the result into a `RowGroupColumnResult`, plain-encoding min/max the same
/// way `column::writer`'s (private) chunk closer does.
fn close_leaf<T>(descr: ColumnDescPtr, triples: Vec<TypedTriplet<T>>, props: &WriterProperties) -> Result<RowGroupColumnResult>
where
  T: DataType + SupportsDictionary,
  PlainEncoder<T>: Encoder<T>
{
  let max_def = descr.max_def_level();
  let max_rep = descr.max_rep_level();
  let def_histogram = level_histogram_u64(&triples.iter().map(|t| t.def_level).collect::<Vec<_>>(), max_def, triples.len());
  let rep_histogram = level_histogram_u64(&triples.iter().map(|t| t.rep_level).collect::<Vec<_>>(), max_rep, triples.len());
  let bloom_filter = build_bloom_filter(&triples, descr.path(), props)?;

  let (values, def_levels, rep_levels) = split_triples(&triples);
  let use_dictionary = props.dictionary_enabled(descr.path());
  let mut writer: ColumnWriterImpl<T> = ColumnWriterImpl::new(descr.clone(), use_dictionary, props.data_page_size())?;
  writer.write_batch(&values, levels_arg(&def_levels, max_def), levels_arg(&rep_levels, max_rep))?;
  let result = writer.close_column()?;

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

  Ok(RowGroupColumnResult {
    path: descr.path().clone(),
    physical_type: descr.physical_type(),
    chunk: ClosedColumnChunk {
      pages: result.pages,
      num_values: result.stats.num_values,
      null_count: result.stats.null_count,
      distinct_count: result.stats.distinct_count,
      min_bytes: min_bytes,
      max_bytes: max_bytes,
      unencoded_byte_array_bytes: result.stats.unencoded_byte_array_bytes
    },
    def_level_histogram: def_histogram,
    rep_level_histogram: rep_histogram,
    bloom_filter: bloom_filter
  })
}

fn close_column(descr: ColumnDescPtr, triples: LeafTriples, props: &WriterProperties) -> Result<RowGroupColumnResult> {
  match triples {
    LeafTriples::Bool(v) => close_leaf(descr, v, props),
    LeafTriples::Int32(v) => close_leaf(descr, v, props),
    LeafTriples::Int64(v) => close_leaf(descr, v, props),
    LeafTriples::Int96(v) => close_leaf(descr, v, props),
    LeafTriples::Float(v) => close_leaf(descr, v, props),
    LeafTriples::Double(v) => close_leaf(descr, v, props),
    LeafTriples::ByteArray(v) => close_leaf(descr, v, props),
    LeafTriples::FixedLenByteArray(v) => close_leaf(descr, v, props)
  }
}

/// Reads one leaf column back out of its pages, reconstructing the triple
/// stream `record::assembler::assemble_rows` expects. `descr.max_def_level()
/// == 0` triples are always present; otherwise a triple is present exactly
/// when its decoded definition level equals `max_def_level()`.
fn read_leaf<T>(descr: ColumnDescPtr, page_reader: Box<PageReader>) -> Result<Vec<TypedTriplet<T>>>
where
  T: DataType + 'static
{
  let max_def = descr.max_def_level();
  let max_rep = descr.max_rep_level();
  let mut reader = ColumnReaderImpl::<T>::new(descr, page_reader);

  let batch_size = 1024usize;
  let mut triples = Vec::new();
  loop {
    let mut def_buf = vec![0i16; batch_size];
    let mut rep_buf = vec![0i16; batch_size];
    let mut val_buf = vec![T::T::default(); batch_size];
    let (values_read, levels_read) = reader.read_batch(
      batch_size,
      if max_def > 0 { Some(&mut def_buf[..]) } else { None },
      if max_rep > 0 { Some(&mut rep_buf[..]) } else { None },
      &mut val_buf[..]
    )?;
    if values_read == 0 && levels_read == 0 {
      break;
    }

    let num_levels = if max_def > 0 || max_rep > 0 { levels_read } else { values_read };
    let mut value_idx = 0;
    for i in 0..num_levels {
      let def = if max_def > 0 { def_buf[i] } else { 0 };
      let rep = if max_rep > 0 { rep_buf[i] } else { 0 };
      if def == max_def {
        triples.push(TypedTriplet::new(Some(val_buf[value_idx].clone()), def, rep));
        value_idx += 1;
      } else {
        triples.push(TypedTriplet::new(None, def, rep));
      }
    }
  }
  Ok(triples)
}

/// Drives one leaf column's pages back into a `LeafTriples`, the read-side
/// counterpart `record::triplet` expects `row_group` to provide.
pub fn read_leaf_triples(descr: ColumnDescPtr, page_reader: Box<PageReader>) -> Result<LeafTriples> {
  match descr.physical_type() {
    PhysicalType::BOOLEAN => Ok(LeafTriples::Bool(read_leaf::<BoolType>(descr, page_reader)?)),
    PhysicalType::INT32 => Ok(LeafTriples::Int32(read_leaf::<Int32Type>(descr, page_reader)?)),
    PhysicalType::INT64 => Ok(LeafTriples::Int64(read_leaf::<Int64Type>(descr, page_reader)?)),
    PhysicalType::INT96 => Ok(LeafTriples::Int96(read_leaf::<Int96Type>(descr, page_reader)?)),
    PhysicalType::FLOAT => Ok(LeafTriples::Float(read_leaf::<FloatType>(descr, page_reader)?)),
    PhysicalType::DOUBLE => Ok(LeafTriples::Double(read_leaf::<DoubleType>(descr, page_reader)?)),
    PhysicalType::BYTE_ARRAY => Ok(LeafTriples::ByteArray(read_leaf::<ByteArrayType>(descr, page_reader)?)),
    PhysicalType::FIXED_LEN_BYTE_ARRAY =>
      Ok(LeafTriples::FixedLenByteArray(read_leaf::<FixedLenByteArrayType>(descr, page_reader)?))
  }
}

/// Reads every leaf column of a row group and assembles them back into rows.
/// `column_page_readers` must be in the same left-to-right depth-first order
/// as `schema.columns()`.
pub fn read_row_group(schema: &SchemaDescriptor, column_page_readers: Vec<Box<PageReader>>) -> Result<Vec<Row>> {
  let mut columns = Vec::with_capacity(column_page_readers.len());
  for (descr, page_reader) in schema.columns().iter().zip(column_page_readers.into_iter()) {
    columns.push(read_leaf_triples(descr.clone(), page_reader)?);
  }
  assemble_rows(schema, columns)
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::Repetition;
  use column::page::InMemoryPageReader;
  use file::properties::BloomFilterSpec;
  use schema::types::Type as SchemaType;

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

  fn pages_for(result: &RowGroupColumnResult) -> Box<PageReader> {
    Box::new(InMemoryPageReader::new(result.chunk.pages.clone()))
  }

  #[test]
  fn test_close_writes_one_column_chunk_per_leaf_with_stats() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::default());
    let mut writer = RowGroupWriter::new(schema.clone(), props);
    writer.write_rows(vec![row(3, Some("c")), row(1, None), row(2, Some("b"))]);

    let closed = writer.close().unwrap();
    assert_eq!(closed.num_rows, 3);
    assert_eq!(closed.columns.len(), 2);

    let id_col = &closed.columns[0];
    assert_eq!(id_col.path.string(), "id");
    assert_eq!(id_col.chunk.num_values, 3);
    assert_eq!(id_col.chunk.null_count, 0);

    let name_col = &closed.columns[1];
    assert_eq!(name_col.chunk.num_values, 2);
    assert_eq!(name_col.chunk.null_count, 1);
    assert_eq!(name_col.def_level_histogram, vec![1, 2]);
  }

  #[test]
  fn test_write_then_read_round_trips_rows() {
    let schema = flat_schema();
    let props = Rc::new(WriterProperties::default());
    let mut writer = RowGroupWriter::new(schema.clone(), props);
    writer.write_rows(vec![row(3, Some("c")), row(1, None), row(2, Some("b"))]);
    let closed = writer.close().unwrap();

    let page_readers: Vec<Box<PageReader>> = closed.columns.iter().map(pages_for).collect();
    let rows = read_row_group(&schema, page_readers).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get("id"), Some(&RowField::Int(3)));
    assert_eq!(rows[0].get("name"), Some(&RowField::Str("c".to_string())));
    assert_eq!(rows[1].get("id"), Some(&RowField::Int(1)));
    assert_eq!(rows[1].get("name"), None);
  }

  #[test]
  fn test_close_sorts_rows_by_configured_column() {
    let schema = flat_schema();
    let path = ColumnPath::new(vec!["id".to_string()]);
    let props = Rc::new(
      WriterProperties::builder()
        .set_sorting_columns(vec![SortingColumn::new(path, false, true)])
        .build()
    );
    let mut writer = RowGroupWriter::new(schema.clone(), props);
    writer.write_rows(vec![row(3, Some("c")), row(1, Some("a")), row(2, Some("b"))]);
    let closed = writer.close().unwrap();

    let page_readers: Vec<Box<PageReader>> = closed.columns.iter().map(pages_for).collect();
    let rows = read_row_group(&schema, page_readers).unwrap();
    let ids: Vec<i32> = rows
      .iter()
      .map(|r| match r.get("id") {
        Some(&RowField::Int(v)) => v,
        _ => panic!("expected int id")
      })
      .collect();
    assert_eq!(ids, vec![1, 2, 3]);
  }

  #[test]
  fn test_close_drops_exact_duplicate_rows_after_sorting() {
    let schema = flat_schema();
    let path = ColumnPath::new(vec!["id".to_string()]);
    let props = Rc::new(
      WriterProperties::builder()
        .set_sorting_columns(vec![SortingColumn::new(path, false, true)])
        .set_drop_duplicated_rows(true)
        .build()
    );
    let mut writer = RowGroupWriter::new(schema.clone(), props);
    writer.write_rows(vec![row(1, Some("a")), row(1, Some("a")), row(2, Some("b"))]);
    let closed = writer.close().unwrap();
    assert_eq!(closed.num_rows, 2);
  }

  #[test]
  fn test_bloom_filter_built_only_for_configured_column() {
    let schema = flat_schema();
    let path = ColumnPath::new(vec!["id".to_string()]);
    let props = Rc::new(WriterProperties::builder().add_bloom_filter(BloomFilterSpec { path: path, num_bits: 256 }).build());
    let mut writer = RowGroupWriter::new(schema.clone(), props);
    writer.write_rows(vec![row(1, Some("a")), row(2, None)]);
    let closed = writer.close().unwrap();

    assert!(closed.columns[0].bloom_filter.is_some());
    assert!(closed.columns[1].bloom_filter.is_none());

    let filter = SplitBlockBloomFilter::from_bytes(closed.columns[0].bloom_filter.as_ref().unwrap());
    let mut encoder: PlainEncoder<Int32Type> = PlainEncoder::new();
    encoder.put(&[1]).unwrap();
    let encoded = encoder.flush_buffer().unwrap();
    assert!(filter.might_contain(encoded.all()));
  }
}
