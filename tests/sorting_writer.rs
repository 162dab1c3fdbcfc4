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

//! `SortingFileWriter` exercised end to end: three out-of-order flushes
//! collapse into one globally sorted row group, readable back through
//! `SerializedFileReader` exactly like any other file.

extern crate parqcore;

use std::io::Cursor;
use std::rc::Rc;

use parqcore::basic::{Repetition, Type as PhysicalType};
use parqcore::file::properties::{SortingColumn, WriterProperties};
use parqcore::file::reader::SerializedFileReader;
use parqcore::record::api::{make_row, RowField};
use parqcore::schema::types::{ColumnPath, SchemaDescriptor, Type as SchemaType};
use parqcore::sorting_writer::SortingFileWriter;

fn int_schema() -> Rc<SchemaDescriptor> {
  let v = Rc::new(SchemaType::primitive_type_builder("v", PhysicalType::INT32).with_repetition(Repetition::REQUIRED).build().unwrap());
  let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![v]).build().unwrap());
  Rc::new(SchemaDescriptor::new(root))
}

fn path_of(name: &str) -> ColumnPath {
  ColumnPath::new(vec![name.to_string()])
}

#[test]
fn test_three_flushes_collapse_into_one_globally_sorted_row_group() {
  let schema = int_schema();
  let props = Rc::new(WriterProperties::builder().set_sorting_columns(vec![SortingColumn::new(path_of("v"), false, true)]).build());
  let mut writer = SortingFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();

  let batch_a: Vec<i32> = (0..1000).collect();
  let batch_b: Vec<i32> = (0..1000).rev().collect();
  let mut batch_c: Vec<i32> = (0..1000).collect();
  batch_c.rotate_left(333);

  let batches: Vec<Vec<i32>> = vec![batch_a, batch_b, batch_c];
  for batch in &batches {
    let rows: Vec<_> = batch.iter().map(|&n| make_row(vec![("v".to_string(), RowField::Int(n))])).collect();
    writer.write_rows(&rows).unwrap();
    writer.flush().unwrap();
  }
  writer.close().unwrap();

  let bytes = writer.into_inner().into_inner();
  let reader = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64).unwrap();

  assert_eq!(reader.row_groups().len(), 1);
  let rows = reader.row_groups()[0].rows();
  assert_eq!(rows.len(), 3000);

  let values: Vec<i32> = rows
    .iter()
    .map(|row| match row.get("v") {
      Some(&RowField::Int(n)) => n,
      other => panic!("expected int32 value, got {:?}", other)
    })
    .collect();
  let mut sorted = values.clone();
  sorted.sort();
  assert_eq!(values, sorted);
  assert_eq!(values[0], 0);
  assert_eq!(values[2999], 999);
}

#[test]
fn test_dedup_after_merge_drops_duplicate_rows_across_runs() {
  let schema = int_schema();
  let props = Rc::new(
    WriterProperties::builder()
      .set_sorting_columns(vec![SortingColumn::new(path_of("v"), false, true)])
      .set_drop_duplicated_rows(true)
      .build()
  );
  let mut writer = SortingFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();

  let first: Vec<_> = (0..500).map(|n| make_row(vec![("v".to_string(), RowField::Int(n))])).collect();
  let second: Vec<_> = (0..500).map(|n| make_row(vec![("v".to_string(), RowField::Int(n))])).collect();
  writer.write_rows(&first).unwrap();
  writer.flush().unwrap();
  writer.write_rows(&second).unwrap();
  writer.flush().unwrap();
  writer.close().unwrap();

  let bytes = writer.into_inner().into_inner();
  let reader = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64).unwrap();

  assert_eq!(reader.row_groups().len(), 1);
  assert_eq!(reader.row_groups()[0].rows().len(), 500);
}
