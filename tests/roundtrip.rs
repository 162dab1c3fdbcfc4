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

//! End-to-end write/read roundtrips through `SerializedFileWriter` and
//! `SerializedFileReader`, covering a flat schema and a nested list whose
//! repetition levels must survive a full page-encode/decode cycle.

extern crate parqcore;

use std::io::Cursor;
use std::rc::Rc;

use parqcore::basic::{Repetition, Type as PhysicalType};
use parqcore::file::properties::WriterProperties;
use parqcore::file::reader::SerializedFileReader;
use parqcore::file::writer::SerializedFileWriter;
use parqcore::record::api::{make_row, Row, RowField};
use parqcore::schema::types::{SchemaDescriptor, Type as SchemaType};

fn int32_leaf(name: &str, repetition: Repetition) -> Rc<SchemaType> {
  Rc::new(SchemaType::primitive_type_builder(name, PhysicalType::INT32).with_repetition(repetition).build().unwrap())
}

fn byte_array_leaf(name: &str, repetition: Repetition) -> Rc<SchemaType> {
  Rc::new(SchemaType::primitive_type_builder(name, PhysicalType::BYTE_ARRAY).with_repetition(repetition).build().unwrap())
}

#[test]
fn test_simple_roundtrip() {
  let id = int32_leaf("id", Repetition::REQUIRED);
  let name = byte_array_leaf("name", Repetition::OPTIONAL);
  let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id, name]).build().unwrap());
  let schema = Rc::new(SchemaDescriptor::new(root));
  let props = Rc::new(WriterProperties::default());

  let rows = vec![
    make_row(vec![("id".to_string(), RowField::Int(1)), ("name".to_string(), RowField::Str("alice".to_string()))]),
    make_row(vec![("id".to_string(), RowField::Int(2)), ("name".to_string(), RowField::Null)]),
    make_row(vec![("id".to_string(), RowField::Int(3)), ("name".to_string(), RowField::Str("carol".to_string()))])
  ];

  let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
  writer.write_rows(&rows).unwrap();
  writer.close().unwrap();
  let bytes = writer.into_inner().into_inner();

  let reader = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64).unwrap();
  assert_eq!(reader.row_groups().len(), 1);
  let read_rows: Vec<Row> = reader.row_groups()[0].rows().to_vec();
  assert_eq!(read_rows, rows);
}

#[test]
fn test_nested_list_roundtrip_preserves_repetition_levels() {
  // items: repeated group { x: int32 }, as in the shredder's own
  // `[0,1,1,0]` example, carried all the way through a file.
  let x = int32_leaf("x", Repetition::REQUIRED);
  let items = Rc::new(
    SchemaType::group_type_builder("items")
      .with_repetition(Repetition::REPEATED)
      .with_fields(&mut vec![x])
      .build()
      .unwrap()
  );
  let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![items]).build().unwrap());
  let schema = Rc::new(SchemaDescriptor::new(root));
  let props = Rc::new(WriterProperties::default());

  let row1 = make_row(vec![(
    "items".to_string(),
    RowField::List(vec![
      RowField::Group(make_row(vec![("x".to_string(), RowField::Int(1))])),
      RowField::Group(make_row(vec![("x".to_string(), RowField::Int(2))])),
      RowField::Group(make_row(vec![("x".to_string(), RowField::Int(3))]))
    ])
  )]);
  let row2 = make_row(vec![(
    "items".to_string(),
    RowField::List(vec![RowField::Group(make_row(vec![("x".to_string(), RowField::Int(4))]))])
  )]);
  let rows = vec![row1, row2];

  let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), schema, props).unwrap();
  writer.write_rows(&rows).unwrap();
  writer.close().unwrap();
  let bytes = writer.into_inner().into_inner();

  let reader = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64).unwrap();
  let read_rows = reader.row_groups()[0].rows();
  assert_eq!(read_rows, &rows[..]);
}

#[test]
fn test_reader_rejects_corrupt_magic() {
  let mut bytes = vec![0u8; 16];
  bytes[0] = b'X';
  let err = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64);
  assert!(err.is_err());
}
