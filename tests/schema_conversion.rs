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

//! Schema-to-schema conversion (§4.7) exercised against a source file
//! written with one schema and read back against a differently-shaped
//! target schema: a missing optional column defaults to null, and a
//! missing required column defaults to a zero-payload value with
//! repetition levels mirrored from a donor column.

extern crate parqcore;

use std::io::Cursor;
use std::rc::Rc;

use parqcore::basic::{LogicalType, Repetition, Type as PhysicalType};
use parqcore::file::properties::WriterProperties;
use parqcore::file::reader::SerializedFileReader;
use parqcore::file::writer::SerializedFileWriter;
use parqcore::record::api::{make_row, RowField};
use parqcore::schema::convert::convert_rows;
use parqcore::schema::types::{SchemaDescriptor, Type as SchemaType};

fn leaf(name: &str, physical_type: PhysicalType, repetition: Repetition, logical_type: LogicalType) -> Rc<SchemaType> {
  Rc::new(
    SchemaType::primitive_type_builder(name, physical_type)
      .with_repetition(repetition)
      .with_logical_type(logical_type)
      .build()
      .unwrap()
  )
}

#[test]
fn test_missing_optional_column_defaults_to_null() {
  let id = leaf("id", PhysicalType::INT64, Repetition::REQUIRED, LogicalType::NONE);
  let source_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id.clone()]).build().unwrap());
  let source_schema = Rc::new(SchemaDescriptor::new(source_root));

  let rows = vec![
    make_row(vec![("id".to_string(), RowField::Long(1))]),
    make_row(vec![("id".to_string(), RowField::Long(2))])
  ];

  let mut writer = SerializedFileWriter::open(Cursor::new(Vec::new()), source_schema, Rc::new(WriterProperties::default())).unwrap();
  writer.write_rows(&rows).unwrap();
  writer.close().unwrap();
  let bytes = writer.into_inner().into_inner();

  let reader = SerializedFileReader::open(Cursor::new(bytes.clone()), bytes.len() as u64).unwrap();

  let comment = leaf("comment", PhysicalType::BYTE_ARRAY, Repetition::OPTIONAL, LogicalType::UTF8);
  let target_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id, comment]).build().unwrap());
  let target_schema = SchemaDescriptor::new(target_root);

  let converted = convert_rows(reader.row_groups()[0].rows(), &target_schema, reader.schema()).unwrap();
  assert_eq!(converted.len(), 2);
  for (original, row) in rows.iter().zip(converted.iter()) {
    assert_eq!(row.get("id"), original.get("id"));
    assert_eq!(row.get("comment"), Some(&RowField::Null));
  }
}

#[test]
fn test_missing_required_column_mirrors_donor_repetition() {
  // source: a bare repeated leaf `tags: repeated int32`.
  let tags = leaf("tags", PhysicalType::INT32, Repetition::REPEATED, LogicalType::NONE);
  let source_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![tags]).build().unwrap());
  let source_schema = SchemaDescriptor::new(source_root);

  let row = make_row(vec![("tags".to_string(), RowField::List(vec![RowField::Int(1), RowField::Int(2), RowField::Int(3)]))]);

  // target: an unrelated required int32 column `extra` with no source
  // column at all, sharing only the root group with `tags`. The planner
  // picks `tags` as the nearest-sibling level donor since it's the only
  // other column, so `extra` should come back as a 3-element list of
  // zero-payload values mirroring `tags`'s cardinality, not a single value.
  let extra = leaf("extra", PhysicalType::INT32, Repetition::REQUIRED, LogicalType::NONE);
  let target_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![extra]).build().unwrap());
  let target_schema = SchemaDescriptor::new(target_root);

  let converted = convert_rows(&[row], &target_schema, &source_schema).unwrap();
  assert_eq!(converted.len(), 1);
  assert_eq!(converted[0].get("extra"), Some(&RowField::List(vec![RowField::Int(0), RowField::Int(0), RowField::Int(0)])));
}

#[test]
fn test_convert_rows_widens_nested_list_of_groups_by_one_column() {
  // source: items: repeated group { x: int32 }.
  let x = leaf("x", PhysicalType::INT32, Repetition::REQUIRED, LogicalType::NONE);
  let source_items = Rc::new(SchemaType::group_type_builder("items").with_repetition(Repetition::REPEATED).with_fields(&mut vec![x.clone()]).build().unwrap());
  let source_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![source_items]).build().unwrap());
  let source_schema = SchemaDescriptor::new(source_root);

  let row1 = make_row(vec![(
    "items".to_string(),
    RowField::List(vec![
      RowField::Group(make_row(vec![("x".to_string(), RowField::Int(1))])),
      RowField::Group(make_row(vec![("x".to_string(), RowField::Int(2))]))
    ])
  )]);
  let row2 = make_row(vec![("items".to_string(), RowField::List(vec![RowField::Group(make_row(vec![("x".to_string(), RowField::Int(3))]))]))]);

  // target: items: repeated group { x: int32, y: int32 } — one column added
  // to the same repeated group, the spec's literal nested-list scenario.
  let y = leaf("y", PhysicalType::INT32, Repetition::REQUIRED, LogicalType::NONE);
  let target_items = Rc::new(SchemaType::group_type_builder("items").with_repetition(Repetition::REPEATED).with_fields(&mut vec![x, y]).build().unwrap());
  let target_root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![target_items]).build().unwrap());
  let target_schema = SchemaDescriptor::new(target_root);

  let converted = convert_rows(&[row1, row2], &target_schema, &source_schema).unwrap();
  assert_eq!(converted.len(), 2);

  match converted[0].get("items") {
    Some(&RowField::List(ref items)) => {
      assert_eq!(items.len(), 2);
      assert_eq!(items[0], RowField::Group(make_row(vec![("x".to_string(), RowField::Int(1)), ("y".to_string(), RowField::Int(0))])));
      assert_eq!(items[1], RowField::Group(make_row(vec![("x".to_string(), RowField::Int(2)), ("y".to_string(), RowField::Int(0))])));
    },
    other => panic!("expected a list of groups, got {:?}", other)
  }
  match converted[1].get("items") {
    Some(&RowField::List(ref items)) => {
      assert_eq!(items.len(), 1);
      assert_eq!(items[0], RowField::Group(make_row(vec![("x".to_string(), RowField::Int(3)), ("y".to_string(), RowField::Int(0))])));
    },
    other => panic!("expected a list of groups, got {:?}", other)
  }
}
