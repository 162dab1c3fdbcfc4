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

//! Dremel assembly (C7, inverse of `record::shredder`): walks the schema
//! tree in the same left-to-right depth-first order the shredder used,
//! draining one `TripletStream` per leaf column to rebuild `Row`s.
//!
//! The three shredding rules invert directly: a required node always
//! consumes a value (recursing for groups); an optional node is null when
//! its leftmost descendant's next triple is null, otherwise present at
//! `def + 1`; a repeated node collects list elements while the next
//! triple's repetition level keeps matching `rep + 1`, or is null/absent
//! for an empty list. Because column indexes are assigned left-to-right,
//! the leftmost leaf under any node always sits at the current `idx`
//! cursor, so presence/continuation decisions only ever need to peek that
//! one stream.

use basic::Repetition;
use data_type::*;
use errors::{Result, ParquetError};
use record::api::{Row, RowField};
use record::shredder::LeafTriples;
use record::triplet::TripletStream;
use schema::types::{SchemaDescriptor, Type as SchemaType};

/// Per-leaf read cursor, the read-side mirror of `LeafTriples`.
enum LeafCursor {
  Bool(TripletStream<BoolType>),
  Int32(TripletStream<Int32Type>),
  Int64(TripletStream<Int64Type>),
  Int96(TripletStream<Int96Type>),
  Float(TripletStream<FloatType>),
  Double(TripletStream<DoubleType>),
  ByteArray(TripletStream<ByteArrayType>),
  FixedLenByteArray(TripletStream<FixedLenByteArrayType>)
}

impl LeafCursor {
  fn has_next(&self) -> bool {
    match *self {
      LeafCursor::Bool(ref s) => s.has_next(),
      LeafCursor::Int32(ref s) => s.has_next(),
      LeafCursor::Int64(ref s) => s.has_next(),
      LeafCursor::Int96(ref s) => s.has_next(),
      LeafCursor::Float(ref s) => s.has_next(),
      LeafCursor::Double(ref s) => s.has_next(),
      LeafCursor::ByteArray(ref s) => s.has_next(),
      LeafCursor::FixedLenByteArray(ref s) => s.has_next()
    }
  }

  fn peek_is_null(&self) -> bool {
    match *self {
      LeafCursor::Bool(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::Int32(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::Int64(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::Int96(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::Float(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::Double(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::ByteArray(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true),
      LeafCursor::FixedLenByteArray(ref s) => s.peek().map(|t| t.is_null()).unwrap_or(true)
    }
  }

  fn peek_rep_level(&self) -> Option<i16> {
    match *self {
      LeafCursor::Bool(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::Int32(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::Int64(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::Int96(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::Float(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::Double(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::ByteArray(ref s) => s.peek().map(|t| t.rep_level),
      LeafCursor::FixedLenByteArray(ref s) => s.peek().map(|t| t.rep_level)
    }
  }
}

impl From<LeafTriples> for LeafCursor {
  fn from(leaf: LeafTriples) -> Self {
    match leaf {
      LeafTriples::Bool(v) => LeafCursor::Bool(TripletStream::new(v)),
      LeafTriples::Int32(v) => LeafCursor::Int32(TripletStream::new(v)),
      LeafTriples::Int64(v) => LeafCursor::Int64(TripletStream::new(v)),
      LeafTriples::Int96(v) => LeafCursor::Int96(TripletStream::new(v)),
      LeafTriples::Float(v) => LeafCursor::Float(TripletStream::new(v)),
      LeafTriples::Double(v) => LeafCursor::Double(TripletStream::new(v)),
      LeafTriples::ByteArray(v) => LeafCursor::ByteArray(TripletStream::new(v)),
      LeafTriples::FixedLenByteArray(v) => LeafCursor::FixedLenByteArray(TripletStream::new(v))
    }
  }
}

/// Reassembles rows from one `LeafTriples` per leaf column (same order as
/// `schema.columns()`), walking `schema`'s root fields once per output row
/// until every cursor is drained.
pub fn assemble_rows(schema: &SchemaDescriptor, columns: Vec<LeafTriples>) -> Result<Vec<Row>> {
  if columns.len() != schema.num_columns() {
    return Err(general_err!(
      "expected {} leaf columns, got {}", schema.num_columns(), columns.len()));
  }

  let mut cursors: Vec<LeafCursor> = columns.into_iter().map(LeafCursor::from).collect();
  let mut rows = Vec::new();

  while cursors.iter().any(|c| c.has_next()) {
    let mut idx = 0usize;
    let mut fields = Vec::new();
    for field in schema.root_schema().get_fields() {
      if let Some(rf) = assemble_node(field, 0, 0, &mut cursors, &mut idx)? {
        fields.push((field.name().to_string(), rf));
      }
    }
    rows.push(Row::new(fields));
  }

  Ok(rows)
}

fn assemble_node(node: &SchemaType, parent_rep: i16, parent_def: i16,
                  cursors: &mut [LeafCursor], idx: &mut usize) -> Result<Option<RowField>> {
  match node.repetition() {
    Repetition::REQUIRED => {
      assemble_present(node, parent_rep, parent_def, cursors, idx).map(Some)
    },
    Repetition::OPTIONAL => {
      if cursors[*idx].peek_is_null() {
        consume_null_subtree(node, cursors, idx)?;
        Ok(None)
      } else {
        assemble_present(node, parent_rep, parent_def + 1, cursors, idx).map(Some)
      }
    },
    Repetition::REPEATED => {
      if cursors[*idx].peek_is_null() {
        consume_null_subtree(node, cursors, idx)?;
        return Ok(None);
      }
      let new_def = parent_def + 1;
      let new_rep = parent_rep + 1;
      let mut items = Vec::new();
      let mut rep_for_item = parent_rep;
      loop {
        items.push(assemble_present(node, rep_for_item, new_def, cursors, idx)?);
        rep_for_item = new_rep;
        if cursors[*idx].peek_rep_level() != Some(new_rep) {
          break;
        }
      }
      Ok(Some(RowField::List(items)))
    }
  }
}

/// Consumes one value for `node`, which must already be known present.
fn assemble_present(node: &SchemaType, rep: i16, def: i16,
                     cursors: &mut [LeafCursor], idx: &mut usize) -> Result<RowField> {
  match *node {
    SchemaType::Primitive { .. } => {
      let value = consume_leaf(node, cursors, idx)?;
      value.ok_or_else(|| general_err!("column {} expected a value but found null", node.name()))
    },
    SchemaType::Group { .. } => {
      let mut fields = Vec::new();
      for field in node.get_fields() {
        if let Some(rf) = assemble_node(field, rep, def, cursors, idx)? {
          fields.push((field.name().to_string(), rf));
        }
      }
      Ok(RowField::Group(Row::new(fields)))
    }
  }
}

/// Discards one null triple per leaf beneath `node`, mirroring
/// `shredder::write_all_null`'s traversal exactly so `idx` stays aligned.
fn consume_null_subtree(node: &SchemaType, cursors: &mut [LeafCursor], idx: &mut usize) -> Result<()> {
  match *node {
    SchemaType::Primitive { .. } => { consume_leaf(node, cursors, idx)?; Ok(()) },
    SchemaType::Group { .. } => {
      for field in node.get_fields() {
        consume_null_subtree(field, cursors, idx)?;
      }
      Ok(())
    }
  }
}

/// Consumes and converts the next triple for the leaf at `idx`, advancing it.
fn consume_leaf(node: &SchemaType, cursors: &mut [LeafCursor], idx: &mut usize) -> Result<Option<RowField>> {
  let physical_type = node.physical_type();
  let logical_type = node.logical_type();
  let name = node.name().to_string();
  let slot = &mut cursors[*idx];
  *idx += 1;

  macro_rules! next {
    ($stream:expr) => {
      $stream.advance().cloned().ok_or_else(|| general_err!("column {} exhausted", name))?
    };
  }

  let result = match *slot {
    LeafCursor::Bool(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_bool(physical_type, logical_type, v))
    },
    LeafCursor::Int32(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_int32(physical_type, logical_type, v))
    },
    LeafCursor::Int64(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_int64(physical_type, logical_type, v))
    },
    LeafCursor::Int96(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_int96(physical_type, logical_type, v))
    },
    LeafCursor::Float(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_float(physical_type, logical_type, v))
    },
    LeafCursor::Double(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_double(physical_type, logical_type, v))
    },
    LeafCursor::ByteArray(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_byte_array(physical_type, logical_type, v))
    },
    LeafCursor::FixedLenByteArray(ref mut s) => {
      let t = next!(s);
      t.value.map(|v| RowField::convert_byte_array(physical_type, logical_type, v))
    }
  };

  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::{LogicalType, Type as PhysicalType};
  use record::api::make_row;
  use record::shredder::shred_rows;
  use std::rc::Rc;

  fn int32_leaf(name: &str, rep: Repetition) -> Rc<SchemaType> {
    Rc::new(
      SchemaType::primitive_type_builder(name, PhysicalType::INT32)
        .with_repetition(rep)
        .with_logical_type(LogicalType::INT_32)
        .build()
        .unwrap()
    )
  }

  #[test]
  fn test_roundtrip_flat_required_row() {
    let id = int32_leaf("id", Repetition::REQUIRED);
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id]).build().unwrap());
    let schema = SchemaDescriptor::new(root);

    let rows = vec![
      make_row(vec![("id".to_string(), RowField::Int(7))]),
      make_row(vec![("id".to_string(), RowField::Int(8))])
    ];
    let columns = shred_rows(&schema, &rows).unwrap();
    let assembled = assemble_rows(&schema, columns).unwrap();
    assert_eq!(assembled, rows);
  }

  #[test]
  fn test_roundtrip_optional_missing_column_omits_field() {
    let comment = Rc::new(
      SchemaType::primitive_type_builder("comment", PhysicalType::BYTE_ARRAY)
        .with_repetition(Repetition::OPTIONAL)
        .with_logical_type(LogicalType::UTF8)
        .build()
        .unwrap()
    );
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![comment]).build().unwrap());
    let schema = SchemaDescriptor::new(root);

    let rows = vec![make_row(Vec::new())];
    let columns = shred_rows(&schema, &rows).unwrap();
    let assembled = assemble_rows(&schema, columns).unwrap();
    assert_eq!(assembled, vec![make_row(Vec::new())]);
  }

  #[test]
  fn test_roundtrip_nested_list() {
    let x = int32_leaf("x", Repetition::REQUIRED);
    let items = Rc::new(
      SchemaType::group_type_builder("items")
        .with_repetition(Repetition::REPEATED)
        .with_fields(&mut vec![x])
        .build()
        .unwrap()
    );
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![items]).build().unwrap());
    let schema = SchemaDescriptor::new(root);

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
    let row3 = make_row(vec![("items".to_string(), RowField::List(Vec::new()))]);

    let rows = vec![row1, row2, row3];
    let columns = shred_rows(&schema, &rows).unwrap();
    let assembled = assemble_rows(&schema, columns).unwrap();

    // An absent/empty repeated field round-trips as an empty list rather
    // than a missing key, since the shredder cannot tell the two apart.
    assert_eq!(assembled, rows);
  }

  #[test]
  fn test_assemble_rejects_wrong_column_count() {
    let id = int32_leaf("id", Repetition::REQUIRED);
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id]).build().unwrap());
    let schema = SchemaDescriptor::new(root);
    let err = assemble_rows(&schema, Vec::new());
    assert!(err.is_err());
  }
}
