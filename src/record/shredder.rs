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

//! Dremel shredding (C7): walks a schema tree alongside a `Row`, emitting one
//! `TypedTriplet` per leaf column in left-to-right depth-first order — the
//! same order `schema::types::SchemaDescriptor` assigns column indexes in.
//!
//! The write-value function for a node composes exactly the three rules of
//! §4.6: a required node recurses or writes a scalar, an optional node
//! either emits a null triple at the parent's definition level or recurses
//! with `def += 1`, and a repeated node emits one triple per list element
//! (first at `rep = parent_rep`, the rest at `rep = this node's own rep
//! level`) or a single null marker for an empty/absent list.

use basic::Type as PhysicalType;
use data_type::*;
use errors::{Result, ParquetError};
use record::api::{Row, RowField};
use record::triplet::TypedTriplet;
use schema::types::{SchemaDescriptor, Type as SchemaType};

/// Per-leaf accumulation of shredded triples, one variant per physical kind
/// — the write-side mirror of `column::writer::ColumnWriter`.
pub enum LeafTriples {
  Bool(Vec<TypedTriplet<BoolType>>),
  Int32(Vec<TypedTriplet<Int32Type>>),
  Int64(Vec<TypedTriplet<Int64Type>>),
  Int96(Vec<TypedTriplet<Int96Type>>),
  Float(Vec<TypedTriplet<FloatType>>),
  Double(Vec<TypedTriplet<DoubleType>>),
  ByteArray(Vec<TypedTriplet<ByteArrayType>>),
  FixedLenByteArray(Vec<TypedTriplet<FixedLenByteArrayType>>)
}

impl LeafTriples {
  fn new_for(physical_type: PhysicalType) -> Self {
    match physical_type {
      PhysicalType::BOOLEAN => LeafTriples::Bool(Vec::new()),
      PhysicalType::INT32 => LeafTriples::Int32(Vec::new()),
      PhysicalType::INT64 => LeafTriples::Int64(Vec::new()),
      PhysicalType::INT96 => LeafTriples::Int96(Vec::new()),
      PhysicalType::FLOAT => LeafTriples::Float(Vec::new()),
      PhysicalType::DOUBLE => LeafTriples::Double(Vec::new()),
      PhysicalType::BYTE_ARRAY => LeafTriples::ByteArray(Vec::new()),
      PhysicalType::FIXED_LEN_BYTE_ARRAY => LeafTriples::FixedLenByteArray(Vec::new())
    }
  }

  pub fn len(&self) -> usize {
    match *self {
      LeafTriples::Bool(ref v) => v.len(),
      LeafTriples::Int32(ref v) => v.len(),
      LeafTriples::Int64(ref v) => v.len(),
      LeafTriples::Int96(ref v) => v.len(),
      LeafTriples::Float(ref v) => v.len(),
      LeafTriples::Double(ref v) => v.len(),
      LeafTriples::ByteArray(ref v) => v.len(),
      LeafTriples::FixedLenByteArray(ref v) => v.len()
    }
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Builds an empty accumulator matching `descr`'s physical kind; used by
  /// `row_group::RowGroupWriter` to seed one `LeafTriples` per column ahead
  /// of any `write_rows` call.
  pub fn new_for_column(physical_type: PhysicalType) -> Self {
    LeafTriples::new_for(physical_type)
  }

  /// Moves every triple out of `other` onto the end of `self`. Panics if the
  /// two accumulators hold different physical kinds — a programmer error,
  /// since both must have been built from the same column descriptor.
  pub fn extend(&mut self, other: LeafTriples) {
    match (self, other) {
      (&mut LeafTriples::Bool(ref mut v), LeafTriples::Bool(o)) => v.extend(o),
      (&mut LeafTriples::Int32(ref mut v), LeafTriples::Int32(o)) => v.extend(o),
      (&mut LeafTriples::Int64(ref mut v), LeafTriples::Int64(o)) => v.extend(o),
      (&mut LeafTriples::Int96(ref mut v), LeafTriples::Int96(o)) => v.extend(o),
      (&mut LeafTriples::Float(ref mut v), LeafTriples::Float(o)) => v.extend(o),
      (&mut LeafTriples::Double(ref mut v), LeafTriples::Double(o)) => v.extend(o),
      (&mut LeafTriples::ByteArray(ref mut v), LeafTriples::ByteArray(o)) => v.extend(o),
      (&mut LeafTriples::FixedLenByteArray(ref mut v), LeafTriples::FixedLenByteArray(o)) => v.extend(o),
      _ => panic!("LeafTriples::extend: mismatched physical kinds")
    }
  }
}

/// Shreds every row in `rows` against `schema`, returning one `LeafTriples`
/// per leaf column index (same order as `schema.columns()`).
pub fn shred_rows(schema: &SchemaDescriptor, rows: &[Row]) -> Result<Vec<LeafTriples>> {
  let mut columns: Vec<LeafTriples> = schema
    .columns()
    .iter()
    .map(|d| LeafTriples::new_for(d.physical_type()))
    .collect();

  for row in rows {
    let mut idx = 0usize;
    let root_fields = schema.root_schema().get_fields();
    for field in root_fields {
      let value = row.get(field.name());
      shred_node(field, value, 0, 0, &mut columns, &mut idx)?;
    }
  }

  Ok(columns)
}

fn push_leaf(node: &SchemaType, value: Option<&RowField>, rep: i16, def: i16, out: &mut [LeafTriples], idx: &mut usize) -> Result<()> {
  let slot = &mut out[*idx];
  *idx += 1;
  let physical_type = node.physical_type();
  let logical_type = node.logical_type();
  let type_length = node.type_length();

  match *slot {
    LeafTriples::Bool(ref mut v) => {
      let value = match value {
        None => None,
        Some(&RowField::Bool(b)) => Some(b),
        Some(&RowField::Null) => None,
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::Int32(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Int(i)) => Some(i),
        Some(&RowField::Byte(b)) => Some(b as i32),
        Some(&RowField::Short(s)) => Some(s as i32),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::Int64(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Long(l)) => Some(l),
        Some(&RowField::Timestamp(millis)) => Some(millis as i64),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::Int96(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Timestamp(millis)) => Some(millis_to_int96(millis)),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::Float(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Float(f)) => Some(f),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::Double(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Double(d)) => Some(d),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::ByteArray(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Str(ref s)) => Some(ByteArray::from(s.as_bytes().to_vec())),
        Some(&RowField::Bytes(ref b)) => Some(b.clone()),
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    },
    LeafTriples::FixedLenByteArray(ref mut v) => {
      let value = match value {
        None | Some(&RowField::Null) => None,
        Some(&RowField::Bytes(ref b)) => {
          if type_length > 0 && b.len() != type_length as usize {
            return Err(schema_err!("fixed_len_byte_array({}) value has length {}", type_length, b.len()));
          }
          Some(b.clone())
        },
        other => return Err(schema_mismatch(node, other))
      };
      v.push(TypedTriplet::new(value, def, rep));
    }
  }
  let _ = logical_type;
  Ok(())
}

fn schema_mismatch(node: &SchemaType, value: Option<&RowField>) -> ParquetError {
  schema_err!("column {} ({:?}) cannot hold value {:?}", node.name(), node.physical_type(), value)
}

fn millis_to_int96(millis: u64) -> Int96 {
  let julian_to_unix_epoch_days: u64 = 2_440_588;
  let milli_seconds_in_a_day: u64 = 86_400_000;
  let days = millis / milli_seconds_in_a_day;
  let remainder_millis = millis % milli_seconds_in_a_day;
  let nanos = remainder_millis * 1_000_000;
  let julian_day = days + julian_to_unix_epoch_days;
  Int96::new(nanos as u32, (nanos >> 32) as u32, julian_day as u32)
}

/// Emits exactly one triple (present, null, or recursively for a group) for
/// `node` given the candidate value and the `(rep, def)` context already
/// adjusted for this node's own repetition.
fn write_present(node: &SchemaType, value: &RowField, rep: i16, def: i16, out: &mut [LeafTriples], idx: &mut usize) -> Result<()> {
  match *node {
    SchemaType::Primitive { .. } => push_leaf(node, Some(value), rep, def, out, idx),
    SchemaType::Group { .. } => {
      match *value {
        RowField::Group(ref inner) => {
          for field in node.get_fields() {
            let v = inner.get(field.name());
            shred_node(field, v, rep, def, out, idx)?;
          }
          Ok(())
        },
        _ => Err(schema_mismatch(node, Some(value)))
      }
    }
  }
}

/// Propagates a null/absent marker through every leaf beneath `node`,
/// advancing `idx` exactly as a present traversal would.
fn write_all_null(node: &SchemaType, rep: i16, def: i16, out: &mut [LeafTriples], idx: &mut usize) -> Result<()> {
  match *node {
    SchemaType::Primitive { .. } => push_leaf(node, None, rep, def, out, idx),
    SchemaType::Group { .. } => {
      for field in node.get_fields() {
        write_all_null(field, rep, def, out, idx)?;
      }
      Ok(())
    }
  }
}

fn shred_node(node: &SchemaType, value: Option<&RowField>, parent_rep: i16, parent_def: i16, out: &mut [LeafTriples], idx: &mut usize) -> Result<()> {
  use basic::Repetition;

  match node.repetition() {
    Repetition::REQUIRED => {
      match value {
        Some(v) => write_present(node, v, parent_rep, parent_def, out, idx),
        None => Err(schema_err!("missing value for required column {}", node.name()))
      }
    },
    Repetition::OPTIONAL => {
      match value {
        None | Some(&RowField::Null) => write_all_null(node, parent_rep, parent_def, out, idx),
        Some(v) => write_present(node, v, parent_rep, parent_def + 1, out, idx)
      }
    },
    Repetition::REPEATED => {
      match value {
        None | Some(&RowField::Null) => write_all_null(node, parent_rep, parent_def, out, idx),
        Some(&RowField::List(ref items)) if items.is_empty() => write_all_null(node, parent_rep, parent_def, out, idx),
        Some(&RowField::List(ref items)) => {
          let new_def = parent_def + 1;
          let new_rep = parent_rep + 1;
          for (i, item) in items.iter().enumerate() {
            let rep = if i == 0 { parent_rep } else { new_rep };
            write_present(node, item, rep, new_def, out, idx)?;
          }
          Ok(())
        },
        Some(v) => write_present(node, v, parent_rep, parent_def + 1, out, idx)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::Repetition;
  use record::api::make_row;
  use schema::types::Type as SchemaType;
  use std::rc::Rc;

  fn int32_leaf(name: &str, rep: Repetition) -> Rc<SchemaType> {
    Rc::new(
      SchemaType::primitive_type_builder(name, PhysicalType::INT32)
        .with_repetition(rep)
        .build()
        .unwrap()
    )
  }

  #[test]
  fn test_shred_flat_required_row() {
    let id = int32_leaf("id", Repetition::REQUIRED);
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![id]).build().unwrap());
    let schema = SchemaDescriptor::new(root);

    let rows = vec![make_row(vec![("id".to_string(), RowField::Int(7))])];
    let columns = shred_rows(&schema, &rows).unwrap();
    match columns[0] {
      LeafTriples::Int32(ref v) => {
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].value, Some(7));
        assert_eq!(v[0].def_level, 0);
        assert_eq!(v[0].rep_level, 0);
      },
      _ => panic!("expected int32 column")
    }
  }

  #[test]
  fn test_shred_nested_list_rep_levels() {
    // items: repeated group { x: int32 }
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

    let columns = shred_rows(&schema, &[row1, row2, row3]).unwrap();
    match columns[0] {
      LeafTriples::Int32(ref v) => {
        let values: Vec<Option<i32>> = v.iter().map(|t| t.value).collect();
        let reps: Vec<i16> = v.iter().map(|t| t.rep_level).collect();
        assert_eq!(values, vec![Some(1), Some(2), Some(3), Some(4), None]);
        assert_eq!(reps, vec![0, 1, 1, 0, 0]);
      },
      _ => panic!("expected int32 column")
    }
  }

  #[test]
  fn test_shred_optional_missing_emits_null_at_parent_level() {
    let comment = Rc::new(
      SchemaType::primitive_type_builder("comment", PhysicalType::BYTE_ARRAY)
        .with_repetition(Repetition::OPTIONAL)
        .build()
        .unwrap()
    );
    let root = Rc::new(SchemaType::group_type_builder("root").with_fields(&mut vec![comment]).build().unwrap());
    let schema = SchemaDescriptor::new(root);

    let rows = vec![make_row(Vec::new())];
    let columns = shred_rows(&schema, &rows).unwrap();
    match columns[0] {
      LeafTriples::ByteArray(ref v) => {
        assert_eq!(v.len(), 1);
        assert!(v[0].is_null());
        assert_eq!(v[0].def_level, 0);
      },
      _ => panic!("expected byte_array column")
    }
  }
}
