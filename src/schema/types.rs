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

//! Schema tree (C8): groups and leaves, builders, a flattened
//! `SchemaDescriptor`/`ColumnDescriptor` pair computed by a left-to-right
//! depth-first traversal, and `ColumnPath` addressing.

use std::fmt;
use std::rc::Rc;

use basic::{LogicalType, Repetition};
use basic::Type as PhysicalType;
use errors::Result;

/// Dot-joined path to a leaf or group, e.g. `a.b.c`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ColumnPath {
  parts: Vec<String>
}

impl ColumnPath {
  pub fn new(parts: Vec<String>) -> Self {
    ColumnPath { parts: parts }
  }

  pub fn parts(&self) -> &[String] {
    &self.parts
  }

  pub fn append(&self, name: &str) -> Self {
    let mut parts = self.parts.clone();
    parts.push(name.to_string());
    ColumnPath::new(parts)
  }

  pub fn string(&self) -> String {
    self.parts.join(".")
  }
}

impl fmt::Display for ColumnPath {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.string())
  }
}

/// Schema node: either a group (possibly a LIST/MAP wrapper) or a primitive
/// leaf. Built exclusively through `group_type_builder`/`primitive_type_builder`.
#[derive(Clone, Debug)]
pub enum Type {
  Primitive {
    name: String,
    repetition: Repetition,
    physical_type: PhysicalType,
    logical_type: LogicalType,
    type_length: i32,
    id: Option<i32>
  },
  Group {
    name: String,
    repetition: Repetition,
    logical_type: LogicalType,
    fields: Vec<Rc<Type>>,
    id: Option<i32>
  }
}

impl Type {
  pub fn name(&self) -> &str {
    match *self {
      Type::Primitive { ref name, .. } => name,
      Type::Group { ref name, .. } => name
    }
  }

  pub fn repetition(&self) -> Repetition {
    match *self {
      Type::Primitive { repetition, .. } => repetition,
      Type::Group { repetition, .. } => repetition
    }
  }

  pub fn logical_type(&self) -> LogicalType {
    match *self {
      Type::Primitive { ref logical_type, .. } => logical_type.clone(),
      Type::Group { ref logical_type, .. } => logical_type.clone()
    }
  }

  pub fn id(&self) -> Option<i32> {
    match *self {
      Type::Primitive { id, .. } => id,
      Type::Group { id, .. } => id
    }
  }

  pub fn is_primitive(&self) -> bool {
    match *self {
      Type::Primitive { .. } => true,
      Type::Group { .. } => false
    }
  }

  pub fn get_fields(&self) -> &[Rc<Type>] {
    match *self {
      Type::Group { ref fields, .. } => fields,
      Type::Primitive { .. } => &[]
    }
  }

  pub fn physical_type(&self) -> PhysicalType {
    match *self {
      Type::Primitive { physical_type, .. } => physical_type,
      Type::Group { .. } => panic!("physical_type() called on a group type")
    }
  }

  pub fn type_length(&self) -> i32 {
    match *self {
      Type::Primitive { type_length, .. } => type_length,
      Type::Group { .. } => -1
    }
  }

  pub fn primitive_type_builder(name: &str, physical_type: PhysicalType) -> PrimitiveTypeBuilder {
    PrimitiveTypeBuilder::new(name, physical_type)
  }

  pub fn group_type_builder(name: &str) -> GroupTypeBuilder {
    GroupTypeBuilder::new(name)
  }
}

pub struct PrimitiveTypeBuilder {
  name: String,
  physical_type: PhysicalType,
  repetition: Repetition,
  logical_type: LogicalType,
  type_length: i32,
  id: Option<i32>
}

impl PrimitiveTypeBuilder {
  pub fn new(name: &str, physical_type: PhysicalType) -> Self {
    PrimitiveTypeBuilder {
      name: name.to_string(),
      physical_type: physical_type,
      repetition: Repetition::REQUIRED,
      logical_type: LogicalType::NONE,
      type_length: -1,
      id: None
    }
  }

  pub fn with_repetition(mut self, repetition: Repetition) -> Self {
    self.repetition = repetition;
    self
  }

  pub fn with_logical_type(mut self, logical_type: LogicalType) -> Self {
    self.logical_type = logical_type;
    self
  }

  pub fn with_length(mut self, type_length: i32) -> Self {
    self.type_length = type_length;
    self
  }

  pub fn with_id(mut self, id: i32) -> Self {
    self.id = Some(id);
    self
  }

  pub fn build(self) -> Result<Type> {
    if self.physical_type == PhysicalType::FIXED_LEN_BYTE_ARRAY && self.type_length < 0 {
      return Err(schema_err!("FIXED_LEN_BYTE_ARRAY {} must have a positive type_length", self.name));
    }
    Ok(Type::Primitive {
      name: self.name,
      repetition: self.repetition,
      physical_type: self.physical_type,
      logical_type: self.logical_type,
      type_length: self.type_length,
      id: self.id
    })
  }
}

pub struct GroupTypeBuilder {
  name: String,
  repetition: Repetition,
  logical_type: LogicalType,
  fields: Vec<Rc<Type>>,
  id: Option<i32>
}

impl GroupTypeBuilder {
  pub fn new(name: &str) -> Self {
    GroupTypeBuilder {
      name: name.to_string(),
      repetition: Repetition::REQUIRED,
      logical_type: LogicalType::NONE,
      fields: Vec::new(),
      id: None
    }
  }

  pub fn with_repetition(mut self, repetition: Repetition) -> Self {
    self.repetition = repetition;
    self
  }

  pub fn with_logical_type(mut self, logical_type: LogicalType) -> Self {
    self.logical_type = logical_type;
    self
  }

  pub fn with_fields(mut self, fields: &mut Vec<Rc<Type>>) -> Self {
    self.fields.append(fields);
    self
  }

  pub fn with_id(mut self, id: i32) -> Self {
    self.id = Some(id);
    self
  }

  pub fn build(self) -> Result<Type> {
    Ok(Type::Group {
      name: self.name,
      repetition: self.repetition,
      logical_type: self.logical_type,
      fields: self.fields,
      id: self.id
    })
  }
}

/// One flattened leaf: physical kind plus the computed `(maxRep, maxDef,
/// columnIndex)` triple from §3 "Schema".
#[derive(Clone, Debug)]
pub struct ColumnDescriptor {
  primitive_type: Rc<Type>,
  self_type: Option<Rc<Type>>,
  max_def_level: i16,
  max_rep_level: i16,
  path: ColumnPath
}

pub type ColumnDescPtr = Rc<ColumnDescriptor>;

impl ColumnDescriptor {
  pub fn new(primitive_type: Rc<Type>,
             self_type: Option<Rc<Type>>,
             max_def_level: i16,
             max_rep_level: i16,
             path: ColumnPath)
             -> Self {
    ColumnDescriptor {
      primitive_type: primitive_type,
      self_type: self_type,
      max_def_level: max_def_level,
      max_rep_level: max_rep_level,
      path: path
    }
  }

  pub fn max_def_level(&self) -> i16 {
    self.max_def_level
  }

  pub fn max_rep_level(&self) -> i16 {
    self.max_rep_level
  }

  pub fn physical_type(&self) -> PhysicalType {
    self.primitive_type.physical_type()
  }

  /// The leaf's own declared repetition (as opposed to `max_rep_level`,
  /// which also reflects repeated ancestors). Used by the conversion
  /// planner to decide whether a missing column is synthesized as a
  /// zero-payload required value or a null optional one (§4.7).
  pub fn repetition(&self) -> Repetition {
    self.primitive_type.repetition()
  }

  pub fn type_length(&self) -> i32 {
    self.primitive_type.type_length()
  }

  pub fn logical_type(&self) -> LogicalType {
    self.primitive_type.logical_type()
  }

  pub fn path(&self) -> &ColumnPath {
    &self.path
  }

  pub fn name(&self) -> &str {
    self.primitive_type.name()
  }

  pub fn self_type(&self) -> Option<&Rc<Type>> {
    self.self_type.as_ref()
  }
}

/// Flattens a schema's root group into `ColumnDescriptor`s via a
/// left-to-right depth-first traversal (§3 "Each leaf has an immutable
/// columnIndex assigned by a left-to-right depth-first traversal").
pub struct SchemaDescriptor {
  root: Rc<Type>,
  leaves: Vec<ColumnDescPtr>
}

impl SchemaDescriptor {
  pub fn new(root: Rc<Type>) -> Self {
    let mut leaves = Vec::new();
    build_leaves(&root, 0, 0, &ColumnPath::new(Vec::new()), &mut leaves);
    SchemaDescriptor { root: root, leaves: leaves }
  }

  pub fn root_schema(&self) -> &Type {
    &self.root
  }

  /// Same node as `root_schema()`, sharing the `Rc` — needed wherever a
  /// footer or schema-conversion plan must outlive the descriptor itself.
  pub fn root_schema_ptr(&self) -> Rc<Type> {
    self.root.clone()
  }

  pub fn num_columns(&self) -> usize {
    self.leaves.len()
  }

  pub fn column(&self, i: usize) -> ColumnDescPtr {
    self.leaves[i].clone()
  }

  pub fn columns(&self) -> &[ColumnDescPtr] {
    &self.leaves
  }
}

fn build_leaves(node: &Rc<Type>,
                 parent_max_def: i16,
                 parent_max_rep: i16,
                 parent_path: &ColumnPath,
                 out: &mut Vec<ColumnDescPtr>) {
  let max_def = parent_max_def
    + match node.repetition() {
      Repetition::OPTIONAL | Repetition::REPEATED => 1,
      Repetition::REQUIRED => 0
    };
  let max_rep = parent_max_rep + if node.repetition() == Repetition::REPEATED { 1 } else { 0 };
  let path = parent_path.append(node.name());

  match **node {
    Type::Primitive { .. } => {
      out.push(Rc::new(ColumnDescriptor::new(node.clone(), Some(node.clone()), max_def, max_rep, path)));
    },
    Type::Group { ref fields, .. } => {
      for field in fields {
        build_leaves(field, max_def, max_rep, &path, out);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use basic::Repetition;

  fn leaf(name: &str, repetition: Repetition) -> Rc<Type> {
    Rc::new(
      Type::primitive_type_builder(name, PhysicalType::INT32)
        .with_repetition(repetition)
        .build()
        .unwrap()
    )
  }

  #[test]
  fn test_column_indexes_assigned_depth_first() {
    let a = leaf("a", Repetition::REQUIRED);
    let b = leaf("b", Repetition::OPTIONAL);
    let root = Rc::new(
      Type::group_type_builder("root")
        .with_fields(&mut vec![a, b])
        .build()
        .unwrap()
    );
    let schema = SchemaDescriptor::new(root);
    assert_eq!(schema.num_columns(), 2);
    assert_eq!(schema.column(0).name(), "a");
    assert_eq!(schema.column(0).max_def_level(), 0);
    assert_eq!(schema.column(1).name(), "b");
    assert_eq!(schema.column(1).max_def_level(), 1);
  }

  #[test]
  fn test_nested_repeated_increments_max_rep() {
    let leaf_ty = leaf("value", Repetition::REQUIRED);
    let list_group = Rc::new(
      Type::group_type_builder("list")
        .with_repetition(Repetition::REPEATED)
        .with_fields(&mut vec![leaf_ty])
        .build()
        .unwrap()
    );
    let root = Rc::new(
      Type::group_type_builder("root")
        .with_fields(&mut vec![list_group])
        .build()
        .unwrap()
    );
    let schema = SchemaDescriptor::new(root);
    assert_eq!(schema.column(0).max_rep_level(), 1);
    assert_eq!(schema.column(0).max_def_level(), 1);
    assert_eq!(schema.column(0).path().string(), "list.value");
  }

  #[test]
  fn test_fixed_len_byte_array_requires_length() {
    let err = Type::primitive_type_builder("f", PhysicalType::FIXED_LEN_BYTE_ARRAY).build();
    assert!(err.is_err());
  }
}
