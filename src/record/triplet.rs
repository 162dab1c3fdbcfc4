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

//! The tagged `(value, repetition level, definition level)` triple that
//! crosses the shredder/assembler boundary (C7) for one leaf column.
//! `shredder` produces a stream of these per leaf when flattening a `Row`;
//! `assembler` consumes them, one cursor per leaf, to rebuild `Row`s.

use data_type::DataType;

#[derive(Clone, Debug, PartialEq)]
pub struct TypedTriplet<T: DataType> {
  pub value: Option<T::T>,
  pub def_level: i16,
  pub rep_level: i16
}

impl<T: DataType> TypedTriplet<T> {
  pub fn new(value: Option<T::T>, def_level: i16, rep_level: i16) -> Self {
    TypedTriplet { value: value, def_level: def_level, rep_level: rep_level }
  }

  pub fn is_null(&self) -> bool {
    self.value.is_none()
  }
}

/// Column index tag distinguishing writer-produced from reader-produced
/// values (§3 "the column index is stored bit-inverted on disk-side values
/// to distinguish origin"). `shred_rows` hands out writer-side indexes when
/// assigning a `TypedTriplet` to a leaf; `row_group::read_leaf_triples`
/// hands out reader-side indexes for the triples it decodes back off disk.
/// The two code paths never share a value, so nothing here actually needs
/// to inspect the tag at runtime today — it exists so any future code that
/// does mix the two streams (e.g. a merge/diff tool) can tell them apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnIndex(i32);

impl ColumnIndex {
  pub fn writer_side(index: usize) -> Self {
    ColumnIndex(index as i32)
  }

  pub fn reader_side(index: usize) -> Self {
    ColumnIndex(!(index as i32))
  }

  pub fn is_reader_side(&self) -> bool {
    self.0 < 0
  }

  pub fn index(&self) -> usize {
    if self.is_reader_side() { !self.0 as usize } else { self.0 as usize }
  }
}

/// A decoded leaf column: every triple produced for that column across an
/// entire row group, plus a read cursor. `assembler::RowAssembler` holds one
/// of these per leaf and advances it while walking the schema tree.
pub struct TripletStream<T: DataType> {
  triplets: Vec<TypedTriplet<T>>,
  position: usize
}

impl<T: DataType> TripletStream<T> {
  pub fn new(triplets: Vec<TypedTriplet<T>>) -> Self {
    TripletStream { triplets: triplets, position: 0 }
  }

  pub fn len(&self) -> usize {
    self.triplets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.triplets.is_empty()
  }

  pub fn has_next(&self) -> bool {
    self.position < self.triplets.len()
  }

  /// Returns the current triple without consuming it; used to peek at the
  /// next repetition level before deciding whether another list element
  /// belongs to the row currently being assembled.
  pub fn peek(&self) -> Option<&TypedTriplet<T>> {
    self.triplets.get(self.position)
  }

  pub fn advance(&mut self) -> Option<&TypedTriplet<T>> {
    let item = self.triplets.get(self.position);
    if item.is_some() {
      self.position += 1;
    }
    item
  }
}
