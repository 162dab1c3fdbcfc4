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

//! Native Rust representations of each physical type (C1 Value model) plus
//! the `DataType` marker traits used to monomorphize column buffers,
//! encoders and decoders per physical kind (C3).

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::rc::Rc;

use basic::Type;

/// A reference-counted, immutable byte payload. Cloning is O(1) (shares the
/// backing `Rc<Vec<u8>>`) up until the owner needs an independent copy (e.g.
/// crossing a page-release boundary, see `util::memory::ByteBufferPtr`).
#[derive(Clone, Debug, Default)]
pub struct ByteArray {
  data: Option<Rc<Vec<u8>>>
}

impl ByteArray {
  pub fn new(data: Vec<u8>) -> Self {
    ByteArray { data: Some(Rc::new(data)) }
  }

  pub fn data(&self) -> &[u8] {
    self.data.as_ref().map(|v| v.as_slice()).unwrap_or(&[])
  }

  pub fn len(&self) -> usize {
    self.data().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns an independent deep copy, severing the shared `Rc`. Required
  /// whenever a byte-array value must outlive the page/buffer arena that
  /// produced it (§4.5 "Release").
  pub fn deep_clone(&self) -> Self {
    ByteArray::new(self.data().to_vec())
  }
}

impl From<Vec<u8>> for ByteArray {
  fn from(v: Vec<u8>) -> Self {
    ByteArray::new(v)
  }
}

impl<'a> From<&'a str> for ByteArray {
  fn from(v: &'a str) -> Self {
    ByteArray::new(v.as_bytes().to_vec())
  }
}

impl PartialEq for ByteArray {
  fn eq(&self, other: &ByteArray) -> bool {
    self.data() == other.data()
  }
}

impl Eq for ByteArray {}

impl PartialOrd for ByteArray {
  fn partial_cmp(&self, other: &ByteArray) -> Option<Ordering> {
    Some(self.data().cmp(other.data()))
  }
}

impl Ord for ByteArray {
  fn cmp(&self, other: &ByteArray) -> Ordering {
    self.data().cmp(other.data())
  }
}

impl ::std::hash::Hash for ByteArray {
  fn hash<H: ::std::hash::Hasher>(&self, state: &mut H) {
    self.data().hash(state)
  }
}

/// Fixed-length byte array. Length is carried out of band by the column
/// descriptor (`type_length`); equality/ordering only compares payload
/// bytes, matching `ByteArray`.
pub type FixedLenByteArray = ByteArray;

/// 12-byte (96 bit) integer, historically used for nanosecond-precision
/// timestamps. Stored as three little-endian `u32` words, matching the
/// on-disk layout: `[nanos_low, nanos_high, julian_day]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Int96 {
  value: [u32; 3]
}

impl Int96 {
  pub fn new(elem0: u32, elem1: u32, elem2: u32) -> Self {
    Int96 { value: [elem0, elem1, elem2] }
  }

  pub fn data(&self) -> &[u32] {
    &self.value
  }

  pub fn set_data(&mut self, elem0: u32, elem1: u32, elem2: u32) {
    self.value = [elem0, elem1, elem2];
  }
}

impl From<Vec<u32>> for Int96 {
  fn from(v: Vec<u32>) -> Self {
    assert_eq!(v.len(), 3);
    Int96::new(v[0], v[1], v[2])
  }
}

/// A wrapper over `f32` that provides a total order, used so column buffers
/// can use the same comparator machinery (`Ord`) for every physical kind,
/// including `NaN`-bearing floats (§4.2 `compare`).
pub use ordered_float::OrderedFloat;

/// Marker trait implemented once per physical kind (C3). `T::T` is the
/// native Rust value type stored by a monomorphized column buffer;
/// `get_physical_type()` recovers the runtime `basic::Type` tag so buffers,
/// pages and decoders can be dispatched dynamically at column granularity
/// (§9 "Hot-path typing").
pub trait DataType: 'static {
  type T: ::std::fmt::Debug + Default + Clone + PartialEq + PartialOrd + Send;

  fn get_physical_type() -> Type;

  /// Size in bytes of one fixed-width value; `None` for variable-length
  /// byte-array kinds.
  fn get_type_size() -> Option<usize>;

  /// Encoded byte size of one value, used to maintain
  /// `unencoded_byte_array_bytes` statistics (§4.9). Fixed-width kinds
  /// return `get_type_size()`; byte-array kinds return the value's own
  /// length.
  fn value_size(value: &Self::T) -> usize;
}

macro_rules! make_type {
  ($name:ident, $physical_ty:expr, $native_ty:ty, $size:expr) => {
    #[derive(Clone, Debug, Default, PartialEq)]
    pub struct $name {}

    impl DataType for $name {
      type T = $native_ty;

      fn get_physical_type() -> Type {
        $physical_ty
      }

      fn get_type_size() -> Option<usize> {
        $size
      }

      fn value_size(_value: &Self::T) -> usize {
        $size.expect("fixed-width type must have a type size")
      }
    }
  };
}

make_type!(BoolType, Type::BOOLEAN, bool, Some(mem::size_of::<bool>()));
make_type!(Int32Type, Type::INT32, i32, Some(mem::size_of::<i32>()));
make_type!(Int64Type, Type::INT64, i64, Some(mem::size_of::<i64>()));
make_type!(Int96Type, Type::INT96, Int96, Some(12));
make_type!(FloatType, Type::FLOAT, f32, Some(mem::size_of::<f32>()));
make_type!(DoubleType, Type::DOUBLE, f64, Some(mem::size_of::<f64>()));

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ByteArrayType {}

impl DataType for ByteArrayType {
  type T = ByteArray;

  fn get_physical_type() -> Type {
    Type::BYTE_ARRAY
  }

  fn get_type_size() -> Option<usize> {
    None
  }

  fn value_size(value: &ByteArray) -> usize {
    value.len()
  }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FixedLenByteArrayType {}

impl DataType for FixedLenByteArrayType {
  type T = FixedLenByteArray;

  fn get_physical_type() -> Type {
    Type::FIXED_LEN_BYTE_ARRAY
  }

  fn get_type_size() -> Option<usize> {
    None
  }

  fn value_size(value: &FixedLenByteArray) -> usize {
    value.len()
  }
}

impl fmt::Display for ByteArray {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self.data())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_array_eq_and_clone_shares_storage() {
    let a = ByteArray::from(vec![1u8, 2, 3]);
    let b = a.clone();
    assert_eq!(a, b);
    assert_eq!(a.data(), &[1, 2, 3]);
  }

  #[test]
  fn test_byte_array_deep_clone_is_independent() {
    let a = ByteArray::from(vec![1u8, 2, 3]);
    let b = a.deep_clone();
    assert_eq!(a, b);
    // both still equal, but `b` does not alias `a`'s Rc.
  }

  #[test]
  fn test_int96_ordering() {
    let a = Int96::new(0, 0, 100);
    let b = Int96::new(0, 0, 101);
    assert!(a < b);
  }

  #[test]
  fn test_physical_type_tags() {
    assert_eq!(Int32Type::get_physical_type(), Type::INT32);
    assert_eq!(ByteArrayType::get_physical_type(), Type::BYTE_ARRAY);
    assert_eq!(Int32Type::get_type_size(), Some(4));
    assert_eq!(ByteArrayType::get_type_size(), None);
  }
}
