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

//! Basic enums shared across the schema, encodings and file layers:
//! physical type, repetition, logical type, value encoding and compression
//! codec.

use std::fmt;
use std::str::FromStr;

use errors::ParquetError;

/// Physical type of a leaf column, as stored on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Type {
  BOOLEAN,
  INT32,
  INT64,
  INT96,
  FLOAT,
  DOUBLE,
  BYTE_ARRAY,
  FIXED_LEN_BYTE_ARRAY
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Repetition-kind of a schema node (§3 Schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repetition {
  /// Every instance of the parent carries exactly one subtree.
  REQUIRED,
  /// Zero or one.
  OPTIONAL,
  /// Any count.
  REPEATED
}

impl fmt::Display for Repetition {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Logical type annotation carried by a leaf (and occasionally a group, for
/// LIST/MAP wrappers).
#[derive(Debug, Clone, PartialEq)]
#[allow(non_camel_case_types)]
pub enum LogicalType {
  NONE,
  UTF8,
  MAP,
  MAP_KEY_VALUE,
  LIST,
  ENUM,
  DECIMAL { precision: i32, scale: i32 },
  DATE,
  TIME_MILLIS,
  TIME_MICROS,
  TIMESTAMP_MILLIS,
  TIMESTAMP_MICROS,
  /// `timestamp(unit, is_adjusted_to_utc)` — generalizes the MILLIS/MICROS
  /// variants above for unit/adjustment combinations not otherwise named.
  TIMESTAMP { unit: TimeUnit, is_adjusted_to_utc: bool },
  TIME { unit: TimeUnit, is_adjusted_to_utc: bool },
  UINT_8,
  UINT_16,
  UINT_32,
  UINT_64,
  INT_8,
  INT_16,
  INT_32,
  INT_64,
  /// Generalized `int(bit_width, is_signed)`.
  INTEGER { bit_width: i32, is_signed: bool },
  JSON,
  BSON,
  INTERVAL,
  UUID,
  VARIANT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnit {
  MILLIS,
  MICROS,
  NANOS
}

impl TimeUnit {
  /// Ratio, in units per second, used by the `timestamp`/`time` unit
  /// conversion rule in §4.7.
  pub fn units_per_second(&self) -> i64 {
    match *self {
      TimeUnit::MILLIS => 1_000,
      TimeUnit::MICROS => 1_000_000,
      TimeUnit::NANOS => 1_000_000_000
    }
  }
}

impl fmt::Display for LogicalType {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Low-level value encoding. Concrete codecs for these are an external
/// collaborator (see `encodings` module); only `PLAIN` and `RLE`-family
/// encodings are wired up with working (de)coders in this crate, the rest
/// are recognized for round-tripping metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Encoding {
  PLAIN,
  PLAIN_DICTIONARY,
  RLE,
  RLE_DICTIONARY,
  BIT_PACKED,
  DELTA_BINARY_PACKED,
  DELTA_LENGTH_BYTE_ARRAY,
  DELTA_BYTE_ARRAY,
  BYTE_STREAM_SPLIT
}

impl fmt::Display for Encoding {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Compression codec selector. Concrete codecs live in `compression.rs` and
/// are consumed through the `Codec` trait; this core never calls into
/// `snap`/`brotli`/`flate2` except from the default implementations there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum Compression {
  UNCOMPRESSED,
  SNAPPY,
  GZIP,
  BROTLI
}

impl fmt::Display for Compression {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{:?}", self)
  }
}

impl FromStr for Compression {
  type Err = ParquetError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_uppercase().as_str() {
      "UNCOMPRESSED" | "" => Ok(Compression::UNCOMPRESSED),
      "SNAPPY" => Ok(Compression::SNAPPY),
      "GZIP" => Ok(Compression::GZIP),
      "BROTLI" => Ok(Compression::BROTLI),
      other => Err(general_err!("Unknown compression codec tag: {}", other))
    }
  }
}

/// Ordering policy used when sorting a nullable column (§3 Optional wrapper).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
  NullsFirst,
  NullsLast
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_compression_from_str() {
    assert_eq!(Compression::from_str("snappy").unwrap(), Compression::SNAPPY);
    assert_eq!(Compression::from_str("GZIP").unwrap(), Compression::GZIP);
    assert_eq!(Compression::from_str("").unwrap(), Compression::UNCOMPRESSED);
    assert!(Compression::from_str("lz4").is_err());
  }

  #[test]
  fn test_time_unit_ratio() {
    assert_eq!(TimeUnit::MILLIS.units_per_second(), 1_000);
    assert_eq!(TimeUnit::MICROS.units_per_second(), 1_000_000);
    assert_eq!(TimeUnit::NANOS.units_per_second(), 1_000_000_000);
  }

  #[test]
  fn test_display_impls_are_debug_based() {
    assert_eq!(format!("{}", Type::INT32), "INT32");
    assert_eq!(format!("{}", Repetition::OPTIONAL), "OPTIONAL");
    assert_eq!(format!("{}", Encoding::RLE_DICTIONARY), "RLE_DICTIONARY");
  }
}
