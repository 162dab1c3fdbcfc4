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

//! Common error type and macros shared across the crate.

use std::error::Error;
use std::fmt;
use std::io;

quick_error! {
  /// Set of errors that can be produced by any part of the core.
  ///
  /// `EOF` is not a failure: callers use it to detect the natural end of a
  /// value iterator and must not treat it as a hard error.
  #[derive(Debug)]
  pub enum ParquetError {
    /// Footer magic mismatch, header decode failure, page length mismatch, ...
    InvalidFormat(message: String) {
      display("Invalid format: {}", message)
      description(message)
    }
    /// An unresolvable schema-to-schema conversion, e.g. a required target
    /// column with no sibling donor and no plausible zero value.
    SchemaMismatch(message: String) {
      display("Schema mismatch: {}", message)
      description(message)
    }
    /// Slice indices, negative seek, value exceeding column capacity.
    OutOfRange(message: String) {
      display("Out of range: {}", message)
      description(message)
    }
    /// General-purpose failure that does not fit the other variants.
    General(message: String) {
      display("Parquet error: {}", message)
      description(message)
    }
    /// Not yet implemented.
    NYI(message: String) {
      display("NYI: {}", message)
      description(message)
    }
    /// Propagated from the underlying byte stream.
    IO(err: String) {
      display("IO error: {}", err)
      description(err)
    }
    /// Normal termination of a value iterator. Not fatal.
    EOF(message: String) {
      display("End of stream: {}", message)
      description(message)
    }
  }
}

impl From<io::Error> for ParquetError {
  fn from(e: io::Error) -> ParquetError {
    ParquetError::IO(e.description().to_string())
  }
}

impl From<fmt::Error> for ParquetError {
  fn from(e: fmt::Error) -> ParquetError {
    ParquetError::General(format!("{}", e))
  }
}

pub type Result<T> = ::std::result::Result<T, ParquetError>;

// ----------------------------------------------------------------------
// Error building macros

macro_rules! general_err {
  ($fmt:expr) => (::errors::ParquetError::General($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (::errors::ParquetError::General(format!($fmt, $($args),*)));
}

macro_rules! nyi_err {
  ($fmt:expr) => (::errors::ParquetError::NYI($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (::errors::ParquetError::NYI(format!($fmt, $($args),*)));
}

macro_rules! eof_err {
  ($fmt:expr) => (::errors::ParquetError::EOF($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (::errors::ParquetError::EOF(format!($fmt, $($args),*)));
}

macro_rules! range_err {
  ($fmt:expr) => (::errors::ParquetError::OutOfRange($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (::errors::ParquetError::OutOfRange(format!($fmt, $($args),*)));
}

macro_rules! schema_err {
  ($fmt:expr) => (::errors::ParquetError::SchemaMismatch($fmt.to_owned()));
  ($fmt:expr, $($args:expr),*) => (::errors::ParquetError::SchemaMismatch(format!($fmt, $($args),*)));
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parquet_error_display() {
    let err = general_err!("custom {}", "message");
    assert_eq!(format!("{}", err), "Parquet error: custom message");

    let err: ParquetError = io::Error::new(io::ErrorKind::NotFound, "missing").into();
    assert!(format!("{}", err).starts_with("IO error"));
  }

  #[test]
  fn test_eof_is_distinct_general() {
    let eof = eof_err!("done");
    match eof {
      ParquetError::EOF(_) => {},
      _ => panic!("expected EOF variant")
    }
  }
}
