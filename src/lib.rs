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

//! `parqcore`: a columnar, nested, typed file format core (record shredding
//! and assembly, row groups, page encodings, a binary footer and a
//! sort-then-merge writer) built around a small set of external
//! collaborator traits — `BufferPool`, `Codec`, `BloomFilter`,
//! `MetadataCodec` — each with one default implementation.
//!
//! See DESIGN.md for how each module is grounded, and the individual module
//! docs for which section of the design the module implements.

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate byteorder;
extern crate ordered_float;
extern crate try_from;
extern crate snap;
extern crate brotli;
extern crate flate2;
extern crate rand;

#[macro_use]
pub mod errors;

pub mod basic;
pub mod column;
pub mod compression;
pub mod data_type;
pub mod encodings;
pub mod file;
pub mod record;
pub mod row_group;
pub mod schema;
pub mod sorting_writer;
pub mod util;
