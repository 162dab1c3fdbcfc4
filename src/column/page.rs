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

//! Pages (C6): the immutable, on-wire unit exchanged between the column
//! writer/reader and the row-group layer. `Page` mirrors the historical
//! `DataPage`/`DictionaryPage` framing (encoding + raw level/value bytes);
//! the higher-level decoded-value view from §4.5 (bounds, row slicing) is
//! computed directly in `column::reader::ColumnReaderImpl` once a `Page`
//! has been through a `Decoder<T>`, rather than through a separate
//! materialized type.

use basic::Encoding;
use errors::Result;
use util::memory::ByteBufferPtr;

/// Wire-level page. `DataPage` carries repetition/definition level bytes
/// inline, ahead of the value bytes, exactly as laid out on disk (§6 "File
/// format": `[repLevels][defLevels][compressed(values)]`); this module does
/// not compress, that happens in `file::writer`/`file::reader`.
#[derive(Clone, Debug)]
pub enum Page {
  DataPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    def_level_encoding: Encoding,
    rep_level_encoding: Encoding
  },
  DictionaryPage {
    buf: ByteBufferPtr,
    num_values: u32,
    encoding: Encoding,
    is_sorted: bool
  }
}

impl Page {
  pub fn encoding(&self) -> Encoding {
    match *self {
      Page::DataPage { encoding, .. } => encoding,
      Page::DictionaryPage { encoding, .. } => encoding
    }
  }

  pub fn num_values(&self) -> u32 {
    match *self {
      Page::DataPage { num_values, .. } => num_values,
      Page::DictionaryPage { num_values, .. } => num_values
    }
  }

  pub fn buffer(&self) -> &ByteBufferPtr {
    match *self {
      Page::DataPage { ref buf, .. } => buf,
      Page::DictionaryPage { ref buf, .. } => buf
    }
  }
}

/// Sequential page source for one column chunk, handed to `ColumnReaderImpl`
/// (C7's reader side). Dictionary pages precede data pages, never repeat.
pub trait PageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>>;
}

/// In-memory `PageReader` over a fixed sequence of pages, also useful as the
/// default reader a `row_group` hands a consumer once pages have been read
/// off disk and buffered.
pub struct InMemoryPageReader {
  pages: ::std::vec::IntoIter<Page>
}

impl InMemoryPageReader {
  pub fn new(pages: Vec<Page>) -> Self {
    InMemoryPageReader { pages: pages.into_iter() }
  }
}

impl PageReader for InMemoryPageReader {
  fn get_next_page(&mut self) -> Result<Option<Page>> {
    Ok(self.pages.next())
  }
}
