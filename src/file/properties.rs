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

//! Writer/reader configuration (§6 "Configuration options"), gathered into
//! builder structs the way the real ecosystem crate names them.

use std::collections::HashMap;

use basic::Compression;
use column::writer::DEFAULT_PAGE_SIZE;
use schema::types::ColumnPath;

/// Default cap on rows per row group; the real ecosystem crate defaults to
/// roughly the same order of magnitude.
pub const DEFAULT_MAX_ROW_GROUP_LENGTH: usize = 1024 * 1024;

/// One entry of `sorting_columns` (§6).
#[derive(Clone, Debug, PartialEq)]
pub struct SortingColumn {
  pub path: ColumnPath,
  pub descending: bool,
  pub nulls_first: bool
}

impl SortingColumn {
  pub fn new(path: ColumnPath, descending: bool, nulls_first: bool) -> Self {
    SortingColumn { path: path, descending: descending, nulls_first: nulls_first }
  }
}

/// One entry of `bloom_filters` (§6): the bit budget for a configured column.
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterSpec {
  pub path: ColumnPath,
  pub num_bits: usize
}

/// Immutable, built configuration for `file::writer::SerializedFileWriter`
/// and `row_group::RowGroupWriter`. Build one via `WriterProperties::builder()`.
#[derive(Clone, Debug)]
pub struct WriterProperties {
  data_page_size: usize,
  max_row_group_length: usize,
  dictionary_enabled_default: bool,
  dictionary_overrides: HashMap<ColumnPath, bool>,
  sorting_columns: Vec<SortingColumn>,
  drop_duplicated_rows: bool,
  bloom_filters: Vec<BloomFilterSpec>,
  skip_page_bounds: Vec<ColumnPath>,
  deprecated_data_page_statistics: bool,
  key_value_metadata: Vec<(String, String)>,
  codec: Compression,
  created_by: Option<String>
}

impl WriterProperties {
  pub fn builder() -> WriterPropertiesBuilder {
    WriterPropertiesBuilder::new()
  }

  pub fn data_page_size(&self) -> usize {
    self.data_page_size
  }

  pub fn max_row_group_length(&self) -> usize {
    self.max_row_group_length
  }

  pub fn dictionary_enabled(&self, path: &ColumnPath) -> bool {
    *self.dictionary_overrides.get(path).unwrap_or(&self.dictionary_enabled_default)
  }

  pub fn sorting_columns(&self) -> &[SortingColumn] {
    &self.sorting_columns
  }

  pub fn drop_duplicated_rows(&self) -> bool {
    self.drop_duplicated_rows
  }

  pub fn bloom_filter_spec(&self, path: &ColumnPath) -> Option<&BloomFilterSpec> {
    self.bloom_filters.iter().find(|s| &s.path == path)
  }

  pub fn skip_page_bounds(&self, path: &ColumnPath) -> bool {
    self.skip_page_bounds.iter().any(|p| p == path)
  }

  pub fn deprecated_data_page_statistics(&self) -> bool {
    self.deprecated_data_page_statistics
  }

  pub fn key_value_metadata(&self) -> &[(String, String)] {
    &self.key_value_metadata
  }

  pub fn codec(&self) -> Compression {
    self.codec
  }

  pub fn created_by(&self) -> Option<&str> {
    self.created_by.as_ref().map(|s| s.as_str())
  }
}

/// Builder for `WriterProperties`, mirroring the teacher's builder style
/// (see `schema::types::PrimitiveTypeBuilder`).
pub struct WriterPropertiesBuilder {
  data_page_size: usize,
  max_row_group_length: usize,
  dictionary_enabled_default: bool,
  dictionary_overrides: HashMap<ColumnPath, bool>,
  sorting_columns: Vec<SortingColumn>,
  drop_duplicated_rows: bool,
  bloom_filters: Vec<BloomFilterSpec>,
  skip_page_bounds: Vec<ColumnPath>,
  deprecated_data_page_statistics: bool,
  key_value_metadata: Vec<(String, String)>,
  codec: Compression,
  created_by: Option<String>
}

impl WriterPropertiesBuilder {
  fn new() -> Self {
    WriterPropertiesBuilder {
      data_page_size: DEFAULT_PAGE_SIZE,
      max_row_group_length: DEFAULT_MAX_ROW_GROUP_LENGTH,
      dictionary_enabled_default: true,
      dictionary_overrides: HashMap::new(),
      sorting_columns: Vec::new(),
      drop_duplicated_rows: false,
      bloom_filters: Vec::new(),
      skip_page_bounds: Vec::new(),
      deprecated_data_page_statistics: false,
      key_value_metadata: Vec::new(),
      codec: Compression::UNCOMPRESSED,
      created_by: Some(format!("parqcore version {}", env!("CARGO_PKG_VERSION")))
    }
  }

  pub fn set_data_page_size(mut self, value: usize) -> Self {
    self.data_page_size = value;
    self
  }

  pub fn set_max_row_group_length(mut self, value: usize) -> Self {
    self.max_row_group_length = value;
    self
  }

  pub fn set_dictionary_enabled(mut self, value: bool) -> Self {
    self.dictionary_enabled_default = value;
    self
  }

  pub fn set_column_dictionary_enabled(mut self, path: ColumnPath, value: bool) -> Self {
    self.dictionary_overrides.insert(path, value);
    self
  }

  pub fn set_sorting_columns(mut self, columns: Vec<SortingColumn>) -> Self {
    self.sorting_columns = columns;
    self
  }

  pub fn set_drop_duplicated_rows(mut self, value: bool) -> Self {
    self.drop_duplicated_rows = value;
    self
  }

  pub fn add_bloom_filter(mut self, spec: BloomFilterSpec) -> Self {
    self.bloom_filters.push(spec);
    self
  }

  pub fn set_skip_page_bounds(mut self, path: ColumnPath) -> Self {
    self.skip_page_bounds.push(path);
    self
  }

  pub fn set_deprecated_data_page_statistics(mut self, value: bool) -> Self {
    self.deprecated_data_page_statistics = value;
    self
  }

  pub fn set_key_value_metadata(mut self, kv: Vec<(String, String)>) -> Self {
    self.key_value_metadata = kv;
    self
  }

  pub fn set_codec(mut self, codec: Compression) -> Self {
    self.codec = codec;
    self
  }

  pub fn set_created_by(mut self, created_by: String) -> Self {
    self.created_by = Some(created_by);
    self
  }

  pub fn build(self) -> WriterProperties {
    WriterProperties {
      data_page_size: self.data_page_size,
      max_row_group_length: self.max_row_group_length,
      dictionary_enabled_default: self.dictionary_enabled_default,
      dictionary_overrides: self.dictionary_overrides,
      sorting_columns: self.sorting_columns,
      drop_duplicated_rows: self.drop_duplicated_rows,
      bloom_filters: self.bloom_filters,
      skip_page_bounds: self.skip_page_bounds,
      deprecated_data_page_statistics: self.deprecated_data_page_statistics,
      key_value_metadata: self.key_value_metadata,
      codec: self.codec,
      created_by: self.created_by
    }
  }
}

impl Default for WriterProperties {
  fn default() -> Self {
    WriterProperties::builder().build()
  }
}

/// Reader-side configuration. Currently only the batch size used by
/// `file::reader::SerializedFileReader` when materializing rows out of a
/// row group; kept as its own struct so call sites read symmetrically with
/// `WriterProperties` and so later options (e.g. a column projection list)
/// have somewhere to live without changing the `Reader` entry point.
#[derive(Clone, Debug)]
pub struct ReaderProperties {
  batch_size: usize
}

impl ReaderProperties {
  pub fn builder() -> ReaderPropertiesBuilder {
    ReaderPropertiesBuilder::new()
  }

  pub fn batch_size(&self) -> usize {
    self.batch_size
  }
}

impl Default for ReaderProperties {
  fn default() -> Self {
    ReaderProperties::builder().build()
  }
}

pub struct ReaderPropertiesBuilder {
  batch_size: usize
}

impl ReaderPropertiesBuilder {
  fn new() -> Self {
    ReaderPropertiesBuilder { batch_size: 1024 }
  }

  pub fn set_batch_size(mut self, value: usize) -> Self {
    self.batch_size = value;
    self
  }

  pub fn build(self) -> ReaderProperties {
    ReaderProperties { batch_size: self.batch_size }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let props = WriterProperties::default();
    assert_eq!(props.data_page_size(), DEFAULT_PAGE_SIZE);
    assert!(props.dictionary_enabled(&ColumnPath::new(vec!["a".to_string()])));
    assert!(!props.drop_duplicated_rows());
  }

  #[test]
  fn test_per_column_dictionary_override() {
    let path = ColumnPath::new(vec!["a".to_string()]);
    let props = WriterProperties::builder()
      .set_dictionary_enabled(true)
      .set_column_dictionary_enabled(path.clone(), false)
      .build();
    assert!(!props.dictionary_enabled(&path));
    assert!(props.dictionary_enabled(&ColumnPath::new(vec!["b".to_string()])));
  }

  #[test]
  fn test_sorting_columns_roundtrip() {
    let path = ColumnPath::new(vec!["id".to_string()]);
    let props = WriterProperties::builder()
      .set_sorting_columns(vec![SortingColumn::new(path.clone(), false, true)])
      .build();
    assert_eq!(props.sorting_columns().len(), 1);
    assert_eq!(props.sorting_columns()[0].path, path);
  }
}
