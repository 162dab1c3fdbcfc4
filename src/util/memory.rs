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

//! Byte buffer primitives plus the default `BufferPool` implementation.
//!
//! `BufferPool` is the §1 external collaborator
//! (`BufferPool { get() -> RWSeekBuffer; put(RWSeekBuffer) }`); the core
//! only depends on the `BufferPool` trait, this module just ships a working
//! default so the crate is runnable standalone.

use std::cmp;
use std::io::{self, Cursor, Read, Seek, SeekFrom, Write};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use errors::Result;

/// An immutable, reference-counted view into a byte buffer. Cloning is O(1).
/// Values read out of a `ByteBufferPtr` (e.g. `ByteArray`) that must outlive
/// the buffer's producing arena MUST be deep-cloned first — see
/// `data_type::ByteArray::deep_clone` and §4.5 "Release".
#[derive(Clone, Debug)]
pub struct ByteBufferPtr {
  data: Rc<Vec<u8>>,
  start: usize,
  len: usize
}

impl ByteBufferPtr {
  pub fn new(data: Vec<u8>) -> Self {
    let len = data.len();
    ByteBufferPtr { data: Rc::new(data), start: 0, len: len }
  }

  pub fn len(&self) -> usize {
    self.len
  }

  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  pub fn all(&self) -> &[u8] {
    &self.data[self.start..self.start + self.len]
  }

  pub fn data(&self) -> &[u8] {
    self.all()
  }

  /// Returns a new `ByteBufferPtr` sharing the same backing storage,
  /// starting `offset` bytes further in.
  pub fn start_from(&self, offset: usize) -> Self {
    assert!(offset <= self.len);
    ByteBufferPtr { data: self.data.clone(), start: self.start + offset, len: self.len - offset }
  }

  /// Returns a row-aligned slice `[start, start+len)` of this buffer,
  /// sharing storage.
  pub fn range(&self, start: usize, len: usize) -> Self {
    assert!(start + len <= self.len);
    ByteBufferPtr { data: self.data.clone(), start: self.start + start, len: len }
  }
}

impl From<Vec<u8>> for ByteBufferPtr {
  fn from(v: Vec<u8>) -> Self {
    ByteBufferPtr::new(v)
  }
}

/// A growable byte buffer used while assembling a page payload.
#[derive(Clone, Debug, Default)]
pub struct ByteBuffer {
  buf: Vec<u8>
}

impl ByteBuffer {
  pub fn new() -> Self {
    ByteBuffer { buf: Vec::new() }
  }

  pub fn with_capacity(capacity: usize) -> Self {
    ByteBuffer { buf: Vec::with_capacity(capacity) }
  }

  pub fn capacity(&self) -> usize {
    self.buf.capacity()
  }

  pub fn size(&self) -> usize {
    self.buf.len()
  }

  pub fn set_data(&mut self, new_data: Vec<u8>) {
    self.buf = new_data;
  }

  pub fn data(&self) -> &[u8] {
    self.buf.as_slice()
  }

  pub fn consume(self) -> ByteBufferPtr {
    ByteBufferPtr::new(self.buf)
  }
}

impl Write for ByteBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.buf.extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> {
    Ok(())
  }
}

/// Tracks the number of bytes currently allocated by a component (dictionary,
/// column buffer, ...). Mirrors the teacher's `MemTracker`: a shared,
/// interior-mutable counter, cheap to clone and pass around.
#[derive(Debug, Default)]
pub struct MemTracker {
  bytes: Mutex<i64>
}

pub type MemTrackerPtr = Arc<MemTracker>;

impl MemTracker {
  pub fn new() -> Self {
    MemTracker { bytes: Mutex::new(0) }
  }

  pub fn new_ptr(_parent: Option<MemTrackerPtr>) -> Result<MemTrackerPtr> {
    Ok(Arc::new(MemTracker::new()))
  }

  pub fn memory_usage(&self) -> i64 {
    *self.bytes.lock().unwrap()
  }

  pub fn alloc(&self, delta: i64) {
    let mut guard = self.bytes.lock().unwrap();
    *guard += delta;
  }
}

/// A read+write+seek scratch buffer, the `RWSeekBuffer` referenced by §1's
/// `BufferPool` contract. The default implementation is an in-memory
/// `Cursor<Vec<u8>>`; a temp-file-backed pool is a drop-in alternative that
/// satisfies the same trait.
pub struct RWBuffer {
  inner: Cursor<Vec<u8>>
}

impl RWBuffer {
  pub fn new() -> Self {
    RWBuffer { inner: Cursor::new(Vec::new()) }
  }

  pub fn with_capacity(capacity: usize) -> Self {
    RWBuffer { inner: Cursor::new(Vec::with_capacity(capacity)) }
  }

  pub fn into_inner(self) -> Vec<u8> {
    self.inner.into_inner()
  }

  pub fn reset(&mut self) {
    self.inner.get_mut().clear();
    self.inner.set_position(0);
  }

  pub fn len(&self) -> usize {
    self.inner.get_ref().len()
  }
}

impl Read for RWBuffer {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    self.inner.read(buf)
  }
}

impl Write for RWBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.inner.write(buf)
  }

  fn flush(&mut self) -> io::Result<()> {
    self.inner.flush()
  }
}

impl Seek for RWBuffer {
  fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
    self.inner.seek(pos)
  }
}

/// External collaborator: a pool of reusable read/write/seek buffers shared
/// across writer/reader instances (§5 "Shared state"). Implementations MUST
/// be internally synchronized; an acquired buffer is exclusively owned by
/// the caller until it calls `put`.
pub trait BufferPool: Send + Sync {
  fn get(&self) -> RWBuffer;
  fn put(&self, buf: RWBuffer);
}

/// Default in-process pool: a `Mutex`-guarded free list. Buffers are reset
/// (not reallocated) on `put`, bounding growth to the high-water mark.
pub struct HeapBufferPool {
  free_list: Mutex<Vec<RWBuffer>>
}

impl HeapBufferPool {
  pub fn new() -> Self {
    HeapBufferPool { free_list: Mutex::new(Vec::new()) }
  }
}

impl Default for HeapBufferPool {
  fn default() -> Self {
    HeapBufferPool::new()
  }
}

impl BufferPool for HeapBufferPool {
  fn get(&self) -> RWBuffer {
    let mut list = self.free_list.lock().unwrap();
    list.pop().unwrap_or_else(RWBuffer::new)
  }

  fn put(&self, mut buf: RWBuffer) {
    buf.reset();
    let mut list = self.free_list.lock().unwrap();
    list.push(buf);
  }
}

lazy_static! {
  /// Process-wide default pool, lazily initialized on first use and never
  /// torn down (§9 "Global state").
  static ref DEFAULT_BUFFER_POOL: Arc<HeapBufferPool> = Arc::new(HeapBufferPool::new());
}

pub fn default_buffer_pool() -> Arc<HeapBufferPool> {
  DEFAULT_BUFFER_POOL.clone()
}

/// Smallest number of bytes `memcpy`'d at a time when growing a level/value
/// buffer; kept for parity with the teacher's buffer growth heuristics.
pub const MIN_BUFFER_SIZE: usize = 64;

pub fn next_capacity(current: usize, needed: usize) -> usize {
  cmp::max(needed, cmp::max(MIN_BUFFER_SIZE, current * 2))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_byte_buffer_ptr_start_from_shares_storage() {
    let buf = ByteBufferPtr::new(vec![1, 2, 3, 4, 5]);
    let tail = buf.start_from(2);
    assert_eq!(tail.all(), &[3, 4, 5]);
    assert_eq!(buf.all(), &[1, 2, 3, 4, 5]);
  }

  #[test]
  fn test_byte_buffer_ptr_range() {
    let buf = ByteBufferPtr::new(vec![1, 2, 3, 4, 5]);
    let mid = buf.range(1, 2);
    assert_eq!(mid.all(), &[2, 3]);
  }

  #[test]
  fn test_mem_tracker_alloc() {
    let tracker = MemTracker::new();
    tracker.alloc(128);
    tracker.alloc(-32);
    assert_eq!(tracker.memory_usage(), 96);
  }

  #[test]
  fn test_heap_buffer_pool_roundtrip() {
    let pool = HeapBufferPool::new();
    let mut buf = pool.get();
    buf.write(b"hello").unwrap();
    assert_eq!(buf.len(), 5);
    pool.put(buf);

    let buf2 = pool.get();
    assert_eq!(buf2.len(), 0, "buffer must be reset before reuse");
  }

  #[test]
  fn test_next_capacity_doubles() {
    assert_eq!(next_capacity(100, 50), 200);
    assert_eq!(next_capacity(10, 500), 500);
  }
}
