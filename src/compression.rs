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

//! Page-body compression (§4.11). `Codec` is an external collaborator: the
//! writer/reader only ever see `Box<Codec>`, produced by `create_codec`.

use std::io::{Read, Write};

use brotli;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzCompression;
use snap::{Reader as SnapReader, Writer as SnapWriter};

use basic::Compression as CodecType;
use errors::Result;

/// Compresses/decompresses one page body. Implementations own no state
/// across calls; a fresh `Box<Codec>` is cheap to create per column chunk.
pub trait Codec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
  fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
}

struct UncompressedCodec;

impl Codec for UncompressedCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    output.extend_from_slice(input);
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    output.extend_from_slice(input);
    Ok(())
  }
}

struct SnappyCodec;

impl Codec for SnappyCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut writer = SnapWriter::new(output);
    writer.write_all(input).map_err(|e| general_err!("Snappy compression failed: {}", e))?;
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut reader = SnapReader::new(input);
    reader.read_to_end(output).map_err(|e| general_err!("Snappy decompression failed: {}", e))?;
    Ok(())
  }
}

struct GzipCodec;

impl Codec for GzipCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut encoder = GzEncoder::new(output, GzCompression::default());
    encoder.write_all(input).map_err(|e| general_err!("Gzip compression failed: {}", e))?;
    encoder.finish().map_err(|e| general_err!("Gzip compression failed: {}", e))?;
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut decoder = GzDecoder::new(input).map_err(|e| general_err!("Gzip decompression failed: {}", e))?;
    decoder.read_to_end(output).map_err(|e| general_err!("Gzip decompression failed: {}", e))?;
    Ok(())
  }
}

struct BrotliCodec {
  quality: u32,
  lg_window_size: u32
}

impl Codec for BrotliCodec {
  fn compress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut input_cursor = input;
    brotli::BrotliCompress(&mut input_cursor,
                           output,
                           &brotli::enc::backward_references::BrotliEncoderParams {
                             quality: self.quality as i32,
                             lgwin: self.lg_window_size as i32,
                             ..Default::default()
                           })
    .map_err(|e| general_err!("Brotli compression failed: {}", e))?;
    Ok(())
  }

  fn decompress(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut input_cursor = input;
    brotli::BrotliDecompress(&mut input_cursor, output).map_err(|e| general_err!("Brotli decompression failed: {}", e))?;
    Ok(())
  }
}

/// Builds the default `Codec` for a compression kind (§1 "default
/// implementations ... provided for every external collaborator").
pub fn create_codec(codec_type: CodecType) -> Result<Box<Codec>> {
  match codec_type {
    CodecType::UNCOMPRESSED => Ok(Box::new(UncompressedCodec)),
    CodecType::SNAPPY => Ok(Box::new(SnappyCodec)),
    CodecType::GZIP => Ok(Box::new(GzipCodec)),
    CodecType::BROTLI => Ok(Box::new(BrotliCodec { quality: 9, lg_window_size: 22 }))
  }
}
