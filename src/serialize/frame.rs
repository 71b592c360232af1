//! The `Frame` primitive shared by both serialization transports: a
//! sequence of typed frames `(format_string, item_size, n_items, bytes)`
//! suitable for zero-copy export.
//!
//! Safe Rust has no exported raw pointer to hand a host language, so each
//! `Frame` owns its bytes; `get_py_buffer` callers that want a literal
//! pointer take `frame.data.as_ptr()` themselves.

use crate::error::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

/// One column's worth of serialized data.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// A short tag identifying the element format, e.g. `"i32"`, `"u8"`,
    /// `"f32"`, `"bytes"`. Mirrors the struct-module format character the
    /// spec's "format_string" refers to.
    pub format: String,
    pub item_size: usize,
    pub n_items: usize,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn from_u8_vec(format: &str, item_size: usize, values: &[u8]) -> Self {
        Frame {
            format: format.to_string(),
            item_size,
            n_items: values.len() / item_size.max(1),
            data: values.to_vec(),
        }
    }

    pub fn scalar_i32(v: i32) -> Self {
        Frame {
            format: "i32".into(),
            item_size: 4,
            n_items: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    pub fn scalar_u64(v: u64) -> Self {
        Frame {
            format: "u64".into(),
            item_size: 8,
            n_items: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    pub fn scalar_u8(v: u8) -> Self {
        Frame {
            format: "u8".into(),
            item_size: 1,
            n_items: 1,
            data: vec![v],
        }
    }

    pub fn scalar_u32(v: u32) -> Self {
        Frame {
            format: "u32".into(),
            item_size: 4,
            n_items: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    pub fn scalar_f32(v: f32) -> Self {
        Frame {
            format: "f32".into(),
            item_size: 4,
            n_items: 1,
            data: v.to_le_bytes().to_vec(),
        }
    }

    pub fn vec_i32(values: &[i32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for &v in values {
            data.write_i32::<LittleEndian>(v).unwrap();
        }
        Frame {
            format: "i32".into(),
            item_size: 4,
            n_items: values.len(),
            data,
        }
    }

    pub fn vec_u32(values: &[u32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for &v in values {
            data.write_u32::<LittleEndian>(v).unwrap();
        }
        Frame {
            format: "u32".into(),
            item_size: 4,
            n_items: values.len(),
            data,
        }
    }

    pub fn vec_u64(values: &[u64]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for &v in values {
            data.write_u64::<LittleEndian>(v).unwrap();
        }
        Frame {
            format: "u64".into(),
            item_size: 8,
            n_items: values.len(),
            data,
        }
    }

    pub fn vec_u8_bool(values: &[bool]) -> Self {
        let data: Vec<u8> = values.iter().map(|&b| b as u8).collect();
        Frame {
            format: "u8".into(),
            item_size: 1,
            n_items: values.len(),
            data,
        }
    }

    pub fn vec_f32(values: &[f32]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 4);
        for &v in values {
            data.write_f32::<LittleEndian>(v).unwrap();
        }
        Frame {
            format: "f32".into(),
            item_size: 4,
            n_items: values.len(),
            data,
        }
    }

    pub fn vec_f64(values: &[f64]) -> Self {
        let mut data = Vec::with_capacity(values.len() * 8);
        for &v in values {
            data.write_f64::<LittleEndian>(v).unwrap();
        }
        Frame {
            format: "f64".into(),
            item_size: 8,
            n_items: values.len(),
            data,
        }
    }

    pub fn bytes(values: &[u8]) -> Self {
        Frame {
            format: "bytes".into(),
            item_size: 1,
            n_items: values.len(),
            data: values.to_vec(),
        }
    }

    // -- decoders --

    pub fn as_i32(&self) -> Result<i32> {
        self.expect_format("i32", 4, 1)?;
        Ok((&self.data[..]).read_i32::<LittleEndian>()?)
    }

    pub fn as_u64(&self) -> Result<u64> {
        self.expect_format("u64", 8, 1)?;
        Ok((&self.data[..]).read_u64::<LittleEndian>()?)
    }

    pub fn as_u8(&self) -> Result<u8> {
        self.expect_format("u8", 1, 1)?;
        Ok(self.data[0])
    }

    pub fn as_u32(&self) -> Result<u32> {
        self.expect_format("u32", 4, 1)?;
        Ok((&self.data[..]).read_u32::<LittleEndian>()?)
    }

    pub fn as_f32(&self) -> Result<f32> {
        self.expect_format("f32", 4, 1)?;
        Ok((&self.data[..]).read_f32::<LittleEndian>()?)
    }

    pub fn as_i32_vec(&self) -> Result<Vec<i32>> {
        self.expect_item_size("i32", 4)?;
        let mut rdr = &self.data[..];
        (0..self.n_items).map(|_| Ok(rdr.read_i32::<LittleEndian>()?)).collect()
    }

    pub fn as_u32_vec(&self) -> Result<Vec<u32>> {
        self.expect_item_size("u32", 4)?;
        let mut rdr = &self.data[..];
        (0..self.n_items).map(|_| Ok(rdr.read_u32::<LittleEndian>()?)).collect()
    }

    pub fn as_u64_vec(&self) -> Result<Vec<u64>> {
        self.expect_item_size("u64", 8)?;
        let mut rdr = &self.data[..];
        (0..self.n_items).map(|_| Ok(rdr.read_u64::<LittleEndian>()?)).collect()
    }

    pub fn as_bool_vec(&self) -> Result<Vec<bool>> {
        self.expect_item_size("u8", 1)?;
        Ok(self.data.iter().map(|&b| b != 0).collect())
    }

    pub fn as_f32_vec(&self) -> Result<Vec<f32>> {
        self.expect_item_size("f32", 4)?;
        let mut rdr = &self.data[..];
        (0..self.n_items).map(|_| Ok(rdr.read_f32::<LittleEndian>()?)).collect()
    }

    pub fn as_f64_vec(&self) -> Result<Vec<f64>> {
        self.expect_item_size("f64", 8)?;
        let mut rdr = &self.data[..];
        (0..self.n_items).map(|_| Ok(rdr.read_f64::<LittleEndian>()?)).collect()
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.expect_format("bytes", 1, self.n_items)?;
        Ok(&self.data)
    }

    /// Decode a raw `u8`-tagged frame (as produced by [`Frame::from_u8_vec`]
    /// with format `"u8"`), used for closed-enum columns packed one byte per
    /// element.
    pub fn as_u8_vec(&self) -> Result<&[u8]> {
        self.expect_item_size("u8", 1)?;
        Ok(&self.data)
    }

    fn expect_format(&self, format: &str, item_size: usize, n_items: usize) -> Result<()> {
        if self.format != format || self.item_size != item_size || self.n_items != n_items {
            return Err(Error::Serialization(format!(
                "frame mismatch: expected {} x{} (n={}), got {} x{} (n={})",
                format, item_size, n_items, self.format, self.item_size, self.n_items
            )));
        }
        Ok(())
    }

    fn expect_item_size(&self, format: &str, item_size: usize) -> Result<()> {
        if self.format != format || self.item_size != item_size {
            return Err(Error::Serialization(format!(
                "frame mismatch: expected {} x{}, got {} x{}",
                format, item_size, self.format, self.item_size
            )));
        }
        Ok(())
    }
}

/// A cursor over an ordered frame sequence, used to decode the fixed field
/// order both transports share.
pub struct FrameCursor<'a> {
    frames: &'a [Frame],
    pos: usize,
}

impl<'a> FrameCursor<'a> {
    pub fn new(frames: &'a [Frame]) -> Self {
        FrameCursor { frames, pos: 0 }
    }

    pub fn next(&mut self) -> Result<&'a Frame> {
        let f = self
            .frames
            .get(self.pos)
            .ok_or_else(|| Error::Serialization("truncated frame sequence".into()))?;
        self.pos += 1;
        Ok(f)
    }

    pub fn finished(&self) -> bool {
        self.pos == self.frames.len()
    }
}
