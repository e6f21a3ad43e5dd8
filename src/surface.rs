//! Stride-aware RGBA pixel buffers.
//!
//! A [`RasterImage`] owns a contiguous byte buffer of 8-bit premultiplied
//! RGBA pixels. Rows are `stride` bytes apart and `stride` may exceed
//! `width * 4`; the padding bytes belong to the buffer but are never exposed
//! through the row accessors.
//!
//! All pixel access goes through [`RasterImage::row`] / [`RasterImage::row_mut`],
//! which slice exactly `width * 4` bytes out of the buffer, so a bad row or
//! column index panics instead of reading a neighbour's memory.
//!
//! Buffers are allocated with [`Vec::try_reserve_exact`]: a failed allocation
//! surfaces as [`ScaleError::AllocationFailure`] rather than aborting.

use crate::scale::ScaleError;
use serde::{Deserialize, Serialize};

/// Bytes per RGBA pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Dimensions of the image an image was first derived from.
///
/// Set by the first scale and carried unchanged through every following one,
/// so a thumbnail of a thumbnail still knows the size of the original.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub original_width: Option<u32>,
    pub original_height: Option<u32>,
}

impl Metadata {
    /// Metadata for an image derived from one of `width` x `height`.
    ///
    /// Values already present are kept; only missing ones are filled in.
    pub fn inherit(&self, width: u32, height: u32) -> Metadata {
        Metadata {
            original_width: self.original_width.or(Some(width)),
            original_height: self.original_height.or(Some(height)),
        }
    }
}

/// An owned 8-bit premultiplied RGBA image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
    metadata: Metadata,
}

fn checked_len(width: u32, height: u32, stride: usize) -> Result<usize, ScaleError> {
    stride
        .checked_mul(height as usize)
        .ok_or(ScaleError::AllocationFailure { width, height })
}

fn alloc_zeroed(len: usize, width: u32, height: u32) -> Result<Vec<u8>, ScaleError> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| ScaleError::AllocationFailure { width, height })?;
    data.resize(len, 0);
    Ok(data)
}

impl RasterImage {
    /// Allocate a transparent black image with a tight stride.
    pub fn new(width: u32, height: u32) -> Result<Self, ScaleError> {
        let stride = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .ok_or(ScaleError::AllocationFailure { width, height })?;
        Self::with_stride(width, height, stride)
    }

    /// Allocate a transparent black image whose rows are `stride` bytes apart.
    pub fn with_stride(width: u32, height: u32, stride: usize) -> Result<Self, ScaleError> {
        if width == 0 || height == 0 {
            return Err(ScaleError::InvalidDimensions { width, height });
        }
        let min_stride = width as usize * BYTES_PER_PIXEL;
        if stride < min_stride {
            return Err(ScaleError::InvalidStride {
                stride,
                min: min_stride,
            });
        }
        let len = checked_len(width, height, stride)?;
        Ok(Self {
            width,
            height,
            stride,
            data: alloc_zeroed(len, width, height)?,
            metadata: Metadata::default(),
        })
    }

    /// Wrap an existing buffer of exactly `stride * height` bytes.
    pub fn from_raw(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, ScaleError> {
        if width == 0 || height == 0 {
            return Err(ScaleError::InvalidDimensions { width, height });
        }
        let min_stride = width as usize * BYTES_PER_PIXEL;
        if stride < min_stride {
            return Err(ScaleError::InvalidStride {
                stride,
                min: min_stride,
            });
        }
        let expected = checked_len(width, height, stride)?;
        if data.len() != expected {
            return Err(ScaleError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
            metadata: Metadata::default(),
        })
    }

    /// Convert a straight-alpha `image` buffer, premultiplying color by alpha.
    pub fn from_rgba_image(img: &image::RgbaImage) -> Result<Self, ScaleError> {
        let mut raster = Self::new(img.width(), img.height())?;
        for (y, src_row) in img.rows().enumerate() {
            let dst_row = raster.row_mut(y as u32);
            for (dst, px) in dst_row.chunks_exact_mut(BYTES_PER_PIXEL).zip(src_row) {
                let [r, g, b, a] = px.0;
                dst.copy_from_slice(&[premultiply(r, a), premultiply(g, a), premultiply(b, a), a]);
            }
        }
        Ok(raster)
    }

    /// Convert back to a straight-alpha `image` buffer.
    pub fn to_rgba_image(&self) -> image::RgbaImage {
        image::RgbaImage::from_fn(self.width, self.height, |x, y| {
            let [r, g, b, a] = self.pixel(x, y);
            image::Rgba([unpremultiply(r, a), unpremultiply(g, a), unpremultiply(b, a), a])
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Distance in bytes between the starts of two rows.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Metadata) {
        self.metadata = metadata;
    }

    /// The whole buffer, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// The `width * 4` pixel bytes of row `y`.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize * BYTES_PER_PIXEL]
    }

    /// Mutable view of the `width * 4` pixel bytes of row `y`.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y as usize * self.stride;
        let len = self.width as usize * BYTES_PER_PIXEL;
        &mut self.data[start..start + len]
    }

    /// Pixel at `(x, y)` as `[r, g, b, a]`.
    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width, "column {x} out of bounds (width {})", self.width);
        let offset = x as usize * BYTES_PER_PIXEL;
        let row = self.row(y);
        [row[offset], row[offset + 1], row[offset + 2], row[offset + 3]]
    }

    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        assert!(x < self.width, "column {x} out of bounds (width {})", self.width);
        let offset = x as usize * BYTES_PER_PIXEL;
        self.row_mut(y)[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&rgba);
    }

    /// Set every pixel to `rgba`.
    pub fn fill(&mut self, rgba: [u8; 4]) {
        for y in 0..self.height {
            for px in self.row_mut(y).chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&rgba);
            }
        }
    }

    /// Verbatim copy: same stride, same bytes, same metadata.
    ///
    /// Unlike `clone()` this reports an allocation failure as an error.
    pub fn try_clone(&self) -> Result<Self, ScaleError> {
        let mut data = alloc_zeroed(self.data.len(), self.width, self.height)?;
        data.copy_from_slice(&self.data);
        Ok(Self {
            width: self.width,
            height: self.height,
            stride: self.stride,
            data,
            metadata: self.metadata,
        })
    }

    /// Copy the `width` x `height` region whose top-left corner is `(x, y)`.
    ///
    /// The copy has a tight stride and keeps this image's metadata.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, ScaleError> {
        let fits = x
            .checked_add(width)
            .zip(y.checked_add(height))
            .is_some_and(|(right, bottom)| right <= self.width && bottom <= self.height);
        if !fits {
            return Err(ScaleError::CropOutOfBounds {
                x,
                y,
                width,
                height,
                image_width: self.width,
                image_height: self.height,
            });
        }
        let mut out = Self::new(width, height)?;
        let start = x as usize * BYTES_PER_PIXEL;
        let end = start + width as usize * BYTES_PER_PIXEL;
        for row in 0..height {
            out.row_mut(row).copy_from_slice(&self.row(y + row)[start..end]);
        }
        out.metadata = self.metadata;
        Ok(out)
    }
}

#[inline]
fn premultiply(c: u8, a: u8) -> u8 {
    ((c as u32 * a as u32 + 127) / 255) as u8
}

#[inline]
fn unpremultiply(c: u8, a: u8) -> u8 {
    if a == 0 {
        0
    } else {
        ((c as u32 * 255 + a as u32 / 2) / a as u32).min(255) as u8
    }
}
