//! Nearest-neighbour fast path for previews.

use super::ScaleError;
use crate::surface::{BYTES_PER_PIXEL, RasterImage};

const FIXED_SHIFT: u32 = 16;

/// Resample by picking, for every destination pixel, the source pixel under
/// the middle of its footprint.
///
/// Coordinates step in 16.16 fixed point. There is no filtering, no progress
/// reporting and no cancellation.
pub fn scale_nearest(src: &RasterImage, width: u32, height: u32) -> Result<RasterImage, ScaleError> {
    if width == 0 || height == 0 {
        return Err(ScaleError::InvalidDimensions { width, height });
    }
    let mut dst = RasterImage::new(width, height)?;
    dst.set_metadata(src.metadata().inherit(src.width(), src.height()));

    let step_x = ((src.width() as u64) << FIXED_SHIFT) / width as u64;
    let step_y = ((src.height() as u64) << FIXED_SHIFT) / height as u64;
    let max_x = src.width() as u64 - 1;
    let max_y = src.height() as u64 - 1;

    // Source byte offset of every destination column, shared by all rows
    let columns: Vec<usize> = (0..width as u64)
        .map(|dx| {
            let sx = ((step_x / 2 + dx * step_x) >> FIXED_SHIFT).min(max_x);
            sx as usize * BYTES_PER_PIXEL
        })
        .collect();

    for dy in 0..height {
        let sy = ((step_y / 2 + dy as u64 * step_y) >> FIXED_SHIFT).min(max_y);
        let src_row = src.row(sy as u32);
        let dst_row = dst.row_mut(dy);
        for (px, &offset) in dst_row.chunks_exact_mut(BYTES_PER_PIXEL).zip(&columns) {
            px.copy_from_slice(&src_row[offset..offset + BYTES_PER_PIXEL]);
        }
    }
    Ok(dst)
}
