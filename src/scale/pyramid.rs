//! Bilinear downsampling through a chain of halvings.
//!
//! A single bilinear step only looks at a 2x2 neighbourhood, so shrinking by
//! much more than 2 skips most of the source and aliases. Halving first until
//! the remaining ratio is at most [`MAX_SCALE_FACTOR`] keeps every source
//! pixel contributing, at the cost of a few short-lived intermediates.

use super::ScaleError;
use crate::surface::{BYTES_PER_PIXEL, RasterImage};
use log::debug;
use std::borrow::Cow;

/// Largest shrink ratio handed to one bilinear step.
pub const MAX_SCALE_FACTOR: f64 = 2.0;

/// Shrink (or grow) `src` to exactly `width` x `height`.
///
/// Each axis is halved independently while its remaining ratio exceeds
/// [`MAX_SCALE_FACTOR`], never below the target; one bilinear resize then
/// covers the rest. No progress reporting, no cancellation.
pub fn scale_bilinear_pyramid(
    src: &RasterImage,
    width: u32,
    height: u32,
) -> Result<RasterImage, ScaleError> {
    if width == 0 || height == 0 {
        return Err(ScaleError::InvalidDimensions { width, height });
    }

    let mut current = Cow::Borrowed(src);
    let mut steps = 0;
    loop {
        let (cw, ch) = current.dimensions();
        let shrink_x = cw as f64 / width as f64;
        let shrink_y = ch as f64 / height as f64;
        if shrink_x <= MAX_SCALE_FACTOR && shrink_y <= MAX_SCALE_FACTOR {
            break;
        }
        let nw = if shrink_x > MAX_SCALE_FACTOR {
            (cw / 2).max(width)
        } else {
            cw
        };
        let nh = if shrink_y > MAX_SCALE_FACTOR {
            (ch / 2).max(height)
        } else {
            ch
        };
        current = Cow::Owned(bilinear(&current, nw, nh)?);
        steps += 1;
    }
    debug!(
        "pyramid {}x{} -> {}x{}: {steps} halving steps",
        src.width(),
        src.height(),
        width,
        height
    );

    let mut out = if current.dimensions() == (width, height) {
        current.into_owned()
    } else {
        bilinear(&current, width, height)?
    };
    out.set_metadata(src.metadata().inherit(src.width(), src.height()));
    Ok(out)
}

/// Source sample positions for one axis: left index, right index, and the
/// weight of the right one.
fn axis_samples(src_extent: u32, dst_extent: u32) -> Vec<(u32, u32, f64)> {
    let step = src_extent as f64 / dst_extent as f64;
    let max = (src_extent - 1) as f64;
    (0..dst_extent)
        .map(|d| {
            let s = ((d as f64 + 0.5) * step - 0.5).clamp(0.0, max);
            let lo = s.floor() as u32;
            let hi = (lo + 1).min(src_extent - 1);
            (lo, hi, s - lo as f64)
        })
        .collect()
}

/// One bilinear resize, mapping pixel centres onto pixel centres.
fn bilinear(src: &RasterImage, width: u32, height: u32) -> Result<RasterImage, ScaleError> {
    let mut dst = RasterImage::new(width, height)?;
    dst.set_metadata(*src.metadata());
    let columns = axis_samples(src.width(), width);
    let rows = axis_samples(src.height(), height);

    for (dy, &(y0, y1, fy)) in rows.iter().enumerate() {
        let top = src.row(y0);
        let bottom = src.row(y1);
        let out = dst.row_mut(dy as u32);
        for (px, &(x0, x1, fx)) in out.chunks_exact_mut(BYTES_PER_PIXEL).zip(&columns) {
            let l = x0 as usize * BYTES_PER_PIXEL;
            let r = x1 as usize * BYTES_PER_PIXEL;
            for c in 0..BYTES_PER_PIXEL {
                let t = top[l + c] as f64 * (1.0 - fx) + top[r + c] as f64 * fx;
                let b = bottom[l + c] as f64 * (1.0 - fx) + bottom[r + c] as f64 * fx;
                let v = t * (1.0 - fy) + b * fy;
                px[c] = (v + 0.5).clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Metadata;
    use crate::test_helpers::{checkerboard, gradient, solid};

    fn assert_uniform(img: &RasterImage, expected: [u8; 4], tolerance: i32) {
        for y in 0..img.height() {
            for x in 0..img.width() {
                let px = img.pixel(x, y);
                for c in 0..4 {
                    assert!(
                        (px[c] as i32 - expected[c] as i32).abs() <= tolerance,
                        "({x},{y}) {px:?} vs {expected:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn halving_averages_two_by_two_blocks() {
        let src = checkerboard(8, 8, 1);
        let out = bilinear(&src, 4, 4).unwrap();
        // (255 * 2 + 0 * 2) / 4 = 127.5, rounded half up
        assert_uniform(&out, [128, 128, 128, 255], 0);
    }

    #[test]
    fn huge_checkerboard_collapses_to_grey() {
        let src = checkerboard(8192, 8192, 1);
        let out = scale_bilinear_pyramid(&src, 8, 8).unwrap();
        assert_eq!(out.dimensions(), (8, 8));
        assert_uniform(&out, [128, 128, 128, 255], 1);
    }

    #[test]
    fn ratios_from_two_to_a_thousand() {
        let src = checkerboard(2000, 2000, 1);
        for target in [1000, 500, 100, 20, 7, 2] {
            let out = scale_bilinear_pyramid(&src, target, target).unwrap();
            assert_eq!(out.dimensions(), (target, target));
            assert_uniform(&out, [128, 128, 128, 255], 1);
        }
    }

    #[test]
    fn axes_halve_independently() {
        let src = solid(1024, 10, [40, 80, 120, 200]);
        let out = scale_bilinear_pyramid(&src, 3, 20).unwrap();
        assert_eq!(out.dimensions(), (3, 20));
        assert_uniform(&out, [40, 80, 120, 200], 0);
    }

    #[test]
    fn upscale_goes_straight_to_bilinear() {
        let src = gradient(4, 4);
        let out = scale_bilinear_pyramid(&src, 16, 12).unwrap();
        assert_eq!(out.dimensions(), (16, 12));
        // Clamped edges reproduce the corner pixels
        assert_eq!(out.pixel(0, 0), src.pixel(0, 0));
        assert_eq!(out.pixel(15, 11), src.pixel(3, 3));
    }

    #[test]
    fn same_size_is_identity() {
        let src = gradient(9, 5);
        let out = scale_bilinear_pyramid(&src, 9, 5).unwrap();
        assert_eq!(out.as_bytes(), src.as_bytes());
    }

    #[test]
    fn metadata_records_pyramid_source() {
        let out = scale_bilinear_pyramid(&gradient(300, 100), 10, 10).unwrap();
        assert_eq!(
            out.metadata(),
            &Metadata {
                original_width: Some(300),
                original_height: Some(100),
            }
        );
    }

    #[test]
    fn zero_target_is_invalid() {
        assert!(matches!(
            scale_bilinear_pyramid(&gradient(4, 4), 2, 0),
            Err(ScaleError::InvalidDimensions { .. })
        ));
    }
}
