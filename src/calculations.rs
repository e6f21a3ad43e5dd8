//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Fit `(width, height)` inside a `max_width` x `max_height` box, keeping the
/// aspect ratio.
///
/// Returns `None` when nothing changes: either the image already fits
/// strictly inside the box and upscaling is off, or the fitted size equals
/// the input. Neither side of the result drops below 1.
///
/// # Examples
/// ```
/// # use pixscale::calculations::scale_keeping_ratio;
/// // 4000x3000 into a 1600 box → 1600x1200
/// assert_eq!(scale_keeping_ratio((4000, 3000), (1600, 1600), false), Some((1600, 1200)));
///
/// // Already small enough
/// assert_eq!(scale_keeping_ratio((800, 600), (1600, 1600), false), None);
///
/// // Upscaling allowed
/// assert_eq!(scale_keeping_ratio((800, 600), (1600, 1600), true), Some((1600, 1200)));
/// ```
pub fn scale_keeping_ratio(
    size: (u32, u32),
    max: (u32, u32),
    allow_upscale: bool,
) -> Option<(u32, u32)> {
    scale_keeping_ratio_min(size, (0, 0), max, allow_upscale)
}

/// Like [`scale_keeping_ratio`], but also grows the image until it covers a
/// `min` box when that needs a larger factor than fitting inside `max`.
///
/// Without `allow_upscale`, images smaller than `max` on both sides or
/// smaller than `min` on either side are left alone.
pub fn scale_keeping_ratio_min(
    size: (u32, u32),
    min: (u32, u32),
    max: (u32, u32),
    allow_upscale: bool,
) -> Option<(u32, u32)> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        return None;
    }
    if !allow_upscale {
        if width < max.0 && height < max.1 {
            return None;
        }
        if width < min.0 || height < min.1 {
            return None;
        }
    }

    let (w, h) = (width as f64, height as f64);
    let fit = (max.0 as f64 / w).min(max.1 as f64 / h);
    let cover = (min.0 as f64 / w).max(min.1 as f64 / h);
    let factor = fit.max(cover);

    let new_width = ((w * factor + 0.5).floor() as u32).max(1);
    let new_height = ((h * factor + 0.5).floor() as u32).max(1);
    if (new_width, new_height) == size {
        None
    } else {
        Some((new_width, new_height))
    }
}

/// Dimensions that cover a `size` x `size` square with the shorter side
/// exactly `size`, keeping the aspect ratio.
///
/// The longer side is truncated, so the overhang split into two crop margins
/// differs by at most one pixel.
///
/// # Examples
/// ```
/// # use pixscale::calculations::square_fill_dimensions;
/// assert_eq!(square_fill_dimensions((400, 200), 128), (256, 128));
/// assert_eq!(square_fill_dimensions((300, 500), 90), (90, 150));
/// assert_eq!(square_fill_dimensions((64, 64), 32), (32, 32));
/// ```
pub fn square_fill_dimensions(source: (u32, u32), size: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    if src_w > src_h {
        let w = (src_w as f64 / src_h as f64 * size as f64) as u32;
        (w.max(size), size)
    } else {
        let h = (src_h as f64 / src_w as f64 * size as f64) as u32;
        (size, h.max(size))
    }
}

/// Top-left corner of a centered `size` x `size` crop.
pub fn centered_crop_origin(scaled: (u32, u32), size: u32) -> (u32, u32) {
    (
        scaled.0.saturating_sub(size) / 2,
        scaled.1.saturating_sub(size) / 2,
    )
}
