//! Square thumbnails: fill, then crop the centre.

use super::{ScaleError, ScaleSink, scale};
use crate::calculations::{centered_crop_origin, square_fill_dimensions};
use crate::filter::Filter;
use crate::surface::RasterImage;
use log::debug;
use std::borrow::Cow;

/// Produce a `size` x `size` image from `src`.
///
/// Sources smaller than `size` on both sides come back as an unmodified
/// copy. Otherwise the image is scaled so its shorter side is `size` (the
/// filter engine only runs when that changes the dimensions) and the centre
/// square is cut out.
pub fn scale_squared(
    src: &RasterImage,
    size: u32,
    filter: Filter,
    sink: Option<&dyn ScaleSink>,
) -> Result<RasterImage, ScaleError> {
    if size == 0 {
        return Err(ScaleError::InvalidDimensions {
            width: size,
            height: size,
        });
    }
    if src.width() < size && src.height() < size {
        return src.try_clone();
    }

    let (fill_w, fill_h) = square_fill_dimensions(src.dimensions(), size);
    let scaled = if (fill_w, fill_h) == src.dimensions() {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(scale(src, fill_w, fill_h, filter, sink)?)
    };

    if (fill_w, fill_h) == (size, size) {
        return match scaled {
            Cow::Owned(img) => Ok(img),
            Cow::Borrowed(img) => img.try_clone(),
        };
    }

    let (x, y) = centered_crop_origin((fill_w, fill_h), size);
    debug!("square {size}: crop {fill_w}x{fill_h} at ({x}, {y})");
    let mut squared = scaled.crop(x, y, size, size)?;
    squared.set_metadata(src.metadata().inherit(src.width(), src.height()));
    Ok(squared)
}
