//! The scale engine.
//!
//! | Entry point | What it does | Progress / cancel |
//! |---|---|---|
//! | [`scale`] | separable filtered resample with any [`Filter`] | yes |
//! | [`scale_nearest`] | 16.16 fixed-point nearest blit for previews | no |
//! | [`scale_bilinear_pyramid`] | halving chain + final bilinear, for huge ratios | no |
//! | [`scale_squared`] | fill a square then crop the centre | yes (via [`scale`]) |
//!
//! [`scale`] runs one generic [`convolve_axis`] twice. The first call reads
//! the source along its rows and writes an intermediate image whose axes are
//! swapped; the second call does the same to the intermediate and lands back
//! in the natural orientation at the target size.
//!
//! Every entry point propagates [`Metadata`](crate::surface::Metadata): the
//! first scale records the source dimensions as the original ones, later
//! scales leave them alone.

pub mod convolve;
pub mod nearest;
pub mod pyramid;
pub mod square;

pub use convolve::{ScaleContext, convolve_axis};
pub use nearest::scale_nearest;
pub use pyramid::{MAX_SCALE_FACTOR, scale_bilinear_pyramid};
pub use square::scale_squared;

use crate::filter::{self, Filter};
use crate::surface::RasterImage;
use log::{debug, info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaleError {
    #[error("could not allocate a {width}x{height} image")]
    AllocationFailure { width: u32, height: u32 },
    #[error("scale cancelled")]
    Cancelled,
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("stride {stride} is shorter than a row ({min} bytes)")]
    InvalidStride { stride: usize, min: usize },
    #[error("buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
    #[error(
        "crop {width}x{height}+{x}+{y} does not fit in a {image_width}x{image_height} image"
    )]
    CropOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },
    #[error("could not start scale worker: {0}")]
    WorkerSpawn(#[from] std::io::Error),
}

/// Receiver for cancellation requests and progress of a running scale.
///
/// The engine only calls into the sink; it never owns it. Both methods are
/// called from the thread running the scale, once per output line.
pub trait ScaleSink {
    /// Polled before each output line. Returning `true` stops the scale.
    fn is_cancelled(&self) -> bool;

    /// Fraction of lines processed, in `[0, 1]`. Non-decreasing but
    /// approximate: both passes share one counter.
    fn report_progress(&self, fraction: f64);
}

/// Resample `src` to `width` x `height` with `filter`.
///
/// Same-size requests return a verbatim copy. A cancelled run returns
/// [`ScaleError::Cancelled`] and the partially written destination is dropped.
pub fn scale(
    src: &RasterImage,
    width: u32,
    height: u32,
    filter: Filter,
    sink: Option<&dyn ScaleSink>,
) -> Result<RasterImage, ScaleError> {
    if width == 0 || height == 0 {
        return Err(ScaleError::InvalidDimensions { width, height });
    }
    if src.dimensions() == (width, height) {
        return src.try_clone();
    }

    let mut dst = RasterImage::new(width, height)?;
    dst.set_metadata(src.metadata().inherit(src.width(), src.height()));

    filter::ensure_coefficients();
    let mut ctx = ScaleContext::new(filter, width as u64 + height as u64, sink);

    let mut intermediate = RasterImage::new(src.height(), width)?;
    let x_factor = width as f64 / src.width() as f64;
    let y_factor = height as f64 / src.height() as f64;
    debug!(
        "scaling {}x{} -> {}x{} with {} (factors {:.4}, {:.4})",
        src.width(),
        src.height(),
        width,
        height,
        filter,
        x_factor,
        y_factor
    );

    let passes = convolve_axis(src, &mut intermediate, x_factor, &mut ctx)
        .and_then(|()| convolve_axis(&intermediate, &mut dst, y_factor, &mut ctx));
    if let Err(e) = passes {
        if matches!(e, ScaleError::Cancelled) {
            warn!(
                "scale to {width}x{height} cancelled after {} of {} lines",
                ctx.processed_lines(),
                ctx.total_lines()
            );
        }
        return Err(e);
    }

    info!(
        "scaled {}x{} -> {}x{} ({})",
        src.width(),
        src.height(),
        width,
        height,
        filter
    );
    Ok(dst)
}
