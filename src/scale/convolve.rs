//! One-dimensional filtered resampling, written transposed.
//!
//! [`convolve_axis`] resamples the rows of its source and stores each output
//! line as a *row* of the destination, so destination row `y` holds what will
//! become column `y` of the scaled image. Running it a second time on that
//! intermediate resamples the other axis and restores the orientation.
//!
//! Per destination line the pass:
//!
//! 1. polls the sink for cancellation (once per line, never mid-row)
//! 2. bumps the shared line counter and reports progress
//! 3. maps the line centre back into source space and picks the tap window
//! 4. evaluates the filter at every tap and normalizes by the tap density
//! 5. accumulates each channel in `f64`, rounds half up and clamps to a byte

use super::{ScaleError, ScaleSink};
use crate::filter::Filter;
use crate::surface::{BYTES_PER_PIXEL, RasterImage};
use log::debug;

/// Added to the working scale and the mapped line centre so exact halves
/// break the same way on every platform.
pub const EPSILON: f64 = 1e-16;

/// `1 / x`, with divisors smaller than [`EPSILON`] treated as `±EPSILON`.
#[inline]
pub fn reciprocal(x: f64) -> f64 {
    if x.abs() < EPSILON {
        if x.is_sign_negative() {
            -1.0 / EPSILON
        } else {
            1.0 / EPSILON
        }
    } else {
        1.0 / x
    }
}

/// State shared by both passes of one scale.
pub struct ScaleContext<'a> {
    filter: Filter,
    total_lines: u64,
    processed_lines: u64,
    cancelled: bool,
    sink: Option<&'a dyn ScaleSink>,
}

impl<'a> ScaleContext<'a> {
    pub fn new(filter: Filter, total_lines: u64, sink: Option<&'a dyn ScaleSink>) -> Self {
        Self {
            filter,
            total_lines: total_lines.max(1),
            processed_lines: 0,
            cancelled: false,
            sink,
        }
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn total_lines(&self) -> u64 {
        self.total_lines
    }

    pub fn processed_lines(&self) -> u64 {
        self.processed_lines
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Filter weight at `distance`, windowed for the sinc family.
    #[inline]
    pub fn weight(&self, distance: f64) -> f64 {
        self.filter.windowed_weight(distance)
    }

    /// Ask the sink once. A cancel is sticky.
    fn poll_cancelled(&mut self) -> bool {
        if !self.cancelled {
            self.cancelled = self.sink.is_some_and(|sink| sink.is_cancelled());
        }
        self.cancelled
    }

    fn advance(&mut self) {
        self.processed_lines += 1;
        if let Some(sink) = self.sink {
            let fraction = self.processed_lines as f64 / self.total_lines as f64;
            sink.report_progress(fraction.min(1.0));
        }
    }
}

/// Support radius and working scale for one pass.
///
/// The support widens by `1 / scale_factor` when shrinking and keeps the
/// filter's own radius when enlarging. It never drops below half a pixel;
/// when it would, the working scale resets to 1.
pub(crate) fn pass_support(filter: Filter, scale_factor: f64) -> (f64, f64) {
    let eff_scale = (reciprocal(scale_factor) + EPSILON).max(1.0);
    let support = eff_scale * filter.support();
    if support < 0.5 {
        (0.5, 1.0)
    } else {
        (support, eff_scale)
    }
}

/// Fill `weights` with the taps for destination line `y` and return the
/// index of the first source sample plus the raw (pre-normalization) density.
pub(crate) fn line_taps(
    ctx: &ScaleContext<'_>,
    y: u32,
    scale_factor: f64,
    support: f64,
    eff_scale: f64,
    src_extent: u32,
    weights: &mut Vec<f64>,
) -> (usize, f64) {
    let extent = src_extent as f64;
    let bisect = (y as f64 + 0.5) / scale_factor + EPSILON;
    let start = (bisect - support + 0.5).floor().clamp(0.0, extent) as usize;
    let stop = (bisect + support + 0.5).floor().clamp(0.0, extent) as usize;
    let inv_scale = reciprocal(eff_scale);

    weights.clear();
    let mut density = 0.0;
    for n in start..stop {
        let w = ctx.weight(inv_scale * (n as f64 - bisect + 0.5));
        weights.push(w);
        density += w;
    }

    if density != 0.0 && density != 1.0 {
        let norm = reciprocal(density);
        for w in weights.iter_mut() {
            *w *= norm;
        }
    }
    (start, density)
}

/// Resample `src` along its rows into `dst`, transposed.
///
/// `dst.width()` must equal `src.height()`; `dst.height()` is the new extent
/// of the axis being scaled and `scale_factor` is `dst.height() / src.width()`.
///
/// Returns [`ScaleError::Cancelled`] when the sink asks to stop. Lines not yet
/// written are left as they were.
pub fn convolve_axis(
    src: &RasterImage,
    dst: &mut RasterImage,
    scale_factor: f64,
    ctx: &mut ScaleContext<'_>,
) -> Result<(), ScaleError> {
    assert_eq!(
        dst.width(),
        src.height(),
        "transposed destination must be as wide as the source is tall"
    );

    let (support, eff_scale) = pass_support(ctx.filter, scale_factor);
    debug!(
        "pass {}x{} -> {}x{}: factor {scale_factor:.4}, support {support:.3}",
        src.width(),
        src.height(),
        dst.width(),
        dst.height()
    );

    let mut weights = Vec::with_capacity((2.0 * support + 3.0) as usize);
    for y in 0..dst.height() {
        if ctx.poll_cancelled() {
            return Err(ScaleError::Cancelled);
        }
        ctx.advance();

        let (start, _) = line_taps(
            ctx,
            y,
            scale_factor,
            support,
            eff_scale,
            src.width(),
            &mut weights,
        );
        let first = start * BYTES_PER_PIXEL;

        let out = dst.row_mut(y);
        for (x, px) in out.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let taps = &src.row(x as u32)[first..first + weights.len() * BYTES_PER_PIXEL];
            let mut acc = [0.0f64; 4];
            for (w, sample) in weights.iter().zip(taps.chunks_exact(BYTES_PER_PIXEL)) {
                for c in 0..BYTES_PER_PIXEL {
                    acc[c] += w * sample[c] as f64;
                }
            }
            for c in 0..BYTES_PER_PIXEL {
                px[c] = (acc[c] + 0.5).clamp(0.0, 255.0) as u8;
            }
        }
    }
    Ok(())
}
