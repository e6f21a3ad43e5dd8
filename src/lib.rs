//! # pixscale
//!
//! Filtered image resampling. Give it an RGBA raster and a target size and it
//! produces a correctly filtered copy using one of eight reconstruction
//! filters, with cooperative cancellation and line-granular progress.
//!
//! # Architecture: One Pass, Run Twice
//!
//! The engine is a single one-dimensional convolution that writes its output
//! transposed. Running it twice resamples both axes:
//!
//! ```text
//! source (W×H)  ──convolve_axis──▶  intermediate (H×w)  ──convolve_axis──▶  result (w×h)
//!               rows → columns                          rows → columns
//! ```
//!
//! Both passes read contiguous rows, so the vertical pass never walks memory
//! with a stride, and there is exactly one inner loop to get right.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`filter`] | Filter catalog: weight functions, support radii, sinc window, cubic coefficients |
//! | [`surface`] | `RasterImage`: stride-aware premultiplied RGBA buffer with scale metadata |
//! | [`scale`] | The engine: filtered scale, nearest fast path, bilinear pyramid, square thumbnails |
//! | [`task`] | Runs a scale on a worker thread with cancel and progress |
//! | [`calculations`] | Pure dimension math: fit-in-box, square fill, crop origin |
//! | [`config`] | `pixscale.toml` loading, stock defaults, validation |
//! | [`process`] | Batch mode: walk a tree, scale in parallel, write PNGs and a manifest |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Premultiplied Alpha
//!
//! Pixels are stored premultiplied. Filtering straight alpha bleeds the
//! colour of fully transparent pixels into their neighbours; premultiplied
//! values filter correctly with plain weighted sums. Conversion happens only
//! at the codec boundary ([`surface::RasterImage::from_rgba_image`] and
//! [`surface::RasterImage::to_rgba_image`]).
//!
//! ## Cancellation Is Cooperative
//!
//! Nothing is ever killed. The engine polls a [`scale::ScaleSink`] once per
//! output line and unwinds with [`scale::ScaleError::Cancelled`]; the partial
//! result is dropped. Latency is bounded by the cost of one line.
//!
//! ## Metadata Survives Rescaling
//!
//! Every output records the dimensions of the first image in its scale
//! chain, so a thumbnail of a preview still knows the size of the photo.
//!
//! # Example
//!
//! ```
//! use pixscale::filter::Filter;
//! use pixscale::scale::scale;
//! use pixscale::surface::RasterImage;
//!
//! let mut src = RasterImage::new(64, 48)?;
//! src.fill([200, 100, 50, 255]);
//! let small = scale(&src, 16, 12, Filter::Lanczos3, None)?;
//! assert_eq!(small.dimensions(), (16, 12));
//! assert_eq!(small.metadata().original_width, Some(64));
//! # Ok::<(), pixscale::scale::ScaleError>(())
//! ```

pub mod calculations;
pub mod config;
pub mod filter;
pub mod output;
pub mod process;
pub mod scale;
pub mod surface;
pub mod task;

#[cfg(test)]
pub(crate) mod test_helpers;
