//! Shared test utilities for the pixscale test suite.
//!
//! Provides synthetic image builders, a recording [`ScaleSink`], and a
//! temp-directory fixture of encoded images for the batch tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let src = quadrants(4, 4, [RED, GREEN, BLUE, WHITE]);
//! let sink = CancelAfter::after(3);
//! let result = scale(&src, 8, 8, Filter::Triangle, Some(&sink));
//! assert_eq!(sink.reports().len(), 3);
//! ```

use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::scale::ScaleSink;
use crate::surface::RasterImage;

// =========================================================================
// Synthetic images
// =========================================================================

/// Every pixel set to `rgba`.
pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RasterImage {
    let mut img = RasterImage::new(width, height).unwrap();
    img.fill(rgba);
    img
}

/// Opaque image whose red channel ramps along x and green along y.
pub fn gradient(width: u32, height: u32) -> RasterImage {
    let mut img = RasterImage::new(width, height).unwrap();
    let span_x = width.saturating_sub(1).max(1);
    let span_y = height.saturating_sub(1).max(1);
    for y in 0..height {
        for x in 0..width {
            let r = (x * 255 / span_x) as u8;
            let g = (y * 255 / span_y) as u8;
            img.set_pixel(x, y, [r, g, 128, 255]);
        }
    }
    img
}

/// Opaque black/white checkerboard with `cell`-pixel squares.
///
/// Built from two precomputed row patterns so multi-megapixel boards stay
/// cheap in debug builds.
pub fn checkerboard(width: u32, height: u32, cell: u32) -> RasterImage {
    let pattern = |phase: u32| -> Vec<u8> {
        (0..width)
            .flat_map(|x| {
                let v = if (x / cell + phase) % 2 == 0 { 255 } else { 0 };
                [v, v, v, 255]
            })
            .collect()
    };
    let rows = [pattern(0), pattern(1)];
    let mut img = RasterImage::new(width, height).unwrap();
    for y in 0..height {
        img.row_mut(y)
            .copy_from_slice(&rows[((y / cell) % 2) as usize]);
    }
    img
}

/// One solid color per quadrant: top-left, top-right, bottom-left, bottom-right.
pub fn quadrants(width: u32, height: u32, colors: [[u8; 4]; 4]) -> RasterImage {
    let mut img = RasterImage::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            let right = (x >= width / 2) as usize;
            let bottom = (y >= height / 2) as usize;
            img.set_pixel(x, y, colors[bottom * 2 + right]);
        }
    }
    img
}

// =========================================================================
// Sinks
// =========================================================================

/// Sink that records every progress report and cancels once it has seen a
/// given number of them.
pub struct CancelAfter {
    limit: Option<usize>,
    reports: Mutex<Vec<f64>>,
}

impl CancelAfter {
    /// Cancel as soon as `limit` progress reports have arrived.
    pub fn after(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Record only, never cancel.
    pub fn never() -> Self {
        Self {
            limit: None,
            reports: Mutex::new(Vec::new()),
        }
    }

    pub fn reports(&self) -> Vec<f64> {
        self.reports.lock().unwrap().clone()
    }
}

impl ScaleSink for CancelAfter {
    fn is_cancelled(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.reports.lock().unwrap().len() >= limit)
    }

    fn report_progress(&self, fraction: f64) {
        self.reports.lock().unwrap().push(fraction);
    }
}

// =========================================================================
// Fixture setup
// =========================================================================

/// Write an opaque gradient PNG of the given size.
pub fn write_png(path: &Path, width: u32, height: u32) {
    let img = image::RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 90, 255])
    });
    img.save(path).unwrap();
}

/// Temp directory holding a small tree of source images:
///
/// ```text
/// wide.png            400x200
/// small.png           40x30
/// nested/tall.png     120x300
/// notes.txt           (ignored)
/// ```
pub fn setup_images() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_png(&tmp.path().join("wide.png"), 400, 200);
    write_png(&tmp.path().join("small.png"), 40, 30);
    std::fs::create_dir_all(tmp.path().join("nested")).unwrap();
    write_png(&tmp.path().join("nested/tall.png"), 120, 300);
    std::fs::write(tmp.path().join("notes.txt"), "not an image").unwrap();
    tmp
}
