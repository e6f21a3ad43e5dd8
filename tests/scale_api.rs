//! End-to-end checks through the public API only.
//!
//! Each test builds its own images, drives the engine the way an embedding
//! application would, and checks what comes out.

use pixscale::filter::Filter;
use pixscale::process::{self, ProcessConfig};
use pixscale::scale::{self, ScaleError, ScaleSink};
use pixscale::surface::RasterImage;
use pixscale::task::{ProgressSink, ScaleRequest, ScaleTask, TaskOutcome};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use tempfile::TempDir;

fn opaque(width: u32, height: u32) -> RasterImage {
    let mut img = RasterImage::new(width, height).unwrap();
    for y in 0..height {
        for x in 0..width {
            img.set_pixel(x, y, [(x * 7 % 256) as u8, (y * 3 % 256) as u8, 128, 255]);
        }
    }
    img
}

/// Counts reports and cancels once `limit` have arrived.
struct Budget {
    limit: usize,
    seen: AtomicUsize,
}

impl ScaleSink for Budget {
    fn is_cancelled(&self) -> bool {
        self.seen.load(Ordering::Relaxed) >= self.limit
    }

    fn report_progress(&self, _fraction: f64) {
        self.seen.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn every_filter_hits_the_requested_size() {
    let src = opaque(97, 61);
    for filter in Filter::ALL {
        for (w, h) in [(30, 20), (200, 130), (1, 1), (97, 5)] {
            let out = scale::scale(&src, w, h, filter, None).unwrap();
            assert_eq!(out.dimensions(), (w, h), "{filter}");
            for y in 0..h {
                for x in 0..w {
                    assert!(out.pixel(x, y)[3] >= 254, "{filter} alpha at {x},{y}");
                }
            }
        }
    }
}

#[test]
fn chained_scales_keep_first_original_size() {
    let src = opaque(300, 200);
    let preview = scale::scale(&src, 150, 100, Filter::Lanczos3, None).unwrap();
    let thumb = scale::scale_squared(&preview, 40, Filter::Triangle, None).unwrap();
    let tiny = scale::scale_nearest(&thumb, 10, 10).unwrap();
    let pyramid = scale::scale_bilinear_pyramid(&tiny, 5, 5).unwrap();

    for img in [&preview, &thumb, &tiny, &pyramid] {
        assert_eq!(img.metadata().original_width, Some(300));
        assert_eq!(img.metadata().original_height, Some(200));
    }
}

#[test]
fn custom_sink_cancels_the_engine() {
    let sink = Budget {
        limit: 10,
        seen: AtomicUsize::new(0),
    };
    let result = scale::scale(&opaque(400, 400), 50, 50, Filter::Cubic, Some(&sink));
    assert!(matches!(result, Err(ScaleError::Cancelled)));
    assert_eq!(sink.seen.load(Ordering::Relaxed), 10);
}

#[test]
fn background_task_delivers_result() {
    let source = Arc::new(opaque(120, 80));
    let sink = Arc::new(ProgressSink::new());
    let (tx, rx) = mpsc::channel();
    let task = ScaleTask::start(
        ScaleRequest::new(source, 60, 40, Filter::MitchellNetravali),
        sink.clone(),
        move |outcome| tx.send(outcome).unwrap(),
    )
    .unwrap();
    task.join();

    match rx.recv().unwrap() {
        TaskOutcome::Finished(img) => assert_eq!(img.dimensions(), (60, 40)),
        other => panic!("expected Finished, got {other:?}"),
    }
    assert_eq!(sink.fraction(), 1.0);
}

#[test]
fn batch_writes_decodable_files() {
    let source = TempDir::new().unwrap();
    opaque(500, 250)
        .to_rgba_image()
        .save(source.path().join("photo.png"))
        .unwrap();
    let out = TempDir::new().unwrap();
    let config = ProcessConfig {
        max_size: (200, 200),
        thumbnail_size: 50,
        ..ProcessConfig::default()
    };

    let manifest = process::process(source.path(), out.path(), &config, None).unwrap();
    assert_eq!(manifest.images.len(), 1);

    let scaled = process::load_image(&out.path().join("photo.png")).unwrap();
    assert_eq!(scaled.dimensions(), (200, 100));
    let thumb = process::load_image(&out.path().join("photo-thumb.png")).unwrap();
    assert_eq!(thumb.dimensions(), (50, 50));
}
