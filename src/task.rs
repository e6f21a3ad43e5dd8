//! Background scaling with cooperative cancellation.
//!
//! A [`ScaleTask`] runs one [`scale`](crate::scale::scale) call on its own
//! named worker thread and hands the [`TaskOutcome`] to a completion callback
//! on that thread. Cancellation and progress flow through a shared sink; the
//! engine polls it once per output line, so a cancel lands within one line.
//!
//! ```no_run
//! use pixscale::filter::Filter;
//! use pixscale::surface::RasterImage;
//! use pixscale::task::{ProgressSink, ScaleRequest, ScaleTask, TaskOutcome};
//! use std::sync::Arc;
//!
//! let source = Arc::new(RasterImage::new(4000, 3000)?);
//! let sink = Arc::new(ProgressSink::new());
//! let (tx, rx) = std::sync::mpsc::channel();
//! let task = ScaleTask::start(
//!     ScaleRequest::new(source, 400, 300, Filter::Lanczos3),
//!     sink.clone(),
//!     move |outcome| tx.send(outcome).unwrap(),
//! )?;
//! sink.cancel();
//! task.join();
//! assert!(matches!(rx.recv()?, TaskOutcome::Cancelled | TaskOutcome::Finished(_)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::filter::Filter;
use crate::scale::{self, ScaleError, ScaleSink};
use crate::surface::RasterImage;
use log::{debug, error};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

static NEXT_WORKER: AtomicUsize = AtomicUsize::new(0);

/// What to scale and how.
#[derive(Debug, Clone)]
pub struct ScaleRequest {
    pub source: Arc<RasterImage>,
    pub width: u32,
    pub height: u32,
    pub filter: Filter,
}

impl ScaleRequest {
    pub fn new(source: Arc<RasterImage>, width: u32, height: u32, filter: Filter) -> Self {
        Self {
            source,
            width,
            height,
            filter,
        }
    }
}

/// Terminal state of a [`ScaleTask`].
#[derive(Debug)]
pub enum TaskOutcome {
    Finished(RasterImage),
    /// Stopped on request. Not an error; there is simply no image.
    Cancelled,
    Failed(ScaleError),
}

impl From<Result<RasterImage, ScaleError>> for TaskOutcome {
    fn from(result: Result<RasterImage, ScaleError>) -> Self {
        match result {
            Ok(image) => TaskOutcome::Finished(image),
            Err(ScaleError::Cancelled) => TaskOutcome::Cancelled,
            Err(e) => TaskOutcome::Failed(e),
        }
    }
}

/// Thread-safe sink: an atomic cancel flag plus the last reported fraction.
#[derive(Debug, Default)]
pub struct ProgressSink {
    cancelled: AtomicBool,
    // f64 bits
    progress: AtomicU64,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running scale to stop at its next line.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// Last fraction reported by the engine, `0.0` before the first line.
    pub fn fraction(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }
}

impl ScaleSink for ProgressSink {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    fn report_progress(&self, fraction: f64) {
        self.progress.store(fraction.to_bits(), Ordering::Relaxed);
    }
}

/// Handle to a scale running on a worker thread.
pub struct ScaleTask {
    name: String,
    handle: JoinHandle<()>,
}

impl ScaleTask {
    /// Spawn a worker that scales `request` and passes the outcome to
    /// `on_complete`.
    ///
    /// Fails only if the thread cannot be spawned. Everything that goes wrong
    /// inside the scale arrives through the callback.
    pub fn start<S, F>(
        request: ScaleRequest,
        sink: Arc<S>,
        on_complete: F,
    ) -> Result<Self, ScaleError>
    where
        S: ScaleSink + Send + Sync + 'static,
        F: FnOnce(TaskOutcome) + Send + 'static,
    {
        let name = format!("pixscale-scale-{}", NEXT_WORKER.fetch_add(1, Ordering::Relaxed));
        let handle = thread::Builder::new().name(name.clone()).spawn(move || {
            let ScaleRequest {
                source,
                width,
                height,
                filter,
            } = request;
            debug!(
                "worker scaling {}x{} -> {width}x{height} ({filter})",
                source.width(),
                source.height()
            );
            let sink: &dyn ScaleSink = sink.as_ref();
            let result = scale::scale(&source, width, height, filter, Some(sink));
            on_complete(TaskOutcome::from(result));
        })?;
        Ok(Self { name, handle })
    }

    /// Worker thread name, e.g. `pixscale-scale-3`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the worker, and with it the callback, to finish.
    pub fn join(self) {
        if self.handle.join().is_err() {
            error!("scale worker {} panicked", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{checkerboard, gradient};
    use std::sync::mpsc;

    fn run(request: ScaleRequest, sink: Arc<ProgressSink>) -> TaskOutcome {
        let (tx, rx) = mpsc::channel();
        let task = ScaleTask::start(request, sink, move |outcome| {
            tx.send(outcome).unwrap();
        })
        .unwrap();
        task.join();
        rx.recv().unwrap()
    }

    #[test]
    fn finished_outcome_carries_image() {
        let source = Arc::new(gradient(64, 48));
        let sink = Arc::new(ProgressSink::new());
        let outcome = run(
            ScaleRequest::new(source, 16, 12, Filter::Lanczos2),
            sink.clone(),
        );
        match outcome {
            TaskOutcome::Finished(img) => {
                assert_eq!(img.dimensions(), (16, 12));
                assert_eq!(img.metadata().original_width, Some(64));
            }
            other => panic!("expected Finished, got {other:?}"),
        }
        assert_eq!(sink.fraction(), 1.0);
    }

    #[test]
    fn cancel_before_start_yields_cancelled() {
        let sink = Arc::new(ProgressSink::new());
        sink.cancel();
        let outcome = run(
            ScaleRequest::new(Arc::new(gradient(32, 32)), 8, 8, Filter::Box),
            sink.clone(),
        );
        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert_eq!(sink.fraction(), 0.0);
    }

    #[test]
    fn cancel_mid_run_stops_large_scale() {
        let source = Arc::new(checkerboard(4000, 4000, 4));
        let sink = Arc::new(ProgressSink::new());
        let (tx, rx) = mpsc::channel();
        let task = ScaleTask::start(
            ScaleRequest::new(source, 100, 100, Filter::Lanczos3),
            sink.clone(),
            move |outcome| tx.send(outcome).unwrap(),
        )
        .unwrap();

        while sink.fraction() == 0.0 && !task.is_finished() {
            thread::yield_now();
        }
        sink.cancel();
        task.join();

        let outcome = rx.recv().unwrap();
        assert!(matches!(outcome, TaskOutcome::Cancelled), "{outcome:?}");
        assert!(sink.fraction() < 1.0);
    }

    #[test]
    fn failure_is_reported_through_callback() {
        let outcome = run(
            ScaleRequest::new(Arc::new(gradient(4, 4)), 0, 4, Filter::Triangle),
            Arc::new(ProgressSink::new()),
        );
        assert!(matches!(
            outcome,
            TaskOutcome::Failed(ScaleError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn concurrent_tasks_share_nothing() {
        let source = Arc::new(gradient(90, 60));
        let (tx, rx) = mpsc::channel();
        let tasks: Vec<ScaleTask> = (1..=4)
            .map(|i| {
                let tx = tx.clone();
                ScaleTask::start(
                    ScaleRequest::new(source.clone(), 10 * i, 7 * i, Filter::Cubic),
                    Arc::new(ProgressSink::new()),
                    move |outcome| tx.send((i, outcome)).unwrap(),
                )
                .unwrap()
            })
            .collect();
        drop(tx);

        let names: std::collections::HashSet<String> =
            tasks.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names.len(), 4);
        for task in tasks {
            task.join();
        }

        let mut outcomes: Vec<(u32, TaskOutcome)> = rx.iter().collect();
        outcomes.sort_by_key(|(i, _)| *i);
        assert_eq!(outcomes.len(), 4);
        for (i, outcome) in outcomes {
            match outcome {
                TaskOutcome::Finished(img) => assert_eq!(img.dimensions(), (10 * i, 7 * i)),
                other => panic!("task {i}: {other:?}"),
            }
        }
    }
}
