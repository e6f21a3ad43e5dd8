use clap::{Parser, Subcommand};
use log::{error, info};
use pixscale::calculations::scale_keeping_ratio;
use pixscale::config::{self, PixscaleConfig};
use pixscale::filter::Filter;
use pixscale::scale;
use pixscale::task::{ProgressSink, ScaleRequest, ScaleTask, TaskOutcome};
use pixscale::{output, process};
use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

const PROGRESS_POLL: Duration = Duration::from_millis(100);

/// Source and destination shared by the single-image commands.
#[derive(clap::Args, Clone)]
struct ImageArgs {
    /// Image to read (jpg, png, tiff, webp)
    input: PathBuf,

    /// Where to write the result; the format follows the extension
    output: PathBuf,
}

/// Target size. Giving one side keeps the aspect ratio; giving neither fits
/// the image into the configured box.
#[derive(clap::Args, Clone)]
struct SizeArgs {
    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

#[derive(Parser)]
#[command(name = "pixscale")]
#[command(about = "Filtered image resampling")]
#[command(long_about = "\
Filtered image resampling

Scales images with a separable windowed-sinc engine (lanczos, mitchell,
cubic and friends), a nearest-neighbour fast path, or a bilinear pyramid
for large reductions. Square thumbnails are filled and centre-cropped.

Filters:
  nearest  box  triangle  quadratic  cubic  lanczos2  lanczos3
  mitchell-netravali

Batch mode mirrors a directory tree into PNGs plus a manifest.json:

  photos/                      scaled/
  ├── wide.jpg          →      ├── manifest.json
  └── nested/                  ├── wide.png
      └── tall.jpg             ├── wide-thumb.png
                               └── nested/
                                   ├── tall.png
                                   └── tall-thumb.png

Run 'pixscale gen-config' to generate a documented pixscale.toml.
Set RUST_LOG=debug for per-pass logging.")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./pixscale.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scale one image with a reconstruction filter
    Scale {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        size: SizeArgs,
        /// Overrides the configured filter
        #[arg(long)]
        filter: Option<Filter>,
        /// Cancel the scale if it runs longer than this many seconds
        #[arg(long)]
        timeout: Option<f64>,
        /// Do not draw the progress bar
        #[arg(long, short)]
        quiet: bool,
    },
    /// Scale one image by nearest-neighbour sampling
    Nearest {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Scale one image by repeated halving plus a final bilinear step
    Pyramid {
        #[command(flatten)]
        image: ImageArgs,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Make a square thumbnail: fill, then crop the centre
    Square {
        #[command(flatten)]
        image: ImageArgs,
        /// Edge length (defaults to the configured thumbnail size)
        #[arg(long)]
        size: Option<u32>,
        /// Overrides the configured thumbnail filter
        #[arg(long)]
        filter: Option<Filter>,
    },
    /// Scale every image below a directory
    Batch {
        /// Directory to read images from
        #[arg(long, default_value = ".")]
        source: PathBuf,
        /// Directory to write results and manifest.json into
        #[arg(long = "output", default_value = "scaled")]
        output_dir: PathBuf,
    },
    /// List the available filters
    Filters,
    /// Print a stock pixscale.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Scale {
            image,
            size,
            filter,
            timeout,
            quiet,
        } => {
            let cfg = load_cli_config(cli.config.as_deref())?;
            let filter = filter.unwrap_or(cfg.scaling.filter);
            let src = Arc::new(process::load_image(&image.input)?);
            let original = src.dimensions();
            let target = target_dimensions(original, &size, &cfg);
            let scaled = run_scale_task(src, target, filter, timeout, quiet)?;
            process::save_image(&scaled, &image.output)?;
            output::print_scale_result(
                &image.input,
                &image.output,
                original,
                scaled.dimensions(),
                filter.name(),
            );
        }
        Command::Nearest { image, size } => {
            let cfg = load_cli_config(cli.config.as_deref())?;
            let src = process::load_image(&image.input)?;
            let (width, height) = target_dimensions(src.dimensions(), &size, &cfg);
            let scaled = scale::scale_nearest(&src, width, height)?;
            process::save_image(&scaled, &image.output)?;
            output::print_scale_result(
                &image.input,
                &image.output,
                src.dimensions(),
                scaled.dimensions(),
                "nearest",
            );
        }
        Command::Pyramid { image, size } => {
            let cfg = load_cli_config(cli.config.as_deref())?;
            let src = process::load_image(&image.input)?;
            let (width, height) = target_dimensions(src.dimensions(), &size, &cfg);
            let scaled = scale::scale_bilinear_pyramid(&src, width, height)?;
            process::save_image(&scaled, &image.output)?;
            output::print_scale_result(
                &image.input,
                &image.output,
                src.dimensions(),
                scaled.dimensions(),
                "pyramid",
            );
        }
        Command::Square {
            image,
            size,
            filter,
        } => {
            let cfg = load_cli_config(cli.config.as_deref())?;
            let size = size.unwrap_or(cfg.thumbnails.size);
            let filter = filter.unwrap_or(cfg.thumbnails.filter);
            let src = process::load_image(&image.input)?;
            let squared = scale::scale_squared(&src, size, filter, None)?;
            process::save_image(&squared, &image.output)?;
            output::print_scale_result(
                &image.input,
                &image.output,
                src.dimensions(),
                squared.dimensions(),
                filter.name(),
            );
        }
        Command::Batch { source, output_dir } => {
            let cfg = match &cli.config {
                Some(path) => config::load_config_file(path)?,
                None => config::load_config(&source)?,
            };
            init_thread_pool(&cfg.processing);
            let (tx, rx) = mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(
                &source,
                &output_dir,
                &process::ProcessConfig::from_config(&cfg),
                Some(tx),
            );
            if printer.join().is_err() {
                error!("progress printer panicked");
            }
            output::print_process_summary(&result?, &output_dir);
        }
        Command::Filters => {
            output::print_filters();
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Explicit `--config`, else `pixscale.toml` in the working directory, else
/// stock defaults.
fn load_cli_config(path: Option<&Path>) -> Result<PixscaleConfig, config::ConfigError> {
    match path {
        Some(path) => config::load_config_file(path),
        None => config::load_config(Path::new(".")),
    }
}

/// Resolve `--width`/`--height` against the source size and config box.
fn target_dimensions(original: (u32, u32), size: &SizeArgs, cfg: &PixscaleConfig) -> (u32, u32) {
    let (w, h) = (original.0 as f64, original.1 as f64);
    match (size.width, size.height) {
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => (width, ((h * width as f64 / w).round() as u32).max(1)),
        (None, Some(height)) => (((w * height as f64 / h).round() as u32).max(1), height),
        (None, None) => scale_keeping_ratio(
            original,
            (cfg.scaling.max_width, cfg.scaling.max_height),
            cfg.scaling.allow_upscale,
        )
        .unwrap_or(original),
    }
}

/// Run one scale on a worker thread, drawing progress on stderr until it
/// finishes or the timeout cancels it.
fn run_scale_task(
    src: Arc<pixscale::surface::RasterImage>,
    (width, height): (u32, u32),
    filter: Filter,
    timeout: Option<f64>,
    quiet: bool,
) -> Result<pixscale::surface::RasterImage, Box<dyn std::error::Error>> {
    let sink = Arc::new(ProgressSink::new());
    let (tx, rx) = mpsc::channel();
    let task = ScaleTask::start(
        ScaleRequest::new(src, width, height, filter),
        sink.clone(),
        move |outcome| {
            tx.send(outcome).ok();
        },
    )?;
    info!("started {} for {width}x{height}", task.name());

    let deadline = timeout.map(|secs| Instant::now() + Duration::from_secs_f64(secs.max(0.0)));
    while !task.is_finished() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            sink.cancel();
        }
        if !quiet {
            eprint!("\r{}", output::format_progress(sink.fraction()));
        }
        std::thread::sleep(PROGRESS_POLL);
    }
    task.join();
    if !quiet {
        eprintln!("\r{}", output::format_progress(sink.fraction()));
    }

    match rx.recv()? {
        TaskOutcome::Finished(img) => Ok(img),
        TaskOutcome::Cancelled => Err("scale cancelled after timeout".into()),
        TaskOutcome::Failed(e) => Err(e.into()),
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
