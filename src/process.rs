//! Batch scaling of a directory tree.
//!
//! Walks a source directory, scales every decodable image to fit the
//! configured box and writes an optional square thumbnail next to it.
//!
//! ## Default Configuration
//!
//! ```text
//! Filter: lanczos3
//! Box: 1600x1600 (no upscaling)
//! Thumbnail: 128px square, triangle filter
//! ```
//!
//! ## Output Structure
//!
//! The source tree is mirrored; every output is PNG.
//!
//! ```text
//! scaled/
//! ├── manifest.json              # Dimensions and paths for every image
//! ├── wide.png                   # Fitted into the box
//! ├── wide-thumb.png             # Square thumbnail
//! └── nested/
//!     ├── tall.png
//!     └── tall-thumb.png
//! ```
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon).
//! Progress is streamed as [`ProcessEvent`]s over an optional channel so the
//! CLI can print while workers run.

use crate::calculations::scale_keeping_ratio;
use crate::config::PixscaleConfig;
use crate::filter::Filter;
use crate::scale::{self, ScaleError};
use crate::surface::RasterImage;
use image::ImageFormat;
use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

/// Name of the manifest written into the output directory.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Scaling failed: {0}")]
    Scale(#[from] ScaleError),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Source directory not found: {0}")]
    SourceNotFound(PathBuf),
}

/// Extensions whose decoders are compiled in.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

/// Whether `path` has an extension we can decode (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            PHOTO_CANDIDATES
                .iter()
                .any(|(candidate, _)| candidate.eq_ignore_ascii_case(ext))
        })
}

/// Configuration for batch processing
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessConfig {
    pub filter: Filter,
    pub max_size: (u32, u32), // width, height
    pub allow_upscale: bool,
    pub thumbnail_size: u32, // 0 disables thumbnails
    pub thumbnail_filter: Filter,
}

impl ProcessConfig {
    /// Build a ProcessConfig from PixscaleConfig values.
    pub fn from_config(config: &PixscaleConfig) -> Self {
        Self {
            filter: config.scaling.filter,
            max_size: (config.scaling.max_width, config.scaling.max_height),
            allow_upscale: config.scaling.allow_upscale,
            thumbnail_size: config.thumbnails.size,
            thumbnail_filter: config.thumbnails.filter,
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_config(&PixscaleConfig::default())
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        image_count: usize,
    },
    ImageProcessed {
        /// 1-based position in walk order.
        index: usize,
        source_path: String,
        original: (u32, u32),
        variants: Vec<VariantInfo>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub status: VariantStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Dimensions changed; the filter engine ran.
    Scaled,
    /// Dimensions already matched; pixels written unchanged.
    Copied,
}

/// Manifest written after processing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputManifest {
    pub filter: Filter,
    pub thumbnail_filter: Filter,
    pub images: Vec<OutputImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputImage {
    /// Path relative to the source root.
    pub source_path: String,
    /// Original dimensions (width, height)
    pub original: (u32, u32),
    pub scaled: GeneratedImage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<GeneratedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    /// Path relative to the output directory.
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// Decode an image file into a premultiplied raster.
pub fn load_image(path: &Path) -> Result<RasterImage, ProcessError> {
    let decoded = image::open(path)?.to_rgba8();
    Ok(RasterImage::from_rgba_image(&decoded)?)
}

/// Encode a raster to `path`; the format follows the extension.
pub fn save_image(img: &RasterImage, path: &Path) -> Result<(), ProcessError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    img.to_rgba_image().save(path)?;
    Ok(())
}

/// All supported images below `root`, sorted by path.
///
/// Anything inside `skip` (typically the output directory) is ignored.
pub fn find_images(root: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>, ProcessError> {
    if !root.is_dir() {
        return Err(ProcessError::SourceNotFound(root.to_path_buf()));
    }
    let mut images = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| skip.is_none_or(|dir| entry.path() != dir));
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported_image(entry.path()) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

/// Scale every image below `source_root` into `output_dir` and write the
/// manifest.
pub fn process(
    source_root: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<OutputManifest, ProcessError> {
    let sources = find_images(source_root, Some(output_dir))?;
    std::fs::create_dir_all(output_dir)?;
    info!(
        "processing {} images from {}",
        sources.len(),
        source_root.display()
    );
    if let Some(tx) = &progress {
        tx.send(ProcessEvent::Started {
            image_count: sources.len(),
        })
        .ok();
    }

    let images = sources
        .par_iter()
        .enumerate()
        .map(|(i, source)| -> Result<OutputImage, ProcessError> {
            let (image, variants) = process_image(source, source_root, output_dir, config)?;
            if let Some(tx) = &progress {
                tx.send(ProcessEvent::ImageProcessed {
                    index: i + 1,
                    source_path: image.source_path.clone(),
                    original: image.original,
                    variants,
                })
                .ok();
            }
            Ok(image)
        })
        .collect::<Result<Vec<_>, ProcessError>>()?;

    let manifest = OutputManifest {
        filter: config.filter,
        thumbnail_filter: config.thumbnail_filter,
        images,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    std::fs::write(output_dir.join(MANIFEST_FILE_NAME), json)?;
    Ok(manifest)
}

fn process_image(
    source: &Path,
    source_root: &Path,
    output_dir: &Path,
    config: &ProcessConfig,
) -> Result<(OutputImage, Vec<VariantInfo>), ProcessError> {
    let relative = source.strip_prefix(source_root).unwrap_or(source);
    let stem = relative.with_extension("");
    let src = load_image(source)?;
    let original = src.dimensions();
    debug!("{}: {}x{}", relative.display(), original.0, original.1);

    let mut variants = Vec::new();

    let scaled_rel = relative.with_extension("png");
    let (scaled, status) = match scale_keeping_ratio(original, config.max_size, config.allow_upscale)
    {
        Some((w, h)) => (
            scale::scale(&src, w, h, config.filter, None)?,
            VariantStatus::Scaled,
        ),
        None => (src.try_clone()?, VariantStatus::Copied),
    };
    save_image(&scaled, &output_dir.join(&scaled_rel))?;
    variants.push(VariantInfo {
        label: format!("{}x{}", scaled.width(), scaled.height()),
        width: scaled.width(),
        height: scaled.height(),
        status,
    });
    let scaled_entry = GeneratedImage {
        path: to_slash(&scaled_rel),
        width: scaled.width(),
        height: scaled.height(),
    };

    let thumbnail = if config.thumbnail_size > 0 {
        let thumb_rel = PathBuf::from(format!("{}-thumb.png", stem.display()));
        let thumb = scale::scale_squared(&src, config.thumbnail_size, config.thumbnail_filter, None)?;
        save_image(&thumb, &output_dir.join(&thumb_rel))?;
        let status = if thumb.dimensions() == original {
            VariantStatus::Copied
        } else {
            VariantStatus::Scaled
        };
        variants.push(VariantInfo {
            label: "thumbnail".to_string(),
            width: thumb.width(),
            height: thumb.height(),
            status,
        });
        Some(GeneratedImage {
            path: to_slash(&thumb_rel),
            width: thumb.width(),
            height: thumb.height(),
        })
    } else {
        None
    };

    Ok((
        OutputImage {
            source_path: to_slash(relative),
            original,
            scaled: scaled_entry,
            thumbnail,
        },
        variants,
    ))
}

/// Manifest paths always use `/`.
fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
