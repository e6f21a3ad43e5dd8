//! CLI output formatting for every command.
//!
//! # Output Format
//!
//! ## Single image (`scale`, `nearest`, `pyramid`, `square`)
//!
//! ```text
//! photo.jpg 4000x3000 → 400x300 (lanczos3)
//!     Output: photo-small.png
//! ```
//!
//! ## Batch
//!
//! ```text
//! Scaling 3 images
//!     001 wide.png 400x200
//!         100x50: scaled
//!         thumbnail: scaled
//!
//! Scaled 3 images into scaled/ (lanczos3, thumbnails triangle)
//! ```
//!
//! ## Filters
//!
//! ```text
//! nearest          support 0.0
//! lanczos3         support 3.0  windowed sinc
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure, with no I/O and no side effects.

use crate::filter::Filter;
use crate::process::{OutputManifest, ProcessEvent, VariantStatus};
use std::path::Path;

const PROGRESS_BAR_WIDTH: usize = 20;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn format_dimensions((width, height): (u32, u32)) -> String {
    format!("{}x{}", width, height)
}

// ============================================================================
// Single image output
// ============================================================================

/// Format the result of scaling one file.
///
/// `method` is the filter name, or `nearest`/`pyramid` for the fast paths.
pub fn format_scale_result(
    input: &Path,
    output: &Path,
    original: (u32, u32),
    scaled: (u32, u32),
    method: &str,
) -> Vec<String> {
    let name = input
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    vec![
        format!(
            "{} {} \u{2192} {} ({})",
            name,
            format_dimensions(original),
            format_dimensions(scaled),
            method
        ),
        format!("{}Output: {}", indent(1), output.display()),
    ]
}

pub fn print_scale_result(
    input: &Path,
    output: &Path,
    original: (u32, u32),
    scaled: (u32, u32),
    method: &str,
) {
    for line in format_scale_result(input, output, original, scaled, method) {
        println!("{}", line);
    }
}

/// Render a fraction in `[0, 1]` as a fixed-width bar with a percentage.
///
/// ```text
/// [########............]  42%
/// ```
pub fn format_progress(fraction: f64) -> String {
    let fraction = if fraction.is_finite() {
        fraction.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (fraction * PROGRESS_BAR_WIDTH as f64).floor() as usize;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        ".".repeat(PROGRESS_BAR_WIDTH - filled),
        (fraction * 100.0).floor() as u32
    )
}

// ============================================================================
// Batch output
// ============================================================================

/// Format a single batch progress event as display lines.
///
/// Each image leads with its positional index and relative path; the
/// variants follow as indented context.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started { image_count } => {
            let noun = if *image_count == 1 { "image" } else { "images" };
            vec![format!("Scaling {} {}", image_count, noun)]
        }
        ProcessEvent::ImageProcessed {
            index,
            source_path,
            original,
            variants,
        } => {
            let mut lines = vec![format!(
                "{}{} {} {}",
                indent(1),
                format_index(*index),
                source_path,
                format_dimensions(*original)
            )];
            for variant in variants {
                let status_str = match variant.status {
                    VariantStatus::Scaled => "scaled",
                    VariantStatus::Copied => "copied",
                };
                lines.push(format!("{}{}: {}", indent(2), variant.label, status_str));
            }
            lines
        }
    }
}

/// Format the closing summary of a batch run.
pub fn format_process_summary(manifest: &OutputManifest, output_dir: &Path) -> Vec<String> {
    let thumbnails = manifest
        .images
        .iter()
        .filter(|i| i.thumbnail.is_some())
        .count();
    let noun = if manifest.images.len() == 1 {
        "image"
    } else {
        "images"
    };
    let detail = if thumbnails > 0 {
        format!(
            "{}, thumbnails {}",
            manifest.filter, manifest.thumbnail_filter
        )
    } else {
        manifest.filter.to_string()
    };
    vec![
        String::new(),
        format!(
            "Scaled {} {} into {}/ ({})",
            manifest.images.len(),
            noun,
            output_dir.display(),
            detail
        ),
    ]
}

pub fn print_process_summary(manifest: &OutputManifest, output_dir: &Path) {
    for line in format_process_summary(manifest, output_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Filter catalog
// ============================================================================

/// One line per filter: name, support radius and whether it is a windowed sinc.
pub fn format_filters() -> Vec<String> {
    Filter::ALL
        .iter()
        .map(|filter| {
            let line = format!("{:<16} support {:.1}", filter.name(), filter.support());
            if filter.is_sinc() {
                format!("{}  windowed sinc", line)
            } else {
                line
            }
        })
        .collect()
}

pub fn print_filters() {
    for line in format_filters() {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{GeneratedImage, OutputImage, VariantInfo};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three_digits() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn indent_uses_four_spaces() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Single image tests
    // =========================================================================

    #[test]
    fn scale_result_shows_dimensions_and_output() {
        let lines = format_scale_result(
            Path::new("in/photo.jpg"),
            Path::new("out/photo.png"),
            (4000, 3000),
            (400, 300),
            "lanczos3",
        );
        assert_eq!(
            lines,
            vec![
                "photo.jpg 4000x3000 \u{2192} 400x300 (lanczos3)",
                "    Output: out/photo.png",
            ]
        );
    }

    #[test]
    fn progress_bar_bounds() {
        assert_eq!(format_progress(0.0), "[....................]   0%");
        assert_eq!(format_progress(1.0), "[####################] 100%");
        assert_eq!(format_progress(0.5), "[##########..........]  50%");
    }

    #[test]
    fn progress_bar_clamps_bad_input() {
        assert_eq!(format_progress(2.0), format_progress(1.0));
        assert_eq!(format_progress(-1.0), format_progress(0.0));
        assert_eq!(format_progress(f64::NAN), format_progress(0.0));
    }

    // =========================================================================
    // Batch tests
    // =========================================================================

    #[test]
    fn started_event_pluralizes() {
        assert_eq!(
            format_process_event(&ProcessEvent::Started { image_count: 1 }),
            vec!["Scaling 1 image"]
        );
        assert_eq!(
            format_process_event(&ProcessEvent::Started { image_count: 3 }),
            vec!["Scaling 3 images"]
        );
    }

    #[test]
    fn image_event_lists_variants() {
        let event = ProcessEvent::ImageProcessed {
            index: 2,
            source_path: "nested/tall.png".to_string(),
            original: (120, 300),
            variants: vec![
                VariantInfo {
                    label: "40x100".to_string(),
                    width: 40,
                    height: 100,
                    status: VariantStatus::Scaled,
                },
                VariantInfo {
                    label: "thumbnail".to_string(),
                    width: 32,
                    height: 32,
                    status: VariantStatus::Copied,
                },
            ],
        };
        assert_eq!(
            format_process_event(&event),
            vec![
                "    002 nested/tall.png 120x300",
                "        40x100: scaled",
                "        thumbnail: copied",
            ]
        );
    }

    fn manifest(thumbnail: bool) -> OutputManifest {
        OutputManifest {
            filter: Filter::Lanczos3,
            thumbnail_filter: Filter::Triangle,
            images: vec![OutputImage {
                source_path: "a.png".to_string(),
                original: (10, 10),
                scaled: GeneratedImage {
                    path: "a.png".to_string(),
                    width: 10,
                    height: 10,
                },
                thumbnail: thumbnail.then(|| GeneratedImage {
                    path: "a-thumb.png".to_string(),
                    width: 4,
                    height: 4,
                }),
            }],
        }
    }

    #[test]
    fn summary_mentions_thumbnail_filter_only_when_used() {
        let with = format_process_summary(&manifest(true), Path::new("out"));
        assert_eq!(
            with[1],
            "Scaled 1 image into out/ (lanczos3, thumbnails triangle)"
        );
        let without = format_process_summary(&manifest(false), Path::new("out"));
        assert_eq!(without[1], "Scaled 1 image into out/ (lanczos3)");
    }

    // =========================================================================
    // Filter catalog tests
    // =========================================================================

    #[test]
    fn filter_catalog_lists_every_filter() {
        let lines = format_filters();
        assert_eq!(lines.len(), Filter::ALL.len());
        assert!(lines.iter().any(|l| l.starts_with("lanczos3 ")
            && l.ends_with("windowed sinc")));
        assert!(lines.iter().any(|l| l.starts_with("nearest ")
            && !l.contains("sinc")));
    }
}
