//! Reconstruction filters used by the scale engine.
//!
//! Each [`Filter`] binds a weight function to a support radius (the distance
//! beyond which its weight is zero, before the downscale factor widens it).
//!
//! | Filter | Weight | Support |
//! |---|---|---|
//! | `Nearest` | constant 1 | 0.0 |
//! | `Box` | constant 1 | 0.5 |
//! | `Triangle` | `1 - |x|` | 1.0 |
//! | `Quadratic` | quadratic B-spline (Gaussian approximation) | 1.5 |
//! | `Cubic` | cubic B-spline, B=1 C=0 | 2.0 |
//! | `Lanczos2` | windowed sinc | 2.0 |
//! | `Lanczos3` | windowed sinc | 3.0 |
//! | `MitchellNetravali` | Mitchell-Netravali, B=C=1/3 | 2.0 |
//!
//! The Lanczos filters are realized as *windowed* sinc: the raw sinc is
//! multiplied by a second sinc stretched over the support, see
//! [`Filter::windowed_weight`]. Evaluating the bare sinc instead changes the
//! output visibly.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;

/// Selectable reconstruction filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Filter {
    #[serde(alias = "point")]
    Nearest,
    Box,
    #[serde(alias = "linear")]
    Triangle,
    Quadratic,
    Cubic,
    Lanczos2,
    #[default]
    #[serde(alias = "lanczos")]
    Lanczos3,
    #[serde(alias = "mitchell")]
    MitchellNetravali,
}

impl Filter {
    /// Every filter, in catalog order.
    pub const ALL: [Filter; 8] = [
        Filter::Nearest,
        Filter::Box,
        Filter::Triangle,
        Filter::Quadratic,
        Filter::Cubic,
        Filter::Lanczos2,
        Filter::Lanczos3,
        Filter::MitchellNetravali,
    ];

    /// Support radius before the downscale factor is applied.
    pub fn support(self) -> f64 {
        match self {
            Filter::Nearest => 0.0,
            Filter::Box => 0.5,
            Filter::Triangle => 1.0,
            Filter::Quadratic => 1.5,
            Filter::Cubic => 2.0,
            Filter::Lanczos2 => 2.0,
            Filter::Lanczos3 => 3.0,
            Filter::MitchellNetravali => 2.0,
        }
    }

    /// Whether the weight function is a sinc that needs windowing.
    pub fn is_sinc(self) -> bool {
        matches!(self, Filter::Lanczos2 | Filter::Lanczos3)
    }

    /// Raw weight at `distance`, without any window applied.
    pub fn weight(self, distance: f64) -> f64 {
        let x = distance.abs();
        match self {
            Filter::Nearest | Filter::Box => 1.0,
            Filter::Triangle => triangle(x),
            Filter::Quadratic => quadratic(x),
            Filter::Cubic => cubic(x),
            Filter::Lanczos2 | Filter::Lanczos3 => sinc_fast(x),
            Filter::MitchellNetravali => mitchell(x),
        }
    }

    /// Weight used by the convolution pass.
    ///
    /// Sinc filters are tapered by a sinc window evaluated at
    /// `distance / support`: 1 at the center, 0 from the support outward.
    /// Every other filter returns its raw weight.
    pub fn windowed_weight(self, distance: f64) -> f64 {
        let raw = self.weight(distance);
        if !self.is_sinc() {
            return raw;
        }
        let x = distance.abs();
        let support = self.support();
        let window = if x >= support {
            0.0
        } else {
            sinc_fast(x / support)
        };
        raw * window
    }

    /// Canonical configuration name, e.g. `"lanczos3"`.
    pub fn name(self) -> &'static str {
        match self {
            Filter::Nearest => "nearest",
            Filter::Box => "box",
            Filter::Triangle => "triangle",
            Filter::Quadratic => "quadratic",
            Filter::Cubic => "cubic",
            Filter::Lanczos2 => "lanczos2",
            Filter::Lanczos3 => "lanczos3",
            Filter::MitchellNetravali => "mitchell-netravali",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown filter '{0}' (expected one of: nearest, box, triangle, quadratic, cubic, lanczos2, lanczos3, mitchell-netravali)")]
pub struct ParseFilterError(pub String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "nearest" | "point" => Ok(Filter::Nearest),
            "box" => Ok(Filter::Box),
            "triangle" | "linear" => Ok(Filter::Triangle),
            "quadratic" => Ok(Filter::Quadratic),
            "cubic" => Ok(Filter::Cubic),
            "lanczos2" => Ok(Filter::Lanczos2),
            "lanczos3" | "lanczos" => Ok(Filter::Lanczos3),
            "mitchell-netravali" | "mitchell" => Ok(Filter::MitchellNetravali),
            _ => Err(ParseFilterError(s.to_string())),
        }
    }
}

// =============================================================================
// Weight functions (all take |x|)
// =============================================================================

#[inline]
fn triangle(x: f64) -> f64 {
    if x < 1.0 { 1.0 - x } else { 0.0 }
}

/// 2nd order B-spline approximation of a Gaussian.
#[inline]
fn quadratic(x: f64) -> f64 {
    if x < 0.5 {
        0.75 - x * x
    } else if x < 1.5 {
        0.5 * (x - 1.5) * (x - 1.5)
    } else {
        0.0
    }
}

/// Piecewise cubic coefficients derived from the Mitchell/Keys (B, C) family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct CubicCoefficients {
    p0: f64,
    p2: f64,
    p3: f64,
    q0: f64,
    q1: f64,
    q2: f64,
    q3: f64,
}

impl CubicCoefficients {
    fn new(b: f64, c: f64) -> Self {
        Self {
            p0: (6.0 - 2.0 * b) / 6.0,
            p2: (-18.0 + 12.0 * b + 6.0 * c) / 6.0,
            p3: (12.0 - 9.0 * b - 6.0 * c) / 6.0,
            q0: (8.0 * b + 24.0 * c) / 6.0,
            q1: (-12.0 * b - 48.0 * c) / 6.0,
            q2: (6.0 * b + 30.0 * c) / 6.0,
            q3: (-b - 6.0 * c) / 6.0,
        }
    }
}

/// Cubic B-spline (B=1, C=0) table, built on first use from any thread.
static CUBIC: LazyLock<CubicCoefficients> = LazyLock::new(|| CubicCoefficients::new(1.0, 0.0));

/// Force the one-time cubic table initialization.
///
/// Idempotent and safe to call concurrently; later callers block until the
/// first one has finished building the table.
pub fn ensure_coefficients() {
    LazyLock::force(&CUBIC);
}

#[inline]
fn cubic(x: f64) -> f64 {
    let k = &*CUBIC;
    if x < 1.0 {
        k.p0 + x * (x * (k.p2 + x * k.p3))
    } else if x < 2.0 {
        k.q0 + x * (k.q1 + x * (k.q2 + x * k.q3))
    } else {
        0.0
    }
}

/// Mitchell-Netravali with B = C = 1/3.
#[inline]
fn mitchell(x: f64) -> f64 {
    if x >= 2.0 {
        0.0
    } else if x >= 1.0 {
        (-7.0 / 18.0) * x * x * x + 2.0 * x * x - (10.0 / 3.0) * x + 16.0 / 9.0
    } else {
        (7.0 / 6.0) * x * x * x - 2.0 * x * x + 8.0 / 9.0
    }
}

/// `sin(πx) / (πx)` for `x >= 0`.
///
/// Up to 4 a rational approximation is used: it only depends on `x²` and is
/// well defined at 0, where the exact quotient is not.
#[inline]
fn sinc_fast(x: f64) -> f64 {
    if x > 4.0 {
        let alpha = PI * x;
        return alpha.sin() / alpha;
    }

    // Maximum absolute relative error 6.3e-6 < 1/2^17.
    const C0: f64 = 0.173610016489197553621906385078711564924e-2;
    const C1: f64 = -0.384186115075660162081071290162149315834e-3;
    const C2: f64 = 0.393684603287860108352720146121813443561e-4;
    const C3: f64 = -0.248947210682259168029030370205389323899e-5;
    const C4: f64 = 0.107791837839662283066379987646635416692e-6;
    const C5: f64 = -0.324874073895735800961260474028013982211e-8;
    const C6: f64 = 0.628155216606695311524920882748052490116e-10;
    const C7: f64 = -0.586110644039348333520104379959307242711e-12;

    let xx = x * x;
    let p = C0 + xx * (C1 + xx * (C2 + xx * (C3 + xx * (C4 + xx * (C5 + xx * (C6 + xx * C7))))));
    (xx - 1.0) * (xx - 4.0) * (xx - 9.0) * (xx - 16.0) * p
}
