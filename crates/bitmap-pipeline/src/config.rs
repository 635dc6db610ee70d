//! Per-image processing configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PipelineError;

/// Scaling algorithm for fitting the source image to the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMethod {
    /// Pick one of the other methods based on edge density and reduction factor.
    Adaptive,
    /// Lanczos resample with a nearest-neighbor-scaled edge map boosting edge pixels.
    EdgePreserving,
    /// Staged multi-pass resize tuned to the reduction factor.
    ContentAware,
    /// Box average: each output pixel is the mean of its source region.
    AreaSampling,
}

impl ScalingMethod {
    pub const ALL: [ScalingMethod; 4] = [
        ScalingMethod::Adaptive,
        ScalingMethod::EdgePreserving,
        ScalingMethod::ContentAware,
        ScalingMethod::AreaSampling,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ScalingMethod::Adaptive => "adaptive",
            ScalingMethod::EdgePreserving => "edge_preserving",
            ScalingMethod::ContentAware => "content_aware",
            ScalingMethod::AreaSampling => "area_sampling",
        }
    }
}

impl fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalingMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "adaptive" => Ok(ScalingMethod::Adaptive),
            "edge_preserving" => Ok(ScalingMethod::EdgePreserving),
            "content_aware" => Ok(ScalingMethod::ContentAware),
            "area_sampling" => Ok(ScalingMethod::AreaSampling),
            _ => Err(PipelineError::UnknownMethod {
                kind: "scaling",
                name: s.to_string(),
            }),
        }
    }
}

/// Dithering algorithm for the grayscale to 1-bit conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DitherMethod {
    /// Six-neighbor error diffusion with 1/8 weights (Atkinson-style).
    ErrorDiffusion,
    /// Classic Floyd-Steinberg four-neighbor diffusion.
    FloydSteinberg,
    /// Local-mean threshold with a bias toward white.
    ThresholdAdaptive,
}

impl DitherMethod {
    pub const ALL: [DitherMethod; 3] = [
        DitherMethod::ErrorDiffusion,
        DitherMethod::FloydSteinberg,
        DitherMethod::ThresholdAdaptive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DitherMethod::ErrorDiffusion => "error_diffusion",
            DitherMethod::FloydSteinberg => "floyd_steinberg",
            DitherMethod::ThresholdAdaptive => "threshold_adaptive",
        }
    }
}

impl fmt::Display for DitherMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DitherMethod {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error_diffusion" => Ok(DitherMethod::ErrorDiffusion),
            "floyd_steinberg" => Ok(DitherMethod::FloydSteinberg),
            "threshold_adaptive" => Ok(DitherMethod::ThresholdAdaptive),
            _ => Err(PipelineError::UnknownMethod {
                kind: "dither",
                name: s.to_string(),
            }),
        }
    }
}

/// Settings for one image conversion, fixed for its duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub scaling: ScalingMethod,
    pub dither: DitherMethod,
    /// Letterbox into the display frame instead of squashing to fill it.
    pub maintain_aspect_ratio: bool,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            scaling: ScalingMethod::ContentAware,
            dither: DitherMethod::ErrorDiffusion,
            maintain_aspect_ratio: true,
        }
    }
}
