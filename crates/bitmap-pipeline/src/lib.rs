//! 1-bit conversion pipeline for the nice!view display.
//!
//! Turns an arbitrary decoded grayscale image into a packed 1-bit-per-pixel
//! buffer sized for the display: aspect-ratio-aware scaling with selectable
//! algorithms, contrast preprocessing tuned for bilevel output, selectable
//! dithering, and a row-byte-aligned packing codec with a round-trip decoder
//! for byte-accurate previews.
//!
//! The pipeline is fully synchronous and has no filesystem dependency; it
//! consumes an already-decoded [`GrayImage`] and hands back packed bytes plus
//! the geometry that produced them. Callers that drive a batch of images
//! decide for themselves whether one failed conversion aborts the rest.

pub mod config;
pub mod dither;
pub mod fit;
pub mod pack;
pub mod preprocess;
pub mod scale;

use image::GrayImage;
use tracing::debug;

// Re-exports for convenience
pub use config::{DitherMethod, ProcessingConfig, ScalingMethod};
pub use fit::{Geometry, fit_aspect};
pub use pack::{pack_1bit, packed_len, unpack_1bit};

/// Display width in pixels, as addressed by the packed 1-bit layout.
///
/// The hardware documentation calls the panel 140x68; the packing math uses
/// width 68 and these constants are what define the buffer layout. Do not
/// swap them without confirming against the device's memory layout.
pub const DISPLAY_WIDTH: u32 = 68;

/// Display height in pixels.
pub const DISPLAY_HEIGHT: u32 = 140;

/// Errors that can occur while converting an image for the display.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("invalid dimensions {width}x{height}: both must be positive")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unknown {kind} method: {name}")]
    UnknownMethod { kind: &'static str, name: String },

    #[error("resample collapsed to degenerate size {width}x{height}")]
    DegenerateResample { width: u32, height: u32 },
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Convert a decoded grayscale image into a packed 1-bit buffer for a
/// `target` display size.
///
/// Runs the full pipeline: aspect fit, scaling, bilevel preprocessing,
/// dithering, packing. The returned buffer is always
/// `ceil(target_width / 8) * target_height` bytes; the returned [`Geometry`]
/// records the scaled content size and padding inside the frame.
pub fn convert(
    img: &GrayImage,
    target: (u32, u32),
    config: &ProcessingConfig,
) -> Result<(Vec<u8>, Geometry)> {
    let (target_w, target_h) = target;
    if target_w == 0 || target_h == 0 {
        return Err(PipelineError::InvalidDimensions {
            width: target_w,
            height: target_h,
        });
    }
    let (orig_w, orig_h) = img.dimensions();
    if orig_w == 0 || orig_h == 0 {
        return Err(PipelineError::InvalidDimensions {
            width: orig_w,
            height: orig_h,
        });
    }

    let geometry = if config.maintain_aspect_ratio {
        fit::fit_aspect((orig_w, orig_h), target)
    } else {
        fit::Geometry::full(target)
    };
    debug!(
        orig_w,
        orig_h,
        scaling = %config.scaling,
        dither = %config.dither,
        "Converting image to 1-bit"
    );

    let scaled = scale::scale_for_display(img, geometry, config.scaling)?;
    let enhanced = preprocess::enhance_for_bilevel(&scaled);
    let bitmap = dither::dither(&enhanced, config.dither);
    Ok((pack::pack_1bit(&bitmap), geometry))
}

/// Reconstruct a grayscale image from packed bytes.
///
/// This is the byte-accurate preview path: it renders exactly what the
/// display will show, from the same bytes that get shipped to it.
pub fn decode_for_preview(data: &[u8], width: u32, height: u32) -> GrayImage {
    pack::unpack_1bit(data, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn gradient_image(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            Luma([((x * 255 / width.max(1)) / 2 + (y * 255 / height.max(1)) / 2) as u8])
        })
    }

    #[test]
    fn convert_produces_display_sized_buffer() {
        let img = gradient_image(100, 50);
        let config = ProcessingConfig::default();
        let (packed, geometry) =
            convert(&img, (DISPLAY_WIDTH, DISPLAY_HEIGHT), &config).unwrap();

        assert_eq!(packed.len(), packed_len(DISPLAY_WIDTH, DISPLAY_HEIGHT));
        assert_eq!(geometry, fit_aspect((100, 50), (DISPLAY_WIDTH, DISPLAY_HEIGHT)));
    }

    #[test]
    fn convert_rejects_zero_target() {
        let img = gradient_image(10, 10);
        let config = ProcessingConfig::default();
        let err = convert(&img, (0, 140), &config).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDimensions { .. }));
    }

    #[test]
    fn convert_rejects_empty_source() {
        let img = GrayImage::new(0, 0);
        let config = ProcessingConfig::default();
        let err = convert(&img, (68, 140), &config).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidDimensions { .. }));
    }

    #[test]
    fn convert_without_aspect_ratio_fills_frame() {
        let img = gradient_image(300, 40);
        let config = ProcessingConfig {
            maintain_aspect_ratio: false,
            ..ProcessingConfig::default()
        };
        let (_, geometry) = convert(&img, (68, 140), &config).unwrap();

        assert!(!geometry.needs_padding);
        assert_eq!(geometry.scaled_width, 68);
        assert_eq!(geometry.scaled_height, 140);
        assert_eq!(geometry.pad_left, 0);
        assert_eq!(geometry.pad_top, 0);
    }

    #[test]
    fn preview_matches_target_dimensions() {
        let img = gradient_image(200, 200);
        let config = ProcessingConfig::default();
        let (packed, _) = convert(&img, (DISPLAY_WIDTH, DISPLAY_HEIGHT), &config).unwrap();

        let preview = decode_for_preview(&packed, DISPLAY_WIDTH, DISPLAY_HEIGHT);
        assert_eq!(preview.dimensions(), (DISPLAY_WIDTH, DISPLAY_HEIGHT));
        for pixel in preview.pixels() {
            assert!(pixel.0[0] == 0 || pixel.0[0] == 255);
        }
    }
}
