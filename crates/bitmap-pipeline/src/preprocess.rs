//! Grayscale preprocessing ahead of bilevel thresholding.
//!
//! Three passes, in order: local contrast against a 5x5 neighborhood mean,
//! unsharp-mask sharpening, and a global contrast boost about mid-gray.
//! Every step saturates into [0, 255].

use image::imageops;
use image::GrayImage;
use imageproc::filter::box_filter;
use tracing::debug;

/// Strength of the push away from the local neighborhood mean.
const LOCAL_CONTRAST: f32 = 0.3;

/// Box radius for the local mean (window size 5).
const LOCAL_MEAN_RADIUS: u32 = 2;

/// Gaussian sigma for the unsharp mask.
const UNSHARP_SIGMA: f32 = 0.8;

/// Unsharp mask strength (150%).
const UNSHARP_AMOUNT: f32 = 1.5;

/// Minimum brightness delta that gets sharpened; smaller deltas pass through.
const UNSHARP_THRESHOLD: f32 = 3.0;

/// Global contrast factor about mid-gray.
const CONTRAST_FACTOR: f32 = 1.4;

/// Mid-gray pivot for the global contrast boost.
const MID_GRAY: f32 = 128.0;

/// Prepare a scaled grayscale image for 1-bit conversion.
pub fn enhance_for_bilevel(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    debug!(width, height, "Enhancing for bilevel output");

    let contrasted = local_contrast(img);
    let sharpened = unsharp_mask(&contrasted);
    global_contrast(&sharpened)
}

/// Push each pixel away from its 5x5 neighborhood mean.
fn local_contrast(img: &GrayImage) -> GrayImage {
    let mean = box_filter(img, LOCAL_MEAN_RADIUS, LOCAL_MEAN_RADIUS);
    let mut out = img.clone();
    for (pixel, m) in out.pixels_mut().zip(mean.pixels()) {
        let value = f32::from(pixel.0[0]);
        let adjusted = value + LOCAL_CONTRAST * (value - f32::from(m.0[0]));
        pixel.0[0] = adjusted.clamp(0.0, 255.0) as u8;
    }
    out
}

/// Unsharp mask: amplify the difference from a gaussian blur, but leave
/// pixels alone when the difference is under the threshold.
fn unsharp_mask(img: &GrayImage) -> GrayImage {
    let blurred = imageops::blur(img, UNSHARP_SIGMA);
    let mut out = img.clone();
    for (pixel, b) in out.pixels_mut().zip(blurred.pixels()) {
        let value = f32::from(pixel.0[0]);
        let diff = value - f32::from(b.0[0]);
        if diff.abs() >= UNSHARP_THRESHOLD {
            pixel.0[0] = (value + UNSHARP_AMOUNT * diff).clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Scale each pixel's deviation from mid-gray by the contrast factor.
fn global_contrast(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    for pixel in out.pixels_mut() {
        let value = f32::from(pixel.0[0]);
        let adjusted = MID_GRAY + CONTRAST_FACTOR * (value - MID_GRAY);
        pixel.0[0] = adjusted.clamp(0.0, 255.0) as u8;
    }
    out
}
