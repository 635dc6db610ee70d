//! Grayscale to black-and-white conversion.
//!
//! Three algorithms: a six-neighbor error diffusion with 1/8 weights
//! (Atkinson-style), classic Floyd-Steinberg, and an adaptive local-mean
//! threshold. Output pixels are strictly 0 (black) or 255 (white).

use image::{GrayImage, Luma};
use imageproc::filter::box_filter;
use tracing::debug;

use crate::config::DitherMethod;

/// Binarization threshold for the error-diffusion paths.
const THRESHOLD: f32 = 128.0;

/// Box radius for the adaptive threshold's local mean (window size 11).
const ADAPTIVE_RADIUS: u32 = 5;

/// Bias subtracted from the local mean; shifts output toward white at
/// local-mean boundaries.
const ADAPTIVE_BIAS: f32 = 5.0;

/// Convert a grayscale image to a same-sized black-and-white bitmap.
pub fn dither(img: &GrayImage, method: DitherMethod) -> GrayImage {
    match method {
        DitherMethod::ErrorDiffusion => error_diffusion(img),
        DitherMethod::FloydSteinberg => floyd_steinberg(img),
        DitherMethod::ThresholdAdaptive => threshold_adaptive(img),
    }
}

/// Six-neighbor error diffusion over a single mutable buffer.
///
/// Each pixel binarizes at > 128, then 1/8 of the error goes to each of
/// (x+1,y), (x+2,y), (x-1,y+1), (x,y+1), (x+1,y+1), (x,y+2) that is in
/// bounds. The remaining 2/8 is discarded on purpose; diffusing it changes
/// the output. Later pixels must see earlier corrections, so the scan reads
/// and writes the same buffer.
fn error_diffusion(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    debug!(width, height, "Applying six-neighbor error diffusion");
    let w = width as usize;
    let h = height as usize;

    let mut buffer: Vec<f32> = img.pixels().map(|p| f32::from(p.0[0])).collect();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old = buffer[idx];
            let new = if old > THRESHOLD { 255.0 } else { 0.0 };
            buffer[idx] = new;
            let share = (old - new) / 8.0;

            if x + 1 < w {
                buffer[idx + 1] += share;
            }
            if x + 2 < w {
                buffer[idx + 2] += share;
            }
            if y + 1 < h {
                let below = idx + w;
                if x > 0 {
                    buffer[below - 1] += share;
                }
                buffer[below] += share;
                if x + 1 < w {
                    buffer[below + 1] += share;
                }
            }
            if y + 2 < h {
                buffer[idx + 2 * w] += share;
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        Luma([if buffer[y as usize * w + x as usize] > THRESHOLD {
            255
        } else {
            0
        }])
    })
}

/// Classic Floyd-Steinberg error diffusion.
///
/// Error distribution: right 7/16, bottom-left 3/16, bottom 5/16,
/// bottom-right 1/16.
fn floyd_steinberg(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    debug!(width, height, "Applying Floyd-Steinberg dithering");
    let w = width as usize;
    let h = height as usize;

    let mut buffer: Vec<i16> = img.pixels().map(|p| i16::from(p.0[0])).collect();

    for y in 0..h {
        for x in 0..w {
            let idx = y * w + x;
            let old = buffer[idx];
            let new: i16 = if old >= THRESHOLD as i16 { 255 } else { 0 };
            buffer[idx] = new;
            let error = old - new;

            if x + 1 < w {
                buffer[idx + 1] += error * 7 / 16;
            }
            if y + 1 < h {
                let below = idx + w;
                if x > 0 {
                    buffer[below - 1] += error * 3 / 16;
                }
                buffer[below] += error * 5 / 16;
                if x + 1 < w {
                    buffer[below + 1] += error / 16;
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        Luma([if buffer[y as usize * w + x as usize] >= THRESHOLD as i16 {
            255
        } else {
            0
        }])
    })
}

/// Threshold against an 11x11 local mean, biased toward white.
fn threshold_adaptive(img: &GrayImage) -> GrayImage {
    let (width, height) = img.dimensions();
    debug!(width, height, "Applying adaptive threshold");
    let mean = box_filter(img, ADAPTIVE_RADIUS, ADAPTIVE_RADIUS);

    GrayImage::from_fn(width, height, |x, y| {
        let value = f32::from(img.get_pixel(x, y).0[0]);
        let local = f32::from(mean.get_pixel(x, y).0[0]);
        Luma([if value > local - ADAPTIVE_BIAS { 255 } else { 0 }])
    })
}
