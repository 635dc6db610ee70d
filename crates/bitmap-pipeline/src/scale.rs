//! Display-size scaling tuned for 1-bit output.
//!
//! Four interchangeable algorithms: an adaptive dispatcher, edge-preserving
//! Lanczos with an edge-map boost, staged content-aware resizing, and true
//! box-average area sampling. After scaling, letterbox padding places the
//! content on a black canvas when the geometry calls for it.

use image::imageops::{self, FilterType};
use image::{GrayImage, Luma};
use imageproc::filter::filter3x3;
use tracing::debug;

use crate::config::ScalingMethod;
use crate::fit::Geometry;
use crate::{PipelineError, Result};

/// Intensity step between vertically adjacent pixels that counts as an edge.
const EDGE_GRADIENT_THRESHOLD: i16 = 20;

/// Edge-pixel fraction above which the adaptive dispatcher goes edge-preserving.
const EDGE_DENSITY_CUTOFF: f64 = 0.1;

/// Reduction factor above which the adaptive dispatcher goes content-aware.
const ADAPTIVE_REDUCTION_CUTOFF: f64 = 10.0;

/// 3x3 Laplacian-style edge detection kernel.
const EDGE_KERNEL: [f32; 9] = [-1.0, -1.0, -1.0, -1.0, 8.0, -1.0, -1.0, -1.0, -1.0];

/// Scaled edge magnitude above which a pixel gets its intensity boosted.
const EDGE_BOOST_THRESHOLD: u8 = 30;

/// Intensity multiplier for edge pixels in edge-preserving scaling.
const EDGE_BOOST: f32 = 1.2;

/// Scale `img` to the geometry's content size with the given method, then
/// apply letterbox padding onto a black target-sized canvas if required.
///
/// Fails with [`PipelineError::DegenerateResample`] when the scaled size has
/// a zero dimension (extreme aspect ratios can floor a side to zero).
pub fn scale_for_display(
    img: &GrayImage,
    geometry: Geometry,
    method: ScalingMethod,
) -> Result<GrayImage> {
    let (scaled_w, scaled_h) = (geometry.scaled_width, geometry.scaled_height);
    if scaled_w == 0 || scaled_h == 0 {
        return Err(PipelineError::DegenerateResample {
            width: scaled_w,
            height: scaled_h,
        });
    }

    let scaled = match method {
        // Pure dispatch: the result must be identical to calling the
        // selected method directly.
        ScalingMethod::Adaptive => {
            return scale_for_display(img, geometry, select_method(img, scaled_w, scaled_h));
        }
        ScalingMethod::EdgePreserving => edge_preserving(img, scaled_w, scaled_h),
        ScalingMethod::ContentAware => content_aware(img, scaled_w, scaled_h),
        ScalingMethod::AreaSampling => area_sampling(img, scaled_w, scaled_h),
    };

    Ok(apply_padding(scaled, geometry))
}

/// Decide which concrete method the adaptive path uses for this image.
fn select_method(img: &GrayImage, scaled_w: u32, scaled_h: u32) -> ScalingMethod {
    let density = edge_density(img);
    let reduction = reduction_factor(img.dimensions(), (scaled_w, scaled_h));

    if density > EDGE_DENSITY_CUTOFF {
        debug!(density, "High edge density, using edge-preserving scaling");
        ScalingMethod::EdgePreserving
    } else if reduction > ADAPTIVE_REDUCTION_CUTOFF {
        debug!(reduction, "High reduction factor, using content-aware scaling");
        ScalingMethod::ContentAware
    } else {
        debug!(density, reduction, "Standard content, using area sampling");
        ScalingMethod::AreaSampling
    }
}

/// Fraction of vertically adjacent pixel pairs whose intensity step exceeds
/// the gradient threshold, relative to the total pixel count.
fn edge_density(img: &GrayImage) -> f64 {
    let (width, height) = img.dimensions();
    if height < 2 {
        return 0.0;
    }

    let mut edges = 0u64;
    for y in 0..height - 1 {
        for x in 0..width {
            let a = i16::from(img.get_pixel(x, y).0[0]);
            let b = i16::from(img.get_pixel(x, y + 1).0[0]);
            if (b - a).abs() > EDGE_GRADIENT_THRESHOLD {
                edges += 1;
            }
        }
    }
    edges as f64 / (u64::from(width) * u64::from(height)) as f64
}

fn reduction_factor((orig_w, orig_h): (u32, u32), (scaled_w, scaled_h): (u32, u32)) -> f64 {
    (f64::from(orig_w) / f64::from(scaled_w)).max(f64::from(orig_h) / f64::from(scaled_h))
}

/// Lanczos resample plus an edge map scaled with nearest-neighbor (so edges
/// stay crisp); pixels under strong edges get their intensity boosted.
fn edge_preserving(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    debug!(width, height, "Edge-preserving scaling");
    let edges = filter3x3::<Luma<u8>, f32, u8>(img, &EDGE_KERNEL);

    let mut scaled = imageops::resize(img, width, height, FilterType::Lanczos3);
    let edges_scaled = imageops::resize(&edges, width, height, FilterType::Nearest);

    for (pixel, edge) in scaled.pixels_mut().zip(edges_scaled.pixels()) {
        if edge.0[0] > EDGE_BOOST_THRESHOLD {
            pixel.0[0] = (f32::from(pixel.0[0]) * EDGE_BOOST).clamp(0.0, 255.0) as u8;
        }
    }
    scaled
}

/// Staged resize keyed to the reduction factor: heavy reductions go through
/// intermediate sizes so fine detail survives the final pass.
fn content_aware(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (orig_w, orig_h) = img.dimensions();
    let reduction = reduction_factor((orig_w, orig_h), (width, height));
    debug!(width, height, reduction, "Content-aware scaling");

    if reduction > 8.0 {
        // Three stages: third of original, 1.5x target, target. A very
        // narrow source can floor a stage dimension to zero, which would
        // erase all content; hold each side at 1.
        let stage1 = imageops::resize(
            img,
            (orig_w / 3).max(1),
            (orig_h / 3).max(1),
            FilterType::Lanczos3,
        );
        let stage2 = imageops::resize(
            &stage1,
            (f64::from(width) * 1.5) as u32,
            (f64::from(height) * 1.5) as u32,
            FilterType::CatmullRom,
        );
        imageops::resize(&stage2, width, height, FilterType::Lanczos3)
    } else if reduction > 4.0 {
        // Two stages: 2x target, then target
        let stage = imageops::resize(img, width * 2, height * 2, FilterType::Lanczos3);
        imageops::resize(&stage, width, height, FilterType::CatmullRom)
    } else {
        imageops::resize(img, width, height, FilterType::Lanczos3)
    }
}

/// Box resample: each output pixel is the average of its source region, with
/// partial source pixels weighted by how much of them the region covers.
fn area_sampling(img: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (orig_w, orig_h) = img.dimensions();
    debug!(width, height, "Area-sampling scaling");
    let x_ratio = f64::from(orig_w) / f64::from(width);
    let y_ratio = f64::from(orig_h) / f64::from(height);

    GrayImage::from_fn(width, height, |out_x, out_y| {
        let x0 = f64::from(out_x) * x_ratio;
        let x1 = (f64::from(out_x + 1) * x_ratio).min(f64::from(orig_w));
        let y0 = f64::from(out_y) * y_ratio;
        let y1 = (f64::from(out_y + 1) * y_ratio).min(f64::from(orig_h));

        let mut sum = 0.0;
        let mut area = 0.0;
        let mut src_y = y0.floor() as u32;
        while f64::from(src_y) < y1 {
            let cover_y = f64::from(src_y + 1).min(y1) - f64::from(src_y).max(y0);
            let mut src_x = x0.floor() as u32;
            while f64::from(src_x) < x1 {
                let cover_x = f64::from(src_x + 1).min(x1) - f64::from(src_x).max(x0);
                let weight = cover_x * cover_y;
                sum += f64::from(img.get_pixel(src_x, src_y).0[0]) * weight;
                area += weight;
                src_x += 1;
            }
            src_y += 1;
        }
        Luma([(sum / area).round().clamp(0.0, 255.0) as u8])
    })
}

/// Copy the scaled content onto a black target-sized canvas at its padding
/// offset. Without padding the scaled image already is the final frame.
fn apply_padding(scaled: GrayImage, geometry: Geometry) -> GrayImage {
    if !geometry.needs_padding || (geometry.pad_left == 0 && geometry.pad_top == 0) {
        return scaled;
    }

    debug!(
        pad_left = geometry.pad_left,
        pad_top = geometry.pad_top,
        "Padding content onto black canvas"
    );
    let mut canvas = GrayImage::new(geometry.target_width, geometry.target_height);
    imageops::replace(
        &mut canvas,
        &scaled,
        i64::from(geometry.pad_left),
        i64::from(geometry.pad_top),
    );
    canvas
}
