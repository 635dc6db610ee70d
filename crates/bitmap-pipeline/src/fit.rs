//! Aspect-ratio fitting for the display frame.

use tracing::debug;

/// Placement of scaled content inside the target display frame.
///
/// Computed once per image and passed by value through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub target_width: u32,
    pub target_height: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub pad_left: u32,
    pub pad_top: u32,
    pub needs_padding: bool,
}

impl Geometry {
    /// Geometry that fills the whole target frame with no padding.
    pub fn full((width, height): (u32, u32)) -> Self {
        Self {
            target_width: width,
            target_height: height,
            scaled_width: width,
            scaled_height: height,
            pad_left: 0,
            pad_top: 0,
            needs_padding: false,
        }
    }
}

/// Best-fit scaled size and padding for `orig` within `target`.
///
/// Padding is only introduced when the aspect ratios differ by more than 1%.
/// Horizontal padding is split evenly (content centered); all vertical
/// padding goes above the content, so the image sits at the bottom of the
/// frame. When the ratios are within tolerance the content is scaled
/// directly to the full frame (at most 1% distortion), keeping the output
/// exactly target-sized.
///
/// Both sizes must be positive.
pub fn fit_aspect(orig: (u32, u32), target: (u32, u32)) -> Geometry {
    let (orig_w, orig_h) = orig;
    let (target_w, target_h) = target;
    debug_assert!(orig_w > 0 && orig_h > 0 && target_w > 0 && target_h > 0);

    let orig_aspect = f64::from(orig_w) / f64::from(orig_h);
    let target_aspect = f64::from(target_w) / f64::from(target_h);
    let needs_padding = ((orig_aspect - target_aspect) / target_aspect).abs() > 0.01;

    if !needs_padding {
        debug!(orig_w, orig_h, "Aspect ratios match, scaling to full frame");
        return Geometry::full(target);
    }

    let scale =
        (f64::from(target_w) / f64::from(orig_w)).min(f64::from(target_h) / f64::from(orig_h));
    let scaled_width = (f64::from(orig_w) * scale) as u32;
    let scaled_height = (f64::from(orig_h) * scale) as u32;

    let pad_left = (target_w - scaled_width) / 2;
    let pad_top = target_h - scaled_height;
    debug!(
        orig_w,
        orig_h,
        scaled_width,
        scaled_height,
        pad_left,
        pad_top,
        "Letterboxing to preserve aspect ratio"
    );

    Geometry {
        target_width: target_w,
        target_height: target_h,
        scaled_width,
        scaled_height,
        pad_left,
        pad_top,
        needs_padding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_image_is_bottom_aligned() {
        let g = fit_aspect((100, 50), (68, 140));

        assert_eq!(g.scaled_width, 68);
        assert_eq!(g.scaled_height, 34);
        assert!(g.needs_padding);
        assert_eq!(g.pad_left, 0);
        assert_eq!(g.pad_top, 106);
    }

    #[test]
    fn square_into_square_needs_no_padding() {
        for (s, t) in [(37, 120), (1, 1), (500, 68)] {
            let g = fit_aspect((s, s), (t, t));
            assert!(!g.needs_padding, "({s},{s}) into ({t},{t})");
            assert_eq!(g.pad_left, 0);
            assert_eq!(g.pad_top, 0);
            assert_eq!((g.scaled_width, g.scaled_height), (t, t));
        }
    }

    #[test]
    fn tall_image_is_centered_horizontally() {
        // 50x200 into 68x140: height limits, scale 0.7 -> 35x140
        let g = fit_aspect((50, 200), (68, 140));

        assert_eq!(g.scaled_width, 35);
        assert_eq!(g.scaled_height, 140);
        assert_eq!(g.pad_left, 16);
        assert_eq!(g.pad_top, 0);
    }

    #[test]
    fn matching_aspect_fills_frame_exactly() {
        // Exactly 2x the target on both axes
        let g = fit_aspect((136, 280), (68, 140));
        assert!(!g.needs_padding);
        assert_eq!((g.scaled_width, g.scaled_height), (68, 140));
    }

    #[test]
    fn near_matching_aspect_snaps_to_frame() {
        // 137x280 is within the 1% aspect tolerance of 68x140
        let g = fit_aspect((137, 280), (68, 140));
        assert!(!g.needs_padding);
        assert_eq!((g.scaled_width, g.scaled_height), (68, 140));
    }

    #[test]
    fn target_frame_is_recorded() {
        let g = fit_aspect((100, 50), (68, 140));
        assert_eq!(g.target_width, 68);
        assert_eq!(g.target_height, 140);
    }
}
