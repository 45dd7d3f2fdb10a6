//! Pixel sampling: collect the intensities covered by a union of ROIs.
//!
//! Every integer grid position `(px, py)` inside the raster is tested
//! against each ellipse with the normalized membership test. A position
//! covered by several overlapping ROIs contributes its intensity once.
//! Distinct positions with equal intensities all contribute.
//!
//! Positions are visited row-major over the union of the ROI bounding
//! boxes, so the output order is deterministic, though callers must not
//! rely on it.

use image::GrayImage;

use crate::roi::EllipseRoi;

/// Inclusive pixel rectangle clamped to the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bounds {
    x_min: u32,
    y_min: u32,
    x_max: u32,
    y_max: u32,
}

/// Return the intensities of all pixels inside any of `rois`.
///
/// An empty ROI slice, or ROIs lying entirely outside the raster,
/// yield an empty vector.
#[must_use = "returns the sampled intensities"]
pub fn sample(image: &GrayImage, rois: &[EllipseRoi]) -> Vec<u8> {
    let Some(bounds) = union_bounds(image, rois) else {
        return Vec::new();
    };

    let mut samples = Vec::new();
    for py in bounds.y_min..=bounds.y_max {
        for px in bounds.x_min..=bounds.x_max {
            let (x, y) = (f64::from(px), f64::from(py));
            if rois.iter().any(|roi| roi.contains(x, y)) {
                samples.push(image.get_pixel(px, py).0[0]);
            }
        }
    }
    samples
}

/// Union of the ROI bounding boxes, clamped to the raster.
///
/// Returns `None` when there are no ROIs, the raster is empty, or no
/// bounding box overlaps the raster.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn union_bounds(image: &GrayImage, rois: &[EllipseRoi]) -> Option<Bounds> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let max_x = i64::from(width - 1);
    let max_y = i64::from(height - 1);

    let mut union: Option<(i64, i64, i64, i64)> = None;
    for roi in rois {
        let (x0, y0, x1, y1) = roi.pixel_bounds();
        let clamped = (x0.max(0), y0.max(0), x1.min(max_x), y1.min(max_y));
        if clamped.0 > clamped.2 || clamped.1 > clamped.3 {
            continue;
        }
        union = Some(match union {
            None => clamped,
            Some((ux0, uy0, ux1, uy1)) => (
                ux0.min(clamped.0),
                uy0.min(clamped.1),
                ux1.max(clamped.2),
                uy1.max(clamped.3),
            ),
        });
    }

    // All values are within [0, width-1] / [0, height-1] here.
    union.map(|(x0, y0, x1, y1)| Bounds {
        x_min: x0 as u32,
        y_min: y0 as u32,
        x_max: x1 as u32,
        y_max: y1 as u32,
    })
}
