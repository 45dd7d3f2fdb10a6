//! Side-by-side intensity histograms for the two structures.
//!
//! The figure has two panels of equal size: liver on the left in blue,
//! kidney on the right in yellow. Both panels share the vertical scale
//! (the tallest bin across both), and each spans its own sample's
//! intensity range like a default histogram plot. A red line marks each
//! structure's mean and a light red band spans one standard deviation
//! either side of it.
//!
//! This is a pure function with no I/O: it returns an [`RgbaImage`] or
//! PNG bytes.

use hrr_pipeline::{Structure, describe};
use image::{ImageEncoder, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use tiny_skia::{Color, LineCap, Paint, PathBuilder, Pixmap, Rect, Stroke, Transform};

/// Inner padding of each panel, in pixels.
const MARGIN_PX: u16 = 24;

/// Errors that can occur while producing a histogram figure.
#[derive(Debug, thiserror::Error)]
pub enum HistogramError {
    /// Options would produce an empty figure.
    #[error("invalid histogram options: {0}")]
    InvalidOptions(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    PngEncode(#[from] image::ImageError),
}

/// Layout of the comparison figure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramOptions {
    /// Number of equal-width bins per panel.
    pub bins: usize,
    /// Width of one panel in pixels (the figure is twice as wide).
    pub panel_width: u32,
    /// Height of the figure in pixels.
    pub panel_height: u32,
}

impl HistogramOptions {
    /// Default bin count.
    pub const DEFAULT_BINS: usize = 30;
    /// Default panel width.
    pub const DEFAULT_PANEL_WIDTH: u32 = 600;
    /// Default panel height.
    pub const DEFAULT_PANEL_HEIGHT: u32 = 600;

    fn validate(&self) -> Result<(), HistogramError> {
        if self.bins == 0 {
            return Err(HistogramError::InvalidOptions("bins must be at least 1".into()));
        }
        let min_side = 2 * u32::from(MARGIN_PX) + 1;
        if self.panel_width < min_side || self.panel_height < min_side {
            return Err(HistogramError::InvalidOptions(format!(
                "panels must be at least {min_side}x{min_side} pixels, got {}x{}",
                self.panel_width, self.panel_height
            )));
        }
        Ok(())
    }
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            bins: Self::DEFAULT_BINS,
            panel_width: Self::DEFAULT_PANEL_WIDTH,
            panel_height: Self::DEFAULT_PANEL_HEIGHT,
        }
    }
}

/// Equal-width bin counts over `[lo, hi]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    /// Left edge of the first bin.
    pub lo: f64,
    /// Right edge of the last bin.
    pub hi: f64,
    /// Count per bin; the last bin includes `hi`.
    pub counts: Vec<u32>,
}

impl Histogram {
    /// Bin `samples` into `bins` equal-width bins spanning their range.
    ///
    /// A constant sample gets the unit range centred on its value. An
    /// empty sample gives all-zero counts over `[0, 1]`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_samples(samples: &[u8], bins: usize) -> Self {
        let bins = bins.max(1);
        let mut counts = vec![0u32; bins];

        let (Some(&min), Some(&max)) = (samples.iter().min(), samples.iter().max()) else {
            return Self {
                lo: 0.0,
                hi: 1.0,
                counts,
            };
        };
        let (lo, hi) = if min == max {
            (f64::from(min) - 0.5, f64::from(max) + 0.5)
        } else {
            (f64::from(min), f64::from(max))
        };

        let width = (hi - lo) / bins as f64;
        for &v in samples {
            let idx = ((f64::from(v) - lo) / width).floor() as usize;
            counts[idx.min(bins - 1)] += 1;
        }

        Self { lo, hi, counts }
    }

    /// Tallest bin.
    #[must_use]
    pub fn max_count(&self) -> u32 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Bar colour for each structure.
const fn structure_color(structure: Structure) -> [u8; 4] {
    match structure {
        Structure::Liver => [0, 0, 255, 179],
        Structure::Kidney => [255, 255, 0, 179],
    }
}

/// Render the liver/kidney comparison figure.
///
/// # Errors
///
/// Returns [`HistogramError::InvalidOptions`] for zero bins, panels
/// too small to hold the plot margins, or a figure too large to allocate.
pub fn render_comparison(
    liver: &[u8],
    kidney: &[u8],
    options: &HistogramOptions,
) -> Result<RgbaImage, HistogramError> {
    options.validate()?;

    let height = options.panel_height;
    let width = options.panel_width.checked_mul(2).ok_or_else(|| {
        HistogramError::InvalidOptions(format!(
            "panel width {} is too large for a two-panel figure",
            options.panel_width
        ))
    })?;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        HistogramError::InvalidOptions(format!("cannot allocate {width}x{height} figure"))
    })?;
    pixmap.fill(Color::WHITE);

    let liver_hist = Histogram::from_samples(liver, options.bins);
    let kidney_hist = Histogram::from_samples(kidney, options.bins);
    let y_max = liver_hist.max_count().max(kidney_hist.max_count());

    let margin = f32::from(MARGIN_PX);
    for (offset, structure, hist, samples) in [
        (0, Structure::Liver, &liver_hist, liver),
        (options.panel_width, Structure::Kidney, &kidney_hist, kidney),
    ] {
        #[allow(clippy::cast_precision_loss)]
        let panel = PanelGeometry {
            left: offset as f32 + margin,
            top: margin,
            width: 2.0f32.mul_add(-margin, options.panel_width as f32),
            height: 2.0f32.mul_add(-margin, options.panel_height as f32),
        };
        draw_panel(&mut pixmap, &panel, structure, hist, samples, y_max);
    }

    Ok(pixmap_to_rgba(&pixmap))
}

/// Render the comparison figure and encode it as PNG.
///
/// # Errors
///
/// Returns [`HistogramError::InvalidOptions`] for unusable options and
/// [`HistogramError::PngEncode`] if encoding fails.
pub fn render_comparison_png(
    liver: &[u8],
    kidney: &[u8],
    options: &HistogramOptions,
) -> Result<Vec<u8>, HistogramError> {
    let img = render_comparison(liver, kidney, options)?;
    let mut png_bytes = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
    encoder.write_image(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(png_bytes)
}

/// Plot area of one panel, in figure pixels.
struct PanelGeometry {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl PanelGeometry {
    fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn draw_panel(
    pixmap: &mut Pixmap,
    panel: &PanelGeometry,
    structure: Structure,
    hist: &Histogram,
    samples: &[u8],
    y_max: u32,
) {
    let summary = describe(samples);
    let to_x = |value: f64| {
        let t = ((value - hist.lo) / (hist.hi - hist.lo)).clamp(0.0, 1.0) as f32;
        t.mul_add(panel.width, panel.left)
    };

    // Mean ± std band, under the bars.
    if let Some(summary) = summary {
        let (x0, x1) = (to_x(summary.mean - summary.std), to_x(summary.mean + summary.std));
        if let Some(rect) = Rect::from_ltrb(x0, panel.top, x1, panel.bottom()) {
            let mut paint = Paint::default();
            paint.set_color_rgba8(220, 0, 0, 40);
            paint.anti_alias = false;
            pixmap.fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    let [r, g, b, a] = structure_color(structure);
    let mut bar_paint = Paint::default();
    bar_paint.set_color_rgba8(r, g, b, a);
    bar_paint.anti_alias = false;

    let bar_width = panel.width / hist.counts.len() as f32;
    if y_max > 0 {
        for (i, &count) in hist.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let bar_height = count as f32 / y_max as f32 * panel.height;
            let x = (i as f32).mul_add(bar_width, panel.left);
            if let Some(rect) =
                Rect::from_xywh(x, panel.bottom() - bar_height, bar_width, bar_height)
            {
                pixmap.fill_rect(rect, &bar_paint, Transform::identity(), None);
            }
        }
    }

    // Mean marker.
    if let Some(summary) = summary {
        let x = to_x(summary.mean);
        let mut pb = PathBuilder::new();
        pb.move_to(x, panel.top);
        pb.line_to(x, panel.bottom());
        if let Some(path) = pb.finish() {
            let mut paint = Paint::default();
            paint.set_color_rgba8(220, 0, 0, 255);
            paint.anti_alias = true;
            let stroke = Stroke {
                width: 2.0,
                line_cap: LineCap::Butt,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }

    // Axes: baseline and left edge.
    let mut pb = PathBuilder::new();
    pb.move_to(panel.left, panel.top);
    pb.line_to(panel.left, panel.bottom());
    pb.line_to(panel.left + panel.width, panel.bottom());
    if let Some(path) = pb.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = true;
        let stroke = Stroke {
            width: 1.5,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }
}

/// Convert a pixmap (premultiplied RGBA) to an `RgbaImage` (straight RGBA).
#[allow(clippy::cast_possible_truncation)]
fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let data = pixmap.data();
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());
    for (i, pixel) in img.pixels_mut().enumerate() {
        let off = i * 4;
        let a = data[off + 3];
        if a == 0 {
            *pixel = Rgba([0, 0, 0, 0]);
        } else {
            // Un-premultiply: channel = premultiplied * 255 / alpha.
            let r = u16::from(data[off]) * 255 / u16::from(a);
            let g = u16::from(data[off + 1]) * 255 / u16::from(a);
            let b = u16::from(data[off + 2]) * 255 / u16::from(a);
            *pixel = Rgba([r as u8, g as u8, b as u8, a]);
        }
    }
    img
}
