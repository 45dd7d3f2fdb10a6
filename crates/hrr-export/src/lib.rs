//! hrr-export: Histogram comparison figures (sans-IO).
//!
//! Renders the liver and kidney pixel samples of one record as a
//! side-by-side histogram figure. Callers decide where the bytes go.

pub mod histogram;

pub use histogram::{
    Histogram, HistogramError, HistogramOptions, render_comparison, render_comparison_png,
};
