//! Line plot of average return against training step
//!
//! Writes `training.svg` and `training.png` into the output directory,
//! overwriting both on every call.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use super::ReturnReporter;
use crate::error::{Result, Ri2048Error};
use crate::metrics::ReturnHistory;

pub const SVG_FILE: &str = "training.svg";
pub const PNG_FILE: &str = "training.png";

/// Figure size in inches
const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);
/// Pixels per inch of the vector output
const SVG_DPI: u32 = 100;

/// Points of the return curve: `(index * eval_interval, average_return)`
pub fn return_curve(history: &ReturnHistory, eval_interval: usize) -> Vec<(f64, f64)> {
    history
        .as_slice()
        .iter()
        .enumerate()
        .map(|(index, &value)| ((index * eval_interval) as f64, value as f64))
        .collect()
}

/// Pixel size of a 6.4 x 4.8 inch figure at `dpi`
pub fn figure_size(dpi: u32) -> (u32, u32) {
    (
        (FIGURE_INCHES.0 * dpi as f64).round() as u32,
        (FIGURE_INCHES.1 * dpi as f64).round() as u32,
    )
}

/// Writes the return curve as SVG and PNG
#[derive(Debug, Clone)]
pub struct PlotReporter {
    output_dir: PathBuf,
    eval_interval: usize,
    raster_dpi: u32,
}

impl PlotReporter {
    /// Create the reporter, creating `output_dir` if needed
    pub fn new(output_dir: impl Into<PathBuf>, eval_interval: usize, raster_dpi: u32) -> Result<Self> {
        if raster_dpi == 0 {
            return Err(Ri2048Error::InvalidConfig(
                "raster_dpi must be at least 1".to_string(),
            ));
        }

        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            eval_interval,
            raster_dpi,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn svg_path(&self) -> PathBuf {
        self.output_dir.join(SVG_FILE)
    }

    pub fn png_path(&self) -> PathBuf {
        self.output_dir.join(PNG_FILE)
    }

    pub fn raster_size(&self) -> (u32, u32) {
        figure_size(self.raster_dpi)
    }
}

impl ReturnReporter for PlotReporter {
    fn report(&mut self, returns: &ReturnHistory) -> Result<()> {
        let points = return_curve(returns, self.eval_interval);

        let svg_path = self.svg_path();
        draw_curve(
            SVGBackend::new(&svg_path, figure_size(SVG_DPI)).into_drawing_area(),
            &points,
        )?;

        let png_path = self.png_path();
        draw_curve(
            BitMapBackend::new(&png_path, self.raster_size()).into_drawing_area(),
            &points,
        )?;

        debug!(points = points.len(), dir = %self.output_dir.display(), "wrote return plot");
        Ok(())
    }
}

fn plot_error<E: std::fmt::Display>(err: E) -> Ri2048Error {
    Ri2048Error::Plot(err.to_string())
}

/// Axis ranges covering all points, never empty
fn axis_ranges(points: &[(f64, f64)]) -> (Range<f64>, Range<f64>) {
    let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max).max(1.0);

    let (y_min, y_max) = points
        .iter()
        .map(|p| p.1)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });

    let (y_min, y_max) = if !y_min.is_finite() || !y_max.is_finite() {
        (0.0, 1.0)
    } else if y_min == y_max {
        (y_min - 1.0, y_max + 1.0)
    } else {
        let pad = (y_max - y_min) * 0.05;
        (y_min - pad, y_max + pad)
    };

    (0.0..x_max, y_min..y_max)
}

fn draw_curve<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    points: &[(f64, f64)],
) -> Result<()> {
    root.fill(&WHITE).map_err(plot_error)?;

    let (x_range, y_range) = axis_ranges(points);
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .x_desc("Step")
        .y_desc("Average Return")
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(points.iter().copied(), &BLUE))
        .map_err(plot_error)?;
    chart
        .draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, BLUE.filled())),
        )
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}
