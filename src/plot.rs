use super::cli::PlotFormat;
use super::error::{Error, SeqlabResult};
use super::kmeans::{KMeans, Point};
use plotters::coord::Shift;
use plotters::prelude::*;
use std::ops::Range;
use std::path::Path;

pub const PLOT_SIZE: (u32, u32) = (800, 600);

impl PlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PlotFormat::Svg => "svg",
            PlotFormat::Png => "png",
        }
    }
}

fn plot_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Plot(e.to_string())
}

/// Something that can draw itself on any plotters backend.
pub trait Figure {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> SeqlabResult<()>;
}

/// Render `figure` into `path` with the backend matching `format`.
pub fn save<F: Figure>(figure: &F, path: &Path, format: PlotFormat) -> SeqlabResult<()> {
    log::debug!("plotting {}", path.display());
    match format {
        PlotFormat::Svg => {
            let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
            figure.draw(&root)?;
            root.present().map_err(plot_error)
        }
        PlotFormat::Png => {
            let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
            figure.draw(&root)?;
            root.present().map_err(plot_error)
        }
    }
}

/// Axis range covering `values` with 5% padding on both sides.
fn padded_range<I: Iterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
    (lo - pad)..(hi + pad)
}

pub struct Scatter<'a> {
    pub title: String,
    pub points: &'a [Point],
}

impl Figure for Scatter<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> SeqlabResult<()> {
        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                padded_range(self.points.iter().map(|p| p.0)),
                padded_range(self.points.iter().map(|p| p.1)),
            )
            .map_err(plot_error)?;
        chart.configure_mesh().draw().map_err(plot_error)?;
        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|&p| Circle::new(p, 3, BLUE.mix(0.7).filled())),
            )
            .map_err(plot_error)?;
        Ok(())
    }
}

pub struct Elbow<'a> {
    pub title: String,
    /// Inertia for k = 1, 2, ...
    pub inertias: &'a [f64],
    pub chosen_k: usize,
}

impl Figure for Elbow<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> SeqlabResult<()> {
        root.fill(&WHITE).map_err(plot_error)?;
        let curve: Vec<(f64, f64)> = self
            .inertias
            .iter()
            .enumerate()
            .map(|(i, &v)| ((i + 1) as f64, v))
            .collect();
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(
                0.5..(curve.len() as f64 + 0.5),
                padded_range(self.inertias.iter().copied()),
            )
            .map_err(plot_error)?;
        chart
            .configure_mesh()
            .x_desc("k")
            .y_desc("inertia")
            .draw()
            .map_err(plot_error)?;
        chart
            .draw_series(LineSeries::new(curve.iter().copied(), &BLUE))
            .map_err(plot_error)?;
        chart
            .draw_series(curve.iter().map(|&p| {
                let style = if p.0 as usize == self.chosen_k {
                    RED.filled()
                } else {
                    BLUE.filled()
                };
                Circle::new(p, 4, style)
            }))
            .map_err(plot_error)?;
        Ok(())
    }
}

pub struct Clusters<'a> {
    pub title: String,
    pub points: &'a [Point],
    pub fit: &'a KMeans,
}

impl Figure for Clusters<'_> {
    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> SeqlabResult<()> {
        root.fill(&WHITE).map_err(plot_error)?;
        let mut chart = ChartBuilder::on(root)
            .caption(&self.title, ("sans-serif", 24))
            .margin(15)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(
                padded_range(self.points.iter().map(|p| p.0)),
                padded_range(self.points.iter().map(|p| p.1)),
            )
            .map_err(plot_error)?;
        chart.configure_mesh().draw().map_err(plot_error)?;
        chart
            .draw_series(
                self.points
                    .iter()
                    .zip(&self.fit.labels)
                    .map(|(&p, &label)| Circle::new(p, 3, Palette99::pick(label).mix(0.9).filled())),
            )
            .map_err(plot_error)?;
        chart
            .draw_series(
                self.fit
                    .centroids
                    .iter()
                    .map(|&c| Cross::new(c, 8, BLACK.stroke_width(2))),
            )
            .map_err(plot_error)?;
        Ok(())
    }
}
