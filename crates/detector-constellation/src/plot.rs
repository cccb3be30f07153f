//! All-sky plots of detector pointings
//!
//! Pointings are drawn on a Mollweide (equal-area) projection in the
//! astronomical convention: centered on RA 180°, RA increasing to the left.

use crate::generator::ConstellationGenerator;
use crate::{ConstellationError, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};
use std::fs;
use std::path::Path;
use tracing::info;

/// Half-width of the projected sky (x range is ±2√2)
const HALF_WIDTH: f64 = 2.0 * SQRT_2;
/// Half-height of the projected sky (y range is ±√2)
const HALF_HEIGHT: f64 = SQRT_2;

const MERIDIAN_STEP_DEG: f64 = 30.0;
const PARALLEL_STEP_DEG: f64 = 15.0;

/// Auxiliary angle θ solving 2θ + sin 2θ = π sin φ
fn auxiliary_angle(lat: f64) -> f64 {
    if (FRAC_PI_2 - lat.abs()).abs() < 1e-9 {
        return lat.signum() * FRAC_PI_2;
    }

    let target = PI * lat.sin();
    let mut theta = lat;
    for _ in 0..50 {
        let f = 2.0 * theta + (2.0 * theta).sin() - target;
        let df = 2.0 + 2.0 * (2.0 * theta).cos();
        if df.abs() < 1e-15 {
            break;
        }
        let step = f / df;
        theta -= step;
        if step.abs() < 1e-12 {
            break;
        }
    }
    theta
}

/// Project a longitude offset from the center meridian (degrees, positive
/// to the right) and a latitude onto the Mollweide plane.
fn project(lon_deg: f64, lat_deg: f64) -> (f64, f64) {
    let theta = auxiliary_angle(lat_deg.to_radians());
    let x = HALF_WIDTH / PI * lon_deg.to_radians() * theta.cos();
    let y = SQRT_2 * theta.sin();
    (x, y)
}

/// Mollweide position of a sky direction (astronomical orientation)
pub fn mollweide(ra_deg: f64, dec_deg: f64) -> (f64, f64) {
    let ra = ra_deg.rem_euclid(360.0);
    project(180.0 - ra, dec_deg)
}

/// One detector pointing on the sky plot
#[derive(Debug, Clone, PartialEq)]
pub struct SkyPoint {
    pub name: String,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub marker_size: u32,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 640,
            marker_size: 5,
        }
    }
}

/// Renderable all-sky figure of detector pointings
#[derive(Debug, Clone)]
pub struct SkyPlot {
    points: Vec<SkyPoint>,
    style: PlotStyle,
}

fn plot_error<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> ConstellationError {
    ConstellationError::Plot(err.to_string())
}

impl SkyPlot {
    pub fn points(&self) -> &[SkyPoint] {
        &self.points
    }

    pub fn style(&self) -> &PlotStyle {
        &self.style
    }

    pub fn with_style(mut self, style: PlotStyle) -> Self {
        self.style = style;
        self
    }

    pub fn to_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.style.width, self.style.height))
                .into_drawing_area();
            self.draw(&root)?;
        }
        Ok(svg)
    }

    pub fn save_svg(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_svg()?)?;
        info!("Sky plot saved to {:?}", path);
        Ok(())
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let root =
            BitMapBackend::new(path, (self.style.width, self.style.height)).into_drawing_area();
        self.draw(&root)?;
        info!("Sky plot saved to {:?}", path);
        Ok(())
    }

    /// Pick the backend from the file extension (`.png`, anything else is SVG)
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("png") => self.save_png(path),
            _ => self.save_svg(path),
        }
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE).map_err(plot_error)?;

        // No captions or labels: the projection has no meaningful axes
        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .build_cartesian_2d(-HALF_WIDTH..HALF_WIDTH, -HALF_HEIGHT..HALF_HEIGHT)
            .map_err(plot_error)?;

        // Graticule
        let grid = BLACK.mix(0.2).stroke_width(1);
        let mut lon = -180.0;
        while lon <= 180.0 {
            let meridian: Vec<(f64, f64)> = (-90..=90).map(|lat| project(lon, lat as f64)).collect();
            chart
                .draw_series(LineSeries::new(meridian, grid))
                .map_err(plot_error)?;
            lon += MERIDIAN_STEP_DEG;
        }
        let mut lat = -90.0 + PARALLEL_STEP_DEG;
        while lat < 90.0 {
            let parallel = vec![project(-180.0, lat), project(180.0, lat)];
            chart
                .draw_series(LineSeries::new(parallel, grid))
                .map_err(plot_error)?;
            lat += PARALLEL_STEP_DEG;
        }

        // Outline
        let outline: Vec<(f64, f64)> = (-90..=90)
            .map(|lat| project(180.0, lat as f64))
            .chain((-90..=90).rev().map(|lat| project(-180.0, lat as f64)))
            .collect();
        chart
            .draw_series(LineSeries::new(outline, BLACK.stroke_width(1)))
            .map_err(plot_error)?;

        let marker = BLUE.mix(0.4).filled();
        let size = self.style.marker_size;
        chart
            .draw_series(
                self.points
                    .iter()
                    .map(|p| Circle::new((p.x, p.y), size, marker)),
            )
            .map_err(plot_error)?;

        root.present().map_err(plot_error)?;
        Ok(())
    }
}

impl ConstellationGenerator {
    /// Project every detector pointing onto an all-sky plot.
    ///
    /// Fails with [`ConstellationError::EmptyConstellation`] when there is
    /// nothing to draw.
    pub fn plot_detector_pointings(&self) -> Result<SkyPlot> {
        if self.is_empty() {
            return Err(ConstellationError::EmptyConstellation);
        }

        let points = self
            .constellation()
            .detectors()
            .map(|det| {
                let (x, y) = mollweide(det.pointing.ra_deg, det.pointing.dec_deg);
                SkyPoint {
                    name: det.name(),
                    ra_deg: det.pointing.ra_deg,
                    dec_deg: det.pointing.dec_deg,
                    x,
                    y,
                }
            })
            .collect();

        Ok(SkyPlot {
            points,
            style: PlotStyle::default(),
        })
    }
}
