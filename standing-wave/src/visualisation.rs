use crate::config::RenderConfig;
use crate::grid::Grid;
use crate::wavefield::ColorRange;
use anyhow::{anyhow, Result};
use image::{RgbImage, RgbaImage};
use ndarray::{Array1, Array2, ArrayView2};
use plotters::prelude::*;

/// A captured view, tightly packed RGB8.
pub struct RasterFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RasterFrame {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgb: vec![255; width as usize * height as usize * 3],
        }
    }

    pub fn into_rgb_image(self) -> Result<RgbImage> {
        let (w, h) = (self.width, self.height);
        RgbImage::from_raw(w, h, self.rgb)
            .ok_or_else(|| anyhow!("Frame buffer does not match {}x{} RGB", w, h))
    }

    pub fn to_rgba_image(&self) -> Result<RgbaImage> {
        let mut rgba = Vec::with_capacity(self.rgb.len() / 3 * 4);
        for px in self.rgb.chunks_exact(3) {
            rgba.extend_from_slice(&[px[0], px[1], px[2], 255]);
        }
        RgbaImage::from_raw(self.width, self.height, rgba).ok_or_else(|| {
            anyhow!("Frame buffer does not match {}x{} RGB", self.width, self.height)
        })
    }
}

/// Anything that can show one height field at a time and hand back pixels.
pub trait FrameRenderer {
    /// Replace the displayed heights; scene setup stays as it is.
    fn update(&mut self, heights: ArrayView2<f64>) -> Result<()>;

    /// Rasterise the current view. `scale` multiplies the base resolution.
    fn capture(&self, scale: f64) -> Result<RasterFrame>;
}

/// Unit-length light direction in (x, y, up) space.
#[derive(Debug, Clone, Copy)]
struct Light {
    dir: [f64; 3],
    intensity: f64,
}

impl Light {
    fn new(x: f64, y: f64, up: f64, intensity: f64) -> Self {
        let norm = (x * x + y * y + up * up).sqrt();
        Self {
            dir: [x / norm, y / norm, up / norm],
            intensity,
        }
    }
}

const AMBIENT: f64 = 0.35;

/// Height-mapped surface over the grid with fixed axes, colours and lights.
pub struct SurfaceVisualiser {
    x: Array1<f64>,
    y: Array1<f64>,
    x_range: (f64, f64),
    y_range: (f64, f64),
    range: ColorRange,
    heights: Array2<f64>,
    width: u32,
    height: u32,
    yaw: f64,
    pitch: f64,
    annotate: bool,
    title: String,
    lights: [Light; 2],
    gradient: Box<dyn colorgrad::Gradient>,
}

impl SurfaceVisualiser {
    pub fn new(grid: &Grid, range: ColorRange, config: &RenderConfig) -> Self {
        Self {
            x: grid.x.clone(),
            y: grid.y.clone(),
            x_range: grid.x_range(),
            y_range: grid.y_range(),
            range,
            heights: Array2::zeros((grid.ny, grid.nx)),
            width: config.image_width,
            height: config.image_height,
            yaw: config.yaw,
            pitch: config.pitch,
            annotate: config.annotate,
            title: String::new(),
            // Key light from the front left, dimmer fill from behind right
            lights: [Light::new(-1.0, -1.0, 1.5, 0.55), Light::new(1.0, 0.8, 0.6, 0.25)],
            gradient: config.colormap.gradient(),
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn heights(&self) -> ArrayView2<'_, f64> {
        self.heights.view()
    }

    pub fn range(&self) -> ColorRange {
        self.range
    }

    fn value_to_color(&self, value: f64) -> RGBColor {
        let color_rgba = self.gradient.at(self.range.normalize(value) as f32).to_rgba8();
        RGBColor(color_rgba[0], color_rgba[1], color_rgba[2])
    }

    /// Lambertian response of the cell spanning (i, j)..(i+1, j+1).
    fn cell_light(&self, i: usize, j: usize) -> f64 {
        let span = self.range.span().abs().max(f64::MIN_POSITIVE);
        let h = |ii: usize, jj: usize| self.heights[[ii, jj]] / span;
        let dx = (self.x[j + 1] - self.x[j]) / (self.x_range.1 - self.x_range.0);
        let dy = (self.y[i + 1] - self.y[i]) / (self.y_range.1 - self.y_range.0);
        let dh_dx = 0.5 * ((h(i, j + 1) - h(i, j)) + (h(i + 1, j + 1) - h(i + 1, j))) / dx;
        let dh_dy = 0.5 * ((h(i + 1, j) - h(i, j)) + (h(i + 1, j + 1) - h(i, j + 1))) / dy;
        let norm = (dh_dx * dh_dx + dh_dy * dh_dy + 1.0).sqrt();
        let normal = [-dh_dx / norm, -dh_dy / norm, 1.0 / norm];

        let diffuse: f64 = self
            .lights
            .iter()
            .map(|l| {
                let cos = normal[0] * l.dir[0] + normal[1] * l.dir[1] + normal[2] * l.dir[2];
                l.intensity * cos.max(0.0)
            })
            .sum();
        if diffuse.is_finite() {
            (AMBIENT + diffuse).min(1.0)
        } else {
            AMBIENT
        }
    }

    fn shade(color: RGBColor, light: f64) -> RGBColor {
        let s = |c: u8| (c as f64 * light).round().clamp(0.0, 255.0) as u8;
        RGBColor(s(color.0), s(color.1), s(color.2))
    }

    /// Surface cells as (corners, colour). Plotters puts y up, so each corner is
    /// (x, height, y).
    fn cells(&self) -> Vec<(Vec<(f64, f64, f64)>, RGBColor)> {
        let (ny, nx) = self.heights.dim();
        let mut cells = Vec::with_capacity((nx - 1) * (ny - 1));
        for i in 0..ny - 1 {
            for j in 0..nx - 1 {
                let corners = [(i, j), (i, j + 1), (i + 1, j + 1), (i + 1, j)];
                let mean = corners
                    .iter()
                    .map(|&(ii, jj)| self.heights[[ii, jj]])
                    .sum::<f64>()
                    / 4.0;
                if !mean.is_finite() {
                    continue;
                }
                let color = Self::shade(self.value_to_color(mean), self.cell_light(i, j));
                let points = corners
                    .iter()
                    .map(|&(ii, jj)| (self.x[jj], self.heights[[ii, jj]], self.y[ii]))
                    .collect();
                cells.push((points, color));
            }
        }
        cells
    }

    fn draw(&self, buffer: &mut [u8], width: u32, height: u32, scale: f64) -> Result<()> {
        let root = BitMapBackend::with_buffer(buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;

        let (z_lo, z_hi) = self.range.axis_limits();
        let mut builder = ChartBuilder::on(&root);
        builder.margin((10.0 * scale) as u32);
        if self.annotate && !self.title.is_empty() {
            builder.caption(&self.title, ("sans-serif", 22.0 * scale));
        }
        let mut chart = builder.build_cartesian_3d(
            self.x_range.0..self.x_range.1,
            z_lo..z_hi,
            self.y_range.0..self.y_range.1,
        )?;
        let (yaw, pitch) = (self.yaw, self.pitch);
        chart.with_projection(|mut pb| {
            pb.yaw = yaw;
            pb.pitch = pitch;
            pb.scale = 0.85;
            pb.into_matrix()
        });

        if self.annotate {
            chart
                .configure_axes()
                .light_grid_style(BLACK.mix(0.1))
                .max_light_lines(3)
                .label_style(("sans-serif", 12.0 * scale))
                .draw()?;
        }

        chart.draw_series(
            self.cells()
                .into_iter()
                .map(|(points, color)| Polygon::new(points, color.filled())),
        )?;

        root.present()?;
        Ok(())
    }
}

impl FrameRenderer for SurfaceVisualiser {
    fn update(&mut self, heights: ArrayView2<f64>) -> Result<()> {
        if heights.dim() != self.heights.dim() {
            return Err(anyhow!(
                "Height field is {:?}, surface expects {:?}",
                heights.dim(),
                self.heights.dim()
            ));
        }
        self.heights.assign(&heights);
        Ok(())
    }

    fn capture(&self, scale: f64) -> Result<RasterFrame> {
        let width = ((self.width as f64) * scale).round().max(1.0) as u32;
        let height = ((self.height as f64) * scale).round().max(1.0) as u32;
        let mut frame = RasterFrame::blank(width, height);
        self.draw(&mut frame.rgb, width, height, scale)?;
        Ok(frame)
    }
}
