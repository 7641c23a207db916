use crate::bessel::j0;
use crate::grid::Grid;
use crate::timeline::Timeline;
use anyhow::{anyhow, Result};
use ndarray::{Array2, Array3, ArrayView2, ArrayViewMut2, Axis, Zip};
use rayon::prelude::*;

/// Closed-form standing wave `amplitude * J0(k r) * cos(c k t)`.
///
/// The spatial envelope is evaluated once; every time slice is the envelope
/// scaled by its cosine phase, so slices can be produced in any order.
pub struct StandingWave {
    pub c: f64,         // Wave speed inside the cosine term
    pub k: f64,         // Spatial wavenumber
    pub amplitude: f64, // Field scale factor
    radius: Array2<f64>,
    envelope: Array2<f64>, // J0(k r), shape (ny, nx)
}

impl StandingWave {
    pub fn new(grid: &Grid, c: f64, k: f64, amplitude: f64) -> Self {
        let radius = grid.radius();
        let envelope = radius.mapv(|r| j0(k * r));
        Self {
            c,
            k,
            amplitude,
            radius,
            envelope,
        }
    }

    pub fn radius(&self) -> &Array2<f64> {
        &self.radius
    }

    /// Point evaluation of the field.
    pub fn value(&self, r: f64, t: f64) -> f64 {
        self.amplitude * j0(self.k * r) * (self.c * self.k * t).cos()
    }

    pub fn phase(&self, t: f64) -> f64 {
        (self.c * self.k * t).cos()
    }

    /// One time slice, shape `(ny, nx)`. Used for lazy frame-by-frame consumption.
    pub fn slice_at(&self, t: f64) -> Array2<f64> {
        let mut out = Array2::zeros(self.envelope.dim());
        self.fill_slice(out.view_mut(), t);
        out
    }

    fn fill_slice(&self, out: ArrayViewMut2<f64>, t: f64) {
        let phase = self.phase(t);
        let amplitude = self.amplitude;
        Zip::from(out)
            .and(&self.envelope)
            .for_each(|f, &e| *f = amplitude * e * phase);
    }
}

/// Field values for every grid point and time sample, shape `(ny, nx, nt)`.
pub struct FieldTensor {
    pub data: Array3<f64>,
}

impl FieldTensor {
    /// Evaluate every time slice. Slices are independent so they are filled in
    /// parallel; the result does not depend on scheduling.
    pub fn compute(wave: &StandingWave, timeline: &Timeline) -> Self {
        let (ny, nx) = wave.envelope.dim();
        let mut data = Array3::<f64>::zeros((ny, nx, timeline.len()));
        data.axis_iter_mut(Axis(2))
            .into_par_iter()
            .enumerate()
            .for_each(|(n, slice)| wave.fill_slice(slice, timeline.time(n)));
        Self { data }
    }

    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn slice(&self, n: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(2), n)
    }

    /// Global (min, max), ignoring NaN. `None` when no finite-comparable value exists.
    pub fn extent(&self) -> Option<(f64, f64)> {
        let min = self.data.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if min > max {
            None
        } else {
            Some((min, max))
        }
    }

    pub fn non_finite_count(&self) -> usize {
        self.data.iter().filter(|v| !v.is_finite()).count()
    }
}

/// Height and colour limits shared by every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorRange {
    pub min: f64,
    pub max: f64,
}

impl ColorRange {
    /// Headroom applied to the tensor extent when no manual range is given.
    pub const AUTO_SCALE: f64 = 1.1;

    /// Manual limits win verbatim; otherwise the tensor extent scaled by 1.1.
    pub fn resolve(tensor: &FieldTensor, manual: Option<(f64, f64)>) -> Result<Self> {
        if let Some((min, max)) = manual {
            return Ok(Self { min, max });
        }
        match tensor.extent() {
            Some((min, max)) => Ok(Self {
                min: Self::AUTO_SCALE * min,
                max: Self::AUTO_SCALE * max,
            }),
            None => Err(anyhow!(
                "Field tensor holds no comparable values; cannot derive a colour range"
            )),
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `value` inside the range, clamped to [0, 1].
    pub fn normalize(&self, value: f64) -> f64 {
        let normalized = if self.max > self.min {
            (value - self.min) / self.span()
        } else {
            0.5
        };
        normalized.clamp(0.0, 1.0)
    }

    /// Limits safe to hand to an axis; a flat field gets unit padding.
    pub fn axis_limits(&self) -> (f64, f64) {
        if self.max > self.min {
            (self.min, self.max)
        } else {
            (self.min - 1.0, self.max + 1.0)
        }
    }
}
