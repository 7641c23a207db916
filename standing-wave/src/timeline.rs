use crate::grid::linspace;
use anyhow::{anyhow, Result};
use ndarray::Array1;

/// Time samples evenly spread over `[0, tmax]`, both ends included.
pub struct Timeline {
    pub tmax: f64,
    pub samples: Array1<f64>,
}

impl Timeline {
    /// Reject sample counts and durations no timeline can be built from.
    pub fn check(nt: usize, tmax: f64) -> Result<()> {
        if nt < 2 {
            return Err(anyhow!("Need at least 2 time samples, got nt={}", nt));
        }
        if !(tmax > 0.0) || !tmax.is_finite() {
            return Err(anyhow!("tmax must be positive and finite, got {}", tmax));
        }
        Ok(())
    }

    pub fn new(nt: usize, tmax: f64) -> Result<Self> {
        Self::check(nt, tmax)?;
        Ok(Self {
            tmax,
            samples: linspace(0.0, tmax, nt),
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn time(&self, n: usize) -> f64 {
        self.samples[n]
    }

    /// `tmax / nt`. Not the distance between samples, see [`Timeline::spacing`].
    pub fn nominal_step(&self) -> f64 {
        self.tmax / self.len() as f64
    }

    /// Actual distance between consecutive samples, `tmax / (nt - 1)`.
    pub fn spacing(&self) -> f64 {
        self.tmax / (self.len() - 1) as f64
    }

    /// Index of the first sample at or after `t`.
    pub fn first_at_or_after(&self, t: f64) -> Option<usize> {
        self.samples.iter().position(|&s| s >= t)
    }

    /// Index of the sample nearest `t` (earliest on ties), if one lies within
    /// half a sample spacing of it.
    pub fn nearest(&self, t: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (n, &s) in self.samples.iter().enumerate() {
            let distance = (s - t).abs();
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((n, distance)),
            }
        }
        // Allow a little slack for samples sitting exactly half-way
        let window = 0.5 * self.spacing() * (1.0 + 1e-9);
        best.filter(|&(_, d)| d <= window).map(|(n, _)| n)
    }
}
