use anyhow::{anyhow, Result};
use ndarray::{Array1, Array2};

/// Evenly spaced samples over `[start, end]`, both endpoints included.
///
/// The last sample is pinned to `end` so the endpoints are exact rather than
/// accumulated through `start + i * step`.
pub fn linspace(start: f64, end: f64, n: usize) -> Array1<f64> {
    if n == 1 {
        return Array1::from_elem(1, start);
    }
    let step = (end - start) / (n - 1) as f64;
    Array1::from_shape_fn(n, |i| {
        if i + 1 == n {
            end
        } else {
            start + step * i as f64
        }
    })
}

pub struct Grid {
    pub nx: usize,      // Number of points in x direction
    pub ny: usize,      // Number of points in y direction
    pub lx: f64,        // Physical extent in x (meters)
    pub ly: f64,        // Physical extent in y (meters)
    pub x: Array1<f64>, // x samples over [-lx/2, lx/2]
    pub y: Array1<f64>, // y samples over [-ly/2, ly/2]
}

impl Grid {
    /// Reject resolutions and extents no grid can be built from.
    pub fn check(nx: usize, ny: usize, lx: f64, ly: f64) -> Result<()> {
        if nx < 2 || ny < 2 {
            return Err(anyhow!(
                "Grid needs at least 2 points per axis (nx={}, ny={})",
                nx,
                ny
            ));
        }
        if !(lx > 0.0 && ly > 0.0) || !lx.is_finite() || !ly.is_finite() {
            return Err(anyhow!(
                "Domain size must be positive and finite (lx={}, ly={})",
                lx,
                ly
            ));
        }
        Ok(())
    }

    pub fn new(nx: usize, ny: usize, lx: f64, ly: f64) -> Result<Self> {
        Self::check(nx, ny, lx, ly)?;
        let x = linspace(-lx / 2.0, lx / 2.0, nx);
        let y = linspace(-ly / 2.0, ly / 2.0, ny);
        Ok(Grid { nx, ny, lx, ly, x, y })
    }

    pub fn x_range(&self) -> (f64, f64) {
        (-self.lx / 2.0, self.lx / 2.0)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (-self.ly / 2.0, self.ly / 2.0)
    }

    /// Distance from the origin at every grid point, shape `(ny, nx)`.
    pub fn radius(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.ny, self.nx), |(i, j)| self.x[j].hypot(self.y[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn strictly_increasing(a: &Array1<f64>) -> bool {
        a.windows(2).into_iter().all(|w| w[1] > w[0])
    }

    #[test]
    fn axes_span_the_domain_exactly() {
        let grid = Grid::new(81, 61, 4.0, 3.0).unwrap();
        assert_eq!(grid.x.len(), 81);
        assert_eq!(grid.y.len(), 61);
        assert_eq!(grid.x[0], -2.0);
        assert_eq!(grid.x[80], 2.0);
        assert_eq!(grid.y[0], -1.5);
        assert_eq!(grid.y[60], 1.5);
        assert!(strictly_increasing(&grid.x));
        assert!(strictly_increasing(&grid.y));
        assert_relative_eq!(grid.x[1] - grid.x[0], 0.05, epsilon = 1e-12);
    }

    #[test]
    fn awkward_spacing_keeps_exact_endpoints() {
        let grid = Grid::new(97, 13, 0.7, 1.3).unwrap();
        assert_eq!(grid.x[96], 0.35);
        assert_eq!(grid.y[12], 0.65);
        assert!(strictly_increasing(&grid.x));
    }

    #[test]
    fn radius_is_euclidean_distance() {
        let grid = Grid::new(5, 3, 4.0, 2.0).unwrap();
        let r = grid.radius();
        assert_eq!(r.dim(), (3, 5));
        // Centre column and row pass through the origin
        assert_eq!(r[[1, 2]], 0.0);
        assert_relative_eq!(r[[0, 0]], (4.0_f64 + 1.0).sqrt());
        assert_relative_eq!(r[[2, 4]], (4.0_f64 + 1.0).sqrt());
        assert_relative_eq!(r[[1, 3]], 1.0);
    }

    #[test]
    fn rejects_degenerate_grids() {
        assert!(Grid::new(1, 10, 1.0, 1.0).is_err());
        assert!(Grid::new(10, 0, 1.0, 1.0).is_err());
        assert!(Grid::new(10, 10, 0.0, 1.0).is_err());
        assert!(Grid::new(10, 10, 1.0, f64::NAN).is_err());
        assert!(Grid::new(10, 10, f64::INFINITY, 1.0).is_err());
    }
}
