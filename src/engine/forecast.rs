use nalgebra::{DMatrix, DVector};
use serde::Serialize;

/// Singular values below this are treated as zero when solving.
const SVD_EPS: f64 = 1e-12;

/// Ordinary least-squares line `price = intercept + slope * index`, where the
/// index of the first row in the window is 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub intercept: f64,
    pub slope: f64,
    /// Rows in the fitted window; the forecast starts at index `n + 1`.
    pub n: usize,
}

impl LinearFit {
    /// Fit against indices `1..=prices.len()`.
    pub fn fit(prices: &[f64]) -> Option<Self> {
        let points: Vec<(usize, f64)> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| (i + 1, *p))
            .collect();
        Self::fit_indexed(&points, prices.len())
    }

    /// Fit `(index, price)` pairs taken from a window of `n` rows. Rows
    /// without a price are simply absent, so every price keeps its own
    /// position. `None` for no points; a single point gives a flat line
    /// through it.
    pub fn fit_indexed(points: &[(usize, f64)], n: usize) -> Option<Self> {
        match points {
            [] => None,
            [(_, price)] => Some(Self {
                intercept: *price,
                slope: 0.0,
                n,
            }),
            _ => {
                let design = DMatrix::from_fn(points.len(), 2, |i, j| {
                    if j == 0 {
                        1.0
                    } else {
                        points[i].0 as f64
                    }
                });
                let target = DVector::from_iterator(points.len(), points.iter().map(|p| p.1));
                let beta = design.svd(true, true).solve(&target, SVD_EPS).ok()?;
                Some(Self {
                    intercept: beta[0],
                    slope: beta[1],
                    n,
                })
            }
        }
    }

    pub fn predict(&self, index: f64) -> f64 {
        self.intercept + self.slope * index
    }

    /// Mean prediction over the `horizon` indices following the fitted range
    /// (`n+1..=n+horizon`).
    pub fn forecast_mean(&self, horizon: u32) -> f64 {
        if horizon == 0 {
            return self.predict(self.n as f64);
        }
        let start = self.n as f64 + 1.0;
        let total: f64 = (0..horizon).map(|k| self.predict(start + f64::from(k))).sum();
        total / f64::from(horizon)
    }
}
