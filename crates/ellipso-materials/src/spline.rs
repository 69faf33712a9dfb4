//! Natural cubic spline used for smooth interpolation of tabulated $n$ and $k$.
//!
//! Linear interpolation (the default for [`TabulatedMaterial`](crate::tabulated::TabulatedMaterial))
//! reproduces the reference research code bit for bit at the knots; the
//! spline is the opt-in choice when a smooth $\tilde{n}(\lambda)$ matters,
//! e.g. for coarse tables sampled on a fine grid.

use crate::provider::MaterialError;

/// A natural cubic spline interpolator for real-valued data.
///
/// Given $n$ knots $(x_i, y_i)$, the piecewise cubic has continuous first and
/// second derivatives and zero curvature at both ends.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivatives at each knot.
    curvature: Vec<f64>,
}

impl CubicSpline {
    /// Construct a natural cubic spline from knots.
    ///
    /// # Errors
    /// [`MaterialError::DataError`] if the slices differ in length, hold fewer
    /// than 2 points, contain non-finite values, or `xs` is not strictly
    /// increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, MaterialError> {
        if xs.len() != ys.len() {
            return Err(MaterialError::DataError(format!(
                "spline knots and values differ in length ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(MaterialError::DataError(
                "spline needs at least 2 data points".into(),
            ));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(MaterialError::DataError(
                "spline data contains non-finite values".into(),
            ));
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(MaterialError::DataError(format!(
                "spline knots must be strictly increasing (index {})",
                i
            )));
        }

        let n = xs.len();
        let mut curvature = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // Tridiagonal forward sweep, natural boundary (curvature[0] = 0).
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * curvature[i - 1] + 2.0;
            curvature[i] = (sig - 1.0) / p;
            let slope_diff = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i])
                - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * slope_diff / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }

        // Back substitution, natural boundary (curvature[n-1] = 0).
        for k in (0..n - 2).rev() {
            curvature[k + 1] = curvature[k + 1] * curvature[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, curvature })
    }

    /// Evaluate the spline at `x`.
    ///
    /// Outside the knot range the boundary cubic is continued.
    pub fn evaluate(&self, x: f64) -> f64 {
        let lo = segment_index(&self.xs, x);
        let hi = lo + 1;

        let h = self.xs[hi] - self.xs[lo];
        let a = (self.xs[hi] - x) / h;
        let b = (x - self.xs[lo]) / h;

        a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.curvature[lo] + (b * b * b - b) * self.curvature[hi]) * h * h
                / 6.0
    }
}

/// Index `i` of the segment `[xs[i], xs[i + 1]]` used to evaluate at `x`.
///
/// Points left of the table map to the first segment, points right of it to
/// the last one. `xs` must hold at least 2 strictly increasing values.
pub(crate) fn segment_index(xs: &[f64], x: f64) -> usize {
    let mut lo = 0;
    let mut hi = xs.len() - 1;
    while hi - lo > 1 {
        let mid = (lo + hi) / 2;
        if xs[mid] > x {
            hi = mid;
        } else {
            lo = mid;
        }
    }
    lo
}
