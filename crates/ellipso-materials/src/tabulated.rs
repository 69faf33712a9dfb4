//! Tabulated $(\lambda, n, k)$ optical constants.
//!
//! The refractive index $n$ and extinction coefficient $k$ are interpolated
//! independently, then combined into $\tilde{n} = n + ik$. The dielectric
//! function follows from $\epsilon_1 = n^2 - k^2$, $\epsilon_2 = 2nk$.
//!
//! Lookups outside the table are an error unless the material is explicitly
//! built with an [`Extrapolation`] other than [`Extrapolation::Error`].

use log::warn;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::provider::{check_wavelength, MaterialError, MaterialProvider};
use crate::spline::{segment_index, CubicSpline};

/// Interpolation scheme between table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    /// Piecewise linear, identical to the values at the knots.
    #[default]
    Linear,
    /// Natural cubic spline.
    CubicSpline,
}

/// Behaviour for wavelengths outside the tabulated range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Report [`MaterialError::OutOfRange`].
    #[default]
    Error,
    /// Hold the first / last tabulated value.
    Clamp,
    /// Continue the boundary interpolant.
    Extend,
}

#[derive(Debug, Clone)]
enum Curve {
    Linear { xs: Vec<f64>, ys: Vec<f64> },
    Spline(CubicSpline),
}

impl Curve {
    fn build(scheme: Interpolation, xs: &[f64], ys: Vec<f64>) -> Result<Self, MaterialError> {
        match scheme {
            Interpolation::Linear => Ok(Curve::Linear { xs: xs.to_vec(), ys }),
            Interpolation::CubicSpline => Ok(Curve::Spline(CubicSpline::new(xs.to_vec(), ys)?)),
        }
    }

    fn evaluate(&self, x: f64) -> f64 {
        match self {
            Curve::Linear { xs, ys } => {
                let i = segment_index(xs, x);
                let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
                ys[i] + t * (ys[i + 1] - ys[i])
            }
            Curve::Spline(spline) => spline.evaluate(x),
        }
    }
}

/// Material defined by a table of $(\lambda, n, k)$ rows.
#[derive(Debug, Clone)]
pub struct TabulatedMaterial {
    name: String,
    wavelengths_nm: Vec<f64>,
    n_values: Vec<f64>,
    k_values: Vec<f64>,
    n_curve: Curve,
    k_curve: Curve,
    interpolation: Interpolation,
    extrapolation: Extrapolation,
}

impl TabulatedMaterial {
    /// Construct from tabulated data with linear interpolation and no extrapolation.
    ///
    /// # Arguments
    /// * `name`: Material identifier string.
    /// * `wavelengths_nm`: Wavelengths in nm (strictly increasing, at least 2).
    /// * `n`: Real refractive index at each wavelength.
    /// * `k`: Extinction coefficient at each wavelength ($k \ge 0$).
    pub fn new(
        name: impl Into<String>,
        wavelengths_nm: Vec<f64>,
        n: Vec<f64>,
        k: Vec<f64>,
    ) -> Result<Self, MaterialError> {
        Self::with_options(
            name,
            wavelengths_nm,
            n,
            k,
            Interpolation::default(),
            Extrapolation::default(),
        )
    }

    /// Construct from `(λ/nm, n, k)` rows.
    pub fn from_rows(name: impl Into<String>, rows: &[(f64, f64, f64)]) -> Result<Self, MaterialError> {
        let wavelengths_nm = rows.iter().map(|&(lam, _, _)| lam).collect();
        let n = rows.iter().map(|&(_, n, _)| n).collect();
        let k = rows.iter().map(|&(_, _, k)| k).collect();
        Self::new(name, wavelengths_nm, n, k)
    }

    /// Construct with an explicit interpolation scheme and extrapolation policy.
    pub fn with_options(
        name: impl Into<String>,
        wavelengths_nm: Vec<f64>,
        n: Vec<f64>,
        k: Vec<f64>,
        interpolation: Interpolation,
        extrapolation: Extrapolation,
    ) -> Result<Self, MaterialError> {
        let name = name.into();
        validate_table(&name, &wavelengths_nm, &n, &k)?;

        let n_curve = Curve::build(interpolation, &wavelengths_nm, n.clone())?;
        let k_curve = Curve::build(interpolation, &wavelengths_nm, k.clone())?;

        Ok(Self {
            name,
            wavelengths_nm,
            n_values: n,
            k_values: k,
            n_curve,
            k_curve,
            interpolation,
            extrapolation,
        })
    }

    /// Same table, different interpolation / extrapolation settings.
    pub fn reconfigured(
        &self,
        interpolation: Interpolation,
        extrapolation: Extrapolation,
    ) -> Result<Self, MaterialError> {
        Self::with_options(
            self.name.clone(),
            self.wavelengths_nm.clone(),
            self.n_values.clone(),
            self.k_values.clone(),
            interpolation,
            extrapolation,
        )
    }

    /// Tabulated wavelengths (nm).
    pub fn wavelengths_nm(&self) -> &[f64] {
        &self.wavelengths_nm
    }

    pub fn interpolation(&self) -> Interpolation {
        self.interpolation
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    fn lookup_wavelength(&self, wavelength_nm: f64) -> Result<f64, MaterialError> {
        check_wavelength(&self.name, wavelength_nm)?;
        let (min, max) = self.wavelength_range();
        if wavelength_nm >= min && wavelength_nm <= max {
            return Ok(wavelength_nm);
        }
        match self.extrapolation {
            Extrapolation::Error => Err(MaterialError::OutOfRange {
                material: self.name.clone(),
                wavelength_nm,
                min,
                max,
            }),
            Extrapolation::Clamp => {
                warn!(
                    "'{}': clamping {} nm to tabulated range [{}, {}] nm",
                    self.name, wavelength_nm, min, max
                );
                Ok(wavelength_nm.clamp(min, max))
            }
            Extrapolation::Extend => {
                warn!(
                    "'{}': extrapolating to {} nm outside [{}, {}] nm",
                    self.name, wavelength_nm, min, max
                );
                Ok(wavelength_nm)
            }
        }
    }
}

impl MaterialProvider for TabulatedMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        let lo = self.wavelengths_nm[0];
        let hi = self.wavelengths_nm[self.wavelengths_nm.len() - 1];
        (lo, hi)
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let index = self.refractive_index(wavelength_nm)?;
        Ok(index * index)
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let x = self.lookup_wavelength(wavelength_nm)?;
        let n = self.n_curve.evaluate(x);
        // Spline overshoot or linear extension must not turn loss into gain.
        let k = self.k_curve.evaluate(x).max(0.0);
        Ok(Complex64::new(n, k))
    }

    // Extrapolating materials are usable everywhere.
    fn covers(&self, wavelength_nm: f64) -> bool {
        let (min, max) = self.wavelength_range();
        self.extrapolation != Extrapolation::Error || (wavelength_nm >= min && wavelength_nm <= max)
    }
}

fn validate_table(name: &str, wavelengths_nm: &[f64], n: &[f64], k: &[f64]) -> Result<(), MaterialError> {
    if wavelengths_nm.len() != n.len() || wavelengths_nm.len() != k.len() {
        return Err(MaterialError::DataError(format!(
            "'{}': table columns differ in length ({}, {}, {})",
            name,
            wavelengths_nm.len(),
            n.len(),
            k.len()
        )));
    }
    if wavelengths_nm.len() < 2 {
        return Err(MaterialError::DataError(format!(
            "'{}': at least 2 tabulated wavelengths are required",
            name
        )));
    }
    for (i, ((&lam, &n), &k)) in wavelengths_nm.iter().zip(n).zip(k).enumerate() {
        if !(lam.is_finite() && lam > 0.0) {
            return Err(MaterialError::DataError(format!(
                "'{}': row {} has non-physical wavelength {}",
                name, i, lam
            )));
        }
        if !n.is_finite() || !k.is_finite() || k < 0.0 {
            return Err(MaterialError::DataError(format!(
                "'{}': row {} has invalid optical constants n={}, k={}",
                name, i, n, k
            )));
        }
        if i > 0 && lam <= wavelengths_nm[i - 1] {
            return Err(MaterialError::DataError(format!(
                "'{}': wavelengths must be strictly increasing (row {})",
                name, i
            )));
        }
    }
    Ok(())
}
