//! Material property provider trait.
//!
//! All material data sources implement [`MaterialProvider`], which returns
//! wavelength-dependent complex dielectric functions and refractive indices.

use num_complex::Complex64;
use thiserror::Error;

/// Errors from material providers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MaterialError {
    #[error("Wavelength {wavelength_nm} nm is outside the data range [{min}, {max}] nm of '{material}'")]
    OutOfRange {
        material: String,
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Non-physical oscillator parameter: {0}")]
    NonPhysicalOscillator(String),

    #[error("Invalid material parameter: {0}")]
    InvalidParameter(String),

    #[error("Material not found: {0}")]
    NotFound(String),

    #[error("Data error: {0}")]
    DataError(String),
}

/// Provides wavelength-dependent optical constants.
///
/// Implementations include tabulated data, analytic oscillator models and
/// effective-medium composites. Every implementation is a pure function of
/// the wavelength.
pub trait MaterialProvider: Send + Sync {
    /// Human-readable name of this material.
    fn name(&self) -> &str;

    /// Wavelength range over which the material is defined (nm).
    ///
    /// Analytic models return `(0.0, f64::INFINITY)`.
    fn wavelength_range(&self) -> (f64, f64);

    /// Complex dielectric function $\epsilon(\lambda)$ at a given wavelength.
    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError>;

    /// Complex refractive index $\tilde{n} = n + ik$ at a given wavelength.
    ///
    /// Default implementation derives from $\epsilon = \tilde{n}^2$ using the
    /// principal square root, which puts $k \ge 0$ whenever $\epsilon_2 \ge 0$.
    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let eps = self.dielectric_function(wavelength_nm)?;
        Ok(eps.sqrt())
    }

    /// Whether `wavelength_nm` lies inside [`wavelength_range`](Self::wavelength_range).
    fn covers(&self, wavelength_nm: f64) -> bool {
        let (min, max) = self.wavelength_range();
        wavelength_nm >= min && wavelength_nm <= max
    }
}

/// Reject non-positive or non-finite wavelengths before evaluating a model.
pub(crate) fn check_wavelength(material: &str, wavelength_nm: f64) -> Result<(), MaterialError> {
    if wavelength_nm.is_finite() && wavelength_nm > 0.0 {
        Ok(())
    } else {
        Err(MaterialError::InvalidParameter(format!(
            "'{}' evaluated at non-physical wavelength {} nm",
            material, wavelength_nm
        )))
    }
}
