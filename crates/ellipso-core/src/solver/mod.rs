//! Stack solver abstraction and implementations.
//!
//! The [`StackSolver`] trait defines the single capability the simulator
//! needs: the complex reflection coefficients $r_s$, $r_p$ of a stack at one
//! wavelength and one angle of incidence. Both implementations build on the
//! interface coefficients of [`fresnel`].

pub mod fresnel;
pub mod matrix;
pub mod recursive;
pub mod transfer_matrix;

use ellipso_materials::MaterialError;
use thiserror::Error;

use crate::types::{PolarizedReflectance, Stack};

pub use recursive::RecursiveSolver;
pub use transfer_matrix::TransferMatrixSolver;

/// Errors that can occur while simulating a stack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("Invalid stack configuration: {0}")]
    InvalidStackConfiguration(String),

    #[error("Angle of incidence {0}° is outside (0°, 90°)")]
    InvalidAngle(f64),

    #[error("Invalid wavelength grid: {0}")]
    InvalidWavelengthGrid(String),

    #[error("Material '{material}' is undefined at {wavelength_nm} nm (data range [{min}, {max}] nm)")]
    OutOfDomainWavelength {
        material: String,
        wavelength_nm: f64,
        min: f64,
        max: f64,
    },

    #[error("Non-physical oscillator parameter: {0}")]
    NonPhysicalOscillatorParameter(String),

    #[error("Numeric degeneracy at {wavelength_nm} nm: {reason}")]
    NumericDegeneracy { wavelength_nm: f64, reason: String },

    #[error("Material error: {0}")]
    Material(MaterialError),
}

impl From<MaterialError> for SimulationError {
    fn from(err: MaterialError) -> Self {
        match err {
            MaterialError::OutOfRange {
                material,
                wavelength_nm,
                min,
                max,
            } => SimulationError::OutOfDomainWavelength {
                material,
                wavelength_nm,
                min,
                max,
            },
            MaterialError::NonPhysicalOscillator(msg) => {
                SimulationError::NonPhysicalOscillatorParameter(msg)
            }
            other => SimulationError::Material(other),
        }
    }
}

/// The core trait that stack solvers implement.
///
/// Implementations must be pure: the result depends only on the arguments,
/// so a solver can be shared across threads and called in any order.
pub trait StackSolver: Send + Sync {
    /// Complex reflection coefficients $r_s$, $r_p$ of `stack` at one wavelength.
    ///
    /// # Errors
    /// - [`SimulationError::InvalidAngle`] unless $0° < \theta_0 < 90°$.
    /// - [`SimulationError::OutOfDomainWavelength`] if a material has no data at λ.
    /// - [`SimulationError::NumericDegeneracy`] if an interface or the total
    ///   response is singular.
    fn reflection_coefficients(
        &self,
        stack: &Stack,
        angle_deg: f64,
        wavelength_nm: f64,
    ) -> Result<PolarizedReflectance, SimulationError>;

    /// Human-readable name of the solver method.
    fn method_name(&self) -> &str;
}

/// Check that the angle of incidence lies in the open interval (0°, 90°).
pub fn check_angle(angle_deg: f64) -> Result<(), SimulationError> {
    if angle_deg > 0.0 && angle_deg < 90.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidAngle(angle_deg))
    }
}
