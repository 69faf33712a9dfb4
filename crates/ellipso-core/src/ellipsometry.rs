//! Ellipsometric angles from reflection coefficients.
//!
//! $$\Psi = \arctan\left|\frac{r_p}{r_s}\right|, \qquad \Delta = \arg\frac{r_p}{r_s}.$$
//!
//! $\Psi$ lies in $[0°, 90°]$. $\Delta$ is reported in $(-180°, 180°]$ by
//! default; [`DeltaRange::ZeroTo360`] selects $[0°, 360°)$ instead.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::solver::SimulationError;
use crate::types::PolarizedReflectance;

/// Interval in which $\Delta$ is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaRange {
    /// $(-180°, 180°]$
    #[default]
    Signed,
    /// $[0°, 360°)$
    #[serde(rename = "zero_to_360")]
    ZeroTo360,
}

/// $\Psi$ and $\Delta$ in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EllipsometricAngles {
    pub psi_deg: f64,
    pub delta_deg: f64,
}

impl EllipsometricAngles {
    /// Angles from the complex reflectance ratio $\rho$.
    pub fn from_rho(rho: Complex64, range: DeltaRange) -> Self {
        Self {
            psi_deg: rho.norm().atan().to_degrees(),
            delta_deg: wrap_delta(rho.arg().to_degrees(), range),
        }
    }

    /// Angles from a pair of reflection coefficients.
    ///
    /// # Errors
    /// [`SimulationError::NumericDegeneracy`] if $r_s = 0$ or $\rho$ is not finite.
    pub fn from_reflectance(
        r: &PolarizedReflectance,
        range: DeltaRange,
        wavelength_nm: f64,
    ) -> Result<Self, SimulationError> {
        if r.r_s.norm() == 0.0 {
            return Err(SimulationError::NumericDegeneracy {
                wavelength_nm,
                reason: "s-polarised reflection vanishes, ρ is undefined".into(),
            });
        }
        let rho = r.rho();
        if !(rho.re.is_finite() && rho.im.is_finite()) {
            return Err(SimulationError::NumericDegeneracy {
                wavelength_nm,
                reason: format!("reflectance ratio {} is not finite", rho),
            });
        }
        Ok(Self::from_rho(rho, range))
    }

    /// $\rho = \tan\Psi \, e^{i\Delta}$ rebuilt from the angles.
    pub fn rho(&self) -> Complex64 {
        Complex64::from_polar(self.psi_deg.to_radians().tan(), self.delta_deg.to_radians())
    }
}

/// Map an angle in degrees into the requested $\Delta$ interval.
pub fn wrap_delta(delta_deg: f64, range: DeltaRange) -> f64 {
    let mut d = delta_deg % 360.0;
    match range {
        DeltaRange::Signed => {
            if d <= -180.0 {
                d += 360.0;
            } else if d > 180.0 {
                d -= 360.0;
            }
        }
        DeltaRange::ZeroTo360 => {
            if d < 0.0 {
                d += 360.0;
            }
            if d >= 360.0 {
                d -= 360.0;
            }
        }
    }
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_psi_of_equal_magnitudes_is_45() {
        let a = EllipsometricAngles::from_rho(Complex64::new(0.0, 1.0), DeltaRange::Signed);
        assert_abs_diff_eq!(a.psi_deg, 45.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.delta_deg, 90.0, epsilon = 1e-12);
    }

    #[test]
    fn test_negative_real_rho_reports_plus_180() {
        // A -0.0 imaginary part would give atan2 = -180.
        let a = EllipsometricAngles::from_rho(Complex64::new(-0.1, -0.0), DeltaRange::Signed);
        assert_eq!(a.delta_deg, 180.0);
        let b = EllipsometricAngles::from_rho(Complex64::new(-0.1, 0.0), DeltaRange::Signed);
        assert_eq!(b.delta_deg, 180.0);
    }

    #[test]
    fn test_zero_to_360_range() {
        let a = EllipsometricAngles::from_rho(Complex64::new(0.0, -1.0), DeltaRange::ZeroTo360);
        assert_abs_diff_eq!(a.delta_deg, 270.0, epsilon = 1e-12);
        assert_eq!(wrap_delta(-1e-20, DeltaRange::ZeroTo360), 0.0);
        assert_eq!(wrap_delta(360.0, DeltaRange::ZeroTo360), 0.0);
    }

    #[test]
    fn test_wrap_signed() {
        assert_abs_diff_eq!(wrap_delta(270.0, DeltaRange::Signed), -90.0, epsilon = 1e-12);
        assert_abs_diff_eq!(wrap_delta(-270.0, DeltaRange::Signed), 90.0, epsilon = 1e-12);
        assert_eq!(wrap_delta(-180.0, DeltaRange::Signed), 180.0);
        assert_eq!(wrap_delta(180.0, DeltaRange::Signed), 180.0);
    }

    #[test]
    fn test_rho_round_trip() {
        let rho = Complex64::new(0.3, -0.4);
        let a = EllipsometricAngles::from_rho(rho, DeltaRange::Signed);
        assert_abs_diff_eq!((a.rho() - rho).norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_vanishing_rs_is_degenerate() {
        let r = PolarizedReflectance {
            r_s: Complex64::new(0.0, 0.0),
            r_p: Complex64::new(0.1, 0.0),
        };
        assert!(matches!(
            EllipsometricAngles::from_reflectance(&r, DeltaRange::Signed, 500.0),
            Err(SimulationError::NumericDegeneracy { .. })
        ));
    }
}
