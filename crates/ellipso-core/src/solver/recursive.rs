//! Recursive Airy (Parratt) solver.
//!
//! Starting from the bottom interface, each layer folds the reflection of
//! everything below it into an effective coefficient:
//!
//! $$r_{j-1} = \frac{r_{j-1,j} + r_j e^{2i\beta_j}}{1 + r_{j-1,j} \, r_j e^{2i\beta_j}}.$$
//!
//! Algebraically identical to the characteristic-matrix product; used as an
//! independent cross-check.

use num_complex::Complex64;

use super::fresnel::{self, Medium, Polarization};
use super::{check_angle, SimulationError, StackSolver};
use crate::types::{PolarizedReflectance, Stack};

#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveSolver;

impl RecursiveSolver {
    pub fn new() -> Self {
        Self
    }

    fn reflection(
        &self,
        polarization: Polarization,
        media: &[Medium],
        stack: &Stack,
        wavelength_nm: f64,
    ) -> Result<Complex64, SimulationError> {
        let last = media.len() - 1;
        let mut r = fresnel::reflection(polarization, &media[last - 1], &media[last], wavelength_nm)?;

        for j in (1..last).rev() {
            let thickness = stack.layers()[j - 1].thickness_nm;
            let beta = fresnel::phase_thickness(&media[j], thickness, wavelength_nm);
            let phase = (Complex64::i() * 2.0 * beta).exp();
            let r_top = fresnel::reflection(polarization, &media[j - 1], &media[j], wavelength_nm)?;

            let den = Complex64::new(1.0, 0.0) + r_top * r * phase;
            if den.norm() == 0.0 {
                return Err(SimulationError::NumericDegeneracy {
                    wavelength_nm,
                    reason: format!("{:?}-polarised recursion denominator is zero", polarization),
                });
            }
            r = (r_top + r * phase) / den;
        }

        if !(r.re.is_finite() && r.im.is_finite()) {
            return Err(SimulationError::NumericDegeneracy {
                wavelength_nm,
                reason: format!("{:?}-polarised reflection is not finite", polarization),
            });
        }
        Ok(r)
    }
}

impl StackSolver for RecursiveSolver {
    fn reflection_coefficients(
        &self,
        stack: &Stack,
        angle_deg: f64,
        wavelength_nm: f64,
    ) -> Result<PolarizedReflectance, SimulationError> {
        check_angle(angle_deg)?;
        let indices = stack.refractive_indices(wavelength_nm)?;
        let media = fresnel::media(&indices, angle_deg);

        Ok(PolarizedReflectance {
            r_s: self.reflection(Polarization::S, &media, stack, wavelength_nm)?,
            r_p: self.reflection(Polarization::P, &media, stack, wavelength_nm)?,
        })
    }

    fn method_name(&self) -> &str {
        "Recursive Airy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::TransferMatrixSolver;
    use crate::types::Layer;
    use approx::assert_abs_diff_eq;
    use ellipso_materials::Material;

    fn constant(n: f64, k: f64) -> std::sync::Arc<Material> {
        Material::constant("c", Complex64::new(n, k)).shared()
    }

    #[test]
    fn test_matches_transfer_matrix_on_multilayer() {
        let stack = Stack::new(
            constant(1.0, 0.0),
            vec![
                Layer::new(constant(2.1, 0.0), 85.0),
                Layer::new(constant(1.38, 0.0), 120.0),
                Layer::new(constant(0.15, 3.2), 12.0),
                Layer::new(constant(1.46, 0.0), 300.0),
            ],
            constant(3.9, 0.02),
        )
        .unwrap();
        for (angle, lam) in [(45.0, 400.0), (70.0, 633.0), (75.0, 900.0)] {
            let a = RecursiveSolver.reflection_coefficients(&stack, angle, lam).unwrap();
            let b = TransferMatrixSolver.reflection_coefficients(&stack, angle, lam).unwrap();
            assert_abs_diff_eq!((a.r_s - b.r_s).norm(), 0.0, epsilon = 1e-12);
            assert_abs_diff_eq!((a.r_p - b.r_p).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_interface() {
        let stack = Stack::bare(constant(1.0, 0.0), constant(1.5, 0.0));
        let r = RecursiveSolver.reflection_coefficients(&stack, 60.0, 500.0).unwrap();
        let ti = 60f64.to_radians();
        let tt = (ti.sin() / 1.5).asin();
        assert_abs_diff_eq!(r.r_s.re, -(ti - tt).sin() / (ti + tt).sin(), epsilon = 1e-14);
    }
}
