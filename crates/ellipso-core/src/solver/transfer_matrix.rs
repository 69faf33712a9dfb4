//! Characteristic (transfer) matrix solver.
//!
//! For media $0 \dots N+1$ the total matrix is
//!
//! $$M = I_{01} \, P_1 \, I_{12} \, P_2 \cdots P_N \, I_{N,N+1},$$
//!
//! built separately for s and p polarisation, and the stack reflection
//! coefficient is $r = M_{10} / M_{00}$.

use log::trace;
use num_complex::Complex64;

use super::fresnel::{self, Medium, Polarization};
use super::matrix::Mat2;
use super::{check_angle, SimulationError, StackSolver};
use crate::types::{PolarizedReflectance, Stack};

/// Transfer-matrix stack solver. Default solver of the simulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransferMatrixSolver;

impl TransferMatrixSolver {
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
        let mut m = Mat2::interface(fresnel::reflection(
            polarization,
            &media[0],
            &media[1],
            wavelength_nm,
        )?);

        for (j, layer) in stack.layers().iter().enumerate() {
            let inside = &media[j + 1];
            let beta = fresnel::phase_thickness(inside, layer.thickness_nm, wavelength_nm);
            let r = fresnel::reflection(polarization, inside, &media[j + 2], wavelength_nm)?;
            m = m * Mat2::propagation(beta) * Mat2::interface(r);
        }

        let [[m00, _], [m10, _]] = m.0;
        if !m.is_finite() || m00.norm() == 0.0 {
            return Err(SimulationError::NumericDegeneracy {
                wavelength_nm,
                reason: format!("{:?}-polarised characteristic matrix is singular", polarization),
            });
        }
        Ok(m10 / m00)
    }
}

impl StackSolver for TransferMatrixSolver {
    fn reflection_coefficients(
        &self,
        stack: &Stack,
        angle_deg: f64,
        wavelength_nm: f64,
    ) -> Result<PolarizedReflectance, SimulationError> {
        check_angle(angle_deg)?;
        let indices = stack.refractive_indices(wavelength_nm)?;
        let media = fresnel::media(&indices, angle_deg);

        let r_s = self.reflection(Polarization::S, &media, stack, wavelength_nm)?;
        let r_p = self.reflection(Polarization::P, &media, stack, wavelength_nm)?;
        trace!("λ = {} nm: r_s = {}, r_p = {}", wavelength_nm, r_s, r_p);
        Ok(PolarizedReflectance { r_s, r_p })
    }

    fn method_name(&self) -> &str {
        "Transfer matrix"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layer;
    use approx::assert_abs_diff_eq;
    use ellipso_materials::Material;

    fn constant(n: f64, k: f64) -> std::sync::Arc<Material> {
        Material::constant("c", Complex64::new(n, k)).shared()
    }

    #[test]
    fn test_bare_substrate_equals_single_interface() {
        let stack = Stack::bare(constant(1.0, 0.0), constant(1.5, 0.0));
        let r = TransferMatrixSolver.reflection_coefficients(&stack, 60.0, 500.0).unwrap();
        let ti = 60f64.to_radians();
        let tt = (ti.sin() / 1.5).asin();
        assert_abs_diff_eq!(r.r_s.re, -(ti - tt).sin() / (ti + tt).sin(), epsilon = 1e-14);
        assert_abs_diff_eq!(r.r_p.re, -(ti - tt).tan() / (ti + tt).tan(), epsilon = 1e-14);
    }

    #[test]
    fn test_index_matched_film_is_invisible() {
        let film = Stack::new(
            constant(1.0, 0.0),
            vec![Layer::new(constant(1.5, 0.0), 321.0)],
            constant(1.5, 0.0),
        )
        .unwrap();
        let bare = Stack::bare(constant(1.0, 0.0), constant(1.5, 0.0));
        let a = TransferMatrixSolver.reflection_coefficients(&film, 55.0, 633.0).unwrap();
        let b = TransferMatrixSolver.reflection_coefficients(&bare, 55.0, 633.0).unwrap();
        assert_abs_diff_eq!((a.r_s - b.r_s).norm(), 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!((a.r_p - b.r_p).norm(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_half_wave_layer_is_absent() {
        // Normal-direction optical path of one half wave: q d = λ / 2.
        let (n, angle, lam) = (2.0_f64, 40.0_f64, 600.0);
        let q = (n * n - angle.to_radians().sin().powi(2)).sqrt();
        let d = lam / (2.0 * q);
        let film = Stack::new(constant(1.0, 0.0), vec![Layer::new(constant(n, 0.0), d)], constant(3.0, 0.1)).unwrap();
        let bare = Stack::bare(constant(1.0, 0.0), constant(3.0, 0.1));
        let a = TransferMatrixSolver.reflection_coefficients(&film, angle, lam).unwrap();
        let b = TransferMatrixSolver.reflection_coefficients(&bare, angle, lam).unwrap();
        assert_abs_diff_eq!((a.r_s - b.r_s).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((a.r_p - b.r_p).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_thick_absorber_hides_substrate() {
        let metal = constant(0.2, 3.5);
        let film = Stack::new(constant(1.0, 0.0), vec![Layer::new(metal.clone(), 5.0e4)], constant(1.5, 0.0)).unwrap();
        let bulk = Stack::bare(constant(1.0, 0.0), metal);
        let a = TransferMatrixSolver.reflection_coefficients(&film, 65.0, 500.0).unwrap();
        let b = TransferMatrixSolver.reflection_coefficients(&bulk, 65.0, 500.0).unwrap();
        assert_abs_diff_eq!((a.r_s - b.r_s).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((a.r_p - b.r_p).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_invalid_angle() {
        let stack = Stack::bare(constant(1.0, 0.0), constant(1.5, 0.0));
        assert!(matches!(
            TransferMatrixSolver.reflection_coefficients(&stack, 90.0, 500.0),
            Err(SimulationError::InvalidAngle(_))
        ));
    }

    #[test]
    fn test_method_name() {
        assert_eq!(TransferMatrixSolver::new().method_name(), "Transfer matrix");
    }
}
