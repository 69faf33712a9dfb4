//! Generalised Snell's law and Fresnel interface coefficients.
//!
//! In each medium $j$ the wave is described by its complex refractive index
//! $\tilde{n}_j$ and the normal component of its reduced wave vector
//!
//! $$q_j = \tilde{n}_j \cos\theta_j = \sqrt{\tilde{n}_j^2 - \tilde{n}_0^2 \sin^2\theta_0},$$
//!
//! which is conserved-tangential Snell's law written without angles. The
//! square-root branch is the one with $\mathrm{Im}\,q_j \ge 0$ (and
//! $\mathrm{Re}\,q_j \ge 0$ when the imaginary part vanishes) so that the
//! transmitted wave decays or propagates away from the interface.
//!
//! Interface coefficients for a wave in medium $i$ hitting medium $j$:
//!
//! $$r_s = \frac{q_i - q_j}{q_i + q_j}, \qquad
//!   r_p = \frac{\tilde{n}_i^2 q_j - \tilde{n}_j^2 q_i}{\tilde{n}_i^2 q_j + \tilde{n}_j^2 q_i}.$$
//!
//! With this p-sign convention the ratio $r_p/r_s$ tends to $+1$ at normal
//! incidence, so $\Delta \to 0°$ there.

use num_complex::Complex64;

use super::SimulationError;

/// Linear polarisation relative to the plane of incidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarization {
    /// Electric field perpendicular to the plane of incidence.
    S,
    /// Electric field in the plane of incidence.
    P,
}

/// Optical state of one medium at one wavelength and angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Medium {
    /// Complex refractive index $\tilde{n}$.
    pub index: Complex64,
    /// Normal wave-vector factor $q = \tilde{n}\cos\theta$.
    pub q: Complex64,
}

/// Tangential invariant $\tilde{n}_0 \sin\theta_0$.
pub fn tangential_index(ambient: Complex64, angle_deg: f64) -> Complex64 {
    ambient * angle_deg.to_radians().sin()
}

/// Normal wave-vector factor $q$ for a medium of index `index`, on the
/// decaying branch.
pub fn normal_component(index: Complex64, tangential: Complex64) -> Complex64 {
    let q = (index * index - tangential * tangential).sqrt();
    if q.im < 0.0 || (q.im == 0.0 && q.re < 0.0) {
        -q
    } else {
        q
    }
}

/// Complex cosine of the propagation angle in a medium, $\cos\theta_j = q_j / \tilde{n}_j$.
pub fn cos_angle(medium: &Medium) -> Complex64 {
    medium.q / medium.index
}

/// Evaluate [`Medium`] for every index of a stack.
pub fn media(indices: &[Complex64], angle_deg: f64) -> Vec<Medium> {
    let tangential = tangential_index(indices[0], angle_deg);
    indices
        .iter()
        .map(|&index| Medium {
            index,
            q: normal_component(index, tangential),
        })
        .collect()
}

/// Fresnel reflection coefficient of the interface from `from` into `to`.
///
/// # Errors
/// [`SimulationError::NumericDegeneracy`] if the denominator vanishes or the
/// result is not finite.
pub fn reflection(
    polarization: Polarization,
    from: &Medium,
    to: &Medium,
    wavelength_nm: f64,
) -> Result<Complex64, SimulationError> {
    let (num, den) = match polarization {
        Polarization::S => (from.q - to.q, from.q + to.q),
        Polarization::P => {
            let a = from.index * from.index * to.q;
            let b = to.index * to.index * from.q;
            (a - b, a + b)
        }
    };
    if den.norm() == 0.0 {
        return Err(SimulationError::NumericDegeneracy {
            wavelength_nm,
            reason: format!("{:?}-polarised interface denominator is zero", polarization),
        });
    }
    let r = num / den;
    if !(r.re.is_finite() && r.im.is_finite()) {
        return Err(SimulationError::NumericDegeneracy {
            wavelength_nm,
            reason: format!("{:?}-polarised interface coefficient is not finite", polarization),
        });
    }
    Ok(r)
}

/// Phase thickness $\beta = 2\pi q d / \lambda$ of a finite layer.
pub fn phase_thickness(medium: &Medium, thickness_nm: f64, wavelength_nm: f64) -> Complex64 {
    medium.q * (2.0 * std::f64::consts::PI * thickness_nm / wavelength_nm)
}
