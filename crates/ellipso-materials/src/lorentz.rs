//! Lorentz oscillator dielectric models.
//!
//! Each oscillator is parameterised in wavelength space by its resonance
//! $\lambda_0$ (nm), damping $\Gamma$ (nm) and dimensionless amplitude $A$:
//!
//! $$\epsilon(\lambda) = \epsilon_\infty + \sum_i
//!   \frac{A_i \lambda^2}{\lambda^2 - \lambda_{0,i}^2 - i \Gamma_i \lambda}$$
//!
//! This is the frequency-domain oscillator
//! $f \omega_0^2 / (\omega_0^2 - \omega^2 - i\gamma\omega)$ with
//! $\omega = 2\pi c / \lambda$, $A = f$ and $\Gamma = \gamma \lambda_0^2 / (2\pi c)$.
//! Separated into parts, with $D = (\lambda^2 - \lambda_0^2)^2 + \Gamma^2 \lambda^2$:
//!
//! - $\epsilon_1 = A \lambda^2 (\lambda^2 - \lambda_0^2) / D$
//! - $\epsilon_2 = A \lambda^3 \Gamma / D$
//!
//! so $\Gamma > 0$ and $A > 0$ give $\epsilon_2 > 0$ (absorption).
//!
//! Two consumers are provided: [`LorentzModel`] is a complete material
//! ($\epsilon_\infty$ plus oscillators), [`DopedMaterial`] adds oscillators to
//! the dielectric function of an existing host (nanoparticle plasmon
//! resonances embedded in a film).

use std::sync::Arc;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::material::Material;
use crate::provider::{check_wavelength, MaterialError, MaterialProvider};

/// Sign constraint on oscillator amplitudes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmplitudeSign {
    /// $A \ge 0$: every oscillator absorbs.
    #[default]
    NonNegative,
    /// Any finite amplitude (difference spectra, fitted corrections).
    Any,
}

/// A single Lorentz oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LorentzOscillator {
    /// Resonance wavelength $\lambda_0$ (nm).
    pub center_nm: f64,
    /// Damping $\Gamma$ (nm).
    pub damping_nm: f64,
    /// Oscillator strength $A$.
    pub amplitude: f64,
}

impl LorentzOscillator {
    pub fn new(center_nm: f64, damping_nm: f64, amplitude: f64) -> Self {
        Self {
            center_nm,
            damping_nm,
            amplitude,
        }
    }

    /// Plasmon resonance of small gold nanoparticles.
    pub fn gold_nanoparticle() -> Self {
        Self::new(500.0, 50.0, 0.150)
    }

    /// Plasmon resonance of small silver nanoparticles.
    pub fn silver_nanoparticle() -> Self {
        Self::new(405.0, 40.0, 0.150)
    }

    /// Look up a nanoparticle preset by name (`"Au"` or `"Ag"`, case-insensitive).
    pub fn preset(name: &str) -> Result<Self, MaterialError> {
        match name.to_ascii_lowercase().trim_end_matches(".nk") {
            "au" | "gold" => Ok(Self::gold_nanoparticle()),
            "ag" | "silver" => Ok(Self::silver_nanoparticle()),
            _ => Err(MaterialError::NotFound(format!(
                "no oscillator preset '{}' (valid: Au, Ag)",
                name
            ))),
        }
    }

    /// Check the physical admissibility of the parameters.
    pub fn validate(&self, sign: AmplitudeSign) -> Result<(), MaterialError> {
        if !(self.damping_nm.is_finite() && self.damping_nm > 0.0) {
            return Err(MaterialError::NonPhysicalOscillator(format!(
                "damping must be positive, got {} nm",
                self.damping_nm
            )));
        }
        if !(self.center_nm.is_finite() && self.center_nm > 0.0) {
            return Err(MaterialError::NonPhysicalOscillator(format!(
                "resonance wavelength must be positive, got {} nm",
                self.center_nm
            )));
        }
        if !self.amplitude.is_finite() {
            return Err(MaterialError::NonPhysicalOscillator(format!(
                "amplitude must be finite, got {}",
                self.amplitude
            )));
        }
        if sign == AmplitudeSign::NonNegative && self.amplitude < 0.0 {
            return Err(MaterialError::NonPhysicalOscillator(format!(
                "amplitude must be non-negative, got {}",
                self.amplitude
            )));
        }
        Ok(())
    }

    /// Dielectric contribution $A\lambda^2 / (\lambda^2 - \lambda_0^2 - i\Gamma\lambda)$.
    pub fn contribution(&self, wavelength_nm: f64) -> Complex64 {
        let lam2 = wavelength_nm * wavelength_nm;
        let denom = Complex64::new(
            lam2 - self.center_nm * self.center_nm,
            -self.damping_nm * wavelength_nm,
        );
        Complex64::from(self.amplitude * lam2) / denom
    }
}

fn validate_all(oscillators: &[LorentzOscillator], sign: AmplitudeSign) -> Result<(), MaterialError> {
    for (i, osc) in oscillators.iter().enumerate() {
        osc.validate(sign).map_err(|e| match e {
            MaterialError::NonPhysicalOscillator(msg) => {
                MaterialError::NonPhysicalOscillator(format!("oscillator {}: {}", i, msg))
            }
            other => other,
        })?;
    }
    Ok(())
}

/// Sum of oscillator contributions at one wavelength, starting from zero.
pub fn oscillator_sum(oscillators: &[LorentzOscillator], wavelength_nm: f64) -> Complex64 {
    oscillators
        .iter()
        .fold(Complex64::new(0.0, 0.0), |acc, osc| acc + osc.contribution(wavelength_nm))
}

/// Material whose dielectric function is $\epsilon_\infty$ plus Lorentz oscillators.
#[derive(Debug, Clone)]
pub struct LorentzModel {
    name: String,
    eps_inf: f64,
    oscillators: Vec<LorentzOscillator>,
}

impl LorentzModel {
    /// Build a model requiring non-negative amplitudes.
    pub fn new(
        name: impl Into<String>,
        eps_inf: f64,
        oscillators: Vec<LorentzOscillator>,
    ) -> Result<Self, MaterialError> {
        Self::with_amplitude_sign(name, eps_inf, oscillators, AmplitudeSign::default())
    }

    pub fn with_amplitude_sign(
        name: impl Into<String>,
        eps_inf: f64,
        oscillators: Vec<LorentzOscillator>,
        amplitude_sign: AmplitudeSign,
    ) -> Result<Self, MaterialError> {
        if !eps_inf.is_finite() {
            return Err(MaterialError::NonPhysicalOscillator(format!(
                "eps_inf must be finite, got {}",
                eps_inf
            )));
        }
        validate_all(&oscillators, amplitude_sign)?;
        Ok(Self {
            name: name.into(),
            eps_inf,
            oscillators,
        })
    }

    pub fn eps_inf(&self) -> f64 {
        self.eps_inf
    }

    pub fn oscillators(&self) -> &[LorentzOscillator] {
        &self.oscillators
    }

    /// Oscillator part of $\epsilon(\lambda)$, without $\epsilon_\infty$.
    pub fn oscillator_sum(&self, wavelength_nm: f64) -> Complex64 {
        oscillator_sum(&self.oscillators, wavelength_nm)
    }

    /// $\epsilon(\lambda)$ on every point of a wavelength grid.
    pub fn dielectric_spectrum(&self, wavelengths_nm: &[f64]) -> Result<Vec<Complex64>, MaterialError> {
        wavelengths_nm
            .iter()
            .map(|&lam| self.dielectric_function(lam))
            .collect()
    }
}

impl MaterialProvider for LorentzModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        check_wavelength(&self.name, wavelength_nm)?;
        Ok(Complex64::from(self.eps_inf) + self.oscillator_sum(wavelength_nm))
    }
}

/// Host material with additional Lorentz oscillators in its dielectric function.
///
/// $\epsilon(\lambda) = \epsilon_{\text{host}}(\lambda) + \sum_i L_i(\lambda)$.
#[derive(Debug, Clone)]
pub struct DopedMaterial {
    name: String,
    host: Arc<Material>,
    oscillators: Vec<LorentzOscillator>,
}

impl DopedMaterial {
    pub fn new(
        name: impl Into<String>,
        host: Arc<Material>,
        oscillators: Vec<LorentzOscillator>,
    ) -> Result<Self, MaterialError> {
        validate_all(&oscillators, AmplitudeSign::NonNegative)?;
        Ok(Self {
            name: name.into(),
            host,
            oscillators,
        })
    }

    pub fn host(&self) -> &Arc<Material> {
        &self.host
    }

    pub fn oscillators(&self) -> &[LorentzOscillator] {
        &self.oscillators
    }
}

impl MaterialProvider for DopedMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        self.host.wavelength_range()
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let host = self.host.dielectric_function(wavelength_nm)?;
        Ok(host + oscillator_sum(&self.oscillators, wavelength_nm))
    }

    fn covers(&self, wavelength_nm: f64) -> bool {
        self.host.covers(wavelength_nm)
    }
}
