//! Maxwell Garnett effective-medium mixing.
//!
//! Spherical inclusions of dielectric function $\epsilon_i$ dispersed at
//! volume fraction $f$ in a host $\epsilon_h$ behave as a homogeneous film
//! with
//!
//! $$\epsilon_{\text{eff}} = \epsilon_h
//!   \frac{\epsilon_i + 2\epsilon_h + 2f(\epsilon_i - \epsilon_h)}
//!        {\epsilon_i + 2\epsilon_h - f(\epsilon_i - \epsilon_h)}$$
//!
//! The limits $f = 0$ and $f = 1$ return the host and the inclusion exactly
//! (up to rounding).

use std::sync::Arc;

use num_complex::Complex64;

use crate::material::Material;
use crate::provider::{MaterialError, MaterialProvider};

/// Effective dielectric function for inclusion `eps_inclusion` in host `eps_host`.
pub fn maxwell_garnett(
    eps_host: Complex64,
    eps_inclusion: Complex64,
    volume_fraction: f64,
) -> Result<Complex64, MaterialError> {
    let contrast = eps_inclusion - eps_host;
    let base = eps_inclusion + 2.0 * eps_host;
    let denom = base - volume_fraction * contrast;
    if denom.norm() == 0.0 || !denom.is_finite() {
        return Err(MaterialError::InvalidParameter(format!(
            "Maxwell Garnett mixture is singular (host {}, inclusion {}, f = {})",
            eps_host, eps_inclusion, volume_fraction
        )));
    }
    Ok(eps_host * (base + 2.0 * volume_fraction * contrast) / denom)
}

/// Composite film of `inclusion` dispersed in `host` at a fixed volume fraction.
#[derive(Debug, Clone)]
pub struct MaxwellGarnett {
    name: String,
    host: Arc<Material>,
    inclusion: Arc<Material>,
    volume_fraction: f64,
}

impl MaxwellGarnett {
    /// # Errors
    /// [`MaterialError::InvalidParameter`] if `volume_fraction` is outside
    /// $[0, 1]$ or the constituents share no wavelength range.
    pub fn new(
        name: impl Into<String>,
        host: Arc<Material>,
        inclusion: Arc<Material>,
        volume_fraction: f64,
    ) -> Result<Self, MaterialError> {
        if !(0.0..=1.0).contains(&volume_fraction) {
            return Err(MaterialError::InvalidParameter(format!(
                "volume fraction must lie in [0, 1], got {}",
                volume_fraction
            )));
        }
        let (h_min, h_max) = host.wavelength_range();
        let (i_min, i_max) = inclusion.wavelength_range();
        if h_min.max(i_min) > h_max.min(i_max) {
            return Err(MaterialError::InvalidParameter(format!(
                "host '{}' and inclusion '{}' have disjoint wavelength ranges",
                host.name(),
                inclusion.name()
            )));
        }
        Ok(Self {
            name: name.into(),
            host,
            inclusion,
            volume_fraction,
        })
    }

    pub fn volume_fraction(&self) -> f64 {
        self.volume_fraction
    }

    pub fn host(&self) -> &Arc<Material> {
        &self.host
    }

    pub fn inclusion(&self) -> &Arc<Material> {
        &self.inclusion
    }

    /// Same constituents at a different volume fraction.
    pub fn with_volume_fraction(&self, volume_fraction: f64) -> Result<Self, MaterialError> {
        Self::new(
            self.name.clone(),
            Arc::clone(&self.host),
            Arc::clone(&self.inclusion),
            volume_fraction,
        )
    }
}

impl MaterialProvider for MaxwellGarnett {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        let (h_min, h_max) = self.host.wavelength_range();
        let (i_min, i_max) = self.inclusion.wavelength_range();
        (h_min.max(i_min), h_max.min(i_max))
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        let eps_h = self.host.dielectric_function(wavelength_nm)?;
        let eps_i = self.inclusion.dielectric_function(wavelength_nm)?;
        maxwell_garnett(eps_h, eps_i, self.volume_fraction)
    }

    fn covers(&self, wavelength_nm: f64) -> bool {
        self.host.covers(wavelength_nm) && self.inclusion.covers(wavelength_nm)
    }
}
