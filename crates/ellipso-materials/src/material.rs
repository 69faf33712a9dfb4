//! The [`Material`] enum: one type for every optical-constant source.

use std::sync::Arc;

use num_complex::Complex64;

use crate::effective_medium::MaxwellGarnett;
use crate::lorentz::{DopedMaterial, LorentzModel};
use crate::provider::{check_wavelength, MaterialError, MaterialProvider};
use crate::tabulated::TabulatedMaterial;

/// Wavelength-independent complex refractive index.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantMaterial {
    name: String,
    index: Complex64,
}

impl ConstantMaterial {
    pub fn new(name: impl Into<String>, index: Complex64) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    pub fn index(&self) -> Complex64 {
        self.index
    }
}

impl MaterialProvider for ConstantMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn wavelength_range(&self) -> (f64, f64) {
        (0.0, f64::INFINITY)
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        check_wavelength(&self.name, wavelength_nm)?;
        Ok(self.index * self.index)
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        check_wavelength(&self.name, wavelength_nm)?;
        Ok(self.index)
    }
}

/// An optical material. Immutable once built; share it through `Arc`.
#[derive(Debug, Clone)]
pub enum Material {
    Constant(ConstantMaterial),
    Tabulated(TabulatedMaterial),
    Oscillator(LorentzModel),
    Doped(DopedMaterial),
    MaxwellGarnett(MaxwellGarnett),
}

impl Material {
    /// Ambient air, $\tilde{n} = 1$.
    pub fn air() -> Self {
        Self::constant("air", Complex64::new(1.0, 0.0))
    }

    pub fn constant(name: impl Into<String>, index: Complex64) -> Self {
        Material::Constant(ConstantMaterial::new(name, index))
    }

    /// Shared handle, the form stacks expect.
    pub fn shared(self) -> Arc<Material> {
        Arc::new(self)
    }

    fn provider(&self) -> &dyn MaterialProvider {
        match self {
            Material::Constant(m) => m,
            Material::Tabulated(m) => m,
            Material::Oscillator(m) => m,
            Material::Doped(m) => m,
            Material::MaxwellGarnett(m) => m,
        }
    }

    /// Short tag naming the variant, used in logs and listings.
    pub fn kind(&self) -> &'static str {
        match self {
            Material::Constant(_) => "constant",
            Material::Tabulated(_) => "tabulated",
            Material::Oscillator(_) => "oscillator",
            Material::Doped(_) => "doped",
            Material::MaxwellGarnett(_) => "maxwell-garnett",
        }
    }
}

impl MaterialProvider for Material {
    fn name(&self) -> &str {
        self.provider().name()
    }

    fn wavelength_range(&self) -> (f64, f64) {
        self.provider().wavelength_range()
    }

    fn dielectric_function(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        self.provider().dielectric_function(wavelength_nm)
    }

    fn refractive_index(&self, wavelength_nm: f64) -> Result<Complex64, MaterialError> {
        self.provider().refractive_index(wavelength_nm)
    }

    fn covers(&self, wavelength_nm: f64) -> bool {
        self.provider().covers(wavelength_nm)
    }
}

impl From<ConstantMaterial> for Material {
    fn from(m: ConstantMaterial) -> Self {
        Material::Constant(m)
    }
}

impl From<TabulatedMaterial> for Material {
    fn from(m: TabulatedMaterial) -> Self {
        Material::Tabulated(m)
    }
}

impl From<LorentzModel> for Material {
    fn from(m: LorentzModel) -> Self {
        Material::Oscillator(m)
    }
}

impl From<DopedMaterial> for Material {
    fn from(m: DopedMaterial) -> Self {
        Material::Doped(m)
    }
}

impl From<MaxwellGarnett> for Material {
    fn from(m: MaxwellGarnett) -> Self {
        Material::MaxwellGarnett(m)
    }
}
