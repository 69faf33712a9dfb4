//! Built-in materials.
//!
//! | Identifier | Constructor | Range |
//! |-----------|-------------|-------|
//! | `air` | [`Material::air`] | all λ |
//! | `SiO2` | [`fused_silica`] | 250–1500 nm |
//! | `Si` | [`crystalline_silicon`] | 350–1000 nm |
//! | `Au` | [`gold`] | 342.5–1937.2 nm |
//! | `Ag` | [`silver`] | 342.5–1937.2 nm |
//! | `Au_np` | [`gold_nanoparticles_in_silica`] | 250–1500 nm |
//! | `Ag_np` | [`silver_nanoparticles_in_silica`] | 250–1500 nm |

use std::sync::Arc;

use crate::lorentz::{DopedMaterial, LorentzOscillator};
use crate::material::Material;
use crate::provider::MaterialError;
use crate::tabulated::TabulatedMaterial;

/// Identifier and one-line description of every built-in material.
pub const BUILTIN_MATERIALS: &[(&str, &str)] = &[
    ("air", "Ambient air, n = 1"),
    ("SiO2", "Fused silica (Malitson dispersion), 250-1500 nm"),
    ("Si", "Crystalline silicon, 350-1000 nm"),
    ("Au", "Bulk gold (Johnson & Christy), 342.5-1937.2 nm"),
    ("Ag", "Bulk silver (Johnson & Christy), 342.5-1937.2 nm"),
    ("Au_np", "Fused silica with a gold nanoparticle resonance (500 nm), 250-1500 nm"),
    ("Ag_np", "Fused silica with a silver nanoparticle resonance (405 nm), 250-1500 nm"),
];

/// Resolve a built-in material identifier (case-insensitive).
pub fn lookup(id: &str) -> Result<Material, MaterialError> {
    match id.to_ascii_lowercase().as_str() {
        "air" => Ok(Material::air()),
        "sio2" => fused_silica(),
        "si" => crystalline_silicon(),
        "au" => gold(),
        "ag" => silver(),
        "au_np" => gold_nanoparticles_in_silica(),
        "ag_np" => silver_nanoparticles_in_silica(),
        _ => Err(MaterialError::NotFound(format!(
            "'{}'. Valid identifiers: {}",
            id,
            BUILTIN_MATERIALS
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

/// Fused silica SiO₂, tabulated every 50 nm from the Malitson (1965)
/// Sellmeier dispersion. Lossless over the whole range.
pub fn fused_silica() -> Result<Material, MaterialError> {
    // (λ/nm, n, k)
    let rows: &[(f64, f64, f64)] = &[
        (250.0, 1.5074, 0.0),
        (300.0, 1.4878, 0.0),
        (350.0, 1.4769, 0.0),
        (400.0, 1.4701, 0.0),
        (450.0, 1.4656, 0.0),
        (500.0, 1.4623, 0.0),
        (550.0, 1.4599, 0.0),
        (600.0, 1.4580, 0.0),
        (650.0, 1.4565, 0.0),
        (700.0, 1.4553, 0.0),
        (750.0, 1.4542, 0.0),
        (800.0, 1.4533, 0.0),
        (850.0, 1.4525, 0.0),
        (900.0, 1.4518, 0.0),
        (950.0, 1.4511, 0.0),
        (1000.0, 1.4504, 0.0),
        (1100.0, 1.4492, 0.0),
        (1200.0, 1.4481, 0.0),
        (1300.0, 1.4469, 0.0),
        (1400.0, 1.4458, 0.0),
        (1500.0, 1.4446, 0.0),
    ];
    Ok(TabulatedMaterial::from_rows("SiO2", rows)?.into())
}

/// Crystalline silicon at room temperature, every 50 nm.
///
/// $k$ follows the absorption coefficient, $k = \alpha\lambda / 4\pi$: strong
/// absorption below 400 nm, weak in the near infrared. Values are rounded.
pub fn crystalline_silicon() -> Result<Material, MaterialError> {
    // (λ/nm, n, k)
    let rows: &[(f64, f64, f64)] = &[
        (350.0, 5.480, 2.900),
        (400.0, 5.570, 0.303),
        (450.0, 4.674, 0.091),
        (500.0, 4.293, 0.044),
        (550.0, 4.077, 0.028),
        (600.0, 3.939, 0.020),
        (650.0, 3.844, 0.015),
        (700.0, 3.783, 0.011),
        (750.0, 3.733, 0.0078),
        (800.0, 3.693, 0.0054),
        (850.0, 3.661, 0.0036),
        (900.0, 3.634, 0.0022),
        (950.0, 3.614, 0.0012),
        (1000.0, 3.596, 0.0005),
    ];
    Ok(TabulatedMaterial::from_rows("Si", rows)?.into())
}

/// Bulk gold from Johnson & Christy, *Phys. Rev. B* **6**, 4370 (1972).
///
/// Rows are the published photon energies 0.64–3.62 eV converted with
/// $\lambda = 1239.84 / E$.
pub fn gold() -> Result<Material, MaterialError> {
    // (λ/nm, n, k)
    let rows: &[(f64, f64, f64)] = &[
        (342.5, 1.48, 1.871),
        (355.3, 1.50, 1.866),
        (367.9, 1.48, 1.895),
        (381.5, 1.46, 1.933),
        (397.4, 1.47, 1.952),
        (413.3, 1.46, 1.958),
        (430.5, 1.45, 1.948),
        (450.9, 1.38, 1.914),
        (471.4, 1.31, 1.849),
        (495.9, 1.04, 1.833),
        (520.9, 0.62, 2.081),
        (548.6, 0.43, 2.455),
        (582.1, 0.29, 2.863),
        (616.8, 0.21, 3.272),
        (659.5, 0.14, 3.697),
        (704.5, 0.13, 4.103),
        (756.0, 0.14, 4.542),
        (821.1, 0.16, 5.083),
        (892.0, 0.17, 5.663),
        (984.0, 0.22, 6.350),
        (1087.6, 0.27, 7.150),
        (1215.5, 0.35, 8.145),
        (1393.1, 0.43, 9.519),
        (1610.2, 0.56, 11.210),
        (1937.2, 0.92, 13.780),
    ];
    Ok(TabulatedMaterial::from_rows("Au", rows)?.into())
}

/// Bulk silver from Johnson & Christy (1972), same energy grid as [`gold`].
pub fn silver() -> Result<Material, MaterialError> {
    // (λ/nm, n, k)
    let rows: &[(f64, f64, f64)] = &[
        (342.5, 0.14, 1.142),
        (355.3, 0.10, 1.419),
        (367.9, 0.07, 1.657),
        (381.5, 0.05, 1.864),
        (397.4, 0.05, 2.070),
        (413.3, 0.05, 2.275),
        (430.5, 0.04, 2.462),
        (450.9, 0.04, 2.657),
        (471.4, 0.05, 2.869),
        (495.9, 0.05, 3.093),
        (520.9, 0.05, 3.324),
        (548.6, 0.06, 3.586),
        (582.1, 0.05, 3.858),
        (616.8, 0.06, 4.152),
        (659.5, 0.05, 4.483),
        (704.5, 0.04, 4.838),
        (756.0, 0.03, 5.242),
        (821.1, 0.04, 5.727),
        (892.0, 0.04, 6.312),
        (984.0, 0.04, 6.992),
        (1087.6, 0.04, 7.795),
        (1215.5, 0.09, 8.828),
        (1393.1, 0.13, 10.100),
        (1610.2, 0.15, 11.850),
        (1937.2, 0.24, 14.080),
    ];
    Ok(TabulatedMaterial::from_rows("Ag", rows)?.into())
}

/// Fused silica doped with the gold nanoparticle Lorentz resonance.
pub fn gold_nanoparticles_in_silica() -> Result<Material, MaterialError> {
    doped_silica("Au_np", LorentzOscillator::gold_nanoparticle())
}

/// Fused silica doped with the silver nanoparticle Lorentz resonance.
pub fn silver_nanoparticles_in_silica() -> Result<Material, MaterialError> {
    doped_silica("Ag_np", LorentzOscillator::silver_nanoparticle())
}

fn doped_silica(name: &str, oscillator: LorentzOscillator) -> Result<Material, MaterialError> {
    let host = Arc::new(fused_silica()?);
    Ok(DopedMaterial::new(name, host, vec![oscillator])?.into())
}
