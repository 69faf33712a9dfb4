//! Stack, grid and spectrum types shared by the solvers and the simulator.

use std::sync::Arc;

use ellipso_materials::{Material, MaterialProvider};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::solver::{check_angle, SimulationError};

/// A finite film of one material.
#[derive(Debug, Clone)]
pub struct Layer {
    pub material: Arc<Material>,
    /// Physical thickness in nm, strictly positive.
    pub thickness_nm: f64,
}

impl Layer {
    pub fn new(material: Arc<Material>, thickness_nm: f64) -> Self {
        Self {
            material,
            thickness_nm,
        }
    }
}

/// A planar stack: semi-infinite ambient, ordered finite layers (top to
/// bottom), semi-infinite substrate.
///
/// A stack with no finite layers is a bare substrate. Construction validates
/// every thickness, so a `Stack` value is always well formed.
#[derive(Debug, Clone)]
pub struct Stack {
    ambient: Arc<Material>,
    layers: Vec<Layer>,
    substrate: Arc<Material>,
}

impl Stack {
    pub fn new(
        ambient: Arc<Material>,
        layers: Vec<Layer>,
        substrate: Arc<Material>,
    ) -> Result<Self, SimulationError> {
        for (i, layer) in layers.iter().enumerate() {
            check_thickness(i, layer.thickness_nm)?;
        }
        Ok(Self {
            ambient,
            layers,
            substrate,
        })
    }

    /// Ambient directly on the substrate.
    pub fn bare(ambient: Arc<Material>, substrate: Arc<Material>) -> Self {
        Self {
            ambient,
            layers: Vec::new(),
            substrate,
        }
    }

    /// Build from the ordered list of media, ambient first and substrate
    /// last, with one thickness per interior medium.
    pub fn from_media(
        media: Vec<Arc<Material>>,
        thicknesses_nm: &[f64],
    ) -> Result<Self, SimulationError> {
        let media_count = media.len();
        let mut media = media.into_iter();
        let (Some(ambient), Some(substrate)) = (media.next(), media.next_back()) else {
            return Err(SimulationError::InvalidStackConfiguration(format!(
                "a stack needs an ambient and a substrate, got {} media",
                media_count
            )));
        };
        if thicknesses_nm.len() != media_count - 2 {
            return Err(SimulationError::InvalidStackConfiguration(format!(
                "{} interior media but {} thicknesses",
                media_count - 2,
                thicknesses_nm.len()
            )));
        }

        let layers = media
            .zip(thicknesses_nm)
            .map(|(material, &d)| Layer::new(material, d))
            .collect();
        Self::new(ambient, layers, substrate)
    }

    pub fn ambient(&self) -> &Arc<Material> {
        &self.ambient
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn substrate(&self) -> &Arc<Material> {
        &self.substrate
    }

    /// Number of media including ambient and substrate.
    pub fn media_count(&self) -> usize {
        self.layers.len() + 2
    }

    /// Every medium in order, ambient first.
    pub fn media(&self) -> impl Iterator<Item = &Arc<Material>> {
        std::iter::once(&self.ambient)
            .chain(self.layers.iter().map(|l| &l.material))
            .chain(std::iter::once(&self.substrate))
    }

    /// Complex refractive index of every medium at one wavelength.
    pub fn refractive_indices(&self, wavelength_nm: f64) -> Result<Vec<Complex64>, SimulationError> {
        self.media()
            .map(|m| m.refractive_index(wavelength_nm).map_err(SimulationError::from))
            .collect()
    }

    /// Wavelength interval on which every medium is defined.
    pub fn common_range(&self) -> (f64, f64) {
        self.media().fold((0.0_f64, f64::INFINITY), |(lo, hi), m| {
            let (min, max) = m.wavelength_range();
            (lo.max(min), hi.min(max))
        })
    }

    /// True if every medium returns constants at this wavelength.
    pub fn covers(&self, wavelength_nm: f64) -> bool {
        self.media().all(|m| m.covers(wavelength_nm))
    }

    /// Copy of the stack with one layer's thickness replaced.
    pub fn with_layer_thickness(&self, index: usize, thickness_nm: f64) -> Result<Self, SimulationError> {
        self.check_layer_index(index)?;
        check_thickness(index, thickness_nm)?;
        let mut stack = self.clone();
        stack.layers[index].thickness_nm = thickness_nm;
        Ok(stack)
    }

    /// Copy of the stack with one layer's material replaced.
    pub fn with_layer_material(&self, index: usize, material: Arc<Material>) -> Result<Self, SimulationError> {
        self.check_layer_index(index)?;
        let mut stack = self.clone();
        stack.layers[index].material = material;
        Ok(stack)
    }

    /// Copy of the stack with one layer removed.
    pub fn without_layer(&self, index: usize) -> Result<Self, SimulationError> {
        self.check_layer_index(index)?;
        let mut stack = self.clone();
        stack.layers.remove(index);
        Ok(stack)
    }

    fn check_layer_index(&self, index: usize) -> Result<(), SimulationError> {
        if index < self.layers.len() {
            Ok(())
        } else {
            Err(SimulationError::InvalidStackConfiguration(format!(
                "layer index {} out of range for a stack with {} layers",
                index,
                self.layers.len()
            )))
        }
    }
}

fn check_thickness(index: usize, thickness_nm: f64) -> Result<(), SimulationError> {
    if thickness_nm.is_finite() && thickness_nm > 0.0 {
        Ok(())
    } else {
        Err(SimulationError::InvalidStackConfiguration(format!(
            "layer {} has non-positive thickness {} nm",
            index, thickness_nm
        )))
    }
}

/// Ordered set of wavelengths in nm: non-empty, positive, strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct WavelengthGrid(Vec<f64>);

impl WavelengthGrid {
    pub fn new(values: Vec<f64>) -> Result<Self, SimulationError> {
        if values.is_empty() {
            return Err(SimulationError::InvalidWavelengthGrid("grid is empty".into()));
        }
        if let Some(bad) = values.iter().find(|v| !(v.is_finite() && **v > 0.0)) {
            return Err(SimulationError::InvalidWavelengthGrid(format!(
                "wavelength {} nm is not positive",
                bad
            )));
        }
        if let Some(w) = values.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SimulationError::InvalidWavelengthGrid(format!(
                "wavelengths must be strictly increasing ({} nm after {} nm)",
                w[1], w[0]
            )));
        }
        Ok(Self(values))
    }

    /// `points` evenly spaced wavelengths from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, points: usize) -> Result<Self, SimulationError> {
        if points == 0 {
            return Err(SimulationError::InvalidWavelengthGrid(
                "a grid needs at least one point".into(),
            ));
        }
        Self::new(evenly_spaced(start, end, points))
    }

    /// Wavelengths from `start` in increments of `step`, up to `end` inclusive.
    pub fn stepped(start: f64, end: f64, step: f64) -> Result<Self, SimulationError> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SimulationError::InvalidWavelengthGrid(format!(
                "step {} nm must be positive",
                step
            )));
        }
        if end < start {
            return Err(SimulationError::InvalidWavelengthGrid(format!(
                "end {} nm is below start {} nm",
                end, start
            )));
        }
        Self::new(stepped_values(start, end, step))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a constructed grid.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.0.iter()
    }

    pub fn first(&self) -> f64 {
        self.0[0]
    }

    pub fn last(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// The sub-grid on which `keep` holds, in the same order.
    ///
    /// # Errors
    /// [`SimulationError::InvalidWavelengthGrid`] if nothing is kept.
    pub fn filtered(&self, keep: impl Fn(f64) -> bool) -> Result<Self, SimulationError> {
        let values: Vec<f64> = self.0.iter().copied().filter(|&l| keep(l)).collect();
        if values.is_empty() {
            return Err(SimulationError::InvalidWavelengthGrid(format!(
                "no wavelength of [{}, {}] nm survives filtering",
                self.first(),
                self.last()
            )));
        }
        Ok(Self(values))
    }
}

impl TryFrom<Vec<f64>> for WavelengthGrid {
    type Error = SimulationError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<WavelengthGrid> for Vec<f64> {
    fn from(grid: WavelengthGrid) -> Self {
        grid.0
    }
}

impl<'a> IntoIterator for &'a WavelengthGrid {
    type Item = &'a f64;
    type IntoIter = std::slice::Iter<'a, f64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Complex reflection coefficients of a stack at one wavelength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarizedReflectance {
    pub r_s: Complex64,
    pub r_p: Complex64,
}

impl PolarizedReflectance {
    /// Complex reflectance ratio $\rho = r_p / r_s$.
    pub fn rho(&self) -> Complex64 {
        self.r_p / self.r_s
    }

    /// Power reflectance for s polarisation, $|r_s|^2$.
    pub fn reflectance_s(&self) -> f64 {
        self.r_s.norm_sqr()
    }

    /// Power reflectance for p polarisation, $|r_p|^2$.
    pub fn reflectance_p(&self) -> f64 {
        self.r_p.norm_sqr()
    }
}

/// Ellipsometric angles at one wavelength, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumPoint {
    pub wavelength_nm: f64,
    pub psi_deg: f64,
    pub delta_deg: f64,
}

/// Ψ/Δ over a wavelength grid, one point per grid entry in grid order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spectrum {
    pub points: Vec<SpectrumPoint>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpectrumPoint> {
        self.points.iter()
    }

    pub fn wavelengths(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.wavelength_nm).collect()
    }

    pub fn psi(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.psi_deg).collect()
    }

    pub fn delta(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.delta_deg).collect()
    }
}

impl From<Vec<SpectrumPoint>> for Spectrum {
    fn from(points: Vec<SpectrumPoint>) -> Self {
        Self { points }
    }
}

impl<'a> IntoIterator for &'a Spectrum {
    type Item = &'a SpectrumPoint;
    type IntoIter = std::slice::Iter<'a, SpectrumPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Everything one simulation needs.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    pub stack: Stack,
    pub angle_deg: f64,
    pub grid: WavelengthGrid,
}

impl SimulationRequest {
    pub fn new(stack: Stack, angle_deg: f64, grid: WavelengthGrid) -> Result<Self, SimulationError> {
        check_angle(angle_deg)?;
        Ok(Self {
            stack,
            angle_deg,
            grid,
        })
    }
}

/// `points` evenly spaced values from `start` to `end`, both ends exact.
/// Empty for zero points.
pub fn evenly_spaced(start: f64, end: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / (n - 1) as f64;
            let mut values: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            values[n - 1] = end;
            values
        }
    }
}

/// `start, start + step, ...` up to `end` inclusive, tolerating rounding at
/// the last point. Empty unless `step > 0` and `end >= start`.
pub fn stepped_values(start: f64, end: f64, step: f64) -> Vec<f64> {
    if !(step.is_finite() && step > 0.0) || end < start {
        return Vec::new();
    }
    let count = ((end - start) / step + 1e-9).floor() as usize + 1;
    (0..count).map(|i| start + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn film_stack(d: f64) -> Result<Stack, SimulationError> {
        Stack::new(
            Material::air().shared(),
            vec![Layer::new(Material::constant("film", Complex64::new(1.46, 0.0)).shared(), d)],
            Material::constant("sub", Complex64::new(3.9, 0.02)).shared(),
        )
    }

    #[test]
    fn test_stack_rejects_bad_thickness() {
        assert!(film_stack(100.0).is_ok());
        for d in [0.0, -5.0, f64::NAN] {
            assert!(matches!(
                film_stack(d),
                Err(SimulationError::InvalidStackConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_from_media_needs_two_media() {
        let err = Stack::from_media(vec![Material::air().shared()], &[]).unwrap_err();
        assert!(matches!(err, SimulationError::InvalidStackConfiguration(_)));

        let media = vec![
            Material::air().shared(),
            Material::constant("a", Complex64::new(2.0, 0.0)).shared(),
            Material::constant("b", Complex64::new(1.5, 0.0)).shared(),
            Material::constant("sub", Complex64::new(4.0, 0.0)).shared(),
        ];
        assert!(Stack::from_media(media.clone(), &[10.0]).is_err());
        let stack = Stack::from_media(media, &[10.0, 20.0]).unwrap();
        assert_eq!(stack.media_count(), 4);
        assert_eq!(stack.layers()[1].thickness_nm, 20.0);
        assert_eq!(stack.substrate().name(), "sub");
    }

    #[test]
    fn test_layer_edits_leave_original_untouched() {
        let stack = film_stack(100.0).unwrap();
        let thicker = stack.with_layer_thickness(0, 250.0).unwrap();
        assert_eq!(stack.layers()[0].thickness_nm, 100.0);
        assert_eq!(thicker.layers()[0].thickness_nm, 250.0);
        assert!(stack.with_layer_thickness(1, 10.0).is_err());
        assert!(stack.with_layer_thickness(0, 0.0).is_err());
        assert_eq!(stack.without_layer(0).unwrap().media_count(), 2);
    }

    #[test]
    fn test_refractive_indices_in_stack_order() {
        let n = film_stack(100.0).unwrap().refractive_indices(600.0).unwrap();
        assert_eq!(n.len(), 3);
        assert_eq!(n[0], Complex64::new(1.0, 0.0));
        assert_eq!(n[1], Complex64::new(1.46, 0.0));
        assert_eq!(n[2], Complex64::new(3.9, 0.02));
    }

    #[test]
    fn test_common_range_of_tabulated_media() {
        use ellipso_materials::tabulated::TabulatedMaterial;
        let table = TabulatedMaterial::from_rows("table", &[(350.0, 3.9, 0.1), (900.0, 3.6, 0.0)]).unwrap();
        let stack = Stack::bare(Material::air().shared(), Material::from(table).shared());
        assert_eq!(stack.common_range(), (350.0, 900.0));
        assert!(stack.covers(350.0) && stack.covers(600.0));
        assert!(!stack.covers(300.0));
    }

    #[test]
    fn test_spacing_helpers_accept_zero() {
        assert_eq!(evenly_spaced(0.0, 600.0, 4), vec![0.0, 200.0, 400.0, 600.0]);
        assert!(evenly_spaced(0.0, 1.0, 0).is_empty());
        assert_eq!(stepped_values(0.0, 0.3, 0.1).len(), 4);
        assert!(stepped_values(1.0, 0.0, 0.1).is_empty());
        assert!(stepped_values(0.0, 1.0, 0.0).is_empty());
    }

    #[test]
    fn test_grid_validation() {
        assert!(WavelengthGrid::new(vec![400.0, 500.0]).is_ok());
        assert!(WavelengthGrid::new(vec![]).is_err());
        assert!(WavelengthGrid::new(vec![500.0, 400.0]).is_err());
        assert!(WavelengthGrid::new(vec![400.0, 400.0]).is_err());
        assert!(WavelengthGrid::new(vec![0.0, 400.0]).is_err());
        assert!(WavelengthGrid::new(vec![-1.0]).is_err());
    }

    #[test]
    fn test_linspace_hits_both_ends() {
        let grid = WavelengthGrid::linspace(400.0, 800.0, 9).unwrap();
        assert_eq!(grid.len(), 9);
        assert_eq!(grid.first(), 400.0);
        assert_eq!(grid.last(), 800.0);
        assert_abs_diff_eq!(grid.as_slice()[1], 450.0, epsilon = 1e-12);
        assert!(WavelengthGrid::linspace(400.0, 800.0, 0).is_err());
        assert_eq!(WavelengthGrid::linspace(500.0, 500.0, 1).unwrap().len(), 1);
    }

    #[test]
    fn test_stepped_includes_end() {
        let grid = WavelengthGrid::stepped(400.0, 800.0, 1.0).unwrap();
        assert_eq!(grid.len(), 401);
        assert_abs_diff_eq!(grid.last(), 800.0, epsilon = 1e-9);
        assert!(WavelengthGrid::stepped(400.0, 800.0, 0.0).is_err());
    }

    #[test]
    fn test_grid_serde_validates() {
        let grid: WavelengthGrid = serde_json::from_str("[400.0, 500.0]").unwrap();
        assert_eq!(grid.len(), 2);
        assert!(serde_json::from_str::<WavelengthGrid>("[500.0, 400.0]").is_err());
    }

    #[test]
    fn test_filtered_grid() {
        let grid = WavelengthGrid::linspace(300.0, 900.0, 7).unwrap();
        let inner = grid.filtered(|l| (400.0..=800.0).contains(&l)).unwrap();
        assert_eq!(inner.as_slice(), &[400.0, 500.0, 600.0, 700.0, 800.0]);
        assert!(grid.filtered(|_| false).is_err());
    }

    #[test]
    fn test_spectrum_json_shape() {
        let spectrum = Spectrum::from(vec![SpectrumPoint {
            wavelength_nm: 500.0,
            psi_deg: 40.0,
            delta_deg: 90.0,
        }]);
        let json = serde_json::to_string(&spectrum).unwrap();
        assert_eq!(json, r#"[{"wavelength_nm":500.0,"psi_deg":40.0,"delta_deg":90.0}]"#);
    }
}
