//! Training-set sweeps.
//!
//! Each sweep repeats the forward simulation over film thickness and,
//! optionally, one film parameter (Maxwell Garnett volume fraction or a
//! Lorentz oscillator parameter set). Results come in two layouts:
//!
//! - a *supervector* array: axis 0 holds $\Psi(\lambda_1 \dots \lambda_n)$
//!   followed by $\Delta(\lambda_1 \dots \lambda_n)$, axis 1 the thickness,
//!   axis 2 (when present) the film parameter;
//! - flat [`SweepRecord`]s, one per (parameter, thickness, wavelength).
//!
//! A thickness of zero removes the swept layer, which is the physical limit
//! of a vanishing film.

use std::sync::Arc;

use log::{debug, info};
use ndarray::{Array2, Array3, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use ellipso_materials::effective_medium::MaxwellGarnett;
use ellipso_materials::lorentz::{DopedMaterial, LorentzOscillator};
use ellipso_materials::{Material, MaterialProvider};

use crate::simulator::Simulator;
use crate::solver::{SimulationError, StackSolver};
use crate::types::{Spectrum, Stack, WavelengthGrid};

/// Film parameter attached to a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    VolumeFraction(f64),
    Oscillator(LorentzOscillator),
}

/// One labelled sample of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepRecord {
    pub psi_deg: f64,
    pub delta_deg: f64,
    pub wavelength_nm: f64,
    pub thickness_nm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter: Option<SweepParameter>,
}

/// Output of a [`ThicknessSweep`].
#[derive(Debug, Clone)]
pub struct ThicknessSweepResult {
    pub grid: WavelengthGrid,
    pub thicknesses_nm: Vec<f64>,
    /// Shape (2·nλ, n_thickness).
    pub supervector: Array2<f64>,
    pub records: Vec<SweepRecord>,
}

/// Output of a [`VolumeFractionSweep`] or an [`OscillatorSweep`].
#[derive(Debug, Clone)]
pub struct ParameterSweepResult {
    pub grid: WavelengthGrid,
    pub thicknesses_nm: Vec<f64>,
    pub parameters: Vec<SweepParameter>,
    /// Shape (2·nλ, n_thickness, n_parameter).
    pub supervector: Array3<f64>,
    pub records: Vec<SweepRecord>,
}

/// Sweep the thickness of one layer of a stack.
#[derive(Debug, Clone)]
pub struct ThicknessSweep {
    stack: Stack,
    layer: usize,
    thicknesses_nm: Vec<f64>,
}

impl ThicknessSweep {
    /// `layer` indexes the finite layers of `stack`; its own thickness is
    /// replaced by each entry of `thicknesses_nm`.
    pub fn new(stack: Stack, layer: usize, thicknesses_nm: Vec<f64>) -> Result<Self, SimulationError> {
        check_layer(&stack, layer)?;
        check_thicknesses(&thicknesses_nm)?;
        Ok(Self {
            stack,
            layer,
            thicknesses_nm,
        })
    }

    pub fn run<S: StackSolver>(
        &self,
        simulator: &Simulator<S>,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<ThicknessSweepResult, SimulationError> {
        info!(
            "Thickness sweep: {} thicknesses × {} wavelengths",
            self.thicknesses_nm.len(),
            grid.len()
        );
        let films = vec![(None, self.stack.clone())];
        let (supervector, records) =
            run_cases(simulator, angle_deg, grid, &films, self.layer, &self.thicknesses_nm)?;
        Ok(ThicknessSweepResult {
            grid: grid.clone(),
            thicknesses_nm: self.thicknesses_nm.clone(),
            supervector: supervector.index_axis_move(Axis(2), 0),
            records,
        })
    }
}

/// Sweep thickness × volume fraction of a Maxwell Garnett film.
#[derive(Debug, Clone)]
pub struct VolumeFractionSweep {
    stack: Stack,
    layer: usize,
    composite: MaxwellGarnett,
    fractions: Vec<f64>,
    thicknesses_nm: Vec<f64>,
}

impl VolumeFractionSweep {
    /// `composite` provides host and inclusion; its own fraction is ignored.
    pub fn new(
        stack: Stack,
        layer: usize,
        composite: MaxwellGarnett,
        fractions: Vec<f64>,
        thicknesses_nm: Vec<f64>,
    ) -> Result<Self, SimulationError> {
        check_layer(&stack, layer)?;
        check_thicknesses(&thicknesses_nm)?;
        if fractions.is_empty() {
            return Err(SimulationError::InvalidStackConfiguration(
                "volume-fraction sweep needs at least one fraction".into(),
            ));
        }
        for &f in &fractions {
            composite.with_volume_fraction(f)?;
        }
        Ok(Self {
            stack,
            layer,
            composite,
            fractions,
            thicknesses_nm,
        })
    }

    pub fn run<S: StackSolver>(
        &self,
        simulator: &Simulator<S>,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<ParameterSweepResult, SimulationError> {
        info!(
            "Volume-fraction sweep of '{}' in '{}': {} fractions × {} thicknesses × {} wavelengths",
            self.composite.inclusion().name(),
            self.composite.host().name(),
            self.fractions.len(),
            self.thicknesses_nm.len(),
            grid.len()
        );
        let films = self
            .fractions
            .iter()
            .map(|&f| -> Result<Film, SimulationError> {
                let film = Material::from(self.composite.with_volume_fraction(f)?).shared();
                let stack = self.stack.with_layer_material(self.layer, film)?;
                Ok((Some(SweepParameter::VolumeFraction(f)), stack))
            })
            .collect::<Result<Vec<_>, SimulationError>>()?;
        finish(simulator, angle_deg, grid, films, self.layer, &self.thicknesses_nm)
    }
}

/// Sweep thickness × Lorentz parameter set of an oscillator-doped film.
#[derive(Debug, Clone)]
pub struct OscillatorSweep {
    stack: Stack,
    layer: usize,
    host: Arc<Material>,
    oscillators: Vec<LorentzOscillator>,
    thicknesses_nm: Vec<f64>,
}

impl OscillatorSweep {
    /// Each entry of `oscillators` dopes `host` on its own.
    pub fn new(
        stack: Stack,
        layer: usize,
        host: Arc<Material>,
        oscillators: Vec<LorentzOscillator>,
        thicknesses_nm: Vec<f64>,
    ) -> Result<Self, SimulationError> {
        check_layer(&stack, layer)?;
        check_thicknesses(&thicknesses_nm)?;
        if oscillators.is_empty() {
            return Err(SimulationError::InvalidStackConfiguration(
                "oscillator sweep needs at least one parameter set".into(),
            ));
        }
        Ok(Self {
            stack,
            layer,
            host,
            oscillators,
            thicknesses_nm,
        })
    }

    pub fn run<S: StackSolver>(
        &self,
        simulator: &Simulator<S>,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<ParameterSweepResult, SimulationError> {
        info!(
            "Oscillator sweep: {} parameter sets × {} thicknesses × {} wavelengths",
            self.oscillators.len(),
            self.thicknesses_nm.len(),
            grid.len()
        );
        let films = self
            .oscillators
            .iter()
            .map(|&osc| -> Result<Film, SimulationError> {
                let name = format!("{}+lorentz({})", self.host.name(), osc.center_nm);
                let film = Material::from(DopedMaterial::new(name, Arc::clone(&self.host), vec![osc])?).shared();
                let stack = self.stack.with_layer_material(self.layer, film)?;
                Ok((Some(SweepParameter::Oscillator(osc)), stack))
            })
            .collect::<Result<Vec<_>, SimulationError>>()?;
        finish(simulator, angle_deg, grid, films, self.layer, &self.thicknesses_nm)
    }
}

/// Perturbed copies of `base` for `count` random particle sizes $R \sim U(10, 100)$.
///
/// $\lambda_0' = \lambda_0 + 0.6 (R-10)^{0.9}$,
/// $\Gamma' = \max(\Gamma + 0.2 (R-10)^{1.1}, 1)$,
/// $A' = \max(A + 0.0025 R - 0.000015 R^2, 0.01)$.
/// The same seed always yields the same sets.
pub fn perturbed_oscillators(base: &LorentzOscillator, count: usize, seed: u64) -> Vec<LorentzOscillator> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| size_perturbed(base, rng.gen_range(10.0..100.0)))
        .collect()
}

/// Oscillator of `base` shifted for particle size `r`.
pub fn size_perturbed(base: &LorentzOscillator, r: f64) -> LorentzOscillator {
    let growth = (r - 10.0).max(0.0);
    LorentzOscillator::new(
        base.center_nm + 0.6 * growth.powf(0.9),
        (base.damping_nm + 0.2 * growth.powf(1.1)).max(1.0),
        (base.amplitude + 0.0025 * r - 0.000015 * r * r).max(0.01),
    )
}

/// The part of `grid` on which every material has optical constants.
///
/// # Errors
/// [`SimulationError::OutOfDomainWavelength`] if no wavelength survives.
pub fn restrict_grid<'a>(
    grid: &WavelengthGrid,
    materials: impl IntoIterator<Item = &'a Material>,
) -> Result<WavelengthGrid, SimulationError> {
    let materials: Vec<&Material> = materials.into_iter().collect();
    let restricted = grid.filtered(|lam| materials.iter().all(|m| m.covers(lam)));
    match restricted {
        Ok(inner) => {
            if inner.len() < grid.len() {
                info!(
                    "Wavelength grid restricted to [{}, {}] nm ({} of {} points)",
                    inner.first(),
                    inner.last(),
                    inner.len(),
                    grid.len()
                );
            }
            Ok(inner)
        }
        Err(_) => {
            let (min, max) = materials.iter().fold((0.0_f64, f64::INFINITY), |(lo, hi), m| {
                let (a, b) = m.wavelength_range();
                (lo.max(a), hi.min(b))
            });
            Err(SimulationError::OutOfDomainWavelength {
                material: materials.iter().map(|m| m.name()).collect::<Vec<_>>().join(", "),
                wavelength_nm: grid.first(),
                min,
                max,
            })
        }
    }
}

fn check_layer(stack: &Stack, layer: usize) -> Result<(), SimulationError> {
    if layer < stack.layers().len() {
        Ok(())
    } else {
        Err(SimulationError::InvalidStackConfiguration(format!(
            "swept layer {} does not exist ({} layers)",
            layer,
            stack.layers().len()
        )))
    }
}

fn check_thicknesses(thicknesses_nm: &[f64]) -> Result<(), SimulationError> {
    if thicknesses_nm.is_empty() {
        return Err(SimulationError::InvalidStackConfiguration(
            "sweep needs at least one thickness".into(),
        ));
    }
    if let Some(bad) = thicknesses_nm.iter().find(|d| !(d.is_finite() && **d >= 0.0)) {
        return Err(SimulationError::InvalidStackConfiguration(format!(
            "sweep thickness {} nm must be finite and non-negative",
            bad
        )));
    }
    Ok(())
}

fn stack_with_thickness(stack: &Stack, layer: usize, thickness_nm: f64) -> Result<Stack, SimulationError> {
    if thickness_nm == 0.0 {
        stack.without_layer(layer)
    } else {
        stack.with_layer_thickness(layer, thickness_nm)
    }
}

type Film = (Option<SweepParameter>, Stack);

fn finish<S: StackSolver>(
    simulator: &Simulator<S>,
    angle_deg: f64,
    grid: &WavelengthGrid,
    films: Vec<Film>,
    layer: usize,
    thicknesses_nm: &[f64],
) -> Result<ParameterSweepResult, SimulationError> {
    let (supervector, records) = run_cases(simulator, angle_deg, grid, &films, layer, thicknesses_nm)?;
    Ok(ParameterSweepResult {
        grid: grid.clone(),
        thicknesses_nm: thicknesses_nm.to_vec(),
        parameters: films.into_iter().filter_map(|(p, _)| p).collect(),
        supervector,
        records,
    })
}

fn run_cases<S: StackSolver>(
    simulator: &Simulator<S>,
    angle_deg: f64,
    grid: &WavelengthGrid,
    films: &[Film],
    layer: usize,
    thicknesses_nm: &[f64],
) -> Result<(Array3<f64>, Vec<SweepRecord>), SimulationError> {
    let cases = films
        .iter()
        .enumerate()
        .flat_map(|(p, (_, stack))| {
            thicknesses_nm
                .iter()
                .enumerate()
                .map(move |(t, &d)| stack_with_thickness(stack, layer, d).map(|s| (p, t, s)))
        })
        .collect::<Result<Vec<_>, SimulationError>>()?;

    let spectra = solve_cases(simulator, angle_deg, grid, &cases)?;

    let n = grid.len();
    let mut supervector = Array3::<f64>::zeros((2 * n, thicknesses_nm.len(), films.len()));
    let mut records = Vec::with_capacity(n * cases.len());
    for ((p, t, _), spectrum) in cases.iter().zip(&spectra) {
        for (i, point) in spectrum.iter().enumerate() {
            supervector[[i, *t, *p]] = point.psi_deg;
            supervector[[n + i, *t, *p]] = point.delta_deg;
            records.push(SweepRecord {
                psi_deg: point.psi_deg,
                delta_deg: point.delta_deg,
                wavelength_nm: point.wavelength_nm,
                thickness_nm: thicknesses_nm[*t],
                parameter: films[*p].0,
            });
        }
    }
    Ok((supervector, records))
}

fn solve_cases<S: StackSolver>(
    simulator: &Simulator<S>,
    angle_deg: f64,
    grid: &WavelengthGrid,
    cases: &[(usize, usize, Stack)],
) -> Result<Vec<Spectrum>, SimulationError> {
    let solve = |(p, t, stack): &(usize, usize, Stack)| {
        debug!("Sweep case parameter #{}, thickness #{}", p, t);
        simulator.simulate(stack, angle_deg, grid)
    };

    match simulator.config().execution {
        #[cfg(feature = "parallel")]
        crate::simulator::ExecutionMode::Parallel => {
            use rayon::prelude::*;
            let outcomes: Vec<Result<Spectrum, SimulationError>> = cases.par_iter().map(solve).collect();
            outcomes.into_iter().collect()
        }
        _ => cases.iter().map(solve).collect(),
    }
}
