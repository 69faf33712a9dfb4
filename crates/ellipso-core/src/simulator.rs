//! Wavelength sweep orchestration.
//!
//! A [`Simulator`] pairs a [`StackSolver`] with a [`SimulationConfig`] and
//! evaluates $\Psi$/$\Delta$ at every grid wavelength. The first failing
//! wavelength (in grid order) aborts the whole simulation; no partial
//! spectrum is returned.

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::ellipsometry::{DeltaRange, EllipsometricAngles};
use crate::solver::{check_angle, SimulationError, StackSolver, TransferMatrixSolver};
use crate::types::{SimulationRequest, Spectrum, SpectrumPoint, Stack, WavelengthGrid};

/// How the grid is traversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    #[default]
    Sequential,
    /// Data-parallel over wavelengths. Needs the `parallel` feature, falls
    /// back to sequential without it.
    Parallel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub delta_range: DeltaRange,
    #[serde(default)]
    pub execution: ExecutionMode,
}

/// Computes ellipsometric spectra with a given stack solver.
#[derive(Debug, Clone, Default)]
pub struct Simulator<S = TransferMatrixSolver> {
    solver: S,
    config: SimulationConfig,
}

impl Simulator<TransferMatrixSolver> {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_solver(TransferMatrixSolver, config)
    }
}

impl<S: StackSolver> Simulator<S> {
    pub fn with_solver(solver: S, config: SimulationConfig) -> Self {
        Self { solver, config }
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// $\Psi$/$\Delta$ at a single wavelength.
    pub fn solve_point(
        &self,
        stack: &Stack,
        angle_deg: f64,
        wavelength_nm: f64,
    ) -> Result<SpectrumPoint, SimulationError> {
        let r = self
            .solver
            .reflection_coefficients(stack, angle_deg, wavelength_nm)?;
        let angles = EllipsometricAngles::from_reflectance(&r, self.config.delta_range, wavelength_nm)?;
        Ok(SpectrumPoint {
            wavelength_nm,
            psi_deg: angles.psi_deg,
            delta_deg: angles.delta_deg,
        })
    }

    /// $\Psi$/$\Delta$ at every wavelength of `grid`, in grid order.
    ///
    /// # Errors
    /// The error of the first failing wavelength in grid order, or
    /// [`SimulationError::InvalidAngle`] before any work is done.
    pub fn simulate(
        &self,
        stack: &Stack,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<Spectrum, SimulationError> {
        check_angle(angle_deg)?;
        debug!(
            "{}: {} media, θ0 = {}°, {} wavelengths in [{}, {}] nm ({:?})",
            self.solver.method_name(),
            stack.media_count(),
            angle_deg,
            grid.len(),
            grid.first(),
            grid.last(),
            self.config.execution
        );

        let points = match self.config.execution {
            ExecutionMode::Sequential => grid
                .iter()
                .map(|&lam| self.solve_point(stack, angle_deg, lam))
                .collect::<Result<Vec<_>, _>>()?,
            ExecutionMode::Parallel => self.solve_parallel(stack, angle_deg, grid)?,
        };
        Ok(Spectrum::from(points))
    }

    /// Run a prepared request.
    pub fn run(&self, request: &SimulationRequest) -> Result<Spectrum, SimulationError> {
        let spectrum = self.simulate(&request.stack, request.angle_deg, &request.grid)?;
        info!("Simulated {} wavelengths", spectrum.len());
        Ok(spectrum)
    }

    #[cfg(feature = "parallel")]
    fn solve_parallel(
        &self,
        stack: &Stack,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<Vec<SpectrumPoint>, SimulationError> {
        use rayon::prelude::*;

        // Collect every outcome first so the reported error is the earliest in grid order.
        let outcomes: Vec<Result<SpectrumPoint, SimulationError>> = grid
            .as_slice()
            .par_iter()
            .map(|&lam| self.solve_point(stack, angle_deg, lam))
            .collect();
        outcomes.into_iter().collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn solve_parallel(
        &self,
        stack: &Stack,
        angle_deg: f64,
        grid: &WavelengthGrid,
    ) -> Result<Vec<SpectrumPoint>, SimulationError> {
        debug!("Built without the parallel feature, running sequentially");
        grid.iter()
            .map(|&lam| self.solve_point(stack, angle_deg, lam))
            .collect()
    }
}

/// Simulate with the default transfer-matrix solver and configuration.
pub fn simulate(
    stack: &Stack,
    angle_deg: f64,
    grid: &WavelengthGrid,
) -> Result<Spectrum, SimulationError> {
    Simulator::new(SimulationConfig::default()).simulate(stack, angle_deg, grid)
}
