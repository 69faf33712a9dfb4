//! # Ellipso Core
//!
//! Forward simulation of spectroscopic ellipsometry for planar thin-film
//! stacks. Given a stack (ambient, finite layers, substrate), an angle of
//! incidence and a wavelength grid, the simulator returns the ellipsometric
//! angles $\Psi(\lambda)$ and $\Delta(\lambda)$ defined by
//!
//! $$\rho = \frac{r_p}{r_s} = \tan\Psi \, e^{i\Delta}.$$
//!
//! ## Architecture
//!
//! Stack solvers implement the [`solver::StackSolver`] trait, which returns
//! the complex reflection coefficients of a stack at one wavelength. Two
//! implementations share the interface code in [`solver::fresnel`]:
//! the characteristic-matrix method ([`solver::transfer_matrix`]) and the
//! recursive Airy formula ([`solver::recursive`]).
//! The [`simulator::Simulator`] sweeps a wavelength grid with any solver.
//!
//! ## Modules
//!
//! - [`types`]: Stack, layer, grid and spectrum types.
//! - [`solver`]: Solver trait, errors, Fresnel coefficients and solvers.
//! - [`ellipsometry`]: $\Psi$ / $\Delta$ extraction and range conventions.
//! - [`simulator`]: Wavelength sweep orchestration.
//! - [`sweep`]: Thickness, volume-fraction and oscillator training sweeps.

pub mod ellipsometry;
pub mod simulator;
pub mod solver;
pub mod sweep;
pub mod types;

pub use ellipso_materials as materials;

pub use simulator::{simulate, ExecutionMode, SimulationConfig, Simulator};
pub use solver::SimulationError;
pub use types::{Layer, SimulationRequest, Spectrum, SpectrumPoint, Stack, WavelengthGrid};
