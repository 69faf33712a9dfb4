//! Integration test: simulated spectra against precomputed references.
//!
//! The reference values were produced with an independent characteristic
//! matrix implementation using the conventional p-sign, for which
//! $\rho = -r_p / r_s$. Both conventions give the same $\Psi$ and $\Delta$.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ellipso_core::ellipsometry::DeltaRange;
use ellipso_core::solver::{RecursiveSolver, StackSolver, TransferMatrixSolver};
use ellipso_core::{simulate, Layer, SimulationConfig, Simulator, Stack, WavelengthGrid};
use ellipso_materials::library::crystalline_silicon;
use ellipso_materials::Material;
use num_complex::Complex64;

/// (λ / nm, Ψ / °, Δ / °) for 100 nm of n = 1.46 on crystalline Si at 70°.
const OXIDE_ON_SILICON: [(f64, f64, f64); 9] = [
    (400.0, 58.5830209814, -69.2209235927),
    (450.0, 79.0601276180, 5.0379750854),
    (500.0, 64.7948427155, 82.0494066879),
    (550.0, 52.0988768364, 94.8547443792),
    (600.0, 44.5797255311, 99.2772184939),
    (650.0, 39.7323110967, 100.8879796027),
    (700.0, 36.3160425233, 101.1009920975),
    (750.0, 33.7040518037, 100.6668399921),
    (800.0, 31.6014656138, 99.8521847317),
];

fn oxide_on_silicon() -> Stack {
    Stack::new(
        Material::air().shared(),
        vec![Layer::new(
            Material::constant("SiO2", Complex64::new(1.46, 0.0)).shared(),
            100.0,
        )],
        crystalline_silicon().expect("built-in silicon").shared(),
    )
    .expect("valid stack")
}

#[test]
fn test_oxide_on_silicon_matches_reference() {
    let grid = WavelengthGrid::linspace(400.0, 800.0, 9).unwrap();
    let spectrum = simulate(&oxide_on_silicon(), 70.0, &grid).unwrap();

    assert_eq!(spectrum.len(), OXIDE_ON_SILICON.len());
    for (point, &(lam, psi, delta)) in spectrum.iter().zip(OXIDE_ON_SILICON.iter()) {
        assert_eq!(point.wavelength_nm, lam);
        assert_abs_diff_eq!(point.psi_deg, psi, epsilon = 1e-6);
        assert_abs_diff_eq!(point.delta_deg, delta, epsilon = 1e-6);
    }
}

#[test]
fn test_recursive_solver_matches_reference() {
    let grid = WavelengthGrid::linspace(400.0, 800.0, 9).unwrap();
    let sim = Simulator::with_solver(RecursiveSolver, SimulationConfig::default());
    let spectrum = sim.simulate(&oxide_on_silicon(), 70.0, &grid).unwrap();
    for (point, &(_, psi, delta)) in spectrum.iter().zip(OXIDE_ON_SILICON.iter()) {
        assert_abs_diff_eq!(point.psi_deg, psi, epsilon = 1e-6);
        assert_abs_diff_eq!(point.delta_deg, delta, epsilon = 1e-6);
    }
}

#[test]
fn test_reference_in_zero_to_360_range() {
    let grid = WavelengthGrid::linspace(400.0, 800.0, 9).unwrap();
    let sim = Simulator::new(SimulationConfig {
        delta_range: DeltaRange::ZeroTo360,
        ..Default::default()
    });
    let spectrum = sim.simulate(&oxide_on_silicon(), 70.0, &grid).unwrap();
    // Only the 400 nm point is negative in the signed range.
    assert_abs_diff_eq!(spectrum.points[0].delta_deg, 360.0 - 69.2209235927, epsilon = 1e-6);
    assert_abs_diff_eq!(spectrum.points[4].delta_deg, 99.2772184939, epsilon = 1e-6);
}

#[test]
fn test_two_medium_reduction() {
    // Closed form for a real interface: ρ = cos(θi + θt) / cos(θi − θt).
    let stack = Stack::bare(
        Material::air().shared(),
        Material::constant("glass", Complex64::new(1.5, 0.0)).shared(),
    );
    let grid = WavelengthGrid::new(vec![500.0]).unwrap();
    let point = simulate(&stack, 60.0, &grid).unwrap().points[0];

    let ti = 60f64.to_radians();
    let tt = (ti.sin() / 1.5).asin();
    let rho = (ti + tt).cos() / (ti - tt).cos();
    assert!(rho < 0.0);
    assert_abs_diff_eq!(point.psi_deg, rho.abs().atan().to_degrees(), epsilon = 1e-12);
    assert_abs_diff_eq!(point.psi_deg, 5.768479516407725, epsilon = 1e-9);
    assert_eq!(point.delta_deg, 180.0);
}

#[test]
fn test_bare_silicon() {
    let stack = Stack::bare(
        Material::air().shared(),
        Arc::new(crystalline_silicon().unwrap()),
    );
    let grid = WavelengthGrid::new(vec![600.0]).unwrap();
    let point = simulate(&stack, 70.0, &grid).unwrap().points[0];
    assert_abs_diff_eq!(point.psi_deg, 10.984902799721398, epsilon = 1e-9);
    assert_abs_diff_eq!(point.delta_deg, 0.7646736013993749, epsilon = 1e-9);

    let r = TransferMatrixSolver
        .reflection_coefficients(&stack, 70.0, 600.0)
        .unwrap();
    assert_abs_diff_eq!(r.r_s.re, -0.83586, epsilon = 1e-5);
    assert_abs_diff_eq!(r.r_p.re, -0.16223, epsilon = 1e-5);
}

#[test]
fn test_delta_crosses_zero_at_brewster_for_lossless_substrate() {
    let stack = Stack::bare(
        Material::air().shared(),
        Material::constant("glass", Complex64::new(1.5, 0.0)).shared(),
    );
    let grid = WavelengthGrid::new(vec![500.0]).unwrap();
    let below = simulate(&stack, 40.0, &grid).unwrap().points[0];
    let above = simulate(&stack, 70.0, &grid).unwrap().points[0];
    assert_abs_diff_eq!(below.delta_deg, 0.0, epsilon = 1e-9);
    assert_eq!(above.delta_deg, 180.0);
}
