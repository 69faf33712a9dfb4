//! Integration test: physical and structural properties of simulated spectra.

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ellipso_core::simulator::ExecutionMode;
use ellipso_core::solver::{RecursiveSolver, StackSolver, TransferMatrixSolver};
use ellipso_core::{simulate, Layer, SimulationConfig, SimulationRequest, Simulator, Spectrum, Stack, WavelengthGrid};
use ellipso_materials::library::{crystalline_silicon, fused_silica, gold_nanoparticles_in_silica};
use ellipso_materials::lorentz::{LorentzModel, LorentzOscillator};
use ellipso_materials::Material;
use num_complex::Complex64;

fn real(name: &str, n: f64) -> Arc<Material> {
    Material::constant(name, Complex64::new(n, 0.0)).shared()
}

fn lossless_multilayer() -> Stack {
    Stack::new(
        Material::air().shared(),
        vec![
            Layer::new(real("TiO2", 2.4), 60.0),
            Layer::new(real("MgF2", 1.38), 110.0),
            Layer::new(real("Ta2O5", 2.1), 75.0),
        ],
        real("BK7", 1.517),
    )
    .unwrap()
}

#[test]
fn test_lossless_stacks_conserve_energy() {
    let stack = lossless_multilayer();
    for angle in [10.0, 45.0, 70.0, 85.0] {
        for lam in [350.0, 500.0, 633.0, 1064.0] {
            let r = TransferMatrixSolver.reflection_coefficients(&stack, angle, lam).unwrap();
            assert!(r.reflectance_s() <= 1.0 + 1e-12, "R_s = {} at {}°, {} nm", r.reflectance_s(), angle, lam);
            assert!(r.reflectance_p() <= 1.0 + 1e-12, "R_p = {} at {}°, {} nm", r.reflectance_p(), angle, lam);
        }
    }
}

#[test]
fn test_absorbing_stack_reflects_less_than_one() {
    let stack = Stack::new(
        Material::air().shared(),
        vec![Layer::new(gold_nanoparticles_in_silica().unwrap().shared(), 150.0)],
        crystalline_silicon().unwrap().shared(),
    )
    .unwrap();
    let r = TransferMatrixSolver.reflection_coefficients(&stack, 70.0, 500.0).unwrap();
    assert!(r.reflectance_s() < 1.0 && r.reflectance_p() < 1.0);
}

#[test]
fn test_spectrum_is_idempotent_and_keeps_grid() {
    let stack = lossless_multilayer();
    let grid = WavelengthGrid::new(vec![401.0, 433.3, 512.0, 640.0, 799.9]).unwrap();
    let first = simulate(&stack, 65.0, &grid).unwrap();
    let second = simulate(&stack, 65.0, &grid).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.wavelengths(), grid.as_slice());
}

#[test]
fn test_solvers_agree_to_machine_precision() {
    let stack = Stack::new(
        Material::air().shared(),
        vec![
            Layer::new(fused_silica().unwrap().shared(), 250.0),
            Layer::new(gold_nanoparticles_in_silica().unwrap().shared(), 40.0),
        ],
        crystalline_silicon().unwrap().shared(),
    )
    .unwrap();
    for lam in [400.0, 480.0, 555.0, 720.0, 1000.0] {
        let a = TransferMatrixSolver.reflection_coefficients(&stack, 68.0, lam).unwrap();
        let b = RecursiveSolver.reflection_coefficients(&stack, 68.0, lam).unwrap();
        assert_abs_diff_eq!((a.r_s - b.r_s).norm(), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!((a.r_p - b.r_p).norm(), 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_parallel_and_sequential_are_identical() {
    let stack = lossless_multilayer();
    let grid = WavelengthGrid::stepped(300.0, 1100.0, 2.0).unwrap();
    let request = SimulationRequest::new(stack, 72.0, grid).unwrap();

    let sequential = Simulator::new(SimulationConfig::default()).run(&request).unwrap();
    let parallel = Simulator::new(SimulationConfig {
        execution: ExecutionMode::Parallel,
        ..Default::default()
    })
    .run(&request)
    .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_oscillator_film_doubles_linearly() {
    let osc = LorentzOscillator::gold_nanoparticle();
    let single = LorentzModel::new("one", 2.13, vec![osc]).unwrap();
    let double = LorentzModel::new("two", 2.13, vec![osc, osc]).unwrap();
    for lam in [450.0, 500.0, 650.0] {
        let s = single.oscillator_sum(lam);
        let d = double.oscillator_sum(lam);
        assert_eq!(d, s * 2.0);
    }
}

#[test]
fn test_thicker_oxide_shifts_spectrum() {
    let silicon = crystalline_silicon().unwrap().shared();
    let oxide = real("SiO2", 1.46);
    let grid = WavelengthGrid::linspace(400.0, 800.0, 41).unwrap();
    let spectra: Vec<Spectrum> = [10.0, 200.0]
        .iter()
        .map(|&d| {
            let stack = Stack::new(
                Material::air().shared(),
                vec![Layer::new(Arc::clone(&oxide), d)],
                Arc::clone(&silicon),
            )
            .unwrap();
            simulate(&stack, 70.0, &grid).unwrap()
        })
        .collect();
    let max_diff = spectra[0]
        .psi()
        .iter()
        .zip(spectra[1].psi())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);
    assert!(max_diff > 1.0);
}

#[test]
fn test_spectrum_json_round_trip() {
    let grid = WavelengthGrid::linspace(500.0, 600.0, 3).unwrap();
    let spectrum = simulate(&lossless_multilayer(), 70.0, &grid).unwrap();
    let json = serde_json::to_string_pretty(&spectrum).unwrap();
    let back: Spectrum = serde_json::from_str(&json).unwrap();
    assert_eq!(back, spectrum);
}
