//! Simulation runner: ties together materials, stack, simulator and sweeps.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use num_complex::Complex64;

use ellipso_core::solver::{RecursiveSolver, StackSolver, TransferMatrixSolver};
use ellipso_core::sweep::{
    perturbed_oscillators, restrict_grid, OscillatorSweep, ParameterSweepResult, SweepParameter,
    SweepRecord, ThicknessSweep, ThicknessSweepResult, VolumeFractionSweep,
};
use ellipso_core::{Layer, SimulationConfig, Simulator, Spectrum, Stack, WavelengthGrid};
use ellipso_materials::effective_medium::MaxwellGarnett;
use ellipso_materials::lorentz::{AmplitudeSign, DopedMaterial, LorentzModel, LorentzOscillator};
use ellipso_materials::nk::load_nk_file;
use ellipso_materials::{library, Material, MaterialProvider};

use crate::config::{JobConfig, MaterialConfig, MaterialRef, OscillatorConfig, SolverKind, SweepConfig};

/// Results from a job run.
pub enum JobOutput {
    Spectrum(Spectrum),
    ThicknessSweep(ThicknessSweepResult),
    ParameterSweep(ParameterSweepResult),
}

/// Stack and grid resolved from a job, ready to simulate.
pub struct PreparedJob {
    pub stack: Stack,
    pub grid: WavelengthGrid,
    /// Materials introduced by the sweep rather than the stack.
    pub sweep_materials: Vec<Arc<Material>>,
}

/// Resolve materials, build the stack and the wavelength grid.
///
/// The grid is checked against every material's data range: out-of-range
/// points are dropped when `clip_to_materials` is set, rejected otherwise.
pub fn prepare(job: &JobConfig) -> Result<PreparedJob> {
    let stack_cfg = &job.stack;
    let ambient = build_material(&stack_cfg.ambient, job).context("ambient")?;
    let substrate = build_material(&stack_cfg.substrate, job).context("substrate")?;
    let layers = stack_cfg
        .layers
        .iter()
        .enumerate()
        .map(|(i, l)| {
            let material = build_material(&l.material, job).with_context(|| format!("layer {}", i))?;
            Ok(Layer::new(material, l.thickness))
        })
        .collect::<Result<Vec<_>>>()?;
    let stack = Stack::new(ambient, layers, substrate)?;

    let sweep_materials = match &job.sweep {
        Some(SweepConfig::VolumeFraction { inclusion, .. }) => {
            vec![build_material(inclusion, job).context("sweep inclusion")?]
        }
        _ => Vec::new(),
    };

    let grid = job.simulation.wavelengths.grid(&job.base_dir)?;
    let grid = if job.simulation.clip_to_materials {
        let materials = stack.media().chain(sweep_materials.iter()).map(|m| &**m);
        restrict_grid(&grid, materials)?
    } else {
        let covered = |lam: f64| stack.covers(lam) && sweep_materials.iter().all(|m| m.covers(lam));
        if let Some(&lam) = grid.iter().find(|&&lam| !covered(lam)) {
            let missing = stack
                .media()
                .chain(sweep_materials.iter())
                .find(|m| !m.covers(lam))
                .map(|m| m.name())
                .unwrap_or("?");
            let (min, max) = stack.common_range();
            anyhow::bail!(
                "Material '{}' has no data at {} nm; the stack is defined on [{}, {}] nm \
                 (set clip_to_materials = true to drop such points)",
                missing,
                lam,
                min,
                max
            );
        }
        grid
    };

    Ok(PreparedJob {
        stack,
        grid,
        sweep_materials,
    })
}

/// Run a full job from a parsed configuration.
pub fn run_job(job: &JobConfig, prepared: &PreparedJob) -> Result<JobOutput> {
    let config = SimulationConfig {
        delta_range: job.simulation.delta_range,
        execution: job.simulation.execution,
    };
    println!(
        "Stack: {} media, θ0 = {}°, {} wavelengths in [{}, {}] nm",
        prepared.stack.media_count(),
        job.simulation.angle,
        prepared.grid.len(),
        prepared.grid.first(),
        prepared.grid.last()
    );

    match job.simulation.solver {
        SolverKind::TransferMatrix => {
            execute(job, prepared, &Simulator::with_solver(TransferMatrixSolver, config))
        }
        SolverKind::Recursive => execute(job, prepared, &Simulator::with_solver(RecursiveSolver, config)),
    }
}

/// A sweep with every parameter resolved and validated.
pub enum SweepPlan {
    Thickness(ThicknessSweep),
    VolumeFraction(VolumeFractionSweep),
    Oscillator(OscillatorSweep),
}

/// Build the job's sweep, if any, without running it.
pub fn plan_sweep(job: &JobConfig, prepared: &PreparedJob) -> Result<Option<SweepPlan>> {
    let stack = &prepared.stack;
    let plan = match &job.sweep {
        None => return Ok(None),
        Some(SweepConfig::Thickness { layer, thickness }) => {
            SweepPlan::Thickness(ThicknessSweep::new(stack.clone(), *layer, thickness.values(&job.base_dir)?)?)
        }
        Some(SweepConfig::VolumeFraction {
            layer,
            thickness,
            fractions,
            ..
        }) => {
            let host = swept_layer_material(stack, *layer)?;
            let inclusion = prepared
                .sweep_materials
                .first()
                .cloned()
                .context("volume-fraction sweep without an inclusion")?;
            let name = format!("{}:{}", host.name(), inclusion.name());
            let composite = MaxwellGarnett::new(name, host, inclusion, 0.0)?;
            SweepPlan::VolumeFraction(VolumeFractionSweep::new(
                stack.clone(),
                *layer,
                composite,
                fractions.values(&job.base_dir)?,
                thickness.values(&job.base_dir)?,
            )?)
        }
        Some(SweepConfig::Oscillator {
            layer,
            thickness,
            oscillator,
            sets,
            seed,
            include_base,
        }) => {
            let host = swept_layer_material(stack, *layer)?;
            let base = build_oscillator(oscillator)?;
            let mut oscillators = Vec::with_capacity(sets + 1);
            if *include_base {
                oscillators.push(base);
            }
            oscillators.extend(perturbed_oscillators(&base, *sets, *seed));
            debug!("Oscillator sets: {:?}", oscillators);
            SweepPlan::Oscillator(OscillatorSweep::new(
                stack.clone(),
                *layer,
                host,
                oscillators,
                thickness.values(&job.base_dir)?,
            )?)
        }
    };
    Ok(Some(plan))
}

fn execute<S: StackSolver>(job: &JobConfig, prepared: &PreparedJob, sim: &Simulator<S>) -> Result<JobOutput> {
    println!("Solver: {}", sim.solver().method_name());
    let angle = job.simulation.angle;
    let grid = &prepared.grid;

    let output = match plan_sweep(job, prepared)? {
        None => JobOutput::Spectrum(sim.simulate(&prepared.stack, angle, grid)?),
        Some(SweepPlan::Thickness(sweep)) => JobOutput::ThicknessSweep(sweep.run(sim, angle, grid)?),
        Some(SweepPlan::VolumeFraction(sweep)) => JobOutput::ParameterSweep(sweep.run(sim, angle, grid)?),
        Some(SweepPlan::Oscillator(sweep)) => JobOutput::ParameterSweep(sweep.run(sim, angle, grid)?),
    };
    Ok(output)
}

fn swept_layer_material(stack: &Stack, layer: usize) -> Result<Arc<Material>> {
    stack
        .layers()
        .get(layer)
        .map(|l| Arc::clone(&l.material))
        .with_context(|| format!("Sweep layer {} does not exist ({} layers)", layer, stack.layers().len()))
}

/// Resolve a material reference from the job file.
pub fn build_material(spec: &MaterialRef, job: &JobConfig) -> Result<Arc<Material>> {
    let material = match spec {
        MaterialRef::Builtin(id) => library::lookup(id)?,
        MaterialRef::Inline(cfg) => build_inline(cfg, job)?,
    };
    debug!("Material '{}' ({}), range {:?} nm", material.name(), material.kind(), material.wavelength_range());
    Ok(material.shared())
}

fn build_inline(cfg: &MaterialConfig, job: &JobConfig) -> Result<Material> {
    let material = match cfg {
        MaterialConfig::Constant { n, k, name } => Material::constant(
            name.clone().unwrap_or_else(|| format!("n={}+{}i", n, k)),
            Complex64::new(*n, *k),
        ),
        MaterialConfig::NkFile {
            path,
            unit,
            interpolation,
            extrapolation,
            name,
        } => {
            let full = job.base_dir.join(path);
            let name = name.clone().unwrap_or_else(|| {
                path.file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "nk".into())
            });
            load_nk_file(&full, *unit)
                .and_then(|table| table.into_material(name, *interpolation, *extrapolation))
                .with_context(|| format!("Loading {}", full.display()))?
                .into()
        }
        MaterialConfig::Lorentz {
            eps_inf,
            oscillators,
            allow_negative_amplitude,
            name,
        } => {
            let sign = if *allow_negative_amplitude {
                AmplitudeSign::Any
            } else {
                AmplitudeSign::NonNegative
            };
            let oscillators = oscillators.iter().map(build_oscillator).collect::<Result<Vec<_>>>()?;
            LorentzModel::with_amplitude_sign(name.clone().unwrap_or_else(|| "lorentz".into()), *eps_inf, oscillators, sign)?
                .into()
        }
        MaterialConfig::Doped { host, oscillators, name } => {
            let host = build_material(host, job).context("doped host")?;
            let oscillators = oscillators.iter().map(build_oscillator).collect::<Result<Vec<_>>>()?;
            let name = name.clone().unwrap_or_else(|| format!("{}+lorentz", host.name()));
            DopedMaterial::new(name, host, oscillators)?.into()
        }
        MaterialConfig::MaxwellGarnett {
            host,
            inclusion,
            volume_fraction,
            name,
        } => {
            let host = build_material(host, job).context("effective-medium host")?;
            let inclusion = build_material(inclusion, job).context("effective-medium inclusion")?;
            let name = name
                .clone()
                .unwrap_or_else(|| format!("{}:{}({})", host.name(), inclusion.name(), volume_fraction));
            MaxwellGarnett::new(name, host, inclusion, *volume_fraction)?.into()
        }
    };
    Ok(material)
}

fn build_oscillator(cfg: &OscillatorConfig) -> Result<LorentzOscillator> {
    Ok(match cfg {
        OscillatorConfig::Preset { preset } => LorentzOscillator::preset(preset)?,
        OscillatorConfig::Explicit {
            lambda0,
            gamma,
            amplitude,
        } => LorentzOscillator::new(*lambda0, *gamma, *amplitude),
    })
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Cannot create directory {}", parent.display()))?;
    }
    Ok(())
}

fn write_header(file: &mut impl Write, title: &str, job: &JobConfig, stack: &Stack) -> Result<()> {
    writeln!(file, "# Ellipso forward simulator: {}", title)?;
    writeln!(file, "# Version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(file, "# angle_deg: {}", job.simulation.angle)?;
    writeln!(file, "# delta_range: {:?}", job.simulation.delta_range)?;
    writeln!(file, "# ambient: {}", stack.ambient().name())?;
    for (i, layer) in stack.layers().iter().enumerate() {
        writeln!(file, "# layer {}: {}, {} nm", i, layer.material.name(), layer.thickness_nm)?;
    }
    writeln!(file, "# substrate: {}", stack.substrate().name())?;
    writeln!(file, "#")?;
    Ok(())
}

/// Write a Ψ/Δ spectrum to a CSV file with a metadata header.
pub fn write_spectrum_csv(spectrum: &Spectrum, path: &Path, job: &JobConfig, stack: &Stack) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)?;
    write_header(&mut file, "Psi/Delta spectrum", job, stack)?;
    writeln!(file, "wavelength_nm,psi_deg,delta_deg")?;
    for p in spectrum {
        writeln!(file, "{:.4},{:.10},{:.10}", p.wavelength_nm, p.psi_deg, p.delta_deg)?;
    }

    println!("Spectrum written to: {}", path.display());
    Ok(())
}

/// Write a spectrum to a JSON file.
pub fn write_spectrum_json(spectrum: &Spectrum, path: &Path) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(spectrum).context("JSON serialisation error")?;
    std::fs::write(path, json)?;

    println!("Spectrum (JSON) written to: {}", path.display());
    Ok(())
}

/// Write labelled sweep records, one row per (parameter, thickness, wavelength).
///
/// Columns: `psi,delta,wavelength,thickness` followed by `vfraction` or
/// `lambda0,gamma,amplitude` depending on the sweep.
pub fn write_sweep_csv(records: &[SweepRecord], path: &Path, job: &JobConfig, stack: &Stack) -> Result<()> {
    create_parent(path)?;
    let mut file = std::fs::File::create(path)?;
    write_header(&mut file, "training supervector", job, stack)?;

    match records.first().and_then(|r| r.parameter) {
        None => writeln!(file, "psi,delta,wavelength,thickness")?,
        Some(SweepParameter::VolumeFraction(_)) => writeln!(file, "psi,delta,wavelength,thickness,vfraction")?,
        Some(SweepParameter::Oscillator(_)) => {
            writeln!(file, "psi,delta,wavelength,thickness,lambda0,gamma,amplitude")?
        }
    }

    for r in records {
        write!(
            file,
            "{:.10},{:.10},{:.4},{:.4}",
            r.psi_deg, r.delta_deg, r.wavelength_nm, r.thickness_nm
        )?;
        match r.parameter {
            None => writeln!(file)?,
            Some(SweepParameter::VolumeFraction(f)) => writeln!(file, ",{:.6}", f)?,
            Some(SweepParameter::Oscillator(osc)) => writeln!(
                file,
                ",{:.6},{:.6},{:.6}",
                osc.center_nm, osc.damping_nm, osc.amplitude
            )?,
        }
    }

    println!("Supervector written to: {} ({} rows)", path.display(), records.len());
    Ok(())
}

/// Write sweep records to a JSON file.
pub fn write_sweep_json(records: &[SweepRecord], path: &Path) -> Result<()> {
    create_parent(path)?;
    let json = serde_json::to_string_pretty(records).context("JSON serialisation error")?;
    std::fs::write(path, json)?;

    println!("Supervector (JSON) written to: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use approx::assert_abs_diff_eq;

    fn job(text: &str) -> JobConfig {
        parse_config(text, Path::new(".")).unwrap()
    }

    const OXIDE_ON_SI: &str = r#"
        [simulation]
        wavelengths = { range = [400.0, 800.0], points = 9 }
        angle = 70.0

        [stack]
        substrate = "Si"

        [[stack.layer]]
        material = { constant = { n = 1.46, name = "oxide" } }
        thickness = 100.0
    "#;

    #[test]
    fn test_prepare_builds_stack_and_grid() {
        let prepared = prepare(&job(OXIDE_ON_SI)).unwrap();
        assert_eq!(prepared.stack.media_count(), 3);
        assert_eq!(prepared.stack.layers()[0].material.name(), "oxide");
        assert_eq!(prepared.grid.len(), 9);
    }

    #[test]
    fn test_run_matches_reference_at_600nm() {
        let job = job(OXIDE_ON_SI);
        match run_job(&job, &prepare(&job).unwrap()).unwrap() {
            JobOutput::Spectrum(spectrum) => {
                let p = spectrum.points[4];
                assert_eq!(p.wavelength_nm, 600.0);
                assert_abs_diff_eq!(p.psi_deg, 44.5797255311, epsilon = 1e-6);
                assert_abs_diff_eq!(p.delta_deg, 99.2772184939, epsilon = 1e-6);
            }
            _ => panic!("expected a single spectrum"),
        }
    }

    #[test]
    fn test_grid_outside_material_data() {
        let text = OXIDE_ON_SI.replace("[400.0, 800.0], points = 9", "[300.0, 800.0], points = 11");
        let err = prepare(&job(&text)).err().unwrap().to_string();
        assert!(err.contains("'Si' has no data at 300 nm"), "{}", err);
        assert!(err.contains("[350, 1000] nm"), "{}", err);

        let clipped = text.replace("angle = 70.0", "angle = 70.0\nclip_to_materials = true");
        let prepared = prepare(&job(&clipped)).unwrap();
        assert_eq!(prepared.grid.first(), 350.0);
    }

    #[test]
    fn test_unknown_builtin_material() {
        let text = OXIDE_ON_SI.replace("substrate = \"Si\"", "substrate = \"unobtainium\"");
        assert!(prepare(&job(&text)).is_err());
    }

    #[test]
    fn test_oscillator_sweep_job() {
        let text = format!(
            "{}\n[sweep]\nkind = \"oscillator\"\nthickness = {{ values = [0.0, 50.0] }}\noscillator = {{ preset = \"Au\" }}\nsets = 3\nseed = 1\ninclude_base = true\n",
            OXIDE_ON_SI
        );
        let job = job(&text);
        match run_job(&job, &prepare(&job).unwrap()).unwrap() {
            JobOutput::ParameterSweep(result) => {
                assert_eq!(result.parameters.len(), 4);
                assert_eq!(result.supervector.dim(), (18, 2, 4));
                assert_eq!(
                    result.parameters[0],
                    SweepParameter::Oscillator(LorentzOscillator::gold_nanoparticle())
                );
            }
            _ => panic!("expected a parameter sweep"),
        }
    }

    #[test]
    fn test_plan_rejects_missing_sweep_layer() {
        let text = format!(
            "{}\n[sweep]\nkind = \"thickness\"\nlayer = 3\nthickness = {{ values = [10.0] }}\n",
            OXIDE_ON_SI
        );
        let job = job(&text);
        let prepared = prepare(&job).unwrap();
        assert!(plan_sweep(&job, &prepared).is_err());
    }

    #[test]
    fn test_demo_jobs_parse_and_prepare() {
        let demos = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        for name in [
            "oxide_on_silicon.toml",
            "gold_oscillator_sweep.toml",
            "gold_volume_fraction_sweep.toml",
            "silver_film_from_grid_file.toml",
        ] {
            let job = crate::config::load_config(&demos.join(name)).unwrap();
            let prepared = prepare(&job).unwrap_or_else(|e| panic!("{}: {:#}", name, e));
            assert!(!prepared.grid.is_empty());
            if job.sweep.is_some() {
                assert!(plan_sweep(&job, &prepared).unwrap().is_some(), "{}", name);
            }
        }
    }

    #[test]
    fn test_volume_fraction_demo_mixes_in_bulk_gold() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/gold_volume_fraction_sweep.toml");
        let job = crate::config::load_config(&path).unwrap();
        let prepared = prepare(&job).unwrap();
        let inclusion = &prepared.sweep_materials[0];
        assert_eq!(inclusion.name(), "Au");
        for lam in [450.0, 500.0, 600.0, 800.0] {
            let eps = inclusion.dielectric_function(lam).unwrap();
            assert!(eps.re < 0.0, "inclusion ε({} nm) = {}", lam, eps);
        }
    }

    #[test]
    fn test_grid_file_demo_reads_every_wavelength() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/silver_film_from_grid_file.toml");
        let job = crate::config::load_config(&path).unwrap();
        let prepared = prepare(&job).unwrap();
        assert_eq!(prepared.grid.len(), 17);
        assert_eq!(prepared.grid.first(), 400.0);
        assert_eq!(prepared.grid.last(), 800.0);
    }

    #[test]
    fn test_sweep_csv_columns() {
        let text = format!(
            "{}\n[sweep]\nkind = \"volume_fraction\"\nthickness = {{ values = [100.0] }}\nfractions = {{ values = [0.0, 0.1] }}\ninclusion = {{ constant = {{ n = 0.2, k = 3.0 }} }}\n",
            OXIDE_ON_SI
        );
        let job = job(&text);
        let prepared = prepare(&job).unwrap();
        let records = match run_job(&job, &prepared).unwrap() {
            JobOutput::ParameterSweep(result) => result.records,
            _ => panic!("expected a parameter sweep"),
        };
        let path = std::env::temp_dir()
            .join(format!("ellipso-cli-test-{}", std::process::id()))
            .join("supervector.csv");
        write_sweep_csv(&records, &path, &job, &prepared.stack).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let rows: Vec<&str> = content.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(rows[0], "psi,delta,wavelength,thickness,vfraction");
        assert_eq!(rows.len(), 1 + 2 * 9);
        assert!(rows[1].ends_with(",0.000000"));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
