//! TOML configuration deserialisation for simulation jobs.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use ellipso_core::ellipsometry::DeltaRange;
use ellipso_core::types::{evenly_spaced, stepped_values};
use ellipso_core::{ExecutionMode, WavelengthGrid};
use ellipso_materials::nk::WavelengthUnit;
use ellipso_materials::tabulated::{Extrapolation, Interpolation};

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    pub simulation: SimulationSection,
    pub stack: StackConfig,
    #[serde(default)]
    pub sweep: Option<SweepConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    /// Directory of the job file; relative `.nk` paths resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Simulation parameters from TOML.
#[derive(Debug, Deserialize)]
pub struct SimulationSection {
    pub wavelengths: ValueSpec,
    /// Angle of incidence in degrees.
    #[serde(default = "default_angle")]
    pub angle: f64,
    #[serde(default)]
    pub delta_range: DeltaRange,
    #[serde(default)]
    pub execution: ExecutionMode,
    #[serde(default)]
    pub solver: SolverKind,
    /// Drop grid points outside the materials' data ranges instead of failing.
    #[serde(default)]
    pub clip_to_materials: bool,
}

fn default_angle() -> f64 {
    70.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    #[default]
    TransferMatrix,
    Recursive,
}

/// A list of numbers: evenly spaced by count, by step, explicit, or read
/// from a whitespace-separated text file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ValueSpec {
    Range { range: [f64; 2], points: usize },
    Step { range: [f64; 2], step: f64 },
    List { values: Vec<f64> },
    /// Relative paths resolve against the job file's directory.
    File { file: PathBuf },
}

impl ValueSpec {
    /// Expand to the explicit values, ends inclusive.
    pub fn values(&self, base_dir: &Path) -> anyhow::Result<Vec<f64>> {
        match self {
            ValueSpec::Range { range, points } => {
                if *points == 0 {
                    anyhow::bail!("'points' must be at least 1");
                }
                Ok(evenly_spaced(range[0], range[1], *points))
            }
            ValueSpec::Step { range, step } => {
                let values = stepped_values(range[0], range[1], *step);
                if values.is_empty() {
                    anyhow::bail!("'step' must be positive and range increasing, got step {} over {:?}", step, range);
                }
                Ok(values)
            }
            ValueSpec::List { values } => Ok(values.clone()),
            ValueSpec::File { file } => read_value_file(&base_dir.join(file)),
        }
    }

    /// Expand into a validated wavelength grid (nm).
    pub fn grid(&self, base_dir: &Path) -> anyhow::Result<WavelengthGrid> {
        let grid = match self {
            ValueSpec::Range { range, points } => WavelengthGrid::linspace(range[0], range[1], *points)?,
            ValueSpec::Step { range, step } => WavelengthGrid::stepped(range[0], range[1], *step)?,
            ValueSpec::List { values } => WavelengthGrid::new(values.clone())?,
            ValueSpec::File { file } => {
                let path = base_dir.join(file);
                WavelengthGrid::new(read_value_file(&path)?)
                    .with_context(|| format!("Invalid wavelength grid in {}", path.display()))?
            }
        };
        Ok(grid)
    }
}

/// Read numbers separated by whitespace or commas; `#` starts a comment.
fn read_value_file(path: &Path) -> anyhow::Result<Vec<f64>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read value file {}", path.display()))?;
    let mut values = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let data = line.split('#').next().unwrap_or("");
        for token in data.split(|c: char| c.is_whitespace() || c == ',').filter(|t| !t.is_empty()) {
            let value: f64 = token.parse().with_context(|| {
                format!("{}:{}: '{}' is not a number", path.display(), line_no + 1, token)
            })?;
            values.push(value);
        }
    }
    if values.is_empty() {
        anyhow::bail!("Value file {} contains no numbers", path.display());
    }
    Ok(values)
}

/// Ordered media of the stack.
#[derive(Debug, Deserialize)]
pub struct StackConfig {
    #[serde(default = "default_ambient")]
    pub ambient: MaterialRef,
    #[serde(default, rename = "layer")]
    pub layers: Vec<LayerConfig>,
    pub substrate: MaterialRef,
}

fn default_ambient() -> MaterialRef {
    MaterialRef::Builtin("air".into())
}

/// A finite layer: material and thickness in nm.
#[derive(Debug, Deserialize)]
pub struct LayerConfig {
    pub material: MaterialRef,
    pub thickness: f64,
}

/// Either a built-in identifier (`"Si"`) or an inline material definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MaterialRef {
    Builtin(String),
    Inline(MaterialConfig),
}

/// Inline material definitions.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialConfig {
    Constant {
        n: f64,
        #[serde(default)]
        k: f64,
        #[serde(default)]
        name: Option<String>,
    },
    NkFile {
        path: PathBuf,
        #[serde(default)]
        unit: WavelengthUnit,
        #[serde(default)]
        interpolation: Interpolation,
        #[serde(default)]
        extrapolation: Extrapolation,
        #[serde(default)]
        name: Option<String>,
    },
    Lorentz {
        #[serde(default = "default_eps_inf")]
        eps_inf: f64,
        oscillators: Vec<OscillatorConfig>,
        #[serde(default)]
        allow_negative_amplitude: bool,
        #[serde(default)]
        name: Option<String>,
    },
    Doped {
        host: Box<MaterialRef>,
        oscillators: Vec<OscillatorConfig>,
        #[serde(default)]
        name: Option<String>,
    },
    MaxwellGarnett {
        host: Box<MaterialRef>,
        inclusion: Box<MaterialRef>,
        volume_fraction: f64,
        #[serde(default)]
        name: Option<String>,
    },
}

fn default_eps_inf() -> f64 {
    1.0
}

/// A Lorentz oscillator: a named preset (`"Au"`, `"Ag"`) or explicit parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OscillatorConfig {
    Preset {
        preset: String,
    },
    Explicit {
        /// Resonance wavelength in nm.
        lambda0: f64,
        /// Damping in nm.
        gamma: f64,
        amplitude: f64,
    },
}

/// Optional training-set sweep.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SweepConfig {
    Thickness {
        #[serde(default)]
        layer: usize,
        thickness: ValueSpec,
    },
    /// The swept layer's material is the host; `inclusion` is mixed in.
    VolumeFraction {
        #[serde(default)]
        layer: usize,
        thickness: ValueSpec,
        fractions: ValueSpec,
        inclusion: MaterialRef,
    },
    /// The swept layer's material is doped with perturbed copies of `oscillator`.
    Oscillator {
        #[serde(default)]
        layer: usize,
        thickness: ValueSpec,
        oscillator: OscillatorConfig,
        #[serde(default = "default_sets")]
        sets: usize,
        #[serde(default)]
        seed: u64,
        /// Also include the unperturbed oscillator as the first set.
        #[serde(default)]
        include_base: bool,
    },
}

fn default_sets() -> usize {
    30
}

/// Output configuration.
#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    /// Output directory (default: "./output").
    #[serde(default = "default_output_dir")]
    pub directory: String,
    /// Whether to save results as CSV (default: true).
    #[serde(default = "default_true")]
    pub save_csv: bool,
    /// Whether to also save results as JSON (default: false).
    #[serde(default)]
    pub save_json: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
            save_csv: true,
            save_json: false,
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_true() -> bool {
    true
}

/// Parse a job from TOML text.
pub fn parse_config(content: &str, base_dir: &Path) -> anyhow::Result<JobConfig> {
    let mut config: JobConfig = toml::from_str(content)?;
    config.base_dir = base_dir.to_path_buf();
    Ok(config)
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> anyhow::Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read job file {}", path.display()))?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_config(&content, base_dir).with_context(|| format!("Invalid job file {}", path.display()))
}
