//! Parser for `.nk` optical-constant files.
//!
//! The format is plain text with one sample per row:
//! ```text
//! # comment
//! <wavelength> <n> <k>
//! <wavelength> <n> <k>
//! ...
//! ```
//!
//! Columns are separated by whitespace (commas are accepted too). Blank lines
//! and lines starting with `#` or `;` are ignored. Wavelengths are in
//! micrometres unless told otherwise and are converted to nanometres.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::tabulated::{Extrapolation, Interpolation, TabulatedMaterial};

/// Errors while reading an `.nk` file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    FormatError { line: usize, message: String },

    #[error("Invalid table: {0}")]
    InvalidTable(#[from] crate::provider::MaterialError),
}

/// Unit of the wavelength column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WavelengthUnit {
    #[default]
    Micrometre,
    Nanometre,
}

impl WavelengthUnit {
    fn to_nm(self, value: f64) -> f64 {
        match self {
            WavelengthUnit::Micrometre => value * 1000.0,
            WavelengthUnit::Nanometre => value,
        }
    }
}

/// Parsed `.nk` columns, wavelengths already in nm.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NkTable {
    pub wavelengths_nm: Vec<f64>,
    pub n: Vec<f64>,
    pub k: Vec<f64>,
}

impl NkTable {
    pub fn len(&self) -> usize {
        self.wavelengths_nm.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelengths_nm.is_empty()
    }

    /// Build a material from the table.
    pub fn into_material(
        self,
        name: impl Into<String>,
        interpolation: Interpolation,
        extrapolation: Extrapolation,
    ) -> Result<TabulatedMaterial, ParseError> {
        Ok(TabulatedMaterial::with_options(
            name,
            self.wavelengths_nm,
            self.n,
            self.k,
            interpolation,
            extrapolation,
        )?)
    }
}

/// Parse `.nk` content from a string.
pub fn parse_nk(content: &str, unit: WavelengthUnit) -> Result<NkTable, ParseError> {
    let mut table = NkTable::default();

    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let parts: Vec<&str> = line
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() != 3 {
            return Err(ParseError::FormatError {
                line: line_no,
                message: format!("Expected 'wavelength n k', got '{}'", line),
            });
        }

        let mut values = [0.0; 3];
        for (slot, (text, label)) in values
            .iter_mut()
            .zip(parts.iter().zip(["wavelength", "n", "k"]))
        {
            *slot = text.parse().map_err(|_| ParseError::FormatError {
                line: line_no,
                message: format!("Invalid {} value: {}", label, text),
            })?;
        }

        let lam_nm = unit.to_nm(values[0]);
        if let Some(&prev) = table.wavelengths_nm.last() {
            if lam_nm <= prev {
                return Err(ParseError::FormatError {
                    line: line_no,
                    message: format!(
                        "Wavelengths must be strictly increasing ({} nm after {} nm)",
                        lam_nm, prev
                    ),
                });
            }
        }

        table.wavelengths_nm.push(lam_nm);
        table.n.push(values[1]);
        table.k.push(values[2]);
    }

    if table.len() < 2 {
        return Err(ParseError::FormatError {
            line: content.lines().count().max(1),
            message: format!("Expected at least 2 data rows, found {}", table.len()),
        });
    }

    Ok(table)
}

/// Read and parse an `.nk` file.
pub fn load_nk_file(path: &Path, unit: WavelengthUnit) -> Result<NkTable, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_nk(&content, unit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MaterialProvider;
    use approx::assert_abs_diff_eq;

    const SIO2_NK: &str = "# fused silica\n0.40 1.4701 0.0\n0.50 1.4623 0.0\n\n0.60 1.4580 0.0\n";

    #[test]
    fn test_parse_micrometre_file() {
        let table = parse_nk(SIO2_NK, WavelengthUnit::Micrometre).unwrap();
        assert_eq!(table.len(), 3);
        assert_abs_diff_eq!(table.wavelengths_nm[0], 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.wavelengths_nm[2], 600.0, epsilon = 1e-9);
        assert_eq!(table.n[1], 1.4623);
    }

    #[test]
    fn test_parse_nanometre_csv_style() {
        let table = parse_nk("; header\n400, 3.0, 0.1\n500, 2.5, 0.0\n", WavelengthUnit::Nanometre).unwrap();
        assert_eq!(table.wavelengths_nm, vec![400.0, 500.0]);
        assert_eq!(table.k, vec![0.1, 0.0]);
    }

    #[test]
    fn test_malformed_row_reports_line() {
        let err = parse_nk("0.4 1.47 0.0\n0.5 abc 0.0\n", WavelengthUnit::Micrometre).unwrap_err();
        match err {
            ParseError::FormatError { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains("n value"), "{}", message);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_wrong_column_count() {
        let err = parse_nk("0.4 1.47\n", WavelengthUnit::Micrometre).unwrap_err();
        assert!(matches!(err, ParseError::FormatError { line: 1, .. }));
    }

    #[test]
    fn test_non_monotonic_wavelengths() {
        let err = parse_nk("0.5 1.4 0\n0.4 1.4 0\n", WavelengthUnit::Micrometre).unwrap_err();
        assert!(matches!(err, ParseError::FormatError { line: 2, .. }));
    }

    #[test]
    fn test_too_few_rows() {
        assert!(parse_nk("# only a comment\n0.4 1.47 0.0\n", WavelengthUnit::Micrometre).is_err());
    }

    #[test]
    fn test_table_into_material() {
        let material = parse_nk(SIO2_NK, WavelengthUnit::Micrometre)
            .unwrap()
            .into_material("SiO2", Interpolation::CubicSpline, Extrapolation::Error)
            .unwrap();
        assert_eq!(material.interpolation(), Interpolation::CubicSpline);
        assert_eq!(material.extrapolation(), Extrapolation::Error);
        assert_eq!(material.wavelengths_nm().len(), 3);
        let (min, max) = material.wavelength_range();
        assert_abs_diff_eq!(min, 400.0, epsilon = 1e-9);
        assert_abs_diff_eq!(max, 600.0, epsilon = 1e-9);
        assert!(material.refractive_index(700.0).is_err());
    }
}
