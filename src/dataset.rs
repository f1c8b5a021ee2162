//! Dataset loading: turns tabular text into the immutable record sets the
//! fitness evaluators score against.

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::GpError;
use crate::error::Result;

/// Default stand-in value for a `?` attribute field.
pub const DEFAULT_MISSING_VALUE: f64 = -1.0;

/// One row of a two-column regression table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionCase {
    pub x: f64,
    pub y: f64,
}

/// How classification records are decoded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassificationFormat {
    /// Value substituted for a `?` attribute field.
    pub missing_value: f64,
    /// The two accepted class codes; a negative program output predicts the
    /// first, a non-negative output the second.
    pub sign_classes: [i64; 2],
}

impl Default for ClassificationFormat {
    fn default() -> Self {
        Self {
            missing_value: DEFAULT_MISSING_VALUE,
            sign_classes: [2, 4],
        }
    }
}

/// One classification record: an identifier, its integer-coded attributes
/// and the class it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: i64,
    pub attributes: Vec<f64>,
    pub label: i64,
}

#[derive(Debug, Clone)]
pub struct ClassificationData {
    pub instances: Vec<Instance>,
    /// Attribute names in field order; `Node::Var(i)` binds to the i-th.
    pub names: Vec<String>,
    pub sign_classes: [i64; 2],
}

/// Parse a whitespace-separated (x, y) table. The first two lines are the
/// column heading and its underline and are skipped.
pub fn parse_regression(input: impl Read) -> Result<Vec<RegressionCase>> {
    let mut cases = Vec::new();
    for (number, line) in BufReader::new(input).lines().enumerate() {
        let line = line?;
        if number < 2 {
            continue;
        }
        let row = line.trim();
        if row.is_empty() {
            continue;
        }
        let mut fields = row.split_whitespace();
        let (Some(x), Some(y)) = (fields.next(), fields.next()) else {
            return Err(GpError::DataLoad(format!(
                "line {}: expected two columns",
                number + 1
            )));
        };
        cases.push(RegressionCase {
            x: parse_number(x, number)?,
            y: parse_number(y, number)?,
        });
    }
    Ok(cases)
}

pub fn load_regression(path: &Path) -> Result<Vec<RegressionCase>> {
    parse_regression(File::open(path)?)
}

/// Parse comma-separated records of the shape `id,attr...,class` against the
/// attribute names read from `names` (one per line). A `?` attribute maps to
/// `format.missing_value`; it is never dropped.
pub fn parse_classification(
    records: impl Read,
    names: impl Read,
    format: ClassificationFormat,
) -> Result<ClassificationData> {
    let names = parse_names(names)?;
    let mut instances = Vec::new();
    for (number, line) in BufReader::new(records).lines().enumerate() {
        let line = line?;
        let row = line.trim();
        if row.is_empty() {
            continue;
        }
        let fields = row.split(',').collect::<Vec<_>>();
        if fields.len() != names.len() + 2 {
            return Err(GpError::DataLoad(format!(
                "line {}: expected {} fields, found {}",
                number + 1,
                names.len() + 2,
                fields.len()
            )));
        }
        let id = parse_integer(fields[0], number)?;
        let label = parse_integer(fields[fields.len() - 1], number)?;
        if !format.sign_classes.contains(&label) {
            return Err(GpError::DataLoad(format!(
                "line {}: unknown class {label}",
                number + 1
            )));
        }
        let attributes = fields[1..fields.len() - 1]
            .iter()
            .map(|field| attribute_value(field, format.missing_value, number))
            .collect::<Result<Vec<_>>>()?;
        instances.push(Instance {
            id,
            attributes,
            label,
        });
    }
    Ok(ClassificationData {
        instances,
        names,
        sign_classes: format.sign_classes,
    })
}

pub fn load_classification(
    records: &Path,
    names: &Path,
    format: ClassificationFormat,
) -> Result<ClassificationData> {
    parse_classification(File::open(records)?, File::open(names)?, format)
}

fn parse_names(input: impl Read) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in BufReader::new(input).lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.push(name.to_string());
        }
    }
    if names.is_empty() {
        return Err(GpError::DataLoad("attribute name file is empty".into()));
    }
    Ok(names)
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field
        .parse()
        .map_err(|_| GpError::DataLoad(format!("line {}: invalid number {field:?}", line + 1)))
}

fn parse_integer(field: &str, line: usize) -> Result<i64> {
    field
        .parse()
        .map_err(|_| GpError::DataLoad(format!("line {}: invalid integer {field:?}", line + 1)))
}

fn attribute_value(field: &str, missing_value: f64, line: usize) -> Result<f64> {
    if field == "?" {
        return Ok(missing_value);
    }
    parse_integer(field, line).map(|value| value as f64)
}
