//! Parsing of the scorer's pipe-delimited summary row.

use std::ops::Range;

use crate::error::ScorerError;

/// Field separator of the scorer's table output.
pub const DELIMITER: char = '|';

/// Positions of ecer and ewer in the error-rate summary row.
pub const ERROR_RATE_FIELDS: Range<usize> = 2..4;

/// Positions of precision, recall and F1 in the entity summary row.
pub const ENTITY_FIELDS: Range<usize> = 2..5;

/// Split `line` on `delimiter` and parse the fields at `fields` as floats.
pub fn parse_row(line: &str, delimiter: char, fields: Range<usize>) -> Result<Vec<f64>, ScorerError> {
    let malformed = |reason: String| ScorerError::MalformedOutput {
        line: line.to_string(),
        reason,
    };

    let parts: Vec<&str> = line.split(delimiter).collect();
    if parts.len() < fields.end {
        return Err(malformed(format!(
            "expected at least {} `{}`-separated fields, found {}",
            fields.end,
            delimiter,
            parts.len()
        )));
    }

    parts[fields]
        .iter()
        .map(|raw| {
            let raw = raw.trim();
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Ok(v),
                Ok(_) => Err(malformed(format!("non-finite value `{}`", raw))),
                Err(_) => Err(malformed(format!("`{}` is not a number", raw))),
            }
        })
        .collect()
}

/// Summary row of the `ecer-ewer` family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorRateRow {
    pub ecer: f64,
    pub ewer: f64,
}

impl ErrorRateRow {
    pub fn from_summary_line(line: &str) -> Result<Self, ScorerError> {
        let v = parse_row(line, DELIMITER, ERROR_RATE_FIELDS)?;
        Ok(Self {
            ecer: v[0],
            ewer: v[1],
        })
    }
}

/// Summary row of the `nerval` family.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityRow {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl EntityRow {
    pub fn from_summary_line(line: &str) -> Result<Self, ScorerError> {
        let v = parse_row(line, DELIMITER, ENTITY_FIELDS)?;
        Ok(Self {
            precision: v[0],
            recall: v[1],
            f1: v[2],
        })
    }
}
