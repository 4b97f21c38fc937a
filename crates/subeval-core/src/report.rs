//! Metrics report and evaluation outcome.

use serde::{Deserialize, Serialize};

use crate::parse::{EntityRow, ErrorRateRow};

/// The five metrics reported for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub ecer: f64,
    pub ewer: f64,
    #[serde(rename = "nerval-f1")]
    pub nerval_f1: f64,
    #[serde(rename = "nerval-p")]
    pub nerval_p: f64,
    #[serde(rename = "nerval-r")]
    pub nerval_r: f64,
}

impl MetricsReport {
    /// Worst possible score for every metric.
    pub const WORST: MetricsReport = MetricsReport {
        ecer: 100.0,
        ewer: 100.0,
        nerval_f1: 0.0,
        nerval_p: 0.0,
        nerval_r: 0.0,
    };

    /// Build a report from both parsed summary rows.
    pub fn from_rows(error_rates: ErrorRateRow, entities: EntityRow) -> Self {
        Self {
            ecer: error_rates.ecer,
            ewer: error_rates.ewer,
            nerval_f1: entities.f1,
            nerval_p: entities.precision,
            nerval_r: entities.recall,
        }
    }
}

/// Value returned by a successful `evaluate_method` call.
///
/// Failures never produce an outcome; they are returned as errors instead,
/// so `result` is always `true` and `message` always empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub result: bool,
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(rename = "method")]
    pub metrics: MetricsReport,
}

impl EvaluationOutcome {
    pub fn success(metrics: MetricsReport) -> Self {
        Self {
            result: true,
            message: String::new(),
            metrics,
        }
    }
}
