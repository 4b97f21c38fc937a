//! subeval core library
//!
//! Validates and scores benchmark submissions:
//! - Extracts ground-truth and submission zip archives into private workspaces
//! - Reconciles file sets and delegates per-file format checks
//! - Runs the external scorer once per metric family and parses its summary rows

pub mod archive;
pub mod config;
pub mod error;
pub mod fileset;
pub mod format;
pub mod harness;
pub mod obs;
pub mod parse;
pub mod report;
pub mod scorer;
pub mod telemetry;
pub mod workspace;

// Re-export key types
pub use config::{ConfigError, EvaluationParams, HarnessConfig};
pub use error::{ArchiveSide, EvalError, EvalResult, FormatError, ScorerError};
pub use format::{BioFormatChecker, FormatChecker};
pub use harness::Harness;
pub use parse::{EntityRow, ErrorRateRow};
pub use report::{EvaluationOutcome, MetricsReport};
pub use scorer::{MetricFamily, MetricsRunner, ProcessScorer, Scorer, NERVAL_THRESHOLD};
pub use telemetry::init_tracing;
pub use workspace::{Workspace, WorkspaceManager};

/// subeval version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
