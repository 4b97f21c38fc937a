//! Error types for the evaluation harness.

use std::fmt;
use std::path::PathBuf;

use crate::scorer::MetricFamily;

/// Which archive of the pair an operation was working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveSide {
    GroundTruth,
    Submission,
}

impl ArchiveSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveSide::GroundTruth => "ground_truth",
            ArchiveSide::Submission => "submission",
        }
    }
}

impl fmt::Display for ArchiveSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by `validate_data` and `evaluate_method`.
///
/// Every variant is terminal for the call that produced it. The `Display`
/// text is what the participant sees.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("{}", unpack_message(.side))]
    ArchiveUnpack {
        side: ArchiveSide,
        archive: PathBuf,
        reason: String,
    },

    #[error(
        "The submission has fewer files than expected ({found} of {expected}). \
         Remember to generate one .{extension} file for each test sample image."
    )]
    MissingFiles {
        expected: usize,
        found: usize,
        extension: String,
    },

    #[error(
        "The submission has more files than expected ({found}, expected {expected}). \
         Make sure only .{extension} files are included (one for each test sample image)."
    )]
    ExtraFiles {
        expected: usize,
        found: usize,
        extension: String,
    },

    #[error(
        "An error has occurred. The file names should match the image IDs and the extension \
         should be .{extension} (first difference: expected `{expected_name}`, found `{found_name}`)"
    )]
    FileSetMismatch {
        expected_name: String,
        found_name: String,
        extension: String,
    },

    #[error("{0}")]
    FormatValidation(#[from] FormatError),

    #[error(
        "Something went wrong during the evaluation, did you validate the data? ({family}: {source})"
    )]
    MetricsComputation {
        family: MetricFamily,
        #[source]
        source: ScorerError,
    },

    #[error("failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("evaluation cancelled")]
    Cancelled,
}

fn unpack_message(side: &ArchiveSide) -> &'static str {
    match side {
        ArchiveSide::GroundTruth => "Error unpacking GT data, contact the administrator.",
        ArchiveSide::Submission => {
            "Error unpacking your submission, are you sure you sent a .zip file?"
        }
    }
}

impl EvalError {
    /// Stable machine-readable classification of the error.
    pub fn kind(&self) -> &'static str {
        match self {
            EvalError::ArchiveUnpack { .. } => "archive_unpack",
            EvalError::MissingFiles { .. } => "missing_files",
            EvalError::ExtraFiles { .. } => "extra_files",
            EvalError::FileSetMismatch { .. } => "file_set_mismatch",
            EvalError::FormatValidation(_) => "format_validation",
            EvalError::MetricsComputation { .. } => "metrics_computation",
            EvalError::Workspace(_) => "workspace",
            EvalError::Cancelled => "cancelled",
        }
    }
}

/// Rejection reported by a format checker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("{file}: expected a .{expected} file")]
    WrongExtension { file: String, expected: String },

    #[error("{file}: could not be read: {reason}")]
    Unreadable { file: String, reason: String },

    #[error("{file}:{line}: {reason}")]
    InvalidLine {
        file: String,
        line: usize,
        reason: String,
    },

    #[error("{0}")]
    Other(String),
}

/// Failure of one scorer invocation or of parsing its output.
#[derive(Debug, thiserror::Error)]
pub enum ScorerError {
    #[error("failed to start scorer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("scorer exited with code {code}: {stderr_tail}")]
    ExitStatus { code: i32, stderr_tail: String },

    #[error("scorer timed out after {secs} seconds")]
    Timeout { secs: u64 },

    #[error("scorer produced no output")]
    EmptyOutput,

    #[error("malformed scorer output `{line}`: {reason}")]
    MalformedOutput { line: String, reason: String },

    #[error("scorer cancelled")]
    Cancelled,

    #[error("scorer failed: {0}")]
    Other(String),
}

/// Result type for harness operations.
pub type EvalResult<T> = std::result::Result<T, EvalError>;
