//! Structured observability hooks for evaluation lifecycle events.
//!
//! Every function emits one `tracing` event with an `event = "..."` field so
//! log pipelines can filter on it. Verbosity follows `RUST_LOG`.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::{ArchiveSide, EvalError, FormatError, ScorerError};
use crate::scorer::MetricFamily;

/// Span wrapping one `validate_data` / `evaluate_method` call.
pub fn evaluation_span(operation: &'static str, evaluation_id: &str) -> tracing::Span {
    tracing::info_span!("subeval.evaluation", operation, evaluation_id = %evaluation_id)
}

pub fn emit_evaluation_started(operation: &str, gt_archive: &Path, submission: &Path) {
    info!(
        event = "evaluation.started",
        operation = %operation,
        gt_archive = %gt_archive.display(),
        submission = %submission.display(),
    );
}

pub fn emit_evaluation_finished(operation: &str, duration_ms: u64) {
    info!(
        event = "evaluation.finished",
        operation = %operation,
        duration_ms = duration_ms,
        success = true,
    );
}

/// Emitted for every failed call, whatever its classification.
pub fn emit_evaluation_failed(operation: &str, duration_ms: u64, error: &EvalError) {
    warn!(
        event = "evaluation.failed",
        operation = %operation,
        duration_ms = duration_ms,
        kind = error.kind(),
        error = %error,
    );
}

pub fn emit_workspace_acquired(side: ArchiveSide, path: &Path) {
    debug!(event = "workspace.acquired", side = %side, path = %path.display());
}

pub fn emit_workspace_released(side: ArchiveSide, path: &Path) {
    debug!(event = "workspace.released", side = %side, path = %path.display());
}

pub fn emit_workspace_release_error(side: ArchiveSide, path: &Path, error: &dyn std::fmt::Display) {
    warn!(
        event = "workspace.release_error",
        side = %side,
        path = %path.display(),
        error = %error,
    );
}

pub fn emit_archive_extracted(side: ArchiveSide, archive: &Path, files: usize) {
    info!(
        event = "archive.extracted",
        side = %side,
        archive = %archive.display(),
        files = files,
    );
}

pub fn emit_archive_unpack_failed(side: ArchiveSide, archive: &Path, reason: &str) {
    warn!(
        event = "archive.unpack_failed",
        side = %side,
        archive = %archive.display(),
        reason = %reason,
    );
}

pub fn emit_file_sets_compared(expected: usize, found: usize, matched: bool) {
    info!(
        event = "fileset.compared",
        expected = expected,
        found = found,
        matched = matched,
    );
}

pub fn emit_format_validated(files: usize) {
    info!(event = "format.validated", files = files);
}

pub fn emit_format_rejected(error: &FormatError) {
    warn!(event = "format.rejected", error = %error);
}

pub fn emit_scorer_started(family: MetricFamily) {
    info!(event = "scorer.started", family = %family);
}

pub fn emit_scorer_finished(family: MetricFamily, duration_ms: u64, summary_line: &str) {
    info!(
        event = "scorer.finished",
        family = %family,
        duration_ms = duration_ms,
        summary_line = %summary_line,
    );
}

pub fn emit_scorer_failed(family: MetricFamily, error: &ScorerError) {
    warn!(event = "scorer.failed", family = %family, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[traced_test]
    #[test]
    fn scorer_events_are_logged() {
        emit_scorer_started(MetricFamily::Entity);
        emit_scorer_finished(MetricFamily::Entity, 12, "| ALL | 1 | 2 | 3 |");
        assert!(logs_contain("scorer.finished"));
        assert!(logs_contain("nerval"));
    }

    #[traced_test]
    #[test]
    fn failures_log_kind() {
        let err = EvalError::MissingFiles {
            expected: 2,
            found: 1,
            extension: "bio".to_string(),
        };
        emit_evaluation_failed("validate_data", 3, &err);
        assert!(logs_contain("evaluation.failed"));
        assert!(logs_contain("missing_files"));
    }

    #[traced_test]
    #[test]
    fn span_carries_evaluation_id() {
        let span = evaluation_span("evaluate_method", "eval-123");
        let _guard = span.enter();
        emit_format_validated(4);
        assert!(logs_contain("eval-123"));
    }
}
