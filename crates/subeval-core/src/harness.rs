//! Entry points: `validate_data` and `evaluate_method`.
//!
//! Both calls extract the ground-truth archive, then the submission archive,
//! each into its own workspace. Workspaces are released on every exit path.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::archive;
use crate::config::{EvaluationParams, HarnessConfig};
use crate::error::{ArchiveSide, EvalError, EvalResult};
use crate::fileset;
use crate::format::{self, BioFormatChecker, FormatChecker};
use crate::obs;
use crate::report::EvaluationOutcome;
use crate::scorer::{MetricsRunner, ProcessScorer, Scorer};
use crate::workspace::{Workspace, WorkspaceManager};

/// Evaluation harness for one benchmark task.
///
/// A harness holds no per-call state; concurrent calls each get their own
/// pair of uniquely-named workspaces.
pub struct Harness {
    config: HarnessConfig,
    workspaces: WorkspaceManager,
    checker: Arc<dyn FormatChecker>,
    metrics: MetricsRunner,
    cancel: CancellationToken,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        checker: Arc<dyn FormatChecker>,
        scorer: Arc<dyn Scorer>,
    ) -> Self {
        Self {
            workspaces: WorkspaceManager::new(config.temp_root.clone()),
            config,
            checker,
            metrics: MetricsRunner::new(scorer),
            cancel: CancellationToken::new(),
        }
    }

    /// Harness using the BIO checker and the external scorer program.
    pub fn from_config(config: HarnessConfig) -> Self {
        let checker = Arc::new(BioFormatChecker::new(config.expected_extension.clone()));
        let scorer = Arc::new(ProcessScorer::new(
            config.scorer_program.clone(),
            config.scorer_timeout_secs,
        ));
        Self::new(config, checker, scorer)
    }

    /// Abort in-flight extraction and scorer runs when `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Check that the submission matches the ground-truth file set and that
    /// every submitted file passes the format checker.
    pub async fn validate_data(
        &self,
        gt_archive: &Path,
        submission: &Path,
        _params: &EvaluationParams,
    ) -> EvalResult<()> {
        self.observed(
            "validate_data",
            gt_archive,
            submission,
            self.run_validation(gt_archive, submission),
        )
        .await
    }

    /// Score the submission against the ground truth.
    ///
    /// On success the outcome always has `result == true` and an empty
    /// message; every failure is returned as an error instead.
    pub async fn evaluate_method(
        &self,
        gt_archive: &Path,
        submission: &Path,
        _params: &EvaluationParams,
    ) -> EvalResult<EvaluationOutcome> {
        self.observed(
            "evaluate_method",
            gt_archive,
            submission,
            self.run_evaluation(gt_archive, submission),
        )
        .await
    }

    async fn run_validation(&self, gt_archive: &Path, submission: &Path) -> EvalResult<()> {
        let (gt_ws, hyp_ws) = self.extract_pair(gt_archive, submission).await?;

        let gt_files = fileset::list_entries(gt_ws.path(), ArchiveSide::GroundTruth)?;
        gt_ws.release();
        let hyp_files = fileset::list_entries(hyp_ws.path(), ArchiveSide::Submission)?;

        let compared = fileset::compare(&gt_files, &hyp_files, &self.config.expected_extension);
        obs::emit_file_sets_compared(gt_files.len(), hyp_files.len(), compared.is_ok());
        compared?;
        self.check_cancelled()?;

        let paths = hyp_files.iter().map(|f| hyp_ws.path().join(f)).collect();
        let validated = format::validate(self.checker.clone(), paths).await;
        hyp_ws.release();
        validated
    }

    async fn run_evaluation(
        &self,
        gt_archive: &Path,
        submission: &Path,
    ) -> EvalResult<EvaluationOutcome> {
        let (gt_ws, hyp_ws) = self.extract_pair(gt_archive, submission).await?;
        if let Err(e) = self.check_cancelled() {
            gt_ws.release();
            hyp_ws.release();
            return Err(e);
        }

        let computed = self
            .metrics
            .compute(gt_ws.path(), hyp_ws.path(), &self.cancel)
            .await;
        gt_ws.release();
        hyp_ws.release();

        computed.map(EvaluationOutcome::success)
    }

    /// Extract ground truth, then the submission. A ground-truth failure
    /// never touches the submission archive.
    async fn extract_pair(
        &self,
        gt_archive: &Path,
        submission: &Path,
    ) -> EvalResult<(Workspace, Workspace)> {
        let gt_ws = self.workspaces.acquire(ArchiveSide::GroundTruth)?;
        if let Err(e) = archive::extract(
            gt_archive,
            gt_ws.path(),
            ArchiveSide::GroundTruth,
            &self.cancel,
        )
        .await
        {
            gt_ws.release();
            return Err(e);
        }

        let hyp_ws = match self.workspaces.acquire(ArchiveSide::Submission) {
            Ok(ws) => ws,
            Err(e) => {
                gt_ws.release();
                return Err(e);
            }
        };
        if let Err(e) = archive::extract(
            submission,
            hyp_ws.path(),
            ArchiveSide::Submission,
            &self.cancel,
        )
        .await
        {
            hyp_ws.release();
            gt_ws.release();
            return Err(e);
        }

        Ok((gt_ws, hyp_ws))
    }

    fn check_cancelled(&self) -> EvalResult<()> {
        if self.cancel.is_cancelled() {
            return Err(EvalError::Cancelled);
        }
        Ok(())
    }

    async fn observed<T>(
        &self,
        operation: &'static str,
        gt_archive: &Path,
        submission: &Path,
        call: impl Future<Output = EvalResult<T>>,
    ) -> EvalResult<T> {
        let evaluation_id = Uuid::new_v4().to_string();
        let span = obs::evaluation_span(operation, &evaluation_id);

        async move {
            let start = Instant::now();
            obs::emit_evaluation_started(operation, gt_archive, submission);
            let result = call.await;
            let duration_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => obs::emit_evaluation_finished(operation, duration_ms),
                Err(e) => obs::emit_evaluation_failed(operation, duration_ms, e),
            }
            result
        }
        .instrument(span)
        .await
    }
}
