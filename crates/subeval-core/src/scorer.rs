//! External scorer invocation.
//!
//! The scorer is queried once per [`MetricFamily`]; only the last line of its
//! output (the table's summary row) is kept.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{EvalError, EvalResult, ScorerError};
use crate::obs;
use crate::parse::{EntityRow, ErrorRateRow};
use crate::report::MetricsReport;

/// Matching threshold passed to the entity family.
pub const NERVAL_THRESHOLD: f64 = 30.0;

/// Characters of stderr kept when the scorer exits abnormally.
const STDERR_TAIL_CHARS: usize = 512;

/// One of the two scorer invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricFamily {
    /// Character and word error rates (ecer, ewer).
    ErrorRate,
    /// Entity precision, recall and F1.
    Entity,
}

impl MetricFamily {
    /// Scorer subcommand for this family.
    pub fn subcommand(&self) -> &'static str {
        match self {
            MetricFamily::ErrorRate => "ecer-ewer",
            MetricFamily::Entity => "nerval",
        }
    }

    /// Full argument list for one invocation.
    ///
    /// Directory arguments carry a trailing slash.
    pub fn command_args(&self, gt_dir: &Path, hyp_dir: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from(self.subcommand()),
            OsString::from("--label-dir"),
            dir_arg(gt_dir),
            OsString::from("--prediction-dir"),
            dir_arg(hyp_dir),
        ];
        if let MetricFamily::Entity = self {
            args.push(OsString::from("--nerval-threshold"));
            args.push(OsString::from(format!("{:.1}", NERVAL_THRESHOLD)));
        }
        args
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subcommand())
    }
}

fn dir_arg(dir: &Path) -> OsString {
    let mut arg = dir.as_os_str().to_owned();
    arg.push("/");
    arg
}

/// Computes one metric family over two directories of comparably-named files.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Run the scorer and return the last line it printed, trimmed.
    async fn run(
        &self,
        family: MetricFamily,
        gt_dir: &Path,
        hyp_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, ScorerError>;
}

/// Scorer backed by an external program (`ie-eval` by default).
#[derive(Debug, Clone)]
pub struct ProcessScorer {
    program: String,
    timeout_secs: u64,
}

impl ProcessScorer {
    /// `timeout_secs == 0` waits indefinitely.
    pub fn new(program: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            program: program.into(),
            timeout_secs,
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

#[async_trait]
impl Scorer for ProcessScorer {
    async fn run(
        &self,
        family: MetricFamily,
        gt_dir: &Path,
        hyp_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<String, ScorerError> {
        let child = Command::new(&self.program)
            .args(family.command_args(gt_dir, hyp_dir))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ScorerError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let timeout_secs = self.timeout_secs;
        let wait = async move {
            let output = if timeout_secs > 0 {
                tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
                    .await
                    .map_err(|_| ScorerError::Timeout { secs: timeout_secs })?
            } else {
                child.wait_with_output().await
            };
            output.map_err(|e| ScorerError::Other(format!("failed to collect output: {}", e)))
        };

        // Dropping `wait` drops the child, which kills it.
        let output = tokio::select! {
            _ = cancel.cancelled() => return Err(ScorerError::Cancelled),
            output = wait => output?,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScorerError::ExitStatus {
                code: output.status.code().unwrap_or(-1),
                stderr_tail: tail(stderr.trim(), STDERR_TAIL_CHARS),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        last_line(&stdout).ok_or(ScorerError::EmptyOutput)
    }
}

/// Last line of `output`, trimmed. `None` when there is no visible output.
pub fn last_line(output: &str) -> Option<String> {
    if output.trim().is_empty() {
        return None;
    }
    output.lines().last().map(|l| l.trim().to_string())
}

fn tail(s: &str, max_chars: usize) -> String {
    let count = s.chars().count();
    if count <= max_chars {
        return s.to_string();
    }
    s.chars().skip(count - max_chars).collect()
}

/// Runs both metric families and assembles the report.
#[derive(Clone)]
pub struct MetricsRunner {
    scorer: Arc<dyn Scorer>,
}

impl MetricsRunner {
    pub fn new(scorer: Arc<dyn Scorer>) -> Self {
        Self { scorer }
    }

    /// Invoke the error-rate family, then the entity family, sequentially.
    pub async fn compute(
        &self,
        gt_dir: &Path,
        hyp_dir: &Path,
        cancel: &CancellationToken,
    ) -> EvalResult<MetricsReport> {
        let line = self
            .summary_line(MetricFamily::ErrorRate, gt_dir, hyp_dir, cancel)
            .await?;
        let error_rates = ErrorRateRow::from_summary_line(&line)
            .map_err(|e| metrics_error(MetricFamily::ErrorRate, e))?;

        let line = self
            .summary_line(MetricFamily::Entity, gt_dir, hyp_dir, cancel)
            .await?;
        let entities = EntityRow::from_summary_line(&line)
            .map_err(|e| metrics_error(MetricFamily::Entity, e))?;

        Ok(MetricsReport::from_rows(error_rates, entities))
    }

    async fn summary_line(
        &self,
        family: MetricFamily,
        gt_dir: &Path,
        hyp_dir: &Path,
        cancel: &CancellationToken,
    ) -> EvalResult<String> {
        let start = Instant::now();
        obs::emit_scorer_started(family);

        match self.scorer.run(family, gt_dir, hyp_dir, cancel).await {
            Ok(line) => {
                obs::emit_scorer_finished(family, start.elapsed().as_millis() as u64, &line);
                Ok(line)
            }
            Err(e) => Err(metrics_error(family, e)),
        }
    }
}

fn metrics_error(family: MetricFamily, source: ScorerError) -> EvalError {
    if let ScorerError::Cancelled = source {
        return EvalError::Cancelled;
    }
    obs::emit_scorer_failed(family, &source);
    EvalError::MetricsComputation { family, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn os_args(items: &[&str]) -> Vec<OsString> {
        items.iter().map(OsString::from).collect()
    }

    #[test]
    fn error_rate_args() {
        let args = MetricFamily::ErrorRate.command_args(Path::new("/tmp/gt"), Path::new("/tmp/hyp"));
        assert_eq!(
            args,
            os_args(&[
                "ecer-ewer",
                "--label-dir",
                "/tmp/gt/",
                "--prediction-dir",
                "/tmp/hyp/",
            ])
        );
    }

    #[test]
    fn entity_args_carry_fixed_threshold() {
        let args = MetricFamily::Entity.command_args(Path::new("/g"), Path::new("/h"));
        assert_eq!(
            args,
            os_args(&[
                "nerval",
                "--label-dir",
                "/g/",
                "--prediction-dir",
                "/h/",
                "--nerval-threshold",
                "30.0",
            ])
        );
    }

    #[test]
    fn last_line_rules() {
        assert_eq!(last_line(""), None);
        assert_eq!(last_line("  \n\n"), None);
        assert_eq!(last_line("header\n| total | 1 | 2 |\n").as_deref(), Some("| total | 1 | 2 |"));
        assert_eq!(last_line("only").as_deref(), Some("only"));
    }

    #[test]
    fn tail_keeps_end() {
        assert_eq!(tail("abcdef", 3), "def");
        assert_eq!(tail("ab", 3), "ab");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let scorer = ProcessScorer::new("subeval-no-such-scorer-binary", 5);
        let err = scorer
            .run(
                MetricFamily::ErrorRate,
                Path::new("/tmp"),
                Path::new("/tmp"),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ScorerError::Spawn { .. }));
    }

    struct Scripted {
        error_rate: Result<&'static str, ()>,
        entity: Result<&'static str, ()>,
    }

    #[async_trait]
    impl Scorer for Scripted {
        async fn run(
            &self,
            family: MetricFamily,
            _gt_dir: &Path,
            _hyp_dir: &Path,
            _cancel: &CancellationToken,
        ) -> Result<String, ScorerError> {
            let line = match family {
                MetricFamily::ErrorRate => self.error_rate,
                MetricFamily::Entity => self.entity,
            };
            line.map(str::to_string)
                .map_err(|_| ScorerError::ExitStatus {
                    code: 2,
                    stderr_tail: "boom".to_string(),
                })
        }
    }

    fn dirs() -> (PathBuf, PathBuf) {
        (PathBuf::from("/gt"), PathBuf::from("/hyp"))
    }

    #[tokio::test]
    async fn compute_builds_report() {
        let runner = MetricsRunner::new(Arc::new(Scripted {
            error_rate: Ok("| total | 12.5 | 7.3 | 10 |"),
            entity: Ok("| ALL | 80 | 70 | 74.67 | 10 |"),
        }));
        let (gt, hyp) = dirs();
        let report = runner
            .compute(&gt, &hyp, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(report.ecer, 12.5);
        assert_eq!(report.ewer, 7.3);
        assert_eq!(report.nerval_p, 80.0);
        assert_eq!(report.nerval_r, 70.0);
        assert_eq!(report.nerval_f1, 74.67);
    }

    #[tokio::test]
    async fn entity_failure_is_tagged_with_family() {
        let runner = MetricsRunner::new(Arc::new(Scripted {
            error_rate: Ok("| total | 12.5 | 7.3 | 10 |"),
            entity: Err(()),
        }));
        let (gt, hyp) = dirs();
        let err = runner
            .compute(&gt, &hyp, &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            EvalError::MetricsComputation { family, .. } => {
                assert_eq!(family, MetricFamily::Entity)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_line_is_metrics_error() {
        let runner = MetricsRunner::new(Arc::new(Scripted {
            error_rate: Ok("Evaluation finished"),
            entity: Ok("| ALL | 80 | 70 | 74.67 | 10 |"),
        }));
        let (gt, hyp) = dirs();
        let err = runner
            .compute(&gt, &hyp, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EvalError::MetricsComputation {
                family: MetricFamily::ErrorRate,
                source: ScorerError::MalformedOutput { .. },
            }
        ));
    }
}
