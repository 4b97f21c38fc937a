//! Shared fixtures: zip builders, fake scorer and fake format checker.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use subeval_core::{
    FormatChecker, FormatError, Harness, HarnessConfig, MetricFamily, Scorer, ScorerError,
};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const ERROR_RATE_TABLE: &str = "\
| Category | ECER (%) | EWER (%) | N documents |
|:---------|:--------:|:--------:|:-----------:|
| total    |  12.5    |   7.3    |      2      |
";

pub const ENTITY_TABLE: &str = "\
| tag | predicted | matched | Precision | Recall | F1 | Support |
| ALL | 80.0 | 70.0 | 74.67 | 10 |
";

/// Write a zip archive containing `entries` (name, body).
pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let file = std::fs::File::create(path).unwrap();
    let mut zip = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (name, body) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Scratch area with a dedicated, initially empty workspace root.
pub struct Fixture {
    pub dir: TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("workspaces")).unwrap();
        Self { dir }
    }

    pub fn workspace_root(&self) -> PathBuf {
        self.dir.path().join("workspaces")
    }

    pub fn archive(&self, name: &str, entries: &[(&str, &str)]) -> PathBuf {
        let path = self.dir.path().join(name);
        write_zip(&path, entries);
        path
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            temp_root: Some(self.workspace_root()),
            ..HarnessConfig::default()
        }
    }

    pub fn harness(&self, checker: Arc<dyn FormatChecker>, scorer: Arc<dyn Scorer>) -> Harness {
        Harness::new(self.config(), checker, scorer)
    }

    /// Entries left under the workspace root.
    pub fn leftover_workspaces(&self) -> Vec<String> {
        std::fs::read_dir(self.workspace_root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }
}

/// Checker that records what it saw and optionally rejects.
#[derive(Default)]
pub struct RecordingChecker {
    pub calls: AtomicUsize,
    pub seen: Mutex<Vec<String>>,
    pub reject_with: Option<String>,
}

impl RecordingChecker {
    pub fn accepting() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn rejecting(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl FormatChecker for RecordingChecker {
    fn check(&self, files: &[PathBuf]) -> Result<(), FormatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut seen = self.seen.lock().unwrap();
        for f in files {
            assert!(f.is_file(), "checker got a path that does not exist: {}", f.display());
            seen.push(f.file_name().unwrap().to_string_lossy().into_owned());
        }
        match &self.reject_with {
            Some(msg) => Err(FormatError::Other(msg.clone())),
            None => Ok(()),
        }
    }
}

/// Scorer that prints canned tables, one per family.
pub struct FakeScorer {
    pub error_rate: Result<String, i32>,
    pub entity: Result<String, i32>,
    pub calls: Mutex<Vec<MetricFamily>>,
}

impl FakeScorer {
    pub fn new(error_rate: &str, entity: &str) -> Arc<Self> {
        Arc::new(Self {
            error_rate: Ok(error_rate.to_string()),
            entity: Ok(entity.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing_on(family: MetricFamily) -> Arc<Self> {
        let (error_rate, entity) = match family {
            MetricFamily::ErrorRate => (Err(1), Ok(ENTITY_TABLE.to_string())),
            MetricFamily::Entity => (Ok(ERROR_RATE_TABLE.to_string()), Err(1)),
        };
        Arc::new(Self {
            error_rate,
            entity,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<MetricFamily> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scorer for FakeScorer {
    async fn run(
        &self,
        family: MetricFamily,
        gt_dir: &Path,
        hyp_dir: &Path,
        _cancel: &CancellationToken,
    ) -> Result<String, ScorerError> {
        assert!(gt_dir.is_dir(), "ground-truth dir missing during scoring");
        assert!(hyp_dir.is_dir(), "submission dir missing during scoring");
        self.calls.lock().unwrap().push(family);

        let output = match family {
            MetricFamily::ErrorRate => &self.error_rate,
            MetricFamily::Entity => &self.entity,
        };
        match output {
            Ok(table) => subeval_core::scorer::last_line(table).ok_or(ScorerError::EmptyOutput),
            Err(code) => Err(ScorerError::ExitStatus {
                code: *code,
                stderr_tail: "Traceback (most recent call last)".to_string(),
            }),
        }
    }
}
