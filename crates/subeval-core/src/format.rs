//! Delegated format validation of submission files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{EvalError, EvalResult, FormatError};
use crate::obs;

/// Validates the content format of a set of prediction files.
///
/// Implementations either accept the whole set or report the first problem.
pub trait FormatChecker: Send + Sync {
    fn check(&self, files: &[PathBuf]) -> Result<(), FormatError>;
}

/// Forward every extracted submission file to `checker` in one call.
pub async fn validate(checker: Arc<dyn FormatChecker>, files: Vec<PathBuf>) -> EvalResult<()> {
    let count = files.len();
    let outcome = tokio::task::spawn_blocking(move || checker.check(&files))
        .await
        .unwrap_or_else(|join_err| Err(FormatError::Other(join_err.to_string())));

    match outcome {
        Ok(()) => {
            obs::emit_format_validated(count);
            Ok(())
        }
        Err(e) => {
            obs::emit_format_rejected(&e);
            Err(EvalError::FormatValidation(e))
        }
    }
}

/// Checker for BIO-tagged files: one `<token> <tag>` pair per line.
///
/// Tags are `O`, `B-<label>` or `I-<label>`. Blank lines separate sentences.
#[derive(Debug, Clone)]
pub struct BioFormatChecker {
    extension: String,
}

impl BioFormatChecker {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    fn check_file(&self, path: &Path) -> Result<(), FormatError> {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let ext_ok = path
            .extension()
            .map(|e| e.to_string_lossy() == self.extension.as_str())
            .unwrap_or(false);
        if !ext_ok {
            return Err(FormatError::WrongExtension {
                file,
                expected: self.extension.clone(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FormatError::Unreadable {
            file: file.clone(),
            reason: e.to_string(),
        })?;

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            check_line(line).map_err(|reason| FormatError::InvalidLine {
                file: file.clone(),
                line: idx + 1,
                reason,
            })?;
        }
        Ok(())
    }
}

impl Default for BioFormatChecker {
    fn default() -> Self {
        Self::new("bio")
    }
}

impl FormatChecker for BioFormatChecker {
    fn check(&self, files: &[PathBuf]) -> Result<(), FormatError> {
        files.iter().try_for_each(|f| self.check_file(f))
    }
}

fn check_line(line: &str) -> Result<(), String> {
    let (token, tag) = line
        .rsplit_once(char::is_whitespace)
        .ok_or_else(|| format!("expected `<token> <tag>`, got `{}`", line))?;
    if token.trim().is_empty() {
        return Err(format!("missing token before tag `{}`", tag));
    }
    if tag == "O" {
        return Ok(());
    }
    match tag.split_once('-') {
        Some(("B" | "I", label)) if !label.is_empty() => Ok(()),
        _ => Err(format!("invalid BIO tag `{}`", tag)),
    }
}
