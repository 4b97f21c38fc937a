//! Reconciliation of ground-truth and submission file names.

use std::path::Path;

use crate::error::{ArchiveSide, EvalError, EvalResult};

/// Sorted top-level entry names of an extracted workspace.
pub fn list_entries(dir: &Path, side: ArchiveSide) -> EvalResult<Vec<String>> {
    let read_failed = |e: std::io::Error| EvalError::ArchiveUnpack {
        side,
        archive: dir.to_path_buf(),
        reason: format!("cannot list extracted files: {}", e),
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(read_failed)? {
        let entry = entry.map_err(read_failed)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(names)
}

/// Check that the submission names exactly match the ground truth.
///
/// Both inputs must already be sorted. Classification order: fewer files,
/// then more files, then same count with differing names.
pub fn compare(gt: &[String], hyp: &[String], extension: &str) -> EvalResult<()> {
    if gt == hyp {
        return Ok(());
    }

    if hyp.len() < gt.len() {
        return Err(EvalError::MissingFiles {
            expected: gt.len(),
            found: hyp.len(),
            extension: extension.to_string(),
        });
    }

    if hyp.len() > gt.len() {
        return Err(EvalError::ExtraFiles {
            expected: gt.len(),
            found: hyp.len(),
            extension: extension.to_string(),
        });
    }

    let (expected_name, found_name) = gt
        .iter()
        .zip(hyp)
        .find(|(g, h)| g != h)
        .map(|(g, h)| (g.clone(), h.clone()))
        .unwrap_or_default();

    Err(EvalError::FileSetMismatch {
        expected_name,
        found_name,
        extension: extension.to_string(),
    })
}
