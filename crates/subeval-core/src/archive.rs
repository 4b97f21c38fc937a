//! Zip archive extraction into a workspace.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use crate::error::{ArchiveSide, EvalError, EvalResult};
use crate::obs;

/// Why an extraction stopped before materializing the whole tree.
#[derive(Debug, thiserror::Error)]
enum UnpackFailure {
    #[error("cannot open archive: {0}")]
    Open(io::Error),

    #[error("invalid zip archive: {0}")]
    Container(zip::result::ZipError),

    #[error("entry escapes destination: {0}")]
    UnsafePath(String),

    #[error("extraction interrupted: {0}")]
    Write(io::Error),

    #[error("cancelled")]
    Cancelled,
}

/// Unpack `archive` under `dest`, running the blocking I/O off the runtime.
///
/// Returns the number of file entries written. The blocking task is always
/// awaited to completion, so nothing writes into `dest` after this returns.
pub async fn extract(
    archive: &Path,
    dest: &Path,
    side: ArchiveSide,
    cancel: &CancellationToken,
) -> EvalResult<usize> {
    let archive_owned = archive.to_path_buf();
    let dest_owned = dest.to_path_buf();
    let token = cancel.clone();

    let outcome =
        tokio::task::spawn_blocking(move || extract_blocking(&archive_owned, &dest_owned, &token))
            .await
            .unwrap_or_else(|join_err| {
                Err(UnpackFailure::Write(io::Error::new(
                    io::ErrorKind::Other,
                    join_err.to_string(),
                )))
            });

    match outcome {
        Ok(files) => {
            obs::emit_archive_extracted(side, archive, files);
            Ok(files)
        }
        Err(UnpackFailure::Cancelled) => Err(EvalError::Cancelled),
        Err(failure) => {
            let reason = failure.to_string();
            obs::emit_archive_unpack_failed(side, archive, &reason);
            Err(EvalError::ArchiveUnpack {
                side,
                archive: archive.to_path_buf(),
                reason,
            })
        }
    }
}

fn extract_blocking(
    archive: &Path,
    dest: &Path,
    cancel: &CancellationToken,
) -> Result<usize, UnpackFailure> {
    let file = File::open(archive).map_err(UnpackFailure::Open)?;
    let mut zip = zip::ZipArchive::new(file).map_err(UnpackFailure::Container)?;

    if cancel.is_cancelled() {
        return Err(UnpackFailure::Cancelled);
    }

    let mut written = 0;
    for i in 0..zip.len() {
        if cancel.is_cancelled() {
            return Err(UnpackFailure::Cancelled);
        }

        let mut entry = zip.by_index(i).map_err(UnpackFailure::Container)?;
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| UnpackFailure::UnsafePath(entry.name().to_string()))?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(UnpackFailure::Write)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(UnpackFailure::Write)?;
        }
        let mut out = File::create(&out_path).map_err(UnpackFailure::Write)?;
        io::copy(&mut entry, &mut out).map_err(UnpackFailure::Write)?;
        written += 1;
    }

    Ok(written)
}
