//! Input resolution: check a user-supplied PDF path before handing it to
//! pdfium.
//!
//! pdfium reports a missing or non-PDF file as a generic load failure. Doing
//! the existence, permission and `%PDF` magic-byte checks up front gives the
//! user an error that names the actual problem.

use crate::error::Pdf2VisionError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path and return it unchanged.
pub fn resolve_input(path: &Path) -> Result<PathBuf, Pdf2VisionError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(Pdf2VisionError::FileNotFound { path });
    }

    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(Pdf2VisionError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Pdf2VisionError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(Pdf2VisionError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// File name of the source PDF, extension included, used as the stem of
/// every page image name.
pub fn source_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}
