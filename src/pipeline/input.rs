//! Input resolution: validate a user-supplied DjVu path before opening it.
//!
//! DjVuLibre reports a missing or foreign file only through asynchronous
//! error messages on its context. Checking existence, permissions and the
//! `AT&TFORM` magic up front gives callers a precise [`RasterError`]
//! instead.

use crate::error::RasterError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Every DjVu file, single-page or bundled, starts with these bytes.
pub const DJVU_MAGIC: &[u8; 8] = b"AT&TFORM";

/// Check whether `bytes` start with the DjVu magic.
pub fn is_djvu(bytes: &[u8]) -> bool {
    bytes.starts_with(DJVU_MAGIC)
}

/// Resolve a local DjVu file path, validating existence and magic bytes.
pub fn resolve_input(input: impl AsRef<Path>) -> Result<PathBuf, RasterError> {
    let path = input.as_ref().to_path_buf();

    if !path.exists() {
        return Err(RasterError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            let mut magic = [0u8; 8];
            match f.read_exact(&mut magic) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    return Err(RasterError::NotADjvu { path, magic });
                }
                Err(source) => return Err(RasterError::InputReadFailed { path, source }),
            }
            if !is_djvu(&magic) {
                return Err(RasterError::NotADjvu { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RasterError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(RasterError::FileNotFound { path });
        }
    }

    debug!("Resolved local DjVu: {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_djvu() {
        assert!(is_djvu(b"AT&TFORM\x00\x00\x10\x00DJVM"));
        assert!(!is_djvu(b"%PDF-1.7"));
        assert!(!is_djvu(b"AT&T"));
        assert!(!is_djvu(b""));
    }

    #[test]
    fn missing_file() {
        let err = resolve_input("/definitely/not/a/real/file.djvu").expect_err("missing");
        assert!(matches!(err, RasterError::FileNotFound { .. }));
    }

    #[test]
    fn rejects_other_formats() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"%PDF-1.7\n%binary").expect("write");
        let err = resolve_input(file.path()).expect_err("not djvu");
        match err {
            RasterError::NotADjvu { magic, .. } => assert_eq!(&magic, b"%PDF-1.7"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rejects_truncated_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"AT&T").expect("write");
        assert!(matches!(
            resolve_input(file.path()),
            Err(RasterError::NotADjvu { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_input_is_a_read_failure() {
        // Opening a directory succeeds on unix, reading from it does not.
        let dir = tempfile::tempdir().expect("tempdir");
        match resolve_input(dir.path()) {
            Err(RasterError::InputReadFailed { path, source }) => {
                assert_eq!(path, dir.path());
                assert_ne!(source.kind(), std::io::ErrorKind::UnexpectedEof);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn accepts_djvu_magic() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(b"AT&TFORM\x00\x00\x00\x20DJVUINFO")
            .expect("write");
        let path = resolve_input(file.path()).expect("valid");
        assert_eq!(path, file.path());
    }
}
