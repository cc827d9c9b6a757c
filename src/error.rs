//! Error types for the djvu-raster library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`RenderError`] - raised by a DjVu decoder backend. Its
//!   [`RenderError::NotAvailable`] variant is the one condition the
//!   rasteriser recovers from (by producing a blank page); everything else
//!   is wrapped into [`RasterError::Render`] and propagated.
//!
//! * [`RasterError`] - **Fatal**: the page or document cannot be converted
//!   at all (bad input file, decoder failure, unwritable output directory).
//!
//! * [`PageError`] - **Non-fatal**: one page of a document export failed
//!   but the others are fine. Stored inside [`crate::output::PageResult`]
//!   so callers can inspect partial success.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by a DjVu decoder backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The decoder does not (yet) have the data needed to render the page.
    ///
    /// DjVuLibre signals this for pages whose chunks are missing from an
    /// indirect or truncated document.
    #[error("page data is not available")]
    NotAvailable,

    /// Decoding the document or page failed.
    #[error("decoding failed: {0}")]
    DecodeFailed(String),

    /// Any other decoder failure.
    #[error("{0}")]
    Failed(String),
}

/// All fatal errors returned by the djvu-raster library.
#[derive(Debug, Error)]
pub enum RasterError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("DjVu file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file was opened but reading its header failed.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists and was read, but is not a DjVu document.
    #[error("File is not a valid DjVu document: '{path}'\nFirst bytes: {magic:?}")]
    NotADjvu { path: PathBuf, magic: [u8; 8] },

    /// The decoder could not open the document.
    #[error("DjVu document '{path}' could not be opened: {detail}")]
    OpenFailed { path: PathBuf, detail: String },

    // ── Page errors ───────────────────────────────────────────────────────
    /// Selected page numbers exceed the actual page count.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// The decoder reported a zero width or height.
    #[error("Page {page} has an empty size ({width}x{height})")]
    EmptyPage { page: usize, width: u32, height: u32 },

    /// The worst-case pixel buffer for the page does not fit in memory.
    #[error("Page {page} is too large to rasterise ({width}x{height})")]
    PageTooLarge { page: usize, width: u32, height: u32 },

    /// The decoder failed while decoding or rendering a page.
    #[error("Rasterisation failed for page {page}: {source}")]
    Render {
        page: usize,
        #[source]
        source: RenderError,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The rasterised page could not be encoded.
    #[error("Failed to encode page {page}: {source}")]
    Encode {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every selected page failed; nothing was exported.
    #[error("All {total} pages failed.\nFirst error: {first_error}")]
    AllPagesFailed { total: usize, first_error: String },

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ExportOutput::into_result`] when the
    /// caller wants to treat any page failure as an error.
    #[error("{failed}/{total} pages failed during export")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page of an export.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Decoding or rasterising the page failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Encoding the rasterised page failed.
    #[error("Page {page}: encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },

    /// Writing the encoded page to disk failed.
    #[error("Page {page}: write failed: {detail}")]
    WriteFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. }
            | PageError::WriteFailed { page, .. } => *page,
        }
    }
}
