//! Page-level export events.
//!
//! [`crate::convert::export_file`] reports to an optional
//! [`ExportProgressCallback`] set through
//! [`crate::config::ExportConfigBuilder::progress_callback`]. The `djvu2img`
//! binary drives its `indicatif` bar from these events.
//!
//! ```rust
//! use djvu_raster::{ExportConfig, ExportProgressCallback};
//! use std::sync::Arc;
//!
//! struct FailedPages;
//!
//! impl ExportProgressCallback for FailedPages {
//!     fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
//!         eprintln!("page {page_num}: {error}");
//!     }
//! }
//!
//! let config = ExportConfig::builder()
//!     .progress_callback(Arc::new(FailedPages))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Receives export events. Page numbers are 1-based; `total_pages` is the
/// size of the page selection, not of the document.
///
/// Every method defaults to doing nothing.
pub trait ExportProgressCallback: Send + Sync {
    /// The output directory exists and `total_pages` pages are about to be
    /// rasterised.
    fn on_export_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// The page was encoded and `bytes_written` bytes landed on disk.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes_written: usize) {
        let _ = (page_num, total_pages, bytes_written);
    }

    /// The page failed; `error` is the rendered [`crate::PageError`].
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    fn on_export_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// The callback as stored in [`crate::config::ExportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;
