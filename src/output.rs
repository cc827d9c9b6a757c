//! Result types returned by the export and inspect entry points.

use crate::codec::Codec;
use crate::decoder::PageType;
use crate::error::{PageError, RasterError};
use crate::pixel::ImageMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of exporting one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Written file, if the page succeeded.
    pub path: Option<PathBuf>,
    pub mode: Option<ImageMode>,
    pub codec: Option<Codec>,
    pub width: u32,
    pub height: u32,
    pub bytes_written: usize,
    pub duration_ms: u64,
    pub error: Option<PageError>,
}

impl PageResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failed(page_num: usize, error: PageError, duration_ms: u64) -> Self {
        Self {
            page_num,
            path: None,
            mode: None,
            codec: None,
            width: 0,
            height: 0,
            bytes_written: 0,
            duration_ms,
            error: Some(error),
        }
    }
}

/// Aggregate numbers for an export run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportStats {
    /// Pages in the document.
    pub total_pages: usize,
    /// Pages written successfully.
    pub processed_pages: usize,
    pub failed_pages: usize,
    /// Pages in the document but outside the selection.
    pub skipped_pages: usize,
    pub bitonal_pages: usize,
    pub multitone_pages: usize,
    pub total_bytes: usize,
    pub total_duration_ms: u64,
}

/// Full result of [`crate::convert::export_document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportOutput {
    /// Per-page results in page order.
    pub pages: Vec<PageResult>,
    pub stats: ExportStats,
}

impl ExportOutput {
    /// Treat any page failure as an error.
    pub fn into_result(self) -> Result<Self, RasterError> {
        if self.stats.failed_pages > 0 {
            return Err(RasterError::PartialFailure {
                success: self.stats.processed_pages,
                failed: self.stats.failed_pages,
                total: self.stats.processed_pages + self.stats.failed_pages,
            });
        }
        Ok(self)
    }

    /// Errors of the pages that failed.
    pub fn errors(&self) -> impl Iterator<Item = &PageError> {
        self.pages.iter().filter_map(|p| p.error.as_ref())
    }
}

/// Size and type of one page, as reported by the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    /// 1-indexed page number.
    pub page_num: usize,
    pub width: u32,
    pub height: u32,
    pub page_type: PageType,
    /// Mode the page would be rasterised in.
    pub mode: ImageMode,
}

/// Document overview returned by [`crate::convert::inspect_document`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(processed: usize, failed: usize) -> ExportOutput {
        let mut pages = Vec::new();
        for n in 0..failed {
            pages.push(PageResult::failed(
                n + 1,
                PageError::RenderFailed {
                    page: n + 1,
                    detail: "boom".into(),
                },
                1,
            ));
        }
        ExportOutput {
            pages,
            stats: ExportStats {
                processed_pages: processed,
                failed_pages: failed,
                ..ExportStats::default()
            },
        }
    }

    #[test]
    fn into_result_passes_clean_output() {
        assert!(output(3, 0).into_result().is_ok());
    }

    #[test]
    fn into_result_reports_partial_failure() {
        match output(9, 1).into_result() {
            Err(RasterError::PartialFailure {
                success,
                failed,
                total,
            }) => assert_eq!((success, failed, total), (9, 1, 10)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn output_serialises_to_json() {
        let out = output(0, 1);
        assert_eq!(out.errors().count(), 1);
        let json = serde_json::to_string(&out).expect("serialise");
        assert!(json.contains("\"failed_pages\":1"));
        assert!(json.contains("RenderFailed"));
    }
}
