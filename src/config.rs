//! Configuration types for exporting DjVu pages.
//!
//! All export behaviour is controlled through [`ExportConfig`], built via its
//! [`ExportConfigBuilder`]. Setters clamp out-of-range values; [`build`]
//! rejects combinations that cannot work.
//!
//! [`build`]: ExportConfigBuilder::build

use crate::codec::{BuiltinCodecs, CodecProbe};
use crate::error::RasterError;
use crate::pipeline::encode::{EncodeOptions, OutputFormat};
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Configuration for a DjVu page export.
///
/// Built via [`ExportConfig::builder()`] or using [`ExportConfig::default()`].
///
/// # Example
/// ```rust
/// use djvu_raster::{ExportConfig, OutputFormat, PageSelection};
///
/// let config = ExportConfig::builder()
///     .pages(PageSelection::Range(1, 10))
///     .format(OutputFormat::Png)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExportConfig {
    /// Page selection. Default: All pages.
    pub pages: PageSelection,

    /// Output codec selection and JPEG quality.
    pub encode: EncodeOptions,

    /// File name prefix; pages are written as `{prefix}-{NNNN}.{ext}`. Default: "page".
    pub file_prefix: String,

    /// Replace existing files in the output directory. Default: true.
    pub overwrite: bool,

    /// Codec probe consulted by the rasteriser and encoder. Default: [`BuiltinCodecs`].
    pub codecs: Arc<dyn CodecProbe>,

    /// Optional per-page progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pages: PageSelection::default(),
            encode: EncodeOptions::default(),
            file_prefix: "page".to_string(),
            overwrite: true,
            codecs: Arc::new(BuiltinCodecs),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExportConfig")
            .field("pages", &self.pages)
            .field("encode", &self.encode)
            .field("file_prefix", &self.file_prefix)
            .field("overwrite", &self.overwrite)
            .field("codecs", &"<dyn CodecProbe>")
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ExportProgressCallback>"),
            )
            .finish()
    }
}

impl ExportConfig {
    /// Create a new builder for `ExportConfig`.
    pub fn builder() -> ExportConfigBuilder {
        ExportConfigBuilder {
            config: Self::default(),
        }
    }

    /// File name for the 1-indexed page `page_num`.
    pub fn file_name(&self, page_num: usize, extension: &str) -> String {
        format!("{}-{:04}.{}", self.file_prefix, page_num, extension)
    }
}

/// Builder for [`ExportConfig`].
#[derive(Debug)]
pub struct ExportConfigBuilder {
    config: ExportConfig,
}

impl ExportConfigBuilder {
    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.config.encode.format = format;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.encode.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    pub fn overwrite(mut self, v: bool) -> Self {
        self.config.overwrite = v;
        self
    }

    pub fn codecs(mut self, probe: Arc<dyn CodecProbe>) -> Self {
        self.config.codecs = probe;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExportConfig, RasterError> {
        let c = &self.config;
        if c.file_prefix.is_empty() {
            return Err(RasterError::InvalidConfig(
                "File prefix must not be empty".into(),
            ));
        }
        if c.file_prefix.contains(|ch: char| ch == '/' || ch == '\\') {
            return Err(RasterError::InvalidConfig(format!(
                "File prefix must not contain path separators, got '{}'",
                c.file_prefix
            )));
        }
        if !(1..=100).contains(&c.encode.jpeg_quality) {
            return Err(RasterError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                c.encode.jpeg_quality
            )));
        }
        if let PageSelection::Range(start, end) = c.pages {
            if start > end {
                return Err(RasterError::InvalidConfig(format!(
                    "Invalid page range {start}-{end}: start must be <= end"
                )));
            }
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the document to export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Export all pages (default).
    #[default]
    All,
    /// Export a single page (1-indexed).
    Single(usize),
    /// Export a contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Export specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// The first requested page (1-indexed), used in out-of-range errors.
    pub fn first_requested(&self) -> usize {
        match self {
            PageSelection::All => 1,
            PageSelection::Single(p) => *p,
            PageSelection::Range(start, _) => *start,
            PageSelection::Set(pages) => pages.iter().copied().min().unwrap_or(0),
        }
    }
}
