//! # djvu-raster
//!
//! Rasterise DjVu pages into in-memory images, ready for OCR or for
//! re-encoding into PDF.
//!
//! ## Why this crate?
//!
//! DjVu scans mix pure black-and-white pages (JB2 masks) with photographic
//! and compound ones. Rendering them all as RGB wastes 24× the space on text
//! pages and throws away the bitonal structure that TIFF and OCR engines
//! exploit. This crate keeps the split: bitonal pages come out as 1-bit
//! images, everything else as RGB.
//!
//! ## Pipeline Overview
//!
//! ```text
//! DjVu
//!  │
//!  ├─ 1. Input   validate path and AT&TFORM magic
//!  ├─ 2. Decode  DjVuLibre decodes the page (blocking)
//!  ├─ 3. Render  page → PageImage ("1" for bitonal, "RGB" otherwise)
//!  ├─ 4. Encode  TIFF for bitonal, JPEG for the rest (PNG fallback)
//!  └─ 5. Output  page-NNNN.<ext> files + per-page stats
//! ```
//!
//! ## Quick Start
//!
//! Rasterising a single decoded page works with any [`PageJob`]:
//!
//! ```rust,ignore
//! use djvu_raster::rasterize;
//!
//! let image = rasterize(&decoded_page, 0)?;
//! println!("{} {:?}", image.mode().name(), image.dimensions());
//! ```
//!
//! Exporting a whole file needs the `djvulibre` feature:
//!
//! ```rust,ignore
//! use djvu_raster::{export_file, ExportConfig};
//!
//! let config = ExportConfig::default();
//! let output = export_file("scan.djvu", "out/", &config).await?;
//! eprintln!("{} pages, {} bytes", output.stats.processed_pages, output.stats.total_bytes);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `tiff`      | on      | TIFF codec for bitonal pages |
//! | `jpeg`      | on      | JPEG codec for multitone pages |
//! | `djvulibre` | off     | Link libdjvulibre and expose [`djvulibre`] |
//! | `cli`       | off     | The `djvu2img` binary (implies `djvulibre`) |
//!
//! Without `tiff` or `jpeg` pages still rasterise correctly; a warning is
//! logged and they are saved as PNG.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod codec;
pub mod config;
pub mod convert;
pub mod decoder;
#[cfg(feature = "djvulibre")]
pub mod djvulibre;
pub mod error;
pub mod output;
pub mod page_image;
pub mod pipeline;
pub mod pixel;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use codec::{BuiltinCodecs, Codec, CodecProbe};
pub use config::{ExportConfig, ExportConfigBuilder, PageSelection};
pub use convert::{export_document, export_with, inspect_document};
#[cfg(feature = "djvulibre")]
pub use convert::{export_file, inspect};
pub use decoder::{DjvuDocument, DjvuPage, PageJob, PageType, Rect, RenderMode};
pub use error::{PageError, RasterError, RenderError};
pub use output::{DocumentMetadata, ExportOutput, ExportStats, PageInfo, PageResult};
pub use page_image::{BitonalImage, PageImage};
pub use pipeline::encode::{encode_page, EncodeOptions, EncodedPage, OutputFormat};
pub use pipeline::render::{rasterize, rasterize_page, rasterize_page_with, rasterize_with};
pub use pixel::{ImageMode, PixelFormat};
pub use progress::{ExportProgressCallback, ProgressCallback};
