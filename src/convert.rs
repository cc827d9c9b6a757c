//! Document export entry points.
//!
//! [`export_document`] is the blocking core: it walks the selected pages of
//! an opened document, rasterises each one and writes it to the output
//! directory. [`export_with`] runs it on tokio's blocking pool, and with the
//! `djvulibre` feature [`export_file`] / [`inspect`] do the same for a path
//! on disk.
//!
//! A page that fails is recorded in its [`PageResult`] and the export moves
//! on; only an empty selection, an unwritable output directory or every
//! page failing abort the whole run.

use crate::config::ExportConfig;
use crate::decoder::{DjvuDocument, DjvuPage, PageJob};
use crate::error::{PageError, RasterError};
use crate::output::{DocumentMetadata, ExportOutput, ExportStats, PageInfo, PageResult};
use crate::page_image::PageImage;
use crate::pipeline::{encode, render};
use crate::pixel::ImageMode;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Export the selected pages of `doc` into `out_dir`.
///
/// Blocking: every page is decoded on the calling thread.
///
/// # Returns
/// `Ok(ExportOutput)` even if some pages failed
/// (check `output.stats.failed_pages`, or call [`ExportOutput::into_result`]).
///
/// # Errors
/// - [`RasterError::PageOutOfRange`] when the selection matches no page
/// - [`RasterError::OutputWriteFailed`] when `out_dir` cannot be created
/// - [`RasterError::AllPagesFailed`] when no page was written
pub fn export_document<D>(
    doc: &D,
    out_dir: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportOutput, RasterError>
where
    D: DjvuDocument + ?Sized,
{
    let total_start = Instant::now();
    let out_dir = out_dir.as_ref();
    let total_pages = doc.page_count();
    info!("Exporting DjVu document with {} pages", total_pages);

    // ── Step 1: Compute page indices ─────────────────────────────────────
    let page_indices = config.pages.to_indices(total_pages);
    if page_indices.is_empty() {
        return Err(RasterError::PageOutOfRange {
            page: config.pages.first_requested(),
            total: total_pages,
        });
    }
    let selected = page_indices.len();
    debug!("Selected {} pages for export", selected);

    // ── Step 2: Prepare the output directory ─────────────────────────────
    std::fs::create_dir_all(out_dir).map_err(|e| RasterError::OutputWriteFailed {
        path: out_dir.to_path_buf(),
        source: e,
    })?;

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_start(selected);
    }

    // ── Step 3: Rasterise, encode and write each page ────────────────────
    let mut pages = Vec::with_capacity(selected);
    for &index in &page_indices {
        let page_num = index + 1;
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, selected);
        }

        let page_start = Instant::now();
        let result = match export_page(doc, index, out_dir, config) {
            Ok(mut pr) => {
                pr.duration_ms = page_start.elapsed().as_millis() as u64;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_complete(page_num, selected, pr.bytes_written);
                }
                pr
            }
            Err(e) => {
                warn!("{}", e);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, selected, &e.to_string());
                }
                PageResult::failed(page_num, e, page_start.elapsed().as_millis() as u64)
            }
        };
        pages.push(result);
    }

    // ── Step 4: Compute stats ────────────────────────────────────────────
    let processed = pages.iter().filter(|p| p.is_ok()).count();
    let failed = pages.len() - processed;

    if let Some(ref cb) = config.progress_callback {
        cb.on_export_complete(selected, processed);
    }

    if processed == 0 {
        let first_error = pages
            .iter()
            .find_map(|p| p.error.as_ref())
            .map(|e| e.to_string())
            .unwrap_or_else(|| "Unknown error".to_string());
        return Err(RasterError::AllPagesFailed {
            total: pages.len(),
            first_error,
        });
    }

    let stats = ExportStats {
        total_pages,
        processed_pages: processed,
        failed_pages: failed,
        skipped_pages: total_pages.saturating_sub(selected),
        bitonal_pages: count_mode(&pages, ImageMode::Bitonal),
        multitone_pages: count_mode(&pages, ImageMode::Multitone),
        total_bytes: pages.iter().map(|p| p.bytes_written).sum(),
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Export complete: {}/{} pages, {} bytes, {}ms total",
        processed, selected, stats.total_bytes, stats.total_duration_ms
    );

    Ok(ExportOutput { pages, stats })
}

/// Run [`export_document`] on tokio's blocking pool.
///
/// Decoder handles are usually tied to one thread, so the document is
/// opened by `open` inside the blocking task rather than passed in.
pub async fn export_with<D, F>(
    open: F,
    out_dir: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportOutput, RasterError>
where
    D: DjvuDocument,
    F: FnOnce() -> Result<D, RasterError> + Send + 'static,
{
    let out_dir = out_dir.as_ref().to_path_buf();
    let config = config.clone();
    tokio::task::spawn_blocking(move || {
        let doc = open()?;
        export_document(&doc, &out_dir, &config)
    })
    .await
    .map_err(|e| RasterError::Internal(format!("Export task panicked: {e}")))?
}

/// Page count plus size and type of every page, without rendering.
pub fn inspect_document<D>(doc: &D) -> Result<DocumentMetadata, RasterError>
where
    D: DjvuDocument + ?Sized,
{
    let page_count = doc.page_count();
    let mut pages = Vec::with_capacity(page_count);
    for index in 0..page_count {
        let page_num = index + 1;
        let job = doc
            .page(index)
            .and_then(|p| p.decode(true))
            .map_err(|source| RasterError::Render {
                page: page_num,
                source,
            })?;
        let (width, height) = job.size();
        let page_type = job.page_type();
        pages.push(PageInfo {
            page_num,
            width,
            height,
            page_type,
            mode: ImageMode::for_page(page_type),
        });
    }
    Ok(DocumentMetadata { page_count, pages })
}

/// Export a DjVu file from disk.
///
/// Validates the input, then opens the document with DjVuLibre and runs
/// [`export_document`] on the blocking pool.
#[cfg(feature = "djvulibre")]
pub async fn export_file(
    input: impl AsRef<Path>,
    out_dir: impl AsRef<Path>,
    config: &ExportConfig,
) -> Result<ExportOutput, RasterError> {
    let path = crate::pipeline::input::resolve_input(input)?;
    info!("Starting export: {}", path.display());
    export_with(move || crate::djvulibre::Document::open(&path), out_dir, config).await
}

/// Extract page metadata from a DjVu file without rendering.
#[cfg(feature = "djvulibre")]
pub async fn inspect(input: impl AsRef<Path>) -> Result<DocumentMetadata, RasterError> {
    let path = crate::pipeline::input::resolve_input(input)?;
    tokio::task::spawn_blocking(move || {
        let doc = crate::djvulibre::Document::open(&path)?;
        inspect_document(&doc)
    })
    .await
    .map_err(|e| RasterError::Internal(format!("Inspect task panicked: {e}")))?
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn export_page<D>(
    doc: &D,
    index: usize,
    out_dir: &Path,
    config: &ExportConfig,
) -> Result<PageResult, PageError>
where
    D: DjvuDocument + ?Sized,
{
    let page_num = index + 1;
    let image = doc
        .page(index)
        .map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: e.to_string(),
        })
        .and_then(|page| {
            render::rasterize_page_with(&page, index, config.codecs.as_ref()).map_err(|e| {
                PageError::RenderFailed {
                    page: page_num,
                    detail: e.to_string(),
                }
            })
        })?;

    let encoded = encode::encode_page(&image, &config.encode, config.codecs.as_ref()).map_err(
        |e| PageError::EncodeFailed {
            page: page_num,
            detail: e.to_string(),
        },
    )?;

    let path = out_dir.join(config.file_name(page_num, encoded.extension()));
    write_page(&path, &encoded.bytes, config.overwrite).map_err(|detail| {
        PageError::WriteFailed {
            page: page_num,
            detail,
        }
    })?;
    debug!("Wrote page {} → {}", page_num, path.display());

    Ok(success(page_num, path, &image, encoded))
}

fn success(
    page_num: usize,
    path: PathBuf,
    image: &PageImage,
    encoded: encode::EncodedPage,
) -> PageResult {
    let (width, height) = image.dimensions();
    PageResult {
        page_num,
        path: Some(path),
        mode: Some(image.mode()),
        codec: Some(encoded.codec),
        width,
        height,
        bytes_written: encoded.bytes.len(),
        duration_ms: 0,
        error: None,
    }
}

/// Write through a temp file and rename, so a crash never leaves a
/// truncated page behind.
fn write_page(path: &Path, bytes: &[u8], overwrite: bool) -> Result<(), String> {
    if !overwrite && path.exists() {
        return Err(format!("'{}' already exists", path.display()));
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, bytes).map_err(|e| format!("{}: {e}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp_path);
        format!("{}: {e}", path.display())
    })
}

fn count_mode(pages: &[PageResult], mode: ImageMode) -> usize {
    pages.iter().filter(|p| p.mode == Some(mode)).count()
}
