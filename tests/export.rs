//! Integration tests for the export driver, run against an in-memory
//! document so no DjVuLibre installation is needed.

use djvu_raster::{
    export_document, export_with, inspect_document, DjvuDocument, DjvuPage, ExportConfig,
    ExportProgressCallback, ImageMode, OutputFormat, PageError, PageJob, PageSelection, PageType,
    PixelFormat, RasterError, Rect, RenderError, RenderMode,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ── Fake decoder ─────────────────────────────────────────────────────────────

#[derive(Clone)]
struct PageFixture {
    size: (u32, u32),
    page_type: PageType,
    /// Written at the start of the render buffer; the rest stays zero.
    pixels: Vec<u8>,
    decode_error: Option<RenderError>,
    render_error: Option<RenderError>,
}

impl PageFixture {
    fn bitonal(w: u32, h: u32, pixels: Vec<u8>) -> Self {
        Self {
            size: (w, h),
            page_type: PageType::Bitonal,
            pixels,
            decode_error: None,
            render_error: None,
        }
    }

    fn photo(w: u32, h: u32) -> Self {
        Self {
            page_type: PageType::Photo,
            ..Self::bitonal(w, h, Vec::new())
        }
    }

    fn broken(self, err: RenderError) -> Self {
        Self {
            decode_error: Some(err),
            ..self
        }
    }

    fn unavailable(self) -> Self {
        Self {
            render_error: Some(RenderError::NotAvailable),
            ..self
        }
    }
}

struct FakeDocument {
    pages: Vec<PageFixture>,
}

impl DjvuDocument for FakeDocument {
    type Page = FakePage;

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Result<FakePage, RenderError> {
        self.pages
            .get(index)
            .cloned()
            .map(FakePage)
            .ok_or_else(|| RenderError::Failed(format!("no page {index}")))
    }
}

struct FakePage(PageFixture);

impl DjvuPage for FakePage {
    type Job = FakeJob;

    fn decode(&self, _wait: bool) -> Result<FakeJob, RenderError> {
        match &self.0.decode_error {
            Some(err) => Err(err.clone()),
            None => Ok(FakeJob(self.0.clone())),
        }
    }
}

struct FakeJob(PageFixture);

impl PageJob for FakeJob {
    fn size(&self) -> (u32, u32) {
        self.0.size
    }

    fn page_type(&self) -> PageType {
        self.0.page_type
    }

    fn render(
        &self,
        _mode: RenderMode,
        _page_rect: Rect,
        _render_rect: Rect,
        _format: &PixelFormat,
        buffer: &mut [u8],
    ) -> Result<(), RenderError> {
        if let Some(err) = &self.0.render_error {
            return Err(err.clone());
        }
        buffer[..self.0.pixels.len()].copy_from_slice(&self.0.pixels);
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn png_config() -> ExportConfig {
    ExportConfig::builder()
        .format(OutputFormat::Png)
        .build()
        .expect("valid config")
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read_dir")
        .map(|e| e.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(all(feature = "tiff", feature = "jpeg"))]
#[test]
fn test_auto_format_picks_codec_per_mode() {
    let doc = FakeDocument {
        pages: vec![
            PageFixture::bitonal(16, 4, vec![0xAA; 8]),
            PageFixture::photo(8, 8),
            PageFixture {
                page_type: PageType::Compound,
                ..PageFixture::photo(8, 8)
            },
        ],
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let output = export_document(&doc, dir.path(), &ExportConfig::default()).expect("export");

    assert_eq!(
        file_names(dir.path()),
        vec!["page-0001.tif", "page-0002.jpg", "page-0003.jpg"]
    );
    assert_eq!(output.stats.processed_pages, 3);
    assert_eq!(output.stats.bitonal_pages, 1);
    assert_eq!(output.stats.multitone_pages, 2);
    assert_eq!(output.pages[0].mode, Some(ImageMode::Bitonal));
    assert_eq!(output.pages[1].mode, Some(ImageMode::Multitone));
}

#[test]
fn test_selected_page_written_with_prefix_and_inverted_bits() {
    // 8x2 bitonal; 0x00 is all white in DjVu, which the rasteriser inverts
    // to all-set bits, i.e. white in the exported image.
    let doc = FakeDocument {
        pages: vec![
            PageFixture::photo(4, 4),
            PageFixture::bitonal(8, 2, vec![0x00, 0xFF]),
            PageFixture::photo(4, 4),
        ],
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ExportConfig::builder()
        .format(OutputFormat::Png)
        .file_prefix("leaf")
        .pages(PageSelection::Set(vec![2]))
        .build()
        .expect("valid config");

    let output = export_document(&doc, dir.path(), &config).expect("export");

    assert_eq!(file_names(dir.path()), vec!["leaf-0002.png"]);
    assert_eq!(output.stats.skipped_pages, 2);
    assert_eq!(output.pages.len(), 1);

    let written = image::open(dir.path().join("leaf-0002.png"))
        .expect("decode png")
        .to_luma8();
    assert_eq!(written.dimensions(), (8, 2));
    // Row 0 white, row 1 black.
    assert!(written.rows().next().expect("row 0").all(|p| p.0[0] == 255));
    assert!(written.rows().nth(1).expect("row 1").all(|p| p.0[0] == 0));
}

#[test]
fn test_failed_page_is_recorded_and_export_continues() {
    let doc = FakeDocument {
        pages: vec![
            PageFixture::photo(4, 4),
            PageFixture::photo(4, 4).broken(RenderError::DecodeFailed("bad BG44".into())),
            PageFixture::photo(4, 4),
        ],
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let output = export_document(&doc, dir.path(), &png_config()).expect("partial export");

    assert_eq!(output.stats.processed_pages, 2);
    assert_eq!(output.stats.failed_pages, 1);
    assert_eq!(file_names(dir.path()), vec!["page-0001.png", "page-0003.png"]);

    let failed = &output.pages[1];
    assert_eq!(failed.page_num, 2);
    assert!(failed.path.is_none());
    match &failed.error {
        Some(PageError::RenderFailed { page, detail }) => {
            assert_eq!(*page, 2);
            assert!(detail.contains("bad BG44"), "got: {detail}");
        }
        other => panic!("unexpected: {other:?}"),
    }

    assert!(matches!(
        output.into_result(),
        Err(RasterError::PartialFailure {
            success: 2,
            failed: 1,
            total: 3
        })
    ));
}

#[test]
fn test_unavailable_page_exports_blank_white_page() {
    let doc = FakeDocument {
        pages: vec![PageFixture::photo(10, 3).unavailable()],
    };
    let dir = tempfile::tempdir().expect("tempdir");

    let output = export_document(&doc, dir.path(), &png_config()).expect("export");

    assert_eq!(output.stats.failed_pages, 0);
    assert_eq!(output.pages[0].mode, Some(ImageMode::Bitonal));
    let written = image::open(dir.path().join("page-0001.png"))
        .expect("decode png")
        .to_luma8();
    assert_eq!(written.dimensions(), (10, 3));
    assert!(written.pixels().all(|p| p.0[0] == 255));
}

#[test]
fn test_all_pages_failing_is_fatal() {
    let doc = FakeDocument {
        pages: vec![
            PageFixture::photo(4, 4).broken(RenderError::Failed("first".into())),
            PageFixture::photo(4, 4).broken(RenderError::Failed("second".into())),
        ],
    };
    let dir = tempfile::tempdir().expect("tempdir");

    match export_document(&doc, dir.path(), &png_config()) {
        Err(RasterError::AllPagesFailed { total, first_error }) => {
            assert_eq!(total, 2);
            assert!(first_error.contains("first"), "got: {first_error}");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn test_selection_outside_document_is_rejected() {
    let doc = FakeDocument {
        pages: vec![PageFixture::photo(4, 4); 3],
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let config = ExportConfig::builder()
        .pages(PageSelection::Range(9, 12))
        .build()
        .expect("valid config");

    let err = export_document(&doc, dir.path(), &config).expect_err("out of range");
    assert!(matches!(
        err,
        RasterError::PageOutOfRange { page: 9, total: 3 }
    ));
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_existing_file_kept_without_overwrite() {
    let doc = FakeDocument {
        pages: vec![PageFixture::photo(4, 4), PageFixture::photo(4, 4)],
    };
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("page-0001.png"), b"keep me").expect("seed");
    let config = ExportConfig::builder()
        .format(OutputFormat::Png)
        .overwrite(false)
        .build()
        .expect("valid config");

    let output = export_document(&doc, dir.path(), &config).expect("export");

    assert!(matches!(
        output.pages[0].error,
        Some(PageError::WriteFailed { page: 1, .. })
    ));
    assert!(output.pages[1].is_ok());
    assert_eq!(
        std::fs::read(dir.path().join("page-0001.png")).expect("read"),
        b"keep me"
    );
}

#[derive(Default)]
struct RecordingCallback {
    events: Mutex<Vec<String>>,
    bytes: AtomicUsize,
}

impl ExportProgressCallback for RecordingCallback {
    fn on_export_start(&self, total_pages: usize) {
        self.events.lock().unwrap().push(format!("start {total_pages}"));
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("page {page_num}/{total_pages}"));
    }

    fn on_page_complete(&self, page_num: usize, _total_pages: usize, bytes_written: usize) {
        self.bytes.fetch_add(bytes_written, Ordering::SeqCst);
        self.events.lock().unwrap().push(format!("done {page_num}"));
    }

    fn on_page_error(&self, page_num: usize, _total_pages: usize, _error: &str) {
        self.events.lock().unwrap().push(format!("error {page_num}"));
    }

    fn on_export_complete(&self, total_pages: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(format!("complete {success_count}/{total_pages}"));
    }
}

#[test]
fn test_progress_callback_sees_every_page() {
    let doc = FakeDocument {
        pages: vec![
            PageFixture::photo(4, 4),
            PageFixture::photo(4, 4).broken(RenderError::Failed("x".into())),
            PageFixture::bitonal(8, 1, vec![0x0F]),
        ],
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let cb = Arc::new(RecordingCallback::default());
    let config = ExportConfig::builder()
        .format(OutputFormat::Png)
        .progress_callback(cb.clone())
        .build()
        .expect("valid config");

    let output = export_document(&doc, dir.path(), &config).expect("export");

    assert_eq!(
        *cb.events.lock().unwrap(),
        vec![
            "start 3",
            "page 1/3",
            "done 1",
            "page 2/3",
            "error 2",
            "page 3/3",
            "done 3",
            "complete 2/3",
        ]
    );
    assert_eq!(cb.bytes.load(Ordering::SeqCst), output.stats.total_bytes);
}

#[tokio::test]
async fn test_export_with_runs_on_blocking_pool() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = export_with(
        || {
            Ok(FakeDocument {
                pages: vec![PageFixture::bitonal(8, 8, vec![0x81; 8])],
            })
        },
        dir.path(),
        &png_config(),
    )
    .await
    .expect("export");

    assert_eq!(output.stats.processed_pages, 1);
    assert!(dir.path().join("page-0001.png").exists());
}

#[tokio::test]
async fn test_export_with_propagates_open_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = export_with(
        || -> Result<FakeDocument, RasterError> {
            Err(RasterError::OpenFailed {
                path: "missing.djvu".into(),
                detail: "no such file".into(),
            })
        },
        dir.path(),
        &png_config(),
    )
    .await
    .expect_err("open fails");
    assert!(matches!(err, RasterError::OpenFailed { .. }));
}

#[test]
fn test_inspect_document_reports_sizes_and_modes() {
    let doc = FakeDocument {
        pages: vec![PageFixture::bitonal(2480, 3508, Vec::new()), PageFixture::photo(640, 480)],
    };

    let meta = inspect_document(&doc).expect("inspect");

    assert_eq!(meta.page_count, 2);
    assert_eq!((meta.pages[0].width, meta.pages[0].height), (2480, 3508));
    assert_eq!(meta.pages[0].mode, ImageMode::Bitonal);
    assert_eq!(meta.pages[1].page_type, PageType::Photo);
    assert_eq!(meta.pages[1].mode, ImageMode::Multitone);

    let json = serde_json::to_string(&meta).expect("serialise");
    assert!(json.contains("\"bitonal\""));
}

#[test]
fn test_callback_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RecordingCallback>();
    assert_send_sync::<ExportConfig>();
}
