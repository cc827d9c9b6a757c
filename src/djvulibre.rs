//! DjVuLibre backend for the [`crate::decoder`] traits.
//!
//! Safe wrappers over the raw `ddjvu-ffi` declarations. Handles are
//! reference counted so a page keeps its document alive, and a document its
//! context; each handle releases its C object on drop. `Rc` makes all of
//! them `!Send`: DjVuLibre contexts are not meant to be shared between
//! threads, so open one per thread.
//!
//! DjVuLibre decodes asynchronously and reports progress and errors as
//! messages on the context. Blocking operations pump that queue until the
//! job in question is done, logging `DDJVU_ERROR` messages at warn level.

use crate::decoder::{DjvuDocument, DjvuPage, PageJob, PageType, Rect, RenderMode};
use crate::error::{RasterError, RenderError};
use crate::pixel::{BitOrder, ByteOrder, PixelFormat, PixelStyle};
use ddjvu_ffi as ffi;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_ulong};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::rc::Rc;
use tracing::{debug, warn};

// ── Context ──────────────────────────────────────────────────────────────

struct ContextHandle {
    raw: NonNull<ffi::ddjvu_context_t>,
}

impl ContextHandle {
    fn as_ptr(&self) -> *mut ffi::ddjvu_context_t {
        self.raw.as_ptr()
    }

    /// Drain pending messages, first blocking for one if `wait` is set.
    ///
    /// Returns the text of the last error message seen, if any.
    fn pump(&self, wait: bool) -> Option<String> {
        let ctx = self.as_ptr();
        let mut last_error = None;
        // SAFETY: `ctx` is a live context. Message pointers returned by
        // peek/wait stay valid until the matching pop, and are only read
        // before it.
        unsafe {
            if wait {
                ffi::ddjvu_message_wait(ctx);
            }
            loop {
                let msg = ffi::ddjvu_message_peek(ctx);
                if msg.is_null() {
                    break;
                }
                if (*msg).m_any.tag == ffi::DDJVU_ERROR {
                    let err = (*msg).m_error;
                    let text = c_str_lossy(err.message);
                    let function = c_str_lossy(err.function);
                    warn!(%function, "DjVuLibre error: {}", text);
                    last_error = Some(text);
                }
                ffi::ddjvu_message_pop(ctx);
            }
        }
        last_error
    }

    /// Block until `job` is done. Returns the job status and the last
    /// error message reported while waiting.
    fn wait_for(&self, job: *mut ffi::ddjvu_job_t) -> (ffi::ddjvu_status_t, Option<String>) {
        let mut last_error = None;
        loop {
            // SAFETY: `job` belongs to a document or page kept alive by the
            // caller for the duration of this call.
            let status = unsafe { ffi::ddjvu_job_status(job) };
            if ffi::job_done(status) {
                if let Some(e) = self.pump(false) {
                    last_error = Some(e);
                }
                return (status, last_error);
            }
            if let Some(e) = self.pump(true) {
                last_error = Some(e);
            }
        }
    }
}

impl Drop for ContextHandle {
    fn drop(&mut self) {
        // SAFETY: created by `ddjvu_context_create`; documents hold an `Rc`
        // to this handle, so none outlive it.
        unsafe { ffi::ddjvu_context_release(self.raw.as_ptr()) }
    }
}

/// A DjVuLibre decoding context.
#[derive(Clone)]
pub struct Context {
    inner: Rc<ContextHandle>,
}

impl Context {
    pub fn new() -> Result<Self, RasterError> {
        // SAFETY: the program name is a static NUL-terminated string.
        let raw = unsafe { ffi::ddjvu_context_create(c"djvu-raster".as_ptr()) };
        let raw = NonNull::new(raw)
            .ok_or_else(|| RasterError::Internal("ddjvu_context_create returned null".into()))?;
        Ok(Self {
            inner: Rc::new(ContextHandle { raw }),
        })
    }

    /// Open a document and wait until its directory has been decoded.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Document, RasterError> {
        let path = path.as_ref().to_path_buf();
        let open_failed = |detail: String| RasterError::OpenFailed {
            path: path.clone(),
            detail,
        };

        let utf8 = path
            .to_str()
            .ok_or_else(|| open_failed("path is not valid UTF-8".into()))?;
        let c_path =
            CString::new(utf8).map_err(|_| open_failed("path contains a NUL byte".into()))?;

        // SAFETY: both pointers are valid for the call; DjVuLibre copies
        // the file name.
        let raw = unsafe {
            ffi::ddjvu_document_create_by_filename_utf8(self.inner.as_ptr(), c_path.as_ptr(), 1)
        };
        let raw = NonNull::new(raw)
            .ok_or_else(|| open_failed("ddjvu_document_create returned null".into()))?;
        let handle = Rc::new(DocumentHandle {
            raw,
            ctx: Rc::clone(&self.inner),
        });

        // SAFETY: the document is live.
        let job = unsafe { ffi::ddjvu_document_job(handle.as_ptr()) };
        let (status, last_error) = self.inner.wait_for(job);
        if ffi::job_error(status) {
            return Err(open_failed(
                last_error.unwrap_or_else(|| "document decoding failed".into()),
            ));
        }

        let doc = Document {
            inner: handle,
            path,
        };
        debug!(
            "Opened {} ({} pages)",
            doc.path.display(),
            doc.page_count()
        );
        Ok(doc)
    }
}

// ── Document ─────────────────────────────────────────────────────────────

struct DocumentHandle {
    raw: NonNull<ffi::ddjvu_document_t>,
    ctx: Rc<ContextHandle>,
}

impl DocumentHandle {
    fn as_ptr(&self) -> *mut ffi::ddjvu_document_t {
        self.raw.as_ptr()
    }
}

impl Drop for DocumentHandle {
    fn drop(&mut self) {
        // SAFETY: pages hold an `Rc` to this handle, so none outlive it; the
        // context is released afterwards when `ctx` drops.
        unsafe { ffi::ddjvu_document_release(self.raw.as_ptr()) }
    }
}

/// An opened DjVu document.
pub struct Document {
    inner: Rc<DocumentHandle>,
    path: PathBuf,
}

impl Document {
    /// Open `path` in a fresh context.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RasterError> {
        Context::new()?.open(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DjvuDocument for Document {
    type Page = Page;

    fn page_count(&self) -> usize {
        // SAFETY: the document is live and its directory decoded.
        let n = unsafe { ffi::ddjvu_document_get_pagenum(self.inner.as_ptr()) };
        n.max(0) as usize
    }

    fn page(&self, index: usize) -> Result<Page, RenderError> {
        let total = self.page_count();
        let pageno = c_int::try_from(index)
            .ok()
            .filter(|_| index < total)
            .ok_or_else(|| {
                RenderError::Failed(format!("page index {index} out of range (0..{total})"))
            })?;
        // SAFETY: the document is live and `pageno` is in range.
        let raw = unsafe { ffi::ddjvu_page_create_by_pageno(self.inner.as_ptr(), pageno) };
        let raw = NonNull::new(raw).ok_or_else(|| {
            RenderError::Failed(format!("ddjvu_page_create returned null for page {}", index + 1))
        })?;
        Ok(Page {
            inner: Rc::new(PageHandle {
                raw,
                doc: Rc::clone(&self.inner),
            }),
            index,
        })
    }
}

// ── Page ─────────────────────────────────────────────────────────────────

struct PageHandle {
    raw: NonNull<ffi::ddjvu_page_t>,
    doc: Rc<DocumentHandle>,
}

impl PageHandle {
    fn as_ptr(&self) -> *mut ffi::ddjvu_page_t {
        self.raw.as_ptr()
    }

    fn ctx(&self) -> &ContextHandle {
        &self.doc.ctx
    }
}

impl Drop for PageHandle {
    fn drop(&mut self) {
        // SAFETY: created by `ddjvu_page_create_by_pageno`; the document is
        // still alive through `doc`.
        unsafe { ffi::ddjvu_page_release(self.raw.as_ptr()) }
    }
}

/// A page of a [`Document`], possibly still decoding.
pub struct Page {
    inner: Rc<PageHandle>,
    index: usize,
}

impl DjvuPage for Page {
    type Job = DecodedPage;

    fn decode(&self, wait: bool) -> Result<DecodedPage, RenderError> {
        if wait {
            // SAFETY: the page is live.
            let job = unsafe { ffi::ddjvu_page_job(self.inner.as_ptr()) };
            let (status, last_error) = self.inner.ctx().wait_for(job);
            if ffi::job_error(status) {
                return Err(RenderError::DecodeFailed(last_error.unwrap_or_else(|| {
                    format!("page {} could not be decoded", self.index + 1)
                })));
            }
        } else {
            self.inner.ctx().pump(false);
        }
        Ok(DecodedPage {
            inner: Rc::clone(&self.inner),
        })
    }
}

/// A decoded page, ready to render.
pub struct DecodedPage {
    inner: Rc<PageHandle>,
}

impl DecodedPage {
    /// Scan resolution in dots per inch.
    pub fn resolution(&self) -> u32 {
        // SAFETY: the page is live.
        let dpi = unsafe { ffi::ddjvu_page_get_resolution(self.inner.as_ptr()) };
        dpi.max(0) as u32
    }
}

impl PageJob for DecodedPage {
    fn size(&self) -> (u32, u32) {
        // SAFETY: the page is live.
        let (w, h) = unsafe {
            (
                ffi::ddjvu_page_get_width(self.inner.as_ptr()),
                ffi::ddjvu_page_get_height(self.inner.as_ptr()),
            )
        };
        (w.max(0) as u32, h.max(0) as u32)
    }

    fn page_type(&self) -> PageType {
        // SAFETY: the page is live.
        match unsafe { ffi::ddjvu_page_get_type(self.inner.as_ptr()) } {
            ffi::DDJVU_PAGETYPE_BITONAL => PageType::Bitonal,
            ffi::DDJVU_PAGETYPE_PHOTO => PageType::Photo,
            ffi::DDJVU_PAGETYPE_COMPOUND => PageType::Compound,
            _ => PageType::Unknown,
        }
    }

    fn render(
        &self,
        mode: RenderMode,
        page_rect: Rect,
        render_rect: Rect,
        format: &PixelFormat,
        buffer: &mut [u8],
    ) -> Result<(), RenderError> {
        let row_size = format.row_size(render_rect.w);
        let needed = row_size
            .checked_mul(render_rect.h as usize)
            .ok_or_else(|| RenderError::Failed("render rectangle is too large".into()))?;
        if buffer.len() < needed {
            return Err(RenderError::Failed(format!(
                "pixel buffer holds {} bytes, {} needed",
                buffer.len(),
                needed
            )));
        }
        let row_size = c_ulong::try_from(row_size)
            .map_err(|_| RenderError::Failed("row size exceeds c_ulong".into()))?;

        let format = FormatHandle::new(format)?;
        let page_rect = to_ffi_rect(page_rect);
        let render_rect = to_ffi_rect(render_rect);

        // SAFETY: the page and format are live, the rects outlive the call,
        // and `buffer` holds at least `row_size * render_rect.h` bytes.
        let rendered = unsafe {
            ffi::ddjvu_page_render(
                self.inner.as_ptr(),
                to_ffi_mode(mode),
                &page_rect,
                &render_rect,
                format.as_ptr(),
                row_size,
                buffer.as_mut_ptr() as *mut c_char,
            )
        };
        self.inner.ctx().pump(false);

        if rendered == 0 {
            return Err(RenderError::NotAvailable);
        }
        Ok(())
    }
}

// ── Pixel format ─────────────────────────────────────────────────────────

struct FormatHandle {
    raw: NonNull<ffi::ddjvu_format_t>,
}

impl FormatHandle {
    fn new(format: &PixelFormat) -> Result<Self, RenderError> {
        let style = match format.style {
            PixelStyle::Rgb24 {
                byte_order: ByteOrder::Rgb,
            } => ffi::DDJVU_FORMAT_RGB24,
            PixelStyle::Rgb24 {
                byte_order: ByteOrder::Bgr,
            } => ffi::DDJVU_FORMAT_BGR24,
            PixelStyle::PackedBits {
                bit_order: BitOrder::MsbFirst,
            } => ffi::DDJVU_FORMAT_MSBTOLSB,
            PixelStyle::PackedBits {
                bit_order: BitOrder::LsbFirst,
            } => ffi::DDJVU_FORMAT_LSBTOMSB,
        };
        // SAFETY: these styles take no extra arguments.
        let raw = unsafe { ffi::ddjvu_format_create(style, 0, std::ptr::null_mut()) };
        let raw = NonNull::new(raw)
            .ok_or_else(|| RenderError::Failed("ddjvu_format_create returned null".into()))?;
        // SAFETY: `raw` was just created.
        unsafe {
            ffi::ddjvu_format_set_row_order(raw.as_ptr(), format.rows_top_to_bottom as c_int);
            ffi::ddjvu_format_set_y_direction(raw.as_ptr(), format.y_top_to_bottom as c_int);
        }
        Ok(Self { raw })
    }

    fn as_ptr(&self) -> *const ffi::ddjvu_format_t {
        self.raw.as_ptr()
    }
}

impl Drop for FormatHandle {
    fn drop(&mut self) {
        // SAFETY: created by `ddjvu_format_create` and not shared.
        unsafe { ffi::ddjvu_format_release(self.raw.as_ptr()) }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn to_ffi_rect(r: Rect) -> ffi::ddjvu_rect_t {
    ffi::ddjvu_rect_t {
        x: r.x,
        y: r.y,
        w: r.w,
        h: r.h,
    }
}

fn to_ffi_mode(mode: RenderMode) -> ffi::ddjvu_render_mode_t {
    match mode {
        RenderMode::Color => ffi::DDJVU_RENDER_COLOR,
        RenderMode::Black => ffi::DDJVU_RENDER_BLACK,
        RenderMode::ColorOnly => ffi::DDJVU_RENDER_COLORONLY,
        RenderMode::MaskOnly => ffi::DDJVU_RENDER_MASKONLY,
        RenderMode::Background => ffi::DDJVU_RENDER_BACKGROUND,
        RenderMode::Foreground => ffi::DDJVU_RENDER_FOREGROUND,
    }
}

/// Copy a library-owned C string, tolerating null and invalid UTF-8.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string.
unsafe fn c_str_lossy(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    CStr::from_ptr(ptr).to_string_lossy().into_owned()
}
