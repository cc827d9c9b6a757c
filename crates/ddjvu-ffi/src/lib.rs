//! # ddjvu-ffi
//!
//! Raw declarations for the subset of the DjVuLibre `ddjvuapi.h` interface
//! needed to open a document, decode its pages and render them into a
//! caller-owned pixel buffer.
//!
//! All functions are `unsafe extern "C"` and call straight into
//! libdjvulibre with no Rust-side validation. Use the safe wrappers in
//! `djvu_raster::djvulibre` instead of calling these directly.
//!
//! ## Object lifetimes
//!
//! ```text
//! ddjvu_context_t ──owns──▶ message queue
//!      │
//!      └─▶ ddjvu_document_t ──▶ ddjvu_page_t
//! ```
//!
//! Every `*_create*` must be paired with the matching `*_release`. Pages
//! must be released before their document, documents before the context.
//!
//! Macros from the C header (`ddjvu_job_done`, `ddjvu_page_decoding_status`,
//! …) are not functions and are provided here as `#[inline]` Rust helpers.

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_int, c_uint, c_ulong};

// ── Opaque handles ───────────────────────────────────────────────────────────

#[repr(C)]
pub struct ddjvu_context_t {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ddjvu_document_t {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ddjvu_page_t {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ddjvu_job_t {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ddjvu_format_t {
    _private: [u8; 0],
}

// ── Enumerations ─────────────────────────────────────────────────────────────

pub type ddjvu_status_t = c_int;
pub const DDJVU_JOB_NOTSTARTED: ddjvu_status_t = 0;
pub const DDJVU_JOB_STARTED: ddjvu_status_t = 1;
pub const DDJVU_JOB_OK: ddjvu_status_t = 2;
pub const DDJVU_JOB_FAILED: ddjvu_status_t = 3;
pub const DDJVU_JOB_STOPPED: ddjvu_status_t = 4;

pub type ddjvu_page_type_t = c_int;
pub const DDJVU_PAGETYPE_UNKNOWN: ddjvu_page_type_t = 0;
pub const DDJVU_PAGETYPE_BITONAL: ddjvu_page_type_t = 1;
pub const DDJVU_PAGETYPE_PHOTO: ddjvu_page_type_t = 2;
pub const DDJVU_PAGETYPE_COMPOUND: ddjvu_page_type_t = 3;

pub type ddjvu_render_mode_t = c_int;
pub const DDJVU_RENDER_COLOR: ddjvu_render_mode_t = 0;
pub const DDJVU_RENDER_BLACK: ddjvu_render_mode_t = 1;
pub const DDJVU_RENDER_COLORONLY: ddjvu_render_mode_t = 2;
pub const DDJVU_RENDER_MASKONLY: ddjvu_render_mode_t = 3;
pub const DDJVU_RENDER_BACKGROUND: ddjvu_render_mode_t = 4;
pub const DDJVU_RENDER_FOREGROUND: ddjvu_render_mode_t = 5;

pub type ddjvu_format_style_t = c_int;
pub const DDJVU_FORMAT_BGR24: ddjvu_format_style_t = 0;
pub const DDJVU_FORMAT_RGB24: ddjvu_format_style_t = 1;
pub const DDJVU_FORMAT_RGBMASK16: ddjvu_format_style_t = 2;
pub const DDJVU_FORMAT_RGBMASK32: ddjvu_format_style_t = 3;
pub const DDJVU_FORMAT_GREY8: ddjvu_format_style_t = 4;
pub const DDJVU_FORMAT_PALETTE8: ddjvu_format_style_t = 5;
pub const DDJVU_FORMAT_MSBTOLSB: ddjvu_format_style_t = 6;
pub const DDJVU_FORMAT_LSBTOMSB: ddjvu_format_style_t = 7;

pub type ddjvu_message_tag_t = c_int;
pub const DDJVU_ERROR: ddjvu_message_tag_t = 0;
pub const DDJVU_INFO: ddjvu_message_tag_t = 1;
pub const DDJVU_NEWSTREAM: ddjvu_message_tag_t = 2;
pub const DDJVU_DOCINFO: ddjvu_message_tag_t = 3;
pub const DDJVU_PAGEINFO: ddjvu_message_tag_t = 4;
pub const DDJVU_RELAYOUT: ddjvu_message_tag_t = 5;
pub const DDJVU_REDISPLAY: ddjvu_message_tag_t = 6;
pub const DDJVU_CHUNK: ddjvu_message_tag_t = 7;
pub const DDJVU_THUMBNAIL: ddjvu_message_tag_t = 8;
pub const DDJVU_PROGRESS: ddjvu_message_tag_t = 9;

// ── Structures ───────────────────────────────────────────────────────────────

/// Rectangle in page or render coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ddjvu_rect_t {
    pub x: c_int,
    pub y: c_int,
    pub w: c_uint,
    pub h: c_uint,
}

/// Header shared by every message variant.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ddjvu_message_any_t {
    pub tag: ddjvu_message_tag_t,
    pub context: *mut ddjvu_context_t,
    pub document: *mut ddjvu_document_t,
    pub page: *mut ddjvu_page_t,
    pub job: *mut ddjvu_job_t,
}

/// `DDJVU_ERROR` payload. All strings are owned by the library and only
/// valid until the message is popped.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ddjvu_message_error_t {
    pub any: ddjvu_message_any_t,
    pub message: *const c_char,
    pub function: *const c_char,
    pub filename: *const c_char,
    pub lineno: c_int,
}

/// `DDJVU_INFO` payload.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ddjvu_message_info_t {
    pub any: ddjvu_message_any_t,
    pub message: *const c_char,
}

/// Message union. Only the variants read by the safe wrappers are declared;
/// values of this type are only ever accessed through library-owned pointers.
#[repr(C)]
pub union ddjvu_message_t {
    pub m_any: ddjvu_message_any_t,
    pub m_error: ddjvu_message_error_t,
    pub m_info: ddjvu_message_info_t,
}

// ── Functions ────────────────────────────────────────────────────────────────

extern "C" {
    /// Version of the DjVuLibre API implemented by the linked library.
    pub fn ddjvu_code_get_version() -> c_int;

    /// Create a decoding context. `programname` may be null.
    pub fn ddjvu_context_create(programname: *const c_char) -> *mut ddjvu_context_t;

    pub fn ddjvu_context_release(context: *mut ddjvu_context_t);

    /// Return the next pending message without removing it, or null.
    pub fn ddjvu_message_peek(context: *mut ddjvu_context_t) -> *mut ddjvu_message_t;

    /// Block until a message is available and return it without removing it.
    pub fn ddjvu_message_wait(context: *mut ddjvu_context_t) -> *mut ddjvu_message_t;

    /// Remove the message returned by the last peek/wait.
    pub fn ddjvu_message_pop(context: *mut ddjvu_context_t);

    pub fn ddjvu_job_status(job: *mut ddjvu_job_t) -> ddjvu_status_t;

    /// Open a document from a UTF-8 file name. Decoding proceeds
    /// asynchronously; wait on the document job before querying pages.
    pub fn ddjvu_document_create_by_filename_utf8(
        context: *mut ddjvu_context_t,
        filename: *const c_char,
        cache: c_int,
    ) -> *mut ddjvu_document_t;

    pub fn ddjvu_document_job(document: *mut ddjvu_document_t) -> *mut ddjvu_job_t;

    pub fn ddjvu_document_release(document: *mut ddjvu_document_t);

    pub fn ddjvu_document_get_pagenum(document: *mut ddjvu_document_t) -> c_int;

    pub fn ddjvu_page_create_by_pageno(
        document: *mut ddjvu_document_t,
        pageno: c_int,
    ) -> *mut ddjvu_page_t;

    pub fn ddjvu_page_job(page: *mut ddjvu_page_t) -> *mut ddjvu_job_t;

    pub fn ddjvu_page_release(page: *mut ddjvu_page_t);

    pub fn ddjvu_page_get_width(page: *mut ddjvu_page_t) -> c_int;

    pub fn ddjvu_page_get_height(page: *mut ddjvu_page_t) -> c_int;

    pub fn ddjvu_page_get_resolution(page: *mut ddjvu_page_t) -> c_int;

    pub fn ddjvu_page_get_type(page: *mut ddjvu_page_t) -> ddjvu_page_type_t;

    /// Render a segment of the page into `imagebuffer`.
    ///
    /// Returns 0 when the data needed for rendering is not yet available
    /// (the buffer is left untouched), non-zero on success.
    pub fn ddjvu_page_render(
        page: *mut ddjvu_page_t,
        mode: ddjvu_render_mode_t,
        pagerect: *const ddjvu_rect_t,
        renderrect: *const ddjvu_rect_t,
        pixelformat: *const ddjvu_format_t,
        rowsize: c_ulong,
        imagebuffer: *mut c_char,
    ) -> c_int;

    /// Create a pixel format. The styles used by this crate take no
    /// extra arguments: pass `nargs = 0` and a null `args`.
    pub fn ddjvu_format_create(
        style: ddjvu_format_style_t,
        nargs: c_int,
        args: *mut c_uint,
    ) -> *mut ddjvu_format_t;

    pub fn ddjvu_format_set_row_order(format: *mut ddjvu_format_t, top_to_bottom: c_int);

    pub fn ddjvu_format_set_y_direction(format: *mut ddjvu_format_t, top_to_bottom: c_int);

    pub fn ddjvu_format_release(format: *mut ddjvu_format_t);
}

// ── Header macros ────────────────────────────────────────────────────────────

/// `ddjvu_job_done`: the job finished, successfully or not.
#[inline]
pub fn job_done(status: ddjvu_status_t) -> bool {
    status >= DDJVU_JOB_OK
}

/// `ddjvu_job_error`: the job failed or was stopped.
#[inline]
pub fn job_error(status: ddjvu_status_t) -> bool {
    status >= DDJVU_JOB_FAILED
}
