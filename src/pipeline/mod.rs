//! Pipeline stages for DjVu page export.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the decoder backend can change without touching
//! the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ decode ──▶ render ──▶ encode ──▶ file
//! (path)   (backend)  (buffer)   (TIFF/JPEG)
//! ```
//!
//! 1. [`input`]  - validate the user-supplied path and DjVu magic bytes
//! 2. [`render`] - decode a page and rasterise it into a [`crate::PageImage`];
//!    blocking, the decoder runs on the calling thread
//! 3. [`encode`] - compress the page with the codec matching its mode

pub mod encode;
pub mod input;
pub mod render;
