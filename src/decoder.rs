//! The decoder seam: what the rasteriser needs from a DjVu decoding library.
//!
//! The decoding itself (JB2, IW44, BZZ, chunk assembly) is owned by the
//! library behind these traits. The crate ships one backend, DjVuLibre
//! (see [`crate::djvulibre`], feature `djvulibre`); tests plug in
//! in-memory fakes.
//!
//! ```text
//! DjvuDocument ──page(i)──▶ DjvuPage ──decode(wait)──▶ PageJob ──render──▶ buffer
//! ```

use crate::error::RenderError;
use crate::pixel::PixelFormat;
use serde::{Deserialize, Serialize};

/// The type a decoder declares for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    /// Not known yet, or an unrecognised page kind.
    Unknown,
    /// Black-and-white page (a JB2 mask only).
    Bitonal,
    /// Continuous-tone page (IW44 only).
    Photo,
    /// Mask plus foreground/background layers.
    Compound,
}

/// Rendering hint passed to the decoder.
///
/// [`RenderMode::Color`] is the decoder's default; it does not force color
/// output, the pixel format decides that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Color,
    Black,
    ColorOnly,
    MaskOnly,
    Background,
    Foreground,
}

/// A rectangle in page or render coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// The full page rectangle `(0, 0, width, height)`.
    pub fn page(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            w: width,
            h: height,
        }
    }
}

/// A fully decoded page, ready to be rendered into a pixel buffer.
pub trait PageJob {
    /// Page size in pixels, `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// The page type declared by the decoder.
    fn page_type(&self) -> PageType;

    /// Render `render_rect` of the page, scaled from `page_rect`, into
    /// `buffer` using `format`.
    ///
    /// Rows are `format.row_size(render_rect.w)` bytes long. Implementations
    /// must return [`RenderError::NotAvailable`] when the page data is
    /// missing, and must not write past `buffer`.
    fn render(
        &self,
        mode: RenderMode,
        page_rect: Rect,
        render_rect: Rect,
        format: &PixelFormat,
        buffer: &mut [u8],
    ) -> Result<(), RenderError>;
}

/// A page handle that still has to be decoded.
pub trait DjvuPage {
    type Job: PageJob;

    /// Decode the page. With `wait = true` this blocks the calling thread
    /// until decoding has finished.
    fn decode(&self, wait: bool) -> Result<Self::Job, RenderError>;
}

/// An opened DjVu document.
pub trait DjvuDocument {
    type Page: DjvuPage;

    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Handle for the zero-based page `index`.
    fn page(&self, index: usize) -> Result<Self::Page, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_page_rect() {
        let r = Rect::page(2480, 3508);
        assert_eq!((r.x, r.y, r.w, r.h), (0, 0, 2480, 3508));
    }

    #[test]
    fn default_render_mode_is_color() {
        assert_eq!(RenderMode::default(), RenderMode::Color);
    }

    #[test]
    fn page_type_serialises_lowercase() {
        let json = serde_json::to_string(&PageType::Bitonal).expect("serialise");
        assert_eq!(json, "\"bitonal\"");
    }
}
