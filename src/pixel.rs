//! Pixel formats and the two output modes.
//!
//! Both descriptors are `static` values built at compile time, shared
//! read-only by every rasterisation call on every thread.

use crate::codec::Codec;
use crate::decoder::PageType;
use serde::{Deserialize, Serialize};

/// Channel order of a packed 24-bit pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Rgb,
    Bgr,
}

/// Bit order of a packed 1-bit row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOrder {
    /// Leftmost pixel in the most significant bit.
    MsbFirst,
    LsbFirst,
}

/// How pixels are packed into the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelStyle {
    /// Three bytes per pixel.
    Rgb24 { byte_order: ByteOrder },
    /// One bit per pixel, rows padded to a whole byte.
    PackedBits { bit_order: BitOrder },
}

/// Tells the decoder how to lay out pixels in the render buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelFormat {
    pub style: PixelStyle,
    /// First row in the buffer is the top of the image.
    pub rows_top_to_bottom: bool,
    /// Direction of the y axis in the rectangles passed to `render`.
    pub y_top_to_bottom: bool,
}

impl PixelFormat {
    pub const fn rgb(byte_order: ByteOrder) -> Self {
        Self {
            style: PixelStyle::Rgb24 { byte_order },
            rows_top_to_bottom: true,
            y_top_to_bottom: false,
        }
    }

    pub const fn packed_bits(bit_order: BitOrder) -> Self {
        Self {
            style: PixelStyle::PackedBits { bit_order },
            rows_top_to_bottom: true,
            y_top_to_bottom: false,
        }
    }

    /// Bytes in one row of `width` pixels.
    pub fn row_size(&self, width: u32) -> usize {
        let width = width as usize;
        match self.style {
            PixelStyle::Rgb24 { .. } => width * 3,
            PixelStyle::PackedBits { .. } => width.div_ceil(8),
        }
    }

    /// Bytes needed for a `width` × `height` image, or `None` on overflow.
    pub fn buffer_len(&self, width: u32, height: u32) -> Option<usize> {
        let width = width as usize;
        let row = match self.style {
            PixelStyle::Rgb24 { .. } => width.checked_mul(3)?,
            PixelStyle::PackedBits { .. } => width.div_ceil(8),
        };
        row.checked_mul(height as usize)
    }
}

/// Packed RGB, top row first.
pub static RGB_FORMAT: PixelFormat = PixelFormat::rgb(ByteOrder::Rgb);

/// Packed 1-bit, MSB first, top row first.
pub static BITONAL_FORMAT: PixelFormat = PixelFormat::packed_bits(BitOrder::MsbFirst);

/// Color mode of a rasterised page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// 1 bit per pixel, black and white.
    Bitonal,
    /// 8-bit RGB.
    Multitone,
}

impl ImageMode {
    /// Bitonal pages render as bitonal; every other page type as RGB.
    pub fn for_page(page_type: PageType) -> Self {
        match page_type {
            PageType::Bitonal => ImageMode::Bitonal,
            PageType::Unknown | PageType::Photo | PageType::Compound => ImageMode::Multitone,
        }
    }

    /// Conventional mode name: `"1"` or `"RGB"`.
    pub fn name(self) -> &'static str {
        match self {
            ImageMode::Bitonal => "1",
            ImageMode::Multitone => "RGB",
        }
    }

    /// The pixel format the decoder renders this mode with.
    pub fn pixel_format(self) -> &'static PixelFormat {
        match self {
            ImageMode::Bitonal => &BITONAL_FORMAT,
            ImageMode::Multitone => &RGB_FORMAT,
        }
    }

    /// The codec pages of this mode are best saved with.
    pub fn codec(self) -> Codec {
        match self {
            ImageMode::Bitonal => Codec::Tiff,
            ImageMode::Multitone => Codec::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_selection_is_binary() {
        assert_eq!(ImageMode::for_page(PageType::Bitonal), ImageMode::Bitonal);
        assert_eq!(ImageMode::for_page(PageType::Photo), ImageMode::Multitone);
        assert_eq!(ImageMode::for_page(PageType::Compound), ImageMode::Multitone);
        assert_eq!(ImageMode::for_page(PageType::Unknown), ImageMode::Multitone);
    }

    #[test]
    fn mode_tables() {
        assert_eq!(ImageMode::Bitonal.name(), "1");
        assert_eq!(ImageMode::Multitone.name(), "RGB");
        assert_eq!(*ImageMode::Bitonal.pixel_format(), BITONAL_FORMAT);
        assert_eq!(*ImageMode::Multitone.pixel_format(), RGB_FORMAT);
        assert_eq!(ImageMode::Bitonal.codec(), Codec::Tiff);
        assert_eq!(ImageMode::Multitone.codec(), Codec::Jpeg);
    }

    #[test]
    fn static_formats_are_top_to_bottom() {
        assert!(RGB_FORMAT.rows_top_to_bottom);
        assert!(BITONAL_FORMAT.rows_top_to_bottom);
        assert!(!RGB_FORMAT.y_top_to_bottom);
        assert!(!BITONAL_FORMAT.y_top_to_bottom);
    }

    #[test]
    fn row_sizes() {
        assert_eq!(RGB_FORMAT.row_size(10), 30);
        assert_eq!(BITONAL_FORMAT.row_size(8), 1);
        assert_eq!(BITONAL_FORMAT.row_size(9), 2);
        assert_eq!(BITONAL_FORMAT.row_size(1), 1);
    }

    #[test]
    fn rgb_buffer_covers_bitonal() {
        for (w, h) in [(1, 1), (7, 3), (2550, 3300)] {
            let rgb = RGB_FORMAT.buffer_len(w, h).expect("fits");
            let bits = BITONAL_FORMAT.buffer_len(w, h).expect("fits");
            assert_eq!(rgb, 3 * w as usize * h as usize);
            assert!(rgb >= bits);
        }
    }

    #[test]
    fn buffer_len_overflow() {
        assert_eq!(RGB_FORMAT.buffer_len(u32::MAX, u32::MAX), None);
    }
}
