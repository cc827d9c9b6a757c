//! In-memory result of rasterising a page.
//!
//! Multitone pages are plain `image::RgbImage`s. Bitonal pages keep the
//! packed 1-bit layout (mode `"1"`): MSB first, each row padded to a whole
//! byte, a set bit meaning **white**. `image` has no 1-bit buffer type, so
//! [`BitonalImage`] carries the packed bytes and converts to 8-bit gray
//! only when encoding.

use crate::pixel::ImageMode;
use image::{DynamicImage, GrayImage, Luma, RgbImage};

/// A packed 1-bit black-and-white image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitonalImage {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl BitonalImage {
    /// Bytes per packed row.
    pub fn stride_for(width: u32) -> usize {
        (width as usize).div_ceil(8)
    }

    /// Interpret `data` as packed rows. Extra trailing bytes are dropped and
    /// their allocation released.
    ///
    /// Returns `None` if `data` is shorter than `stride * height`.
    pub fn from_packed(width: u32, height: u32, mut data: Vec<u8>) -> Option<Self> {
        let len = Self::stride_for(width).checked_mul(height as usize)?;
        if data.len() < len {
            return None;
        }
        data.truncate(len);
        data.shrink_to_fit();
        Some(Self {
            width,
            height,
            data,
        })
    }

    /// A solid image: all white when `white` is true, all black otherwise.
    pub fn blank(width: u32, height: u32, white: bool) -> Self {
        let fill = if white { 0xFF } else { 0x00 };
        Self {
            width,
            height,
            data: vec![fill; Self::stride_for(width) * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    /// Packed rows, `stride() * height()` bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Whether the pixel at `(x, y)` is white.
    ///
    /// # Panics
    /// If `(x, y)` is outside the image.
    pub fn get(&self, x: u32, y: u32) -> bool {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        let byte = self.data[y as usize * self.stride() + x as usize / 8];
        (byte >> (7 - (x % 8))) & 1 == 1
    }

    /// Flip every bit in place: white becomes black and black white.
    pub fn invert(&mut self) {
        for byte in &mut self.data {
            *byte = !*byte;
        }
    }

    pub fn inverted(mut self) -> Self {
        self.invert();
        self
    }

    /// Expand to 8-bit gray: white 255, black 0.
    pub fn to_luma8(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            Luma([if self.get(x, y) { 255 } else { 0 }])
        })
    }
}

/// A rasterised page in one of the two output modes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageImage {
    /// Mode `"RGB"`.
    Rgb(RgbImage),
    /// Mode `"1"`.
    Bitonal(BitonalImage),
}

impl PageImage {
    pub fn mode(&self) -> ImageMode {
        match self {
            PageImage::Rgb(_) => ImageMode::Multitone,
            PageImage::Bitonal(_) => ImageMode::Bitonal,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PageImage::Rgb(img) => img.dimensions(),
            PageImage::Bitonal(img) => (img.width(), img.height()),
        }
    }

    pub fn as_bitonal(&self) -> Option<&BitonalImage> {
        match self {
            PageImage::Bitonal(img) => Some(img),
            PageImage::Rgb(_) => None,
        }
    }

    pub fn as_rgb(&self) -> Option<&RgbImage> {
        match self {
            PageImage::Rgb(img) => Some(img),
            PageImage::Bitonal(_) => None,
        }
    }

    /// Convert for use with `image` encoders. Bitonal pages become `Luma8`.
    pub fn to_dynamic(&self) -> DynamicImage {
        match self {
            PageImage::Rgb(img) => DynamicImage::ImageRgb8(img.clone()),
            PageImage::Bitonal(img) => DynamicImage::ImageLuma8(img.to_luma8()),
        }
    }
}

impl From<PageImage> for DynamicImage {
    fn from(page: PageImage) -> Self {
        match page {
            PageImage::Rgb(img) => DynamicImage::ImageRgb8(img),
            PageImage::Bitonal(img) => DynamicImage::ImageLuma8(img.to_luma8()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_bits_are_msb_first() {
        // 10 px wide → 2 bytes per row; only the first pixel of row 0 is set.
        let img = BitonalImage::from_packed(10, 2, vec![0b1000_0000, 0, 0, 0b0100_0000])
            .expect("enough data");
        assert!(img.get(0, 0));
        assert!(!img.get(1, 0));
        assert!(img.get(9, 1));
        assert!(!img.get(8, 1));
    }

    #[test]
    fn from_packed_rejects_short_buffer_and_trims_long_one() {
        assert!(BitonalImage::from_packed(16, 2, vec![0; 3]).is_none());
        let img = BitonalImage::from_packed(16, 2, vec![0; 6 * 16 * 2]).expect("long enough");
        assert_eq!(img.as_bytes().len(), 4);
        assert!(img.into_bytes().capacity() <= 8);
    }

    #[test]
    fn invert_twice_is_identity() {
        let original = BitonalImage::from_packed(13, 3, vec![0x5A, 0x0F, 0xC3, 0x81, 0x00, 0xFF])
            .expect("enough data");
        let twice = original.clone().inverted().inverted();
        assert_eq!(original, twice);
    }

    #[test]
    fn invert_flips_every_pixel() {
        let original = BitonalImage::from_packed(5, 1, vec![0b1010_1000]).expect("enough data");
        let flipped = original.clone().inverted();
        for x in 0..5 {
            assert_ne!(original.get(x, 0), flipped.get(x, 0), "x={x}");
        }
    }

    #[test]
    fn blank_white_is_all_white() {
        let img = BitonalImage::blank(11, 4, true);
        assert!((0..4).all(|y| (0..11).all(|x| img.get(x, y))));
        let black = BitonalImage::blank(11, 4, false);
        assert!(!black.get(10, 3));
    }

    #[test]
    fn luma_expansion() {
        let img = BitonalImage::from_packed(2, 1, vec![0b0100_0000]).expect("enough data");
        let gray = img.to_luma8();
        assert_eq!(gray.get_pixel(0, 0).0, [0]);
        assert_eq!(gray.get_pixel(1, 0).0, [255]);
    }

    #[test]
    fn page_image_mode_and_size() {
        let rgb = PageImage::Rgb(RgbImage::new(4, 3));
        assert_eq!(rgb.mode(), ImageMode::Multitone);
        assert_eq!(rgb.dimensions(), (4, 3));
        assert!(rgb.as_bitonal().is_none());

        let bw = PageImage::Bitonal(BitonalImage::blank(9, 2, true));
        assert_eq!(bw.mode(), ImageMode::Bitonal);
        assert_eq!(bw.dimensions(), (9, 2));
        assert_eq!(bw.to_dynamic().as_luma8().map(|g| g.dimensions()), Some((9, 2)));
    }
}
