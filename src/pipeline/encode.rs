//! Image encoding: [`PageImage`] → compressed bytes ready to be written.
//!
//! Each mode has a preferred codec: bitonal scans compress best as TIFF,
//! photos and compound pages as JPEG. When the preferred codec was not
//! compiled into `image` the page is saved as PNG instead, which is
//! lossless and always available but larger.

use crate::codec::{Codec, CodecProbe};
use crate::page_image::PageImage;
use image::{DynamicImage, ImageResult};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::{debug, warn};

/// Output format for exported pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// TIFF for bitonal pages, JPEG for the rest. (default)
    #[default]
    Auto,
    Tiff,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// The codec this format asks for when encoding a page of `image`'s mode.
    pub fn codec_for(self, image: &PageImage) -> Codec {
        match self {
            OutputFormat::Auto => image.mode().codec(),
            OutputFormat::Tiff => Codec::Tiff,
            OutputFormat::Jpeg => Codec::Jpeg,
            OutputFormat::Png => Codec::Png,
        }
    }
}

/// Options for [`encode_page`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    pub format: OutputFormat,
    /// JPEG quality, 1–100. Default: 85.
    pub jpeg_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: OutputFormat::Auto,
            jpeg_quality: 85,
        }
    }
}

/// An encoded page and the codec that produced it.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub bytes: Vec<u8>,
    pub codec: Codec,
}

impl EncodedPage {
    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }
}

/// Encode a rasterised page.
///
/// Falls back to PNG when the requested codec is unavailable. The fallback
/// is only logged at warn level when the format was requested explicitly;
/// for [`OutputFormat::Auto`] the rasteriser has already warned about it.
pub fn encode_page(
    page: &PageImage,
    options: &EncodeOptions,
    codecs: &dyn CodecProbe,
) -> ImageResult<EncodedPage> {
    let wanted = options.format.codec_for(page);
    let codec = if wanted == Codec::Png || codecs.supports(wanted) {
        wanted
    } else {
        if options.format == OutputFormat::Auto {
            debug!("{} codec unavailable, saving page as PNG", wanted);
        } else {
            warn!("{} codec unavailable, saving page as PNG instead", wanted);
        }
        Codec::Png
    };

    let image = page.to_dynamic();
    let bytes = match codec {
        Codec::Jpeg => encode_jpeg(&image, options.jpeg_quality)?,
        Codec::Tiff | Codec::Png => write_format(&image, codec)?,
    };

    debug!(
        "Encoded {}x{} page → {} bytes {}",
        image.width(),
        image.height(),
        bytes.len(),
        codec
    );

    Ok(EncodedPage { bytes, codec })
}

fn write_format(image: &DynamicImage, codec: Codec) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), codec.image_format())?;
    Ok(buf)
}

#[cfg(feature = "jpeg")]
fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
    image.write_with_encoder(encoder)?;
    Ok(buf)
}

#[cfg(not(feature = "jpeg"))]
fn encode_jpeg(image: &DynamicImage, _quality: u8) -> ImageResult<Vec<u8>> {
    write_format(image, Codec::Jpeg)
}
