//! Codec capability probe.
//!
//! Rasterised pages are later saved with a mode-specific codec: TIFF for
//! bitonal pages, JPEG for everything else. Which codecs exist depends on
//! how the `image` crate was built (see the `tiff` / `jpeg` features). A
//! missing codec never blocks rasterisation; it only degrades how well the
//! page compresses when saved.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A compression codec a page may be saved with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    Tiff,
    Jpeg,
    Png,
}

impl Codec {
    pub fn image_format(self) -> ImageFormat {
        match self {
            Codec::Tiff => ImageFormat::Tiff,
            Codec::Jpeg => ImageFormat::Jpeg,
            Codec::Png => ImageFormat::Png,
        }
    }

    /// File extension used for pages saved with this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Codec::Tiff => "tif",
            Codec::Jpeg => "jpg",
            Codec::Png => "png",
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::Tiff => "TIFF",
            Codec::Jpeg => "JPEG",
            Codec::Png => "PNG",
        })
    }
}

/// Answers whether the imaging backend can encode with a codec.
pub trait CodecProbe: Send + Sync {
    fn supports(&self, codec: Codec) -> bool;
}

/// Probe backed by the codecs compiled into the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCodecs;

impl CodecProbe for BuiltinCodecs {
    fn supports(&self, codec: Codec) -> bool {
        codec.image_format().writing_enabled()
    }
}

/// Shorthand for `BuiltinCodecs.supports(codec)`.
pub fn check_codec(codec: Codec) -> bool {
    BuiltinCodecs.supports(codec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_is_always_available() {
        assert!(check_codec(Codec::Png));
    }

    #[cfg(feature = "tiff")]
    #[test]
    fn tiff_feature_enables_codec() {
        assert!(check_codec(Codec::Tiff));
    }

    #[cfg(feature = "jpeg")]
    #[test]
    fn jpeg_feature_enables_codec() {
        assert!(check_codec(Codec::Jpeg));
    }

    #[test]
    fn extensions_and_names() {
        assert_eq!(Codec::Tiff.extension(), "tif");
        assert_eq!(Codec::Jpeg.extension(), "jpg");
        assert_eq!(Codec::Png.extension(), "png");
        assert_eq!(Codec::Tiff.to_string(), "TIFF");
    }
}
