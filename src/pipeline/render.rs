//! Page rasterisation: render one decoded DjVu page into a [`PageImage`].
//!
//! The decoder fills a caller-owned byte buffer; this module picks the pixel
//! format, sizes the buffer, and interprets the bytes afterwards. The buffer
//! is always sized for RGB (3 bytes per pixel), the worst case, so it is
//! large enough whichever format the page ends up rendered with.
//!
//! ## Bitonal polarity
//!
//! DjVuLibre's packed-bits format sets a bit for a **black** pixel, while
//! mode `"1"` images set it for **white**. Every bitonal render is therefore
//! inverted before it is returned. This is a fixed requirement, see
//! <https://github.com/kcroker/dpsprep/issues/16>.
//!
//! ## Recoverable conditions
//!
//! Two conditions are reported as warnings and never fail the call:
//!
//! * the codec matching the page's mode is not compiled in (saving will
//!   compress worse, rasterising is unaffected);
//! * the decoder reports the page data as unavailable, in which case a
//!   blank white bitonal page of the declared size is returned.
//!
//! Every other decoder error propagates as [`RasterError::Render`].

use crate::codec::{BuiltinCodecs, CodecProbe};
use crate::decoder::{DjvuPage, PageJob, Rect, RenderMode};
use crate::error::{RasterError, RenderError};
use crate::page_image::{BitonalImage, PageImage};
use crate::pixel::{ImageMode, RGB_FORMAT};
use image::RgbImage;
use tracing::{debug, warn};

/// Rasterise a decoded page.
///
/// `index` is the zero-based page number and is only used in diagnostics.
pub fn rasterize<J>(job: &J, index: usize) -> Result<PageImage, RasterError>
where
    J: PageJob + ?Sized,
{
    rasterize_with(job, index, &BuiltinCodecs)
}

/// [`rasterize`] with an explicit codec probe.
pub fn rasterize_with<J>(
    job: &J,
    index: usize,
    codecs: &dyn CodecProbe,
) -> Result<PageImage, RasterError>
where
    J: PageJob + ?Sized,
{
    let page = index + 1;
    let (width, height) = job.size();
    if width == 0 || height == 0 {
        return Err(RasterError::EmptyPage {
            page,
            width,
            height,
        });
    }

    let mode = ImageMode::for_page(job.page_type());

    // RGB at most
    let len = RGB_FORMAT
        .buffer_len(width, height)
        .ok_or(RasterError::PageTooLarge {
            page,
            width,
            height,
        })?;
    let mut buffer = vec![0u8; len];

    let codec = mode.codec();
    if !codecs.supports(codec) {
        match mode {
            ImageMode::Bitonal => warn!(
                page,
                %codec,
                "Bitonal image compression may suffer because the TIFF codec is not available"
            ),
            ImageMode::Multitone => warn!(
                page,
                %codec,
                "Multitonal image compression may suffer because the JPEG codec is not available"
            ),
        }
    }

    let rect = Rect::page(width, height);
    match job.render(
        RenderMode::Color,
        rect,
        rect,
        mode.pixel_format(),
        &mut buffer,
    ) {
        Ok(()) => {}
        Err(RenderError::NotAvailable) => {
            warn!(
                page,
                "DjVu decoder claims that data for page {} is not available. Producing a blank page.",
                page
            );
            return Ok(PageImage::Bitonal(BitonalImage::blank(width, height, true)));
        }
        Err(source) => return Err(RasterError::Render { page, source }),
    }

    let image = match mode {
        ImageMode::Bitonal => {
            let bits = BitonalImage::from_packed(width, height, buffer).ok_or_else(|| {
                RasterError::Internal(format!("bitonal buffer too small for page {page}"))
            })?;
            PageImage::Bitonal(bits.inverted())
        }
        ImageMode::Multitone => {
            let rgb = RgbImage::from_raw(width, height, buffer).ok_or_else(|| {
                RasterError::Internal(format!("RGB buffer too small for page {page}"))
            })?;
            PageImage::Rgb(rgb)
        }
    };

    debug!(
        "Rendered page {} → {}x{} px, mode {}",
        page,
        width,
        height,
        mode.name()
    );

    Ok(image)
}

/// Decode `page` (blocking until decoding finishes) and rasterise it.
pub fn rasterize_page<P>(page: &P, index: usize) -> Result<PageImage, RasterError>
where
    P: DjvuPage + ?Sized,
{
    rasterize_page_with(page, index, &BuiltinCodecs)
}

/// [`rasterize_page`] with an explicit codec probe.
pub fn rasterize_page_with<P>(
    page: &P,
    index: usize,
    codecs: &dyn CodecProbe,
) -> Result<PageImage, RasterError>
where
    P: DjvuPage + ?Sized,
{
    let job = page.decode(true).map_err(|source| RasterError::Render {
        page: index + 1,
        source,
    })?;
    rasterize_with(&job, index, codecs)
}
