//! # retrobitmaps
//!
//! Decoder and encoder for the legacy raster formats: Windows/OS/2 BMP, the
//! Netpbm family (PBM/PGM/PPM, ASCII and binary), X11 bitmap (XBM), X11
//! pixmap (XPM v1 and v3), and X Window Dump (XWD).
//!
//! Every decoder materializes into one canonical model, [`Bitmap`]:
//! non-premultiplied 32-bit ARGB words with derived transparency flags.
//! Encoders read that model back out: BMP (indexed when the image quantizes
//! to 256 colors or fewer, 24-bit otherwise), binary PPM and PBM, and raw
//! 4-channel or packed-index dumps.
//!
//! ## Supported formats
//!
//! | Format | Decode | Encode |
//! |--------|--------|--------|
//! | BMP    | all five DIB header sizes, indexed/RGB/BITFIELDS, both row orders | indexed (1/4/8 bpp) or 24-bit |
//! | Netpbm | P1–P6 | P6 (PPM), P4 (PBM) |
//! | XBM    | yes, with name and hotspot | — |
//! | XPM    | v1 and v3 | — |
//! | XWD    | 1/4/8/16/32 bpp | — |
//! | raw    | — | RGBA/BGRA/ARGB/ABGR, packed indexed |
//!
//! BMP run-length compression, PNG/GIF/JPEG, and color-space handling from
//! BMP v4/v5 headers are out of scope.
//!
//! ## Usage
//!
//! ```no_run
//! use retrobitmaps::*;
//! use enough::Unstoppable;
//!
//! # fn demo(data: &[u8]) -> Result<(), BitmapError> {
//! // Decode any supported format (detected from its magic)
//! let bitmap = decode(data, Unstoppable)?;
//!
//! // Re-encode as PPM and BMP
//! let ppm = encode_ppm(&bitmap, Unstoppable)?;
//! let bmp = encode_bmp(&bitmap, Unstoppable)?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

mod bitmap;
mod bmp;
mod csource;
mod error;
mod indexed;
mod limits;
mod netpbm;
mod pixel;
mod raw;
mod reader;
mod rows;
mod xbm;
mod xpm;
mod xwd;

use alloc::vec::Vec;

pub use bitmap::{Bitmap, Hotspot, IndexedBitmap};
pub use bmp::BmpImage;
pub use enough::{Stop, Unstoppable};
pub use error::BitmapError;
pub use indexed::{convert_bitmap_to_indexed, image_depth};
pub use limits::Limits;
pub use pixel::{convert_row, PixelLayout, RowLayout, NATIVE_LAYOUT};
pub use pixel::{Abgr, Argb, Bgr, Bgra, Gray, Native, Rgb, Rgba};
pub use rows::{bitfield_convert_row, pack_mask_row, pack_row, unpack_row};
pub use xbm::XbmImage;
pub use xpm::lookup_color;
pub use xwd::XwdImage;

/// 16-bit-per-channel palette color (the X11 color convention).
pub use rgb::RGB16;

/// Image format detected from magic bytes.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Windows or OS/2 BMP (`BM`).
    Bmp,
    /// Netpbm family: P1 through P6.
    Netpbm,
    /// X11 bitmap (C source with `#define` metadata).
    Xbm,
    /// X11 pixmap, v1 or v3.
    Xpm,
    /// X Window Dump, file version 7.
    Xwd,
}

// ── Format detection ──────────────────────────────────────────────────

/// Detect image format from magic bytes.
///
/// Returns `None` if the data doesn't look like any supported format. The
/// two C-source formats share a `#define` opening; data mentioning an XPM
/// marker (`_ncolors`, `_chars_per_pixel` or a `_colors[]` array) classifies
/// as XPM, other define-led data as XBM.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    if data.len() >= 2 && data[0] == b'B' && data[1] == b'M' {
        return Some(ImageFormat::Bmp);
    }
    if data.len() >= 2 && data[0] == b'P' && (b'1'..=b'6').contains(&data[1]) {
        return Some(ImageFormat::Netpbm);
    }
    if data.starts_with(b"/* XPM") {
        return Some(ImageFormat::Xpm);
    }
    if data.len() >= 8 {
        let header_size = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
        let version = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        if version == 7 && (100..=356).contains(&header_size) {
            return Some(ImageFormat::Xwd);
        }
    }
    if data.starts_with(b"#define") {
        let is_xpm = [b"_ncolors".as_slice(), b"_chars_per_pixel", b"_colors[]"]
            .iter()
            .any(|marker| csource::find_subslice(data, marker).is_some());
        return Some(if is_xpm {
            ImageFormat::Xpm
        } else {
            ImageFormat::Xbm
        });
    }
    None
}

// ── Auto-detect decode ───────────────────────────────────────────────

/// Decode any supported format, auto-detected from magic bytes.
///
/// Per-format entry points ([`decode_bmp`], [`decode_xbm`], [`decode_xwd`])
/// additionally return format extras (hotspot, name); this dispatcher
/// returns the bare bitmap.
pub fn decode(data: &[u8], stop: impl Stop) -> Result<Bitmap, BitmapError> {
    decode_dispatch(data, None, &stop)
}

/// Decode any supported format with resource limits.
pub fn decode_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<Bitmap, BitmapError> {
    decode_dispatch(data, Some(limits), &stop)
}

fn decode_dispatch(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bitmap, BitmapError> {
    match detect_format(data) {
        Some(ImageFormat::Bmp) => Ok(bmp::decode_bmp(data, limits, stop)?.bitmap),
        Some(ImageFormat::Netpbm) => netpbm::decode_netpbm(data, limits, stop),
        Some(ImageFormat::Xbm) => Ok(xbm::decode_xbm(data, limits, stop)?.bitmap),
        Some(ImageFormat::Xpm) => xpm::decode_xpm(data, limits, stop),
        Some(ImageFormat::Xwd) => Ok(xwd::decode_xwd(data, limits, stop)?.bitmap),
        None => Err(BitmapError::UnsupportedFormat(
            "no recognizable image magic".into(),
        )),
    }
}

// ── BMP ──────────────────────────────────────────────────────────────

/// Decode a BMP, returning the bitmap and the cursor hotspot carried in the
/// file header's reserved fields.
pub fn decode_bmp(data: &[u8], stop: impl Stop) -> Result<BmpImage, BitmapError> {
    bmp::decode_bmp(data, None, &stop)
}

/// Decode a BMP with resource limits.
pub fn decode_bmp_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<BmpImage, BitmapError> {
    bmp::decode_bmp(data, Some(limits), &stop)
}

/// Encode as BMP. Images with at most 256 distinct opaque colors are
/// written indexed (1, 4 or 8 bpp); everything else as 24-bit RGB. Rows
/// are written bottom-up. The returned vector's length is the byte count
/// written.
pub fn encode_bmp(bitmap: &Bitmap, stop: impl Stop) -> Result<Vec<u8>, BitmapError> {
    bmp::encode_bmp(bitmap, &stop)
}

// ── Netpbm ───────────────────────────────────────────────────────────

/// Decode any Netpbm image (P1 through P6).
pub fn decode_netpbm(data: &[u8], stop: impl Stop) -> Result<Bitmap, BitmapError> {
    netpbm::decode_netpbm(data, None, &stop)
}

/// Decode any Netpbm image with resource limits.
pub fn decode_netpbm_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<Bitmap, BitmapError> {
    netpbm::decode_netpbm(data, Some(limits), &stop)
}

/// Encode as binary PPM (P6). Alpha is dropped.
pub fn encode_ppm(bitmap: &Bitmap, stop: impl Stop) -> Result<Vec<u8>, BitmapError> {
    netpbm::encode_ppm(bitmap, &stop)
}

/// Encode as binary PBM (P4): a 1-bit mask with bit 1 where the pixel's
/// alpha-weighted channel average is non-zero, matching the decoder's
/// bit-1-is-white orientation.
pub fn encode_pbm(bitmap: &Bitmap, stop: impl Stop) -> Result<Vec<u8>, BitmapError> {
    netpbm::encode_pbm(bitmap, &stop)
}

// ── X family ─────────────────────────────────────────────────────────

/// Decode an XBM, returning the bitmap, the define name, and the hotspot.
pub fn decode_xbm(data: &[u8], stop: impl Stop) -> Result<XbmImage, BitmapError> {
    xbm::decode_xbm(data, None, &stop)
}

/// Decode an XBM with resource limits.
pub fn decode_xbm_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<XbmImage, BitmapError> {
    xbm::decode_xbm(data, Some(limits), &stop)
}

/// Decode an XPM (v1 or v3).
pub fn decode_xpm(data: &[u8], stop: impl Stop) -> Result<Bitmap, BitmapError> {
    xpm::decode_xpm(data, None, &stop)
}

/// Decode an XPM with resource limits.
pub fn decode_xpm_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<Bitmap, BitmapError> {
    xpm::decode_xpm(data, Some(limits), &stop)
}

/// Decode an XWD, returning the bitmap and the dumped window's name.
pub fn decode_xwd(data: &[u8], stop: impl Stop) -> Result<XwdImage, BitmapError> {
    xwd::decode_xwd(data, None, &stop)
}

/// Decode an XWD with resource limits.
pub fn decode_xwd_with_limits(
    data: &[u8],
    limits: &Limits,
    stop: impl Stop,
) -> Result<XwdImage, BitmapError> {
    xwd::decode_xwd(data, Some(limits), &stop)
}

// ── Raw export ───────────────────────────────────────────────────────

/// Emit headerless 4-byte pixels, top-down, no padding. `layout` must be
/// one of the alpha layouts (RGBA, BGRA, ARGB, ABGR).
pub fn encode_raw_true_color(
    bitmap: &Bitmap,
    layout: PixelLayout,
    stop: impl Stop,
) -> Result<Vec<u8>, BitmapError> {
    raw::encode_raw_true_color(bitmap, layout, &stop)
}

/// Quantize and emit headerless packed palette indices, MSB-first, at the
/// smallest depth (1, 2, 4 or 8 bpp) holding the palette.
pub fn encode_raw_indexed(bitmap: &Bitmap, stop: impl Stop) -> Result<Vec<u8>, BitmapError> {
    raw::encode_raw_indexed(bitmap, &stop)
}
