//! XBM (X11 bitmap) decoder.
//!
//! XBM files are C source: `#define` lines carry the dimensions and an
//! optional hotspot, then an `unsigned char <name>_bits[] = { ... }` array
//! holds the pixels, 8 per byte, LSB first. Bit 0 decodes to opaque black,
//! bit 1 to opaque white.

mod decode;

pub(crate) use decode::decode_xbm;

use alloc::string::String;

use crate::bitmap::{Bitmap, Hotspot};

/// A decoded XBM: the bitmap, the identifier the defines shared, and the
/// hotspot (defaulting to the image center).
#[derive(Clone, Debug)]
pub struct XbmImage {
    pub bitmap: Bitmap,
    pub name: String,
    pub hotspot: Hotspot,
}
