//! The canonical in-memory image model.
//!
//! Every decoder materializes into a [`Bitmap`]: non-premultiplied 32-bit
//! ARGB, stored as host-endian `u32` words so a word always reads as
//! `0xAARRGGBB`. Viewed byte-by-byte that is BGRA on little-endian hosts and
//! ARGB on big-endian hosts — the `Native` row layout of [`crate::pixel`].

use alloc::vec;
use alloc::vec::Vec;

use rgb::RGB16;

use crate::error::BitmapError;

/// The focal pixel of a cursor image (BMP reserved fields, XBM `_x_hot`/`_y_hot`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hotspot {
    pub x: i32,
    pub y: i32,
}

/// A non-premultiplied 32-bit ARGB image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    data: Vec<u32>,
    has_transparency: bool,
    has_alpha: bool,
}

impl Bitmap {
    /// Allocate a zeroed `width` x `height` bitmap.
    ///
    /// Fails with [`BitmapError::OutOfRangeValue`] for empty dimensions and
    /// [`BitmapError::OutOfMemory`] when the pixel count overflows.
    pub fn new(width: u32, height: u32) -> Result<Self, BitmapError> {
        if width == 0 || height == 0 {
            return Err(BitmapError::OutOfRangeValue(alloc::format!(
                "bitmap dimensions {width}x{height} must be non-zero"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .filter(|len| len.checked_mul(4).is_some())
            .ok_or(BitmapError::OutOfMemory)?;
        Ok(Self {
            width,
            height,
            data: vec![0u32; len],
            has_transparency: false,
            has_alpha: false,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row. Always `width * 4`; always a multiple of 4.
    pub fn stride(&self) -> u32 {
        self.width * 4
    }

    /// All pixels, row-major, as `0xAARRGGBB` words.
    pub fn pixels(&self) -> &[u32] {
        &self.data
    }

    /// Iterate rows top-down.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u32]> + ExactSizeIterator + '_ {
        self.data.chunks_exact(self.width as usize)
    }

    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [u32] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.data[start..start + w]
    }

    /// The `0xAARRGGBB` word at (x, y). Panics outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> u32 {
        assert!(x < self.width && y < self.height);
        self.data[y as usize * self.width as usize + x as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, argb: u32) {
        assert!(x < self.width && y < self.height);
        self.data[y as usize * self.width as usize + x as usize] = argb;
    }

    /// Whether any pixel has alpha below 0xFF.
    pub fn has_transparency(&self) -> bool {
        self.has_transparency
    }

    /// Whether any pixel has fractional alpha (neither 0x00 nor 0xFF).
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// Recompute both transparency flags by scanning the alpha channel.
    pub fn check_transparency(&mut self) {
        let mut has_transparency = false;
        let mut has_alpha = false;
        for &px in &self.data {
            let a = (px >> 24) as u8;
            if a != 0xFF {
                has_transparency = true;
                if a != 0x00 {
                    has_alpha = true;
                    break;
                }
            }
        }
        self.has_transparency = has_transparency;
        self.has_alpha = has_alpha;
    }

    /// Zero-copy view as an [`imgref::ImgRef`] of ARGB words.
    #[cfg(feature = "imgref")]
    pub fn as_imgref(&self) -> imgref::ImgRef<'_, u32> {
        imgref::ImgRef::new(&self.data, self.width as usize, self.height as usize)
    }

    /// Convert into an [`imgref::ImgVec`] of ARGB words.
    #[cfg(feature = "imgref")]
    pub fn into_imgvec(self) -> imgref::ImgVec<u32> {
        imgref::ImgVec::new(self.data, self.width as usize, self.height as usize)
    }
}

/// An 8-bit indexed image with a palette of up to 256 16-bit-channel colors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexedBitmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
    palette: Vec<RGB16>,
    transparent_index: Option<u8>,
}

impl IndexedBitmap {
    pub(crate) fn new(
        width: u32,
        height: u32,
        data: Vec<u8>,
        palette: Vec<RGB16>,
        transparent_index: Option<u8>,
    ) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize);
        debug_assert!(palette.len() <= 256);
        Self {
            width,
            height,
            data,
            palette,
            transparent_index,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Palette indices, row-major, one byte per pixel.
    pub fn indices(&self) -> &[u8] {
        &self.data
    }

    /// Iterate index rows top-down.
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[u8]> + ExactSizeIterator + '_ {
        self.data.chunks_exact(self.width as usize)
    }

    pub fn palette(&self) -> &[RGB16] {
        &self.palette
    }

    /// The palette slot standing in for fully transparent pixels, if any.
    pub fn transparent_index(&self) -> Option<u8> {
        self.transparent_index
    }
}
