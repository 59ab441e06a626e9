//! Raw pixel export: headerless 4-channel or packed-index dumps.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::bitmap::Bitmap;
use crate::error::BitmapError;
use crate::indexed::{convert_bitmap_to_indexed, image_depth};
use crate::pixel::{store_row_dyn, PixelLayout};
use crate::rows::pack_row;

/// Emit `width * 4` bytes per row, top-down, no padding, in one of the four
/// alpha layouts.
pub(crate) fn encode_raw_true_color(
    bitmap: &Bitmap,
    layout: PixelLayout,
    stop: &dyn Stop,
) -> Result<Vec<u8>, BitmapError> {
    let stride = bitmap.width() as usize * 4;
    let mut out = Vec::with_capacity(stride * bitmap.height() as usize);
    let mut row_buf = vec![0u8; stride];

    for (y, row) in bitmap.rows().enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        if !store_row_dyn(layout, &mut row_buf, row) {
            return Err(BitmapError::UnsupportedFormat(alloc::format!(
                "raw true-color export requires an alpha layout, not {layout:?}"
            )));
        }
        out.extend_from_slice(&row_buf);
    }

    Ok(out)
}

/// Quantize and emit packed palette indices, MSB-first, at the smallest
/// depth holding the palette (1, 2, 4 or 8 bits).
pub(crate) fn encode_raw_indexed(bitmap: &Bitmap, stop: &dyn Stop) -> Result<Vec<u8>, BitmapError> {
    let indexed = convert_bitmap_to_indexed(bitmap, false).ok_or_else(|| {
        BitmapError::UnsupportedFormat(
            "image does not quantize to 256 colors for indexed export".into(),
        )
    })?;

    let depth = image_depth(indexed.palette().len() as u32);
    let width = indexed.width() as usize;
    let stride = (width * depth as usize).div_ceil(8);
    let mut out = Vec::with_capacity(stride * indexed.height() as usize);
    let mut row_buf = vec![0u8; stride];

    for (y, row) in indexed.rows().enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        pack_row(&mut row_buf, row, width, depth, true);
        out.extend_from_slice(&row_buf);
    }

    Ok(out)
}
