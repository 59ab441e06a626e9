//! Netpbm encoding: binary PPM (P6) and binary PBM (P4).

use alloc::format;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::bitmap::Bitmap;
use crate::error::BitmapError;
use crate::pixel::{store_row, Rgb};
use crate::rows::pack_mask_row;

/// Encode as binary PPM: `P6` header, then RGB rows top-down, no padding.
/// Alpha is dropped.
pub(crate) fn encode_ppm(bitmap: &Bitmap, stop: &dyn Stop) -> Result<Vec<u8>, BitmapError> {
    let width = bitmap.width();
    let height = bitmap.height();
    let header = format!("P6\n{width} {height}\n255\n");

    let stride = width as usize * 3;
    let mut out = Vec::with_capacity(header.len() + stride * height as usize);
    out.extend_from_slice(header.as_bytes());

    let mut row_buf = vec![0u8; stride];
    for (y, row) in bitmap.rows().enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        store_row::<Rgb>(&mut row_buf, row);
        out.extend_from_slice(&row_buf);
    }

    Ok(out)
}

/// Encode as binary PBM: a 1-bit mask, bit set for light opaque pixels
/// (see [`pack_mask_row`]). `P4` has no max-value line.
pub(crate) fn encode_pbm(bitmap: &Bitmap, stop: &dyn Stop) -> Result<Vec<u8>, BitmapError> {
    let width = bitmap.width();
    let height = bitmap.height();
    let header = format!("P4\n{width} {height}\n");

    let stride = (width as usize).div_ceil(8);
    let mut out = Vec::with_capacity(header.len() + stride * height as usize);
    out.extend_from_slice(header.as_bytes());

    let mut row_buf = vec![0u8; stride];
    for (y, row) in bitmap.rows().enumerate() {
        if y % 16 == 0 {
            stop.check()?;
        }
        pack_mask_row(&mut row_buf, row, 0);
        out.extend_from_slice(&row_buf);
    }

    Ok(out)
}
