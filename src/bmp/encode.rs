//! BMP encoding: indexed when the image quantizes, 24-bit otherwise.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use super::{bmp_depth, bmp_stride};
use crate::bitmap::Bitmap;
use crate::error::BitmapError;
use crate::indexed::convert_bitmap_to_indexed;
use crate::pixel::{store_row, Bgr};
use crate::rows::pack_row;

pub(crate) fn encode_bmp(bitmap: &Bitmap, stop: &dyn Stop) -> Result<Vec<u8>, BitmapError> {
    let width = bitmap.width();
    let height = bitmap.height();

    let indexed = convert_bitmap_to_indexed(bitmap, false);
    let (depth, color_count) = match &indexed {
        Some(ix) => (bmp_depth(ix.palette().len() as u32), ix.palette().len() as u32),
        None => (24, 0),
    };

    let stride = bmp_stride(width, depth);
    let data_size = stride
        .checked_mul(height as usize)
        .ok_or(BitmapError::OutOfMemory)?;
    let data_offset = 14 + 40 + color_count as usize * 4;
    let file_size = data_offset
        .checked_add(data_size)
        .ok_or(BitmapError::OutOfMemory)?;

    stop.check()?;

    let mut out = Vec::with_capacity(file_size);
    write_headers(&mut out, file_size, data_offset, data_size, width, height, depth, color_count);

    let mut row_buf = vec![0u8; stride];
    if let Some(ix) = &indexed {
        // Color table: BGRX, 4 bytes per entry, alpha byte zero.
        for color in ix.palette() {
            out.push((color.b >> 8) as u8);
            out.push((color.g >> 8) as u8);
            out.push((color.r >> 8) as u8);
            out.push(0);
        }

        for (y, row) in ix.rows().rev().enumerate() {
            if y % 16 == 0 {
                stop.check()?;
            }
            pack_row(&mut row_buf, row, width as usize, depth, true);
            out.extend_from_slice(&row_buf);
        }
    } else {
        for (y, row) in bitmap.rows().rev().enumerate() {
            if y % 16 == 0 {
                stop.check()?;
            }
            store_row::<Bgr>(&mut row_buf[..width as usize * 3], row);
            out.extend_from_slice(&row_buf);
        }
    }

    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn write_headers(
    out: &mut Vec<u8>,
    file_size: usize,
    data_offset: usize,
    data_size: usize,
    width: u32,
    height: u32,
    depth: u32,
    color_count: u32,
) {
    // File header (14 bytes)
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(file_size as u32).to_le_bytes());
    out.extend_from_slice(&[0u8; 4]); // reserved
    out.extend_from_slice(&(data_offset as u32).to_le_bytes());

    // BITMAPINFOHEADER (40 bytes)
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes()); // positive = bottom-up
    out.extend_from_slice(&1u16.to_le_bytes()); // planes
    out.extend_from_slice(&(depth as u16).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // compression = RGB
    out.extend_from_slice(&(data_size as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // h resolution
    out.extend_from_slice(&0u32.to_le_bytes()); // v resolution
    out.extend_from_slice(&color_count.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // important colors
}
