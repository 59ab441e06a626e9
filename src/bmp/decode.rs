//! BMP decoding: file header, five DIB header variants, color table, and the
//! three body topologies (indexed, RGB triplet, bitfield masks).

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use super::{bmp_stride, BmpImage};
use crate::bitmap::{Bitmap, Hotspot};
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::pixel::argb;
use crate::reader::ByteReader;
use crate::rows::bitfield_convert_row;

const FILE_HEADER_SIZE: usize = 14;

const COREHEADER_SIZE: u32 = 12;
const INFOHEADER_SIZE: u32 = 40;
const V2INFOHEADER_SIZE: u32 = 52;
const V3INFOHEADER_SIZE: u32 = 56;
const V4HEADER_SIZE: u32 = 108;
const V5HEADER_SIZE: u32 = 124;

const COMPRESSION_RGB: u32 = 0;
const COMPRESSION_BITFIELDS: u32 = 3;

/// OS/2 container magics: recognized so the error names them, not decoded.
const OS2_MAGICS: [(&[u8; 2], &str); 5] = [
    (b"BA", "OS/2 bitmap array"),
    (b"CI", "OS/2 color icon"),
    (b"CP", "OS/2 color pointer"),
    (b"IC", "OS/2 icon"),
    (b"PT", "OS/2 pointer"),
];

#[derive(Default)]
struct DibHeader {
    header_size: u32,
    width: u32,
    height: u32,
    bits_per_pixel: u16,
    compression: u32,
    color_count: u32,
    red_mask: u32,
    green_mask: u32,
    blue_mask: u32,
    alpha_mask: u32,
    is_os2: bool,
    top_down: bool,
}

pub(crate) fn decode_bmp(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<BmpImage, BitmapError> {
    let mut r = ByteReader::new(data);

    let hotspot = read_file_header(&mut r)?;
    let mut header = read_dib_header(&mut r)?;
    // The DIB reader consumes exactly header_size bytes; re-anchor to the
    // header's end before any trailing masks or the color table.
    r.set_position(FILE_HEADER_SIZE + header.header_size as usize)?;
    resolve_compression(&mut r, &mut header)?;

    if !matches!(header.bits_per_pixel, 1 | 2 | 4 | 8 | 16 | 24 | 32) {
        return Err(BitmapError::UnsupportedFormat(alloc::format!(
            "BMP bit depth {} not supported",
            header.bits_per_pixel
        )));
    }
    if header.width == 0 || header.height == 0 {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "BMP dimensions {}x{} must be non-zero",
            header.width,
            header.height
        )));
    }
    if (header.width as i32) < 0 {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "BMP width {} exceeds the signed 32-bit range",
            header.width
        )));
    }

    if let Some(limits) = limits {
        limits.check(header.width, header.height)?;
    }
    stop.check()?;

    let color_table = if header.bits_per_pixel <= 8 {
        if header.color_count == 0 {
            header.color_count = 1 << header.bits_per_pixel;
        }
        if header.color_count > (1u32 << header.bits_per_pixel) {
            return Err(BitmapError::MalformedHeader(alloc::format!(
                "BMP color count {} exceeds {}-bit depth",
                header.color_count,
                header.bits_per_pixel
            )));
        }
        Some(read_color_table(&mut r, &header)?)
    } else {
        None
    };

    let mut bitmap = Bitmap::new(header.width, header.height)?;

    if header.compression == COMPRESSION_BITFIELDS {
        read_bitfield_image(&mut r, &mut bitmap, &header, stop)?;
        if header.alpha_mask != 0 {
            bitmap.check_transparency();
        }
    } else {
        read_image(&mut r, &mut bitmap, &header, &color_table.unwrap_or_default(), stop)?;
    }

    Ok(BmpImage { bitmap, hotspot })
}

/// 14-byte file header. The reserved 16-bit pair doubles as the cursor
/// hotspot when the stream is a Windows cursor.
fn read_file_header(r: &mut ByteReader) -> Result<Hotspot, BitmapError> {
    let magic = r.read_array::<2>()?;
    if &magic != b"BM" {
        for (os2_magic, name) in OS2_MAGICS {
            if &magic == os2_magic {
                return Err(BitmapError::UnsupportedFormat(alloc::format!(
                    "{name} files are not decodable as a single bitmap"
                )));
            }
        }
        return Err(BitmapError::MalformedHeader("not a BMP file".into()));
    }

    let _file_size = r.get_u32_le()?;
    let reserved_1 = r.get_u16_le()?;
    let reserved_2 = r.get_u16_le()?;
    let _image_offset = r.get_u32_le()?;
    debug_assert_eq!(r.position(), FILE_HEADER_SIZE);

    Ok(Hotspot {
        x: i32::from(reserved_1),
        y: i32::from(reserved_2),
    })
}

fn read_dib_header(r: &mut ByteReader) -> Result<DibHeader, BitmapError> {
    let mut header = DibHeader {
        header_size: r.get_u32_le()?,
        ..DibHeader::default()
    };

    match header.header_size {
        INFOHEADER_SIZE | V2INFOHEADER_SIZE | V3INFOHEADER_SIZE | V4HEADER_SIZE
        | V5HEADER_SIZE => {
            header.width = r.get_u32_le()?;
            let raw_height = r.get_u32_le()?;
            let color_planes = r.get_u16_le()?;
            header.bits_per_pixel = r.get_u16_le()?;
            header.compression = r.get_u32_le()?;
            let _image_size = r.get_u32_le()?;
            let _hres = r.get_u32_le()?;
            let _vres = r.get_u32_le()?;
            header.color_count = r.get_u32_le()?;
            let _important_color_count = r.get_u32_le()?;

            if header.header_size >= V2INFOHEADER_SIZE {
                header.red_mask = r.get_u32_le()?;
                header.green_mask = r.get_u32_le()?;
                header.blue_mask = r.get_u32_le()?;
            }
            if header.header_size >= V3INFOHEADER_SIZE {
                header.alpha_mask = r.get_u32_le()?;
            }
            if header.header_size >= V4HEADER_SIZE {
                // Color-space type, endpoints, gamma, and any v5 fields:
                // consumed and discarded.
                r.skip((header.header_size - V3INFOHEADER_SIZE) as usize)?;
            }

            if color_planes != 1 {
                return Err(BitmapError::MalformedHeader(alloc::format!(
                    "BMP color planes is {color_planes}, expected 1"
                )));
            }

            // Negative height flags top-down row order.
            if (raw_height as i32) < 0 {
                header.height = (raw_height as i32).unsigned_abs();
                header.top_down = true;
            } else {
                header.height = raw_height;
            }
        }

        COREHEADER_SIZE => {
            // OS/2 BITMAPCOREHEADER: 16-bit dimensions, no compression
            // field, always bottom-up.
            header.width = u32::from(r.get_u16_le()?);
            header.height = u32::from(r.get_u16_le()?);
            let color_planes = r.get_u16_le()?;
            header.bits_per_pixel = r.get_u16_le()?;
            header.compression = COMPRESSION_RGB;
            header.is_os2 = true;

            if color_planes != 1 {
                return Err(BitmapError::MalformedHeader(alloc::format!(
                    "BMP color planes is {color_planes}, expected 1"
                )));
            }
        }

        other => {
            return Err(BitmapError::UnsupportedFormat(alloc::format!(
                "unknown DIB header size {other}"
            )));
        }
    }

    Ok(header)
}

/// Apply the compression rules: BITFIELDS masks follow a 40-byte header on
/// the wire, and 16-bpp RGB is 5-5-5 bitfields in disguise.
fn resolve_compression(r: &mut ByteReader, header: &mut DibHeader) -> Result<(), BitmapError> {
    match header.compression {
        COMPRESSION_BITFIELDS => {
            if header.header_size == INFOHEADER_SIZE {
                header.red_mask = r.get_u32_le()?;
                header.green_mask = r.get_u32_le()?;
                header.blue_mask = r.get_u32_le()?;
            }
            Ok(())
        }
        COMPRESSION_RGB => {
            if header.bits_per_pixel == 16 {
                header.compression = COMPRESSION_BITFIELDS;
                header.red_mask = 0x1F << 10;
                header.green_mask = 0x1F << 5;
                header.blue_mask = 0x1F;
            }
            Ok(())
        }
        other => Err(BitmapError::UnsupportedCompression(other)),
    }
}

/// Read the color table as ARGB words.
///
/// The table is over-allocated to a power of two covering both the declared
/// count and the pixel depth, zero-filled, so any index a packed row can
/// produce resolves without going out of bounds.
fn read_color_table(r: &mut ByteReader, header: &DibHeader) -> Result<Vec<u32>, BitmapError> {
    let depth = u32::from(header.bits_per_pixel);
    let table_bits = super::bmp_depth(header.color_count).max(depth);
    let mut table = vec![0u32; 1usize << table_bits];

    // Windows tables are 4 bytes per entry (BGRX), OS/2 tables 3 (BGR).
    for entry in table.iter_mut().take(header.color_count as usize) {
        let [b, g, red] = r.read_array::<3>()?;
        if !header.is_os2 {
            r.skip(1)?;
        }
        *entry = argb(0xFF, red, g, b);
    }

    Ok(table)
}

fn read_image(
    r: &mut ByteReader,
    bitmap: &mut Bitmap,
    header: &DibHeader,
    color_table: &[u32],
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    let width = header.width;
    let height = header.height;
    let depth = u32::from(header.bits_per_pixel);
    let src_stride = bmp_stride(width, depth);
    let mut row_buf = vec![0u8; src_stride];

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        r.read_exact(&mut row_buf)?;

        let dy = if header.top_down { y } else { height - 1 - y };
        let dst = bitmap.row_mut(dy);

        if depth <= 8 {
            // MSB-first shift register over the packed indices.
            let first_shift = 8 - depth;
            let pixel_mask = (1u32 << depth) - 1;
            let mut shift = first_shift;
            let mut si = 0usize;
            for d in dst.iter_mut() {
                let index = (u32::from(row_buf[si]) >> shift) & pixel_mask;
                *d = color_table[index as usize];
                if shift == 0 {
                    si += 1;
                    shift = first_shift;
                } else {
                    shift -= depth;
                }
            }
        } else {
            // BGR triplets; any extra bytes per pixel (32-bpp RGB) are padding.
            let step = depth as usize / 8;
            for (d, px) in dst.iter_mut().zip(row_buf.chunks_exact(step)) {
                *d = argb(0xFF, px[2], px[1], px[0]);
            }
        }
    }

    Ok(())
}

fn read_bitfield_image(
    r: &mut ByteReader,
    bitmap: &mut Bitmap,
    header: &DibHeader,
    stop: &dyn Stop,
) -> Result<(), BitmapError> {
    let width = header.width;
    let height = header.height;
    let depth = u32::from(header.bits_per_pixel);
    let src_stride = bmp_stride(width, depth);
    let mut row_buf = vec![0u8; src_stride];

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        r.read_exact(&mut row_buf)?;

        let dy = if header.top_down { y } else { height - 1 - y };
        bitfield_convert_row(
            bitmap.row_mut(dy),
            &row_buf,
            width as usize,
            depth,
            header.alpha_mask,
            header.red_mask,
            header.green_mask,
            header.blue_mask,
        );
    }

    Ok(())
}
