use alloc::string::String;

use enough::Stop;

use super::XwdImage;
use crate::bitmap::Bitmap;
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::pixel::argb;
use crate::reader::ByteReader;

const XWD_HEADER_SIZE: u32 = 100;
const XWD_FILE_VERSION: u32 = 7;

/// The fixed file header: 25 big-endian 32-bit fields in declared order.
struct XwdHeader {
    header_size: u32,
    file_version: u32,
    pixmap_depth: u32,
    pixmap_width: u32,
    pixmap_height: u32,
    bits_per_pixel: u32,
    bytes_per_line: u32,
    red_mask: u32,
    green_mask: u32,
    blue_mask: u32,
    ncolors: u32,
}

/// One colormap entry: 32-bit pixel value, three 16-bit channels, two
/// flag bytes.
#[derive(Clone, Copy, Default)]
struct XwdColor {
    red: u16,
    green: u16,
    blue: u16,
}

fn read_header(r: &mut ByteReader) -> Result<XwdHeader, BitmapError> {
    let header_size = r.get_u32_be()?;
    let file_version = r.get_u32_be()?;
    let _pixmap_format = r.get_u32_be()?;
    let pixmap_depth = r.get_u32_be()?;
    let pixmap_width = r.get_u32_be()?;
    let pixmap_height = r.get_u32_be()?;
    let _xoffset = r.get_u32_be()?;
    let _byte_order = r.get_u32_be()?;
    let _bitmap_unit = r.get_u32_be()?;
    let _bitmap_bit_order = r.get_u32_be()?;
    let _bitmap_pad = r.get_u32_be()?;
    let bits_per_pixel = r.get_u32_be()?;
    let bytes_per_line = r.get_u32_be()?;
    let _visual_class = r.get_u32_be()?;
    let red_mask = r.get_u32_be()?;
    let green_mask = r.get_u32_be()?;
    let blue_mask = r.get_u32_be()?;
    let _bits_per_rgb = r.get_u32_be()?;
    let _colormap_entries = r.get_u32_be()?;
    let ncolors = r.get_u32_be()?;
    let _window_width = r.get_u32_be()?;
    let _window_height = r.get_u32_be()?;
    let _window_x = r.get_u32_be()?;
    let _window_y = r.get_u32_be()?;
    let _window_bdr_width = r.get_u32_be()?;
    debug_assert_eq!(r.position(), XWD_HEADER_SIZE as usize);

    Ok(XwdHeader {
        header_size,
        file_version,
        pixmap_depth,
        pixmap_width,
        pixmap_height,
        bits_per_pixel,
        bytes_per_line,
        red_mask,
        green_mask,
        blue_mask,
        ncolors,
    })
}

pub(crate) fn decode_xwd(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<XwdImage, BitmapError> {
    let mut r = ByteReader::new(data);
    let mut header = read_header(&mut r)?;

    if header.file_version != XWD_FILE_VERSION {
        return Err(BitmapError::MalformedHeader(alloc::format!(
            "XWD file version {} is not 7",
            header.file_version
        )));
    }
    let name_size = header
        .header_size
        .checked_sub(XWD_HEADER_SIZE)
        .filter(|&n| n <= 256)
        .ok_or_else(|| {
            BitmapError::MalformedHeader(alloc::format!(
                "XWD header size {} outside 100..=356",
                header.header_size
            ))
        })? as usize;
    if header.ncolors > 256 {
        return Err(BitmapError::MalformedHeader(alloc::format!(
            "XWD colormap of {} entries exceeds 256",
            header.ncolors
        )));
    }

    let name_bytes = r.read_slice(name_size)?;
    let name_end = name_bytes
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(name_bytes.len());
    let name = String::from_utf8_lossy(&name_bytes[..name_end]).into_owned();

    // Over-allocated to 256 entries so any 4- or 8-bit pixel value resolves
    // without a bounds failure.
    let mut colors = [XwdColor::default(); 256];
    for color in colors.iter_mut().take(header.ncolors as usize) {
        let _pixel = r.get_u32_be()?;
        color.red = r.get_u16_be()?;
        color.green = r.get_u16_be()?;
        color.blue = r.get_u16_be()?;
        let _flags = r.read_u8()?;
        let _pad = r.read_u8()?;
    }

    let width = header.pixmap_width;
    let height = header.pixmap_height;
    if let Some(limits) = limits {
        limits.check(width, height)?;
    }
    stop.check()?;

    // Depth-24 pixmaps are stored padded to 32 bits per pixel.
    if header.pixmap_depth == 24 {
        header.pixmap_depth = 32;
    }

    let min_line = match header.bits_per_pixel {
        1 => (width as u64).div_ceil(8),
        4 => (width as u64).div_ceil(2),
        8 => width as u64,
        16 => width as u64 * 2,
        32 => width as u64 * 4,
        other => {
            return Err(BitmapError::UnsupportedFormat(alloc::format!(
                "XWD bits-per-pixel {other} not supported"
            )));
        }
    };
    if u64::from(header.bytes_per_line) < min_line {
        return Err(BitmapError::MalformedHeader(alloc::format!(
            "XWD bytes-per-line {} too small for width {}",
            header.bytes_per_line,
            width
        )));
    }

    // XY pixmaps (1 bit per pixel) store one plane per depth bit; only
    // plane 0 contributes to the decoded image.
    let mut body_size = u64::from(header.bytes_per_line) * u64::from(height);
    if header.bits_per_pixel == 1 {
        body_size = body_size
            .checked_mul(u64::from(header.pixmap_depth.max(1)))
            .ok_or(BitmapError::OutOfMemory)?;
    }
    let body = r.read_slice(
        usize::try_from(body_size).map_err(|_| BitmapError::OutOfMemory)?,
    )?;

    let mut bitmap = Bitmap::new(width, height)?;
    let line_bytes = header.bytes_per_line as usize;

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        let row = &body[y as usize * line_bytes..][..line_bytes];
        let dst = bitmap.row_mut(y);

        match header.bits_per_pixel {
            1 => {
                for (x, d) in dst.iter_mut().enumerate() {
                    let set = row[x >> 3] & (0x80 >> (x & 7)) != 0;
                    *d = if set { 0xFFFF_FFFF } else { 0xFF00_0000 };
                }
            }
            4 => {
                // Low nibble first.
                for (x, d) in dst.iter_mut().enumerate() {
                    let pixel = (row[x >> 1] >> (4 * (x & 1))) & 0x0F;
                    *d = colormap_pixel(&colors[pixel as usize]);
                }
            }
            8 => {
                for (x, d) in dst.iter_mut().enumerate() {
                    *d = colormap_pixel(&colors[row[x] as usize]);
                }
            }
            16 => {
                let (r_shift, r_bits) = mask_shift_bits(header.red_mask);
                let (g_shift, g_bits) = mask_shift_bits(header.green_mask);
                let (b_shift, b_bits) = mask_shift_bits(header.blue_mask);
                for (x, d) in dst.iter_mut().enumerate() {
                    let pixel =
                        u32::from(u16::from_be_bytes([row[x * 2], row[x * 2 + 1]]));
                    // Each channel value lands left-justified in its byte.
                    *d = 0xFF00_0000
                        | (((pixel & header.red_mask) >> r_shift) << (24 - r_bits))
                        | (((pixel & header.green_mask) >> g_shift) << (16 - g_bits))
                        | (((pixel & header.blue_mask) >> b_shift) << (8 - b_bits));
                }
            }
            32 => {
                for (x, d) in dst.iter_mut().enumerate() {
                    let pixel = u32::from_be_bytes([
                        row[x * 4],
                        row[x * 4 + 1],
                        row[x * 4 + 2],
                        row[x * 4 + 3],
                    ]);
                    *d = pixel | 0xFF00_0000;
                }
            }
            _ => unreachable!("rejected above"),
        }
    }

    Ok(XwdImage { bitmap, name })
}

/// Pack a 16-bit-channel colormap entry as opaque ARGB.
fn colormap_pixel(color: &XwdColor) -> u32 {
    argb(
        0xFF,
        (color.red >> 8) as u8,
        (color.green >> 8) as u8,
        (color.blue >> 8) as u8,
    )
}

fn mask_shift_bits(mask: u32) -> (u32, u32) {
    if mask == 0 {
        return (0, 0);
    }
    (mask.trailing_zeros(), mask.count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use enough::Unstoppable;

    fn push_be(out: &mut Vec<u8>, v: u32) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    /// Build a 100-byte header; `fields` overrides (index, value) pairs.
    fn header_bytes(fields: &[(usize, u32)]) -> Vec<u8> {
        let mut words = [0u32; 25];
        words[0] = 100; // header_size
        words[1] = 7; // file_version
        for &(index, value) in fields {
            words[index] = value;
        }
        let mut out = Vec::new();
        for w in words {
            push_be(&mut out, w);
        }
        out
    }

    #[test]
    fn rejects_wrong_version() {
        let data = header_bytes(&[(1, 6)]);
        assert!(matches!(
            decode_xwd(&data, None, &Unstoppable),
            Err(BitmapError::MalformedHeader(_))
        ));
    }

    #[test]
    fn decodes_32bpp_with_name() {
        // 2x1, depth 24 (normalized to 32bpp), name "win"
        let mut data = header_bytes(&[
            (0, 104), // header_size: 100 + 4-byte name
            (3, 24),  // pixmap_depth
            (4, 2),   // width
            (5, 1),   // height
            (11, 32), // bits_per_pixel
            (12, 8),  // bytes_per_line
        ]);
        data.extend_from_slice(b"win\0");
        push_be(&mut data, 0x00123456);
        push_be(&mut data, 0x00ABCDEF);

        let image = decode_xwd(&data, None, &Unstoppable).unwrap();
        assert_eq!(image.name, "win");
        assert_eq!(image.bitmap.pixels(), &[0xFF12_3456, 0xFFAB_CDEF]);
    }

    #[test]
    fn decodes_1bpp_as_black_and_white() {
        let mut data = header_bytes(&[
            (3, 1),  // pixmap_depth
            (4, 9),  // width
            (5, 1),  // height
            (11, 1), // bits_per_pixel
            (12, 2), // bytes_per_line
        ]);
        data.extend_from_slice(&[0b1000_0001, 0b1000_0000]);

        let image = decode_xwd(&data, None, &Unstoppable).unwrap();
        let px = image.bitmap.pixels();
        assert_eq!(px[0], 0xFFFF_FFFF);
        assert_eq!(px[1], 0xFF00_0000);
        assert_eq!(px[7], 0xFFFF_FFFF);
        assert_eq!(px[8], 0xFFFF_FFFF);
    }

    #[test]
    fn decodes_8bpp_through_colormap() {
        let mut data = header_bytes(&[
            (3, 8),  // pixmap_depth
            (4, 2),  // width
            (5, 1),  // height
            (11, 8), // bits_per_pixel
            (12, 2), // bytes_per_line
            (19, 2), // ncolors
        ]);
        // entry 0: red, entry 1: blue
        push_be(&mut data, 0);
        data.extend_from_slice(&0xFFFFu16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        push_be(&mut data, 1);
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0xFFFFu16.to_be_bytes());
        data.extend_from_slice(&[0, 0]);
        data.extend_from_slice(&[0, 1]);

        let image = decode_xwd(&data, None, &Unstoppable).unwrap();
        assert_eq!(image.bitmap.pixels(), &[0xFFFF_0000, 0xFF00_00FF]);
    }

    #[test]
    fn decodes_16bpp_565() {
        let mut data = header_bytes(&[
            (3, 16),      // pixmap_depth
            (4, 1),       // width
            (5, 1),       // height
            (11, 16),     // bits_per_pixel
            (12, 2),      // bytes_per_line
            (14, 0xF800), // red_mask
            (15, 0x07E0), // green_mask
            (16, 0x001F), // blue_mask
        ]);
        data.extend_from_slice(&0xF81Fu16.to_be_bytes());

        let image = decode_xwd(&data, None, &Unstoppable).unwrap();
        // 5-bit channels land left-justified: 0b11111000
        assert_eq!(image.bitmap.pixel(0, 0), 0xFFF8_00F8);
    }

    #[test]
    fn truncated_body_fails() {
        let data = header_bytes(&[(3, 8), (4, 4), (5, 2), (11, 8), (12, 4)]);
        // body requires 8 bytes; none present
        assert!(matches!(
            decode_xwd(&data, None, &Unstoppable),
            Err(BitmapError::TruncatedInput)
        ));
    }
}
