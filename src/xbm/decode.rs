use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use super::XbmImage;
use crate::bitmap::{Bitmap, Hotspot};
use crate::csource::{array_marker_end, scan_hex_byte, split_define, DefineKey, LineReader};
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::rows::unpack_row;

const XBM_MAX_LINE: usize = 128;

pub(crate) fn decode_xbm(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<XbmImage, BitmapError> {
    let mut lines = LineReader::new(data, XBM_MAX_LINE);

    let mut name: Option<Vec<u8>> = None;
    let mut width = 0u32;
    let mut height = 0u32;
    let mut hotspot = Hotspot::default();

    let mut line: &[u8];
    let mut pos: usize;
    loop {
        let current = lines.next_line().ok_or(BitmapError::TruncatedInput)?;

        if current.first() == Some(&b'#') {
            let Some(define) = split_define(current) else {
                continue;
            };
            let Some(key) = define.key else {
                continue;
            };
            // All defines must share one name prefix; the first one wins.
            let matches_name = match &name {
                None => {
                    name = Some(define.name.to_vec());
                    true
                }
                Some(existing) => existing == define.name,
            };
            if !matches_name {
                continue;
            }
            match key {
                DefineKey::Width => {
                    width = positive(define.value, "width")?;
                    hotspot.x = define.value / 2;
                }
                DefineKey::Height => {
                    height = positive(define.value, "height")?;
                    hotspot.y = define.value / 2;
                }
                DefineKey::XHot => hotspot.x = define.value,
                DefineKey::YHot => hotspot.y = define.value,
                _ => {}
            }
        } else {
            // A non-define line must open the bits array.
            let name = name.as_deref().ok_or_else(|| {
                BitmapError::MalformedHeader("XBM bits array before any #define".into())
            })?;
            if width == 0 || height == 0 {
                return Err(BitmapError::OutOfRangeValue(
                    "XBM dimensions missing or zero".into(),
                ));
            }
            let marker_end = array_marker_end(current, name, b"_bits[] = {").ok_or_else(|| {
                BitmapError::MalformedHeader("expected the <name>_bits[] array".into())
            })?;
            line = current;
            pos = marker_end;
            break;
        }
    }

    if let Some(limits) = limits {
        limits.check(width, height)?;
    }
    stop.check()?;

    let mut bitmap = Bitmap::new(width, height)?;
    let w = width as usize;
    let stride = w.div_ceil(8);
    let mut row_buf = vec![0u8; stride];
    let mut unpacked = vec![0u8; w];

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }
        for byte in row_buf.iter_mut() {
            // Hex tokens may split across lines; fetch more until one parses.
            *byte = loop {
                match scan_hex_byte(line, &mut pos) {
                    Some(value) => break value,
                    None => {
                        line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
                        pos = 0;
                    }
                }
            };
        }

        unpack_row(&mut unpacked, &row_buf, w, 1, false);
        for (d, &bit) in bitmap.row_mut(y).iter_mut().zip(&unpacked) {
            *d = if bit == 0 { 0xFF00_0000 } else { 0xFFFF_FFFF };
        }
    }

    Ok(XbmImage {
        bitmap,
        name: String::from_utf8_lossy(&name.unwrap_or_default()).into_owned(),
        hotspot,
    })
}

fn positive(value: i32, what: &str) -> Result<u32, BitmapError> {
    u32::try_from(value)
        .ok()
        .filter(|&v| v > 0)
        .ok_or_else(|| {
            BitmapError::OutOfRangeValue(alloc::format!("XBM {what} {value} must be positive"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    const HOLLOW_SQUARE: &[u8] = b"#define foo_width 3\n\
        #define foo_height 3\n\
        static unsigned char foo_bits[] = {\n\
        \x20  0x07, 0x05, 0x07 };\n";

    #[test]
    fn decodes_hollow_square() {
        let image = decode_xbm(HOLLOW_SQUARE, None, &Unstoppable).unwrap();
        assert_eq!(image.name, "foo");
        assert_eq!(image.hotspot, Hotspot { x: 1, y: 1 });

        let white = 0xFFFF_FFFFu32;
        let black = 0xFF00_0000u32;
        assert_eq!(
            image.bitmap.pixels(),
            &[white, white, white, white, black, white, white, white, white]
        );
    }

    #[test]
    fn explicit_hotspot_overrides_center() {
        let data = b"#define c_width 2\n#define c_height 1\n\
            #define c_x_hot 0\n#define c_y_hot 0\n\
            static unsigned char c_bits[] = { 0x02 };\n";
        let image = decode_xbm(data, None, &Unstoppable).unwrap();
        assert_eq!(image.hotspot, Hotspot { x: 0, y: 0 });
        assert_eq!(image.bitmap.pixels(), &[0xFF00_0000, 0xFFFF_FFFF]);
    }

    #[test]
    fn mismatched_define_prefix_is_ignored() {
        let data = b"#define foo_width 1\n#define foo_height 1\n\
            #define other_width 9\n\
            static unsigned char foo_bits[] = { 0x01 };\n";
        let image = decode_xbm(data, None, &Unstoppable).unwrap();
        assert_eq!(image.bitmap.width(), 1);
    }

    #[test]
    fn bytes_split_across_lines() {
        let data = b"#define s_width 16\n#define s_height 1\n\
            static unsigned char s_bits[] = {\n  0xAA,\n  0x55 };\n";
        let image = decode_xbm(data, None, &Unstoppable).unwrap();
        // 0xAA LSB-first: pixel 0 clear, pixel 1 set ...
        assert_eq!(image.bitmap.pixel(0, 0), 0xFF00_0000);
        assert_eq!(image.bitmap.pixel(1, 0), 0xFFFF_FFFF);
        assert_eq!(image.bitmap.pixel(8, 0), 0xFFFF_FFFF);
        assert_eq!(image.bitmap.pixel(15, 0), 0xFF00_0000);
    }

    #[test]
    fn truncated_body_fails() {
        let data = b"#define t_width 9\n#define t_height 2\n\
            static unsigned char t_bits[] = { 0x01, 0x00, 0x02 };\n";
        assert!(matches!(
            decode_xbm(data, None, &Unstoppable),
            Err(BitmapError::TruncatedInput)
        ));
    }
}
