use alloc::vec::Vec;

use enough::Stop;

use super::colors::lookup_color;
use crate::bitmap::Bitmap;
use crate::csource::{array_marker_end, quoted_content, split_define, DefineKey, LineReader};
use crate::error::BitmapError;
use crate::limits::Limits;

const XPM_MAX_LINE: usize = 2048;

/// Color keys in priority order; the highest-ranked key present selects the
/// color, later entries winning ties.
const COLOR_KEYS: [&[u8]; 5] = [b"s", b"m", b"g4", b"g", b"c"];

struct XpmHeader {
    width: u32,
    height: u32,
    chars_per_pixel: usize,
    /// ARGB color per table entry.
    colors: Vec<u32>,
    /// Big-endian packed character code per table entry.
    color_chars: Vec<u32>,
}

pub(crate) fn decode_xpm(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bitmap, BitmapError> {
    let mut lines = LineReader::new(data, XPM_MAX_LINE);
    let first = lines.next_line().ok_or(BitmapError::TruncatedInput)?;

    let header = if first.starts_with(b"/* XPM") && contains(&first[6..], b"*/") {
        read_v3_header(&mut lines)?
    } else {
        read_v1_header(&mut lines, first)?
    };

    if let Some(limits) = limits {
        limits.check(header.width, header.height)?;
    }
    stop.check()?;

    let mut bitmap = Bitmap::new(header.width, header.height)?;
    let width = header.width as usize;
    let cpp = header.chars_per_pixel;

    for y in 0..header.height {
        if y % 16 == 0 {
            stop.check()?;
        }
        let mut line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        while line.starts_with(b"/*") {
            line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        }

        let row = quoted_content(line)
            .filter(|content| content.len() >= width * cpp)
            .ok_or_else(|| {
                BitmapError::MalformedHeader(alloc::format!("XPM pixel row {y} too short"))
            })?;

        for (x, chars) in row.chunks_exact(cpp).take(width).enumerate() {
            let code = pack_chars(chars);
            // Linear search; unknown codes decode to opaque black.
            let color = header
                .color_chars
                .iter()
                .position(|&c| c == code)
                .map(|i| header.colors[i])
                .unwrap_or(0xFF00_0000);
            bitmap.set_pixel(x as u32, y, color);
        }
    }

    bitmap.check_transparency();
    Ok(bitmap)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    crate::csource::find_subslice(haystack, needle).is_some()
}

fn pack_chars(chars: &[u8]) -> u32 {
    chars.iter().fold(0u32, |code, &c| (code << 8) | u32::from(c))
}

// ── v3 ──────────────────────────────────────────────────────────────

fn read_v3_header(lines: &mut LineReader) -> Result<XpmHeader, BitmapError> {
    // The array assignment line.
    let line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
    if !line.starts_with(b"static char") {
        return Err(BitmapError::MalformedHeader(
            "XPM v3 assignment line missing".into(),
        ));
    }

    // The hints line, past any comment lines.
    let mut line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
    while line.starts_with(b"/*") {
        while !contains(line, b"*/") {
            line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        }
        line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
    }

    let (width, height, color_count, chars_per_pixel) = parse_hints(line)?;

    // Not preallocated: the declared count is untrusted and each entry
    // consumes an input line anyway.
    let mut colors = Vec::new();
    let mut color_chars = Vec::new();
    for _ in 0..color_count {
        let mut line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        if line.starts_with(b"/*") {
            line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        }
        let (code, color) = parse_v3_color_line(line, chars_per_pixel)?;
        color_chars.push(code);
        colors.push(color);
    }

    Ok(XpmHeader {
        width,
        height,
        chars_per_pixel,
        colors,
        color_chars,
    })
}

/// The hints line holds exactly four integers:
/// `"<width> <height> <ncolors> <chars_per_pixel>"`.
fn parse_hints(line: &[u8]) -> Result<(u32, u32, usize, usize), BitmapError> {
    let content =
        quoted_content(line).ok_or_else(|| malformed_hints(line))?;
    let mut values = [0u32; 4];
    let mut count = 0;
    let mut scan = 0;
    while let Some((start, end)) = next_token(content, scan) {
        scan = end;
        let value = parse_u32_field(&content[start..end]).ok_or_else(|| malformed_hints(line))?;
        if count == 4 {
            return Err(malformed_hints(line));
        }
        values[count] = value;
        count += 1;
    }
    if count != 4 {
        return Err(malformed_hints(line));
    }

    let [width, height, color_count, chars_per_pixel] = values;
    check_hints(width, height, color_count, chars_per_pixel)?;
    Ok((
        width,
        height,
        color_count as usize,
        chars_per_pixel as usize,
    ))
}

fn parse_u32_field(token: &[u8]) -> Option<u32> {
    core::str::from_utf8(token).ok()?.parse().ok()
}

fn malformed_hints(line: &[u8]) -> BitmapError {
    BitmapError::MalformedHeader(alloc::format!(
        "XPM hints line {:?} is not four integers",
        core::str::from_utf8(line).unwrap_or("<non-UTF8>")
    ))
}

fn check_hints(
    width: u32,
    height: u32,
    color_count: u32,
    chars_per_pixel: u32,
) -> Result<(), BitmapError> {
    if width == 0 || height == 0 || color_count == 0 {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "XPM header values {width}x{height} with {color_count} colors must be non-zero"
        )));
    }
    if !(1..=4).contains(&chars_per_pixel) {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "XPM chars-per-pixel {chars_per_pixel} outside 1..=4"
        )));
    }
    Ok(())
}

/// One v3 color entry: the pixel characters, then `key color` pairs.
fn parse_v3_color_line(line: &[u8], cpp: usize) -> Result<(u32, u32), BitmapError> {
    let content = quoted_content(line)
        .filter(|content| content.len() >= cpp)
        .ok_or_else(|| BitmapError::MalformedHeader("XPM color entry too short".into()))?;
    let code = pack_chars(&content[..cpp]);
    let rest = &content[cpp..];

    let mut best_rank = 0usize;
    let mut color = None;
    let mut scan = 0usize;
    while let Some((key_start, key_end)) = next_token(rest, scan) {
        let rank = key_rank(&rest[key_start..key_end]).ok_or_else(|| {
            BitmapError::MalformedHeader("XPM color entry has a value with no key".into())
        })?;

        // The color value: every token up to the next key.
        let mut color_start = None;
        let mut color_end = key_end;
        scan = key_end;
        while let Some((start, end)) = next_token(rest, scan) {
            if key_rank(&rest[start..end]).is_some() {
                break;
            }
            color_start.get_or_insert(start);
            color_end = end;
            scan = end;
        }
        let color_start = color_start.ok_or_else(|| {
            BitmapError::MalformedHeader("XPM color key with no color value".into())
        })?;

        if rank >= best_rank {
            color = Some(parse_color(&rest[color_start..color_end])?);
            best_rank = rank;
        }
    }

    match color {
        Some(color) => Ok((code, color)),
        None => Err(BitmapError::MalformedHeader(
            "XPM color entry has no key/color pair".into(),
        )),
    }
}

// ── v1 ──────────────────────────────────────────────────────────────

fn read_v1_header(lines: &mut LineReader, first: &[u8]) -> Result<XpmHeader, BitmapError> {
    let mut name: Option<Vec<u8>> = None;
    let mut width = 0u32;
    let mut height = 0u32;
    let mut color_count = 0usize;
    let mut chars_per_pixel = 1usize;

    let mut line = first;
    loop {
        if line.first() == Some(&b'#') {
            if let Some(define) = split_define(line) {
                if let Some(key) = define.key {
                    let matches_name = match &name {
                        None => {
                            name = Some(define.name.to_vec());
                            true
                        }
                        Some(existing) => existing == define.name,
                    };
                    if matches_name {
                        match key {
                            DefineKey::Width => width = define.value.max(0) as u32,
                            DefineKey::Height => height = define.value.max(0) as u32,
                            DefineKey::NColors => color_count = define.value.max(0) as usize,
                            DefineKey::CharsPerPixel => {
                                chars_per_pixel = define.value.max(0) as usize;
                            }
                            // _format is parsed and ignored, _x_hot/_y_hot
                            // do not occur in pixmaps.
                            _ => {}
                        }
                    }
                }
            }
        } else if let Some(found_name) = &name {
            // The monochrome table may precede the color table; keep
            // scanning until `<name>_colors[] = {`.
            if array_marker_end(line, found_name, b"_colors[] = {").is_some() {
                break;
            }
        }

        line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
    }

    check_hints(width, height, color_count as u32, chars_per_pixel as u32)?;
    let name = name.unwrap_or_default();

    let mut colors = Vec::new();
    let mut color_chars = Vec::new();
    for _ in 0..color_count {
        let line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        let (code, color) = parse_v1_color_line(line, chars_per_pixel)?;
        color_chars.push(code);
        colors.push(color);
    }

    // Skip ahead to the pixel array.
    loop {
        let line = lines.next_line().ok_or(BitmapError::TruncatedInput)?;
        if array_marker_end(line, &name, b"_pixels[] = {").is_some() {
            break;
        }
    }

    Ok(XpmHeader {
        width,
        height,
        chars_per_pixel,
        colors,
        color_chars,
    })
}

/// One v1 color entry: the pixel characters, then the color value with no
/// key tokens.
fn parse_v1_color_line(line: &[u8], cpp: usize) -> Result<(u32, u32), BitmapError> {
    let content = quoted_content(line)
        .filter(|content| content.len() >= cpp)
        .ok_or_else(|| BitmapError::MalformedHeader("XPM color entry too short".into()))?;
    let code = pack_chars(&content[..cpp]);
    let rest = &content[cpp..];

    let (first_start, mut color_end) = next_token(rest, 0).ok_or_else(|| {
        BitmapError::MalformedHeader("XPM v1 color entry has no color value".into())
    })?;
    let mut scan = color_end;
    while let Some((start, end)) = next_token(rest, scan) {
        if key_rank(&rest[start..end]).is_some() {
            break;
        }
        color_end = end;
        scan = end;
    }

    let color = parse_color(&rest[first_start..color_end])?;
    Ok((code, color))
}

// ── shared token and color scanning ─────────────────────────────────

/// Tokens inside a color entry are separated by spaces, tabs, quotes and
/// commas. Returns the next token's byte range at or after `from`.
fn next_token(content: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut start = from;
    while start < content.len() && matches!(content[start], b' ' | b'\t' | b'"' | b',') {
        start += 1;
    }
    let mut end = start;
    while end < content.len() && !matches!(content[end], b' ' | b'\t' | b'"') {
        end += 1;
    }
    (start < end).then_some((start, end))
}

fn key_rank(token: &[u8]) -> Option<usize> {
    COLOR_KEYS.iter().position(|&key| key == token)
}

/// A color value: `#RRGGBB`, a named color, or the literal `none`
/// (fully transparent).
fn parse_color(span: &[u8]) -> Result<u32, BitmapError> {
    if span.len() == 7 && span[0] == b'#' {
        let mut value = 0u32;
        for &b in &span[1..] {
            let digit = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => 10 + b - b'a',
                b'A'..=b'F' => 10 + b - b'A',
                _ => {
                    return Err(BitmapError::MalformedHeader(
                        "XPM hex color has non-hex digits".into(),
                    ));
                }
            };
            value = (value << 4) | u32::from(digit);
        }
        return Ok(value | 0xFF00_0000);
    }

    if let Some(color) = lookup_color(span) {
        return Ok(0xFF00_0000
            | (u32::from(color.r & 0xFF00) << 8)
            | u32::from(color.g & 0xFF00)
            | u32::from(color.b >> 8));
    }

    if span.eq_ignore_ascii_case(b"none") {
        return Ok(0x0000_0000);
    }

    Err(BitmapError::MalformedHeader(alloc::format!(
        "unknown XPM color {:?}",
        core::str::from_utf8(span).unwrap_or("<non-UTF8>")
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use enough::Unstoppable;

    #[test]
    fn v3_red_transparent_checkerboard() {
        let data = b"/* XPM */\n\
            static char *check[] = {\n\
            \"2 2 2 1\",\n\
            \". c #FF0000\",\n\
            \"  c none\",\n\
            \". \",\n\
            \" .\"};\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        let red = 0xFFFF_0000u32;
        assert_eq!(bitmap.pixels(), &[red, 0, 0, red]);
        assert!(bitmap.has_transparency());
        assert!(!bitmap.has_alpha());
    }

    #[test]
    fn v3_key_priority_prefers_color_visual() {
        let data = b"/* XPM */\n\
            static char *k[] = {\n\
            \"1 1 1 1\",\n\
            \"x m #000000 c #00FF00 s border\",\n\
            \"x\"};\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        // c outranks m; the trailing s key ranks lower and its value is
        // never even parsed as a color.
        assert_eq!(bitmap.pixel(0, 0), 0xFF00_FF00);
    }

    #[test]
    fn v3_named_colors_and_comments() {
        let data = b"/* XPM */\n\
            static char *n[] = {\n\
            /* hints */\n\
            \"2 1 2 1\",\n\
            \"a c red\",\n\
            \"b c navy blue\",\n\
            /* rows */\n\
            \"ab\"};\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        assert_eq!(bitmap.pixel(0, 0), 0xFFFF_0000);
        assert_eq!(bitmap.pixel(1, 0), 0xFF00_0080);
    }

    #[test]
    fn v3_two_chars_per_pixel() {
        let data = b"/* XPM */\n\
            static char *t[] = {\n\
            \"2 1 2 2\",\n\
            \".. c #010203\",\n\
            \".x c #FFFFFF\",\n\
            \"...x\"};\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        assert_eq!(bitmap.pixel(0, 0), 0xFF01_0203);
        assert_eq!(bitmap.pixel(1, 0), 0xFFFF_FFFF);
    }

    #[test]
    fn v3_rejects_bad_hints() {
        let data = b"/* XPM */\nstatic char *b[] = {\n\"2 2 1\",\n\". c red\",\n\"..\"};\n";
        assert!(matches!(
            decode_xpm(data, None, &Unstoppable),
            Err(BitmapError::MalformedHeader(_))
        ));
    }

    #[test]
    fn v1_define_driven() {
        let data = b"#define art_format 1\n\
            #define art_width 2\n\
            #define art_height 2\n\
            #define art_ncolors 2\n\
            #define art_chars_per_pixel 1\n\
            static char *art_colors[] = {\n\
            \"o #FFFFFF\",\n\
            \"* black\"\n\
            };\n\
            static char *art_pixels[] = {\n\
            \"o*\",\n\
            \"*o\"\n\
            };\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        let white = 0xFFFF_FFFFu32;
        let black = 0xFF00_0000u32;
        assert_eq!(bitmap.pixels(), &[white, black, black, white]);
        assert!(!bitmap.has_transparency());
    }

    #[test]
    fn unknown_pixel_code_is_opaque_black() {
        let data = b"/* XPM */\n\
            static char *u[] = {\n\
            \"2 1 1 1\",\n\
            \". c #FFFFFF\",\n\
            \".?\"};\n";
        let bitmap = decode_xpm(data, None, &Unstoppable).unwrap();
        assert_eq!(bitmap.pixel(1, 0), 0xFF00_0000);
    }
}
