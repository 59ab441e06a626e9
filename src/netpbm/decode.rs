//! Netpbm decoding: a whitespace/comment tokenizer over the input, then
//! per-row sample scaling into ARGB.

use alloc::vec;
use alloc::vec::Vec;

use enough::Stop;

use crate::bitmap::Bitmap;
use crate::error::BitmapError;
use crate::limits::Limits;
use crate::pixel::{load_row, Gray, Rgb};
use crate::rows::unpack_row;

/// Token scanner for the mixed ASCII/binary Netpbm stream.
///
/// Whitespace is space, TAB, CR, LF. A `#` starts a comment running to the
/// next CR or LF; comments vanish from the token stream entirely, so a
/// comment may interrupt a token and the pieces join. Binary pixel data is
/// read directly from the current position with [`Tokenizer::read_exact`].
pub(crate) struct Tokenizer<'a> {
    data: &'a [u8],
    pos: usize,
    token: Vec<u8>,
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

impl<'a> Tokenizer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            token: Vec::new(),
        }
    }

    /// The next maximal non-whitespace run, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<&[u8]> {
        self.token.clear();
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                self.skip_comment();
            } else if is_space(b) {
                if !self.token.is_empty() {
                    break;
                }
                self.pos += 1;
            } else {
                self.token.push(b);
                self.pos += 1;
            }
        }
        if self.token.is_empty() {
            None
        } else {
            Some(&self.token)
        }
    }

    fn skip_comment(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            self.pos += 1;
            if b == b'\n' || b == b'\r' {
                break;
            }
        }
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BitmapError> {
        let end = self
            .pos
            .checked_add(buf.len())
            .filter(|&end| end <= self.data.len())
            .ok_or(BitmapError::TruncatedInput)?;
        buf.copy_from_slice(&self.data[self.pos..end]);
        self.pos = end;
        Ok(())
    }

    pub fn read_byte(&mut self) -> Result<u8, BitmapError> {
        let b = *self.data.get(self.pos).ok_or(BitmapError::TruncatedInput)?;
        self.pos += 1;
        Ok(b)
    }
}

fn parse_u32(token: &[u8]) -> Result<u32, BitmapError> {
    core::str::from_utf8(token)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| {
            BitmapError::MalformedHeader(alloc::format!(
                "expected an unsigned integer, found {:?}",
                core::str::from_utf8(token).unwrap_or("<non-UTF8>")
            ))
        })
}

/// Rescale `count` samples of `max_value` range to 8 bits, in place.
///
/// Samples wider than 8 bits occupy two big-endian bytes (the Netpbm binary
/// convention; the ASCII reader stores them the same way).
fn scale_to_byte(buf: &mut [u8], max_value: u32, count: usize) {
    let two_bytes = max_value >= 256;
    for x in 0..count {
        let value = if two_bytes {
            (u32::from(buf[x * 2]) << 8) | u32::from(buf[x * 2 + 1])
        } else {
            u32::from(buf[x])
        };
        buf[x] = ((value * 255) / max_value) as u8;
    }
}

pub(crate) fn decode_netpbm(
    data: &[u8],
    limits: Option<&Limits>,
    stop: &dyn Stop,
) -> Result<Bitmap, BitmapError> {
    let mut reader = Tokenizer::new(data);

    let format = match reader.next_token() {
        Some(&[b'P', digit]) if (b'1'..=b'6').contains(&digit) => digit - b'0',
        Some(_) | None => {
            return Err(BitmapError::UnsupportedFormat(
                "Netpbm magic must be P1 through P6".into(),
            ));
        }
    };

    let width = parse_u32(reader.next_token().ok_or(BitmapError::TruncatedInput)?)?;
    let height = parse_u32(reader.next_token().ok_or(BitmapError::TruncatedInput)?)?;
    let max_value = if format == 1 || format == 4 {
        1
    } else {
        parse_u32(reader.next_token().ok_or(BitmapError::TruncatedInput)?)?
    };

    if width == 0 || height == 0 {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "Netpbm dimensions {width}x{height} must be non-zero"
        )));
    }
    if max_value == 0 || max_value >= 65536 {
        return Err(BitmapError::OutOfRangeValue(alloc::format!(
            "Netpbm max value {max_value} outside 1..=65535"
        )));
    }

    if let Some(limits) = limits {
        limits.check(width, height)?;
    }
    stop.check()?;

    let binary = format > 3;
    let channel_count: usize = if format == 3 || format == 6 { 3 } else { 1 };
    let depth: usize = match format {
        1 => 8,
        4 => 1,
        _ => {
            if max_value < 256 {
                8
            } else {
                16
            }
        }
    };

    let mut bitmap = Bitmap::new(width, height)?;
    let w = width as usize;
    let stride = (w * depth * channel_count).div_ceil(8);
    let mut row_buf = vec![0u8; stride];
    let mut unpacked_buf = if format == 4 { vec![0u8; w] } else { Vec::new() };

    // A single whitespace byte separates the header from binary pixel data.
    if binary {
        reader.read_byte()?;
    }

    for y in 0..height {
        if y % 16 == 0 {
            stop.check()?;
        }

        if binary {
            reader.read_exact(&mut row_buf)?;
            if format == 4 {
                unpack_row(&mut unpacked_buf, &row_buf, w, 1, true);
            }
        } else {
            let mut offset = 0usize;
            for _ in 0..w * channel_count {
                let token = reader.next_token().ok_or(BitmapError::TruncatedInput)?;
                let value = parse_u32(token)?;
                if value > max_value {
                    return Err(BitmapError::OutOfRangeValue(alloc::format!(
                        "sample {value} exceeds declared maximum {max_value}"
                    )));
                }
                if depth == 16 {
                    row_buf[offset] = (value >> 8) as u8;
                    offset += 1;
                }
                row_buf[offset] = value as u8;
                offset += 1;
            }
        }

        let samples = if format == 4 {
            &mut unpacked_buf
        } else {
            &mut row_buf
        };
        scale_to_byte(samples, max_value, w * channel_count);

        let dst = bitmap.row_mut(y);
        if channel_count == 1 {
            load_row::<Gray>(dst, samples);
        } else {
            load_row::<Rgb>(dst, samples);
        }
    }

    Ok(bitmap)
}
