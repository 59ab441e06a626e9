//! Byte cursor over in-memory image data.
//!
//! Every multi-byte read names its endianness explicitly: BMP fields are
//! little-endian on disk, XWD fields big-endian. There is no ambient
//! byte-order state.

use crate::error::BitmapError;

pub(crate) struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn eof(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos.min(self.data.len())
    }

    pub fn set_position(&mut self, pos: usize) -> Result<(), BitmapError> {
        if pos > self.data.len() {
            return Err(BitmapError::TruncatedInput);
        }
        self.pos = pos;
        Ok(())
    }

    pub fn skip(&mut self, n: usize) -> Result<(), BitmapError> {
        let new_pos = self.pos.checked_add(n).ok_or(BitmapError::TruncatedInput)?;
        self.set_position(new_pos)
    }

    pub fn read_u8(&mut self) -> Result<u8, BitmapError> {
        if self.pos < self.data.len() {
            let b = self.data[self.pos];
            self.pos += 1;
            Ok(b)
        } else {
            Err(BitmapError::TruncatedInput)
        }
    }

    pub fn get_u16_le(&mut self) -> Result<u16, BitmapError> {
        Ok(u16::from_le_bytes(self.read_array::<2>()?))
    }

    pub fn get_u16_be(&mut self) -> Result<u16, BitmapError> {
        Ok(u16::from_be_bytes(self.read_array::<2>()?))
    }

    pub fn get_u32_le(&mut self) -> Result<u32, BitmapError> {
        Ok(u32::from_le_bytes(self.read_array::<4>()?))
    }

    pub fn get_u32_be(&mut self) -> Result<u32, BitmapError> {
        Ok(u32::from_be_bytes(self.read_array::<4>()?))
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BitmapError> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), BitmapError> {
        let n = buf.len();
        if self.remaining() < n {
            return Err(BitmapError::TruncatedInput);
        }
        buf.copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes without copying.
    pub fn read_slice(&mut self, n: usize) -> Result<&'a [u8], BitmapError> {
        if self.remaining() < n {
            return Err(BitmapError::TruncatedInput);
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_endianness() {
        let mut r = ByteReader::new(&[0x12, 0x34, 0xAB, 0xCD, 0xEF, 0x01]);
        assert_eq!(r.get_u16_le().unwrap(), 0x3412);
        assert_eq!(r.get_u32_be().unwrap(), 0xABCDEF01);
        assert!(r.eof());
        assert!(matches!(r.read_u8(), Err(BitmapError::TruncatedInput)));
    }

    #[test]
    fn seek_and_skip() {
        let mut r = ByteReader::new(&[1, 2, 3, 4]);
        r.skip(2).unwrap();
        assert_eq!(r.read_u8().unwrap(), 3);
        r.set_position(0).unwrap();
        assert_eq!(r.read_u8().unwrap(), 1);
        assert!(r.set_position(5).is_err());
        assert!(r.skip(4).is_err());
    }

    #[test]
    fn short_reads_leave_position() {
        let mut r = ByteReader::new(&[1, 2]);
        let mut buf = [0u8; 4];
        assert!(r.read_exact(&mut buf).is_err());
        assert_eq!(r.position(), 0);
    }
}
