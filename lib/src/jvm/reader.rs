use crate::jvm::errors::{ParseError, ParseErrorKind};
use byteorder::{BigEndian, ByteOrder};

/// Sequential big-endian cursor over a byte buffer
///
/// Every read advances the cursor; reads past the end of the buffer fail with
/// [`ParseErrorKind::TruncatedInput`] at the position where the read started. The reader
/// has no other side effects, so decoding the same buffer twice gives the same results.
pub struct ClassReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ClassReader<'a> {
    pub fn new(buf: &'a [u8]) -> ClassReader<'a> {
        ClassReader { buf, pos: 0 }
    }

    /// Current cursor position, in bytes from the start of the buffer
    pub fn offset(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos == self.buf.len()
    }

    /// Take the next `n` bytes, advancing the cursor
    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ParseError> {
        if self.remaining() < n {
            Err(ParseError::at(self.pos, ParseErrorKind::TruncatedInput))
        } else {
            let bytes = &self.buf[self.pos..self.pos + n];
            self.pos += n;
            Ok(bytes)
        }
    }

    pub fn read_u1(&mut self) -> Result<u8, ParseError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u2(&mut self) -> Result<u16, ParseError> {
        Ok(BigEndian::read_u16(self.take(2)?))
    }

    pub fn read_u4(&mut self) -> Result<u32, ParseError> {
        Ok(BigEndian::read_u32(self.take(4)?))
    }

    pub fn read_i1(&mut self) -> Result<i8, ParseError> {
        Ok(self.take(1)?[0] as i8)
    }

    pub fn read_i2(&mut self) -> Result<i16, ParseError> {
        Ok(BigEndian::read_i16(self.take(2)?))
    }

    pub fn read_i4(&mut self) -> Result<i32, ParseError> {
        Ok(BigEndian::read_i32(self.take(4)?))
    }

    /// Skip zero padding up to the next 4-byte boundary of the buffer
    ///
    /// `tableswitch` and `lookupswitch` pad their payload to a 4-byte alignment relative
    /// to the start of the code array; any non-zero pad byte is a format error.
    pub fn align4(&mut self) -> Result<(), ParseError> {
        while self.pos % 4 != 0 {
            let offset = self.pos;
            let byte = self.read_u1()?;
            if byte != 0 {
                return Err(ParseError::at(offset, ParseErrorKind::InvalidPadding { byte }));
            }
        }
        Ok(())
    }
}
