//! Modified UTF-8, the string encoding used by `CONSTANT_Utf8_info` entries
//!
//! See [the `DataInput` section on modified UTF-8][0]. Quoting from that section:
//!
//! > The differences between this format and the standard UTF-8 format are the following:
//! >
//! >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the
//! >    encoded strings never have embedded nulls.
//! >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
//! >  * Supplementary characters are represented in the form of surrogate pairs.
//!
//! This module is the only place in the crate that interprets the encoding; the parser, the
//! linker, and the inspector all decode through [`decode`].
//!
//! [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8

#[derive(Debug, PartialEq, Eq)]
pub enum Mutf8Error {
    /// A byte whose leading bits match none of the three sequence forms
    InvalidByte { offset: usize, byte: u8 },

    /// The declared length cut a multi-byte sequence short
    Truncated { offset: usize },
}

/// Decode a modified UTF-8 byte string
///
/// The lead byte of each sequence is classified by its full leading-bit pattern:
/// `0xxxxxxx` (1 byte), `110xxxxx` (2 bytes), `1110xxxx` (3 bytes). Everything else is an
/// error. Surrogate pairs (two 3-byte sequences) are combined into the supplementary
/// character they stand for; a lone surrogate half is rejected.
pub fn decode(bytes: &[u8]) -> Result<String, Mutf8Error> {
    let mut out = String::with_capacity(bytes.len());
    let mut pos = 0;

    while pos < bytes.len() {
        let unit = decode_unit(bytes, &mut pos)?;
        match unit {
            0xD800..=0xDBFF => {
                // High surrogate: the low half must follow immediately
                let pair_offset = pos;
                if pos >= bytes.len() {
                    return Err(Mutf8Error::Truncated { offset: pair_offset });
                }
                let low = decode_unit(bytes, &mut pos)?;
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(Mutf8Error::InvalidByte {
                        offset: pair_offset,
                        byte: bytes[pair_offset],
                    });
                }
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                match char::from_u32(code) {
                    Some(c) => out.push(c),
                    None => {
                        return Err(Mutf8Error::InvalidByte {
                            offset: pair_offset,
                            byte: bytes[pair_offset],
                        })
                    }
                }
            }
            0xDC00..=0xDFFF => {
                return Err(Mutf8Error::InvalidByte {
                    offset: pos - 3,
                    byte: bytes[pos - 3],
                })
            }
            _ => match char::from_u32(unit) {
                Some(c) => out.push(c),
                None => unreachable!("BMP code unit is always a valid char"),
            },
        }
    }

    Ok(out)
}

/// Decode one 16-bit code unit, advancing `pos` past the 1-3 bytes it occupies
fn decode_unit(bytes: &[u8], pos: &mut usize) -> Result<u32, Mutf8Error> {
    let offset = *pos;
    let b0 = bytes[offset];

    if b0 & 0x80 == 0x00 {
        *pos += 1;
        Ok(u32::from(b0 & 0x7F))
    } else if b0 & 0xE0 == 0xC0 {
        let b1 = continuation(bytes, offset, offset + 1)?;
        *pos += 2;
        Ok((u32::from(b0 & 0x1F) << 6) | u32::from(b1 & 0x3F))
    } else if b0 & 0xF0 == 0xE0 {
        let b1 = continuation(bytes, offset, offset + 1)?;
        let b2 = continuation(bytes, offset, offset + 2)?;
        *pos += 3;
        Ok((u32::from(b0 & 0x0F) << 12) | (u32::from(b1 & 0x3F) << 6) | u32::from(b2 & 0x3F))
    } else {
        Err(Mutf8Error::InvalidByte { offset, byte: b0 })
    }
}

fn continuation(bytes: &[u8], lead: usize, at: usize) -> Result<u8, Mutf8Error> {
    match bytes.get(at) {
        None => Err(Mutf8Error::Truncated { offset: lead }),
        Some(&b) if b & 0xC0 == 0x80 => Ok(b),
        Some(&b) => Err(Mutf8Error::InvalidByte { offset: at, byte: b }),
    }
}

/// Encode a string into modified UTF-8
///
/// Inverse of [`decode`] for every string `decode` can produce.
pub fn encode(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = Vec::with_capacity(string.len());
    for c in string.chars() {
        // The null character is the one BMP exception: always the 2-byte form
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters become surrogate pairs of 3-byte sequences
            _ => {
                let high = 0xD800 + ((code - 0x10000) >> 10);
                let low = 0xDC00 + ((code - 0x10000) & 0x3FF);
                for unit in [high, low] {
                    buffer.push((unit >> 12 & 0x0F) as u8 | 0b1110_0000);
                    buffer.push((unit >> 6 & 0x3F) as u8 | 0b1000_0000);
                    buffer.push((unit & 0x3F) as u8 | 0b1000_0000);
                }
            }
        }
    }
    buffer
}
