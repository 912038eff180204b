use crate::ParseError;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const NO_VALUE: u8 = 255;
const RADIX: u64 = 36;

/// Characters needed to render any `u64` in base 36 (`u64::MAX` is
/// `3W5E11264SGSF`).
pub const BASE36_WIDTH: usize = 13;

/// Lookup table for base-36 decoding
const LOOKUP: [u8; 256] = {
    let mut lut = [NO_VALUE; 256];
    let mut i = 0_u8;
    // Allow lower-case
    while i < 36 {
        let c = ALPHABET[i as usize];
        lut[c as usize] = i;
        if c.is_ascii_uppercase() {
            lut[(c + 32) as usize] = i;
        }
        i += 1;
    }
    lut
};

/// Encodes `value` as upper-case base 36, left-padded with `0` to
/// [`BASE36_WIDTH`] characters.
#[inline]
pub fn encode_base36(mut value: u64) -> [u8; BASE36_WIDTH] {
    let mut buf = [b'0'; BASE36_WIDTH];
    let mut out = BASE36_WIDTH;
    while value > 0 {
        out -= 1;
        buf[out] = ALPHABET[(value % RADIX) as usize];
        value /= RADIX;
    }
    buf
}

/// Decodes base-36 digits (either case) into a `u64`.
///
/// `offset` is added to reported indices so callers decoding a slice of a
/// larger identifier can point at the offending byte in the original.
///
/// # Errors
///
/// - [`ParseError::InvalidDigit`] for a byte outside `[0-9A-Za-z]`
/// - [`ParseError::Overflow`] if the value does not fit a `u64`
pub fn decode_base36(encoded: &[u8], offset: usize) -> Result<u64, ParseError> {
    let mut acc = 0_u64;
    for (i, &b) in encoded.iter().enumerate() {
        let val = LOOKUP[b as usize];
        if val == NO_VALUE {
            return Err(ParseError::InvalidDigit {
                byte: b,
                index: offset + i,
            });
        }
        acc = acc
            .checked_mul(RADIX)
            .and_then(|acc| acc.checked_add(u64::from(val)))
            .ok_or(ParseError::Overflow)?;
    }
    Ok(acc)
}
