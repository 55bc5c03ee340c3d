//! Hex, Base64 and percent encodings.

use super::Bytes;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::ops::BitOr;

/// Error returned when encoded input cannot be decoded.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DecodeError {
    /// Input is not valid hexadecimal.
    #[error("invalid hex input: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Input is not valid Base64 for the selected alphabet.
    #[error("invalid base64 input: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Options for [`Bytes::to_base64`] and [`Bytes::from_base64`].
///
/// Combine with `|`:
///
/// ```
/// use iocore::bytes::{Base64Options, Bytes};
///
/// let opts = Base64Options::URL_SAFE | Base64Options::OMIT_TRAILING_EQUALS;
/// assert_eq!(Bytes::from_static(b"\xfb\xff").to_base64(opts), "-_8");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Base64Options(u8);

impl Base64Options {
    /// Standard alphabet with `=` padding.
    pub const STANDARD: Self = Self(0);
    /// URL- and filename-safe alphabet (`-` and `_`).
    pub const URL_SAFE: Self = Self(1 << 0);
    /// Do not emit trailing `=` padding.
    pub const OMIT_TRAILING_EQUALS: Self = Self(1 << 1);

    /// Returns true if all bits of `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    fn engine(self) -> GeneralPurpose {
        let alphabet = if self.contains(Self::URL_SAFE) {
            &alphabet::URL_SAFE
        } else {
            &alphabet::STANDARD
        };
        let config = GeneralPurposeConfig::new()
            .with_encode_padding(!self.contains(Self::OMIT_TRAILING_EQUALS))
            .with_decode_padding_mode(DecodePaddingMode::Indifferent);
        GeneralPurpose::new(alphabet, config)
    }
}

impl BitOr for Base64Options {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn hex_digit(nibble: u8) -> u8 {
    b"0123456789ABCDEF"[usize::from(nibble & 0x0f)]
}

fn from_hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

const fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

impl Bytes {
    /// Lowercase hexadecimal encoding.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::from_static(b"Qt\x01").to_hex(), "517401");
    /// ```
    #[must_use]
    pub fn to_hex(&self) -> Self {
        Self::from(hex::encode(self))
    }

    /// Lowercase hexadecimal with `separator` between bytes.
    #[must_use]
    pub fn to_hex_with_separator(&self, separator: u8) -> Self {
        if self.is_empty() {
            return Self::new();
        }
        let mut out = Vec::with_capacity(self.len() * 3 - 1);
        for (i, b) in self.iter().enumerate() {
            if i > 0 {
                out.push(separator);
            }
            out.extend_from_slice(hex::encode([*b]).as_bytes());
        }
        Self::from(out)
    }

    /// Decode hexadecimal (either case).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Hex`] on odd length or a non-hex digit.
    pub fn from_hex(input: impl AsRef<[u8]>) -> Result<Self, DecodeError> {
        Ok(Self::from(hex::decode(input)?))
    }

    /// Base64 encoding.
    #[must_use]
    pub fn to_base64(&self, options: Base64Options) -> Self {
        Self::from(options.engine().encode(self))
    }

    /// Decode Base64; trailing padding is optional.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Base64`] on bytes outside the alphabet or an
    /// impossible length.
    pub fn from_base64(input: impl AsRef<[u8]>, options: Base64Options) -> Result<Self, DecodeError> {
        Ok(Self::from(options.engine().decode(input)?))
    }

    /// Percent-encode.
    ///
    /// Unreserved bytes (`A-Z a-z 0-9 - . _ ~`) stay literal unless listed
    /// in `include`; bytes listed in `exclude` always stay literal. All other
    /// bytes become `percent` followed by two uppercase hex digits.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// let text = Bytes::from_static(b"{a fishy string?}");
    /// assert_eq!(text.to_percent_encoding(b"{}", b"s", b'%'),
    ///            "{a%20fi%73hy%20%73tring%3F}");
    /// ```
    #[must_use]
    pub fn to_percent_encoding(&self, exclude: &[u8], include: &[u8], percent: u8) -> Self {
        let keep = |b: u8| {
            b != percent && (exclude.contains(&b) || (is_unreserved(b) && !include.contains(&b)))
        };
        if self.iter().all(|&b| keep(b)) {
            return self.clone();
        }
        let mut out = Vec::with_capacity(self.len() * 3);
        for &b in self.iter() {
            if keep(b) {
                out.push(b);
            } else {
                out.extend_from_slice(&[percent, hex_digit(b >> 4), hex_digit(b)]);
            }
        }
        Self::from(out)
    }

    /// Decode `percent`-escapes. Malformed escapes are kept verbatim.
    #[must_use]
    pub fn from_percent_encoding(input: impl AsRef<[u8]>, percent: u8) -> Self {
        let input = input.as_ref();
        if !input.contains(&percent) {
            return Self::copy_from_slice(input);
        }
        let mut out = Vec::with_capacity(input.len());
        let mut i = 0;
        while i < input.len() {
            let b = input[i];
            if b == percent && i + 2 < input.len() {
                if let (Some(hi), Some(lo)) = (
                    from_hex_digit(input[i + 1]),
                    from_hex_digit(input[i + 2]),
                ) {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            out.push(b);
            i += 1;
        }
        Self::from(out)
    }
}
