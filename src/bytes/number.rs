//! Numeric parsing and formatting.

use super::text::is_space;
use super::Bytes;
use std::num::IntErrorKind;

/// Error returned by [`Bytes::to_int`], [`Bytes::to_f64`] and [`Bytes::to_f32`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseNumberError {
    /// Nothing but whitespace.
    #[error("cannot parse number from empty input")]
    Empty,
    /// A byte is not a digit in the requested base.
    #[error("invalid digit in number")]
    InvalidDigit,
    /// The value does not fit the target type.
    #[error("number out of range for target type")]
    Overflow,
    /// The base is neither 0 nor within `2..=36`.
    #[error("invalid base {0}")]
    InvalidBase(u32),
    /// The input is not a floating-point literal.
    #[error("invalid floating-point number")]
    InvalidFloat,
}

/// Integer types [`Bytes::to_int`] can produce.
pub trait ParseInt: Sized + sealed::Sealed {
    /// Parse `text` (optionally signed) in `radix`.
    #[doc(hidden)]
    fn from_radix(text: &str, radix: u32) -> Result<Self, std::num::ParseIntError>;
}

mod sealed {
    pub trait Sealed {}
}

macro_rules! impl_parse_int {
    ($($t:ty),*) => {$(
        impl sealed::Sealed for $t {}

        impl ParseInt for $t {
            fn from_radix(text: &str, radix: u32) -> Result<Self, std::num::ParseIntError> {
                <$t>::from_str_radix(text, radix)
            }
        }
    )*};
}

impl_parse_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

fn trim(data: &[u8]) -> &[u8] {
    let start = data.iter().position(|&b| !is_space(b)).unwrap_or(data.len());
    let end = data.iter().rposition(|&b| !is_space(b)).map_or(start, |i| i + 1);
    &data[start..end]
}

/// Split a `0x`/`0b`/leading-zero prefix off for base 0.
fn detect_base(digits: &[u8]) -> (u32, &[u8]) {
    match digits {
        [b'0', b'x' | b'X', rest @ ..] => (16, rest),
        [b'0', b'b' | b'B', rest @ ..] => (2, rest),
        [b'0', rest @ ..] if !rest.is_empty() => (8, rest),
        _ => (10, digits),
    }
}

fn parse_float<F: std::str::FromStr>(data: &[u8]) -> Result<F, ParseNumberError> {
    let data = trim(data);
    if data.is_empty() {
        return Err(ParseNumberError::Empty);
    }
    std::str::from_utf8(data)
        .ok()
        .and_then(|s| s.parse::<F>().ok())
        .ok_or(ParseNumberError::InvalidFloat)
}

const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn format_radix(mut value: u128, negative: bool, base: u32) -> Bytes {
    let base = if (2..=36).contains(&base) { base } else { 10 };
    let mut out = Vec::with_capacity(16);
    loop {
        // remainder is below 36
        out.push(DIGITS[(value % u128::from(base)) as usize]);
        value /= u128::from(base);
        if value == 0 {
            break;
        }
    }
    if negative {
        out.push(b'-');
    }
    out.reverse();
    Bytes::from(out)
}

impl Bytes {
    /// Parse an integer in `base`, ignoring surrounding whitespace.
    ///
    /// Base 0 detects the base from the prefix: `0x` for 16, `0b` for 2, a
    /// leading `0` for 8, decimal otherwise. Base 16 also accepts a `0x`
    /// prefix.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::from_static(b" -0x1f ").to_int::<i32>(0), Ok(-31));
    /// assert_eq!(Bytes::from_static(b"ff").to_int::<u8>(16), Ok(255));
    /// assert!(Bytes::from_static(b"256").to_int::<u8>(10).is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`ParseNumberError`] describing why the input is rejected.
    pub fn to_int<T: ParseInt>(&self, base: u32) -> Result<T, ParseNumberError> {
        let data = trim(self);
        if data.is_empty() {
            return Err(ParseNumberError::Empty);
        }
        let (negative, unsigned) = match data {
            [b'-', rest @ ..] => (true, rest),
            [b'+', rest @ ..] => (false, rest),
            _ => (false, data),
        };
        let (radix, digits) = match base {
            0 => detect_base(unsigned),
            16 => match unsigned {
                [b'0', b'x' | b'X', rest @ ..] => (16, rest),
                _ => (16, unsigned),
            },
            2..=36 => (base, unsigned),
            _ => return Err(ParseNumberError::InvalidBase(base)),
        };
        if digits.is_empty() || matches!(digits[0], b'+' | b'-') {
            return Err(ParseNumberError::InvalidDigit);
        }
        let digits = std::str::from_utf8(digits).map_err(|_| ParseNumberError::InvalidDigit)?;
        let text = if negative {
            std::borrow::Cow::Owned(format!("-{digits}"))
        } else {
            std::borrow::Cow::Borrowed(digits)
        };
        T::from_radix(&text, radix).map_err(|e| match e.kind() {
            IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => ParseNumberError::Overflow,
            IntErrorKind::Empty => ParseNumberError::Empty,
            _ => ParseNumberError::InvalidDigit,
        })
    }

    /// Parse a decimal floating-point number, ignoring surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ParseNumberError::Empty`] or [`ParseNumberError::InvalidFloat`].
    pub fn to_f64(&self) -> Result<f64, ParseNumberError> {
        parse_float(self)
    }

    /// Single-precision variant of [`Bytes::to_f64`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseNumberError::Empty`] or [`ParseNumberError::InvalidFloat`].
    pub fn to_f32(&self) -> Result<f32, ParseNumberError> {
        parse_float(self)
    }

    /// Format a signed integer in `base` (2..=36, lowercase digits).
    ///
    /// Any other base formats in decimal.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::number(-255, 16), "-ff");
    /// assert_eq!(Bytes::number(5, 2), "101");
    /// ```
    #[must_use]
    pub fn number(value: i64, base: u32) -> Self {
        format_radix(u128::from(value.unsigned_abs()), value < 0, base)
    }

    /// Format an unsigned integer in `base`.
    #[must_use]
    pub fn number_u64(value: u64, base: u32) -> Self {
        format_radix(u128::from(value), false, base)
    }

    /// Format a float: shortest round-trip form, or fixed with `precision`
    /// fractional digits.
    #[must_use]
    pub fn number_f64(value: f64, precision: Option<usize>) -> Self {
        match precision {
            Some(p) => Self::from(format!("{value:.p$}")),
            None => Self::from(format!("{value}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_explicit_base() {
        assert_eq!(Bytes::from("42").to_int::<i64>(10), Ok(42));
        assert_eq!(Bytes::from("+42").to_int::<u32>(10), Ok(42));
        assert_eq!(Bytes::from("\t-7\n").to_int::<i8>(10), Ok(-7));
        assert_eq!(Bytes::from("0xFF").to_int::<u16>(16), Ok(255));
        assert_eq!(Bytes::from("zz").to_int::<u32>(36), Ok(1295));
        assert_eq!(Bytes::from("777").to_int::<u32>(8), Ok(511));
    }

    #[test]
    fn detects_base_from_prefix() {
        assert_eq!(Bytes::from("0x10").to_int::<i32>(0), Ok(16));
        assert_eq!(Bytes::from("0b101").to_int::<i32>(0), Ok(5));
        assert_eq!(Bytes::from("017").to_int::<i32>(0), Ok(15));
        assert_eq!(Bytes::from("0").to_int::<i32>(0), Ok(0));
        assert_eq!(Bytes::from("-017").to_int::<i32>(0), Ok(-15));
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(Bytes::new().to_int::<i32>(10), Err(ParseNumberError::Empty));
        assert_eq!(Bytes::from("  ").to_int::<i32>(10), Err(ParseNumberError::Empty));
        assert_eq!(Bytes::from("12a").to_int::<i32>(10), Err(ParseNumberError::InvalidDigit));
        assert_eq!(Bytes::from("-").to_int::<i32>(10), Err(ParseNumberError::InvalidDigit));
        assert_eq!(Bytes::from("--1").to_int::<i32>(10), Err(ParseNumberError::InvalidDigit));
        assert_eq!(Bytes::from("-1").to_int::<u32>(10), Err(ParseNumberError::InvalidDigit));
        assert_eq!(Bytes::from("300").to_int::<u8>(10), Err(ParseNumberError::Overflow));
        assert_eq!(Bytes::from("-129").to_int::<i8>(10), Err(ParseNumberError::Overflow));
        assert_eq!(Bytes::from("1").to_int::<i32>(1), Err(ParseNumberError::InvalidBase(1)));
        assert_eq!(Bytes::from("1").to_int::<i32>(37), Err(ParseNumberError::InvalidBase(37)));
        assert_eq!(Bytes::from("0x").to_int::<i32>(0), Err(ParseNumberError::InvalidDigit));
    }

    #[test]
    fn floats() {
        assert_eq!(Bytes::from(" 1.5 ").to_f64(), Ok(1.5));
        assert_eq!(Bytes::from("-2e3").to_f64(), Ok(-2000.0));
        assert_eq!(Bytes::from("one").to_f64(), Err(ParseNumberError::InvalidFloat));
        assert_eq!(Bytes::from("").to_f64(), Err(ParseNumberError::Empty));
        assert_eq!(Bytes::from("0.25").to_f32(), Ok(0.25f32));
        assert_eq!(Bytes::number_f64(1.26, Some(1)), "1.3");
        assert_eq!(Bytes::number_f64(0.5, None), "0.5");
    }

    #[test]
    fn formats_integers() {
        assert_eq!(Bytes::number(0, 10), "0");
        assert_eq!(Bytes::number(i64::MIN, 10), "-9223372036854775808");
        assert_eq!(Bytes::number(35, 36), "z");
        assert_eq!(Bytes::number(12, 99), "12");
        assert_eq!(Bytes::number_u64(u64::MAX, 16), "ffffffffffffffff");
        let n = Bytes::number(-1234, 10);
        assert_eq!(n.to_int::<i64>(10), Ok(-1234));
    }
}
