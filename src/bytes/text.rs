//! Text-oriented helpers: case mapping, whitespace handling, padding, splitting.
//!
//! Every helper comes in up to two flavours. The `&self` form never touches
//! the receiver's storage and allocates only when the result differs from the
//! input. The `into_*` form consumes the receiver and reuses its buffer in
//! place when it is the sole owner.

use super::Bytes;

/// ASCII whitespace as understood by the text helpers: space, `\t`, `\n`,
/// `\v`, `\f` and `\r`.
#[inline]
#[must_use]
pub const fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn trim_bounds(data: &[u8]) -> (usize, usize) {
    let start = data.iter().position(|&b| !is_space(b)).unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|&b| !is_space(b))
        .map_or(start, |i| i + 1);
    (start, end)
}

fn is_simplified(data: &[u8]) -> bool {
    let (start, end) = trim_bounds(data);
    start == 0
        && end == data.len()
        && data
            .windows(2)
            .all(|w| !is_space(w[0]) || (w[0] == b' ' && !is_space(w[1])))
}

/// Collapse whitespace runs in `data` in place; returns the new length.
fn simplify_in_place(data: &mut [u8]) -> usize {
    let mut out = 0;
    let mut pending_space = false;
    for i in 0..data.len() {
        let b = data[i];
        if is_space(b) {
            pending_space = out > 0;
        } else {
            if pending_space {
                data[out] = b' ';
                out += 1;
                pending_space = false;
            }
            data[out] = b;
            out += 1;
        }
    }
    out
}

impl Bytes {
    /// ASCII lowercase copy.
    ///
    /// Returns a shared handle when nothing needs to change.
    #[must_use]
    pub fn to_lower(&self) -> Self {
        if !self.iter().any(u8::is_ascii_uppercase) {
            return self.clone();
        }
        self.iter().map(u8::to_ascii_lowercase).collect()
    }

    /// ASCII lowercase, in place when this handle owns its storage.
    #[must_use]
    pub fn into_lower(mut self) -> Self {
        if !self.is_detached() {
            return self.to_lower();
        }
        self.data_mut().make_ascii_lowercase();
        self
    }

    /// ASCII uppercase copy.
    ///
    /// Returns a shared handle when nothing needs to change.
    #[must_use]
    pub fn to_upper(&self) -> Self {
        if !self.iter().any(u8::is_ascii_lowercase) {
            return self.clone();
        }
        self.iter().map(u8::to_ascii_uppercase).collect()
    }

    /// ASCII uppercase, in place when this handle owns its storage.
    #[must_use]
    pub fn into_upper(mut self) -> Self {
        if !self.is_detached() {
            return self.to_upper();
        }
        self.data_mut().make_ascii_uppercase();
        self
    }

    /// Returns true if no byte is an ASCII uppercase letter.
    #[must_use]
    pub fn is_lower(&self) -> bool {
        !self.iter().any(u8::is_ascii_uppercase)
    }

    /// Returns true if no byte is an ASCII lowercase letter.
    #[must_use]
    pub fn is_upper(&self) -> bool {
        !self.iter().any(u8::is_ascii_lowercase)
    }

    /// Leading and trailing whitespace removed.
    ///
    /// This is a view; nothing is copied.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::from_static(b" \t lots\t of\nwhitespace\r\n ").trimmed(),
    ///            "lots\t of\nwhitespace");
    /// ```
    #[must_use]
    pub fn trimmed(&self) -> Self {
        let (start, end) = trim_bounds(self);
        self.slice(start..end)
    }

    /// Like [`Bytes::trimmed`], but shifts the payload to the front of an
    /// owned buffer so later appends can reuse it.
    #[must_use]
    pub fn into_trimmed(mut self) -> Self {
        if !self.is_detached() {
            return self.trimmed();
        }
        let (start, end) = trim_bounds(&self);
        self.edit(|vec| {
            vec.truncate(end);
            vec.drain(..start);
        });
        self
    }

    /// Whitespace trimmed, and each internal run replaced by one space.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::from_static(b"  lots\t of\nwhitespace\r\n ").simplified(),
    ///            "lots of whitespace");
    /// ```
    #[must_use]
    pub fn simplified(&self) -> Self {
        if is_simplified(self) {
            return self.clone();
        }
        let mut out = self.to_vec();
        let len = simplify_in_place(&mut out);
        out.truncate(len);
        Self::from(out)
    }

    /// Like [`Bytes::simplified`], reusing the buffer when owned.
    #[must_use]
    pub fn into_simplified(mut self) -> Self {
        if !self.is_detached() {
            return self.simplified();
        }
        if !is_simplified(&self) {
            self.edit(|vec| {
                let len = simplify_in_place(vec);
                vec.truncate(len);
            });
        }
        self
    }

    /// Padded on the right with `fill` to `width` bytes.
    ///
    /// Longer input is returned whole, or cut to `width` if `truncate`.
    #[must_use]
    pub fn left_justified(&self, width: usize, fill: u8, truncate: bool) -> Self {
        if self.len() >= width {
            return if truncate { self.left(width) } else { self.clone() };
        }
        let mut out = Vec::with_capacity(width);
        out.extend_from_slice(self);
        out.resize(width, fill);
        Self::from(out)
    }

    /// Padded on the left with `fill` to `width` bytes.
    ///
    /// Longer input is returned whole, or cut to its first `width` bytes if
    /// `truncate`.
    #[must_use]
    pub fn right_justified(&self, width: usize, fill: u8, truncate: bool) -> Self {
        if self.len() >= width {
            return if truncate { self.left(width) } else { self.clone() };
        }
        let mut out = vec![fill; width - self.len()];
        out.extend_from_slice(self);
        Self::from(out)
    }

    /// The sequence repeated `times` times.
    #[must_use]
    pub fn repeated(&self, times: usize) -> Self {
        match times {
            0 => Self::new(),
            1 => self.clone(),
            _ => Self::from(self.as_ref().repeat(times)),
        }
    }

    /// Split on every `sep`, keeping empty pieces. Pieces share storage.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// let parts = Bytes::from_static(b"a,,b").split(b',');
    /// assert_eq!(parts, vec![Bytes::from("a"), Bytes::new(), Bytes::from("b")]);
    /// ```
    #[must_use]
    pub fn split(&self, sep: u8) -> Vec<Self> {
        let mut parts = Vec::new();
        let mut start = 0;
        while let Some(i) = self.index_of_byte(sep, start) {
            parts.push(self.slice(start..i));
            start = i + 1;
        }
        parts.push(self.slice(start..));
        parts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_mapping() {
        crate::test_utils::init_test_logging();
        crate::test_phase!("case_mapping");
        let a = Bytes::copy_from_slice(b"Hello, World 42");
        assert_eq!(a.to_lower(), "hello, world 42");
        assert_eq!(a.to_upper(), "HELLO, WORLD 42");
        assert_eq!(a, "Hello, World 42");

        let lower = Bytes::copy_from_slice(b"already lower");
        assert!(lower.to_lower().is_shared_with(&lower));
        assert!(lower.is_lower());
        assert!(!lower.is_upper());
        crate::test_complete!("case_mapping");
    }

    #[test]
    fn owned_case_mapping_reuses_buffer() {
        let owned = Bytes::copy_from_slice(b"MiXeD");
        let out = owned.into_lower();
        assert_eq!(out, "mixed");
        assert!(out.is_detached());

        let shared = Bytes::copy_from_slice(b"MiXeD");
        let keep = shared.clone();
        assert_eq!(shared.into_upper(), "MIXED");
        assert_eq!(keep, "MiXeD");
    }

    #[test]
    fn trimming() {
        let b = Bytes::copy_from_slice(b"\x0b\x0c  x y \r\n");
        assert_eq!(b.trimmed(), "x y");
        assert!(b.trimmed().is_shared_with(&b));
        assert!(Bytes::from_static(b"   ").trimmed().is_empty());

        let owned = Bytes::copy_from_slice(b"  pad  ").into_trimmed();
        assert_eq!(owned, "pad");
        assert!(owned.is_detached());
    }

    #[test]
    fn simplifying() {
        assert_eq!(Bytes::from_static(b"").simplified(), "");
        assert_eq!(Bytes::from_static(b" \t ").simplified(), "");
        assert_eq!(Bytes::from_static(b"a  b\t\tc").simplified(), "a b c");
        let clean = Bytes::copy_from_slice(b"a b c");
        assert!(clean.simplified().is_shared_with(&clean));
        let owned = Bytes::copy_from_slice(b"  a \n b  ").into_simplified();
        assert_eq!(owned, "a b");
    }

    #[test]
    fn justification() {
        let b = Bytes::from_static(b"apple");
        assert_eq!(b.left_justified(8, b'.', false), "apple...");
        assert_eq!(b.right_justified(8, b'.', false), "...apple");
        assert_eq!(b.left_justified(3, b'.', false), "apple");
        assert_eq!(b.left_justified(3, b'.', true), "app");
        assert_eq!(b.right_justified(3, b'.', true), "app");
    }

    #[test]
    fn repeating_and_splitting() {
        let b = Bytes::from_static(b"ab");
        assert_eq!(b.repeated(3), "ababab");
        assert!(b.repeated(0).is_empty());
        assert_eq!(Bytes::new().split(b','), vec![Bytes::new()]);
        assert_eq!(
            Bytes::from_static(b"k=v").split(b'='),
            vec![Bytes::from("k"), Bytes::from("v")]
        );
    }
}
