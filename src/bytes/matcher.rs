//! Boyer-Moore-Horspool substring search.

use super::Bytes;

/// Largest skip a table entry can hold.
const MAX_SKIP: usize = u8::MAX as usize;

/// Precompiled substring matcher.
///
/// Builds Horspool skip tables once for a fixed needle, then searches any
/// number of haystacks forwards or backwards. Skip distances are capped at
/// 255, so needles longer than that still work but skip less.
///
/// ```
/// use iocore::bytes::ByteMatcher;
///
/// let m = ByteMatcher::new("ab");
/// assert_eq!(m.index_in(b"xxabyab", 0), Some(2));
/// assert_eq!(m.index_in(b"xxabyab", 3), Some(5));
/// assert_eq!(m.last_index_in(b"xxabyab", 4), Some(2));
/// ```
#[derive(Debug, Clone)]
pub struct ByteMatcher {
    pattern: Bytes,
    forward: [u8; 256],
    reverse: [u8; 256],
}

impl ByteMatcher {
    /// Compile a matcher for `pattern`.
    #[must_use]
    pub fn new(pattern: impl AsRef<[u8]>) -> Self {
        Self::from_bytes(Bytes::copy_from_slice(pattern.as_ref()))
    }

    /// Compile a matcher that shares `pattern`'s storage.
    #[must_use]
    pub fn from_bytes(pattern: Bytes) -> Self {
        let mut matcher = Self {
            pattern: Bytes::new(),
            forward: [0; 256],
            reverse: [0; 256],
        };
        matcher.set_pattern(pattern);
        matcher
    }

    /// The needle this matcher searches for.
    #[must_use]
    pub const fn pattern(&self) -> &Bytes {
        &self.pattern
    }

    /// Replace the needle and rebuild both skip tables.
    pub fn set_pattern(&mut self, pattern: Bytes) {
        let len = pattern.len();
        let limit = len.min(MAX_SKIP);
        // both values are at most 255
        self.forward = [limit as u8; 256];
        self.reverse = [limit as u8; 256];
        for (i, &b) in pattern.iter().enumerate().skip(len - limit) {
            self.forward[usize::from(b)] = (len - 1 - i) as u8;
        }
        for (i, &b) in pattern.iter().enumerate().take(limit).rev() {
            self.reverse[usize::from(b)] = i as u8;
        }
        self.pattern = pattern;
    }

    /// First occurrence at or after `from`.
    ///
    /// An empty needle matches at `from` when `from <= haystack.len()`.
    #[must_use]
    pub fn index_in(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let needle = &self.pattern[..];
        let pl = needle.len();
        if pl == 0 {
            return (from <= haystack.len()).then_some(from);
        }
        if from > haystack.len() || haystack.len() - from < pl {
            return None;
        }
        let pl_minus_one = pl - 1;
        let mut current = from + pl_minus_one;
        while current < haystack.len() {
            let mut skip = usize::from(self.forward[usize::from(haystack[current])]);
            if skip == 0 {
                // possible match; compare backwards from the needle's tail
                while skip < pl && haystack[current - skip] == needle[pl_minus_one - skip] {
                    skip += 1;
                }
                if skip > pl_minus_one {
                    return Some(current - pl_minus_one);
                }
                // the table could not skip a full needle length here; step by one
                // unless the mismatching byte is absent from the needle
                skip = if usize::from(self.forward[usize::from(haystack[current - skip])]) == pl {
                    pl - skip
                } else {
                    1
                };
            }
            current += skip;
        }
        None
    }

    /// Last occurrence starting at or before `from`.
    ///
    /// `from` is clamped so the needle fits in the haystack.
    #[must_use]
    pub fn last_index_in(&self, haystack: &[u8], from: usize) -> Option<usize> {
        let needle = &self.pattern[..];
        let pl = needle.len();
        if pl == 0 {
            return Some(from.min(haystack.len()));
        }
        if haystack.len() < pl {
            return None;
        }
        let mut current = from.min(haystack.len() - pl);
        loop {
            let mut skip = usize::from(self.reverse[usize::from(haystack[current])]);
            if skip == 0 {
                if haystack[current..current + pl] == *needle {
                    return Some(current);
                }
                skip = 1;
            }
            current = current.checked_sub(skip)?;
        }
    }
}

impl Bytes {
    /// Index of the first occurrence of `needle` at or after `from`.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// let b = Bytes::from_static(b"abcabc");
    /// assert_eq!(b.index_of("bc", 0), Some(1));
    /// assert_eq!(b.index_of("bc", 2), Some(4));
    /// assert_eq!(b.index_of("", 6), Some(6));
    /// assert_eq!(b.index_of("zz", 0), None);
    /// ```
    #[must_use]
    pub fn index_of(&self, needle: impl AsRef<[u8]>, from: usize) -> Option<usize> {
        let needle = needle.as_ref();
        match needle {
            [] => (from <= self.len()).then_some(from),
            [b] => self.index_of_byte(*b, from),
            _ => ByteMatcher::new(needle).index_in(self, from),
        }
    }

    /// Index of the first `byte` at or after `from`.
    #[must_use]
    pub fn index_of_byte(&self, byte: u8, from: usize) -> Option<usize> {
        self.get(from..)?
            .iter()
            .position(|&b| b == byte)
            .map(|i| i + from)
    }

    /// Index of the last occurrence of `needle` starting at or before `from`.
    ///
    /// `None` searches from the end.
    #[must_use]
    pub fn last_index_of(&self, needle: impl AsRef<[u8]>, from: Option<usize>) -> Option<usize> {
        let needle = needle.as_ref();
        let from = from.unwrap_or(usize::MAX);
        match needle {
            [] => Some(from.min(self.len())),
            [b] => self.last_index_of_byte(*b, Some(from)),
            _ => ByteMatcher::new(needle).last_index_in(self, from),
        }
    }

    /// Index of the last `byte` at or before `from` (`None` = the end).
    #[must_use]
    pub fn last_index_of_byte(&self, byte: u8, from: Option<usize>) -> Option<usize> {
        if self.is_empty() {
            return None;
        }
        let end = from.map_or(self.len(), |f| f.min(self.len() - 1) + 1);
        self[..end].iter().rposition(|&b| b == byte)
    }

    /// Returns true if `needle` occurs anywhere.
    #[must_use]
    pub fn contains(&self, needle: impl AsRef<[u8]>) -> bool {
        self.index_of(needle, 0).is_some()
    }

    /// Number of (possibly overlapping) occurrences of `needle`.
    ///
    /// An empty needle matches at every position, including the end.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::from_static(b"aaaa").count("aa"), 3);
    /// assert_eq!(Bytes::from_static(b"abc").count(""), 4);
    /// ```
    #[must_use]
    pub fn count(&self, needle: impl AsRef<[u8]>) -> usize {
        let needle = needle.as_ref();
        if needle.is_empty() {
            return self.len() + 1;
        }
        let matcher = ByteMatcher::new(needle);
        let mut n = 0;
        let mut from = 0;
        while let Some(i) = matcher.index_in(self, from) {
            n += 1;
            from = i + 1;
        }
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn naive_forward(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() {
            return (from <= hay.len()).then_some(from);
        }
        (from..=hay.len().checked_sub(needle.len())?).find(|&i| &hay[i..i + needle.len()] == needle)
    }

    fn naive_reverse(hay: &[u8], needle: &[u8], from: usize) -> Option<usize> {
        if needle.is_empty() {
            return Some(from.min(hay.len()));
        }
        let last = hay.len().checked_sub(needle.len())?.min(from);
        (0..=last).rev().find(|&i| &hay[i..i + needle.len()] == needle)
    }

    #[test]
    fn finds_at_edges() {
        crate::test_utils::init_test_logging();
        crate::test_phase!("finds_at_edges");
        let m = ByteMatcher::new("abc");
        assert_eq!(m.index_in(b"abc", 0), Some(0));
        assert_eq!(m.index_in(b"xxabc", 0), Some(2));
        assert_eq!(m.index_in(b"xxabc", 3), None);
        assert_eq!(m.index_in(b"ab", 0), None);
        assert_eq!(m.index_in(b"abc", 9), None);
        assert_eq!(m.last_index_in(b"abcxabc", 100), Some(4));
        assert_eq!(m.last_index_in(b"abcxabc", 3), Some(0));
        assert_eq!(m.last_index_in(b"xx", 0), None);
        crate::test_complete!("finds_at_edges");
    }

    #[test]
    fn long_needles_beyond_skip_limit() {
        let needle: Vec<u8> = (0..300u32).map(|i| (i % 7) as u8 + b'a').collect();
        let mut hay = vec![b'z'; 500];
        hay.extend_from_slice(&needle);
        hay.extend_from_slice(b"tail");
        let m = ByteMatcher::new(&needle);
        assert_eq!(m.index_in(&hay, 0), Some(500));
        assert_eq!(m.last_index_in(&hay, usize::MAX), Some(500));
    }

    #[test]
    fn empty_needle() {
        let m = ByteMatcher::new("");
        assert_eq!(m.index_in(b"abc", 3), Some(3));
        assert_eq!(m.index_in(b"abc", 4), None);
        assert_eq!(m.last_index_in(b"abc", 10), Some(3));
    }

    #[test]
    fn byte_searches() {
        let b = Bytes::from_static(b"a,b,c");
        assert_eq!(b.index_of_byte(b',', 0), Some(1));
        assert_eq!(b.index_of_byte(b',', 2), Some(3));
        assert_eq!(b.index_of_byte(b',', 9), None);
        assert_eq!(b.last_index_of_byte(b',', None), Some(3));
        assert_eq!(b.last_index_of_byte(b',', Some(2)), Some(1));
        assert_eq!(b.last_index_of(",", Some(0)), None);
        assert!(b.contains("b,c"));
        assert!(!b.contains("c,"));
    }

    proptest! {
        #[test]
        fn matches_naive_search(
            hay in proptest::collection::vec(0u8..4, 0..64),
            needle in proptest::collection::vec(0u8..4, 0..6),
            from in 0usize..70,
        ) {
            let m = ByteMatcher::new(&needle);
            prop_assert_eq!(m.index_in(&hay, from), naive_forward(&hay, &needle, from));
            prop_assert_eq!(m.last_index_in(&hay, from), naive_reverse(&hay, &needle, from));
        }
    }
}
