//! Shared, copy-on-write byte sequence.

use super::byte_ref::ByteRef;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::ops::{Add, AddAssign, Deref, RangeBounds};
use std::sync::Arc;

/// Reference-counted byte sequence with copy-on-write mutation.
///
/// Cloning a `Bytes` is O(1): it bumps an atomic reference count and shares
/// the storage. Views (`slice`, `mid`, `left`, `split_to`, ...) are O(1) as
/// well. Every mutating method takes `&mut self` and first *detaches*: if the
/// storage is shared with another handle, is static, or the handle is a view
/// that does not start at the beginning of its storage, the payload is copied
/// into a private allocation before the write happens. No other handle can
/// observe a mutation.
///
/// A default-constructed `Bytes` points at no storage at all and never
/// allocates.
///
/// # Examples
///
/// ```
/// use iocore::bytes::Bytes;
///
/// let a = Bytes::from_static(b"foo");
/// let mut b = a.clone();
/// assert!(b.is_shared_with(&a));
///
/// b.prepend("bar");
/// assert_eq!(b, "barfoo");
/// assert_eq!(a, "foo");
/// assert!(!b.is_shared_with(&a));
/// ```
#[derive(Clone)]
pub struct Bytes {
    /// The backing storage.
    data: BytesInner,
    /// Start offset within the backing storage.
    start: usize,
    /// Length of this view.
    len: usize,
    /// Capacity was requested explicitly; `squeeze` keeps it.
    reserved: bool,
}

#[derive(Clone)]
enum BytesInner {
    /// Empty bytes (no allocation).
    Empty,
    /// Static data (no allocation, never written in place).
    Static(&'static [u8]),
    /// Heap-allocated, reference-counted data.
    Shared(Arc<Vec<u8>>),
}

impl Bytes {
    /// Create an empty `Bytes`.
    ///
    /// No allocation occurs.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: BytesInner::Empty,
            start: 0,
            len: 0,
            reserved: false,
        }
    }

    /// Create `Bytes` from a static byte slice.
    ///
    /// No allocation occurs; the first mutation copies the data.
    #[must_use]
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self {
            data: BytesInner::Static(bytes),
            start: 0,
            len: bytes.len(),
            reserved: false,
        }
    }

    /// Create a view over raw data that is never owned.
    ///
    /// The data must outlive every handle, which the `'static` bound
    /// enforces. Equivalent to [`Bytes::from_static`].
    #[must_use]
    pub const fn from_raw_data(data: &'static [u8]) -> Self {
        Self::from_static(data)
    }

    /// Copy data from a slice into a new `Bytes`.
    #[must_use]
    pub fn copy_from_slice(data: &[u8]) -> Self {
        if data.is_empty() {
            return Self::new();
        }
        Self::from(data.to_vec())
    }

    /// Create `len` bytes, all set to `byte`.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// assert_eq!(Bytes::filled(3, b'x'), "xxx");
    /// ```
    #[must_use]
    pub fn filled(len: usize, byte: u8) -> Self {
        if len == 0 {
            return Self::new();
        }
        Self::from(vec![byte; len])
    }

    /// Create `len` bytes whose content the caller will overwrite.
    ///
    /// The bytes are zeroed.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::filled(len, 0)
    }

    /// Create an empty, privately owned `Bytes` with room for `capacity` bytes.
    ///
    /// The capacity counts as reserved (see [`Bytes::reserve`]).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::new();
        }
        Self {
            data: BytesInner::Shared(Arc::new(Vec::with_capacity(capacity))),
            start: 0,
            len: 0,
            reserved: true,
        }
    }

    /// Returns the number of bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if empty.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the number of bytes that fit without reallocating.
    ///
    /// Shared and static storage report their length: any write reallocates.
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.data {
            BytesInner::Shared(vec) if self.is_detached() => vec.capacity(),
            _ => self.len,
        }
    }

    /// Returns true if `reserve` (or `with_capacity`) pinned the capacity.
    #[must_use]
    pub const fn is_capacity_reserved(&self) -> bool {
        self.reserved
    }

    /// Returns true if this handle points at static (never owned) data.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        matches!(self.data, BytesInner::Static(_))
    }

    /// Returns true if the storage is private to this handle and can be
    /// written in place.
    ///
    /// Requires heap storage, a reference count of one and a view starting
    /// at offset zero.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        match &self.data {
            BytesInner::Shared(vec) => self.start == 0 && Arc::strong_count(vec) == 1,
            BytesInner::Empty | BytesInner::Static(_) => false,
        }
    }

    /// Returns true if both handles point at the same storage.
    ///
    /// The allocation-free empty value holds no storage and is never shared.
    #[must_use]
    pub fn is_shared_with(&self, other: &Self) -> bool {
        match (&self.data, &other.data) {
            (BytesInner::Shared(a), BytesInner::Shared(b)) => Arc::ptr_eq(a, b),
            (BytesInner::Static(a), BytesInner::Static(b)) => {
                !a.is_empty() && std::ptr::eq(a.as_ptr(), b.as_ptr())
            }
            _ => false,
        }
    }

    /// Give this handle a private copy of its storage.
    pub fn detach(&mut self) {
        self.make_mut();
    }

    /// Returns the bytes as a mutable slice, detaching first.
    pub fn data_mut(&mut self) -> &mut [u8] {
        self.make_mut().as_mut_slice()
    }

    /// Returns the byte at `index`, or `None` past the end.
    #[inline]
    #[must_use]
    pub fn at(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Returns an assignable proxy for the byte at `index`.
    ///
    /// Reading through the proxy never copies; writing detaches, and writing
    /// past the end grows the sequence (zero-filling any gap).
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// let mut b = Bytes::from_static(b"ab");
    /// b.at_mut(3).set(b'd');
    /// assert_eq!(b, b"ab\0d");
    /// ```
    pub fn at_mut(&mut self, index: usize) -> ByteRef<'_> {
        ByteRef::new(self, index)
    }

    /// Resize to `len` bytes, zero-filling when growing.
    pub fn resize(&mut self, len: usize) {
        self.resize_with(len, 0);
    }

    /// Resize to `len` bytes, filling new bytes with `fill`.
    ///
    /// Shrinking only narrows the view. Shrinking to zero without reserved
    /// capacity drops the storage.
    pub fn resize_with(&mut self, len: usize, fill: u8) {
        match len.cmp(&self.len) {
            Ordering::Equal => {}
            Ordering::Less if len == 0 && !self.reserved => *self = Self::new(),
            Ordering::Less => self.len = len,
            Ordering::Greater => self.edit_with_capacity(len, |vec| vec.resize(len, fill)),
        }
    }

    /// Ensure room for at least `capacity` bytes without changing the length.
    ///
    /// The capacity is marked as reserved, so [`Bytes::squeeze`] keeps it.
    pub fn reserve(&mut self, capacity: usize) {
        self.reserved = true;
        if capacity == 0 || (self.is_detached() && self.capacity() >= capacity) {
            return;
        }
        let vec = self.make_mut_with_capacity(capacity);
        if vec.capacity() < capacity {
            vec.reserve(capacity - vec.len());
        }
    }

    /// Release capacity not needed for the current length.
    ///
    /// Capacity pinned by [`Bytes::reserve`] is kept until [`Bytes::clear`].
    pub fn squeeze(&mut self) {
        if self.reserved {
            return;
        }
        if self.len == 0 {
            *self = Self::new();
            return;
        }
        if let BytesInner::Shared(vec) = &mut self.data {
            if self.start == 0 {
                if let Some(vec) = Arc::get_mut(vec) {
                    vec.truncate(self.len);
                    vec.shrink_to_fit();
                }
            }
        }
    }

    /// Truncate to `len` bytes. No effect if `len >= self.len()`.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.resize(len);
        }
    }

    /// Remove `n` bytes from the end.
    pub fn chop(&mut self, n: usize) {
        self.truncate(self.len.saturating_sub(n));
    }

    /// Reset to the empty value, dropping storage and reserved capacity.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    // === Views ===

    /// Returns a slice of self for the given range.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    #[must_use]
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        use std::ops::Bound;

        let start = match range.start_bound() {
            Bound::Included(&n) => n,
            Bound::Excluded(&n) => n.checked_add(1).expect("range start overflow"),
            Bound::Unbounded => 0,
        };

        let end = match range.end_bound() {
            Bound::Included(&n) => n.checked_add(1).expect("range end overflow"),
            Bound::Excluded(&n) => n,
            Bound::Unbounded => self.len,
        };

        assert!(
            start <= end && end <= self.len,
            "slice bounds out of range: start={start}, end={end}, len={}",
            self.len
        );

        self.view(start, end - start)
    }

    /// Split off the bytes from `at` to the end.
    ///
    /// Self becomes `[0, at)`, returns `[at, len)`.
    ///
    /// # Panics
    ///
    /// Panics if `at > len`.
    pub fn split_off(&mut self, at: usize) -> Self {
        assert!(
            at <= self.len,
            "split_off out of bounds: at={at}, len={}",
            self.len
        );
        let other = self.view(at, self.len - at);
        self.len = at;
        other
    }

    /// Split off bytes from the beginning.
    ///
    /// Self becomes `[at, len)`, returns `[0, at)`.
    ///
    /// # Panics
    ///
    /// Panics if `at > len`.
    pub fn split_to(&mut self, at: usize) -> Self {
        assert!(
            at <= self.len,
            "split_to out of bounds: at={at}, len={}",
            self.len
        );
        let other = self.view(0, at);
        self.start += at;
        self.len -= at;
        other
    }

    /// The first `n` bytes (all of them if `n >= len`).
    #[must_use]
    pub fn left(&self, n: usize) -> Self {
        self.view(0, n.min(self.len))
    }

    /// The last `n` bytes (all of them if `n >= len`).
    #[must_use]
    pub fn right(&self, n: usize) -> Self {
        let n = n.min(self.len);
        self.view(self.len - n, n)
    }

    /// `len` bytes starting at `pos`; `None` means "to the end".
    ///
    /// Out-of-range arguments clamp.
    ///
    /// ```
    /// use iocore::bytes::Bytes;
    ///
    /// let b = Bytes::from_static(b"hello world");
    /// assert_eq!(b.mid(6, None), "world");
    /// assert_eq!(b.mid(3, Some(2)), "lo");
    /// assert!(b.mid(40, Some(2)).is_empty());
    /// ```
    #[must_use]
    pub fn mid(&self, pos: usize, len: Option<usize>) -> Self {
        if pos >= self.len {
            return Self::new();
        }
        let avail = self.len - pos;
        self.view(pos, len.map_or(avail, |n| n.min(avail)))
    }

    /// All but the last `n` bytes.
    #[must_use]
    pub fn chopped(&self, n: usize) -> Self {
        self.left(self.len.saturating_sub(n))
    }

    // === Mutators ===

    /// Append `data` to the end.
    pub fn append(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();
        if !data.is_empty() {
            self.edit_with_capacity(self.len + data.len(), |vec| vec.extend_from_slice(data));
        }
        self
    }

    /// Append a shared sequence, sharing its storage if `self` is empty.
    pub fn append_bytes(&mut self, other: &Self) -> &mut Self {
        if self.is_empty() && !self.reserved {
            *self = other.clone();
            return self;
        }
        self.append(other.as_slice())
    }

    /// Append one byte.
    pub fn push(&mut self, byte: u8) -> &mut Self {
        self.edit_with_capacity(self.len + 1, |vec| vec.push(byte));
        self
    }

    /// Insert `data` at the front.
    pub fn prepend(&mut self, data: impl AsRef<[u8]>) -> &mut Self {
        self.insert(0, data)
    }

    /// Insert `data` at `index`.
    ///
    /// Inserting past the end pads the gap with spaces. A target whose end
    /// would overflow `usize` leaves the sequence unchanged.
    pub fn insert(&mut self, index: usize, data: impl AsRef<[u8]>) -> &mut Self {
        let data = data.as_ref();
        if data.is_empty() {
            return self;
        }
        let old_len = self.len;
        let Some(new_len) = index.max(old_len).checked_add(data.len()) else {
            return self;
        };
        self.edit_with_capacity(new_len, |vec| {
            if index > old_len {
                vec.resize(index, b' ');
            }
            vec.extend_from_slice(data);
            if index < old_len {
                vec[index..].rotate_right(data.len());
            }
        });
        self
    }

    /// Remove `len` bytes starting at `pos`. Out-of-range requests clamp.
    ///
    /// Removing from the front only narrows the view.
    pub fn remove(&mut self, pos: usize, len: usize) -> &mut Self {
        if len == 0 || pos >= self.len {
            return self;
        }
        let len = len.min(self.len - pos);
        if pos + len == self.len {
            self.resize(pos);
        } else if pos == 0 {
            self.start += len;
            self.len -= len;
        } else {
            self.edit(|vec| {
                vec.drain(pos..pos + len);
            });
        }
        self
    }

    /// Replace `len` bytes at `pos` with `after`.
    pub fn replace(&mut self, pos: usize, len: usize, after: impl AsRef<[u8]>) -> &mut Self {
        let after = after.as_ref();
        if len == after.len() && pos + len <= self.len {
            if len > 0 {
                self.data_mut()[pos..pos + len].copy_from_slice(after);
            }
            return self;
        }
        self.remove(pos, len);
        self.insert(pos, after)
    }

    /// Replace every non-overlapping occurrence of `before` with `after`.
    ///
    /// An empty `before` leaves the sequence unchanged.
    pub fn replace_all(&mut self, before: impl AsRef<[u8]>, after: impl AsRef<[u8]>) -> &mut Self {
        let (before, after) = (before.as_ref(), after.as_ref());
        if before.is_empty() || self.len < before.len() {
            return self;
        }
        let matcher = super::ByteMatcher::new(before);
        let Some(first) = matcher.index_in(self, 0) else {
            return self;
        };
        let mut out = Vec::with_capacity(self.len);
        let mut last = 0;
        let mut hit = Some(first);
        while let Some(i) = hit {
            out.extend_from_slice(&self[last..i]);
            out.extend_from_slice(after);
            last = i + before.len();
            hit = matcher.index_in(self, last);
        }
        out.extend_from_slice(&self[last..]);
        let reserved = self.reserved;
        *self = Self::from(out);
        self.reserved = reserved && !self.is_empty();
        self
    }

    /// Replace every `before` byte with `after`.
    pub fn replace_byte(&mut self, before: u8, after: u8) -> &mut Self {
        if before != after && self.as_slice().contains(&before) {
            for b in self.data_mut() {
                if *b == before {
                    *b = after;
                }
            }
        }
        self
    }

    /// Set every byte to `byte`, first resizing to `size` if given.
    pub fn fill(&mut self, byte: u8, size: Option<usize>) -> &mut Self {
        if let Some(size) = size {
            self.resize(size);
        }
        if !self.is_empty() {
            self.data_mut().fill(byte);
        }
        self
    }

    // === Internals shared with the sibling modules ===

    fn view(&self, offset: usize, len: usize) -> Self {
        if len == 0 {
            return Self::new();
        }
        Self {
            data: self.data.clone(),
            start: self.start + offset,
            len,
            reserved: false,
        }
    }

    /// Get the underlying byte slice.
    fn as_slice(&self) -> &[u8] {
        match &self.data {
            BytesInner::Empty => &[],
            BytesInner::Static(s) => &s[self.start..self.start + self.len],
            BytesInner::Shared(arc) => &arc[self.start..self.start + self.len],
        }
    }

    fn make_mut(&mut self) -> &mut Vec<u8> {
        self.make_mut_with_capacity(self.len)
    }

    /// Detach if needed and hand out the private storage, trimmed to the view.
    fn make_mut_with_capacity(&mut self, min_capacity: usize) -> &mut Vec<u8> {
        if !self.is_detached() {
            let keep = if self.reserved { self.capacity() } else { 0 };
            let mut vec = Vec::with_capacity(min_capacity.max(self.len).max(keep));
            vec.extend_from_slice(self.as_slice());
            self.data = BytesInner::Shared(Arc::new(vec));
            self.start = 0;
        }
        let len = self.len;
        match &mut self.data {
            BytesInner::Shared(arc) => {
                let vec = Arc::make_mut(arc);
                vec.truncate(len);
                vec
            }
            BytesInner::Empty | BytesInner::Static(_) => {
                unreachable!("detached storage is always heap allocated")
            }
        }
    }

    /// Run `f` on the detached storage and adopt its resulting length.
    pub(super) fn edit<R>(&mut self, f: impl FnOnce(&mut Vec<u8>) -> R) -> R {
        self.edit_with_capacity(self.len, f)
    }

    pub(super) fn edit_with_capacity<R>(
        &mut self,
        min_capacity: usize,
        f: impl FnOnce(&mut Vec<u8>) -> R,
    ) -> R {
        let vec = self.make_mut_with_capacity(min_capacity);
        let out = f(vec);
        let len = vec.len();
        self.len = len;
        out
    }
}

impl Default for Bytes {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Borrow<[u8]> for Bytes {
    fn borrow(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(vec: Vec<u8>) -> Self {
        if vec.is_empty() {
            return Self::new();
        }
        let len = vec.len();
        Self {
            data: BytesInner::Shared(Arc::new(vec)),
            start: 0,
            len,
            reserved: false,
        }
    }
}

impl From<&'static [u8]> for Bytes {
    fn from(slice: &'static [u8]) -> Self {
        Self::from_static(slice)
    }
}

impl From<&'static str> for Bytes {
    fn from(s: &'static str) -> Self {
        Self::from_static(s.as_bytes())
    }
}

impl From<String> for Bytes {
    fn from(s: String) -> Self {
        Self::from(s.into_bytes())
    }
}

impl From<Bytes> for Vec<u8> {
    fn from(bytes: Bytes) -> Self {
        bytes.as_slice().to_vec()
    }
}

impl FromIterator<u8> for Bytes {
    fn from_iter<I: IntoIterator<Item = u8>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<Vec<u8>>())
    }
}

impl Extend<u8> for Bytes {
    fn extend<I: IntoIterator<Item = u8>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        let hint = iter.size_hint().0;
        self.edit_with_capacity(self.len + hint, |vec| vec.extend(iter));
    }
}

impl<'a> Extend<&'a u8> for Bytes {
    fn extend<I: IntoIterator<Item = &'a u8>>(&mut self, iter: I) {
        self.extend(iter.into_iter().copied());
    }
}

impl<T: AsRef<[u8]>> AddAssign<T> for Bytes {
    fn add_assign(&mut self, rhs: T) {
        self.append(rhs);
    }
}

impl<T: AsRef<[u8]>> Add<T> for Bytes {
    type Output = Self;

    fn add(mut self, rhs: T) -> Self {
        self.append(rhs);
        self
    }
}

impl std::fmt::Debug for Bytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "b\"{}\"", self.as_slice().escape_ascii())
    }
}

impl PartialEq for Bytes {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Bytes {}

impl PartialOrd for Bytes {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Bytes {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl PartialEq<[u8]> for Bytes {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialEq<Bytes> for [u8] {
    fn eq(&self, other: &Bytes) -> bool {
        self == other.as_slice()
    }
}

impl PartialEq<&[u8]> for Bytes {
    fn eq(&self, other: &&[u8]) -> bool {
        self.as_slice() == *other
    }
}

impl<const N: usize> PartialEq<[u8; N]> for Bytes {
    fn eq(&self, other: &[u8; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<const N: usize> PartialEq<&[u8; N]> for Bytes {
    fn eq(&self, other: &&[u8; N]) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl PartialEq<Vec<u8>> for Bytes {
    fn eq(&self, other: &Vec<u8>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl PartialEq<str> for Bytes {
    fn eq(&self, other: &str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl PartialEq<&str> for Bytes {
    fn eq(&self, other: &&str) -> bool {
        self.as_slice() == other.as_bytes()
    }
}

impl std::hash::Hash for Bytes {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Bytes;
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::fmt;

    impl Serialize for Bytes {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_bytes(self)
        }
    }

    struct BytesVisitor;

    impl<'de> Visitor<'de> for BytesVisitor {
        type Value = Bytes;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a byte array")
        }

        fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Bytes, E> {
            Ok(Bytes::copy_from_slice(v))
        }

        fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Bytes, E> {
            Ok(Bytes::from(v))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Bytes, E> {
            Ok(Bytes::copy_from_slice(v.as_bytes()))
        }

        fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Bytes, A::Error> {
            let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
            while let Some(b) = seq.next_element::<u8>()? {
                out.push(b);
            }
            Ok(Bytes::from(out))
        }
    }

    impl<'de> Deserialize<'de> for Bytes {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            deserializer.deserialize_byte_buf(BytesVisitor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn new_is_empty_and_unallocated() {
        init_test("new_is_empty_and_unallocated");
        let b = Bytes::new();
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 0);
        assert!(!b.is_detached());
        assert!(!b.is_shared_with(&Bytes::default()));
        crate::test_complete!("new_is_empty_and_unallocated");
    }

    #[test]
    fn prepend_scenario() {
        init_test("prepend_scenario");
        let mut b = Bytes::from("foo");
        b.prepend("bar");
        assert_eq!(b, "barfoo");
        assert_eq!(*Bytes::from("foo").prepend("bar"), "barfoo");
        crate::test_complete!("prepend_scenario");
    }

    #[test]
    fn clone_shares_and_mutation_detaches() {
        init_test("clone_shares_and_mutation_detaches");
        let a = Bytes::copy_from_slice(b"hello");
        let mut b = a.clone();
        assert!(a.is_shared_with(&b));
        assert!(!a.is_detached());

        b.append(" world");
        assert_eq!(a, "hello");
        assert_eq!(b, "hello world");
        assert!(!a.is_shared_with(&b));
        assert!(b.is_detached());
        // the last owner may write in place again
        assert!(a.is_detached());
        crate::test_complete!("clone_shares_and_mutation_detaches");
    }

    #[test]
    fn static_data_is_copied_on_write() {
        init_test("static_data_is_copied_on_write");
        static DATA: &[u8] = b"literal";
        let mut b = Bytes::from_raw_data(DATA);
        assert!(b.is_static());
        assert!(!b.is_detached());
        b.data_mut()[0] = b'L';
        assert!(!b.is_static());
        assert_eq!(b, "Literal");
        assert_eq!(DATA, b"literal");
        crate::test_complete!("static_data_is_copied_on_write");
    }

    #[test]
    fn views_detach_before_write() {
        init_test("views_detach_before_write");
        let whole = Bytes::copy_from_slice(b"hello world");
        let mut world = whole.mid(6, None);
        assert!(world.is_shared_with(&whole));
        assert!(!world.is_detached());
        world.push(b'!');
        assert_eq!(world, "world!");
        assert_eq!(whole, "hello world");
        crate::test_complete!("views_detach_before_write");
    }

    #[test]
    fn unique_front_view_writes_in_place() {
        let mut b = Bytes::copy_from_slice(b"abcdef");
        b.truncate(3);
        assert!(b.is_detached());
        b.append("x");
        assert_eq!(b, "abcx");
    }

    #[test]
    fn byte_ref_reads_without_copy_and_writes_with_detach() {
        init_test("byte_ref_reads_without_copy_and_writes_with_detach");
        let a = Bytes::copy_from_slice(b"abc");
        let mut b = a.clone();
        assert_eq!(b.at_mut(1).get(), Some(b'b'));
        assert!(b.is_shared_with(&a));

        b.at_mut(1).set(b'X');
        assert_eq!(b, "aXc");
        assert_eq!(a, "abc");

        b.at_mut(5).set(b'z');
        assert_eq!(b, b"aXc\0\0z");
        crate::test_complete!("byte_ref_reads_without_copy_and_writes_with_detach");
    }

    #[test]
    fn resize_and_fill() {
        let mut b = Bytes::filled(2, b'a');
        b.resize(4);
        assert_eq!(b, b"aa\0\0");
        b.resize_with(6, b'z');
        assert_eq!(b, b"aa\0\0zz");
        b.fill(b'q', Some(3));
        assert_eq!(b, "qqq");
        b.resize(0);
        assert!(b.is_empty());
        assert_eq!(b.capacity(), 0);
    }

    #[test]
    fn reserve_survives_squeeze() {
        let mut b = Bytes::new();
        b.reserve(100);
        assert!(b.capacity() >= 100);
        assert!(b.is_capacity_reserved());
        b.append("abc");
        b.squeeze();
        assert!(b.capacity() >= 100);
        b.resize(0);
        assert!(b.capacity() >= 100);

        b.clear();
        assert!(!b.is_capacity_reserved());
        assert_eq!(b.capacity(), 0);

        let mut plain = Bytes::new();
        plain.append("abc");
        plain.edit(|vec| vec.reserve(64));
        plain.squeeze();
        assert_eq!(plain.capacity(), 3);
    }

    #[test]
    fn insert_with_overflowing_end_is_a_no_op() {
        let shared = Bytes::from("abc");
        let mut b = shared.clone();
        b.insert(usize::MAX, "x");
        assert_eq!(b, "abc");
        assert!(b.is_shared_with(&shared));
        b.at_mut(usize::MAX).set(b'y');
        assert_eq!(b, "abc");
    }

    #[test]
    fn insert_remove_replace() {
        init_test("insert_remove_replace");
        let mut b = Bytes::from("held");
        b.insert(2, "llo wor");
        assert_eq!(b, "hello world");
        b.insert(13, "!");
        assert_eq!(b, "hello world  !");

        b.remove(11, 100);
        assert_eq!(b, "hello world");
        b.remove(0, 6);
        assert_eq!(b, "world");
        b.remove(1, 3);
        assert_eq!(b, "wd");

        let mut r = Bytes::from("abcdef");
        r.replace(1, 2, "XY");
        assert_eq!(r, "aXYdef");
        r.replace(1, 2, "123");
        assert_eq!(r, "a123def");
        r.replace(4, 10, "");
        assert_eq!(r, "a123");
        crate::test_complete!("insert_remove_replace");
    }

    #[test]
    fn replace_all_is_non_overlapping() {
        let mut b = Bytes::from("aaaa-aa");
        b.replace_all("aa", "b");
        assert_eq!(b, "bb-b");

        let mut c = Bytes::from("no match");
        let before = c.clone();
        c.replace_all("zz", "y");
        assert!(c.is_shared_with(&before));

        let mut d = Bytes::from("a.b.c");
        d.replace_byte(b'.', b'/');
        assert_eq!(d, "a/b/c");
    }

    #[test]
    fn views_clamp() {
        let b = Bytes::from("hello");
        assert_eq!(b.left(2), "he");
        assert_eq!(b.left(99), "hello");
        assert_eq!(b.right(3), "llo");
        assert_eq!(b.right(99), "hello");
        assert_eq!(b.chopped(2), "hel");
        assert!(b.chopped(9).is_empty());
        assert_eq!(b.mid(1, Some(100)), "ello");
    }

    #[test]
    fn chop_and_truncate() {
        let mut b = Bytes::from("hello");
        b.chop(2);
        assert_eq!(b, "hel");
        b.truncate(10);
        assert_eq!(b, "hel");
        b.chop(10);
        assert!(b.is_empty());
    }

    #[test]
    fn append_bytes_shares_into_empty() {
        let src = Bytes::copy_from_slice(b"payload");
        let mut dst = Bytes::new();
        dst.append_bytes(&src);
        assert!(dst.is_shared_with(&src));
        dst.append_bytes(&src);
        assert_eq!(dst, "payloadpayload");
        assert_eq!(src, "payload");
    }

    #[test]
    fn ordering_and_operators() {
        let a = Bytes::from("abc");
        let b = Bytes::from("abd");
        assert!(a < b);
        let c = a.clone() + "def";
        assert_eq!(c, "abcdef");
        let mut d = Bytes::new();
        d += b"xy";
        d.extend([b'z']);
        assert_eq!(d, "xyz");
        assert_eq!(format!("{d:?}"), "b\"xyz\"");
    }

    #[test]
    fn split_off_and_split_to() {
        let mut b = Bytes::from_static(b"hello world");
        let world = b.split_off(6);
        assert_eq!(b, "hello ");
        assert_eq!(world, "world");

        let mut c = Bytes::from_static(b"hello world");
        let hello = c.split_to(6);
        assert_eq!(hello, "hello ");
        assert_eq!(c, "world");
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn slice_out_of_range_panics() {
        let b = Bytes::from_static(b"hello");
        let _bad = b.slice(0..100);
    }

    #[test]
    fn bytes_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Bytes>();
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_round_trip() {
        let b = Bytes::from("hi");
        let json = serde_json::to_string(&b).expect("serialize");
        assert_eq!(json, "[104,105]");
        let back: Bytes = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, b);
    }
}
