//! Assignable single-byte proxy.

use super::Bytes;

/// Proxy for one byte of a [`Bytes`], returned by [`Bytes::at_mut`].
///
/// Reads go straight to the shared storage. Writes detach the sequence
/// first, so other handles never see them.
#[derive(Debug)]
pub struct ByteRef<'a> {
    bytes: &'a mut Bytes,
    index: usize,
}

impl<'a> ByteRef<'a> {
    pub(super) fn new(bytes: &'a mut Bytes, index: usize) -> Self {
        Self { bytes, index }
    }

    /// The index this proxy refers to.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Current value, or `None` if the index is past the end.
    #[must_use]
    pub fn get(&self) -> Option<u8> {
        self.bytes.at(self.index)
    }

    /// Store `value`, growing the sequence with zero bytes if needed.
    ///
    /// An index whose end would overflow `usize` is a no-op.
    pub fn set(&mut self, value: u8) {
        let Some(end) = self.index.checked_add(1) else {
            return;
        };
        if self.index >= self.bytes.len() {
            self.bytes.resize(end);
        }
        self.bytes.data_mut()[self.index] = value;
    }
}

impl PartialEq<u8> for ByteRef<'_> {
    fn eq(&self, other: &u8) -> bool {
        self.get() == Some(*other)
    }
}
