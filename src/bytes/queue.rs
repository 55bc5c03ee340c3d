//! Chunked FIFO byte queue.
//!
//! [`ByteQueue`] stores data as a list of [`Bytes`] chunks. Writers reserve
//! space at the tail (or, for unget, at the head) and fill it in place;
//! readers consume from the head. Appending an existing `Bytes` adopts it as
//! a chunk without copying, and reading a whole chunk hands the chunk back
//! the same way.
//!
//! # Layout
//!
//! ```text
//!  chunks[0]                 chunks[1]        chunks[n-1]
//! +---------+-----------+   +-----------+   +-------------+---------+
//! | consumed| data      |   | data      |...| data        | spare   |
//! +---------+-----------+   +-----------+   +-------------+---------+
//!           ^head                                         ^tail
//! ```
//!
//! `head` is the read offset inside the first chunk and `tail` the end of
//! valid data inside the last one. With a single chunk, data is
//! `chunks[0][head..tail]`. There is always at least one chunk.

use super::Bytes;
use std::collections::VecDeque;

/// Default chunk allocation size.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Largest single reservation the queue accepts.
const MAX_CHUNK_SIZE: usize = isize::MAX.unsigned_abs();

/// FIFO byte queue built from shared chunks.
///
/// ```
/// use iocore::bytes::{ByteQueue, Bytes};
///
/// let mut q = ByteQueue::new();
/// q.append_slice(b"hello ");
/// q.append(Bytes::from_static(b"world\n"));
/// assert_eq!(q.len(), 12);
/// assert!(q.can_read_line());
///
/// let mut line = [0u8; 32];
/// assert_eq!(q.read_line(&mut line), Some(12));
/// assert_eq!(&line[..13], b"hello world\n\0");
/// assert!(q.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct ByteQueue {
    chunks: VecDeque<Bytes>,
    head: usize,
    tail: usize,
    len: usize,
    chunk_size: usize,
}

impl Default for ByteQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl ByteQueue {
    /// Create an empty queue with [`DEFAULT_CHUNK_SIZE`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create an empty queue that allocates chunks of at least `chunk_size` bytes.
    ///
    /// A chunk size of 0 keeps appending to one growing chunk.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        let mut chunks = VecDeque::with_capacity(2);
        chunks.push_back(Bytes::new());
        Self {
            chunks,
            head: 0,
            tail: 0,
            len: 0,
            chunk_size,
        }
    }

    /// Minimum chunk allocation size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Change the minimum chunk allocation size for future chunks.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.chunk_size = chunk_size;
    }

    /// Number of queued bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no bytes are queued.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of chunks currently held (always at least one).
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    fn first_mut(&mut self) -> &mut Bytes {
        if self.chunks.is_empty() {
            self.chunks.push_back(Bytes::new());
        }
        &mut self.chunks[0]
    }

    fn last_mut(&mut self) -> &mut Bytes {
        if self.chunks.is_empty() {
            self.chunks.push_back(Bytes::new());
        }
        let last = self.chunks.len() - 1;
        &mut self.chunks[last]
    }

    /// Valid data in each chunk, front to back.
    pub fn blocks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        let last = self.chunks.len().saturating_sub(1);
        self.chunks.iter().enumerate().map(move |(i, chunk)| {
            let start = if i == 0 { self.head } else { 0 };
            let end = if i == last { self.tail } else { chunk.len() };
            &chunk[start..end]
        })
    }

    /// Length of the contiguous data at the front.
    #[must_use]
    pub fn next_data_block_size(&self) -> usize {
        self.read_pointer().len()
    }

    /// The contiguous data at the front.
    #[must_use]
    pub fn read_pointer(&self) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        self.blocks().next().unwrap_or_default()
    }

    /// The contiguous data starting `pos` bytes into the queue.
    ///
    /// Empty if `pos` is at or past the end.
    #[must_use]
    pub fn read_pointer_at_position(&self, pos: usize) -> &[u8] {
        let mut pos = pos;
        for block in self.blocks() {
            if pos < block.len() {
                return &block[pos..];
            }
            pos -= block.len();
        }
        &[]
    }

    /// Reserve `n` bytes at the tail and return them for filling.
    ///
    /// The bytes count as queued immediately; give back what went unused
    /// with [`ByteQueue::chop`]. Returns `None` for `n == 0` or an
    /// unrepresentable size.
    pub fn reserve(&mut self, n: usize) -> Option<&mut [u8]> {
        if n == 0 || n >= MAX_CHUNK_SIZE {
            return None;
        }
        let new_size = self.tail + n;
        let (last_len, last_capacity) = {
            let last = self.last_mut();
            (last.len(), last.capacity())
        };
        if new_size > last_len {
            if new_size > last_capacity
                && ((self.chunk_size > 0 && self.tail >= self.chunk_size)
                    || new_size >= MAX_CHUNK_SIZE)
            {
                let tail = self.tail;
                self.last_mut().resize(tail);
                self.chunks.push_back(Bytes::new());
                self.tail = 0;
            }
            let size = self.chunk_size.max(self.tail + n);
            self.last_mut().resize(size);
        }
        let start = self.tail;
        self.len += n;
        self.tail += n;
        Some(&mut self.last_mut().data_mut()[start..start + n])
    }

    /// Reserve `n` bytes at the head and return them for filling.
    pub fn reserve_front(&mut self, n: usize) -> Option<&mut [u8]> {
        if n == 0 || n >= MAX_CHUNK_SIZE {
            return None;
        }
        if self.head < n {
            let head = self.head;
            self.first_mut().remove(0, head);
            if self.chunks.len() == 1 {
                self.tail -= head;
            }
            self.head = self.chunk_size.max(n);
            if self.len == 0 {
                self.tail = self.head;
            } else {
                self.chunks.push_front(Bytes::new());
            }
            let head = self.head;
            self.first_mut().resize(head);
        }
        self.head -= n;
        self.len += n;
        let head = self.head;
        Some(&mut self.first_mut().data_mut()[head..head + n])
    }

    /// Drop `n` bytes from the front (clamped to the queued length).
    pub fn free(&mut self, n: usize) {
        let mut n = n.min(self.len);
        while n > 0 {
            let first_len = self.chunks.front().map_or(0, Bytes::len);
            let block = first_len - self.head;
            if self.chunks.len() == 1 || block > n {
                if self.len <= n {
                    self.reset_or_clear(first_len);
                } else {
                    self.head += n;
                    self.len -= n;
                }
                return;
            }
            self.len -= block;
            n -= block;
            self.chunks.pop_front();
            self.head = 0;
        }
    }

    /// Drop `n` bytes from the back (clamped to the queued length).
    pub fn chop(&mut self, n: usize) {
        let mut n = n.min(self.len);
        while n > 0 {
            if self.chunks.len() == 1 || self.tail > n {
                if self.len <= n {
                    let first_len = self.chunks.front().map_or(0, Bytes::len);
                    self.reset_or_clear(first_len);
                } else {
                    self.tail -= n;
                    self.len -= n;
                }
                return;
            }
            self.len -= self.tail;
            n -= self.tail;
            self.chunks.pop_back();
            self.tail = self.chunks.back().map_or(0, Bytes::len);
        }
    }

    /// Everything was consumed: keep a small chunk for reuse, drop a big one.
    fn reset_or_clear(&mut self, first_len: usize) {
        if first_len <= self.chunk_size {
            self.len = 0;
            self.head = 0;
            self.tail = 0;
        } else {
            self.clear();
        }
    }

    /// Drop all data and all chunks but an empty first one.
    pub fn clear(&mut self) {
        self.chunks.truncate(1);
        self.first_mut().clear();
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }

    /// Append a whole `Bytes` as a chunk without copying.
    pub fn append(&mut self, data: Bytes) {
        if data.is_empty() {
            return;
        }
        if self.tail == 0 {
            *self.last_mut() = data;
        } else {
            let tail = self.tail;
            self.last_mut().resize(tail);
            self.chunks.push_back(data);
        }
        self.tail = self.chunks.back().map_or(0, Bytes::len);
        self.len += self.tail;
    }

    /// Copy `data` onto the tail.
    pub fn append_slice(&mut self, data: &[u8]) {
        if let Some(dst) = self.reserve(data.len()) {
            dst.copy_from_slice(data);
        }
    }

    /// Append one byte.
    pub fn put_char(&mut self, byte: u8) {
        if let Some(dst) = self.reserve(1) {
            dst[0] = byte;
        }
    }

    /// Remove and return the first byte.
    pub fn get_char(&mut self) -> Option<u8> {
        let byte = *self.read_pointer().first()?;
        self.free(1);
        Some(byte)
    }

    /// Push one byte back onto the front.
    pub fn unget_char(&mut self, byte: u8) {
        if self.head > 0 {
            self.head -= 1;
            self.len += 1;
            let head = self.head;
            self.first_mut().data_mut()[head] = byte;
        } else if let Some(dst) = self.reserve_front(1) {
            dst[0] = byte;
        }
    }

    /// Copy up to `dst.len()` bytes from the front into `dst`, consuming them.
    pub fn read(&mut self, dst: &mut [u8]) -> usize {
        let want = dst.len().min(self.len);
        let mut done = 0;
        while done < want {
            let block = self.read_pointer();
            let n = block.len().min(want - done);
            dst[done..done + n].copy_from_slice(&block[..n]);
            done += n;
            self.free(n);
        }
        done
    }

    /// Remove and return the first chunk's data without copying.
    #[must_use]
    pub fn read_chunk(&mut self) -> Bytes {
        if self.len == 0 {
            return Bytes::new();
        }
        let mut chunk = self.chunks.pop_front().unwrap_or_default();
        if self.chunks.is_empty() {
            chunk.truncate(self.tail);
            self.tail = 0;
            self.chunks.push_back(Bytes::new());
        }
        let out = chunk.mid(self.head, None);
        self.head = 0;
        self.len -= out.len();
        out
    }

    /// Remove and return up to `max` bytes.
    ///
    /// When the request covers exactly the first chunk the chunk itself is
    /// handed back; otherwise the bytes are copied.
    #[must_use]
    pub fn read_bytes(&mut self, max: usize) -> Bytes {
        let n = max.min(self.len);
        if n == 0 {
            return Bytes::new();
        }
        if n == self.next_data_block_size() {
            return self.read_chunk();
        }
        let mut out = vec![0; n];
        let got = self.read(&mut out);
        out.truncate(got);
        Bytes::from(out)
    }

    /// Copy up to `dst.len()` bytes starting `pos` bytes in, without consuming.
    #[must_use]
    pub fn peek(&self, dst: &mut [u8], pos: usize) -> usize {
        let mut done = 0;
        let mut skip = pos;
        for block in self.blocks() {
            if done == dst.len() {
                break;
            }
            if skip >= block.len() {
                skip -= block.len();
                continue;
            }
            let src = &block[skip..];
            skip = 0;
            let n = src.len().min(dst.len() - done);
            dst[done..done + n].copy_from_slice(&src[..n]);
            done += n;
        }
        done
    }

    /// Discard up to `n` bytes; returns how many were discarded.
    pub fn skip(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        self.free(n);
        n
    }

    /// Position of the first `byte` in `[pos, pos + max_len)`.
    #[must_use]
    pub fn index_of(&self, byte: u8, max_len: usize, pos: usize) -> Option<usize> {
        let end = pos.saturating_add(max_len).min(self.len);
        let mut offset = 0;
        for block in self.blocks() {
            if offset >= end {
                break;
            }
            let block_end = offset + block.len();
            if block_end > pos {
                let from = pos.saturating_sub(offset);
                let to = block.len().min(end - offset);
                if let Some(i) = block[from..to].iter().position(|&b| b == byte) {
                    return Some(offset + from + i);
                }
            }
            offset = block_end;
        }
        None
    }

    /// Returns true if a `\n` is queued.
    #[must_use]
    pub fn can_read_line(&self) -> bool {
        self.index_of(b'\n', self.len, 0).is_some()
    }

    /// Read up to and including the first `\n`, NUL-terminating `dst`.
    ///
    /// At most `dst.len() - 1` bytes are consumed. Returns the count
    /// excluding the terminator, or `None` if `dst` cannot hold at least one
    /// byte plus the terminator.
    pub fn read_line(&mut self, dst: &mut [u8]) -> Option<usize> {
        if dst.len() < 2 {
            return None;
        }
        let max = dst.len() - 1;
        let take = self.index_of(b'\n', max, 0).map_or(max, |i| i + 1);
        let n = self.read(&mut dst[..take]);
        dst[n] = 0;
        Some(n)
    }
}
