//! Sequential in-memory device.

use super::RawDevice;
use crate::bytes::{ByteQueue, Bytes};
use std::io;

/// Sequential device fed by the caller.
///
/// Data handed to [`PipeDevice::feed`] becomes readable on the current
/// read channel; everything written is recorded per write channel. Read and
/// write limits cap how much a single raw call moves, which simulates
/// fragmented delivery and short writes.
///
/// ```
/// use iocore::io::{Device, OpenMode, PipeDevice};
///
/// let mut dev = Device::new(PipeDevice::new());
/// dev.open(OpenMode::READ_WRITE).unwrap();
/// dev.get_mut().feed_slice(b"ping\n");
/// assert_eq!(dev.read_line(0).unwrap(), "ping\n");
///
/// dev.write(b"pong\n").unwrap();
/// dev.flush().unwrap();
/// assert_eq!(dev.get_ref().written(), "pong\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PipeDevice {
    incoming: Vec<ByteQueue>,
    written: Vec<Bytes>,
    read_channel: usize,
    write_channel: usize,
    read_limit: Option<usize>,
    write_limit: Option<usize>,
    write_end_closed: bool,
}

impl PipeDevice {
    /// An empty pipe without limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cap every raw read at `limit` bytes.
    #[must_use]
    pub fn with_read_limit(mut self, limit: usize) -> Self {
        self.read_limit = Some(limit);
        self
    }

    /// Cap every raw write at `limit` bytes. `0` accepts nothing.
    #[must_use]
    pub fn with_write_limit(mut self, limit: usize) -> Self {
        self.write_limit = Some(limit);
        self
    }

    /// Change or remove the raw read cap.
    pub fn set_read_limit(&mut self, limit: Option<usize>) {
        self.read_limit = limit;
    }

    /// Change or remove the raw write cap.
    pub fn set_write_limit(&mut self, limit: Option<usize>) {
        self.write_limit = limit;
    }

    /// Queue `data` on read channel 0. Returns false once the write end is closed.
    pub fn feed(&mut self, data: Bytes) -> bool {
        self.feed_channel(0, data)
    }

    /// Copy `data` onto read channel 0.
    pub fn feed_slice(&mut self, data: &[u8]) -> bool {
        self.feed_channel(0, Bytes::copy_from_slice(data))
    }

    /// Queue `data` on `channel`, creating the channel if needed.
    pub fn feed_channel(&mut self, channel: usize, data: Bytes) -> bool {
        if self.write_end_closed {
            return false;
        }
        if self.incoming.len() <= channel {
            self.incoming.resize_with(channel + 1, ByteQueue::new);
        }
        self.incoming[channel].append(data);
        true
    }

    /// Signal end of stream: later feeds are ignored.
    pub fn close_write_end(&mut self) {
        self.write_end_closed = true;
    }

    /// Returns true after [`PipeDevice::close_write_end`].
    #[must_use]
    pub fn is_write_end_closed(&self) -> bool {
        self.write_end_closed
    }

    /// Everything written to write channel 0.
    #[must_use]
    pub fn written(&self) -> Bytes {
        self.written_on(0)
    }

    /// Everything written to `channel`.
    #[must_use]
    pub fn written_on(&self, channel: usize) -> Bytes {
        self.written.get(channel).cloned().unwrap_or_default()
    }

    /// Bytes still waiting on `channel`.
    #[must_use]
    pub fn pending_on(&self, channel: usize) -> usize {
        self.incoming.get(channel).map_or(0, ByteQueue::len)
    }
}

impl RawDevice for PipeDevice {
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(queue) = self.incoming.get_mut(self.read_channel) else {
            return Ok(0);
        };
        let max = self.read_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        Ok(queue.read(&mut buf[..max]))
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.write_limit.map_or(buf.len(), |limit| limit.min(buf.len()));
        if n == 0 {
            return Ok(0);
        }
        if self.written.len() <= self.write_channel {
            self.written.resize_with(self.write_channel + 1, Bytes::new);
        }
        self.written[self.write_channel].append(&buf[..n]);
        Ok(n)
    }

    fn is_sequential(&self) -> bool {
        true
    }

    fn raw_bytes_available(&self) -> u64 {
        self.pending_on(self.read_channel) as u64
    }

    fn select_channels(&mut self, read: usize, write: usize) {
        self.read_channel = read;
        self.write_channel = write;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_limit_fragments_delivery() {
        let mut raw = PipeDevice::new().with_read_limit(2);
        raw.feed_slice(b"abcde");
        let mut buf = [0u8; 8];
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 2);
        assert_eq!(raw.raw_bytes_available(), 3);
        raw.set_read_limit(None);
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 3);
        assert_eq!(&buf[..3], b"cde");
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 0);
    }

    #[test]
    fn closed_write_end_ignores_feeds() {
        let mut raw = PipeDevice::new();
        assert!(raw.feed_slice(b"a"));
        raw.close_write_end();
        assert!(raw.is_write_end_closed());
        assert!(!raw.feed_slice(b"b"));
        assert_eq!(raw.pending_on(0), 1);
    }

    #[test]
    fn writes_follow_selected_channel() {
        let mut raw = PipeDevice::new();
        raw.raw_write(b"zero").expect("write");
        raw.select_channels(0, 2);
        raw.raw_write(b"two").expect("write");
        assert_eq!(raw.written(), "zero");
        assert!(raw.written_on(1).is_empty());
        assert_eq!(raw.written_on(2), "two");
    }

    #[test]
    fn reads_follow_selected_channel() {
        let mut raw = PipeDevice::new();
        raw.feed_channel(1, Bytes::from("one"));
        let mut buf = [0u8; 4];
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 0);
        raw.select_channels(1, 0);
        assert_eq!(raw.raw_bytes_available(), 3);
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 3);
    }
}
