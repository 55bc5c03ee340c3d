//! Random-access device over a [`Bytes`] buffer.

use super::{OpenMode, RawDevice};
use crate::bytes::Bytes;
use std::io;

/// In-memory random-access device.
///
/// Wraps an owned or caller-supplied [`Bytes`]. Handing in a shared buffer
/// is free; the first write detaches it, so the caller's handle keeps the
/// original contents.
///
/// ```
/// use iocore::bytes::Bytes;
/// use iocore::io::{Device, MemoryDevice, OpenMode};
///
/// let original = Bytes::from_static(b"hello");
/// let mut dev = Device::new(MemoryDevice::from_bytes(original.clone()));
/// dev.open(OpenMode::READ_WRITE).unwrap();
/// dev.seek(5).unwrap();
/// dev.write(b" world").unwrap();
///
/// assert_eq!(dev.get_ref().buffer(), "hello world");
/// assert_eq!(original, "hello");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDevice {
    data: Bytes,
    cursor: usize,
    writable: bool,
}

impl MemoryDevice {
    /// An empty device.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A device over `data`.
    #[must_use]
    pub fn from_bytes(data: Bytes) -> Self {
        Self {
            data,
            cursor: 0,
            writable: false,
        }
    }

    /// The current contents.
    #[must_use]
    pub fn buffer(&self) -> &Bytes {
        &self.data
    }

    /// Consume the device, returning its contents.
    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Replace the contents and rewind.
    ///
    /// Do not call while a [`Device`](super::Device) wrapping this device is
    /// open; its buffered data would no longer match.
    pub fn set_data(&mut self, data: Bytes) {
        self.data = data;
        self.cursor = 0;
    }
}

impl RawDevice for MemoryDevice {
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let avail = self.data.get(self.cursor..).unwrap_or_default();
        let n = avail.len().min(buf.len());
        buf[..n].copy_from_slice(&avail[..n]);
        self.cursor += n;
        Ok(n)
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let end = self.cursor + buf.len();
        if end > self.data.len() {
            self.data.resize(end);
        }
        self.data.data_mut()[self.cursor..end].copy_from_slice(buf);
        self.cursor = end;
        Ok(buf.len())
    }

    fn raw_seek(&mut self, pos: u64) -> io::Result<()> {
        let pos = usize::try_from(pos)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "position out of range"))?;
        if pos > self.data.len() {
            if !self.writable {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "seek past the end of a read-only buffer",
                ));
            }
            self.data.resize(pos);
        }
        self.cursor = pos;
        Ok(())
    }

    fn raw_size(&self) -> u64 {
        self.data.len() as u64
    }

    fn raw_open(&mut self, mode: OpenMode) -> io::Result<()> {
        if mode.contains(OpenMode::TRUNCATE) {
            self.data.clear();
        }
        self.writable = mode.is_writable();
        self.cursor = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_on_open() {
        let mut raw = MemoryDevice::from_bytes(Bytes::from("old"));
        raw.raw_open(OpenMode::TRUNCATE.normalized()).expect("open");
        assert!(raw.buffer().is_empty());
    }

    #[test]
    fn writes_extend_and_overwrite() {
        let mut raw = MemoryDevice::from_bytes(Bytes::from("abc"));
        raw.raw_open(OpenMode::READ_WRITE).expect("open");
        raw.raw_seek(2).expect("seek");
        assert_eq!(raw.raw_write(b"XYZ").expect("write"), 3);
        assert_eq!(raw.buffer(), "abXYZ");
        assert_eq!(raw.raw_size(), 5);
    }

    #[test]
    fn seek_past_end_zero_fills_only_when_writable() {
        let mut raw = MemoryDevice::from_bytes(Bytes::from("ab"));
        raw.raw_open(OpenMode::READ_ONLY).expect("open");
        let err = raw.raw_seek(4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        raw.raw_open(OpenMode::WRITE_ONLY).expect("open");
        raw.raw_seek(4).expect("seek");
        assert_eq!(raw.buffer(), b"ab\0\0");
    }

    #[test]
    fn caller_buffer_is_not_modified() {
        let shared = Bytes::from(vec![1u8, 2, 3]);
        let mut raw = MemoryDevice::from_bytes(shared.clone());
        raw.raw_open(OpenMode::READ_WRITE).expect("open");
        raw.raw_write(&[9]).expect("write");
        assert_eq!(shared, [1u8, 2, 3]);
        assert_eq!(raw.into_bytes(), [9u8, 2, 3]);
    }

    #[test]
    fn read_stops_at_end() {
        let mut raw = MemoryDevice::from_bytes(Bytes::from("abc"));
        raw.raw_open(OpenMode::READ_ONLY).expect("open");
        let mut buf = [0u8; 8];
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 3);
        assert_eq!(raw.raw_read(&mut buf).expect("read"), 0);
    }
}
