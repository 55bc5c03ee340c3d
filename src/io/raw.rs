//! Primitive operations a concrete device supplies.

use super::OpenMode;
use std::io;

/// Unbuffered device primitives.
///
/// [`Device`](super::Device) layers buffering, positions, transactions,
/// channels and text mode on top of these calls. Implementations never see
/// the buffered state; they only move bytes.
///
/// # Contract
///
/// - `raw_read` returns `Ok(0)` when no data is available right now. A
///   short read (fewer bytes than requested) tells the device that the end
///   of the currently available data was reached.
/// - `raw_write` may accept fewer bytes than offered; the rest is retried.
/// - `raw_seek` is only called on random-access devices.
pub trait RawDevice {
    /// Read up to `buf.len()` bytes from the current read channel.
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write up to `buf.len()` bytes to the current write channel.
    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Move the underlying cursor to `pos`.
    fn raw_seek(&mut self, pos: u64) -> io::Result<()> {
        let _ = pos;
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "device does not support seeking",
        ))
    }

    /// Returns true for stream-like devices without positions.
    fn is_sequential(&self) -> bool {
        false
    }

    /// Total size for random-access devices.
    fn raw_size(&self) -> u64 {
        0
    }

    /// Bytes the device can deliver without blocking (sequential devices).
    fn raw_bytes_available(&self) -> u64 {
        0
    }

    /// Called at the end of a successful [`Device::open`](super::Device::open).
    fn raw_open(&mut self, mode: OpenMode) -> io::Result<()> {
        let _ = mode;
        Ok(())
    }

    /// Called from [`Device::close`](super::Device::close) after flushing.
    fn raw_close(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Push out anything the device itself buffers.
    fn raw_flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// The device switched its current read or write channel.
    fn select_channels(&mut self, read: usize, write: usize) {
        let _ = (read, write);
    }
}

impl<D: RawDevice + ?Sized> RawDevice for Box<D> {
    fn raw_read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).raw_read(buf)
    }

    fn raw_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (**self).raw_write(buf)
    }

    fn raw_seek(&mut self, pos: u64) -> io::Result<()> {
        (**self).raw_seek(pos)
    }

    fn is_sequential(&self) -> bool {
        (**self).is_sequential()
    }

    fn raw_size(&self) -> u64 {
        (**self).raw_size()
    }

    fn raw_bytes_available(&self) -> u64 {
        (**self).raw_bytes_available()
    }

    fn raw_open(&mut self, mode: OpenMode) -> io::Result<()> {
        (**self).raw_open(mode)
    }

    fn raw_close(&mut self) -> io::Result<()> {
        (**self).raw_close()
    }

    fn raw_flush(&mut self) -> io::Result<()> {
        (**self).raw_flush()
    }

    fn select_channels(&mut self, read: usize, write: usize) {
        (**self).select_channels(read, write);
    }
}
