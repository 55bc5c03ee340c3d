//! `std::io` adapters for [`Device`].

use super::{Device, RawDevice};
use std::io::{self, SeekFrom};

impl<D: RawDevice> io::Read for Device<D> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_into(buf)?)
    }
}

impl<D: RawDevice> io::Write for Device<D> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Device::write(self, buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(Device::flush(self)?)
    }
}

impl<D: RawDevice> io::Seek for Device<D> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.pos().checked_add_signed(delta),
            SeekFrom::End(delta) => self.size().checked_add_signed(delta),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek to a negative position")
        })?;
        Device::seek(self, target)?;
        Ok(target)
    }

    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.pos())
    }
}

impl<D: RawDevice> Device<D> {
    /// Iterator over the remaining lines, without their `\n` or `\r\n`.
    ///
    /// Ends when a read returns no data.
    pub fn lines(&mut self) -> Lines<'_, D> {
        Lines { device: self }
    }
}

/// Iterator returned by [`Device::lines`].
#[derive(Debug)]
pub struct Lines<'a, D> {
    device: &'a mut Device<D>,
}

impl<D: RawDevice> Iterator for Lines<'_, D> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.device.read_line(0) {
            Ok(line) if line.is_empty() => return None,
            Ok(line) => line,
            Err(err) => return Some(Err(err.into())),
        };
        let mut line = Vec::from(line);
        if line.last() == Some(&b'\n') {
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
        }
        Some(String::from_utf8(line).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}
