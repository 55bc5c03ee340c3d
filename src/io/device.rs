//! Buffered, transactional device over a [`RawDevice`].
//!
//! # Positions
//!
//! `pos` is the logical position seen by the caller. On random-access
//! devices the current read queue always holds the bytes starting at `pos`,
//! and `device_pos` tracks where the raw cursor really is; the two are
//! reconciled with `raw_seek` lazily, right before the raw device is touched.
//! On sequential devices `pos` counts consumed bytes and `device_pos` is
//! unused.
//!
//! # Transactions
//!
//! A sequential transaction reads by peeking at a cursor inside the read
//! queue, so rollback only has to forget the cursor. A random-access
//! transaction reads normally and rollback seeks back.

use super::{OpenMode, RawDevice};
use crate::bytes::{ByteQueue, Bytes};
use crate::config::DeviceConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::tracing_compat::{debug, trace, warn};
use std::cell::Cell;
use std::io;

/// Scratch size used when skipping requires reading.
const SKIP_SCRATCH: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Unset,
    Sequential,
    RandomAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transaction {
    Idle,
    Sequential { start_pos: u64, cursor: usize },
    RandomAccess { start_pos: u64 },
}

/// Buffered I/O device.
///
/// Adds read/write buffering, positions, text-mode line ending handling,
/// read transactions and multiple read/write channels on top of a
/// [`RawDevice`].
///
/// ```
/// use iocore::io::{Device, MemoryDevice, OpenMode};
///
/// let mut dev = Device::new(MemoryDevice::new());
/// dev.open(OpenMode::READ_WRITE).unwrap();
/// dev.write(b"first line\nsecond").unwrap();
/// dev.seek(0).unwrap();
///
/// assert_eq!(dev.read_line(0).unwrap(), "first line\n");
/// assert_eq!(dev.read_all().unwrap(), "second");
/// assert!(dev.at_end());
/// ```
#[derive(Debug)]
pub struct Device<D> {
    raw: D,
    mode: OpenMode,
    config: DeviceConfig,
    read_queues: Vec<ByteQueue>,
    write_queues: Vec<ByteQueue>,
    read_channel: usize,
    write_channel: usize,
    pos: u64,
    device_pos: u64,
    access: Cell<Access>,
    transaction: Transaction,
    error_string: String,
}

impl<D: RawDevice> Device<D> {
    /// Wrap `raw` with the default configuration. The device starts closed.
    pub fn new(raw: D) -> Self {
        Self::with_config(raw, DeviceConfig::default())
    }

    /// Wrap `raw` with an explicit configuration.
    pub fn with_config(raw: D, mut config: DeviceConfig) -> Self {
        config.normalize();
        Self {
            read_queues: vec![ByteQueue::with_chunk_size(config.chunk_size)],
            write_queues: vec![ByteQueue::with_chunk_size(config.write_chunk_size)],
            raw,
            mode: OpenMode::NOT_OPEN,
            config,
            read_channel: 0,
            write_channel: 0,
            pos: 0,
            device_pos: 0,
            access: Cell::new(Access::Unset),
            transaction: Transaction::Idle,
            error_string: String::new(),
        }
    }

    /// Borrow the raw device.
    pub fn get_ref(&self) -> &D {
        &self.raw
    }

    /// Mutably borrow the raw device.
    ///
    /// Moving the raw cursor behind the device's back is not tracked.
    pub fn get_mut(&mut self) -> &mut D {
        &mut self.raw
    }

    /// Close the device (best effort) and return the raw device.
    pub fn into_inner(mut self) -> D {
        // Failures are already recorded in `error_string`, which goes away
        // with the device.
        let _ = self.close();
        self.raw
    }

    /// The active configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    // ----------------------------------------------------------------------
    // State
    // ----------------------------------------------------------------------

    /// Returns true if the device is open.
    pub fn is_open(&self) -> bool {
        !self.mode.is_empty()
    }

    /// Returns true if the device is open for reading.
    pub fn is_readable(&self) -> bool {
        self.mode.is_readable()
    }

    /// Returns true if the device is open for writing.
    pub fn is_writable(&self) -> bool {
        self.mode.is_writable()
    }

    /// Returns true if the raw device is a stream without positions.
    pub fn is_sequential(&self) -> bool {
        match self.access.get() {
            Access::Sequential => true,
            Access::RandomAccess => false,
            Access::Unset => {
                let sequential = self.raw.is_sequential();
                self.access.set(if sequential {
                    Access::Sequential
                } else {
                    Access::RandomAccess
                });
                sequential
            }
        }
    }

    /// Returns true if TEXT mode is on.
    pub fn is_text_mode_enabled(&self) -> bool {
        self.mode.contains(OpenMode::TEXT)
    }

    /// Switch TEXT mode on an open device.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotOpen`] when the device is closed.
    pub fn set_text_mode_enabled(&mut self, enabled: bool) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, "set_text_mode_enabled"));
        }
        self.mode = if enabled {
            self.mode | OpenMode::TEXT
        } else {
            self.mode.difference(OpenMode::TEXT)
        };
        Ok(())
    }

    /// The mode the device was opened with, normalized.
    pub fn open_mode(&self) -> OpenMode {
        self.mode
    }

    /// Description of the last failure, empty if none since `open`.
    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    fn buffered(&self) -> bool {
        !self.mode.contains(OpenMode::UNBUFFERED)
    }

    fn cursor(&self) -> usize {
        match self.transaction {
            Transaction::Sequential { cursor, .. } => cursor,
            _ => 0,
        }
    }

    fn read_queue(&self) -> &ByteQueue {
        &self.read_queues[self.read_channel]
    }

    fn fail(&mut self, kind: ErrorKind, op: &'static str) -> Error {
        self.error_string = format!("{op}: {kind}");
        warn!(op, error = %kind, "device contract violation");
        Error::new(kind).with_message(op)
    }

    fn fail_io(&mut self, op: &'static str, err: io::Error) -> Error {
        let err = Error::io(err);
        self.error_string = format!("{op}: {err}");
        debug!(op, error = %err, "raw device failed");
        err
    }

    fn check_readable(&mut self, op: &'static str) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, op));
        }
        if !self.mode.is_readable() {
            return Err(self.fail(ErrorKind::NotReadable, op));
        }
        Ok(())
    }

    fn check_writable(&mut self, op: &'static str) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, op));
        }
        if !self.mode.is_writable() {
            return Err(self.fail(ErrorKind::NotWritable, op));
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Open / close
    // ----------------------------------------------------------------------

    /// Open the device.
    ///
    /// `APPEND` and `TRUNCATE` imply `WRITE_ONLY`. Channels, position,
    /// transaction state and the error string are reset.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::AlreadyOpen`], [`ErrorKind::InvalidOpenMode`] when neither
    /// read nor write access is requested, or the raw device's open failure.
    pub fn open(&mut self, mode: OpenMode) -> Result<()> {
        if self.is_open() {
            return Err(self.fail(ErrorKind::AlreadyOpen, "open"));
        }
        let mode = mode.normalized();
        if !mode.is_readable() && !mode.is_writable() {
            return Err(self.fail(ErrorKind::InvalidOpenMode, "open"));
        }
        if let Err(err) = self.raw.raw_open(mode) {
            return Err(self.fail_io("open", err));
        }

        self.mode = mode;
        self.access.set(Access::Unset);
        self.transaction = Transaction::Idle;
        self.error_string.clear();
        self.read_queues = vec![ByteQueue::with_chunk_size(self.config.chunk_size)];
        self.write_queues = vec![ByteQueue::with_chunk_size(self.config.write_chunk_size)];
        self.read_channel = 0;
        self.write_channel = 0;
        self.raw.select_channels(0, 0);
        self.device_pos = 0;
        self.pos = if mode.contains(OpenMode::APPEND) && !self.is_sequential() {
            self.raw.raw_size()
        } else {
            0
        };
        debug!(mode = ?mode, pos = self.pos, "device opened");
        Ok(())
    }

    /// Flush and close the device. Closing a closed device does nothing.
    ///
    /// Read buffers, position and transaction state are dropped. Write
    /// queues are kept so data a short-writing device did not accept can
    /// still be inspected with [`Device::bytes_to_write`].
    ///
    /// # Errors
    ///
    /// The first flush or close failure of the raw device. The device is
    /// closed either way.
    pub fn close(&mut self) -> Result<()> {
        if !self.is_open() {
            return Ok(());
        }
        let flushed = self.flush_all();
        let closed = self.raw.raw_close();

        self.mode = OpenMode::NOT_OPEN;
        self.pos = 0;
        self.device_pos = 0;
        self.transaction = Transaction::Idle;
        self.access.set(Access::Unset);
        self.read_queues = vec![ByteQueue::with_chunk_size(self.config.chunk_size)];
        self.read_channel = 0;
        debug!(pending = self.bytes_to_write(), "device closed");

        if let Err(err) = flushed.and(closed) {
            return Err(self.fail_io("close", err));
        }
        Ok(())
    }

    // ----------------------------------------------------------------------
    // Reading
    // ----------------------------------------------------------------------

    /// Read into `dst`; returns the number of bytes stored.
    ///
    /// `Ok(0)` means no data is available right now (or the end was
    /// reached).
    ///
    /// # Errors
    ///
    /// Contract violations, or a raw failure before any byte was produced.
    pub fn read_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.check_readable("read")?;
        self.read_impl(dst, false)
    }

    /// Read up to `max` bytes.
    ///
    /// When the request exactly covers the next buffered chunk, that chunk
    /// is returned without copying.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn read(&mut self, max: usize) -> Result<Bytes> {
        self.check_readable("read")?;
        if max == 0 {
            return Ok(Bytes::new());
        }
        if self.transaction == Transaction::Idle
            && !self.is_text_mode_enabled()
            && max == self.read_queue().next_data_block_size()
        {
            let chunk = self.read_queues[self.read_channel].read_chunk();
            self.pos += chunk.len() as u64;
            return Ok(chunk);
        }

        let mut out = Vec::new();
        while out.len() < max {
            let start = out.len();
            let step = (max - start).min(self.config.buffer_size.max(self.read_queue().len()));
            out.resize(start + step, 0);
            match self.read_impl(&mut out[start..], false) {
                Ok(n) => {
                    out.truncate(start + n);
                    if n < step {
                        break;
                    }
                }
                Err(err) if start == 0 => return Err(err),
                Err(_) => {
                    out.truncate(start);
                    break;
                }
            }
        }
        Ok(Bytes::from(out))
    }

    /// Read everything until the device reports no more data.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`]; a failure after some data was read
    /// ends the read instead.
    pub fn read_all(&mut self) -> Result<Bytes> {
        self.check_readable("read_all")?;
        let mut out = Bytes::new();
        loop {
            match self.read(usize::MAX) {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) if out.is_empty() => out = chunk,
                Ok(chunk) => {
                    out.append(&chunk);
                }
                Err(err) if out.is_empty() => return Err(err),
                Err(_) => break,
            }
        }
        Ok(out)
    }

    /// Copy up to `dst.len()` bytes without consuming them.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn peek_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.check_readable("peek")?;
        self.read_impl(dst, true)
    }

    /// Return up to `max` bytes without consuming them.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn peek(&mut self, max: usize) -> Result<Bytes> {
        self.check_readable("peek")?;
        let bound = usize::try_from(self.bytes_available()).unwrap_or(usize::MAX);
        let mut out = vec![0; max.min(bound.max(self.config.buffer_size))];
        let n = self.read_impl(&mut out, true)?;
        out.truncate(n);
        Ok(Bytes::from(out))
    }

    /// Read one line into `dst`, NUL-terminated.
    ///
    /// At most `dst.len() - 1` bytes are read; the line keeps its `\n`.
    /// Returns the length excluding the terminator.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidArgument`] if `dst` is shorter than two bytes,
    /// otherwise the same as [`Device::read_into`].
    pub fn read_line_into(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.check_readable("read_line")?;
        if dst.len() < 2 {
            return Err(self.fail(ErrorKind::InvalidArgument, "read_line"));
        }
        let max = dst.len() - 1;
        let n = self.read_line_impl(&mut dst[..max])?;
        dst[n] = 0;
        Ok(n)
    }

    /// Read one line of at most `max` bytes (`0` = no limit).
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn read_line(&mut self, max: usize) -> Result<Bytes> {
        self.check_readable("read_line")?;
        let limit = if max == 0 { usize::MAX } else { max };
        let mut out = Vec::new();
        while out.len() < limit {
            let start = out.len();
            let step = (limit - start).min(self.config.buffer_size);
            out.resize(start + step, 0);
            match self.read_line_impl(&mut out[start..]) {
                Ok(n) => {
                    out.truncate(start + n);
                    if n < step || out.last() == Some(&b'\n') {
                        break;
                    }
                }
                Err(err) if start == 0 => return Err(err),
                Err(_) => {
                    out.truncate(start);
                    break;
                }
            }
        }
        Ok(Bytes::from(out))
    }

    /// Discard up to `n` bytes; returns how many were discarded.
    ///
    /// Random-access devices skip past the buffer by moving the position;
    /// sequential devices and TEXT mode read and drop.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn skip(&mut self, n: u64) -> Result<u64> {
        self.check_readable("skip")?;
        if n == 0 {
            return Ok(0);
        }
        let sequential = self.is_sequential();
        if (sequential && self.transaction != Transaction::Idle) || self.is_text_mode_enabled() {
            return self.skip_by_reading(n);
        }

        let want = usize::try_from(n).unwrap_or(usize::MAX);
        let mut skipped = self.read_queues[self.read_channel].skip(want) as u64;
        self.pos += skipped;
        if skipped == n {
            return Ok(skipped);
        }
        if !sequential {
            let end = self.raw.raw_size().max(self.pos);
            let target = self.pos.saturating_add(n - skipped).min(end);
            skipped += target - self.pos;
            self.pos = target;
            trace!(pos = self.pos, "skipped by seeking");
            return Ok(skipped);
        }
        match self.skip_by_reading(n - skipped) {
            Ok(more) => Ok(skipped + more),
            Err(err) if skipped == 0 => Err(err),
            Err(_) => Ok(skipped),
        }
    }

    /// Read and consume one byte; `Ok(None)` when no data is available.
    ///
    /// # Errors
    ///
    /// Same as [`Device::read_into`].
    pub fn get_char(&mut self) -> Result<Option<u8>> {
        self.check_readable("get_char")?;
        let mut byte = [0u8; 1];
        let n = self.read_impl(&mut byte, false)?;
        Ok((n == 1).then_some(byte[0]))
    }

    /// Write one byte; returns whether it was accepted.
    ///
    /// # Errors
    ///
    /// Same as [`Device::write`].
    pub fn put_char(&mut self, byte: u8) -> Result<bool> {
        Ok(self.write(&[byte])? == 1)
    }

    /// Push `byte` back so the next read returns it.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TransactionActive`] inside a transaction and
    /// [`ErrorKind::InvalidPosition`] at position 0 of a random-access
    /// device.
    pub fn unget_char(&mut self, byte: u8) -> Result<()> {
        self.check_readable("unget_char")?;
        if self.transaction != Transaction::Idle {
            return Err(self.fail(ErrorKind::TransactionActive, "unget_char"));
        }
        if self.is_sequential() {
            self.pos = self.pos.saturating_sub(1);
        } else if self.pos == 0 {
            return Err(self.fail(ErrorKind::InvalidPosition, "unget_char"));
        } else {
            self.pos -= 1;
        }
        self.read_queues[self.read_channel].unget_char(byte);
        Ok(())
    }

    /// Returns true if a complete line is buffered.
    pub fn can_read_line(&self) -> bool {
        self.is_open()
            && self.is_readable()
            && self
                .read_queue()
                .index_of(b'\n', usize::MAX, self.cursor())
                .is_some()
    }

    fn read_impl(&mut self, dst: &mut [u8], peeking: bool) -> Result<usize> {
        let sequential = self.is_sequential();
        let buffered = self.buffered();
        let text = self.is_text_mode_enabled();
        let in_transaction = self.transaction != Transaction::Idle;
        // Keep data in the queue and read at an offset instead of consuming.
        let keep = if sequential {
            peeking || in_transaction
        } else {
            peeking && buffered
        };
        let saved_pos = self.pos;
        let mut buffer_pos = self.cursor();
        let mut filled = 0;
        let mut normalized = 0;
        let mut consumed = 0;
        let mut at_eof = false;

        loop {
            if filled < dst.len() {
                let queue = &mut self.read_queues[self.read_channel];
                let n = if keep {
                    queue.peek(&mut dst[filled..], buffer_pos)
                } else {
                    queue.read(&mut dst[filled..])
                };
                if keep {
                    buffer_pos += n;
                }
                filled += n;
                consumed += n;
                if !sequential {
                    self.pos += n as u64;
                }
            }

            let want = dst.len() - filled;
            if want > 0 && !at_eof {
                let got = match self.sync_device_pos() {
                    Ok(()) if (!buffered || want >= self.config.buffer_size) && !keep => {
                        self.raw.raw_read(&mut dst[filled..]).map(|got| {
                            let got = got.min(want);
                            filled += got;
                            consumed += got;
                            if !sequential {
                                self.pos += got as u64;
                                self.device_pos += got as u64;
                            }
                            (got, want)
                        })
                    }
                    Ok(()) => {
                        let chunk = if buffered {
                            self.config.buffer_size
                        } else {
                            want.min(self.config.buffer_size)
                        };
                        self.fill_buffer(chunk).map(|got| (got, chunk))
                    }
                    Err(err) => Err(err),
                };
                match got {
                    Ok((got, requested)) => {
                        at_eof = got < requested;
                        if got > 0 && filled < dst.len() {
                            continue;
                        }
                    }
                    Err(err) if filled == 0 => return Err(self.fail_io("read", err)),
                    Err(err) => {
                        self.error_string = format!("read: {err}");
                        at_eof = true;
                    }
                }
            }

            if text && filled > normalized {
                let before = filled;
                filled = strip_carriage_returns(dst, normalized, filled);
                normalized = if dst[filled - 1] == b'\r' {
                    filled - 1
                } else {
                    filled
                };
                if filled < before {
                    continue;
                }
            }
            break;
        }

        // A trailing `\r` may pair with a `\n` the raw device has not
        // delivered yet.
        if text && filled > 0 && dst[filled - 1] == b'\r' {
            let offset = if keep { buffer_pos } else { 0 };
            if self.read_queue().len() <= offset {
                let chunk = if buffered { self.config.buffer_size } else { 1 };
                if self.sync_device_pos().is_ok() {
                    let _ = self.fill_buffer(chunk);
                }
            }
            let mut next = [0u8; 1];
            let queue = &mut self.read_queues[self.read_channel];
            if queue.peek(&mut next, offset) == 1 && next[0] == b'\n' {
                dst[filled - 1] = b'\n';
                if keep {
                    buffer_pos += 1;
                } else {
                    queue.free(1);
                }
                consumed += 1;
                if !sequential {
                    self.pos += 1;
                }
            }
        }

        if peeking {
            if keep {
                self.pos = saved_pos;
            } else {
                self.seek_buffer(saved_pos);
            }
        } else {
            if let Transaction::Sequential { cursor, .. } = &mut self.transaction {
                *cursor = buffer_pos;
            }
            if sequential {
                self.pos += consumed as u64;
            }
        }
        Ok(filled)
    }

    fn read_line_impl(&mut self, dst: &mut [u8]) -> Result<usize> {
        let sequential = self.is_sequential();
        let keep = sequential && self.transaction != Transaction::Idle;
        let chunk = if self.buffered() {
            self.config.buffer_size
        } else {
            1
        };
        let mut cursor = self.cursor();
        let mut filled = 0;

        while filled < dst.len() {
            if self.read_queue().len() <= cursor {
                match self.sync_device_pos().and_then(|()| self.fill_buffer(chunk)) {
                    Ok(0) => break,
                    Ok(_) => {}
                    Err(err) if filled == 0 => return Err(self.fail_io("read_line", err)),
                    Err(err) => {
                        self.error_string = format!("read_line: {err}");
                        break;
                    }
                }
            }
            let queue = &mut self.read_queues[self.read_channel];
            let want = dst.len() - filled;
            let take = queue
                .index_of(b'\n', want, cursor)
                .map_or(want, |i| i - cursor + 1);
            let n = queue.peek(&mut dst[filled..filled + take], cursor);
            if keep {
                cursor += n;
            } else {
                queue.free(n);
            }
            filled += n;
            self.pos += n as u64;
            if n == 0 || dst[filled - 1] == b'\n' {
                break;
            }
        }

        let text = self.is_text_mode_enabled();
        if text && filled >= 2 && &dst[filled - 2..filled] == b"\r\n" {
            dst[filled - 2] = b'\n';
            filled -= 1;
        } else if text && filled > 0 && dst[filled - 1] == b'\r' {
            // The line was cut right after a `\r`; its `\n` may be next.
            if self.read_queue().len() <= cursor && self.sync_device_pos().is_ok() {
                let _ = self.fill_buffer(chunk);
            }
            let mut next = [0u8; 1];
            let queue = &mut self.read_queues[self.read_channel];
            if queue.peek(&mut next, cursor) == 1 && next[0] == b'\n' {
                dst[filled - 1] = b'\n';
                if keep {
                    cursor += 1;
                } else {
                    queue.free(1);
                }
                self.pos += 1;
            }
        }

        if let Transaction::Sequential { cursor: c, .. } = &mut self.transaction {
            *c = cursor;
        }
        Ok(filled)
    }

    fn skip_by_reading(&mut self, n: u64) -> Result<u64> {
        let mut scratch = [0u8; SKIP_SCRATCH];
        let mut skipped = 0u64;
        while skipped < n {
            let want = usize::try_from(n - skipped).map_or(SKIP_SCRATCH, |r| r.min(SKIP_SCRATCH));
            match self.read_impl(&mut scratch[..want], false) {
                Ok(0) => break,
                Ok(got) => {
                    skipped += got as u64;
                    if got < want {
                        break;
                    }
                }
                Err(err) if skipped == 0 => return Err(err),
                Err(_) => break,
            }
        }
        Ok(skipped)
    }

    /// Read one chunk from the raw device into the tail of the read queue.
    fn fill_buffer(&mut self, chunk: usize) -> io::Result<usize> {
        let sequential = self.is_sequential();
        let queue = &mut self.read_queues[self.read_channel];
        let Some(slot) = queue.reserve(chunk) else {
            return Ok(0);
        };
        let got = match self.raw.raw_read(slot) {
            Ok(got) => got.min(chunk),
            Err(err) => {
                queue.chop(chunk);
                return Err(err);
            }
        };
        queue.chop(chunk - got);
        if !sequential {
            self.device_pos += got as u64;
        }
        Ok(got)
    }

    /// Bring the raw cursor to `pos` before touching a random-access device.
    fn sync_device_pos(&mut self) -> io::Result<()> {
        if self.is_sequential() || self.device_pos == self.pos {
            return Ok(());
        }
        self.raw.raw_seek(self.pos)?;
        self.device_pos = self.pos;
        Ok(())
    }

    /// Move `pos`, keeping buffered bytes past the new position.
    fn seek_buffer(&mut self, new_pos: u64) {
        let queue = &mut self.read_queues[self.read_channel];
        match new_pos.checked_sub(self.pos) {
            Some(offset) if offset < queue.len() as u64 => queue.free(offset as usize),
            _ => queue.clear(),
        }
        self.pos = new_pos;
    }

    // ----------------------------------------------------------------------
    // Writing
    // ----------------------------------------------------------------------

    /// Write `data`; returns how many of the caller's bytes were accepted.
    ///
    /// Buffered sequential devices queue the data and drain what the raw
    /// device accepts right away. With TEXT mode and
    /// [`DeviceConfig::crlf_on_write`], `\n` goes out as `\r\n`.
    ///
    /// # Errors
    ///
    /// Contract violations, or a raw failure before any byte was written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_writable("write")?;
        if data.is_empty() {
            return Ok(0);
        }
        let sequential = self.is_sequential();
        if let Err(err) = self.sync_device_pos() {
            return Err(self.fail_io("write", err));
        }
        let saved_pos = self.pos;

        let written = if self.is_text_mode_enabled() && self.config.crlf_on_write {
            self.write_crlf(data)?
        } else {
            self.write_piece(data)?
        };

        if !sequential {
            let advanced = usize::try_from(self.pos - saved_pos).unwrap_or(usize::MAX);
            self.read_queues[self.read_channel].skip(advanced);
        } else if self.buffered() {
            if let Err(err) = self.drain_write_queue(false) {
                self.error_string = format!("write: {err}");
                debug!(error = %err, "write queue drain failed; data stays queued");
            }
        }
        Ok(written)
    }

    fn write_crlf(&mut self, data: &[u8]) -> Result<usize> {
        let mut done = 0;
        for line in data.split_inclusive(|&b| b == b'\n') {
            let (body, newline) = match line.split_last() {
                Some((b'\n', body)) => (body, true),
                _ => (line, false),
            };
            let n = match self.write_piece(body) {
                Ok(n) => n,
                Err(err) if done == 0 => return Err(err),
                Err(_) => break,
            };
            done += n;
            if n < body.len() || !newline {
                break;
            }
            match self.write_piece(b"\r\n") {
                Ok(2) => done += 1,
                Ok(_) => break,
                Err(err) if done == 0 => return Err(err),
                Err(_) => break,
            }
        }
        Ok(done)
    }

    fn write_piece(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let sequential = self.is_sequential();
        if sequential && self.buffered() {
            self.write_queues[self.write_channel].append_slice(buf);
            return Ok(buf.len());
        }

        let mut done = 0;
        let mut failure = None;
        while done < buf.len() {
            match self.raw.raw_write(&buf[done..]) {
                Ok(0) => break,
                Ok(n) => done += n.min(buf.len() - done),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        if !sequential {
            self.pos += done as u64;
            self.device_pos += done as u64;
        }
        match failure {
            Some(err) if done == 0 => Err(self.fail_io("write", err)),
            Some(err) => {
                self.error_string = format!("write: {err}");
                Ok(done)
            }
            None => Ok(done),
        }
    }

    /// Push the current write queue to the raw device.
    ///
    /// Stops at the first short write unless `exhaustive`, in which case only
    /// a write of zero bytes stops it.
    fn drain_write_queue(&mut self, exhaustive: bool) -> io::Result<()> {
        let queue = &mut self.write_queues[self.write_channel];
        while !queue.is_empty() {
            let block = queue.read_pointer();
            let len = block.len();
            let n = self.raw.raw_write(block)?.min(len);
            if n == 0 {
                break;
            }
            queue.free(n);
            if n < len && !exhaustive {
                break;
            }
        }
        Ok(())
    }

    fn flush_all(&mut self) -> io::Result<()> {
        let current = self.write_channel;
        let mut result = Ok(());
        for channel in 0..self.write_queues.len() {
            if self.write_queues[channel].is_empty() {
                continue;
            }
            self.switch_write_channel(channel);
            result = self.drain_write_queue(true);
            if result.is_err() {
                break;
            }
        }
        self.switch_write_channel(current);
        result?;
        self.raw.raw_flush()
    }

    /// Drain every write channel and flush the raw device.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotOpen`] or the raw device's failure.
    pub fn flush(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, "flush"));
        }
        if let Err(err) = self.flush_all() {
            return Err(self.fail_io("flush", err));
        }
        Ok(())
    }

    /// Bytes queued on the current write channel.
    pub fn bytes_to_write(&self) -> u64 {
        self.write_queues[self.write_channel].len() as u64
    }

    // ----------------------------------------------------------------------
    // Positioning
    // ----------------------------------------------------------------------

    /// Move to `pos` on a random-access device.
    ///
    /// A target inside the buffered window keeps the rest of the buffer.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotOpen`], [`ErrorKind::SequentialSeek`],
    /// [`ErrorKind::InvalidPosition`] when the raw device rejects the target.
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, "seek"));
        }
        if self.is_sequential() {
            return Err(self.fail(ErrorKind::SequentialSeek, "seek"));
        }
        let buffered = self.read_queue().len() as u64;
        match pos.checked_sub(self.pos) {
            Some(offset) if offset < buffered => {
                self.read_queues[self.read_channel].free(offset as usize);
                self.pos = pos;
                trace!(pos, "seek inside buffer");
            }
            _ => {
                match self.raw.raw_seek(pos) {
                    Ok(()) => {}
                    Err(err) if err.kind() == io::ErrorKind::InvalidInput => {
                        return Err(self.fail(ErrorKind::InvalidPosition, "seek"));
                    }
                    Err(err) => return Err(self.fail_io("seek", err)),
                }
                self.read_queues[self.read_channel].clear();
                self.pos = pos;
                self.device_pos = pos;
                trace!(pos, "seek");
            }
        }
        Ok(())
    }

    /// Current position.
    pub fn pos(&self) -> u64 {
        self.pos
    }

    /// Device size; for sequential devices, [`Device::bytes_available`].
    pub fn size(&self) -> u64 {
        if self.is_sequential() {
            self.bytes_available()
        } else {
            self.raw.raw_size()
        }
    }

    /// Seek to the start.
    ///
    /// # Errors
    ///
    /// Same as [`Device::seek`].
    pub fn reset(&mut self) -> Result<()> {
        self.seek(0)
    }

    /// Bytes that can be read without waiting.
    pub fn bytes_available(&self) -> u64 {
        if !self.is_open() {
            return 0;
        }
        let buffered = self.read_queue().len().saturating_sub(self.cursor()) as u64;
        if self.is_sequential() {
            buffered + self.raw.raw_bytes_available()
        } else {
            self.raw.raw_size().saturating_sub(self.pos).max(buffered)
        }
    }

    /// Returns true if closed or no data is available.
    pub fn at_end(&self) -> bool {
        !self.is_open() || self.bytes_available() == 0
    }

    // ----------------------------------------------------------------------
    // Transactions
    // ----------------------------------------------------------------------

    /// Start a read transaction.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NotOpen`] or [`ErrorKind::TransactionActive`].
    pub fn start_transaction(&mut self) -> Result<()> {
        if !self.is_open() {
            return Err(self.fail(ErrorKind::NotOpen, "start_transaction"));
        }
        if self.transaction != Transaction::Idle {
            return Err(self.fail(ErrorKind::TransactionActive, "start_transaction"));
        }
        self.transaction = if self.is_sequential() {
            Transaction::Sequential {
                start_pos: self.pos,
                cursor: 0,
            }
        } else {
            Transaction::RandomAccess {
                start_pos: self.pos,
            }
        };
        trace!(pos = self.pos, "transaction started");
        Ok(())
    }

    /// Keep what the transaction read.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoTransaction`].
    pub fn commit_transaction(&mut self) -> Result<()> {
        match self.transaction {
            Transaction::Idle => {
                return Err(self.fail(ErrorKind::NoTransaction, "commit_transaction"));
            }
            Transaction::Sequential { cursor, .. } => {
                self.read_queues[self.read_channel].free(cursor);
            }
            Transaction::RandomAccess { .. } => {}
        }
        self.transaction = Transaction::Idle;
        trace!(pos = self.pos, "transaction committed");
        Ok(())
    }

    /// Undo every read since [`Device::start_transaction`].
    ///
    /// # Errors
    ///
    /// [`ErrorKind::NoTransaction`].
    pub fn rollback_transaction(&mut self) -> Result<()> {
        match self.transaction {
            Transaction::Idle => {
                return Err(self.fail(ErrorKind::NoTransaction, "rollback_transaction"));
            }
            Transaction::Sequential { start_pos, .. } => self.pos = start_pos,
            Transaction::RandomAccess { start_pos } => self.seek_buffer(start_pos),
        }
        self.transaction = Transaction::Idle;
        trace!(pos = self.pos, "transaction rolled back");
        Ok(())
    }

    /// Returns true while a transaction is active.
    pub fn is_transaction_started(&self) -> bool {
        self.transaction != Transaction::Idle
    }

    // ----------------------------------------------------------------------
    // Channels
    // ----------------------------------------------------------------------

    /// Number of read channels.
    pub fn read_channel_count(&self) -> usize {
        self.read_queues.len()
    }

    /// Number of write channels.
    pub fn write_channel_count(&self) -> usize {
        self.write_queues.len()
    }

    /// Grow the number of read channels. Shrinking is ignored.
    pub fn set_read_channel_count(&mut self, count: usize) {
        let chunk_size = self.config.chunk_size;
        if count > self.read_queues.len() {
            self.read_queues
                .resize_with(count, || ByteQueue::with_chunk_size(chunk_size));
        }
    }

    /// Grow the number of write channels. Shrinking is ignored.
    pub fn set_write_channel_count(&mut self, count: usize) {
        let chunk_size = self.config.write_chunk_size;
        if count > self.write_queues.len() {
            self.write_queues
                .resize_with(count, || ByteQueue::with_chunk_size(chunk_size));
        }
    }

    /// Index of the current read channel.
    pub fn current_read_channel(&self) -> usize {
        self.read_channel
    }

    /// Switch reads to `channel`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::TransactionActive`] or [`ErrorKind::InvalidChannel`].
    pub fn set_current_read_channel(&mut self, channel: usize) -> Result<()> {
        if self.transaction != Transaction::Idle {
            return Err(self.fail(ErrorKind::TransactionActive, "set_current_read_channel"));
        }
        if channel >= self.read_queues.len() {
            return Err(self.fail(ErrorKind::InvalidChannel, "set_current_read_channel"));
        }
        if channel != self.read_channel {
            self.read_channel = channel;
            self.raw.select_channels(channel, self.write_channel);
            debug!(channel, "read channel selected");
        }
        Ok(())
    }

    /// Index of the current write channel.
    pub fn current_write_channel(&self) -> usize {
        self.write_channel
    }

    /// Switch writes to `channel`.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidChannel`].
    pub fn set_current_write_channel(&mut self, channel: usize) -> Result<()> {
        if channel >= self.write_queues.len() {
            return Err(self.fail(ErrorKind::InvalidChannel, "set_current_write_channel"));
        }
        self.switch_write_channel(channel);
        Ok(())
    }

    fn switch_write_channel(&mut self, channel: usize) {
        if channel != self.write_channel {
            self.write_channel = channel;
            self.raw.select_channels(self.read_channel, channel);
            debug!(channel, "write channel selected");
        }
    }

    /// Hand `data` to a read channel without copying.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::InvalidChannel`], or [`ErrorKind::InvalidArgument`] on a
    /// random-access device, whose buffer must mirror device contents.
    pub fn push_read_data(&mut self, channel: usize, data: Bytes) -> Result<()> {
        if channel >= self.read_queues.len() {
            return Err(self.fail(ErrorKind::InvalidChannel, "push_read_data"));
        }
        if !self.is_sequential() {
            return Err(self.fail(ErrorKind::InvalidArgument, "push_read_data"));
        }
        trace!(channel, len = data.len(), "read data pushed");
        self.read_queues[channel].append(data);
        Ok(())
    }
}

/// Remove every `\r` directly followed by `\n` in `dst[from..len]`.
///
/// Returns the new length. A `\r` at `len - 1` is kept; the caller decides
/// once more data is known.
fn strip_carriage_returns(dst: &mut [u8], from: usize, len: usize) -> usize {
    let mut out = from;
    for i in from..len {
        let byte = dst[i];
        if byte == b'\r' && i + 1 < len && dst[i + 1] == b'\n' {
            continue;
        }
        dst[out] = byte;
        out += 1;
    }
    out
}
