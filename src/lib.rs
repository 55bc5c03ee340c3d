//! iocore: copy-on-write byte sequences, chunked byte queues and buffered,
//! transactional I/O devices.
//!
//! # Overview
//!
//! The crate is layered bottom-up:
//!
//! - **Bytes**: a reference-counted byte sequence whose clones share storage
//!   until one of them is mutated, with search, encoding, numeric and text
//!   helpers.
//! - **ByteQueue**: a FIFO of shared chunks that hands out writable regions
//!   at either end and returns whole chunks without copying.
//! - **Device**: a buffered device over a small set of raw primitives, with
//!   positions, read transactions, multiple channels and text-mode line
//!   ending handling.
//!
//! # Module Structure
//!
//! - [`bytes`]: [`Bytes`], [`ByteQueue`], [`ByteMatcher`] and encoders
//! - [`io`]: [`Device`], [`RawDevice`], [`MemoryDevice`], [`PipeDevice`]
//! - [`config`]: [`DeviceConfig`] with environment and TOML overrides
//! - [`error`]: Error types
//! - [`tracing_compat`]: Logging macros that compile out without the
//!   `tracing-integration` feature
//!
//! # Example
//!
//! ```
//! use iocore::{Bytes, Device, MemoryDevice, OpenMode};
//!
//! let mut dev = Device::new(MemoryDevice::from_bytes(Bytes::from("key=value\n")));
//! dev.open(OpenMode::READ_ONLY).unwrap();
//!
//! let line = dev.read_line(0).unwrap().trimmed();
//! assert_eq!(line.split(b'='), ["key", "value"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]

pub mod bytes;
pub mod config;
pub mod error;
pub mod io;
pub mod tracing_compat;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenient access to core types
pub use bytes::{ByteMatcher, ByteQueue, Bytes};
pub use config::{ConfigError, DeviceConfig};
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use io::{Device, MemoryDevice, OpenMode, PipeDevice, RawDevice};
