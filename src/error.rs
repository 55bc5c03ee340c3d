//! Error types for iocore.
//!
//! Error handling follows these principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Contract violations are reported, never fatal: the call returns `Err`
//!   and the device records a diagnostic string
//! - End of data is not an error: reads return `Ok(0)` or an empty buffer
//!
//! # Error Categories
//!
//! - **Contract**: the caller used the API in a state that does not allow
//!   the operation (device not open, seek on a sequential device, nested
//!   transaction, ...)
//! - **Resource**: a buffer could not grow to the requested size
//! - **Io**: the underlying raw device reported a failure

use core::fmt;
use std::io;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    // === Contract ===
    /// The device is not open.
    NotOpen,
    /// The device is already open.
    AlreadyOpen,
    /// The device was not opened for reading.
    NotReadable,
    /// The device was not opened for writing.
    NotWritable,
    /// The requested open mode is not valid.
    InvalidOpenMode,
    /// Seek was requested on a sequential device.
    SequentialSeek,
    /// The requested position is outside what the device allows.
    InvalidPosition,
    /// A transaction is already in progress.
    TransactionActive,
    /// No transaction is in progress.
    NoTransaction,
    /// The channel index does not exist.
    InvalidChannel,
    /// An argument is outside the accepted range.
    InvalidArgument,

    // === Resource ===
    /// A buffer could not grow to the requested size.
    CapacityExceeded,

    // === Io ===
    /// The underlying device failed.
    Io,
}

impl ErrorKind {
    /// Returns the error category for this kind.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::NotOpen
            | Self::AlreadyOpen
            | Self::NotReadable
            | Self::NotWritable
            | Self::InvalidOpenMode
            | Self::SequentialSeek
            | Self::InvalidPosition
            | Self::TransactionActive
            | Self::NoTransaction
            | Self::InvalidChannel
            | Self::InvalidArgument => ErrorCategory::Contract,
            Self::CapacityExceeded => ErrorCategory::Resource,
            Self::Io => ErrorCategory::Io,
        }
    }

    /// Short, static description used when no message is attached.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotOpen => "device not open",
            Self::AlreadyOpen => "device already open",
            Self::NotReadable => "device not open for reading",
            Self::NotWritable => "device not open for writing",
            Self::InvalidOpenMode => "invalid open mode",
            Self::SequentialSeek => "cannot seek a sequential device",
            Self::InvalidPosition => "invalid position",
            Self::TransactionActive => "transaction already in progress",
            Self::NoTransaction => "no transaction in progress",
            Self::InvalidChannel => "invalid channel",
            Self::InvalidArgument => "invalid argument",
            Self::CapacityExceeded => "capacity exceeded",
            Self::Io => "I/O error",
        }
    }

    /// Maps the kind to the closest `std::io::ErrorKind`.
    #[must_use]
    pub const fn io_kind(&self) -> io::ErrorKind {
        match self {
            Self::NotOpen | Self::NotReadable | Self::NotWritable => io::ErrorKind::PermissionDenied,
            Self::SequentialSeek => io::ErrorKind::Unsupported,
            Self::InvalidPosition | Self::InvalidArgument | Self::InvalidOpenMode => {
                io::ErrorKind::InvalidInput
            }
            Self::CapacityExceeded => io::ErrorKind::OutOfMemory,
            Self::AlreadyOpen
            | Self::TransactionActive
            | Self::NoTransaction
            | Self::InvalidChannel
            | Self::Io => io::ErrorKind::Other,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// High-level error category for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// API used in a state that does not permit the operation.
    Contract,
    /// Allocation or size limits.
    Resource,
    /// Failures reported by the underlying device.
    Io,
}

/// The main error type for iocore operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Returns true if this is a contract violation rather than a device failure.
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(self.kind.category(), ErrorCategory::Contract)
    }

    /// Returns the attached message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Wraps an error reported by the underlying device.
    #[must_use]
    pub fn io(err: io::Error) -> Self {
        Self::new(ErrorKind::Io)
            .with_message(err.to_string())
            .with_source(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {msg}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::io(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        io::Error::new(err.kind.io_kind(), err)
    }
}

/// Result alias for iocore operations.
pub type Result<T> = std::result::Result<T, Error>;
