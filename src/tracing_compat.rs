//! Tracing compatibility layer for structured logging.
//!
//! This module provides a unified interface for diagnostics that works whether
//! or not the `tracing-integration` feature is enabled:
//!
//! - **With feature enabled**: Re-exports from the `tracing` crate.
//! - **Without feature**: No-op macros that compile to nothing, so the hot
//!   read/write paths carry no logging cost.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::tracing_compat::{debug, warn};
//!
//! debug!(channel = 1, "read channel selected");
//! warn!(op = "seek", "cannot seek a sequential device");
//! ```
//!
//! # Feature Flag
//!
//! ```toml
//! iocore = { version = "0.1", features = ["tracing-integration"] }
//! ```

#[cfg(feature = "tracing-integration")]
pub use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    //! No-op implementations when tracing is disabled.

    /// No-op trace-level logging macro.
    #[macro_export]
    macro_rules! trace {
        ($($arg:tt)*) => {};
    }

    /// No-op debug-level logging macro.
    #[macro_export]
    macro_rules! debug {
        ($($arg:tt)*) => {};
    }

    /// No-op info-level logging macro.
    #[macro_export]
    macro_rules! info {
        ($($arg:tt)*) => {};
    }

    /// No-op warn-level logging macro.
    #[macro_export]
    macro_rules! warn {
        ($($arg:tt)*) => {};
    }

    /// No-op error-level logging macro.
    #[macro_export]
    macro_rules! error {
        ($($arg:tt)*) => {};
    }

    pub use crate::{debug, error, info, trace, warn};
}

#[cfg(not(feature = "tracing-integration"))]
pub use noop::*;

#[cfg(test)]
mod tests {
    use super::{debug, trace, warn};

    #[test]
    fn macros_accept_structured_fields() {
        crate::test_utils::init_test_logging();
        let channel = 3usize;
        trace!(channel, "trace with field");
        debug!(channel = channel, pos = 10u64, "debug with fields");
        warn!(op = "seek", "warn with static field");
    }

    #[cfg(not(feature = "tracing-integration"))]
    #[test]
    fn disabled_macros_discard_their_arguments() {
        let evaluated = std::cell::Cell::new(false);
        debug!(flag = { evaluated.set(true); 1 }, "never built");
        assert!(!evaluated.get());
    }
}
