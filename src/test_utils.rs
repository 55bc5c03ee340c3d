//! Helpers shared by the unit tests.
//!
//! Logging goes through the test writer so output only shows for failing
//! tests. The filter defaults to `iocore=trace` and can be overridden with
//! `IOCORE_TEST_LOG` (any `EnvFilter` directive).

use crate::bytes::Bytes;
use std::sync::{Mutex, MutexGuard, Once, PoisonError};
use tracing_subscriber::EnvFilter;

const TEST_LOG_ENV: &str = "IOCORE_TEST_LOG";

static INIT_LOGGING: Once = Once::new();
static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Install the test subscriber once per process.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_env(TEST_LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new("iocore=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_line_number(true)
            .with_ansi(false)
            .try_init();
    });
}

/// Serializes tests that touch `IOCORE_*` environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `len` bytes of `i % 251`.
///
/// 251 is prime, so the pattern never lines up with power-of-two chunk sizes.
#[must_use]
pub fn pattern(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Mark the start of a test in the log.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = %$name, ">>> {}", $name);
    };
}

/// Mark the end of a test, with optional summary fields.
#[macro_export]
macro_rules! test_complete {
    ($name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(test = %$name, $($key = %$value,)* "<<< {} passed", $name);
    };
}
