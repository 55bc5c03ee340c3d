#![allow(dead_code)]
#![allow(unused_macros)]
//! Fixtures for the integration tests.
//!
//! ```ignore
//! #[macro_use]
//! mod common;
//! use common::*;
//! ```
//!
//! Property tests are deterministic when `IOCORE_PROPTEST_SEED` is set, and
//! always under CI. `IOCORE_PROPTEST_MAX_SHRINK_ITERS` caps shrinking.

use iocore::bytes::Bytes;
use iocore::io::{Device, MemoryDevice, OpenMode, PipeDevice};
use proptest::prelude::ProptestConfig;
use proptest::test_runner::RngSeed;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

/// Seed used under CI when none is given.
pub const CI_PROPTEST_SEED: u64 = 0x5EED_5EED;

const SEED_ENV: &str = "IOCORE_PROPTEST_SEED";
const SHRINK_ENV: &str = "IOCORE_PROPTEST_MAX_SHRINK_ITERS";
const LOG_ENV: &str = "IOCORE_TEST_LOG";

static INIT_LOGGING: Once = Once::new();

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

/// Proptest config running `cases` cases with the seed rules above.
///
/// An explicit `PROPTEST_RNG_SEED` still takes precedence.
#[must_use]
pub fn test_proptest_config(cases: u32) -> ProptestConfig {
    let mut config = ProptestConfig::with_cases(cases);
    let seed = env_parse::<u64>(SEED_ENV)
        .or_else(|| std::env::var_os("CI").map(|_| CI_PROPTEST_SEED));
    if let Some(seed) = seed.filter(|_| matches!(config.rng_seed, RngSeed::Random)) {
        config.rng_seed = RngSeed::Fixed(seed);
    }
    if let Some(iters) = env_parse::<u32>(SHRINK_ENV) {
        config.max_shrink_iters = iters;
    }
    config
}

/// Install the test subscriber once; filter from `IOCORE_TEST_LOG`.
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let filter =
            EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("iocore=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_thread_ids(true)
            .with_ansi(false)
            .try_init();
    });
}

/// `len` bytes of `i % 251`.
#[must_use]
pub fn pattern(len: usize) -> Bytes {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// An open random-access device over `data`.
#[must_use]
pub fn open_memory(data: impl Into<Bytes>, mode: OpenMode) -> Device<MemoryDevice> {
    let mut dev = Device::new(MemoryDevice::from_bytes(data.into()));
    dev.open(mode).expect("open memory device");
    dev
}

/// An open sequential device with `chunks` already fed.
///
/// With `read_limit`, each raw read returns at most that many bytes.
#[must_use]
pub fn open_pipe(chunks: &[&[u8]], read_limit: Option<usize>) -> Device<PipeDevice> {
    let mut raw = PipeDevice::new();
    raw.set_read_limit(read_limit);
    for chunk in chunks {
        raw.feed_slice(chunk);
    }
    let mut dev = Device::new(raw);
    dev.open(OpenMode::READ_ONLY).expect("open pipe device");
    dev
}

/// Mark the start of a test in the log.
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(test = %$name, ">>> {}", $name);
    };
}

/// Mark a step inside a test.
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {}", $name);
    };
}

/// Mark the end of a test, with optional summary fields.
macro_rules! test_complete {
    ($name:expr $(, $key:ident = $value:expr)* $(,)?) => {
        tracing::info!(test = %$name, $($key = %$value,)* "<<< {} passed", $name);
    };
}
