//! Byte sequences and byte queues.
//!
//! # Overview
//!
//! This module provides:
//! - [`Bytes`]: reference-counted byte sequence with copy-on-write mutation
//! - [`ByteRef`]: assignable proxy for a single byte
//! - [`ByteMatcher`]: precompiled Boyer-Moore-Horspool substring search
//! - [`ByteQueue`]: FIFO queue of shared chunks, used for device buffering
//!
//! Encoding (hex, Base64, percent), numeric and text helpers are inherent
//! methods on [`Bytes`].
//!
//! # Design Notes
//!
//! Storage is `Arc<Vec<u8>>` plus a `start`/`len` view, so the crate stays
//! within `#![forbid(unsafe_code)]`. `Arc::make_mut` provides the
//! copy-on-write step; a handle writes in place only when it is the sole
//! owner of its storage and its view starts at offset zero.

mod byte_ref;
#[allow(clippy::module_inception)]
mod bytes;
mod encoding;
mod matcher;
mod number;
pub mod queue;
mod text;

pub use byte_ref::ByteRef;
pub use bytes::Bytes;
pub use encoding::{Base64Options, DecodeError};
pub use matcher::ByteMatcher;
pub use number::{ParseInt, ParseNumberError};
pub use queue::ByteQueue;
pub use text::is_space;
