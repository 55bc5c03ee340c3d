//! Buffered, transactional I/O devices.
//!
//! [`Device`] adds buffering, positions, transactions, channels and text
//! mode on top of a [`RawDevice`], which only has to move bytes.
//!
//! # Device kinds
//!
//! - **Random access** (`is_sequential() == false`): the device has a size
//!   and positions; `seek` is allowed and the read buffer mirrors device
//!   contents starting at the current position.
//! - **Sequential**: a stream. Positions count consumed bytes, seeking is a
//!   contract violation and data can be handed straight to a read channel
//!   with [`Device::push_read_data`].
//!
//! # Provided raw devices
//!
//! - [`MemoryDevice`]: random access over a [`Bytes`](crate::bytes::Bytes)
//! - [`PipeDevice`]: sequential, fed by the caller
//!
//! # Error model
//!
//! Every operation returns [`Result`](crate::error::Result). Contract
//! violations (reading a closed device, seeking a stream, nested
//! transactions) are reported as `Err`, logged with `warn!` and recorded in
//! [`Device::error_string`]; they never panic. End of data is `Ok(0)` or an
//! empty buffer.

mod device;
mod memory;
mod mode;
mod pipe;
mod raw;
mod std_io;

pub use device::Device;
pub use memory::MemoryDevice;
pub use mode::OpenMode;
pub use pipe::PipeDevice;
pub use raw::RawDevice;
pub use std_io::Lines;
