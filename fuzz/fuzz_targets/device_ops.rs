//! Fuzz target for buffered device operations.
//!
//! Interprets the input as a script of reads, writes, seeks, peeks and
//! transaction steps against a memory-backed device, and checks the device
//! against a plain `Vec<u8>` model after every step. Contract violations
//! must come back as errors, never panics.
//!
//! # Running
//! ```bash
//! cargo +nightly fuzz run fuzz_device_ops
//! ```

#![no_main]

use iocore::io::{Device, MemoryDevice, OpenMode};
use iocore::DeviceConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&buffer_size, script)) = data.split_first() else {
        return;
    };

    let config = DeviceConfig::default().buffer_size(usize::from(buffer_size % 32));
    let mut dev = Device::with_config(MemoryDevice::new(), config);
    if dev.open(OpenMode::READ_WRITE).is_err() {
        return;
    }

    let mut model: Vec<u8> = Vec::new();
    let mut pos = 0usize;
    let mut saved: Option<usize> = None;

    for op in script.chunks(2) {
        let arg = usize::from(op.get(1).copied().unwrap_or(0));
        match op[0] % 6 {
            0 => {
                let out = dev.read(arg).expect("read open device");
                let end = (pos + arg).min(model.len());
                assert_eq!(out, &model[pos.min(end)..end]);
                pos = end.max(pos);
            }
            1 => {
                let chunk = vec![op[0]; arg % 16];
                if saved.is_some() {
                    continue;
                }
                let n = dev.write(&chunk).expect("write open device");
                assert_eq!(n, chunk.len());
                let end = pos + chunk.len();
                if model.len() < end {
                    model.resize(end, 0);
                }
                model[pos..end].copy_from_slice(&chunk);
                pos = end;
            }
            2 => {
                let target = arg % (model.len() + 1);
                dev.seek(target as u64).expect("seek inside device");
                pos = target;
            }
            3 => {
                let out = dev.peek(arg).expect("peek open device");
                let end = (pos + out.len()).min(model.len());
                assert_eq!(out, &model[pos.min(end)..end]);
            }
            4 => {
                if saved.is_none() {
                    dev.start_transaction().expect("start transaction");
                    saved = Some(pos);
                } else {
                    assert!(dev.start_transaction().is_err());
                }
            }
            _ => {
                if let Some(start) = saved.take() {
                    if arg % 2 == 0 {
                        dev.rollback_transaction().expect("rollback");
                        pos = start;
                    } else {
                        dev.commit_transaction().expect("commit");
                    }
                }
            }
        }
        assert_eq!(dev.pos(), pos as u64);
    }
});
