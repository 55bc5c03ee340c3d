//! Open mode flags.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Flags describing how a [`Device`](super::Device) is opened.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct OpenMode(u8);

impl OpenMode {
    /// Not open.
    pub const NOT_OPEN: Self = Self(0);
    /// Open for reading.
    pub const READ_ONLY: Self = Self(1 << 0);
    /// Open for writing.
    pub const WRITE_ONLY: Self = Self(1 << 1);
    /// Open for reading and writing.
    pub const READ_WRITE: Self = Self(Self::READ_ONLY.0 | Self::WRITE_ONLY.0);
    /// Start at the end of existing data. Implies `WRITE_ONLY`.
    pub const APPEND: Self = Self(1 << 2);
    /// Discard existing data on open. Implies `WRITE_ONLY`.
    pub const TRUNCATE: Self = Self(1 << 3);
    /// Normalize line endings: strip `\r` before `\n` when reading.
    pub const TEXT: Self = Self(1 << 4);
    /// Bypass the read and write queues.
    pub const UNBUFFERED: Self = Self(1 << 5);

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns true if all bits of `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if any bit of `other` is set.
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns true if no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if `READ_ONLY` is set.
    #[must_use]
    pub const fn is_readable(self) -> bool {
        self.intersects(Self::READ_ONLY)
    }

    /// Returns true if `WRITE_ONLY` is set.
    #[must_use]
    pub const fn is_writable(self) -> bool {
        self.intersects(Self::WRITE_ONLY)
    }

    /// Combines flags.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Clears the flags in `other`.
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Expands implied flags: `APPEND` and `TRUNCATE` imply `WRITE_ONLY`.
    #[must_use]
    pub const fn normalized(self) -> Self {
        if self.intersects(Self::APPEND.union(Self::TRUNCATE)) {
            self.union(Self::WRITE_ONLY)
        } else {
            self
        }
    }
}

impl BitOr for OpenMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for OpenMode {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

impl fmt::Debug for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(OpenMode, &str); 6] = [
            (OpenMode::READ_ONLY, "READ_ONLY"),
            (OpenMode::WRITE_ONLY, "WRITE_ONLY"),
            (OpenMode::APPEND, "APPEND"),
            (OpenMode::TRUNCATE, "TRUNCATE"),
            (OpenMode::TEXT, "TEXT"),
            (OpenMode::UNBUFFERED, "UNBUFFERED"),
        ];
        if self.is_empty() {
            return f.write_str("NOT_OPEN");
        }
        let mut first = true;
        for (flag, name) in NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}
