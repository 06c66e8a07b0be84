//! On-disk FAT32 layer for boot-image construction.
//!
//! Formats a partition, walks and creates directories, and writes file data
//! and directory entries directly against raw sectors. All disk I/O is
//! abstracted behind [`BlockDev`], making the crate unit-testable with an
//! in-memory mock and usable from a freestanding boot-chain build step.
//!
//! The volume is owned by a [`Volume`] handle for its whole operation
//! sequence (format → mkdir → add_file); there is no ambient global state
//! and no concurrent-writer support.

// No_std when not testing (e.g. `cargo check --target x86_64-unknown-none`).
#![cfg_attr(not(test), no_std)]

pub mod device;
pub mod dir;
pub mod format;
pub mod layout;
pub mod name;
pub mod volume;

pub use device::{BlockDev, PartitionRange, SECTOR_SIZE};
pub use dir::Entry;
pub use format::{FormatOptions, format_volume};
pub use layout::{Attributes, FatEntry};
pub use volume::Volume;

// ─── Errors ────────────────────────────────────────────────────────────────────

/// Failure modes of the volume layer.
///
/// I/O and geometry failures propagate immediately; there is no retry at
/// this layer (the device is either an in-memory image or boot media where
/// retry has no recovery value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    /// The block device reported a failed sector transfer.
    Io,
    /// Path resolution failed under the fail policy.
    NotFound,
    /// Boot-record or FSInfo signature/geometry checks failed on mount.
    InvalidFormat,
    /// The format-time cluster-size search was exhausted.
    NoValidClusterSize,
    /// A design assumption was violated (cluster size other than one
    /// sector in a creation path, a long name past the encodable range).
    UnsupportedLayout,
    /// A directory cluster chain has no free entry slot left.
    DirectoryFull,
}

impl core::fmt::Display for FsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            FsError::Io => "block device I/O failed",
            FsError::NotFound => "path not found",
            FsError::InvalidFormat => "not a valid FAT32 volume",
            FsError::NoValidClusterSize => "no valid cluster size for volume",
            FsError::UnsupportedLayout => "volume layout not supported by this operation",
            FsError::DirectoryFull => "no free directory entry slot",
        };
        f.write_str(msg)
    }
}

// ─── Shared test fixtures ──────────────────────────────────────────────────────
