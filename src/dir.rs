//! Directory resolution and creation.
//!
//! Paths are absolute and '/'-separated. Resolution walks directory-entry
//! sectors linearly from the root cluster; a miss (the 0x00 end-of-directory
//! slot) applies the caller's policy: fail, create a file, or create a
//! directory. Long-name entries are emitted immediately before the short
//! entry when a component doesn't fit 8.3.
//!
//! Creation paths require one sector per cluster — an explicit invariant of
//! the boot-image flow, not a general capability. Directories are a single
//! fresh cluster and are never extended; entries are never deleted, so free
//! slots only exist in the 0x00 tail of a directory.

use log::debug;

use crate::device::{BlockDev, SECTOR_SIZE};
use crate::layout::{
    slot_state, Attributes, DirEntry, DosDate, DosTime, FatEntry, SlotState,
    DIR_ENTRIES_PER_SECTOR, DIR_ENTRY_SIZE, FAT_END_OF_CHAIN,
};
use crate::name::{encode_long_name, fits_short, pack_short, short_name_checksum, unpack_short};
use crate::volume::Volume;
use crate::FsError;

const DOT_NAME: [u8; 11] = *b".          ";
const DOTDOT_NAME: [u8; 11] = *b"..         ";

/// A resolved directory entry: identity plus its on-disk location
/// (directory start cluster, holding sector and slot index).
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    /// Packed 11-byte short name (the alias, for long-named entries).
    pub name: [u8; 11],
    pub attributes: Attributes,
    pub first_cluster: u32,
    pub file_size: u32,
    /// Start cluster of the directory holding this entry.
    pub dir_cluster: u32,
    /// Partition-relative sector holding the 32-byte slot.
    pub lba: u64,
    /// Slot index within that sector.
    pub slot: usize,
}

impl Entry {
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    /// Short name as text, e.g. `"BOOTX64.EFI"`. Returns buffer and length.
    pub fn short_name(&self) -> ([u8; 12], usize) {
        unpack_short(&self.name)
    }
}

/// What to do when a path component hits the end-of-directory marker.
#[derive(Clone, Copy)]
enum MissPolicy<'a> {
    Fail,
    CreateFile { content: &'a [u8] },
    CreateDir,
}

enum Scan {
    Found(Entry),
    /// First 0x00 slot, where a new entry block would be inserted.
    End { lba: u64, slot: usize },
    /// Chain exhausted without a match or a free slot.
    Full,
}

impl<D: BlockDev> Volume<D> {
    /// Resolve `path` or fail with `NotFound`.
    ///
    /// `/` (or the empty path) resolves to a synthetic root entry.
    pub fn lookup(&mut self, path: &str) -> Result<Entry, FsError> {
        self.walk(path, MissPolicy::Fail)
    }

    /// Resolve `path`, creating missing directories along the way.
    /// Creating an already-existing directory returns the existing entry
    /// unchanged — no duplicate is inserted.
    pub fn create_dir(&mut self, path: &str) -> Result<Entry, FsError> {
        self.walk(path, MissPolicy::CreateDir)
    }

    /// Create a file at `path` with `content`, allocating and writing its
    /// backing clusters. Parent directories must already exist. If the
    /// final component already exists its entry is returned untouched
    /// (there is no overwrite path: clusters are never freed).
    pub fn create_file(&mut self, path: &str, content: &[u8]) -> Result<Entry, FsError> {
        self.walk(path, MissPolicy::CreateFile { content })
    }

    /// List the entries of the directory starting at `cluster` into `out`;
    /// returns the number written. Long-name and volume-label slots are
    /// skipped, real entries (including `.`/`..`) are reported.
    pub fn read_dir(&mut self, cluster: u32, out: &mut [Entry]) -> Result<usize, FsError> {
        let mut count = 0usize;
        self.for_each_slot(cluster, |entry| {
            if count < out.len() {
                out[count] = entry;
                count += 1;
            }
            count == out.len()
        })?;
        Ok(count)
    }

    // ── Path walk ──

    fn walk(&mut self, path: &str, policy: MissPolicy) -> Result<Entry, FsError> {
        let mut cluster = self.root_cluster();
        let mut parts = path.split('/').filter(|c| !c.is_empty()).peekable();
        if parts.peek().is_none() {
            return match policy {
                MissPolicy::Fail => Ok(root_entry(cluster)),
                _ => Err(FsError::NotFound),
            };
        }

        while let Some(component) = parts.next() {
            let last = parts.peek().is_none();
            let found = match self.scan_dir(cluster, &pack_short(component))? {
                Scan::Found(entry) => entry,
                Scan::End { lba, slot } => match policy {
                    MissPolicy::Fail => return Err(FsError::NotFound),
                    MissPolicy::CreateFile { content } => {
                        // Intermediate components are never materialized as
                        // files; the parent has to exist already.
                        if !last {
                            return Err(FsError::NotFound);
                        }
                        return self.insert_file(cluster, lba, slot, component, content);
                    }
                    MissPolicy::CreateDir => self.insert_dir(cluster, lba, slot, component)?,
                },
                Scan::Full => {
                    return Err(match policy {
                        MissPolicy::Fail => FsError::NotFound,
                        _ => FsError::DirectoryFull,
                    });
                }
            };

            if last {
                return Ok(found);
            }
            if !found.is_directory() {
                return Err(FsError::NotFound);
            }
            // `..` of a first-level directory points at cluster 0: the
            // on-disk stand-in for the root.
            cluster = if found.first_cluster < 2 {
                self.root_cluster()
            } else {
                found.first_cluster
            };
        }
        Err(FsError::NotFound)
    }

    /// Linear scan of a directory chain for a packed short name.
    fn scan_dir(&mut self, start_cluster: u32, packed: &[u8; 11]) -> Result<Scan, FsError> {
        let mut result = None;
        self.for_each_slot(start_cluster, |entry| {
            if &entry.name == packed {
                result = Some(entry);
                return true;
            }
            false
        })?;
        if let Some(entry) = result {
            return Ok(Scan::Found(entry));
        }
        // Re-walk to locate the end marker; a second pass keeps the scan
        // closure simple and the chain is short in practice.
        self.find_end_slot(start_cluster)
    }

    /// Visit each occupied real entry (not long-name, not volume label) in
    /// chain order until `visit` returns true.
    fn for_each_slot<F>(&mut self, start_cluster: u32, mut visit: F) -> Result<(), FsError>
    where
        F: FnMut(Entry) -> bool,
    {
        let spc = self.boot_sector().sectors_per_cluster as u64;
        let max_hops = self.boot_sector().cluster_count();
        let mut cluster = start_cluster;
        let mut hops = 0u32;
        loop {
            let base = self.cluster_to_lba(cluster);
            for s in 0..spc {
                let lba = base + s;
                let mut sec = [0u8; SECTOR_SIZE];
                self.read_sector(lba, &mut sec)?;
                for i in 0..DIR_ENTRIES_PER_SECTOR {
                    let raw = &sec[i * DIR_ENTRY_SIZE..(i + 1) * DIR_ENTRY_SIZE];
                    match slot_state(raw[0]) {
                        SlotState::End => return Ok(()),
                        SlotState::Deleted => continue,
                        SlotState::Invalid => return Err(FsError::UnsupportedLayout),
                        SlotState::Occupied => {}
                    }
                    let parsed = DirEntry::parse(raw);
                    if parsed.is_long_name() || parsed.is_volume_id() {
                        continue;
                    }
                    let entry = Entry {
                        name: parsed.name,
                        attributes: parsed.attributes,
                        first_cluster: parsed.first_cluster,
                        file_size: parsed.file_size,
                        dir_cluster: start_cluster,
                        lba,
                        slot: i,
                    };
                    if visit(entry) {
                        return Ok(());
                    }
                }
            }
            cluster = match self.fat_entry(cluster)? {
                FatEntry::Allocated(next) => next,
                FatEntry::EndOfChain => return Ok(()),
                _ => return Err(FsError::UnsupportedLayout),
            };
            hops += 1;
            if hops > max_hops {
                return Err(FsError::UnsupportedLayout);
            }
        }
    }

    fn find_end_slot(&mut self, start_cluster: u32) -> Result<Scan, FsError> {
        let spc = self.boot_sector().sectors_per_cluster as u64;
        let max_hops = self.boot_sector().cluster_count();
        let mut cluster = start_cluster;
        let mut hops = 0u32;
        loop {
            let base = self.cluster_to_lba(cluster);
            for s in 0..spc {
                let lba = base + s;
                let mut sec = [0u8; SECTOR_SIZE];
                self.read_sector(lba, &mut sec)?;
                for i in 0..DIR_ENTRIES_PER_SECTOR {
                    if slot_state(sec[i * DIR_ENTRY_SIZE]) == SlotState::End {
                        return Ok(Scan::End { lba, slot: i });
                    }
                }
            }
            cluster = match self.fat_entry(cluster)? {
                FatEntry::Allocated(next) => next,
                FatEntry::EndOfChain => return Ok(Scan::Full),
                _ => return Err(FsError::UnsupportedLayout),
            };
            hops += 1;
            if hops > max_hops {
                return Err(FsError::UnsupportedLayout);
            }
        }
    }

    // ── Creation ──

    fn insert_file(
        &mut self,
        parent_cluster: u32,
        lba: u64,
        slot: usize,
        name: &str,
        content: &[u8],
    ) -> Result<Entry, FsError> {
        self.require_single_sector_clusters()?;

        let first_cluster = if content.is_empty() {
            0
        } else {
            let count = content.len().div_ceil(SECTOR_SIZE) as u32;
            let first = self.allocate_clusters(count)?;
            for i in 0..count - 1 {
                self.set_fat_entry(first + i, first + i + 1)?;
            }
            self.set_fat_entry(first + count - 1, FAT_END_OF_CHAIN)?;

            let mut off = 0usize;
            for i in 0..count {
                let mut sec = [0u8; SECTOR_SIZE];
                let n = (content.len() - off).min(SECTOR_SIZE);
                sec[..n].copy_from_slice(&content[off..off + n]);
                let dest = self.cluster_to_lba(first + i);
                self.write_sector(dest, &sec)?;
                off += n;
            }
            first
        };

        debug!("created file {name} ({} bytes)", content.len());
        self.write_entry_block(
            parent_cluster,
            lba,
            slot,
            name,
            Attributes::ARCHIVE,
            first_cluster,
            content.len() as u32,
        )
    }

    fn insert_dir(
        &mut self,
        parent_cluster: u32,
        lba: u64,
        slot: usize,
        name: &str,
    ) -> Result<Entry, FsError> {
        self.require_single_sector_clusters()?;

        let new_cluster = self.allocate_clusters(1)?;
        self.set_fat_entry(new_cluster, FAT_END_OF_CHAIN)?;

        // Seed the fresh cluster: `.`, `..`, then 0x00 slots to the end.
        // `..` carries cluster 0 when the parent is the root, matching the
        // on-disk convention that root has no real cluster number.
        let parent_ref = if parent_cluster == self.root_cluster() { 0 } else { parent_cluster };
        let mut sec = [0u8; SECTOR_SIZE];
        plain_entry(DOT_NAME, Attributes::DIRECTORY, new_cluster)
            .encode(&mut sec[0..DIR_ENTRY_SIZE]);
        plain_entry(DOTDOT_NAME, Attributes::DIRECTORY, parent_ref)
            .encode(&mut sec[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE]);
        let dest = self.cluster_to_lba(new_cluster);
        self.write_sector(dest, &sec)?;

        debug!("created directory {name} at cluster {new_cluster}");
        self.write_entry_block(
            parent_cluster,
            lba,
            slot,
            name,
            Attributes::DIRECTORY,
            new_cluster,
            0,
        )
    }

    /// Write the long-name block (if needed) and the short entry into the
    /// sector holding the directory's first free slot.
    fn write_entry_block(
        &mut self,
        parent_cluster: u32,
        lba: u64,
        slot: usize,
        name: &str,
        attributes: Attributes,
        first_cluster: u32,
        file_size: u32,
    ) -> Result<Entry, FsError> {
        let packed = pack_short(name);
        let mut sec = [0u8; SECTOR_SIZE];
        self.read_sector(lba, &mut sec)?;

        let mut idx = slot;
        if !fits_short(name) {
            let block = encode_long_name(name, short_name_checksum(&packed))?;
            if slot + block.entries().len() + 1 > DIR_ENTRIES_PER_SECTOR {
                return Err(FsError::DirectoryFull);
            }
            for lfn in block.entries() {
                lfn.encode(&mut sec[idx * DIR_ENTRY_SIZE..(idx + 1) * DIR_ENTRY_SIZE]);
                idx += 1;
            }
        }

        let short = DirEntry {
            name: packed,
            attributes,
            create_time: DosTime::MIDNIGHT,
            create_date: DosDate::EPOCH,
            access_date: DosDate::EPOCH,
            write_time: DosTime::MIDNIGHT,
            write_date: DosDate::EPOCH,
            first_cluster,
            file_size,
        };
        short.encode(&mut sec[idx * DIR_ENTRY_SIZE..(idx + 1) * DIR_ENTRY_SIZE]);
        self.write_sector(lba, &sec)?;

        Ok(Entry {
            name: packed,
            attributes,
            first_cluster,
            file_size,
            dir_cluster: parent_cluster,
            lba,
            slot: idx,
        })
    }

    fn require_single_sector_clusters(&self) -> Result<(), FsError> {
        if self.boot_sector().sectors_per_cluster != 1 {
            return Err(FsError::UnsupportedLayout);
        }
        Ok(())
    }
}

fn root_entry(root_cluster: u32) -> Entry {
    Entry {
        name: *b"/          ",
        attributes: Attributes::DIRECTORY,
        first_cluster: root_cluster,
        file_size: 0,
        dir_cluster: root_cluster,
        lba: 0,
        slot: 0,
    }
}

fn plain_entry(name: [u8; 11], attributes: Attributes, first_cluster: u32) -> DirEntry {
    DirEntry {
        name,
        attributes,
        create_time: DosTime::MIDNIGHT,
        create_date: DosDate::EPOCH,
        access_date: DosDate::EPOCH,
        write_time: DosTime::MIDNIGHT,
        write_date: DosDate::EPOCH,
        first_cluster,
        file_size: 0,
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
