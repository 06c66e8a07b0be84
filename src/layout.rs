//! On-disk FAT32 structures: boot record/BPB, FSInfo, directory entries,
//! long-name entries and FAT entry classification.
//!
//! Pure layout, no behavior. Every multi-byte field is little-endian on the
//! wire and every offset is written out explicitly instead of relying on
//! struct layout; the tests at the bottom pin each field to its byte
//! position. Boot record and FSInfo are exactly one 512-byte sector,
//! directory and long-name records exactly 32 bytes.

use bitflags::bitflags;

use crate::device::SECTOR_SIZE;
use crate::FsError;

pub const DIR_ENTRY_SIZE: usize = 32;
pub const DIR_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / DIR_ENTRY_SIZE;

/// FAT32 cluster-count bounds: fewer clusters is FAT12/16 territory, more
/// cannot be indexed by a 28-bit FAT entry.
pub const MIN_CLUSTERS: u32 = 65_525;
pub const MAX_CLUSTERS: u32 = 268_435_446;

pub const BOOT_SIGNATURE: u16 = 0xAA55;

// ─── Directory entry attributes ────────────────────────────────────────────────

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN    = 0x02;
        const SYSTEM    = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE   = 0x20;
        /// The four low bits together mark a long-name entry, not a real
        /// short entry.
        const LONG_NAME = 0x0F;
    }
}

// ─── Little-endian field helpers ───────────────────────────────────────────────

fn get_u16(buf: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

fn get_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn put_u16(buf: &mut [u8], off: usize, v: u16) {
    buf[off..off + 2].copy_from_slice(&v.to_le_bytes());
}

fn put_u32(buf: &mut [u8], off: usize, v: u32) {
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}

// ─── Boot record (BPB) ─────────────────────────────────────────────────────────

/// The geometry portion of the FAT32 boot sector, plus the identification
/// fields this crate reads or writes. Offsets follow the published BPB
/// layout; `encode` emits a complete, bootable-shaped sector.
#[derive(Debug, Clone)]
pub struct BootSector {
    pub oem_name:            [u8; 8],
    pub bytes_per_sector:    u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors:    u16,
    pub num_fats:            u8,
    pub media:               u8,
    pub total_sectors:       u32,
    pub fat_size:            u32,
    pub root_cluster:        u32,
    pub fs_info_sector:      u16,
    pub backup_boot_sector:  u16,
    pub volume_id:           u32,
    pub volume_label:        [u8; 11],
}

impl BootSector {
    /// Decode a boot sector, accepting anything structurally FAT32: the
    /// 0x55AA word must be present and the FAT-size fields must identify
    /// FAT32 (16-bit size zero, 32-bit size non-zero). Geometry sanity
    /// beyond that is the mounter's job.
    pub fn parse(raw: &[u8; SECTOR_SIZE]) -> Result<Self, FsError> {
        if get_u16(raw, 510) != BOOT_SIGNATURE {
            return Err(FsError::InvalidFormat);
        }
        let fat_size_16 = get_u16(raw, 22);
        let fat_size_32 = get_u32(raw, 36);
        if fat_size_16 != 0 || fat_size_32 == 0 {
            return Err(FsError::InvalidFormat);
        }
        let mut oem_name = [0u8; 8];
        oem_name.copy_from_slice(&raw[3..11]);
        let mut volume_label = [0u8; 11];
        volume_label.copy_from_slice(&raw[71..82]);
        Ok(BootSector {
            oem_name,
            bytes_per_sector: get_u16(raw, 11),
            sectors_per_cluster: raw[13],
            reserved_sectors: get_u16(raw, 14),
            num_fats: raw[16],
            media: raw[21],
            total_sectors: get_u32(raw, 32),
            fat_size: fat_size_32,
            root_cluster: get_u32(raw, 44),
            fs_info_sector: get_u16(raw, 48),
            backup_boot_sector: get_u16(raw, 50),
            volume_id: get_u32(raw, 67),
            volume_label,
        })
    }

    pub fn encode(&self, out: &mut [u8; SECTOR_SIZE]) {
        out.fill(0);
        // x86 short jump over the BPB, as every reference formatter emits.
        out[0] = 0xEB;
        out[1] = 0x58;
        out[2] = 0x90;
        out[3..11].copy_from_slice(&self.oem_name);
        put_u16(out, 11, self.bytes_per_sector);
        out[13] = self.sectors_per_cluster;
        put_u16(out, 14, self.reserved_sectors);
        out[16] = self.num_fats;
        // root_entry_count (17) and total_sectors_16 (19) stay zero on FAT32.
        out[21] = self.media;
        // fat_size_16 (22) stays zero; CHS geometry (24, 26) is unused on LBA
        // media and left zero like the hidden-sector count (28).
        put_u32(out, 32, self.total_sectors);
        put_u32(out, 36, self.fat_size);
        // ext_flags (40) zero: FAT mirroring enabled. fs_version (42) zero.
        put_u32(out, 44, self.root_cluster);
        put_u16(out, 48, self.fs_info_sector);
        put_u16(out, 50, self.backup_boot_sector);
        out[64] = 0x80; // first fixed disk
        out[66] = 0x29; // extended boot signature: id, label and type follow
        put_u32(out, 67, self.volume_id);
        out[71..82].copy_from_slice(&self.volume_label);
        out[82..90].copy_from_slice(b"FAT32   ");
        put_u16(out, 510, BOOT_SIGNATURE);
    }

    // ── Derived geometry ──

    pub fn fat_start_sector(&self) -> u64 {
        self.reserved_sectors as u64
    }

    /// Relative sector where cluster 2 begins.
    pub fn data_start_sector(&self) -> u64 {
        self.reserved_sectors as u64 + self.num_fats as u64 * self.fat_size as u64
    }

    pub fn cluster_count(&self) -> u32 {
        let data_sectors = self.total_sectors as u64 - self.data_start_sector();
        (data_sectors / self.sectors_per_cluster as u64) as u32
    }

    /// Highest cluster number the data region actually backs.
    pub fn max_valid_cluster(&self) -> u32 {
        self.cluster_count() + 1
    }
}

// ─── FSInfo ────────────────────────────────────────────────────────────────────

/// Free-cluster cache sector. Mirrored at a backup location that stays
/// bit-identical to the primary after every update in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsInfoSector {
    /// Count of free clusters on the volume.
    pub free_count: u32,
    /// Allocation cursor: the most recently allocated cluster.
    pub last_allocated: u32,
}

impl FsInfoSector {
    pub const LEAD_SIGNATURE: u32 = 0x41615252;
    pub const STRUCT_SIGNATURE: u32 = 0x61417272;
    pub const TRAIL_SIGNATURE: u32 = 0xAA550000;

    pub fn parse(raw: &[u8; SECTOR_SIZE]) -> Result<Self, FsError> {
        if get_u32(raw, 0) != Self::LEAD_SIGNATURE
            || get_u32(raw, 484) != Self::STRUCT_SIGNATURE
            || get_u32(raw, 508) != Self::TRAIL_SIGNATURE
        {
            return Err(FsError::InvalidFormat);
        }
        Ok(FsInfoSector {
            free_count: get_u32(raw, 488),
            last_allocated: get_u32(raw, 492),
        })
    }

    pub fn encode(&self, out: &mut [u8; SECTOR_SIZE]) {
        out.fill(0);
        put_u32(out, 0, Self::LEAD_SIGNATURE);
        put_u32(out, 484, Self::STRUCT_SIGNATURE);
        put_u32(out, 488, self.free_count);
        put_u32(out, 492, self.last_allocated);
        put_u32(out, 508, Self::TRAIL_SIGNATURE);
    }
}

// ─── Packed date / time ────────────────────────────────────────────────────────

/// DOS-packed date: 7-bit year offset from 1980, 4-bit month, 5-bit day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDate(pub u16);

impl DosDate {
    /// 1980-01-01, the stamp creation paths use (no clock at this layer).
    pub const EPOCH: DosDate = DosDate(1 << 5 | 1);

    pub fn new(year: u16, month: u16, day: u16) -> Self {
        DosDate((year - 1980) << 9 | month << 5 | day)
    }

    pub fn year(self) -> u16 {
        (self.0 >> 9) + 1980
    }
    pub fn month(self) -> u16 {
        (self.0 >> 5) & 0x0F
    }
    pub fn day(self) -> u16 {
        self.0 & 0x1F
    }
}

/// DOS-packed time: 5-bit hour, 6-bit minute, 5-bit two-second units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosTime(pub u16);

impl DosTime {
    pub const MIDNIGHT: DosTime = DosTime(0);

    pub fn new(hour: u16, minute: u16, second: u16) -> Self {
        DosTime(hour << 11 | minute << 5 | second / 2)
    }

    pub fn hour(self) -> u16 {
        self.0 >> 11
    }
    pub fn minute(self) -> u16 {
        (self.0 >> 5) & 0x3F
    }
    pub fn second(self) -> u16 {
        (self.0 & 0x1F) * 2
    }
}

// ─── Directory entry (32 bytes) ────────────────────────────────────────────────

/// First-byte classification of a 32-byte directory slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// 0x00: never used; terminates the directory scan.
    End,
    /// 0xE5: previously deleted (this crate never writes these).
    Deleted,
    /// 0x20: a leading space is not a legal short name; distinguishable
    /// from a free slot so corruption shows up as itself.
    Invalid,
    Occupied,
}

pub fn slot_state(first_byte: u8) -> SlotState {
    match first_byte {
        0x00 => SlotState::End,
        0xE5 => SlotState::Deleted,
        0x20 => SlotState::Invalid,
        _ => SlotState::Occupied,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DirEntry {
    pub name:        [u8; 11],
    pub attributes:  Attributes,
    pub create_time: DosTime,
    pub create_date: DosDate,
    pub access_date: DosDate,
    pub write_time:  DosTime,
    pub write_date:  DosDate,
    pub first_cluster: u32,
    pub file_size:   u32,
}

impl DirEntry {
    pub fn parse(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), DIR_ENTRY_SIZE);
        let mut name = [0u8; 11];
        name.copy_from_slice(&raw[0..11]);
        DirEntry {
            name,
            attributes: Attributes::from_bits_retain(raw[11]),
            create_time: DosTime(get_u16(raw, 14)),
            create_date: DosDate(get_u16(raw, 16)),
            access_date: DosDate(get_u16(raw, 18)),
            write_time: DosTime(get_u16(raw, 22)),
            write_date: DosDate(get_u16(raw, 24)),
            first_cluster: combine_cluster(get_u16(raw, 26), get_u16(raw, 20)),
            file_size: get_u32(raw, 28),
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), DIR_ENTRY_SIZE);
        out.fill(0);
        out[0..11].copy_from_slice(&self.name);
        out[11] = self.attributes.bits();
        // NT case byte (12) and creation tenths (13) stay zero.
        put_u16(out, 14, self.create_time.0);
        put_u16(out, 16, self.create_date.0);
        put_u16(out, 18, self.access_date.0);
        let (lo, hi) = split_cluster(self.first_cluster);
        put_u16(out, 20, hi);
        put_u16(out, 22, self.write_time.0);
        put_u16(out, 24, self.write_date.0);
        put_u16(out, 26, lo);
        put_u32(out, 28, self.file_size);
    }

    pub fn is_long_name(&self) -> bool {
        self.attributes.contains(Attributes::LONG_NAME)
    }

    pub fn is_directory(&self) -> bool {
        !self.is_long_name() && self.attributes.contains(Attributes::DIRECTORY)
    }

    pub fn is_volume_id(&self) -> bool {
        !self.is_long_name() && self.attributes.contains(Attributes::VOLUME_ID)
    }
}

/// Combine the split low/high halves of a starting-cluster number.
pub fn combine_cluster(lo: u16, hi: u16) -> u32 {
    (hi as u32) << 16 | lo as u32
}

pub fn split_cluster(cluster: u32) -> (u16, u16) {
    (cluster as u16, (cluster >> 16) as u16)
}

// ─── Long-name entry (32 bytes) ────────────────────────────────────────────────

/// UTF-16 code units stored per physical long-name entry, split across the
/// three discontiguous byte ranges (5 + 6 + 2).
pub const LFN_UNITS_PER_ENTRY: usize = 13;

/// Sequence-byte flag on the first physical entry of a long-name block.
pub const LFN_FIRST_PHYSICAL: u8 = 0x40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LfnEntry {
    pub sequence: u8,
    pub checksum: u8,
    pub units:    [u16; LFN_UNITS_PER_ENTRY],
}

impl LfnEntry {
    /// 5-bit ordinal without the flag bits.
    pub fn ordinal(&self) -> u8 {
        self.sequence & 0x1F
    }

    pub fn is_first_physical(&self) -> bool {
        self.sequence & LFN_FIRST_PHYSICAL != 0
    }

    /// The entry adjacent to the short entry terminates the block.
    pub fn is_last_logical(&self) -> bool {
        self.ordinal() == 1
    }

    pub fn parse(raw: &[u8]) -> Self {
        debug_assert_eq!(raw.len(), DIR_ENTRY_SIZE);
        let mut units = [0u16; LFN_UNITS_PER_ENTRY];
        for (i, off) in unit_offsets().enumerate() {
            units[i] = get_u16(raw, off);
        }
        LfnEntry {
            sequence: raw[0],
            checksum: raw[13],
            units,
        }
    }

    pub fn encode(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), DIR_ENTRY_SIZE);
        out.fill(0);
        out[0] = self.sequence;
        out[11] = Attributes::LONG_NAME.bits();
        // type byte (12) zero; first_cluster_lo (26) must be zero.
        out[13] = self.checksum;
        for (i, off) in unit_offsets().enumerate() {
            put_u16(out, off, self.units[i]);
        }
    }
}

/// Byte offsets of the 13 name units: 5 at 1..11, 6 at 14..26, 2 at 28..32.
fn unit_offsets() -> impl Iterator<Item = usize> {
    (1..11).step_by(2).chain((14..26).step_by(2)).chain((28..32).step_by(2))
}

// ─── FAT entries ───────────────────────────────────────────────────────────────

/// Bytes per 32-bit FAT entry (28 significant bits, top 4 reserved).
pub const FAT_ENTRY_SIZE: usize = 4;
pub const FAT_ENTRIES_PER_SECTOR: usize = SECTOR_SIZE / FAT_ENTRY_SIZE;

pub const FAT_FREE: u32 = 0;
/// Generic allocated end-of-chain marker.
pub const FAT_END_OF_CHAIN: u32 = 0x0FFF_FFFF;
pub const FAT_BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// Reserved entry 0 carries the media descriptor in its low byte.
pub fn fat_media_entry(media: u8) -> u32 {
    0x0FFF_FF00 | media as u32
}

/// A 28-bit FAT entry classified by numeric range, relative to the
/// volume's maximum valid cluster number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatEntry {
    Free,
    /// Chain continues at the contained cluster.
    Allocated(u32),
    EndOfChain,
    Reserved,
    Bad,
}

impl FatEntry {
    pub fn classify(raw: u32, max_valid_cluster: u32) -> Self {
        match raw & 0x0FFF_FFFF {
            0 => FatEntry::Free,
            1 => FatEntry::Reserved,
            n if n <= max_valid_cluster => FatEntry::Allocated(n),
            n if n < FAT_BAD_CLUSTER => FatEntry::Reserved,
            FAT_BAD_CLUSTER => FatEntry::Bad,
            _ => FatEntry::EndOfChain,
        }
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;

    fn sample_boot_sector() -> BootSector {
        BootSector {
            oem_name: *b"BOOTFAT ",
            bytes_per_sector: 512,
            sectors_per_cluster: 1,
            reserved_sectors: 32,
            num_fats: 2,
            media: 0xF8,
            total_sectors: 131_072,
            fat_size: 1024,
            root_cluster: 2,
            fs_info_sector: 1,
            backup_boot_sector: 6,
            volume_id: 0x1234_5678,
            volume_label: *b"BOOT       ",
        }
    }

    #[test]
    fn boot_sector_field_positions() {
        let mut raw = [0u8; SECTOR_SIZE];
        sample_boot_sector().encode(&mut raw);
        assert_eq!(&raw[0..3], &[0xEB, 0x58, 0x90]);
        assert_eq!(&raw[3..11], b"BOOTFAT ");
        assert_eq!(u16::from_le_bytes([raw[11], raw[12]]), 512);
        assert_eq!(raw[13], 1);
        assert_eq!(u16::from_le_bytes([raw[14], raw[15]]), 32);
        assert_eq!(raw[16], 2);
        assert_eq!(u16::from_le_bytes([raw[17], raw[18]]), 0); // root entries
        assert_eq!(u16::from_le_bytes([raw[19], raw[20]]), 0); // 16-bit total
        assert_eq!(raw[21], 0xF8);
        assert_eq!(u16::from_le_bytes([raw[22], raw[23]]), 0); // 16-bit FAT size
        assert_eq!(u32::from_le_bytes([raw[32], raw[33], raw[34], raw[35]]), 131_072);
        assert_eq!(u32::from_le_bytes([raw[36], raw[37], raw[38], raw[39]]), 1024);
        assert_eq!(u32::from_le_bytes([raw[44], raw[45], raw[46], raw[47]]), 2);
        assert_eq!(u16::from_le_bytes([raw[48], raw[49]]), 1);
        assert_eq!(u16::from_le_bytes([raw[50], raw[51]]), 6);
        assert_eq!(raw[66], 0x29);
        assert_eq!(u32::from_le_bytes([raw[67], raw[68], raw[69], raw[70]]), 0x1234_5678);
        assert_eq!(&raw[71..82], b"BOOT       ");
        assert_eq!(&raw[82..90], b"FAT32   ");
        assert_eq!(raw[510], 0x55);
        assert_eq!(raw[511], 0xAA);
    }

    #[test]
    fn boot_sector_roundtrip() {
        let bs = sample_boot_sector();
        let mut raw = [0u8; SECTOR_SIZE];
        bs.encode(&mut raw);
        let back = BootSector::parse(&raw).unwrap();
        assert_eq!(back.bytes_per_sector, 512);
        assert_eq!(back.sectors_per_cluster, 1);
        assert_eq!(back.reserved_sectors, 32);
        assert_eq!(back.fat_size, 1024);
        assert_eq!(back.root_cluster, 2);
        assert_eq!(back.volume_id, 0x1234_5678);
        assert_eq!(back.media, 0xF8);
    }

    #[test]
    fn boot_sector_rejects_missing_signature() {
        let mut raw = [0u8; SECTOR_SIZE];
        sample_boot_sector().encode(&mut raw);
        raw[510] = 0;
        assert!(matches!(BootSector::parse(&raw), Err(FsError::InvalidFormat)));
    }

    #[test]
    fn boot_sector_rejects_fat16_geometry() {
        let mut raw = [0u8; SECTOR_SIZE];
        sample_boot_sector().encode(&mut raw);
        raw[22] = 9; // 16-bit FAT size set: FAT12/16 volume
        assert!(BootSector::parse(&raw).is_err());
    }

    #[test]
    fn boot_sector_derived_geometry() {
        let bs = sample_boot_sector();
        assert_eq!(bs.fat_start_sector(), 32);
        assert_eq!(bs.data_start_sector(), 32 + 2048);
        assert_eq!(bs.cluster_count(), 131_072 - 32 - 2048);
        assert_eq!(bs.max_valid_cluster(), bs.cluster_count() + 1);
    }

    #[test]
    fn fsinfo_field_positions() {
        let fsi = FsInfoSector { free_count: 1000, last_allocated: 5 };
        let mut raw = [0u8; SECTOR_SIZE];
        fsi.encode(&mut raw);
        assert_eq!(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]), 0x41615252);
        assert_eq!(u32::from_le_bytes([raw[484], raw[485], raw[486], raw[487]]), 0x61417272);
        assert_eq!(u32::from_le_bytes([raw[488], raw[489], raw[490], raw[491]]), 1000);
        assert_eq!(u32::from_le_bytes([raw[492], raw[493], raw[494], raw[495]]), 5);
        assert_eq!(u32::from_le_bytes([raw[508], raw[509], raw[510], raw[511]]), 0xAA550000);
        assert_eq!(FsInfoSector::parse(&raw).unwrap(), fsi);
    }

    #[test]
    fn fsinfo_rejects_bad_signature() {
        let mut raw = [0u8; SECTOR_SIZE];
        FsInfoSector { free_count: 0, last_allocated: 2 }.encode(&mut raw);
        raw[0] ^= 0xFF;
        assert!(FsInfoSector::parse(&raw).is_err());
    }

    #[test]
    fn dir_entry_field_positions() {
        let e = DirEntry {
            name: *b"FOO     TXT",
            attributes: Attributes::ARCHIVE,
            create_time: DosTime::new(13, 30, 10),
            create_date: DosDate::new(2024, 6, 15),
            access_date: DosDate::new(2024, 6, 15),
            write_time: DosTime::new(13, 30, 10),
            write_date: DosDate::new(2024, 6, 15),
            first_cluster: 0x0005_0003,
            file_size: 42,
        };
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        e.encode(&mut raw);
        assert_eq!(&raw[0..11], b"FOO     TXT");
        assert_eq!(raw[11], 0x20);
        assert_eq!(u16::from_le_bytes([raw[20], raw[21]]), 0x0005); // cluster hi
        assert_eq!(u16::from_le_bytes([raw[26], raw[27]]), 0x0003); // cluster lo
        assert_eq!(u32::from_le_bytes([raw[28], raw[29], raw[30], raw[31]]), 42);

        let back = DirEntry::parse(&raw);
        assert_eq!(back.first_cluster, 0x0005_0003);
        assert_eq!(back.file_size, 42);
        assert_eq!(back.write_date.year(), 2024);
        assert_eq!(back.write_date.month(), 6);
        assert_eq!(back.write_date.day(), 15);
        assert_eq!(back.write_time.hour(), 13);
        assert_eq!(back.write_time.minute(), 30);
        assert_eq!(back.write_time.second(), 10);
    }

    #[test]
    fn cluster_split_roundtrip() {
        for c in [0u32, 2, 0xFFFF, 0x10000, 0x0FFF_FFF6, MAX_CLUSTERS] {
            let (lo, hi) = split_cluster(c);
            assert_eq!(combine_cluster(lo, hi), c);
        }
    }

    #[test]
    fn slot_states() {
        assert_eq!(slot_state(0x00), SlotState::End);
        assert_eq!(slot_state(0xE5), SlotState::Deleted);
        assert_eq!(slot_state(0x20), SlotState::Invalid);
        assert_eq!(slot_state(b'A'), SlotState::Occupied);
    }

    #[test]
    fn long_name_detection() {
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        LfnEntry { sequence: 0x41, checksum: 0, units: [0xFFFF; 13] }.encode(&mut raw);
        let as_dir = DirEntry::parse(&raw);
        assert!(as_dir.is_long_name());
        assert!(!as_dir.is_directory());
        assert!(!as_dir.is_volume_id());
    }

    #[test]
    fn lfn_entry_unit_positions() {
        let mut units = [0u16; 13];
        for (i, u) in units.iter_mut().enumerate() {
            *u = 0x100 + i as u16;
        }
        let e = LfnEntry { sequence: 0x42, checksum: 0xAB, units };
        let mut raw = [0u8; DIR_ENTRY_SIZE];
        e.encode(&mut raw);
        assert_eq!(raw[0], 0x42);
        assert_eq!(raw[11], 0x0F);
        assert_eq!(raw[13], 0xAB);
        // 5 units at 1..11, 6 at 14..26, 2 at 28..32
        assert_eq!(u16::from_le_bytes([raw[1], raw[2]]), 0x100);
        assert_eq!(u16::from_le_bytes([raw[9], raw[10]]), 0x104);
        assert_eq!(u16::from_le_bytes([raw[14], raw[15]]), 0x105);
        assert_eq!(u16::from_le_bytes([raw[24], raw[25]]), 0x10A);
        assert_eq!(u16::from_le_bytes([raw[26], raw[27]]), 0); // cluster lo must be 0
        assert_eq!(u16::from_le_bytes([raw[28], raw[29]]), 0x10B);
        assert_eq!(u16::from_le_bytes([raw[30], raw[31]]), 0x10C);
        assert_eq!(LfnEntry::parse(&raw), e);
    }

    #[test]
    fn lfn_sequence_flags() {
        let first = LfnEntry { sequence: 0x42, checksum: 0, units: [0; 13] };
        assert_eq!(first.ordinal(), 2);
        assert!(first.is_first_physical());
        assert!(!first.is_last_logical());
        let last = LfnEntry { sequence: 0x01, checksum: 0, units: [0; 13] };
        assert_eq!(last.ordinal(), 1);
        assert!(!last.is_first_physical());
        assert!(last.is_last_logical());
    }

    #[test]
    fn fat_entry_classification() {
        let max = 128_992;
        assert_eq!(FatEntry::classify(0, max), FatEntry::Free);
        assert_eq!(FatEntry::classify(1, max), FatEntry::Reserved);
        assert_eq!(FatEntry::classify(2, max), FatEntry::Allocated(2));
        assert_eq!(FatEntry::classify(max, max), FatEntry::Allocated(max));
        assert_eq!(FatEntry::classify(max + 1, max), FatEntry::Reserved);
        assert_eq!(FatEntry::classify(FAT_BAD_CLUSTER, max), FatEntry::Bad);
        assert_eq!(FatEntry::classify(0x0FFF_FFF8, max), FatEntry::EndOfChain);
        assert_eq!(FatEntry::classify(FAT_END_OF_CHAIN, max), FatEntry::EndOfChain);
        // top four bits are reserved and ignored
        assert_eq!(FatEntry::classify(0xF000_0000, max), FatEntry::Free);
    }

    #[test]
    fn media_entry_places_descriptor_in_low_byte() {
        assert_eq!(fat_media_entry(0xF8), 0x0FFF_FFF8);
    }

    #[test]
    fn dos_date_time_bit_packing() {
        let d = DosDate::new(1980, 1, 1);
        assert_eq!(d.0, 0x0021);
        assert_eq!(DosDate::EPOCH, d);
        let t = DosTime::new(23, 59, 58);
        assert_eq!(t.hour(), 23);
        assert_eq!(t.minute(), 59);
        assert_eq!(t.second(), 58);
    }
}
