//! Volume formatting: cluster-size selection, boot-record and FSInfo
//! construction, FAT seeding.
//!
//! The formatter owns the only code path that creates the boot record and
//! FSInfo; everything after format mutates them in place.

use log::debug;

use crate::device::{BlockDev, PartitionRange, SECTOR_SIZE};
use crate::layout::{
    fat_media_entry, BootSector, FsInfoSector, FAT_END_OF_CHAIN, FAT_ENTRIES_PER_SECTOR,
    MAX_CLUSTERS, MIN_CLUSTERS,
};
use crate::volume::Volume;
use crate::FsError;

/// Reserved region ahead of the first FAT; holds the boot record (0), the
/// FSInfo sector (1) and the backup copies (6, 7).
const RESERVED_SECTORS: u16 = 32;
const FS_INFO_SECTOR: u16 = 1;
const BACKUP_BOOT_SECTOR: u16 = 6;

const NUM_FATS: u8 = 2;
const MEDIA_FIXED_DISK: u8 = 0xF8;
const ROOT_CLUSTER: u32 = 2;

/// Each FAT mirror is capped at 8 MiB so the chosen FAT size can index at
/// most 2^21 clusters; together with the FAT32 cluster-count bounds this
/// drives the cluster-size search (64 MiB volumes land on 512-byte
/// clusters, 32 GiB volumes on 32 KiB).
const MAX_SECTORS_PER_FAT: u32 = 16_384;

const MAX_SECTORS_PER_CLUSTER: u32 = 128;

const DEFAULT_VOLUME_ID: u32 = 0xB007_FA32;
const DEFAULT_LABEL: [u8; 11] = *b"NO NAME    ";

// ─── Options ───────────────────────────────────────────────────────────────────

/// Format-time knobs, builder-shaped.
#[derive(Debug, Clone)]
pub struct FormatOptions {
    volume_label: [u8; 11],
    volume_id: u32,
}

impl FormatOptions {
    pub fn new() -> Self {
        FormatOptions { volume_label: DEFAULT_LABEL, volume_id: DEFAULT_VOLUME_ID }
    }

    pub fn volume_label(mut self, label: [u8; 11]) -> Self {
        self.volume_label = label;
        self
    }

    pub fn volume_id(mut self, id: u32) -> Self {
        self.volume_id = id;
        self
    }

    /// Carry over the serial number of an existing volume's boot record.
    pub fn inherit_volume_id(mut self, reference: &BootSector) -> Self {
        self.volume_id = reference.volume_id;
        self
    }
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Geometry search ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Geometry {
    sectors_per_cluster: u8,
    fat_size: u32,
    cluster_count: u32,
}

/// Pick the smallest power-of-two cluster size whose geometry is valid.
///
/// For each candidate: estimate the cluster count from the data-sector
/// count, size the FAT from that estimate, then re-derive the real cluster
/// count under the corrected FAT size. Accept when the count lies inside
/// the FAT32 bounds, the FAT fits the mirror budget and can index every
/// cluster.
fn choose_geometry(total_sectors: u32) -> Result<Geometry, FsError> {
    let data_sectors = total_sectors
        .checked_sub(RESERVED_SECTORS as u32)
        .ok_or(FsError::NoValidClusterSize)?;

    let mut spc = 1u32;
    while spc <= MAX_SECTORS_PER_CLUSTER {
        let estimate = data_sectors / spc;
        let fat_size = (estimate + 2).div_ceil(FAT_ENTRIES_PER_SECTOR as u32);
        let fat_sectors = NUM_FATS as u32 * fat_size;
        if let Some(usable) = data_sectors.checked_sub(fat_sectors) {
            let cluster_count = usable / spc;
            let indexable = fat_size * FAT_ENTRIES_PER_SECTOR as u32 - 2;
            if fat_size <= MAX_SECTORS_PER_FAT
                && (MIN_CLUSTERS..=MAX_CLUSTERS).contains(&cluster_count)
                && cluster_count <= indexable
            {
                return Ok(Geometry {
                    sectors_per_cluster: spc as u8,
                    fat_size,
                    cluster_count,
                });
            }
        }
        spc *= 2;
    }
    Err(FsError::NoValidClusterSize)
}

// ─── Formatting ────────────────────────────────────────────────────────────────

/// Format `partition` as FAT32 and return the mounted volume handle.
///
/// Writes the primary and backup boot records and FSInfo sectors, zeroes
/// both FAT mirrors and the root directory cluster, and seeds FAT entries
/// 0–2 (media marker plus the two reserved end-of-chain entries, then the
/// root chain terminator).
pub fn format_volume<D: BlockDev>(
    disk: D,
    partition: PartitionRange,
    options: &FormatOptions,
) -> Result<Volume<D>, FsError> {
    let total_sectors =
        u32::try_from(partition.total_sectors()).map_err(|_| FsError::UnsupportedLayout)?;
    let geo = choose_geometry(total_sectors)?;
    debug!(
        "formatting {} sectors: {} sectors/cluster, {} sectors/FAT, {} clusters",
        total_sectors, geo.sectors_per_cluster, geo.fat_size, geo.cluster_count
    );

    let boot = BootSector {
        oem_name: *b"MSWIN4.1",
        bytes_per_sector: SECTOR_SIZE as u16,
        sectors_per_cluster: geo.sectors_per_cluster,
        reserved_sectors: RESERVED_SECTORS,
        num_fats: NUM_FATS,
        media: MEDIA_FIXED_DISK,
        total_sectors,
        fat_size: geo.fat_size,
        root_cluster: ROOT_CLUSTER,
        fs_info_sector: FS_INFO_SECTOR,
        backup_boot_sector: BACKUP_BOOT_SECTOR,
        volume_id: options.volume_id,
        volume_label: options.volume_label,
    };
    // The root directory consumes the first data cluster from the start.
    let fsinfo = FsInfoSector {
        free_count: geo.cluster_count - 1,
        last_allocated: ROOT_CLUSTER,
    };

    let mut vol = Volume::from_parts(disk, partition, boot.clone(), fsinfo);

    let mut sec = [0u8; SECTOR_SIZE];
    boot.encode(&mut sec);
    vol.write_sector(0, &sec)?;
    vol.write_sector(BACKUP_BOOT_SECTOR as u64, &sec)?;

    fsinfo.encode(&mut sec);
    vol.write_sector(FS_INFO_SECTOR as u64, &sec)?;
    vol.write_sector((BACKUP_BOOT_SECTOR + FS_INFO_SECTOR) as u64, &sec)?;

    // Both FAT mirrors start out fully free.
    let zero = [0u8; SECTOR_SIZE];
    let fat_start = boot.fat_start_sector();
    for s in 0..NUM_FATS as u64 * geo.fat_size as u64 {
        vol.write_sector(fat_start + s, &zero)?;
    }

    // An empty root directory: every slot reads as end-of-directory.
    let root_lba = vol.cluster_to_lba(ROOT_CLUSTER);
    for s in 0..geo.sectors_per_cluster as u64 {
        vol.write_sector(root_lba + s, &zero)?;
    }

    vol.set_fat_entry(0, fat_media_entry(MEDIA_FIXED_DISK))?;
    vol.set_fat_entry(1, FAT_END_OF_CHAIN)?;
    vol.set_fat_entry(ROOT_CLUSTER, FAT_END_OF_CHAIN)?;

    Ok(vol)
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
