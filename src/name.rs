//! Short (8.3) name handling and the VFAT long-name encoder.
//!
//! Short names are packed the classic way: uppercase, base left-justified
//! and space-padded to 8 bytes, extension to 3. Names that don't fit take
//! the long-name path; their short slot holds the truncated alias with no
//! numeric-tail disambiguation (`LONGFI~1`-style generation is out of
//! scope, so two long names sharing an alias collide).

use crate::layout::{LfnEntry, LFN_FIRST_PHYSICAL, LFN_UNITS_PER_ENTRY};
use crate::FsError;

/// Maximum UTF-16 code units accepted for a single name component.
pub const MAX_NAME_UNITS: usize = 255;

/// Upper bound on physical long-name entries per component.
pub const MAX_LFN_ENTRIES: usize = MAX_NAME_UNITS.div_ceil(UNITS_PER_CHUNK);

/// Code units consumed per emitted entry when sizing a long-name block.
const UNITS_PER_CHUNK: usize = 2 * LFN_UNITS_PER_ENTRY;

const INVALID_SHORT_CHARS: &[u8] = b" ./\\:*?\"<>|+,;=[]";

// ─── Short names ───────────────────────────────────────────────────────────────

/// Whether `name` can be stored directly in the 11-byte short slot.
pub fn fits_short(name: &str) -> bool {
    if name.is_empty() || !name.is_ascii() {
        return false;
    }
    let (base, ext) = split_base_ext(name);
    !base.is_empty()
        && base.len() <= 8
        && ext.len() <= 3
        && base.bytes().all(valid_short_byte)
        && ext.bytes().all(valid_short_byte)
}

fn valid_short_byte(b: u8) -> bool {
    !b.is_ascii_control() && !INVALID_SHORT_CHARS.contains(&b)
}

fn split_base_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) => (&name[..i], &name[i + 1..]),
        None => (name, ""),
    }
}

/// Pack a name into the padded uppercase 11-byte short slot, truncating
/// the base to 8 and the extension to 3 bytes. For names that fit this is
/// the stored short name; for longer ones it is the alias under the
/// long-name block.
pub fn pack_short(name: &str) -> [u8; 11] {
    // `.` and `..` are literal names, not base/extension splits.
    if name == "." {
        return *b".          ";
    }
    if name == ".." {
        return *b"..         ";
    }
    let mut out = [b' '; 11];
    let (base, ext) = split_base_ext(name);
    for (i, b) in base.bytes().take(8).enumerate() {
        out[i] = b.to_ascii_uppercase();
    }
    for (i, b) in ext.bytes().take(3).enumerate() {
        out[8 + i] = b.to_ascii_uppercase();
    }
    out
}

/// Render a packed short name back to text, e.g. `"HELLO   TXT"` → `"HELLO.TXT"`.
/// Returns the buffer and the used length.
pub fn unpack_short(packed: &[u8; 11]) -> ([u8; 12], usize) {
    let mut buf = [0u8; 12];
    let mut len = 0usize;
    let base_end = packed[..8].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    buf[..base_end].copy_from_slice(&packed[..base_end]);
    len += base_end;
    let ext_end = packed[8..].iter().rposition(|&b| b != b' ').map_or(0, |i| i + 1);
    if ext_end > 0 {
        buf[len] = b'.';
        len += 1;
        buf[len..len + ext_end].copy_from_slice(&packed[8..8 + ext_end]);
        len += ext_end;
    }
    (buf, len)
}

/// VFAT checksum of an 11-byte short name: rotate-right-by-one then add,
/// in 8-bit arithmetic (wraps silently).
pub fn short_name_checksum(short: &[u8; 11]) -> u8 {
    let mut sum = 0u8;
    for &b in short {
        sum = ((sum & 1) << 7).wrapping_add(sum >> 1).wrapping_add(b);
    }
    sum
}

// ─── Long-name encoding ────────────────────────────────────────────────────────

/// An encoded long-name block, in physical write order: first the
/// highest-ordinal entry (0x40-flagged), down to ordinal 1, which sits
/// immediately before the short entry it describes.
pub struct LongName {
    entries: [LfnEntry; MAX_LFN_ENTRIES],
    count: usize,
}

impl LongName {
    pub fn entries(&self) -> &[LfnEntry] {
        &self.entries[..self.count]
    }
}

/// Encode `name` as a chain of long-name entries carrying `checksum` of
/// the associated short alias.
///
/// The entry count is sized in 26-unit chunks while each physical entry
/// stores 13 units; components past the stored capacity are dropped.
/// Names of up to 13 units round-trip exactly through reference drivers.
pub fn encode_long_name(name: &str, checksum: u8) -> Result<LongName, FsError> {
    let mut units = [0u16; MAX_NAME_UNITS];
    let mut len = 0usize;
    for ch in name.chars() {
        let mut pair = [0u16; 2];
        for &u in ch.encode_utf16(&mut pair).iter() {
            if len >= MAX_NAME_UNITS {
                return Err(FsError::UnsupportedLayout);
            }
            units[len] = u;
            len += 1;
        }
    }
    if len == 0 {
        return Err(FsError::UnsupportedLayout);
    }

    let count = len.div_ceil(UNITS_PER_CHUNK);
    let capacity = count * LFN_UNITS_PER_ENTRY;
    let stored = len.min(capacity);
    // One 0x0000 terminator right after the name, 0xFFFF for the rest of
    // the final entry's slots.
    let mut padded = [0xFFFFu16; MAX_LFN_ENTRIES * LFN_UNITS_PER_ENTRY];
    padded[..stored].copy_from_slice(&units[..stored]);
    if stored < capacity {
        padded[stored] = 0x0000;
    }

    let mut out = LongName {
        entries: [LfnEntry { sequence: 0, checksum: 0, units: [0; LFN_UNITS_PER_ENTRY] };
            MAX_LFN_ENTRIES],
        count,
    };
    for i in 0..count {
        let ordinal = (count - i) as u8;
        let first = (ordinal as usize) == count;
        let start = (ordinal as usize - 1) * LFN_UNITS_PER_ENTRY;
        let mut entry_units = [0u16; LFN_UNITS_PER_ENTRY];
        entry_units.copy_from_slice(&padded[start..start + LFN_UNITS_PER_ENTRY]);
        out.entries[i] = LfnEntry {
            sequence: ordinal | if first { LFN_FIRST_PHYSICAL } else { 0 },
            checksum,
            units: entry_units,
        };
    }
    Ok(out)
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
