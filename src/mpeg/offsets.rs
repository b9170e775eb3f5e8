//! Chunk-offset table patching for `stco`/`co64`
//!
//! Chunk-offset tables hold absolute file positions of sample data. When
//! metadata insertion grows the boxes preceding the media payload, every
//! offset must move by the same constant delta. The table content is never
//! held in memory: save streams the header, then transforms one entry at a
//! time, so a file with millions of chunks costs a few bytes of state.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::Mp4Box;
use crate::utils::io::{read_u32, read_u64};

/// Entry width of a chunk-offset table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetWidth {
    /// `stco`: 32-bit offsets.
    U32,
    /// `co64`: 64-bit offsets.
    U64,
}

impl OffsetWidth {
    fn entry_size(self) -> u64 {
        match self {
            OffsetWidth::U32 => 4,
            OffsetWidth::U64 => 8,
        }
    }
}

/// Copy a chunk-offset table from `reader` to `writer`, adding `delta` to
/// every entry.
///
/// Reads the 4-byte version/flags word and the 4-byte entry count, writes
/// them unchanged, then rewrites each offset in its original width. The
/// entry count must account for the declared content size exactly, and a
/// patched `stco` offset must stay within `u32`.
pub fn patch_copy<R: Read + Seek, W: Write>(
    reader: &mut R,
    writer: &mut W,
    table: &Mp4Box,
    width: OffsetWidth,
    delta: i64,
) -> SpatialResult<()> {
    reader.seek(SeekFrom::Start(table.content_start()))?;

    let version_flags = read_u32(reader)?;
    let entries = read_u32(reader)?;

    if 8 + u64::from(entries) * width.entry_size() != table.content_size {
        return Err(SpatialError::OffsetTableTruncated {
            tag: table.tag,
            entries,
            content_size: table.content_size,
        });
    }

    writer.write_all(&version_flags.to_be_bytes())?;
    writer.write_all(&entries.to_be_bytes())?;

    for _ in 0..entries {
        match width {
            OffsetWidth::U32 => {
                let offset = read_u32(reader)?;
                let patched = apply_delta(u64::from(offset), delta)?;
                let patched = u32::try_from(patched).map_err(|_| SpatialError::OffsetOverflow {
                    offset: u64::from(offset),
                    delta,
                })?;
                writer.write_all(&patched.to_be_bytes())?;
            }
            OffsetWidth::U64 => {
                let offset = read_u64(reader)?;
                let patched = apply_delta(offset, delta)?;
                writer.write_all(&patched.to_be_bytes())?;
            }
        }
    }
    Ok(())
}

fn apply_delta(offset: u64, delta: i64) -> SpatialResult<u64> {
    let patched = if delta >= 0 {
        offset.checked_add(delta as u64)
    } else {
        offset.checked_sub(delta.unsigned_abs())
    };
    patched.ok_or(SpatialError::OffsetOverflow { offset, delta })
}
