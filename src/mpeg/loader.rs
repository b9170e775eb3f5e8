//! Box registry and recursive-descent loader
//!
//! A single pass over the byte stream builds the whole tree, or fails with
//! a structural error; there is no partial result and no backtracking. The
//! registry is a pure function of the static tag tables plus one piece of
//! context: sample-description entries inside `stsd` carry a
//! version-dependent fixed prefix before their children, which is stored as
//! container padding and never modeled as a child box.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::{BoxKind, Mp4Box};
use crate::mpeg::constants::{self, BoxTag, TAG_CO64, TAG_EQUI, TAG_PRHD, TAG_SA3D, TAG_ST3D, TAG_STCO, TAG_STSD};
use crate::mpeg::offsets::OffsetWidth;
use crate::mpeg::sa3d::Sa3dBox;
use crate::mpeg::st3d::St3dBox;
use crate::mpeg::sv3d::{EquiBox, PrhdBox};
use crate::utils::io::{read_i16, read_tag, read_u32, read_u64};

/// Load the box at `position`, bounded by the enclosing `end`.
pub fn load<R: Read + Seek>(reader: &mut R, position: u64, end: u64) -> SpatialResult<Mp4Box> {
    reader.seek(SeekFrom::Start(position))?;

    let mut header_size = 8u64;
    let mut size = u64::from(read_u32(reader)?);
    let tag = BoxTag(read_tag(reader)?);

    if size == 1 {
        size = read_u64(reader)?;
        header_size = 16;
    }

    if size < header_size {
        return Err(SpatialError::InvalidBoxSize {
            tag,
            size,
            position,
        });
    }
    let declared_end = position.checked_add(size).unwrap_or(u64::MAX);
    if declared_end > end {
        return Err(SpatialError::BoxOutOfBounds {
            tag,
            position,
            declared_end,
            bound: end,
        });
    }

    let content_size = size - header_size;
    let content_start = position + header_size;
    let box_end = position + size;

    let kind = if tag == TAG_STCO {
        BoxKind::ChunkOffsets {
            width: OffsetWidth::U32,
        }
    } else if tag == TAG_CO64 {
        BoxKind::ChunkOffsets {
            width: OffsetWidth::U64,
        }
    } else if tag == TAG_SA3D {
        BoxKind::Sa3d(Sa3dBox::read_content(reader, tag, position, content_size)?)
    } else if tag == TAG_ST3D {
        BoxKind::St3d(St3dBox::read_content(reader, tag, position, content_size)?)
    } else if tag == TAG_PRHD {
        BoxKind::Prhd(PrhdBox::read_content(reader, tag, position, content_size)?)
    } else if tag == TAG_EQUI {
        BoxKind::Equi(EquiBox::read_content(reader, tag, position, content_size)?)
    } else if tag == TAG_STSD {
        // version/flags + entry count precede the sample descriptions
        let padding = 8u64;
        load_padded_container(reader, tag, position, content_start, box_end, padding, content_size)?
    } else if constants::is_sound_sample_description(tag) {
        let padding = sound_sample_padding(reader, tag, position, content_start)?;
        load_padded_container(reader, tag, position, content_start, box_end, padding, content_size)?
    } else if constants::is_video_sample_description(tag) {
        let padding = video_sample_padding(reader, tag, position, content_start)?;
        load_padded_container(reader, tag, position, content_start, box_end, padding, content_size)?
    } else if constants::is_container(tag) {
        let children = load_children(reader, content_start, box_end)?;
        BoxKind::Container {
            padding: 0,
            children,
        }
    } else {
        BoxKind::Leaf { contents: None }
    };

    Ok(Mp4Box {
        tag,
        position,
        header_size,
        content_size,
        kind,
    })
}

/// Load consecutive boxes from `position` up to `end`.
pub fn load_children<R: Read + Seek>(
    reader: &mut R,
    position: u64,
    end: u64,
) -> SpatialResult<Vec<Mp4Box>> {
    let mut loaded = Vec::new();
    let mut position = position;
    while position < end {
        let new_box = load(reader, position, end)?;
        position = new_box.position + new_box.size();
        loaded.push(new_box);
    }
    Ok(loaded)
}

fn load_padded_container<R: Read + Seek>(
    reader: &mut R,
    tag: BoxTag,
    position: u64,
    content_start: u64,
    box_end: u64,
    padding: u64,
    content_size: u64,
) -> SpatialResult<BoxKind> {
    if padding > content_size {
        return Err(SpatialError::InvalidBoxSize {
            tag,
            size: content_size,
            position,
        });
    }
    let children = load_children(reader, content_start + padding, box_end)?;
    Ok(BoxKind::Container { padding, children })
}

/// Fixed prefix length of a sound sample description, decided by the
/// version field two bytes into the entry (after the 6 reserved bytes and
/// the data-reference index).
fn sound_sample_padding<R: Read + Seek>(
    reader: &mut R,
    tag: BoxTag,
    position: u64,
    content_start: u64,
) -> SpatialResult<u64> {
    let version = peek_sample_version(reader, content_start)?;
    match version {
        0 => Ok(28),
        1 => Ok(44),
        2 => Ok(64),
        _ => Err(SpatialError::UnsupportedSampleVersion {
            tag,
            version,
            position,
        }),
    }
}

/// Fixed prefix length of a video sample description. Only version 0 is
/// defined.
fn video_sample_padding<R: Read + Seek>(
    reader: &mut R,
    tag: BoxTag,
    position: u64,
    content_start: u64,
) -> SpatialResult<u64> {
    let version = peek_sample_version(reader, content_start)?;
    match version {
        0 => Ok(78),
        _ => Err(SpatialError::UnsupportedSampleVersion {
            tag,
            version,
            position,
        }),
    }
}

fn peek_sample_version<R: Read + Seek>(
    reader: &mut R,
    content_start: u64,
) -> std::io::Result<i16> {
    reader.seek(SeekFrom::Start(content_start + 8))?;
    read_i16(reader)
}
