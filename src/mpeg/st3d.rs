//! st3d (stereoscopic mode) box
//!
//! Five bytes of content: a version/flags word and a stereo mode.

use std::io::{Read, Write};

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::constants::BoxTag;
use crate::utils::io::{read_u32, read_u8};

/// Stereoscopic mode box contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct St3dBox {
    pub version: u32,
    /// 0 = mono, 1 = top-bottom, 2 = left-right.
    pub stereo_mode: u8,
}

impl St3dBox {
    /// version/flags word + stereo mode byte.
    pub const CONTENT_SIZE: u64 = 5;

    pub fn create(stereo_mode: u8) -> Self {
        St3dBox {
            version: 0,
            stereo_mode,
        }
    }

    pub fn read_content<R: Read>(
        reader: &mut R,
        tag: BoxTag,
        position: u64,
        content_size: u64,
    ) -> SpatialResult<Self> {
        if content_size != Self::CONTENT_SIZE {
            return Err(SpatialError::InvalidBoxSize {
                tag,
                size: content_size,
                position,
            });
        }
        let version = read_u32(reader)?;
        let stereo_mode = read_u8(reader)?;
        Ok(St3dBox {
            version,
            stereo_mode,
        })
    }

    pub fn write_content<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&self.version.to_be_bytes())?;
        writer.write_all(&[self.stereo_mode])
    }

    pub fn stereo_mode_name(&self) -> &'static str {
        match self.stereo_mode {
            0 => "mono",
            1 => "top-bottom",
            2 => "left-right",
            _ => "unknown",
        }
    }

    pub fn print_box(&self, console: &mut dyn Console) {
        console.log(&format!("\t\tStereo Mode: {}", self.stereo_mode_name()));
    }

    pub fn metadata_string(&self) -> String {
        format!("Stereo mode: {}", self.stereo_mode_name())
    }
}
