//! SA3D (spatial audio) box
//!
//! Carries the ambisonic layout of an audio track: order, channel ordering,
//! normalization and an explicit channel map. Only periphonic ambisonics
//! with ACN ordering and SN3D normalization are defined.

use std::io::{Read, Write};

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::constants::BoxTag;
use crate::utils::io::{read_u32, read_u8};

/// Spatial audio box contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sa3dBox {
    pub version: u8,
    pub ambisonic_type: u8,
    pub ambisonic_order: u32,
    pub ambisonic_channel_ordering: u8,
    pub ambisonic_normalization: u8,
    pub num_channels: u32,
    pub channel_map: Vec<u32>,
}

impl Sa3dBox {
    /// Build an SA3D box for a periphonic ambisonic track.
    ///
    /// Type, ordering and normalization take the only values the box
    /// defines (periphonic, ACN, SN3D).
    pub fn create(num_channels: u32, ambisonic_order: u32, channel_map: &[u32]) -> Self {
        Sa3dBox {
            version: 0,
            ambisonic_type: 0,
            ambisonic_order,
            ambisonic_channel_ordering: 0,
            ambisonic_normalization: 0,
            num_channels,
            channel_map: channel_map.to_vec(),
        }
    }

    /// Content size in bytes for the current channel map.
    pub fn content_size(&self) -> u64 {
        // version + type + order + ordering + normalization + count
        12 + 4 * self.channel_map.len() as u64
    }

    /// Decode box content. The header has already been consumed; the
    /// declared `content_size` must match the channel count exactly.
    pub fn read_content<R: Read>(
        reader: &mut R,
        tag: BoxTag,
        position: u64,
        content_size: u64,
    ) -> SpatialResult<Self> {
        let version = read_u8(reader)?;
        let ambisonic_type = read_u8(reader)?;
        let ambisonic_order = read_u32(reader)?;
        let ambisonic_channel_ordering = read_u8(reader)?;
        let ambisonic_normalization = read_u8(reader)?;
        let num_channels = read_u32(reader)?;

        if 12 + 4 * u64::from(num_channels) != content_size {
            return Err(SpatialError::InvalidBoxSize {
                tag,
                size: content_size,
                position,
            });
        }

        let mut channel_map = Vec::with_capacity(num_channels as usize);
        for _ in 0..num_channels {
            channel_map.push(read_u32(reader)?);
        }

        Ok(Sa3dBox {
            version,
            ambisonic_type,
            ambisonic_order,
            ambisonic_channel_ordering,
            ambisonic_normalization,
            num_channels,
            channel_map,
        })
    }

    /// Serialize box content (everything after the header).
    pub fn write_content<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&[self.version, self.ambisonic_type])?;
        writer.write_all(&self.ambisonic_order.to_be_bytes())?;
        writer.write_all(&[
            self.ambisonic_channel_ordering,
            self.ambisonic_normalization,
        ])?;
        writer.write_all(&self.num_channels.to_be_bytes())?;
        for channel in &self.channel_map {
            writer.write_all(&channel.to_be_bytes())?;
        }
        Ok(())
    }

    pub fn ambisonic_type_name(&self) -> &'static str {
        match self.ambisonic_type {
            0 => "periphonic",
            _ => "unknown",
        }
    }

    pub fn ambisonic_channel_ordering_name(&self) -> &'static str {
        match self.ambisonic_channel_ordering {
            0 => "ACN",
            _ => "unknown",
        }
    }

    pub fn ambisonic_normalization_name(&self) -> &'static str {
        match self.ambisonic_normalization {
            0 => "SN3D",
            _ => "unknown",
        }
    }

    /// Print the box contents through the line sink.
    pub fn print_box(&self, console: &mut dyn Console) {
        console.log(&format!("\t\tAmbisonic Type: {}", self.ambisonic_type_name()));
        console.log(&format!("\t\tAmbisonic Order: {}", self.ambisonic_order));
        console.log(&format!(
            "\t\tAmbisonic Channel Ordering: {}",
            self.ambisonic_channel_ordering_name()
        ));
        console.log(&format!(
            "\t\tAmbisonic Normalization: {}",
            self.ambisonic_normalization_name()
        ));
        console.log(&format!("\t\tNumber of Channels: {}", self.num_channels));
        console.log(&format!("\t\tChannel Map: {:?}", self.channel_map));
    }

    /// Concise single-line audio metadata string.
    pub fn metadata_string(&self) -> String {
        format!(
            "{}, {}, {}, Order {}, {} Channel(s), Channel Map: {:?}",
            self.ambisonic_normalization_name(),
            self.ambisonic_channel_ordering_name(),
            self.ambisonic_type_name(),
            self.ambisonic_order,
            self.num_channels,
            self.channel_map
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpeg::constants::TAG_SA3D;
    use std::io::Cursor;

    #[test]
    fn test_content_round_trip() {
        let sa3d = Sa3dBox::create(4, 1, &[0, 1, 2, 3]);
        assert_eq!(sa3d.content_size(), 28);

        let mut bytes = Vec::new();
        sa3d.write_content(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 28);

        let decoded =
            Sa3dBox::read_content(&mut Cursor::new(bytes), TAG_SA3D, 0, 28).unwrap();
        assert_eq!(decoded, sa3d);
    }

    #[test]
    fn test_layout() {
        let sa3d = Sa3dBox::create(1, 0, &[0]);
        let mut bytes = Vec::new();
        sa3d.write_content(&mut bytes).unwrap();
        // version, type, order(4), ordering, normalization, count(4), map
        assert_eq!(
            bytes,
            [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0]
        );
    }

    #[test]
    fn test_count_size_mismatch_rejected() {
        let sa3d = Sa3dBox::create(4, 1, &[0, 1, 2, 3]);
        let mut bytes = Vec::new();
        sa3d.write_content(&mut bytes).unwrap();
        // Lie about the content size.
        let result = Sa3dBox::read_content(&mut Cursor::new(bytes), TAG_SA3D, 0, 24);
        assert!(matches!(result, Err(SpatialError::InvalidBoxSize { .. })));
    }

    #[test]
    fn test_metadata_string() {
        let sa3d = Sa3dBox::create(4, 1, &[0, 1, 2, 3]);
        let text = sa3d.metadata_string();
        assert!(text.contains("SN3D, ACN, periphonic"));
        assert!(text.contains("Order 1"));
        assert!(text.contains("4 Channel(s)"));
    }
}
