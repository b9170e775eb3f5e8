//! Elementary stream descriptor reading
//!
//! An `esds` box holds a nested tag-length-value descriptor chain:
//! elementary-stream (3) wrapping decoder-config (4) wrapping
//! decoder-specific-info (5), whose first 16 bits are the
//! AudioSpecificConfig. That bitfield is the only reliable place to read an
//! AAC track's channel count. For `.mov`-wrapped AAC the chain sits one
//! level deeper, inside a `wave` box.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::Mp4Box;
use crate::mpeg::constants::{self, TAG_ESDS, TAG_MP4A, TAG_WAVE};
use crate::utils::io::{read_i16, read_i32, read_u16, read_u8};

/// Decoded 16-bit AudioSpecificConfig bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpecificConfig {
    pub object_type: u8,
    pub sampling_frequency_index: u8,
    pub channel_configuration: u8,
}

/// Read a descriptor length encoded as up to 4 bytes of 7-bit big-endian
/// chunks, continuation signalled by the top bit.
pub fn read_descriptor_length<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut length = 0u32;
    for _ in 0..4 {
        let byte = read_u8(reader)?;
        length = (length << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            break;
        }
    }
    Ok(length)
}

/// Decode the AudioSpecificConfig from an `esds` box.
///
/// The reader is positioned past the version/flags word; the 3 -> 4 -> 5
/// descriptor chain is verified tag by tag. A sampling-frequency index of 0
/// means the actual rate lives in an extension this tool does not read.
pub fn read_audio_specific_config<R: Read + Seek>(
    reader: &mut R,
    esds: &Mp4Box,
) -> SpatialResult<AudioSpecificConfig> {
    reader.seek(SeekFrom::Start(esds.content_start() + 4))?;

    let tag = read_u8(reader)?;
    if tag != 3 {
        return Err(SpatialError::InvalidDescriptor {
            expected: 3,
            found: tag,
        });
    }
    read_descriptor_length(reader)?;
    reader.seek(SeekFrom::Current(3))?; // ES_ID and stream priority flags

    let tag = read_u8(reader)?;
    if tag != 4 {
        return Err(SpatialError::InvalidDescriptor {
            expected: 4,
            found: tag,
        });
    }
    read_descriptor_length(reader)?;
    reader.seek(SeekFrom::Current(13))?; // object/stream type, buffer size, bitrates

    let tag = read_u8(reader)?;
    if tag != 5 {
        return Err(SpatialError::InvalidDescriptor {
            expected: 5,
            found: tag,
        });
    }
    let length = read_descriptor_length(reader)?;
    if length < 2 {
        return Err(SpatialError::DescriptorTooShort(length));
    }

    let config = read_u16(reader)?;
    let decoded = AudioSpecificConfig {
        object_type: ((config & 0xF800) >> 11) as u8,
        sampling_frequency_index: ((config & 0x0780) >> 7) as u8,
        channel_configuration: ((config & 0x0078) >> 3) as u8,
    };
    if decoded.sampling_frequency_index == 0 {
        return Err(SpatialError::UnsupportedSampleRate);
    }
    Ok(decoded)
}

/// Channel count of an AAC sample description (`mp4a`, or a `wave` wrapper
/// around it), via its `esds` descriptor chain.
pub fn aac_num_channels<R: Read + Seek>(
    reader: &mut R,
    sample_description: &Mp4Box,
) -> SpatialResult<u32> {
    let children = sample_description
        .children()
        .ok_or(SpatialError::MissingEsds(sample_description.tag))?;

    for element in children {
        if element.tag == TAG_WAVE {
            // .mov with AAC audio: stsd -> mp4a -> wave -> esds
            return aac_num_channels(reader, element);
        }
        if element.tag == TAG_ESDS {
            let config = read_audio_specific_config(reader, element)?;
            return Ok(u32::from(config.channel_configuration));
        }
    }
    Err(SpatialError::MissingEsds(sample_description.tag))
}

/// Channel count from the fixed prefix of a non-AAC sound sample
/// description (versions 0, 1 and 2).
pub fn sample_description_num_channels<R: Read + Seek>(
    reader: &mut R,
    sample_description: &Mp4Box,
) -> SpatialResult<u32> {
    reader.seek(SeekFrom::Start(sample_description.content_start() + 8))?;

    let version = read_i16(reader)?;
    let _revision = read_i16(reader)?;
    let _vendor = read_i32(reader)?;
    match version {
        0 | 1 => Ok(u32::from(read_u16(reader)?)),
        2 => {
            // sizeof fields, flags, struct size and sample rate precede the
            // 32-bit channel count
            reader.seek(SeekFrom::Current(2 + 2 + 2 + 2 + 4 + 4 + 8))?;
            Ok(read_i32(reader)? as u32)
        }
        _ => Err(SpatialError::UnsupportedSampleVersion {
            tag: sample_description.tag,
            version,
            position: sample_description.position,
        }),
    }
}

/// Channel count of the first sound sample description under `stsd`.
pub fn num_audio_channels<R: Read + Seek>(
    reader: &mut R,
    stsd: &Mp4Box,
) -> SpatialResult<u32> {
    let children = stsd
        .children()
        .ok_or(SpatialError::NoSoundSampleDescription)?;

    for sample_description in children {
        if sample_description.tag == TAG_MP4A {
            return aac_num_channels(reader, sample_description);
        }
        if constants::is_sound_sample_description(sample_description.tag) {
            return sample_description_num_channels(reader, sample_description);
        }
    }
    Err(SpatialError::NoSoundSampleDescription)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpeg::loader;
    use std::io::Cursor;

    fn raw_box(tag: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&((content.len() + 8) as u32).to_be_bytes());
        data.extend_from_slice(tag);
        data.extend_from_slice(content);
        data
    }

    pub fn esds_content(channels: u8) -> Vec<u8> {
        let config: u16 = (2 << 11) | (4 << 7) | (u16::from(channels) << 3);
        let mut data = vec![0, 0, 0, 0]; // version and flags
        data.push(3); // elementary stream descriptor
        data.push(22);
        data.extend_from_slice(&[0, 0, 0]); // ES_ID, stream priority
        data.push(4); // decoder config descriptor
        data.push(17);
        data.push(0x40); // object type: MPEG-4 audio
        data.extend_from_slice(&[0; 12]); // stream type, buffer size, bitrates
        data.push(5); // decoder specific info
        data.push(2);
        data.extend_from_slice(&config.to_be_bytes());
        data
    }

    fn mp4a_entry(channels: u8) -> Vec<u8> {
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&[0u8; 6]);
        prefix.extend_from_slice(&1u16.to_be_bytes());
        prefix.extend_from_slice(&[0u8; 20]); // version 0 prefix remainder
        prefix.extend_from_slice(&raw_box(b"esds", &esds_content(channels)));
        raw_box(b"mp4a", &prefix)
    }

    #[test]
    fn test_descriptor_length_single_byte() {
        let mut reader = Cursor::new([0x16]);
        assert_eq!(read_descriptor_length(&mut reader).unwrap(), 22);
    }

    #[test]
    fn test_descriptor_length_continuation() {
        let mut reader = Cursor::new([0x81, 0x10]);
        assert_eq!(read_descriptor_length(&mut reader).unwrap(), 0x90);
        let mut reader = Cursor::new([0x80, 0x80, 0x80, 0x02]);
        assert_eq!(read_descriptor_length(&mut reader).unwrap(), 2);
    }

    #[test]
    fn test_aac_num_channels() {
        let data = mp4a_entry(4);
        let end = data.len() as u64;
        let entry = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        let channels = aac_num_channels(&mut Cursor::new(data), &entry).unwrap();
        assert_eq!(channels, 4);
    }

    #[test]
    fn test_aac_via_wave() {
        // .mov shape: mp4a -> wave -> esds
        let wave = raw_box(b"wave", &raw_box(b"esds", &esds_content(2)));
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&[0u8; 6]);
        prefix.extend_from_slice(&1u16.to_be_bytes());
        prefix.extend_from_slice(&[0u8; 20]);
        prefix.extend_from_slice(&wave);
        let data = raw_box(b"mp4a", &prefix);
        let end = data.len() as u64;
        let entry = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        assert_eq!(aac_num_channels(&mut Cursor::new(data), &entry).unwrap(), 2);
    }

    #[test]
    fn test_bad_descriptor_tag() {
        let mut content = esds_content(2);
        content[4] = 7; // corrupt the elementary stream tag
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&[0u8; 6]);
        prefix.extend_from_slice(&1u16.to_be_bytes());
        prefix.extend_from_slice(&[0u8; 20]);
        prefix.extend_from_slice(&raw_box(b"esds", &content));
        let data = raw_box(b"mp4a", &prefix);
        let end = data.len() as u64;
        let entry = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        let result = aac_num_channels(&mut Cursor::new(data), &entry);
        assert!(matches!(
            result,
            Err(SpatialError::InvalidDescriptor {
                expected: 3,
                found: 7
            })
        ));
    }

    #[test]
    fn test_extended_sample_rate_rejected() {
        // Frequency index 0 means "rate stored elsewhere".
        let config: u16 = 2 << 11 | 2 << 3;
        let mut content = esds_content(2);
        let len = content.len();
        content[len - 2..].copy_from_slice(&config.to_be_bytes());
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&[0u8; 6]);
        prefix.extend_from_slice(&1u16.to_be_bytes());
        prefix.extend_from_slice(&[0u8; 20]);
        prefix.extend_from_slice(&raw_box(b"esds", &content));
        let data = raw_box(b"mp4a", &prefix);
        let end = data.len() as u64;
        let entry = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        let result = aac_num_channels(&mut Cursor::new(data), &entry);
        assert!(matches!(result, Err(SpatialError::UnsupportedSampleRate)));
    }

    #[test]
    fn test_pcm_entry_channels() {
        // twos, version 0, 2 channels in the fixed prefix.
        let mut prefix = Vec::new();
        prefix.extend_from_slice(&[0u8; 6]);
        prefix.extend_from_slice(&1u16.to_be_bytes());
        prefix.extend_from_slice(&0u16.to_be_bytes()); // version
        prefix.extend_from_slice(&0u16.to_be_bytes()); // revision
        prefix.extend_from_slice(&0u32.to_be_bytes()); // vendor
        prefix.extend_from_slice(&2u16.to_be_bytes()); // channels
        prefix.extend_from_slice(&[0u8; 10]); // sample size .. sample rate
        let data = raw_box(b"twos", &prefix);
        let end = data.len() as u64;
        let entry = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        let channels = sample_description_num_channels(&mut Cursor::new(data), &entry).unwrap();
        assert_eq!(channels, 2);
    }

    #[test]
    fn test_num_audio_channels_from_stsd() {
        let mut stsd_content = Vec::new();
        stsd_content.extend_from_slice(&0u32.to_be_bytes());
        stsd_content.extend_from_slice(&1u32.to_be_bytes());
        stsd_content.extend_from_slice(&mp4a_entry(4));
        let data = raw_box(b"stsd", &stsd_content);
        let end = data.len() as u64;
        let stsd = loader::load(&mut Cursor::new(data.clone()), 0, end).unwrap();
        assert_eq!(num_audio_channels(&mut Cursor::new(data), &stsd).unwrap(), 4);
    }
}
