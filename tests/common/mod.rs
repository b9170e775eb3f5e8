//! Synthetic MP4 fixtures built from raw bytes.
//!
//! Small but structurally complete files: ftyp, a moov with real trak /
//! mdia / hdlr / minf / stbl / stsd chains (including the version-dependent
//! sample-description prefixes and an esds descriptor chain for AAC), a
//! chunk-offset table pointing into the mdat payload, and the payload
//! itself.

#![allow(dead_code)]

pub const MDAT_PAYLOAD: [u8; 32] = [0xA5; 32];

pub fn raw_box(tag: &[u8; 4], content: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&((content.len() + 8) as u32).to_be_bytes());
    data.extend_from_slice(tag);
    data.extend_from_slice(content);
    data
}

pub fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&[0u8; 8]); // version/flags, pre_defined
    content.extend_from_slice(handler);
    content.extend_from_slice(&[0u8; 12]); // reserved
    content.push(0); // empty name
    raw_box(b"hdlr", &content)
}

/// An esds box whose AudioSpecificConfig declares the given channel count.
pub fn esds_box(channels: u8) -> Vec<u8> {
    let config: u16 = (2 << 11) | (4 << 7) | (u16::from(channels) << 3);
    let mut content = vec![0, 0, 0, 0]; // version and flags
    content.push(3); // elementary stream descriptor
    content.push(22);
    content.extend_from_slice(&[0, 0, 0]); // ES_ID, stream priority
    content.push(4); // decoder config descriptor
    content.push(17);
    content.push(0x40); // object type: MPEG-4 audio
    content.extend_from_slice(&[0; 12]); // stream type, buffer size, bitrates
    content.push(5); // decoder specific info
    content.push(2);
    content.extend_from_slice(&config.to_be_bytes());
    raw_box(b"esds", &content)
}

/// A version 0 mp4a sample description wrapping an esds descriptor.
pub fn mp4a_entry(channels: u8) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&[0u8; 6]); // reserved
    content.extend_from_slice(&1u16.to_be_bytes()); // data reference index
    content.extend_from_slice(&0u16.to_be_bytes()); // version
    content.extend_from_slice(&0u16.to_be_bytes()); // revision
    content.extend_from_slice(&0u32.to_be_bytes()); // vendor
    content.extend_from_slice(&u16::from(channels).to_be_bytes());
    content.extend_from_slice(&16u16.to_be_bytes()); // sample size
    content.extend_from_slice(&0u16.to_be_bytes()); // compression id
    content.extend_from_slice(&0u16.to_be_bytes()); // packet size
    content.extend_from_slice(&(44100u32 << 16).to_be_bytes()); // sample rate
    assert_eq!(content.len(), 28);
    content.extend_from_slice(&esds_box(channels));
    raw_box(b"mp4a", &content)
}

/// A version 0 avc1 sample description with its 78-byte fixed prefix.
pub fn avc1_entry() -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&[0u8; 6]); // reserved
    content.extend_from_slice(&1u16.to_be_bytes()); // data reference index
    content.extend_from_slice(&0u16.to_be_bytes()); // version
    content.extend_from_slice(&0u16.to_be_bytes()); // revision
    content.extend_from_slice(&0u32.to_be_bytes()); // vendor
    content.extend_from_slice(&[0u8; 8]); // temporal/spatial quality
    content.extend_from_slice(&1920u16.to_be_bytes()); // width
    content.extend_from_slice(&1080u16.to_be_bytes()); // height
    content.extend_from_slice(&[0u8; 50]); // resolution .. depth, pre_defined
    assert_eq!(content.len(), 78);
    raw_box(b"avc1", &content)
}

pub fn stsd(entry: &[u8]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&0u32.to_be_bytes()); // version and flags
    content.extend_from_slice(&1u32.to_be_bytes()); // entry count
    content.extend_from_slice(entry);
    raw_box(b"stsd", &content)
}

pub fn stco(offsets: &[u32]) -> Vec<u8> {
    let mut content = Vec::new();
    content.extend_from_slice(&0u32.to_be_bytes()); // version and flags
    content.extend_from_slice(&(offsets.len() as u32).to_be_bytes());
    for offset in offsets {
        content.extend_from_slice(&offset.to_be_bytes());
    }
    raw_box(b"stco", &content)
}

pub fn trak(handler: &[u8; 4], sample_entry: &[u8], chunk_offsets: &[u32]) -> Vec<u8> {
    let mut stbl_content = stsd(sample_entry);
    stbl_content.extend_from_slice(&stco(chunk_offsets));
    let stbl = raw_box(b"stbl", &stbl_content);
    let minf = raw_box(b"minf", &stbl);
    let mut mdia_content = hdlr(handler);
    mdia_content.extend_from_slice(&minf);
    let mdia = raw_box(b"mdia", &mdia_content);
    raw_box(b"trak", &mdia)
}

fn assemble(audio_channels: Option<u8>, mdat_content_start: u32) -> Vec<u8> {
    let mut moov_content = trak(b"vide", &avc1_entry(), &[mdat_content_start]);
    if let Some(channels) = audio_channels {
        moov_content.extend_from_slice(&trak(
            b"soun",
            &mp4a_entry(channels),
            &[mdat_content_start + 8],
        ));
    }
    let moov = raw_box(b"moov", &moov_content);

    let mut file = raw_box(b"ftyp", b"isomiso2");
    file.extend_from_slice(&moov);
    file.extend_from_slice(&raw_box(b"mdat", &MDAT_PAYLOAD));
    file
}

fn build(audio_channels: Option<u8>) -> Vec<u8> {
    // Assemble once to learn where the mdat payload lands, then again with
    // chunk offsets pointing at it.
    let probe = assemble(audio_channels, 0);
    let mdat_content_start = (probe.len() - MDAT_PAYLOAD.len()) as u32;
    assemble(audio_channels, mdat_content_start)
}

/// ftyp + moov (one video trak) + mdat.
pub fn video_file() -> Vec<u8> {
    build(None)
}

/// ftyp + moov (one video trak, one AAC audio trak) + mdat.
pub fn av_file(audio_channels: u8) -> Vec<u8> {
    build(Some(audio_channels))
}

/// ftyp + moov (one video trak, two AAC audio traks) + mdat.
pub fn two_audio_tracks_file(audio_channels: u8) -> Vec<u8> {
    let assemble_two = |mdat_content_start: u32| -> Vec<u8> {
        let mut moov_content = trak(b"vide", &avc1_entry(), &[mdat_content_start]);
        for _ in 0..2 {
            moov_content.extend_from_slice(&trak(
                b"soun",
                &mp4a_entry(audio_channels),
                &[mdat_content_start + 8],
            ));
        }
        let moov = raw_box(b"moov", &moov_content);
        let mut file = raw_box(b"ftyp", b"isomiso2");
        file.extend_from_slice(&moov);
        file.extend_from_slice(&raw_box(b"mdat", &MDAT_PAYLOAD));
        file
    };
    let probe = assemble_two(0);
    let mdat_content_start = (probe.len() - MDAT_PAYLOAD.len()) as u32;
    assemble_two(mdat_content_start)
}
