//! Examining and injecting spatial media metadata
//!
//! The operations here walk the loaded box tree with optional-returning
//! helpers (a missing trak or stsd is an empty result, not an error; the
//! caller decides what absence means), mutate it, and hand it back for
//! saving. The path-level facade orders its checks so that a rejected
//! request never leaves a partially written destination: resource checks
//! before parsing, semantic checks before the destination file is created.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::{BoxKind, Mp4Box};
use crate::mpeg::constants::{
    self, TAG_HDLR, TAG_MDIA, TAG_MINF, TAG_SA3D, TAG_ST3D, TAG_STBL, TAG_STSD, TAG_SV3D,
    TAG_TRAK, TAG_UUID, TRAK_TYPE_SOUN, TRAK_TYPE_VIDE,
};
use crate::mpeg::esds;
use crate::mpeg::mpeg4::Mpeg4Container;
use crate::mpeg::st3d::St3dBox;
use crate::mpeg::sv3d::create_equirectangular_sv3d;
use crate::spherical::metadata::{Metadata, ParsedMetadata, Projection, SpatialAudioMetadata, StereoMode};
use crate::spherical::xml::{self, SPHERICAL_UUID_ID};
use crate::utils::io::read_tag;

/// File extensions this tool handles.
pub const MPEG_FILE_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// Build the `uuid` box carrying a spherical XML document.
fn spherical_uuid_box(xml_metadata: &str) -> Mp4Box {
    let mut contents = Vec::with_capacity(16 + xml_metadata.len());
    contents.extend_from_slice(&SPHERICAL_UUID_ID);
    contents.extend_from_slice(xml_metadata.as_bytes());
    Mp4Box::leaf_with_contents(TAG_UUID, contents)
}

fn st3d_box(mode: StereoMode) -> Mp4Box {
    Mp4Box {
        tag: TAG_ST3D,
        position: 0,
        header_size: 8,
        content_size: St3dBox::CONTENT_SIZE,
        kind: BoxKind::St3d(St3dBox::create(mode.as_u8())),
    }
}

fn sa3d_box(sa3d: crate::mpeg::sa3d::Sa3dBox) -> Mp4Box {
    let content_size = sa3d.content_size();
    Mp4Box {
        tag: TAG_SA3D,
        position: 0,
        header_size: 8,
        content_size,
        kind: BoxKind::Sa3d(sa3d),
    }
}

/// Handler type of a trak, read from its `mdia`/`hdlr` box.
fn trak_handler_type<R: Read + Seek>(
    reader: &mut R,
    trak: &Mp4Box,
) -> SpatialResult<Option<[u8; 4]>> {
    let Some(hdlr) = trak.descend(&[TAG_MDIA, TAG_HDLR]) else {
        return Ok(None);
    };
    reader.seek(SeekFrom::Start(hdlr.content_start() + 8))?;
    Ok(Some(read_tag(reader)?))
}

/// Positions of the moov children that are traks with the given handler.
fn trak_indices_with_handler<R: Read + Seek>(
    reader: &mut R,
    moov: &Mp4Box,
    handler: [u8; 4],
) -> SpatialResult<Vec<usize>> {
    let mut indices = Vec::new();
    for (i, element) in moov.children().unwrap_or(&[]).iter().enumerate() {
        if element.tag != TAG_TRAK {
            continue;
        }
        if trak_handler_type(reader, element)? == Some(handler) {
            indices.push(i);
        }
    }
    Ok(indices)
}

/// Add a spherical `uuid` box to every video trak, replacing any previous
/// one.
pub fn add_spherical_xml<R: Read + Seek>(
    mp4: &mut Mpeg4Container,
    reader: &mut R,
    xml_metadata: &str,
) -> SpatialResult<()> {
    let video_traks = trak_indices_with_handler(reader, mp4.moov(), TRAK_TYPE_VIDE)?;
    if let Some(children) = mp4.moov_mut().children_mut() {
        for i in video_traks {
            children[i].remove(TAG_UUID);
            children[i].add(spherical_uuid_box(xml_metadata))?;
        }
    }
    mp4.resize();
    Ok(())
}

/// Add spherical v2 boxes to the sample descriptions of the first video
/// trak: `st3d` when a stereo mode is requested, `sv3d` when a projection
/// is. Prior boxes of the same tag are replaced.
pub fn add_spherical_v2<R: Read + Seek>(
    mp4: &mut Mpeg4Container,
    reader: &mut R,
    stereo_mode: Option<StereoMode>,
    projection: Option<Projection>,
) -> SpatialResult<()> {
    if stereo_mode.is_none() && projection.is_none() {
        return Ok(());
    }
    let video_traks = trak_indices_with_handler(reader, mp4.moov(), TRAK_TYPE_VIDE)?;
    let Some(&first) = video_traks.first() else {
        return Ok(());
    };

    let trak = match mp4.moov_mut().children_mut() {
        Some(children) => &mut children[first],
        None => return Ok(()),
    };
    let Some(stsd) = trak.descend_mut(&[TAG_MDIA, TAG_MINF, TAG_STBL, TAG_STSD]) else {
        return Ok(());
    };
    if let Some(entries) = stsd.children_mut() {
        for entry in entries
            .iter_mut()
            .filter(|e| constants::is_video_sample_description(e.tag))
        {
            if let Some(mode) = stereo_mode {
                entry.remove(TAG_ST3D);
                entry.add(st3d_box(mode))?;
            }
            if let Some(projection) = projection {
                entry.remove(TAG_SV3D);
                match projection {
                    Projection::Equirectangular => entry.add(create_equirectangular_sv3d())?,
                }
            }
        }
    }
    mp4.resize();
    Ok(())
}

/// Add an `SA3D` box to the sound sample descriptions of the audio track.
///
/// Requires at most one audio track, and a channel count matching the
/// requested ambisonic layout; either violation aborts before anything is
/// written.
pub fn add_spatial_audio<R: Read + Seek>(
    mp4: &mut Mpeg4Container,
    reader: &mut R,
    audio: &SpatialAudioMetadata,
    console: &mut dyn Console,
) -> SpatialResult<()> {
    let audio_traks = trak_indices_with_handler(reader, mp4.moov(), TRAK_TYPE_SOUN)?;
    if audio_traks.len() > 1 {
        console.log(&format!(
            "Error: Expected 1 audio track. Found {}",
            audio_traks.len()
        ));
        return Err(SpatialError::MultipleAudioTracks(audio_traks.len()));
    }
    let Some(&index) = audio_traks.first() else {
        return Ok(());
    };

    let num_channels = {
        let trak = &mp4.moov().children().unwrap_or(&[])[index];
        let Some(stsd) = trak.descend(&[TAG_MDIA, TAG_MINF, TAG_STBL, TAG_STSD]) else {
            return Ok(());
        };
        esds::num_audio_channels(reader, stsd)?
    };

    let expected = audio.expected_num_channels();
    if num_channels != expected {
        let error = SpatialError::ChannelCountMismatch {
            found: num_channels,
            expected,
            ambisonic_type: audio.ambisonic_type.name(),
            order: audio.ambisonic_order,
        };
        console.log(&format!("Error: {}", error));
        return Err(error);
    }
    if audio.channel_map.len() as u32 != num_channels {
        return Err(SpatialError::InvalidChannelMap {
            found: audio.channel_map.len(),
            expected: num_channels,
        });
    }

    let trak = match mp4.moov_mut().children_mut() {
        Some(children) => &mut children[index],
        None => return Ok(()),
    };
    if let Some(stsd) = trak.descend_mut(&[TAG_MDIA, TAG_MINF, TAG_STBL, TAG_STSD]) {
        if let Some(entries) = stsd.children_mut() {
            for entry in entries
                .iter_mut()
                .filter(|e| constants::is_sound_sample_description(e.tag))
            {
                entry.remove(TAG_SA3D);
                entry.add(sa3d_box(audio.create_sa3d(num_channels)))?;
            }
        }
    }
    mp4.resize();
    Ok(())
}

/// Read a `uuid` box's spherical XML payload, if its first 16 bytes carry
/// the spherical identifier.
fn read_spherical_uuid<R: Read + Seek>(
    reader: &mut R,
    uuid_box: &Mp4Box,
) -> SpatialResult<Option<String>> {
    if uuid_box.content_size < 16 {
        return Ok(None);
    }
    let contents = match &uuid_box.kind {
        BoxKind::Leaf {
            contents: Some(contents),
        } => contents.clone(),
        _ => {
            reader.seek(SeekFrom::Start(uuid_box.content_start()))?;
            let mut buf = vec![0u8; uuid_box.content_size as usize];
            reader.read_exact(&mut buf)?;
            buf
        }
    };
    if contents[..16] != SPHERICAL_UUID_ID {
        return Ok(None);
    }
    Ok(Some(String::from_utf8(contents[16..].to_vec())?))
}

/// Report the spherical and spatial audio metadata of a loaded file.
pub fn parse_spherical_mpeg4<R: Read + Seek>(
    mp4: &Mpeg4Container,
    reader: &mut R,
    console: &mut dyn Console,
) -> SpatialResult<ParsedMetadata> {
    let mut metadata = ParsedMetadata::default();
    let mut track_num = 0;

    for element in mp4.moov().children().unwrap_or(&[]) {
        if element.tag != TAG_TRAK {
            continue;
        }
        let track_name = format!("Track {}", track_num);
        console.log(&format!("\t{}", track_name));
        track_num += 1;

        for sub_element in element.children().unwrap_or(&[]) {
            if sub_element.tag != TAG_UUID {
                continue;
            }
            if let Some(xml_string) = read_spherical_uuid(reader, sub_element)? {
                let tags = xml::parse_spherical_xml(&xml_string, console)?;
                metadata.video.insert(track_name.clone(), tags);
            }
        }

        let Some(stsd) = element.descend(&[TAG_MDIA, TAG_MINF, TAG_STBL, TAG_STSD]) else {
            continue;
        };
        for entry in stsd.children().unwrap_or(&[]) {
            if constants::is_video_sample_description(entry.tag) {
                print_spherical_v2(entry, console);
                continue;
            }
            if !constants::is_sound_sample_description(entry.tag) {
                continue;
            }
            match esds::num_audio_channels(reader, stsd) {
                Ok(channels) => metadata.num_audio_channels = channels,
                Err(error) => console.log(&format!("Error: {}", error)),
            }
            if let Some(sa3d_child) = entry.find_child(TAG_SA3D) {
                if let BoxKind::Sa3d(sa3d) = &sa3d_child.kind {
                    sa3d.print_box(console);
                    metadata.audio = Some(sa3d.clone());
                }
            }
        }
    }
    Ok(metadata)
}

/// Report the v2 boxes of a video sample description through the sink.
fn print_spherical_v2(entry: &Mp4Box, console: &mut dyn Console) {
    if let Some(st3d_child) = entry.find_child(TAG_ST3D) {
        if let BoxKind::St3d(st3d) = &st3d_child.kind {
            st3d.print_box(console);
        }
    }
    if let Some(sv3d) = entry.find_child(TAG_SV3D) {
        for sub_element in sv3d.children().unwrap_or(&[]) {
            match &sub_element.kind {
                BoxKind::Prhd(prhd) => prhd.print_box(console),
                BoxKind::Equi(equi) => equi.print_box(console),
                _ => {}
            }
        }
    }
}

fn check_extension(path: &Path, console: &mut dyn Console) -> SpatialResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if MPEG_FILE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(())
    } else {
        console.log("Unknown file type");
        Err(SpatialError::UnknownFileType(extension))
    }
}

fn report<T>(result: SpatialResult<T>, console: &mut dyn Console) -> SpatialResult<T> {
    if let Err(error) = &result {
        console.log(&format!("Error: {}", error));
    }
    result
}

/// Examine a file's spatial media metadata.
///
/// Diagnostics and the per-track metadata report flow through `console`;
/// the returned [`ParsedMetadata`] carries the structured results.
pub fn parse_metadata<P: AsRef<Path>>(
    path: P,
    console: &mut dyn Console,
) -> SpatialResult<ParsedMetadata> {
    let path = path.as_ref();
    check_extension(path, console)?;
    console.log(&format!("Processing: {}", path.display()));

    let file = report(File::open(path).map_err(SpatialError::Io), console)?;
    let mut reader = BufReader::new(file);
    let mp4 = report(Mpeg4Container::load(&mut reader), console)?;
    console.log("Loaded file...");
    parse_spherical_mpeg4(&mp4, &mut reader, console)
}

/// Inject spatial media metadata, writing a new file.
///
/// The source is never modified. Every mutation is validated before the
/// destination is created, so a rejected request leaves no output behind.
pub fn inject_metadata<P: AsRef<Path>, Q: AsRef<Path>>(
    src: P,
    dest: Q,
    metadata: &Metadata,
    console: &mut dyn Console,
) -> SpatialResult<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();

    let same = match (src.canonicalize(), dest.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => src == dest,
    };
    if same {
        return report(Err(SpatialError::SamePath), console);
    }
    check_extension(src, console)?;
    console.log(&format!("Processing: {}", src.display()));

    let file = report(File::open(src).map_err(SpatialError::Io), console)?;
    let mut reader = BufReader::new(file);
    let mut mp4 = report(Mpeg4Container::load(&mut reader), console)?;

    if let Some(xml_metadata) = &metadata.video {
        report(
            add_spherical_xml(&mut mp4, &mut reader, xml_metadata),
            console,
        )?;
    }
    report(
        add_spherical_v2(&mut mp4, &mut reader, metadata.stereo_mode, metadata.projection),
        console,
    )?;
    if let Some(audio) = &metadata.audio {
        add_spatial_audio(&mut mp4, &mut reader, audio, console)?;
    }

    console.log("Saved file settings");
    parse_spherical_mpeg4(&mp4, &mut reader, console)?;

    let out = report(File::create(dest).map_err(SpatialError::Io), console)?;
    let mut writer = BufWriter::new(out);
    report(mp4.save(&mut reader, &mut writer), console)?;
    writer.flush()?;
    Ok(())
}
