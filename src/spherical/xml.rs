//! Legacy spherical metadata: XML in a `uuid` box
//!
//! The v1 spherical metadata is an RDF/XML document stored in a `uuid` box
//! whose content begins with a fixed 16-byte identifier. The tag vocabulary
//! is closed; anything else is reported as unknown and dropped.

use std::collections::BTreeMap;

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::console::Console;
use crate::error::SpatialResult;
use crate::spherical::metadata::{Crop, StereoMode};

/// Identifier prefixing spherical XML in a `uuid` box.
pub const SPHERICAL_UUID_ID: [u8; 16] = [
    0xff, 0xcc, 0x82, 0x63, 0xf8, 0x55, 0x4a, 0x93, 0x88, 0x14, 0x58, 0x7a, 0x02, 0x52, 0x1f, 0xdd,
];

const RDF_PREFIX: &str = " xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\" ";

const SPHERICAL_XML_HEADER: &str = "<?xml version=\"1.0\"?>\
    <rdf:SphericalVideo\n\
    xmlns:rdf=\"http://www.w3.org/1999/02/22-rdf-syntax-ns#\"\n\
    xmlns:GSpherical=\"http://ns.google.com/videos/1.0/spherical/\">";

const SPHERICAL_XML_CONTENTS: &str = "<GSpherical:Spherical>true</GSpherical:Spherical>\
    <GSpherical:Stitched>true</GSpherical:Stitched>\
    <GSpherical:StitchingSoftware>Spherical Metadata Tool</GSpherical:StitchingSoftware>\
    <GSpherical:ProjectionType>equirectangular</GSpherical:ProjectionType>";

const SPHERICAL_XML_CONTENTS_TOP_BOTTOM: &str =
    "<GSpherical:StereoMode>top-bottom</GSpherical:StereoMode>";
const SPHERICAL_XML_CONTENTS_LEFT_RIGHT: &str =
    "<GSpherical:StereoMode>left-right</GSpherical:StereoMode>";

const SPHERICAL_XML_FOOTER: &str = "</rdf:SphericalVideo>";

/// The closed spherical tag vocabulary.
pub const SPHERICAL_TAGS: &[&str] = &[
    "Spherical",
    "Stitched",
    "StitchingSoftware",
    "ProjectionType",
    "SourceCount",
    "StereoMode",
    "InitialViewHeadingDegrees",
    "InitialViewPitchDegrees",
    "InitialViewRollDegrees",
    "Timestamp",
    "CroppedAreaImageWidthPixels",
    "CroppedAreaImageHeightPixels",
    "FullPanoWidthPixels",
    "FullPanoHeightPixels",
    "CroppedAreaLeftPixels",
    "CroppedAreaTopPixels",
];

/// Generate the legacy spherical XML document.
///
/// Always declares an equirectangular, stitched projection; the stereo mode
/// and crop elements are appended when requested. The crop is validated
/// before anything is generated.
pub fn generate_spherical_xml(
    stereo: Option<StereoMode>,
    crop: Option<&Crop>,
) -> SpatialResult<String> {
    let mut additional_xml = String::new();

    match stereo {
        Some(StereoMode::TopBottom) => additional_xml.push_str(SPHERICAL_XML_CONTENTS_TOP_BOTTOM),
        Some(StereoMode::LeftRight) => additional_xml.push_str(SPHERICAL_XML_CONTENTS_LEFT_RIGHT),
        Some(StereoMode::Mono) | None => {}
    }

    if let Some(crop) = crop {
        crop.validate()?;
        additional_xml.push_str(&format!(
            "<GSpherical:CroppedAreaImageWidthPixels>{0}</GSpherical:CroppedAreaImageWidthPixels>\
             <GSpherical:CroppedAreaImageHeightPixels>{1}</GSpherical:CroppedAreaImageHeightPixels>\
             <GSpherical:FullPanoWidthPixels>{2}</GSpherical:FullPanoWidthPixels>\
             <GSpherical:FullPanoHeightPixels>{3}</GSpherical:FullPanoHeightPixels>\
             <GSpherical:CroppedAreaLeftPixels>{4}</GSpherical:CroppedAreaLeftPixels>\
             <GSpherical:CroppedAreaTopPixels>{5}</GSpherical:CroppedAreaTopPixels>",
            crop.cropped_width,
            crop.cropped_height,
            crop.full_width,
            crop.full_height,
            crop.cropped_left,
            crop.cropped_top,
        ));
    }

    Ok(format!(
        "{}{}{}{}",
        SPHERICAL_XML_HEADER, SPHERICAL_XML_CONTENTS, additional_xml, SPHERICAL_XML_FOOTER
    ))
}

/// Parse a spherical XML document into tag/value pairs.
///
/// Known tags are logged and collected; unknown tags are logged and
/// dropped. Documents missing the rdf namespace declaration (produced by
/// some old injectors) are parsed with the prefix inserted.
pub fn parse_spherical_xml(
    contents: &str,
    console: &mut dyn Console,
) -> SpatialResult<BTreeMap<String, String>> {
    let mut patched = None;
    if let Some(index) = contents.find("<rdf:SphericalVideo") {
        if !contents.contains("xmlns:rdf") {
            let insert_at = index + "<rdf:SphericalVideo".len();
            let mut fixed = String::with_capacity(contents.len() + RDF_PREFIX.len());
            fixed.push_str(&contents[..insert_at]);
            fixed.push_str(RDF_PREFIX);
            fixed.push_str(&contents[insert_at..]);
            console.log(&format!("\t\tWarning missing rdf prefix: {}", RDF_PREFIX));
            patched = Some(fixed);
        }
    }

    match try_parse(patched.as_deref().unwrap_or(contents), console) {
        Ok(tags) => Ok(tags),
        Err(error) => {
            console.log("\t\tParser Error on XML");
            console.log(contents);
            Err(error)
        }
    }
}

fn try_parse(
    contents: &str,
    console: &mut dyn Console,
) -> SpatialResult<BTreeMap<String, String>> {
    let mut reader = Reader::from_str(contents);
    let mut buf = Vec::new();
    let mut tags = BTreeMap::new();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                if name != "SphericalVideo" {
                    current = Some(name);
                }
            }
            Event::Text(e) => {
                let Some(tag) = current.as_deref() else {
                    continue;
                };
                let raw_text = String::from_utf8_lossy(e.as_ref());
                let text = match unescape(&raw_text) {
                    Ok(unescaped) => unescaped.to_string(),
                    Err(_) => raw_text.to_string(),
                };
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                if SPHERICAL_TAGS.contains(&tag) {
                    console.log(&format!("\t\t{} = {}", tag, text));
                    tags.insert(tag.to_string(), text.to_string());
                } else {
                    console.log(&format!("\t\tUnknown: {} = {}", tag, text));
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(tags)
}
