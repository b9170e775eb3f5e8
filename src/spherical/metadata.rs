//! Metadata request and parse-result types
//!
//! A [`Metadata`] value describes what to inject: the legacy spherical XML
//! document, the v2 stereo/projection boxes, a spatial audio layout, or any
//! combination. [`ParsedMetadata`] is what examination returns. Neither
//! outlives the operation that consumes it; the container tree is the only
//! persistent representation.

use std::collections::BTreeMap;

use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::sa3d::Sa3dBox;

/// Stereoscopic frame packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StereoMode {
    Mono,
    TopBottom,
    LeftRight,
}

impl StereoMode {
    /// Wire value of the st3d stereo mode field.
    pub fn as_u8(self) -> u8 {
        match self {
            StereoMode::Mono => 0,
            StereoMode::TopBottom => 1,
            StereoMode::LeftRight => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StereoMode::Mono => "mono",
            StereoMode::TopBottom => "top-bottom",
            StereoMode::LeftRight => "left-right",
        }
    }

    /// Parse a stereo mode name; `"none"` is accepted as mono.
    pub fn from_name(name: &str) -> SpatialResult<Self> {
        match name {
            "mono" | "none" => Ok(StereoMode::Mono),
            "top-bottom" => Ok(StereoMode::TopBottom),
            "left-right" => Ok(StereoMode::LeftRight),
            other => Err(SpatialError::UnknownStereoMode(other.to_string())),
        }
    }
}

/// Spherical v2 projection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Equirectangular,
}

impl Projection {
    pub fn name(self) -> &'static str {
        match self {
            Projection::Equirectangular => "equirectangular",
        }
    }
}

/// Ambisonic sound field kind. Only full-sphere is defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AmbisonicType {
    #[default]
    Periphonic,
}

impl AmbisonicType {
    pub fn name(self) -> &'static str {
        match self {
            AmbisonicType::Periphonic => "periphonic",
        }
    }
}

/// Crop geometry carried in the legacy spherical XML.
///
/// Field order matches the original tool's `w:h:fw:fh:x:y` crop option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crop {
    pub cropped_width: u32,
    pub cropped_height: u32,
    pub full_width: u32,
    pub full_height: u32,
    pub cropped_left: u32,
    pub cropped_top: u32,
}

impl Crop {
    /// Reject geometrically impossible crops: empty areas, a cropped area
    /// larger than the full pano, or an offset pushing the cropped area
    /// outside it.
    pub fn validate(&self) -> SpatialResult<()> {
        if self.full_width == 0 || self.full_height == 0 {
            return Err(SpatialError::InvalidCrop(format!(
                "full pano dimensions are invalid: width = {} height = {}",
                self.full_width, self.full_height
            )));
        }
        if self.cropped_width == 0
            || self.cropped_height == 0
            || self.cropped_width > self.full_width
            || self.cropped_height > self.full_height
        {
            return Err(SpatialError::InvalidCrop(format!(
                "cropped area dimensions are invalid: width = {} height = {}",
                self.cropped_width, self.cropped_height
            )));
        }
        let total_width = u64::from(self.cropped_left) + u64::from(self.cropped_width);
        let total_height = u64::from(self.cropped_top) + u64::from(self.cropped_height);
        if total_width > u64::from(self.full_width) || total_height > u64::from(self.full_height) {
            return Err(SpatialError::InvalidCrop(format!(
                "cropped area offsets are invalid: left = {} top = {} \
                 left+cropped width: {} top+cropped height: {}",
                self.cropped_left, self.cropped_top, total_width, total_height
            )));
        }
        Ok(())
    }
}

/// Expected channel count for an ambisonic sound field.
///
/// A periphonic field of order n carries (n+1)² components, plus two for an
/// optional head-locked stereo bed.
pub fn expected_num_audio_components(
    ambisonic_type: AmbisonicType,
    ambisonic_order: u32,
    head_locked_stereo: bool,
) -> u32 {
    match ambisonic_type {
        AmbisonicType::Periphonic => {
            (ambisonic_order + 1) * (ambisonic_order + 1) + if head_locked_stereo { 2 } else { 0 }
        }
    }
}

/// Requested spatial audio layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpatialAudioMetadata {
    pub ambisonic_type: AmbisonicType,
    pub ambisonic_order: u32,
    pub head_locked_stereo: bool,
    /// Explicit channel map; usually the identity map for the order.
    pub channel_map: Vec<u32>,
}

impl SpatialAudioMetadata {
    /// Canonical ambiX (ACN/SN3D) request for the given order, with an
    /// identity channel map.
    pub fn for_order(ambisonic_order: u32, head_locked_stereo: bool) -> Self {
        let channels = expected_num_audio_components(
            AmbisonicType::Periphonic,
            ambisonic_order,
            head_locked_stereo,
        );
        SpatialAudioMetadata {
            ambisonic_type: AmbisonicType::Periphonic,
            ambisonic_order,
            head_locked_stereo,
            channel_map: (0..channels).collect(),
        }
    }

    /// Channel count this layout requires of the audio track.
    pub fn expected_num_channels(&self) -> u32 {
        expected_num_audio_components(
            self.ambisonic_type,
            self.ambisonic_order,
            self.head_locked_stereo,
        )
    }

    /// Build the SA3D box for a verified track.
    pub fn create_sa3d(&self, num_channels: u32) -> Sa3dBox {
        Sa3dBox::create(num_channels, self.ambisonic_order, &self.channel_map)
    }
}

/// Everything an injection request can carry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Legacy spherical RDF/XML document for the `uuid` box, usually from
    /// [`generate_spherical_xml`](crate::spherical::generate_spherical_xml).
    pub video: Option<String>,
    /// Spherical v2 projection (`sv3d` box).
    pub projection: Option<Projection>,
    /// Spherical v2 stereo mode (`st3d` box).
    pub stereo_mode: Option<StereoMode>,
    /// Spatial audio layout (`SA3D` box).
    pub audio: Option<SpatialAudioMetadata>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request legacy spherical video metadata, generating the XML document
    /// from the stereo mode and crop. An invalid crop is rejected here,
    /// before any file is touched.
    pub fn with_spherical_video(
        stereo: Option<StereoMode>,
        crop: Option<&Crop>,
    ) -> SpatialResult<Self> {
        Ok(Metadata {
            video: Some(crate::spherical::xml::generate_spherical_xml(stereo, crop)?),
            ..Self::default()
        })
    }
}

/// Metadata recovered from a file.
#[derive(Debug, Clone, Default)]
pub struct ParsedMetadata {
    /// Spherical XML tag/value pairs, keyed by track label ("Track 0", ...).
    pub video: BTreeMap<String, BTreeMap<String, String>>,
    /// Spatial audio box of the audio track, if one is present.
    pub audio: Option<Sa3dBox>,
    /// Channel count of the audio track, 0 when there is none.
    pub num_audio_channels: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_components_grid() {
        for (order, channels) in [(0u32, 1u32), (1, 4), (2, 9), (3, 16)] {
            assert_eq!(
                expected_num_audio_components(AmbisonicType::Periphonic, order, false),
                channels
            );
            assert_eq!(
                expected_num_audio_components(AmbisonicType::Periphonic, order, true),
                channels + 2
            );
        }
    }

    #[test]
    fn test_for_order_channel_map() {
        let audio = SpatialAudioMetadata::for_order(1, false);
        assert_eq!(audio.channel_map, [0, 1, 2, 3]);
        assert_eq!(audio.expected_num_channels(), 4);

        let audio = SpatialAudioMetadata::for_order(1, true);
        assert_eq!(audio.channel_map, [0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_crop_full_frame_accepted() {
        let crop = Crop {
            cropped_width: 100,
            cropped_height: 100,
            full_width: 100,
            full_height: 100,
            cropped_left: 0,
            cropped_top: 0,
        };
        assert!(crop.validate().is_ok());
    }

    #[test]
    fn test_crop_oversized_rejected() {
        let crop = Crop {
            cropped_width: 200,
            cropped_height: 100,
            full_width: 100,
            full_height: 100,
            cropped_left: 0,
            cropped_top: 0,
        };
        assert!(matches!(crop.validate(), Err(SpatialError::InvalidCrop(_))));
    }

    #[test]
    fn test_crop_offset_overflow_rejected() {
        let crop = Crop {
            cropped_width: 50,
            cropped_height: 50,
            full_width: 100,
            full_height: 100,
            cropped_left: 60,
            cropped_top: 60,
        };
        assert!(matches!(crop.validate(), Err(SpatialError::InvalidCrop(_))));
    }

    #[test]
    fn test_stereo_mode_names() {
        assert_eq!(StereoMode::from_name("top-bottom").unwrap(), StereoMode::TopBottom);
        assert_eq!(StereoMode::from_name("none").unwrap(), StereoMode::Mono);
        assert!(StereoMode::from_name("diagonal").is_err());
        assert_eq!(StereoMode::LeftRight.as_u8(), 2);
    }
}
