//! Spatial media metadata semantics
//!
//! The metadata layer on top of the container engine: the legacy spherical
//! XML document, the v2 and ambisonic request types, and the operations
//! that examine or inject them.

pub mod inject;
pub mod metadata;
pub mod xml;

pub use inject::{
    add_spatial_audio, add_spherical_v2, add_spherical_xml, inject_metadata, parse_metadata,
    parse_spherical_mpeg4, MPEG_FILE_EXTENSIONS,
};
pub use metadata::{
    expected_num_audio_components, AmbisonicType, Crop, Metadata, ParsedMetadata, Projection,
    SpatialAudioMetadata, StereoMode,
};
pub use xml::{generate_spherical_xml, parse_spherical_xml, SPHERICAL_TAGS, SPHERICAL_UUID_ID};
