//! Error types for spatial media operations
//!
//! One crate-wide error enum covering structural container damage, semantic
//! injection rejections, and resource-level failures.

use thiserror::Error;

use crate::mpeg::constants::BoxTag;

/// Error types for spatial media operations
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A box declares a size smaller than its own header
    #[error("invalid size {size} for `{tag}` box at offset {position}")]
    InvalidBoxSize {
        tag: BoxTag,
        size: u64,
        position: u64,
    },

    /// A box extends past the end of its enclosing container
    #[error("`{tag}` box at offset {position} ends at {declared_end}, past the enclosing bound {bound}")]
    BoxOutOfBounds {
        tag: BoxTag,
        position: u64,
        declared_end: u64,
        bound: u64,
    },

    /// The file has no `moov` box
    #[error("file does not contain a moov box")]
    MissingMoov,

    /// The file has more than one `moov` box
    #[error("file contains more than one moov box")]
    DuplicateMoov,

    /// The file has no `mdat` box
    #[error("file does not contain an mdat box")]
    MissingMdat,

    /// A sample-description entry carries a version this tool cannot lay out
    #[error("unsupported version {version} for `{tag}` sample description at offset {position}")]
    UnsupportedSampleVersion {
        tag: BoxTag,
        version: i16,
        position: u64,
    },

    /// AudioSpecificConfig signals an extended sample rate (index 0)
    #[error("greater than 48kHz audio is not supported")]
    UnsupportedSampleRate,

    /// The elementary stream descriptor chain is not 3 -> 4 -> 5
    #[error("expected elementary stream descriptor tag {expected}, found {found}")]
    InvalidDescriptor { expected: u8, found: u8 },

    /// Decoder-specific info too short to hold an AudioSpecificConfig
    #[error("decoder specific descriptor holds {0} byte(s), expected at least 2")]
    DescriptorTooShort(u32),

    /// An AAC sample description without an esds descriptor
    #[error("no esds descriptor found in `{0}` sample description")]
    MissingEsds(BoxTag),

    /// A chunk-offset table declares more entries than its content holds
    #[error("`{tag}` table declares {entries} entries but holds {content_size} content bytes")]
    OffsetTableTruncated {
        tag: BoxTag,
        entries: u32,
        content_size: u64,
    },

    /// Patching a chunk offset left the 32-bit (or unsigned) range
    #[error("patched chunk offset {offset} with delta {delta} leaves the representable range")]
    OffsetOverflow { offset: u64, delta: i64 },

    /// Metadata insertion would shift `mdat` boxes by different amounts
    #[error("mdat boxes would shift unequally; refusing to patch chunk offsets")]
    InterleavedMdat,

    /// Audio channel count does not match the requested ambisonic layout
    #[error("found {found} audio channel(s), expected {expected} channel(s) for {ambisonic_type} ambisonics of order {order}")]
    ChannelCountMismatch {
        found: u32,
        expected: u32,
        ambisonic_type: &'static str,
        order: u32,
    },

    /// A channel map was supplied whose length disagrees with the track
    #[error("channel map holds {found} entries, expected {expected}")]
    InvalidChannelMap { found: usize, expected: u32 },

    /// Spatial audio injection requires exactly one audio track
    #[error("expected 1 audio track, found {0}")]
    MultipleAudioTracks(usize),

    /// No sound sample description to read a channel count from
    #[error("no sound sample description found in stsd box")]
    NoSoundSampleDescription,

    /// Same-tag leaf boxes cannot be merged
    #[error("cannot merge leaf box `{0}`")]
    CannotMergeLeaf(BoxTag),

    /// The root container never merges
    #[error("cannot merge mpeg4 containers")]
    CannotMergeRoot,

    /// Crop rectangle is geometrically invalid
    #[error("invalid crop: {0}")]
    InvalidCrop(String),

    /// Stereo mode name outside the known vocabulary
    #[error("unknown stereo mode `{0}`")]
    UnknownStereoMode(String),

    /// Source and destination are the same file
    #[error("input and output cannot be the same file")]
    SamePath,

    /// File extension outside the MP4/MOV family
    #[error("unknown file type `{0}`")]
    UnknownFileType(String),

    /// Legacy spherical XML payload is not valid UTF-8
    #[error("spherical metadata is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// XML error from the spherical metadata document
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for spatial media operations
pub type SpatialResult<T> = Result<T, SpatialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SpatialError::ChannelCountMismatch {
            found: 2,
            expected: 4,
            ambisonic_type: "periphonic",
            order: 1,
        };
        let text = err.to_string();
        assert!(text.contains("found 2 audio channel(s)"));
        assert!(text.contains("order 1"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: SpatialError = io_err.into();
        assert!(matches!(err, SpatialError::Io(_)));
    }
}
