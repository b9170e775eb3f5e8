//! # spatialkit
//!
//! Pure Rust toolkit for examining and injecting 360-video (spherical) and
//! spatial-audio (ambisonic) metadata in MP4/MOV files, without re-encoding
//! audio or video payloads.
//!
//! The crate rewrites the ISO base media box tree: it parses arbitrary
//! nesting losslessly, inserts the spherical `uuid`, `st3d`, `sv3d` and
//! `SA3D` boxes, recomputes every size field bottom-up, and patches the
//! chunk-offset tables so media samples stay byte-addressable after the
//! file grows.
//!
//! ## Examining a file
//!
//! ```rust,no_run
//! use spatialkit::{parse_metadata, BufferedConsole};
//!
//! # fn main() -> Result<(), spatialkit::SpatialError> {
//! let mut console = BufferedConsole::new();
//! let parsed = parse_metadata("video.mp4", &mut console)?;
//! for (track, tags) in &parsed.video {
//!     println!("{}: {:?}", track, tags.get("ProjectionType"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Injecting metadata
//!
//! ```rust,no_run
//! use spatialkit::{inject_metadata, BufferedConsole, Metadata, StereoMode};
//!
//! # fn main() -> Result<(), spatialkit::SpatialError> {
//! let metadata = Metadata::with_spherical_video(Some(StereoMode::TopBottom), None)?;
//! let mut console = BufferedConsole::new();
//! inject_metadata("in.mp4", "out.mp4", &metadata, &mut console)?;
//! # Ok(())
//! # }
//! ```
//!
//! All diagnostic and progress text is delivered through a caller-supplied
//! [`Console`]; nothing is printed directly.

pub mod console;
pub mod error;
pub mod mpeg;
pub mod spherical;
pub mod utils;

pub use console::{BufferedConsole, Console};
pub use error::{SpatialError, SpatialResult};
pub use mpeg::{BoxKind, BoxTag, Mp4Box, Mpeg4Container, Sa3dBox, St3dBox};
pub use spherical::{
    expected_num_audio_components, generate_spherical_xml, inject_metadata, parse_metadata,
    parse_spherical_xml, AmbisonicType, Crop, Metadata, ParsedMetadata, Projection,
    SpatialAudioMetadata, StereoMode, SPHERICAL_UUID_ID,
};
