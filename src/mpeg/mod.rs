//! MPEG-4 container engine
//!
//! Loading, mutating and rewriting the box/atom tree of an ISO base media
//! file (MP4/MOV) without touching the media payload. The loader builds a
//! fully owned tree; mutation edits it in place; save streams it back out,
//! recomputing sizes and patching chunk-offset tables so samples stay
//! byte-addressable after the file grows.

pub mod boxes;
pub mod constants;
pub mod esds;
pub mod loader;
pub mod mpeg4;
pub mod offsets;
pub mod sa3d;
pub mod st3d;
pub mod sv3d;

pub use boxes::{BoxKind, Mp4Box};
pub use constants::BoxTag;
pub use mpeg4::Mpeg4Container;
pub use offsets::OffsetWidth;
pub use sa3d::Sa3dBox;
pub use st3d::St3dBox;
pub use sv3d::{EquiBox, PrhdBox};
