//! sv3d (spherical video v2) box family
//!
//! `sv3d` itself is a plain container. Its payload boxes carry the fixed
//! layouts: `prhd` (projection pose, 16 content bytes) and exactly one
//! projection box, `equi` (equirectangular bounds, 20 content bytes) for
//! equirectangular video.

use std::io::{Read, Write};

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::{BoxKind, Mp4Box};
use crate::mpeg::constants::{BoxTag, TAG_EQUI, TAG_PRHD, TAG_SV3D};
use crate::utils::io::{read_i32, read_u32};

/// Projection pose: yaw/pitch/roll as 16.16 fixed point degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrhdBox {
    pub pose_yaw_degrees: i32,
    pub pose_pitch_degrees: i32,
    pub pose_roll_degrees: i32,
}

impl PrhdBox {
    /// version/flags word + three pose angles.
    pub const CONTENT_SIZE: u64 = 16;

    pub fn create() -> Self {
        Self::default()
    }

    pub fn read_content<R: Read>(
        reader: &mut R,
        tag: BoxTag,
        position: u64,
        content_size: u64,
    ) -> SpatialResult<Self> {
        if content_size != Self::CONTENT_SIZE {
            return Err(SpatialError::InvalidBoxSize {
                tag,
                size: content_size,
                position,
            });
        }
        read_u32(reader)?; // version and flags
        Ok(PrhdBox {
            pose_yaw_degrees: read_i32(reader)?,
            pose_pitch_degrees: read_i32(reader)?,
            pose_roll_degrees: read_i32(reader)?,
        })
    }

    pub fn write_content<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&0u32.to_be_bytes())?; // version and flags
        writer.write_all(&self.pose_yaw_degrees.to_be_bytes())?;
        writer.write_all(&self.pose_pitch_degrees.to_be_bytes())?;
        writer.write_all(&self.pose_roll_degrees.to_be_bytes())
    }

    pub fn print_box(&self, console: &mut dyn Console) {
        console.log("\t\t\tPRHD {");
        console.log(&format!("\t\t\t\tPose Yaw Degrees: {}", self.pose_yaw_degrees));
        console.log(&format!("\t\t\t\tPose Pitch Degrees: {}", self.pose_pitch_degrees));
        console.log(&format!("\t\t\t\tPose Roll Degrees: {}", self.pose_roll_degrees));
        console.log("\t\t\t}");
    }

    pub fn metadata_string(&self) -> String {
        format!(
            "yaw:{}, pitch:{}, roll:{}",
            self.pose_yaw_degrees, self.pose_pitch_degrees, self.pose_roll_degrees
        )
    }
}

/// Equirectangular projection bounds, each a 0.32 fixed point fraction of
/// the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EquiBox {
    pub bounds_top: u32,
    pub bounds_bottom: u32,
    pub bounds_left: u32,
    pub bounds_right: u32,
}

impl EquiBox {
    /// version/flags word + four bounds.
    pub const CONTENT_SIZE: u64 = 20;

    pub fn create() -> Self {
        Self::default()
    }

    pub fn read_content<R: Read>(
        reader: &mut R,
        tag: BoxTag,
        position: u64,
        content_size: u64,
    ) -> SpatialResult<Self> {
        if content_size != Self::CONTENT_SIZE {
            return Err(SpatialError::InvalidBoxSize {
                tag,
                size: content_size,
                position,
            });
        }
        read_u32(reader)?; // version and flags
        Ok(EquiBox {
            bounds_top: read_u32(reader)?,
            bounds_bottom: read_u32(reader)?,
            bounds_left: read_u32(reader)?,
            bounds_right: read_u32(reader)?,
        })
    }

    pub fn write_content<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&0u32.to_be_bytes())?; // version and flags
        writer.write_all(&self.bounds_top.to_be_bytes())?;
        writer.write_all(&self.bounds_bottom.to_be_bytes())?;
        writer.write_all(&self.bounds_left.to_be_bytes())?;
        writer.write_all(&self.bounds_right.to_be_bytes())
    }

    pub fn print_box(&self, console: &mut dyn Console) {
        console.log("\t\t\tEQUI {");
        console.log(&format!("\t\t\t\tBounds Top: {}", self.bounds_top));
        console.log(&format!("\t\t\t\tBounds Bottom: {}", self.bounds_bottom));
        console.log(&format!("\t\t\t\tBounds Left: {}", self.bounds_left));
        console.log(&format!("\t\t\t\tBounds Right: {}", self.bounds_right));
        console.log("\t\t\t}");
    }

    pub fn metadata_string(&self) -> String {
        format!(
            "Equi (top:{}, bottom:{}, left:{}, right:{})",
            self.bounds_top, self.bounds_bottom, self.bounds_left, self.bounds_right
        )
    }
}

/// Assemble a complete `sv3d` container for an equirectangular projection:
/// a default pose followed by full-frame bounds.
pub fn create_equirectangular_sv3d() -> Mp4Box {
    let prhd = Mp4Box {
        tag: TAG_PRHD,
        position: 0,
        header_size: 8,
        content_size: PrhdBox::CONTENT_SIZE,
        kind: BoxKind::Prhd(PrhdBox::create()),
    };
    let equi = Mp4Box {
        tag: TAG_EQUI,
        position: 0,
        header_size: 8,
        content_size: EquiBox::CONTENT_SIZE,
        kind: BoxKind::Equi(EquiBox::create()),
    };
    Mp4Box::container(TAG_SV3D, vec![prhd, equi])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_prhd_layout() {
        let prhd = PrhdBox::create();
        let mut bytes = Vec::new();
        prhd.write_content(&mut bytes).unwrap();
        assert_eq!(bytes, [0u8; 16]);
    }

    #[test]
    fn test_prhd_round_trip() {
        let prhd = PrhdBox {
            pose_yaw_degrees: -90 << 16,
            pose_pitch_degrees: 10 << 16,
            pose_roll_degrees: 0,
        };
        let mut bytes = Vec::new();
        prhd.write_content(&mut bytes).unwrap();
        let decoded = PrhdBox::read_content(&mut Cursor::new(bytes), TAG_PRHD, 0, 16).unwrap();
        assert_eq!(decoded, prhd);
    }

    #[test]
    fn test_equi_round_trip() {
        let equi = EquiBox {
            bounds_top: 1,
            bounds_bottom: 2,
            bounds_left: 3,
            bounds_right: 4,
        };
        let mut bytes = Vec::new();
        equi.write_content(&mut bytes).unwrap();
        assert_eq!(bytes.len(), 20);
        let decoded = EquiBox::read_content(&mut Cursor::new(bytes), TAG_EQUI, 0, 20).unwrap();
        assert_eq!(decoded, equi);
    }

    #[test]
    fn test_create_equirectangular_sv3d() {
        let sv3d = create_equirectangular_sv3d();
        assert_eq!(sv3d.tag, TAG_SV3D);
        assert!(sv3d.find_child(TAG_PRHD).is_some());
        assert!(sv3d.find_child(TAG_EQUI).is_some());
        // prhd (8+16) + equi (8+20)
        assert_eq!(sv3d.content_size, 24 + 28);
    }
}
