//! Box model: leaf and container behaviour shared by every box
//!
//! A box is a tag, a position in the source file, a header size (8, or 16
//! when the 32-bit size field carries the 64-bit escape) and a content size.
//! What the content *is* lives in [`BoxKind`]: an opaque leaf (file-backed
//! or owned bytes), a container of child boxes, a lazily-patched
//! chunk-offset table, or one of the spherical/ambisonic boxes that knows
//! its own binary layout. Dispatch is a closed enum matched exhaustively;
//! there is no per-tag subclassing.
//!
//! Containers exclusively own their children. Mutation replaces the owned
//! child list; nothing aliases a box from two places.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::constants::BoxTag;
use crate::mpeg::offsets::{self, OffsetWidth};
use crate::mpeg::sa3d::Sa3dBox;
use crate::mpeg::st3d::St3dBox;
use crate::mpeg::sv3d::{EquiBox, PrhdBox};
use crate::utils::io::copy_exact;

/// Content payload of a box, selected once at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum BoxKind {
    /// Opaque content. `None` means the source file is the backing store
    /// and save copies the bytes through; `Some` means the box owns its
    /// bytes in memory (newly created boxes).
    Leaf { contents: Option<Vec<u8>> },
    /// A sequence of child boxes, optionally preceded by a fixed number of
    /// box-specific header bytes ("padding") copied verbatim on save.
    Container { padding: u64, children: Vec<Mp4Box> },
    /// An `stco`/`co64` table, patched entry-by-entry on save.
    ChunkOffsets { width: OffsetWidth },
    /// Spatial audio (`SA3D`).
    Sa3d(Sa3dBox),
    /// Stereo mode (`st3d`).
    St3d(St3dBox),
    /// Projection pose (`prhd`).
    Prhd(PrhdBox),
    /// Equirectangular projection bounds (`equi`).
    Equi(EquiBox),
}

/// One box in the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Mp4Box {
    pub tag: BoxTag,
    /// Absolute position of the box header in the source file. Zero for
    /// boxes created in memory.
    pub position: u64,
    /// 8, or 16 when the size field uses the 64-bit escape.
    pub header_size: u64,
    pub content_size: u64,
    pub kind: BoxKind,
}

impl Mp4Box {
    /// A leaf that owns its content bytes.
    pub fn leaf_with_contents(tag: BoxTag, contents: Vec<u8>) -> Self {
        Mp4Box {
            tag,
            position: 0,
            header_size: 8,
            content_size: contents.len() as u64,
            kind: BoxKind::Leaf {
                contents: Some(contents),
            },
        }
    }

    /// A container built in memory from the given children.
    pub fn container(tag: BoxTag, children: Vec<Mp4Box>) -> Self {
        let mut b = Mp4Box {
            tag,
            position: 0,
            header_size: 8,
            content_size: 0,
            kind: BoxKind::Container {
                padding: 0,
                children,
            },
        };
        b.resize();
        b
    }

    /// Absolute position of the first content byte in the source file.
    pub fn content_start(&self) -> u64 {
        self.position + self.header_size
    }

    /// Total size of the box in bytes, header included.
    pub fn size(&self) -> u64 {
        self.header_size + self.content_size
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, BoxKind::Container { .. })
    }

    /// Child boxes, if this is a container.
    pub fn children(&self) -> Option<&[Mp4Box]> {
        match &self.kind {
            BoxKind::Container { children, .. } => Some(children),
            _ => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Mp4Box>> {
        match &mut self.kind {
            BoxKind::Container { children, .. } => Some(children),
            _ => None,
        }
    }

    /// First child with the given tag.
    pub fn find_child(&self, tag: BoxTag) -> Option<&Mp4Box> {
        self.children()?.iter().find(|c| c.tag == tag)
    }

    pub fn find_child_mut(&mut self, tag: BoxTag) -> Option<&mut Mp4Box> {
        self.children_mut()?.iter_mut().find(|c| c.tag == tag)
    }

    /// Descend through a chain of container tags, e.g. `[mdia, minf, stbl]`.
    ///
    /// Returns `None` as soon as a link is missing; absence is for the
    /// caller to judge.
    pub fn descend(&self, path: &[BoxTag]) -> Option<&Mp4Box> {
        let mut current = self;
        for &tag in path {
            current = current.find_child(tag)?;
        }
        Some(current)
    }

    pub fn descend_mut(&mut self, path: &[BoxTag]) -> Option<&mut Mp4Box> {
        let mut current = self;
        for &tag in path {
            current = current.find_child_mut(tag)?;
        }
        Some(current)
    }

    /// Recompute `content_size` bottom-up.
    ///
    /// Containers become `padding + Σ child.size()`; specialized boxes
    /// recompute from their own layout; file-backed leaves and chunk-offset
    /// tables keep the size they were loaded with.
    pub fn resize(&mut self) {
        match &mut self.kind {
            BoxKind::Container { padding, children } => {
                let mut content_size = *padding;
                for child in children.iter_mut() {
                    child.resize();
                    content_size += child.size();
                }
                self.content_size = content_size;
            }
            BoxKind::Sa3d(b) => self.content_size = b.content_size(),
            BoxKind::St3d(_) => self.content_size = St3dBox::CONTENT_SIZE,
            BoxKind::Prhd(_) => self.content_size = PrhdBox::CONTENT_SIZE,
            BoxKind::Equi(_) => self.content_size = EquiBox::CONTENT_SIZE,
            BoxKind::Leaf { contents } => {
                if let Some(contents) = contents {
                    self.content_size = contents.len() as u64;
                }
            }
            BoxKind::ChunkOffsets { .. } => {}
        }
    }

    /// Remove every child with the given tag, recursively.
    pub fn remove(&mut self, tag: BoxTag) {
        if let BoxKind::Container { children, .. } = &mut self.kind {
            children.retain(|c| c.tag != tag);
            for child in children.iter_mut() {
                child.remove(tag);
            }
        }
    }

    /// Add a child, merging with a same-tag container if one exists.
    ///
    /// Two containers with the same tag merge recursively; a same-tag leaf
    /// cannot absorb anything and the add is rejected.
    pub fn add(&mut self, element: Mp4Box) -> SpatialResult<()> {
        let children = match &mut self.kind {
            BoxKind::Container { children, .. } => children,
            _ => return Err(SpatialError::CannotMergeLeaf(self.tag)),
        };
        for child in children.iter_mut() {
            if child.tag == element.tag {
                return child.merge(element);
            }
        }
        children.push(element);
        Ok(())
    }

    /// Merge another container's children into this one.
    fn merge(&mut self, element: Mp4Box) -> SpatialResult<()> {
        debug_assert_eq!(self.tag, element.tag);
        if !self.is_container() {
            return Err(SpatialError::CannotMergeLeaf(self.tag));
        }
        let incoming = match element.kind {
            BoxKind::Container { children, .. } => children,
            _ => return Err(SpatialError::CannotMergeLeaf(element.tag)),
        };
        for sub_element in incoming {
            self.add(sub_element)?;
        }
        Ok(())
    }

    /// Stream this box to `writer`, reading uncached content from `reader`.
    ///
    /// Writes the header (32-bit size + tag, or the escape value 1 followed
    /// by a 64-bit size), then the content: owned bytes, the chunk-offset
    /// transform with `delta`, a specialized box serialization, or a
    /// byte-exact copy from the source. Container padding is copied verbatim
    /// before the children.
    pub fn save<R: Read + Seek, W: Write>(
        &self,
        reader: &mut R,
        writer: &mut W,
        delta: i64,
    ) -> SpatialResult<()> {
        self.write_header(writer)?;
        match &self.kind {
            BoxKind::Leaf { contents: Some(contents) } => {
                writer.write_all(contents)?;
            }
            BoxKind::Leaf { contents: None } => {
                reader.seek(SeekFrom::Start(self.content_start()))?;
                copy_exact(reader, writer, self.content_size)?;
            }
            BoxKind::Container { padding, children } => {
                if *padding > 0 {
                    reader.seek(SeekFrom::Start(self.content_start()))?;
                    copy_exact(reader, writer, *padding)?;
                }
                for child in children {
                    child.save(reader, writer, delta)?;
                }
            }
            BoxKind::ChunkOffsets { width } => {
                offsets::patch_copy(reader, writer, self, *width, delta)?;
            }
            BoxKind::Sa3d(b) => b.write_content(writer)?,
            BoxKind::St3d(b) => b.write_content(writer)?,
            BoxKind::Prhd(b) => b.write_content(writer)?,
            BoxKind::Equi(b) => b.write_content(writer)?,
        }
        Ok(())
    }

    fn write_header<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        if self.header_size == 16 {
            writer.write_all(&1u32.to_be_bytes())?;
            writer.write_all(self.tag.as_bytes())?;
            writer.write_all(&self.size().to_be_bytes())?;
        } else {
            writer.write_all(&(self.size() as u32).to_be_bytes())?;
            writer.write_all(self.tag.as_bytes())?;
        }
        Ok(())
    }

    /// Print this box and its children through the line sink.
    pub fn print_structure(&self, indent: &str, console: &mut dyn Console) {
        console.log(&format!(
            "{} {} [{}, {}]",
            indent, self.tag, self.header_size, self.content_size
        ));

        if let Some(children) = self.children() {
            let count = children.len();
            for (i, child) in children.iter().enumerate() {
                let mut next_indent = indent
                    .replace('├', "│")
                    .replace('└', " ")
                    .replace('─', " ");
                if i == count - 1 {
                    next_indent.push_str(" └──");
                } else {
                    next_indent.push_str(" ├──");
                }
                child.print_structure(&next_indent, console);
            }
        }
    }
}
