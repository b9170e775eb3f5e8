//! Root container for a complete MP4/MOV file
//!
//! The root is not itself a box: it owns the sequence of top-level boxes
//! and knows which of them are `moov`, `ftyp`, `free` and the first `mdat`.
//! It drives the load → mutate → save lifecycle. A root is consumed exactly
//! once by [`Mpeg4Container::save`]; re-saving requires a fresh load.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::console::Console;
use crate::error::{SpatialError, SpatialResult};
use crate::mpeg::boxes::Mp4Box;
use crate::mpeg::constants::{TAG_FREE, TAG_FTYP, TAG_MDAT, TAG_MOOV};
use crate::mpeg::loader;

/// A loaded MP4/MOV file structure.
#[derive(Debug)]
pub struct Mpeg4Container {
    pub contents: Vec<Mp4Box>,
    pub content_size: u64,
    moov_index: usize,
    ftyp_index: Option<usize>,
    free_index: Option<usize>,
    first_mdat_index: usize,
    /// Absolute offset of the first media-data byte in the source file.
    first_mdat_position: u64,
}

impl Mpeg4Container {
    /// Load the complete file structure from a byte stream.
    ///
    /// Rejects files without exactly one `moov` or without at least one
    /// `mdat`.
    pub fn load<R: Read + Seek>(reader: &mut R) -> SpatialResult<Self> {
        let size = reader.seek(SeekFrom::End(0))?;
        let contents = loader::load_children(reader, 0, size)?;

        let mut moov_index = None;
        let mut ftyp_index = None;
        let mut free_index = None;
        let mut first_mdat_index = None;
        for (i, element) in contents.iter().enumerate() {
            if element.tag == TAG_MOOV {
                if moov_index.is_some() {
                    return Err(SpatialError::DuplicateMoov);
                }
                moov_index = Some(i);
            }
            if element.tag == TAG_FREE && free_index.is_none() {
                free_index = Some(i);
            }
            if element.tag == TAG_MDAT && first_mdat_index.is_none() {
                first_mdat_index = Some(i);
            }
            if element.tag == TAG_FTYP && ftyp_index.is_none() {
                ftyp_index = Some(i);
            }
        }

        let moov_index = moov_index.ok_or(SpatialError::MissingMoov)?;
        let first_mdat_index = first_mdat_index.ok_or(SpatialError::MissingMdat)?;
        let first_mdat_position = contents[first_mdat_index].content_start();

        let content_size = contents.iter().map(Mp4Box::size).sum();

        Ok(Mpeg4Container {
            contents,
            content_size,
            moov_index,
            ftyp_index,
            free_index,
            first_mdat_index,
            first_mdat_position,
        })
    }

    pub fn moov(&self) -> &Mp4Box {
        &self.contents[self.moov_index]
    }

    pub fn moov_mut(&mut self) -> &mut Mp4Box {
        &mut self.contents[self.moov_index]
    }

    pub fn ftyp(&self) -> Option<&Mp4Box> {
        self.ftyp_index.map(|i| &self.contents[i])
    }

    pub fn free(&self) -> Option<&Mp4Box> {
        self.free_index.map(|i| &self.contents[i])
    }

    pub fn first_mdat(&self) -> &Mp4Box {
        &self.contents[self.first_mdat_index]
    }

    /// Mpeg4 files do not merge.
    pub fn merge(&mut self, _element: Mpeg4Container) -> SpatialResult<()> {
        Err(SpatialError::CannotMergeRoot)
    }

    /// Recompute every box size bottom-up.
    pub fn resize(&mut self) {
        self.content_size = 0;
        for element in &mut self.contents {
            element.resize();
            self.content_size += element.size();
        }
    }

    /// Print the file structure through the line sink.
    pub fn print_structure(&self, console: &mut dyn Console) {
        console.log(&format!("mpeg4 [ {} ]", self.content_size));
        let count = self.contents.len();
        for (i, element) in self.contents.iter().enumerate() {
            let indent = if i == count - 1 { " └──" } else { " ├──" };
            element.print_structure(indent, console);
        }
    }

    /// Stream the whole tree to `writer`, patching chunk-offset tables.
    ///
    /// Consumes the container: sizes are finalized, the constant byte delta
    /// is derived from how far the first `mdat` payload moved, and every
    /// top-level box is saved with it. A layout whose `mdat` boxes would
    /// move by different amounts is refused outright; a single uniform
    /// delta would silently corrupt some of its chunk offsets.
    pub fn save<R: Read + Seek, W: Write>(
        mut self,
        reader: &mut R,
        writer: &mut W,
    ) -> SpatialResult<()> {
        self.resize();

        let mut new_position = 0u64;
        let mut mdat_deltas = Vec::new();
        for element in &self.contents {
            if element.tag == TAG_MDAT {
                let new_content_start = new_position + element.header_size;
                mdat_deltas.push(new_content_start as i64 - element.content_start() as i64);
            }
            new_position += element.size();
        }

        // Load guarantees at least one mdat.
        let delta = mdat_deltas[0];
        debug_assert_eq!(
            delta,
            (self.contents[self.first_mdat_index].header_size
                + self.contents[..self.first_mdat_index]
                    .iter()
                    .map(Mp4Box::size)
                    .sum::<u64>()) as i64
                - self.first_mdat_position as i64
        );
        if mdat_deltas.iter().any(|d| *d != delta) {
            return Err(SpatialError::InterleavedMdat);
        }

        for element in &self.contents {
            element.save(reader, writer, delta)?;
        }
        Ok(())
    }
}
