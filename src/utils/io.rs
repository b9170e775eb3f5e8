//! Bounded big-endian reads and chunked stream copies
//!
//! Small helpers shared by the box loader, the specialized box codecs and
//! the save path. All multi-byte integers in an ISO base media file are
//! big-endian.

use std::io::{Read, Write};

/// Read a single byte.
pub fn read_u8<R: Read>(reader: &mut R) -> std::io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a big-endian unsigned 16-bit integer.
pub fn read_u16<R: Read>(reader: &mut R) -> std::io::Result<u16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(u16::from_be_bytes(buf))
}

/// Read a big-endian signed 16-bit integer.
pub fn read_i16<R: Read>(reader: &mut R) -> std::io::Result<i16> {
    let mut buf = [0u8; 2];
    reader.read_exact(&mut buf)?;
    Ok(i16::from_be_bytes(buf))
}

/// Read a big-endian unsigned 32-bit integer.
pub fn read_u32<R: Read>(reader: &mut R) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_be_bytes(buf))
}

/// Read a big-endian signed 32-bit integer.
pub fn read_i32<R: Read>(reader: &mut R) -> std::io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Read a big-endian unsigned 64-bit integer.
pub fn read_u64<R: Read>(reader: &mut R) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

/// Read a 4-byte box type tag.
pub fn read_tag<R: Read>(reader: &mut R) -> std::io::Result<[u8; 4]> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(buf)
}

/// Copy exactly `size` bytes from `reader` to `writer`.
///
/// Media payloads can be many gigabytes; copying proceeds in 64 MiB blocks
/// so peak memory stays independent of file size.
pub fn copy_exact<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    size: u64,
) -> std::io::Result<()> {
    const BLOCK_SIZE: u64 = 64 * 1024 * 1024;

    let mut remaining = size;
    let mut buf = vec![0u8; remaining.min(BLOCK_SIZE) as usize];
    while remaining > 0 {
        let chunk = remaining.min(BLOCK_SIZE) as usize;
        reader.read_exact(&mut buf[..chunk])?;
        writer.write_all(&buf[..chunk])?;
        remaining -= chunk as u64;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_integers() {
        let data = [0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07];
        let mut reader = Cursor::new(data);
        assert_eq!(read_u16(&mut reader).unwrap(), 0x0001);
        assert_eq!(read_u32(&mut reader).unwrap(), 0x0203_0405);
        assert_eq!(read_u8(&mut reader).unwrap(), 0x06);
    }

    #[test]
    fn test_read_u64() {
        let data = 0x1122_3344_5566_7788u64.to_be_bytes();
        let mut reader = Cursor::new(data);
        assert_eq!(read_u64(&mut reader).unwrap(), 0x1122_3344_5566_7788);
    }

    #[test]
    fn test_read_tag() {
        let mut reader = Cursor::new(*b"moov");
        assert_eq!(read_tag(&mut reader).unwrap(), *b"moov");
    }

    #[test]
    fn test_copy_exact() {
        let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
        let mut reader = Cursor::new(data.clone());
        let mut out = Vec::new();
        copy_exact(&mut reader, &mut out, 1000).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_copy_exact_short_input() {
        let mut reader = Cursor::new(vec![0u8; 10]);
        let mut out = Vec::new();
        assert!(copy_exact(&mut reader, &mut out, 20).is_err());
    }
}
