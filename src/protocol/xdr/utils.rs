use std::io::{Read, Write};

use super::Result;

pub const ALIGNMENT: usize = 4;

fn padding_len(src_len: usize) -> usize {
    (ALIGNMENT - (src_len % ALIGNMENT)) % ALIGNMENT
}

pub fn read_padding(src_len: usize, src: &mut impl Read) -> Result<()> {
    let pad_len = padding_len(src_len);
    if pad_len > 0 {
        let mut padding_buffer: [u8; ALIGNMENT] = Default::default();
        src.read_exact(&mut padding_buffer[..pad_len])?;
    }
    Ok(())
}

pub fn write_padding(src_len: usize, dest: &mut impl Write) -> Result<()> {
    let pad_len = padding_len(src_len);
    if pad_len > 0 {
        let padding_buffer: [u8; ALIGNMENT] = Default::default();
        dest.write_all(&padding_buffer[..pad_len])?;
    }
    Ok(())
}

/// Reads exactly `length` bytes plus alignment padding.
///
/// The buffer grows only as data actually arrives, so a hostile length
/// prefix on a short message fails with a truncation error instead of
/// reserving the announced amount up front.
pub fn read_opaque(length: usize, src: &mut impl Read) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let read = src.by_ref().take(length as u64).read_to_end(&mut buf)?;
    if read != length {
        return Err(super::Error::TruncatedMessage);
    }
    read_padding(length, src)?;
    Ok(buf)
}
