//! Slicing of sub-documents embedded in a file.

use super::{Error, Result};

const PREFIX_WIDTH: usize = 2;

fn read_u16(buffer: &[u8], pos: usize) -> Result<usize> {
    match buffer.get(pos..pos + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo]) as usize),
        _ => Err(Error::Truncated {
            needed: pos + 2,
            available: buffer.len(),
        }),
    }
}

/// Returns the document following a 2-octet big-endian length prefix.
///
/// Octets after the declared length are ignored.
pub fn slice_length_prefixed(buffer: &[u8]) -> Result<&[u8]> {
    let length = read_u16(buffer, 0)?;
    let available = buffer.len() - PREFIX_WIDTH;

    if length > available {
        return Err(Error::Truncated {
            needed: length,
            available,
        });
    }

    Ok(&buffer[PREFIX_WIDTH..PREFIX_WIDTH + length])
}

/// Returns `buffer[start..end]`, where `start` and `end` are 2-octet big-endian offsets
/// stored at `start_pos` and `end_pos` in the same buffer.
pub fn slice_offset_pair(buffer: &[u8], start_pos: usize, end_pos: usize) -> Result<&[u8]> {
    let start = read_u16(buffer, start_pos)?;
    let end = read_u16(buffer, end_pos)?;

    if end < start || end > buffer.len() {
        return Err(Error::InvalidOffsets {
            start,
            end,
            available: buffer.len(),
        });
    }

    Ok(&buffer[start..end])
}
