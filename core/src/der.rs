//! DER / ASN.1 support for certificates stored on the card.

use ::der::{AnyRef, Decode, Reader, SliceReader};

use crate::decode::{Error, Result};

/// Takes the single DER value at the start of `raw`, rejecting anything but zero fill after it.
pub fn extract_certificate(raw: &[u8]) -> Result<&[u8]> {
    let mut reader = SliceReader::new(raw)?;
    AnyRef::decode(&mut reader)?;

    let (value, fill) = raw.split_at(usize::try_from(reader.position())?);
    match fill.iter().position(|&b| b != 0) {
        Some(pos) => Err(Error::NonZeroPadding(value.len() + pos)),
        None => Ok(value),
    }
}
