//! Decoders for the payloads read from the card.
//!
//! All of them are stateless and work on borrowed octets. Structural problems are
//! reported as [`Error`] rather than producing a partially filled record.

mod bcd;
mod frame;
mod gdo;
mod status;

pub use self::bcd::{decode_bcd_digits, decode_bcd_version, INVALID_VERSION};
pub use self::frame::{slice_length_prefixed, slice_offset_pair};
pub use self::gdo::{decode_gdo, decode_iccsn, Iccsn};
pub use self::status::{decode_status_record, StatusRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Invalid length: expected {expected} octets, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Bad tag ({0:#04x})")]
    BadTag(u8),

    #[error("Invalid TLV length ({0:#04x})")]
    BadTlvLength(u8),

    #[error("Invalid BCD digits")]
    InvalidBcd,

    #[error("Data too short: {needed} octets needed, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("Invalid start/end offset {start}/{end} (avail {available})")]
    InvalidOffsets {
        start: usize,
        end: usize,
        available: usize,
    },

    #[error("Malformed DER value: {0}")]
    Asn1(#[from] ::der::Error),

    #[error("Non-zero trailing octet at {0}")]
    NonZeroPadding(usize),
}

pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn ensure_length(raw: &[u8], expected: usize) -> Result<()> {
    match raw.len() == expected {
        true => Ok(()),
        _ => Err(Error::InvalidLength {
            expected,
            actual: raw.len(),
        }),
    }
}
