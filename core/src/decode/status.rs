use super::{decode_bcd_version, ensure_length, Error, Result};

const STATUS_RECORD_LENGTH: usize = 25;

/// Contents of EF.StatusVD: whether an update of the insurance data is in progress.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusRecord {
    /// `0` when no transaction is open, `1` while an update is in progress.
    pub status: String,
    /// `YYYYMMDDhhmmss`
    pub timestamp: String,
    pub version: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing))]
    pub reserved: [u8; 5],
}

impl TryFrom<&[u8]> for StatusRecord {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self> {
        decode_status_record(raw)
    }
}

pub fn decode_status_record(raw: &[u8]) -> Result<StatusRecord> {
    ensure_length(raw, STATUS_RECORD_LENGTH)?;

    let mut reserved = [0u8; 5];
    reserved.copy_from_slice(&raw[20..25]);

    Ok(StatusRecord {
        status: String::from_utf8_lossy(&raw[0..1]).into_owned(),
        timestamp: String::from_utf8_lossy(&raw[1..15]).into_owned(),
        version: decode_bcd_version(&raw[15..20]),
        reserved,
    })
}
