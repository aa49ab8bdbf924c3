use std::fmt::{Display, Formatter};

use super::{decode_bcd_digits, ensure_length, Error, Result};

const GDO_TAG_ICCSN: u8 = 0x5A;
const ICCSN_LENGTH: usize = 10;

/// Card serial number (ICCSN) as defined by ISO/IEC 7812-1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Iccsn {
    pub major_industry_identifier: u8,
    /// Three digits, e.g. `276` for Germany.
    pub country_code: u16,
    /// Five digits.
    pub issuer_identifier: u32,
    /// Ten digits.
    pub serial_number: u64,
}

impl Display for Iccsn {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02X}{:03}{:05}{:010}",
            self.major_industry_identifier,
            self.country_code,
            self.issuer_identifier,
            self.serial_number
        )
    }
}

impl TryFrom<&[u8]> for Iccsn {
    type Error = Error;

    fn try_from(raw: &[u8]) -> Result<Self> {
        decode_iccsn(raw)
    }
}

/// Decodes the 10-octet ICCSN: the MII octet followed by 18 BCD digits.
pub fn decode_iccsn(raw: &[u8]) -> Result<Iccsn> {
    ensure_length(raw, ICCSN_LENGTH)?;

    let x = decode_bcd_digits(&raw[1..]).ok_or(Error::InvalidBcd)?;

    Ok(Iccsn {
        major_industry_identifier: raw[0],
        country_code: (x / 1_000_000_000_000_000) as u16,
        issuer_identifier: ((x / 10_000_000_000) % 100_000) as u32,
        serial_number: x % 10_000_000_000,
    })
}

/// Decodes EF.GDO, a single `5A 0A` TLV wrapping the ICCSN.
pub fn decode_gdo(raw: &[u8]) -> Result<Iccsn> {
    ensure_length(raw, 2 + ICCSN_LENGTH)?;

    if raw[0] != GDO_TAG_ICCSN {
        return Err(Error::BadTag(raw[0]));
    }
    if raw[1] as usize != ICCSN_LENGTH {
        return Err(Error::BadTlvLength(raw[1]));
    }

    decode_iccsn(&raw[2..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const ICCSN: [u8; 10] = [0x80, 0x27, 0x60, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23];

    #[test]
    fn test_iccsn() {
        assert_eq!(
            Iccsn {
                major_industry_identifier: 0x80,
                country_code: 276,
                issuer_identifier: 123,
                serial_number: 4_567_890_123,
            },
            decode_iccsn(&ICCSN).unwrap(),
        );
    }

    #[test]
    fn test_iccsn_field_boundaries() {
        // 999 / 99999 / 0000000001
        let raw = [0x80, 0x99, 0x99, 0x99, 0x99, 0x00, 0x00, 0x00, 0x00, 0x01];
        let sn = decode_iccsn(&raw).unwrap();

        assert_eq!(999, sn.country_code);
        assert_eq!(99_999, sn.issuer_identifier);
        assert_eq!(1, sn.serial_number);
    }

    #[test]
    fn test_iccsn_display() {
        assert_eq!(
            "80276001234567890123",
            decode_iccsn(&ICCSN).unwrap().to_string()
        );
    }

    #[test]
    fn test_iccsn_invalid() {
        assert_eq!(
            Err(Error::InvalidLength {
                expected: 10,
                actual: 9
            }),
            decode_iccsn(&ICCSN[..9]),
        );

        let mut raw = ICCSN;
        raw[4] = 0x2F;
        assert_eq!(Err(Error::InvalidBcd), decode_iccsn(&raw));
    }

    #[test]
    fn test_gdo() {
        let mut raw = vec![0x5A, 0x0A];
        raw.extend_from_slice(&ICCSN);

        assert_eq!(276, decode_gdo(&raw).unwrap().country_code);
    }

    #[test]
    fn test_gdo_bad_tag() {
        let mut raw = vec![0x4F, 0x0A];
        raw.extend_from_slice(&ICCSN);

        let err = decode_gdo(&raw).unwrap_err();
        assert_eq!(Error::BadTag(0x4F), err);
        assert_eq!("Bad tag (0x4f)", err.to_string());
    }

    #[test]
    fn test_gdo_bad_length() {
        let mut raw = vec![0x5A, 0x0B];
        raw.extend_from_slice(&ICCSN);

        assert_eq!(Err(Error::BadTlvLength(0x0B)), decode_gdo(&raw));
        assert!(matches!(
            decode_gdo(&raw[..11]),
            Err(Error::InvalidLength { .. })
        ));
    }
}
