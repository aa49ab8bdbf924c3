/// Returned by [`decode_bcd_version`] for anything that is not a 5-octet BCD value.
pub const INVALID_VERSION: &str = "<invalid>";

/// Decodes packed BCD, two digits per octet with the high nibble first.
///
/// Returns `None` if a nibble is above 9 or the value does not fit 64 bits.
pub fn decode_bcd_digits(raw: &[u8]) -> Option<u64> {
    raw.iter().try_fold(0u64, |x, &b| {
        let (hi, lo) = (b >> 4, b & 0x0F);
        if hi > 9 || lo > 9 {
            return None;
        }

        x.checked_mul(100)?.checked_add(u64::from(hi * 10 + lo))
    })
}

/// Decodes a 10-digit BCD version as `major.minor.patch` (3, 3 and 4 digits).
pub fn decode_bcd_version(raw: &[u8]) -> String {
    match raw.len() {
        5 => decode_bcd_digits(raw).map_or_else(
            || INVALID_VERSION.to_owned(),
            |x| format!("{}.{}.{}", x / 10_000_000, (x / 10_000) % 1000, x % 10_000),
        ),
        _ => INVALID_VERSION.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits() {
        assert_eq!(Some(0), decode_bcd_digits(&[]));
        assert_eq!(Some(1234), decode_bcd_digits(&[0x12, 0x34]));
        assert_eq!(Some(907), decode_bcd_digits(&[0x09, 0x07]));
    }

    #[test]
    fn test_digits_invalid_nibble() {
        assert_eq!(None, decode_bcd_digits(&[0x1A]));
        assert_eq!(None, decode_bcd_digits(&[0xF1]));
    }

    #[test]
    fn test_digits_overflow() {
        let mut raw = [0x99; 10];
        raw[0] = 0x09;
        assert_eq!(Some(9_999_999_999_999_999_999), decode_bcd_digits(&raw));
        assert_eq!(None, decode_bcd_digits(&[0x99; 10]));
    }

    #[test]
    fn test_version() {
        assert_eq!(
            "10.203.405",
            decode_bcd_version(&[0x01, 0x02, 0x03, 0x04, 0x05])
        );
        assert_eq!("4.0.0", decode_bcd_version(&[0x00, 0x40, 0x00, 0x00, 0x00]));
        assert_eq!("3.0.3", decode_bcd_version(&[0x00, 0x30, 0x00, 0x00, 0x03]));
    }

    #[test]
    fn test_version_invalid() {
        assert_eq!(
            INVALID_VERSION,
            decode_bcd_version(&[0x00, 0x40, 0x0F, 0x00, 0x00])
        );
        assert_eq!(INVALID_VERSION, decode_bcd_version(&[0x00, 0x40, 0x00, 0x00]));
        assert_eq!(INVALID_VERSION, decode_bcd_version(&[]));
    }
}
