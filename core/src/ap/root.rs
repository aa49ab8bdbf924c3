//! Master File: card identification and the CA / card-verifiable certificates.

use std::rc::Rc;

use crate::ap::{open, Error};
use crate::apdu::{Le, MAX_EXTENDED};
use crate::card;
use crate::decode::{decode_bcd_version, decode_gdo, Iccsn};
use crate::transport::CardTransport;
use crate::Card;

pub const AID: [u8; 7] = [0xD2, 0x76, 0x00, 0x01, 0x44, 0x80, 0x00];

const EF_ATR: u8 = 0x1D;
const EF_DIR: u8 = 0x1E;
const EF_GDO: u8 = 0x02;
const EF_VERSION: u8 = 0x10;

/// Records in EF.DIR, one per application.
pub const DIR_RECORDS: std::ops::RangeInclusive<u8> = 1..=10;

/// Records in EF.Version.
pub const VERSION_RECORDS: std::ops::RangeInclusive<u8> = 1..=4;

/// Type of the certificate to fetch
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CertType {
    /// X.509 certificate of the CA that issued the card certificates, RSA 2048
    CaEgkCsR2048,
    CaEgkCsE256,
    CaEgkCsE384,

    /// Card-verifiable certificate for card-to-card authentication, RSA 2048
    EgkAutCvcR2048,
    EgkAutCvcE256,
    EgkAutCvcE384,
}

impl CertType {
    pub const ALL: [Self; 6] = [
        Self::CaEgkCsR2048,
        Self::CaEgkCsE256,
        Self::CaEgkCsE384,
        Self::EgkAutCvcR2048,
        Self::EgkAutCvcE256,
        Self::EgkAutCvcE384,
    ];

    /// Converts the variant into the short file identifier of its EF.
    pub fn into_sfid(self) -> u8 {
        match self {
            Self::CaEgkCsR2048 => 0x04,
            Self::CaEgkCsE256 => 0x07,
            Self::CaEgkCsE384 => 0x0D,
            Self::EgkAutCvcR2048 => 0x03,
            Self::EgkAutCvcE256 => 0x06,
            Self::EgkAutCvcE384 => 0x0C,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::CaEgkCsR2048 => "EF.C.CA_eGK.CS.R2048",
            Self::CaEgkCsE256 => "EF.C.CA_eGK.CS.E256",
            Self::CaEgkCsE384 => "EF.C.CA_eGK.CS.E384",
            Self::EgkAutCvcR2048 => "EF.C.eGK.AUT_CVC.R2048",
            Self::EgkAutCvcE256 => "EF.C.eGK.AUT_CVC.E256",
            Self::EgkAutCvcE384 => "EF.C.eGK.AUT_CVC.E384",
        }
    }
}

pub struct RootAp<T>
where
    T: CardTransport,
{
    card: Rc<Card<T>>,
}

impl<T> RootAp<T>
where
    T: CardTransport,
{
    open!("MF", AID);

    /// Reads EF.ATR, the answer-to-reset bytes together with the card's buffer sizes.
    pub fn read_atr(&self) -> card::Result<Vec<u8>> {
        self.card.read_binary_sfid(EF_ATR, 0, Le::Wildcard)
    }

    /// Reads one application template from EF.DIR.
    pub fn read_dir_record(&self, index: u8) -> card::Result<Vec<u8>> {
        self.card.read_record_sfid(EF_DIR, index, Le::Wildcard)
    }

    pub fn read_gdo_raw(&self) -> card::Result<Vec<u8>> {
        self.card.read_binary_sfid(EF_GDO, 0, Le::Wildcard)
    }

    /// Reads the card serial number from EF.GDO.
    pub fn read_gdo(&self) -> Result<Iccsn, Error> {
        let raw = self.read_gdo_raw()?;

        Ok(decode_gdo(&raw)?)
    }

    pub fn read_version_raw(&self, index: u8) -> card::Result<Vec<u8>> {
        self.card.read_record_sfid(EF_VERSION, index, Le::Wildcard)
    }

    /// Reads a record of EF.Version as `major.minor.patch`.
    pub fn read_version(&self, index: u8) -> card::Result<String> {
        self.read_version_raw(index)
            .map(|raw| decode_bcd_version(&raw))
    }

    /// Reads a certificate as stored on the card, zero fill included.
    pub fn read_certificate(&self, ty: CertType) -> card::Result<Vec<u8>> {
        self.card
            .read_binary_sfid(ty.into_sfid(), 0, Le::Exact(MAX_EXTENDED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::transport::tests::ScriptedTransport;

    fn open(transport: ScriptedTransport) -> RootAp<ScriptedTransport> {
        RootAp::open(Rc::new(Card::new(transport))).unwrap()
    }

    #[test]
    fn test_open_selects_mf() {
        let root = open(ScriptedTransport::selected());

        assert_eq!(
            vec![vec![0x00, 0xA4, 0x04, 0x0C, 0x07, 0xD2, 0x76, 0x00, 0x01, 0x44, 0x80, 0x00]],
            root.card.transport().sent(),
        );
    }

    #[test]
    fn test_open_fails() {
        let card = Rc::new(Card::new(ScriptedTransport::new().respond(&[], 0x6A82)));

        assert!(RootAp::open(card).is_err());
    }

    #[test]
    fn test_read_gdo() {
        let root = open(ScriptedTransport::selected().respond(
            &[0x5A, 0x0A, 0x80, 0x27, 0x60, 0x01, 0x23, 0x45, 0x67, 0x89, 0x01, 0x23],
            0x9000,
        ));

        let sn = root.read_gdo().unwrap();
        assert_eq!(276, sn.country_code);
        assert_eq!(
            vec![0x00, 0xB0, 0x82, 0x00, 0x00],
            root.card.transport().sent()[1]
        );
    }

    #[test]
    fn test_read_gdo_malformed() {
        let root = open(ScriptedTransport::selected().respond(&[0x5A, 0x0A, 0x80], 0x9000));

        assert!(matches!(
            root.read_gdo(),
            Err(Error::Format(decode::Error::InvalidLength { .. }))
        ));
    }

    #[test]
    fn test_read_version_records() {
        let root = open(
            ScriptedTransport::selected()
                .respond(&[0x00, 0x40, 0x00, 0x00, 0x00], 0x9000)
                .respond(&[], 0x6A83),
        );

        assert_eq!("4.0.0", root.read_version(1).unwrap());
        assert!(root.read_version(2).is_err());
        assert_eq!(
            vec![0x00, 0xB2, 0x01, 0x84, 0x00],
            root.card.transport().sent()[1]
        );
    }

    #[test]
    fn test_read_certificate_extended() {
        let root = open(ScriptedTransport::selected().respond(&[0x30, 0x00], 0x9000));

        root.read_certificate(CertType::CaEgkCsE256).unwrap();
        assert_eq!(
            vec![0x00, 0xB0, 0x87, 0x00, 0x00, 0x00, 0x00],
            root.card.transport().sent()[1]
        );
    }
}
