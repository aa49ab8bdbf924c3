//! eSign AP: the cardholder's X.509 certificates for authentication and encryption.

use std::rc::Rc;

use crate::ap::{open, Error};
use crate::card;
use crate::der::extract_certificate;
use crate::transport::CardTransport;
use crate::Card;

pub const AID: [u8; 10] = [0xA0, 0x00, 0x00, 0x01, 0x67, 0x45, 0x53, 0x49, 0x47, 0x4E];

/// Type of the certificate to fetch
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CertType {
    /// Certificate for authentication (EF.C.CH.AUT.R2048)
    Auth,

    /// Certificate for encryption (EF.C.CH.ENC.R2048)
    Enc,
}

impl CertType {
    pub const ALL: [Self; 2] = [Self::Auth, Self::Enc];

    /// Converts the variant into the short file identifier of its EF.
    pub fn into_sfid(self) -> u8 {
        match self {
            Self::Auth => 0x01,
            Self::Enc => 0x02,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Auth => "EF.C.CH.AUT",
            Self::Enc => "EF.C.CH.ENC",
        }
    }
}

pub struct EsignAp<T>
where
    T: CardTransport,
{
    card: Rc<Card<T>>,
}

impl<T> EsignAp<T>
where
    T: CardTransport,
{
    open!("eSign", AID);

    /// Reads the whole certificate file, zero fill included.
    pub fn read_certificate_raw(&self, ty: CertType) -> card::Result<Vec<u8>> {
        self.card.read_full(ty.into_sfid())
    }

    /// Reads the certificate from the card as DER-encoded ASN.1 data.
    pub fn read_certificate(&self, ty: CertType) -> Result<Vec<u8>, Error> {
        let raw = self.read_certificate_raw(ty)?;

        Ok(extract_certificate(&raw)?.to_vec())
    }
}
