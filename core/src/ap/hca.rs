//! Health Care Application: the insured person's master data.
//!
//! Personal and insurance data are stored as gzip-compressed XML documents. This module
//! only slices them out of their files; decompressing and parsing them is up to the caller.

use std::rc::Rc;

use crate::ap::{open, Error};
use crate::apdu::{Le, MAX_EXTENDED};
use crate::card;
use crate::decode::{decode_status_record, slice_length_prefixed, slice_offset_pair, StatusRecord};
use crate::transport::CardTransport;
use crate::Card;

pub const AID: [u8; 6] = [0xD2, 0x76, 0x00, 0x00, 0x01, 0x02];

const EF_PD: u8 = 0x01;
const EF_VD: u8 = 0x02;
const EF_STATUS_VD: u8 = 0x0C;

/// Positions of the start/end offset pairs at the head of EF.VD.
const VD_OFFSETS: (usize, usize) = (0, 2);
const GVD_OFFSETS: (usize, usize) = (4, 6);

/// The two documents held by EF.VD, still compressed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InsuranceData {
    /// Allgemeine Versicherungsdaten: insurance coverage and the insurer.
    pub vd: Vec<u8>,
    /// Geschützte Versicherungsdaten: co-payment status and special groups.
    pub gvd: Vec<u8>,
}

pub struct HcaAp<T>
where
    T: CardTransport,
{
    card: Rc<Card<T>>,
}

impl<T> HcaAp<T>
where
    T: CardTransport,
{
    open!("HCA", AID);

    pub fn read_status_raw(&self) -> card::Result<Vec<u8>> {
        self.card
            .read_binary_sfid(EF_STATUS_VD, 0, Le::Exact(MAX_EXTENDED))
    }

    /// Reads EF.StatusVD.
    pub fn read_status(&self) -> Result<StatusRecord, Error> {
        let raw = self.read_status_raw()?;

        Ok(decode_status_record(&raw)?)
    }

    pub fn read_personal_data_raw(&self) -> card::Result<Vec<u8>> {
        self.card.read_binary_sfid(EF_PD, 0, Le::Exact(MAX_EXTENDED))
    }

    /// Reads the compressed personal data document from EF.PD.
    pub fn read_personal_data(&self) -> Result<Vec<u8>, Error> {
        let raw = self.read_personal_data_raw()?;

        Ok(slice_length_prefixed(&raw)?.to_vec())
    }

    pub fn read_insurance_data_raw(&self) -> card::Result<Vec<u8>> {
        self.card.read_binary_sfid(EF_VD, 0, Le::Exact(MAX_EXTENDED))
    }

    /// Reads both compressed insurance documents from EF.VD.
    pub fn read_insurance_data(&self) -> Result<InsuranceData, Error> {
        let raw = self.read_insurance_data_raw()?;

        Ok(InsuranceData {
            vd: slice_offset_pair(&raw, VD_OFFSETS.0, VD_OFFSETS.1)?.to_vec(),
            gvd: slice_offset_pair(&raw, GVD_OFFSETS.0, GVD_OFFSETS.1)?.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode;
    use crate::transport::tests::ScriptedTransport;

    fn open(transport: ScriptedTransport) -> HcaAp<ScriptedTransport> {
        HcaAp::open(Rc::new(Card::new(transport))).unwrap()
    }

    #[test]
    fn test_read_status() {
        let mut raw = b"120240101000000".to_vec();
        raw.extend_from_slice(&[0x00, 0x50, 0x01, 0x00, 0x00, 0, 0, 0, 0, 0]);
        let hca = open(ScriptedTransport::selected().respond(&raw, 0x9000));

        let status = hca.read_status().unwrap();
        assert_eq!("1", status.status);
        assert_eq!("5.1.0", status.version);
        assert_eq!(
            vec![0x00, 0xB0, 0x8C, 0x00, 0x00, 0x00, 0x00],
            hca.card.transport().sent()[1]
        );
    }

    #[test]
    fn test_read_personal_data() {
        let hca = open(
            ScriptedTransport::selected().respond(&[0x00, 0x02, 0x1F, 0x8B, 0x00, 0x00, 0x00], 0x9000),
        );

        assert_eq!(vec![0x1F, 0x8B], hca.read_personal_data().unwrap());
    }

    #[test]
    fn test_read_personal_data_bad_length() {
        let hca = open(ScriptedTransport::selected().respond(&[0x01, 0x00, 0x1F, 0x8B], 0x9000));

        assert!(matches!(
            hca.read_personal_data(),
            Err(Error::Format(decode::Error::Truncated { .. }))
        ));
    }

    #[test]
    fn test_read_insurance_data() {
        let raw = [
            0x00, 0x08, 0x00, 0x0A, 0x00, 0x0A, 0x00, 0x0D, 0x1F, 0x8B, 0x1F, 0x8B, 0x08,
        ];
        let hca = open(ScriptedTransport::selected().respond(&raw, 0x9000));

        assert_eq!(
            InsuranceData {
                vd: vec![0x1F, 0x8B],
                gvd: vec![0x1F, 0x8B, 0x08],
            },
            hca.read_insurance_data().unwrap(),
        );
    }

    #[test]
    fn test_read_insurance_data_card_error() {
        let hca = open(ScriptedTransport::selected().respond(&[], 0x6982));

        assert!(matches!(
            hca.read_insurance_data(),
            Err(Error::Card(card::Error::Status(_)))
        ));
    }
}
