//! Insurance master data (Versichertenstammdaten) of the HCA.
//! Can be enabled by turning `vsd` feature on.
//!
//! EF.PD and EF.VD carry gzip compressed XML documents, usually encoded in ISO-8859-15.
//! [`Pd`], [`Vd`] and [`Gvd`] are decoded from the compressed blobs returned by
//! [`HcaAp`](crate::ap::HcaAp). Elements missing from a document are left empty.

use std::io::Read;

use encoding_rs::{Encoding, UTF_8};
use flate2::read::GzDecoder;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not decompress the document: {0}")]
    Gzip(#[from] std::io::Error),

    #[error("Unknown character encoding: {0}")]
    Encoding(String),

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Unexpected document structure: {0}")]
    Structure(#[from] quick_xml::DeError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Decompresses `raw` and deserialises the XML document in it.
pub fn decode_gzipped_xml<T>(raw: &[u8]) -> Result<T>
where
    T: DeserializeOwned,
{
    let mut xml = Vec::new();
    GzDecoder::new(raw).read_to_end(&mut xml)?;

    Ok(quick_xml::de::from_str(&to_utf8(&xml)?)?)
}

/// Transcodes the document as its XML declaration says, UTF-8 when it says nothing.
fn to_utf8(xml: &[u8]) -> Result<String> {
    let encoding = match Reader::from_reader(xml).read_event()? {
        Event::Decl(decl) => match decl.encoding() {
            Some(label) => {
                let label = label.map_err(quick_xml::Error::from)?;
                Encoding::for_label(&label).ok_or_else(|| {
                    Error::Encoding(String::from_utf8_lossy(&label).into_owned())
                })?
            }
            None => UTF_8,
        },
        _ => UTF_8,
    };

    let (text, _, _) = encoding.decode(xml);
    Ok(text.into_owned())
}

macro_rules! gzipped_xml {
    ($ty: ty) => {
        impl TryFrom<&[u8]> for $ty {
            type Error = Error;

            fn try_from(raw: &[u8]) -> Result<Self> {
                decode_gzipped_xml(raw)
            }
        }
    };
}

/// Personal data of the insured person (EF.PD).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pd {
    #[serde(rename(deserialize = "@CDM_VERSION"))]
    pub cdm_version: String,
    #[serde(rename(deserialize = "Versicherter"))]
    pub insured: InsuredPerson,
}

gzipped_xml!(Pd);

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsuredPerson {
    #[serde(rename(deserialize = "Versicherten_ID"))]
    pub insurant_id: String,
    #[serde(rename(deserialize = "Person"))]
    pub person: Person,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// `YYYYMMDD`
    #[serde(rename(deserialize = "Geburtsdatum"))]
    pub birth_date: String,
    #[serde(rename(deserialize = "Vorname"))]
    pub given_name: String,
    #[serde(rename(deserialize = "Nachname"))]
    pub family_name: String,
    #[serde(rename(deserialize = "Geschlecht"))]
    pub sex: String,
    #[serde(rename(deserialize = "Vorsatzwort"))]
    pub name_prefix: String,
    #[serde(rename(deserialize = "Namenszusatz"))]
    pub name_suffix: String,
    #[serde(rename(deserialize = "Titel"))]
    pub title: String,
    #[serde(rename(deserialize = "PostfachAdresse"))]
    pub post_box_address: Address,
    #[serde(rename(deserialize = "StrassenAdresse"))]
    pub street_address: Address,
}

/// A postal address; the street fields stay empty for a post box.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    #[serde(rename(deserialize = "Postleitzahl"))]
    pub postal_code: String,
    #[serde(rename(deserialize = "Ort"))]
    pub city: String,
    #[serde(rename(deserialize = "Postfach"))]
    pub post_box: String,
    #[serde(rename(deserialize = "Land"))]
    pub country: Country,
    #[serde(rename(deserialize = "Strasse"))]
    pub street: String,
    #[serde(rename(deserialize = "Hausnummer"))]
    pub house_number: String,
    #[serde(rename(deserialize = "Anschriftenzusatz"))]
    pub supplement: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Country {
    #[serde(rename(deserialize = "Wohnsitzlaendercode"))]
    pub code: String,
}

/// Insurance data (the VD part of EF.VD).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vd {
    #[serde(rename(deserialize = "@CDM_VERSION"))]
    pub cdm_version: String,
    #[serde(rename(deserialize = "Versicherter"))]
    pub insured: Insurance,
}

gzipped_xml!(Vd);

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insurance {
    #[serde(rename(deserialize = "Versicherungsschutz"))]
    pub coverage: Coverage,
    #[serde(rename(deserialize = "Zusatzinfos"))]
    pub additional: AdditionalInfo,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Coverage {
    #[serde(rename(deserialize = "Beginn"))]
    pub start: String,
    #[serde(rename(deserialize = "Ende"))]
    pub end: String,
    #[serde(rename(deserialize = "Kostentraeger"))]
    pub cost_bearer: CostBearer,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostBearer {
    #[serde(rename(deserialize = "Kostentraegerkennung"))]
    pub id: String,
    #[serde(rename(deserialize = "Kostentraegerlaendercode"))]
    pub country_code: String,
    #[serde(rename(deserialize = "Name"))]
    pub name: String,
    #[serde(rename(deserialize = "AbrechnenderKostentraeger"))]
    pub billing: BillingCostBearer,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingCostBearer {
    #[serde(rename(deserialize = "Kostentraegerkennung"))]
    pub id: String,
    #[serde(rename(deserialize = "Name"))]
    pub name: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalInfo {
    #[serde(rename(deserialize = "ZusatzinfosGKV"))]
    pub statutory: StatutoryInfo,
    #[serde(rename(deserialize = "ZusatzinfosPKV"))]
    pub private: PrivateInfo,
}

/// Statutory health insurance (GKV).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatutoryInfo {
    #[serde(rename(deserialize = "Rechtskreis"))]
    pub legal_area: String,
    #[serde(rename(deserialize = "Versichertenart"))]
    pub insurant_type: String,
    #[serde(rename(deserialize = "Versichertenstatus_RSA"))]
    pub rsa_status: String,
    #[serde(rename(deserialize = "Zusatzinfos_Abrechnung_GKV"))]
    pub billing: StatutoryBilling,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatutoryBilling {
    #[serde(rename(deserialize = "Kostenerstattung_ambulant"))]
    pub outpatient_reimbursement: String,
    #[serde(rename(deserialize = "Kostenerstattung_stationaer"))]
    pub inpatient_reimbursement: String,
    #[serde(rename(deserialize = "WOP"))]
    pub wop: String,
}

/// Private health insurance (PKV).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivateInfo {
    #[serde(rename(deserialize = "PKV_Verbandstarif"))]
    pub association_tariff: String,
    #[serde(rename(deserialize = "Beihilfeberechtigung"))]
    pub allowance: Allowance,
    #[serde(rename(deserialize = "StationaereLeistungen"))]
    pub inpatient: InpatientBenefits,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Allowance {
    #[serde(rename(deserialize = "Kennzeichnung"))]
    pub marking: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InpatientBenefits {
    #[serde(rename(deserialize = "Stationaere_Wahlleistung_Unterkunft"))]
    pub optional_accommodation: String,
    #[serde(rename(deserialize = "Prozentwert_Wahlleistung_Unterkunft"))]
    pub accommodation_percentage: String,
    #[serde(rename(deserialize = "HoechstsatzWahlleistungUnterkunft"))]
    pub accommodation_maximum_rate: String,
    #[serde(rename(deserialize = "Stationaere_Wahlleistung_aerztliche_Behandlung"))]
    pub optional_medical_treatment: String,
    #[serde(rename(deserialize = "Prozentwert_Wahlleistung_aerztliche_Behandlung"))]
    pub medical_treatment_percentage: String,
    #[serde(rename(deserialize = "Teilnahme_ClinicCard_Verfahren"))]
    pub clinic_card: String,
}

/// Protected insurance data (the GVD part of EF.VD).
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gvd {
    #[serde(rename(deserialize = "@CDM_VERSION"))]
    pub cdm_version: String,
    #[serde(rename(deserialize = "Zuzahlungsstatus"))]
    pub copayment: CopaymentStatus,
    #[serde(rename(deserialize = "Besondere_Personengruppe"))]
    pub special_group: String,
    #[serde(rename(deserialize = "DMP_Kennzeichnung"))]
    pub dmp_marking: String,
}

gzipped_xml!(Gvd);

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopaymentStatus {
    #[serde(rename(deserialize = "Status"))]
    pub status: String,
    #[serde(rename(deserialize = "Gueltig_bis"))]
    pub valid_until: String,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;

    fn gzip(xml: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(xml).unwrap();
        encoder.finish().unwrap()
    }

    const PD: &[u8] = b"<?xml version=\"1.0\" encoding=\"ISO-8859-15\" standalone=\"yes\"?>\
        <UC_PersoenlicheVersichertendatenXML CDM_VERSION=\"5.2.0\" \
        xmlns=\"http://ws.gematik.de/fa/vsdm/vsd/v5.2\">\
        <Versicherter><Versicherten_ID>X110411675</Versicherten_ID><Person>\
        <Geburtsdatum>19700101</Geburtsdatum><Vorname>J\xFCrgen</Vorname>\
        <Nachname>M\xFCller</Nachname><Geschlecht>M</Geschlecht><Titel/>\
        <StrassenAdresse><Postleitzahl>10117</Postleitzahl><Ort>Berlin</Ort>\
        <Land><Wohnsitzlaendercode>D</Wohnsitzlaendercode></Land>\
        <Strasse>Friedrichstra\xDFe</Strasse><Hausnummer>136</Hausnummer>\
        </StrassenAdresse></Person></Versicherter>\
        </UC_PersoenlicheVersichertendatenXML>";

    #[test]
    fn test_decode_pd() {
        let pd = Pd::try_from(&gzip(PD)[..]).unwrap();

        assert_eq!("5.2.0", pd.cdm_version);
        assert_eq!("X110411675", pd.insured.insurant_id);

        let person = &pd.insured.person;
        assert_eq!("19700101", person.birth_date);
        assert_eq!("J\u{FC}rgen", person.given_name);
        assert_eq!("M\u{FC}ller", person.family_name);
        assert_eq!("", person.title);
        assert_eq!("Friedrichstra\u{DF}e", person.street_address.street);
        assert_eq!("D", person.street_address.country.code);
        assert_eq!(Address::default(), person.post_box_address);
    }

    #[test]
    fn test_decode_vd() {
        let xml = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
            <UC_AllgemeineVersicherungsdatenXML CDM_VERSION=\"5.2.0\">\
            <Versicherter><Versicherungsschutz><Beginn>20200101</Beginn>\
            <Kostentraeger><Kostentraegerkennung>109500969</Kostentraegerkennung>\
            <Kostentraegerlaendercode>D</Kostentraegerlaendercode>\
            <Name>Test GKV-SV</Name></Kostentraeger></Versicherungsschutz>\
            <Zusatzinfos><ZusatzinfosGKV><Versichertenart>1</Versichertenart>\
            <Zusatzinfos_Abrechnung_GKV><WOP>72</WOP></Zusatzinfos_Abrechnung_GKV>\
            </ZusatzinfosGKV></Zusatzinfos></Versicherter>\
            </UC_AllgemeineVersicherungsdatenXML>";

        let vd = Vd::try_from(&gzip(xml)[..]).unwrap();
        assert_eq!("20200101", vd.insured.coverage.start);
        assert_eq!("", vd.insured.coverage.end);
        assert_eq!("109500969", vd.insured.coverage.cost_bearer.id);
        assert_eq!("Test GKV-SV", vd.insured.coverage.cost_bearer.name);
        assert_eq!("1", vd.insured.additional.statutory.insurant_type);
        assert_eq!("72", vd.insured.additional.statutory.billing.wop);
    }

    #[test]
    fn test_decode_gvd_without_declaration() {
        let xml = b"<UC_GeschuetzteVersichertendatenXML CDM_VERSION=\"5.2.0\">\
            <Zuzahlungsstatus><Status>1</Status><Gueltig_bis>20241231</Gueltig_bis>\
            </Zuzahlungsstatus><Besondere_Personengruppe>00</Besondere_Personengruppe>\
            <DMP_Kennzeichnung>00</DMP_Kennzeichnung></UC_GeschuetzteVersichertendatenXML>";

        assert_eq!(
            Gvd {
                cdm_version: "5.2.0".to_owned(),
                copayment: CopaymentStatus {
                    status: "1".to_owned(),
                    valid_until: "20241231".to_owned(),
                },
                special_group: "00".to_owned(),
                dmp_marking: "00".to_owned(),
            },
            Gvd::try_from(&gzip(xml)[..]).unwrap(),
        );
    }

    #[test]
    fn test_not_compressed() {
        assert!(matches!(Pd::try_from(PD), Err(Error::Gzip(_))));
    }

    #[test]
    fn test_unknown_encoding() {
        let xml = b"<?xml version=\"1.0\" encoding=\"X-NOT-A-CHARSET\"?><a/>";

        assert!(matches!(
            Gvd::try_from(&gzip(xml)[..]),
            Err(Error::Encoding(label)) if label == "X-NOT-A-CHARSET"
        ));
    }
}
