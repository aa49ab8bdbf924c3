use std::fmt::{Debug, Display};
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use egk::ap::{esign, hca, qes, root, EsignAp, HcaAp, QesAp, RootAp};
use egk::vsd::{Gvd, Pd, Vd};
use egk::{Card, CardTransport};
use serde::Serialize;
use tracing::info;
use x509_certificate::X509Certificate;

use crate::{Error, Result};

/// Where dumped records and files go.
pub(crate) struct Output {
    dir: Option<PathBuf>,
    json: bool,
}

impl Output {
    pub(crate) fn new(dir: Option<PathBuf>, json: bool) -> Result<Self> {
        if let Some(dir) = &dir {
            fs::create_dir_all(dir).map_err(|e| Error::Io(dir.clone(), e))?;
        }

        Ok(Self { dir, json })
    }

    fn record<T: Serialize + Debug>(&self, value: &T) -> Result<()> {
        match self.json {
            true => println!("\t{}", serde_json::to_string(value)?),
            _ => println!("\t{:?}", value),
        }

        Ok(())
    }

    fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            fs::write(&path, data).map_err(|e| Error::Io(path.clone(), e))?;
            info!("Saved {}", path.display());
        }

        Ok(())
    }
}

/// Prints the error of a single file and moves on to the next one.
fn report<V, E, F>(result: std::result::Result<V, E>, f: F) -> Result<()>
where
    E: Display,
    F: FnOnce(V) -> Result<()>,
{
    match result {
        Ok(v) => f(v),
        Err(e) => {
            println!("\terr: {}", e);
            Ok(())
        }
    }
}

pub(crate) fn dump_all<T: CardTransport>(card: Card<T>, output: &Output) -> Result<()> {
    let card = Rc::new(card);

    println!("selecting mf: {}...", hex::encode(root::AID));
    report(RootAp::open(Rc::clone(&card)), |ap| dump_root(&ap, output))?;

    println!("selecting hca: {}...", hex::encode(hca::AID));
    report(HcaAp::open(Rc::clone(&card)), |ap| dump_hca(&ap, output))?;

    println!("selecting qes: {}...", hex::encode(qes::AID));
    report(QesAp::open(Rc::clone(&card)), |_| {
        println!("\tok");
        Ok(())
    })?;

    println!("selecting esign: {}...", hex::encode(esign::AID));
    report(EsignAp::open(Rc::clone(&card)), |ap| dump_esign(&ap, output))
}

fn dump_root<T: CardTransport>(ap: &RootAp<T>, output: &Output) -> Result<()> {
    println!("mf/ef.atr");
    report(ap.read_atr(), |atr| {
        println!("\t{}", hex::encode(atr));
        Ok(())
    })?;

    println!("mf/ef.dir");
    for i in root::DIR_RECORDS {
        match ap.read_dir_record(i) {
            Ok(dir) => println!("\t[{}]: {}", i, hex::encode(dir)),
            Err(e) => println!("\t[{}] err: {}", i, e),
        }
    }

    println!("mf/ef.gdo");
    report(ap.read_gdo(), |sn| {
        println!("\t{}", sn);
        output.record(&sn)
    })?;

    println!("mf/ef.version");
    for i in root::VERSION_RECORDS {
        match ap.read_version_raw(i) {
            Ok(raw) => println!(
                "\t[{}]: {} // {:?}",
                i,
                hex::encode(&raw),
                egk::decode::decode_bcd_version(&raw)
            ),
            Err(e) => println!("\t[{}] err: {}", i, e),
        }
    }

    for ty in root::CertType::ALL {
        println!("mf/{}", ty.file_name().to_lowercase());
        report(ap.read_certificate(ty), |raw| {
            println!("\t{} octets: {}", raw.len(), hex::encode(&raw));
            output.save(&format!("{}.bin", ty.file_name()), &raw)
        })?;
    }

    Ok(())
}

fn dump_hca<T: CardTransport>(ap: &HcaAp<T>, output: &Output) -> Result<()> {
    println!("hca/ef.statusvd");
    report(ap.read_status(), |status| output.record(&status))?;

    println!("hca/ef.pd");
    report(ap.read_personal_data(), |pd| {
        output.save("EF.PD.xml.gz", &pd)?;
        report(Pd::try_from(pd.as_slice()), |pd| output.record(&pd))
    })?;

    println!("hca/ef.vd");
    report(ap.read_insurance_data(), |data| {
        output.save("EF.VD.xml.gz", &data.vd)?;
        output.save("EF.GVD.xml.gz", &data.gvd)?;
        report(Vd::try_from(data.vd.as_slice()), |vd| output.record(&vd))?;

        println!("hca/ef.gvd");
        report(Gvd::try_from(data.gvd.as_slice()), |gvd| output.record(&gvd))
    })
}

fn dump_esign<T: CardTransport>(ap: &EsignAp<T>, output: &Output) -> Result<()> {
    for ty in esign::CertType::ALL {
        println!("esign/{}", ty.file_name().to_lowercase());
        report(ap.read_certificate(ty), |der| {
            report(X509Certificate::from_der(&der), |cert| {
                println!("\tsubject: {}", cert.subject_common_name().unwrap_or_default());
                println!("\tissuer: {}", cert.issuer_common_name().unwrap_or_default());
                Ok(())
            })?;
            println!("\t{}", hex::encode(&der));
            output.save(&format!("{}.der", ty.file_name()), &der)
        })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use egk::TransportError;

    use super::*;

    /// A card on which every application but the HCA can be selected and no file can be read.
    #[derive(Default)]
    struct NoHcaCard {
        sent: RefCell<Vec<Vec<u8>>>,
    }

    impl CardTransport for NoHcaCard {
        fn transmit(&self, command: &[u8]) -> std::result::Result<Vec<u8>, TransportError> {
            self.sent.borrow_mut().push(command.to_vec());

            match command {
                [0x00, 0xA4, 0x04, 0x0C, _, aid @ ..] if aid == &hca::AID[..] => Ok(vec![0x6A, 0x82]),
                [0x00, 0xA4, ..] => Ok(vec![0x90, 0x00]),
                _ => Ok(vec![0x6A, 0x82]),
            }
        }
    }

    fn select(aid: &[u8]) -> Vec<u8> {
        let mut command = vec![0x00, 0xA4, 0x04, 0x0C, aid.len() as u8];
        command.extend_from_slice(aid);
        command
    }

    #[test]
    fn test_dump_continues_after_failed_select() {
        let transport = NoHcaCard::default();
        let output = Output::new(None, false).unwrap();

        dump_all(Card::new(&transport), &output).unwrap();

        let sent = transport.sent.into_inner();
        let hca = sent.iter().position(|c| *c == select(&hca::AID)).unwrap();
        let esign = sent.iter().position(|c| *c == select(&esign::AID)).unwrap();
        assert!(hca < esign);

        // nothing is read from the HCA, then both eSign certificates are tried
        assert_eq!(Some(&select(&qes::AID)), sent.get(hca + 1));
        assert_eq!(
            vec![
                vec![0x00, 0xB0, 0x81, 0x00, 0x00, 0x00, 0x00],
                vec![0x00, 0xB0, 0x82, 0x00, 0x00, 0x00, 0x00],
            ],
            sent[esign + 1..],
        );
    }
}
