//! Collection of APs that corresponds with DF (Dedicated File) in the card

pub mod esign;
pub mod hca;
pub mod qes;
pub mod root;

pub use self::esign::EsignAp;
pub use self::hca::HcaAp;
pub use self::qes::QesAp;
pub use self::root::RootAp;

use crate::{card, decode};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Card(#[from] card::Error),

    #[error("The file content is malformed: {0}")]
    Format(#[from] decode::Error),
}

macro_rules! open {
    ($name: expr, $aid: expr) => {
        /// Opens the AP in the card by selecting the DF.
        pub fn open(card: Rc<crate::Card<T>>) -> Result<Self, crate::card::Error> {
            let ap = Self { card };

            ap.card.select_aid(&$aid).map(|_| {
                crate::log::info!("Opened {}", $name);
                ap
            })
        }
    };
}

pub(crate) use open;
