//! PC/SC support for egk library.
//! Can be enabled by turning `pcsc` feature on.
//!
//! ## Supported platform
//! Linux, Windows and macOS are supported by pcsc-rust, backend of this implementation.
//! Linux needs the pcsc-lite shared library and a running `pcscd`.
//! Refer the documentation of pcsc-rust for details:
//! <https://github.com/bluetech/pcsc-rust>
//!
//! ## Usage
//! ```rust,no_run
//! use std::rc::Rc;
//!
//! use egk::ap::RootAp;
//! use egk::pcsc::Context;
//! use egk::Card;
//!
//! let ctx = Context::try_new().unwrap();
//! let device = ctx.open().unwrap();
//! let pcsc_card = device.connect(&ctx).unwrap();
//!
//! let card = Rc::new(Card::new(pcsc_card));
//! let root = RootAp::open(Rc::clone(&card)).unwrap();
//! println!("{}", root.read_gdo().unwrap());
//! ```

use std::ffi::{CStr, CString};
use std::thread::sleep;
use std::time::Duration;

use pcsc::{Disposition, Protocols, Scope, ShareMode, MAX_BUFFER_SIZE_EXTENDED};

use crate::log::{debug, info};
use crate::transport::{CardTransport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with PC/SC: {0}")]
    PcscError(#[from] pcsc::Error),

    #[error("Reader not found on PC/SC service")]
    ReaderNotFound,

    #[error("Card is disconnected")]
    Disconnected,
}

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// PC/SC context.
pub struct Context {
    ctx: pcsc::Context,
}

impl Context {
    /// Creates a PC/SC context in user scope.
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            ctx: pcsc::Context::establish(Scope::User)?,
        })
    }

    /// Finds the first PC/SC reader.
    pub fn open(&self) -> Result<Device> {
        let mut buf = [0u8; 2048];

        Ok(Device::new(
            self.ctx
                .list_readers(&mut buf)?
                .next()
                .ok_or(Error::ReaderNotFound)?,
        ))
    }
}

/// PC/SC device handle.
pub struct Device {
    reader: CString,
}

impl Device {
    fn new(reader: &CStr) -> Self {
        debug!("Using device: {}", reader.to_str().unwrap_or_default());

        Self {
            reader: reader.to_owned(),
        }
    }

    /// Name of the reader.
    pub fn name(&self) -> String {
        self.reader.to_string_lossy().into_owned()
    }

    /// Connects to the card inserted to the device after waiting them.
    pub fn connect(&self, ctx: &Context) -> Result<PcscCard> {
        // Waits for inserting card, polling for each seconds.
        debug!("Waiting for a card");

        loop {
            match ctx
                .ctx
                .connect(&self.reader, ShareMode::Exclusive, Protocols::ANY)
            {
                Ok(card) => {
                    debug!("Connected to your card");

                    return Ok(PcscCard::new(card));
                }
                Err(pcsc::Error::NoSmartcard) | Err(pcsc::Error::RemovedCard) => {
                    info!("Still waiting for your card...");
                    sleep(Duration::from_secs(1));
                }
                Err(e) => return Err(Error::PcscError(e)),
            }
        }
    }
}

/// A card to be communicated through PC/SC.
///
/// The card is reset when this is dropped.
pub struct PcscCard {
    card: Option<pcsc::Card>,
}

impl PcscCard {
    fn new(card: pcsc::Card) -> Self {
        Self { card: Some(card) }
    }

    /// The ATR the card answered with when it was powered.
    pub fn atr(&self) -> Result<Vec<u8>> {
        let card = self.card.as_ref().ok_or(Error::Disconnected)?;

        Ok(card.get_attribute_owned(pcsc::Attribute::AtrString)?)
    }
}

impl CardTransport for PcscCard {
    /// Transmits an APDU command to the card, then receives a response from them.
    fn transmit(&self, tx: &[u8]) -> std::result::Result<Vec<u8>, TransportError> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| TransportError::new(Error::Disconnected))?;

        debug!("TX: {}", hex::encode(tx));

        let mut rx = vec![0u8; MAX_BUFFER_SIZE_EXTENDED];
        let rx = card.transmit(tx, &mut rx).map_err(TransportError::new)?;

        debug!("RX: {}", hex::encode(rx));

        Ok(rx.to_vec())
    }
}

impl Drop for PcscCard {
    fn drop(&mut self) {
        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(Disposition::ResetCard) {
                debug!("Failed to reset the card: {}", e);
            }
        }
    }
}
