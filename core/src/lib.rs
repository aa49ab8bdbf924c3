//! A crate to read the German electronic health card (eGK) through a card transport.

#[cfg(feature = "pcsc")]
pub mod pcsc;

pub mod ap;
pub mod apdu;
pub mod card;
pub mod decode;
pub mod der;
pub mod transport;

#[cfg(feature = "vsd")]
pub mod vsd;

mod log;

pub use card::Card;
pub use transport::{CardTransport, TracingTransport, TransportError};
