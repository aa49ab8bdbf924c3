//! The channel to the card, and a decorator that traces every exchange on it.

use std::cell::RefCell;
use std::error::Error as StdError;
use std::io::Write;

use crate::log::debug;

/// An opaque failure of the underlying channel.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new(e: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        Self(e.into())
    }

    /// The failure reported by the channel.
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

/// A delegate to communicate with the card outside.
///
/// Implementations must transmit the command to the card through a reader,
/// then receive the response from them, status word included.
pub trait CardTransport {
    fn transmit(&self, command: &[u8]) -> Result<Vec<u8>, TransportError>;
}

impl<T: CardTransport + ?Sized> CardTransport for &T {
    fn transmit(&self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }
}

impl<T: CardTransport + ?Sized> CardTransport for Box<T> {
    fn transmit(&self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        (**self).transmit(command)
    }
}

/// Writes every command and response passing through `T` to a sink, in hex.
///
/// Failures to write to the sink are ignored; the exchange itself is never altered.
pub struct TracingTransport<T, W> {
    inner: T,
    sink: RefCell<W>,
}

impl<T, W> TracingTransport<T, W>
where
    T: CardTransport,
    W: Write,
{
    pub fn new(inner: T, sink: W) -> Self {
        Self {
            inner,
            sink: RefCell::new(sink),
        }
    }

    /// Gives back the wrapped transport and the sink.
    pub fn into_parts(self) -> (T, W) {
        (self.inner, self.sink.into_inner())
    }

    fn write_line(&self, prefix: &str, frame: &[u8]) {
        let _ = writeln!(self.sink.borrow_mut(), "{}: {}", prefix, hex::encode(frame));
    }
}

impl<T, W> CardTransport for TracingTransport<T, W>
where
    T: CardTransport,
    W: Write,
{
    fn transmit(&self, command: &[u8]) -> Result<Vec<u8>, TransportError> {
        self.write_line("c-apdu", command);

        let result = self.inner.transmit(command);
        match &result {
            Ok(response) => self.write_line("r-apdu", response),
            Err(e) => {
                debug!("Transport failed: {}", e);
            }
        }

        result
    }
}
