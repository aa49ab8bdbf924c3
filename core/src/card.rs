use crate::apdu::{Command, Le, Response, ResponseTooShort, StatusWord};
use crate::log::{debug, trace};
use crate::transport::{CardTransport, TransportError};

const SELECT_P1_AID: u8 = 0x04;
const SELECT_P2: u8 = 0x0C;

const READ_P1_SFID: u8 = 0x80;
/// Largest offset READ BINARY can carry in P1-P2; bit 8 of P1 would mark an SFID.
const READ_MAX_OFFSET: usize = 0x7FFF;
const READ_RECORD_P2_CURRENT: u8 = 0x04;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Error occurred while communicating with the card: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Malformed(#[from] ResponseTooShort),

    #[error("The card returned an error (sw={0})")]
    Status(StatusWord),
}

impl Error {
    /// The status word the card answered with, if it answered at all.
    pub fn status(&self) -> Option<StatusWord> {
        match self {
            Self::Status(sw) => Some(*sw),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An adapter to read files from the card through the transport
pub struct Card<T>
where
    T: CardTransport,
{
    transport: T,
}

impl<T> Card<T>
where
    T: CardTransport,
{
    /// Initiates an adapter with the transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Selects an application (DF) by its AID.
    pub fn select_aid(&self, aid: &[u8]) -> Result<()> {
        debug!("Selecting {}", hex::encode(aid));

        self.handle(Command::select_file(SELECT_P1_AID, SELECT_P2, aid.to_vec()))
            .map(|_| ())
    }

    /// Reads binary from the currently selected EF at `offset`.
    pub fn read_binary(&self, offset: u16, le: Le) -> Result<Vec<u8>> {
        let [p1, p2] = offset.to_be_bytes();

        self.handle(Command::read_binary(p1, p2, le))
    }

    /// Reads binary from the EF named by a short file identifier, selecting it implicitly.
    pub fn read_binary_sfid(&self, sfid: u8, offset: u8, le: Le) -> Result<Vec<u8>> {
        self.handle(Command::read_binary(READ_P1_SFID | sfid, offset, le))
    }

    /// Reads the record `index` from the currently selected EF.
    pub fn read_record(&self, index: u8, le: Le) -> Result<Vec<u8>> {
        self.handle(Command::read_record(index, READ_RECORD_P2_CURRENT, le))
    }

    /// Reads the record `index` from the EF named by a short file identifier.
    pub fn read_record_sfid(&self, sfid: u8, index: u8, le: Le) -> Result<Vec<u8>> {
        self.handle(Command::read_record(
            index,
            (sfid << 3) | READ_RECORD_P2_CURRENT,
            le,
        ))
    }

    /// Reads a whole transparent EF, however many exchanges it takes.
    ///
    /// The first read goes through `sfid`, which also selects the EF; the following
    /// ones continue at absolute offsets until the card answers `6B00` (offset past
    /// the end of the file) or the next offset no longer fits in P1-P2 (0x7FFF), which
    /// also keeps the result below the 65536 octet ceiling.
    /// Any other error discards what was read so far.
    pub fn read_full(&self, sfid: u8) -> Result<Vec<u8>> {
        let mut state = ReadFull::Start;

        loop {
            state = match state {
                ReadFull::Start => {
                    let command =
                        Command::read_binary(READ_P1_SFID | sfid, 0, Le::WildcardExtended);
                    ReadFull::Start.next(self.exchange(command)?)?
                }
                ReadFull::Reading(buf) if buf.len() > READ_MAX_OFFSET => {
                    debug!("Offset {:#06X} cannot be addressed, stopping", buf.len());
                    ReadFull::Done(buf)
                }
                ReadFull::Reading(buf) => {
                    let [p1, p2] = (buf.len() as u16).to_be_bytes();
                    let command = Command::read_binary(p1, p2, Le::WildcardExtended);
                    ReadFull::Reading(buf).next(self.exchange(command)?)?
                }
                ReadFull::Done(buf) => {
                    debug!("Read {} octets from SFID {:#04X}", buf.len(), sfid);
                    return Ok(buf);
                }
            };
        }
    }

    fn exchange(&self, command: Command) -> Result<Response> {
        let rx = self.transport.transmit(&command.into_bytes())?;

        Ok(Response::from_bytes(&rx)?)
    }

    fn handle(&self, command: Command) -> Result<Vec<u8>> {
        self.exchange(command)?
            .into_result()
            .map_err(Error::Status)
    }
}

/// Progress of [`Card::read_full`].
enum ReadFull {
    Start,
    Reading(Vec<u8>),
    Done(Vec<u8>),
}

impl ReadFull {
    fn next(self, response: Response) -> Result<Self> {
        let mut buf = match self {
            Self::Start => Vec::new(),
            Self::Reading(buf) => buf,
            Self::Done(buf) => return Ok(Self::Done(buf)),
        };

        let status = response.status();
        let chunk = response.into_payload();
        trace!(
            "Chunk of {} octets at offset {} (sw={})",
            chunk.len(),
            buf.len(),
            status
        );

        if status == StatusWord::WRONG_PARAMETERS {
            buf.extend_from_slice(&chunk);
            return Ok(Self::Done(buf));
        }
        if !status.is_success() {
            return Err(Error::Status(status));
        }
        if chunk.is_empty() {
            return Ok(Self::Done(buf));
        }

        buf.extend_from_slice(&chunk);
        Ok(Self::Reading(buf))
    }
}
