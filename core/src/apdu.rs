//! Command and response APDUs (ISO/IEC 7816-4), in short and extended framing.

use std::fmt::{Display, Formatter};

/// Largest length a short length field can express (encoded as `00`).
pub const MAX_SHORT: usize = 0xFF + 1;

/// Largest length an extended length field can express (encoded as `00 00`).
pub const MAX_EXTENDED: usize = 0xFFFF + 1;

pub const CLA_DEFAULT: u8 = 0x00;

pub mod ins {
    pub const SELECT_FILE: u8 = 0xA4;
    pub const READ_BINARY: u8 = 0xB0;
    pub const READ_RECORD: u8 = 0xB2;
}

/// Expected length of the response data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Le {
    /// A literal number of octets, up to [`MAX_EXTENDED`].
    /// Zero means the command carries no Le field at all.
    Exact(usize),

    /// Everything the card is willing to return, in short framing if possible.
    Wildcard,

    /// Everything the card is willing to return, always in extended framing.
    WildcardExtended,
}

impl Le {
    /// No response data expected.
    pub const NONE: Self = Self::Exact(0);

    fn forces_extended(self) -> bool {
        match self {
            Self::Exact(n) => n >= MAX_SHORT,
            Self::Wildcard => false,
            Self::WildcardExtended => true,
        }
    }
}

/// The two trailing octets of every response.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StatusWord(u16);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x9000);

    /// Wrong parameters P1-P2: offset or record outside of the file.
    pub const WRONG_PARAMETERS: Self = Self(0x6B00);

    pub const fn new(sw: u16) -> Self {
        Self(sw)
    }

    pub const fn from_bytes(sw1: u8, sw2: u8) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }

    pub const fn sw1(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn sw2(self) -> u8 {
        self.0 as u8
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

impl Display for StatusWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl From<u16> for StatusWord {
    fn from(sw: u16) -> Self {
        Self(sw)
    }
}

impl From<StatusWord> for u16 {
    fn from(sw: StatusWord) -> Self {
        sw.0
    }
}

/// An APDU command to be transmitted
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Command {
    cla: u8,
    ins: u8,
    p1: u8,
    p2: u8,
    data: Vec<u8>,
    le: Le,
}

impl Command {
    /// Constructs an command with CLA, INS, P1, and P2.
    /// No payloads will be transmitted or received.
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: Le::NONE,
        }
    }

    /// Constructs an command with CLA, INS, P1, P2, and Le.
    pub fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: Le) -> Self {
        Self {
            le,
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs an command with CLA, INS, P1, P2, and a payload.
    pub fn new_with_payload(cla: u8, ins: u8, p1: u8, p2: u8, data: Vec<u8>) -> Self {
        Self {
            data,
            ..Self::new(cla, ins, p1, p2)
        }
    }

    /// Constructs a `SELECT FILE` command.
    pub fn select_file(p1: u8, p2: u8, name: Vec<u8>) -> Self {
        Self::new_with_payload(CLA_DEFAULT, ins::SELECT_FILE, p1, p2, name)
    }

    /// Constructs a `READ BINARY` command.
    pub fn read_binary(p1: u8, p2: u8, le: Le) -> Self {
        Self::new_with_le(CLA_DEFAULT, ins::READ_BINARY, p1, p2, le)
    }

    /// Constructs a `READ RECORD` command.
    pub fn read_record(p1: u8, p2: u8, le: Le) -> Self {
        Self::new_with_le(CLA_DEFAULT, ins::READ_RECORD, p1, p2, le)
    }

    /// Whether the command needs extended length fields.
    pub fn is_extended(&self) -> bool {
        self.data.len() >= MAX_SHORT || self.le.forces_extended()
    }

    /// Converts the command into octets.
    ///
    /// # Panics
    ///
    /// Panics if the data or the expected length exceeds [`MAX_EXTENDED`].
    pub fn into_bytes(self) -> Vec<u8> {
        let extended = self.is_extended();
        let Self {
            cla,
            ins,
            p1,
            p2,
            data,
            le,
        } = self;

        let mut buffer: Vec<u8> = Vec::with_capacity(4 + 3 + data.len() + 3);
        buffer.extend_from_slice(&[cla, ins, p1, p2]);
        push_length(&mut buffer, Le::Exact(data.len()), extended, true);
        buffer.extend_from_slice(&data);
        push_length(&mut buffer, le, extended, data.is_empty());

        buffer
    }
}

impl From<Command> for Vec<u8> {
    fn from(command: Command) -> Self {
        command.into_bytes()
    }
}

/// Encodes a command APDU in one call.
pub fn encode_command(cla: u8, ins: u8, p1: u8, p2: u8, data: &[u8], le: Le) -> Vec<u8> {
    Command {
        cla,
        ins,
        p1,
        p2,
        data: data.to_vec(),
        le,
    }
    .into_bytes()
}

// The leading 00 of an extended field only appears on the first length field of a frame.
fn push_length(buffer: &mut Vec<u8>, n: Le, extended: bool, first: bool) {
    match n {
        Le::Wildcard | Le::WildcardExtended => match (extended, first) {
            (true, true) => buffer.extend_from_slice(&[0, 0, 0]),
            (true, false) => buffer.extend_from_slice(&[0, 0]),
            _ => buffer.push(0),
        },
        Le::Exact(0) => {}
        Le::Exact(n) => {
            assert!(n <= MAX_EXTENDED, "APDU length {} out of range", n);

            if extended {
                if first {
                    buffer.push(0);
                }
                if n == MAX_EXTENDED {
                    buffer.extend_from_slice(&[0, 0]);
                } else {
                    buffer.extend_from_slice(&(n as u16).to_be_bytes());
                }
            } else if n == MAX_SHORT {
                buffer.push(0);
            } else {
                buffer.push(n as u8);
            }
        }
    }
}

/// Raised when a response is missing its status word.
#[derive(Debug, thiserror::Error)]
#[error("Response APDU too short ({0} octets)")]
pub struct ResponseTooShort(pub usize);

/// An response that was received from the card
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Response {
    payload: Vec<u8>,
    status: StatusWord,
}

impl Response {
    /// Parses a response from the octets.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ResponseTooShort> {
        match bytes {
            [payload @ .., sw1, sw2] => Ok(Self {
                payload: payload.to_vec(),
                status: StatusWord::from_bytes(*sw1, *sw2),
            }),
            _ => Err(ResponseTooShort(bytes.len())),
        }
    }

    pub fn status(&self) -> StatusWord {
        self.status
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Determines whether the response indicates success or not.
    pub fn is_ok(&self) -> bool {
        self.status.is_success()
    }

    /// Converts the response to a result of octets.
    pub fn into_result(self) -> Result<Vec<u8>, StatusWord> {
        match self.is_ok() {
            true => Ok(self.payload),
            _ => Err(self.status),
        }
    }
}

/// Splits a raw response into its status word and payload.
pub fn decode_response(bytes: &[u8]) -> Result<(StatusWord, Vec<u8>), ResponseTooShort> {
    Response::from_bytes(bytes).map(|r| (r.status, r.payload))
}
