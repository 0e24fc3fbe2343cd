//! NTLMSSP wire codec: pure, bounds-safe translation between the binary
//! message format and typed messages. No I/O, no shared state.

use std::io::{self, Write};

use crate::error::DecodeError;
use crate::identity::NtlmIdentity;

pub trait NomError<'a>: nom::error::ContextError<&'a [u8]> + nom::error::ParseError<&'a [u8]> {}

impl<'a, E> NomError<'a> for E where
    E: nom::error::ParseError<&'a [u8]> + nom::error::ContextError<&'a [u8]>
{
}

pub trait Wire<'a>: Sized {
    fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: Write;
    fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::new();
        self.serialize_into(&mut data)
            .expect("Writing to a Vec should never fail");
        data
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>;
}

pub const SIGNATURE: &[u8; 8] = b"NTLMSSP\0";

pub mod authenticate;
pub mod challenge;
pub mod flags;
pub mod negotiate;

mod field;
mod unicode_string;
mod utils;

pub use authenticate::Authenticate;
pub use challenge::{Challenge, CHALLENGE_LEN};
pub use field::Field;
pub use flags::Flags;
pub use negotiate::Negotiate;
pub use unicode_string::UnicodeString;

/// The three message shapes of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Negotiate,
    Challenge,
    Authenticate,
}

impl MessageType {
    pub const fn as_u32(self) -> u32 {
        match self {
            Self::Negotiate => 1,
            Self::Challenge => 2,
            Self::Authenticate => 3,
        }
    }
}

/// Classifies a raw NTLMSSP message by signature and message-type field.
///
/// The type is assembled little-endian from bytes 8..12; bytes past the end
/// of a short buffer read as zero, so a 9-byte Negotiate still classifies as
/// Type 1.
pub fn decode_header(input: &[u8]) -> Result<MessageType, DecodeError> {
    if input.len() < 9 || &input[..8] != &SIGNATURE[..] {
        return Err(DecodeError::MalformedSignature);
    }
    let mut raw = [0u8; 4];
    let available = input.len().min(12) - 8;
    raw[..available].copy_from_slice(&input[8..8 + available]);
    match u32::from_le_bytes(raw) {
        1 => Ok(MessageType::Negotiate),
        2 => Ok(MessageType::Challenge),
        3 => Ok(MessageType::Authenticate),
        other => Err(DecodeError::UnknownMessageType(other)),
    }
}

/// Emits the fixed 48-byte Type 2 message for `server_challenge`.
/// Deterministic: the same challenge input yields the same bytes.
pub fn build_challenge(server_challenge: [u8; 8]) -> Vec<u8> {
    Challenge::new(server_challenge).serialize()
}

/// Extracts the claimed identity from a Type 3 message.
///
/// Out-of-range security buffers resolve to empty strings; only a buffer too
/// short to hold the fixed descriptor region is an error.
pub fn decode_authenticate(input: &[u8]) -> Result<NtlmIdentity, DecodeError> {
    match decode_header(input)? {
        MessageType::Authenticate => {}
        other => return Err(DecodeError::UnknownMessageType(other.as_u32())),
    }
    let (_, message) = Authenticate::deserialize::<nom::error::Error<&[u8]>>(input).map_err(
        |_| DecodeError::TruncatedMessage {
            expected: Authenticate::FIXED_LEN,
            actual: input.len(),
        },
    )?;
    Ok(message.into_identity())
}
