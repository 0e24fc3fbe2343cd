use nom::bytes::complete::{tag, take};
use nom::combinator::{map, verify};
use nom::error::context;
use nom::number::complete::{le_u32, le_u64};
use nom::sequence::{preceded, tuple};

use crate::messages::{
    flags::{
        Flags, NTLMSSP_NEGOTIATE_ALWAYS_SIGN, NTLMSSP_NEGOTIATE_NTLM, NTLMSSP_NEGOTIATE_UNICODE,
    },
    utils::{write_u32, write_u64},
    Field, NomError, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000002;

/// Fixed wire size of the challenge emitted by this server: header only, no
/// target name and no target information payload.
pub const CHALLENGE_LEN: usize = 48;

/// Both empty security buffers of the emitted challenge point here.
const EMPTY_BUFFER_OFFSET: u32 = 40;

const CHALLENGE_FLAGS: u32 =
    NTLMSSP_NEGOTIATE_UNICODE | NTLMSSP_NEGOTIATE_NTLM | NTLMSSP_NEGOTIATE_ALWAYS_SIGN;

/// Type 2 message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Challenge {
    pub target_name: Field,
    pub negotiate_flags: Flags,
    pub server_challenge: [u8; 8],
    pub target_info: Field,
}

impl Challenge {
    /// The challenge sent to every negotiating client: empty target buffers
    /// and the flag bytes `01 82 00 00`.
    pub fn new(server_challenge: [u8; 8]) -> Self {
        Self {
            target_name: Field::empty_at(EMPTY_BUFFER_OFFSET),
            negotiate_flags: Flags(CHALLENGE_FLAGS),
            server_challenge,
            target_info: Field::empty_at(EMPTY_BUFFER_OFFSET),
        }
    }
}

impl<'a> Wire<'a> for Challenge {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        writer.write_all(&SIGNATURE[..])?;
        let mut written = SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        written += self.target_name.serialize_into(writer)?;
        written += self.negotiate_flags.serialize_into(writer)?;
        writer.write_all(&self.server_challenge[..])?;
        written += self.server_challenge.len();
        written += write_u64(writer, 0)?;
        written += self.target_info.serialize_into(writer)?;

        debug_assert_eq!(written, CHALLENGE_LEN);
        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (target_name, negotiate_flags, server_challenge, _reserved, target_info)) =
            context(
                "Challenge",
                preceded(
                    tuple((tag(SIGNATURE), verify(le_u32, |mt| *mt == MESSAGE_TYPE))),
                    tuple((
                        Field::deserialize,
                        Flags::deserialize,
                        map(take(8usize), |bytes: &[u8]| {
                            let mut challenge = [0u8; 8];
                            challenge.copy_from_slice(bytes);
                            challenge
                        }),
                        verify(le_u64, |reserved| *reserved == 0),
                        Field::deserialize,
                    )),
                ),
            )(input)?;

        Ok((
            rest,
            Self {
                target_name,
                negotiate_flags,
                server_challenge,
                target_info,
            },
        ))
    }
}
