use std::fmt;

use nom::combinator::map;
use nom::error::context;
use nom::number::complete::le_u32;

use crate::messages::{utils::write_u32, NomError, Wire};

/// If set, requests Unicode (UTF-16LE) character encoding for the
/// variable-length payload strings.
pub const NTLMSSP_NEGOTIATE_UNICODE: u32 = 0x0000_0001;

/// If set, requests OEM character encoding. A connection must negotiate at
/// least one of the two encodings.
pub const NTLM_NEGOTIATE_OEM: u32 = 0x0000_0002;

/// If set, a TargetName field of the CHALLENGE_MESSAGE must be supplied.
pub const NTLMSSP_REQUEST_TARGET: u32 = 0x0000_0004;

/// If set, requests LAN Manager session key computation.
pub const NTLMSSP_NEGOTIATE_LM_KEY: u32 = 0x0000_0080;

/// If set, requests usage of the NTLM v1 session security protocol.
pub const NTLMSSP_NEGOTIATE_NTLM: u32 = 0x0000_0200;

/// If set, the connection should be anonymous.
pub const NTLMSSP_ANONYMOUS: u32 = 0x0000_0800;

/// If set, the domain name is provided in the NEGOTIATE_MESSAGE.
pub const NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED: u32 = 0x0000_1000;

/// If set, the workstation name is provided in the NEGOTIATE_MESSAGE.
pub const NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED: u32 = 0x0000_2000;

/// If set, a session key is generated regardless of the states of
/// NTLMSSP_NEGOTIATE_SIGN and NTLMSSP_NEGOTIATE_SEAL.
pub const NTLMSSP_NEGOTIATE_ALWAYS_SIGN: u32 = 0x0000_8000;

/// If set, indicates that the TargetInfo fields of the CHALLENGE_MESSAGE are
/// populated.
pub const NTLMSSP_NEGOTIATE_TARGET_INFO: u32 = 0x0080_0000;

/// If set, requests the protocol version number.
pub const NTLMSSP_NEGOTIATE_VERSION: u32 = 0x0200_0000;

/// If set, requests 128-bit session key negotiation.
pub const NTLMSSP_NEGOTIATE_128: u32 = 0x2000_0000;

/// If set, requests an explicit key exchange.
pub const NTLMSSP_NEGOTIATE_KEY_EXCH: u32 = 0x4000_0000;

/// If set, requests 56-bit encryption.
pub const NTLMSSP_NEGOTIATE_56: u32 = 0x8000_0000;

const FLAG_NAMES: &[(u32, &str)] = &[
    (NTLMSSP_NEGOTIATE_UNICODE, "NTLMSSP_NEGOTIATE_UNICODE"),
    (NTLM_NEGOTIATE_OEM, "NTLM_NEGOTIATE_OEM"),
    (NTLMSSP_REQUEST_TARGET, "NTLMSSP_REQUEST_TARGET"),
    (NTLMSSP_NEGOTIATE_LM_KEY, "NTLMSSP_NEGOTIATE_LM_KEY"),
    (NTLMSSP_NEGOTIATE_NTLM, "NTLMSSP_NEGOTIATE_NTLM"),
    (NTLMSSP_ANONYMOUS, "NTLMSSP_ANONYMOUS"),
    (
        NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED,
        "NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED",
    ),
    (
        NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED,
        "NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED",
    ),
    (NTLMSSP_NEGOTIATE_ALWAYS_SIGN, "NTLMSSP_NEGOTIATE_ALWAYS_SIGN"),
    (NTLMSSP_NEGOTIATE_TARGET_INFO, "NTLMSSP_NEGOTIATE_TARGET_INFO"),
    (NTLMSSP_NEGOTIATE_VERSION, "NTLMSSP_NEGOTIATE_VERSION"),
    (NTLMSSP_NEGOTIATE_128, "NTLMSSP_NEGOTIATE_128"),
    (NTLMSSP_NEGOTIATE_KEY_EXCH, "NTLMSSP_NEGOTIATE_KEY_EXCH"),
    (NTLMSSP_NEGOTIATE_56, "NTLMSSP_NEGOTIATE_56"),
];

#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(pub u32);

impl Flags {
    pub fn has_flag(&self, mask: u32) -> bool {
        self.0 & mask != 0
    }

    pub fn set_flag(&mut self, mask: u32) {
        self.0 |= mask;
    }

    pub fn clear_flag(&mut self, mask: u32) {
        self.0 &= !mask;
    }
}

impl<'a> Wire<'a> for Flags {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        write_u32(writer, self.0)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        context("Flags", map(le_u32, Self))(input)
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut known = 0;
        let mut first = true;
        for (mask, name) in FLAG_NAMES {
            if self.has_flag(*mask) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
                known |= mask;
            }
        }
        let rest = self.0 & !known;
        if rest != 0 {
            if !first {
                f.write_str("|")?;
            }
            write!(f, "{rest:#010x}")?;
            first = false;
        }
        if first {
            f.write_str("(empty)")?;
        }
        Ok(())
    }
}
