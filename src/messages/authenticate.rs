use nom::bytes::complete::tag;
use nom::combinator::{opt, verify};
use nom::error::context;
use nom::number::complete::le_u32;
use nom::sequence::{preceded, tuple};

use crate::identity::NtlmIdentity;
use crate::messages::{
    flags::Flags, unicode_string::UnicodeString, utils::write_u32, Field, NomError, Wire,
    SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000003;

/// Type 3 message.
///
/// The LM and NT responses are carried through untouched: this server never
/// verifies them, it only extracts the claimed names. The descriptor region
/// runs through the workstation buffer pointer; the session key descriptor
/// and the flags are decoded when the client sent them.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Authenticate {
    pub lm_challenge_response: Vec<u8>,
    pub nt_challenge_response: Vec<u8>,
    pub domain: UnicodeString,
    pub user: UnicodeString,
    pub workstation: UnicodeString,
    pub session_key: Vec<u8>,
    pub negotiate_flags: Option<Flags>,
}

impl Authenticate {
    /// Signature through the workstation buffer pointer. Anything shorter
    /// cannot hold the fixed descriptor reads.
    pub const FIXED_LEN: usize = 52;

    pub fn into_identity(self) -> NtlmIdentity {
        NtlmIdentity {
            domain: self.domain.into_string(),
            username: self.user.into_string(),
            workstation: self.workstation.into_string(),
        }
    }
}

impl<'a> Wire<'a> for Authenticate {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        const PAYLOAD_OFFSET: usize = 64;

        let mut payload = Vec::with_capacity(PAYLOAD_OFFSET * 2);
        payload.resize(PAYLOAD_OFFSET, 0);

        writer.write_all(&SIGNATURE[..])?;
        let mut written = SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        written += Field::append(&self.lm_challenge_response, &mut payload, writer)?;
        written += Field::append(&self.nt_challenge_response, &mut payload, writer)?;
        written += Field::append(&self.domain.to_utf16le(), &mut payload, writer)?;
        written += Field::append(&self.user.to_utf16le(), &mut payload, writer)?;
        written += Field::append(&self.workstation.to_utf16le(), &mut payload, writer)?;
        written += Field::append(&self.session_key, &mut payload, writer)?;
        written += self.negotiate_flags.unwrap_or_default().serialize_into(writer)?;

        debug_assert_eq!(written, PAYLOAD_OFFSET);
        writer.write_all(&payload[PAYLOAD_OFFSET..])?;
        written += payload.len() - PAYLOAD_OFFSET;

        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (lm_field, nt_field, domain_field, user_field, workstation_field)) = context(
            "Authenticate",
            preceded(
                tuple((tag(SIGNATURE), verify(le_u32, |mt| *mt == MESSAGE_TYPE))),
                tuple((
                    context("lm_challenge_response", Field::deserialize),
                    context("nt_challenge_response", Field::deserialize),
                    context("domain", Field::deserialize),
                    context("user", Field::deserialize),
                    context("workstation", Field::deserialize),
                )),
            ),
        )(input)?;
        let (_, tail) = opt(tuple((Field::deserialize, Flags::deserialize)))(rest)?;
        let (session_key_field, negotiate_flags) = match tail {
            Some((field, negotiate_flags)) => (Some(field), Some(negotiate_flags)),
            None => (None, None),
        };

        Ok((
            &b""[..],
            Self {
                lm_challenge_response: lm_field.resolve(input).to_vec(),
                nt_challenge_response: nt_field.resolve(input).to_vec(),
                domain: UnicodeString::from_utf16le(domain_field.resolve(input)),
                user: UnicodeString::from_utf16le(user_field.resolve(input)),
                workstation: UnicodeString::from_utf16le(workstation_field.resolve(input)),
                session_key: session_key_field
                    .map(|field| field.resolve(input).to_vec())
                    .unwrap_or_default(),
                negotiate_flags,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::flags::{NTLMSSP_NEGOTIATE_NTLM, NTLMSSP_NEGOTIATE_UNICODE};
    use pretty_assertions::assert_eq;

    fn sample() -> Authenticate {
        Authenticate {
            lm_challenge_response: Vec::new(),
            nt_challenge_response: Vec::new(),
            domain: "CORP".into(),
            user: "alice".into(),
            workstation: "WKS1".into(),
            session_key: Vec::new(),
            negotiate_flags: Some(Flags(NTLMSSP_NEGOTIATE_UNICODE | NTLMSSP_NEGOTIATE_NTLM)),
        }
    }

    #[test]
    fn encode_decode() {
        let message = sample();
        let serialized = message.serialize();
        // domain descriptor sits at the documented fixed offsets
        assert_eq!(&serialized[28..32], [8, 0, 8, 0]);
        assert_eq!(&serialized[32..36], [64, 0, 0, 0]);

        let (_, decoded) =
            Authenticate::deserialize::<nom::error::Error<&[u8]>>(&serialized[..]).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn identity_extraction() {
        let identity = sample().into_identity();
        assert_eq!(
            identity,
            NtlmIdentity {
                domain: "CORP".into(),
                username: "alice".into(),
                workstation: "WKS1".into(),
            }
        );
        assert_eq!(identity.full_username(), "CORP\\alice");
    }

    #[test]
    fn out_of_range_buffer_decodes_empty() {
        let serialized = sample().serialize();
        // payload layout: domain (8 bytes @64), user (10 bytes @72),
        // workstation (8 bytes @82); cutting at 82 strands the workstation
        // descriptor past the end of the buffer
        let truncated = &serialized[..82];
        let (_, decoded) =
            Authenticate::deserialize::<nom::error::Error<&[u8]>>(truncated).unwrap();
        assert_eq!(&*decoded.domain, "CORP");
        assert_eq!(&*decoded.user, "alice");
        assert_eq!(&*decoded.workstation, "");
    }

    #[test]
    fn descriptor_region_is_required() {
        let serialized = sample().serialize();
        assert!(
            Authenticate::deserialize::<nom::error::Error<&[u8]>>(&serialized[..40]).is_err()
        );
    }
}
