use nom::bytes::complete::tag;
use nom::combinator::{opt, verify};
use nom::error::context;
use nom::number::complete::le_u32;
use nom::sequence::tuple;

use crate::messages::{
    flags::{self, Flags},
    utils::write_u32,
    Field, NomError, Wire, SIGNATURE,
};

const MESSAGE_TYPE: u32 = 0x00000001;

/// Type 1 message. The filter only acts on the fact that one arrived; the
/// flags and the optional OEM-encoded names are decoded for diagnostics.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct Negotiate {
    pub negotiate_flags: Flags,
    domain_name: Option<String>,
    workstation: Option<String>,
}

impl Negotiate {
    pub fn set_domain_name(&mut self, domain_name: Option<String>) -> &mut Self {
        self.domain_name = domain_name;
        if self.domain_name.is_some() {
            self.negotiate_flags
                .set_flag(flags::NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED);
        } else {
            self.negotiate_flags
                .clear_flag(flags::NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED);
        }
        self
    }

    pub fn get_domain_name(&self) -> Option<&String> {
        self.domain_name.as_ref()
    }

    pub fn set_workstation(&mut self, workstation: Option<String>) -> &mut Self {
        self.workstation = workstation;
        if self.workstation.is_some() {
            self.negotiate_flags
                .set_flag(flags::NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED);
        } else {
            self.negotiate_flags
                .clear_flag(flags::NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED);
        }
        self
    }

    pub fn get_workstation(&self) -> Option<&String> {
        self.workstation.as_ref()
    }
}

fn oem_string(field: &Field, input: &[u8], supplied: bool) -> Option<String> {
    if !supplied || field.len == 0 {
        return None;
    }
    let data = field.resolve(input);
    if data.is_empty() {
        None
    } else {
        Some(String::from_utf8_lossy(data).into_owned())
    }
}

impl<'a> Wire<'a> for Negotiate {
    fn serialize_into<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        const PAYLOAD_OFFSET: usize = 32;

        let mut payload = Vec::with_capacity(PAYLOAD_OFFSET * 2);
        payload.resize(PAYLOAD_OFFSET, 0);

        writer.write_all(&SIGNATURE[..])?;
        let mut written = SIGNATURE.len();
        written += write_u32(writer, MESSAGE_TYPE)?;
        written += self.negotiate_flags.serialize_into(writer)?;
        written += Field::append(
            self.domain_name.as_deref().map(str::as_bytes).unwrap_or_default(),
            &mut payload,
            writer,
        )?;
        written += Field::append(
            self.workstation.as_deref().map(str::as_bytes).unwrap_or_default(),
            &mut payload,
            writer,
        )?;

        debug_assert_eq!(written, PAYLOAD_OFFSET);
        writer.write_all(&payload[PAYLOAD_OFFSET..])?;
        written += payload.len() - PAYLOAD_OFFSET;

        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        // Clients may send anything from the 12-byte minimal form up to the
        // full descriptor layout; whatever is absent decodes to defaults.
        let (rest, _) = context(
            "Negotiate",
            tuple((tag(SIGNATURE), verify(le_u32, |mt| *mt == MESSAGE_TYPE))),
        )(input)?;
        let (rest, negotiate_flags) = opt(Flags::deserialize)(rest)?;
        let negotiate_flags = negotiate_flags.unwrap_or_default();
        let (rest, descriptors) = opt(tuple((Field::deserialize, Field::deserialize)))(rest)?;

        let (domain_name, workstation) = match descriptors {
            Some((domain_field, workstation_field)) => (
                oem_string(
                    &domain_field,
                    input,
                    negotiate_flags.has_flag(flags::NTLMSSP_NEGOTIATE_OEM_DOMAIN_SUPPLIED),
                ),
                oem_string(
                    &workstation_field,
                    input,
                    negotiate_flags.has_flag(flags::NTLMSSP_NEGOTIATE_OEM_WORKSTATION_SUPPLIED),
                ),
            ),
            None => (None, None),
        };

        Ok((
            rest,
            Self {
                negotiate_flags,
                domain_name,
                workstation,
            },
        ))
    }
}
