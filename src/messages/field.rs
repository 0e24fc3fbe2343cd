use std::io;
use std::ops::Range;

use nom::error::context;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;

use crate::messages::{
    utils::{write_u16, write_u32},
    NomError, Wire,
};

/// Security buffer descriptor: `(length, allocated length, offset)` pointing
/// into the enclosing message buffer.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub len: u16,
    pub max_len: u16,
    pub offset: u32,
}

impl<'a> Wire<'a> for Field {
    fn serialize_into<W>(&self, writer: &mut W) -> io::Result<usize>
    where
        W: io::Write,
    {
        let mut written = 0;
        written += write_u16(writer, self.len)?;
        written += write_u16(writer, self.max_len)?;
        written += write_u32(writer, self.offset)?;
        Ok(written)
    }

    fn deserialize<E>(input: &'a [u8]) -> nom::IResult<&'a [u8], Self, E>
    where
        E: NomError<'a>,
    {
        let (rest, (len, max_len, offset)) =
            context("Field", tuple((le_u16, le_u16, le_u32)))(input)?;

        Ok((
            rest,
            Self {
                len,
                max_len,
                offset,
            },
        ))
    }
}

impl Field {
    pub const fn zeroed() -> Self {
        Self {
            len: 0,
            max_len: 0,
            offset: 0,
        }
    }

    pub const fn empty_at(offset: u32) -> Self {
        Self {
            len: 0,
            max_len: 0,
            offset,
        }
    }

    fn range(&self) -> Range<usize> {
        let start = self.offset as usize;
        let end = start + self.len as usize;
        start..end
    }

    /// Checked payload resolution. A descriptor pointing outside `input`
    /// resolves to an empty slice, never an out-of-bounds read.
    pub fn resolve<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        match input.get(self.range()) {
            Some(data) => data,
            None => {
                log::warn!(
                    "security buffer {:?} out of range for a {} byte message",
                    self,
                    input.len()
                );
                &[]
            }
        }
    }

    /// Writes the descriptor to `writer` and the payload bytes into `data`.
    /// Offsets are absolute, so `data` must already be sized to the fixed
    /// message header when the first field is appended.
    pub(super) fn append<W>(bytes: &[u8], data: &mut Vec<u8>, writer: &mut W) -> io::Result<usize>
    where
        W: io::Write,
    {
        let field = if bytes.is_empty() {
            Self::zeroed()
        } else {
            let offset: u32 = data.len().try_into().expect("Cannot fit usize into u32");
            let len: u16 = bytes.len().try_into().expect("Cannot fit usize into u16");
            data.extend_from_slice(bytes);
            Self {
                len,
                max_len: len,
                offset,
            }
        };
        field.serialize_into(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_in_range() {
        let buffer = b"NTLMSSP\0payload";
        let field = Field {
            len: 7,
            max_len: 7,
            offset: 8,
        };
        assert_eq!(field.resolve(&buffer[..]), b"payload");
    }

    #[test]
    fn resolve_out_of_range_is_empty() {
        let buffer = [0u8; 16];
        let field = Field {
            len: 16,
            max_len: 16,
            offset: 8,
        };
        assert_eq!(field.resolve(&buffer[..]), &[] as &[u8]);

        let field = Field {
            len: 1,
            max_len: 1,
            offset: u32::MAX,
        };
        assert_eq!(field.resolve(&buffer[..]), &[] as &[u8]);
    }

    #[test]
    fn append_empty_writes_zeroed_descriptor() {
        let mut data = vec![0u8; 4];
        let mut header = Vec::new();
        Field::append(&[], &mut data, &mut header).unwrap();
        assert_eq!(header, [0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(data.len(), 4);
    }

    #[test]
    fn append_records_absolute_offset() {
        let mut data = vec![0u8; 4];
        let mut header = Vec::new();
        Field::append(b"ab", &mut data, &mut header).unwrap();
        assert_eq!(header, [2, 0, 2, 0, 4, 0, 0, 0]);
        assert_eq!(&data[4..], b"ab");
    }
}
