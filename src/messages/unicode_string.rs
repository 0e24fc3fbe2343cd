use std::fmt;
use std::ops::Deref;

/// UTF-16LE payload text of an NTLMSSP security buffer.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct UnicodeString(String);

impl Deref for UnicodeString {
    type Target = String;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for UnicodeString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UnicodeString {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl UnicodeString {
    /// Decodes UTF-16LE bytes. An odd trailing byte is dropped and invalid
    /// code units are replaced instead of failing the whole message.
    pub fn from_utf16le(data: &[u8]) -> Self {
        if data.len() % 2 != 0 {
            log::warn!("UTF-16 payload has an odd byte count ({})", data.len());
        }
        let units: Vec<u16> = data
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self(String::from_utf16_lossy(&units))
    }

    pub fn to_utf16le(&self) -> Vec<u8> {
        self.0
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}
