use thiserror::Error;

/// Validation failures on untrusted NTLMSSP input.
///
/// These are data-level errors, never fatal: the filter downgrades every
/// variant to a fresh challenge so the client cannot tell a malformed token
/// apart from an early handshake stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing or malformed NTLMSSP signature")]
    MalformedSignature,

    #[error("unknown NTLMSSP message type {0:#010x}")]
    UnknownMessageType(u32),

    #[error("message truncated: expected at least {expected} bytes, got {actual}")]
    TruncatedMessage { expected: usize, actual: usize },

    #[error("authenticate message carries an empty user name")]
    EmptyUsername,
}
