//! Server-side NTLM authentication for HTTP services.
//!
//! Drives the three-step NTLM handshake over stateless HTTP requests: a
//! request without credentials is answered with `401` and
//! `WWW-Authenticate: NTLM`, a Type 1 message is answered with a Type 2
//! challenge, and a Type 3 message yields the claimed identity, which is
//! published for the downstream pipeline.
//!
//! # Security properties
//!
//! This crate reproduces the trust model of the system it stands in for: the
//! Type 3 response is **not** verified against the issued challenge or any
//! credential store, so the client-asserted identity is accepted outright,
//! and the default challenge bytes are a fixed pattern rather than a random
//! nonce (see [`ChallengeSource`]). Deploy it only where a fronting layer
//! provides the actual authentication guarantee.

pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod identity;
pub mod messages;

pub use config::{ChallengeSource, FilterConfig};
pub use context::{Principal, SecurityContext, ROLE_USER};
pub use error::DecodeError;
pub use filter::{FilterDecision, HandshakeOutcome, NtlmFilter};
pub use identity::NtlmIdentity;
