use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http::header::{AUTHORIZATION, CONTENT_TYPE, WWW_AUTHENTICATE};
use http::{HeaderValue, Request, Response, StatusCode};

use crate::config::FilterConfig;
use crate::context::{Principal, SecurityContext};
use crate::error::DecodeError;
use crate::identity::NtlmIdentity;
use crate::messages::{
    build_challenge, decode_authenticate, decode_header, MessageType, Negotiate, Wire,
};

const NTLM_SCHEME: &str = "NTLM";
const AUTH_REQUIRED_BODY: &str = r#"{"error":"NTLM Authentication Required"}"#;

/// Protocol outcome of one `Authorization` header evaluation.
///
/// There is no cross-request state: the handshake stage is entirely encoded
/// in which message the client presented on this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeOutcome {
    /// A Type 2 message the client must answer. Sent after a Type 1.
    ChallengeRequired(Vec<u8>),
    /// A Type 3 message carried a usable identity.
    Authenticated(NtlmIdentity),
    /// Anything else: absent header, foreign scheme, malformed token, or a
    /// message that does not advance the handshake.
    Rejected,
}

/// What the embedding pipeline should do with the request.
#[derive(Debug)]
pub enum FilterDecision {
    /// Terminate the request with this response.
    Respond(Response<String>),
    /// Let the request continue; the principal has been published.
    Forward(Principal),
}

/// Per-request NTLM handshake evaluator.
///
/// Holds only immutable configuration, so one instance serves arbitrarily
/// many concurrent requests.
#[derive(Debug, Default)]
pub struct NtlmFilter {
    config: FilterConfig,
}

impl NtlmFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Pure classifier: maps the `Authorization` header value to a protocol
    /// outcome. Every decode failure downgrades to `Rejected`, so the client
    /// cannot distinguish malformed input from an early handshake stage.
    pub fn evaluate(&self, authorization: Option<&str>) -> HandshakeOutcome {
        let Some(header) = authorization else {
            log::debug!("no authorization header, requesting NTLM handshake");
            return HandshakeOutcome::Rejected;
        };
        let Some(token) = header.strip_prefix("NTLM ") else {
            log::debug!("unsupported authorization scheme");
            return HandshakeOutcome::Rejected;
        };
        let message = match BASE64.decode(token.trim()) {
            Ok(message) => message,
            Err(e) => {
                log::debug!("authorization token is not valid base64: {e}");
                return HandshakeOutcome::Rejected;
            }
        };

        match decode_header(&message) {
            Ok(MessageType::Negotiate) => {
                match Negotiate::deserialize::<nom::error::Error<&[u8]>>(&message) {
                    Ok((_, negotiate)) => log::debug!(
                        "negotiate: flags {:?}, domain {:?}, workstation {:?}",
                        negotiate.negotiate_flags,
                        negotiate.get_domain_name(),
                        negotiate.get_workstation(),
                    ),
                    Err(_) => log::debug!("negotiate body not parseable, challenging anyway"),
                }
                let challenge = self.config.challenge_source.next();
                HandshakeOutcome::ChallengeRequired(build_challenge(challenge))
            }
            Ok(MessageType::Challenge) => {
                log::warn!("received a Type 2 message from a client, restarting handshake");
                HandshakeOutcome::Rejected
            }
            Ok(MessageType::Authenticate) => match Self::resolve_identity(&message) {
                Ok(identity) => HandshakeOutcome::Authenticated(identity),
                Err(e) => {
                    log::debug!("authenticate message rejected: {e}");
                    HandshakeOutcome::Rejected
                }
            },
            Err(e) => {
                log::debug!("undecodable NTLM token: {e}");
                HandshakeOutcome::Rejected
            }
        }
    }

    fn resolve_identity(message: &[u8]) -> Result<NtlmIdentity, DecodeError> {
        let identity = decode_authenticate(message)?;
        if identity.username.is_empty() {
            return Err(DecodeError::EmptyUsername);
        }
        Ok(identity)
    }

    /// Evaluates `request` and translates the outcome into an HTTP decision.
    ///
    /// Clears the security-context slot first: a principal published by an
    /// earlier request on this thread never leaks into the current one.
    pub fn filter<B>(&self, request: &Request<B>) -> FilterDecision {
        SecurityContext::clear();

        let authorization = request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match self.evaluate(authorization) {
            HandshakeOutcome::Rejected => FilterDecision::Respond(Self::bare_challenge()),
            HandshakeOutcome::ChallengeRequired(message) => {
                FilterDecision::Respond(Self::type2_challenge(&message))
            }
            HandshakeOutcome::Authenticated(identity) => {
                let principal = Principal::authenticated(identity.full_username());
                log::info!("NTLM authentication successful: {}", principal.name);
                SecurityContext::publish(principal.clone());
                FilterDecision::Forward(principal)
            }
        }
    }

    fn bare_challenge() -> Response<String> {
        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(WWW_AUTHENTICATE, HeaderValue::from_static(NTLM_SCHEME))
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(AUTH_REQUIRED_BODY.to_owned())
            .expect("static response must build")
    }

    fn type2_challenge(message: &[u8]) -> Response<String> {
        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .header(
                WWW_AUTHENTICATE,
                format!("{NTLM_SCHEME} {}", BASE64.encode(message)),
            )
            .body(String::new())
            .expect("challenge response must build")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ROLE_USER;
    use crate::messages::{Authenticate, CHALLENGE_LEN};
    use pretty_assertions::assert_eq;

    // 12-byte Type 1: signature + type field, no flags
    const NEGOTIATE_TOKEN: &str = "NTLM TlRMTVNTUAABAAAA";

    fn init_logs() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn request(authorization: Option<&str>) -> Request<()> {
        let mut builder = Request::builder().uri("/api/user");
        if let Some(value) = authorization {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap()
    }

    fn authenticate_token(domain: &str, user: &str, workstation: &str) -> String {
        let message = Authenticate {
            domain: domain.into(),
            user: user.into(),
            workstation: workstation.into(),
            ..Default::default()
        };
        format!("NTLM {}", BASE64.encode(message.serialize()))
    }

    fn expect_response(decision: FilterDecision) -> Response<String> {
        match decision {
            FilterDecision::Respond(response) => response,
            FilterDecision::Forward(principal) => {
                panic!("expected a response, got forward of {principal:?}")
            }
        }
    }

    #[test]
    fn missing_header_gets_bare_challenge() {
        init_logs();
        let filter = NtlmFilter::default();
        let response = expect_response(filter.filter(&request(None)));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "NTLM");
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(
            response.body(),
            r#"{"error":"NTLM Authentication Required"}"#
        );
    }

    #[test]
    fn foreign_scheme_gets_bare_challenge() {
        let filter = NtlmFilter::default();
        let response =
            expect_response(filter.filter(&request(Some("Bearer abcdef"))));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "NTLM");
    }

    #[test]
    fn invalid_base64_gets_bare_challenge() {
        let filter = NtlmFilter::default();
        assert_eq!(
            filter.evaluate(Some("NTLM %%%not-base64%%%")),
            HandshakeOutcome::Rejected
        );
    }

    #[test]
    fn negotiate_gets_type2_challenge() {
        init_logs();
        let filter = NtlmFilter::default();
        let response = expect_response(filter.filter(&request(Some(NEGOTIATE_TOKEN))));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let value = response.headers()[WWW_AUTHENTICATE].to_str().unwrap();
        let token = value.strip_prefix("NTLM ").unwrap();
        let message = BASE64.decode(token).unwrap();
        assert_eq!(message.len(), CHALLENGE_LEN);
        assert_eq!(&message[..8], b"NTLMSSP\0");
        assert_eq!(&message[8..12], [0x02, 0x00, 0x00, 0x00]);
        assert!(response.body().is_empty());
    }

    #[test]
    fn challenge_emission_is_stateless() {
        let filter = NtlmFilter::default();
        let first = filter.evaluate(Some(NEGOTIATE_TOKEN));
        let second = filter.evaluate(Some(NEGOTIATE_TOKEN));
        assert!(matches!(first, HandshakeOutcome::ChallengeRequired(_)));
        assert_eq!(first, second);
    }

    #[test]
    fn type2_from_client_gets_bare_challenge() {
        let filter = NtlmFilter::default();
        let token = format!("NTLM {}", BASE64.encode(build_challenge([0u8; 8])));
        assert_eq!(filter.evaluate(Some(&token)), HandshakeOutcome::Rejected);
    }

    #[test]
    fn authenticate_forwards_with_principal() {
        init_logs();
        let filter = NtlmFilter::default();
        let token = authenticate_token("CORP", "alice", "WKS1");
        match filter.filter(&request(Some(&token))) {
            FilterDecision::Forward(principal) => {
                assert_eq!(principal.name, "CORP\\alice");
                assert!(principal.has_role(ROLE_USER));
                assert_eq!(SecurityContext::current(), Some(principal));
            }
            FilterDecision::Respond(response) => {
                panic!("expected forward, got {:?}", response.status())
            }
        }
    }

    #[test]
    fn authenticate_without_domain_uses_bare_username() {
        let filter = NtlmFilter::default();
        let token = authenticate_token("", "alice", "");
        match filter.evaluate(Some(&token)) {
            HandshakeOutcome::Authenticated(identity) => {
                assert_eq!(identity.full_username(), "alice");
            }
            other => panic!("expected authentication, got {other:?}"),
        }
    }

    #[test]
    fn empty_username_falls_back_to_bare_challenge() {
        let filter = NtlmFilter::default();
        let token = authenticate_token("CORP", "", "WKS1");
        let response = expect_response(filter.filter(&request(Some(&token))));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "NTLM");
        assert_eq!(SecurityContext::current(), None);
    }

    #[test]
    fn stale_principal_is_cleared_on_next_evaluation() {
        let filter = NtlmFilter::default();
        let token = authenticate_token("CORP", "alice", "WKS1");
        filter.filter(&request(Some(&token)));
        assert!(SecurityContext::current().is_some());

        filter.filter(&request(None));
        assert_eq!(SecurityContext::current(), None);
    }
}
