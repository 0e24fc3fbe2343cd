use std::fmt;

/// Identity claimed by an NTLM Type 3 message.
///
/// Extracted losslessly from the wire format. The claim is never checked
/// against the issued challenge or a credential store.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NtlmIdentity {
    pub domain: String,
    pub username: String,
    pub workstation: String,
}

impl NtlmIdentity {
    /// `DOMAIN\user` when a domain was supplied, bare user name otherwise.
    pub fn full_username(&self) -> String {
        if self.domain.is_empty() {
            self.username.clone()
        } else {
            format!("{}\\{}", self.domain, self.username)
        }
    }
}

impl fmt::Display for NtlmIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_username())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_username_with_domain() {
        let identity = NtlmIdentity {
            domain: "CORP".into(),
            username: "alice".into(),
            workstation: "WKS1".into(),
        };
        assert_eq!(identity.full_username(), "CORP\\alice");
    }

    #[test]
    fn full_username_without_domain() {
        let identity = NtlmIdentity {
            domain: String::new(),
            username: "alice".into(),
            workstation: String::new(),
        };
        assert_eq!(identity.full_username(), "alice");
    }
}
