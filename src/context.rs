use std::cell::RefCell;

/// Role granted to every successfully authenticated principal.
pub const ROLE_USER: &str = "ROLE_USER";

/// Resolved identity handed to the downstream request pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub name: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn authenticated(name: String) -> Self {
        Self {
            name,
            roles: vec![ROLE_USER.to_owned()],
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

thread_local! {
    static CURRENT_PRINCIPAL: RefCell<Option<Principal>> = const { RefCell::new(None) };
}

/// Request-scoped holder for the current authenticated principal.
///
/// The slot is thread-local and lives until the next evaluation on the same
/// thread clears it, matching a thread-per-request server model. Embedders on
/// work-stealing runtimes should consume the principal returned by the filter
/// directly instead of reading this slot across await points.
pub struct SecurityContext;

impl SecurityContext {
    pub fn publish(principal: Principal) {
        CURRENT_PRINCIPAL.with(|slot| *slot.borrow_mut() = Some(principal));
    }

    pub fn current() -> Option<Principal> {
        CURRENT_PRINCIPAL.with(|slot| slot.borrow().clone())
    }

    pub fn clear() {
        CURRENT_PRINCIPAL.with(|slot| *slot.borrow_mut() = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_clear() {
        SecurityContext::clear();
        assert_eq!(SecurityContext::current(), None);

        SecurityContext::publish(Principal::authenticated("CORP\\alice".into()));
        let principal = SecurityContext::current().unwrap();
        assert_eq!(principal.name, "CORP\\alice");
        assert!(principal.has_role(ROLE_USER));

        SecurityContext::clear();
        assert_eq!(SecurityContext::current(), None);
    }
}
