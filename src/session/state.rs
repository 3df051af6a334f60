use crate::identity::Identity;

/// Local belief about who is signed in.
///
/// While `initializing` is true the identity comes from cache and has not
/// been confirmed by the provider yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    identity: Option<Identity>,
    initializing: bool,
}

/// Which top-level screen the session state routes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthGate {
    /// Initial session query still in flight.
    Pending,
    /// No session; show the sign-in / sign-up form.
    SignIn,
    /// Confirmed session; show the main app.
    App,
}

impl SessionState {
    /// State at process start: nothing known yet.
    #[must_use]
    pub fn initializing() -> Self {
        Self {
            identity: None,
            initializing: true,
        }
    }

    /// Confirmed state carrying `identity`.
    #[must_use]
    pub fn resolved(identity: Option<Identity>) -> Self {
        Self {
            identity,
            initializing: false,
        }
    }

    #[must_use]
    pub fn is_initializing(&self) -> bool {
        self.initializing
    }

    /// Stored identity, confirmed or not.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Identity, but only once the provider has confirmed it.
    #[must_use]
    pub fn confirmed_identity(&self) -> Option<&Identity> {
        if self.initializing {
            None
        } else {
            self.identity.as_ref()
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.confirmed_identity().is_some()
    }

    #[must_use]
    pub fn gate(&self) -> AuthGate {
        match (self.initializing, &self.identity) {
            (true, _) => AuthGate::Pending,
            (false, None) => AuthGate::SignIn,
            (false, Some(_)) => AuthGate::App,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AccountUser;

    fn identity() -> Identity {
        Identity::new(AccountUser::new("user-1"), "token")
    }

    #[test]
    fn starts_pending_without_identity() {
        let state = SessionState::default();
        assert!(state.is_initializing());
        assert!(state.identity().is_none());
        assert_eq!(state.gate(), AuthGate::Pending);
    }

    #[test]
    fn resolved_without_identity_routes_to_sign_in() {
        let state = SessionState::resolved(None);
        assert_eq!(state.gate(), AuthGate::SignIn);
        assert!(!state.is_authenticated());
    }

    #[test]
    fn resolved_with_identity_routes_to_app() {
        let state = SessionState::resolved(Some(identity()));
        assert_eq!(state.gate(), AuthGate::App);
        assert_eq!(state.confirmed_identity(), Some(&identity()));
    }

    #[test]
    fn cached_identity_is_not_authoritative_while_initializing() {
        let state = SessionState {
            identity: Some(identity()),
            initializing: true,
        };
        assert!(state.identity().is_some());
        assert!(state.confirmed_identity().is_none());
        assert_eq!(state.gate(), AuthGate::Pending);
    }
}
