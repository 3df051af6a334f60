use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use time::{Duration, OffsetDateTime};
use tokio::sync::broadcast;
use ulid::Ulid;

use super::traits::IdentityProvider;
use crate::error::Error;
use crate::identity::{AccountUser, AuthChange, Credentials, Identity, SignUpOutcome};
use crate::types::UserId;

const CHANGE_CAPACITY: usize = 64;
const DEFAULT_TOKEN_TTL: Duration = Duration::hours(1);

struct Account {
    user: AccountUser,
    password: String,
    confirmed: bool,
}

/// In-process identity provider for offline builds, demos and tests.
///
/// Accounts and the current session live in memory only. Every transition
/// it causes is published on the change stream, the same way the hosted
/// backend client does.
pub struct MemoryIdentityProvider {
    accounts: Mutex<HashMap<String, Account>>,
    session: Mutex<Option<Identity>>,
    changes: broadcast::Sender<AuthChange>,
    require_confirmation: bool,
    reachable: AtomicBool,
    token_ttl: Duration,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl MemoryIdentityProvider {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            changes,
            require_confirmation: false,
            reachable: AtomicBool::new(true),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }

    /// Register a confirmed account.
    #[must_use]
    pub fn with_account(mut self, email: &str, password: &str) -> Self {
        let user = AccountUser::new(UserId(Ulid::new().to_string())).with_email(email.trim());
        self.accounts
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                email_key(email),
                Account {
                    user,
                    password: password.to_owned(),
                    confirmed: true,
                },
            );
        self
    }

    /// Start with a session already held, as if restored from storage.
    #[must_use]
    pub fn with_session(mut self, identity: Identity) -> Self {
        *self.session.get_mut().unwrap_or_else(PoisonError::into_inner) = Some(identity);
        self
    }

    /// Require email confirmation before sign-ups get a session.
    #[must_use]
    pub fn with_email_confirmation(mut self) -> Self {
        self.require_confirmation = true;
        self
    }

    /// Override the lifetime of issued access tokens.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Mark an account's email as verified. Returns `false` if unknown.
    pub fn confirm_email(&self, email: &str) -> bool {
        match lock(&self.accounts).get_mut(&email_key(email)) {
            Some(account) => {
                account.confirmed = true;
                true
            }
            None => false,
        }
    }

    /// Simulate losing or regaining connectivity.
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::Release);
    }

    /// Publish a transition that happened elsewhere (another device, a
    /// background refresh). The held session follows the notification.
    pub fn publish(&self, change: AuthChange) {
        // Held across the send so notifications go out in write order.
        let mut session = lock(&self.session);
        *session = change.session.clone();
        // No receivers is not an error: nobody is listening yet.
        let _ = self.changes.send(change);
    }

    /// Reissue tokens for the held session and publish `TokenRefreshed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if no session is held, or
    /// [`Error::Unreachable`] while offline.
    pub fn refresh_session(&self) -> Result<Identity, Error> {
        self.ensure_reachable()?;
        let user = lock(&self.session)
            .as_ref()
            .map(|identity| identity.user.clone())
            .ok_or_else(|| Error::Rejected {
                operation: "refresh session",
                status: Some(400),
                code: Some("refresh_token_not_found".into()),
                detail: "No session to refresh".into(),
            })?;
        let identity = self.issue(user);
        self.publish(AuthChange::token_refreshed(identity.clone()));
        Ok(identity)
    }

    fn ensure_reachable(&self) -> Result<(), Error> {
        if self.reachable.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::Unreachable("identity provider offline".into()))
        }
    }

    fn issue(&self, user: AccountUser) -> Identity {
        let identity = Identity::new(user, format!("mem-access-{}", Ulid::new()))
            .with_refresh_token(format!("mem-refresh-{}", Ulid::new()));
        // A TTL past the representable range means the token never expires.
        match OffsetDateTime::now_utc().checked_add(self.token_ttl) {
            Some(at) => identity.with_expires_at(at),
            None => identity,
        }
    }
}

impl Default for MemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MemoryIdentityProvider {
    async fn current_session(&self) -> Result<Option<Identity>, Error> {
        self.ensure_reachable()?;
        Ok(lock(&self.session).clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Identity, Error> {
        self.ensure_reachable()?;
        let user = {
            let accounts = lock(&self.accounts);
            let account = accounts
                .get(&email_key(&credentials.email))
                .filter(|account| account.password == credentials.password)
                .ok_or_else(|| Error::Rejected {
                    operation: "sign in",
                    status: Some(400),
                    code: Some("invalid_credentials".into()),
                    detail: "Invalid login credentials".into(),
                })?;
            if !account.confirmed {
                return Err(Error::Rejected {
                    operation: "sign in",
                    status: Some(400),
                    code: Some("email_not_confirmed".into()),
                    detail: "Email not confirmed".into(),
                });
            }
            account.user.clone()
        };

        let identity = self.issue(user);
        self.publish(AuthChange::signed_in(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, Error> {
        self.ensure_reachable()?;
        let key = email_key(&credentials.email);
        let user = {
            let mut accounts = lock(&self.accounts);
            if accounts.contains_key(&key) {
                return Err(Error::Rejected {
                    operation: "sign up",
                    status: Some(422),
                    code: Some("user_already_exists".into()),
                    detail: "User already registered".into(),
                });
            }
            let user = AccountUser::new(UserId(Ulid::new().to_string()))
                .with_email(credentials.email.clone());
            accounts.insert(
                key,
                Account {
                    user: user.clone(),
                    password: credentials.password.clone(),
                    confirmed: !self.require_confirmation,
                },
            );
            user
        };

        if self.require_confirmation {
            return Ok(SignUpOutcome::ConfirmationPending { user });
        }
        let identity = self.issue(user);
        self.publish(AuthChange::signed_in(identity.clone()));
        Ok(SignUpOutcome::SignedIn(identity))
    }

    async fn sign_out(&self) -> Result<(), Error> {
        self.ensure_reachable()?;
        self.publish(AuthChange::signed_out());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::AuthEvent;

    fn creds(email: &str, password: &str) -> Credentials {
        Credentials::new(email, password).unwrap()
    }

    #[tokio::test]
    async fn sign_in_publishes_signed_in() {
        let provider = MemoryIdentityProvider::new().with_account("a@example.com", "pw");
        let mut changes = provider.subscribe();

        let identity = provider
            .sign_in_with_password(&creds("A@example.com", "pw"))
            .await
            .unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.event, AuthEvent::SignedIn);
        assert_eq!(change.session, Some(identity.clone()));
        assert_eq!(provider.current_session().await.unwrap(), Some(identity));
    }

    #[tokio::test]
    async fn wrong_password_is_rejected_without_notification() {
        let provider = MemoryIdentityProvider::new().with_account("a@example.com", "pw");
        let mut changes = provider.subscribe();

        let err = provider
            .sign_in_with_password(&creds("a@example.com", "nope"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), Some("invalid_credentials"));
        assert!(matches!(
            changes.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn sign_up_with_confirmation_has_no_session() {
        let provider = MemoryIdentityProvider::new().with_email_confirmation();

        let outcome = provider.sign_up(&creds("new@example.com", "pw")).await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::ConfirmationPending { .. }));

        let err = provider
            .sign_in_with_password(&creds("new@example.com", "pw"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some("email_not_confirmed"));

        assert!(provider.confirm_email("new@example.com"));
        assert!(
            provider
                .sign_in_with_password(&creds("new@example.com", "pw"))
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn duplicate_sign_up_is_rejected() {
        let provider = MemoryIdentityProvider::new().with_account("a@example.com", "pw");
        let err = provider.sign_up(&creds("a@example.com", "pw2")).await.unwrap_err();
        assert_eq!(err.code(), Some("user_already_exists"));
    }

    #[tokio::test]
    async fn offline_provider_is_unreachable() {
        let provider = MemoryIdentityProvider::new();
        provider.set_reachable(false);
        assert!(matches!(
            provider.current_session().await,
            Err(Error::Unreachable(_))
        ));
    }

    #[tokio::test]
    async fn refresh_requires_session_and_reissues_tokens() {
        let provider = MemoryIdentityProvider::new().with_account("a@example.com", "pw");
        assert!(provider.refresh_session().is_err());

        let first = provider
            .sign_in_with_password(&creds("a@example.com", "pw"))
            .await
            .unwrap();
        let mut changes = provider.subscribe();
        let refreshed = provider.refresh_session().unwrap();

        assert_eq!(refreshed.user, first.user);
        assert_ne!(refreshed.access_token, first.access_token);
        assert_eq!(changes.recv().await.unwrap().event, AuthEvent::TokenRefreshed);
    }

    #[tokio::test]
    async fn unbounded_token_ttl_issues_non_expiring_session() {
        let provider = MemoryIdentityProvider::new()
            .with_account("a@example.com", "pw")
            .with_token_ttl(Duration::MAX);

        let identity = provider
            .sign_in_with_password(&creds("a@example.com", "pw"))
            .await
            .unwrap();

        assert_eq!(identity.expires_at, None);
    }

    #[tokio::test]
    async fn concurrent_publishes_arrive_in_write_order() {
        let provider = MemoryIdentityProvider::new();
        let mut changes = provider.subscribe();
        let user = AccountUser::new(UserId::from("u-1"));

        std::thread::scope(|scope| {
            for worker in 0..8 {
                let provider = &provider;
                let user = user.clone();
                scope.spawn(move || {
                    for round in 0..4 {
                        if (worker + round) % 2 == 0 {
                            provider.publish(AuthChange::signed_out());
                        } else {
                            let token = format!("at-{worker}-{round}");
                            let identity = Identity::new(user.clone(), token);
                            provider.publish(AuthChange::token_refreshed(identity));
                        }
                    }
                });
            }
        });

        let mut last = None;
        while let Ok(change) = changes.try_recv() {
            last = Some(change.session);
        }
        assert_eq!(last, Some(provider.current_session().await.unwrap()));
    }
}
