use std::future::Future;

use tokio::sync::broadcast;

use crate::error::Error;
use crate::identity::{AuthChange, Credentials, Identity, SignUpOutcome};

/// External identity provider backing a [`SessionController`](super::SessionController).
///
/// Passed into the controller explicitly so tests and offline builds can
/// substitute [`MemoryIdentityProvider`](super::MemoryIdentityProvider).
///
/// # Contract
///
/// Implementations must:
/// - Publish an [`AuthChange`] on every session transition they cause
///   (sign-in, sign-out, token refresh), in the order the transitions happen
/// - Return failures as [`Error`] values; classification happens in the
///   session layer
///
/// # Example
///
/// ```rust,ignore
/// impl IdentityProvider for MyBackend {
///     async fn current_session(&self) -> Result<Option<Identity>, Error> {
///         Ok(self.cache.read().await.clone())
///     }
///
///     fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
///         self.changes.subscribe()
///     }
///     // ...
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// One-shot query for the session the provider currently holds.
    fn current_session(&self) -> impl Future<Output = Result<Option<Identity>, Error>> + Send;

    /// Stream of session-change notifications, starting with the next one.
    fn subscribe(&self) -> broadcast::Receiver<AuthChange>;

    /// Open a session with email and password.
    fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<Identity, Error>> + Send;

    /// Register a new account.
    fn sign_up(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<SignUpOutcome, Error>> + Send;

    /// Invalidate the current session.
    fn sign_out(&self) -> impl Future<Output = Result<(), Error>> + Send;
}
