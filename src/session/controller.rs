use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::error::AuthError;
use super::state::SessionState;
use super::traits::IdentityProvider;
use crate::identity::{AuthChange, Credentials, Identity, SignUpOutcome};

type Listener = Box<dyn FnMut(&SessionState) + Send>;

struct Observer {
    id: u64,
    on_change: Listener,
}

struct Pump {
    generation: u64,
    handle: JoinHandle<()>,
}

struct Inner {
    state: SessionState,
    observers: Vec<Observer>,
    next_id: u64,
    pump: Option<Pump>,
}

impl Inner {
    fn notify(&mut self) {
        let state = &self.state;
        for observer in &mut self.observers {
            (observer.on_change)(state);
        }
    }
}

/// State shared between the controller, its subscriptions and the pump task.
struct Shared {
    // Cleared once by teardown, never set again.
    alive: AtomicBool,
    inner: Mutex<Inner>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// First mutation point: resolution of the initial session query.
    fn resolve_initial(&self, identity: Option<Identity>) -> SessionState {
        let mut inner = self.lock();
        if !self.is_alive() {
            tracing::debug!("controller torn down; discarding initial session");
            return inner.state.clone();
        }
        if !inner.state.is_initializing() {
            tracing::debug!("session already confirmed by a change notification");
            return inner.state.clone();
        }
        tracing::debug!(authenticated = identity.is_some(), "initial session resolved");
        inner.state = SessionState::resolved(identity);
        inner.notify();
        inner.state.clone()
    }

    /// Second mutation point: a notification drained by pump `generation`.
    ///
    /// Returns `false` once that pump has been retired.
    fn apply_change(&self, generation: u64, change: AuthChange) -> bool {
        let mut inner = self.lock();
        let current = inner
            .pump
            .as_ref()
            .is_some_and(|pump| pump.generation == generation);
        if !self.is_alive() || !current {
            return false;
        }
        tracing::debug!(
            event = ?change.event,
            authenticated = change.session.is_some(),
            "session change"
        );
        inner.state = SessionState::resolved(change.session);
        inner.notify();
        true
    }

    fn remove_observer(&self, id: u64) {
        let (removed, pump) = {
            let mut inner = self.lock();
            let removed = inner
                .observers
                .iter()
                .position(|o| o.id == id)
                .map(|index| inner.observers.remove(index));
            let pump = if inner.observers.is_empty() {
                inner.pump.take()
            } else {
                None
            };
            (removed, pump)
        };
        if let Some(pump) = pump {
            tracing::debug!(generation = pump.generation, "last subscriber gone; stopping pump");
            pump.handle.abort();
        }
        // Listeners may own subscriptions; drop them outside the lock.
        drop(removed);
    }

    fn teardown(&self) {
        if !self.alive.swap(false, Ordering::AcqRel) {
            return;
        }
        let (observers, pump) = {
            let mut inner = self.lock();
            (mem::take(&mut inner.observers), inner.pump.take())
        };
        if let Some(pump) = pump {
            pump.handle.abort();
        }
        tracing::debug!(observers = observers.len(), "session controller torn down");
        drop(observers);
    }
}

async fn pump(shared: Weak<Shared>, generation: u64, mut changes: broadcast::Receiver<AuthChange>) {
    loop {
        let change = match changes.recv().await {
            Ok(change) => change,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(
                    skipped,
                    "session notifications lagged; resuming at oldest retained"
                );
                continue;
            }
            Err(RecvError::Closed) => {
                tracing::debug!("identity provider closed its change stream");
                return;
            }
        };
        let Some(shared) = shared.upgrade() else {
            return;
        };
        if !shared.apply_change(generation, change) {
            return;
        }
    }
}

/// Handle returned by [`SessionController::subscribe`].
///
/// Disposing (or dropping) it guarantees the listener is never called again.
#[must_use = "dropping a Subscription disposes it immediately"]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
    disposed: AtomicBool,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            id: 0,
            shared: Weak::new(),
            disposed: AtomicBool::new(true),
        }
    }

    /// Stop receiving notifications. Safe to call repeatedly, and after the
    /// controller is gone.
    ///
    /// Must not be called from inside a listener.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(shared) = self.shared.upgrade() {
            shared.remove_observer(self.id);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.disposed.load(Ordering::Acquire)
            && self.shared.upgrade().is_some_and(|shared| shared.is_alive())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Owns the "who is signed in" lifecycle on top of an [`IdentityProvider`].
///
/// Session state changes at exactly two points: the resolution of
/// [`initialize`](Self::initialize) and notifications drained while at least
/// one [`Subscription`] is active. The auth operations never touch state
/// themselves; the provider's follow-up notification does.
///
/// # Example
///
/// ```rust,ignore
/// let controller = SessionController::new(Arc::new(provider));
/// let _sub = controller.subscribe(|state| render(state.gate()));
/// controller.initialize().await;
///
/// if let Err(e) = controller.sign_in(&email, &password).await {
///     show_notice(&e.to_string());
/// }
/// ```
pub struct SessionController<P> {
    provider: Arc<P>,
    shared: Arc<Shared>,
}

impl<P: IdentityProvider> SessionController<P> {
    #[must_use]
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            shared: Arc::new(Shared {
                alive: AtomicBool::new(true),
                inner: Mutex::new(Inner {
                    state: SessionState::initializing(),
                    observers: Vec::new(),
                    next_id: 1,
                    pump: None,
                }),
            }),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    /// Snapshot of the current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.shared.lock().state.clone()
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.shared.is_alive()
    }

    /// Query the provider for the current session and leave the
    /// initializing state.
    ///
    /// Only the first resolution counts. It is discarded if the controller
    /// was torn down while the query was in flight, or if a change
    /// notification already confirmed the state. A failed query resolves
    /// as "no session".
    pub async fn initialize(&self) -> SessionState {
        if !self.shared.is_alive() {
            return self.state();
        }
        let identity = match self.provider.current_session().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "initial session query failed");
                None
            }
        };
        self.shared.resolve_initial(identity)
    }

    /// Register `on_change` for every session update.
    ///
    /// Must be called from within a Tokio runtime: the first active
    /// subscription starts a task that drains the provider's change stream.
    /// Listeners run on that task with the controller locked, so they must
    /// not call back into the controller or dispose subscriptions.
    pub fn subscribe<F>(&self, on_change: F) -> Subscription
    where
        F: FnMut(&SessionState) + Send + 'static,
    {
        let mut inner = self.shared.lock();
        if !self.shared.is_alive() {
            tracing::warn!("subscribe called after teardown");
            return Subscription::inert();
        }

        if inner.pump.is_none() {
            let runtime = match tokio::runtime::Handle::try_current() {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::warn!(error = %e, "subscribe called outside a Tokio runtime");
                    return Subscription::inert();
                }
            };
            let generation = inner.next_id;
            inner.next_id += 1;
            let changes = self.provider.subscribe();
            let handle = runtime.spawn(pump(Arc::downgrade(&self.shared), generation, changes));
            inner.pump = Some(Pump { generation, handle });
            tracing::debug!(generation, "session change pump started");
        }

        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push(Observer {
            id,
            on_change: Box::new(on_change),
        });

        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
            disposed: AtomicBool::new(false),
        }
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingFields`] without contacting the provider
    /// when either field is blank, otherwise the classified provider failure.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let credentials = Credentials::new(email, password).ok_or(AuthError::MissingFields)?;
        self.provider
            .sign_in_with_password(&credentials)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "sign in failed");
                AuthError::from(e)
            })
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Same as [`sign_in`](Self::sign_in). A provider that requires email
    /// verification answers with [`SignUpOutcome::ConfirmationPending`], not
    /// an error.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpOutcome, AuthError> {
        let credentials = Credentials::new(email, password).ok_or(AuthError::MissingFields)?;
        self.provider.sign_up(&credentials).await.map_err(|e| {
            tracing::warn!(error = %e, "sign up failed");
            AuthError::from(e)
        })
    }

    /// Invalidate the current session.
    ///
    /// # Errors
    ///
    /// Returns the classified provider failure.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await.map_err(|e| {
            tracing::warn!(error = %e, "sign out failed");
            AuthError::from(e)
        })
    }

    /// Stop all notifications and discard any in-flight initial query.
    /// Idempotent; also runs on drop.
    pub fn teardown(&self) {
        self.shared.teardown();
    }
}

impl<P> Drop for SessionController<P> {
    fn drop(&mut self) {
        self.shared.teardown();
    }
}
