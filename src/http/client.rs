use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::broadcast;

use super::config::BackendConfig;
use super::wire::{WireError, WireSession, WireSignUp};
use crate::error::Error;
use crate::identity::{AuthChange, Credentials, Identity, SignUpOutcome};
use crate::session::IdentityProvider;

const CHANGE_CAPACITY: usize = 64;

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// [`IdentityProvider`] backed by the hosted backend's auth REST API.
///
/// The current session is held in memory for the process lifetime; every
/// transition this client causes is published on its change stream.
pub struct HttpIdentityProvider {
    config: BackendConfig,
    http: reqwest::Client,
    session: RwLock<Option<Identity>>,
    changes: broadcast::Sender<AuthChange>,
}

impl HttpIdentityProvider {
    /// Create a client for `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] if the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self::with_http_client(config, http))
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(config: BackendConfig, http: reqwest::Client) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            config,
            http,
            session: RwLock::new(None),
            changes,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Exchange the held refresh token for a new session and publish
    /// `TokenRefreshed`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rejected`] if no refresh token is held or the
    /// backend refuses it, [`Error::Http`] on transport failure.
    pub async fn refresh_session(&self) -> Result<Identity, Error> {
        let refresh_token = self
            .held_session()
            .and_then(|identity| identity.refresh_token)
            .ok_or_else(|| Error::Rejected {
                operation: "refresh session",
                status: None,
                code: Some("refresh_token_not_found".into()),
                detail: "No refresh token held".into(),
            })?;

        let identity = self
            .post_session(
                "refresh session",
                "token?grant_type=refresh_token",
                &RefreshRequest {
                    refresh_token: &refresh_token,
                },
            )
            .await?;
        self.publish(AuthChange::token_refreshed(identity.clone()));
        Ok(identity)
    }

    fn held_session(&self) -> Option<Identity> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn publish(&self, change: AuthChange) {
        // Held across the send so notifications go out in write order.
        let mut session = self.session.write().unwrap_or_else(PoisonError::into_inner);
        *session = change.session.clone();
        tracing::debug!(event = ?change.event, "publishing session change");
        // No receivers is not an error: nobody is listening yet.
        let _ = self.changes.send(change);
    }

    fn request(&self, url: url::Url) -> reqwest::RequestBuilder {
        self.http
            .post(url)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
    }

    async fn post_session<B: Serialize + ?Sized>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Identity, Error> {
        let response = self
            .request(self.config.auth_endpoint(path)?)
            .json(body)
            .send()
            .await?;
        let response = Self::ensure_success(response, operation).await?;
        let session: WireSession = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("{operation}: {e}")))?;
        Ok(session.into_identity(OffsetDateTime::now_utc()))
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let parsed: WireError = serde_json::from_str(&body).unwrap_or_default();
        Err(Error::Rejected {
            operation,
            status: Some(status),
            code: parsed.code(),
            detail: parsed.detail().unwrap_or(body),
        })
    }
}

impl IdentityProvider for HttpIdentityProvider {
    async fn current_session(&self) -> Result<Option<Identity>, Error> {
        let Some(identity) = self.held_session() else {
            return Ok(None);
        };
        if !identity.is_expired_at(OffsetDateTime::now_utc()) {
            return Ok(Some(identity));
        }
        if identity.refresh_token.is_none() {
            tracing::debug!("held session expired without refresh token");
            self.publish(AuthChange::signed_out());
            return Ok(None);
        }
        self.refresh_session().await.map(Some)
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthChange> {
        self.changes.subscribe()
    }

    async fn sign_in_with_password(&self, credentials: &Credentials) -> Result<Identity, Error> {
        let identity = self
            .post_session("sign in", "token?grant_type=password", credentials)
            .await?;
        self.publish(AuthChange::signed_in(identity.clone()));
        Ok(identity)
    }

    async fn sign_up(&self, credentials: &Credentials) -> Result<SignUpOutcome, Error> {
        let response = self
            .request(self.config.auth_endpoint("signup")?)
            .json(credentials)
            .send()
            .await?;
        let response = Self::ensure_success(response, "sign up").await?;
        let body: WireSignUp = response
            .json()
            .await
            .map_err(|e| Error::Decode(format!("sign up: {e}")))?;

        match body {
            WireSignUp::Session(session) => {
                let identity = session.into_identity(OffsetDateTime::now_utc());
                self.publish(AuthChange::signed_in(identity.clone()));
                Ok(SignUpOutcome::SignedIn(identity))
            }
            WireSignUp::User(user) => Ok(SignUpOutcome::ConfirmationPending { user: user.into() }),
        }
    }

    async fn sign_out(&self) -> Result<(), Error> {
        if let Some(identity) = self.held_session() {
            let response = self
                .http
                .post(self.config.auth_endpoint("logout")?)
                .header("apikey", &self.config.anon_key)
                .bearer_auth(&identity.access_token)
                .send()
                .await?;
            // An already-invalid token still means "signed out".
            if !matches!(response.status().as_u16(), 401 | 403 | 404) {
                Self::ensure_success(response, "sign out").await?;
            }
        }
        self.publish(AuthChange::signed_out());
        Ok(())
    }
}
