use serde::Deserialize;
use time::{Duration, OffsetDateTime};

use crate::identity::{AccountUser, Identity};
use crate::types::UserId;

/// User object returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireUser {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) email: Option<String>,
}

impl From<WireUser> for AccountUser {
    fn from(user: WireUser) -> Self {
        let account = AccountUser::new(UserId(user.id));
        match user.email {
            Some(email) => account.with_email(email),
            None => account,
        }
    }
}

/// Session returned by the token and sign-up endpoints.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WireSession {
    pub(crate) access_token: String,
    #[serde(default)]
    pub(crate) refresh_token: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: Option<i64>,
    #[serde(default)]
    pub(crate) expires_at: Option<i64>,
    pub(crate) user: WireUser,
}

impl WireSession {
    pub(crate) fn into_identity(self, now: OffsetDateTime) -> Identity {
        let expires_at = self
            .expires_at
            .and_then(|ts| OffsetDateTime::from_unix_timestamp(ts).ok())
            .or_else(|| {
                self.expires_in
                    .and_then(|secs| now.checked_add(Duration::seconds(secs)))
            });

        let mut identity = Identity::new(self.user.into(), self.access_token);
        if let Some(token) = self.refresh_token {
            identity = identity.with_refresh_token(token);
        }
        if let Some(at) = expires_at {
            identity = identity.with_expires_at(at);
        }
        identity
    }
}

/// Sign-up answers with a session, or with a bare user when the email must
/// be confirmed first.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireSignUp {
    Session(WireSession),
    User(WireUser),
}

/// Error body. Older servers use `error`/`error_description`, newer ones
/// `error_code`/`msg`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct WireError {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl WireError {
    pub(crate) fn code(&self) -> Option<String> {
        self.error_code.clone().or_else(|| self.error.clone())
    }

    pub(crate) fn detail(&self) -> Option<String> {
        self.error_description
            .clone()
            .or_else(|| self.msg.clone())
            .or_else(|| self.message.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_uses_absolute_expiry_when_present() {
        let json = r#"{
            "access_token": "at",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700000000,
            "refresh_token": "rt",
            "user": { "id": "u-1", "email": "a@example.com" }
        }"#;
        let session: WireSession = serde_json::from_str(json).unwrap();
        let identity = session.into_identity(OffsetDateTime::UNIX_EPOCH);

        assert_eq!(identity.user_id().as_str(), "u-1");
        assert_eq!(identity.refresh_token.as_deref(), Some("rt"));
        assert_eq!(
            identity.expires_at,
            Some(OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap())
        );
    }

    #[test]
    fn session_falls_back_to_relative_expiry() {
        let json = r#"{ "access_token": "at", "expires_in": 60, "user": { "id": "u-1" } }"#;
        let session: WireSession = serde_json::from_str(json).unwrap();
        let identity = session.into_identity(OffsetDateTime::UNIX_EPOCH);

        assert_eq!(
            identity.expires_at,
            Some(OffsetDateTime::UNIX_EPOCH + Duration::seconds(60))
        );
    }

    #[test]
    fn out_of_range_expiry_is_ignored() {
        let json = format!(
            r#"{{ "access_token": "at", "expires_in": {}, "user": {{ "id": "u-1" }} }}"#,
            i64::MAX
        );
        let session: WireSession = serde_json::from_str(&json).unwrap();
        let identity = session.into_identity(OffsetDateTime::now_utc());

        assert_eq!(identity.access_token, "at");
        assert_eq!(identity.expires_at, None);
    }

    #[test]
    fn sign_up_without_session_is_user() {
        let json = r#"{ "id": "u-2", "email": "new@example.com", "confirmation_sent_at": "2024-01-01T00:00:00Z" }"#;
        let parsed: WireSignUp = serde_json::from_str(json).unwrap();
        assert!(matches!(parsed, WireSignUp::User(user) if user.id == "u-2"));
    }

    #[test]
    fn error_body_variants() {
        let old: WireError = serde_json::from_str(
            r#"{ "error": "invalid_grant", "error_description": "Invalid login credentials" }"#,
        )
        .unwrap();
        assert_eq!(old.code().as_deref(), Some("invalid_grant"));
        assert_eq!(old.detail().as_deref(), Some("Invalid login credentials"));

        let new: WireError = serde_json::from_str(
            r#"{ "code": 400, "error_code": "email_not_confirmed", "msg": "Email not confirmed" }"#,
        )
        .unwrap();
        assert_eq!(new.code().as_deref(), Some("email_not_confirmed"));
        assert_eq!(new.detail().as_deref(), Some("Email not confirmed"));
    }
}
