use crate::error::Error;

/// Classified authentication failure, safe to show to the user.
///
/// Every [`SessionController`](super::SessionController) auth operation
/// returns these instead of raw provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum AuthError {
    /// Email or password left blank; the provider was not contacted.
    #[error("Please fill in all fields")]
    MissingFields,

    /// Wrong email/password combination.
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Provider could not be reached.
    #[error("Network unavailable")]
    NetworkUnavailable,

    /// Account exists but its email has not been verified yet.
    #[error("Email not confirmed")]
    ConfirmationRequired,

    /// Anything else the provider reported.
    #[error("{0}")]
    Unknown(String),
}

impl AuthError {
    /// Whether retrying the same request may succeed without user changes.
    ///
    /// Only connectivity failures qualify; provider rejections repeat.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkUnavailable)
    }
}

const INVALID_CREDENTIAL_CODES: &[&str] = &["invalid_grant", "invalid_credentials"];
const UNCONFIRMED_CODES: &[&str] = &["email_not_confirmed", "provider_email_needs_verification"];

impl From<Error> for AuthError {
    fn from(e: Error) -> Self {
        match e {
            Error::Rejected {
                ref code,
                ref detail,
                ..
            } => {
                let detail_lower = detail.to_ascii_lowercase();
                let code = code.as_deref().unwrap_or_default();
                if INVALID_CREDENTIAL_CODES.contains(&code)
                    || detail_lower.contains("invalid login credentials")
                    || detail_lower.contains("invalid grant")
                {
                    Self::InvalidCredentials
                } else if UNCONFIRMED_CODES.contains(&code)
                    || detail_lower.contains("email not confirmed")
                {
                    Self::ConfirmationRequired
                } else if detail.is_empty() {
                    Self::Unknown(e.to_string())
                } else {
                    Self::Unknown(detail.clone())
                }
            }
            #[cfg(feature = "http")]
            Error::Http(ref err) if err.is_connect() || err.is_timeout() || err.is_request() => {
                Self::NetworkUnavailable
            }
            Error::Unreachable(_) => Self::NetworkUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected(code: Option<&str>, detail: &str) -> Error {
        Error::Rejected {
            operation: "sign in",
            status: Some(400),
            code: code.map(str::to_owned),
            detail: detail.to_owned(),
        }
    }

    #[test]
    fn invalid_grant_code_is_invalid_credentials() {
        let err = AuthError::from(rejected(Some("invalid_grant"), "Invalid login credentials"));
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn invalid_grant_message_without_code_is_invalid_credentials() {
        let err = AuthError::from(rejected(None, "invalid grant"));
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[test]
    fn unconfirmed_email_is_confirmation_required() {
        let err = AuthError::from(rejected(Some("email_not_confirmed"), "Email not confirmed"));
        assert_eq!(err, AuthError::ConfirmationRequired);
    }

    #[test]
    fn unreachable_is_network_unavailable() {
        let err = AuthError::from(Error::Unreachable("offline".into()));
        assert_eq!(err, AuthError::NetworkUnavailable);
        assert!(err.is_retryable());
    }

    #[test]
    fn other_rejections_keep_provider_message() {
        let err = AuthError::from(rejected(Some("user_already_exists"), "User already registered"));
        assert_eq!(err, AuthError::Unknown("User already registered".into()));
        assert!(!err.is_retryable());
    }

    #[test]
    fn decode_failures_are_unknown() {
        let err = AuthError::from(Error::Decode("missing field".into()));
        assert!(matches!(err, AuthError::Unknown(msg) if msg.contains("missing field")));
    }

    #[test]
    fn credential_errors_are_not_retryable() {
        assert!(!AuthError::InvalidCredentials.is_retryable());
        assert!(!AuthError::MissingFields.is_retryable());
    }
}
