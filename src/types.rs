use derive_more::{Display, From, FromStr, Into};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Account identifier issued by the identity provider (opaque string).
///
/// Stable for the lifetime of the account; the provider chooses the format
/// (UUID for the hosted backend, ULID for [`MemoryIdentityProvider`](crate::session::MemoryIdentityProvider)).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Candidate profile identifier (opaque string, unique within a feed).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl ProfileId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProfileId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Locally generated reveal request identifier (ULID format).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct RevealRequestId(pub Ulid);

impl RevealRequestId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

/// Locally generated match identifier (ULID format).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct MatchId(pub Ulid);

impl MatchId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}

/// Locally generated chat message identifier (ULID format).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, FromStr, From, Into,
)]
#[serde(transparent)]
pub struct MessageId(pub Ulid);

impl MessageId {
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new())
    }
}
