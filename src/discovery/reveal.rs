use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::types::{ProfileId, RevealRequestId, UserId};

/// Reveal requests can only be made by a known requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RevealError {
    #[error("Sign in to request a photo reveal")]
    Unauthenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum RevealStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A request from the local user to see a candidate's unblurred photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct RevealRequest {
    pub id: RevealRequestId,
    #[serde(rename = "requester_id")]
    pub requester: UserId,
    #[serde(rename = "target_id")]
    pub target: ProfileId,
    pub status: RevealStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl RevealRequest {
    #[must_use]
    pub fn pending(requester: UserId, target: ProfileId) -> Self {
        Self {
            id: RevealRequestId::generate(),
            requester,
            target,
            status: RevealStatus::Pending,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Outcome of [`request_reveal`](super::DiscoveryInteractionState::request_reveal).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealOutcome {
    /// New request recorded; the caller should deliver it.
    Requested(RevealRequest),
    /// A request for this profile was already recorded.
    AlreadyPending,
}

impl RevealOutcome {
    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Requested(_))
    }
}

/// Profiles the local user asked to reveal. Grows only.
#[derive(Debug, Clone, Default)]
pub struct RevealRequestSet {
    requests: HashMap<ProfileId, RevealRequest>,
}

impl RevealRequestSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request from `requester` unless one exists for `target`.
    pub fn insert(&mut self, requester: &UserId, target: &ProfileId) -> RevealOutcome {
        if self.requests.contains_key(target) {
            return RevealOutcome::AlreadyPending;
        }
        let request = RevealRequest::pending(requester.clone(), target.clone());
        self.requests.insert(target.clone(), request.clone());
        RevealOutcome::Requested(request)
    }

    #[must_use]
    pub fn contains(&self, target: &ProfileId) -> bool {
        self.requests.contains_key(target)
    }

    #[must_use]
    pub fn get(&self, target: &ProfileId) -> Option<&RevealRequest> {
        self.requests.get(target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RevealRequest> {
        self.requests.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_at_most_once() {
        let mut set = RevealRequestSet::new();
        let requester = UserId::from("me");
        let target = ProfileId::from("p1");

        let first = set.insert(&requester, &target);
        let second = set.insert(&requester, &target);

        assert!(first.is_new());
        assert_eq!(second, RevealOutcome::AlreadyPending);
        assert_eq!(set.len(), 1);
        assert!(set.contains(&target));
    }

    #[test]
    fn new_requests_are_pending() {
        let mut set = RevealRequestSet::new();
        let RevealOutcome::Requested(request) =
            set.insert(&UserId::from("me"), &ProfileId::from("p1"))
        else {
            panic!("expected a new request");
        };
        assert_eq!(request.status, RevealStatus::Pending);
        assert_eq!(request.requester, UserId::from("me"));
        assert_eq!(set.get(&ProfileId::from("p1")), Some(&request));
    }

    #[test]
    fn request_serializes_with_backend_names() {
        let request = RevealRequest::pending(UserId::from("me"), ProfileId::from("p1"));
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["requester_id"], "me");
        assert_eq!(value["target_id"], "p1");
        assert_eq!(value["status"], "pending");
        assert!(value["created_at"].is_string());
    }
}
