use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::interaction::Effect;
use crate::types::{MatchId, MessageId, UserId};

/// A mutual like between two accounts, in the backend's `matches` row shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct MatchRecord {
    pub id: MatchId,
    #[serde(rename = "user1_id")]
    pub first: UserId,
    #[serde(rename = "user2_id")]
    pub second: UserId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub last_message_at: Option<OffsetDateTime>,
}

impl MatchRecord {
    #[must_use]
    pub fn new(first: UserId, second: UserId) -> Self {
        Self {
            id: MatchId::generate(),
            first,
            second,
            created_at: OffsetDateTime::now_utc(),
            last_message_at: None,
        }
    }

    #[must_use]
    pub fn involves(&self, user: &UserId) -> bool {
        self.first == *user || self.second == *user
    }

    /// The account on the other side of the match from `user`.
    #[must_use]
    pub fn other_party(&self, user: &UserId) -> Option<&UserId> {
        if self.first == *user {
            Some(&self.second)
        } else if self.second == *user {
            Some(&self.first)
        } else {
            None
        }
    }

    /// Advance `last_message_at` to `message` if it belongs here and is newer.
    pub fn note_message(&mut self, message: &Message) {
        if message.match_id != self.id {
            return;
        }
        if self.last_message_at.is_none_or(|at| at < message.created_at) {
            self.last_message_at = Some(message.created_at);
        }
    }
}

impl Effect {
    /// Match record for a like made by `viewer`.
    ///
    /// Profile rows are keyed by account id, so the liked profile id names
    /// the other account.
    #[must_use]
    pub fn match_record(&self, viewer: &UserId) -> MatchRecord {
        match self {
            Self::Matched { profile_id, .. } => {
                MatchRecord::new(viewer.clone(), UserId(profile_id.as_str().to_owned()))
            }
        }
    }
}

/// One chat message inside a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub struct Message {
    pub id: MessageId,
    pub match_id: MatchId,
    #[serde(rename = "sender_id")]
    pub sender: UserId,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Message {
    #[must_use]
    pub fn new(match_id: MatchId, sender: UserId, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::generate(),
            match_id,
            sender,
            content: content.into(),
            created_at: OffsetDateTime::now_utc(),
        }
    }
}
