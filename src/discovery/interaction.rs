use std::collections::HashSet;

use super::profile::CandidateProfile;
use super::reveal::{RevealError, RevealOutcome, RevealRequestSet};
use crate::session::SessionState;
use crate::types::ProfileId;

/// User decision on the current candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Like,
    Pass,
}

/// Position of a swipe session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Showing the candidate at `position`.
    Active { position: usize },
    /// Every candidate has been decided. Terminal.
    Exhausted,
}

/// Something the presentation layer should show after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Matched {
        profile_id: ProfileId,
        display_name: String,
    },
}

/// Result of [`DiscoveryInteractionState::decide`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub phase: Phase,
    pub effect: Option<Effect>,
}

/// Client-local state of one swipe session: a fixed candidate queue, the
/// cursor into it, and the reveal requests made so far.
///
/// All operations are synchronous and total; none performs I/O.
#[derive(Debug, Clone)]
pub struct DiscoveryInteractionState {
    queue: Vec<CandidateProfile>,
    position: usize,
    reveals: RevealRequestSet,
}

impl DiscoveryInteractionState {
    /// Start a session over `candidates`. Later duplicates of an id are
    /// dropped so ids stay unique.
    #[must_use]
    pub fn new(candidates: impl IntoIterator<Item = CandidateProfile>) -> Self {
        let mut seen = HashSet::new();
        let queue: Vec<CandidateProfile> = candidates
            .into_iter()
            .filter(|candidate| {
                let fresh = seen.insert(candidate.id.clone());
                if !fresh {
                    tracing::warn!(profile_id = %candidate.id, "duplicate candidate dropped");
                }
                fresh
            })
            .collect();
        tracing::debug!(candidates = queue.len(), "discovery session started");
        Self {
            queue,
            position: 0,
            reveals: RevealRequestSet::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.position < self.queue.len() {
            Phase::Active {
                position: self.position,
            }
        } else {
            Phase::Exhausted
        }
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.phase() == Phase::Exhausted
    }

    /// Candidate under the cursor, `None` once exhausted.
    #[must_use]
    pub fn current(&self) -> Option<&CandidateProfile> {
        self.queue.get(self.position)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Candidates not yet decided, including the current one.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len() - self.position
    }

    /// Apply a decision to the current candidate and advance.
    ///
    /// On [`Phase::Exhausted`] this is a no-op: late swipes racing the last
    /// transition are expected.
    pub fn decide(&mut self, decision: Decision) -> Transition {
        let Some(candidate) = self.queue.get(self.position) else {
            return Transition {
                phase: Phase::Exhausted,
                effect: None,
            };
        };

        let effect = match decision {
            Decision::Like => Some(Effect::Matched {
                profile_id: candidate.id.clone(),
                display_name: candidate.display_name.clone(),
            }),
            Decision::Pass => None,
        };
        tracing::debug!(
            profile_id = %candidate.id,
            ?decision,
            position = self.position,
            "candidate decided"
        );
        self.position += 1;

        Transition {
            phase: self.phase(),
            effect,
        }
    }

    /// Ask to see `profile_id`'s unblurred photo.
    ///
    /// # Errors
    ///
    /// Returns [`RevealError::Unauthenticated`] (and records nothing) unless
    /// `session` carries a confirmed identity.
    pub fn request_reveal(
        &mut self,
        profile_id: &ProfileId,
        session: &SessionState,
    ) -> Result<RevealOutcome, RevealError> {
        let requester = session
            .confirmed_identity()
            .ok_or(RevealError::Unauthenticated)?;
        let outcome = self.reveals.insert(requester.user_id(), profile_id);
        tracing::debug!(%profile_id, new = outcome.is_new(), "reveal requested");
        Ok(outcome)
    }

    #[must_use]
    pub fn has_pending_reveal(&self, profile_id: &ProfileId) -> bool {
        self.reveals.contains(profile_id)
    }

    #[must_use]
    pub fn reveal_requests(&self) -> &RevealRequestSet {
        &self.reveals
    }
}
