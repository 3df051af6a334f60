use std::future::Future;

use super::interaction::DiscoveryInteractionState;
use super::profile::CandidateProfile;
use crate::error::Error;
use crate::types::UserId;

/// Supplies the ordered candidates that seed a swipe session.
///
/// Fetching, ranking and pagination are the source's business; the feed only
/// consumes the resolved sequence.
pub trait CandidateSource: Send + Sync {
    fn load_candidates(
        &self,
        viewer: Option<&UserId>,
    ) -> impl Future<Output = Result<Vec<CandidateProfile>, Error>> + Send;
}

/// Fixed, in-memory candidate list.
#[derive(Debug, Clone, Default)]
pub struct StaticCandidates {
    candidates: Vec<CandidateProfile>,
}

impl StaticCandidates {
    #[must_use]
    pub fn new(candidates: Vec<CandidateProfile>) -> Self {
        Self { candidates }
    }
}

impl CandidateSource for StaticCandidates {
    async fn load_candidates(
        &self,
        viewer: Option<&UserId>,
    ) -> Result<Vec<CandidateProfile>, Error> {
        // Never show viewers their own profile.
        let own = viewer.map(UserId::as_str);
        Ok(self
            .candidates
            .iter()
            .filter(|candidate| Some(candidate.id.as_str()) != own)
            .cloned()
            .collect())
    }
}

/// Discovery view state, including "not loaded yet".
#[derive(Debug, Clone, Default)]
pub enum Feed {
    #[default]
    NotLoaded,
    Loaded(DiscoveryInteractionState),
}

/// What the discovery screen should render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedView<'a> {
    Loading,
    Exhausted,
    Candidate(&'a CandidateProfile),
}

impl Feed {
    /// Load candidates for `viewer` from `source`.
    ///
    /// # Errors
    ///
    /// Propagates the source's failure; the feed stays unloaded.
    pub async fn load<S: CandidateSource>(
        source: &S,
        viewer: Option<&UserId>,
    ) -> Result<Self, Error> {
        let candidates = source.load_candidates(viewer).await?;
        Ok(Self::Loaded(DiscoveryInteractionState::new(candidates)))
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    #[must_use]
    pub fn view(&self) -> FeedView<'_> {
        match self {
            Self::NotLoaded => FeedView::Loading,
            Self::Loaded(state) => state
                .current()
                .map_or(FeedView::Exhausted, FeedView::Candidate),
        }
    }

    #[must_use]
    pub fn state(&self) -> Option<&DiscoveryInteractionState> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(state) => Some(state),
        }
    }

    pub fn state_mut(&mut self) -> Option<&mut DiscoveryInteractionState> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(state) => Some(state),
        }
    }
}
