//! Swipe-session state for the discovery screen.
//!
//! [`Feed`] wraps a [`DiscoveryInteractionState`] so "still loading" and
//! "no candidates left" render differently. Transitions are pure; effects
//! such as a match notice or a reveal request are returned to the caller.

mod feed;
mod interaction;
mod matches;
mod profile;
mod reveal;

pub use feed::{CandidateSource, Feed, FeedView, StaticCandidates};
pub use interaction::{Decision, DiscoveryInteractionState, Effect, Phase, Transition};
pub use matches::{MatchRecord, Message};
pub use profile::{CandidateProfile, SeekingType};
pub use reveal::{RevealError, RevealOutcome, RevealRequest, RevealRequestSet, RevealStatus};
