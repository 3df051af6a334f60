#![doc = include_str!("../README.md")]

pub mod discovery;
pub mod error;
#[cfg(feature = "http")]
pub mod http;
pub mod identity;
pub mod session;
pub mod types;

// Re-exports for convenient access
pub use discovery::{
    CandidateProfile, CandidateSource, Decision, DiscoveryInteractionState, Effect, Feed,
    FeedView, MatchRecord, Message, Phase, RevealError, RevealOutcome, Transition,
};
pub use error::Error;
#[cfg(feature = "http")]
pub use http::{BackendConfig, HttpIdentityProvider};
pub use identity::{AccountUser, AuthChange, AuthEvent, Identity, SignUpOutcome};
pub use session::{
    AuthError, AuthGate, IdentityProvider, MemoryIdentityProvider, SessionController,
    SessionState, Subscription,
};
pub use types::{MatchId, MessageId, ProfileId, RevealRequestId, UserId};
