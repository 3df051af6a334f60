//! Authenticated-identity lifecycle.
//!
//! [`SessionController`] wraps an [`IdentityProvider`] and keeps a single,
//! ordered [`SessionState`] regardless of how many notifications arrive.
//!
//! ```rust,ignore
//! use veil_client::session::{AuthGate, MemoryIdentityProvider, SessionController};
//!
//! let controller = SessionController::new(Arc::new(MemoryIdentityProvider::new()));
//! let _sub = controller.subscribe(|state| match state.gate() {
//!     AuthGate::Pending => show_splash(),
//!     AuthGate::SignIn => show_auth_form(),
//!     AuthGate::App => show_tabs(),
//! });
//! controller.initialize().await;
//! ```

mod controller;
mod error;
mod memory;
mod state;
mod traits;

pub use controller::{SessionController, Subscription};
pub use error::AuthError;
pub use memory::MemoryIdentityProvider;
pub use state::{AuthGate, SessionState};
pub use traits::IdentityProvider;
