//! Identity provider for the hosted backend's auth REST API.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use veil_client::http::{BackendConfig, HttpIdentityProvider};
//! use veil_client::session::SessionController;
//!
//! let provider = HttpIdentityProvider::new(BackendConfig::from_env()?)?;
//! let controller = SessionController::new(Arc::new(provider));
//! controller.initialize().await;
//! ```

mod client;
mod config;
mod wire;

pub use client::HttpIdentityProvider;
pub use config::BackendConfig;
