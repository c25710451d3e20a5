//! # pulse-core
//!
//! Shared foundation for the Pulse real-time gateway:
//!
//! - Unified [`error::AppError`] / [`error::ErrorKind`] taxonomy
//! - Configuration schemas loaded from TOML + environment
//! - [`principal::Principal`] — the authenticated identity attached to
//!   a connection
//! - [`event::Event`] — a published domain fact routed by the gateway
//! - Newtype identifiers for users, sessions, conversations, connections,
//!   and subscriptions

pub mod config;
pub mod error;
pub mod event;
pub mod principal;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use event::Event;
pub use principal::Principal;
pub use result::AppResult;
