//! Connection lifecycle: handles, pool, authentication, keepalive.

pub mod authenticator;
pub mod handle;
pub mod heartbeat;
pub mod manager;
pub mod pool;

pub use authenticator::ConnectionAuthenticator;
pub use handle::{ConnectionHandle, SendOutcome};
pub use manager::{ConnectionManager, DeliveryOutcome};
