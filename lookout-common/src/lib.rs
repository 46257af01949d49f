//! Common types and utilities shared across Lookout crates.
//!
//! This crate defines the shared error type, the workspace-wide [`Result`]
//! alias, and the [`observability`] module used by the binary and the
//! integration tests to initialise `tracing`. It is intentionally lightweight
//! so every crate can depend on it without heavy transitive costs.
//!
//! # Examples
//!
//! ```rust
//! use lookout_common::{LookoutError, Result};
//!
//! fn require(handles: &[String]) -> Result<()> {
//!     if handles.is_empty() {
//!         return Err(LookoutError::Config("X_HANDLES is empty".into()));
//!     }
//!     Ok(())
//! }
//!
//! assert!(require(&[]).is_err());
//! ```

pub mod observability;

/// Error types used across the Lookout system.
#[derive(thiserror::Error, Debug)]
pub enum LookoutError {
    /// Configuration was incomplete or invalid. Fails invocation startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The search provider could not be reached or rejected the request.
    #[error("Search error: {0}")]
    Search(String),

    /// The chat webhook rejected a message or was unreachable.
    #[error("Notification error: {0}")]
    Notify(String),
}

/// Convenient alias for results that use [`LookoutError`].
pub type Result<T> = std::result::Result<T, LookoutError>;
