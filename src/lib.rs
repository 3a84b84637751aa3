//! # AgriConnect - Farming Community Platform Backend
//!
//! Role-based CRUD platform for a farming community: accounts, sector
//! partnerships, events, forums, resources and notifications.
//!
//! AgriConnect provides:
//! - A single data-access facade over three interchangeable persistence
//!   backends (remote HTTP, embedded SQLite, ephemeral in-memory)
//! - A revision-driven live query subscription for reactive consumers
//! - An ephemeral per-session table store for optimistic CRUD demos
//! - An HTTP surface exposing the facade as a thin JSON API
//! - Typed data operations for every platform entity

pub mod auth;
pub mod backend;
pub mod config;
pub mod facade;
pub mod files;
pub mod live;
pub mod model;
pub mod queries;
pub mod server;
pub mod temp;
pub mod ui;

// Re-exports for convenient access
pub use backend::{BackendKind, DataBackend, Row, RunResult};
pub use facade::Database;
pub use live::{LiveQuery, QuerySnapshot};
pub use model::{ConnectionStatus, FileType, NotificationLevel, Role};
pub use temp::TempStore;

/// Result type alias for AgriConnect operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for AgriConnect operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Backend unreachable at startup. Fatal for the session; callers
    /// render a top-level error surface and do not retry.
    #[error("connection failed: {0}")]
    Connectivity(String),

    /// A statement was rejected at call time. The underlying message is
    /// surfaced untouched so the console can display it verbatim.
    #[error("{0}")]
    Statement(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// Login failure. Deliberately opaque: never reveals whether the
    /// email or the password was wrong.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Client-side field validation rejected the input before any
    /// backend call was made.
    #[error("{0}")]
    Validation(String),

    /// The active backend cannot perform this operation (snapshot
    /// import/reset against the remote API).
    #[error("{0}")]
    Unsupported(String),
}
