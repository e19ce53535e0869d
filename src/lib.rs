//! # caskv
//!
//! Optimistic concurrency control (compare-and-swap) for values kept in a
//! remote key-value store that has no native CAS primitive on arbitrary
//! values:
//! - A monotonically increasing version counter embedded in every stored value
//! - Atomic read-modify-write procedures executed by the store
//! - A pooled, thread-safe client facade with raw and structured-message
//!   operations
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Client Facade                            │
//! │       get / batch_get / set / set_with_expiry / delete       │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ one pooled connection per call
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Connection Pool                             │
//! │          (bounded, scoped acquire/release)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                  Store Backend                               │
//! │        MGET │ DEL │ atomic CAS procedures                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ executed under store exclusion
//!                       ▼
//!               ┌─────────────┐
//!               │   Record    │
//!               │ (8B version │
//!               │  + payload) │
//!               └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod script;
pub mod store;
pub mod pool;
pub mod codec;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CasKvError, Result};
pub use config::{CasPolicy, Config};
pub use client::Client;
pub use pool::{Pool, PooledConnection};
pub use store::{Connector, MemoryStore, StoreConnection};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of caskv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
