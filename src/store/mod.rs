//! Store Module
//!
//! The contract this crate consumes from the external key-value store, and
//! a reference in-memory backend.
//!
//! The facade never speaks a wire protocol itself: everything it needs from
//! a backend is one borrowed connection exposing a multi-key read, a delete,
//! and the atomic execution of the CAS procedures in [`crate::script`].
//! Network backends implement these two traits; the protocol layer above
//! stays untouched.

mod memory;

pub use memory::MemoryStore;

use bytes::Bytes;

use crate::config::CasPolicy;
use crate::error::Result;
use crate::script::{CasCommand, CasReply};

/// One borrowed connection to the store
pub trait StoreConnection: Send {
    /// Multi-key fetch. Positional: results line up with the input keys,
    /// `None` for keys with no stored value. Not atomic across keys.
    fn mget(&mut self, keys: &[&str]) -> Result<Vec<Option<Bytes>>>;

    /// Remove a key entirely. Returns the count of keys removed (0 or 1).
    fn del(&mut self, key: &str) -> Result<u64>;

    /// Run one CAS procedure with store-level atomicity: no other operation
    /// on `key` may observe or mutate it between the procedure's read and
    /// its write.
    fn execute_atomic(
        &mut self,
        key: &str,
        command: CasCommand<'_>,
        policy: CasPolicy,
    ) -> Result<CasReply>;
}

/// Dials new connections for the pool
pub trait Connector: Send + Sync + 'static {
    type Conn: StoreConnection;

    /// Establish a fresh connection to the store
    fn connect(&self) -> Result<Self::Conn>;
}
