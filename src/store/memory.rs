//! In-memory reference backend
//!
//! A process-local store with the same observable contract as a remote one:
//! per-store mutual exclusion around each atomic procedure, positional MGET,
//! and second-resolution expiry. Backs the test suite and embedded use.
//!
//! ## Concurrency
//!
//! All connections cloned from one `MemoryStore` share state behind an
//! `Arc`; a single mutex over the entry map is the atomicity boundary.
//! `execute_atomic` reads, decides, and writes inside one lock acquisition,
//! which is exactly the no-interleaving guarantee a scripted remote store
//! provides.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use parking_lot::Mutex;

use crate::config::CasPolicy;
use crate::error::Result;
use crate::script::{self, CasCommand, CasReply};
use crate::store::{Connector, StoreConnection};

/// A stored value and its optional expiry deadline
struct Entry {
    bytes: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }
}

/// Shared in-memory store.
///
/// Cloning yields another connection to the same logical store, so one
/// instance serves both as the [`Connector`] handed to a client and as a
/// [`StoreConnection`] in its own right.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Plant raw bytes under a key, bypassing the CAS protocol.
    ///
    /// This is the non-protocol writer: seeding fixtures and simulating the
    /// corruption a foreign client could introduce.
    pub fn insert_raw(&self, key: &str, bytes: impl Into<Bytes>) {
        let mut entries = self.entries.lock();
        entries.insert(
            key.to_string(),
            Entry {
                bytes: bytes.into(),
                expires_at: None,
            },
        );
    }

    /// Number of live (unexpired) keys
    pub fn len(&self) -> usize {
        let now = Instant::now();
        let entries = self.entries.lock();
        entries.values().filter(|e| !e.is_expired(now)).count()
    }

    /// Whether the store holds no live keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the live bytes under a key, dropping the entry if it expired.
    /// Expiry is lazy: every access path agrees on the same check.
    fn read_live(entries: &mut HashMap<String, Entry>, key: &str, now: Instant) -> Option<Bytes> {
        let expired = entries.get(key).is_some_and(|entry| entry.is_expired(now));
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).map(|entry| entry.bytes.clone())
    }
}

impl StoreConnection for MemoryStore {
    fn mget(&mut self, keys: &[&str]) -> Result<Vec<Option<Bytes>>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        Ok(keys
            .iter()
            .map(|key| Self::read_live(&mut entries, key, now))
            .collect())
    }

    fn del(&mut self, key: &str) -> Result<u64> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        // An expired entry was already logically absent.
        if Self::read_live(&mut entries, key, now).is_none() {
            return Ok(0);
        }

        entries.remove(key);
        Ok(1)
    }

    fn execute_atomic(
        &mut self,
        key: &str,
        command: CasCommand<'_>,
        policy: CasPolicy,
    ) -> Result<CasReply> {
        let now = Instant::now();

        // One lock acquisition spans the read, the decision, and the write.
        let mut entries = self.entries.lock();

        let current = Self::read_live(&mut entries, key, now);
        let (reply, plan) = script::apply(&command, current.as_ref(), policy)?;

        if let Some(plan) = plan {
            entries.insert(
                key.to_string(),
                Entry {
                    bytes: Bytes::from(plan.bytes),
                    expires_at: plan
                        .ttl_seconds
                        .map(|secs| now + Duration::from_secs(secs)),
                },
            );
        }

        Ok(reply)
    }
}

impl Connector for MemoryStore {
    type Conn = MemoryStore;

    fn connect(&self) -> Result<Self::Conn> {
        Ok(self.clone())
    }
}
