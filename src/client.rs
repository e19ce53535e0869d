//! Client Facade
//!
//! Application-facing operations over the versioned CAS protocol.
//!
//! ## Responsibilities
//! - Borrow one pooled connection per call, released on all exit paths
//! - Dispatch the atomic procedures and map replies to the error taxonomy
//! - Decode batch results with the same record codec the procedures use
//! - Marshal structured messages through the payload codec
//!
//! A `Client` is safe to share across threads: every operation takes
//! `&self`, holds no state between calls, and leaves all per-key
//! serialization to the store's atomic execution.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec;
use crate::config::{CasPolicy, Config};
use crate::error::{CasKvError, Result};
use crate::pool::Pool;
use crate::record;
use crate::script::{CasCommand, CasReply, STATUS_APPLIED, STATUS_CONFLICT};
use crate::store::{Connector, StoreConnection};

/// Client over a pooled store backend
pub struct Client<C: Connector> {
    pool: Pool<C>,
    policy: CasPolicy,
}

impl<C: Connector> Client<C> {
    /// Create a client with default configuration
    pub fn new(connector: C) -> Self {
        Self::with_config(connector, Config::default())
    }

    /// Create a client with the given configuration
    pub fn with_config(connector: C, config: Config) -> Self {
        Self {
            policy: config.cas_policy,
            pool: Pool::new(connector, &config),
        }
    }

    // =========================================================================
    // Raw Operations
    // =========================================================================

    /// Fetch the payload and version stored under a key
    ///
    /// Fails with `NotFound` when the key is absent.
    pub fn get(&self, key: &str) -> Result<(Bytes, u64)> {
        tracing::trace!("get {:?}", key);

        self.run("get", key, |conn| {
            match conn.execute_atomic(key, CasCommand::GetWithVersion, self.policy)? {
                CasReply::Record { exists: false, .. } => Err(CasKvError::NotFound),
                CasReply::Record {
                    version, payload, ..
                } => Ok((payload, version)),
                CasReply::Status(status) => Err(unexpected_reply("get", status)),
            }
        })
    }

    /// Fetch many keys in one round trip
    ///
    /// Returns payloads and versions keyed by the input keys. Keys with no
    /// stored value are omitted from both maps; absence is data in the bulk
    /// path, not an error. Reads are not atomic across keys: each entry is
    /// internally consistent, but entries may reflect different moments.
    pub fn batch_get(&self, keys: &[&str]) -> Result<(HashMap<String, Bytes>, HashMap<String, u64>)> {
        tracing::trace!("batch_get {} keys", keys.len());

        if keys.is_empty() {
            return Ok((HashMap::new(), HashMap::new()));
        }

        let context = format!("{} keys", keys.len());
        let values = self.run("batch_get", &context, |conn| conn.mget(keys))?;

        let mut payloads = HashMap::new();
        let mut versions = HashMap::new();

        for (key, raw) in keys.iter().zip(values) {
            match raw {
                // Absent keys are simply skipped
                None => continue,
                Some(raw) => {
                    // A present but truncated record is corruption, not absence
                    let (version, payload) = record::decode(&raw)?;
                    payloads.insert((*key).to_string(), payload);
                    versions.insert((*key).to_string(), version);
                }
            }
        }

        Ok((payloads, versions))
    }

    /// Store a payload under a key if the token passes the CAS check
    ///
    /// A negative token forces the write. Fails with `CasConflict` when the
    /// store rejects the token; nothing is mutated in that case.
    pub fn set(&self, key: &str, payload: &[u8], token: i64) -> Result<()> {
        tracing::trace!("set {:?} token={}", key, token);

        self.run("set", key, |conn| {
            let reply = conn.execute_atomic(
                key,
                CasCommand::SetWithVersion { payload, token },
                self.policy,
            )?;
            write_reply("set", reply)
        })
    }

    /// Like [`Client::set`], with an expiry applied atomically with the write
    ///
    /// The TTL rides inside the atomic procedure, so there is no window in
    /// which the key exists without it.
    pub fn set_with_expiry(
        &self,
        key: &str,
        payload: &[u8],
        token: i64,
        ttl_seconds: u64,
    ) -> Result<()> {
        tracing::trace!("set {:?} token={} ttl={}s", key, token, ttl_seconds);

        self.run("set_with_expiry", key, |conn| {
            let reply = conn.execute_atomic(
                key,
                CasCommand::SetWithVersionExpiry {
                    payload,
                    token,
                    ttl_seconds,
                },
                self.policy,
            )?;
            write_reply("set_with_expiry", reply)
        })
    }

    /// Remove a key entirely; its version state is lost, not reset
    ///
    /// Fails with `DeleteMismatch` when the store removed nothing.
    pub fn delete(&self, key: &str) -> Result<()> {
        tracing::trace!("delete {:?}", key);

        self.run("delete", key, |conn| {
            let removed = conn.del(key)?;
            if removed == 1 {
                Ok(())
            } else {
                Err(CasKvError::DeleteMismatch { removed })
            }
        })
    }

    // =========================================================================
    // Structured-Message Operations
    // =========================================================================

    /// Fetch and unmarshal the message stored under a key
    pub fn get_message<T: DeserializeOwned>(&self, key: &str) -> Result<(T, u64)> {
        let (payload, version) = self.get(key)?;
        let message = codec::decode_message(&payload)?;
        Ok((message, version))
    }

    /// Batch-fetch and unmarshal messages; absent keys are omitted
    pub fn batch_get_messages<T: DeserializeOwned>(
        &self,
        keys: &[&str],
    ) -> Result<(HashMap<String, T>, HashMap<String, u64>)> {
        let (payloads, versions) = self.batch_get(keys)?;

        let mut messages = HashMap::with_capacity(payloads.len());
        for (key, payload) in payloads {
            let message = codec::decode_message(&payload)?;
            messages.insert(key, message);
        }

        Ok((messages, versions))
    }

    /// Marshal a message and store it under a key with the CAS check
    pub fn set_message<T: Serialize>(&self, key: &str, message: &T, token: i64) -> Result<()> {
        let payload = codec::encode_message(message)?;
        self.set(key, &payload, token)
    }

    /// Marshal a message and store it with an expiry
    pub fn set_message_with_expiry<T: Serialize>(
        &self,
        key: &str,
        message: &T,
        token: i64,
        ttl_seconds: u64,
    ) -> Result<()> {
        let payload = codec::encode_message(message)?;
        self.set_with_expiry(key, &payload, token, ttl_seconds)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Borrow a connection, run one call, and release on every exit path.
    ///
    /// Transport-class failures discard the connection instead of returning
    /// it (its stream state is unknown) and surface wrapped with the
    /// operation context.
    fn run<R>(
        &self,
        op: &'static str,
        context: &str,
        call: impl FnOnce(&mut C::Conn) -> Result<R>,
    ) -> Result<R> {
        let mut conn = self.pool.acquire()?;

        match call(&mut conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                if e.is_transport() {
                    conn.discard();
                }
                Err(e.in_op(op, context))
            }
        }
    }
}

/// Map a set procedure's status reply onto the error taxonomy
fn write_reply(op: &'static str, reply: CasReply) -> Result<()> {
    match reply {
        CasReply::Status(STATUS_APPLIED) => Ok(()),
        CasReply::Status(STATUS_CONFLICT) => Err(CasKvError::CasConflict),
        CasReply::Status(status) => Err(unexpected_reply(op, status)),
        CasReply::Record { .. } => Err(CasKvError::Protocol(format!(
            "{} procedure returned a record reply",
            op
        ))),
    }
}

fn unexpected_reply(op: &str, status: i64) -> CasKvError {
    CasKvError::Protocol(format!("{} procedure returned unknown status {}", op, status))
}
