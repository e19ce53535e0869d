//! Connection pool
//!
//! Owns the live connections to the store and lends one out per call.
//!
//! ## Acquisition model
//!
//! - `acquire` hands back an idle connection when one exists, dials a new
//!   one while under capacity, and otherwise blocks until a connection is
//!   returned or the acquire timeout elapses.
//! - The borrowed connection rides inside a [`PooledConnection`] guard;
//!   dropping the guard returns it to the pool on every exit path,
//!   including failure.
//! - A caller that saw a transport error calls [`PooledConnection::discard`]
//!   instead, so a connection in an unknown stream state is never handed to
//!   the next caller. Its capacity slot is freed for a fresh dial.

use std::ops::{Deref, DerefMut};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::Config;
use crate::error::{CasKvError, Result};
use crate::store::Connector;

/// Bounded pool of store connections
pub struct Pool<C: Connector> {
    /// Dials replacement and growth connections
    connector: C,

    /// Idle connections plus the live-connection count
    state: Mutex<PoolState<C::Conn>>,

    /// Signalled whenever a connection or capacity slot frees up
    available: Condvar,

    /// Hard cap on live connections (idle + borrowed)
    max_connections: usize,

    /// How long acquire blocks before giving up
    acquire_timeout: Duration,
}

struct PoolState<T> {
    idle: Vec<T>,
    open: usize,
}

impl<C: Connector> Pool<C> {
    /// Create an empty pool; connections are dialed on demand
    pub fn new(connector: C, config: &Config) -> Self {
        Self {
            connector,
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                open: 0,
            }),
            available: Condvar::new(),
            max_connections: config.max_connections,
            acquire_timeout: Duration::from_millis(config.acquire_timeout_ms),
        }
    }

    /// Borrow a connection for the duration of one call
    pub fn acquire(&self) -> Result<PooledConnection<'_, C>> {
        let deadline = Instant::now() + self.acquire_timeout;
        let mut state = self.state.lock();

        loop {
            // Prefer an idle connection over dialing a new one
            if let Some(conn) = state.idle.pop() {
                return Ok(PooledConnection {
                    pool: self,
                    conn: Some(conn),
                });
            }

            if state.open < self.max_connections {
                // Reserve the slot before dropping the lock, so concurrent
                // acquires cannot overshoot the cap while we dial
                state.open += 1;
                let opened = state.open;
                drop(state);

                tracing::debug!("Dialing store connection {}/{}", opened, self.max_connections);

                match self.connector.connect() {
                    Ok(conn) => {
                        return Ok(PooledConnection {
                            pool: self,
                            conn: Some(conn),
                        })
                    }
                    Err(e) => {
                        // Give the slot back and wake a waiter that may now dial
                        self.state.lock().open -= 1;
                        self.available.notify_one();
                        return Err(e);
                    }
                }
            }

            // At capacity with nothing idle: wait for a release
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return Err(CasKvError::PoolTimeout {
                    waited_ms: self.acquire_timeout.as_millis() as u64,
                });
            }
        }
    }

    /// Count of live connections (idle + borrowed)
    pub fn open_connections(&self) -> usize {
        self.state.lock().open
    }

    /// Count of idle connections
    pub fn idle_connections(&self) -> usize {
        self.state.lock().idle.len()
    }

    /// Return a healthy connection to the idle list
    fn release(&self, conn: C::Conn) {
        self.state.lock().idle.push(conn);
        self.available.notify_one();
    }

    /// Drop a connection without returning it, freeing its capacity slot
    fn forget(&self) {
        self.state.lock().open -= 1;
        self.available.notify_one();
    }
}

/// Scoped borrow of one pooled connection.
///
/// Dereferences to the underlying [`crate::store::StoreConnection`]; drop
/// returns the connection to the pool.
pub struct PooledConnection<'a, C: Connector> {
    pool: &'a Pool<C>,
    conn: Option<C::Conn>,
}

impl<C: Connector> PooledConnection<'_, C> {
    /// Drop this connection instead of returning it to the pool.
    ///
    /// For connections in an unknown state after a transport error; the
    /// freed slot lets the pool dial a replacement.
    pub fn discard(mut self) {
        tracing::warn!("Discarding store connection after transport error");
        self.conn = None;
    }
}

impl<C: Connector> Deref for PooledConnection<'_, C> {
    type Target = C::Conn;

    fn deref(&self) -> &Self::Target {
        // Only empty mid-drop or after discard, both of which consume the guard
        self.conn.as_ref().expect("pooled connection already taken")
    }
}

impl<C: Connector> DerefMut for PooledConnection<'_, C> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.conn.as_mut().expect("pooled connection already taken")
    }
}

impl<C: Connector> Drop for PooledConnection<'_, C> {
    fn drop(&mut self) {
        match self.conn.take() {
            Some(conn) => self.pool.release(conn),
            None => self.pool.forget(),
        }
    }
}
