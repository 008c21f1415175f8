//! Client facade (C4): the typed, public entry point. Computes every
//! absolute timestamp the engine needs before calling in, so the engine
//! itself only ever sees absolute times — never relative seconds.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::config::Config;
use crate::engine::{Engine, NO_GROUP_SENTINEL};
use crate::error::DpqError;
use crate::registrar::Registrar;
use crate::store::Store;

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

struct Inner {
    engine: Engine,
    queue: String,
    config: Config,
}

/// Typed client for a single named queue.
///
/// Cheap to clone — internally an `Arc`, so multiple concurrently-polling
/// worker tasks can share one client (and its underlying multiplexed Redis
/// connection) without coordination.
#[derive(Clone)]
pub struct DpqClient {
    inner: Arc<Inner>,
}

impl DpqClient {
    /// Connect to Redis and register the atomic script for `queue`.
    pub async fn connect(queue: &str, config: Config) -> Result<Self, DpqError> {
        let store = Store::connect(&config.redis_url).await?;
        let registrar = Registrar::new(store).await?;
        Ok(Self {
            inner: Arc::new(Inner {
                engine: Engine::new(registrar),
                queue: queue.to_string(),
                config,
            }),
        })
    }

    /// Push `payload` with an optional `priority` (default 0.0, higher pops
    /// first), `delay` in seconds before it becomes runnable, `retries`
    /// (defaults to the client's configured `default_retries`), and an
    /// optional `group_id`.
    ///
    /// Re-pushing a payload already present (in either the runnable or
    /// delayed set) updates its priority/retries/group in place rather than
    /// creating a duplicate — this is the deduplication mechanism. An
    /// already-delayed payload pushed with no new delay stays delayed.
    pub async fn push(
        &self,
        payload: &[u8],
        priority: f64,
        delay_secs: u64,
        retries: Option<u32>,
        group_id: Option<&str>,
    ) -> Result<(), DpqError> {
        if payload.is_empty() {
            return Err(DpqError::InvalidArgument(
                "payload must not be empty".to_string(),
            ));
        }
        if group_id == Some(NO_GROUP_SENTINEL) {
            return Err(DpqError::InvalidArgument(format!(
                "{NO_GROUP_SENTINEL} is reserved to indicate no group"
            )));
        }

        let delay_ts = if delay_secs > 0 { now() + delay_secs } else { 0 };
        let retries = retries.unwrap_or(self.inner.config.default_retries);
        let group_id = group_id.unwrap_or(NO_GROUP_SENTINEL);

        self.inner
            .engine
            .push(&self.inner.queue, payload, priority, delay_ts, retries, group_id)
            .await
    }

    /// Pop the highest-priority runnable task, making it invisible to other
    /// workers until the configured default visibility window elapses.
    /// Returns `None` on an empty queue — that is not an error.
    pub async fn pop(&self) -> Result<Option<Handle>, DpqError> {
        let expires = now() + self.inner.config.default_visibility_secs;
        let result = self.inner.engine.pop(&self.inner.queue, expires).await?;

        Ok(result.map(|r| {
            let group_id = if r.group_id == NO_GROUP_SENTINEL {
                None
            } else {
                Some(r.group_id.clone())
            };
            Handle {
                payload: r.payload,
                attempt: r.attempt,
                group_id,
                group_id_raw: r.group_id,
                priority: r.priority,
                expires,
                client: self.clone(),
            }
        }))
    }

    /// Total number of tasks across the runnable and delayed sets.
    pub async fn get_size(&self) -> Result<u64, DpqError> {
        self.inner.engine.get_size(&self.inner.queue).await
    }

    /// Promote every delayed task whose release time has passed into the
    /// runnable set, dropping any whose retries are exhausted. Intended for
    /// the scheduler driver; returns the number of entries processed.
    pub async fn enqueue_delayed(&self) -> Result<u32, DpqError> {
        let n = self.inner.engine.enqueue_delayed(&self.inner.queue, now()).await?;
        debug!(queue = %self.inner.queue, processed = n, "enqueue_delayed tick");
        Ok(n)
    }

    /// Delay every task in `group_id` by `delay_secs` seconds from now.
    pub async fn delay_group(&self, group_id: &str, delay_secs: u64) -> Result<u32, DpqError> {
        if group_id == NO_GROUP_SENTINEL {
            return Err(DpqError::InvalidArgument(format!(
                "{NO_GROUP_SENTINEL} is reserved to indicate no group"
            )));
        }
        let release_ts = now() + delay_secs;
        self.inner
            .engine
            .delay_group(&self.inner.queue, group_id, release_ts, delay_secs)
            .await
    }
}

/// A popped task. Carries the fields from spec.md's `Task`/`Handle` plus
/// the identifying tuple (payload, group id, priority) needed to re-enter
/// the engine from `remove`/`set_invisibility`, without a heap-allocated
/// closure per pop.
pub struct Handle {
    payload: Vec<u8>,
    attempt: u32,
    group_id: Option<String>,
    group_id_raw: String,
    priority: f64,
    expires: u64,
    client: DpqClient,
}

impl Handle {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn group_id(&self) -> Option<&str> {
        self.group_id.as_deref()
    }

    pub fn expires(&self) -> u64 {
        self.expires
    }

    /// Acknowledge completion — removes the task from the queue entirely.
    /// A no-op if the task was already promoted and popped by another
    /// worker (idempotent, not an error).
    pub async fn remove(&self) -> Result<(), DpqError> {
        self.client
            .inner
            .engine
            .remove_from_delayed_queue(
                &self.client.inner.queue,
                &self.payload,
                &self.group_id_raw,
                self.priority,
            )
            .await
    }

    /// Extend (or shorten) invisibility to `seconds` from now. Useful when
    /// processing time is unpredictable and the default visibility window
    /// might otherwise expire mid-task.
    pub async fn set_invisibility(&self, seconds: u64) -> Result<(), DpqError> {
        let until = now() + seconds;
        self.client
            .inner
            .engine
            .set_visibility(
                &self.client.inner.queue,
                &self.payload,
                &self.group_id_raw,
                self.priority,
                until,
            )
            .await
    }
}
