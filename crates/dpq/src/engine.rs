//! Queue state engine (C3) — the core. Each method below is a single
//! atomic script invocation; `now`, delays, and visibility deadlines are
//! always absolute second timestamps supplied by the caller (the client
//! facade is responsible for turning relative seconds into absolute time
//! before calling in here).

use crate::error::DpqError;
use crate::registrar::Registrar;

/// Reserved group id meaning "no group" on the wire.
pub const NO_GROUP_SENTINEL: &str = "0";

/// Raw result of a successful `pop`.
#[derive(Debug, Clone)]
pub struct PopResult {
    pub payload: Vec<u8>,
    pub group_id: String,
    pub priority: f64,
    pub attempt: u32,
}

pub struct Engine {
    registrar: Registrar,
}

impl Engine {
    pub fn new(registrar: Registrar) -> Self {
        Self { registrar }
    }

    pub async fn push(
        &self,
        queue: &str,
        payload: &[u8],
        priority: f64,
        delay: u64,
        retries: u32,
        group_id: &str,
    ) -> Result<(), DpqError> {
        let args = vec![
            payload.to_vec(),
            priority.to_string().into_bytes(),
            delay.to_string().into_bytes(),
            retries.to_string().into_bytes(),
            group_id.as_bytes().to_vec(),
        ];
        self.registrar.eval("push", queue, &args).await?;
        Ok(())
    }

    pub async fn pop(&self, queue: &str, invisible_until: u64) -> Result<Option<PopResult>, DpqError> {
        let args = vec![invisible_until.to_string().into_bytes()];
        let value = self.registrar.eval("pop", queue, &args).await?;

        let parsed: Option<(Vec<u8>, String, String, String)> =
            redis::from_redis_value(&value).map_err(|e| DpqError::Store(e.to_string()))?;

        let Some((payload, group_id, priority, attempt)) = parsed else {
            return Ok(None);
        };

        let priority: f64 = priority
            .parse()
            .map_err(|_| DpqError::Store(format!("bad priority returned: {priority}")))?;
        let attempt: u32 = attempt
            .parse()
            .map_err(|_| DpqError::Store(format!("bad attempt returned: {attempt}")))?;

        Ok(Some(PopResult {
            payload,
            group_id,
            priority,
            attempt,
        }))
    }

    pub async fn get_size(&self, queue: &str) -> Result<u64, DpqError> {
        let value = self.registrar.eval("get_size", queue, &[]).await?;
        let size: i64 = redis::from_redis_value(&value).map_err(|e| DpqError::Store(e.to_string()))?;
        Ok(size.max(0) as u64)
    }

    /// Returns the number of delayed entries processed (promoted or
    /// dropped), for the scheduler's own logging.
    pub async fn enqueue_delayed(&self, queue: &str, now: u64) -> Result<u32, DpqError> {
        let args = vec![now.to_string().into_bytes()];
        let value = self.registrar.eval("enqueue_delayed", queue, &args).await?;
        let n: i64 = redis::from_redis_value(&value).map_err(|e| DpqError::Store(e.to_string()))?;
        Ok(n.max(0) as u32)
    }

    pub async fn delay_group(
        &self,
        queue: &str,
        group_id: &str,
        release_ts: u64,
        delay: u64,
    ) -> Result<u32, DpqError> {
        let args = vec![
            group_id.as_bytes().to_vec(),
            release_ts.to_string().into_bytes(),
            delay.to_string().into_bytes(),
        ];
        let value = self.registrar.eval("delay_group", queue, &args).await?;
        let n: i64 = redis::from_redis_value(&value).map_err(|e| DpqError::Store(e.to_string()))?;
        Ok(n.max(0) as u32)
    }

    pub async fn set_visibility(
        &self,
        queue: &str,
        payload: &[u8],
        group_id: &str,
        priority: f64,
        until_ts: u64,
    ) -> Result<(), DpqError> {
        let args = vec![
            payload.to_vec(),
            group_id.as_bytes().to_vec(),
            priority.to_string().into_bytes(),
            until_ts.to_string().into_bytes(),
        ];
        self.registrar.eval("set_visibility", queue, &args).await?;
        Ok(())
    }

    pub async fn remove_from_delayed_queue(
        &self,
        queue: &str,
        payload: &[u8],
        group_id: &str,
        priority: f64,
    ) -> Result<(), DpqError> {
        let args = vec![
            payload.to_vec(),
            group_id.as_bytes().to_vec(),
            priority.to_string().into_bytes(),
        ];
        self.registrar
            .eval("remove_from_delayed_queue", queue, &args)
            .await?;
        Ok(())
    }
}
