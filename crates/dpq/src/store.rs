//! Store adapter (C1): the minimal Redis surface the registrar and engine
//! need — script load/evaluate and nothing else. All sorted-set/hash
//! mutation happens inside the Lua script, never through this adapter
//! directly, so every multi-key transition stays atomic on the server.

use redis::aio::ConnectionManager;
use redis::{ErrorKind, RedisError, Value};

use crate::error::DpqError;

/// Thin wrapper around a multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct Store {
    conn: ConnectionManager,
}

impl Store {
    /// Connect to `redis_url`, establishing the connection manager used by
    /// every subsequent call.
    pub async fn connect(redis_url: &str) -> Result<Self, DpqError> {
        let client = redis::Client::open(redis_url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// `SCRIPT EXISTS sha` for a single digest.
    pub async fn script_exists(&self, sha: &str) -> Result<bool, DpqError> {
        let mut conn = self.conn.clone();
        let exists: Vec<bool> = redis::cmd("SCRIPT")
            .arg("EXISTS")
            .arg(sha)
            .query_async(&mut conn)
            .await?;
        Ok(exists.first().copied().unwrap_or(false))
    }

    /// `SCRIPT LOAD source`, returning the digest the server computed (which
    /// must match our own SHA-1 of the same source).
    pub async fn script_load(&self, source: &str) -> Result<String, DpqError> {
        let mut conn = self.conn.clone();
        let sha: String = redis::cmd("SCRIPT")
            .arg("LOAD")
            .arg(source)
            .query_async(&mut conn)
            .await?;
        Ok(sha)
    }

    /// `EVALSHA sha 0 args...` — numkeys is always 0; the script derives its
    /// own key names from the queue-name argument.
    pub async fn evalsha(&self, sha: &str, args: &[Vec<u8>]) -> Result<Value, EvalError> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("EVALSHA");
        cmd.arg(sha).arg(0);
        for a in args {
            cmd.arg(a);
        }
        cmd.query_async(&mut conn).await.map_err(EvalError::from)
    }
}

/// Distinguishes a `NOSCRIPT` failure (digest evicted server-side) from any
/// other store error, so the registrar knows when a one-shot re-upload is
/// worth attempting.
pub enum EvalError {
    NoScript,
    Other(RedisError),
}

impl From<RedisError> for EvalError {
    fn from(e: RedisError) -> Self {
        if e.kind() == ErrorKind::NoScriptError {
            EvalError::NoScript
        } else {
            EvalError::Other(e)
        }
    }
}

impl From<EvalError> for DpqError {
    fn from(e: EvalError) -> Self {
        match e {
            EvalError::NoScript => DpqError::Store("script not found (NOSCRIPT)".to_string()),
            EvalError::Other(e) => DpqError::Store(e.to_string()),
        }
    }
}
