//! Script registrar (C2): resolves the atomic-script source to a SHA-1
//! digest once, ensures it is resident on the server, and invokes it by
//! digest thereafter. Transparently re-uploads and retries once on
//! `NOSCRIPT` — the server may have evicted the cache (e.g. `SCRIPT FLUSH`,
//! a restart, or a failover to a replica that never saw `SCRIPT LOAD`).

use sha1::{Digest, Sha1};
use tracing::{debug, warn};

use crate::error::DpqError;
use crate::store::{EvalError, Store};

const SCRIPT_SOURCE: &str = include_str!("lua/dpq.lua");

pub struct Registrar {
    store: Store,
    sha: String,
}

impl Registrar {
    /// Compute the script's digest, upload it if the server doesn't already
    /// have it cached, and return a registrar ready to invoke by digest.
    pub async fn new(store: Store) -> Result<Self, DpqError> {
        let sha = sha1_hex(SCRIPT_SOURCE);

        if !store.script_exists(&sha).await? {
            debug!(sha = %sha, "uploading dpq script");
            let uploaded = store.script_load(SCRIPT_SOURCE).await?;
            debug_assert_eq!(
                uploaded, sha,
                "server-computed SHA-1 disagrees with our own"
            );
        }

        Ok(Self { store, sha })
    }

    /// Invoke the script for `op` against `queue`, with `args` appended
    /// after `[op, queue]` in the ARGV vector.
    pub async fn eval(
        &self,
        op: &str,
        queue: &str,
        args: &[Vec<u8>],
    ) -> Result<redis::Value, DpqError> {
        let mut full = Vec::with_capacity(args.len() + 2);
        full.push(op.as_bytes().to_vec());
        full.push(queue.as_bytes().to_vec());
        full.extend(args.iter().cloned());

        match self.store.evalsha(&self.sha, &full).await {
            Ok(v) => Ok(v),
            Err(EvalError::NoScript) => {
                warn!(sha = %self.sha, op, "script missing on server, re-uploading");
                self.store.script_load(SCRIPT_SOURCE).await?;
                self.store
                    .evalsha(&self.sha, &full)
                    .await
                    .map_err(|e| match e {
                        EvalError::NoScript => {
                            DpqError::ScriptMissing(format!("op {op} still missing after reload"))
                        }
                        EvalError::Other(e) => DpqError::Store(e.to_string()),
                    })
            }
            Err(EvalError::Other(e)) => Err(DpqError::Store(e.to_string())),
        }
    }
}

fn sha1_hex(source: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(source.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_stable() {
        assert_eq!(sha1_hex("push"), sha1_hex("push"));
        assert_ne!(sha1_hex("push"), sha1_hex("pop"));
    }

    #[test]
    fn digest_matches_known_sha1() {
        // sha1("") == da39a3ee5e6b4b0d3255bfef95601890afd80709
        assert_eq!(sha1_hex(""), "da39a3ee5e6b4b0d3255bfef95601890afd80709");
    }
}
