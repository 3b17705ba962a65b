//! Short-lived confirmation tokens bound to an exact operation body and
//! project.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::clock::{Clock, SystemClock};

/// Default token lifetime in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 60;

/// Number of hex characters kept from the digest.
const TOKEN_LEN: usize = 16;

#[derive(Debug, Clone)]
struct TokenRecord {
    bound_body: String,
    bound_context: String,
    issued_at: DateTime<Utc>,
}

/// Process-local table of outstanding confirmation tokens.
///
/// Expired records are removed when they are looked up or when a new token
/// is issued; there is no background sweep. A successful [`validate`](Self::validate) consumes the
/// record, so each token authorizes at most one execution.
///
/// # Example
///
/// ```
/// use bqgate_approval::ConfirmationStore;
///
/// let store = ConfirmationStore::new();
/// let token = store.issue("DROP TABLE foo", "proj");
/// assert!(!store.validate(&token, "DROP TABLE bar", "proj"));
/// assert!(!store.validate(&token, "DROP TABLE foo", "other-proj"));
/// assert!(store.validate(&token, "DROP TABLE foo", "proj"));
/// assert!(!store.validate(&token, "DROP TABLE foo", "proj"));
/// ```
pub struct ConfirmationStore {
    records: Mutex<HashMap<String, TokenRecord>>,
    clock: Arc<dyn Clock>,
    ttl: TimeDelta,
}

impl fmt::Debug for ConfirmationStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmationStore")
            .field("outstanding", &self.len())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl Default for ConfirmationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfirmationStore {
    /// Create a store with the system clock and the default lifetime.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_TOKEN_TTL_SECS)
    }

    /// Create a store with an explicit clock and lifetime in seconds.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock>, ttl_secs: u64) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            records: Mutex::new(HashMap::new()),
            clock,
            ttl,
        }
    }

    /// Issue a token bound to `body` in `context`.
    ///
    /// The token is the first 16 hex characters of
    /// `sha256(body ++ unix_seconds ++ context)`. Two issues of the same body
    /// in the same context within one second yield the same token; the record
    /// is simply refreshed. Expired records are dropped first.
    #[must_use]
    pub fn issue(&self, body: &str, context: &str) -> String {
        let issued_at = self.clock.now();
        let mut hasher = Sha256::new();
        hasher.update(body.as_bytes());
        hasher.update(issued_at.timestamp().to_string().as_bytes());
        hasher.update(context.as_bytes());
        let mut token = hex::encode(hasher.finalize());
        token.truncate(TOKEN_LEN);

        let mut records = self.records.lock().unwrap_or_else(|e| {
            warn!("ConfirmationStore lock poisoned, recovering");
            e.into_inner()
        });
        let before = records.len();
        records.retain(|_, record| issued_at.signed_duration_since(record.issued_at) <= self.ttl);
        let pruned = before.saturating_sub(records.len());
        if pruned > 0 {
            debug!(pruned, "dropped expired confirmation tokens");
        }

        records.insert(
            token.clone(),
            TokenRecord {
                bound_body: body.to_owned(),
                bound_context: context.to_owned(),
                issued_at,
            },
        );
        debug!(outstanding = records.len(), "issued confirmation token");
        token
    }

    /// Check `token` against `body` in `context`.
    ///
    /// Returns `false` for an unknown token, an expired token (which is also
    /// deleted), or a body or context that differs from the bound one (the
    /// record is kept). Returns `true` and consumes the record on an exact
    /// match.
    #[must_use]
    pub fn validate(&self, token: &str, body: &str, context: &str) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| {
            warn!("ConfirmationStore lock poisoned, recovering");
            e.into_inner()
        });

        let Some(record) = records.get(token) else {
            debug!("unknown confirmation token");
            return false;
        };

        if now.signed_duration_since(record.issued_at) > self.ttl {
            records.remove(token);
            debug!("confirmation token expired");
            return false;
        }

        if record.bound_body != body {
            debug!("confirmation token bound to a different body");
            return false;
        }

        if record.bound_context != context {
            debug!("confirmation token bound to a different project");
            return false;
        }

        records.remove(token);
        true
    }

    /// Number of records currently held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Whether no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
