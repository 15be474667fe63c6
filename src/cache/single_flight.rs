//! Single-Flight Coordinator
//!
//! At most one load per scope is in flight at any time. Callers that miss
//! while a load for their scope is pending attach to it and receive its
//! result instead of starting another.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{error, trace};

use crate::error::{CacheError, Result};
use crate::store::RecordId;

// == Scope ==
/// What a load covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// The whole collection
    Collection,
    /// One record by id
    Id(RecordId),
    /// One record by slug
    Slug(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Collection => f.write_str("collection"),
            Scope::Id(id) => write!(f, "id:{}", id),
            Scope::Slug(slug) => write!(f, "slug:{}", slug),
        }
    }
}

type PendingLoad<T> = Shared<BoxFuture<'static, Result<T>>>;

// == Single Flight ==
pub struct SingleFlight<K, T> {
    pending: Arc<Mutex<HashMap<K, PendingLoad<T>>>>,
}

impl<K, T> SingleFlight<K, T>
where
    K: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Runs `load` for `key` unless a load for `key` is already pending, in
    /// which case the caller waits for that one.
    ///
    /// `load` is only called when this caller starts the load. The registry
    /// entry is removed, on success, failure or panic, before any caller
    /// sees the result, so a miss after completion always starts a new load.
    /// A panicking load reaches its callers as `CacheError::Internal`.
    pub async fn run<F, Fut>(&self, key: K, load: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let flight = {
            let mut pending = self.pending.lock();
            match pending.get(&key) {
                Some(existing) => {
                    trace!(scope = %key, "attaching to pending load");
                    existing.clone()
                }
                None => {
                    let registry = Arc::clone(&self.pending);
                    let scope = key.clone();
                    let fut = load();
                    let flight = async move {
                        let outcome = AssertUnwindSafe(fut).catch_unwind().await;
                        registry.lock().remove(&scope);
                        outcome.unwrap_or_else(|_| {
                            error!(scope = %scope, "load panicked");
                            Err(CacheError::Internal(format!("load for {} panicked", scope)))
                        })
                    }
                    .boxed()
                    .shared();

                    pending.insert(key, flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    /// Whether a load for `key` is pending.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }

    /// Number of pending loads.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
