use futures::future::{BoxFuture, FutureExt, Shared, WeakShared};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::ClientError;

type Operation<T> = BoxFuture<'static, Result<T, ClientError>>;

/// A pending operation, tagged so a finished one never evicts its successor.
struct Entry<T> {
    id: u64,
    operation: WeakShared<Operation<T>>,
}

type PendingMap<K, T> = Arc<Mutex<HashMap<K, Entry<T>>>>;

fn lock_map<K, T>(map: &PendingMap<K, T>) -> MutexGuard<'_, HashMap<K, Entry<T>>> {
    map.lock().unwrap_or_else(|e| e.into_inner())
}

/// Coalesces concurrent async operations per logical key.
///
/// While an operation for a key is pending, further calls with the same key
/// await that operation's result instead of starting a new one. The key
/// belongs to the operation, not to the caller that started it: it is
/// released when the operation finishes, or when every caller awaiting it
/// has gone away.
pub struct InFlight<K, T> {
    pending: PendingMap<K, T>,
    next_id: AtomicU64,
}

/// Lives inside the shared operation and releases its key when dropped.
struct Release<K: Eq + Hash, T> {
    pending: PendingMap<K, T>,
    key: K,
    id: u64,
}

impl<K: Eq + Hash, T> Drop for Release<K, T> {
    fn drop(&mut self) {
        let mut pending = lock_map(&self.pending);
        if pending.get(&self.key).is_some_and(|entry| entry.id == self.id) {
            pending.remove(&self.key);
        }
    }
}

impl<K, T> InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock_map(&self.pending).contains_key(key)
    }

    /// Run `operation` under `key`, or join the operation already running
    /// under it. `operation` is only invoked when no call is pending.
    pub async fn run<F, Fut>(&self, key: K, operation: F) -> Result<T, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    {
        let shared = {
            let mut pending = lock_map(&self.pending);
            let joined = pending.get(&key).and_then(|entry| entry.operation.upgrade());

            match joined {
                Some(existing) => {
                    tracing::debug!("Joining in-flight operation");
                    existing
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let release = Release {
                        pending: Arc::clone(&self.pending),
                        key: key.clone(),
                        id,
                    };
                    let work = operation();
                    let shared: Shared<Operation<T>> = async move {
                        let _release = release;
                        work.await
                    }
                    .boxed()
                    .shared();

                    if let Some(weak) = shared.downgrade() {
                        pending.insert(key, Entry { id, operation: weak });
                    }
                    shared
                }
            }
        };

        shared.await
    }
}

impl<K, T> Default for InFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_concurrent_calls_share_one_operation() {
        let inflight: InFlight<&'static str, usize> = InFlight::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let op = |calls: Arc<AtomicUsize>| {
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(n)
            }
        };

        let (a, b) = tokio::join!(
            inflight.run("submit", op(Arc::clone(&calls))),
            inflight.run("submit", op(Arc::clone(&calls))),
        );

        assert_eq!(a, Ok(1));
        assert_eq!(b, Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!inflight.is_pending(&"submit"));
    }

    #[tokio::test]
    async fn test_key_is_released_after_completion() {
        let inflight: InFlight<u32, u32> = InFlight::new();

        let first = inflight.run(1, || async { Ok(10) }).await;
        let second = inflight.run(1, || async { Ok(20) }).await;

        assert_eq!(first, Ok(10));
        assert_eq!(second, Ok(20));
    }

    #[tokio::test]
    async fn test_errors_are_shared() {
        let inflight: InFlight<u32, u32> = InFlight::new();

        let (a, b) = tokio::join!(
            inflight.run(1, || async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(ClientError::http_status(500, "Internal Server Error"))
            }),
            inflight.run(1, || async { Ok(1) }),
        );

        assert_eq!(a.unwrap_err().status_code(), Some(500));
        assert_eq!(b.unwrap_err().status_code(), Some(500));
    }

    #[tokio::test]
    async fn test_cancelled_starter_does_not_release_key() {
        let inflight: Arc<InFlight<u32, usize>> = Arc::new(InFlight::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let op = |calls: Arc<AtomicUsize>| {
            move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(n)
            }
        };

        let starter = {
            let (inflight, calls) = (Arc::clone(&inflight), Arc::clone(&calls));
            tokio::spawn(async move {
                tokio::time::timeout(Duration::from_millis(20), inflight.run(7, op(calls))).await
            })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;

        let follower = {
            let (inflight, calls) = (Arc::clone(&inflight), Arc::clone(&calls));
            tokio::spawn(async move { inflight.run(7, op(calls)).await })
        };

        assert!(starter.await.unwrap().is_err());
        assert!(inflight.is_pending(&7));

        let late = inflight.run(7, op(Arc::clone(&calls))).await;
        assert_eq!(late, Ok(1));
        assert_eq!(follower.await.unwrap(), Ok(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!inflight.is_pending(&7));
    }

    #[tokio::test]
    async fn test_abandoned_operation_releases_key() {
        let inflight: InFlight<u32, u32> = InFlight::new();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(10),
            inflight.run(3, || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(1)
            }),
        )
        .await;

        assert!(abandoned.is_err());
        assert!(!inflight.is_pending(&3));
        assert_eq!(inflight.run(3, || async { Ok(2) }).await, Ok(2));
    }
}
