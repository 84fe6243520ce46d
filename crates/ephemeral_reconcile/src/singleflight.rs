//! Keyed mutual exclusion for in-flight operations.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Registry<K> = Arc<Mutex<HashMap<K, Arc<AsyncMutex<()>>>>>;

/// At most one holder per key; other callers for the same key wait their turn.
///
/// Independent keys never contend. A key's slot is dropped from the registry when
/// its last holder or waiter goes away, so the registry only ever holds keys that
/// are in flight.
///
/// Callers are expected to re-check whatever they are about to produce after
/// acquiring, since a previous holder may already have produced it.
///
/// # Example
///
/// ```
/// use ephemeral_reconcile::KeyedSingleflight;
///
/// # tokio_test::block_on(async {
/// let flights = KeyedSingleflight::new();
/// {
///     let _guard = flights.acquire("guild-1/{eph} general").await;
///     assert_eq!(flights.in_flight(), 1);
/// }
/// assert_eq!(flights.in_flight(), 0);
/// # });
/// ```
#[derive(Debug)]
pub struct KeyedSingleflight<K> {
    inflight: Registry<K>,
}

impl<K> Default for KeyedSingleflight<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyedSingleflight<K>
where
    K: Eq + Hash + Clone,
{
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wait until no one else holds `key`, then hold it until the guard drops.
    pub async fn acquire(&self, key: K) -> FlightGuard<K> {
        let slot = {
            let mut inflight = self.inflight.lock();
            Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        let guard = Arc::clone(&slot).lock_owned().await;
        FlightGuard {
            key,
            slot,
            guard: Some(guard),
            registry: Arc::clone(&self.inflight),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn in_flight(&self) -> usize {
        self.inflight.lock().len()
    }
}

/// Holds a key of a [`KeyedSingleflight`] until dropped.
#[derive(Debug)]
pub struct FlightGuard<K>
where
    K: Eq + Hash,
{
    key: K,
    slot: Arc<AsyncMutex<()>>,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry<K>,
}

impl<K> FlightGuard<K>
where
    K: Eq + Hash,
{
    /// The key being held.
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K> Drop for FlightGuard<K>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        // The owned guard keeps its own reference to the slot; release it first.
        drop(self.guard.take());
        let mut inflight = self.registry.lock();
        // Registry entry plus ours: nobody else is waiting on this key.
        if Arc::strong_count(&self.slot) == 2 {
            inflight.remove(&self.key);
        }
    }
}
