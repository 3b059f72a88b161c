use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex as SyncMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockMap = HashMap<NaiveDate, Arc<Mutex<()>>>;

/// One async mutex per calendar date. Holding the guard serializes every
/// read-modify-write of that date's bookings.
///
/// An entry lives only while someone holds or waits for it; the last guard
/// out removes it.
#[derive(Default)]
pub struct DateLocks {
    locks: Arc<SyncMutex<LockMap>>,
}

/// Exclusive access to one date's bookings until dropped.
pub struct DateGuard {
    date: NaiveDate,
    guard: Option<OwnedMutexGuard<()>>,
    locks: Arc<SyncMutex<LockMap>>,
}

fn lock_map(locks: &SyncMutex<LockMap>) -> std::sync::MutexGuard<'_, LockMap> {
    locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl DateLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, date: NaiveDate) -> DateGuard {
        let lock = lock_map(&self.locks)
            .entry(date)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        DateGuard {
            date,
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }
}

impl Drop for DateGuard {
    fn drop(&mut self) {
        // Release first so our own reference no longer counts.
        self.guard.take();

        let mut locks = lock_map(&self.locks);
        let idle = locks
            .get(&self.date)
            .is_some_and(|lock| Arc::strong_count(lock) == 1);
        if idle {
            locks.remove(&self.date);
        }
    }
}
