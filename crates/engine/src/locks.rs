//! Per-wager serialization.
//!
//! `accept`, `complete` and `cancel` on a single wager must be mutually
//! exclusive so two near-simultaneous marker events cannot both succeed.
//! Different wagers proceed in parallel; there is no global lock.

use std::{collections::HashMap, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::WagerId;

#[derive(Clone, Default)]
pub(crate) struct WagerLocks {
    inner: Arc<Mutex<HashMap<WagerId, Arc<Mutex<()>>>>>,
}

impl WagerLocks {
    /// Take the lock for one wager, creating it on first use.
    pub(crate) async fn acquire(&self, wager_id: WagerId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(wager_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_wager_is_exclusive() {
        let locks = WagerLocks::default();
        let guard = locks.acquire(1).await;
        assert!(
            locks.inner.lock().await.get(&1).unwrap().try_lock().is_err(),
            "second acquire on the same wager must block"
        );
        drop(guard);
        let _second = locks.acquire(1).await;
    }

    #[tokio::test]
    async fn different_wagers_do_not_block() {
        let locks = WagerLocks::default();
        let _one = locks.acquire(1).await;
        let _two = locks.acquire(2).await;
    }
}
