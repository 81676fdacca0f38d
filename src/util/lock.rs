use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// Lock `lock`, recovering the inner state if another thread panicked while holding it.
pub(crate) fn mutex_lock<'a, T>(
    lock: &'a Mutex<T>,
    target: &'static str,
    op: &'static str,
) -> MutexGuard<'a, T> {
    match lock.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!(
                op,
                target_module = target,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                hint = "store state may be stale after panic in another thread",
                "Recovered from poisoned store lock"
            );
            poisoned.into_inner()
        }
    }
}
