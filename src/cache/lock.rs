//! Lock acquisition with poison recovery.
//!
//! A panic in one request thread must not wedge the shared caches for every
//! other in-flight request. Entries are immutable once stored, so taking
//! the guard out of a poisoned lock is safe; it is logged because the panic
//! itself still wants investigating.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) fn read_guard<'a, T>(lock: &'a RwLock<T>, what: &'static str) -> RwLockReadGuard<'a, T> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!(lock = what, kind = "rwlock.read", "recovered poisoned lock");
        poisoned.into_inner()
    })
}

pub(crate) fn write_guard<'a, T>(
    lock: &'a RwLock<T>,
    what: &'static str,
) -> RwLockWriteGuard<'a, T> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!(lock = what, kind = "rwlock.write", "recovered poisoned lock");
        poisoned.into_inner()
    })
}

pub(crate) fn mutex_guard<'a, T>(lock: &'a Mutex<T>, what: &'static str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        warn!(lock = what, kind = "mutex", "recovered poisoned lock");
        poisoned.into_inner()
    })
}
