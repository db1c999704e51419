//! # Wait/unblock channel
//!
//! Blocking completion queries sleep on a [`Condvar`] owned by the guard.
//! Waiters are released by two kinds of broadcast:
//!
//! * a completion broadcast, sent on every exit path of an execution,
//! * a close broadcast, which also latches the `unblocked` flag so that
//!   every later wait returns immediately until the guard is reset.
//!
//! Waiters check their wake condition while holding the channel lock and
//! broadcasters take the same lock before notifying. A flag published
//! before the broadcast is therefore always seen, either before the waiter
//! goes to sleep or when it wakes up.
//!
//! Every close also bumps a generation counter. A waiter that slept through
//! a close returns even if the flag was cleared again by a reopen before it
//! got the lock back.

use core::sync::atomic::{
    AtomicBool, AtomicU64,
    Ordering::{AcqRel, Acquire, Relaxed, Release},
};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
pub(crate) struct Signal {
    unblocked: AtomicBool,
    /// Number of closes; only written under `lock`.
    closes: AtomicU64,
    lock: Mutex<()>,
    cvar: Condvar,
}

impl Signal {
    pub(crate) const fn new() -> Self {
        Self {
            unblocked: AtomicBool::new(false),
            closes: AtomicU64::new(0),
            lock: Mutex::new(()),
            cvar: Condvar::new(),
        }
    }

    /// Returns `true` once [`close`](Self::close) ran in the current epoch.
    #[inline]
    pub(crate) fn is_unblocked(&self) -> bool {
        self.unblocked.load(Acquire)
    }

    /// Blocks while `pending` holds and the channel is not unblocked.
    ///
    /// Also returns once a close happened after the call started, whether or
    /// not the channel was reopened since.
    pub(crate) fn wait_while<F>(&self, mut pending: F)
    where
        F: FnMut() -> bool,
    {
        let mut lock = self.lock.lock();
        let closes = self.closes.load(Relaxed);
        while !self.is_unblocked() && self.closes.load(Relaxed) == closes && pending() {
            self.cvar.wait(&mut lock);
        }
    }

    /// Wakes every waiter so it re-checks its condition.
    pub(crate) fn broadcast(&self) -> usize {
        let _lock = self.lock.lock();
        self.cvar.notify_all()
    }

    /// Latches the unblocked flag and wakes every waiter.
    ///
    /// Returns `false` if the channel was already unblocked.
    pub(crate) fn close(&self) -> bool {
        let _lock = self.lock.lock();
        let newly = !self.unblocked.swap(true, AcqRel);
        self.closes.fetch_add(1, Relaxed);
        self.cvar.notify_all();
        newly
    }

    /// Clears the unblocked flag for a new epoch.
    pub(crate) fn reopen(&self) {
        let _lock = self.lock.lock();
        self.unblocked.store(false, Release);
    }

    /// Returns a guard broadcasting when dropped, including during unwinding.
    pub(crate) fn broadcast_on_drop(&self) -> BroadcastOnDrop<'_> {
        BroadcastOnDrop(self)
    }
}

/// Broadcasts on the wrapped [`Signal`] when dropped.
#[must_use = "if unused the broadcast happens immediately"]
pub(crate) struct BroadcastOnDrop<'a>(&'a Signal);

impl Drop for BroadcastOnDrop<'_> {
    #[inline]
    fn drop(&mut self) {
        let woken = self.0.broadcast();
        tracing::trace!(woken, "waiters notified");
    }
}
