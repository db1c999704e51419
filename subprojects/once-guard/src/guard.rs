//! # Guard
//!
//! A reusable "run once" gate over an ordered list of actions.
//!
//! The state machine is made of three pieces:
//!
//! * `done`, an [`AtomicBool`] read without locking on the fast path,
//! * the execution gate, a [`Mutex`] admitting one executing caller at a
//!   time and serialising [`reset`](Guard::reset) with execution,
//! * the wait/unblock channel used by blocking completion queries.
//!
//! ## Memory ordering
//!
//! `done` is stored with `Release` and loaded with `Acquire`, so everything
//! the actions wrote before completion was recorded is visible to a thread
//! observing `done == true`.
//!
//! ## Failure paths
//!
//! The gate is an RAII lock and waiters are notified from a drop guard.
//! Both run when an uncontained panic unwinds out of [`Guard::call`], so
//! the guard stays usable afterwards.

use core::{
    fmt,
    sync::atomic::{
        AtomicBool, AtomicU64,
        Ordering::{AcqRel, Acquire, Relaxed, Release},
    },
};

use parking_lot::Mutex;

use crate::{
    action::{self, Action},
    config::{Completion, GuardBuilder, GuardConfig},
    error::{ActionFailure, ConfigError},
    signal::Signal,
    verify::{self, Evaluation},
};

/// A run-once gate over one or more actions, reusable through
/// [`reset`](Guard::reset).
///
/// Share it by reference or through an `Arc`; every operation takes `&self`.
pub struct Guard {
    config: GuardConfig,
    actions: Box<[Box<dyn Action>]>,
    done: AtomicBool,
    epoch: AtomicU64,
    gate: Mutex<()>,
    signal: Signal,
}

impl Guard {
    /// Creates a guard running `actions` in order.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::VerifyRequiresLazy`] if `config` combines eager
    ///   completion with a verification policy.
    /// * [`ConfigError::NoActions`] if `actions` is empty.
    pub fn new(config: GuardConfig, actions: Vec<Box<dyn Action>>) -> Result<Self, ConfigError> {
        config.validate()?;
        if actions.is_empty() {
            return Err(ConfigError::NoActions);
        }

        Ok(Self::from_parts(config, actions))
    }

    /// Returns a builder starting from the default configuration.
    pub fn builder() -> GuardBuilder {
        GuardBuilder::new()
    }

    /// Creates a guard with the default configuration around a single action.
    ///
    /// The default configuration (eager completion, no verification, no
    /// containment) is always valid, so this cannot fail.
    pub fn with_action<A>(action: A) -> Self
    where
        A: Action + 'static,
    {
        Self::from_parts(GuardConfig::default(), vec![Box::new(action)])
    }

    /// Creates a guard with the default configuration around several
    /// actions, run in iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoActions`] if `actions` yields nothing.
    pub fn with_actions<I>(actions: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Box<dyn Action>>,
    {
        Self::new(GuardConfig::default(), actions.into_iter().collect())
    }

    /// Creates a classic one-shot guard around a closure without an outcome.
    ///
    /// ```
    /// use once_guard::Guard;
    ///
    /// let guard = Guard::once(|| println!("initialised"));
    /// assert!(guard.call().unwrap());
    /// assert!(!guard.call().unwrap());
    /// ```
    pub fn once<F>(f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_action(action::unit(f))
    }

    fn from_parts(config: GuardConfig, actions: Vec<Box<dyn Action>>) -> Self {
        Self {
            config,
            actions: actions.into_boxed_slice(),
            done: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            gate: Mutex::new(()),
            signal: Signal::new(),
        }
    }

    /// Runs the actions unless the current epoch is already complete.
    ///
    /// Returns `Ok(false)` without running anything if the epoch was
    /// already complete, whether observed on the lock-free fast path or
    /// after waiting for the execution gate.
    ///
    /// Otherwise this caller executes the actions. With
    /// [`Completion::Eager`] the epoch is marked complete first and the call
    /// returns `Ok(true)`. With [`Completion::Lazy`] the configured
    /// [`Verify`](crate::Verify) policy decides the returned value, and the
    /// epoch is marked complete only if it is `true`. A `false` leaves the
    /// epoch open so the next call retries the whole list.
    ///
    /// # Errors
    ///
    /// Returns the [`ActionFailure`] of the first failing action unless the
    /// guard contains failures. Later actions are not invoked. A panicking
    /// action unwinds through this call unless failures are contained.
    ///
    /// With containment the failure is logged and the call returns the
    /// partial outcome of the policy at the failing action.
    pub fn call(&self) -> Result<bool, ActionFailure> {
        // Fast path: already complete in this epoch.
        if self.is_done() {
            tracing::trace!("guard already done");
            return Ok(false);
        }

        let _gate = self.gate.lock();

        // Another caller may have completed the epoch while we were queued.
        if self.done.load(Acquire) {
            tracing::trace!("guard completed while waiting for the gate");
            return Ok(false);
        }

        // Dropped before the gate, on every exit path.
        let _wake = self.signal.broadcast_on_drop();

        let span = tracing::debug_span!(
            "guard_call",
            epoch = self.epoch.load(Relaxed),
            completion = ?self.config.completion,
            verify = %self.config.verify,
        );
        let _enter = span.enter();

        if self.config.completion == Completion::Eager {
            self.done.store(true, Release);
        }

        let evaluation = if self.config.contain_failures {
            verify::evaluate(self.config.verify, &self.actions, action::run_contained)
        } else {
            verify::evaluate(self.config.verify, &self.actions, |action| action.run())
        };
        let invoked = evaluation.invoked();

        match evaluation {
            Evaluation::Completed { outcome, .. } => {
                if self.config.is_lazy() && outcome {
                    self.done.store(true, Release);
                }
                tracing::debug!(outcome, invoked, "actions finished");
                Ok(outcome)
            }
            Evaluation::Aborted {
                partial, failure, ..
            } if self.config.contain_failures => {
                tracing::warn!(error = %failure, partial, invoked, "contained action failure");
                Ok(partial)
            }
            Evaluation::Aborted { failure, .. } => {
                tracing::debug!(error = %failure, invoked, "action failure propagated");
                Err(failure)
            }
        }
    }

    /// Queries completion of the current epoch.
    ///
    /// With `block == false` this is [`is_done`](Self::is_done), with
    /// `block == true` it is [`wait`](Self::wait).
    pub fn done(&self, block: bool) -> bool {
        if block { self.wait() } else { self.is_done() }
    }

    /// Returns whether the current epoch is complete, without blocking.
    ///
    /// An execution in progress may complete the epoch right after this
    /// returns `false`.
    #[inline]
    pub fn is_done(&self) -> bool {
        self.done.load(Acquire)
    }

    /// Blocks until the epoch is complete or the guard is [closed].
    ///
    /// Returns the completion state observed on wake-up: `true` after a
    /// completion, usually `false` after a close.
    ///
    /// [closed]: Self::close
    pub fn wait(&self) -> bool {
        if self.is_done() {
            return true;
        }

        self.signal.wait_while(|| !self.done.load(Acquire));
        self.is_done()
    }

    /// Starts a new epoch.
    ///
    /// Clears the completion and unblocked states. Waits for an execution in
    /// progress to finish first. Returns whether the epoch being left was
    /// complete.
    pub fn reset(&self) -> bool {
        let _gate = self.gate.lock();

        let was_done = self.done.swap(false, AcqRel);
        self.signal.reopen();
        let epoch = self.epoch.fetch_add(1, AcqRel) + 1;

        tracing::debug!(was_done, epoch, "guard reset");
        was_done
    }

    /// Releases every caller blocked in [`wait`](Self::wait), now and until
    /// the next [`reset`](Self::reset), without touching completion.
    ///
    /// Does not wait for an execution in progress.
    pub fn close(&self) {
        if self.signal.close() {
            tracing::debug!(done = self.is_done(), "guard closed");
        }
    }

    /// Returns whether [`close`](Self::close) was called in this epoch.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.signal.is_unblocked()
    }

    /// Number of resets since construction.
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Acquire)
    }

    #[inline]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Number of actions, always at least one.
    #[inline]
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("config", &self.config)
            .field("actions", &self.actions.len())
            .field("done", &self.is_done())
            .field("closed", &self.is_closed())
            .field("epoch", &self.epoch())
            .finish_non_exhaustive()
    }
}
