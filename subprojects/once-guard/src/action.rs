//! # Actions
//!
//! An action is one unit of work owned by a guard. It reports a boolean
//! outcome that the guard's [`Verify`](crate::Verify) policy folds into the
//! result of a call, or an [`ActionFailure`] when it terminates abnormally.
//!
//! Plain closures returning `bool` are actions already. The adapters in this
//! module cover the two other shapes:
//!
//! * [`unit`] for closures without an outcome (always `true`),
//! * [`fallible`] for closures returning `Result<bool, E>`.

use core::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{ActionFailure, BoxError};

/// A unit of work executed by a [`Guard`](crate::Guard).
///
/// Actions are shared read-only across every thread using the guard, hence
/// the `Send + Sync` bound and the `&self` receiver.
pub trait Action: Send + Sync {
    /// Runs the action and reports its outcome.
    fn run(&self) -> Result<bool, ActionFailure>;
}

impl<F> Action for F
where
    F: Fn() -> bool + Send + Sync,
{
    #[inline]
    fn run(&self) -> Result<bool, ActionFailure> {
        Ok(self())
    }
}

/// Adapts a closure without an outcome. The outcome is always `true`.
pub fn unit<F>(f: F) -> Unit<F>
where
    F: Fn() + Send + Sync,
{
    Unit(f)
}

/// Adapts a closure that may fail with an error.
pub fn fallible<F, E>(f: F) -> Fallible<F>
where
    F: Fn() -> Result<bool, E> + Send + Sync,
    E: Into<BoxError>,
{
    Fallible(f)
}

/// Action returned by [`unit`].
#[derive(Clone, Copy)]
pub struct Unit<F>(F);

impl<F> Action for Unit<F>
where
    F: Fn() + Send + Sync,
{
    #[inline]
    fn run(&self) -> Result<bool, ActionFailure> {
        (self.0)();
        Ok(true)
    }
}

impl<F> fmt::Debug for Unit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Unit(..)")
    }
}

/// Action returned by [`fallible`].
#[derive(Clone, Copy)]
pub struct Fallible<F>(F);

impl<F, E> Action for Fallible<F>
where
    F: Fn() -> Result<bool, E> + Send + Sync,
    E: Into<BoxError>,
{
    #[inline]
    fn run(&self) -> Result<bool, ActionFailure> {
        (self.0)().map_err(ActionFailure::error)
    }
}

impl<F> fmt::Debug for Fallible<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Fallible(..)")
    }
}

/// Runs `action`, turning a panic into [`ActionFailure::Panic`].
///
/// Only used when the guard contains failures. Without containment a panic
/// unwinds straight through the guard to the caller.
pub(crate) fn run_contained(action: &dyn Action) -> Result<bool, ActionFailure> {
    match panic::catch_unwind(AssertUnwindSafe(|| action.run())) {
        Ok(result) => result,
        Err(payload) => Err(ActionFailure::from_panic(payload)),
    }
}
