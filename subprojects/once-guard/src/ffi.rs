//! FFI bindings for the `once-guard` crate - Guard
//!
//! A guard created from C owns an array of callbacks sharing one context
//! pointer. Callbacks must not unwind; they report failure through a
//! negative return value instead.

use core::{ffi::c_void, ptr, slice};

use crate::{
    action::Action,
    config::{Completion, GuardConfig, Verify},
    error::ActionFailure,
    guard::Guard,
};

/// Action callback. Receives the context pointer given at creation.
///
/// Returns `0` for a `false` outcome, a positive value for `true` and a
/// negative value if the action failed.
pub type Callback = unsafe extern "C" fn(ctx: *mut c_void) -> i32;

/// Opaque guard handle.
#[repr(C)]
pub struct OnceGuard(Guard);

/// Returned by [`__once_guard__create`] on success.
const CREATE_OK: i32 = 0;
/// A pointer argument was `NULL` or the callback array was empty.
const CREATE_INVALID_ARGUMENT: i32 = -1;
/// The settings were rejected (eager completion with a verify policy, or
/// an unknown verify policy).
const CREATE_INVALID_CONFIG: i32 = -2;

/// Returned by [`__once_guard__call`] when an action failed.
const CALL_FAILED: i32 = -1;

/// Failure reported by a [`Callback`].
#[derive(Debug, thiserror::Error)]
#[error("callback returned {0}")]
struct CallbackError(i32);

struct CallbackAction {
    callback: Callback,
    ctx: *mut c_void,
}

// SAFETY: The C caller guarantees that the callbacks and their context may
// be used from any thread sharing the guard.
unsafe impl Send for CallbackAction {}
unsafe impl Sync for CallbackAction {}

impl Action for CallbackAction {
    fn run(&self) -> Result<bool, ActionFailure> {
        match unsafe { (self.callback)(self.ctx) } {
            rc if rc < 0 => Err(ActionFailure::error(CallbackError(rc))),
            rc => Ok(rc > 0),
        }
    }
}

fn verify_from_raw(raw: u32) -> Option<Verify> {
    match raw {
        0 => Some(Verify::None),
        1 => Some(Verify::All),
        2 => Some(Verify::FirstRunAll),
        3 => Some(Verify::FirstExit),
        _ => None,
    }
}

/// Creates a guard over `count` callbacks, run in array order.
///
/// `verify` is `0` (none), `1` (all), `2` (first-run-all) or `3`
/// (first-exit). On success the handle is written to `out` and must be
/// released with [`__once_guard__free`].
///
/// # Safety
///
/// The caller must ensure that:
/// * `callbacks` points to `count` valid function pointers
/// * `out` points to writable memory for one pointer
/// * `ctx` stays valid, and is safe to use from every calling thread, for
///   the lifetime of the guard
///
/// # Returns
///
/// * `0` on success
/// * `-1` if a pointer is `NULL` or `count` is zero
/// * `-2` if the settings cannot be combined
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__create(
    lazy: bool,
    contain_failures: bool,
    verify: u32,
    callbacks: *const Callback,
    count: usize,
    ctx: *mut c_void,
    out: *mut *mut OnceGuard,
) -> i32 {
    if callbacks.is_null() || out.is_null() || count == 0 {
        return CREATE_INVALID_ARGUMENT;
    }

    let Some(verify) = verify_from_raw(verify) else {
        return CREATE_INVALID_CONFIG;
    };
    let completion = if lazy {
        Completion::Lazy
    } else {
        Completion::Eager
    };
    let config = GuardConfig::new(completion, verify, contain_failures);

    let actions = unsafe { slice::from_raw_parts(callbacks, count) }
        .iter()
        .map(|&callback| Box::new(CallbackAction { callback, ctx }) as Box<dyn Action>)
        .collect();

    match Guard::new(config, actions) {
        Ok(guard) => {
            unsafe { out.write(Box::into_raw(Box::new(OnceGuard(guard)))) };
            CREATE_OK
        }
        Err(_) => {
            unsafe { out.write(ptr::null_mut()) };
            CREATE_INVALID_CONFIG
        }
    }
}

/// Frees a guard.
///
/// If `guard` is `NULL`, this function does nothing.
///
/// # Safety
///
/// `guard` must come from [`__once_guard__create`] and no other thread may
/// still be using it.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__free(guard: *mut OnceGuard) {
    if guard.is_null() {
        return;
    }
    drop(unsafe { Box::from_raw(guard) });
}

/// Runs the actions unless the current epoch is complete.
///
/// # Safety
///
/// `guard` must be a valid handle from [`__once_guard__create`].
///
/// # Returns
///
/// * `1` if this call performed the work and it succeeded
/// * `0` if the epoch was already complete, or verification failed
/// * `-1` if a callback returned a negative value and failures are not
///   contained
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__call(guard: *const OnceGuard) -> i32 {
    match unsafe { &*guard }.0.call() {
        Ok(outcome) => i32::from(outcome),
        Err(_) => CALL_FAILED,
    }
}

/// Queries completion, blocking until completion or close if `block` is set.
///
/// # Safety
///
/// `guard` must be a valid handle from [`__once_guard__create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__done(guard: *const OnceGuard, block: bool) -> bool {
    unsafe { &*guard }.0.done(block)
}

/// Starts a new epoch. Returns whether the previous epoch was complete.
///
/// # Safety
///
/// `guard` must be a valid handle from [`__once_guard__create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__reset(guard: *const OnceGuard) -> bool {
    unsafe { &*guard }.0.reset()
}

/// Releases every thread blocked in [`__once_guard__done`].
///
/// # Safety
///
/// `guard` must be a valid handle from [`__once_guard__create`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn __once_guard__close(guard: *const OnceGuard) {
    unsafe { &*guard }.0.close()
}
