//! # once-guard
//!
//! A reusable "run once" synchronization primitive.
//!
//! A [`Guard`] owns an ordered list of actions and lets any number of
//! threads race to execute them. At most one caller executes per epoch; the
//! others either see the epoch already complete or queue on the execution
//! gate and then see it complete. On top of the classic one-shot behaviour
//! the guard offers:
//!
//! * several actions per guard, run in order,
//! * [`Completion::Eager`] or [`Completion::Lazy`] recording of completion,
//! * [`Verify`] policies judging the boolean outcome of each action; with
//!   lazy completion a failed verification leaves the epoch open and the next
//!   call retries,
//! * optional containment of action failures (errors and panics),
//! * a blocking completion query released by completion or by an explicit
//!   [`Guard::close`],
//! * [`Guard::reset`] to start a new epoch.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! use once_guard::{Guard, Verify};
//!
//! let guard = Arc::new(
//!     Guard::builder()
//!         .lazy()
//!         .verify(Verify::All)
//!         .action(|| true)
//!         .build()
//!         .unwrap(),
//! );
//!
//! let winners: usize = (0..4)
//!     .map(|_| {
//!         let guard = Arc::clone(&guard);
//!         thread::spawn(move || guard.call().unwrap())
//!     })
//!     .collect::<Vec<_>>()
//!     .into_iter()
//!     .map(|handle| handle.join().unwrap() as usize)
//!     .sum();
//!
//! assert_eq!(winners, 1);
//! assert!(guard.done(true));
//! ```

#[cfg(feature = "ffi")]
mod ffi;

pub mod action;
mod config;
mod error;
mod guard;
mod signal;
mod verify;

#[doc(inline)]
pub use self::{
    action::Action,
    config::{Completion, GuardBuilder, GuardConfig, Verify},
    error::{ActionFailure, BoxError, ConfigError},
    guard::Guard,
};

static_assertions::assert_impl_all!(Guard: Send, Sync);
static_assertions::assert_impl_all!(GuardConfig: Send, Sync, Copy);
static_assertions::assert_impl_all!(ActionFailure: Send, Sync, std::error::Error);
