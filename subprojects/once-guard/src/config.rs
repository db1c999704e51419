//! # Guard configuration
//!
//! A [`GuardConfig`] is fixed when the guard is built. It answers three
//! questions:
//!
//! * When is the epoch marked complete? Before the actions run
//!   ([`Completion::Eager`]) or after their outcomes were judged
//!   ([`Completion::Lazy`]).
//! * How are the action outcomes judged? See [`Verify`].
//! * Does an action failure escape [`Guard::call`](crate::Guard::call)?
//!
//! The default configuration is eager completion, no verification and no
//! failure containment, i.e. the classic one-shot behaviour.

use core::fmt;

use crate::{
    action::{self, Action},
    error::{BoxError, ConfigError},
    guard::Guard,
};

/// When the completion flag is set relative to running the actions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Completion {
    /// Mark the epoch complete before invoking any action.
    #[default]
    Eager,
    /// Mark the epoch complete only if the verification policy succeeds.
    Lazy,
}

/// How the boolean outcomes of the actions decide completion.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Verify {
    /// Run every action, ignore the outcomes. Always succeeds.
    #[default]
    None,
    /// Succeed only if every action returns `true`. Stops at the first `false`.
    All,
    /// Run every action. Succeed if at least one returned `true`.
    FirstRunAll,
    /// Stop at the first action returning `true` and succeed.
    FirstExit,
}

impl Verify {
    /// Kebab-case name, as used in error messages and serialized configs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Verify::None => "none",
            Verify::All => "all",
            Verify::FirstRunAll => "first-run-all",
            Verify::FirstExit => "first-exit",
        }
    }
}

impl fmt::Display for Verify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable configuration of a [`Guard`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GuardConfig {
    pub completion: Completion,
    pub verify: Verify,
    /// Catch action failures (errors and panics) at the call boundary.
    pub contain_failures: bool,
}

impl GuardConfig {
    /// Creates a configuration from its three settings.
    pub const fn new(completion: Completion, verify: Verify, contain_failures: bool) -> Self {
        Self {
            completion,
            verify,
            contain_failures,
        }
    }

    /// Checks that the settings can be combined.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::VerifyRequiresLazy`] for eager completion with
    /// any policy other than [`Verify::None`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (self.completion, self.verify) {
            (Completion::Eager, Verify::None) | (Completion::Lazy, _) => Ok(()),
            (Completion::Eager, verify) => Err(ConfigError::VerifyRequiresLazy(verify)),
        }
    }

    #[inline]
    pub(crate) fn is_lazy(&self) -> bool {
        self.completion == Completion::Lazy
    }
}

/// Step-by-step construction of a [`Guard`].
///
/// Actions run in the order they are added.
///
/// ```
/// use once_guard::{Guard, Verify};
///
/// let guard = Guard::builder()
///     .lazy()
///     .verify(Verify::All)
///     .action(|| true)
///     .action(|| true)
///     .build()
///     .unwrap();
/// assert!(guard.call().unwrap());
/// ```
#[must_use]
#[derive(Default)]
pub struct GuardBuilder {
    config: GuardConfig,
    actions: Vec<Box<dyn Action>>,
}

impl GuardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: GuardConfig) -> Self {
        self.config = config;
        self
    }

    pub fn completion(mut self, completion: Completion) -> Self {
        self.config.completion = completion;
        self
    }

    /// Shorthand for `completion(Completion::Eager)`.
    pub fn eager(self) -> Self {
        self.completion(Completion::Eager)
    }

    /// Shorthand for `completion(Completion::Lazy)`.
    pub fn lazy(self) -> Self {
        self.completion(Completion::Lazy)
    }

    pub fn verify(mut self, verify: Verify) -> Self {
        self.config.verify = verify;
        self
    }

    pub fn contain_failures(mut self, contain: bool) -> Self {
        self.config.contain_failures = contain;
        self
    }

    /// Appends an action reporting a boolean outcome.
    pub fn action<A>(mut self, action: A) -> Self
    where
        A: Action + 'static,
    {
        self.actions.push(Box::new(action));
        self
    }

    /// Appends an action without an outcome. It always counts as `true`.
    pub fn unit_action<F>(self, f: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.action(action::unit(f))
    }

    /// Appends an action that may fail with an error.
    pub fn fallible_action<F, E>(self, f: F) -> Self
    where
        F: Fn() -> Result<bool, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.action(action::fallible(f))
    }

    /// Appends an already boxed action.
    pub fn boxed_action(mut self, action: Box<dyn Action>) -> Self {
        self.actions.push(action);
        self
    }

    /// Validates the configuration and builds the guard.
    ///
    /// # Errors
    ///
    /// See [`Guard::new`].
    pub fn build(self) -> Result<Guard, ConfigError> {
        Guard::new(self.config, self.actions)
    }
}

impl fmt::Debug for GuardBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuardBuilder")
            .field("config", &self.config)
            .field("actions", &self.actions.len())
            .finish()
    }
}
