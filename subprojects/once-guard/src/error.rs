//! # Errors
//!
//! Two kinds of failure exist around a [`Guard`](crate::Guard):
//!
//! * [`ConfigError`] is returned synchronously from construction and never
//!   afterwards.
//! * [`ActionFailure`] is raised by an action while the guard executes it.
//!   Depending on the guard's containment setting it is either handed back
//!   to the calling thread or swallowed at the call boundary.

use std::{any::Any, error::Error as StdError};

use crate::config::Verify;

/// Boxed error type carried by [`ActionFailure::Error`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Error returned when a guard configuration is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Eager completion was combined with a verification policy.
    ///
    /// Verification decides completion from the action outcomes, which only
    /// exist after the actions ran, so it requires lazy completion.
    #[error("verify={0} requires lazy completion; use lazy completion or verify=none")]
    VerifyRequiresLazy(Verify),
    /// The guard was given no actions to run.
    #[error("a guard needs at least one action")]
    NoActions,
}

/// Abnormal termination of an action.
#[derive(Debug, thiserror::Error)]
pub enum ActionFailure {
    /// The action returned an error.
    #[error("action failed: {0}")]
    Error(#[source] BoxError),
    /// The action panicked. Only produced when failure containment is on.
    #[error("action panicked: {0}")]
    Panic(String),
}

impl ActionFailure {
    /// Wraps any error value into an [`ActionFailure::Error`].
    pub fn error<E>(err: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Error(err.into())
    }

    /// Builds an [`ActionFailure::Panic`] from a `catch_unwind` payload.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(msg) = payload.downcast_ref::<&'static str>() {
            (*msg).to_owned()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "<non-string panic payload>".to_owned()
        };
        Self::Panic(message)
    }

    /// Returns `true` if the failure originated from a panic.
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_policy() {
        let err = ConfigError::VerifyRequiresLazy(Verify::FirstExit);
        assert_eq!(
            err.to_string(),
            "verify=first-exit requires lazy completion; use lazy completion or verify=none"
        );
    }

    #[test]
    fn panic_payloads_are_stringified() {
        let failure = ActionFailure::from_panic(Box::new("boom"));
        assert!(failure.is_panic());
        assert_eq!(failure.to_string(), "action panicked: boom");

        let failure = ActionFailure::from_panic(Box::new(String::from("owned boom")));
        assert_eq!(failure.to_string(), "action panicked: owned boom");

        let failure = ActionFailure::from_panic(Box::new(1_u32));
        assert_eq!(failure.to_string(), "action panicked: <non-string panic payload>");
    }

    #[test]
    fn error_keeps_its_source() {
        let io = std::io::Error::other("disk gone");
        let failure = ActionFailure::error(io);
        assert!(!failure.is_panic());
        assert_eq!(failure.source().map(ToString::to_string), Some("disk gone".to_owned()));
    }
}
