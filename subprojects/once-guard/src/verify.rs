//! # Verification policy evaluator
//!
//! Runs an ordered action list under a [`Verify`] policy and folds the
//! per-action outcomes into the result of the call.
//!
//! Each policy is a small decision table: a starting value for the running
//! result and, for every action outcome, the new running result plus whether
//! to invoke the next action or stop.
//!
//! | Policy        | Start   | Outcome `true`   | Outcome `false`   | On failure |
//! |---------------|---------|------------------|-------------------|------------|
//! | `None`        | `true`  | keep, continue   | keep, continue    | running    |
//! | `All`         | `true`  | keep, continue   | `false`, **stop** | `false`    |
//! | `FirstRunAll` | `false` | `true`, continue | keep, continue    | running    |
//! | `FirstExit`   | `false` | `true`, **stop** | keep, continue    | running    |
//!
//! A failing action aborts the walk: no later action is invoked and the
//! "on failure" column gives the partial outcome reported for the call.

use crate::{action::Action, config::Verify, error::ActionFailure};

/// What the evaluator does after an action reported its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Continue,
    Stop,
}

impl Verify {
    /// Running result before any action ran.
    #[inline]
    const fn initial(self) -> bool {
        match self {
            Verify::None | Verify::All => true,
            Verify::FirstRunAll | Verify::FirstExit => false,
        }
    }

    /// Folds one action outcome into the running result.
    #[inline]
    const fn fold(self, running: bool, outcome: bool) -> (bool, Step) {
        match (self, outcome) {
            (Verify::None, _) => (running, Step::Continue),
            (Verify::All, true) => (running, Step::Continue),
            (Verify::All, false) => (false, Step::Stop),
            (Verify::FirstRunAll, true) => (true, Step::Continue),
            (Verify::FirstRunAll, false) => (running, Step::Continue),
            (Verify::FirstExit, true) => (true, Step::Stop),
            (Verify::FirstExit, false) => (running, Step::Continue),
        }
    }

    /// Partial outcome when an action fails before the walk finished.
    #[inline]
    const fn aborted(self, running: bool) -> bool {
        match self {
            Verify::All => false,
            Verify::None | Verify::FirstRunAll | Verify::FirstExit => running,
        }
    }
}

/// Result of walking an action list.
#[derive(Debug)]
pub(crate) enum Evaluation {
    /// Every action the policy asked for ran to its outcome.
    Completed { outcome: bool, invoked: usize },
    /// An action failed; later actions were skipped.
    Aborted {
        partial: bool,
        invoked: usize,
        failure: ActionFailure,
    },
}

impl Evaluation {
    /// Number of actions that were invoked, the failing one included.
    pub(crate) fn invoked(&self) -> usize {
        match self {
            Evaluation::Completed { invoked, .. } | Evaluation::Aborted { invoked, .. } => *invoked,
        }
    }
}

/// Walks `actions` in order under `policy`.
///
/// `invoke` runs a single action; the guard passes either a plain call or a
/// panic-catching one depending on its containment setting.
pub(crate) fn evaluate<F>(policy: Verify, actions: &[Box<dyn Action>], mut invoke: F) -> Evaluation
where
    F: FnMut(&dyn Action) -> Result<bool, ActionFailure>,
{
    let mut running = policy.initial();
    let mut invoked = 0;

    for (index, action) in actions.iter().enumerate() {
        invoked += 1;
        let outcome = match invoke(&**action) {
            Ok(outcome) => outcome,
            Err(failure) => {
                tracing::trace!(index, %policy, "action failed, aborting evaluation");
                return Evaluation::Aborted {
                    partial: policy.aborted(running),
                    invoked,
                    failure,
                };
            }
        };

        let (next, step) = policy.fold(running, outcome);
        running = next;
        tracing::trace!(index, outcome, running, ?step, %policy, "action finished");

        if step == Step::Stop {
            break;
        }
    }

    Evaluation::Completed {
        outcome: running,
        invoked,
    }
}
