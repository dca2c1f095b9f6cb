// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-peripheral state machine absorbing the activation delay.
//!
//! After a command the hardware may keep reporting its previous state for a
//! few seconds. The reconciler exposes the commanded value as `pending`,
//! suppresses contradicting reports for the length of the activation window,
//! and falls back to the reported value once the window has elapsed.
//!
//! ```text
//!           issue_command                 matching report
//!   Idle ─────────────────────► Pending ─────────────────────► Idle
//!    ▲                           │  ▲ contradicting report,
//!    │                           │  │ inside the window
//!    │ next poll                 │  └──┘
//!    │                           │ window elapsed
//!    └──────── TimedOut ◄────────┘
//! ```
//!
//! Time is logical: the window is checked against poll timestamps, never
//! against a running timer.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::reconciled::{CommandIntent, Confidence, ReconciledState};
use crate::types::PeripheralId;

/// Phase of a [`StateReconciler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerPhase {
    /// No command outstanding; the state mirrors the last report.
    Idle,
    /// A command is awaiting confirmation.
    Pending,
    /// The last command was not confirmed in time.
    TimedOut,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Pending(CommandIntent),
    TimedOut,
}

/// Result of feeding one event to a reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileOutcome {
    /// The new state, if the value or confidence changed.
    pub changed: Option<ReconciledState>,
    /// `true` if the outstanding command just timed out.
    pub timed_out: bool,
}

impl ReconcileOutcome {
    fn unchanged() -> Self {
        Self::default()
    }
}

/// Arbitrates between commanded and reported state for one peripheral.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use chrono::{TimeDelta, Utc};
/// use ecowitt_iot::state::{Confidence, StateReconciler};
/// use ecowitt_iot::types::PeripheralId;
///
/// let t0 = Utc::now();
/// let mut reconciler =
///     StateReconciler::new(PeripheralId::new(7), false, t0, Duration::from_secs(5));
///
/// reconciler.issue_command(true, t0);
/// assert_eq!(reconciler.state().confidence(), Confidence::Pending);
///
/// // The valve still reports "off" one second later: suppressed.
/// let outcome = reconciler.observe(false, t0 + TimeDelta::seconds(1));
/// assert!(outcome.changed.is_none());
/// assert!(reconciler.state().is_on());
///
/// // It catches up.
/// let outcome = reconciler.observe(true, t0 + TimeDelta::seconds(2));
/// assert_eq!(outcome.changed.unwrap().confidence(), Confidence::Confirmed);
/// ```
#[derive(Debug, Clone)]
pub struct StateReconciler {
    window: TimeDelta,
    phase: Phase,
    state: ReconciledState,
    last_observed: bool,
}

impl StateReconciler {
    /// Creates a reconciler seeded with the first observation.
    #[must_use]
    pub fn new(id: PeripheralId, observed: bool, now: DateTime<Utc>, window: Duration) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            phase: Phase::Idle,
            state: ReconciledState::new(id, observed, Confidence::Confirmed, now),
            last_observed: observed,
        }
    }

    /// Returns the peripheral id.
    #[must_use]
    pub fn id(&self) -> PeripheralId {
        self.state.id()
    }

    /// Returns the authoritative state.
    #[must_use]
    pub fn state(&self) -> ReconciledState {
        self.state
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> ReconcilerPhase {
        match self.phase {
            Phase::Idle => ReconcilerPhase::Idle,
            Phase::Pending(_) => ReconcilerPhase::Pending,
            Phase::TimedOut => ReconcilerPhase::TimedOut,
        }
    }

    /// Returns the outstanding command, if any.
    #[must_use]
    pub fn intent(&self) -> Option<CommandIntent> {
        match self.phase {
            Phase::Pending(intent) => Some(intent),
            Phase::Idle | Phase::TimedOut => None,
        }
    }

    /// Records an acknowledged command.
    ///
    /// The state becomes the desired value with `pending` confidence. An
    /// outstanding command is superseded without a timeout.
    pub fn issue_command(&mut self, desired: bool, now: DateTime<Utc>) -> ReconcileOutcome {
        if let Phase::Pending(previous) = self.phase {
            tracing::debug!(
                peripheral_id = %self.id(),
                previous = previous.desired,
                desired,
                "Superseding outstanding command"
            );
        }

        self.phase = Phase::Pending(CommandIntent {
            id: self.id(),
            desired,
            issued_at: now,
        });

        ReconcileOutcome {
            changed: self.transition(desired, Confidence::Pending, now),
            timed_out: false,
        }
    }

    /// Feeds a fresh report from the hardware.
    pub fn observe(&mut self, observed: bool, now: DateTime<Utc>) -> ReconcileOutcome {
        self.last_observed = observed;

        match self.phase {
            Phase::Idle | Phase::TimedOut => {
                self.phase = Phase::Idle;
                ReconcileOutcome {
                    changed: self.transition(observed, Confidence::Confirmed, now),
                    timed_out: false,
                }
            }
            Phase::Pending(intent) if observed == intent.desired => {
                self.phase = Phase::Idle;
                ReconcileOutcome {
                    changed: self.transition(observed, Confidence::Confirmed, now),
                    timed_out: false,
                }
            }
            Phase::Pending(intent) if self.window_elapsed(&intent, now) => self.time_out(now),
            Phase::Pending(intent) => {
                tracing::trace!(
                    peripheral_id = %self.id(),
                    observed,
                    desired = intent.desired,
                    elapsed_ms = (now - intent.issued_at).num_milliseconds(),
                    "Suppressing report inside activation window"
                );
                ReconcileOutcome::unchanged()
            }
        }
    }

    /// Advances the machine for a poll that carried no fresh report.
    ///
    /// An outstanding command still times out against the last report, so a
    /// peripheral that stops reporting cannot stay pending forever.
    pub fn poll_without_observation(&mut self, now: DateTime<Utc>) -> ReconcileOutcome {
        match self.phase {
            Phase::TimedOut => {
                self.phase = Phase::Idle;
                ReconcileOutcome::unchanged()
            }
            Phase::Pending(intent) if self.window_elapsed(&intent, now) => self.time_out(now),
            Phase::Pending(_) | Phase::Idle => ReconcileOutcome::unchanged(),
        }
    }

    fn window_elapsed(&self, intent: &CommandIntent, now: DateTime<Utc>) -> bool {
        now - intent.issued_at > self.window
    }

    fn time_out(&mut self, now: DateTime<Utc>) -> ReconcileOutcome {
        tracing::info!(
            peripheral_id = %self.id(),
            observed = self.last_observed,
            "Command not confirmed within activation window"
        );
        self.phase = Phase::TimedOut;
        ReconcileOutcome {
            changed: self.transition(self.last_observed, Confidence::Confirmed, now),
            timed_out: true,
        }
    }

    fn transition(
        &mut self,
        is_on: bool,
        confidence: Confidence,
        now: DateTime<Utc>,
    ) -> Option<ReconciledState> {
        if !self.state.differs_from(is_on, confidence) {
            return None;
        }
        self.state = ReconciledState::new(self.id(), is_on, confidence, now);
        Some(self.state)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    const ID: PeripheralId = PeripheralId::new(7);
    const WINDOW: Duration = Duration::from_secs(5);

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn reconciler(observed: bool) -> StateReconciler {
        StateReconciler::new(ID, observed, t(-10), WINDOW)
    }

    #[test]
    fn starts_idle_and_confirmed() {
        let r = reconciler(true);
        assert_eq!(r.phase(), ReconcilerPhase::Idle);
        assert!(r.state().is_on());
        assert_eq!(r.state().confidence(), Confidence::Confirmed);
        assert!(r.intent().is_none());
    }

    #[test]
    fn idle_mirrors_observations() {
        let mut r = reconciler(false);
        let outcome = r.observe(true, t(0));
        assert_eq!(
            outcome.changed,
            Some(ReconciledState::new(ID, true, Confidence::Confirmed, t(0)))
        );
        assert!(r.observe(true, t(1)).changed.is_none());
    }

    #[test]
    fn command_is_optimistic() {
        let mut r = reconciler(false);
        let outcome = r.issue_command(true, t(0));
        let state = outcome.changed.unwrap();
        assert!(state.is_on());
        assert!(state.is_pending());
        assert_eq!(r.phase(), ReconcilerPhase::Pending);
        assert_eq!(r.intent().unwrap().issued_at, t(0));
    }

    #[test]
    fn contradiction_inside_window_is_suppressed() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));

        for secs in 1..=5 {
            let outcome = r.observe(false, t(secs));
            assert_eq!(outcome, ReconcileOutcome::unchanged());
            assert!(r.state().is_on());
            assert!(r.state().is_pending());
        }
    }

    #[test]
    fn matching_report_confirms() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        r.observe(false, t(1));
        let outcome = r.observe(true, t(2));

        assert_eq!(
            outcome.changed,
            Some(ReconciledState::new(ID, true, Confidence::Confirmed, t(2)))
        );
        assert!(!outcome.timed_out);
        assert_eq!(r.phase(), ReconcilerPhase::Idle);
        assert!(r.intent().is_none());
    }

    #[test]
    fn window_elapsed_reverts_to_observed() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        r.observe(false, t(5));
        let outcome = r.observe(false, t(6));

        assert!(outcome.timed_out);
        assert_eq!(
            outcome.changed,
            Some(ReconciledState::new(ID, false, Confidence::Confirmed, t(6)))
        );
        assert_eq!(r.phase(), ReconcilerPhase::TimedOut);
        assert!(r.intent().is_none());
    }

    #[test]
    fn confirmation_wins_over_timeout() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        let outcome = r.observe(true, t(30));
        assert!(!outcome.timed_out);
        assert_eq!(r.state().confidence(), Confidence::Confirmed);
        assert!(r.state().is_on());
    }

    #[test]
    fn timed_out_exits_on_next_poll() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        r.observe(false, t(6));

        let outcome = r.observe(true, t(7));
        assert!(!outcome.timed_out);
        assert_eq!(r.phase(), ReconcilerPhase::Idle);
        assert!(r.state().is_on());
    }

    #[test]
    fn timed_out_exits_without_report() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        r.observe(false, t(6));

        assert_eq!(r.poll_without_observation(t(7)), ReconcileOutcome::unchanged());
        assert_eq!(r.phase(), ReconcilerPhase::Idle);
    }

    #[test]
    fn silent_peripheral_still_times_out() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));

        assert!(!r.poll_without_observation(t(5)).timed_out);
        let outcome = r.poll_without_observation(t(6));
        assert!(outcome.timed_out);
        assert!(!r.state().is_on());
        assert_eq!(r.state().confidence(), Confidence::Confirmed);
    }

    #[test]
    fn new_command_supersedes_silently() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        r.observe(false, t(4));
        r.issue_command(false, t(4));

        let outcome = r.observe(true, t(6));
        assert!(!outcome.timed_out);
        assert!(!r.state().is_on());
        assert!(r.state().is_pending());
        assert!(!r.intent().unwrap().desired);

        let outcome = r.observe(false, t(7));
        assert!(!outcome.timed_out);
        assert_eq!(r.state().confidence(), Confidence::Confirmed);
    }

    #[test]
    fn repeated_command_keeps_state() {
        let mut r = reconciler(false);
        r.issue_command(true, t(0));
        let outcome = r.issue_command(true, t(3));
        assert!(outcome.changed.is_none());
        assert_eq!(r.intent().unwrap().issued_at, t(3));
    }
}
