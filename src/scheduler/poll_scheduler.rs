// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Poll scheduler driving registry and reconcilers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Notify, broadcast, watch};
use tokio::task::JoinHandle;

use super::config::SchedulerConfig;
use crate::error::{Error, Result, SchemaError, TransportError};
use crate::event::{EventBus, GatewayEvent};
use crate::protocol::{GatewaySnapshot, Transport};
use crate::registry::{DeviceRegistry, PeripheralRecord};
use crate::state::{ReconcileOutcome, ReconciledState, StateReconciler};
use crate::subscription::{CallbackRegistry, Subscribable, SubscriptionId};
use crate::types::PeripheralId;

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// What one successful poll changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSummary {
    /// Newly discovered peripherals.
    pub added: Vec<PeripheralId>,
    /// Peripherals refreshed with new data.
    pub updated: Vec<PeripheralId>,
    /// Peripherals dropped after the discovery-loss threshold.
    pub removed: Vec<PeripheralId>,
    /// Per-peripheral payload problems.
    pub errors: Vec<SchemaError>,
}

// ============================================================================
// Mutable state
// ============================================================================

#[derive(Debug)]
struct SchedulerState {
    registry: DeviceRegistry,
    reconcilers: HashMap<PeripheralId, StateReconciler>,
    consecutive_failures: u32,
    unreachable_streak: u32,
    available: bool,
}

impl SchedulerState {
    fn apply_snapshot(
        &mut self,
        snapshot: &GatewaySnapshot,
        config: &SchedulerConfig,
        events: &mut Vec<GatewayEvent>,
    ) -> PollSummary {
        self.consecutive_failures = 0;
        self.unreachable_streak = 0;
        if !self.available {
            self.available = true;
            tracing::info!("Gateway reachable again");
            events.push(GatewayEvent::AvailabilityChanged { available: true });
        }

        let now = snapshot.taken_at;
        let diff = self.registry.reconcile_snapshot(snapshot);
        let mut observed = HashSet::new();

        for record in &diff.added {
            let id = record.id();
            observed.insert(id);
            let reconciler =
                StateReconciler::new(id, record.observed_on(), now, config.activation_window());
            let state = reconciler.state();
            self.reconcilers.insert(id, reconciler);
            events.push(GatewayEvent::PeripheralAdded {
                record: record.clone(),
            });
            events.push(GatewayEvent::state_changed(state));
        }

        for record in &diff.updated {
            let id = record.id();
            observed.insert(id);
            match self.reconcilers.get_mut(&id) {
                Some(reconciler) => {
                    let outcome = reconciler.observe(record.observed_on(), now);
                    push_outcome(events, id, outcome);
                }
                None => {
                    let reconciler = StateReconciler::new(
                        id,
                        record.observed_on(),
                        now,
                        config.activation_window(),
                    );
                    events.push(GatewayEvent::state_changed(reconciler.state()));
                    self.reconcilers.insert(id, reconciler);
                }
            }
        }

        for id in &diff.removed {
            self.reconcilers.remove(id);
            events.push(GatewayEvent::PeripheralRemoved { id: *id });
        }

        let mut silent: Vec<_> = self
            .reconcilers
            .iter_mut()
            .filter(|(id, _)| !observed.contains(*id))
            .collect();
        silent.sort_by_key(|(id, _)| **id);
        for (id, reconciler) in silent {
            let outcome = reconciler.poll_without_observation(now);
            push_outcome(events, *id, outcome);
        }

        PollSummary {
            added: diff.added.iter().map(PeripheralRecord::id).collect(),
            updated: diff.updated.iter().map(PeripheralRecord::id).collect(),
            removed: diff.removed,
            errors: diff.errors,
        }
    }

    fn record_failure(
        &mut self,
        error: &TransportError,
        config: &SchedulerConfig,
        events: &mut Vec<GatewayEvent>,
    ) {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if error.is_unreachable() {
            self.unreachable_streak = self.unreachable_streak.saturating_add(1);
        } else {
            self.unreachable_streak = 0;
        }

        tracing::warn!(
            error = %error,
            consecutive_failures = self.consecutive_failures,
            "Gateway poll failed"
        );

        if self.available && self.unreachable_streak >= config.unavailable_after() {
            self.available = false;
            tracing::info!(
                failures = self.unreachable_streak,
                "Gateway marked unavailable"
            );
            events.push(GatewayEvent::AvailabilityChanged { available: false });
        }
    }
}

fn push_outcome(events: &mut Vec<GatewayEvent>, id: PeripheralId, outcome: ReconcileOutcome) {
    if let Some(state) = outcome.changed {
        events.push(GatewayEvent::state_changed(state));
    }
    if outcome.timed_out {
        events.push(GatewayEvent::ReconciliationTimeout { id });
    }
}

// ============================================================================
// PollScheduler
// ============================================================================

struct Shared<T> {
    transport: T,
    config: SchedulerConfig,
    poll_gate: tokio::sync::Mutex<()>,
    state: parking_lot::Mutex<SchedulerState>,
    events: EventBus,
    callbacks: CallbackRegistry,
    refresh: Arc<Notify>,
    clock: Clock,
}

/// Polls one gateway and keeps registry and reconcilers in sync.
///
/// Cloning is cheap; clones share the same state. Polls are serialized: at
/// most one is in flight, whether triggered by the interval, a command, or
/// [`poll_now`](Self::poll_now).
///
/// # Examples
///
/// ```no_run
/// use ecowitt_iot::protocol::GatewayConfig;
/// use ecowitt_iot::scheduler::{PollScheduler, SchedulerConfig};
/// use ecowitt_iot::types::PeripheralId;
///
/// # async fn example() -> ecowitt_iot::Result<()> {
/// let client = GatewayConfig::new("192.168.1.50").into_client()?;
/// let scheduler = PollScheduler::new(client, SchedulerConfig::default());
/// let mut events = scheduler.subscribe();
///
/// let handle = scheduler.spawn();
///
/// scheduler.issue_command(PeripheralId::new(13836), true).await?;
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
///
/// handle.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct PollScheduler<T> {
    inner: Arc<Shared<T>>,
}

impl<T> Clone for PollScheduler<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> PollScheduler<T> {
    /// Creates a scheduler using the system clock.
    #[must_use]
    pub fn new(transport: T, config: SchedulerConfig) -> Self {
        Self::with_clock(transport, config, Utc::now)
    }

    /// Creates a scheduler stamping commands with a custom clock.
    ///
    /// Poll observations are stamped by the transport's snapshot; only
    /// command issue times come from `clock`.
    #[must_use]
    pub fn with_clock<C>(transport: T, config: SchedulerConfig, clock: C) -> Self
    where
        C: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        let registry =
            DeviceRegistry::new(transport.temperature_unit(), config.discovery_loss_threshold());
        let state = SchedulerState {
            registry,
            reconcilers: HashMap::new(),
            consecutive_failures: 0,
            unreachable_streak: 0,
            available: true,
        };

        Self {
            inner: Arc::new(Shared {
                transport,
                config,
                poll_gate: tokio::sync::Mutex::new(()),
                state: parking_lot::Mutex::new(state),
                events: EventBus::new(),
                callbacks: CallbackRegistry::new(),
                refresh: Arc::new(Notify::new()),
                clock: Arc::new(clock),
            }),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    // =========================================================================
    // Polling
    // =========================================================================

    /// Runs one poll now, waiting for any poll already in flight.
    ///
    /// The poll as a whole is bounded by
    /// [`SchedulerConfig::poll_timeout`]; a poll that exceeds it counts as
    /// unreachable.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the gateway could not be polled. Known
    /// peripherals and their states are kept.
    pub async fn poll_now(&self) -> Result<PollSummary> {
        let _gate = self.inner.poll_gate.lock().await;
        let deadline = self.inner.config.poll_timeout();
        let fetched = tokio::time::timeout(deadline, self.inner.transport.fetch_status())
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Unreachable(format!(
                    "poll exceeded {}s deadline",
                    deadline.as_secs_f64()
                )))
            });

        let mut events = Vec::new();
        let result = {
            let mut state = self.inner.state.lock();
            match fetched {
                Ok(snapshot) => {
                    Ok(state.apply_snapshot(&snapshot, &self.inner.config, &mut events))
                }
                Err(e) => {
                    state.record_failure(&e, &self.inner.config, &mut events);
                    Err(Error::Transport(e))
                }
            }
        };

        self.emit(events);
        result
    }

    /// Asks the background loop for an immediate poll.
    ///
    /// Requests made before [`spawn`](Self::spawn) coalesce into a single
    /// early poll once the loop runs.
    pub fn request_refresh(&self) {
        self.inner.refresh.notify_one();
    }

    /// Switches a peripheral on or off.
    ///
    /// On acknowledgement the reconciled state becomes the desired value with
    /// `pending` confidence, and a refresh poll is requested after the
    /// configured delay.
    ///
    /// # Errors
    ///
    /// Returns `Error::PeripheralNotFound` for unknown ids and
    /// `Error::Transport` if the gateway rejects the command or cannot be
    /// reached; the reconciled state is then left untouched.
    ///
    /// Returns `Error::PeripheralRemoved` if a poll dropped the peripheral
    /// while the command was in flight. The gateway had already accepted the
    /// command, so it may still have been applied.
    pub async fn issue_command(&self, id: PeripheralId, on: bool) -> Result<ReconciledState> {
        let model = self
            .inner
            .state
            .lock()
            .registry
            .get(id)
            .map(PeripheralRecord::model)
            .ok_or(Error::PeripheralNotFound(id))?;

        tracing::debug!(peripheral_id = %id, on, "Issuing command");
        self.inner.transport.send_command(id, model, on).await?;

        let now = (self.inner.clock)();
        let mut events = Vec::new();
        let state = {
            let mut state = self.inner.state.lock();
            let Some(reconciler) = state.reconcilers.get_mut(&id) else {
                tracing::warn!(
                    peripheral_id = %id,
                    on,
                    "Command accepted for a peripheral removed meanwhile"
                );
                return Err(Error::PeripheralRemoved(id));
            };
            let outcome = reconciler.issue_command(on, now);
            push_outcome(&mut events, id, outcome);
            reconciler.state()
        };
        self.emit(events);

        let refresh = Arc::clone(&self.inner.refresh);
        let delay = self.inner.config.command_refresh_delay();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            refresh.notify_one();
        });

        Ok(state)
    }

    /// Starts the background poll loop.
    ///
    /// The loop polls immediately, then on every interval, backing off after
    /// failures and polling early when a refresh is requested.
    #[must_use = "dropping the handle stops the poll loop"]
    pub fn spawn(&self) -> SchedulerHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let scheduler = self.clone();
        let refresh = Arc::clone(&self.inner.refresh);

        let task = tokio::spawn(async move {
            tracing::debug!("Poll loop started");
            loop {
                if let Err(e) = scheduler.poll_now().await {
                    tracing::debug!(error = %e, "Scheduled poll failed");
                }

                let delay = {
                    let failures = scheduler.inner.state.lock().consecutive_failures;
                    scheduler.inner.config.delay_after_failures(failures)
                };

                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    () = tokio::time::sleep(delay) => {}
                    () = scheduler.inner.refresh.notified() => {
                        tracing::debug!("Out-of-cycle poll");
                    }
                }
            }
            tracing::debug!("Poll loop stopped");
        });

        SchedulerHandle {
            shutdown: shutdown_tx,
            refresh,
            task,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Subscribes to gateway events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.events.subscribe()
    }

    /// Returns all known peripherals, ordered by id.
    #[must_use]
    pub fn peripherals(&self) -> Vec<PeripheralRecord> {
        self.inner.state.lock().registry.records()
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn peripheral(&self, id: PeripheralId) -> Option<PeripheralRecord> {
        self.inner.state.lock().registry.get(id).cloned()
    }

    /// Returns the authoritative state of `id`.
    #[must_use]
    pub fn reconciled_state(&self, id: PeripheralId) -> Option<ReconciledState> {
        self.inner
            .state
            .lock()
            .reconcilers
            .get(&id)
            .map(StateReconciler::state)
    }

    /// Returns whether the gateway is currently considered reachable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.inner.state.lock().available
    }

    fn emit(&self, events: Vec<GatewayEvent>) {
        for event in events {
            self.inner.callbacks.dispatch(&event);
            self.inner.events.publish(event);
        }
    }
}

impl<T: Transport> Subscribable for PollScheduler<T> {
    fn on_peripheral_added<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PeripheralRecord) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_peripheral_added(callback)
    }

    fn on_peripheral_removed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_peripheral_removed(callback)
    }

    fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId, &ReconciledState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    fn on_availability_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_availability_changed(callback)
    }

    fn on_reconciliation_timeout<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(PeripheralId) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_reconciliation_timeout(callback)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

impl<T> std::fmt::Debug for PollScheduler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("config", &self.inner.config)
            .field("callbacks", &self.inner.callbacks)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SchedulerHandle
// ============================================================================

/// Handle to a running poll loop.
#[derive(Debug)]
pub struct SchedulerHandle {
    shutdown: watch::Sender<bool>,
    refresh: Arc<Notify>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Asks the loop for an immediate poll.
    ///
    /// # Errors
    ///
    /// Returns `Error::SchedulerStopped` if the loop is no longer running.
    pub fn request_refresh(&self) -> Result<()> {
        if self.task.is_finished() {
            return Err(Error::SchedulerStopped);
        }
        self.refresh.notify_one();
        Ok(())
    }

    /// Returns `true` once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop and waits for it to exit.
    ///
    /// A poll in flight is allowed to complete.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Poll loop ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::protocol::{Ack, ReadOutcome, SnapshotEntry};
    use crate::state::Confidence;
    use crate::types::DeviceModel;

    /// Transport replaying a fixed script of poll results.
    #[derive(Default)]
    struct ScriptedTransport {
        polls: parking_lot::Mutex<VecDeque<std::result::Result<GatewaySnapshot, TransportError>>>,
        commands: parking_lot::Mutex<Vec<(PeripheralId, DeviceModel, bool)>>,
        reject: bool,
    }

    impl ScriptedTransport {
        fn push(&self, poll: std::result::Result<GatewaySnapshot, TransportError>) {
            self.polls.lock().push_back(poll);
        }
    }

    impl Transport for ScriptedTransport {
        async fn fetch_status(&self) -> std::result::Result<GatewaySnapshot, TransportError> {
            self.polls
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Unreachable("script exhausted".into())))
        }

        async fn send_command(
            &self,
            id: PeripheralId,
            model: DeviceModel,
            on: bool,
        ) -> std::result::Result<Ack, TransportError> {
            if self.reject {
                return Err(TransportError::RejectedCommand("300 ERR".into()));
            }
            self.commands.lock().push((id, model, on));
            Ok(Ack)
        }
    }

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn plug_snapshot(secs: i64, on: bool) -> GatewaySnapshot {
        GatewaySnapshot::new(
            t(secs),
            vec![SnapshotEntry::new(
                json!({"id": 7, "model": 2}),
                ReadOutcome::Reported(json!({"ac_status": u8::from(on)})),
            )],
        )
    }

    fn scheduler(transport: ScriptedTransport) -> PollScheduler<ScriptedTransport> {
        PollScheduler::with_clock(
            transport,
            SchedulerConfig::new().with_activation_window(Duration::from_secs(5)),
            || t(0),
        )
    }

    #[tokio::test]
    async fn first_poll_adds_and_reports_state() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(plug_snapshot(0, true)));
        let scheduler = scheduler(transport);
        let mut rx = scheduler.subscribe();

        let summary = scheduler.poll_now().await.unwrap();
        assert_eq!(summary.added, vec![PeripheralId::new(7)]);

        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::PeripheralAdded { .. })));
        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::StateChanged { .. })));
        let state = scheduler.reconciled_state(PeripheralId::new(7)).unwrap();
        assert!(state.is_on());
        assert_eq!(state.confidence(), Confidence::Confirmed);
    }

    #[tokio::test]
    async fn unknown_peripheral_command_fails() {
        let scheduler = scheduler(ScriptedTransport::default());
        let err = scheduler
            .issue_command(PeripheralId::new(99), true)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PeripheralNotFound(id) if id == PeripheralId::new(99)));
    }

    #[tokio::test]
    async fn rejected_command_leaves_state_untouched() {
        let transport = ScriptedTransport {
            reject: true,
            ..ScriptedTransport::default()
        };
        transport.push(Ok(plug_snapshot(0, false)));
        let scheduler = scheduler(transport);
        scheduler.poll_now().await.unwrap();

        let err = scheduler
            .issue_command(PeripheralId::new(7), true)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transport(TransportError::RejectedCommand(_))
        ));

        let state = scheduler.reconciled_state(PeripheralId::new(7)).unwrap();
        assert!(!state.is_on());
        assert_eq!(state.confidence(), Confidence::Confirmed);
    }

    #[tokio::test]
    async fn acknowledged_command_is_pending() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(plug_snapshot(0, false)));
        let scheduler = scheduler(transport);
        scheduler.poll_now().await.unwrap();

        let state = scheduler
            .issue_command(PeripheralId::new(7), true)
            .await
            .unwrap();
        assert!(state.is_on());
        assert!(state.is_pending());
        assert_eq!(
            *scheduler.transport().commands.lock(),
            vec![(PeripheralId::new(7), DeviceModel::Ac1100, true)]
        );
    }

    #[tokio::test]
    async fn failures_keep_state_and_flag_once() {
        let transport = ScriptedTransport::default();
        transport.push(Ok(plug_snapshot(0, true)));
        let scheduler = PollScheduler::new(
            transport,
            SchedulerConfig::new().with_unavailable_after(2),
        );
        scheduler.poll_now().await.unwrap();

        let flips = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let flips_clone = Arc::clone(&flips);
        scheduler.on_availability_changed(move |available| flips_clone.lock().push(available));

        for _ in 0..4 {
            assert!(scheduler.poll_now().await.is_err());
        }

        assert_eq!(*flips.lock(), vec![false]);
        assert!(!scheduler.is_available());
        assert!(scheduler.reconciled_state(PeripheralId::new(7)).unwrap().is_on());
        assert_eq!(scheduler.peripherals().len(), 1);
    }

    #[tokio::test]
    async fn malformed_responses_do_not_mark_unavailable() {
        let transport = ScriptedTransport::default();
        for _ in 0..5 {
            transport.push(Err(TransportError::MalformedResponse("html".into())));
        }
        let scheduler = scheduler(transport);

        for _ in 0..5 {
            assert!(scheduler.poll_now().await.is_err());
        }
        assert!(scheduler.is_available());
    }

    #[derive(Default)]
    enum Behaviour {
        #[default]
        Healthy,
        Unreachable,
        Hung,
    }

    /// Transport counting polls, for driving the background loop.
    #[derive(Default)]
    struct LoopTransport {
        behaviour: Behaviour,
        polls: AtomicUsize,
        delisted: AtomicBool,
        hold_commands: bool,
        command_sent: Notify,
        release_command: Notify,
    }

    impl LoopTransport {
        fn polls(&self) -> usize {
            self.polls.load(Ordering::SeqCst)
        }
    }

    impl Transport for LoopTransport {
        async fn fetch_status(&self) -> std::result::Result<GatewaySnapshot, TransportError> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            match self.behaviour {
                Behaviour::Healthy if self.delisted.load(Ordering::SeqCst) => {
                    Ok(GatewaySnapshot::new(t(0), Vec::new()))
                }
                Behaviour::Healthy => Ok(plug_snapshot(0, false)),
                Behaviour::Unreachable => {
                    Err(TransportError::Unreachable("connection refused".into()))
                }
                Behaviour::Hung => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(GatewaySnapshot::new(t(0), Vec::new()))
                }
            }
        }

        async fn send_command(
            &self,
            _id: PeripheralId,
            _model: DeviceModel,
            _on: bool,
        ) -> std::result::Result<Ack, TransportError> {
            if self.hold_commands {
                self.command_sent.notify_one();
                self.release_command.notified().await;
            }
            Ok(Ack)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn command_triggers_out_of_cycle_poll() {
        let scheduler = PollScheduler::new(
            LoopTransport::default(),
            SchedulerConfig::new().with_poll_interval(Duration::from_secs(600)),
        );
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(scheduler.transport().polls(), 1);

        scheduler
            .issue_command(PeripheralId::new(7), true)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(scheduler.transport().polls(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(scheduler.transport().polls(), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failures_space_out_scheduled_polls() {
        let transport = LoopTransport {
            behaviour: Behaviour::Unreachable,
            ..LoopTransport::default()
        };
        let scheduler = PollScheduler::new(
            transport,
            SchedulerConfig::new().with_poll_interval(Duration::from_secs(10)),
        );
        let start = tokio::time::Instant::now();
        let handle = scheduler.spawn();

        // Polls at 0s, 10s, 30s and 70s.
        for (at, expected) in [(5, 1), (15, 2), (29, 2), (35, 3), (69, 3), (75, 4)] {
            tokio::time::sleep_until(start + Duration::from_secs(at)).await;
            assert_eq!(scheduler.transport().polls(), expected, "at {at}s");
        }

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn hung_poll_hits_deadline() {
        let transport = LoopTransport {
            behaviour: Behaviour::Hung,
            ..LoopTransport::default()
        };
        let scheduler = PollScheduler::new(
            transport,
            SchedulerConfig::new().with_poll_timeout(Duration::from_secs(30)),
        );

        let start = tokio::time::Instant::now();
        let err = scheduler.poll_now().await.unwrap_err();

        assert!(matches!(err, Error::Transport(ref e) if e.is_unreachable()));
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(31), "{elapsed:?}");
    }

    #[tokio::test]
    async fn removal_during_command_is_reported() {
        let transport = LoopTransport {
            hold_commands: true,
            ..LoopTransport::default()
        };
        let scheduler = PollScheduler::new(
            transport,
            SchedulerConfig::new().with_discovery_loss_threshold(1),
        );
        scheduler.poll_now().await.unwrap();

        let commander = scheduler.clone();
        let command =
            tokio::spawn(async move { commander.issue_command(PeripheralId::new(7), true).await });
        scheduler.transport().command_sent.notified().await;

        scheduler.transport().delisted.store(true, Ordering::SeqCst);
        let summary = scheduler.poll_now().await.unwrap();
        assert_eq!(summary.removed, vec![PeripheralId::new(7)]);

        scheduler.transport().release_command.notify_one();
        let err = command.await.unwrap().unwrap_err();
        assert!(matches!(err, Error::PeripheralRemoved(id) if id == PeripheralId::new(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn handle_shuts_down_loop() {
        let scheduler = scheduler(ScriptedTransport::default());
        let handle = scheduler.spawn();
        assert!(handle.request_refresh().is_ok());
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }
}
