use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::{
    DeactivateMode, EntryLeavePolicy, LeavePolicy, ResetPolicy, SequenceConfig, SequencePolicy,
};
use crate::foundation::core::Millis;
use crate::foundation::error::SeqResult;
use crate::frames::events::{FrameEvent, FrameEventKind};
use crate::frames::gate;
use crate::frames::store::{Frame, FrameSnapshot, FrameStore};
use crate::frames::watch::{WatchDisposer, WatchRegistry};
use crate::schedule::{Scheduler, TaskHandle};
use crate::viewport::{Action, ScrollTracker, ViewportSignal};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SeqTask {
    Complete(usize),
    ReconcileInitial,
    FinishReset,
}

/// Coordinates one ordered sequence of frames.
///
/// Frame `i > 0` only activates once frame `i - 1` satisfies the configured
/// [`GatePolicy`](crate::config::GatePolicy). Everything runs on the caller's thread; time only
/// moves through [`SequentialFrames::advance_to`].
#[derive(Debug)]
pub struct SequentialFrames {
    store: FrameStore,
    watches: WatchRegistry,
    scheduler: Scheduler<SeqTask>,
    tracker: ScrollTracker,
    config: SequenceConfig,
    attached: bool,
    reconcile_task: Option<TaskHandle>,
    reset_task: Option<TaskHandle>,
    events: Vec<FrameEvent>,
}

impl SequentialFrames {
    /// Validate `config` and build an all-inactive sequence at clock time zero.
    pub fn new(config: SequenceConfig) -> SeqResult<Self> {
        let resolved = config.resolve()?;
        Ok(Self {
            store: FrameStore::new(&resolved),
            watches: WatchRegistry::new(),
            scheduler: Scheduler::new(),
            tracker: ScrollTracker::default(),
            config,
            attached: false,
            reconcile_task: None,
            reset_task: None,
            events: Vec::new(),
        })
    }

    /// Current clock time.
    pub fn now(&self) -> Millis {
        self.scheduler.now()
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Always `false`; configuration rejects empty sequences.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Active policy.
    pub fn policy(&self) -> SequencePolicy {
        self.config.policy
    }

    /// Frame at `position`.
    pub fn frame(&self, position: usize) -> Option<&Frame> {
        self.store.get(position)
    }

    /// Read-only frame store.
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// `false` for out-of-range positions.
    pub fn is_active(&self, position: usize) -> bool {
        self.store.is_active(position)
    }

    /// `false` for out-of-range positions.
    pub fn is_animation_complete(&self, position: usize) -> bool {
        self.store.is_animation_complete(position)
    }

    /// Return `true` while the frame at `position` waits on its predecessor.
    pub fn is_waiting(&self, position: usize) -> bool {
        self.watches.contains(position)
    }

    /// Pending dependency watches.
    pub fn watches(&self) -> &WatchRegistry {
        &self.watches
    }

    /// Return `true` between a reset starting and settling.
    pub fn is_resetting(&self) -> bool {
        self.reset_task.is_some()
    }

    /// Return `true` once [`SequentialFrames::attach`] ran.
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Current scroll tracking state.
    pub fn scroll(&self) -> ScrollTracker {
        self.tracker
    }

    /// Per-frame state for the rendering layer.
    pub fn snapshot(&self) -> Vec<FrameSnapshot> {
        self.store.snapshot()
    }

    /// Events recorded since the last drain.
    pub fn events(&self) -> &[FrameEvent] {
        &self.events
    }

    /// Take the recorded events.
    pub fn drain_events(&mut self) -> Vec<FrameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Whether the frame at `position` may activate now under the configured gate.
    pub fn can_activate(&self, position: usize) -> bool {
        gate::can_activate(&self.store, self.config.policy.gate, position)
    }

    // ---------------------------------------------------------------------------------------
    // Activation primitives

    /// Activate the frame at `position` and start its completion timer.
    ///
    /// Drops any pending wait for the frame. Activating an already active frame leaves its timer
    /// running. Out-of-range positions are ignored.
    pub fn activate(&mut self, position: usize) {
        if self.activate_inner(position) {
            self.notify(position);
        }
    }

    /// Deactivate the frame at `position`, cancelling its completion timer and pending wait.
    ///
    /// `mode` only selects the visual transition reported in the emitted event.
    pub fn deactivate(&mut self, position: usize, mode: DeactivateMode) {
        if self.deactivate_inner(position, mode) {
            self.notify(position);
        }
    }

    /// Wait for the predecessor of `position` to allow activation.
    ///
    /// Replaces an existing wait for the same frame. The condition is checked once immediately;
    /// when it already holds the frame activates and `None` is returned.
    pub fn await_predecessor(&mut self, position: usize) -> Option<WatchDisposer> {
        if position >= self.store.len() {
            debug!(position, "await_predecessor on unknown frame ignored");
            return None;
        }
        if position == 0 {
            self.activate(0);
            return None;
        }

        if self.can_activate(position) {
            self.watches.dispose(position);
            self.activate(position);
            return None;
        }

        let disposer = self.watches.register(position, position - 1);
        self.emit_frame(position, FrameEventKind::WaitRegistered);
        trace!(position, "waiting for predecessor");
        Some(disposer)
    }

    /// Tear down a wait through its disposer. Stale disposers are ignored.
    pub fn dispose_wait(&mut self, disposer: WatchDisposer) -> bool {
        let disposed = self.watches.dispose_handle(disposer);
        if disposed {
            self.emit_frame(disposer.frame(), FrameEventKind::WaitCancelled);
        }
        disposed
    }

    fn activate_inner(&mut self, position: usize) -> bool {
        if position >= self.store.len() {
            debug!(position, "activate on unknown frame ignored");
            return false;
        }
        if self.watches.dispose(position) {
            trace!(position, "pending wait resolved by activation");
        }
        if self.store.is_active(position) {
            return false;
        }
        self.cancel_completion(position);

        let Some(frame) = self.store.get_mut(position) else {
            return false;
        };
        frame.is_active = true;
        frame.is_animation_complete = false;
        let delay = frame.animation_duration;
        frame.completion = Some(
            self.scheduler
                .schedule(delay, SeqTask::Complete(position)),
        );

        debug!(position, %delay, "frame activated");
        self.emit_frame(position, FrameEventKind::Activated);
        true
    }

    fn deactivate_inner(&mut self, position: usize, mode: DeactivateMode) -> bool {
        if position >= self.store.len() {
            debug!(position, "deactivate on unknown frame ignored");
            return false;
        }
        if self.watches.dispose(position) {
            self.emit_frame(position, FrameEventKind::WaitCancelled);
        }
        self.cancel_completion(position);

        let Some(frame) = self.store.get_mut(position) else {
            return false;
        };
        let was_active = frame.is_active;
        frame.is_active = false;
        frame.is_animation_complete = false;
        if !was_active {
            return false;
        }

        debug!(position, ?mode, "frame deactivated");
        self.emit_frame(position, FrameEventKind::Deactivated { mode });
        true
    }

    fn cancel_completion(&mut self, position: usize) {
        let handle = self
            .store
            .get_mut(position)
            .and_then(|f| f.completion.take());
        if let Some(handle) = handle {
            self.scheduler.cancel(handle);
        }
    }

    fn complete(&mut self, position: usize) {
        let Some(frame) = self.store.get_mut(position) else {
            return;
        };
        frame.completion = None;
        if !frame.is_active {
            return;
        }
        frame.is_animation_complete = true;
        debug!(position, "frame animation complete");
        self.emit_frame(position, FrameEventKind::Completed);
        self.notify(position);
    }

    /// Re-evaluate waits that depend on frames whose state just changed.
    ///
    /// Runs after the changed frame's timer and wait bookkeeping is final.
    fn notify(&mut self, changed: usize) {
        let mut queue = VecDeque::from([changed]);
        while let Some(predecessor) = queue.pop_front() {
            let waiting: Vec<usize> = self.watches.watching(predecessor).collect();
            for position in waiting {
                if !self.can_activate(position) {
                    continue;
                }
                self.watches.dispose(position);
                trace!(position, predecessor, "predecessor satisfied; activating");
                if self.activate_inner(position) {
                    queue.push_back(position);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Viewport input

    /// Start direction tracking from `y` without treating it as a scroll movement.
    pub fn set_scroll_origin(&mut self, y: f64) {
        self.tracker = ScrollTracker::new(y);
    }

    /// Record a scroll offset. May trigger a reset under [`ResetPolicy::ScrollToTop`].
    pub fn on_scroll(&mut self, y: f64) {
        let previous = self.tracker.y();
        self.tracker.update(y);

        if let ResetPolicy::ScrollToTop { threshold_px } = self.config.policy.reset
            && previous >= threshold_px
            && y < threshold_px
        {
            debug!(y, threshold_px, "scrolled to top; resetting sequence");
            self.reset_all();
        }
    }

    /// Classify a raw intersection change against the scroll direction and dispatch it.
    pub fn on_intersection(&mut self, position: usize, is_intersecting: bool) {
        let signal = self.tracker.classify(is_intersecting);
        self.handle_signal(position, signal);
    }

    /// Route a classified signal to the entry or sequential handler.
    #[tracing::instrument(level = "debug", skip(self), fields(state = %signal))]
    pub fn handle_signal(&mut self, position: usize, signal: ViewportSignal) {
        let Some(frame) = self.store.get(position) else {
            debug!("signal for unknown frame ignored");
            return;
        };
        if self.attached && frame.binding().is_none() {
            debug!("signal for unbound frame dropped");
            return;
        }

        self.store.set_in_viewport(position, signal.is_enter());
        if self.is_resetting() {
            trace!("reset in flight; viewport flag recorded only");
            return;
        }

        if position == 0 {
            self.handle_entry(signal);
        } else {
            self.handle_sequential(position, signal);
        }
    }

    fn handle_entry(&mut self, signal: ViewportSignal) {
        match signal.action {
            Action::Enter => self.activate(0),
            Action::Leave => {
                if self.config.policy.entry_leave == EntryLeavePolicy::Deactivate {
                    self.deactivate(0, DeactivateMode::Immediate);
                }
            }
        }
    }

    fn handle_sequential(&mut self, position: usize, signal: ViewportSignal) {
        match signal.action {
            Action::Enter => {
                if self.store.is_active(position) || self.watches.contains(position) {
                    return;
                }
                if self.can_activate(position) {
                    self.activate(position);
                } else {
                    let _ = self.await_predecessor(position);
                }
            }
            Action::Leave => {
                let deactivates = match self.config.policy.leave {
                    LeavePolicy::LeaveUp => signal.is_leave_up(),
                    LeavePolicy::AnyLeave => true,
                    LeavePolicy::Never => false,
                };
                if deactivates {
                    self.deactivate(position, DeactivateMode::Immediate);
                }
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Element binding and initial reconciliation

    /// Bind the frame at `position` to a rendered element.
    pub fn bind(&mut self, position: usize, element: impl Into<String>) -> bool {
        let bound = self.store.set_binding(position, Some(element.into()));
        if !bound {
            debug!(position, "bind on unknown frame ignored");
        }
        bound
    }

    /// Remove the element binding of the frame at `position`.
    pub fn unbind(&mut self, position: usize) -> bool {
        self.store.set_binding(position, None)
    }

    /// Start observing: unbound frames are skipped, and the initial viewport reconciliation is
    /// scheduled after the configured settle delay.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn attach(&mut self) {
        if self.attached {
            debug!("sequence already attached");
            return;
        }
        self.attached = true;

        let unbound: Vec<usize> = self
            .store
            .iter()
            .enumerate()
            .filter(|(_, f)| f.binding().is_none())
            .map(|(position, _)| position)
            .collect();
        for position in unbound {
            if let Some(frame) = self.store.get(position) {
                warn!(position, id = %frame.id, "frame has no element binding; skipping");
            }
            self.store.mark_skipped(position);
            self.emit_frame(position, FrameEventKind::Skipped);
        }

        if let Some(old) = self.reconcile_task.take() {
            self.scheduler.cancel(old);
        }
        self.reconcile_task = Some(self.scheduler.schedule(
            Millis(self.config.settle_delay_ms),
            SeqTask::ReconcileInitial,
        ));
    }

    /// Activate or start waiting for every in-viewport frame that is not active yet.
    ///
    /// Idempotent: a second call with no intervening input leaves the state unchanged.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn reconcile_initial(&mut self) {
        if self.is_resetting() {
            debug!("reset in flight; reconciliation deferred to reset completion");
            return;
        }
        for position in 0..self.store.len() {
            let Some(frame) = self.store.get(position) else {
                continue;
            };
            if !frame.in_viewport() || frame.is_active() {
                continue;
            }
            if self.attached && frame.binding().is_none() {
                continue;
            }
            if self.watches.contains(position) {
                continue;
            }
            trace!(position, "initial activation check");
            if self.can_activate(position) {
                self.activate(position);
            } else {
                let _ = self.await_predecessor(position);
            }
        }
    }

    // ---------------------------------------------------------------------------------------
    // Reset

    /// Reset the whole sequence using the configured reset transition.
    pub fn reset_all(&mut self) -> bool {
        self.reset_all_with(self.config.reset_mode)
    }

    /// Reset the whole sequence.
    ///
    /// Active frames are deactivated with `mode`; once the transition and settle delay elapse
    /// every frame returns to its initial state and the viewport is reconciled again. Returns
    /// `false` when the request was dropped because a reset is already in flight or the policy
    /// refuses resets.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn reset_all_with(&mut self, mode: DeactivateMode) -> bool {
        if self.config.policy.reset == ResetPolicy::Never {
            debug!("reset refused by policy");
            return false;
        }
        if self.is_resetting() {
            debug!("reset already in flight; request dropped");
            self.emit_sequence(FrameEventKind::ResetDropped);
            return false;
        }
        self.emit_sequence(FrameEventKind::ResetStarted);

        let waiting: Vec<usize> = (0..self.store.len())
            .filter(|&p| self.watches.contains(p))
            .collect();
        self.watches.clear();
        for position in waiting {
            self.emit_frame(position, FrameEventKind::WaitCancelled);
        }
        for position in (0..self.store.len()).rev() {
            self.deactivate_inner(position, mode);
        }
        if let Some(task) = self.reconcile_task.take() {
            self.scheduler.cancel(task);
        }

        let delay = self
            .config
            .transition_len(mode)
            .saturating_add(Millis(self.config.reset_settle_ms));
        self.reset_task = Some(self.scheduler.schedule(delay, SeqTask::FinishReset));
        true
    }

    fn finish_reset(&mut self) {
        self.reset_task = None;
        self.reconcile_task = None;
        self.scheduler.clear();
        self.watches.clear();
        self.store.reset_all();
        debug!("reset settled");
        self.emit_sequence(FrameEventKind::ResetFinished);
        self.reconcile_initial();
    }

    // ---------------------------------------------------------------------------------------
    // Time

    /// Advance the clock to `t`, running every task due on the way in order.
    pub fn advance_to(&mut self, t: Millis) {
        while let Some((_, task)) = self.scheduler.pop_due(t) {
            match task {
                SeqTask::Complete(position) => self.complete(position),
                SeqTask::ReconcileInitial => {
                    self.reconcile_task = None;
                    self.reconcile_initial();
                }
                SeqTask::FinishReset => self.finish_reset(),
            }
        }
        self.scheduler.set_now(t);
    }

    /// Advance the clock by `d`.
    pub fn advance_by(&mut self, d: Millis) {
        self.advance_to(self.now().saturating_add(d));
    }

    /// Cancel every timer and wait and stop observing. Frame state is kept as-is.
    pub fn teardown(&mut self) {
        self.scheduler.clear();
        self.watches.clear();
        for position in 0..self.store.len() {
            if let Some(frame) = self.store.get_mut(position) {
                frame.completion = None;
                frame.skipped = false;
            }
        }
        self.reconcile_task = None;
        self.reset_task = None;
        self.attached = false;
    }

    fn emit_frame(&mut self, position: usize, kind: FrameEventKind) {
        let Some(frame) = self.store.get(position) else {
            return;
        };
        let event = FrameEvent::frame(self.scheduler.now(), position, frame.id, kind);
        self.events.push(event);
    }

    fn emit_sequence(&mut self, kind: FrameEventKind) {
        self.events
            .push(FrameEvent::sequence(self.scheduler.now(), kind));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frames/coordinator.rs"]
mod tests;
