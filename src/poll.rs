//! Live-refresh views.
//!
//! A [`LiveStatusView`] holds the snapshot of a remote collection and keeps it
//! current by polling on a fixed interval. Only the response of the most
//! recently issued tick is ever applied: when a new tick fires, the previous
//! in-flight fetch is aborted and its tick number is no longer the latest, so
//! a late answer can never overwrite newer data.

use crate::error::ApiError;
use crate::notify::Notifier;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::MissedTickBehavior;

/// What a view shows after a failed fetch. Fixed per view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Replace the snapshot with an empty one.
    ClearSnapshot,
    /// Keep showing the last good snapshot.
    KeepStale,
}

struct ViewState<T> {
    snapshot: Vec<T>,
    loading: bool,
    last_error: Option<String>,
    /// Bumped by every `start` and by stopping the current handle.
    epoch: u64,
    latest_tick: Option<u64>,
    applied_tick: Option<u64>,
}

struct Shared<T> {
    label: String,
    policy: FailurePolicy,
    notifier: Notifier,
    empty_notice: Option<(String, String)>,
    state: Mutex<ViewState<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, ViewState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records `tick` as the latest issued one. False once the loop's epoch is retired.
    fn begin_tick(&self, epoch: u64, tick: u64) -> bool {
        let mut st = self.lock();
        if st.epoch != epoch {
            return false;
        }
        st.latest_tick = Some(tick);
        true
    }

    fn finish_tick(&self, epoch: u64, tick: u64, result: Result<Vec<T>, ApiError>) {
        let outcome = {
            let mut st = self.lock();
            if st.epoch != epoch || st.latest_tick != Some(tick) {
                tracing::trace!(view = %self.label, tick, "discarding superseded response");
                return;
            }
            st.loading = false;
            match result {
                Ok(items) => {
                    let empty = items.is_empty();
                    st.snapshot = items;
                    st.last_error = None;
                    st.applied_tick = Some(tick);
                    Ok(empty)
                }
                Err(e) => {
                    if self.policy == FailurePolicy::ClearSnapshot {
                        st.snapshot.clear();
                    }
                    st.last_error = Some(e.detail());
                    Err(e)
                }
            }
        };

        match outcome {
            Ok(true) => {
                if let Some((summary, detail)) = &self.empty_notice {
                    self.notifier.info(summary, detail.clone());
                }
            }
            Ok(false) => tracing::trace!(view = %self.label, tick, "snapshot replaced"),
            Err(e) => self.notifier.error(format!("Failed to load {}: {}", self.label, e.detail())),
        }
    }

    fn retire(&self, epoch: u64) {
        let mut st = self.lock();
        if st.epoch == epoch {
            st.epoch += 1;
            st.loading = false;
        }
    }
}

/// Collects a view's fixed settings before any loop can share them.
pub struct ViewBuilder {
    label: String,
    policy: FailurePolicy,
    notifier: Notifier,
    empty_notice: Option<(String, String)>,
}

impl ViewBuilder {
    pub fn new(label: impl Into<String>, policy: FailurePolicy, notifier: Notifier) -> Self {
        Self { label: label.into(), policy, notifier, empty_notice: None }
    }

    /// Sends an info notification whenever a successful fetch returns nothing.
    pub fn empty_notice(mut self, summary: &str, detail: &str) -> Self {
        self.empty_notice = Some((summary.to_string(), detail.to_string()));
        self
    }

    pub fn build<T: Send + 'static>(self) -> LiveStatusView<T> {
        LiveStatusView {
            shared: Arc::new(Shared {
                label: self.label,
                policy: self.policy,
                notifier: self.notifier,
                empty_notice: self.empty_notice,
                state: Mutex::new(ViewState {
                    snapshot: Vec::new(),
                    loading: false,
                    last_error: None,
                    epoch: 0,
                    latest_tick: None,
                    applied_tick: None,
                }),
            }),
        }
    }
}

pub struct LiveStatusView<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for LiveStatusView<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T: Send + 'static> LiveStatusView<T> {
    pub fn new(label: impl Into<String>, policy: FailurePolicy, notifier: Notifier) -> Self {
        ViewBuilder::new(label, policy, notifier).build()
    }

    /// Starts polling: one fetch right away, then one every `interval`.
    /// Starting again retires whatever loop this view was running before.
    pub fn start<F, Fut>(&self, interval: Duration, fetch: F) -> PollHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<T>, ApiError>> + Send + 'static,
    {
        let epoch = {
            let mut st = self.shared.lock();
            st.epoch += 1;
            st.latest_tick = None;
            st.loading = true;
            st.epoch
        };
        tracing::debug!(view = %self.shared.label, ?interval, "starting poll loop");

        let inflight: Arc<Mutex<Option<AbortHandle>>> = Arc::new(Mutex::new(None));
        let shared = self.shared.clone();
        let slot = inflight.clone();
        let period = interval.max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut tick: u64 = 0;
            loop {
                ticker.tick().await;
                if !shared.begin_tick(epoch, tick) {
                    break;
                }
                let pending = fetch();
                let owner = shared.clone();
                let fetch_task = tokio::spawn(async move {
                    let result = pending.await;
                    owner.finish_tick(epoch, tick, result);
                });
                let prev = slot
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(fetch_task.abort_handle());
                if let Some(prev) = prev {
                    prev.abort();
                }
                tick += 1;
            }
        });

        let shared = self.shared.clone();
        PollHandle {
            task: Some(task),
            inflight,
            retire: Some(Box::new(move || shared.retire(epoch))),
        }
    }

    /// Same as [`PollHandle::stop`].
    pub fn stop(&self, handle: &mut PollHandle) {
        handle.stop();
    }
}

impl<T> LiveStatusView<T> {
    pub fn snapshot(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.shared.lock().snapshot.clone()
    }

    /// Borrow the snapshot for rendering without cloning it.
    pub fn with_snapshot<R>(&self, f: impl FnOnce(&[T]) -> R) -> R {
        f(&self.shared.lock().snapshot)
    }

    pub fn is_loading(&self) -> bool {
        self.shared.lock().loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.lock().last_error.clone()
    }

    pub fn applied_tick(&self) -> Option<u64> {
        self.shared.lock().applied_tick
    }
}

/// The running timer of one view. Stopped explicitly or on drop.
pub struct PollHandle {
    task: Option<JoinHandle<()>>,
    inflight: Arc<Mutex<Option<AbortHandle>>>,
    retire: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl PollHandle {
    /// Cancels the timer and the in-flight fetch. No state changes once this
    /// returns. Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(retire) = self.retire.take() {
            retire();
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
        if let Some(pending) = self.inflight.lock().unwrap_or_else(PoisonError::into_inner).take() {
            pending.abort();
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.task.is_none()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Pod;
    use crate::notify::{Notifier, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::sleep;

    fn pod(name: &str, status: &str) -> Pod {
        Pod { pod_name: name.into(), app_name: "app".into(), status: status.into(), age: None, reason: None }
    }

    #[tokio::test(start_paused = true)]
    async fn later_tick_replaces_earlier_status() {
        let (notifier, _feed) = Notifier::channel();
        let view = LiveStatusView::new("pods", FailurePolicy::ClearSnapshot, notifier);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut handle = view.start(Duration::from_millis(3000), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                let status = if n == 0 { "Running" } else { "Terminating" };
                Ok(vec![pod("pod-a", status)])
            }
        });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(view.snapshot()[0].status, "Running");
        assert!(!view.is_loading());

        sleep(Duration::from_millis(3100)).await;
        let snap = view.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].status, "Terminating");
        assert_eq!(view.applied_tick(), Some(1));
        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn slow_response_never_overwrites_newer_tick() {
        let (notifier, _feed) = Notifier::channel();
        let view = LiveStatusView::new("pods", FailurePolicy::KeepStale, notifier);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut handle = view.start(Duration::from_millis(1000), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                let delay = if n == 0 { 2500 } else { 100 };
                sleep(Duration::from_millis(delay)).await;
                Ok(vec![pod(&format!("tick-{n}"), "Running")])
            }
        });

        sleep(Duration::from_millis(1050)).await;
        assert!(view.snapshot().is_empty());

        sleep(Duration::from_millis(500)).await;
        assert_eq!(view.snapshot()[0].pod_name, "tick-1");

        sleep(Duration::from_millis(1100)).await;
        assert_eq!(view.snapshot()[0].pod_name, "tick-2");
        assert_eq!(view.applied_tick(), Some(2));
        handle.stop();
    }

    #[tokio::test]
    async fn guard_drops_response_of_superseded_tick() {
        let (notifier, _feed) = Notifier::channel();
        let view: LiveStatusView<Pod> = LiveStatusView::new("pods", FailurePolicy::KeepStale, notifier);
        let shared = view.shared.clone();
        let epoch = shared.lock().epoch;

        assert!(shared.begin_tick(epoch, 0));
        assert!(shared.begin_tick(epoch, 1));
        shared.finish_tick(epoch, 1, Ok(vec![pod("fresh", "Running")]));
        shared.finish_tick(epoch, 0, Ok(vec![pod("stale", "Running")]));

        assert_eq!(view.snapshot()[0].pod_name, "fresh");
        assert_eq!(view.applied_tick(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_fetch() {
        let (notifier, _feed) = Notifier::channel();
        let view = LiveStatusView::new("pods", FailurePolicy::ClearSnapshot, notifier);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut handle = view.start(Duration::from_millis(1000), move || {
            c.fetch_add(1, Ordering::SeqCst);
            async move {
                sleep(Duration::from_millis(500)).await;
                Ok(vec![pod("late", "Running")])
            }
        });

        sleep(Duration::from_millis(100)).await;
        view.stop(&mut handle);
        handle.stop();
        assert!(handle.is_stopped());

        sleep(Duration::from_millis(3000)).await;
        assert!(view.snapshot().is_empty());
        assert_eq!(view.applied_tick(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retired_epoch_cannot_mutate_after_stop() {
        let (notifier, _feed) = Notifier::channel();
        let view: LiveStatusView<Pod> = LiveStatusView::new("pods", FailurePolicy::KeepStale, notifier);
        let shared = view.shared.clone();
        let epoch = shared.lock().epoch;
        assert!(shared.begin_tick(epoch, 0));
        shared.retire(epoch);
        shared.finish_tick(epoch, 0, Ok(vec![pod("late", "Running")]));
        assert!(view.snapshot().is_empty());
        assert!(!shared.begin_tick(epoch, 1));
    }

    async fn run_failing_second_tick(policy: FailurePolicy) -> (Vec<Pod>, Vec<crate::notify::Notification>, usize) {
        let (notifier, mut feed) = Notifier::channel();
        let view = LiveStatusView::new("cluster1/default", policy, notifier);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut handle = view.start(Duration::from_millis(1000), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(vec![pod("pod-a", "Running")])
                } else {
                    Err(ApiError::Server { status: 500, detail: "Error fetching pods: boom".into() })
                }
            }
        });
        sleep(Duration::from_millis(1500)).await;
        let snap = view.snapshot();
        assert_eq!(view.last_error().as_deref(), Some("Error fetching pods: boom"));
        sleep(Duration::from_millis(1000)).await;
        handle.stop();
        (snap, feed.drain(), calls.load(Ordering::SeqCst))
    }

    #[tokio::test(start_paused = true)]
    async fn clear_policy_empties_snapshot_and_keeps_polling() {
        let (snap, notes, calls) = run_failing_second_tick(FailurePolicy::ClearSnapshot).await;
        assert!(snap.is_empty());
        assert!(calls >= 3);
        assert_eq!(notes[0].severity, Severity::Error);
        assert!(notes[0].detail.contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_policy_keeps_last_good_snapshot() {
        let (snap, notes, _) = run_failing_second_tick(FailurePolicy::KeepStale).await;
        assert_eq!(snap, vec![pod("pod-a", "Running")]);
        assert!(notes.iter().all(|n| n.severity == Severity::Error));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_sends_notice() {
        let (notifier, mut feed) = Notifier::channel();
        let view: LiveStatusView<Pod> = ViewBuilder::new("containers", FailurePolicy::KeepStale, notifier)
            .empty_notice("No Containers", "nothing running")
            .build();
        let mut handle = view.start(Duration::from_millis(5000), || async { Ok(Vec::new()) });
        sleep(Duration::from_millis(10)).await;
        handle.stop();
        let notes = feed.drain();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].severity, Severity::Info);
        assert_eq!(notes[0].summary, "No Containers");
    }

    #[tokio::test(start_paused = true)]
    async fn restart_retires_previous_loop() {
        let (notifier, _feed) = Notifier::channel();
        let view = LiveStatusView::new("pods", FailurePolicy::KeepStale, notifier);
        let mut first = view.start(Duration::from_millis(1000), || async {
            sleep(Duration::from_millis(300)).await;
            Ok(vec![pod("old-cluster", "Running")])
        });
        let mut second = view.start(Duration::from_millis(1000), || async { Ok(vec![pod("new-cluster", "Running")]) });

        sleep(Duration::from_millis(500)).await;
        assert_eq!(view.snapshot()[0].pod_name, "new-cluster");
        first.stop();
        sleep(Duration::from_millis(1000)).await;
        assert_eq!(view.snapshot()[0].pod_name, "new-cluster");
        second.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_view_leaves_other_view_untouched() {
        let (notifier, mut feed) = Notifier::channel();
        let healthy = LiveStatusView::new("cluster1/default", FailurePolicy::ClearSnapshot, notifier.clone());
        let failing: LiveStatusView<Pod> = LiveStatusView::new("cluster2/default", FailurePolicy::ClearSnapshot, notifier);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let mut ok_handle = healthy.start(Duration::from_millis(3000), move || {
            let n = c.fetch_add(1, Ordering::SeqCst);
            async move { Ok(vec![pod(&format!("web-{n}"), "Running")]) }
        });
        let mut bad_handle = failing.start(Duration::from_millis(1000), || async {
            Err(ApiError::Server { status: 500, detail: "cluster unreachable".into() })
        });

        sleep(Duration::from_millis(3500)).await;
        assert_eq!(healthy.snapshot(), vec![pod("web-1", "Running")]);
        assert_eq!(healthy.applied_tick(), Some(1));
        assert_eq!(healthy.last_error(), None);
        assert!(failing.snapshot().is_empty());
        assert_eq!(failing.applied_tick(), None);
        assert_eq!(failing.last_error().as_deref(), Some("cluster unreachable"));

        ok_handle.stop();
        bad_handle.stop();
        let notes = feed.drain();
        assert!(notes.len() >= 4);
        assert!(notes.iter().all(|n| n.detail.contains("cluster2/default")));
    }
}
