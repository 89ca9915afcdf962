use crate::api::DashboardClient;
use crate::config::Settings;
use crate::forms::{self, InFlight, TeeForm};
use crate::models::{Pod, PodmanContainer, TeeOperation, TeeOperationRequest};
use crate::notify::{Notification, NotificationFeed, Notifier};
use crate::poll::{FailurePolicy, LiveStatusView, PollHandle, ViewBuilder};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

const TOAST_TTL: Duration = Duration::from_secs(5);
/// Footer lines reserved for notifications.
pub const MAX_TOASTS: usize = 3;

/// Recent notifications, oldest first. Each one stays for `TOAST_TTL`.
#[derive(Default)]
pub struct Toasts {
    queue: VecDeque<(Notification, Instant)>,
}

impl Toasts {
    pub fn absorb(&mut self, incoming: Vec<Notification>, now: Instant) {
        self.queue.retain(|(_, at)| now.saturating_duration_since(*at) < TOAST_TTL);
        self.queue.extend(incoming.into_iter().map(|n| (n, now)));
        while self.queue.len() > MAX_TOASTS {
            self.queue.pop_front();
        }
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.queue.iter().map(|(n, _)| n)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// One cluster's pod table in the overview.
pub struct PodPane {
    pub cluster: String,
    pub view: LiveStatusView<Pod>,
    handle: PollHandle,
    pub selected: usize,
    refresh: Arc<AtomicBool>,
}

impl PodPane {
    fn start(
        client: &Arc<DashboardClient>,
        notifier: &Notifier,
        cluster: String,
        namespace: &str,
        interval: Duration,
    ) -> Self {
        // the overview shows nothing rather than stale pods when a fetch fails
        let view = LiveStatusView::new(format!("pods of {cluster}/{namespace}"), FailurePolicy::ClearSnapshot, notifier.clone());
        let handle = start_pods(&view, client, &cluster, namespace, interval);
        Self { cluster, view, handle, selected: 0, refresh: Arc::new(AtomicBool::new(false)) }
    }

    fn restart(&mut self, client: &Arc<DashboardClient>, namespace: &str, interval: Duration) {
        self.handle.stop();
        self.handle = start_pods(&self.view, client, &self.cluster, namespace, interval);
    }

    pub fn selected_pod(&self) -> Option<Pod> {
        self.view.with_snapshot(|pods| pods.get(self.selected).cloned())
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.view.with_snapshot(|pods| pods.len());
        self.selected = step(self.selected, delta, len);
    }
}

fn start_pods(
    view: &LiveStatusView<Pod>,
    client: &Arc<DashboardClient>,
    cluster: &str,
    namespace: &str,
    interval: Duration,
) -> PollHandle {
    let client = client.clone();
    let cluster = cluster.to_string();
    let namespace = namespace.to_string();
    view.start(interval, move || {
        let client = client.clone();
        let cluster = cluster.clone();
        let namespace = namespace.clone();
        async move { client.get_pods(&cluster, &namespace).await }
    })
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}

fn start_containers(
    view: &LiveStatusView<PodmanContainer>,
    client: &Arc<DashboardClient>,
    interval: Duration,
) -> PollHandle {
    let client = client.clone();
    view.start(interval, move || {
        let client = client.clone();
        async move { client.get_podman_containers().await }
    })
}

pub struct TeePanel {
    pub view: LiveStatusView<PodmanContainer>,
    handle: PollHandle,
    pub selected: usize,
    pub pending: Option<TeeOperationRequest>,
    pub loading: InFlight,
    pub operation_log: Arc<Mutex<Option<String>>>,
    refresh: Arc<AtomicBool>,
}

impl TeePanel {
    pub fn selected_container(&self) -> Option<PodmanContainer> {
        self.view.with_snapshot(|c| c.get(self.selected).cloned())
    }

    pub fn operation_log(&self) -> Option<String> {
        self.operation_log.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

pub enum Screen {
    Overview { left: PodPane, right: PodPane, focus: Side },
    Tee(TeePanel),
}

pub struct App {
    pub client: Arc<DashboardClient>,
    pub settings: Settings,
    pub namespace: String,
    pub screen: Screen,
    pub should_quit: bool,
    notifier: Notifier,
    feed: NotificationFeed,
    toasts: Toasts,
}

impl App {
    pub fn overview(
        client: Arc<DashboardClient>,
        settings: Settings,
        namespace: String,
        left: String,
        right: String,
    ) -> Self {
        let (notifier, feed) = Notifier::channel();
        let interval = settings.pods_interval;
        let left = PodPane::start(&client, &notifier, left, &namespace, interval);
        let right = PodPane::start(&client, &notifier, right, &namespace, interval);
        Self {
            client,
            settings,
            namespace,
            screen: Screen::Overview { left, right, focus: Side::Left },
            should_quit: false,
            notifier,
            feed,
            toasts: Toasts::default(),
        }
    }

    pub fn tee(client: Arc<DashboardClient>, settings: Settings) -> Self {
        let (notifier, feed) = Notifier::channel();
        // keep the last good container list on failure so a pending
        // confirmation still refers to what the user saw
        let view = ViewBuilder::new("podman containers", FailurePolicy::KeepStale, notifier.clone())
            .empty_notice("No Containers", "No podman containers found in either environment")
            .build();
        let handle = start_containers(&view, &client, settings.containers_interval);
        Self {
            client,
            namespace: settings.default_namespace().to_string(),
            settings,
            screen: Screen::Tee(TeePanel {
                view,
                handle,
                selected: 0,
                pending: None,
                loading: InFlight::default(),
                operation_log: Arc::new(Mutex::new(None)),
                refresh: Arc::new(AtomicBool::new(false)),
            }),
            should_quit: false,
            notifier,
            feed,
            toasts: Toasts::default(),
        }
    }

    pub fn toasts(&self) -> &Toasts {
        &self.toasts
    }

    /// Called once per frame: picks up notifications and pending refreshes.
    pub fn on_tick(&mut self) {
        self.toasts.absorb(self.feed.drain(), Instant::now());

        match &mut self.screen {
            Screen::Overview { left, right, .. } => {
                let interval = self.settings.pods_interval;
                for pane in [left, right] {
                    if pane.refresh.swap(false, Ordering::AcqRel) {
                        pane.restart(&self.client, &self.namespace, interval);
                    }
                    pane.move_selection(0);
                }
            }
            Screen::Tee(panel) => {
                if panel.refresh.swap(false, Ordering::AcqRel) {
                    panel.handle.stop();
                    panel.handle = start_containers(&panel.view, &self.client, self.settings.containers_interval);
                }
            }
        }
    }

    pub fn on_key(&mut self, key: char) {
        if key == 'q' {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Overview { .. } => self.overview_key(key),
            Screen::Tee(_) => self.tee_key(key),
        }
    }

    pub fn on_up(&mut self) {
        self.move_selection(-1);
    }

    pub fn on_down(&mut self) {
        self.move_selection(1);
    }

    fn move_selection(&mut self, delta: isize) {
        match &mut self.screen {
            Screen::Overview { left, right, focus } => match focus {
                Side::Left => left.move_selection(delta),
                Side::Right => right.move_selection(delta),
            },
            Screen::Tee(panel) => {
                let len = panel.view.with_snapshot(|c| c.len());
                panel.selected = step(panel.selected, delta, len);
            }
        }
    }

    fn overview_key(&mut self, key: char) {
        let interval = self.settings.pods_interval;
        let Screen::Overview { left, right, focus } = &mut self.screen else {
            return;
        };
        let pane = match focus {
            Side::Left => &mut *left,
            Side::Right => &mut *right,
        };
        match key {
            '\t' => {
                *focus = if *focus == Side::Left { Side::Right } else { Side::Left };
            }
            'j' => pane.move_selection(1),
            'k' => pane.move_selection(-1),
            'c' => {
                let next = self.settings.next_cluster(&pane.cluster);
                *pane = PodPane::start(&self.client, &self.notifier, next, &self.namespace, interval);
            }
            'n' => {
                self.namespace = self.settings.next_namespace(&self.namespace);
                for p in [left, right] {
                    let cluster = p.cluster.clone();
                    *p = PodPane::start(&self.client, &self.notifier, cluster, &self.namespace, interval);
                }
            }
            'd' => {
                let Some(pod) = pane.selected_pod() else {
                    return;
                };
                let client = self.client.clone();
                let notifier = self.notifier.clone();
                let cluster = pane.cluster.clone();
                let namespace = self.namespace.clone();
                let refresh = pane.refresh.clone();
                tokio::spawn(async move {
                    if forms::delete_pod(&client, &notifier, &cluster, &namespace, &pod.pod_name).await.is_ok() {
                        refresh.store(true, Ordering::Release);
                    }
                });
            }
            _ => {}
        }
    }

    fn tee_key(&mut self, key: char) {
        let Screen::Tee(panel) = &mut self.screen else {
            return;
        };
        match key {
            'j' => self.move_selection(1),
            'k' => self.move_selection(-1),
            'e' | 'x' => {
                let operation = if key == 'e' { TeeOperation::Encapsulate } else { TeeOperation::Decapsulate };
                let form = TeeForm {
                    container: panel.selected_container().map(|c| c.name),
                    operation: Some(operation),
                    ..Default::default()
                };
                let containers = panel.view.snapshot();
                panel.pending = form.validate(&containers, &self.notifier);
            }
            'y' => {
                let Some(request) = panel.pending.take() else {
                    return;
                };
                let Some(guard) = panel.loading.try_begin() else {
                    self.notifier.warn("Busy", "A TEE operation is already running");
                    return;
                };
                let client = self.client.clone();
                let notifier = self.notifier.clone();
                let log_slot = panel.operation_log.clone();
                let refresh = panel.refresh.clone();
                *log_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some("Starting TEE operation...".into());
                tokio::spawn(async move {
                    let _guard = guard;
                    let (result, log) = forms::run_tee_operation(&client, &notifier, &request).await;
                    *log_slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(log);
                    if result.is_ok() {
                        refresh.store(true, Ordering::Release);
                    }
                });
            }
            'n' | '\u{1b}' => panel.pending = None,
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        match &mut self.screen {
            Screen::Overview { left, right, .. } => {
                left.handle.stop();
                right.handle.stop();
            }
            Screen::Tee(panel) => panel.handle.stop(),
        }
    }
}
