use std::sync::{Arc, Weak};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use crate::broadcast::messages::ServerMessage;
use crate::config::server::BroadcastConfig;
use crate::observability::metrics::{ACTIVE_SUBSCRIBERS, BROADCAST_PUSHES, BROADCAST_TICKS};
use crate::service::TokenQuery;
use crate::types::{ConnectionId, QueryOptions, SortField, SortOrder};

pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(30);

/// Periodic fan-out of the token view to subscribed connections.
///
/// Each connection registers an outbound channel; the socket task on the
/// other end owns the actual writes. The timer only touches upstream data
/// when at least one subscriber is registered.
pub struct TokenBroadcaster {
    service: Arc<dyn TokenQuery>,
    subscribers: DashMap<ConnectionId, UnboundedSender<ServerMessage>>,
    interval: Duration,
    view: QueryOptions,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl TokenBroadcaster {
    pub fn new(service: Arc<dyn TokenQuery>) -> Self {
        TokenBroadcaster {
            service,
            subscribers: DashMap::new(),
            interval: DEFAULT_BROADCAST_INTERVAL,
            view: QueryOptions::default(),
            timer: Mutex::new(None),
        }
    }

    pub fn from_config(service: Arc<dyn TokenQuery>, config: &BroadcastConfig) -> Self {
        let view = QueryOptions::new(
            config.page_limit,
            SortField::parse(&config.sort_by),
            SortOrder::parse(&config.sort_order),
        );

        Self::new(service)
            .with_interval(Duration::from_secs(config.interval_secs.max(1)))
            .with_view(view)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_view(mut self, view: QueryOptions) -> Self {
        self.view = view;
        self
    }

    /// Query used for periodic pushes and as the base of subscribe filters.
    pub fn view(&self) -> &QueryOptions {
        &self.view
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_subscribed(&self, id: &ConnectionId) -> bool {
        self.subscribers.contains_key(id)
    }

    /// Register `id` and push one page for `options` to it straight away.
    pub async fn subscribe(
        &self,
        id: ConnectionId,
        sender: UnboundedSender<ServerMessage>,
        options: &QueryOptions,
    ) {
        self.register(id, sender.clone());
        self.push_initial_page(id, &sender, options).await;
    }

    /// Add `id` to the periodic push set without fetching anything.
    pub fn register(&self, id: ConnectionId, sender: UnboundedSender<ServerMessage>) {
        self.subscribers.insert(id, sender);
        ACTIVE_SUBSCRIBERS.set(self.subscribers.len() as i64);
        tracing::info!("Client {} subscribed to token updates", id);
    }

    /// Send the first page of `options` to a registered connection.
    /// A failed fetch is reported to this connection only. Nothing is sent
    /// if `id` left before the page was ready.
    pub async fn push_initial_page(
        &self,
        id: ConnectionId,
        sender: &UnboundedSender<ServerMessage>,
        options: &QueryOptions,
    ) {
        let message = match self.service.get_tokens(options).await {
            Ok(page) => ServerMessage::update(page.data),
            Err(e) => {
                tracing::error!("Initial token fetch for {} failed: {}", id, e);
                ServerMessage::error("Failed to fetch tokens")
            }
        };

        if !self.is_subscribed(&id) {
            tracing::debug!("Client {} left before its first page", id);
            return;
        }
        if sender.send(message).is_err() {
            self.remove(&id);
        }
    }

    /// Returns whether `id` was subscribed. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: &ConnectionId) -> bool {
        let removed = self.remove(id);
        if removed {
            tracing::info!("Client {} unsubscribed from token updates", id);
        }
        removed
    }

    pub fn disconnect(&self, id: &ConnectionId) {
        self.remove(id);
        tracing::info!("Client disconnected: {}", id);
    }

    fn remove(&self, id: &ConnectionId) -> bool {
        let removed = self.subscribers.remove(id).is_some();
        ACTIVE_SUBSCRIBERS.set(self.subscribers.len() as i64);
        removed
    }

    /// One timer fire. Returns the number of subscribers the page reached.
    pub async fn tick(&self) -> usize {
        BROADCAST_TICKS.inc();

        if self.subscribers.is_empty() {
            return 0;
        }

        let page = match self.service.get_tokens(&self.view).await {
            Ok(page) => page,
            Err(e) => {
                tracing::error!("Error in periodic token update: {}", e);
                return 0;
            }
        };

        let message = ServerMessage::update(page.data);
        let mut delivered = 0;
        let mut closed = Vec::new();

        for entry in self.subscribers.iter() {
            if entry.value().send(message.clone()).is_ok() {
                delivered += 1;
                tracing::debug!("Pushed token update to {}", entry.key());
            } else {
                closed.push(*entry.key());
            }
        }

        for id in &closed {
            self.remove(id);
        }

        BROADCAST_PUSHES.inc_by(delivered as f64);
        tracing::info!("Broadcasted token updates to {} clients", delivered);
        delivered
    }

    /// Arm the periodic timer. A second call while armed does nothing.
    pub async fn start(self: &Arc<Self>) {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let hub: Weak<Self> = Arc::downgrade(self);
        let period = self.interval;

        *timer = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(broadcaster) = hub.upgrade() else { break };
                broadcaster.tick().await;
            }
        }));

        tracing::info!("Periodic token updates started ({}s interval)", period.as_secs());
    }

    pub async fn stop(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
            tracing::info!("Periodic token updates stopped");
        }
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
