use {
    crate::{
        connector::{Connection, Connector},
        error::RelayError,
        relay::{Inbound, RelayEvent, RequestRelay, Resolution},
        stats::{RelayStats, StatsSnapshot},
    },
    chrono::{DateTime, Utc},
    coordinator_rpc::{
        domain::{RequestId, UserId},
        event::WcRequestData,
    },
    std::sync::Arc,
    tokio::{
        sync::{
            mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
            Mutex,
        },
        task::JoinHandle,
    },
    tracing::{info, warn},
};

struct ActiveRelay {
    user_id: UserId,
    connection: Box<dyn Connection>,
    relay: Arc<Mutex<RequestRelay>>,
    pump: JoinHandle<()>,
}

/// Long-lived owner of the coordinator connection.
///
/// Holds at most one connection, scoped to the signed-in user. The
/// connection is released when the user changes, on [`RelaySession::close`],
/// and when the session is dropped.
pub struct RelaySession<C> {
    connector: C,
    events: UnboundedSender<RelayEvent>,
    stats: Arc<RelayStats>,
    active: Option<ActiveRelay>,
}

impl<C: Connector> RelaySession<C> {
    /// Creates the session and the receiver for its domain events.
    pub fn new(connector: C) -> (Self, UnboundedReceiver<RelayEvent>) {
        let (events, rx) = unbounded_channel();

        let session = Self {
            connector,
            events,
            stats: Arc::new(RelayStats::default()),
            active: None,
        };

        (session, rx)
    }

    /// Follows the signed-in user: connects for `Some`, disconnects for
    /// `None`. Re-setting the current user keeps the open connection.
    pub async fn set_user(&mut self, user_id: Option<UserId>) -> Result<(), RelayError> {
        match user_id {
            Some(user_id) => {
                if self.is_connected_as(&user_id) {
                    return Ok(());
                }
                self.open(user_id).await
            }
            None => {
                self.close();
                Ok(())
            }
        }
    }

    /// Opens a fresh connection for `user_id`, closing any previous one.
    ///
    /// A failed attempt leaves the session disconnected; nothing retries.
    pub async fn open(&mut self, user_id: UserId) -> Result<(), RelayError> {
        self.close();

        let (sink, inbound) = unbounded_channel();
        let connection = match self.connector.open(sink).await {
            Ok(connection) => connection,
            Err(err) => {
                warn!(user = %user_id, %err, "coordinator connection failed, live updates disabled");
                return Err(err);
            }
        };

        info!(user = %user_id, "relay session opened");

        let relay = Arc::new(Mutex::new(RequestRelay::new(
            user_id.clone(),
            self.stats.clone(),
        )));
        let pump = tokio::spawn(pump(inbound, relay.clone(), self.events.clone()));

        self.active = Some(ActiveRelay {
            user_id,
            connection,
            relay,
            pump,
        });

        Ok(())
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.active.as_ref().map(|active| &active.user_id)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub async fn pending(&self) -> Option<WcRequestData> {
        let active = self.active.as_ref()?;
        let relay = active.relay.lock().await;
        relay.pending().cloned()
    }

    pub async fn resolve(
        &self,
        id: &RequestId,
        resolution: Resolution,
    ) -> Result<WcRequestData, RelayError> {
        let active = self.active.as_ref().ok_or(RelayError::NoUser)?;
        let mut relay = active.relay.lock().await;
        relay.resolve(id, resolution)
    }

    pub async fn dismiss(&self) -> Option<WcRequestData> {
        let active = self.active.as_ref()?;
        let mut relay = active.relay.lock().await;
        relay.dismiss()
    }

    pub async fn clear_expired(&self, now: DateTime<Utc>) -> Option<WcRequestData> {
        let active = self.active.as_ref()?;
        let mut relay = active.relay.lock().await;
        relay.clear_expired(now)
    }
}

impl<C> RelaySession<C> {
    pub fn is_connected(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.connection.is_open())
    }

    fn is_connected_as(&self, user_id: &UserId) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| &active.user_id == user_id && active.connection.is_open())
    }

    /// Releases the connection, if any. The pending request goes with it.
    pub fn close(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.connection.close();
            // Signals still queued belong to the old user.
            active.pump.abort();
            info!(user = %active.user_id, "relay session closed");
        }
    }
}

impl<C> Drop for RelaySession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Feeds connection signals through the relay in arrival order.
async fn pump(
    mut inbound: UnboundedReceiver<Inbound>,
    relay: Arc<Mutex<RequestRelay>>,
    events: UnboundedSender<RelayEvent>,
) {
    while let Some(signal) = inbound.recv().await {
        let event = relay.lock().await.handle(signal);

        if let Some(event) = event {
            if events.send(event).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            test_support::{connection_event, request, request_event},
            view::{ViewMode, ViewModeMachine},
        },
        async_trait::async_trait,
        coordinator_client::{error::ClientError, DisconnectReason},
        std::sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Mutex as StdMutex,
        },
    };

    #[derive(Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
        fail: AtomicBool,
        sinks: StdMutex<Vec<UnboundedSender<Inbound>>>,
    }

    impl Counters {
        fn opened(&self) -> usize {
            self.opened.load(Ordering::SeqCst)
        }

        fn closed(&self) -> usize {
            self.closed.load(Ordering::SeqCst)
        }

        /// Sink of the most recent connection.
        fn sink(&self) -> UnboundedSender<Inbound> {
            self.sinks.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[derive(Clone, Default)]
    struct MockConnector(Arc<Counters>);

    struct MockConnection {
        counters: Arc<Counters>,
        open: bool,
    }

    impl Connection for MockConnection {
        fn close(&mut self) {
            self.open = false;
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }

        fn is_open(&self) -> bool {
            self.open
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn open(
            &self,
            sink: UnboundedSender<Inbound>,
        ) -> Result<Box<dyn Connection>, RelayError> {
            if self.0.fail.load(Ordering::SeqCst) {
                return Err(ClientError::ConnectionClosed.into());
            }

            self.0.opened.fetch_add(1, Ordering::SeqCst);
            sink.send(Inbound::Connected).ok();
            self.0.sinks.lock().unwrap().push(sink);

            Ok(Box::new(MockConnection {
                counters: self.0.clone(),
                open: true,
            }))
        }
    }

    fn session() -> (
        RelaySession<MockConnector>,
        UnboundedReceiver<RelayEvent>,
        Arc<Counters>,
    ) {
        let connector = MockConnector::default();
        let counters = connector.0.clone();
        let (session, events) = RelaySession::new(connector);
        (session, events, counters)
    }

    #[tokio::test]
    async fn no_user_no_connection() -> anyhow::Result<()> {
        let (mut session, _events, counters) = session();

        session.set_user(None).await?;

        assert_eq!(counters.opened(), 0);
        assert!(!session.is_connected());
        assert_eq!(session.user_id(), None);

        Ok(())
    }

    #[tokio::test]
    async fn matching_request_reaches_callback_and_view() -> anyhow::Result<()> {
        let (mut session, mut events, counters) = session();
        let mut view = ViewModeMachine::new();

        session.set_user(Some("u1".into())).await?;
        assert_eq!(events.recv().await, Some(RelayEvent::Connected));

        counters.sink().send(Inbound::Event(request_event("u1", "r1")))?;

        let event = events.recv().await.unwrap();
        assert_eq!(event, RelayEvent::NewRequest {
            request: request("u1", "r1"),
            superseded: None,
        });
        assert_eq!(view.on_relay_event(&event), ViewMode::Transaction);
        assert_eq!(session.pending().await, Some(request("u1", "r1")));

        Ok(())
    }

    #[tokio::test]
    async fn foreign_request_changes_nothing() -> anyhow::Result<()> {
        let (mut session, mut events, counters) = session();
        let mut view = ViewModeMachine::new();

        session.set_user(Some("u1".into())).await?;
        assert_eq!(events.recv().await, Some(RelayEvent::Connected));

        let sink = counters.sink();
        sink.send(Inbound::Event(request_event("u2", "r1")))?;
        sink.send(Inbound::Event(connection_event("u1", "t1")))?;

        // The next delivered event is the connection; the foreign request
        // never surfaced.
        let event = events.recv().await.unwrap();
        assert!(matches!(event, RelayEvent::NewConnection(_)));
        assert_eq!(view.on_relay_event(&event), ViewMode::Apps);
        assert_eq!(session.pending().await, None);
        assert_eq!(session.stats().foreign_user, 1);

        Ok(())
    }

    #[tokio::test]
    async fn last_request_wins() -> anyhow::Result<()> {
        let (mut session, mut events, counters) = session();
        session.set_user(Some("u1".into())).await?;
        events.recv().await;

        let sink = counters.sink();
        sink.send(Inbound::Event(request_event("u1", "r1")))?;
        sink.send(Inbound::Event(request_event("u1", "r2")))?;

        events.recv().await;
        let second = events.recv().await.unwrap();
        assert!(matches!(
            second,
            RelayEvent::NewRequest { superseded: Some(ref old), .. } if old.id.as_str() == "r1"
        ));
        assert_eq!(session.pending().await.map(|r| r.id), Some("r2".into()));
        assert_eq!(session.stats().overwritten, 1);

        let resolved = session.resolve(&"r2".into(), Resolution::Approved).await?;
        assert_eq!(resolved.id.as_str(), "r2");
        assert_eq!(session.pending().await, None);

        Ok(())
    }

    #[tokio::test]
    async fn drop_closes_exactly_once() -> anyhow::Result<()> {
        let (mut session, _events, counters) = session();
        session.set_user(Some("u1".into())).await?;
        assert!(session.is_connected());

        drop(session);

        assert_eq!(counters.closed(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn explicit_close_then_drop_closes_once() -> anyhow::Result<()> {
        let (mut session, _events, counters) = session();
        session.set_user(Some("u1".into())).await?;

        session.set_user(None).await?;
        session.close();
        drop(session);

        assert_eq!(counters.closed(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn same_user_keeps_connection() -> anyhow::Result<()> {
        let (mut session, _events, counters) = session();

        session.set_user(Some("u1".into())).await?;
        session.set_user(Some("u1".into())).await?;

        assert_eq!(counters.opened(), 1);
        assert_eq!(counters.closed(), 0);

        Ok(())
    }

    #[tokio::test]
    async fn user_change_reconnects() -> anyhow::Result<()> {
        let (mut session, mut events, counters) = session();

        session.set_user(Some("u1".into())).await?;
        events.recv().await;
        counters.sink().send(Inbound::Event(request_event("u1", "r1")))?;
        events.recv().await;

        session.set_user(Some("u2".into())).await?;

        assert_eq!(counters.opened(), 2);
        assert_eq!(counters.closed(), 1);
        assert_eq!(session.user_id(), Some(&"u2".into()));
        // The pending request belonged to the previous user.
        assert_eq!(session.pending().await, None);

        Ok(())
    }

    #[tokio::test]
    async fn failed_connect_degrades() -> anyhow::Result<()> {
        let (mut session, _events, counters) = session();
        counters.fail.store(true, Ordering::SeqCst);

        let result = session.set_user(Some("u1".into())).await;

        assert!(matches!(result, Err(RelayError::Connect(_))));
        assert!(!session.is_connected());
        assert_eq!(session.pending().await, None);
        assert!(matches!(
            session.resolve(&"r1".into(), Resolution::Rejected).await,
            Err(RelayError::NoUser)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn disconnect_is_published() -> anyhow::Result<()> {
        let (mut session, mut events, counters) = session();
        session.set_user(Some("u1".into())).await?;
        events.recv().await;

        counters
            .sink()
            .send(Inbound::Disconnected(DisconnectReason::TransportClosed))?;

        assert_eq!(
            events.recv().await,
            Some(RelayEvent::Disconnected(DisconnectReason::TransportClosed))
        );

        Ok(())
    }
}
