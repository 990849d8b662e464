use {
    crate::{error::RelayError, relay::Inbound},
    async_trait::async_trait,
    coordinator_client::{
        error::ClientError,
        Client,
        ConnectionHandler,
        ConnectionOptions,
        DisconnectReason,
        SocketEvent,
    },
    tokio::sync::mpsc::UnboundedSender,
    tracing::{debug, warn},
};

/// Opens coordinator connections for a relay session.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a connection that forwards everything it receives into `sink`.
    async fn open(&self, sink: UnboundedSender<Inbound>) -> Result<Box<dyn Connection>, RelayError>;
}

/// An open coordinator connection.
pub trait Connection: Send {
    /// Releases the connection. Must not block.
    fn close(&mut self);

    fn is_open(&self) -> bool;
}

impl Connection for Client {
    fn close(&mut self) {
        Client::close(self)
    }

    fn is_open(&self) -> bool {
        self.is_connected()
    }
}

/// [`Connector`] backed by a Socket.IO [`Client`].
#[derive(Debug, Clone)]
pub struct SocketConnector {
    options: ConnectionOptions,
}

impl SocketConnector {
    pub fn new(options: ConnectionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }
}

#[async_trait]
impl Connector for SocketConnector {
    async fn open(&self, sink: UnboundedSender<Inbound>) -> Result<Box<dyn Connection>, RelayError> {
        let client = Client::connect(&self.options, ChannelHandler { sink }).await?;
        Ok(Box::new(client))
    }
}

struct ChannelHandler {
    sink: UnboundedSender<Inbound>,
}

impl ChannelHandler {
    fn forward(&self, inbound: Inbound) {
        if self.sink.send(inbound).is_err() {
            debug!("relay is gone, dropping inbound signal");
        }
    }
}

impl ConnectionHandler for ChannelHandler {
    fn connected(&mut self) {
        self.forward(Inbound::Connected);
    }

    fn disconnected(&mut self, reason: DisconnectReason) {
        self.forward(Inbound::Disconnected(reason));
    }

    fn event_received(&mut self, event: SocketEvent) {
        self.forward(Inbound::Event(event));
    }

    fn inbound_error(&mut self, error: ClientError) {
        warn!(%error, "coordinator inbound error");
    }
}

#[cfg(test)]
mod tests {
    use {super::*, tokio::sync::mpsc::unbounded_channel};

    #[test]
    fn handler_forwards_in_order() {
        let (sink, mut rx) = unbounded_channel();
        let mut handler = ChannelHandler { sink };

        handler.connected();
        handler.event_received(SocketEvent {
            name: "NEW_REQUEST".into(),
            args: vec![],
        });
        handler.inbound_error(ClientError::ConnectionClosed);
        handler.disconnected(DisconnectReason::ServerClosed);

        assert_eq!(rx.try_recv().ok(), Some(Inbound::Connected));
        assert!(matches!(rx.try_recv(), Ok(Inbound::Event(event)) if event.name == "NEW_REQUEST"));
        assert_eq!(
            rx.try_recv().ok(),
            Some(Inbound::Disconnected(DisconnectReason::ServerClosed))
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn handler_survives_closed_relay() {
        let (sink, rx) = unbounded_channel();
        drop(rx);

        let mut handler = ChannelHandler { sink };
        handler.connected();
    }
}
