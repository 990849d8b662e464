use {
    crate::{
        error::ClientError,
        transport::{self, EngineTransport},
        ConnectionOptions,
        Transport,
    },
    coordinator_rpc::packet::{EnginePacket, OpenPayload, SocketPacket},
    serde_json::Value,
    std::{future::Future, time::Duration},
    tokio::{sync::oneshot, task::JoinHandle, time::timeout},
    tracing::{debug, info, warn},
};

/// Socket.IO event received on the joined namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct SocketEvent {
    pub name: String,
    pub args: Vec<Value>,
}

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum DisconnectReason {
    /// [`Client::close`] was called or the client was dropped.
    ClientClosed,
    /// The server sent a Socket.IO disconnect or an Engine.IO close.
    ServerClosed,
    /// The underlying channel ended without a close packet.
    TransportClosed,
    /// Sending or receiving failed.
    TransportError,
    /// No packet arrived within `pingInterval + pingTimeout`.
    HeartbeatTimeout,
}

/// Handlers for the connection events.
///
/// Called from the connection task, in arrival order.
pub trait ConnectionHandler: Send + 'static {
    /// Called once the namespace has been joined.
    fn connected(&mut self);

    /// Called exactly once when the connection ends, whatever the cause.
    fn disconnected(&mut self, reason: DisconnectReason);

    /// Called for every event packet on the joined namespace.
    fn event_received(&mut self, event: SocketEvent);

    /// Called when an inbound packet could not be processed.
    fn inbound_error(&mut self, error: ClientError);
}

/// A live Socket.IO connection.
///
/// The connection runs in its own task. Dropping the client closes it.
#[derive(Debug)]
pub struct Client {
    transport: Transport,
    sid: String,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Client {
    /// Connects to the coordinator and joins the configured namespace.
    ///
    /// Transports are tried in the configured order; the first one that
    /// completes the handshake wins. There is no retry beyond that.
    pub async fn connect(
        options: &ConnectionOptions,
        handler: impl ConnectionHandler,
    ) -> Result<Self, ClientError> {
        Self::connect_with(options, handler, |kind| transport::open(kind, options)).await
    }

    pub(crate) async fn connect_with<F, Fut>(
        options: &ConnectionOptions,
        handler: impl ConnectionHandler,
        mut open_transport: F,
    ) -> Result<Self, ClientError>
    where
        F: FnMut(Transport) -> Fut,
        Fut: Future<Output = Result<Box<dyn EngineTransport>, ClientError>>,
    {
        let mut last_error = ClientError::NoTransport;

        for &kind in &options.transports {
            let attempt = async {
                let mut transport = open_transport(kind).await?;
                let open = handshake(transport.as_mut(), &options.namespace).await?;
                Ok::<_, ClientError>((transport, open))
            };

            let result = match options.connect_timeout {
                Some(limit) => timeout(limit, attempt)
                    .await
                    .unwrap_or(Err(ClientError::Timeout)),
                None => attempt.await,
            };

            match result {
                Ok((transport, open)) => {
                    info!(transport = %kind, sid = %open.sid, "connected to coordinator");
                    return Ok(Self::spawn(transport, open, options.namespace.clone(), handler));
                }
                Err(err) => {
                    warn!(transport = %kind, %err, "transport failed");
                    last_error = err;
                }
            }
        }

        Err(last_error)
    }

    pub(crate) fn spawn(
        transport: Box<dyn EngineTransport>,
        open: OpenPayload,
        namespace: String,
        mut handler: impl ConnectionHandler,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let kind = transport.kind();
        let sid = open.sid.clone();

        handler.connected();
        let task = tokio::spawn(run(
            transport,
            open.heartbeat_deadline(),
            namespace,
            handler,
            shutdown_rx,
        ));

        Self {
            transport: kind,
            sid,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn transport(&self) -> Transport {
        self.transport
    }

    /// Engine.IO session id.
    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn is_connected(&self) -> bool {
        self.shutdown.is_some() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Signals the connection task to leave the namespace and close the
    /// transport. Returns immediately; calling it again is a no-op.
    pub fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            debug!(sid = %self.sid, "closing coordinator connection");
            shutdown.send(()).ok();
        }
    }

    /// Closes the connection and waits for the task to finish.
    pub async fn shutdown(mut self) {
        self.close();
        if let Some(task) = self.task.take() {
            task.await.ok();
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.close();
    }
}

/// Engine.IO open followed by the Socket.IO namespace connect.
async fn handshake(
    transport: &mut dyn EngineTransport,
    namespace: &str,
) -> Result<OpenPayload, ClientError> {
    let open = match transport.recv().await? {
        Some(EnginePacket::Open(open)) => open,
        Some(_) => return Err(ClientError::Handshake("expected open packet")),
        None => return Err(ClientError::ConnectionClosed),
    };

    transport
        .send(EnginePacket::message(&SocketPacket::connect(namespace)))
        .await?;

    loop {
        match transport.recv().await? {
            Some(EnginePacket::Message(data)) => match SocketPacket::decode(&data)? {
                SocketPacket::Connect { namespace: ns, .. } if ns == namespace => {
                    return Ok(open)
                }
                SocketPacket::ConnectError { data, .. } => {
                    let message = data
                        .get("message")
                        .and_then(Value::as_str)
                        .map(ToOwned::to_owned)
                        .unwrap_or_else(|| data.to_string());
                    return Err(ClientError::ConnectRejected(message));
                }
                other => debug!(?other, "ignoring packet during handshake"),
            },
            Some(EnginePacket::Ping(probe)) => transport.send(EnginePacket::Pong(probe)).await?,
            Some(EnginePacket::Close) | None => return Err(ClientError::ConnectionClosed),
            Some(_) => {}
        }
    }
}

async fn run(
    mut transport: Box<dyn EngineTransport>,
    heartbeat: Duration,
    namespace: String,
    mut handler: impl ConnectionHandler,
    mut shutdown: oneshot::Receiver<()>,
) {
    let reason = loop {
        tokio::select! {
            // Either an explicit close or the client handle being dropped.
            _ = &mut shutdown => {
                transport
                    .send(EnginePacket::message(&SocketPacket::disconnect(namespace.as_str())))
                    .await
                    .ok();
                transport.close().await;
                break DisconnectReason::ClientClosed;
            }
            packet = timeout(heartbeat, transport.recv()) => {
                let packet = match packet {
                    Err(_) => break DisconnectReason::HeartbeatTimeout,
                    Ok(Ok(Some(packet))) => packet,
                    Ok(Ok(None)) => break DisconnectReason::TransportClosed,
                    Ok(Err(err)) if err.is_recoverable() => {
                        handler.inbound_error(err);
                        continue;
                    }
                    Ok(Err(err)) => {
                        handler.inbound_error(err);
                        break DisconnectReason::TransportError;
                    }
                };

                match packet {
                    EnginePacket::Ping(probe) => {
                        if let Err(err) = transport.send(EnginePacket::Pong(probe)).await {
                            handler.inbound_error(err);
                            break DisconnectReason::TransportError;
                        }
                    }
                    EnginePacket::Close => break DisconnectReason::ServerClosed,
                    EnginePacket::Message(data) => match SocketPacket::decode(&data) {
                        Ok(SocketPacket::Event { namespace: ns, name, args, .. }) if ns == namespace => {
                            handler.event_received(SocketEvent { name, args });
                        }
                        Ok(SocketPacket::Disconnect { namespace: ns }) if ns == namespace => {
                            break DisconnectReason::ServerClosed;
                        }
                        Ok(other) => debug!(?other, "ignoring packet"),
                        Err(err) => handler.inbound_error(err.into()),
                    },
                    EnginePacket::Open(_)
                    | EnginePacket::Pong(_)
                    | EnginePacket::Upgrade
                    | EnginePacket::Noop => {}
                }
            }
        }
    };

    info!(%reason, "coordinator connection ended");
    handler.disconnected(reason);
}
