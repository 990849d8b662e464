use {
    super::EngineTransport,
    crate::{error::ClientError, ConnectionOptions, Transport},
    async_trait::async_trait,
    coordinator_rpc::packet::EnginePacket,
    futures_util::{SinkExt, StreamExt},
    tokio::net::TcpStream,
    tokio_tungstenite::{
        connect_async,
        tungstenite::Message,
        MaybeTlsStream,
        WebSocketStream,
    },
    tracing::debug,
};

type SocketStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Engine.IO over a single websocket. Every text frame carries exactly one
/// packet.
pub struct WebsocketTransport {
    stream: SocketStream,
}

impl WebsocketTransport {
    pub async fn connect(options: &ConnectionOptions) -> Result<Self, ClientError> {
        let request = options.as_ws_request()?;
        debug!(uri = %request.uri(), "opening websocket");

        let (stream, _) = connect_async(request)
            .await
            .map_err(|err| ClientError::Websocket(err.to_string()))?;

        Ok(Self { stream })
    }
}

#[async_trait]
impl EngineTransport for WebsocketTransport {
    fn kind(&self) -> Transport {
        Transport::Websocket
    }

    async fn send(&mut self, packet: EnginePacket) -> Result<(), ClientError> {
        self.stream
            .send(Message::Text(packet.encode().into()))
            .await
            .map_err(|err| ClientError::Websocket(err.to_string()))
    }

    async fn recv(&mut self) -> Result<Option<EnginePacket>, ClientError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    return EnginePacket::decode(text.as_str())
                        .map(Some)
                        .map_err(ClientError::from)
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "websocket closed by peer");
                    return Ok(None);
                }
                Some(Ok(Message::Binary(data))) => {
                    debug!(len = data.len(), "skipping binary frame");
                }
                // Websocket-level ping/pong is answered by tungstenite.
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(ClientError::Websocket(err.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.stream.close(None).await {
            debug!(%err, "websocket close failed");
        }
    }
}
