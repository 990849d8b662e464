use {
    crate::{error::ClientError, ConnectionOptions, Transport},
    async_trait::async_trait,
    coordinator_rpc::packet::EnginePacket,
};

pub mod polling;
pub mod websocket;

/// A bidirectional Engine.IO packet channel.
///
/// `recv` must be cancel safe: the connection loop races it against the
/// shutdown signal.
#[async_trait]
pub trait EngineTransport: Send {
    fn kind(&self) -> Transport;

    async fn send(&mut self, packet: EnginePacket) -> Result<(), ClientError>;

    /// Next inbound packet, or `None` once the peer has closed the channel.
    async fn recv(&mut self) -> Result<Option<EnginePacket>, ClientError>;

    async fn close(&mut self);
}

/// Opens the raw channel for the given transport. No packets are exchanged
/// yet.
pub async fn open(
    transport: Transport,
    options: &ConnectionOptions,
) -> Result<Box<dyn EngineTransport>, ClientError> {
    Ok(match transport {
        Transport::Websocket => Box::new(websocket::WebsocketTransport::connect(options).await?),
        Transport::Polling => Box::new(polling::PollingTransport::new(options)?),
    })
}
