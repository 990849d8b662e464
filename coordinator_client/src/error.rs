use coordinator_rpc::packet::PacketError;

/// Errors generated while building the handshake request.
#[derive(Debug, thiserror::Error)]
pub enum RequestBuildError {
    #[error("Failed to serialize connection query: {0}")]
    Query(#[from] serde_qs::Error),

    #[error("Failed to build connection URL: {0}")]
    Url(String),

    #[error("Failed to build request headers")]
    Headers,
}

/// Errors produced by the coordinator connection.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to build connection request: {0}")]
    RequestBuild(#[from] RequestBuildError),

    #[error("Websocket transport error: {0}")]
    Websocket(String),

    #[error("Polling transport error: {0}")]
    Polling(#[from] reqwest::Error),

    #[error("Polling request rejected with status {0}")]
    PollingStatus(u16),

    #[error("Invalid packet: {0}")]
    Packet(#[from] PacketError),

    #[error("Handshake failed: {0}")]
    Handshake(&'static str),

    #[error("Namespace connection rejected: {0}")]
    ConnectRejected(String),

    #[error("Connection attempt timed out")]
    Timeout,

    #[error("No transport configured")]
    NoTransport,

    #[error("Connection closed")]
    ConnectionClosed,
}

impl ClientError {
    /// Whether the connection can keep running after this error.
    ///
    /// Undecodable packets are reported and skipped; everything else ends the
    /// connection.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Packet(_))
    }
}
