use {
    super::EngineTransport,
    crate::{error::ClientError, ConnectionOptions, Transport},
    async_trait::async_trait,
    coordinator_rpc::packet::{decode_records, encode_payload, EnginePacket, PacketError},
    http::HeaderMap,
    std::collections::VecDeque,
    tracing::debug,
    url::Url,
};

/// Engine.IO over HTTP long-polling.
///
/// Inbound packets arrive through `GET` requests that the server holds open
/// until it has something to send; outbound packets are `POST`ed. The
/// session id from the open packet is attached to every request after the
/// first one.
pub struct PollingTransport {
    http: reqwest::Client,
    url: Url,
    sid: Option<String>,
    inbox: VecDeque<Result<EnginePacket, PacketError>>,
    closed: bool,
}

impl PollingTransport {
    pub fn new(options: &ConnectionOptions) -> Result<Self, ClientError> {
        let url = options.as_url(Transport::Polling)?;

        let mut headers = HeaderMap::new();
        options.update_request_headers(&mut headers)?;

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            url,
            sid: None,
            inbox: VecDeque::new(),
            closed: false,
        })
    }

    fn request_url(&self) -> Url {
        let mut url = self.url.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(sid) = &self.sid {
                query.append_pair("sid", sid);
            }
            // Cache buster.
            query.append_pair("t", &format!("{:x}", rand::random::<u32>()));
        }
        url
    }

    async fn poll(&mut self) -> Result<(), ClientError> {
        let response = self.http.get(self.request_url()).send().await?;

        let status = response.status();
        if !status.is_success() {
            // The server answers 400 once the session is gone.
            if status.as_u16() == 400 {
                self.closed = true;
                return Ok(());
            }
            return Err(ClientError::PollingStatus(status.as_u16()));
        }

        let body = response.text().await?;
        self.ingest(&body);

        Ok(())
    }

    /// Queues every record of a polling response. Undecodable records are
    /// queued as errors in place.
    fn ingest(&mut self, body: &str) {
        for packet in decode_records(body) {
            if let Ok(EnginePacket::Open(open)) = &packet {
                self.sid = Some(open.sid.clone());
            }
            self.inbox.push_back(packet);
        }
    }
}

#[async_trait]
impl EngineTransport for PollingTransport {
    fn kind(&self) -> Transport {
        Transport::Polling
    }

    async fn send(&mut self, packet: EnginePacket) -> Result<(), ClientError> {
        if self.sid.is_none() {
            return Err(ClientError::Handshake("send before open"));
        }
        if self.closed {
            return Err(ClientError::ConnectionClosed);
        }

        let response = self
            .http
            .post(self.request_url())
            .header("Content-Type", "text/plain;charset=UTF-8")
            .body(encode_payload(&[packet]))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClientError::PollingStatus(response.status().as_u16()));
        }

        Ok(())
    }

    async fn recv(&mut self) -> Result<Option<EnginePacket>, ClientError> {
        loop {
            if let Some(packet) = self.inbox.pop_front() {
                return packet.map(Some).map_err(ClientError::from);
            }
            if self.closed {
                return Ok(None);
            }
            // Cancelling drops the in-flight request.
            self.poll().await?;
        }
    }

    async fn close(&mut self) {
        if self.closed || self.sid.is_none() {
            return;
        }
        if let Err(err) = self.send(EnginePacket::Close).await {
            debug!(%err, "polling close failed");
        }
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result};

    #[test]
    fn session_id_and_cache_buster() -> Result<()> {
        let mut transport =
            PollingTransport::new(&ConnectionOptions::new("https://coordinator.example"))?;

        let first = transport.request_url();
        assert!(first.query_pairs().all(|(key, _)| key != "sid"));
        assert!(first.query_pairs().any(|(key, _)| key == "t"));

        transport.sid = Some("abc".to_owned());
        let next = transport.request_url();
        assert!(next
            .query_pairs()
            .any(|(key, value)| key == "sid" && value == "abc"));
        assert!(next
            .query_pairs()
            .any(|(key, value)| key == "transport" && value == "polling"));

        Ok(())
    }

    #[tokio::test]
    async fn bad_record_does_not_drop_batch() -> Result<()> {
        let mut transport =
            PollingTransport::new(&ConnectionOptions::new("https://coordinator.example"))?;

        transport.ingest(concat!(
            r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#,
            "\u{1e}4bogus\u{1e}x\u{1e}",
            r#"42["NEW_REQUEST",{"userId":"u1"}]"#,
        ));

        assert!(matches!(transport.recv().await, Ok(Some(EnginePacket::Open(_)))));
        assert_eq!(transport.sid.as_deref(), Some("s1"));
        assert_eq!(
            transport.recv().await?,
            Some(EnginePacket::Message("bogus".to_owned()))
        );
        let err = transport.recv().await.unwrap_err();
        assert!(err.is_recoverable());
        assert_eq!(
            transport.recv().await?,
            Some(EnginePacket::Message(r#"2["NEW_REQUEST",{"userId":"u1"}]"#.to_owned()))
        );

        Ok(())
    }

    #[tokio::test]
    async fn send_requires_open() -> Result<()> {
        let mut transport =
            PollingTransport::new(&ConnectionOptions::new("https://coordinator.example"))?;

        assert!(matches!(
            transport.send(EnginePacket::Pong(None)).await,
            Err(ClientError::Handshake(_))
        ));

        Ok(())
    }
}
