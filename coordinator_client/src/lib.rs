use {
    crate::error::RequestBuildError,
    ::http::{HeaderMap, Uri},
    coordinator_rpc::{DEFAULT_NAMESPACE, ENGINE_IO_VERSION, SOCKET_IO_PATH},
    serde::Serialize,
    std::time::Duration,
    url::Url,
};

pub use client::{Client, ConnectionHandler, DisconnectReason, SocketEvent};

pub mod client;
pub mod error;
pub mod transport;

pub type HttpRequest<T> = ::http::Request<T>;

/// Engine.IO transport.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Transport {
    Websocket,
    Polling,
}

/// Coordinator authorization method.
#[derive(Debug, Clone)]
pub enum Authorization {
    /// Uses query string to pass the auth token, e.g. `?auth=<token>`.
    Query(String),

    /// Uses the `Authorization: Bearer <token>` HTTP header.
    Header(String),
}

/// Coordinator connection options.
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    /// The coordinator origin, e.g. `https://coordinator.example`. Websocket
    /// connections switch the scheme to `wss`/`ws`.
    pub address: String,

    /// Socket.IO mount point. Defaults to `/socket.io`.
    pub path: String,

    /// Socket.IO namespace to join. Defaults to `/`.
    pub namespace: String,

    /// Transports to try, in order. Defaults to websocket with polling
    /// fallback.
    pub transports: Vec<Transport>,

    /// Optional authorization method and token.
    pub auth: Option<Authorization>,

    /// Optional origin of the request.
    pub origin: Option<String>,

    /// Optional bound on each transport's handshake.
    pub connect_timeout: Option<Duration>,
}

impl ConnectionOptions {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: SOCKET_IO_PATH.into(),
            namespace: DEFAULT_NAMESPACE.into(),
            transports: vec![Transport::Websocket, Transport::Polling],
            auth: None,
            origin: None,
            connect_timeout: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_transports(mut self, transports: impl Into<Vec<Transport>>) -> Self {
        self.transports = transports.into();
        self
    }

    pub fn with_auth(mut self, auth: impl Into<Option<Authorization>>) -> Self {
        self.auth = auth.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<Option<String>>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn with_connect_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.connect_timeout = timeout.into();
        self
    }

    /// Engine.IO handshake URL for the given transport.
    pub fn as_url(&self, transport: Transport) -> Result<Url, RequestBuildError> {
        #[derive(Serialize)]
        struct QueryParams<'a> {
            #[serde(rename = "EIO")]
            eio: u8,
            transport: Transport,
            auth: Option<&'a str>,
        }

        let query = serde_qs::to_string(&QueryParams {
            eio: ENGINE_IO_VERSION,
            transport,
            auth: match &self.auth {
                Some(Authorization::Query(token)) => Some(token.as_str()),
                _ => None,
            },
        })
        .map_err(RequestBuildError::Query)?;

        let mut url =
            Url::parse(&self.address).map_err(|err| RequestBuildError::Url(err.to_string()))?;

        if transport == Transport::Websocket {
            let scheme = match url.scheme() {
                "https" | "wss" => "wss",
                "http" | "ws" => "ws",
                other => return Err(RequestBuildError::Url(format!("Unsupported scheme {other}"))),
            };
            url.set_scheme(scheme)
                .map_err(|_| RequestBuildError::Url(format!("Cannot switch scheme to {scheme}")))?;
        }

        // Engine.IO servers expect the trailing slash.
        let path = format!(
            "{}/{}/",
            url.path().trim_end_matches('/'),
            self.path.trim_matches('/')
        );
        url.set_path(&path);
        url.set_query(Some(&query));

        Ok(url)
    }

    fn as_ws_request(&self) -> Result<HttpRequest<()>, RequestBuildError> {
        let url = self.as_url(Transport::Websocket)?;

        let mut request = into_client_request(url.as_str())?;

        self.update_request_headers(request.headers_mut())?;

        Ok(request)
    }

    fn update_request_headers(&self, headers: &mut HeaderMap) -> Result<(), RequestBuildError> {
        if let Some(Authorization::Header(token)) = &self.auth {
            let value = format!("Bearer {token}")
                .parse()
                .map_err(|_| RequestBuildError::Headers)?;

            headers.append("Authorization", value);
        }

        if let Some(origin) = &self.origin {
            let value = origin.parse().map_err(|_| RequestBuildError::Headers)?;

            headers.append("Origin", value);
        }

        Ok(())
    }
}

/// Generate a random key for the `Sec-WebSocket-Key` header.
pub fn generate_websocket_key() -> String {
    // a base64-encoded (see Section 4 of [RFC4648]) value that,
    // when decoded, is 16 bytes in length (RFC 6455)
    let r: [u8; 16] = rand::random();
    data_encoding::BASE64.encode(&r)
}

/// Converts a URL string into an HTTP request for initiating a WebSocket connection.
fn into_client_request(url: &str) -> Result<HttpRequest<()>, RequestBuildError> {
    let uri: Uri = url
        .parse()
        .map_err(|_| RequestBuildError::Url("Invalid url".to_owned()))?;
    let authority = uri
        .authority()
        .ok_or(RequestBuildError::Url("Url has no authority".to_owned()))?
        .as_str();
    let host = authority
        .find('@')
        .map(|idx| authority.split_at(idx + 1).1)
        .unwrap_or(authority);

    // Check if the host is empty (excluding the port)
    if host.split(':').next().unwrap_or("").is_empty() {
        return Err(RequestBuildError::Url("EmptyHostName".to_owned()));
    }

    HttpRequest::builder()
        .method("GET")
        .header("Host", host)
        .header("Connection", "Upgrade")
        .header("Upgrade", "websocket")
        .header("Sec-WebSocket-Version", "13")
        .header("Sec-WebSocket-Key", generate_websocket_key())
        .uri(uri)
        .body(())
        .map_err(|err| RequestBuildError::Url(err.to_string()))
}

#[cfg(test)]
mod tests {
    use {super::*, anyhow::Result};

    #[test]
    fn websocket_url() -> Result<()> {
        let opts = ConnectionOptions::new("https://coordinator.example");
        let url = opts.as_url(Transport::Websocket)?;

        assert_eq!(
            url.as_str(),
            "wss://coordinator.example/socket.io/?EIO=4&transport=websocket"
        );

        Ok(())
    }

    #[test]
    fn polling_url_keeps_scheme_and_base_path() -> Result<()> {
        let opts = ConnectionOptions::new("http://localhost:3001/api/")
            .with_path("/ws")
            .with_auth(Authorization::Query("token".into()));
        let url = opts.as_url(Transport::Polling)?;

        assert_eq!(
            url.as_str(),
            "http://localhost:3001/api/ws/?EIO=4&transport=polling&auth=token"
        );

        Ok(())
    }

    #[test]
    fn unsupported_scheme() {
        let opts = ConnectionOptions::new("ftp://coordinator.example");
        assert!(matches!(
            opts.as_url(Transport::Websocket),
            Err(RequestBuildError::Url(_))
        ));
    }

    #[test]
    fn websocket_request_headers() -> Result<()> {
        let opts = ConnectionOptions::new("https://coordinator.example")
            .with_auth(Authorization::Header("secret".into()))
            .with_origin("https://wallet.example".to_owned());
        let request = opts.as_ws_request()?;
        let headers = request.headers();

        assert_eq!(headers["Host"], "coordinator.example");
        assert_eq!(headers["Upgrade"], "websocket");
        assert_eq!(headers["Authorization"], "Bearer secret");
        assert_eq!(headers["Origin"], "https://wallet.example");
        assert_eq!(
            data_encoding::BASE64
                .decode(headers["Sec-WebSocket-Key"].as_bytes())?
                .len(),
            16
        );

        Ok(())
    }

    #[test]
    fn transport_names() {
        assert_eq!(Transport::Websocket.to_string(), "websocket");
        assert_eq!("polling".parse::<Transport>().ok(), Some(Transport::Polling));
    }
}
