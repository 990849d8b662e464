//! Engine.IO v4 and Socket.IO v5 text framing.
//!
//! https://github.com/socketio/engine.io-protocol#packet-encoding
//! https://github.com/socketio/socket.io-protocol#packet-encoding
//!
//! Binary attachments are not used by the coordinator and are rejected.

use {
    crate::DEFAULT_NAMESPACE,
    serde::{Deserialize, Serialize},
    serde_json::Value,
    std::time::Duration,
};

/// Separator between packets in an HTTP long-polling payload.
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Errors covering packet decoding issues.
#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("Empty packet")]
    Empty,
    #[error("Unknown Engine.IO packet type: {0}")]
    EngineType(char),
    #[error("Unknown Socket.IO packet type: {0}")]
    SocketType(char),
    #[error("Binary packets are not supported")]
    Binary,
    #[error("Invalid ack id: {0}")]
    AckId(String),
    #[error("Invalid packet data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Malformed packet: {0}")]
    Malformed(&'static str),
}

/// Handshake data sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_payload: Option<u64>,
}

impl OpenPayload {
    /// Longest silence tolerated before the connection is considered lost.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(Option<String>),
    Pong(Option<String>),
    Message(String),
    Upgrade,
    Noop,
}

impl EnginePacket {
    pub fn decode(raw: &str) -> Result<Self, PacketError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        let data = chars.as_str();
        let probe = || (!data.is_empty()).then(|| data.to_owned());

        Ok(match kind {
            '0' => Self::Open(serde_json::from_str(data)?),
            '1' => Self::Close,
            '2' => Self::Ping(probe()),
            '3' => Self::Pong(probe()),
            '4' => Self::Message(data.to_owned()),
            '5' => Self::Upgrade,
            '6' => Self::Noop,
            other => return Err(PacketError::EngineType(other)),
        })
    }

    pub fn encode(&self) -> String {
        match self {
            // Servers never receive an open packet, the payload is only
            // serialized for completeness.
            Self::Open(payload) => {
                format!("0{}", serde_json::to_string(payload).unwrap_or_default())
            }
            Self::Close => "1".to_owned(),
            Self::Ping(probe) => format!("2{}", probe.as_deref().unwrap_or_default()),
            Self::Pong(probe) => format!("3{}", probe.as_deref().unwrap_or_default()),
            Self::Message(data) => format!("4{data}"),
            Self::Upgrade => "5".to_owned(),
            Self::Noop => "6".to_owned(),
        }
    }

    pub fn message(packet: &SocketPacket) -> Self {
        Self::Message(packet.encode())
    }
}

/// Splits an HTTP long-polling payload into packets.
pub fn decode_payload(raw: &str) -> Result<Vec<EnginePacket>, PacketError> {
    decode_records(raw).collect()
}

/// Decodes the records of a long-polling payload one by one.
pub fn decode_records(raw: &str) -> impl Iterator<Item = Result<EnginePacket, PacketError>> + '_ {
    raw.split(RECORD_SEPARATOR)
        .filter(|record| !record.is_empty())
        .map(EnginePacket::decode)
}

/// Joins packets into an HTTP long-polling payload.
pub fn encode_payload(packets: &[EnginePacket]) -> String {
    packets
        .iter()
        .map(EnginePacket::encode)
        .collect::<Vec<_>>()
        .join(&RECORD_SEPARATOR.to_string())
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        args: Vec<Value>,
    },
    Ack {
        namespace: String,
        id: u64,
        args: Vec<Value>,
    },
    ConnectError {
        namespace: String,
        data: Value,
    },
}

impl SocketPacket {
    pub fn connect(namespace: impl Into<String>) -> Self {
        Self::Connect {
            namespace: namespace.into(),
            data: None,
        }
    }

    pub fn disconnect(namespace: impl Into<String>) -> Self {
        Self::Disconnect {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        match self {
            Self::Connect { namespace, .. }
            | Self::Disconnect { namespace }
            | Self::Event { namespace, .. }
            | Self::Ack { namespace, .. }
            | Self::ConnectError { namespace, .. } => namespace,
        }
    }

    pub fn decode(raw: &str) -> Result<Self, PacketError> {
        let mut chars = raw.chars();
        let kind = chars.next().ok_or(PacketError::Empty)?;
        if matches!(kind, '5' | '6') {
            return Err(PacketError::Binary);
        }
        if !matches!(kind, '0'..='4') {
            return Err(PacketError::SocketType(kind));
        }

        let mut rest = chars.as_str();

        let namespace = if rest.starts_with('/') {
            match rest.split_once(',') {
                Some((namespace, tail)) => {
                    rest = tail;
                    namespace.to_owned()
                }
                None => std::mem::take(&mut rest).to_owned(),
            }
        } else {
            DEFAULT_NAMESPACE.to_owned()
        };

        let id_len = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let (id, data) = rest.split_at(id_len);
        let id = if id.is_empty() {
            None
        } else {
            Some(
                id.parse::<u64>()
                    .map_err(|_| PacketError::AckId(id.to_owned()))?,
            )
        };
        let data = if data.is_empty() {
            None
        } else {
            Some(serde_json::from_str::<Value>(data)?)
        };

        Ok(match kind {
            '0' => Self::Connect { namespace, data },
            '1' => Self::Disconnect { namespace },
            '2' => {
                let Some(Value::Array(items)) = data else {
                    return Err(PacketError::Malformed("event data must be an array"));
                };
                let mut items = items.into_iter();
                let Some(Value::String(name)) = items.next() else {
                    return Err(PacketError::Malformed("event name must be a string"));
                };

                Self::Event {
                    namespace,
                    id,
                    name,
                    args: items.collect(),
                }
            }
            '3' => {
                let id = id.ok_or(PacketError::Malformed("ack without id"))?;
                let Some(Value::Array(args)) = data else {
                    return Err(PacketError::Malformed("ack data must be an array"));
                };

                Self::Ack {
                    namespace,
                    id,
                    args,
                }
            }
            _ => Self::ConnectError {
                namespace,
                data: data.unwrap_or(Value::Null),
            },
        })
    }

    pub fn encode(&self) -> String {
        let (kind, id, data) = match self {
            Self::Connect { data, .. } => ('0', None, data.clone()),
            Self::Disconnect { .. } => ('1', None, None),
            Self::Event { id, name, args, .. } => {
                let mut items = Vec::with_capacity(args.len() + 1);
                items.push(Value::String(name.clone()));
                items.extend(args.iter().cloned());
                ('2', *id, Some(Value::Array(items)))
            }
            Self::Ack { id, args, .. } => ('3', Some(*id), Some(Value::Array(args.clone()))),
            Self::ConnectError { data, .. } => ('4', None, Some(data.clone())),
        };

        let mut out = String::from(kind);
        let namespace = self.namespace();
        if namespace != DEFAULT_NAMESPACE {
            out.push_str(namespace);
            out.push(',');
        }
        if let Some(id) = id {
            out.push_str(&id.to_string());
        }
        if let Some(data) = data {
            out.push_str(&data.to_string());
        }

        out
    }
}
