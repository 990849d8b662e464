//! Application events the coordinator fans out to every connected client.

use {
    crate::domain::{ChainId, RequestId, RpcId, SessionId, Topic, UserId},
    chrono::{DateTime, Utc},
    serde::{de::DeserializeOwned, Deserialize, Serialize},
    serde_json::Value,
    strum::{AsRefStr, Display, EnumString},
};

/// Errors covering event payload conversion issues.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Failure deserializing {event} payload: {source}")]
    Payload {
        event: EventName,
        #[source]
        source: serde_json::Error,
    },
    #[error("Event {0} carries no payload")]
    MissingPayload(EventName),
}

/// Event names on the coordinator channel.
///
/// `connect` and `disconnect` are Socket.IO lifecycle names and never arrive
/// as event packets; they are listed so handlers can share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
pub enum EventName {
    #[strum(serialize = "connect")]
    Connect,
    #[strum(serialize = "disconnect")]
    Disconnect,
    #[strum(serialize = "NEW_REQUEST")]
    NewRequest,
    #[strum(serialize = "NEW_CONNECTION")]
    NewConnection,
}

/// Common wrapper around every coordinator event payload.
///
/// `user_id` is the addressee; the coordinator broadcasts to all clients and
/// leaves filtering to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub message: String,
    pub user_id: UserId,
    pub data: T,
}

/// A dApp request waiting for the user's decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WcRequestData {
    pub id: RequestId,
    pub request_id: RpcId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub user_address: String,
    pub method: String,
    #[serde(default)]
    pub params: Vec<Value>,
    pub chain_id: ChainId,
    pub dapp_name: String,
    pub dapp_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dapp_icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl WcRequestData {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// A dApp that has just been linked to the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WcConnectionData {
    pub topic: Topic,
    pub dapp_name: String,
    pub dapp_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dapp_icon: Option<String>,
    pub chain_id: ChainId,
    pub connected_at: DateTime<Utc>,
}

/// Typed coordinator event.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    NewRequest(Envelope<WcRequestData>),
    NewConnection(Envelope<WcConnectionData>),
}

impl CoordinatorEvent {
    /// Converts a raw Socket.IO event into a typed coordinator event.
    ///
    /// Returns `Ok(None)` for event names this client does not subscribe to.
    /// Only the first argument of the event is considered.
    pub fn try_from_event(name: &str, args: Vec<Value>) -> Result<Option<Self>, EventError> {
        let Ok(name) = name.parse::<EventName>() else {
            return Ok(None);
        };

        let payload = args.into_iter().next();

        match name {
            EventName::NewRequest => Ok(Some(Self::NewRequest(decode(name, payload)?))),
            EventName::NewConnection => Ok(Some(Self::NewConnection(decode(name, payload)?))),
            EventName::Connect | EventName::Disconnect => Ok(None),
        }
    }

    pub fn name(&self) -> EventName {
        match self {
            Self::NewRequest(_) => EventName::NewRequest,
            Self::NewConnection(_) => EventName::NewConnection,
        }
    }

    /// Addressee of the event.
    pub fn user_id(&self) -> &UserId {
        match self {
            Self::NewRequest(envelope) => &envelope.user_id,
            Self::NewConnection(envelope) => &envelope.user_id,
        }
    }
}

fn decode<T: DeserializeOwned>(
    event: EventName,
    payload: Option<Value>,
) -> Result<Envelope<T>, EventError> {
    let payload = payload.ok_or(EventError::MissingPayload(event))?;
    serde_json::from_value(payload).map_err(|source| EventError::Payload { event, source })
}
