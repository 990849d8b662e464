//! Presentation of relay events as transient notices. The front end decides
//! whether and how to show them.

use {
    crate::relay::RelayEvent,
    serde::Serialize,
    std::time::Duration,
};

const REQUEST_NOTICE_TTL: Duration = Duration::from_secs(4);
const CONNECTION_NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub body: String,
    #[serde(skip)]
    pub ttl: Duration,
}

impl Notice {
    /// Notice for a relay event, if the event warrants one. Connection
    /// lifecycle changes stay silent.
    pub fn for_event(event: &RelayEvent) -> Option<Self> {
        match event {
            RelayEvent::NewRequest {
                request,
                superseded,
            } => {
                let (level, body) = match superseded {
                    Some(old) => (
                        NoticeLevel::Warning,
                        format!(
                            "{} (replaces pending {} from {})",
                            request.method, old.method, old.dapp_name
                        ),
                    ),
                    None => (NoticeLevel::Info, request.method.clone()),
                };

                Some(Self {
                    level,
                    title: format!("New request from {}", request.dapp_name),
                    body,
                    ttl: REQUEST_NOTICE_TTL,
                })
            }
            RelayEvent::NewConnection(session) => Some(Self {
                level: NoticeLevel::Success,
                title: format!("Connected to {}", session.dapp_name),
                body: session.dapp_url.clone(),
                ttl: CONNECTION_NOTICE_TTL,
            }),
            RelayEvent::Connected | RelayEvent::Disconnected(_) => None,
        }
    }
}
