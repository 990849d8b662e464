use {
    coordinator_rpc::{domain::Topic, event::WcConnectionData},
    std::collections::HashMap,
    tracing::info,
};

/// dApps linked to the wallet, keyed by session topic.
#[derive(Debug, Default)]
pub struct ConnectedApps {
    sessions: HashMap<Topic, WcConnectionData>,
}

impl ConnectedApps {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new connection. A repeated topic replaces the stored
    /// session, which is returned.
    pub fn insert(&mut self, session: WcConnectionData) -> Option<WcConnectionData> {
        info!(topic = %session.topic, dapp = %session.dapp_name, "dApp connected");
        self.sessions.insert(session.topic.clone(), session)
    }

    pub fn get(&self, topic: &Topic) -> Option<&WcConnectionData> {
        self.sessions.get(topic)
    }

    /// Forgets a session after the backend reports it gone.
    pub fn remove(&mut self, topic: &Topic) -> Option<WcConnectionData> {
        self.sessions.remove(topic)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Sessions, most recently connected first.
    pub fn list(&self) -> Vec<&WcConnectionData> {
        let mut sessions = self.sessions.values().collect::<Vec<_>>();
        sessions.sort_by(|a, b| b.connected_at.cmp(&a.connected_at));
        sessions
    }
}
