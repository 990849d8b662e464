use {
    chrono::{DateTime, Utc},
    coordinator_rpc::{domain::RequestId, event::WcRequestData},
};

/// Holds at most one outstanding dApp request.
///
/// Writes are last-write-wins: a newer request replaces the held one and the
/// replaced request is handed back to the caller.
#[derive(Debug, Default)]
pub struct PendingRequestSlot {
    current: Option<WcRequestData>,
}

impl PendingRequestSlot {
    pub fn get(&self) -> Option<&WcRequestData> {
        self.current.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    /// Stores `request`, returning the request it replaced.
    pub fn replace(&mut self, request: WcRequestData) -> Option<WcRequestData> {
        self.current.replace(request)
    }

    pub fn take(&mut self) -> Option<WcRequestData> {
        self.current.take()
    }

    /// Clears the slot only if it holds the request with `id`.
    pub fn take_if(&mut self, id: &RequestId) -> Option<WcRequestData> {
        if self.current.as_ref().is_some_and(|request| &request.id == id) {
            self.current.take()
        } else {
            None
        }
    }

    /// Clears the slot if the held request has expired at `now`.
    pub fn take_expired(&mut self, now: DateTime<Utc>) -> Option<WcRequestData> {
        if self
            .current
            .as_ref()
            .is_some_and(|request| request.is_expired(now))
        {
            self.current.take()
        } else {
            None
        }
    }
}
