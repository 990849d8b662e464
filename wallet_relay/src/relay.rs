use {
    crate::{error::RelayError, pending::PendingRequestSlot, stats::RelayStats},
    chrono::{DateTime, Utc},
    coordinator_client::{DisconnectReason, SocketEvent},
    coordinator_rpc::{
        domain::{RequestId, UserId},
        event::{CoordinatorEvent, WcConnectionData, WcRequestData},
    },
    std::sync::Arc,
    tracing::{debug, info, warn},
};

/// What the coordinator connection reports to the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Connected,
    Disconnected(DisconnectReason),
    Event(SocketEvent),
}

/// Typed domain events published by the relay.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Connected,
    Disconnected(DisconnectReason),
    /// A request for the current user. `superseded` is the request it
    /// replaced in the pending slot, if any.
    NewRequest {
        request: WcRequestData,
        superseded: Option<WcRequestData>,
    },
    NewConnection(WcConnectionData),
}

/// User's decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Resolution {
    Approved,
    Rejected,
}

/// Filters coordinator events down to the current user and owns the
/// pending-request slot.
#[derive(Debug)]
pub struct RequestRelay {
    user_id: UserId,
    slot: PendingRequestSlot,
    stats: Arc<RelayStats>,
}

impl RequestRelay {
    pub fn new(user_id: UserId, stats: Arc<RelayStats>) -> Self {
        Self {
            user_id,
            slot: PendingRequestSlot::default(),
            stats,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn pending(&self) -> Option<&WcRequestData> {
        self.slot.get()
    }

    /// Processes one inbound signal. Returns the domain event to publish, or
    /// `None` when the signal is dropped.
    pub fn handle(&mut self, inbound: Inbound) -> Option<RelayEvent> {
        let event = match inbound {
            Inbound::Connected => return Some(RelayEvent::Connected),
            Inbound::Disconnected(reason) => return Some(RelayEvent::Disconnected(reason)),
            Inbound::Event(event) => event,
        };

        let event = match CoordinatorEvent::try_from_event(&event.name, event.args) {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(name = %event.name, "ignoring unsubscribed event");
                return None;
            }
            Err(err) => {
                self.stats.record_malformed();
                warn!(%err, "dropping malformed event");
                return None;
            }
        };

        if event.user_id() != &self.user_id {
            self.stats.record_foreign_user();
            debug!(event = %event.name(), "dropping event for another user");
            return None;
        }

        self.stats.record_delivered();

        match event {
            CoordinatorEvent::NewRequest(envelope) => {
                let request = envelope.data;
                let superseded = self.slot.replace(request.clone());

                // The same request delivered twice is a refresh, not an
                // overwrite.
                let superseded = superseded.filter(|old| old.id != request.id);
                if let Some(old) = &superseded {
                    self.stats.record_overwritten();
                    warn!(
                        superseded = %old.id,
                        request = %request.id,
                        "pending request replaced before resolution"
                    );
                }

                info!(
                    request = %request.id,
                    method = %request.method,
                    dapp = %request.dapp_name,
                    "new pending request"
                );

                Some(RelayEvent::NewRequest {
                    request,
                    superseded,
                })
            }
            CoordinatorEvent::NewConnection(envelope) => {
                Some(RelayEvent::NewConnection(envelope.data))
            }
        }
    }

    /// Clears the pending request after the user decided on it.
    pub fn resolve(
        &mut self,
        id: &RequestId,
        resolution: Resolution,
    ) -> Result<WcRequestData, RelayError> {
        let pending = self.slot.get().ok_or(RelayError::NoPendingRequest)?;
        if &pending.id != id {
            return Err(RelayError::RequestMismatch {
                pending: pending.id.clone(),
                requested: id.clone(),
            });
        }

        let request = self.slot.take_if(id).ok_or(RelayError::NoPendingRequest)?;
        info!(request = %request.id, %resolution, "pending request resolved");

        Ok(request)
    }

    /// Clears the pending request without a decision.
    pub fn dismiss(&mut self) -> Option<WcRequestData> {
        let request = self.slot.take();
        if let Some(request) = &request {
            debug!(request = %request.id, "pending request dismissed");
        }
        request
    }

    /// Clears the pending request if it has expired at `now`.
    pub fn clear_expired(&mut self, now: DateTime<Utc>) -> Option<WcRequestData> {
        let expired = self.slot.take_expired(now);
        if let Some(request) = &expired {
            self.stats.record_expired();
            info!(request = %request.id, "pending request expired");
        }
        expired
    }
}
