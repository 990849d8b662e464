pub mod connector;
pub mod error;
pub mod notice;
mod pairing_uri;
pub mod pending;
pub mod relay;
pub mod session;
pub mod sessions;
pub mod stats;
pub mod view;

#[cfg(test)]
mod test_support;

pub use {
    connector::{Connection, Connector, SocketConnector},
    error::RelayError,
    notice::{Notice, NoticeLevel},
    pairing_uri::{ParseError, Pairing, PairingParams},
    relay::{Inbound, RelayEvent, RequestRelay, Resolution},
    session::RelaySession,
    sessions::ConnectedApps,
    stats::{RelayStats, StatsSnapshot},
    view::{TransitionError, ViewAction, ViewMode, ViewModeMachine},
};
