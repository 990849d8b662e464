//! Exclusive UI focus for the WalletConnect screen.
//!
//! ```text
//!   apps ──scan──▶ scanner ──uri──▶ connection
//!    ▲  ╲                              │
//!    │   ╲───────────uri (deep link)───┘
//!    │                                 │
//!    └────────────close────────────────┘
//!
//!   any ──request──▶ transaction ──close──▶ apps
//! ```

use {
    crate::{pairing_uri::Pairing, relay::RelayEvent},
    serde::Serialize,
    tracing::debug,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Apps,
    Scanner,
    Connection,
    Transaction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewAction {
    /// User opened the QR scanner.
    Scan,
    /// A pairing URI was scanned or arrived through a deep link.
    UriDetected(Pairing),
    /// A request for the current user arrived.
    RequestReceived,
    /// The active modal or scanner was closed.
    Close,
}

impl ViewAction {
    fn name(&self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::UriDetected(_) => "uri_detected",
            Self::RequestReceived => "request_received",
            Self::Close => "close",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Cannot apply {action} in {from} view")]
pub struct TransitionError {
    pub from: ViewMode,
    pub action: &'static str,
}

/// View-mode state machine. Starts in [`ViewMode::Apps`] and has no
/// terminal state.
#[derive(Debug, Default)]
pub struct ViewModeMachine {
    mode: ViewMode,
    pairing: Option<Pairing>,
}

impl ViewModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// Pairing shown by the connection view.
    pub fn pairing(&self) -> Option<&Pairing> {
        self.pairing.as_ref()
    }

    pub fn apply(&mut self, action: ViewAction) -> Result<ViewMode, TransitionError> {
        let from = self.mode;

        let to = match (from, action) {
            (ViewMode::Apps | ViewMode::Scanner, ViewAction::Scan) => ViewMode::Scanner,
            (ViewMode::Apps | ViewMode::Scanner, ViewAction::UriDetected(pairing)) => {
                self.pairing = Some(pairing);
                ViewMode::Connection
            }
            // A live request interrupts whatever is on screen.
            (_, ViewAction::RequestReceived) => {
                self.pairing = None;
                ViewMode::Transaction
            }
            (_, ViewAction::Close) => {
                self.pairing = None;
                ViewMode::Apps
            }
            (from, action) => {
                return Err(TransitionError {
                    from,
                    action: action.name(),
                })
            }
        };

        debug!(%from, %to, "view transition");
        self.mode = to;

        Ok(to)
    }

    /// Feeds a relay event into the machine. Only new requests move the
    /// view.
    pub fn on_relay_event(&mut self, event: &RelayEvent) -> ViewMode {
        if let RelayEvent::NewRequest { .. } = event {
            // Always allowed.
            self.apply(ViewAction::RequestReceived).ok();
        }
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use {super::*, crate::test_support::request, std::str::FromStr};

    fn pairing() -> Pairing {
        Pairing::from_str(
            "wc:c9e6d30fb34afe70a15c14e9337ba8e4d5a35dd695c39b94884b0ee60c69d168@2?\
             relay-protocol=irn&\
             symKey=7ff3e362f825ab868e20e767fe580d0311181632707e7c878cbeca0238d45b8b",
        )
        .unwrap()
    }

    #[test]
    fn scan_connect_close() {
        let mut view = ViewModeMachine::new();
        assert_eq!(view.mode(), ViewMode::Apps);

        assert_eq!(view.apply(ViewAction::Scan), Ok(ViewMode::Scanner));
        assert_eq!(
            view.apply(ViewAction::UriDetected(pairing())),
            Ok(ViewMode::Connection)
        );
        assert_eq!(view.pairing(), Some(&pairing()));
        assert_eq!(view.apply(ViewAction::Close), Ok(ViewMode::Apps));
        assert_eq!(view.pairing(), None);
    }

    #[test]
    fn deep_link_from_apps() {
        let mut view = ViewModeMachine::new();
        assert_eq!(
            view.apply(ViewAction::UriDetected(pairing())),
            Ok(ViewMode::Connection)
        );
    }

    #[test]
    fn request_interrupts_any_view() {
        for setup in [
            vec![],
            vec![ViewAction::Scan],
            vec![ViewAction::Scan, ViewAction::UriDetected(pairing())],
            vec![ViewAction::RequestReceived],
        ] {
            let mut view = ViewModeMachine::new();
            for action in setup {
                view.apply(action).unwrap();
            }

            assert_eq!(
                view.apply(ViewAction::RequestReceived),
                Ok(ViewMode::Transaction)
            );
            assert_eq!(view.pairing(), None);
            assert_eq!(view.apply(ViewAction::Close), Ok(ViewMode::Apps));
        }
    }

    #[test]
    fn rejected_transitions() {
        let mut view = ViewModeMachine::new();
        view.apply(ViewAction::RequestReceived).unwrap();

        assert_eq!(
            view.apply(ViewAction::Scan),
            Err(TransitionError {
                from: ViewMode::Transaction,
                action: "scan",
            })
        );
        assert!(view.apply(ViewAction::UriDetected(pairing())).is_err());
        assert_eq!(view.mode(), ViewMode::Transaction);

        let mut view = ViewModeMachine::new();
        view.apply(ViewAction::UriDetected(pairing())).unwrap();
        assert!(view.apply(ViewAction::Scan).is_err());
        assert_eq!(view.mode(), ViewMode::Connection);
    }

    #[test]
    fn relay_events() {
        let mut view = ViewModeMachine::new();
        view.apply(ViewAction::Scan).unwrap();

        assert_eq!(view.on_relay_event(&RelayEvent::Connected), ViewMode::Scanner);
        assert_eq!(
            view.on_relay_event(&RelayEvent::NewRequest {
                request: request("u1", "r1"),
                superseded: None,
            }),
            ViewMode::Transaction
        );
    }
}
