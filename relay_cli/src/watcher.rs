use {
    crate::command::{Command, HELP},
    chrono::Utc,
    coordinator_rpc::domain::UserId,
    tracing::{info, warn},
    wallet_relay::{
        ConnectedApps,
        Connector,
        Notice,
        NoticeLevel,
        RelayEvent,
        RelaySession,
        Resolution,
        ViewAction,
        ViewMode,
        ViewModeMachine,
    },
};

/// Terminal front end state: the view machine and the connected dApps of
/// the signed-in user.
#[derive(Default)]
pub struct Watcher {
    view: ViewModeMachine,
    apps: ConnectedApps,
}

impl Watcher {
    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn on_event(&mut self, event: &RelayEvent) {
        match event {
            RelayEvent::Connected => info!("coordinator connected"),
            RelayEvent::Disconnected(reason) => warn!(%reason, "coordinator disconnected"),
            RelayEvent::NewConnection(session) => {
                self.apps.insert(session.clone());
            }
            RelayEvent::NewRequest { .. } => {}
        }

        let mode = self.view.on_relay_event(event);

        if let Some(notice) = Notice::for_event(event) {
            let tag = match notice.level {
                NoticeLevel::Info => "*",
                NoticeLevel::Success => "+",
                NoticeLevel::Warning => "!",
            };
            println!("[{tag}] {}: {} (view: {mode})", notice.title, notice.body);
        }
    }

    pub async fn run<C: Connector>(&mut self, command: Command, session: &mut RelaySession<C>) {
        match command {
            Command::Scan => self.apply(ViewAction::Scan),
            Command::Uri(pairing) => {
                if pairing.is_expired(Utc::now().timestamp().max(0) as u64) {
                    println!("pairing URI has expired");
                    return;
                }
                self.apply(ViewAction::UriDetected(pairing));
            }
            Command::Close => self.close(session).await,
            Command::Approve => self.resolve(session, Resolution::Approved).await,
            Command::Reject => self.resolve(session, Resolution::Rejected).await,
            Command::Status => self.status(session).await,
            Command::User(user_id) => self.switch_user(session, user_id).await,
            Command::Help => println!("{HELP}"),
        }
    }

    /// Leaves the transaction view after its request expired.
    pub fn close_transaction(&mut self) {
        if self.view.mode() == ViewMode::Transaction {
            self.apply(ViewAction::Close);
        }
    }

    fn apply(&mut self, action: ViewAction) {
        match self.view.apply(action) {
            Ok(mode) => println!("view: {mode}"),
            Err(err) => println!("{err}"),
        }
    }

    /// Closing the transaction modal dismisses its request.
    async fn close<C: Connector>(&mut self, session: &RelaySession<C>) {
        if self.view.mode() == ViewMode::Transaction {
            if let Some(request) = session.dismiss().await {
                println!("dismissed {} ({})", request.id, request.method);
            }
        }
        self.apply(ViewAction::Close);
    }

    async fn switch_user<C: Connector>(
        &mut self,
        session: &mut RelaySession<C>,
        user_id: Option<String>,
    ) {
        let previous = session.user_id().cloned();

        if let Err(err) = session.set_user(user_id.map(UserId::from)).await {
            println!("{err}");
        }

        if session.user_id() != previous.as_ref() {
            self.view = ViewModeMachine::new();
            self.apps = ConnectedApps::new();
            println!("view: {}", self.view.mode());
        }
    }

    async fn resolve<C: Connector>(&mut self, session: &RelaySession<C>, resolution: Resolution) {
        let Some(pending) = session.pending().await else {
            println!("no pending request");
            return;
        };

        match session.resolve(&pending.id, resolution).await {
            Ok(request) => {
                println!("{resolution} {} ({})", request.id, request.method);
                self.close_transaction();
            }
            Err(err) => println!("{err}"),
        }
    }

    async fn status<C: Connector>(&self, session: &RelaySession<C>) {
        let pending = session.pending().await;
        let status = serde_json::json!({
            "user": session.user_id().map(|id| id.as_str()),
            "connected": session.is_connected(),
            "view": self.view.mode(),
            "pending": pending.map(|request| serde_json::json!({
                "id": request.id,
                "method": request.method,
                "dapp": request.dapp_name,
                "expiresAt": request.expires_at,
            })),
            "apps": self.apps.list().iter().map(|app| app.dapp_name.as_str()).collect::<Vec<_>>(),
            "stats": session.stats(),
        });

        match serde_json::to_string_pretty(&status) {
            Ok(status) => println!("{status}"),
            Err(err) => warn!(%err, "failed to render status"),
        }
    }
}
