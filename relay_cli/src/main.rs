//! Watches the coordinator for one user's WalletConnect requests and drives
//! the wallet view from the terminal.

use {
    crate::{
        command::{Command, HELP},
        watcher::Watcher,
    },
    chrono::Utc,
    clap::Parser,
    coordinator_client::{Authorization, ConnectionOptions, Transport},
    coordinator_rpc::{domain::UserId, SOCKET_IO_PATH},
    std::{io, time::Duration},
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
    wallet_relay::{RelaySession, SocketConnector},
};

mod command;
mod watcher;

#[derive(Parser, Debug)]
#[command(name = "relay-watch", about = "Watch pending WalletConnect requests")]
struct Args {
    /// Coordinator origin, e.g. `https://coordinator.example`.
    #[arg(short, long, env = "RELAY_ADDRESS")]
    address: String,

    /// Socket.IO endpoint path.
    #[arg(long, env = "RELAY_PATH", default_value = SOCKET_IO_PATH)]
    path: String,

    /// User to watch. Without it the watcher stays disconnected until
    /// `user <id>` is entered.
    #[arg(short, long, env = "RELAY_USER_ID")]
    user_id: Option<String>,

    /// Transports to try, in order.
    #[arg(
        long,
        env = "RELAY_TRANSPORTS",
        value_delimiter = ',',
        default_value = "websocket,polling"
    )]
    transports: Vec<Transport>,

    /// Token sent with the handshake.
    #[arg(long, env = "RELAY_AUTH_TOKEN")]
    auth_token: Option<String>,

    /// Send the token as an `Authorization` header instead of the `auth`
    /// query parameter.
    #[arg(long, env = "RELAY_AUTH_HEADER")]
    auth_header: bool,

    /// `Origin` header for the handshake.
    #[arg(long, env = "RELAY_ORIGIN")]
    origin: Option<String>,

    /// Seconds to wait for the handshake. 0 waits indefinitely.
    #[arg(long, env = "RELAY_CONNECT_TIMEOUT", default_value_t = 10)]
    connect_timeout: u64,
}

impl Args {
    fn connection_options(&self) -> ConnectionOptions {
        let auth = self.auth_token.clone().map(|token| {
            if self.auth_header {
                Authorization::Header(token)
            } else {
                Authorization::Query(token)
            }
        });
        let timeout = (self.connect_timeout > 0).then(|| Duration::from_secs(self.connect_timeout));

        ConnectionOptions::new(self.address.clone())
            .with_path(self.path.clone())
            .with_transports(self.transports.clone())
            .with_auth(auth)
            .with_origin(self.origin.clone())
            .with_connect_timeout(timeout)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let (mut session, mut events) =
        RelaySession::new(SocketConnector::new(args.connection_options()));
    if let Err(err) = session.set_user(args.user_id.clone().map(UserId::from)).await {
        warn!(%err, "continuing without live updates");
    }

    let mut watcher = Watcher::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut expiry = tokio::time::interval(Duration::from_secs(1));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    println!("{HELP}");

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            event = events.recv() => match event {
                Some(event) => watcher.on_event(&event),
                None => break,
            },

            line = lines.next_line() => match parse_input(line)? {
                Input::Command(command) => watcher.run(command, &mut session).await,
                Input::Ignored => {}
                Input::End => break,
            },

            _ = expiry.tick() => {
                if let Some(request) = session.clear_expired(Utc::now()).await {
                    println!("request {} from {} expired", request.id, request.dapp_name);
                    watcher.close_transaction();
                }
            }
        }
    }

    session.close();
    info!("watcher stopped");

    Ok(())
}

enum Input {
    Command(Command),
    Ignored,
    End,
}

fn parse_input(line: io::Result<Option<String>>) -> io::Result<Input> {
    match line {
        Ok(None) => Ok(Input::End),
        Ok(Some(line)) if line.trim().is_empty() => Ok(Input::Ignored),
        Ok(Some(line)) => match line.parse() {
            Ok(command) => Ok(Input::Command(command)),
            Err(err) => {
                println!("{err}");
                Ok(Input::Ignored)
            }
        },
        // The reader has already consumed the offending line.
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            warn!(%err, "skipping unreadable input line");
            Ok(Input::Ignored)
        }
        Err(err) => Err(err),
    }
}
