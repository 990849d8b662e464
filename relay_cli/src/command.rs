use {std::str::FromStr, wallet_relay::Pairing};

/// A line typed on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan,
    Uri(Pairing),
    Approve,
    Reject,
    Close,
    Status,
    /// Switch the signed-in user. `None` signs out.
    User(Option<String>),
    Help,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Not a WalletConnect URI: {0}")]
    NotPairingUri(String),

    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
            None => (line, None),
        };

        Ok(match name {
            "scan" => Self::Scan,
            "uri" => {
                let arg = arg.ok_or(CommandError::MissingArgument("uri"))?;
                let pairing =
                    Pairing::detect(arg).ok_or_else(|| CommandError::NotPairingUri(arg.into()))?;
                Self::Uri(pairing)
            }
            "approve" => Self::Approve,
            "reject" => Self::Reject,
            "close" => Self::Close,
            "status" => Self::Status,
            "user" => Self::User(arg.map(Into::into)),
            "logout" => Self::User(None),
            "help" | "?" => Self::Help,
            other => return Err(CommandError::Unknown(other.into())),
        })
    }
}

pub const HELP: &str = "\
commands:
  scan             open the scanner
  uri <wc:...>     pair with a WalletConnect URI or deep link
  approve          approve the pending request
  reject           reject the pending request
  close            close the current view
  status           print view, pending request and counters
  user [id]        switch user, or sign out without an id
  logout           sign out";
