// topic = "7f6e504bfad60b485450578e05678ed3e8e8c4751d3c6160be17160d63ec90f9"
// version = 2
// symKey = "587d5484ce2a2a6ee3ba1962fdd7e8588e06200c46823bd18fbd67def96ad303"
// methods = [wc_sessionPropose],[wc_authRequest,wc_authBatchRequest]
// relay = { protocol: "irn", data: "" }
// Required

// symKey (STRING) = symmetric key used for pairing encryption
// relay-protocol (STRING) = protocol name used for relay
// Optional

// methods (STRING) = comma separated array of inner arrays of methods
// relay-data (STRING) = hex data payload used for relay
// expiryTimestamp (UINT) = unix timestamp in seconds

use {
    lazy_static::lazy_static,
    regex::Regex,
    std::{collections::HashMap, str::FromStr},
    thiserror::Error,
    url::Url,
};

lazy_static! {
    static ref TOPIC_VERSION_REGEX: Regex =
        Regex::new(r"^(?P<topic>[[:word:]-]+)@(?P<version>\d+)$").expect("Failed to compile regex");
}

const SYM_KEY_LENGTH: usize = 32;

/// Query parameters carrying an encoded pairing URI in wallet deep links,
/// e.g. `https://wallet.example/wc?uri=wc%3A...`.
const DEEP_LINK_PARAMS: &[&str] = &["uri", "wc"];

#[derive(Clone, PartialEq, Eq)]
pub struct PairingParams {
    pub sym_key: Vec<u8>,
    pub relay_protocol: String,
    pub relay_data: Option<String>,
    pub methods: Vec<Vec<String>>,
    pub expiry_timestamp: Option<u64>,
}

/// WalletConnect pairing URI, as found in QR codes and deep links.
#[derive(Clone, PartialEq, Eq)]
pub struct Pairing {
    pub topic: String,
    pub version: String,
    pub params: PairingParams,
}

impl std::fmt::Debug for Pairing {
    /// Debug with key masked.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WCPairingUrl")
            .field("topic", &self.topic)
            .field("version", &self.version)
            .field("relay-protocol", &self.params.relay_protocol)
            .field("key", &"***")
            .field(
                "relay-data",
                &self.params.relay_data.as_deref().unwrap_or(""),
            )
            .field("expiry", &self.params.expiry_timestamp)
            .finish()
    }
}

impl FromStr for Pairing {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::from_str(s.trim()).map_err(|err| ParseError::InvalidData(err.to_string()))?;
        if url.scheme() != "wc" {
            return Result::Err(ParseError::UnexpectedProtocol(url.scheme().to_owned()));
        }

        let (topic, version) = Self::try_topic_and_version_from_path(url.path())?;
        let params = Self::try_params_from_url(&url)?;

        Ok(Self {
            topic,
            version,
            params,
        })
    }
}

impl Pairing {
    /// Looks for a pairing URI in scanned or deep-linked input.
    ///
    /// Accepts a bare `wc:` URI or any URL carrying one in its `uri`/`wc`
    /// query parameter. Anything else yields `None`.
    pub fn detect(input: &str) -> Option<Self> {
        let input = input.trim();
        if let Ok(pairing) = Self::from_str(input) {
            return Some(pairing);
        }

        let url = Url::parse(input).ok()?;
        url.query_pairs()
            .filter(|(key, _)| DEEP_LINK_PARAMS.contains(&key.as_ref()))
            .find_map(|(_, value)| Self::from_str(&value).ok())
    }

    /// Whether the pairing offer has lapsed. Offers without an expiry never
    /// lapse.
    pub fn is_expired(&self, now_secs: u64) -> bool {
        self.params
            .expiry_timestamp
            .is_some_and(|expiry| expiry <= now_secs)
    }

    fn try_topic_and_version_from_path(path: &str) -> Result<(String, String), ParseError> {
        let caps = TOPIC_VERSION_REGEX
            .captures(path)
            .ok_or(ParseError::InvalidTopicAndVersion)?;

        let topic = caps
            .name("topic")
            .ok_or(ParseError::TopicNotFound)?
            .as_str()
            .to_owned();

        let version = caps
            .name("version")
            .ok_or(ParseError::VersionNotFound)?
            .as_str()
            .to_owned();

        Ok((topic, version))
    }

    /// Try to parse WalletConnect pairing url
    fn try_params_from_url(url: &Url) -> Result<PairingParams, ParseError> {
        let mut params = HashMap::new();
        let queries = url.query_pairs();

        for (key, value) in queries {
            let sanitized_key: String = key
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect();
            if let Some(existing) = params.insert(sanitized_key.to_string(), value.to_string()) {
                return Err(ParseError::UnexpectedParameter(key.into_owned(), existing));
            }
        }

        let relay_protocol = params
            .remove("relay-protocol")
            .ok_or(ParseError::RelayProtocolNotFound)?;

        let sym_key = params
            .remove("symKey")
            .ok_or(ParseError::KeyNotFound)
            .and_then(|key| hex::decode(key).map_err(ParseError::InvalidSymKey))?;
        if sym_key.len() != SYM_KEY_LENGTH {
            return Err(ParseError::SymKeyLength(sym_key.len()));
        }

        let relay_data = params.remove("relay-data");
        let methods = params
            .remove("methods")
            .map(|methods| parse_methods(&methods))
            .unwrap_or_default();
        let expiry_timestamp = params
            .remove("expiryTimestamp")
            .map(|t| t.parse::<u64>().map_err(|_| ParseError::InvalidExpiry(t)))
            .transpose()?;

        if let Some((key, value)) = params.into_iter().next() {
            return Err(ParseError::UnexpectedParameter(key, value));
        }

        Ok(PairingParams {
            sym_key,
            relay_protocol,
            relay_data,
            methods,
            expiry_timestamp,
        })
    }
}

/// Parses `[a,b],[c]` method groups.
fn parse_methods(methods: &str) -> Vec<Vec<String>> {
    let trimmed = methods.trim_matches(|c| c == '[' || c == ']');
    if trimmed.is_empty() {
        return vec![];
    }

    trimmed
        .split("],[")
        .map(|group| {
            group
                .split(',')
                .map(str::trim)
                .filter(|method| !method.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .collect()
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid topic and version format")]
    InvalidTopicAndVersion,
    #[error("Topic not found")]
    TopicNotFound,
    #[error("Version not found")]
    VersionNotFound,
    #[error("Relay protocol not found")]
    RelayProtocolNotFound,
    #[error("Symmetric key not found")]
    KeyNotFound,
    #[error("Invalid symmetric key: {0}")]
    InvalidSymKey(#[from] hex::FromHexError),
    #[error("Symmetric key must be 32 bytes, got {0}")]
    SymKeyLength(usize),
    #[error("Invalid expiry timestamp: {0}")]
    InvalidExpiry(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Unexpected parameter: {0} = {1}")]
    UnexpectedParameter(String, String),
    #[error("Unexpected protocol: {0}")]
    UnexpectedProtocol(String),
}
