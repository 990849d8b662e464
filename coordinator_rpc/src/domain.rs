use {
    derive_more::{AsRef, Display, From},
    serde::{Deserialize, Serialize},
    std::sync::Arc,
};

// Convenience macro to de-duplicate the string identifier newtypes.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, From, AsRef,
        )]
        #[serde(transparent)]
        #[as_ref(forward)]
        pub struct $name(Arc<str>);

        impl $name {
            pub fn new(value: impl Into<Arc<str>>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.into())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value.into())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.as_str() == other
            }
        }
    };
}

string_id! {
    /// Identifier of the wallet user the coordinator addresses an event to.
    UserId
}

string_id! {
    /// WalletConnect session topic. Unique per connected dApp.
    Topic
}

string_id! {
    /// Coordinator-side identifier of a pending request record.
    RequestId
}

string_id! {
    /// Coordinator-side identifier of the WalletConnect session a request
    /// belongs to.
    SessionId
}

/// Chain identifier as sent by the coordinator.
///
/// EVM chains usually arrive as a bare number, CAIP-2 chains as
/// `namespace:reference`.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(untagged)]
pub enum ChainId {
    Numeric(u64),
    Caip2(String),
}

impl ChainId {
    /// Returns the CAIP-2 form, assuming `eip155` for numeric ids.
    pub fn to_caip2(&self) -> String {
        match self {
            Self::Numeric(id) => format!("eip155:{id}"),
            Self::Caip2(id) => id.clone(),
        }
    }
}

/// JSON-RPC id of the dApp request, echoed back on resolution.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(untagged)]
pub enum RpcId {
    Numeric(u64),
    Text(String),
}
