use {coordinator_client::error::ClientError, coordinator_rpc::domain::RequestId};

/// Errors surfaced by the relay session.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Failed to connect to coordinator: {0}")]
    Connect(#[from] ClientError),

    #[error("No pending request")]
    NoPendingRequest,

    #[error("Pending request is {pending}, not {requested}")]
    RequestMismatch {
        pending: RequestId,
        requested: RequestId,
    },

    #[error("No user signed in")]
    NoUser,
}
