//! Wire types for the WalletConnect coordinator channel.
//!
//! The coordinator speaks Socket.IO (protocol v5) on top of Engine.IO
//! (protocol v4). [`packet`] covers that framing, [`event`] covers the
//! application events carried inside it, and [`domain`] holds the identifier
//! newtypes shared by both.

pub mod domain;
pub mod event;
pub mod packet;

/// Engine.IO protocol revision sent in the `EIO` handshake query parameter.
pub const ENGINE_IO_VERSION: u8 = 4;

/// Default Socket.IO mount point on the coordinator.
pub const SOCKET_IO_PATH: &str = "/socket.io";

/// Default Socket.IO namespace.
pub const DEFAULT_NAMESPACE: &str = "/";
