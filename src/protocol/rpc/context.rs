//! RPC context implementation for maintaining server and client state.
//!
//! The Context module provides the state management infrastructure needed for
//! handling RPC requests. It carries the client's identity, the backend
//! serving the export, and the server-wide tables shared by all connections:
//! the duplicate request cache and the mount list.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::protocol::nfs::mount::MountTable;
use crate::protocol::xdr;
use crate::vfs;

/// Represents the execution context for RPC operations
///
/// This context is passed to all protocol handlers (NFS and MOUNT). Each
/// connection starts from its own copy, and each call overwrites `auth`
/// with the credential it carried.
#[derive(Clone)]
pub struct Context {
    /// Port number on which the server is listening
    pub local_port: u16,

    /// Client's network address (IP:port) used for logging and request tracking
    pub client_addr: String,

    /// UNIX-style authentication credentials from the client
    pub auth: xdr::rpc::auth_unix,

    /// Backend that handles the actual file operations
    pub vfs: Arc<dyn vfs::NFSFileSystem + Send + Sync>,

    /// Channel for sending mount/unmount notifications
    pub mount_signal: Option<mpsc::Sender<bool>>,

    /// Name of the exported file system available to clients
    pub export_name: Arc<String>,

    /// Duplicate request cache shared by every connection
    pub transaction_tracker: Arc<super::TransactionTracker>,

    /// Clients that currently have the export mounted
    pub mount_table: Arc<MountTable>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("rpc::Context")
            .field("local_port", &self.local_port)
            .field("client_addr", &self.client_addr)
            .field("auth", &self.auth)
            .finish()
    }
}
