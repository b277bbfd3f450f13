//! RPC (Remote Procedure Call) protocol implementation as specified in RFC 5531 (previously RFC 1057).
//!
//! The RPC protocol enables programs to call procedures on remote systems as if
//! they were local calls. It forms the foundation for all NFS operations by
//! providing a standard mechanism for client-server communication.
//!
//! This module implements RPC version 2 with the following features:
//!
//! 1. Message framing for TCP using the Record Marking Standard
//! 2. A duplicate request cache that replays replies to retransmitted calls
//! 3. Authentication (AUTH_UNIX)
//! 4. Program/procedure number dispatching
//! 5. In-order processing of the records of each connection
//!
//! The implementation in this module serves as the communication layer for
//! the NFS and MOUNT protocols.

mod context;
mod record_queue;
mod transaction_tracker;
mod wire;

pub use context::Context;
pub use transaction_tracker::{Transaction, TransactionTracker};
pub use wire::{handle_rpc, write_fragment, SocketMessageHandler};

/// Largest RPC record accepted from a client.
///
/// A WRITE carries at most 8 KiB of data, so anything far beyond that is
/// either garbage or hostile.
pub const MAX_RPC_RECORD_LENGTH: usize = 64 * 1024;
