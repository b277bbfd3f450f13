//! A Network File System (NFS) version 2 server implementation in Rust
//!
//! This library implements the NFS version 2 protocol as defined in RFC 1094,
//! allowing any Rust application to expose a file system over the network to
//! NFS clients.
//!
//! ## Supported Features
//!
//! - All 18 NFS version 2 procedures
//! - MOUNT protocol version 1 for obtaining the root handle
//! - ONC RPC over TCP with a duplicate request cache
//! - Asynchronous operation with Tokio runtime
//! - Virtual File System abstraction for implementing custom backends
//!
//! ## Main Components
//!
//! - `vfs`: The API that must be implemented to create a custom NFS-exportable
//!   file system. This abstracts the underlying storage from the NFS protocol details.
//!
//! - `protocol`: The protocol engine. `protocol::nfs::v2::handle_call` runs one
//!   procedure against a backend from raw argument bytes, independent of any
//!   transport. The module also holds the MOUNT handlers, the RPC layer and
//!   the XDR codec.
//!
//! - `tcp`: TCP-based server that frames RPC messages and dispatches them
//!   to the protocol handlers.
//!
//! ## Standards Compliance
//!
//! This implementation follows these RFCs:
//! - RFC 1094: NFS: Network File System Protocol Specification (version 2)
//! - RFC 5531: RPC: Remote Procedure Call Protocol Specification Version 2 (obsoletes RFC 1831)
//! - RFC 1832: XDR: External Data Representation Standard (obsoletes RFC 1014)
//!
//! ## Usage
//!
//! To create an NFS server, implement the `NFSFileSystem` trait and use the `NFSTcpListener`
//! to expose it over the network.

pub mod protocol;
mod write_counter;

pub mod tcp;
pub mod vfs;

pub use protocol::xdr;
