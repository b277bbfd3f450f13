//! Protocol module implements the NFS version 2 protocol suite as specified in RFC 1094.
//!
//! This module contains three main components:
//!
//! - `xdr`: External Data Representation (XDR) for serialization and deserialization
//!   of data structures according to RFC 1832.
//!
//! - `nfs`: The NFS version 2 procedure engine and the MOUNT protocol.
//!
//! - `rpc`: Remote Procedure Call (RPC) message handling, duplicate request
//!   detection and per-connection context as defined in RFC 5531.
//!
//! NFS is stateless: every object is named by an opaque file handle, and
//! every request carries everything needed to serve it.

pub mod nfs;
pub mod rpc;
pub mod xdr;
