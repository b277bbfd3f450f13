//! NFS version 2 protocol engine as specified in RFC 1094.
//!
//! This module implements all 18 procedure calls defined in the NFS version 2 protocol:
//!
//! 0. NULL - Do nothing (ping the server)
//! 1. GETATTR - Get file attributes
//! 2. SETATTR - Set file attributes
//! 3. ROOT - Obsolete, answered with an empty success
//! 4. LOOKUP - Look up file name
//! 5. READLINK - Read from symbolic link
//! 6. READ - Read from file
//! 7. WRITECACHE - Obsolete, answered with an empty success
//! 8. WRITE - Write to file
//! 9. CREATE - Create a file
//! 10. REMOVE - Remove a file
//! 11. RENAME - Rename a file or directory
//! 12. LINK - Create a hard link
//! 13. SYMLINK - Create a symbolic link
//! 14. MKDIR - Create a directory
//! 15. RMDIR - Remove a directory
//! 16. READDIR - Read from directory
//! 17. STATFS - Get file system statistics
//!
//! The engine itself is stateless: [`handle_call`] takes a procedure number and
//! the raw argument bytes, runs the matching handler against a backend and returns
//! the raw result bytes. [`handle_nfs`] wraps it into the RPC layer, adding the
//! reply header and translating engine errors into RPC accept statuses.

use std::io::{Cursor, Read, Write};

use num_traits::cast::FromPrimitive;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::protocol::rpc;
use crate::protocol::xdr::rpc::{accept_body, rpc_msg};
use crate::protocol::xdr::{self, nfs2, Deserialize, Serialize};
use crate::vfs::{self, BackendError, NFSFileSystem};

mod create;
mod getattr;
mod link;
mod lookup;
mod mkdir;
mod null;
mod read;
mod readdir;
mod readlink;
mod remove;
mod rename;
mod rmdir;
mod root;
mod setattr;
mod statfs;
mod symlink;
mod write;
mod writecache;

use create::nfsproc_create;
use getattr::nfsproc_getattr;
use link::nfsproc_link;
use lookup::nfsproc_lookup;
use mkdir::nfsproc_mkdir;
use null::nfsproc_null;
use read::nfsproc_read;
use readdir::nfsproc_readdir;
use readlink::nfsproc_readlink;
use remove::nfsproc_remove;
use rename::nfsproc_rename;
use rmdir::nfsproc_rmdir;
use root::nfsproc_root;
use setattr::nfsproc_setattr;
use statfs::nfsproc_statfs;
use symlink::nfsproc_symlink;
use write::nfsproc_write;
use writecache::nfsproc_writecache;

/// Failure of a single procedure call that cannot be expressed as an `nfsstat`.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The procedure number is outside 0..=17
    #[error("unknown NFS procedure {0}")]
    UnknownProcedure(u32),
    /// The call arguments could not be decoded. [`handle_call`] answers this
    /// itself with `NFSERR_IO`, so it never escapes the engine.
    #[error("failed to decode arguments: {0}")]
    Decode(#[source] xdr::Error),
    /// The result could not be encoded
    #[error("failed to encode result: {0}")]
    Encode(#[from] xdr::Error),
}

/// Runs one NFS version 2 procedure against `fs`.
///
/// # Arguments
///
/// * `fs` - Backend serving the call
/// * `procedure` - Procedure number from the RPC call header
/// * `payload` - XDR-encoded procedure arguments
///
/// # Returns
///
/// * `Result<Vec<u8>, DispatchError>` - The XDR-encoded result body. Backend
///   failures and undecodable arguments are encoded as a failure status, not
///   returned as errors.
pub async fn handle_call<F>(
    fs: &F,
    procedure: u32,
    payload: &[u8],
) -> Result<Vec<u8>, DispatchError>
where
    F: NFSFileSystem + ?Sized,
{
    let Some(prog) = nfs2::NFSProgram::from_u32(procedure) else {
        warn!("Unknown NFS procedure {}", procedure);
        return Err(DispatchError::UnknownProcedure(procedure));
    };

    let mut input = Cursor::new(payload);
    let mut output = Vec::new();
    let res = match prog {
        nfs2::NFSProgram::NFSPROC_NULL => nfsproc_null(&mut output),
        nfs2::NFSProgram::NFSPROC_GETATTR => nfsproc_getattr(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_SETATTR => nfsproc_setattr(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_ROOT => nfsproc_root(&mut output),
        nfs2::NFSProgram::NFSPROC_LOOKUP => nfsproc_lookup(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_READLINK => nfsproc_readlink(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_READ => nfsproc_read(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_WRITECACHE => nfsproc_writecache(&mut output),
        nfs2::NFSProgram::NFSPROC_WRITE => nfsproc_write(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_CREATE => nfsproc_create(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_REMOVE => nfsproc_remove(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_RENAME => nfsproc_rename(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_LINK => nfsproc_link(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_SYMLINK => nfsproc_symlink(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_MKDIR => nfsproc_mkdir(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_RMDIR => nfsproc_rmdir(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_READDIR => nfsproc_readdir(&mut input, &mut output, fs).await,
        nfs2::NFSProgram::NFSPROC_STATFS => nfsproc_statfs(&mut input, &mut output, fs).await,
    };

    match res {
        Ok(()) => Ok(output),
        Err(DispatchError::Decode(err)) => {
            warn!("{:?}: undecodable arguments: {}", prog, err);
            output.clear();
            nfs2::nfsstat::NFSERR_IO.serialize(&mut output)?;
            Ok(output)
        }
        Err(err) => {
            error!("{:?} failed: {}", prog, err);
            Err(err)
        }
    }
}

/// Main handler for NFS version 2 calls arriving over RPC
///
/// Validates the protocol version, hands the rest of the message to
/// [`handle_call`] and prefixes its result with an RPC success header.
///
/// # Arguments
///
/// * `xid` - Transaction ID from the RPC call
/// * `call` - The RPC call body containing program, version, and procedure numbers
/// * `input` - Input stream positioned at the procedure arguments
/// * `output` - Output stream for writing the complete reply
/// * `context` - Server context containing the VFS and other state
///
/// # Returns
///
/// * `Result<(), anyhow::Error>` - Ok(()) on success or an error
pub async fn handle_nfs(
    xid: u32,
    call: xdr::rpc::call_body,
    input: &mut impl Read,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    if call.vers != nfs2::VERSION {
        warn!("Invalid NFS Version number {} != {}", call.vers, nfs2::VERSION);
        rpc_msg::accepted(xid, accept_body::only_version(nfs2::VERSION)).serialize(output)?;
        return Ok(());
    }

    let mut payload = Vec::new();
    input.read_to_end(&mut payload)?;

    match handle_call(&*context.vfs, call.proc, &payload).await {
        Ok(body) => {
            debug!("{:?} --> {} result bytes", xid, body.len());
            rpc_msg::success(xid).serialize(output)?;
            output.write_all(&body)?;
        }
        Err(DispatchError::UnknownProcedure(proc)) => {
            warn!("Unimplemented message {:?}", proc);
            rpc_msg::accepted(xid, accept_body::PROC_UNAVAIL).serialize(output)?;
        }
        Err(err) => {
            error!("{:?} --> {}", xid, err);
            rpc_msg::accepted(xid, accept_body::SYSTEM_ERR).serialize(output)?;
        }
    }
    Ok(())
}

/// Decodes procedure arguments, tagging failures as [`DispatchError::Decode`].
fn decode<T: Deserialize + Default>(input: &mut impl Read) -> Result<T, DispatchError> {
    xdr::deserialize::<T>(input).map_err(DispatchError::Decode)
}

/// Logs a backend failure and converts it into its wire status.
fn backend_failure(procedure: &str, err: BackendError) -> nfs2::nfsstat {
    error!("{} error --> {}", procedure, err);
    err.into()
}

/// Returns `NFSERR_ROFS` when the backend cannot be modified.
fn read_only_status<F: NFSFileSystem + ?Sized>(procedure: &str, fs: &F) -> Option<nfs2::nfsstat> {
    if matches!(fs.capabilities(), vfs::Capabilities::ReadWrite) {
        return None;
    }
    warn!("{}: no write capabilities", procedure);
    Some(nfs2::nfsstat::NFSERR_ROFS)
}
