//! Implementation of the MNT procedure (procedure 1) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.2.
//!
//! The MNT procedure establishes a mount point for an NFS client.
//! It is used by NFS clients to:
//! - Get the initial file handle for the root of a mounted file system
//! - Validate that the server exports the requested path
//!
//! MNT takes a directory path as input and returns an `fhstatus`: a zero
//! status followed by the 32-byte handle of the directory, or a non-zero
//! error number.

use std::io::{Read, Write};

use tracing::{debug, warn};

use super::{client_hostname, read_dirpath};
use crate::protocol::rpc;
use crate::protocol::xdr::{mount, nfs2, rpc::rpc_msg, Serialize};

/// Handles MOUNT protocol MNT procedure (procedure 1)
///
/// The requested path must name the export or a directory below it. The
/// part below the export is resolved through the backend one component
/// at a time.
///
/// # Arguments
///
/// * `xid` - RPC transaction ID
/// * `input` - Input stream containing the directory path to mount
/// * `output` - Output stream for writing the response
/// * `context` - Server context containing exports and VFS information
///
/// # Returns
///
/// * `Result<(), anyhow::Error>` - Ok(()) on success or an error
pub async fn mountproc_mnt(
    xid: u32,
    input: &mut impl Read,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    let Some(path) = read_dirpath(xid, input, output)? else {
        return Ok(());
    };
    debug!("mountproc_mnt({:?},{:?}) ", xid, path);

    let res = match export_relative(&context.export_name, &path.0) {
        Some(relative) => match context.vfs.path_to_handle(relative).await {
            Ok(fh) => mount::fhstatus::Mounted(fh),
            Err(e) => {
                warn!("{:?} --> cannot resolve {:?}: {}", xid, path, e);
                mount::fhstatus::Failed(e.into())
            }
        },
        None => {
            debug!("{:?} --> no matching export", xid);
            mount::fhstatus::Failed(nfs2::nfsstat::NFSERR_NOENT)
        }
    };

    if let mount::fhstatus::Mounted(ref fh) = res {
        debug!("{:?} --> {:?}", xid, fh);
        context.mount_table.add(client_hostname(context), path);
        if let Some(ref chan) = context.mount_signal {
            let _ = chan.send(true).await;
        }
    }
    rpc_msg::success(xid).serialize(output)?;
    res.serialize(output)?;
    Ok(())
}

/// Strips the export name from a requested path.
///
/// Returns `None` unless `path` is the export itself or lies below it.
fn export_relative<'a>(export_name: &str, path: &'a [u8]) -> Option<&'a [u8]> {
    let export = export_name.trim_end_matches('/').as_bytes();
    let rest = path.strip_prefix(export)?;
    if rest.is_empty() || rest[0] == b'/' || export.is_empty() {
        Some(rest)
    } else {
        None
    }
}
