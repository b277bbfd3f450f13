//! Implementation of the RENAME procedure (procedure 11) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.12.
//!
//! RENAME moves a directory entry, possibly between directories. An existing
//! entry at the destination is replaced by the backend. RENAME is not
//! idempotent; retransmissions are filtered by the RPC layer's duplicate
//! request cache, not here.
//!
//! Common errors include:
//! - NFSERR_ROFS - If the file system is read-only
//! - NFSERR_NOENT - If the source entry doesn't exist
//! - NFSERR_NOTDIR - If either handle is not a directory
//! - NFSERR_NOTEMPTY - If the destination is a non-empty directory

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 RENAME procedure (procedure 11)
///
/// # Arguments
///
/// * `input` - Input stream containing the `renameargs`
/// * `output` - Output stream for writing the status
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_rename<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::renameargs>(input)?;
    debug!("nfsproc_rename({:?} -> {:?})", args.from, args.to);

    let stat = match read_only_status("rename", fs) {
        Some(stat) => stat,
        None => match fs.rename(&args.from.dir, &args.from.name, &args.to.dir, &args.to.name).await
        {
            Ok(()) => nfs2::nfsstat::NFS_OK,
            Err(e) => backend_failure("rename", e),
        },
    };
    stat.serialize(output)?;
    Ok(())
}
