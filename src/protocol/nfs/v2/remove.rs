//! Implementation of the REMOVE procedure (procedure 10) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.11.
//!
//! The REMOVE procedure removes (deletes) a non-directory entry from a directory.
//! Directories must be removed with RMDIR instead. The reply is a bare status.
//!
//! Common errors include:
//! - NFSERR_ROFS - If the file system is read-only
//! - NFSERR_NOENT - If the target file doesn't exist
//! - NFSERR_ACCES - If the client doesn't have permission to remove the file
//! - NFSERR_ISDIR - If the target is a directory

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 REMOVE procedure (procedure 10)
///
/// # Arguments
///
/// * `input` - Input stream containing the `diropargs`
/// * `output` - Output stream for writing the status
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_remove<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::diropargs>(input)?;
    debug!("nfsproc_remove({:?})", args);

    let stat = match read_only_status("remove", fs) {
        Some(stat) => stat,
        None => match fs.remove(&args.dir, &args.name).await {
            Ok(()) => nfs2::nfsstat::NFS_OK,
            Err(e) => backend_failure("remove", e),
        },
    };
    stat.serialize(output)?;
    Ok(())
}
