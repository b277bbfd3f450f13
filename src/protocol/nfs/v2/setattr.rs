//! Implementation of the SETATTR procedure (procedure 2) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.3.
//!
//! SETATTR changes one or more attributes of a file system object. Every
//! field of the `sattr` argument may carry the all-ones sentinel, meaning
//! "leave unchanged"; those arrive at the backend as `None`. Setting `size`
//! truncates or extends a regular file. The reply is the `attrstat` holding
//! the attributes after the change.
//!
//! Common errors include:
//! - NFSERR_ROFS - If the file system is read-only
//! - NFSERR_PERM - If the caller is not the owner
//! - NFSERR_STALE - If the file handle is invalid

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 SETATTR procedure (procedure 2)
///
/// # Arguments
///
/// * `input` - Input stream containing the `sattrargs`
/// * `output` - Output stream for writing the `attrstat`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_setattr<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::sattrargs>(input)?;
    debug!("nfsproc_setattr({:?})", args);

    if let Some(stat) = read_only_status("setattr", fs) {
        stat.serialize(output)?;
        return Ok(());
    }

    let res: nfs2::attrstat = fs
        .setattr(&args.file, args.attributes)
        .await
        .map_err(|e| backend_failure("setattr", e))
        .into();
    res.serialize(output)?;
    Ok(())
}
