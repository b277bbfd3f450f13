//! Implementation of the `GETATTR` procedure (procedure 1) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.2.
//!
//! The `GETATTR` procedure retrieves file attributes for a specified file system object.
//! It is used by NFS clients to:
//! - Check if cached attributes are still valid
//! - Get initial attributes for files and directories
//! - Check file/directory sizes, permissions, ownership, etc.
//!
//! `GETATTR` takes a file handle as input and returns an `attrstat`.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles `NFSv2` `GETATTR` procedure (procedure 1)
///
/// # Arguments
///
/// * `input` - Input stream containing the file handle
/// * `output` - Output stream for writing the `attrstat`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_getattr<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let handle = decode::<nfs2::nfs_fh>(input)?;
    debug!("nfsproc_getattr({:?})", handle);

    let res: nfs2::attrstat =
        fs.getattr(&handle).await.map_err(|e| backend_failure("getattr", e)).into();
    debug!(" --> {:?}", res);
    res.serialize(output)?;
    Ok(())
}
