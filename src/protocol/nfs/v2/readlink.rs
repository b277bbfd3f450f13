//! Implementation of the READLINK procedure (procedure 5) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.6.
//!
//! READLINK returns the target path stored in a symbolic link. The server
//! does not interpret the path; it is returned exactly as the link was created.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 READLINK procedure (procedure 5)
///
/// # Arguments
///
/// * `input` - Input stream containing the handle of the link
/// * `output` - Output stream for writing the `readlinkres`
/// * `fs` - Backend serving the call
pub async fn nfsproc_readlink<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let handle = decode::<nfs2::nfs_fh>(input)?;
    debug!("nfsproc_readlink({:?})", handle);

    let res: nfs2::readlinkres =
        fs.readlink(&handle).await.map_err(|e| backend_failure("readlink", e)).into();
    debug!(" --> {:?}", res);
    res.serialize(output)?;
    Ok(())
}
