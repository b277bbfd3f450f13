//! Implementation of the STATFS procedure (procedure 17) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.18.
//!
//! STATFS reports the preferred transfer size, block size and block counts
//! of the filesystem holding the given handle.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

pub async fn nfsproc_statfs<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let handle = decode::<nfs2::nfs_fh>(input)?;
    debug!("nfsproc_statfs({:?})", handle);

    let res: nfs2::fs::statfsres =
        fs.statfs(&handle).await.map_err(|e| backend_failure("statfs", e)).into();
    debug!(" --> {:?}", res);
    res.serialize(output)?;
    Ok(())
}
