//! Implementation of the RMDIR procedure (procedure 15) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.16.
//!
//! RMDIR removes an empty directory. A directory that still has entries is
//! answered with NFSERR_NOTEMPTY.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

pub async fn nfsproc_rmdir<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::diropargs>(input)?;
    debug!("nfsproc_rmdir({:?})", args);

    let stat = match read_only_status("rmdir", fs) {
        Some(stat) => stat,
        None => match fs.rmdir(&args.dir, &args.name).await {
            Ok(()) => nfs2::nfsstat::NFS_OK,
            Err(e) => backend_failure("rmdir", e),
        },
    };
    stat.serialize(output)?;
    Ok(())
}
