//! Implementation of the LOOKUP procedure (procedure 4) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.5.
//!
//! LOOKUP searches a directory for a specific name and returns the file handle
//! and attributes of the corresponding file system object. It is the building
//! block clients use to resolve path names one component at a time.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::{BackendError, NFSFileSystem};

/// Handles NFSv2 LOOKUP procedure (procedure 4)
///
/// Takes a `diropargs` and answers with a `diropres`.
pub async fn nfsproc_lookup<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::diropargs>(input)?;
    debug!("nfsproc_lookup({:?})", args);

    let res: nfs2::diropres = fs
        .lookup(&args.dir, &args.name)
        .await
        .map(|(file, attributes)| nfs2::diropokres { file, attributes })
        .map_err(|e| match e {
            // a missing name is the everyday outcome of a lookup
            BackendError::NotFound => {
                debug!(" --> {:?} not found", args.name);
                nfs2::nfsstat::NFSERR_NOENT
            }
            e => backend_failure("lookup", e),
        })
        .into();
    res.serialize(output)?;
    Ok(())
}
