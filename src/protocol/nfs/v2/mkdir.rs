//! Implementation of the MKDIR procedure (procedure 14) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.15.
//!
//! MKDIR creates a new, empty directory and returns its handle and attributes.
//! The backend refuses names that are already bound with NFSERR_EXIST.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 MKDIR procedure (procedure 14)
///
/// Takes a `createargs` and answers with a `diropres`.
pub async fn nfsproc_mkdir<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::createargs>(input)?;
    debug!("nfsproc_mkdir({:?})", args);

    if let Some(stat) = read_only_status("mkdir", fs) {
        stat.serialize(output)?;
        return Ok(());
    }

    let res: nfs2::diropres = fs
        .mkdir(&args.location.dir, &args.location.name, args.attributes)
        .await
        .map(|(file, attributes)| nfs2::diropokres { file, attributes })
        .map_err(|e| backend_failure("mkdir", e))
        .into();
    res.serialize(output)?;
    Ok(())
}
