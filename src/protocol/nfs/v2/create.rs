//! Implementation of the CREATE procedure (procedure 9) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.10.
//!
//! CREATE makes a new regular file in a directory and returns its handle and
//! attributes. Version 2 has no exclusive-create mode on the wire, so the
//! server provides one: the name is looked up first, and a name that is
//! already bound is answered with NFSERR_EXIST without calling the backend's
//! `create`. Backends must still refuse existing names themselves, since
//! another call may bind the name between the lookup and the create.
//!
//! Common errors include:
//! - NFSERR_ROFS - If the file system is read-only
//! - NFSERR_EXIST - If the name is already bound
//! - NFSERR_NOTDIR - If the handle is not a directory
//! - NFSERR_NAMETOOLONG - If the name is rejected by the backend

use std::io::{Read, Write};

use tracing::{debug, warn};

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::{BackendError, NFSFileSystem};

/// Handles NFSv2 CREATE procedure (procedure 9)
///
/// # Arguments
///
/// * `input` - Input stream containing the `createargs`
/// * `output` - Output stream for writing the `diropres`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_create<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::createargs>(input)?;
    debug!("nfsproc_create({:?})", args);

    if let Some(stat) = read_only_status("create", fs) {
        stat.serialize(output)?;
        return Ok(());
    }

    let dirops = &args.location;
    match fs.lookup(&dirops.dir, &dirops.name).await {
        Ok(_) => {
            warn!("create: {:?} already exists", dirops.name);
            nfs2::nfsstat::NFSERR_EXIST.serialize(output)?;
            return Ok(());
        }
        Err(BackendError::NotFound) => {}
        Err(e) => {
            backend_failure("create", e).serialize(output)?;
            return Ok(());
        }
    }

    let res: nfs2::diropres = fs
        .create(&dirops.dir, &dirops.name, args.attributes)
        .await
        .map(|(file, attributes)| nfs2::diropokres { file, attributes })
        .map_err(|e| backend_failure("create", e))
        .into();
    res.serialize(output)?;
    Ok(())
}
