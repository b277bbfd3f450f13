//! Implementation of the SYMLINK procedure (procedure 13) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.14.
//!
//! SYMLINK creates a symbolic link named by a `diropargs` whose content is an
//! uninterpreted path. Unlike CREATE and MKDIR, the reply carries no handle:
//! clients look the new link up if they need one.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 SYMLINK procedure (procedure 13)
///
/// # Arguments
///
/// * `input` - Input stream containing the `symlinkargs`
/// * `output` - Output stream for writing the status
/// * `fs` - Backend serving the call
pub async fn nfsproc_symlink<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::symlinkargs>(input)?;
    debug!("nfsproc_symlink({:?} -> {:?})", args.from, args.to);

    let stat = match read_only_status("symlink", fs) {
        Some(stat) => stat,
        None => match fs.symlink(&args.from.dir, &args.from.name, &args.to, args.attributes).await
        {
            Ok(()) => nfs2::nfsstat::NFS_OK,
            Err(e) => backend_failure("symlink", e),
        },
    };
    stat.serialize(output)?;
    Ok(())
}
