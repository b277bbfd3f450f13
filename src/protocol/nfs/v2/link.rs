//! Implementation of the LINK procedure (procedure 12) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.13.
//!
//! LINK creates a hard link: a new name in a directory for an existing file.
//! Both names then refer to the same object and share its attributes.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 LINK procedure (procedure 12)
///
/// Takes a `linkargs` and answers with a bare status.
pub async fn nfsproc_link<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::linkargs>(input)?;
    debug!("nfsproc_link({:?} -> {:?})", args.from, args.to);

    let stat = match read_only_status("link", fs) {
        Some(stat) => stat,
        None => match fs.link(&args.from, &args.to.dir, &args.to.name).await {
            Ok(()) => nfs2::nfsstat::NFS_OK,
            Err(e) => backend_failure("link", e),
        },
    };
    stat.serialize(output)?;
    Ok(())
}
