//! Implementation of the WRITE procedure (procedure 8) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.9.
//!
//! WRITE stores data into a regular file at the given offset. Version 2 writes
//! are always synchronous: the reply is only sent once the backend reports the
//! data as stored, and carries the file attributes after the write. The
//! `beginoffset` and `totalcount` fields are unused.
//!
//! Arguments carrying more than `MAXDATA` bytes are rejected while decoding,
//! before the backend is involved.

use std::io::{Read, Write};

use tracing::debug;

use super::{backend_failure, decode, read_only_status, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 WRITE procedure (procedure 8)
///
/// # Arguments
///
/// * `input` - Input stream containing the `writeargs`
/// * `output` - Output stream for writing the `attrstat`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
///
/// # Errors
///
/// Common errors include:
/// - NFSERR_ROFS - If the file system is read-only
/// - NFSERR_ISDIR - If the handle names a directory
/// - NFSERR_NOSPC - If the backend ran out of space
pub async fn nfsproc_write<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::writeargs>(input)?;
    debug!("nfsproc_write({:?}, offset {}, {} bytes)", args.file, args.offset, args.data.len());

    if let Some(stat) = read_only_status("write", fs) {
        stat.serialize(output)?;
        return Ok(());
    }

    let res: nfs2::attrstat = fs
        .write(&args.file, args.offset, &args.data)
        .await
        .map_err(|e| backend_failure("write", e))
        .into();
    res.serialize(output)?;
    Ok(())
}
