//! Implementation of the READ procedure (procedure 6) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.7.
//!
//! READ returns up to `count` bytes of a regular file starting at `offset`,
//! together with the file attributes after the read. The `totalcount` field
//! of the arguments is unused. Requests for more than `MAXDATA` bytes are
//! served as if they asked for exactly `MAXDATA`, so the reply always stays
//! within the protocol limit.

use std::io::{Read, Write};

use tracing::{debug, warn};

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{nfs2, Serialize};
use crate::vfs::NFSFileSystem;

/// Handles NFSv2 READ procedure (procedure 6)
///
/// # Arguments
///
/// * `input` - Input stream containing the `readargs`
/// * `output` - Output stream for writing the `readres`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_read<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::file::readargs>(input)?;
    debug!("nfsproc_read({:?})", args);

    let count = args.count.min(nfs2::MAXDATA as u32);
    let res: nfs2::file::readres = fs
        .read(&args.file, args.offset, count)
        .await
        .map(|(attributes, mut data)| {
            if data.len() > count as usize {
                warn!("backend returned {} bytes for a read of {}", data.len(), count);
                data.truncate(count as usize);
            }
            nfs2::file::readokres { attributes, data: data.into() }
        })
        .map_err(|e| backend_failure("read", e))
        .into();
    if let nfs2::nfsres::Success(ref ok) = res {
        debug!(" --> read {} bytes", ok.data.len());
    }
    res.serialize(output)?;
    Ok(())
}
