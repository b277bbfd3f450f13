//! Implementation of the `READDIR` procedure (procedure 16) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.17.
//!
//! `READDIR` returns a variable number of entries of a directory, starting at
//! the position named by a cookie. The client bounds the size of the reply
//! with `count`, which covers the whole encoded `readdirres`: status, entry
//! list and `eof` flag. Entries that would push the reply past `count` are
//! left out, and `eof` is then reported as false so the client continues
//! from the cookie of the last entry it received. A budget too small for a
//! single entry is answered with `NFSERR_IO`. Entries whose names cannot be
//! encoded are skipped.

use std::io::{Read, Write};

use tracing::{debug, trace, warn};

use super::{backend_failure, decode, DispatchError};
use crate::protocol::xdr::{self, nfs2, Serialize};
use crate::vfs::NFSFileSystem;
use crate::write_counter::WriteCounter;

/// Encoded size of the status word.
const STATUS_LEN: usize = 4;

/// Encoded size of the list terminator and the `eof` flag.
const TRAILER_LEN: usize = 8;

/// Smallest encoded entry: fileid, empty name, cookie and list discriminant.
const MIN_ENTRY_LEN: u32 = 16;

/// Handles `NFSv2` `READDIR` procedure (procedure 16)
///
/// # Arguments
///
/// * `input` - Input stream containing the `readdirargs`
/// * `output` - Output stream for writing the `readdirres`
/// * `fs` - Backend serving the call
///
/// # Returns
///
/// * `Result<(), DispatchError>` - Ok(()) once a result has been written
pub async fn nfsproc_readdir<F: NFSFileSystem + ?Sized>(
    input: &mut impl Read,
    output: &mut impl Write,
    fs: &F,
) -> Result<(), DispatchError> {
    let args = decode::<nfs2::dir::readdirargs>(input)?;
    debug!("nfsproc_readdir({:?})", args);

    // no more entries than could possibly fit in the budget
    let max_entries = (args.count / MIN_ENTRY_LEN).max(1) as usize;
    let result = match fs.readdir(&args.dir, args.cookie, max_entries).await {
        Ok(result) => result,
        Err(e) => {
            backend_failure("readdir", e).serialize(output)?;
            return Ok(());
        }
    };

    let max_bytes = args.count as usize;
    let mut used = STATUS_LEN + TRAILER_LEN;
    let mut listed = Vec::new();
    let mut all_entries_written = true;
    let mut written = 0;

    for entry in result.entries {
        let entry =
            nfs2::dir::entry { fileid: entry.fileid, name: entry.name, cookie: entry.cookie };
        // encode into a scratch buffer first to learn its size
        let mut entry_buf = Vec::new();
        true.serialize(&mut entry_buf)?;
        if let Err(e) = entry.serialize(&mut entry_buf) {
            warn!("skipping directory entry {} at {:?}: {}", entry.fileid, entry.cookie, e);
            continue;
        }

        if used + entry_buf.len() > max_bytes {
            trace!(" -- insufficient space. truncating at {:?}", entry.name);
            all_entries_written = false;
            break;
        }
        trace!("  -- dirent {:?}", entry);
        used += entry_buf.len();
        listed.extend_from_slice(&entry_buf);
        written += 1;
    }
    // eof is only meaningful when nothing was left out
    let eof = all_entries_written && result.end;

    // an empty page without eof would leave the client nowhere to continue from
    if used > max_bytes || (written == 0 && !eof) {
        warn!("readdir budget of {} bytes cannot hold the next entry", max_bytes);
        nfs2::nfsstat::NFSERR_IO.serialize(output)?;
        return Ok(());
    }

    let mut counting_output = WriteCounter::new(output);
    nfs2::nfsstat::NFS_OK.serialize(&mut counting_output)?;
    counting_output.write_all(&listed).map_err(xdr::Error::from)?;
    false.serialize(&mut counting_output)?;
    eof.serialize(&mut counting_output)?;

    debug!(
        "readdir from {:?}: {} entries in {} of {} bytes, eof {}",
        args.cookie,
        written,
        counting_output.bytes_written(),
        max_bytes,
        eof
    );
    Ok(())
}
