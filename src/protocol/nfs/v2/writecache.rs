//! Implementation of the WRITECACHE procedure (procedure 7) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.8.
//!
//! WRITECACHE was reserved for a future protocol revision. Writes are never
//! cached by this server, so it is answered with an empty success.

use std::io::Write;

use tracing::debug;

use super::DispatchError;

pub fn nfsproc_writecache(_output: &mut impl Write) -> Result<(), DispatchError> {
    debug!("nfsproc_writecache() has nothing to flush");
    Ok(())
}
