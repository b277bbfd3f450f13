//! Implementation of the ROOT procedure (procedure 3) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.4.
//!
//! ROOT is obsolete: the root handle is obtained through the MOUNT protocol.
//! The procedure is still answered so that old clients probing for it get a
//! well-formed, empty success.

use std::io::Write;

use tracing::debug;

use super::DispatchError;

pub fn nfsproc_root(_output: &mut impl Write) -> Result<(), DispatchError> {
    debug!("nfsproc_root() is obsolete, replying with void");
    Ok(())
}
