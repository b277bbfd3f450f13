//! Implementation of the NULL procedure (procedure 0) for NFS version 2 protocol
//! as defined in RFC 1094 section 2.2.1.
//!
//! The NULL procedure does no work and is typically used to:
//! - Check if the server is responding (ping)
//! - Measure basic RPC round-trip time
//!
//! NULL takes no arguments and returns no results, just an RPC response indicating success.

use std::io::Write;

use tracing::debug;

use super::DispatchError;

/// Handles NFSv2 NULL procedure
///
/// The argument bytes are ignored and the result body is empty.
pub fn nfsproc_null(_output: &mut impl Write) -> Result<(), DispatchError> {
    debug!("nfsproc_null()");
    Ok(())
}
