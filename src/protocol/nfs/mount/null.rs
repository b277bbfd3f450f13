//! Implementation of the NULL procedure (procedure 0) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.1.

use std::io::Write;

use tracing::debug;

use crate::protocol::xdr::{rpc::rpc_msg, Serialize};

pub fn mountproc_null(xid: u32, output: &mut impl Write) -> Result<(), anyhow::Error> {
    debug!("mountproc_null({:?}) ", xid);
    rpc_msg::success(xid).serialize(output)?;
    Ok(())
}
