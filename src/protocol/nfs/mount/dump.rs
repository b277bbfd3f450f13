//! Implementation of the DUMP procedure (procedure 2) for MOUNT version 1 protocol
//! as defined in RFC 1094 Appendix A section A.5.3.
//!
//! DUMP returns the list of clients and the directories they mounted. The
//! list is only as accurate as clients are in calling UMNT.

use std::io::Write;

use tracing::debug;

use crate::protocol::rpc;
use crate::protocol::xdr::{rpc::rpc_msg, Serialize};

pub fn mountproc_dump(
    xid: u32,
    output: &mut impl Write,
    context: &rpc::Context,
) -> Result<(), anyhow::Error> {
    let list = context.mount_table.list();
    debug!("mountproc_dump({:?}) --> {:?}", xid, list);
    rpc_msg::success(xid).serialize(output)?;
    list.serialize(output)?;
    Ok(())
}
