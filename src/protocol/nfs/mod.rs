//! NFS protocol implementation module.
//!
//! - `v2`: The NFS version 2 protocol as specified in RFC 1094. This includes
//!   the procedure handlers for all 18 operations and the transport-independent
//!   entry point `handle_call`.
//!
//! - `mount`: The MOUNT protocol version 1 (RFC 1094 Appendix A), which gives
//!   clients the root handle of the export and tracks which clients mounted it.

pub mod mount;
pub mod v2;
