//! XDR data structures for the STATFS procedure (procedure 17) of NFS
//! version 2 protocol as defined in RFC 1094 section 2.2.18.

#![allow(non_camel_case_types)]

use super::*;

/// Successful STATFS result
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct statfsokres {
    /// Optimum transfer size of the server in bytes
    pub tsize: u32,
    /// Block size in bytes of the filesystem
    pub bsize: u32,
    /// Total number of `bsize` blocks on the filesystem
    pub blocks: u32,
    /// Number of free `bsize` blocks on the filesystem
    pub bfree: u32,
    /// Number of `bsize` blocks available to non-privileged users
    pub bavail: u32,
}
DeserializeStruct!(statfsokres, tsize, bsize, blocks, bfree, bavail);
SerializeStruct!(statfsokres, tsize, bsize, blocks, bfree, bavail);

/// STATFS result, or the failure status.
pub type statfsres = nfsres<statfsokres>;
