//! This module implements the `MOUNT` protocol version 1 (RFC 1094 Appendix A)
//! data structures for XDR serialization and deserialization.
//!
//! The `MOUNT` protocol is used to establish the initial connection between an NFS client
//! and server. It provides functions for mounting and unmounting file systems, and
//! obtaining the initial file handle that serves as the root of the mounted file system.
//! Version 1 hands out the same fixed 32-byte handles used by NFS version 2.

// Allow unused code since we implement the complete RFC specification
#![allow(dead_code)]
// Keep original RFC naming conventions for consistency with the specification
#![allow(non_camel_case_types)]

use std::fmt;
use std::io::{Read, Write};

use num_derive::{FromPrimitive, ToPrimitive};

use super::nfs2::{nfs_fh, nfsstat};
use super::{deserialize_bounded, serialize_bounded, Deserialize, Error, Result, Serialize};

/// MOUNT program number for RPC
pub const PROGRAM: u32 = 100005;
/// MOUNT protocol version 1
pub const VERSION: u32 = 1;

/// Maximum bytes in a path name
pub const MNTPATHLEN: usize = 1024;
/// Maximum bytes in a name
pub const MNTNAMLEN: usize = 255;

/// Directory path on the server, at most [`MNTPATHLEN`] bytes
#[allow(non_camel_case_types)]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct dirpath(pub Vec<u8>);

impl Serialize for dirpath {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        serialize_bounded(&self.0, MNTPATHLEN, |len, max| Error::PathTooLong { len, max }, dest)
    }
}

impl Deserialize for dirpath {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.0 = deserialize_bounded(src, MNTPATHLEN, |len, max| Error::PathTooLong { len, max })?;
        Ok(())
    }
}

impl fmt::Debug for dirpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// Host or group name, at most [`MNTNAMLEN`] bytes
#[allow(non_camel_case_types)]
#[derive(Clone, Default, PartialEq, Eq)]
pub struct name(pub Vec<u8>);

impl Serialize for name {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        serialize_bounded(&self.0, MNTNAMLEN, |len, max| Error::NameTooLong { len, max }, dest)
    }
}

impl Deserialize for name {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.0 = deserialize_bounded(src, MNTNAMLEN, |len, max| Error::NameTooLong { len, max })?;
        Ok(())
    }
}

impl fmt::Debug for name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

/// Result of the MNT procedure: a UNIX error number, and the handle of the
/// mounted directory when that number is zero.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum fhstatus {
    /// Mount succeeded
    Mounted(nfs_fh),
    /// Mount failed with the given status
    Failed(nfsstat),
}

impl Default for fhstatus {
    fn default() -> Self {
        fhstatus::Failed(nfsstat::NFSERR_IO)
    }
}

impl Serialize for fhstatus {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        match self {
            fhstatus::Mounted(fh) => {
                0_u32.serialize(dest)?;
                fh.serialize(dest)
            }
            fhstatus::Failed(nfsstat::NFS_OK) => {
                Err(Error::invalid_data("failed mount cannot carry status 0"))
            }
            fhstatus::Failed(stat) => stat.serialize(dest),
        }
    }
}

impl Deserialize for fhstatus {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        *self = match super::deserialize::<nfsstat>(src)? {
            nfsstat::NFS_OK => fhstatus::Mounted(super::deserialize(src)?),
            stat => fhstatus::Failed(stat),
        };
        Ok(())
    }
}

/// One entry of the list returned by DUMP.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct mountbody {
    /// Client host name
    pub hostname: name,
    /// Directory the client mounted
    pub directory: dirpath,
}

/// Mount list returned by DUMP, encoded as an XDR linked list.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct mountlist(pub Vec<mountbody>);

impl Serialize for mountlist {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        for body in &self.0 {
            true.serialize(dest)?;
            body.hostname.serialize(dest)?;
            body.directory.serialize(dest)?;
        }
        false.serialize(dest)
    }
}

impl Deserialize for mountlist {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.0.clear();
        while super::deserialize::<bool>(src)? {
            let hostname = super::deserialize::<name>(src)?;
            let directory = super::deserialize::<dirpath>(src)?;
            self.0.push(mountbody { hostname, directory });
        }
        Ok(())
    }
}

/// One exported filesystem and the groups allowed to mount it.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct exportbody {
    /// Exported directory
    pub filesys: dirpath,
    /// Groups allowed to mount it; empty means everyone
    pub groups: Vec<name>,
}

/// Export list returned by EXPORT, encoded as nested XDR linked lists.
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct exportlist(pub Vec<exportbody>);

impl Serialize for exportlist {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        for body in &self.0 {
            true.serialize(dest)?;
            body.filesys.serialize(dest)?;
            for group in &body.groups {
                true.serialize(dest)?;
                group.serialize(dest)?;
            }
            false.serialize(dest)?;
        }
        false.serialize(dest)
    }
}

impl Deserialize for exportlist {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.0.clear();
        while super::deserialize::<bool>(src)? {
            let filesys = super::deserialize::<dirpath>(src)?;
            let mut groups = Vec::new();
            while super::deserialize::<bool>(src)? {
                groups.push(super::deserialize::<name>(src)?);
            }
            self.0.push(exportbody { filesys, groups });
        }
        Ok(())
    }
}

/// Procedure numbers for the `MOUNT` version 1 protocol
#[allow(non_camel_case_types)]
#[allow(clippy::upper_case_acronyms)]
#[derive(Copy, Clone, Debug, FromPrimitive, ToPrimitive)]
pub enum MountProgram {
    /// Null procedure for service availability testing
    MOUNTPROC_NULL = 0,
    /// Mount a file system
    MOUNTPROC_MNT = 1,
    /// Get list of mounted file systems
    MOUNTPROC_DUMP = 2,
    /// Unmount a file system
    MOUNTPROC_UMNT = 3,
    /// Unmount all file systems
    MOUNTPROC_UMNTALL = 4,
    /// Get list of exported file systems
    MOUNTPROC_EXPORT = 5,
}
