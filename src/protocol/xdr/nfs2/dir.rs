//! Module contains XDR data structures for the READDIR procedure (procedure 16)
//! of NFS version 2 protocol as defined in RFC 1094 section 2.2.17.
//!
//! The result is a linked list of entries: every entry is preceded by a
//! `TRUE` discriminant, and the list is terminated by `FALSE` followed by
//! the `eof` flag.

// Allow unused code warnings since we implement the complete RFC 1094 specification
#![allow(dead_code)]
#![allow(non_camel_case_types)]

use super::*;

/// Arguments for the READDIR procedure
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct readdirargs {
    /// Handle of the directory to read
    pub dir: nfs_fh,
    /// Position to continue from; all zero starts at the beginning
    pub cookie: nfscookie,
    /// Maximum size in bytes of the encoded result
    pub count: u32,
}
DeserializeStruct!(readdirargs, dir, cookie, count);
SerializeStruct!(readdirargs, dir, cookie, count);

/// One directory entry
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct entry {
    /// Unique file identifier within the filesystem
    pub fileid: u32,
    /// Name of the entry
    pub name: filename,
    /// Position of the entry that follows this one
    pub cookie: nfscookie,
}
DeserializeStruct!(entry, fileid, name, cookie);
SerializeStruct!(entry, fileid, name, cookie);

/// Successful READDIR result
#[allow(non_camel_case_types)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct readdirok {
    /// Entries in backend order
    pub entries: Vec<entry>,
    /// True if the last entry of the directory is included
    pub eof: bool,
}

impl Serialize for readdirok {
    fn serialize<W: Write>(&self, dest: &mut W) -> Result<()> {
        for entry in &self.entries {
            true.serialize(dest)?;
            entry.serialize(dest)?;
        }
        false.serialize(dest)?;
        self.eof.serialize(dest)
    }
}

impl Deserialize for readdirok {
    fn deserialize<R: Read>(&mut self, src: &mut R) -> Result<()> {
        self.entries.clear();
        while deserialize::<bool>(src)? {
            self.entries.push(deserialize::<entry>(src)?);
        }
        self.eof = deserialize::<bool>(src)?;
        Ok(())
    }
}

/// READDIR result, or the failure status.
pub type readdirres = nfsres<readdirok>;
