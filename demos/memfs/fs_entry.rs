use nfs2_server::xdr::nfs2::{self, fattr, filename, ftype, path, sattr, timeval};

/// File type bits carried in the `mode` attribute
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

pub const BLOCK_SIZE: u32 = 4096;

/// Data held by a file system object
#[derive(Debug, Clone)]
pub enum FSContents {
    File(Vec<u8>),
    Directory(Children),
    Symlink(path),
}

/// A name bound in a directory
#[derive(Debug, Clone)]
pub struct Slot {
    pub name: filename,
    pub id: u64,
    /// READDIR cookie of the binding
    pub cookie: u32,
}

/// Names bound in a directory, in binding order, which is also the READDIR
/// order.
///
/// Every binding gets a cookie larger than any handed out before in this
/// directory, so a cookie stays meaningful after the entry it came from is
/// removed.
#[derive(Debug, Clone, Default)]
pub struct Children {
    slots: Vec<Slot>,
    last_cookie: u32,
}

impl Children {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn find(&self, name: &[u8]) -> Option<u64> {
        self.slots.iter().find(|slot| slot.name.as_ref() == name).map(|slot| slot.id)
    }

    pub fn push(&mut self, name: filename, id: u64) {
        self.last_cookie += 1;
        self.slots.push(Slot { name, id, cookie: self.last_cookie });
    }

    /// Unbinds `name`, returning the id it referred to
    pub fn remove(&mut self, name: &filename) -> Option<u64> {
        let pos = self.slots.iter().position(|slot| slot.name == *name)?;
        Some(self.slots.remove(pos).id)
    }

    /// Bindings made after the one that was given `cookie`
    pub fn after(&self, cookie: u32) -> &[Slot] {
        let start = self.slots.partition_point(|slot| slot.cookie <= cookie);
        &self.slots[start..]
    }
}

/// One object of the in-memory file system.
#[derive(Debug, Clone)]
pub struct FSEntry {
    pub attr: fattr,
    /// Containing directory, used to answer ".."
    pub parent: u64,
    pub contents: FSContents,
}

impl FSEntry {
    fn new(id: u64, parent: u64, ftype: ftype, mode: u32, contents: FSContents) -> FSEntry {
        let now = timeval::now();
        let attr = fattr {
            ftype,
            mode,
            nlink: 1,
            uid: 0,
            gid: 0,
            blocksize: BLOCK_SIZE,
            fsid: 1,
            fileid: id as u32,
            atime: now,
            mtime: now,
            ctime: now,
            ..Default::default()
        };
        let mut entry = FSEntry { attr, parent, contents };
        entry.update_size();
        entry
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.contents, FSContents::Directory(_))
    }

    /// Applies the fields of `attr` that are set. `size` is only valid on regular files.
    ///
    /// An `attr` with every field ignored leaves the entry untouched, ctime included.
    pub fn apply(&mut self, attr: &sattr) -> bool {
        if attr.is_empty() {
            return true;
        }
        if attr.size.is_some() && !matches!(self.contents, FSContents::File(_)) {
            return false;
        }
        if let Some(mode) = attr.mode {
            self.attr.mode = (self.attr.mode & !0o7777) | (mode & 0o7777);
        }
        if let Some(uid) = attr.uid {
            self.attr.uid = uid;
        }
        if let Some(gid) = attr.gid {
            self.attr.gid = gid;
        }
        if let (Some(size), FSContents::File(bytes)) = (attr.size, &mut self.contents) {
            bytes.resize(size as usize, 0);
            self.attr.mtime = timeval::now();
        }
        if let Some(atime) = attr.atime {
            self.attr.atime = atime;
        }
        if let Some(mtime) = attr.mtime {
            self.attr.mtime = mtime;
        }
        self.attr.ctime = timeval::now();
        self.update_size();
        true
    }

    /// Recomputes `size` and `blocks` from the contents
    pub fn update_size(&mut self) {
        let size = match &self.contents {
            FSContents::File(bytes) => bytes.len(),
            FSContents::Directory(children) => children.len() * 32,
            FSContents::Symlink(target) => target.len(),
        };
        self.attr.size = size as u32;
        self.attr.blocks = self.attr.size.div_ceil(BLOCK_SIZE);
    }

    /// Marks the entry as modified now
    pub fn touch(&mut self) {
        let now = timeval::now();
        self.attr.mtime = now;
        self.attr.ctime = now;
    }
}

pub fn make_file(id: u64, parent: u64, attr: &sattr, contents: &[u8]) -> FSEntry {
    let mode = S_IFREG | (attr.mode.unwrap_or(0o644) & 0o7777);
    let mut entry =
        FSEntry::new(id, parent, ftype::NFREG, mode, FSContents::File(contents.to_vec()));
    entry.apply(&sattr { mode: None, ..*attr });
    entry
}

pub fn make_dir(id: u64, parent: u64, attr: &sattr) -> FSEntry {
    let mode = S_IFDIR | (attr.mode.unwrap_or(0o755) & 0o7777);
    let mut entry =
        FSEntry::new(id, parent, ftype::NFDIR, mode, FSContents::Directory(Children::default()));
    entry.apply(&sattr { mode: None, size: None, ..*attr });
    // "." and the name in the parent
    entry.attr.nlink = 2;
    entry
}

pub fn make_symlink(id: u64, parent: u64, attr: &sattr, target: &path) -> FSEntry {
    let mode = S_IFLNK | (attr.mode.unwrap_or(0o777) & 0o7777);
    let mut entry =
        FSEntry::new(id, parent, ftype::NFLNK, mode, FSContents::Symlink(target.clone()));
    entry.apply(&sattr { mode: None, size: None, ..*attr });
    entry
}

/// Number of bytes the protocol allows in one file
pub const MAX_FILE_SIZE: u64 = u32::MAX as u64;

/// Preferred transfer size reported by STATFS
pub const TRANSFER_SIZE: u32 = nfs2::MAXDATA as u32;
