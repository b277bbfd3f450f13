#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;

use nfs2_server::vfs::{self, BackendError, Capabilities, DirEntry, FileIdHandles, ReadDirResult};
use nfs2_server::xdr::nfs2::{fattr, filename, ftype, nfs_fh, nfscookie, path, sattr, timeval};
use nfs2_server::xdr::{self, Deserialize, Serialize};

const ROOT_ID: u64 = 1;

struct TestFile {
    id: u64,
    name: filename,
    attr: fattr,
    data: Vec<u8>,
}

/// Flat file system: a root directory holding regular files.
///
/// Every backend call is recorded by name so tests can check which
/// capabilities a procedure reached.
pub struct TestFS {
    handles: FileIdHandles,
    files: Mutex<Vec<TestFile>>,
    calls: Mutex<Vec<&'static str>>,
    read_only: bool,
}

impl Default for TestFS {
    fn default() -> Self {
        TestFS {
            handles: FileIdHandles::new(7),
            files: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            read_only: false,
        }
    }
}

/// Calls that change the file system
pub const MUTATING_CALLS: &[&str] =
    &["setattr", "write", "create", "remove", "rename", "link", "symlink", "mkdir", "rmdir"];

impl TestFS {
    pub fn with_files(names: &[&str]) -> Self {
        let fs = TestFS::default();
        for name in names {
            fs.add_file(name, b"");
        }
        fs
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn add_file(&self, name: &str, data: &[u8]) -> nfs_fh {
        let mut files = self.files.lock().unwrap();
        let id = files.len() as u64 + 2;
        let attr = file_attr(id, data.len());
        files.push(TestFile { id, name: name.into(), attr, data: data.to_vec() });
        self.handles.id_to_fh(id)
    }

    pub fn handle(&self, name: &str) -> nfs_fh {
        let files = self.files.lock().unwrap();
        let file = files.iter().find(|f| f.name.as_ref() == name.as_bytes()).unwrap();
        self.handles.id_to_fh(file.id)
    }

    pub fn attr(&self, name: &str) -> fattr {
        let files = self.files.lock().unwrap();
        files.iter().find(|f| f.name.as_ref() == name.as_bytes()).unwrap().attr
    }

    pub fn names(&self) -> Vec<String> {
        let files = self.files.lock().unwrap();
        files.iter().map(|f| String::from_utf8_lossy(&f.name).into_owned()).collect()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutating_calls(&self) -> Vec<&'static str> {
        self.calls().into_iter().filter(|c| MUTATING_CALLS.contains(c)).collect()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_dir(&self, fh: &nfs_fh) -> Result<(), BackendError> {
        match self.handles.fh_to_id(fh)? {
            ROOT_ID => Ok(()),
            _ => Err(BackendError::NotADirectory),
        }
    }

    fn with_file<T>(
        &self,
        fh: &nfs_fh,
        f: impl FnOnce(&mut TestFile) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        let id = self.handles.fh_to_id(fh)?;
        if id == ROOT_ID {
            return Err(BackendError::IsADirectory);
        }
        let mut files = self.files.lock().unwrap();
        let file = files.iter_mut().find(|f| f.id == id).ok_or(BackendError::StaleHandle)?;
        f(file)
    }
}

pub fn file_attr(id: u64, size: usize) -> fattr {
    fattr {
        ftype: ftype::NFREG,
        mode: 0o100644,
        nlink: 1,
        uid: 1000,
        gid: 1000,
        size: size as u32,
        blocksize: 4096,
        fsid: 1,
        fileid: id as u32,
        atime: timeval { seconds: 100, useconds: 1 },
        mtime: timeval { seconds: 200, useconds: 2 },
        ctime: timeval { seconds: 300, useconds: 3 },
        ..Default::default()
    }
}

fn root_attr() -> fattr {
    fattr { ftype: ftype::NFDIR, mode: 0o040755, nlink: 2, ..file_attr(ROOT_ID, 0) }
}

#[async_trait]
impl vfs::NFSFileSystem for TestFS {
    fn capabilities(&self) -> Capabilities {
        if self.read_only {
            Capabilities::ReadOnly
        } else {
            Capabilities::ReadWrite
        }
    }

    fn root_handle(&self) -> nfs_fh {
        self.handles.id_to_fh(ROOT_ID)
    }

    async fn getattr(&self, fh: &nfs_fh) -> Result<fattr, BackendError> {
        self.record("getattr");
        if self.handles.fh_to_id(fh)? == ROOT_ID {
            return Ok(root_attr());
        }
        self.with_file(fh, |f| Ok(f.attr))
    }

    async fn setattr(&self, fh: &nfs_fh, attr: sattr) -> Result<fattr, BackendError> {
        self.record("setattr");
        self.with_file(fh, |f| {
            if let Some(mode) = attr.mode {
                f.attr.mode = (f.attr.mode & !0o7777) | (mode & 0o7777);
            }
            if let Some(uid) = attr.uid {
                f.attr.uid = uid;
            }
            if let Some(gid) = attr.gid {
                f.attr.gid = gid;
            }
            if let Some(size) = attr.size {
                f.data.resize(size as usize, 0);
                f.attr.size = size;
            }
            if let Some(atime) = attr.atime {
                f.attr.atime = atime;
            }
            if let Some(mtime) = attr.mtime {
                f.attr.mtime = mtime;
            }
            Ok(f.attr)
        })
    }

    async fn lookup(
        &self,
        dir: &nfs_fh,
        name: &filename,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        self.record("lookup");
        self.check_dir(dir)?;
        let files = self.files.lock().unwrap();
        let file = files.iter().find(|f| f.name == *name).ok_or(BackendError::NotFound)?;
        Ok((self.handles.id_to_fh(file.id), file.attr))
    }

    async fn readlink(&self, _fh: &nfs_fh) -> Result<path, BackendError> {
        self.record("readlink");
        Err(BackendError::Io("no symbolic links here".to_string()))
    }

    async fn read(
        &self,
        fh: &nfs_fh,
        offset: u32,
        count: u32,
    ) -> Result<(fattr, Vec<u8>), BackendError> {
        self.record("read");
        self.with_file(fh, |f| {
            let start = (offset as usize).min(f.data.len());
            let end = start.saturating_add(count as usize).min(f.data.len());
            Ok((f.attr, f.data[start..end].to_vec()))
        })
    }

    async fn write(&self, fh: &nfs_fh, offset: u32, data: &[u8]) -> Result<fattr, BackendError> {
        self.record("write");
        self.with_file(fh, |f| {
            let end = offset as usize + data.len();
            if end > f.data.len() {
                f.data.resize(end, 0);
            }
            f.data[offset as usize..end].copy_from_slice(data);
            f.attr.size = f.data.len() as u32;
            Ok(f.attr)
        })
    }

    async fn create(
        &self,
        dir: &nfs_fh,
        name: &filename,
        _attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        self.record("create");
        self.check_dir(dir)?;
        if self.files.lock().unwrap().iter().any(|f| f.name == *name) {
            return Err(BackendError::AlreadyExists);
        }
        let fh = self.add_file(&String::from_utf8_lossy(name), b"");
        let attr = self.with_file(&fh, |f| Ok(f.attr))?;
        Ok((fh, attr))
    }

    async fn remove(&self, dir: &nfs_fh, name: &filename) -> Result<(), BackendError> {
        self.record("remove");
        self.check_dir(dir)?;
        let mut files = self.files.lock().unwrap();
        let pos = files.iter().position(|f| f.name == *name).ok_or(BackendError::NotFound)?;
        files.remove(pos);
        Ok(())
    }

    async fn rename(
        &self,
        from_dir: &nfs_fh,
        from_name: &filename,
        to_dir: &nfs_fh,
        to_name: &filename,
    ) -> Result<(), BackendError> {
        self.record("rename");
        self.check_dir(from_dir)?;
        self.check_dir(to_dir)?;
        let mut files = self.files.lock().unwrap();
        if !files.iter().any(|f| f.name == *from_name) {
            return Err(BackendError::NotFound);
        }
        if from_name != to_name {
            files.retain(|f| f.name != *to_name);
        }
        if let Some(file) = files.iter_mut().find(|f| f.name == *from_name) {
            file.name = to_name.clone();
        }
        Ok(())
    }

    async fn link(
        &self,
        _from: &nfs_fh,
        _to_dir: &nfs_fh,
        _to_name: &filename,
    ) -> Result<(), BackendError> {
        self.record("link");
        Err(BackendError::NotOwner)
    }

    async fn symlink(
        &self,
        _dir: &nfs_fh,
        _name: &filename,
        _target: &path,
        _attr: sattr,
    ) -> Result<(), BackendError> {
        self.record("symlink");
        Err(BackendError::NotOwner)
    }

    async fn mkdir(
        &self,
        _dir: &nfs_fh,
        _name: &filename,
        _attr: sattr,
    ) -> Result<(nfs_fh, fattr), BackendError> {
        self.record("mkdir");
        Err(BackendError::NoSpace)
    }

    async fn rmdir(&self, _dir: &nfs_fh, _name: &filename) -> Result<(), BackendError> {
        self.record("rmdir");
        Err(BackendError::NotFound)
    }

    async fn readdir(
        &self,
        dir: &nfs_fh,
        cookie: nfscookie,
        max_entries: usize,
    ) -> Result<ReadDirResult, BackendError> {
        self.record("readdir");
        self.check_dir(dir)?;
        let files = self.files.lock().unwrap();
        let start = (u32::from(cookie) as usize).min(files.len());
        let entries: Vec<DirEntry> = files[start..]
            .iter()
            .take(max_entries)
            .enumerate()
            .map(|(i, f)| DirEntry {
                fileid: f.id as u32,
                name: f.name.clone(),
                cookie: nfscookie::from((start + i + 1) as u32),
            })
            .collect();
        let end = start + entries.len() >= files.len();
        Ok(ReadDirResult { entries, end })
    }
}

/// Encodes a value into a fresh buffer.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.serialize(&mut buf).expect("encode");
    buf
}

/// Decodes a value and checks the whole buffer was consumed.
pub fn decode<T: Deserialize + Default>(buf: &[u8]) -> T {
    let mut cursor = Cursor::new(buf);
    let value = xdr::deserialize::<T>(&mut cursor).expect("decode");
    assert_eq!(cursor.position() as usize, buf.len(), "trailing bytes after decode");
    value
}
