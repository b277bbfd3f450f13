use std::fmt::Debug;

use nfs2_server::vfs::BackendError;
use nfs2_server::xdr::mount::{
    self, dirpath, exportbody, exportlist, fhstatus, mountbody, mountlist,
};
use nfs2_server::xdr::nfs2::{
    self, dir, fattr, filename, ftype, nfs_fh, nfscookie, nfsdata, nfsres, nfsstat, path, sattr,
    timeval,
};
use nfs2_server::xdr::rpc::{auth_flavor, auth_unix, call_body, opaque_auth};
use nfs2_server::xdr::{deserialize, Deserialize, Error, Serialize};

#[derive(Default)]
struct Context {
    buf: Vec<u8>,
}

trait TestValue: Deserialize + Serialize + Eq + Default + Debug + Clone {}
impl<T: Deserialize + Serialize + Eq + Default + Debug + Clone> TestValue for T {}

impl Context {
    fn check<T: TestValue>(&mut self, src_value: &T) {
        for capacity in 0..32 {
            for exsist in 0..capacity {
                self.buf = Vec::with_capacity(capacity);
                self.buf.resize(exsist, Default::default());

                src_value.serialize(&mut self.buf).expect("cannot serialize");
                assert_eq!((self.buf.len() - exsist) % 4, 0);

                let result_value =
                    deserialize::<T>(&mut &self.buf[exsist..]).expect("cannot deserialize");

                assert_eq!(src_value, &result_value);
            }
        }
    }

    fn check_multi<T: TestValue>(&mut self, src_values: &[T]) {
        src_values.iter().for_each(|i| self.check(i));
    }
}

fn encode<T: Serialize>(value: &T) -> Vec<u8> {
    let mut buf = Vec::new();
    value.serialize(&mut buf).expect("cannot serialize");
    buf
}

fn sample_fattr() -> fattr {
    fattr {
        ftype: ftype::NFREG,
        mode: 0o100644,
        nlink: 1,
        uid: 1000,
        gid: 100,
        size: 12,
        blocksize: 4096,
        rdev: 0,
        blocks: 1,
        fsid: 7,
        fileid: 42,
        atime: timeval { seconds: 1, useconds: 2 },
        mtime: timeval { seconds: 3, useconds: 4 },
        ctime: timeval { seconds: 5, useconds: 6 },
    }
}

#[test]
fn test_scalar_bijection() {
    let mut ctx = Context::default();

    ctx.check_multi(&[true, false]);
    ctx.check_multi(&[i32::MIN, -1i32, 0i32, 1i32, i32::MAX]);
    ctx.check_multi(&[u32::MIN, 1u32, 2u32, u32::MAX]);
    ctx.check_multi(&[nfsstat::NFS_OK, nfsstat::NFSERR_NOENT, nfsstat::NFSERR_WFLUSH]);
    ctx.check_multi(&[ftype::NFNON, ftype::NFDIR, ftype::NFLNK]);
}

#[test]
fn test_opaque_bijection() {
    let mut ctx = Context::default();

    ctx.check(&[1u8]);
    ctx.check(&[1u8, 2u8, 3u8]);
    ctx.check(&[1u8, 2u8, 3u8, 4u8, 5u8, 6u8]);

    ctx.check_multi(&[filename::from(""), filename::from("a"), filename::from("abc1234+-")]);
    ctx.check_multi(&[path::from("/"), path::from("../target/file")]);
    ctx.check(&nfsdata::from(vec![0xAB; 13]));
}

#[test]
fn test_attributes_bijection() {
    let mut ctx = Context::default();

    ctx.check(&sample_fattr());
    ctx.check_multi(&[
        sattr::default(),
        sattr { mode: Some(0o644), ..Default::default() },
        sattr {
            mode: Some(0o755),
            uid: Some(0),
            gid: Some(0),
            size: Some(0),
            atime: Some(timeval { seconds: 10, useconds: 0 }),
            mtime: Some(timeval { seconds: 20, useconds: 999_999 }),
        },
    ]);
}

#[test]
fn test_fattr_wire_size() {
    // type, ten scalar words, then three times of two words each
    assert_eq!(encode(&sample_fattr()).len(), 17 * 4);
}

#[test]
fn test_sattr_all_ignored() {
    let wire = [0xFF_u8; 32];
    let attr = deserialize::<sattr>(&mut &wire[..]).expect("cannot deserialize");
    assert!(attr.is_empty());
    assert_eq!(encode(&attr), wire.to_vec());
}

#[test]
fn test_sattr_partial_time_is_ignored() {
    let mut wire = encode(&sattr::default());
    // atime seconds set, microseconds left as the sentinel
    wire[16..20].copy_from_slice(&5u32.to_be_bytes());
    let attr = deserialize::<sattr>(&mut &wire[..]).expect("cannot deserialize");
    assert_eq!(attr.atime, None);
}

#[test]
fn test_handle_is_fixed_size() {
    let fh = nfs_fh::new(b"handle").expect("short handle");
    let wire = encode(&fh);
    assert_eq!(wire.len(), nfs2::FHSIZE);
    assert_eq!(&wire[..6], b"handle");
    assert_eq!(deserialize::<nfs_fh>(&mut &wire[..]).expect("cannot deserialize"), fh);

    match nfs_fh::try_from(&[0u8; 31][..]) {
        Err(Error::MalformedHandle { expected: 32, actual: 31 }) => {}
        other => panic!("unexpected result {other:?}"),
    }
    assert!(matches!(nfs_fh::new(&[1u8; 33]), Err(Error::MalformedHandle { actual: 33, .. })));
}

#[test]
fn test_cookie_is_four_bytes() {
    let cookie = nfscookie::from(0x01020304);
    assert_eq!(encode(&cookie), vec![1, 2, 3, 4]);
    assert!(nfscookie::START.is_start());
    assert_eq!(u32::from(cookie), 0x01020304);
}

#[test]
fn test_truncated_input() {
    let wire = encode(&sample_fattr());
    let result = deserialize::<fattr>(&mut &wire[..wire.len() - 1]);
    assert!(matches!(result, Err(Error::TruncatedMessage)));

    // length prefix claims more bytes than the message holds
    let mut wire = 10u32.to_be_bytes().to_vec();
    wire.extend_from_slice(b"abc");
    assert!(matches!(deserialize::<filename>(&mut &wire[..]), Err(Error::TruncatedMessage)));
}

#[test]
fn test_bounds_checked_before_body() {
    let mut wire = 256u32.to_be_bytes().to_vec();
    wire.extend_from_slice(&[b'x'; 256]);
    match deserialize::<filename>(&mut &wire[..]) {
        Err(Error::NameTooLong { len: 256, max: 255 }) => {}
        other => panic!("unexpected result {other:?}"),
    }

    // only the length prefix is present
    let wire = 8193u32.to_be_bytes();
    match deserialize::<nfsdata>(&mut &wire[..]) {
        Err(Error::ArgumentTooLarge { len: 8193, max: 8192 }) => {}
        other => panic!("unexpected result {other:?}"),
    }

    let wire = 1025u32.to_be_bytes();
    assert!(matches!(deserialize::<path>(&mut &wire[..]), Err(Error::PathTooLong { .. })));
}

#[test]
fn test_bounds_checked_on_encode() {
    let mut buf = Vec::new();
    let name = filename::from(vec![b'x'; 256]);
    assert!(matches!(name.serialize(&mut buf), Err(Error::NameTooLong { .. })));
    let data = nfsdata::from(vec![0; 8193]);
    assert!(matches!(data.serialize(&mut buf), Err(Error::ArgumentTooLarge { .. })));
}

#[test]
fn test_status_display() {
    assert_eq!(nfsstat::NFSERR_NOENT.to_string(), "ERR_NOENT(2): No such file or directory");
    assert_eq!(nfsstat::NFSERR_STALE.code(), 70);
    assert_eq!(nfsstat::NFSERR_WFLUSH.code(), 99);
}

#[test]
fn test_every_backend_error_is_a_failure() {
    let errors = [
        BackendError::NotOwner,
        BackendError::NotFound,
        BackendError::Io("disk on fire".to_string()),
        BackendError::NoDeviceOrAddress,
        BackendError::PermissionDenied,
        BackendError::AlreadyExists,
        BackendError::NoDevice,
        BackendError::NotADirectory,
        BackendError::IsADirectory,
        BackendError::FileTooLarge,
        BackendError::NoSpace,
        BackendError::ReadOnly,
        BackendError::NameTooLong,
        BackendError::DirectoryNotEmpty,
        BackendError::QuotaExceeded,
        BackendError::StaleHandle,
        BackendError::GenericIo,
    ];
    let mut codes: Vec<u32> = errors.into_iter().map(|e| nfsstat::from(e).code()).collect();
    assert!(codes.iter().all(|&c| c != 0));
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), 17);

    let io = std::io::Error::from(std::io::ErrorKind::NotFound);
    assert!(matches!(BackendError::from(io), BackendError::NotFound));
    let io = std::io::Error::other("weird");
    assert!(matches!(BackendError::from(io), BackendError::Io(_)));
}

#[test]
fn test_result_discriminant() {
    let mut ctx = Context::default();
    ctx.check_multi(&[
        nfsres::Success(sample_fattr()),
        nfsres::Failure(nfsstat::NFSERR_ACCES),
    ]);

    assert_eq!(encode(&nfsres::<fattr>::Failure(nfsstat::NFSERR_NOENT)), 2u32.to_be_bytes());

    let mut buf = Vec::new();
    let invalid = nfsres::<fattr>::Failure(nfsstat::NFS_OK);
    assert!(invalid.serialize(&mut buf).is_err());
}

#[test]
fn test_readdir_list_shape() {
    let ok = dir::readdirok {
        entries: vec![
            dir::entry { fileid: 2, name: "a".into(), cookie: nfscookie::from(1) },
            dir::entry { fileid: 3, name: "bc".into(), cookie: nfscookie::from(2) },
        ],
        eof: true,
    };
    let wire = encode(&ok);
    // each entry: discriminant, fileid, name length, one padded word, cookie
    assert_eq!(wire.len(), 2 * 20 + 8);
    assert_eq!(&wire[wire.len() - 8..], &[0, 0, 0, 0, 0, 0, 0, 1]);

    let mut ctx = Context::default();
    ctx.check(&ok);
    ctx.check(&dir::readdirok::default());
}

#[test]
fn test_mount_structures_bijection() {
    let mut ctx = Context::default();

    ctx.check_multi(&[
        fhstatus::Mounted(nfs_fh::new(b"root").expect("short handle")),
        fhstatus::Failed(nfsstat::NFSERR_ACCES),
    ]);
    ctx.check(&mountlist(vec![
        mountbody { hostname: mount::name(b"client".to_vec()), directory: dirpath(b"/".to_vec()) },
        mountbody {
            hostname: mount::name(b"other".to_vec()),
            directory: dirpath(b"/srv".to_vec()),
        },
    ]));
    ctx.check(&exportlist(vec![exportbody { filesys: dirpath(b"/".to_vec()), groups: vec![] }]));

    assert_eq!(encode(&mountlist::default()), 0u32.to_be_bytes());
}

fn sample_credential() -> auth_unix {
    auth_unix {
        stamp: 7,
        machinename: b"client".to_vec(),
        uid: 1000,
        gid: 100,
        gids: vec![100, 200],
    }
}

fn call_with_cred(flavor: u32, cred: &auth_unix) -> call_body {
    call_body {
        rpcvers: 2,
        prog: nfs2::PROGRAM,
        vers: nfs2::VERSION,
        proc: 0,
        cred: opaque_auth { flavor, body: encode(cred) },
        verf: opaque_auth::default(),
    }
}

#[test]
fn test_auth_unix_credential() {
    let cred = sample_credential();
    let mut ctx = Context::default();
    ctx.check(&cred);
    // stamp, name length, padded name, uid, gid, group count, two groups
    assert_eq!(encode(&cred).len(), 36);
}

#[test]
fn test_unix_credential_from_call() {
    let cred = sample_credential();
    let call = call_with_cred(auth_flavor::AUTH_UNIX, &cred);
    assert_eq!(call.unix_credential().expect("valid credential"), Some(cred.clone()));

    let call = call_with_cred(auth_flavor::AUTH_NULL, &cred);
    assert_eq!(call.unix_credential().expect("null flavor"), None);

    let crowded = auth_unix { gids: vec![1; 17], ..sample_credential() };
    assert!(call_with_cred(auth_flavor::AUTH_UNIX, &crowded).unix_credential().is_err());

    let long_host = auth_unix { machinename: vec![b'h'; 256], ..sample_credential() };
    assert!(call_with_cred(auth_flavor::AUTH_UNIX, &long_host).unix_credential().is_err());
}
