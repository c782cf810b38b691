//! `stat`/`statx` result types and the `getdents` record packer.

use crate::consts;
use crate::error::{Errno, FsResult};
use crate::inode::Inode;
use crate::time::Timestamp;

#[derive(Debug, Clone, Copy, Default)]
pub struct Stat {
    pub ino: u64,
    pub mode: u32,
    pub nlink: u32,
    pub size: u64,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
}

pub fn fill_stat(id: u64, inode: &Inode) -> Stat {
    Stat {
        ino: id,
        mode: inode.mode,
        nlink: inode.nlink,
        size: inode.size(),
        atime: inode.atime,
        mtime: inode.mtime,
        ctime: inode.ctime,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Statx {
    pub mask: u32,
    pub ino: u64,
    pub mode: u32,
    pub nlink: u32,
    pub size: u64,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub btime: Timestamp,
}

/// Every field the store can actually report is filled in regardless of
/// `want`; `mask` echoes which of those the caller asked for, per
/// `statx(2)`'s "may return more than requested" allowance.
pub fn fill_statx(id: u64, inode: &Inode, want: u32) -> Statx {
    let supported = consts::STATX_TYPE
        | consts::STATX_MODE
        | consts::STATX_NLINK
        | consts::STATX_ATIME
        | consts::STATX_MTIME
        | consts::STATX_CTIME
        | consts::STATX_INO
        | consts::STATX_SIZE
        | consts::STATX_BTIME;
    Statx {
        mask: want & supported,
        ino: id,
        mode: inode.mode,
        nlink: inode.nlink,
        size: inode.size(),
        atime: inode.atime,
        mtime: inode.mtime,
        ctime: inode.ctime,
        btime: inode.btime,
    }
}

/// Directory entry type byte (`DT_*`) for an inode.
pub fn dtype(inode: &Inode) -> u8 {
    if inode.is_dir() {
        consts::DT_DIR
    } else if inode.is_symlink() {
        consts::DT_LNK
    } else {
        consts::DT_REG
    }
}

/// Word alignment used for packed `getdents` records, matching the
/// fixed-size header (`u64` inode id + `u64` next offset + `u16` reclen +
/// `u8` type = 19 bytes) rounded up with the NUL-terminated name.
const DIRENT_ALIGN: usize = 8;

pub fn dirent_record_len(name: &str) -> usize {
    let raw = 8 + 8 + 2 + 1 + name.len() + 1;
    (raw + DIRENT_ALIGN - 1) / DIRENT_ALIGN * DIRENT_ALIGN
}

/// Packs one `getdents` record into `buf[..]`, returning the record length.
/// Fails with `INVAL` if the record (even alone) cannot fit the buffer —
/// callers use that to distinguish "buffer too small for even one entry"
/// from "stop, buffer full".
pub fn pack_dirent(buf: &mut [u8], inode_id: u64, next_offset: u64, dtype: u8, name: &str) -> FsResult<usize> {
    let reclen = dirent_record_len(name);
    if reclen > buf.len() {
        return Err(Errno::Inval);
    }
    buf[0..8].copy_from_slice(&inode_id.to_ne_bytes());
    buf[8..16].copy_from_slice(&next_offset.to_ne_bytes());
    buf[16..18].copy_from_slice(&(reclen as u16).to_ne_bytes());
    buf[18] = dtype;
    let name_bytes = name.as_bytes();
    buf[19..19 + name_bytes.len()].copy_from_slice(name_bytes);
    buf[19 + name_bytes.len()] = 0;
    for b in &mut buf[19 + name_bytes.len() + 1..reclen] {
        *b = 0;
    }
    Ok(reclen)
}
