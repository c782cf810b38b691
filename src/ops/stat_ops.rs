//! `stat`/`statx`/`chmod`/`getdents`/the `utime` family.

use crate::consts;
use crate::error::{Errno, FsResult};
use crate::flags::OpenFlags;
use crate::fs::FsState;
use crate::path::Resolution;
use crate::stat::{self, Stat, Statx};
use crate::time::{Timestamp, UtimeSpec};

fn resolve_for_stat(state: &FsState, dirfd: i32, path_str: &str, flags: i32) -> FsResult<u64> {
    let base = state.resolve_dirfd(dirfd)?;
    if flags & consts::AT_EMPTY_PATH != 0 && path_str.is_empty() {
        return Ok(base);
    }
    let follow = flags & consts::AT_SYMLINK_NOFOLLOW == 0;
    match state.resolve(base, path_str, follow)? {
        Resolution::Found(r) => Ok(r.inode_id),
        Resolution::Missing(_) => Err(Errno::Noent),
    }
}

pub fn fstatat(state: &FsState, dirfd: i32, path_str: &str, flags: i32) -> FsResult<Stat> {
    let id = resolve_for_stat(state, dirfd, path_str, flags)?;
    let inode = state.inode(id)?;
    Ok(stat::fill_stat(id, inode))
}

pub fn stat(state: &FsState, path_str: &str) -> FsResult<Stat> {
    fstatat(state, consts::AT_FDCWD as i32, path_str, 0)
}

pub fn lstat(state: &FsState, path_str: &str) -> FsResult<Stat> {
    fstatat(state, consts::AT_FDCWD as i32, path_str, consts::AT_SYMLINK_NOFOLLOW)
}

pub fn fstat(state: &FsState, fd: i32) -> FsResult<Stat> {
    let id = state.descriptor(fd)?.inode_id;
    let inode = state.inode(id)?;
    Ok(stat::fill_stat(id, inode))
}

pub fn statx(state: &FsState, dirfd: i32, path_str: &str, flags: i32, mask: u32) -> FsResult<Statx> {
    let id = resolve_for_stat(state, dirfd, path_str, flags)?;
    let inode = state.inode(id)?;
    Ok(stat::fill_statx(id, inode, mask))
}

pub fn fchmodat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, mode: u32, flags: i32) -> FsResult<i64> {
    let follow = flags & consts::AT_SYMLINK_NOFOLLOW == 0;
    let base = state.resolve_dirfd(dirfd)?;
    let id = match state.resolve(base, path_str, follow)? {
        Resolution::Found(r) => r.inode_id,
        Resolution::Missing(_) => return Err(Errno::Noent),
    };
    let inode = state.inode_mut(id)?;
    inode.mode = (inode.mode & consts::S_IFMT) | (mode & 0o7777);
    inode.touch_ctime(now);
    Ok(0)
}

pub fn chmod(state: &mut FsState, now: Timestamp, path_str: &str, mode: u32) -> FsResult<i64> {
    fchmodat(state, now, consts::AT_FDCWD as i32, path_str, mode, 0)
}

pub fn fchmod(state: &mut FsState, now: Timestamp, fd: i32, mode: u32) -> FsResult<i64> {
    let id = state.descriptor(fd)?.inode_id;
    let inode = state.inode_mut(id)?;
    inode.mode = (inode.mode & consts::S_IFMT) | (mode & 0o7777);
    inode.touch_ctime(now);
    Ok(0)
}

pub fn getdents(state: &mut FsState, now: Timestamp, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    let start = desc.seek_offset as usize;
    let mut written = 0usize;
    let mut idx = start;
    {
        let inode = state.inode(desc.inode_id)?;
        if !inode.is_dir() {
            return Err(Errno::Notdir);
        }
        let entries = inode.as_dir().expect("checked is_dir above");
        while idx < entries.len() {
            let e = &entries[idx];
            let child = state.inode(e.inode_id)?;
            let dt = stat::dtype(child);
            let next_offset = (idx + 1) as u64;
            match stat::pack_dirent(&mut buf[written..], e.inode_id, next_offset, dt, &e.name) {
                Ok(reclen) => {
                    written += reclen;
                    idx += 1;
                }
                Err(_) => {
                    if written == 0 {
                        return Err(Errno::Inval);
                    }
                    break;
                }
            }
        }
    }
    state.descriptor_mut(fd)?.seek_offset = idx as u64;
    if !desc.flags.contains(OpenFlags::O_NOATIME) {
        state.inode_mut(desc.inode_id)?.touch_atime(now);
    }
    Ok(written as i64)
}

pub fn utimensat(
    state: &mut FsState,
    now: Timestamp,
    dirfd: i32,
    path_str: &str,
    atime: UtimeSpec,
    mtime: UtimeSpec,
    flags: i32,
) -> FsResult<i64> {
    let id = resolve_for_stat(state, dirfd, path_str, flags)?;
    let inode = state.inode_mut(id)?;
    match atime {
        UtimeSpec::Now => inode.atime = now,
        UtimeSpec::Omit => {}
        UtimeSpec::Set(t) => inode.atime = t,
    }
    match mtime {
        UtimeSpec::Now => inode.mtime = now,
        UtimeSpec::Omit => {}
        UtimeSpec::Set(t) => inode.mtime = t,
    }
    inode.touch_ctime(now);
    Ok(0)
}

/// `utime(2)`: whole-second granularity, `None` means "set both to now".
pub fn utime(state: &mut FsState, now: Timestamp, path_str: &str, times: Option<(i64, i64)>) -> FsResult<i64> {
    let (a, m) = match times {
        None => (UtimeSpec::Now, UtimeSpec::Now),
        Some((actime, modtime)) => (
            UtimeSpec::Set(Timestamp::new(actime, 0)),
            UtimeSpec::Set(Timestamp::new(modtime, 0)),
        ),
    };
    utimensat(state, now, consts::AT_FDCWD as i32, path_str, a, m, 0)
}

/// `futimesat(2)`: microsecond granularity, `[(atime_sec,usec),(mtime_sec,usec)]`.
pub fn futimesat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, times: Option<[(i64, i64); 2]>) -> FsResult<i64> {
    let (a, m) = match times {
        None => (UtimeSpec::Now, UtimeSpec::Now),
        Some([(asec, ausec), (msec, musec)]) => (
            UtimeSpec::Set(Timestamp::new(asec, ausec * 1000)),
            UtimeSpec::Set(Timestamp::new(msec, musec * 1000)),
        ),
    };
    utimensat(state, now, dirfd, path_str, a, m, 0)
}

pub fn utimes(state: &mut FsState, now: Timestamp, path_str: &str, times: Option<[(i64, i64); 2]>) -> FsResult<i64> {
    futimesat(state, now, consts::AT_FDCWD as i32, path_str, times)
}
