//! `open` / `openat` / `creat` / `close` / `close_range` / `mknod`.

use crate::consts;
use crate::descriptor::FileDescriptor;
use crate::error::{Errno, FsResult};
use crate::flags::OpenFlags;
use crate::fs::FsState;
use crate::inode::Inode;
use crate::path::{self, Resolution};
use crate::slab::Identified;
use crate::time::Timestamp;

fn wanted_access(flags: OpenFlags) -> i32 {
    let mut want = if flags.is_wronly() {
        consts::W_OK
    } else if flags.is_rdwr() {
        consts::R_OK | consts::W_OK
    } else {
        consts::R_OK
    };
    if flags.contains(OpenFlags::O_TRUNC) {
        want |= consts::W_OK;
    }
    want
}

pub fn openat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, raw_flags: i32, mode: u32) -> FsResult<i64> {
    let flags = OpenFlags::from_bits_truncate(raw_flags);
    let base = state.resolve_dirfd(dirfd)?;

    if flags.contains(OpenFlags::O_TMPFILE) {
        if flags.contains(OpenFlags::O_CREAT) {
            return Err(Errno::Inval);
        }
        if !flags.writable() {
            return Err(Errno::Inval);
        }
        let parent_id = match state.resolve(base, path_str, true)? {
            Resolution::Found(r) => r.inode_id,
            Resolution::Missing(_) => return Err(Errno::Noent),
        };
        {
            let parent = state.inode(parent_id)?;
            if !parent.is_dir() {
                return Err(Errno::Notdir);
            }
        }
        let effective = state.effective_mode(mode);
        let mut inode = Inode::new_regular(effective, now);
        inode.nlink = 0;
        let new_id = state.inodes.insert(inode);
        let fd = state.descriptors.insert(FileDescriptor::new(new_id, flags));
        return Ok(fd as i64);
    }

    let resolution = state.resolve(base, path_str, true)?;
    let inode_id = match resolution {
        Resolution::Found(r) => {
            if flags.contains(OpenFlags::O_CREAT) && flags.contains(OpenFlags::O_EXCL) {
                return Err(Errno::Exist);
            }
            r.inode_id
        }
        Resolution::Missing(nf) => {
            if !flags.contains(OpenFlags::O_CREAT) {
                return Err(Errno::Noent);
            }
            let parent = state.inode_mut(nf.parent_id)?;
            if !parent.is_dir() {
                return Err(Errno::Notdir);
            }
            if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
                return Err(Errno::Acces);
            }
            let effective = state.effective_mode(mode);
            let new_id = state.inodes.insert(Inode::new_regular(effective, now));
            let parent = state.inode_mut(nf.parent_id)?;
            let entries = parent.as_dir_mut().expect("checked is_dir above");
            crate::dirent::push(entries, &nf.name, new_id)?;
            parent.touch_mtime(now);
            new_id
        }
    };

    let inode = state.inode(inode_id)?;
    if flags.contains(OpenFlags::O_NOFOLLOW) && inode.is_symlink() {
        return Err(Errno::Loop_);
    }
    if flags.contains(OpenFlags::O_DIRECTORY) && !inode.is_dir() {
        return Err(Errno::Notdir);
    }
    if inode.is_dir() && flags.writable() {
        return Err(Errno::Isdir);
    }
    if !path::access_allowed(inode.mode, wanted_access(flags)) {
        return Err(Errno::Acces);
    }

    if flags.contains(OpenFlags::O_TRUNC) && inode.is_regular() {
        let inode = state.inode_mut(inode_id)?;
        if let Some((data, size)) = inode.as_regular_mut() {
            data.clear();
            *size = 0;
        }
        inode.touch_mtime(now);
    }

    if !flags.contains(OpenFlags::O_NOATIME) {
        let inode = state.inode_mut(inode_id)?;
        inode.touch_atime(now);
    }

    let fd = state.descriptors.insert(FileDescriptor::new(inode_id, flags));
    Ok(fd as i64)
}

pub fn open(state: &mut FsState, now: Timestamp, path_str: &str, flags: i32, mode: u32) -> FsResult<i64> {
    openat(state, now, consts::AT_FDCWD as i32, path_str, flags, mode)
}

pub fn creat(state: &mut FsState, now: Timestamp, path_str: &str, mode: u32) -> FsResult<i64> {
    open(state, now, path_str, consts::O_WRONLY | consts::O_CREAT | consts::O_TRUNC, mode)
}

pub fn close(state: &mut FsState, fd: i32) -> FsResult<i64> {
    if fd < 0 {
        return Err(Errno::Badf);
    }
    let desc = state.descriptors.remove(fd as u64).ok_or(Errno::Badf)?;
    state.maybe_free_inode(desc.inode_id);
    Ok(0)
}

pub fn close_range(state: &mut FsState, fd: u32, max_fd: u32, flags: u32) -> FsResult<i64> {
    if flags != 0 || fd > max_fd {
        return Err(Errno::Inval);
    }
    let ids: Vec<u64> = state
        .descriptors
        .iter()
        .map(|d| d.id())
        .filter(|id| *id >= fd as u64 && *id <= max_fd as u64)
        .collect();
    for id in ids {
        if let Some(desc) = state.descriptors.remove(id) {
            state.maybe_free_inode(desc.inode_id);
        }
    }
    Ok(0)
}

pub fn mknodat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, mode: u32, _dev: u64) -> FsResult<i64> {
    let type_bits = mode & consts::S_IFMT;
    if type_bits != 0 && type_bits != consts::S_IFREG {
        return Err(Errno::Opnotsupp);
    }
    let base = state.resolve_dirfd(dirfd)?;
    let nf = match state.resolve(base, path_str, false)? {
        Resolution::Found(_) => return Err(Errno::Exist),
        Resolution::Missing(nf) => nf,
    };
    let parent = state.inode(nf.parent_id)?;
    if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
        return Err(Errno::Acces);
    }
    let effective = state.effective_mode(mode);
    let new_id = state.inodes.insert(Inode::new_regular(effective, now));
    let parent = state.inode_mut(nf.parent_id)?;
    let entries = parent.as_dir_mut().expect("checked is_dir above");
    crate::dirent::push(entries, &nf.name, new_id)?;
    parent.touch_mtime(now);
    Ok(0)
}

pub fn mknod(state: &mut FsState, now: Timestamp, path_str: &str, mode: u32, dev: u64) -> FsResult<i64> {
    mknodat(state, now, consts::AT_FDCWD as i32, path_str, mode, dev)
}
