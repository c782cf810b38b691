//! `access` / `faccessat` / `faccessat2`.

use crate::consts;
use crate::error::{Errno, FsResult};
use crate::flags::AtFlags;
use crate::fs::FsState;
use crate::path::{self, Resolution};

pub fn faccessat2(state: &FsState, dirfd: i32, path_str: &str, mode: i32, flags: i32) -> FsResult<i64> {
    let known = AtFlags::AT_EMPTY_PATH.bits() | AtFlags::AT_SYMLINK_NOFOLLOW.bits();
    if flags & !known != 0 {
        return Err(Errno::Inval);
    }
    if mode & !(consts::R_OK | consts::W_OK | consts::X_OK) != 0 {
        return Err(Errno::Inval);
    }
    let empty_path = flags & consts::AT_EMPTY_PATH != 0;
    if empty_path && !path_str.is_empty() {
        return Err(Errno::Inval);
    }
    let follow_final = flags & consts::AT_SYMLINK_NOFOLLOW == 0;

    let inode_id = if empty_path {
        state.resolve_dirfd(dirfd)?
    } else {
        let base = state.resolve_dirfd(dirfd)?;
        match state.resolve(base, path_str, follow_final)? {
            Resolution::Found(r) => r.inode_id,
            Resolution::Missing(_) => return Err(Errno::Noent),
        }
    };
    if mode == consts::F_OK {
        state.inode(inode_id)?;
        return Ok(0);
    }
    let inode = state.inode(inode_id)?;
    if !path::access_allowed(inode.mode, mode) {
        return Err(Errno::Acces);
    }
    Ok(0)
}

pub fn faccessat(state: &FsState, dirfd: i32, path_str: &str, mode: i32) -> FsResult<i64> {
    faccessat2(state, dirfd, path_str, mode, 0)
}

pub fn access(state: &FsState, path_str: &str, mode: i32) -> FsResult<i64> {
    faccessat(state, consts::AT_FDCWD as i32, path_str, mode)
}
