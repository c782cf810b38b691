//! Extended-attribute operation surface: (path-follow, path-nofollow, fd)
//! variants of get/set/remove/list.

use crate::consts;
use crate::error::{Errno, FsResult};
use crate::fs::FsState;
use crate::path::Resolution;
use crate::time::Timestamp;
use crate::xattr::SetMode;

fn resolve_path_inode(state: &FsState, path_str: &str, follow: bool) -> FsResult<u64> {
    match state.resolve(state.cwd.inode_id, path_str, follow)? {
        Resolution::Found(r) => Ok(r.inode_id),
        Resolution::Missing(_) => Err(Errno::Noent),
    }
}

fn get_from(state: &FsState, inode_id: u64, name: &str, buf: &mut [u8]) -> FsResult<i64> {
    let inode = state.inode(inode_id)?;
    let cap = if buf.is_empty() { 0 } else { buf.len() };
    let value = inode.xattrs.get(name, cap)?;
    let n = value.len().min(buf.len());
    buf[..n].copy_from_slice(&value[..n]);
    Ok(value.len() as i64)
}

pub fn getxattr(state: &FsState, path_str: &str, name: &str, buf: &mut [u8]) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, true)?;
    get_from(state, id, name, buf)
}

pub fn lgetxattr(state: &FsState, path_str: &str, name: &str, buf: &mut [u8]) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, false)?;
    get_from(state, id, name, buf)
}

pub fn fgetxattr(state: &FsState, fd: i32, name: &str, buf: &mut [u8]) -> FsResult<i64> {
    let id = state.descriptor(fd)?.inode_id;
    get_from(state, id, name, buf)
}

fn parse_set_mode(raw_flags: i32) -> FsResult<SetMode> {
    let known = consts::XATTR_CREATE | consts::XATTR_REPLACE;
    if raw_flags & !known != 0 {
        return Err(Errno::Inval);
    }
    match (raw_flags & consts::XATTR_CREATE != 0, raw_flags & consts::XATTR_REPLACE != 0) {
        (true, true) => Err(Errno::Inval),
        (true, false) => Ok(SetMode::Create),
        (false, true) => Ok(SetMode::Replace),
        (false, false) => Ok(SetMode::Any),
    }
}

fn set_on(state: &mut FsState, now: Timestamp, inode_id: u64, name: &str, value: &[u8], raw_flags: i32) -> FsResult<i64> {
    let mode = parse_set_mode(raw_flags)?;
    let inode = state.inode_mut(inode_id)?;
    inode.xattrs.set(name, value, mode)?;
    inode.touch_ctime(now);
    Ok(0)
}

pub fn setxattr(state: &mut FsState, now: Timestamp, path_str: &str, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, true)?;
    set_on(state, now, id, name, value, flags)
}

pub fn lsetxattr(state: &mut FsState, now: Timestamp, path_str: &str, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, false)?;
    set_on(state, now, id, name, value, flags)
}

pub fn fsetxattr(state: &mut FsState, now: Timestamp, fd: i32, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
    let id = state.descriptor(fd)?.inode_id;
    set_on(state, now, id, name, value, flags)
}

fn remove_on(state: &mut FsState, now: Timestamp, inode_id: u64, name: &str) -> FsResult<i64> {
    let inode = state.inode_mut(inode_id)?;
    inode.xattrs.remove(name)?;
    inode.touch_ctime(now);
    Ok(0)
}

pub fn removexattr(state: &mut FsState, now: Timestamp, path_str: &str, name: &str) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, true)?;
    remove_on(state, now, id, name)
}

pub fn lremovexattr(state: &mut FsState, now: Timestamp, path_str: &str, name: &str) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, false)?;
    remove_on(state, now, id, name)
}

pub fn fremovexattr(state: &mut FsState, now: Timestamp, fd: i32, name: &str) -> FsResult<i64> {
    let id = state.descriptor(fd)?.inode_id;
    remove_on(state, now, id, name)
}

fn list_on(state: &FsState, inode_id: u64, buf: &mut [u8]) -> FsResult<i64> {
    let inode = state.inode(inode_id)?;
    let cap = if buf.is_empty() { 0 } else { buf.len() };
    let len = inode.xattrs.list_len(cap)?;
    if !buf.is_empty() {
        let bytes = inode.xattrs.list_bytes();
        buf[..len].copy_from_slice(&bytes[..len]);
    }
    Ok(len as i64)
}

pub fn listxattr(state: &FsState, path_str: &str, buf: &mut [u8]) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, true)?;
    list_on(state, id, buf)
}

pub fn llistxattr(state: &FsState, path_str: &str, buf: &mut [u8]) -> FsResult<i64> {
    let id = resolve_path_inode(state, path_str, false)?;
    list_on(state, id, buf)
}

pub fn flistxattr(state: &FsState, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
    let id = state.descriptor(fd)?.inode_id;
    list_on(state, id, buf)
}
