//! Directory mutation: `mkdir`, `rmdir`/`unlink`, `link`, `symlink`,
//! `readlink`, `rename`, `chdir`, `getcwd`, `umask`.

use crate::consts;
use crate::dirent;
use crate::error::{Errno, FsResult};
use crate::flags::{AtFlags, RenameFlags};
use crate::fs::{self, FsState};
use crate::inode::Inode;
use crate::path::{self, Resolution};
use crate::time::Timestamp;

pub fn mkdirat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, mode: u32) -> FsResult<i64> {
    let base = state.resolve_dirfd(dirfd)?;
    let nf = match state.resolve(base, path_str, true)? {
        Resolution::Found(_) => return Err(Errno::Exist),
        Resolution::Missing(nf) => nf,
    };
    let parent = state.inode(nf.parent_id)?;
    if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
        return Err(Errno::Acces);
    }
    let effective = state.effective_mode(mode);
    let new_id = state.inodes.insert(Inode::new_directory(effective, nf.parent_id, 0, now));
    {
        let inode = state.inode_mut(new_id)?;
        if let Some(entries) = inode.as_dir_mut() {
            entries[0].inode_id = new_id;
        }
    }
    let parent = state.inode_mut(nf.parent_id)?;
    let entries = parent.as_dir_mut().expect("checked is_dir above");
    dirent::push(entries, &nf.name, new_id)?;
    parent.nlink += 1;
    parent.touch_mtime(now);
    Ok(0)
}

pub fn mkdir(state: &mut FsState, now: Timestamp, path_str: &str, mode: u32) -> FsResult<i64> {
    mkdirat(state, now, consts::AT_FDCWD as i32, path_str, mode)
}

pub fn unlinkat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, flags: i32) -> FsResult<i64> {
    if flags & !AtFlags::AT_REMOVEDIR.bits() != 0 {
        return Err(Errno::Inval);
    }
    let want_dir = flags & consts::AT_REMOVEDIR != 0;
    let base = state.resolve_dirfd(dirfd)?;
    let (parent_id, target_id, name) = match state.resolve(base, path_str, false)? {
        Resolution::Found(r) => (r.parent_id, r.inode_id, r.final_name),
        Resolution::Missing(_) => return Err(Errno::Noent),
    };
    if name == "." {
        return Err(Errno::Inval);
    }
    let parent = state.inode(parent_id)?;
    if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
        return Err(Errno::Acces);
    }
    let target = state.inode(target_id)?;
    if want_dir {
        if !target.is_dir() {
            return Err(Errno::Notdir);
        }
        if target_id == fs::ROOT_ID {
            return Err(Errno::Busy);
        }
        if !dirent::is_empty(target.as_dir().expect("checked is_dir above")) {
            return Err(Errno::Notempty);
        }
        if state.is_referenced(target_id) {
            return Err(Errno::Busy);
        }
    } else if target.is_dir() {
        return Err(Errno::Isdir);
    } else if state.is_referenced(target_id) {
        return Err(Errno::Busy);
    }

    let entries = state.inode_mut(parent_id)?.as_dir_mut().expect("already checked is_dir");
    dirent::remove(entries, &name)?;
    state.inode_mut(parent_id)?.touch_mtime(now);

    let target = state.inode_mut(target_id)?;
    target.nlink = target.nlink.saturating_sub(1);
    target.touch_ctime(now);
    if want_dir {
        state.inode_mut(parent_id)?.nlink -= 1;
    }
    state.maybe_free_inode(target_id);
    Ok(0)
}

pub fn unlink(state: &mut FsState, now: Timestamp, path_str: &str) -> FsResult<i64> {
    unlinkat(state, now, consts::AT_FDCWD as i32, path_str, 0)
}

pub fn rmdir(state: &mut FsState, now: Timestamp, path_str: &str) -> FsResult<i64> {
    unlinkat(state, now, consts::AT_FDCWD as i32, path_str, consts::AT_REMOVEDIR)
}

pub fn linkat(
    state: &mut FsState,
    now: Timestamp,
    old_dirfd: i32,
    old_path: &str,
    new_dirfd: i32,
    new_path: &str,
    flags: i32,
) -> FsResult<i64> {
    let follow = flags & consts::AT_SYMLINK_FOLLOW != 0;
    let old_base = state.resolve_dirfd(old_dirfd)?;
    let target_id = match state.resolve(old_base, old_path, follow)? {
        Resolution::Found(r) => r.inode_id,
        Resolution::Missing(_) => return Err(Errno::Noent),
    };
    if state.inode(target_id)?.is_dir() {
        return Err(Errno::Perm);
    }
    let new_base = state.resolve_dirfd(new_dirfd)?;
    let nf = match state.resolve(new_base, new_path, false)? {
        Resolution::Found(_) => return Err(Errno::Exist),
        Resolution::Missing(nf) => nf,
    };
    let parent = state.inode(nf.parent_id)?;
    if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
        return Err(Errno::Acces);
    }
    let entries = state.inode_mut(nf.parent_id)?.as_dir_mut().expect("checked is_dir above");
    dirent::push(entries, &nf.name, target_id)?;
    state.inode_mut(nf.parent_id)?.touch_mtime(now);
    let inode = state.inode_mut(target_id)?;
    inode.nlink += 1;
    inode.touch_ctime(now);
    Ok(0)
}

pub fn link(state: &mut FsState, now: Timestamp, old_path: &str, new_path: &str) -> FsResult<i64> {
    linkat(state, now, consts::AT_FDCWD as i32, old_path, consts::AT_FDCWD as i32, new_path, 0)
}

pub fn symlinkat(state: &mut FsState, now: Timestamp, target_text: &str, new_dirfd: i32, new_path: &str) -> FsResult<i64> {
    let base = state.resolve_dirfd(new_dirfd)?;
    let nf = match state.resolve(base, new_path, false)? {
        Resolution::Found(_) => return Err(Errno::Exist),
        Resolution::Missing(nf) => nf,
    };
    let parent = state.inode(nf.parent_id)?;
    if !path::access_allowed(parent.mode, consts::W_OK | consts::X_OK) {
        return Err(Errno::Acces);
    }
    let new_id = state.inodes.insert(Inode::new_symlink(target_text, now));
    let parent = state.inode_mut(nf.parent_id)?;
    let entries = parent.as_dir_mut().expect("checked is_dir above");
    dirent::push(entries, &nf.name, new_id)?;
    parent.touch_mtime(now);
    Ok(0)
}

pub fn symlink(state: &mut FsState, now: Timestamp, target_text: &str, new_path: &str) -> FsResult<i64> {
    symlinkat(state, now, target_text, consts::AT_FDCWD as i32, new_path)
}

pub fn readlinkat(state: &mut FsState, now: Timestamp, dirfd: i32, path_str: &str, buf: &mut [u8]) -> FsResult<i64> {
    let base = state.resolve_dirfd(dirfd)?;
    let inode_id = match state.resolve(base, path_str, false)? {
        Resolution::Found(r) => r.inode_id,
        Resolution::Missing(_) => return Err(Errno::Noent),
    };
    let target = {
        let inode = state.inode(inode_id)?;
        inode.as_symlink().ok_or(Errno::Inval)?.to_string()
    };
    let bytes = target.as_bytes();
    let n = bytes.len().min(buf.len());
    buf[..n].copy_from_slice(&bytes[..n]);
    state.inode_mut(inode_id)?.touch_atime(now);
    Ok(n as i64)
}

pub fn readlink(state: &mut FsState, now: Timestamp, path_str: &str, buf: &mut [u8]) -> FsResult<i64> {
    readlinkat(state, now, consts::AT_FDCWD as i32, path_str, buf)
}

fn is_self_or_descendant(state: &FsState, root_id: u64, candidate: u64) -> FsResult<bool> {
    if root_id == candidate {
        return Ok(true);
    }
    let inode = state.inode(root_id)?;
    if let Some(entries) = inode.as_dir() {
        for e in entries {
            if e.name == "." || e.name == ".." {
                continue;
            }
            let child = state.inode(e.inode_id)?;
            if child.is_dir() && is_self_or_descendant(state, e.inode_id, candidate)? {
                return Ok(true);
            }
        }
    }
    Ok(false)
}

fn move_entry(
    state: &mut FsState,
    now: Timestamp,
    old_parent: u64,
    old_name: &str,
    old_id: u64,
    new_parent: u64,
    new_name: &str,
) -> FsResult<()> {
    {
        let op = state.inode(old_parent)?;
        if !path::access_allowed(op.mode, consts::W_OK | consts::X_OK) {
            return Err(Errno::Acces);
        }
        let np = state.inode(new_parent)?;
        if !path::access_allowed(np.mode, consts::W_OK | consts::X_OK) {
            return Err(Errno::Acces);
        }
    }
    {
        let entries = state.inode_mut(old_parent)?.as_dir_mut().expect("checked is_dir above");
        dirent::remove(entries, old_name)?;
    }
    {
        let entries = state.inode_mut(new_parent)?.as_dir_mut().expect("checked is_dir above");
        dirent::push(entries, new_name, old_id)?;
    }
    state.inode_mut(old_parent)?.touch_mtime(now);
    state.inode_mut(new_parent)?.touch_mtime(now);

    if old_parent != new_parent {
        let moved_is_dir = state.inode(old_id)?.is_dir();
        if moved_is_dir {
            let entries = state.inode_mut(old_id)?.as_dir_mut().expect("checked is_dir above");
            dirent::retarget_dotdot(entries, new_parent);
            state.inode_mut(old_parent)?.nlink -= 1;
            state.inode_mut(new_parent)?.nlink += 1;
        }
    }
    Ok(())
}

fn exchange_entries(
    state: &mut FsState,
    now: Timestamp,
    parent_a: u64,
    name_a: &str,
    id_a: u64,
    parent_b: u64,
    name_b: &str,
    id_b: u64,
) -> FsResult<()> {
    {
        let pa = state.inode(parent_a)?;
        if !path::access_allowed(pa.mode, consts::W_OK | consts::X_OK) {
            return Err(Errno::Acces);
        }
        let pb = state.inode(parent_b)?;
        if !path::access_allowed(pb.mode, consts::W_OK | consts::X_OK) {
            return Err(Errno::Acces);
        }
    }
    {
        let entries = state.inode_mut(parent_a)?.as_dir_mut().expect("checked is_dir above");
        if let Some(e) = dirent::find_mut(entries, name_a) {
            e.inode_id = id_b;
        }
    }
    {
        let entries = state.inode_mut(parent_b)?.as_dir_mut().expect("checked is_dir above");
        if let Some(e) = dirent::find_mut(entries, name_b) {
            e.inode_id = id_a;
        }
    }
    state.inode_mut(parent_a)?.touch_mtime(now);
    state.inode_mut(parent_b)?.touch_mtime(now);

    if parent_a != parent_b {
        let a_is_dir = state.inode(id_a)?.is_dir();
        let b_is_dir = state.inode(id_b)?.is_dir();
        if a_is_dir {
            let entries = state.inode_mut(id_a)?.as_dir_mut().expect("checked is_dir above");
            dirent::retarget_dotdot(entries, parent_b);
        }
        if b_is_dir {
            let entries = state.inode_mut(id_b)?.as_dir_mut().expect("checked is_dir above");
            dirent::retarget_dotdot(entries, parent_a);
        }
        match (a_is_dir, b_is_dir) {
            (true, false) => {
                state.inode_mut(parent_a)?.nlink -= 1;
                state.inode_mut(parent_b)?.nlink += 1;
            }
            (false, true) => {
                state.inode_mut(parent_b)?.nlink -= 1;
                state.inode_mut(parent_a)?.nlink += 1;
            }
            _ => {}
        }
    }
    Ok(())
}

fn remove_dirent_and_unlink(
    state: &mut FsState,
    now: Timestamp,
    parent_id: u64,
    name: &str,
    target_id: u64,
    is_dir: bool,
) -> FsResult<()> {
    if state.is_referenced(target_id) {
        return Err(Errno::Busy);
    }
    {
        let entries = state.inode_mut(parent_id)?.as_dir_mut().expect("checked is_dir above");
        dirent::remove(entries, name)?;
    }
    let target = state.inode_mut(target_id)?;
    target.nlink = target.nlink.saturating_sub(1);
    target.touch_ctime(now);
    if is_dir {
        state.inode_mut(parent_id)?.nlink -= 1;
    }
    state.maybe_free_inode(target_id);
    Ok(())
}

pub fn renameat2(
    state: &mut FsState,
    now: Timestamp,
    old_dirfd: i32,
    old_path: &str,
    new_dirfd: i32,
    new_path: &str,
    raw_flags: u32,
) -> FsResult<i64> {
    let flags = RenameFlags::from_bits_truncate(raw_flags);
    if flags.contains(RenameFlags::NOREPLACE) && flags.contains(RenameFlags::EXCHANGE) {
        return Err(Errno::Inval);
    }
    let old_last = path::last_component(old_path);
    let new_last = path::last_component(new_path);
    if old_last == "." || old_last == ".." || new_last == "." || new_last == ".." {
        return Err(Errno::Busy);
    }

    let old_base = state.resolve_dirfd(old_dirfd)?;
    let (old_parent, old_id, old_name) = match state.resolve(old_base, old_path, false)? {
        Resolution::Found(r) => (r.parent_id, r.inode_id, r.final_name),
        Resolution::Missing(_) => return Err(Errno::Noent),
    };

    let new_base = state.resolve_dirfd(new_dirfd)?;
    let new_resolution = state.resolve(new_base, new_path, false)?;
    let new_parent_probe = match &new_resolution {
        Resolution::Found(r) => r.parent_id,
        Resolution::Missing(nf) => nf.parent_id,
    };

    if state.inode(old_id)?.is_dir() && is_self_or_descendant(state, old_id, new_parent_probe)? {
        return Err(Errno::Inval);
    }

    match new_resolution {
        Resolution::Missing(nf) => {
            if flags.contains(RenameFlags::EXCHANGE) {
                return Err(Errno::Noent);
            }
            move_entry(state, now, old_parent, &old_name, old_id, nf.parent_id, &nf.name)
        }
        Resolution::Found(r) => {
            if flags.contains(RenameFlags::EXCHANGE) {
                return exchange_entries(state, now, old_parent, &old_name, old_id, r.parent_id, &r.final_name, r.inode_id)
                    .map(|_| 0);
            }
            if flags.contains(RenameFlags::NOREPLACE) {
                return Err(Errno::Exist);
            }
            let old_is_dir = state.inode(old_id)?.is_dir();
            let dst_is_dir = state.inode(r.inode_id)?.is_dir();
            if old_is_dir && !dst_is_dir {
                return Err(Errno::Notdir);
            }
            if !old_is_dir && dst_is_dir {
                return Err(Errno::Isdir);
            }
            if dst_is_dir {
                let entries = state.inode(r.inode_id)?.as_dir().expect("checked is_dir above");
                if !dirent::is_empty(entries) {
                    return Err(Errno::Notempty);
                }
            }
            remove_dirent_and_unlink(state, now, r.parent_id, &r.final_name, r.inode_id, dst_is_dir)?;
            move_entry(state, now, old_parent, &old_name, old_id, r.parent_id, &r.final_name)
        }
    }
    .map(|_| 0)
}

pub fn rename(state: &mut FsState, now: Timestamp, old_path: &str, new_path: &str) -> FsResult<i64> {
    renameat2(state, now, consts::AT_FDCWD as i32, old_path, consts::AT_FDCWD as i32, new_path, 0)
}

pub fn chdir(state: &mut FsState, _now: Timestamp, path_str: &str) -> FsResult<i64> {
    let r = match state.resolve(state.cwd.inode_id, path_str, true)? {
        Resolution::Found(r) => r,
        Resolution::Missing(_) => return Err(Errno::Noent),
    };
    let inode = state.inode(r.inode_id)?;
    if !inode.is_dir() {
        return Err(Errno::Notdir);
    }
    if !path::access_allowed(inode.mode, consts::X_OK) {
        return Err(Errno::Acces);
    }
    let abs = state.absolute_path(path_str)?;
    state.cwd.set(abs, r.inode_id, r.parent_id);
    Ok(0)
}

pub fn getcwd(state: &FsState, buf: &mut [u8]) -> FsResult<i64> {
    match state.resolve(fs::ROOT_ID, &state.cwd.path, true) {
        Ok(Resolution::Found(r)) if r.inode_id == state.cwd.inode_id => {}
        _ => return Err(Errno::Noent),
    }
    let bytes = state.cwd.path.as_bytes();
    if bytes.len() + 1 > buf.len() {
        return Err(Errno::Range);
    }
    buf[..bytes.len()].copy_from_slice(bytes);
    buf[bytes.len()] = 0;
    Ok((bytes.len() + 1) as i64)
}

pub fn umask(state: &mut FsState, mask: u32) -> i64 {
    let prev = state.umask;
    state.umask = mask & 0o777;
    prev as i64
}
