//! Directory entries: a `(name, inode id)` pair plus the small helpers
//! directory mutation is built from.

use crate::consts;
use crate::error::{Errno, FsResult};

#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub inode_id: u64,
}

impl DirEntry {
    pub fn new(name: &str, inode_id: u64) -> Self {
        DirEntry {
            name: name.to_string(),
            inode_id,
        }
    }
}

/// Looks up `name` among `entries`, rejecting `.`/`..` as callers must
/// handle those separately for operations that treat them specially.
pub fn find<'a>(entries: &'a [DirEntry], name: &str) -> Option<&'a DirEntry> {
    entries.iter().find(|e| e.name == name)
}

pub fn find_mut<'a>(entries: &'a mut [DirEntry], name: &str) -> Option<&'a mut DirEntry> {
    entries.iter_mut().find(|e| e.name == name)
}

pub fn contains(entries: &[DirEntry], name: &str) -> bool {
    find(entries, name).is_some()
}

/// Adds an entry, rejecting a duplicate name and an over-long name.
pub fn push(entries: &mut Vec<DirEntry>, name: &str, inode_id: u64) -> FsResult<()> {
    if name.len() > consts::NAME_MAX {
        return Err(Errno::Nametoolong);
    }
    if contains(entries, name) {
        return Err(Errno::Exist);
    }
    entries.push(DirEntry::new(name, inode_id));
    Ok(())
}

/// Removes the entry named `name`, returning its inode id.
pub fn remove(entries: &mut Vec<DirEntry>, name: &str) -> FsResult<u64> {
    let pos = entries.iter().position(|e| e.name == name).ok_or(Errno::Noent)?;
    Ok(entries.remove(pos).inode_id)
}

/// A directory is empty when it holds only `.` and `..`.
pub fn is_empty(entries: &[DirEntry]) -> bool {
    entries.len() <= 2
}

/// Retargets `..` after the directory is moved to a new parent.
pub fn retarget_dotdot(entries: &mut [DirEntry], new_parent_id: u64) {
    if let Some(e) = find_mut(entries, "..") {
        e.inode_id = new_parent_id;
    }
}
