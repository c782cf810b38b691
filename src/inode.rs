//! Inode storage.
//!
//! An inode is one of three kinds — regular, directory, symlink — carried as
//! a tagged enum rather than the base-class-plus-downcast shape a C++
//! original would use. Every kind shares the stat-relevant fields
//! (identifier, link count, mode bits, timestamps, xattrs); only the payload
//! differs.

use crate::consts;
use crate::dirent::DirEntry;
use crate::slab::Identified;
use crate::sparse::RangeList;
use crate::time::Timestamp;
use crate::xattr::XattrList;

#[derive(Debug, Clone)]
pub enum Payload {
    Regular { data: RangeList, size: u64 },
    Directory { entries: Vec<DirEntry> },
    Symlink { target: String },
}

#[derive(Debug, Clone)]
pub struct Inode {
    id: u64,
    pub mode: u32,
    pub nlink: u32,
    pub uid: u32,
    pub gid: u32,
    pub atime: Timestamp,
    pub mtime: Timestamp,
    pub ctime: Timestamp,
    pub btime: Timestamp,
    pub xattrs: XattrList,
    pub payload: Payload,
}

impl Identified for Inode {
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl Inode {
    pub fn new_regular(mode: u32, now: Timestamp) -> Self {
        Inode {
            id: 0,
            mode: (mode & !consts::S_IFMT) | consts::S_IFREG,
            nlink: 1,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
            btime: now,
            xattrs: XattrList::default(),
            payload: Payload::Regular {
                data: RangeList::new(),
                size: 0,
            },
        }
    }

    pub fn new_directory(mode: u32, parent_id: u64, self_id_placeholder: u64, now: Timestamp) -> Self {
        let entries = vec![
            DirEntry::new(".", self_id_placeholder),
            DirEntry::new("..", parent_id),
        ];
        Inode {
            id: 0,
            mode: (mode & !consts::S_IFMT) | consts::S_IFDIR,
            nlink: 2,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
            btime: now,
            xattrs: XattrList::default(),
            payload: Payload::Directory { entries },
        }
    }

    pub fn new_symlink(target: &str, now: Timestamp) -> Self {
        Inode {
            id: 0,
            mode: 0o777 | consts::S_IFLNK,
            nlink: 1,
            uid: 0,
            gid: 0,
            atime: now,
            mtime: now,
            ctime: now,
            btime: now,
            xattrs: XattrList::default(),
            payload: Payload::Symlink {
                target: target.to_string(),
            },
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.payload, Payload::Directory { .. })
    }

    pub fn is_regular(&self) -> bool {
        matches!(self.payload, Payload::Regular { .. })
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self.payload, Payload::Symlink { .. })
    }

    pub fn file_type_bits(&self) -> u32 {
        match &self.payload {
            Payload::Regular { .. } => consts::S_IFREG,
            Payload::Directory { .. } => consts::S_IFDIR,
            Payload::Symlink { .. } => consts::S_IFLNK,
        }
    }

    pub fn size(&self) -> u64 {
        match &self.payload {
            Payload::Regular { size, .. } => *size,
            Payload::Directory { entries } => (entries.len() * size_of_dirent()) as u64,
            Payload::Symlink { target } => target.len() as u64,
        }
    }

    pub fn as_regular(&self) -> Option<(&RangeList, u64)> {
        match &self.payload {
            Payload::Regular { data, size } => Some((data, *size)),
            _ => None,
        }
    }

    pub fn as_regular_mut(&mut self) -> Option<(&mut RangeList, &mut u64)> {
        match &mut self.payload {
            Payload::Regular { data, size } => Some((data, size)),
            _ => None,
        }
    }

    pub fn as_dir(&self) -> Option<&[DirEntry]> {
        match &self.payload {
            Payload::Directory { entries } => Some(entries),
            _ => None,
        }
    }

    pub fn as_dir_mut(&mut self) -> Option<&mut Vec<DirEntry>> {
        match &mut self.payload {
            Payload::Directory { entries } => Some(entries),
            _ => None,
        }
    }

    pub fn as_symlink(&self) -> Option<&str> {
        match &self.payload {
            Payload::Symlink { target } => Some(target),
            _ => None,
        }
    }

    pub fn touch_atime(&mut self, now: Timestamp) {
        self.atime = now;
    }

    pub fn touch_mtime(&mut self, now: Timestamp) {
        self.mtime = now;
        self.ctime = now;
    }

    pub fn touch_ctime(&mut self, now: Timestamp) {
        self.ctime = now;
    }
}

/// Nominal directory-entry record size used only to report a plausible
/// `st_size` for directories (no bytes are actually laid out this way).
fn size_of_dirent() -> usize {
    32
}
