//! Ergonomic bitflag newtypes over the raw ABI constants in [`crate::consts`].
//!
//! The raw integer constants remain the public ABI; these wrappers exist so
//! operation bodies can write `flags.contains(OpenFlags::O_CREAT)` instead of
//! raw bit tests.

use bitflags::bitflags;

use crate::consts;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct OpenFlags: i32 {
        const O_WRONLY = consts::O_WRONLY;
        const O_RDWR = consts::O_RDWR;
        const O_CREAT = consts::O_CREAT;
        const O_EXCL = consts::O_EXCL;
        const O_TRUNC = consts::O_TRUNC;
        const O_APPEND = consts::O_APPEND;
        const O_NOFOLLOW = consts::O_NOFOLLOW;
        const O_DIRECTORY = consts::O_DIRECTORY;
        const O_NOATIME = consts::O_NOATIME;
        const O_TMPFILE = consts::O_TMPFILE;
    }
}

impl OpenFlags {
    pub fn accmode(self) -> i32 {
        self.bits() & consts::O_ACCMODE
    }

    pub fn is_wronly(self) -> bool {
        self.accmode() == consts::O_WRONLY
    }

    pub fn is_rdwr(self) -> bool {
        self.accmode() == consts::O_RDWR
    }

    pub fn writable(self) -> bool {
        self.is_wronly() || self.is_rdwr()
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AtFlags: i32 {
        const AT_EMPTY_PATH = consts::AT_EMPTY_PATH;
        const AT_REMOVEDIR = consts::AT_REMOVEDIR;
        const AT_SYMLINK_FOLLOW = consts::AT_SYMLINK_FOLLOW;
        const AT_SYMLINK_NOFOLLOW = consts::AT_SYMLINK_NOFOLLOW;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct RenameFlags: u32 {
        const NOREPLACE = consts::RENAME_NOREPLACE;
        const EXCHANGE = consts::RENAME_EXCHANGE;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct FallocateFlags: i32 {
        const KEEP_SIZE = consts::FALLOC_FL_KEEP_SIZE;
        const PUNCH_HOLE = consts::FALLOC_FL_PUNCH_HOLE;
        const COLLAPSE_RANGE = consts::FALLOC_FL_COLLAPSE_RANGE;
        const ZERO_RANGE = consts::FALLOC_FL_ZERO_RANGE;
        const INSERT_RANGE = consts::FALLOC_FL_INSERT_RANGE;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct XattrFlags: i32 {
        const CREATE = consts::XATTR_CREATE;
        const REPLACE = consts::XATTR_REPLACE;
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatxMask: u32 {
        const TYPE = consts::STATX_TYPE;
        const MODE = consts::STATX_MODE;
        const NLINK = consts::STATX_NLINK;
        const ATIME = consts::STATX_ATIME;
        const MTIME = consts::STATX_MTIME;
        const CTIME = consts::STATX_CTIME;
        const INO = consts::STATX_INO;
        const SIZE = consts::STATX_SIZE;
        const BTIME = consts::STATX_BTIME;
    }
}
