//! Error taxonomy for filesystem operations.
//!
//! Every fallible operation returns `Result<T, Errno>`. The outer
//! [`crate::Filesystem`] methods additionally expose a raw `i64` form for
//! callers that want the traditional "non-negative success / negated error
//! code" convention.

use thiserror::Error;

use crate::consts;

/// One entry per error kind named in the operation surface.
///
/// The numeric value of each variant (via `as i64`) is the POSIX errno this
/// crate's ABI negates on failure; these must match `consts::FS_E*` exactly
/// since snapshot/caller compatibility depends on the exact numbers, not on
/// enum discriminant order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Errno {
    #[error("operation not permitted")]
    Perm = consts::EPERM,
    #[error("no such file or directory")]
    Noent = consts::ENOENT,
    #[error("bad file descriptor")]
    Badf = consts::EBADF,
    #[error("out of memory")]
    Nomem = consts::ENOMEM,
    #[error("permission denied")]
    Acces = consts::EACCES,
    #[error("device or resource busy")]
    Busy = consts::EBUSY,
    #[error("file exists")]
    Exist = consts::EEXIST,
    #[error("no such device")]
    Nodev = consts::ENODEV,
    #[error("not a directory")]
    Notdir = consts::ENOTDIR,
    #[error("is a directory")]
    Isdir = consts::EISDIR,
    #[error("invalid argument")]
    Inval = consts::EINVAL,
    #[error("file too large")]
    Fbig = consts::EFBIG,
    #[error("out of range")]
    Range = consts::ERANGE,
    #[error("operation not supported")]
    Opnotsupp = consts::EOPNOTSUPP,
    #[error("too many levels of symbolic links")]
    Loop_ = consts::ELOOP,
    #[error("file name too long")]
    Nametoolong = consts::ENAMETOOLONG,
    #[error("directory not empty")]
    Notempty = consts::ENOTEMPTY,
    #[error("no data available")]
    Nodata = consts::ENODATA,
    #[error("value too large for defined data type")]
    Overflow = consts::EOVERFLOW,
}

impl Errno {
    /// The POSIX errno value this variant represents.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// The ABI return value for a failing operation: the negated errno.
    pub fn to_raw(self) -> i64 {
        -self.code()
    }
}

/// Result type used throughout the crate's internals.
pub type FsResult<T> = Result<T, Errno>;

/// Converts a `Result<i64, Errno>` into the raw Linux-style return value.
pub fn to_raw(result: FsResult<i64>) -> i64 {
    match result {
        Ok(n) => n,
        Err(e) => e.to_raw(),
    }
}
