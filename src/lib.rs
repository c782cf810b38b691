//! `rvfs`: an in-memory virtual filesystem emulating the Linux VFS
//! path/fd/inode surface — path resolution with symlink following, sparse
//! regular-file data, directories, symlinks, extended attributes, and a
//! binary snapshot codec, all behind one coarse lock.
//!
//! The crate has no CLI and never touches real disk I/O; [`Filesystem`] is
//! the entire public surface, generic over an injected lock ([`RawLock`])
//! and clock ([`Clock`]) so a host can supply its own primitives.

pub mod consts;
pub mod cwd;
pub mod descriptor;
pub mod dirent;
pub mod error;
pub mod flags;
pub mod fs;
pub mod inode;
pub mod lock;
mod ops;
pub mod path;
pub mod slab;
pub mod snapshot;
pub mod sparse;
pub mod stat;
pub mod time;
pub mod xattr;

use std::io::{Read, Write};

pub use descriptor::FileDescriptor;
pub use error::{to_raw, Errno, FsResult};
pub use flags::{AtFlags, FallocateFlags, OpenFlags, RenameFlags, StatxMask, XattrFlags};
pub use fs::{FsState, Filesystem, ROOT_ID};
pub use inode::{Inode, Payload};
pub use lock::{DefaultLock, RawLock};
pub use stat::{Stat, Statx};
pub use time::{Clock, SystemClock, Timestamp, UtimeSpec};

impl<L, C> Filesystem<L, C>
where
    L: RawLock<FsState>,
    C: Clock,
{
    pub fn openat(&self, dirfd: i32, path: &str, flags: i32, mode: u32) -> FsResult<i64> {
        self.with_state("openat", |s, now| ops::open::openat(s, now, dirfd, path, flags, mode))
    }
    pub fn openat_raw(&self, dirfd: i32, path: &str, flags: i32, mode: u32) -> i64 {
        to_raw(self.openat(dirfd, path, flags, mode))
    }

    pub fn open(&self, path: &str, flags: i32, mode: u32) -> FsResult<i64> {
        self.with_state("open", |s, now| ops::open::open(s, now, path, flags, mode))
    }
    pub fn open_raw(&self, path: &str, flags: i32, mode: u32) -> i64 {
        to_raw(self.open(path, flags, mode))
    }

    pub fn creat(&self, path: &str, mode: u32) -> FsResult<i64> {
        self.with_state("creat", |s, now| ops::open::creat(s, now, path, mode))
    }
    pub fn creat_raw(&self, path: &str, mode: u32) -> i64 {
        to_raw(self.creat(path, mode))
    }

    pub fn close(&self, fd: i32) -> FsResult<i64> {
        self.with_state("close", |s, _now| ops::open::close(s, fd))
    }
    pub fn close_raw(&self, fd: i32) -> i64 {
        to_raw(self.close(fd))
    }

    pub fn close_range(&self, fd: u32, max_fd: u32, flags: u32) -> FsResult<i64> {
        self.with_state("close_range", |s, _now| ops::open::close_range(s, fd, max_fd, flags))
    }
    pub fn close_range_raw(&self, fd: u32, max_fd: u32, flags: u32) -> i64 {
        to_raw(self.close_range(fd, max_fd, flags))
    }

    pub fn mknodat(&self, dirfd: i32, path: &str, mode: u32, dev: u64) -> FsResult<i64> {
        self.with_state("mknodat", |s, now| ops::open::mknodat(s, now, dirfd, path, mode, dev))
    }
    pub fn mknodat_raw(&self, dirfd: i32, path: &str, mode: u32, dev: u64) -> i64 {
        to_raw(self.mknodat(dirfd, path, mode, dev))
    }

    pub fn mknod(&self, path: &str, mode: u32, dev: u64) -> FsResult<i64> {
        self.with_state("mknod", |s, now| ops::open::mknod(s, now, path, mode, dev))
    }
    pub fn mknod_raw(&self, path: &str, mode: u32, dev: u64) -> i64 {
        to_raw(self.mknod(path, mode, dev))
    }

    pub fn faccessat2(&self, dirfd: i32, path: &str, mode: i32, flags: i32) -> FsResult<i64> {
        self.with_state("faccessat2", |s, _now| ops::access::faccessat2(s, dirfd, path, mode, flags))
    }
    pub fn faccessat2_raw(&self, dirfd: i32, path: &str, mode: i32, flags: i32) -> i64 {
        to_raw(self.faccessat2(dirfd, path, mode, flags))
    }

    pub fn faccessat(&self, dirfd: i32, path: &str, mode: i32) -> FsResult<i64> {
        self.with_state("faccessat", |s, _now| ops::access::faccessat(s, dirfd, path, mode))
    }
    pub fn faccessat_raw(&self, dirfd: i32, path: &str, mode: i32) -> i64 {
        to_raw(self.faccessat(dirfd, path, mode))
    }

    pub fn access(&self, path: &str, mode: i32) -> FsResult<i64> {
        self.with_state("access", |s, _now| ops::access::access(s, path, mode))
    }
    pub fn access_raw(&self, path: &str, mode: i32) -> i64 {
        to_raw(self.access(path, mode))
    }

    pub fn mkdirat(&self, dirfd: i32, path: &str, mode: u32) -> FsResult<i64> {
        self.with_state("mkdirat", |s, now| ops::dir::mkdirat(s, now, dirfd, path, mode))
    }
    pub fn mkdirat_raw(&self, dirfd: i32, path: &str, mode: u32) -> i64 {
        to_raw(self.mkdirat(dirfd, path, mode))
    }

    pub fn mkdir(&self, path: &str, mode: u32) -> FsResult<i64> {
        self.with_state("mkdir", |s, now| ops::dir::mkdir(s, now, path, mode))
    }
    pub fn mkdir_raw(&self, path: &str, mode: u32) -> i64 {
        to_raw(self.mkdir(path, mode))
    }

    pub fn unlinkat(&self, dirfd: i32, path: &str, flags: i32) -> FsResult<i64> {
        self.with_state("unlinkat", |s, now| ops::dir::unlinkat(s, now, dirfd, path, flags))
    }
    pub fn unlinkat_raw(&self, dirfd: i32, path: &str, flags: i32) -> i64 {
        to_raw(self.unlinkat(dirfd, path, flags))
    }

    pub fn unlink(&self, path: &str) -> FsResult<i64> {
        self.with_state("unlink", |s, now| ops::dir::unlink(s, now, path))
    }
    pub fn unlink_raw(&self, path: &str) -> i64 {
        to_raw(self.unlink(path))
    }

    pub fn rmdir(&self, path: &str) -> FsResult<i64> {
        self.with_state("rmdir", |s, now| ops::dir::rmdir(s, now, path))
    }
    pub fn rmdir_raw(&self, path: &str) -> i64 {
        to_raw(self.rmdir(path))
    }

    pub fn linkat(&self, old_dirfd: i32, old_path: &str, new_dirfd: i32, new_path: &str, flags: i32) -> FsResult<i64> {
        self.with_state("linkat", |s, now| {
            ops::dir::linkat(s, now, old_dirfd, old_path, new_dirfd, new_path, flags)
        })
    }
    pub fn linkat_raw(&self, old_dirfd: i32, old_path: &str, new_dirfd: i32, new_path: &str, flags: i32) -> i64 {
        to_raw(self.linkat(old_dirfd, old_path, new_dirfd, new_path, flags))
    }

    pub fn link(&self, old_path: &str, new_path: &str) -> FsResult<i64> {
        self.with_state("link", |s, now| ops::dir::link(s, now, old_path, new_path))
    }
    pub fn link_raw(&self, old_path: &str, new_path: &str) -> i64 {
        to_raw(self.link(old_path, new_path))
    }

    pub fn symlinkat(&self, target: &str, new_dirfd: i32, new_path: &str) -> FsResult<i64> {
        self.with_state("symlinkat", |s, now| ops::dir::symlinkat(s, now, target, new_dirfd, new_path))
    }
    pub fn symlinkat_raw(&self, target: &str, new_dirfd: i32, new_path: &str) -> i64 {
        to_raw(self.symlinkat(target, new_dirfd, new_path))
    }

    pub fn symlink(&self, target: &str, new_path: &str) -> FsResult<i64> {
        self.with_state("symlink", |s, now| ops::dir::symlink(s, now, target, new_path))
    }
    pub fn symlink_raw(&self, target: &str, new_path: &str) -> i64 {
        to_raw(self.symlink(target, new_path))
    }

    pub fn readlinkat(&self, dirfd: i32, path: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("readlinkat", |s, now| ops::dir::readlinkat(s, now, dirfd, path, buf))
    }
    pub fn readlinkat_raw(&self, dirfd: i32, path: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.readlinkat(dirfd, path, buf))
    }

    pub fn readlink(&self, path: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("readlink", |s, now| ops::dir::readlink(s, now, path, buf))
    }
    pub fn readlink_raw(&self, path: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.readlink(path, buf))
    }

    pub fn renameat2(&self, old_dirfd: i32, old_path: &str, new_dirfd: i32, new_path: &str, flags: u32) -> FsResult<i64> {
        self.with_state("renameat2", |s, now| {
            ops::dir::renameat2(s, now, old_dirfd, old_path, new_dirfd, new_path, flags)
        })
    }
    pub fn renameat2_raw(&self, old_dirfd: i32, old_path: &str, new_dirfd: i32, new_path: &str, flags: u32) -> i64 {
        to_raw(self.renameat2(old_dirfd, old_path, new_dirfd, new_path, flags))
    }

    pub fn rename(&self, old_path: &str, new_path: &str) -> FsResult<i64> {
        self.with_state("rename", |s, now| ops::dir::rename(s, now, old_path, new_path))
    }
    pub fn rename_raw(&self, old_path: &str, new_path: &str) -> i64 {
        to_raw(self.rename(old_path, new_path))
    }

    pub fn chdir(&self, path: &str) -> FsResult<i64> {
        self.with_state("chdir", |s, now| ops::dir::chdir(s, now, path))
    }
    pub fn chdir_raw(&self, path: &str) -> i64 {
        to_raw(self.chdir(path))
    }

    pub fn getcwd(&self, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("getcwd", |s, _now| ops::dir::getcwd(s, buf))
    }
    pub fn getcwd_raw(&self, buf: &mut [u8]) -> i64 {
        to_raw(self.getcwd(buf))
    }

    pub fn umask(&self, mask: u32) -> i64 {
        self.with_state("umask", |s, _now| Ok(ops::dir::umask(s, mask))).unwrap()
    }

    pub fn read(&self, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("read", |s, now| ops::io::read(s, now, fd, buf))
    }
    pub fn read_raw(&self, fd: i32, buf: &mut [u8]) -> i64 {
        to_raw(self.read(fd, buf))
    }

    pub fn write(&self, fd: i32, buf: &[u8]) -> FsResult<i64> {
        self.with_state("write", |s, now| ops::io::write(s, now, fd, buf))
    }
    pub fn write_raw(&self, fd: i32, buf: &[u8]) -> i64 {
        to_raw(self.write(fd, buf))
    }

    pub fn pread(&self, fd: i32, buf: &mut [u8], offset: u64) -> FsResult<i64> {
        self.with_state("pread", |s, now| ops::io::pread_at(s, now, fd, buf, offset))
    }
    pub fn pread_raw(&self, fd: i32, buf: &mut [u8], offset: u64) -> i64 {
        to_raw(self.pread(fd, buf, offset))
    }

    pub fn pwrite(&self, fd: i32, buf: &[u8], offset: u64) -> FsResult<i64> {
        self.with_state("pwrite", |s, now| ops::io::pwrite_at(s, now, fd, buf, offset))
    }
    pub fn pwrite_raw(&self, fd: i32, buf: &[u8], offset: u64) -> i64 {
        to_raw(self.pwrite(fd, buf, offset))
    }

    pub fn readv(&self, fd: i32, bufs: &mut [&mut [u8]]) -> FsResult<i64> {
        self.with_state("readv", |s, now| ops::io::readv(s, now, fd, bufs))
    }
    pub fn readv_raw(&self, fd: i32, bufs: &mut [&mut [u8]]) -> i64 {
        to_raw(self.readv(fd, bufs))
    }

    pub fn writev(&self, fd: i32, bufs: &[&[u8]]) -> FsResult<i64> {
        self.with_state("writev", |s, now| ops::io::writev(s, now, fd, bufs))
    }
    pub fn writev_raw(&self, fd: i32, bufs: &[&[u8]]) -> i64 {
        to_raw(self.writev(fd, bufs))
    }

    pub fn preadv(&self, fd: i32, bufs: &mut [&mut [u8]], offset: u64) -> FsResult<i64> {
        self.with_state("preadv", |s, now| ops::io::preadv(s, now, fd, bufs, offset))
    }
    pub fn preadv_raw(&self, fd: i32, bufs: &mut [&mut [u8]], offset: u64) -> i64 {
        to_raw(self.preadv(fd, bufs, offset))
    }

    pub fn pwritev(&self, fd: i32, bufs: &[&[u8]], offset: u64) -> FsResult<i64> {
        self.with_state("pwritev", |s, now| ops::io::pwritev(s, now, fd, bufs, offset))
    }
    pub fn pwritev_raw(&self, fd: i32, bufs: &[&[u8]], offset: u64) -> i64 {
        to_raw(self.pwritev(fd, bufs, offset))
    }

    pub fn lseek(&self, fd: i32, offset: i64, whence: i32) -> FsResult<i64> {
        self.with_state("lseek", |s, _now| ops::io::lseek(s, fd, offset, whence))
    }
    pub fn lseek_raw(&self, fd: i32, offset: i64, whence: i32) -> i64 {
        to_raw(self.lseek(fd, offset, whence))
    }

    pub fn fallocate(&self, fd: i32, mode: i32, offset: i64, len: i64) -> FsResult<i64> {
        self.with_state("fallocate", |s, now| ops::io::fallocate(s, now, fd, mode, offset, len))
    }
    pub fn fallocate_raw(&self, fd: i32, mode: i32, offset: i64, len: i64) -> i64 {
        to_raw(self.fallocate(fd, mode, offset, len))
    }

    pub fn ftruncate(&self, fd: i32, length: i64) -> FsResult<i64> {
        self.with_state("ftruncate", |s, now| ops::io::ftruncate(s, now, fd, length))
    }
    pub fn ftruncate_raw(&self, fd: i32, length: i64) -> i64 {
        to_raw(self.ftruncate(fd, length))
    }

    pub fn truncate(&self, path: &str, length: i64) -> FsResult<i64> {
        self.with_state("truncate", |s, now| {
            let base = s.cwd.inode_id;
            ops::io::truncate(s, now, base, path, length)
        })
    }
    pub fn truncate_raw(&self, path: &str, length: i64) -> i64 {
        to_raw(self.truncate(path, length))
    }

    pub fn sendfile(&self, fd_out: i32, fd_in: i32, in_offset: Option<i64>, count: usize) -> FsResult<i64> {
        self.with_state("sendfile", |s, now| ops::io::sendfile(s, now, fd_out, fd_in, in_offset, count))
    }
    pub fn sendfile_raw(&self, fd_out: i32, fd_in: i32, in_offset: Option<i64>, count: usize) -> i64 {
        to_raw(self.sendfile(fd_out, fd_in, in_offset, count))
    }

    pub fn stat(&self, path: &str) -> FsResult<Stat> {
        self.with_state("stat", |s, _now| ops::stat_ops::stat(s, path))
    }

    pub fn lstat(&self, path: &str) -> FsResult<Stat> {
        self.with_state("lstat", |s, _now| ops::stat_ops::lstat(s, path))
    }

    pub fn fstat(&self, fd: i32) -> FsResult<Stat> {
        self.with_state("fstat", |s, _now| ops::stat_ops::fstat(s, fd))
    }

    pub fn fstatat(&self, dirfd: i32, path: &str, flags: i32) -> FsResult<Stat> {
        self.with_state("fstatat", |s, _now| ops::stat_ops::fstatat(s, dirfd, path, flags))
    }

    pub fn statx(&self, dirfd: i32, path: &str, flags: i32, mask: u32) -> FsResult<Statx> {
        self.with_state("statx", |s, _now| ops::stat_ops::statx(s, dirfd, path, flags, mask))
    }

    pub fn fchmodat(&self, dirfd: i32, path: &str, mode: u32, flags: i32) -> FsResult<i64> {
        self.with_state("fchmodat", |s, now| ops::stat_ops::fchmodat(s, now, dirfd, path, mode, flags))
    }
    pub fn fchmodat_raw(&self, dirfd: i32, path: &str, mode: u32, flags: i32) -> i64 {
        to_raw(self.fchmodat(dirfd, path, mode, flags))
    }

    pub fn chmod(&self, path: &str, mode: u32) -> FsResult<i64> {
        self.with_state("chmod", |s, now| ops::stat_ops::chmod(s, now, path, mode))
    }
    pub fn chmod_raw(&self, path: &str, mode: u32) -> i64 {
        to_raw(self.chmod(path, mode))
    }

    pub fn fchmod(&self, fd: i32, mode: u32) -> FsResult<i64> {
        self.with_state("fchmod", |s, now| ops::stat_ops::fchmod(s, now, fd, mode))
    }
    pub fn fchmod_raw(&self, fd: i32, mode: u32) -> i64 {
        to_raw(self.fchmod(fd, mode))
    }

    pub fn getdents(&self, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("getdents", |s, now| ops::stat_ops::getdents(s, now, fd, buf))
    }
    pub fn getdents_raw(&self, fd: i32, buf: &mut [u8]) -> i64 {
        to_raw(self.getdents(fd, buf))
    }

    pub fn utimensat(&self, dirfd: i32, path: &str, atime: UtimeSpec, mtime: UtimeSpec, flags: i32) -> FsResult<i64> {
        self.with_state("utimensat", |s, now| ops::stat_ops::utimensat(s, now, dirfd, path, atime, mtime, flags))
    }
    pub fn utimensat_raw(&self, dirfd: i32, path: &str, atime: UtimeSpec, mtime: UtimeSpec, flags: i32) -> i64 {
        to_raw(self.utimensat(dirfd, path, atime, mtime, flags))
    }

    pub fn utime(&self, path: &str, times: Option<(i64, i64)>) -> FsResult<i64> {
        self.with_state("utime", |s, now| ops::stat_ops::utime(s, now, path, times))
    }
    pub fn utime_raw(&self, path: &str, times: Option<(i64, i64)>) -> i64 {
        to_raw(self.utime(path, times))
    }

    pub fn futimesat(&self, dirfd: i32, path: &str, times: Option<[(i64, i64); 2]>) -> FsResult<i64> {
        self.with_state("futimesat", |s, now| ops::stat_ops::futimesat(s, now, dirfd, path, times))
    }
    pub fn futimesat_raw(&self, dirfd: i32, path: &str, times: Option<[(i64, i64); 2]>) -> i64 {
        to_raw(self.futimesat(dirfd, path, times))
    }

    pub fn utimes(&self, path: &str, times: Option<[(i64, i64); 2]>) -> FsResult<i64> {
        self.with_state("utimes", |s, now| ops::stat_ops::utimes(s, now, path, times))
    }
    pub fn utimes_raw(&self, path: &str, times: Option<[(i64, i64); 2]>) -> i64 {
        to_raw(self.utimes(path, times))
    }

    pub fn getxattr(&self, path: &str, name: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("getxattr", |s, _now| ops::xattr_ops::getxattr(s, path, name, buf))
    }
    pub fn getxattr_raw(&self, path: &str, name: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.getxattr(path, name, buf))
    }

    pub fn lgetxattr(&self, path: &str, name: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("lgetxattr", |s, _now| ops::xattr_ops::lgetxattr(s, path, name, buf))
    }
    pub fn lgetxattr_raw(&self, path: &str, name: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.lgetxattr(path, name, buf))
    }

    pub fn fgetxattr(&self, fd: i32, name: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("fgetxattr", |s, _now| ops::xattr_ops::fgetxattr(s, fd, name, buf))
    }
    pub fn fgetxattr_raw(&self, fd: i32, name: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.fgetxattr(fd, name, buf))
    }

    pub fn setxattr(&self, path: &str, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
        self.with_state("setxattr", |s, now| ops::xattr_ops::setxattr(s, now, path, name, value, flags))
    }
    pub fn setxattr_raw(&self, path: &str, name: &str, value: &[u8], flags: i32) -> i64 {
        to_raw(self.setxattr(path, name, value, flags))
    }

    pub fn lsetxattr(&self, path: &str, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
        self.with_state("lsetxattr", |s, now| ops::xattr_ops::lsetxattr(s, now, path, name, value, flags))
    }
    pub fn lsetxattr_raw(&self, path: &str, name: &str, value: &[u8], flags: i32) -> i64 {
        to_raw(self.lsetxattr(path, name, value, flags))
    }

    pub fn fsetxattr(&self, fd: i32, name: &str, value: &[u8], flags: i32) -> FsResult<i64> {
        self.with_state("fsetxattr", |s, now| ops::xattr_ops::fsetxattr(s, now, fd, name, value, flags))
    }
    pub fn fsetxattr_raw(&self, fd: i32, name: &str, value: &[u8], flags: i32) -> i64 {
        to_raw(self.fsetxattr(fd, name, value, flags))
    }

    pub fn removexattr(&self, path: &str, name: &str) -> FsResult<i64> {
        self.with_state("removexattr", |s, now| ops::xattr_ops::removexattr(s, now, path, name))
    }
    pub fn removexattr_raw(&self, path: &str, name: &str) -> i64 {
        to_raw(self.removexattr(path, name))
    }

    pub fn lremovexattr(&self, path: &str, name: &str) -> FsResult<i64> {
        self.with_state("lremovexattr", |s, now| ops::xattr_ops::lremovexattr(s, now, path, name))
    }
    pub fn lremovexattr_raw(&self, path: &str, name: &str) -> i64 {
        to_raw(self.lremovexattr(path, name))
    }

    pub fn fremovexattr(&self, fd: i32, name: &str) -> FsResult<i64> {
        self.with_state("fremovexattr", |s, now| ops::xattr_ops::fremovexattr(s, now, fd, name))
    }
    pub fn fremovexattr_raw(&self, fd: i32, name: &str) -> i64 {
        to_raw(self.fremovexattr(fd, name))
    }

    pub fn listxattr(&self, path: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("listxattr", |s, _now| ops::xattr_ops::listxattr(s, path, buf))
    }
    pub fn listxattr_raw(&self, path: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.listxattr(path, buf))
    }

    pub fn llistxattr(&self, path: &str, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("llistxattr", |s, _now| ops::xattr_ops::llistxattr(s, path, buf))
    }
    pub fn llistxattr_raw(&self, path: &str, buf: &mut [u8]) -> i64 {
        to_raw(self.llistxattr(path, buf))
    }

    pub fn flistxattr(&self, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
        self.with_state("flistxattr", |s, _now| ops::xattr_ops::flistxattr(s, fd, buf))
    }
    pub fn flistxattr_raw(&self, fd: i32, buf: &mut [u8]) -> i64 {
        to_raw(self.flistxattr(fd, buf))
    }

    /// Dumps the whole tree to `w`. Snapshots are only byte-compatible
    /// between processes of matching endianness — see [`snapshot`].
    pub fn dump_to_writer(&self, w: &mut impl Write) -> std::io::Result<()> {
        log::trace!("dump_to_writer");
        let guard = self.state.lock();
        snapshot::dump_to_writer(&guard, w)
    }

    /// Replaces this filesystem's entire state with the tree decoded from
    /// `r`. Descriptors, cwd, and umask are reset to their fresh-filesystem
    /// defaults; only the inode table is restored.
    pub fn load_from_reader(&self, r: &mut impl Read) -> FsResult<()> {
        log::trace!("load_from_reader");
        let loaded = snapshot::load_from_reader(r).map_err(|e| {
            log::debug!("load_from_reader failed: {e}");
            e
        })?;
        *self.state.lock() = loaded;
        Ok(())
    }
}
