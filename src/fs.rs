//! The filesystem container: inode table, descriptor table, cwd, umask,
//! and the coarse lock serializing every operation on them.

use crate::consts;
use crate::cwd::Cwd;
use crate::descriptor::FileDescriptor;
use crate::error::{Errno, FsResult};
use crate::inode::Inode;
use crate::lock::{DefaultLock, RawLock};
use crate::path::{self, Resolution};
use crate::slab::DenseTable;
use crate::time::{Clock, SystemClock, Timestamp};

pub const ROOT_ID: u64 = 0;

/// Everything the coarse lock guards.
pub struct FsState {
    pub inodes: DenseTable<Inode>,
    pub descriptors: DenseTable<FileDescriptor>,
    pub cwd: Cwd,
    pub umask: u32,
}

impl FsState {
    fn new(now: Timestamp) -> Self {
        let mut inodes = DenseTable::new();
        let root = Inode::new_directory(0o755, ROOT_ID, ROOT_ID, now);
        inodes.insert(root);
        FsState {
            inodes,
            descriptors: DenseTable::new(),
            cwd: Cwd::root(),
            umask: 0o022,
        }
    }

    /// Reconstructs state from a decoded inode table (snapshot load).
    pub fn from_loaded(inodes: DenseTable<Inode>) -> Self {
        FsState {
            inodes,
            descriptors: DenseTable::new(),
            cwd: Cwd::root(),
            umask: 0o022,
        }
    }

    pub fn root(&self) -> &Inode {
        self.inodes.get(ROOT_ID).expect("root inode always present")
    }

    pub fn inode(&self, id: u64) -> FsResult<&Inode> {
        self.inodes.get(id).ok_or(Errno::Noent)
    }

    pub fn inode_mut(&mut self, id: u64) -> FsResult<&mut Inode> {
        self.inodes.get_mut(id).ok_or(Errno::Noent)
    }

    pub fn descriptor(&self, fd: i32) -> FsResult<&FileDescriptor> {
        if fd < 0 {
            return Err(Errno::Badf);
        }
        self.descriptors.get(fd as u64).ok_or(Errno::Badf)
    }

    pub fn descriptor_mut(&mut self, fd: i32) -> FsResult<&mut FileDescriptor> {
        if fd < 0 {
            return Err(Errno::Badf);
        }
        self.descriptors.get_mut(fd as u64).ok_or(Errno::Badf)
    }

    /// Resolves `dirfd` (an fd or `AT_FDCWD`) to the inode id it names,
    /// used as the base directory for a relative path.
    pub fn resolve_dirfd(&self, dirfd: i32) -> FsResult<u64> {
        if dirfd == consts::AT_FDCWD as i32 {
            return Ok(self.cwd.inode_id);
        }
        let desc = self.descriptor(dirfd)?;
        Ok(desc.inode_id)
    }

    pub fn resolve(&self, base: u64, path: &str, follow_final: bool) -> FsResult<Resolution> {
        path::resolve(&self.inodes, ROOT_ID, base, path, follow_final)
    }

    pub fn absolute_path(&self, path: &str) -> FsResult<String> {
        path::absolute_path(&self.cwd.path, path)
    }

    /// True if any open descriptor still references `id`.
    pub fn is_referenced(&self, id: u64) -> bool {
        self.descriptors.iter().any(|d| d.inode_id == id)
    }

    /// A directory is "unused" once only its own `.` self-link remains.
    pub fn is_unused(&self, inode: &Inode) -> bool {
        if inode.is_dir() {
            inode.nlink <= 1
        } else {
            inode.nlink == 0
        }
    }

    /// Frees `id` if it is both unused and unreferenced by any descriptor.
    pub fn maybe_free_inode(&mut self, id: u64) {
        if id == ROOT_ID {
            return;
        }
        let free = match self.inodes.get(id) {
            Some(inode) => self.is_unused(inode) && !self.is_referenced(id),
            None => false,
        };
        if free {
            self.inodes.remove(id);
        }
    }

    pub fn effective_mode(&self, requested: u32) -> u32 {
        requested & !self.umask & 0o7777
    }
}

/// The filesystem container, generic over the injected lock and clock.
pub struct Filesystem<L = DefaultLock<FsState>, C = SystemClock>
where
    L: RawLock<FsState>,
    C: Clock,
{
    pub(crate) state: L,
    clock: C,
}

impl Filesystem<DefaultLock<FsState>, SystemClock> {
    pub fn new() -> Self {
        Filesystem::with_clock(SystemClock)
    }
}

impl Default for Filesystem<DefaultLock<FsState>, SystemClock> {
    fn default() -> Self {
        Filesystem::new()
    }
}

impl<L, C> Filesystem<L, C>
where
    L: RawLock<FsState>,
    C: Clock,
{
    pub fn with_clock(clock: C) -> Self {
        let now = clock.now();
        Filesystem {
            state: L::new(FsState::new(now)),
            clock,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Runs `f` with the lock held, logging entry/error at `trace`/`debug`.
    pub(crate) fn with_state<R>(&self, op: &str, f: impl FnOnce(&mut FsState, Timestamp) -> FsResult<R>) -> FsResult<R> {
        log::trace!("{op}");
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let result = f(&mut guard, now);
        if let Err(ref e) = result {
            log::debug!("{op} failed: {e}");
        }
        result
    }
}
