//! Open file descriptors: a dense table mapping an fd number to the inode it
//! refers to, its open flags, and its current seek offset.

use crate::flags::OpenFlags;
use crate::slab::Identified;

#[derive(Debug, Clone)]
pub struct FileDescriptor {
    id: u64,
    pub inode_id: u64,
    pub flags: OpenFlags,
    pub seek_offset: u64,
}

impl Identified for FileDescriptor {
    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

impl FileDescriptor {
    pub fn new(inode_id: u64, flags: OpenFlags) -> Self {
        FileDescriptor {
            id: 0,
            inode_id,
            flags,
            seek_offset: 0,
        }
    }

    pub fn readable(&self) -> bool {
        !self.flags.is_wronly()
    }

    pub fn writable(&self) -> bool {
        self.flags.writable()
    }
}
