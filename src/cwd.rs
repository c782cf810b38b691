//! Current-working-directory state: the absolute path string plus the
//! inode ids it and its parent resolved to at the time it was last set.

#[derive(Debug, Clone)]
pub struct Cwd {
    pub path: String,
    pub inode_id: u64,
    pub parent_id: u64,
}

impl Cwd {
    pub fn root() -> Self {
        Cwd {
            path: "/".to_string(),
            inode_id: 0,
            parent_id: 0,
        }
    }

    pub fn set(&mut self, path: String, inode_id: u64, parent_id: u64) {
        self.path = path;
        self.inode_id = inode_id;
        self.parent_id = parent_id;
    }
}
