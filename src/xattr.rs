//! Extended attributes: a per-inode ordered list of (name, bytes) pairs.

use crate::consts;
use crate::error::{Errno, FsResult};

#[derive(Debug, Clone)]
pub struct Xattr {
    pub name: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct XattrList(Vec<Xattr>);

/// Set semantics from the `XATTR_CREATE`/`XATTR_REPLACE` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Create,
    Replace,
    Any,
}

impl XattrList {
    pub fn get(&self, name: &str, buf_size: usize) -> FsResult<Vec<u8>> {
        if buf_size != 0 && (name.len() > consts::XATTR_NAME_MAX || buf_size > consts::XATTR_SIZE_MAX)
        {
            return Err(Errno::Range);
        }
        let attr = self.0.iter().find(|a| a.name == name).ok_or(Errno::Nodata)?;
        if buf_size != 0 && buf_size < attr.value.len() {
            return Err(Errno::Range);
        }
        Ok(attr.value.clone())
    }

    pub fn set(&mut self, name: &str, value: &[u8], mode: SetMode) -> FsResult<()> {
        if name.len() > consts::XATTR_NAME_MAX || value.len() > consts::XATTR_SIZE_MAX {
            return Err(Errno::Range);
        }
        if let Some(attr) = self.0.iter_mut().find(|a| a.name == name) {
            if mode == SetMode::Create {
                return Err(Errno::Exist);
            }
            attr.value = value.to_vec();
            return Ok(());
        }
        if mode == SetMode::Replace {
            return Err(Errno::Nodata);
        }
        self.0.push(Xattr {
            name: name.to_string(),
            value: value.to_vec(),
        });
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> FsResult<()> {
        if name.len() > consts::XATTR_NAME_MAX {
            return Err(Errno::Range);
        }
        let pos = self.0.iter().position(|a| a.name == name).ok_or(Errno::Nodata)?;
        self.0.remove(pos);
        Ok(())
    }

    /// Total length of the NUL-joined name list, validating the size caps
    /// against `buf_size` (`0` means "length query only, skip the cap").
    pub fn list_len(&self, buf_size: usize) -> FsResult<usize> {
        let mut list_len = 0usize;
        for attr in &self.0 {
            list_len += attr.name.len() + 1;
            if (buf_size != 0 && list_len > buf_size) || list_len > consts::XATTR_LIST_MAX {
                return Err(Errno::Range);
            }
        }
        Ok(list_len)
    }

    /// The NUL-joined name list. Caller should use [`XattrList::list_len`]
    /// first to size the destination buffer.
    pub fn list_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for attr in &self.0 {
            out.extend_from_slice(attr.name.as_bytes());
            out.push(0);
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &Xattr> {
        self.0.iter()
    }

    pub fn from_vec(items: Vec<Xattr>) -> Self {
        XattrList(items)
    }

    pub fn into_vec(self) -> Vec<Xattr> {
        self.0
    }
}
