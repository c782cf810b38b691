//! Path normalization and the component-wise resolver.

use std::collections::VecDeque;

use crate::consts;
use crate::dirent;
use crate::error::{Errno, FsResult};
use crate::inode::Inode;
use crate::slab::DenseTable;

fn split_components(path: &str) -> VecDeque<String> {
    path.split('/')
        .filter(|c| !c.is_empty())
        .map(|c| c.to_string())
        .collect()
}

/// Converts `path` to its absolute, `.`/`..`-normalized form, prefixing
/// `cwd_abs` when `path` is relative.
pub fn absolute_path(cwd_abs: &str, path: &str) -> FsResult<String> {
    if path.len() >= consts::PATH_MAX {
        return Err(Errno::Nametoolong);
    }
    let raw = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("{}/{}", cwd_abs.trim_end_matches('/'), path)
    };
    let mut stack: Vec<String> = Vec::new();
    for comp in raw.split('/') {
        match comp {
            "" | "." => continue,
            ".." => {
                stack.pop();
            }
            other => stack.push(other.to_string()),
        }
    }
    if stack.is_empty() {
        Ok("/".to_string())
    } else {
        Ok(format!("/{}", stack.join("/")))
    }
}

/// Extracts the final path component, ignoring trailing slashes. Returns
/// `""` for the root path.
pub fn last_component(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

fn access_bits(mode: u32) -> u32 {
    (mode >> 6) & 0o7
}

pub fn access_allowed(mode: u32, want: i32) -> bool {
    let want = want as u32 & 0o7;
    access_bits(mode) & want == want
}

/// Outcome of [`resolve`] when the final component simply doesn't exist but
/// every component up to it did: creation call sites treat this as "go
/// ahead and create under `parent_id`" rather than a hard failure.
pub struct NotFound {
    pub parent_id: u64,
    pub name: String,
}

pub struct Resolved {
    pub inode_id: u64,
    pub parent_id: u64,
    pub final_name: String,
}

pub enum Resolution {
    Found(Resolved),
    Missing(NotFound),
}

/// Walks `path` component by component starting from `start_id`, following
/// symlinks (an empty final component, as in a trailing slash or `"."`, is
/// always followed regardless of `follow_final`). `root_id` is substituted
/// whenever an absolute path segment (including an absolute symlink target)
/// needs a resolution base.
pub fn resolve(
    table: &DenseTable<Inode>,
    root_id: u64,
    start_id: u64,
    path: &str,
    follow_final: bool,
) -> FsResult<Resolution> {
    if path.len() >= consts::PATH_MAX {
        return Err(Errno::Nametoolong);
    }

    let mut components = split_components(path);
    let absolute_start = path.starts_with('/');
    let mut cur = if absolute_start { root_id } else { start_id };
    let mut parent = cur;
    let mut name = String::new();
    let mut follows = 0u32;

    if components.is_empty() {
        return Ok(Resolution::Found(Resolved {
            inode_id: cur,
            parent_id: parent,
            final_name: name,
        }));
    }

    while let Some(comp) = components.pop_front() {
        if comp.len() > consts::NAME_MAX {
            return Err(Errno::Nametoolong);
        }
        let is_last = components.is_empty();

        let dir = table.get(cur).ok_or(Errno::Noent)?;
        if !dir.is_dir() {
            return Err(Errno::Notdir);
        }
        if !access_allowed(dir.mode, consts::X_OK) {
            return Err(Errno::Acces);
        }
        let entries = dir.as_dir().expect("checked is_dir above");

        let found_id = if comp == "." {
            Some(cur)
        } else {
            dirent::find(entries, &comp).map(|e| e.inode_id)
        };

        let found_id = match found_id {
            Some(id) => id,
            None => {
                if is_last {
                    return Ok(Resolution::Missing(NotFound {
                        parent_id: cur,
                        name: comp,
                    }));
                }
                return Err(Errno::Noent);
            }
        };

        let node = table.get(found_id).ok_or(Errno::Noent)?;
        let must_follow = !is_last || follow_final;
        if node.is_symlink() && must_follow {
            follows += 1;
            if follows > consts::SYMLOOP_MAX as u32 {
                return Err(Errno::Loop_);
            }
            let target = node.as_symlink().expect("checked is_symlink above").to_string();
            let target_absolute = target.starts_with('/');
            let target_comps = split_components(&target);
            for c in target_comps.into_iter().rev() {
                components.push_front(c);
            }
            if target_absolute {
                cur = root_id;
                parent = root_id;
            }
            continue;
        }

        parent = cur;
        name = comp;
        cur = found_id;
    }

    Ok(Resolution::Found(Resolved {
        inode_id: cur,
        parent_id: parent,
        final_name: name,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_path_collapses_dots_and_slashes() {
        assert_eq!(absolute_path("/", "//a/./b/../c").unwrap(), "/a/c");
        assert_eq!(absolute_path("/a/b", "c").unwrap(), "/a/b/c");
        assert_eq!(absolute_path("/a/b", "../..").unwrap(), "/");
    }

    #[test]
    fn last_component_ignores_trailing_slash() {
        assert_eq!(last_component("/a/b/c/"), "c");
        assert_eq!(last_component("/a"), "a");
        assert_eq!(last_component("/"), "");
    }
}
