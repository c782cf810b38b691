//! Binary snapshot codec: `dump_to_writer`/`load_from_reader`.
//!
//! Layout: `"\x7FVFS"` magic, a width byte, inode count, then each inode's
//! common fields, its xattr list, and a type-specific tail (symlink target
//! and literal data; directory dent list from index 2 onward, `..`'s
//! target recorded separately; regular data ranges). Integers are written
//! host-native — see the endianness note on [`dump_to_writer`].

use std::io::{self, Read, Write};

use crate::consts;
use crate::dirent::DirEntry;
use crate::error::{Errno, FsResult};
use crate::fs::{FsState, ROOT_ID};
use crate::inode::{Inode, Payload};
use crate::slab::Identified;
use crate::sparse::{DataRange, RangeList};
use crate::time::Timestamp;
use crate::xattr::{Xattr, XattrList};

const WIDTH_BYTE: u8 = (std::mem::size_of::<u64>() / 4 - 1) as u8;

fn write_u8(w: &mut impl Write, v: u8) -> io::Result<()> {
    w.write_all(&[v])
}

fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}

fn write_i64(w: &mut impl Write, v: i64) -> io::Result<()> {
    w.write_all(&v.to_ne_bytes())
}

fn write_cstr(w: &mut impl Write, s: &str) -> io::Result<()> {
    w.write_all(s.as_bytes())?;
    w.write_all(&[0])
}

fn read_u8(r: &mut impl Read) -> io::Result<u8> {
    let mut b = [0u8; 1];
    r.read_exact(&mut b)?;
    Ok(b[0])
}

fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(u64::from_ne_bytes(b))
}

fn read_i64(r: &mut impl Read) -> io::Result<i64> {
    let mut b = [0u8; 8];
    r.read_exact(&mut b)?;
    Ok(i64::from_ne_bytes(b))
}

fn read_cstr(r: &mut impl Read) -> io::Result<String> {
    let mut bytes = Vec::new();
    loop {
        let b = read_u8(r)?;
        if b == 0 {
            break;
        }
        bytes.push(b);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_timestamp(w: &mut impl Write, t: Timestamp) -> io::Result<()> {
    write_i64(w, t.sec)?;
    write_i64(w, t.nsec)
}

fn read_timestamp(r: &mut impl Read) -> io::Result<Timestamp> {
    let sec = read_i64(r)?;
    let nsec = read_i64(r)?;
    Ok(Timestamp::new(sec, nsec))
}

/// Dumps the whole tree. On I/O failure midway, `writer` is left with
/// however much was already flushed; callers writing to a real file should
/// delete the partially-written file, matching the source's on-error
/// cleanup.
pub fn dump_to_writer(state: &FsState, w: &mut impl Write) -> io::Result<()> {
    w.write_all(&consts::SNAPSHOT_MAGIC)?;
    write_u8(w, WIDTH_BYTE)?;
    write_u64(w, state.inodes.len() as u64)?;

    for inode in state.inodes.iter() {
        write_u64(w, inode.id())?;
        write_u64(w, inode.size())?;
        write_u64(w, inode.nlink as u64)?;
        write_u64(w, inode.mode as u64)?;
        write_timestamp(w, inode.btime)?;
        write_timestamp(w, inode.ctime)?;
        write_timestamp(w, inode.mtime)?;
        write_timestamp(w, inode.atime)?;

        let attrs: Vec<&Xattr> = inode.xattrs.iter().collect();
        write_u64(w, attrs.len() as u64)?;
        for attr in &attrs {
            write_cstr(w, &attr.name)?;
            write_u64(w, attr.value.len() as u64)?;
            if !attr.value.is_empty() {
                w.write_all(&attr.value)?;
            }
        }

        match &inode.payload {
            Payload::Symlink { target } => {
                write_cstr(w, target)?;
                write_cstr(w, target)?;
            }
            Payload::Directory { entries } => {
                write_u64(w, entries.len() as u64)?;
                write_u64(w, entries[1].inode_id)?;
                for e in entries.iter().skip(2) {
                    write_u64(w, e.inode_id)?;
                    write_cstr(w, &e.name)?;
                }
            }
            Payload::Regular { data, size } => {
                if *size != 0 {
                    write_u64(w, data.len() as u64)?;
                    for range in data.ranges() {
                        write_u64(w, range.offset)?;
                        write_u64(w, range.size())?;
                        w.write_all(&range.bytes)?;
                    }
                }
            }
        }
    }
    Ok(())
}

#[derive(Debug)]
struct LoadedInode {
    id: u64,
    size: u64,
    nlink: u32,
    mode: u32,
    btime: Timestamp,
    ctime: Timestamp,
    mtime: Timestamp,
    atime: Timestamp,
    xattrs: XattrList,
    payload: LoadedPayload,
}

#[derive(Debug)]
enum LoadedPayload {
    Regular(RangeList),
    Directory { parent_idx: u64, children: Vec<(u64, String)> },
    Symlink(String),
}

/// Rejects the load on any I/O error, magic mismatch, width mismatch, or
/// an out-of-range inode reference.
pub fn load_from_reader(r: &mut impl Read) -> FsResult<FsState> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic).map_err(|_| Errno::Inval)?;
    if magic != consts::SNAPSHOT_MAGIC {
        return Err(Errno::Inval);
    }
    let width = read_u8(r).map_err(|_| Errno::Inval)?;
    if width != WIDTH_BYTE {
        return Err(Errno::Inval);
    }
    let count = read_u64(r).map_err(|_| Errno::Inval)? as usize;

    let mut loaded = Vec::with_capacity(count);
    for _ in 0..count {
        let id = read_u64(r).map_err(|_| Errno::Inval)?;
        let size = read_u64(r).map_err(|_| Errno::Inval)?;
        let nlink = read_u64(r).map_err(|_| Errno::Inval)? as u32;
        let mode = read_u64(r).map_err(|_| Errno::Inval)? as u32;
        let btime = read_timestamp(r).map_err(|_| Errno::Inval)?;
        let ctime = read_timestamp(r).map_err(|_| Errno::Inval)?;
        let mtime = read_timestamp(r).map_err(|_| Errno::Inval)?;
        let atime = read_timestamp(r).map_err(|_| Errno::Inval)?;

        let attr_count = read_u64(r).map_err(|_| Errno::Inval)?;
        let mut attrs = Vec::with_capacity(attr_count as usize);
        for _ in 0..attr_count {
            let name = read_cstr(r).map_err(|_| Errno::Inval)?;
            let vlen = read_u64(r).map_err(|_| Errno::Inval)? as usize;
            let mut value = vec![0u8; vlen];
            if vlen != 0 {
                r.read_exact(&mut value).map_err(|_| Errno::Inval)?;
            }
            attrs.push(Xattr { name, value });
        }

        let type_bits = mode & consts::S_IFMT;
        let payload = if type_bits == consts::S_IFLNK {
            let target = read_cstr(r).map_err(|_| Errno::Inval)?;
            let _data = read_cstr(r).map_err(|_| Errno::Inval)?;
            LoadedPayload::Symlink(target)
        } else if type_bits == consts::S_IFDIR {
            let dent_count = read_u64(r).map_err(|_| Errno::Inval)?;
            let parent_idx = read_u64(r).map_err(|_| Errno::Inval)?;
            let mut children = Vec::new();
            for _ in 2..dent_count {
                let child_idx = read_u64(r).map_err(|_| Errno::Inval)?;
                let name = read_cstr(r).map_err(|_| Errno::Inval)?;
                children.push((child_idx, name));
            }
            LoadedPayload::Directory { parent_idx, children }
        } else {
            let mut ranges = RangeList::new();
            if size != 0 {
                let range_count = read_u64(r).map_err(|_| Errno::Inval)?;
                let mut raw = Vec::with_capacity(range_count as usize);
                for _ in 0..range_count {
                    let offset = read_u64(r).map_err(|_| Errno::Inval)?;
                    let rsize = read_u64(r).map_err(|_| Errno::Inval)?;
                    if offset.checked_add(rsize).ok_or(Errno::Inval)? > size {
                        return Err(Errno::Inval);
                    }
                    let mut bytes = vec![0u8; rsize as usize];
                    r.read_exact(&mut bytes).map_err(|_| Errno::Inval)?;
                    raw.push(DataRange { offset, bytes });
                }
                ranges = RangeList::from_sorted_ranges(raw);
            }
            LoadedPayload::Regular(ranges)
        };

        loaded.push(LoadedInode {
            id,
            size,
            nlink,
            mode,
            btime,
            ctime,
            mtime,
            atime,
            xattrs: XattrList::from_vec(attrs),
            payload,
        });
    }

    // The file's inode indices (0-based loop position) are the identities
    // `parent_idx`/child dirent ids reference, matching the source's use of
    // the load loop counter as `ndx` rather than a separately-stored field.
    let mut inodes = Vec::with_capacity(loaded.len());
    for (i, li) in loaded.iter().enumerate() {
        let now = Timestamp::ZERO;
        let payload = match &li.payload {
            LoadedPayload::Symlink(target) => Payload::Symlink { target: target.clone() },
            LoadedPayload::Regular(ranges) => Payload::Regular {
                data: ranges.clone(),
                size: li.size,
            },
            LoadedPayload::Directory { parent_idx, children } => {
                if *parent_idx as usize >= loaded.len() {
                    return Err(Errno::Inval);
                }
                let mut entries = vec![
                    DirEntry::new(".", i as u64),
                    DirEntry::new("..", *parent_idx),
                ];
                for (idx, name) in children {
                    if *idx as usize >= loaded.len() {
                        return Err(Errno::Inval);
                    }
                    entries.push(DirEntry::new(name, *idx));
                }
                Payload::Directory { entries }
            }
        };
        let mut inode = match &payload {
            Payload::Regular { .. } => Inode::new_regular(0, now),
            Payload::Directory { .. } => Inode::new_directory(0, 0, 0, now),
            Payload::Symlink { .. } => Inode::new_symlink("", now),
        };
        inode.mode = li.mode;
        inode.nlink = li.nlink;
        inode.btime = li.btime;
        inode.ctime = li.ctime;
        inode.mtime = li.mtime;
        inode.atime = li.atime;
        inode.xattrs = li.xattrs.clone();
        inode.payload = payload;
        inode.set_id(i as u64);
        inodes.push(inode);
    }

    // Orphans (nlink == 0, unreachable without the descriptor table a fresh
    // load starts with) are dropped, then every dirent/`..` reference is
    // remapped onto the compacted id space the dense table requires.
    let mut remap = vec![None; inodes.len()];
    let mut next_id = 0u64;
    for (old, inode) in inodes.iter().enumerate() {
        if inode.id() == ROOT_ID || inode.nlink > 0 {
            remap[old] = Some(next_id);
            next_id += 1;
        }
    }
    let mut kept: Vec<Inode> = Vec::with_capacity(next_id as usize);
    for (old, mut inode) in inodes.into_iter().enumerate() {
        let Some(new_id) = remap[old] else { continue };
        if let Some(entries) = inode.as_dir_mut() {
            for e in entries.iter_mut() {
                e.inode_id = remap[e.inode_id as usize].ok_or(Errno::Inval)?;
            }
        }
        inode.set_id(new_id);
        kept.push(inode);
    }

    let table = crate::slab::DenseTable::from_vec_unchecked(kept);
    Ok(FsState::from_loaded(table))
}
