//! `read`/`write` family, `lseek`, `fallocate`, `truncate`, `sendfile`.

use crate::consts;
use crate::error::{Errno, FsResult};
use crate::flags::{FallocateFlags, OpenFlags};
use crate::fs::FsState;
use crate::path;
use crate::sparse::{self, RangeList};
use crate::time::Timestamp;

fn write_bytes(state: &mut FsState, inode_id: u64, offset: u64, bytes: &[u8]) -> FsResult<()> {
    let inode = state.inode_mut(inode_id)?;
    let (ranges, size) = inode.as_regular_mut().ok_or(Errno::Inval)?;
    let idx = ranges.alloc(offset, bytes.len() as u64, size);
    let r = &mut ranges.ranges_mut()[idx];
    let local = (offset - r.offset) as usize;
    r.bytes[local..local + bytes.len()].copy_from_slice(bytes);
    Ok(())
}

pub fn pread_at(state: &mut FsState, now: Timestamp, fd: i32, buf: &mut [u8], offset: u64) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    if !desc.readable() {
        return Err(Errno::Badf);
    }
    let inode = state.inode(desc.inode_id)?;
    if inode.is_dir() {
        return Err(Errno::Isdir);
    }
    let (ranges, size) = inode.as_regular().ok_or(Errno::Inval)?;
    let want = buf.len().min(consts::RW_MAX_COUNT as usize) as u64;
    let end = offset.saturating_add(want).min(size);
    if end <= offset {
        return Ok(0);
    }
    let n = (end - offset) as usize;
    for b in buf[..n].iter_mut() {
        *b = 0;
    }
    let mut it = sparse::DataIterator::with_size(ranges, offset, size);
    let mut pos = offset;
    loop {
        if pos >= end {
            break;
        }
        if it.is_in_data() {
            let r = it.current_range();
            let seg_start = pos.max(r.offset);
            let seg_end = r.end().min(end);
            let local = (seg_start - r.offset) as usize;
            let len = (seg_end - seg_start) as usize;
            let out_at = (seg_start - offset) as usize;
            buf[out_at..out_at + len].copy_from_slice(&r.bytes[local..local + len]);
            pos = seg_end;
        } else {
            pos = it.current_hole().end().min(end);
        }
        if pos < end && !it.next() {
            break;
        }
    }
    if !desc.flags.contains(OpenFlags::O_NOATIME) {
        state.inode_mut(desc.inode_id)?.touch_atime(now);
    }
    Ok(n as i64)
}

pub fn pwrite_at(state: &mut FsState, now: Timestamp, fd: i32, buf: &[u8], offset: u64) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    if !desc.writable() {
        return Err(Errno::Badf);
    }
    let inode = state.inode(desc.inode_id)?;
    if inode.is_dir() {
        return Err(Errno::Isdir);
    }
    if inode.as_regular().is_none() {
        return Err(Errno::Inval);
    }
    let len = buf.len().min(consts::RW_MAX_COUNT as usize);
    let end = offset.checked_add(len as u64).ok_or(Errno::Fbig)?;
    if end > i64::MAX as u64 {
        return Err(Errno::Fbig);
    }
    write_bytes(state, desc.inode_id, offset, &buf[..len])?;
    state.inode_mut(desc.inode_id)?.touch_mtime(now);
    Ok(len as i64)
}

pub fn read(state: &mut FsState, now: Timestamp, fd: i32, buf: &mut [u8]) -> FsResult<i64> {
    let offset = state.descriptor(fd)?.seek_offset;
    let n = pread_at(state, now, fd, buf, offset)?;
    state.descriptor_mut(fd)?.seek_offset += n as u64;
    Ok(n)
}

pub fn write(state: &mut FsState, now: Timestamp, fd: i32, buf: &[u8]) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    let offset = if desc.flags.contains(OpenFlags::O_APPEND) {
        state.inode(desc.inode_id)?.size()
    } else {
        desc.seek_offset
    };
    let n = pwrite_at(state, now, fd, buf, offset)?;
    state.descriptor_mut(fd)?.seek_offset = offset + n as u64;
    Ok(n)
}

fn clamp_iovecs(lens: &[usize]) -> FsResult<usize> {
    if lens.len() > consts::IOV_MAX as usize {
        return Err(Errno::Inval);
    }
    let mut total = 0usize;
    for &l in lens {
        if total + l > consts::RW_MAX_COUNT as usize {
            return Ok(total);
        }
        total += l;
    }
    Ok(total)
}

pub fn preadv(state: &mut FsState, now: Timestamp, fd: i32, bufs: &mut [&mut [u8]], offset: u64) -> FsResult<i64> {
    let lens: Vec<usize> = bufs.iter().map(|b| b.len()).collect();
    let cap = clamp_iovecs(&lens)?;
    let mut remaining = cap;
    let mut total = 0i64;
    let mut pos = offset;
    for buf in bufs.iter_mut() {
        if remaining == 0 {
            break;
        }
        let take = buf.len().min(remaining);
        let n = pread_at(state, now, fd, &mut buf[..take], pos)?;
        total += n;
        pos += n as u64;
        remaining -= take;
        if (n as usize) < take {
            break;
        }
    }
    Ok(total)
}

pub fn pwritev(state: &mut FsState, now: Timestamp, fd: i32, bufs: &[&[u8]], offset: u64) -> FsResult<i64> {
    let lens: Vec<usize> = bufs.iter().map(|b| b.len()).collect();
    let cap = clamp_iovecs(&lens)?;
    let mut remaining = cap;
    let mut total = 0i64;
    let mut pos = offset;
    for buf in bufs.iter() {
        if remaining == 0 {
            break;
        }
        let take = buf.len().min(remaining);
        let n = pwrite_at(state, now, fd, &buf[..take], pos)?;
        total += n;
        pos += n as u64;
        remaining -= take;
        if (n as usize) < take {
            break;
        }
    }
    Ok(total)
}

pub fn readv(state: &mut FsState, now: Timestamp, fd: i32, bufs: &mut [&mut [u8]]) -> FsResult<i64> {
    let offset = state.descriptor(fd)?.seek_offset;
    let n = preadv(state, now, fd, bufs, offset)?;
    state.descriptor_mut(fd)?.seek_offset += n as u64;
    Ok(n)
}

pub fn writev(state: &mut FsState, now: Timestamp, fd: i32, bufs: &[&[u8]]) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    let offset = if desc.flags.contains(OpenFlags::O_APPEND) {
        state.inode(desc.inode_id)?.size()
    } else {
        desc.seek_offset
    };
    let n = pwritev(state, now, fd, bufs, offset)?;
    state.descriptor_mut(fd)?.seek_offset = offset + n as u64;
    Ok(n)
}

pub fn lseek(state: &mut FsState, fd: i32, offset: i64, whence: i32) -> FsResult<i64> {
    let desc = state.descriptor(fd)?.clone();
    let inode = state.inode(desc.inode_id)?;

    let new_offset: i64 = match whence {
        consts::SEEK_SET => offset,
        consts::SEEK_CUR => (desc.seek_offset as i64).checked_add(offset).ok_or(Errno::Overflow)?,
        consts::SEEK_END => (inode.size() as i64).checked_add(offset).ok_or(Errno::Overflow)?,
        consts::SEEK_DATA | consts::SEEK_HOLE => {
            if offset < 0 {
                return Err(Errno::Inval);
            }
            let (ranges, size) = inode.as_regular().ok_or(Errno::Inval)?;
            let start = offset as u64;
            if start > size {
                return Err(Errno::Inval);
            }
            let mut it = sparse::DataIterator::with_size(ranges, start, size);
            let landing = loop {
                let want_data = whence == consts::SEEK_DATA;
                if it.is_in_data() == want_data {
                    break if it.is_in_data() {
                        it.current_range().offset
                    } else {
                        it.current_hole().offset
                    };
                }
                if !it.next() {
                    break size;
                }
            };
            landing as i64
        }
        _ => return Err(Errno::Inval),
    };

    if new_offset < 0 {
        return Err(Errno::Inval);
    }
    state.descriptor_mut(fd)?.seek_offset = new_offset as u64;
    Ok(new_offset)
}

fn fallocate_flags_ok(flags: FallocateFlags) -> FsResult<()> {
    let known = FallocateFlags::KEEP_SIZE
        | FallocateFlags::PUNCH_HOLE
        | FallocateFlags::COLLAPSE_RANGE
        | FallocateFlags::ZERO_RANGE
        | FallocateFlags::INSERT_RANGE;
    if flags.bits() & !known.bits() != 0 {
        return Err(Errno::Opnotsupp);
    }
    let modes = [
        FallocateFlags::PUNCH_HOLE,
        FallocateFlags::COLLAPSE_RANGE,
        FallocateFlags::ZERO_RANGE,
        FallocateFlags::INSERT_RANGE,
    ];
    if modes.iter().filter(|m| flags.contains(**m)).count() > 1 {
        return Err(Errno::Inval);
    }
    if flags.contains(FallocateFlags::PUNCH_HOLE) && !flags.contains(FallocateFlags::KEEP_SIZE) {
        return Err(Errno::Inval);
    }
    if flags.contains(FallocateFlags::COLLAPSE_RANGE) && flags.contains(FallocateFlags::KEEP_SIZE) {
        return Err(Errno::Inval);
    }
    if flags.contains(FallocateFlags::INSERT_RANGE) && flags.contains(FallocateFlags::KEEP_SIZE) {
        return Err(Errno::Inval);
    }
    Ok(())
}

pub fn fallocate(state: &mut FsState, now: Timestamp, fd: i32, mode: i32, offset: i64, len: i64) -> FsResult<i64> {
    if offset < 0 || len <= 0 {
        return Err(Errno::Inval);
    }
    let flags = FallocateFlags::from_bits_truncate(mode);
    fallocate_flags_ok(flags)?;

    let desc = state.descriptor(fd)?.clone();
    if !desc.writable() {
        return Err(Errno::Badf);
    }
    if desc.flags.contains(OpenFlags::O_APPEND) {
        return Err(Errno::Perm);
    }
    let inode = state.inode(desc.inode_id)?;
    if !inode.is_regular() {
        return Err(Errno::Nodev);
    }

    let offset = offset as u64;
    let mut len = len as u64;
    let keep_size = flags.contains(FallocateFlags::KEEP_SIZE);

    let inode = state.inode_mut(desc.inode_id)?;
    let (ranges, size) = inode.as_regular_mut().expect("checked is_regular above");

    if flags.contains(FallocateFlags::PUNCH_HOLE) {
        ranges.punch_hole(offset, len)?;
    } else if flags.contains(FallocateFlags::COLLAPSE_RANGE) {
        if offset >= *size {
            return Err(Errno::Inval);
        }
        ranges.collapse_range(offset, len)?;
        *size -= len.min(*size - offset);
    } else if flags.contains(FallocateFlags::INSERT_RANGE) {
        if offset > *size {
            return Err(Errno::Inval);
        }
        ranges.insert_range_shift(offset, len)?;
        *size += len;
    } else {
        // ALLOCATE_RANGE or ZERO_RANGE
        let end = offset.checked_add(len).ok_or(Errno::Fbig)?;
        if keep_size {
            if offset >= *size {
                len = 0;
            } else {
                len = len.min(*size - offset);
            }
        } else if end > *size {
            *size = end;
        }
        if len > 0 {
            let idx = ranges.alloc(offset, len, size);
            if flags.contains(FallocateFlags::ZERO_RANGE) {
                let r = &mut ranges.ranges_mut()[idx];
                let local = (offset - r.offset) as usize;
                for b in &mut r.bytes[local..local + len as usize] {
                    *b = 0;
                }
            }
        }
    }

    state.inode_mut(desc.inode_id)?.touch_mtime(now);
    Ok(0)
}

fn truncate_inode(state: &mut FsState, now: Timestamp, inode_id: u64, length: u64) -> FsResult<i64> {
    let inode = state.inode_mut(inode_id)?;
    let (ranges, size) = inode.as_regular_mut().ok_or(Errno::Inval)?;
    ranges.truncate(length, size);
    inode.touch_mtime(now);
    Ok(0)
}

pub fn ftruncate(state: &mut FsState, now: Timestamp, fd: i32, length: i64) -> FsResult<i64> {
    if length < 0 {
        return Err(Errno::Inval);
    }
    let desc = state.descriptor(fd)?.clone();
    if !desc.writable() {
        return Err(Errno::Badf);
    }
    truncate_inode(state, now, desc.inode_id, length as u64)
}

pub fn truncate(state: &mut FsState, now: Timestamp, dirfd_base: u64, path_str: &str, length: i64) -> FsResult<i64> {
    if length < 0 {
        return Err(Errno::Inval);
    }
    let resolution = state.resolve(dirfd_base, path_str, true)?;
    let inode_id = match resolution {
        crate::path::Resolution::Found(r) => r.inode_id,
        crate::path::Resolution::Missing(_) => return Err(Errno::Noent),
    };
    let inode = state.inode(inode_id)?;
    if !path::access_allowed(inode.mode, consts::W_OK) {
        return Err(Errno::Acces);
    }
    truncate_inode(state, now, inode_id, length as u64)
}

/// The corrected `sendfile`: the destination's new seek offset is always
/// `dest_start + amount_read`, never aliased from itself.
pub fn sendfile(
    state: &mut FsState,
    now: Timestamp,
    fd_out: i32,
    fd_in: i32,
    in_offset: Option<i64>,
    count: usize,
) -> FsResult<i64> {
    let desc_in = state.descriptor(fd_in)?.clone();
    let desc_out = state.descriptor(fd_out)?.clone();
    if !desc_in.readable() || !desc_out.writable() {
        return Err(Errno::Badf);
    }
    let in_id = desc_in.inode_id;
    let out_id = desc_out.inode_id;
    if in_id == out_id {
        return Err(Errno::Inval);
    }

    let start_in = match in_offset {
        Some(o) if o < 0 => return Err(Errno::Inval),
        Some(o) => o as u64,
        None => desc_in.seek_offset,
    };
    let count = count.min(consts::RW_MAX_COUNT as usize) as u64;

    let in_size = state.inode(in_id)?.as_regular().ok_or(Errno::Inval)?.1;
    let end_in = start_in.saturating_add(count).min(in_size);
    if end_in <= start_in {
        return Ok(0);
    }
    let amount_read = end_in - start_in;
    let dest_start = desc_out.seek_offset;

    let in_ranges_snapshot: RangeList = state.inode(in_id)?.as_regular().unwrap().0.clone();

    let mut pos = start_in;
    let mut it = sparse::DataIterator::with_size(&in_ranges_snapshot, start_in, in_size);
    loop {
        if pos >= end_in {
            break;
        }
        if it.is_in_data() {
            let r = it.current_range();
            let seg_start = pos.max(r.offset);
            let seg_end = r.end().min(end_in);
            let local = (seg_start - r.offset) as usize;
            let len = (seg_end - seg_start) as usize;
            let bytes = r.bytes[local..local + len].to_vec();
            let dest_off = dest_start + (seg_start - start_in);
            write_bytes(state, out_id, dest_off, &bytes)?;
            pos = seg_end;
        } else {
            let hole = it.current_hole();
            let seg_end = hole.end().min(end_in);
            let seg_start = pos;
            let len = seg_end - seg_start;
            let dest_off = dest_start + (seg_start - start_in);
            let overlaps = {
                let out_inode = state.inode(out_id)?;
                let (out_ranges, _) = out_inode.as_regular().ok_or(Errno::Inval)?;
                out_ranges.overlaps(dest_off, len)
            };
            if overlaps {
                let zeros = vec![0u8; len as usize];
                write_bytes(state, out_id, dest_off, &zeros)?;
            }
            pos = seg_end;
        }
        if pos < end_in && !it.next() {
            break;
        }
    }

    let curr_end_out = dest_start + amount_read;
    state.inode_mut(out_id)?.touch_mtime(now);
    state.descriptor_mut(fd_out)?.seek_offset = curr_end_out;
    if in_offset.is_none() {
        state.descriptor_mut(fd_in)?.seek_offset = end_in;
    }
    state.inode_mut(in_id)?.touch_atime(now);
    Ok(amount_read as i64)
}
