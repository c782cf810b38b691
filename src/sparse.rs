//! The sparse data-range engine backing regular-file bodies.
//!
//! A regular inode's content is a sorted, non-overlapping sequence of
//! [`DataRange`]s; every byte not covered by a range is a hole that reads as
//! zero. [`DataIterator`] walks alternating data/hole segments from an
//! arbitrary starting offset; [`RangeList::alloc`] and
//! [`RangeList::truncate`] are the two mutators everything else (write,
//! fallocate, sendfile) is built from.

use crate::error::FsResult;

#[derive(Debug, Clone)]
pub struct DataRange {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl DataRange {
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn end(&self) -> u64 {
        self.offset + self.size()
    }
}

/// A hole: `[offset, offset+size)` of implicit zero bytes.
#[derive(Debug, Clone, Copy)]
pub struct Hole {
    pub offset: u64,
    pub size: u64,
}

impl Hole {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }
}

#[derive(Debug, Clone, Default)]
pub struct RangeList(Vec<DataRange>);

impl RangeList {
    pub fn new() -> Self {
        RangeList(Vec::new())
    }

    /// Builds a list directly from already-sorted, non-overlapping ranges,
    /// as produced by snapshot load.
    pub fn from_sorted_ranges(ranges: Vec<DataRange>) -> Self {
        RangeList(ranges)
    }

    pub fn ranges(&self) -> &[DataRange] {
        &self.0
    }

    pub fn ranges_mut(&mut self) -> &mut [DataRange] {
        &mut self.0
    }

    /// True if any existing range intersects `[offset, offset+len)`.
    pub fn overlaps(&self, offset: u64, len: u64) -> bool {
        let end = offset + len;
        self.0.iter().any(|r| r.offset < end && offset < r.end())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Binary-searches for the insertion position of a fresh range starting
    /// at `offset` (the lowest index whose existing range starts at or
    /// after `offset`).
    fn insertion_point(&self, offset: u64) -> usize {
        self.0.partition_point(|r| r.offset < offset)
    }

    fn insert_range(&mut self, offset: u64, length: u64) -> usize {
        let idx = self.insertion_point(offset);
        self.0.insert(
            idx,
            DataRange {
                offset,
                bytes: vec![0u8; length as usize],
            },
        );
        idx
    }

    pub fn remove(&mut self, index: usize) {
        self.0.remove(index);
    }

    fn remove_span(&mut self, index: usize, count: usize) {
        self.0.drain(index..index + count);
    }

    /// Allocates (and coalesces) a range covering `[offset, offset+length)`,
    /// returning the index of the resulting range. The returned range may
    /// be wider than requested if it absorbed touching/overlapping ranges.
    pub fn alloc(&mut self, offset: u64, length: u64, size_hint: &mut u64) -> usize {
        let end = offset + length;

        if !self.0.is_empty() {
            let it = DataIterator::new(self, offset);
            let start_search = it.range_idx_or_next();
            for i in start_search..self.0.len() {
                if end == self.0[i].offset {
                    // Extend leftward: find the furthest preceding range that
                    // touches or overlaps the left edge.
                    let mut host = None;
                    let mut j = i;
                    while j > 0 {
                        j -= 1;
                        let r = &self.0[j];
                        if offset <= r.end() {
                            host = Some(j);
                        } else {
                            break;
                        }
                    }
                    let range_i = self.0[i].clone();
                    if let Some(host_idx) = host {
                        let off = self.0[host_idx].offset.min(offset);
                        let new_len = (range_i.size() + (range_i.offset - off)) as usize;
                        let mut new_bytes = vec![0u8; new_len];
                        let keep = self.0[host_idx].bytes.len();
                        new_bytes[..keep].copy_from_slice(&self.0[host_idx].bytes);
                        for k in (host_idx + 1)..i {
                            let r = &self.0[k];
                            let at = (r.offset - off) as usize;
                            new_bytes[at..at + r.bytes.len()].copy_from_slice(&r.bytes);
                        }
                        let tail_at = new_len - range_i.bytes.len();
                        new_bytes[tail_at..].copy_from_slice(&range_i.bytes);
                        self.remove_span(host_idx + 1, i - host_idx);
                        self.0[host_idx].offset = off;
                        self.0[host_idx].bytes = new_bytes;
                        return host_idx;
                    } else {
                        let new_len = (range_i.size() + (range_i.offset - offset)) as usize;
                        let mut new_bytes = vec![0u8; new_len];
                        let tail_at = new_len - range_i.bytes.len();
                        new_bytes[tail_at..].copy_from_slice(&range_i.bytes);
                        self.0[i].offset = offset;
                        self.0[i].bytes = new_bytes;
                        return i;
                    }
                } else if end < self.0[i].offset {
                    break;
                }
            }
        }

        let (mut range_idx, created) = match self.host_range_idx(offset) {
            Some(idx) => (idx, false),
            None => (self.insert_range(offset, length), true),
        };

        if !created {
            let r = &self.0[range_idx];
            if offset >= r.offset && end <= r.end() {
                return range_idx;
            }
        }

        let base_offset = self.0[range_idx].offset;
        let mut new_len = (end - base_offset) as usize;
        for i in (range_idx + 1)..self.0.len() {
            let r = &self.0[i];
            if r.offset < end {
                let candidate = ((r.offset - base_offset) as usize) + r.bytes.len();
                if new_len < candidate {
                    new_len = candidate;
                }
                break;
            } else {
                break;
            }
        }

        let old_len = self.0[range_idx].bytes.len();
        self.0[range_idx].bytes.resize(new_len, 0);
        if old_len < new_len {
            // nothing else to do; resize already zero-filled the tail
        }

        if end > *size_hint {
            *size_hint = end;
        }

        let mut absorbed = 0usize;
        for i in (range_idx + 1)..self.0.len() {
            let r = self.0[i].clone();
            if r.offset < end {
                let at = (r.offset - base_offset) as usize;
                self.0[range_idx].bytes[at..at + r.bytes.len()].copy_from_slice(&r.bytes);
                absorbed += 1;
            } else {
                break;
            }
        }
        if absorbed != 0 {
            self.remove_span(range_idx + 1, absorbed);
        }
        range_idx
    }

    /// Finds the range that contains `offset` or ends exactly at `offset`.
    fn host_range_idx(&self, offset: u64) -> Option<usize> {
        let it = DataIterator::new(self, offset);
        if it.before_first_range {
            return None;
        }
        let idx = it.range_idx;
        let r = &self.0[idx];
        if offset <= r.end() {
            Some(idx)
        } else {
            None
        }
    }

    /// Shrinks the logical size and drops/trims ranges beyond `length`.
    pub fn truncate(&mut self, length: u64, size: &mut u64) {
        if length >= *size {
            *size = length;
            return;
        }
        *size = length;
        if length == 0 {
            self.0.clear();
            return;
        }
        for i in (0..self.0.len()).rev() {
            if length > self.0[i].offset {
                self.0.truncate(i + 1);
                let r = &mut self.0[i];
                if length - r.offset < r.size() {
                    r.bytes.truncate((length - r.offset) as usize);
                }
                return;
            }
        }
        self.0.clear();
    }

    pub fn punch_hole(&mut self, offset: u64, len: u64) -> FsResult<()> {
        let end = offset + len;
        let mut i = 0usize;
        while i < self.0.len() {
            let off = self.0[i].offset;
            let rend = self.0[i].end();
            if offset <= off {
                if end <= off {
                    break;
                }
                if end < rend {
                    let amount_to_remove = (len - (off - offset)) as usize;
                    let r = &mut self.0[i];
                    r.bytes.drain(0..amount_to_remove);
                    r.offset += amount_to_remove as u64;
                } else {
                    self.0.remove(i);
                    continue;
                }
            } else {
                if offset >= rend {
                    i += 1;
                    continue;
                }
                if end < rend {
                    let range_size = self.0[i].size();
                    let new_size = offset - off;
                    let offset_after_hole = new_size + len;
                    let new_range_len = range_size - offset_after_hole;
                    let tail: Vec<u8> = self.0[i].bytes
                        [offset_after_hole as usize..(offset_after_hole + new_range_len) as usize]
                        .to_vec();
                    self.0[i].bytes.truncate(new_size as usize);
                    let mut dummy = 0u64;
                    self.alloc(end, new_range_len, &mut dummy);
                    if let Some(idx) = self.0.iter().position(|r| r.offset == end) {
                        self.0[idx].bytes[..tail.len()].copy_from_slice(&tail);
                    }
                    break;
                } else {
                    let new_size = rend - offset;
                    let r = &mut self.0[i];
                    let drop_front = r.size() - new_size;
                    r.bytes.drain(0..drop_front as usize);
                }
            }
            i += 1;
        }
        Ok(())
    }

    pub fn collapse_range(&mut self, offset: u64, len: u64) -> FsResult<()> {
        let end = offset + len;
        let mut i = 0usize;
        while i < self.0.len() {
            let off = self.0[i].offset;
            let rend = self.0[i].end();
            if offset <= off {
                if end < off {
                    self.0[i].offset -= len;
                    i += 1;
                    continue;
                }
                if end == off {
                    self.0[i].offset -= len;
                    if i != 0 {
                        let moved = self.0[i].clone();
                        let prev = &mut self.0[i - 1];
                        prev.bytes.extend_from_slice(&moved.bytes);
                        self.0.remove(i);
                    } else {
                        i += 1;
                    }
                    continue;
                }
                if end < rend {
                    let amount_to_remove = (len - (off - offset)) as usize;
                    self.0[i].bytes.drain(0..amount_to_remove);
                } else {
                    self.0.remove(i);
                    continue;
                }
            } else {
                if offset >= rend {
                    i += 1;
                    continue;
                }
                if end < rend {
                    let offset_after_hole = (offset - off) + len;
                    let tail: Vec<u8> = self.0[i].bytes[offset_after_hole as usize..].to_vec();
                    self.0[i].bytes.truncate((offset - off) as usize);
                    self.0[i].bytes.extend_from_slice(&tail);
                } else {
                    let new_size = rend - offset;
                    let r = &mut self.0[i];
                    let drop_front = r.size() - new_size;
                    r.bytes.drain(0..drop_front as usize);
                }
            }
            i += 1;
        }
        Ok(())
    }

    pub fn insert_range_shift(&mut self, offset: u64, len: u64) -> FsResult<()> {
        let end = offset + len;
        let mut i = 0usize;
        while i < self.0.len() {
            let off = self.0[i].offset;
            let rend = self.0[i].end();
            if offset <= off {
                self.0[i].offset += len;
                i += 1;
                continue;
            }
            if offset >= rend {
                i += 1;
                continue;
            }
            let offset_after_hole = (offset - off) as usize;
            let tail: Vec<u8> = self.0[i].bytes[offset_after_hole..].to_vec();
            self.0[i].bytes.truncate(offset_after_hole);
            let mut dummy = 0u64;
            let new_idx = self.alloc(end, tail.len() as u64, &mut dummy);
            self.0[new_idx].bytes[..tail.len()].copy_from_slice(&tail);
            i += 1;
        }
        Ok(())
    }
}

/// Walks alternating data/hole segments of a regular inode's content.
#[derive(Debug, Clone, Copy)]
pub struct DataIterator<'a> {
    ranges: &'a [DataRange],
    size: u64,
    range_idx: usize,
    at_data: bool,
    before_first_range: bool,
}

impl<'a> DataIterator<'a> {
    pub fn new(list: &'a RangeList, offset: u64) -> Self {
        Self::with_size(list, offset, list_end_size(list))
    }

    pub fn with_size(list: &'a RangeList, offset: u64, size: u64) -> Self {
        let ranges = list.ranges();
        if ranges.is_empty() || offset < ranges[0].offset {
            return DataIterator {
                ranges,
                size,
                range_idx: 0,
                at_data: false,
                before_first_range: true,
            };
        }
        let last = ranges.len() - 1;
        if offset >= ranges[last].end() {
            return DataIterator {
                ranges,
                size,
                range_idx: last,
                at_data: false,
                before_first_range: false,
            };
        }
        let mut low = 0usize;
        let mut high = last;
        loop {
            let mid = low + (high - low) / 2;
            let r = &ranges[mid];
            if offset >= r.offset {
                if offset < r.end() {
                    return DataIterator {
                        ranges,
                        size,
                        range_idx: mid,
                        at_data: true,
                        before_first_range: false,
                    };
                }
                if offset < ranges[mid + 1].offset {
                    return DataIterator {
                        ranges,
                        size,
                        range_idx: mid,
                        at_data: false,
                        before_first_range: false,
                    };
                }
                low = mid + 1;
            } else {
                if offset >= ranges[mid - 1].end() {
                    return DataIterator {
                        ranges,
                        size,
                        range_idx: mid - 1,
                        at_data: false,
                        before_first_range: false,
                    };
                }
                high = mid - 1;
            }
        }
    }

    /// The index used to resume a forward scan of ranges from this position.
    fn range_idx_or_next(&self) -> usize {
        if self.before_first_range {
            0
        } else {
            self.range_idx
        }
    }

    pub fn is_in_data(&self) -> bool {
        self.at_data
    }

    pub fn before_first_range(&self) -> bool {
        self.before_first_range
    }

    pub fn range_idx(&self) -> usize {
        self.range_idx
    }

    pub fn current_range(&self) -> &'a DataRange {
        &self.ranges[self.range_idx]
    }

    pub fn current_hole(&self) -> Hole {
        if self.before_first_range {
            let size = if self.ranges.is_empty() {
                self.size
            } else {
                self.ranges[0].offset
            };
            return Hole { offset: 0, size };
        }
        let r = &self.ranges[self.range_idx];
        let hole_offset = r.end();
        let size = if self.range_idx != self.ranges.len() - 1 {
            self.ranges[self.range_idx + 1].offset - hole_offset
        } else {
            self.size - hole_offset
        };
        Hole {
            offset: hole_offset,
            size,
        }
    }

    pub fn next(&mut self) -> bool {
        if !self.at_data {
            if self.before_first_range {
                if self.ranges.is_empty() {
                    return false;
                }
                self.before_first_range = false;
            } else if self.range_idx == self.ranges.len() - 1 {
                return false;
            } else {
                self.range_idx += 1;
            }
        }
        self.at_data = !self.at_data;
        true
    }

    pub fn seek_to(&mut self, offset: u64) {
        loop {
            let end = if self.at_data {
                self.current_range().end()
            } else {
                self.current_hole().end()
            };
            if end >= offset {
                break;
            }
            if !self.next() {
                break;
            }
        }
    }
}

fn list_end_size(list: &RangeList) -> u64 {
    list.ranges().last().map(|r| r.end()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_into_empty_creates_single_range() {
        let mut list = RangeList::new();
        let mut size = 0u64;
        let idx = list.alloc(10, 5, &mut size);
        assert_eq!(list.ranges()[idx].offset, 10);
        assert_eq!(list.ranges()[idx].size(), 5);
        assert_eq!(size, 15);
    }

    #[test]
    fn alloc_coalesces_touching_ranges() {
        let mut list = RangeList::new();
        let mut size = 0u64;
        list.alloc(0, 5, &mut size);
        list.alloc(10, 5, &mut size);
        // write that bridges the hole between [0,5) and [10,15)
        list.alloc(3, 7, &mut size);
        assert_eq!(list.len(), 1);
        assert_eq!(list.ranges()[0].offset, 0);
        assert_eq!(list.ranges()[0].size(), 15);
    }

    #[test]
    fn iterator_reports_hole_then_data() {
        let mut list = RangeList::new();
        let mut size = 0u64;
        list.alloc(5, 5, &mut size);
        let mut it = DataIterator::with_size(&list, 0, size);
        assert!(!it.is_in_data());
        assert!(it.before_first_range());
        assert!(it.next());
        assert!(it.is_in_data());
        assert_eq!(it.current_range().offset, 5);
    }

    #[test]
    fn truncate_drops_trailing_ranges() {
        let mut list = RangeList::new();
        let mut size = 0u64;
        list.alloc(0, 5, &mut size);
        list.alloc(10, 5, &mut size);
        list.truncate(3, &mut size);
        assert_eq!(size, 3);
        assert_eq!(list.len(), 1);
        assert_eq!(list.ranges()[0].bytes.len(), 3);
    }
}
