use rvfs::{consts, Filesystem};

fn new_fs() -> Filesystem {
    Filesystem::new()
}

#[test]
fn create_nested_file_and_read_back() {
    let fs = new_fs();
    assert_eq!(fs.mkdir_raw("/a", 0o755), 0);
    assert_eq!(fs.mkdir_raw("/a/b", 0o755), 0);
    let fd = fs.creat_raw("/a/b/c", 0o644);
    assert!(fd >= 0);
    let fd = fd as i32;
    assert_eq!(fs.write_raw(fd, b"hi"), 2);
    assert_eq!(fs.close_raw(fd), 0);

    let st = fs.stat("/a/b/c").expect("stat");
    assert_eq!(st.size, 2);

    let fd2 = fs.open_raw("/a/b/c", consts::O_RDONLY, 0);
    assert!(fd2 >= 0);
    let fd2 = fd2 as i32;
    let mut buf = [0u8; 2];
    assert_eq!(fs.pread_raw(fd2, &mut buf, 0), 2);
    assert_eq!(&buf, b"hi");
    assert_eq!(fs.close_raw(fd2), 0);
}

#[test]
fn sparse_write_reports_holes_as_zero() {
    let fs = new_fs();
    let fd = fs.open_raw("/f", consts::O_RDWR | consts::O_CREAT, 0o644) as i32;
    assert!(fd >= 0);

    assert_eq!(fs.pwrite_raw(fd, b"X", 0), 1);
    assert_eq!(fs.pwrite_raw(fd, b"Y", 1000), 1);

    let st = fs.stat("/f").expect("stat");
    assert_eq!(st.size, 1001);

    let mut buf = [0u8; 1001];
    assert_eq!(fs.pread_raw(fd, &mut buf, 0), 1001);
    assert_eq!(buf[0], b'X');
    assert!(buf[1..1000].iter().all(|&b| b == 0));
    assert_eq!(buf[1000], b'Y');

    assert_eq!(fs.lseek_raw(fd, 0, consts::SEEK_HOLE), 1);
    assert_eq!(fs.lseek_raw(fd, 1, consts::SEEK_DATA), 1000);
}

#[test]
fn punch_hole_zeroes_byte_without_changing_size() {
    let fs = new_fs();
    let fd = fs.open_raw("/f", consts::O_RDWR | consts::O_CREAT, 0o644) as i32;
    fs.pwrite_raw(fd, b"X", 0);
    fs.pwrite_raw(fd, b"Y", 1000);

    let mode = consts::FALLOC_FL_KEEP_SIZE | consts::FALLOC_FL_PUNCH_HOLE;
    assert_eq!(fs.fallocate_raw(fd, mode, 0, 1), 0);

    let mut buf = [0u8; 1];
    assert_eq!(fs.pread_raw(fd, &mut buf, 0), 1);
    assert_eq!(buf[0], 0);
    assert_eq!(fs.stat("/f").unwrap().size, 1001);
}

#[test]
fn symlink_loop_is_rejected() {
    let fs = new_fs();
    assert_eq!(fs.symlink_raw("a", "/l"), 0);
    assert_eq!(fs.symlink_raw("/l", "/a"), 0);
    let rc = fs.open_raw("/l", consts::O_RDONLY, 0);
    assert_eq!(rc, -consts::ELOOP);
}

#[test]
fn rename_into_own_descendant_is_rejected() {
    let fs = new_fs();
    assert_eq!(fs.mkdir_raw("/x", 0o755), 0);
    assert_eq!(fs.mkdir_raw("/x/y", 0o755), 0);
    let rc = fs.rename_raw("/x", "/x/y/x");
    assert_eq!(rc, -consts::EINVAL);
}

#[test]
fn snapshot_round_trip_preserves_tree() {
    let fs = new_fs();
    fs.mkdir_raw("/a", 0o755);
    fs.mkdir_raw("/a/b", 0o755);
    let fd = fs.creat_raw("/a/b/c", 0o644) as i32;
    fs.write_raw(fd, b"hi");
    fs.close_raw(fd);

    let fd2 = fs.open_raw("/f", consts::O_RDWR | consts::O_CREAT, 0o644) as i32;
    fs.pwrite_raw(fd2, b"X", 0);
    fs.pwrite_raw(fd2, b"Y", 1000);
    fs.close_raw(fd2);

    let mut buf = Vec::new();
    fs.dump_to_writer(&mut buf).expect("dump");

    let fs2 = new_fs();
    fs2.load_from_reader(&mut &buf[..]).expect("load");

    let st1 = fs.stat("/a/b/c").unwrap();
    let st2 = fs2.stat("/a/b/c").unwrap();
    assert_eq!(st1.size, st2.size);
    assert_eq!(st1.mode, st2.mode);

    let st1f = fs.stat("/f").unwrap();
    let st2f = fs2.stat("/f").unwrap();
    assert_eq!(st1f.size, st2f.size);

    let fd3 = fs2.open_raw("/f", consts::O_RDONLY, 0) as i32;
    let mut buf2 = [0u8; 1001];
    assert_eq!(fs2.pread_raw(fd3, &mut buf2, 0), 1001);
    assert_eq!(buf2[0], b'X');
    assert_eq!(buf2[1000], b'Y');
}

#[test]
fn rename_then_reverse_restores_namespace() {
    let fs = new_fs();
    fs.creat_raw("/a", 0o644);
    assert_eq!(fs.rename_raw("/a", "/b"), 0);
    assert_eq!(fs.rename_raw("/b", "/a"), 0);
    assert!(fs.stat("/a").is_ok());
    assert_eq!(fs.stat("/b").unwrap_err(), rvfs::Errno::Noent);
}

#[test]
fn open_close_stat_preserves_inode_identity() {
    let fs = new_fs();
    fs.creat_raw("/a", 0o644);
    let before = fs.stat("/a").unwrap().ino;
    let fd = fs.open_raw("/a", consts::O_RDONLY, 0) as i32;
    fs.close_raw(fd);
    let after = fs.stat("/a").unwrap().ino;
    assert_eq!(before, after);
}

#[test]
fn fallocate_insert_then_collapse_restores_content() {
    let fs = new_fs();
    let fd = fs.open_raw("/f", consts::O_RDWR | consts::O_CREAT, 0o644) as i32;
    fs.pwrite_raw(fd, b"abcdefgh", 0);
    let before = fs.stat("/f").unwrap().size;

    assert_eq!(fs.fallocate_raw(fd, consts::FALLOC_FL_INSERT_RANGE, 4, 4), 0);
    assert_eq!(fs.stat("/f").unwrap().size, before + 4);

    assert_eq!(fs.fallocate_raw(fd, consts::FALLOC_FL_COLLAPSE_RANGE, 4, 4), 0);
    assert_eq!(fs.stat("/f").unwrap().size, before);

    let mut buf = [0u8; 8];
    fs.pread_raw(fd, &mut buf, 0);
    assert_eq!(&buf, b"abcdefgh");
}

#[test]
fn close_range_closes_inclusive_span() {
    let fs = new_fs();
    let fd0 = fs.creat_raw("/a", 0o644) as i32;
    let fd1 = fs.creat_raw("/b", 0o644) as i32;
    let fd2 = fs.creat_raw("/c", 0o644) as i32;

    let lo = fd0.min(fd1).min(fd2) as u32;
    let hi = fd0.max(fd1).max(fd2) as u32;
    assert_eq!(fs.close_range_raw(lo, hi, 0), 0);

    assert_eq!(fs.write_raw(fd0, b"x"), -consts::EBADF);
    assert_eq!(fs.write_raw(fd1, b"x"), -consts::EBADF);
    assert_eq!(fs.write_raw(fd2, b"x"), -consts::EBADF);
}

#[test]
fn getdents_lists_children_across_calls() {
    let fs = new_fs();
    fs.mkdir_raw("/d", 0o755);
    fs.creat_raw("/d/one", 0o644);
    fs.creat_raw("/d/two", 0o644);

    let fd = fs.open_raw("/d", consts::O_RDONLY | consts::O_DIRECTORY, 0) as i32;
    let mut buf = [0u8; 512];
    let n = fs.getdents_raw(fd, &mut buf);
    assert!(n > 0);
    let n2 = fs.getdents_raw(fd, &mut buf);
    assert_eq!(n2, 0, "second call should see no further entries");
}

#[test]
fn xattr_set_get_list_remove_round_trip() {
    let fs = new_fs();
    fs.creat_raw("/a", 0o644);
    assert_eq!(fs.setxattr_raw("/a", "user.note", b"hello", 0), 0);

    let mut buf = [0u8; 16];
    let n = fs.getxattr_raw("/a", "user.note", &mut buf);
    assert_eq!(n, 5);
    assert_eq!(&buf[..5], b"hello");

    let mut list = [0u8; 64];
    let ln = fs.listxattr_raw("/a", &mut list);
    assert!(ln > 0);

    assert_eq!(fs.removexattr_raw("/a", "user.note"), 0);
    assert_eq!(fs.getxattr_raw("/a", "user.note", &mut buf), -consts::ENODATA);
}
