mod common;

use common::{mounted, pattern, used_blocks};
use simple_fs::{BLOCK_SIZE, BlockId, DIRECT_COUNT, FsError, MAX_FILE_SIZE, SimpleFileSystem};

fn read_all(fs: &SimpleFileSystem, inumber: u32) -> Vec<u8> {
    let mut buf = vec![0; fs.getsize(inumber).unwrap()];
    let len = fs.read(inumber, &mut buf, 0).unwrap();
    buf.truncate(len);
    buf
}

#[test]
fn round_trip_direct() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();

    for len in [1, 100, BLOCK_SIZE, 3 * BLOCK_SIZE + 17, DIRECT_COUNT * BLOCK_SIZE] {
        let data = pattern(len, len as u8);
        assert_eq!(len, fs.write(inumber, &data, 0).unwrap());

        let mut buf = vec![0; len];
        assert_eq!(len, fs.read(inumber, &mut buf, 0).unwrap());
        assert_eq!(data, buf);
    }
}

#[test]
fn round_trip_indirect() {
    let (_, mut fs) = mounted(40);
    let inumber = fs.create().unwrap();

    let data = pattern(9 * BLOCK_SIZE + 123, 9);
    assert_eq!(data.len(), fs.write(inumber, &data, 0).unwrap());
    assert_eq!(data.len(), fs.getsize(inumber).unwrap());
    assert_eq!(data, read_all(&fs, inumber));

    // 跨越直接与间接索引边界的读取
    let mut buf = vec![0; 2 * BLOCK_SIZE];
    let offset = 4 * BLOCK_SIZE + 1000;
    assert_eq!(buf.len(), fs.read(inumber, &mut buf, offset).unwrap());
    assert_eq!(data[offset..offset + buf.len()], buf[..]);
}

#[test]
fn direct_capacity_boundary() {
    let (_, mut fs) = mounted(20);

    let exact = fs.create().unwrap();
    fs.write(exact, &pattern(DIRECT_COUNT * BLOCK_SIZE, 1), 0).unwrap();
    let report = fs.debug().unwrap();
    assert_eq!(DIRECT_COUNT, report.inodes[0].direct.len());
    assert_eq!(None, report.inodes[0].indirect);
    assert_eq!(17 - DIRECT_COUNT, fs.free_blocks().unwrap());

    let over = fs.create().unwrap();
    fs.write(over, &pattern(DIRECT_COUNT * BLOCK_SIZE + 1, 2), 0).unwrap();
    let report = fs.debug().unwrap();
    let (_, indirect_blocks) = report.inodes[1].indirect.as_ref().unwrap();
    assert_eq!(1, indirect_blocks.len());
    // 5个直接块、间接索引块以及它的第一项
    assert_eq!(17 - 2 * DIRECT_COUNT - 2, fs.free_blocks().unwrap());
    assert_eq!(pattern(DIRECT_COUNT * BLOCK_SIZE + 1, 2), read_all(&fs, over));
}

#[test]
fn deterministic_allocation() {
    let (_, mut fs) = mounted(20);
    let a = fs.create().unwrap();
    let b = fs.create().unwrap();
    fs.write(a, &pattern(BLOCK_SIZE, 1), 0).unwrap();
    fs.write(b, &pattern(2 * BLOCK_SIZE, 2), 0).unwrap();
    fs.write(a, &pattern(2 * BLOCK_SIZE, 3), 0).unwrap();

    let report = fs.debug().unwrap();
    let direct: Vec<Vec<u32>> = report
        .inodes
        .iter()
        .map(|inode| inode.direct.iter().map(|&id| u32::from(id)).collect())
        .collect();
    // 数据区从3号块开始，总是分配编号最小的空闲块
    assert_eq!(vec![vec![3, 6], vec![4, 5]], direct);
}

#[test]
fn exhaustion_is_partial_and_consistent() {
    let (disk, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();
    let free = fs.free_blocks().unwrap();
    assert_eq!(17, free);

    // 17个空闲块中1个要做间接索引块，只能写下16块数据
    let data = pattern((free + 1) * BLOCK_SIZE, 6);
    let written = fs.write(inumber, &data, 0).unwrap();
    assert_eq!(16 * BLOCK_SIZE, written);
    assert!(written < data.len());
    assert_eq!(0, fs.free_blocks().unwrap());
    assert_eq!(written, fs.getsize(inumber).unwrap());
    assert_eq!(data[..written], read_all(&fs, inumber)[..]);

    // 位图与索引节点记录的块一致
    let used = used_blocks(&fs);
    let mut remounted = SimpleFileSystem::new(disk);
    remounted.mount().unwrap();
    assert_eq!(used, used_blocks(&remounted));

    let other = fs.create().unwrap();
    assert_eq!(Err(FsError::NoSpace), fs.write(other, b"x", 0));
    assert_eq!(0, fs.getsize(other).unwrap());

    // 覆盖已分配的块不需要新空间
    assert_eq!(5, fs.write(inumber, b"again", BLOCK_SIZE).unwrap());

    fs.delete(inumber).unwrap();
    assert_eq!(1, fs.write(other, b"x", 0).unwrap());
}

#[test]
fn indirect_block_reused_from_stale_data() {
    let (_, mut fs) = mounted(20);
    let old = fs.create().unwrap();
    fs.write(old, &[0xff; 2 * BLOCK_SIZE], 0).unwrap();
    fs.delete(old).unwrap();

    // 首次写入就越过直接索引，间接索引块落在残留0xff的3号块上
    let inumber = fs.create().unwrap();
    let data = pattern(100, 7);
    let offset = DIRECT_COUNT * BLOCK_SIZE;
    assert_eq!(data.len(), fs.write(inumber, &data, offset).unwrap());

    let report = fs.debug().unwrap();
    let (indirect_id, blocks) = report.inodes[0].indirect.clone().unwrap();
    assert_eq!(BlockId::new(3), indirect_id);
    assert_eq!(vec![BlockId::new(4)], blocks);
    assert_eq!(17 - 2, fs.free_blocks().unwrap());

    let mut buf = vec![0; data.len()];
    assert_eq!(data.len(), fs.read(inumber, &mut buf, offset).unwrap());
    assert_eq!(data, buf);
}

#[test]
fn failed_indirect_write_allocates_nothing() {
    let (disk, mut fs) = mounted(20);
    for len in [DIRECT_COUNT, DIRECT_COUNT, DIRECT_COUNT, 1] {
        let filler = fs.create().unwrap();
        fs.write(filler, &pattern(len * BLOCK_SIZE, 1), 0).unwrap();
    }
    assert_eq!(1, fs.free_blocks().unwrap());

    // 间接索引块与数据块需要2块，只剩1块
    let inumber = fs.create().unwrap();
    let image = disk.image();
    let used = used_blocks(&fs);
    assert_eq!(
        Err(FsError::NoSpace),
        fs.write(inumber, b"x", DIRECT_COUNT * BLOCK_SIZE)
    );
    assert_eq!(1, fs.free_blocks().unwrap());
    assert_eq!(used, used_blocks(&fs));
    assert_eq!(image, disk.image());
    assert_eq!(0, fs.getsize(inumber).unwrap());
    let report = fs.debug().unwrap();
    assert_eq!(None, report.inodes.last().unwrap().indirect);

    // 剩下的一块仍可用作直接块
    assert_eq!(1, fs.write(inumber, b"x", 0).unwrap());
    assert_eq!(0, fs.free_blocks().unwrap());
}

#[test]
fn overwrite_keeps_size() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();

    fs.write(inumber, &pattern(2 * BLOCK_SIZE, 1), 0).unwrap();
    fs.write(inumber, &pattern(2 * BLOCK_SIZE, 1), 0).unwrap();
    fs.write(inumber, b"head", 0).unwrap();
    assert_eq!(2 * BLOCK_SIZE, fs.getsize(inumber).unwrap());

    fs.write(inumber, b"tail", 2 * BLOCK_SIZE - 2).unwrap();
    assert_eq!(2 * BLOCK_SIZE + 2, fs.getsize(inumber).unwrap());
    assert_eq!(17 - 3, fs.free_blocks().unwrap());

    let content = read_all(&fs, inumber);
    assert_eq!(b"head", &content[..4]);
    assert_eq!(
        pattern(2 * BLOCK_SIZE, 1)[4..2 * BLOCK_SIZE - 2],
        content[4..2 * BLOCK_SIZE - 2]
    );
    assert_eq!(b"tail", &content[2 * BLOCK_SIZE - 2..]);
}

#[test]
fn byte_granular_offsets() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();

    fs.write(inumber, b"hello", 0).unwrap();
    fs.write(inumber, b"world", 3).unwrap();
    assert_eq!(8, fs.getsize(inumber).unwrap());
    assert_eq!(b"helworld".to_vec(), read_all(&fs, inumber));

    let mut buf = [0; 3];
    assert_eq!(3, fs.read(inumber, &mut buf, 4).unwrap());
    assert_eq!(b"orl", &buf);
}

#[test]
fn read_clamps_to_size() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();
    fs.write(inumber, b"0123456789", 0).unwrap();

    let mut buf = [0; 100];
    assert_eq!(10, fs.read(inumber, &mut buf, 0).unwrap());
    assert_eq!(4, fs.read(inumber, &mut buf, 6).unwrap());
    assert_eq!(b"6789", &buf[..4]);
    assert_eq!(0, fs.read(inumber, &mut buf, 10).unwrap());
    assert_eq!(0, fs.read(inumber, &mut buf, usize::MAX).unwrap());
    assert_eq!(0, fs.read(inumber, &mut [], 0).unwrap());
}

#[test]
fn holes_stop_reads() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();

    fs.write(inumber, b"far away", 2 * BLOCK_SIZE).unwrap();
    assert_eq!(2 * BLOCK_SIZE + 8, fs.getsize(inumber).unwrap());
    // 只分配了写到的块
    assert_eq!(16, fs.free_blocks().unwrap());

    let mut buf = vec![0; 3 * BLOCK_SIZE];
    assert_eq!(0, fs.read(inumber, &mut buf, 0).unwrap());
    assert_eq!(8, fs.read(inumber, &mut buf, 2 * BLOCK_SIZE).unwrap());
    assert_eq!(b"far away", &buf[..8]);
}

#[test]
fn fresh_blocks_are_zero_filled() {
    let (_, mut fs) = mounted(20);
    let old = fs.create().unwrap();
    fs.write(old, &[0xee; BLOCK_SIZE], 0).unwrap();
    fs.delete(old).unwrap();

    // 复用了旧块，块内未写到的部分必须为0
    let inumber = fs.create().unwrap();
    fs.write(inumber, b"x", 0).unwrap();
    fs.write(inumber, b"y", 10).unwrap();
    let content = read_all(&fs, inumber);
    assert_eq!(11, content.len());
    assert_eq!(b'x', content[0]);
    assert!(content[1..10].iter().all(|&b| b == 0));
    assert_eq!(b'y', content[10]);
}

#[test]
fn maximum_file_size() {
    let (_, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();

    assert_eq!(Err(FsError::FileTooLarge), fs.write(inumber, b"x", MAX_FILE_SIZE));
    // 只写得下最后一个字节
    assert_eq!(1, fs.write(inumber, b"xyz", MAX_FILE_SIZE - 1).unwrap());
    assert_eq!(MAX_FILE_SIZE, fs.getsize(inumber).unwrap());
    // 间接索引块与最后一个数据块
    assert_eq!(15, fs.free_blocks().unwrap());

    let mut buf = [0; 8];
    assert_eq!(1, fs.read(inumber, &mut buf, MAX_FILE_SIZE - 1).unwrap());
    assert_eq!(b'x', buf[0]);
}

#[test]
fn invalid_inode_io_changes_nothing() {
    let (disk, mut fs) = mounted(20);
    let inumber = fs.create().unwrap();
    fs.write(inumber, b"data", 0).unwrap();
    let total_inodes = fs.super_block().unwrap().total_inodes;

    let image = disk.image();
    let used = used_blocks(&fs);
    let mut buf = [0; 4];

    assert_eq!(Err(FsError::InvalidInode), fs.read(inumber + 1, &mut buf, 0));
    assert_eq!(Err(FsError::InvalidInode), fs.write(inumber + 1, b"data", 0));
    assert_eq!(Err(FsError::ReservedInode), fs.write(0, b"data", 0));
    assert_eq!(Err(FsError::OutOfRange), fs.read(total_inodes, &mut buf, 0));
    assert_eq!(Err(FsError::OutOfRange), fs.write(total_inodes, b"data", 0));

    assert_eq!(image, disk.image());
    assert_eq!(used, used_blocks(&fs));

    fs.delete(inumber).unwrap();
    assert_eq!(Err(FsError::InvalidInode), fs.read(inumber, &mut buf, 0));
    assert_eq!(Err(FsError::InvalidInode), fs.write(inumber, b"data", 0));
}
