//! 测试共用的设备与卷
#![allow(dead_code)]

use std::sync::Arc;

use block_dev::{BlockDevice, RamDisk};
use simple_fs::{BLOCK_SIZE, BlockId, SimpleFileSystem};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 未格式化的内存设备
pub fn ram_disk(num_blocks: usize) -> Arc<RamDisk> {
    init_logger();
    Arc::new(RamDisk::new(BLOCK_SIZE, num_blocks))
}

/// 已格式化并挂载的卷
pub fn mounted(num_blocks: usize) -> (Arc<RamDisk>, SimpleFileSystem) {
    let disk = ram_disk(num_blocks);
    let mut fs = SimpleFileSystem::new(disk.clone());
    fs.format().unwrap();
    fs.mount().unwrap();
    (disk, fs)
}

/// 每个字节都不同的测试数据
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i % 251) as u8 ^ seed.wrapping_mul(7))
        .collect()
}

/// 位图的快照：每一块是否被占用
pub fn used_blocks(fs: &SimpleFileSystem) -> Vec<bool> {
    let total = fs.super_block().unwrap().total_blocks;
    (0..total)
        .map(|id| fs.is_block_used(BlockId::new(id)).unwrap())
        .collect()
}

/// 直接改写磁盘上某个索引节点的一个32位字段
pub fn poke_inode(disk: &RamDisk, inumber: u32, field_offset: usize, value: u32) {
    let block_id = inumber as usize / 128 + 1;
    let offset = inumber as usize % 128 * 32 + field_offset;

    let mut block = vec![0; BLOCK_SIZE];
    disk.read_block(block_id, &mut block);
    block[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    disk.write_block(block_id, &block);
}
