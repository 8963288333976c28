use alloc::vec;
use alloc::vec::Vec;

use spin::Mutex;

use crate::BlockDevice;

/// 内存中的块设备，数据随实例一同消失
#[derive(Debug)]
pub struct RamDisk {
    data: Mutex<Vec<u8>>,
    block_size: usize,
    num_blocks: usize,
}

impl RamDisk {
    pub fn new(block_size: usize, num_blocks: usize) -> Self {
        Self {
            data: Mutex::new(vec![0; block_size * num_blocks]),
            block_size,
            num_blocks,
        }
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// 整个设备的字节拷贝
    pub fn image(&self) -> Vec<u8> {
        self.data.lock().clone()
    }

    /// 返回第`block_id`块在设备内的字节范围
    fn span(&self, block_id: usize, len: usize) -> core::ops::Range<usize> {
        assert!(
            block_id < self.num_blocks,
            "block {block_id} out of device ({} blocks)",
            self.num_blocks
        );
        assert_eq!(len, self.block_size, "not a complete block!");

        let start = block_id * self.block_size;
        start..start + self.block_size
    }
}

impl BlockDevice for RamDisk {
    #[inline]
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let span = self.span(block_id, buf.len());
        buf.copy_from_slice(&self.data.lock()[span]);
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let span = self.span(block_id, buf.len());
        self.data.lock()[span].copy_from_slice(buf);
    }
}
