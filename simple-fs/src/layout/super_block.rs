use core::ops::Range;

use super::{BlockId, get_u32, put_u32};
use crate::{DataBlock, FsError, INODES_PER_BLOCK, MAGIC, Result};

/// 超级块：
/// - 提供文件系统合法性校验；
/// - 定位索引节点区域与数据块区域
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    /// 魔数：用于校验文件系统合法性
    magic: u32,
    /// 文件系统占据块数
    pub total_blocks: u32,
    /// 索引节点区域占据块数，为总块数的一成（向上取整）
    pub inode_blocks: u32,
    pub total_inodes: u32,
}

impl SuperBlock {
    const MAGIC_OFFSET: usize = 0;
    const TOTAL_BLOCKS_OFFSET: usize = 4;
    const INODE_BLOCKS_OFFSET: usize = 8;
    const TOTAL_INODES_OFFSET: usize = 12;

    const FIELD_MAX: u32 = i32::MAX as u32;

    /// 按总块数计算卷的几何参数。
    ///
    /// 磁盘上的字段按有符号32位数解释，总块数或索引节点数超出其范围时返回空。
    pub fn new(total_blocks: u32) -> Option<Self> {
        let inode_blocks = total_blocks.div_ceil(10);
        let total_inodes = inode_blocks.checked_mul(INODES_PER_BLOCK as u32)?;
        if total_blocks > Self::FIELD_MAX || total_inodes > Self::FIELD_MAX {
            return None;
        }

        Some(Self {
            magic: MAGIC,
            total_blocks,
            inode_blocks,
            total_inodes,
        })
    }

    #[inline]
    pub fn magic(&self) -> u32 {
        self.magic
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.magic == MAGIC
    }

    /// 校验魔数，以及几何参数与`device_blocks`块的设备是否相符
    pub fn validate(&self, device_blocks: usize) -> Result<()> {
        if !self.is_valid() {
            return Err(FsError::BadMagic);
        }

        if self.total_blocks as usize > device_blocks {
            return Err(FsError::BadGeometry);
        }
        let expected = Self::new(self.total_blocks).ok_or(FsError::BadGeometry)?;
        if self.inode_blocks != expected.inode_blocks
            || self.total_inodes != expected.total_inodes
            || self.data_area().is_empty()
        {
            return Err(FsError::BadGeometry);
        }

        Ok(())
    }

    /// 索引节点区域：紧随超级块
    #[inline]
    pub fn inode_area(&self) -> Range<u32> {
        1..self.inode_blocks + 1
    }

    #[inline]
    pub fn data_area(&self) -> Range<u32> {
        self.inode_blocks + 1..self.total_blocks
    }

    /// 确认磁盘上读到的块编号指向数据区
    pub fn check(&self, id: BlockId) -> Result<BlockId> {
        if self.data_area().contains(&u32::from(id)) {
            Ok(id)
        } else {
            log::warn!("block pointer {id} outside data area {:?}", self.data_area());
            Err(FsError::CorruptPointer)
        }
    }

    pub fn decode(raw: &DataBlock) -> Self {
        Self {
            magic: get_u32(raw, Self::MAGIC_OFFSET),
            total_blocks: get_u32(raw, Self::TOTAL_BLOCKS_OFFSET),
            inode_blocks: get_u32(raw, Self::INODE_BLOCKS_OFFSET),
            total_inodes: get_u32(raw, Self::TOTAL_INODES_OFFSET),
        }
    }

    /// 块内剩余部分皆填0
    pub fn encode(&self, raw: &mut DataBlock) {
        raw.fill(0);
        put_u32(raw, Self::MAGIC_OFFSET, self.magic);
        put_u32(raw, Self::TOTAL_BLOCKS_OFFSET, self.total_blocks);
        put_u32(raw, Self::INODE_BLOCKS_OFFSET, self.inode_blocks);
        put_u32(raw, Self::TOTAL_INODES_OFFSET, self.total_inodes);
    }
}
