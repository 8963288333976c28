//! 磁盘上的索引节点
//!
//! 每个索引节点32字节，一个索引节点块连续存放 [`INODES_PER_BLOCK`] 个：
//!
//! | 偏移 | 字段 |
//! |------|------|
//! | 0    | valid |
//! | 4    | size |
//! | 8    | direct[0..5] |
//! | 28   | indirect |

use super::{BlockId, get_u32, put_u32};
use crate::{DIRECT_COUNT, DataBlock, INODE_SIZE, INODES_PER_BLOCK};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiskInode {
    /// 为假时槽位空闲
    pub valid: bool,
    /// 文件字节数
    pub size: u32,
    /// 直接索引，存储容量：DIRECT_COUNT * BLOCK_SIZE 字节
    pub direct: [BlockId; DIRECT_COUNT],
    /// 指向一个间接索引块
    pub indirect: BlockId,
}

impl DiskInode {
    const VALID_OFFSET: usize = 0;
    const SIZE_OFFSET: usize = 4;
    const DIRECT_OFFSET: usize = 8;
    const INDIRECT_OFFSET: usize = Self::DIRECT_OFFSET + DIRECT_COUNT * 4;

    #[inline]
    pub fn init(&mut self) {
        *self = Self {
            valid: true,
            ..Default::default()
        }
    }

    /// 通过 inumber 获取索引节点在磁盘上的位置：**块ID**以及**块内偏移**
    #[inline]
    pub fn position(inumber: u32) -> (BlockId, usize) {
        let inumber = inumber as usize;
        let block_id = inumber / INODES_PER_BLOCK + 1;
        let block_offset = inumber % INODES_PER_BLOCK * INODE_SIZE;

        (BlockId::new(block_id as u32), block_offset)
    }

    /// 由索引节点块与块内序号反推 inumber
    #[inline]
    pub fn inumber(block_id: BlockId, index: usize) -> u32 {
        (u32::from(block_id) - 1) * INODES_PER_BLOCK as u32 + index as u32
    }

    /// 全部已分配的直接索引
    pub fn direct_blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.direct.iter().copied().filter(|id| !id.is_null())
    }

    pub fn decode(raw: &[u8]) -> Self {
        let mut direct = [BlockId::NULL; DIRECT_COUNT];
        for (i, id) in direct.iter_mut().enumerate() {
            *id = get_u32(raw, Self::DIRECT_OFFSET + i * 4).into();
        }

        Self {
            valid: get_u32(raw, Self::VALID_OFFSET) != 0,
            size: get_u32(raw, Self::SIZE_OFFSET),
            direct,
            indirect: get_u32(raw, Self::INDIRECT_OFFSET).into(),
        }
    }

    pub fn encode(&self, raw: &mut [u8]) {
        put_u32(raw, Self::VALID_OFFSET, self.valid as u32);
        put_u32(raw, Self::SIZE_OFFSET, self.size);
        for (i, &id) in self.direct.iter().enumerate() {
            put_u32(raw, Self::DIRECT_OFFSET + i * 4, id.into());
        }
        put_u32(raw, Self::INDIRECT_OFFSET, self.indirect.into());
    }

    /// 解出索引节点块内的全部索引节点
    pub fn decode_all(block: &DataBlock) -> impl Iterator<Item = Self> + '_ {
        block.chunks_exact(INODE_SIZE).map(Self::decode)
    }

    /// 在索引节点块中读出`offset`处的索引节点
    #[inline]
    pub fn read_from(block: &DataBlock, offset: usize) -> Self {
        Self::decode(&block[offset..offset + INODE_SIZE])
    }

    #[inline]
    pub fn write_to(&self, block: &mut DataBlock, offset: usize) {
        self.encode(&mut block[offset..offset + INODE_SIZE]);
    }
}
