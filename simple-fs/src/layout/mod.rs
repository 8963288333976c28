//! # 磁盘数据结构层
//!
//! SimpleFS 的磁盘布局：
//! 超级块 | 索引节点区域 | 数据块区域
//!
//! 所有结构都以小端定宽字段、固定偏移量编解码，不依赖内存布局。

use alloc::boxed::Box;
use alloc::sync::Arc;

use block_dev::BlockDevice;
use derive_more::{Display, From, Into};

use crate::{BLOCK_SIZE, DataBlock};

mod super_block;
pub use super_block::SuperBlock;

mod inode;
pub use inode::DiskInode;

mod indirect;
pub use indirect::IndirectBlock;

mod bitmap;
pub use bitmap::Bitmap;

/// 块编号，0 表示未分配
#[derive(Debug, Display, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, From, Into)]
#[repr(transparent)]
pub struct BlockId(u32);

impl From<BlockId> for usize {
    fn from(id: BlockId) -> Self {
        id.0 as usize
    }
}

impl BlockId {
    pub const NULL: Self = Self(0);

    /// 超级块恒在0号块
    pub const SUPER: Self = Self(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self == Self::NULL
    }
}

/// 读出整块
pub(crate) fn read_block(block_device: &Arc<dyn BlockDevice>, id: BlockId) -> Box<DataBlock> {
    let mut data = Box::new([0; BLOCK_SIZE]);
    log::trace!("read block {id}");
    block_device.read_block(id.into(), data.as_mut_slice());
    data
}

/// 写入整块
pub(crate) fn write_block(block_device: &Arc<dyn BlockDevice>, id: BlockId, data: &DataBlock) {
    log::trace!("write block {id}");
    block_device.write_block(id.into(), data);
}

#[inline]
fn get_u32(raw: &[u8], offset: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&raw[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

#[inline]
fn put_u32(raw: &mut [u8], offset: usize, value: u32) {
    raw[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
