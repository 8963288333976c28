//! 间接索引块：整个块连续存储**块编号**，每个编号都指向一个**数据块**，
//! 编号为0表示该项未分配。

use alloc::boxed::Box;

use super::{BlockId, get_u32, put_u32};
use crate::{BLOCK_SIZE, DataBlock, POINTERS_PER_BLOCK};

pub struct IndirectBlock {
    data: Box<DataBlock>,
}

impl IndirectBlock {
    /// 新分配的间接索引块，所有项都未分配
    pub fn zeroed() -> Self {
        Self {
            data: Box::new([0; BLOCK_SIZE]),
        }
    }

    #[inline]
    pub fn from_block(data: Box<DataBlock>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn as_block(&self) -> &DataBlock {
        &self.data
    }

    #[inline]
    pub fn get(&self, index: usize) -> BlockId {
        debug_assert!(index < POINTERS_PER_BLOCK);
        get_u32(self.data.as_slice(), index * 4).into()
    }

    #[inline]
    pub fn set(&mut self, index: usize, id: BlockId) {
        debug_assert!(index < POINTERS_PER_BLOCK);
        put_u32(self.data.as_mut_slice(), index * 4, id.into());
    }

    /// 全部已分配的项，按编号数组顺序
    pub fn blocks(&self) -> impl Iterator<Item = BlockId> + '_ {
        (0..POINTERS_PER_BLOCK)
            .map(|index| self.get(index))
            .filter(|id| !id.is_null())
    }
}
