use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;

use block_dev::BlockDevice;

use super::{BlockId, DiskInode, IndirectBlock, SuperBlock, read_block};
use crate::Result;

/// 位图中的一组
type BitGroup = u64;

const GROUP_BITS: usize = BitGroup::BITS as usize;

/// 空闲块位图，位为1表示块已占用。
///
/// 位图只存在于内存中，挂载时由 [`Bitmap::rebuild`] 扫描索引节点区域得到，
/// 是空闲空间唯一的依据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    groups: Vec<BitGroup>,
    /// 位图指示的总块数
    blocks: usize,
}

/// 块编号在位图中的位置
struct BitPos {
    group_index: usize,
    ingroup_index: usize,
}

impl Bitmap {
    /// 全部块空闲的位图，末组多出的位视为占用
    pub fn new(blocks: usize) -> Self {
        let mut groups = vec![0; blocks.div_ceil(GROUP_BITS)];
        if blocks % GROUP_BITS != 0 {
            if let Some(last) = groups.last_mut() {
                *last = BitGroup::MAX << (blocks % GROUP_BITS);
            }
        }

        Self { groups, blocks }
    }

    /// 扫描索引节点区域重建位图：
    /// 超级块、索引节点区域、有效索引节点的直接索引、间接索引块及其中的各项都视为占用
    pub fn rebuild(super_block: &SuperBlock, block_device: &Arc<dyn BlockDevice>) -> Result<Self> {
        let mut bitmap = Self::new(super_block.total_blocks as usize);

        bitmap.mark_used(BlockId::SUPER);
        for block_id in super_block.inode_area() {
            bitmap.mark_used(block_id.into());
        }

        for block_id in super_block.inode_area() {
            let inode_block = read_block(block_device, block_id.into());
            for inode in DiskInode::decode_all(&inode_block).filter(|inode| inode.valid) {
                for id in inode.direct_blocks() {
                    bitmap.mark_used(super_block.check(id)?);
                }

                if inode.indirect.is_null() {
                    continue;
                }
                let indirect_id = super_block.check(inode.indirect)?;
                bitmap.mark_used(indirect_id);
                let indirect = IndirectBlock::from_block(read_block(block_device, indirect_id));
                for id in indirect.blocks() {
                    bitmap.mark_used(super_block.check(id)?);
                }
            }
        }

        Ok(bitmap)
    }

    /// 位图所指示的总块数
    #[inline]
    pub fn capacity(&self) -> usize {
        self.blocks
    }

    /// 分配编号最小的空闲块，若位图的空间用尽，则返回空。
    pub fn alloc(&mut self) -> Option<BlockId> {
        let (group_index, ingroup_index) =
            self.groups
                .iter()
                .enumerate()
                .find_map(|(group_index, &bits)| {
                    (bits != BitGroup::MAX).then_some((group_index, bits.trailing_ones()))
                })?;

        self.groups[group_index] |= 1 << ingroup_index;
        Some(BitPos::encode(group_index, ingroup_index as usize))
    }

    #[inline]
    pub fn mark_used(&mut self, id: BlockId) {
        let BitPos {
            group_index,
            ingroup_index,
        } = self.locate(id);
        self.groups[group_index] |= 1 << ingroup_index;
    }

    pub fn dealloc(&mut self, id: BlockId) {
        let BitPos {
            group_index,
            ingroup_index,
        } = self.locate(id);
        // 编号一定得有对应的位
        debug_assert_ne!(self.groups[group_index] & (1 << ingroup_index), 0);
        self.groups[group_index] &= !(1 << ingroup_index);
    }

    pub fn is_used(&self, id: BlockId) -> bool {
        let BitPos {
            group_index,
            ingroup_index,
        } = self.locate(id);
        self.groups[group_index] & (1 << ingroup_index) != 0
    }

    /// 已占用的块数
    pub fn used(&self) -> usize {
        let padding = self.groups.len() * GROUP_BITS - self.blocks;
        self.groups
            .iter()
            .map(|bits| bits.count_ones() as usize)
            .sum::<usize>()
            - padding
    }

    fn locate(&self, id: BlockId) -> BitPos {
        let raw = usize::from(id);
        assert!(raw < self.blocks, "block {id} out of bitmap");
        BitPos::decode(raw)
    }
}

impl BitPos {
    /// 线性映射编码得到块ID
    #[inline]
    fn encode(group_index: usize, ingroup_index: usize) -> BlockId {
        BlockId::new((group_index * GROUP_BITS + ingroup_index) as u32)
    }

    #[inline]
    fn decode(raw: usize) -> Self {
        Self {
            group_index: raw / GROUP_BITS,
            ingroup_index: raw % GROUP_BITS,
        }
    }
}
