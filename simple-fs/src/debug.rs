//! 诊断：直接从磁盘读出超级块与全部有效索引节点，不改动任何状态。

use alloc::vec::Vec;
use core::fmt;

use crate::layout::{BlockId, DiskInode, IndirectBlock, SuperBlock, read_block};
use crate::{Result, SimpleFileSystem};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugReport {
    pub super_block: SuperBlock,
    pub inodes: Vec<InodeReport>,
}

/// 一个有效索引节点的概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InodeReport {
    pub inumber: u32,
    pub size: u32,
    /// 非零的直接索引
    pub direct: Vec<BlockId>,
    /// 间接索引块，以及其中非零的各项
    pub indirect: Option<(BlockId, Vec<BlockId>)>,
}

impl SimpleFileSystem {
    /// 无论是否挂载都可调用；设备未格式化时报 [`crate::FsError::BadMagic`]
    pub fn debug(&self) -> Result<DebugReport> {
        let block_device = self.block_device();
        let super_block = SuperBlock::decode(&read_block(block_device, BlockId::SUPER));
        super_block.validate(block_device.num_blocks())?;

        let mut inodes = Vec::new();
        for block_id in super_block.inode_area() {
            let inode_block = read_block(block_device, block_id.into());
            for (index, inode) in DiskInode::decode_all(&inode_block).enumerate() {
                if !inode.valid {
                    continue;
                }

                // 越界的间接索引只报告，不跟随
                let indirect = (!inode.indirect.is_null()).then(|| {
                    let blocks: Vec<BlockId> = match super_block.check(inode.indirect) {
                        Ok(id) => IndirectBlock::from_block(read_block(block_device, id))
                            .blocks()
                            .collect(),
                        Err(_) => Vec::new(),
                    };
                    (inode.indirect, blocks)
                });

                inodes.push(InodeReport {
                    inumber: DiskInode::inumber(block_id.into(), index),
                    size: inode.size,
                    direct: inode.direct_blocks().collect(),
                    indirect,
                });
            }
        }

        Ok(DebugReport {
            super_block,
            inodes,
        })
    }
}

impl fmt::Display for DebugReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "superblock:")?;
        writeln!(f, "    magic number is valid")?;
        writeln!(f, "    {} blocks", self.super_block.total_blocks)?;
        writeln!(f, "    {} inode blocks", self.super_block.inode_blocks)?;
        writeln!(f, "    {} inodes", self.super_block.total_inodes)?;

        for inode in &self.inodes {
            write!(f, "{inode}")?;
        }
        Ok(())
    }
}

impl fmt::Display for InodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "inode {}:", self.inumber)?;
        writeln!(f, "    size: {} bytes", self.size)?;
        write!(f, "    direct blocks:")?;
        for id in &self.direct {
            write!(f, " {id}")?;
        }
        writeln!(f)?;

        if let Some((indirect_id, blocks)) = &self.indirect {
            writeln!(f, "    indirect block: {indirect_id}")?;
            write!(f, "    indirect data blocks:")?;
            for id in blocks {
                write!(f, " {id}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
