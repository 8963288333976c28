//! # 索引节点管理
//!
//! inumber 即索引节点在索引节点区域中的线性序号，0号保留不用。

use alloc::vec::Vec;

use crate::layout::{BlockId, DiskInode, IndirectBlock};
use crate::sfs::Volume;
use crate::{FsError, Result, SimpleFileSystem};

impl SimpleFileSystem {
    /// 按块、块内序号升序寻找第一个空闲槽位，初始化为空文件并返回其 inumber
    pub fn create(&mut self) -> Result<u32> {
        self.volume()?.create()
    }

    /// 释放文件占用的全部块并把索引节点置为无效
    pub fn delete(&mut self, inumber: u32) -> Result<()> {
        self.volume_mut()?.delete(inumber)
    }

    /// 文件字节数
    pub fn getsize(&self, inumber: u32) -> Result<usize> {
        let inode = self.volume()?.load_valid_inode(inumber)?;
        Ok(inode.size as usize)
    }
}

impl Volume {
    fn create(&self) -> Result<u32> {
        for block_id in self.super_block.inode_area() {
            let block_id = BlockId::from(block_id);
            let mut block = self.read(block_id);

            let Some(inumber) = DiskInode::decode_all(&block)
                .enumerate()
                .filter(|(_, inode)| !inode.valid)
                .map(|(index, _)| DiskInode::inumber(block_id, index))
                .find(|&inumber| inumber != 0)
            else {
                continue;
            };

            let mut inode = DiskInode::default();
            inode.init();
            let (_, block_offset) = DiskInode::position(inumber);
            inode.write_to(&mut block, block_offset);
            self.write(block_id, &block);

            log::debug!("created inode {inumber}");
            return Ok(inumber);
        }

        Err(FsError::NoInodes)
    }

    fn delete(&mut self, inumber: u32) -> Result<()> {
        let inode = self.load_valid_inode(inumber)?;

        // 先校验全部块编号，确保出错时位图与索引节点都未被改动
        let mut drop_blocks: Vec<BlockId> = inode
            .direct_blocks()
            .map(|id| self.super_block.check(id))
            .collect::<Result<_>>()?;
        if !inode.indirect.is_null() {
            let indirect_id = self.super_block.check(inode.indirect)?;
            let indirect = IndirectBlock::from_block(self.read(indirect_id));
            for id in indirect.blocks() {
                drop_blocks.push(self.super_block.check(id)?);
            }
            drop_blocks.push(indirect_id);
        }

        for &block_id in &drop_blocks {
            self.dealloc_data(block_id);
        }

        self.store_inode(inumber, &DiskInode::default());

        log::debug!("deleted inode {inumber}, {} blocks freed", drop_blocks.len());
        Ok(())
    }
}
