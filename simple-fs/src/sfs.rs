//! # 卷管理层
//!
//! 构建出磁盘的布局并使用：格式化、挂载，以及挂载后的数据块分配。

use alloc::boxed::Box;
use alloc::sync::Arc;

use block_dev::BlockDevice;

use crate::layout::{Bitmap, BlockId, DiskInode, SuperBlock, read_block, write_block};
use crate::{BLOCK_SIZE, DataBlock, FsError, Result};

/// 文件系统实例，持有块设备以及挂载状态。
///
/// 同一时刻只挂载一个卷；多个线程共享同一实例时需由调用者串行化。
pub struct SimpleFileSystem {
    block_device: Arc<dyn BlockDevice>,
    volume: Option<Volume>,
}

/// 已挂载的卷：缓存的超级块与内存中的空闲块位图
pub(crate) struct Volume {
    pub(crate) block_device: Arc<dyn BlockDevice>,
    pub(crate) super_block: SuperBlock,
    pub(crate) bitmap: Bitmap,
}

impl SimpleFileSystem {
    /// 未挂载的实例
    pub fn new(block_device: Arc<dyn BlockDevice>) -> Self {
        Self {
            block_device,
            volume: None,
        }
    }

    /// 按设备总块数写入超级块，并把全部索引节点置为无效。
    /// 对已有的卷是破坏性的；已挂载时拒绝。
    pub fn format(&mut self) -> Result<()> {
        if self.is_mounted() {
            log::warn!("refusing to format a mounted volume");
            return Err(FsError::AlreadyMounted);
        }

        let super_block = u32::try_from(self.block_device.num_blocks())
            .ok()
            .and_then(SuperBlock::new)
            .ok_or(FsError::DeviceTooLarge)?;
        if super_block.data_area().is_empty() {
            return Err(FsError::DeviceTooSmall);
        }

        let mut block: Box<DataBlock> = Box::new([0; BLOCK_SIZE]);
        super_block.encode(&mut block);
        write_block(&self.block_device, BlockId::SUPER, &block);

        block.fill(0);
        for block_id in super_block.inode_area() {
            write_block(&self.block_device, block_id.into(), &block);
        }

        log::info!(
            "formatted: {} blocks, {} inode blocks, {} inodes",
            super_block.total_blocks,
            super_block.inode_blocks,
            super_block.total_inodes
        );
        Ok(())
    }

    /// 校验超级块并扫描索引节点区域重建位图。
    /// 允许重复挂载，此时位图被重新扫描替换。
    pub fn mount(&mut self) -> Result<()> {
        let super_block = SuperBlock::decode(&read_block(&self.block_device, BlockId::SUPER));
        super_block.validate(self.block_device.num_blocks())?;

        let bitmap = Bitmap::rebuild(&super_block, &self.block_device)?;
        log::info!(
            "mounted: {} blocks, {} in use",
            super_block.total_blocks,
            bitmap.used()
        );

        self.volume = Some(Volume {
            block_device: self.block_device.clone(),
            super_block,
            bitmap,
        });
        Ok(())
    }

    /// 丢弃内存中的挂载状态，磁盘上的数据不受影响
    pub fn unmount(&mut self) -> Result<()> {
        self.volume.take().map(|_| ()).ok_or(FsError::NotMounted)
    }

    #[inline]
    pub fn is_mounted(&self) -> bool {
        self.volume.is_some()
    }

    #[inline]
    pub fn block_device(&self) -> &Arc<dyn BlockDevice> {
        &self.block_device
    }

    pub fn super_block(&self) -> Result<&SuperBlock> {
        Ok(&self.volume()?.super_block)
    }

    pub fn free_blocks(&self) -> Result<usize> {
        let bitmap = &self.volume()?.bitmap;
        Ok(bitmap.capacity() - bitmap.used())
    }

    pub fn is_block_used(&self, block_id: BlockId) -> Result<bool> {
        let volume = self.volume()?;
        if u32::from(block_id) >= volume.super_block.total_blocks {
            return Err(FsError::OutOfRange);
        }
        Ok(volume.bitmap.is_used(block_id))
    }

    pub(crate) fn volume(&self) -> Result<&Volume> {
        self.volume.as_ref().ok_or(FsError::NotMounted)
    }

    pub(crate) fn volume_mut(&mut self) -> Result<&mut Volume> {
        self.volume.as_mut().ok_or(FsError::NotMounted)
    }
}

impl Volume {
    /// 在数据区分配新块并返回其ID
    pub fn alloc_data(&mut self) -> Result<BlockId> {
        let block_id = self.bitmap.alloc().ok_or(FsError::NoSpace)?;
        log::debug!("allocated block {block_id}");
        Ok(block_id)
    }

    #[inline]
    pub fn dealloc_data(&mut self, block_id: BlockId) {
        log::debug!("freed block {block_id}");
        self.bitmap.dealloc(block_id);
    }

    /// 确认 inumber 可以指向一个索引节点
    pub fn check_inumber(&self, inumber: u32) -> Result<()> {
        if inumber == 0 {
            Err(FsError::ReservedInode)
        } else if inumber >= self.super_block.total_inodes {
            Err(FsError::OutOfRange)
        } else {
            Ok(())
        }
    }

    pub fn load_inode(&self, inumber: u32) -> DiskInode {
        let (block_id, block_offset) = DiskInode::position(inumber);
        DiskInode::read_from(&read_block(&self.block_device, block_id), block_offset)
    }

    /// 读出有效的索引节点
    pub fn load_valid_inode(&self, inumber: u32) -> Result<DiskInode> {
        self.check_inumber(inumber)?;
        let inode = self.load_inode(inumber);
        if inode.valid {
            Ok(inode)
        } else {
            Err(FsError::InvalidInode)
        }
    }

    /// 写回索引节点所在的整个索引节点块
    pub fn store_inode(&self, inumber: u32, inode: &DiskInode) {
        let (block_id, block_offset) = DiskInode::position(inumber);
        let mut block = read_block(&self.block_device, block_id);
        inode.write_to(&mut block, block_offset);
        write_block(&self.block_device, block_id, &block);
    }

    #[inline]
    pub fn read(&self, block_id: BlockId) -> Box<DataBlock> {
        read_block(&self.block_device, block_id)
    }

    #[inline]
    pub fn write(&self, block_id: BlockId, data: &DataBlock) {
        write_block(&self.block_device, block_id, data);
    }
}
