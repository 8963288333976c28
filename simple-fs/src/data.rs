//! # 数据通路
//!
//! 把 (inumber, 字节偏移, 长度) 转换为对直接索引、间接索引所指数据块的读写。
//!
//! 文件的第`i`块：`i < DIRECT_COUNT`时由直接索引给出，
//! 否则由间接索引块的第`i - DIRECT_COUNT`项给出。
//! 写入时按需分配块，未写过的块是空洞，读到空洞即停止。

use alloc::boxed::Box;

use crate::layout::{BlockId, DiskInode, IndirectBlock};
use crate::sfs::Volume;
use crate::{BLOCK_SIZE, DIRECT_COUNT, FsError, MAX_FILE_SIZE, Result, SimpleFileSystem};

impl SimpleFileSystem {
    /// 从指定位置(字节偏移)读出数据填充`buf`，返回读出的字节数。
    ///
    /// 读取不越过文件大小，遇到未分配的块时提前结束。
    pub fn read(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        self.volume()?.read_at(inumber, buf, offset)
    }

    /// 把`buf`写到指定位置(字节偏移)，返回写入的字节数。
    ///
    /// 中途空间耗尽时返回已写入的字节数，已分配的块不会回滚；
    /// 一个字节都写不进去时报 [`FsError::NoSpace`]，此时不占用任何新块。
    pub fn write(&mut self, inumber: u32, buf: &[u8], offset: usize) -> Result<usize> {
        self.volume_mut()?.write_at(inumber, buf, offset)
    }
}

impl Volume {
    fn read_at(&self, inumber: u32, buf: &mut [u8], offset: usize) -> Result<usize> {
        let inode = self.load_valid_inode(inumber)?;

        let mut start = offset;
        let end = start
            .saturating_add(buf.len())
            .min(inode.size as usize)
            .min(MAX_FILE_SIZE);
        if start >= end {
            return Ok(0);
        }

        // 间接索引块只读一次
        let mut indirect: Option<IndirectBlock> = None;
        // 已读取多少字节
        let mut read_size = 0;
        while start < end {
            // 当前块在文件内的逻辑索引
            let block_index = start / BLOCK_SIZE;
            // 当前块的末地址(字节)
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_read_size = current_block_end - start;

            let Some(block_id) = self.block_id(&inode, block_index, &mut indirect)? else {
                log::debug!("inode {inumber}: hole at block {block_index}");
                break;
            };

            let data_block = self.read(block_id);
            // 绝对地址 % 块大小 = 块内偏移
            let src = &data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_read_size];
            buf[read_size..read_size + block_read_size].copy_from_slice(src);

            read_size += block_read_size;
            start = current_block_end;
        }

        Ok(read_size)
    }

    fn write_at(&mut self, inumber: u32, buf: &[u8], offset: usize) -> Result<usize> {
        let mut inode = self.load_valid_inode(inumber)?;

        if buf.is_empty() {
            return Ok(0);
        }
        if offset >= MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        let mut start = offset;
        let end = start.saturating_add(buf.len()).min(MAX_FILE_SIZE);

        let mut written_size = 0;
        while start < end {
            let block_index = start / BLOCK_SIZE;
            let current_block_end = ((block_index + 1) * BLOCK_SIZE).min(end);
            let block_write_size = current_block_end - start;

            let (block_id, fresh) = match self.block_id_or_alloc(inumber, &mut inode, block_index) {
                Ok(found) => found,
                Err(FsError::NoSpace) if written_size > 0 => {
                    log::warn!(
                        "inode {inumber}: out of space, wrote {written_size} of {} bytes",
                        buf.len()
                    );
                    break;
                }
                Err(e) => return Err(e),
            };

            // 新分配的块内容未定，整块写入时也不必读出旧数据
            let mut data_block = if fresh || block_write_size == BLOCK_SIZE {
                Box::new([0; BLOCK_SIZE])
            } else {
                self.read(block_id)
            };
            let dest =
                &mut data_block[start % BLOCK_SIZE..start % BLOCK_SIZE + block_write_size];
            dest.copy_from_slice(&buf[written_size..written_size + block_write_size]);
            self.write(block_id, &data_block);

            written_size += block_write_size;
            start = current_block_end;
        }

        let covered = (offset + written_size) as u32;
        if covered > inode.size {
            inode.size = covered;
            self.store_inode(inumber, &inode);
        }

        Ok(written_size)
    }

    /// 逻辑上 inode 指向一系列数据块，此处传入的是这些数据块的索引（逻辑索引），
    /// 返回其块ID；未分配时返回空。
    ///
    /// `indirect`缓存已读出的间接索引块。
    fn block_id(
        &self,
        inode: &DiskInode,
        block_index: usize,
        indirect: &mut Option<IndirectBlock>,
    ) -> Result<Option<BlockId>> {
        let block_id = if block_index < DIRECT_COUNT {
            inode.direct[block_index]
        } else {
            if inode.indirect.is_null() {
                return Ok(None);
            }
            if indirect.is_none() {
                let indirect_id = self.super_block.check(inode.indirect)?;
                *indirect = Some(IndirectBlock::from_block(self.read(indirect_id)));
            }
            indirect
                .as_ref()
                .map_or(BlockId::NULL, |indirect| indirect.get(block_index - DIRECT_COUNT))
        };

        if block_id.is_null() {
            Ok(None)
        } else {
            self.super_block.check(block_id).map(Some)
        }
    }

    /// 同 [`Volume::block_id`]，但未分配时分配新块，先记入索引再写回磁盘。
    /// 返回块ID，以及该块是否为新分配。
    fn block_id_or_alloc(
        &mut self,
        inumber: u32,
        inode: &mut DiskInode,
        block_index: usize,
    ) -> Result<(BlockId, bool)> {
        if block_index < DIRECT_COUNT {
            let block_id = inode.direct[block_index];
            if !block_id.is_null() {
                return Ok((self.super_block.check(block_id)?, false));
            }

            let block_id = self.alloc_data()?;
            inode.direct[block_index] = block_id;
            self.store_inode(inumber, inode);
            return Ok((block_id, true));
        }

        let index = block_index - DIRECT_COUNT;

        // 这次写入越过了直接索引，创建间接索引块；
        // 它与第一个数据块一同分配，数据块分配失败时归还
        if inode.indirect.is_null() {
            let indirect_id = self.alloc_data()?;
            let block_id = match self.alloc_data() {
                Ok(block_id) => block_id,
                Err(e) => {
                    self.dealloc_data(indirect_id);
                    return Err(e);
                }
            };

            let mut indirect = IndirectBlock::zeroed();
            indirect.set(index, block_id);
            self.write(indirect_id, indirect.as_block());
            inode.indirect = indirect_id;
            self.store_inode(inumber, inode);
            return Ok((block_id, true));
        }

        let indirect_id = self.super_block.check(inode.indirect)?;
        let mut indirect = IndirectBlock::from_block(self.read(indirect_id));
        let block_id = indirect.get(index);
        if !block_id.is_null() {
            return Ok((self.super_block.check(block_id)?, false));
        }

        let block_id = self.alloc_data()?;
        indirect.set(index, block_id);
        self.write(indirect_id, indirect.as_block());
        Ok((block_id, true))
    }
}
