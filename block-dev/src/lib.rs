//! # 块设备接口层
//!
//! 块设备是以**块**为单位存储数据的设备，例如磁盘、光盘、U盘等；
//! [`BlockDevice`] 就是对读写块设备的抽象，
//! 实现了此特质的类型称为**块设备驱动**。
//!
//! 块设备只负责整块、同步地读写，不理解块内的数据。

#![no_std]

extern crate alloc;

mod ram_disk;

use core::any::Any;

pub use self::ram_disk::RamDisk;

/// 块设备驱动特质
pub trait BlockDevice: Send + Sync + Any {
    /// 设备的总块数
    fn num_blocks(&self) -> usize;

    /// 读出第`block_id`块，`buf`的长度必须等于块大小
    fn read_block(&self, block_id: usize, buf: &mut [u8]);

    /// 写入第`block_id`块，`buf`的长度必须等于块大小
    fn write_block(&self, block_id: usize, buf: &[u8]);
}
