//! # SimpleFS
//!
//! 扁平命名空间的单卷文件系统：没有目录，文件只以 inumber 标识。
//!
//! 磁盘布局：
//! 超级块 | 索引节点区域（占总块数的一成） | 数据块区域
//!
//! 空闲块位图不落盘，每次挂载时扫描索引节点区域重建。

#![no_std]

extern crate alloc;

/* SimpleFS 的整体架构，自上而下 */

// 数据通路：按字节偏移读写文件，写时按需分配块
mod data;

// 索引节点管理：创建、删除、查询索引节点
mod inode;

// 诊断：导出超级块与全部有效索引节点
mod debug;

// 卷管理层：格式化、挂载、分配数据块
mod sfs;

// 磁盘数据结构层：表示磁盘文件系统的数据结构
mod layout;

mod error;

pub use self::{
    debug::{DebugReport, InodeReport},
    error::{FsError, Result},
    layout::{BlockId, SuperBlock},
    sfs::SimpleFileSystem,
};

pub const MAGIC: u32 = 0xf0f03410;
pub const BLOCK_SIZE: usize = 4096;

/// 一个索引节点块内的索引节点个数
pub const INODES_PER_BLOCK: usize = 128;
/// 磁盘上单个索引节点的字节数
pub const INODE_SIZE: usize = BLOCK_SIZE / INODES_PER_BLOCK;
/// 直接索引个数
pub const DIRECT_COUNT: usize = 5;
/// 间接索引块的编号容量
pub const POINTERS_PER_BLOCK: usize = BLOCK_SIZE / 4;
/// 单个文件最多占用的数据块数
pub const MAX_FILE_BLOCKS: usize = DIRECT_COUNT + POINTERS_PER_BLOCK;
pub const MAX_FILE_SIZE: usize = MAX_FILE_BLOCKS * BLOCK_SIZE;

pub type DataBlock = [u8; BLOCK_SIZE];
