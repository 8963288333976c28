//! 宿主机上的磁盘镜像：以普通文件充当块设备，卷可以跨进程保留。


use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::Mutex;

use block_dev::BlockDevice;

/// 文件后端的块设备
#[derive(Debug)]
pub struct BlockFile {
    file: Mutex<File>,
    block_size: usize,
    num_blocks: usize,
}

impl BlockFile {
    /// 创建（或截断）镜像文件，并扩展到`num_blocks`块
    pub fn create(path: impl AsRef<Path>, block_size: usize, num_blocks: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path.as_ref())?;
        file.set_len((block_size * num_blocks) as u64)?;
        log::info!(
            "created image {:?}: {num_blocks} blocks of {block_size} bytes",
            path.as_ref()
        );

        Ok(Self {
            file: Mutex::new(file),
            block_size,
            num_blocks,
        })
    }

    /// 打开已有的镜像文件，块数由文件长度得出，不足一块的尾部被忽略
    pub fn open(path: impl AsRef<Path>, block_size: usize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;
        let num_blocks = file.metadata()?.len() as usize / block_size;
        log::info!("opened image {:?}: {num_blocks} blocks", path.as_ref());

        Ok(Self {
            file: Mutex::new(file),
            block_size,
            num_blocks,
        })
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    fn seek_to(&self, file: &mut File, block_id: usize, len: usize) {
        assert!(block_id < self.num_blocks, "block {block_id} out of image");
        assert_eq!(len, self.block_size, "not a complete block!");
        file.seek(SeekFrom::Start((block_id * self.block_size) as u64))
            .expect("seeking error");
    }
}

impl BlockDevice for BlockFile {
    #[inline]
    fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    fn read_block(&self, block_id: usize, buf: &mut [u8]) {
        let mut file = self.file.lock().unwrap();
        self.seek_to(&mut file, block_id, buf.len());
        file.read_exact(buf).expect("reading error");
    }

    fn write_block(&self, block_id: usize, buf: &[u8]) {
        let mut file = self.file.lock().unwrap();
        self.seek_to(&mut file, block_id, buf.len());
        file.write_all(buf).expect("writing error");
    }
}
