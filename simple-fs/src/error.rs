use derive_more::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    #[display(fmt = "cannot format a mounted volume")]
    AlreadyMounted,
    #[display(fmt = "no volume is mounted")]
    NotMounted,
    #[display(fmt = "bad magic number in superblock")]
    BadMagic,
    /// 魔数正确，但几何参数互相矛盾或超出设备
    #[display(fmt = "superblock geometry does not match the device")]
    BadGeometry,
    #[display(fmt = "device is too small to hold a volume")]
    DeviceTooSmall,
    /// 总块数或索引节点数无法用磁盘上的32位有符号字段表示
    #[display(fmt = "device is too large for the on-disk geometry fields")]
    DeviceTooLarge,
    #[display(fmt = "inumber out of range")]
    OutOfRange,
    /// 0号索引节点与超级块在寻址上重叠，永不分配
    #[display(fmt = "inumber 0 is reserved")]
    ReservedInode,
    #[display(fmt = "inode is not in use")]
    InvalidInode,
    #[display(fmt = "inode table is full")]
    NoInodes,
    #[display(fmt = "no free data block")]
    NoSpace,
    #[display(fmt = "offset beyond the maximum file size")]
    FileTooLarge,
    /// 磁盘上的块编号落在数据区之外
    #[display(fmt = "block pointer outside the data region")]
    CorruptPointer,
}

pub type Result<T> = core::result::Result<T, FsError>;
