//! 数据结构定义
//!
//! 设备阵列几何、线性地址分解以及操作码字。

use crate::consts::*;
use crate::error::{Error, ErrorKind, Result};

/// 一个块的内容
pub type BlockBuf = [u8; JBOD_BLOCK_SIZE];

/// 设备阵列命令
///
/// 数值即操作码字中 bits 31-26 的取值，属于线协议的一部分。
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// 挂载阵列
    Mount = 0,
    /// 卸载阵列
    Unmount = 1,
    /// 磁头移动到设备
    SeekToDisk = 2,
    /// 磁头移动到块
    SeekToBlock = 3,
    /// 读取当前块
    ReadBlock = 4,
    /// 写入当前块
    WriteBlock = 5,
}

impl Command {
    /// 从命令字段解码
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Command::Mount),
            1 => Some(Command::Unmount),
            2 => Some(Command::SeekToDisk),
            3 => Some(Command::SeekToBlock),
            4 => Some(Command::ReadBlock),
            5 => Some(Command::WriteBlock),
            _ => None,
        }
    }
}

/// 操作码字
///
/// ```text
///  31      26 25   22 21                    0
/// +----------+-------+-----------------------+
/// | command  | disk  |         block         |
/// +----------+-------+-----------------------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Opcode(u32);

impl Opcode {
    /// 编码操作码（超出字段宽度的位被截断）
    pub const fn encode(command: Command, device: u32, block: u32) -> Self {
        Self(
            ((command as u32 & OP_COMMAND_MASK) << OP_COMMAND_SHIFT)
                | ((device & OP_DEVICE_MASK) << OP_DEVICE_SHIFT)
                | (block & OP_BLOCK_MASK),
        )
    }

    /// 从原始字构造
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// 原始字
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// 命令字段原始值
    pub const fn command_bits(self) -> u32 {
        (self.0 >> OP_COMMAND_SHIFT) & OP_COMMAND_MASK
    }

    /// 命令（未知命令返回 None）
    pub fn command(self) -> Option<Command> {
        Command::from_u32(self.command_bits())
    }

    /// 设备字段
    pub const fn device(self) -> u32 {
        (self.0 >> OP_DEVICE_SHIFT) & OP_DEVICE_MASK
    }

    /// 块字段
    pub const fn block(self) -> u32 {
        self.0 & OP_BLOCK_MASK
    }

    /// 是否携带块负载（只有写块请求携带）
    pub const fn carries_block(self) -> bool {
        self.command_bits() == Command::WriteBlock as u32
    }
}

/// 缓存键：(设备, 块)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockKey {
    /// 设备编号
    pub device: u32,
    /// 设备内块编号
    pub block: u32,
}

impl BlockKey {
    /// 创建缓存键
    pub const fn new(device: u32, block: u32) -> Self {
        Self { device, block }
    }
}

/// 线性地址分解结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAddr {
    /// 设备编号
    pub device: u32,
    /// 设备内块编号
    pub block: u32,
    /// 块内偏移
    pub offset: usize,
}

impl BlockAddr {
    /// 对应的缓存键
    pub const fn key(&self) -> BlockKey {
        BlockKey::new(self.device, self.block)
    }
}

/// 设备阵列几何
///
/// 块大小固定为 [`JBOD_BLOCK_SIZE`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 设备数量
    pub num_devices: u32,
    /// 每个设备的块数
    pub blocks_per_device: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            num_devices: JBOD_NUM_DISKS,
            blocks_per_device: JBOD_NUM_BLOCKS_PER_DISK,
        }
    }
}

impl Geometry {
    /// 创建并校验几何
    pub fn new(num_devices: u32, blocks_per_device: u32) -> Result<Self> {
        let geometry = Self {
            num_devices,
            blocks_per_device,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// 校验几何能否用操作码字寻址
    pub fn validate(&self) -> Result<()> {
        if self.num_devices == 0 || self.num_devices > MAX_DEVICES {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Device count must be between 1 and 16",
            ));
        }
        if self.blocks_per_device == 0 || self.blocks_per_device > MAX_BLOCKS_PER_DEVICE {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Blocks per device exceed the opcode block field",
            ));
        }
        Ok(())
    }

    /// 单个设备容量（字节）
    pub const fn device_capacity(&self) -> u64 {
        self.blocks_per_device as u64 * JBOD_BLOCK_SIZE as u64
    }

    /// 阵列总容量（字节）
    pub const fn total_size(&self) -> u64 {
        self.num_devices as u64 * self.device_capacity()
    }

    /// (设备, 块) 是否在阵列内
    pub const fn contains(&self, key: BlockKey) -> bool {
        key.device < self.num_devices && key.block < self.blocks_per_device
    }

    /// 范围 [addr, addr + len) 是否在阵列内
    pub fn contains_range(&self, addr: u64, len: usize) -> bool {
        addr.checked_add(len as u64)
            .map_or(false, |end| end <= self.total_size())
    }

    /// 把线性地址分解为 (设备, 块, 偏移)
    pub fn locate(&self, addr: u64) -> BlockAddr {
        let capacity = self.device_capacity();
        let within = addr % capacity;
        BlockAddr {
            device: (addr / capacity) as u32,
            block: (within / JBOD_BLOCK_SIZE as u64) as u32,
            offset: (within % JBOD_BLOCK_SIZE as u64) as usize,
        }
    }

    /// 下一个块的键，块号到达设备末尾时滚动到下一个设备
    pub const fn next(&self, key: BlockKey) -> BlockKey {
        if key.block + 1 == self.blocks_per_device {
            BlockKey::new(key.device + 1, 0)
        } else {
            BlockKey::new(key.device, key.block + 1)
        }
    }
}
