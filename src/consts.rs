//! JBOD 驱动常量定义
//!
//! 这个模块包含了驱动用到的所有常量，包括：
//! - 块与设备阵列几何
//! - 操作码字的位布局
//! - 线协议报文长度
//! - 缓存与 I/O 限制

//=============================================================================
// 基础常量
//=============================================================================

/// 块大小（字节），也是缓存与传输的粒度
pub const JBOD_BLOCK_SIZE: usize = 256;

/// 默认设备数量
pub const JBOD_NUM_DISKS: u32 = 16;

/// 默认每个设备的块数
pub const JBOD_NUM_BLOCKS_PER_DISK: u32 = 256;

/// 默认单个设备容量（字节）
pub const JBOD_DISK_SIZE: u64 = JBOD_NUM_BLOCKS_PER_DISK as u64 * JBOD_BLOCK_SIZE as u64;

//=============================================================================
// 操作码字布局
//=============================================================================

/// 命令字段起始位（bits 31-26）
pub const OP_COMMAND_SHIFT: u32 = 26;

/// 命令字段掩码（移位后）
pub const OP_COMMAND_MASK: u32 = 0x3F;

/// 设备字段起始位（bits 25-22）
pub const OP_DEVICE_SHIFT: u32 = 22;

/// 设备字段掩码（移位后）
pub const OP_DEVICE_MASK: u32 = 0xF;

/// 块字段掩码（bits 21-0）
pub const OP_BLOCK_MASK: u32 = (1 << OP_DEVICE_SHIFT) - 1;

/// 操作码可编码的最大设备数
pub const MAX_DEVICES: u32 = OP_DEVICE_MASK + 1;

/// 操作码可编码的最大每设备块数
pub const MAX_BLOCKS_PER_DEVICE: u32 = OP_BLOCK_MASK + 1;

//=============================================================================
// 线协议
//=============================================================================

/// 报文头长度：length(2) + opcode(4) + status(2)
pub const HEADER_LEN: usize = 8;

/// 带块负载的报文总长度
pub const PACKET_LEN_WITH_BLOCK: usize = HEADER_LEN + JBOD_BLOCK_SIZE;

/// 默认服务器地址
pub const JBOD_SERVER: &str = "127.0.0.1";

/// 默认服务器端口
pub const JBOD_PORT: u16 = 3333;

//=============================================================================
// 缓存与 I/O 限制
//=============================================================================

/// 缓存最小条目数
pub const CACHE_MIN_ENTRIES: usize = 2;

/// 缓存最大条目数
pub const CACHE_MAX_ENTRIES: usize = 4096;

/// 默认缓存条目数
pub const DEFAULT_CACHE_ENTRIES: usize = 1024;

/// 单次读写的最大字节数
pub const MAX_IO_LEN: usize = 1024;
