//! mdadm_core: JBOD 设备阵列的线性地址存储驱动
//!
//! 把一组通过二进制协议远程访问的定长块设备呈现为一段连续的字节空间：
//! - **地址转换**：任意字节范围映射为 (设备, 块, 偏移)，部分块写入做读-改-写
//! - **块缓存**：固定容量、最近最少使用驱逐的单级块缓存
//! - **报文编解码**：字节流上的定长请求/响应报文
//!
//! # 示例
//!
//! ```rust,ignore
//! use mdadm_core::{Connection, DriverConfig, Mdadm, Result};
//!
//! fn main() -> Result<()> {
//!     let conn = Connection::connect(("127.0.0.1", 3333))?;
//!     let mut array = Mdadm::new(conn, DriverConfig::default().with_cache(1024))?;
//!
//!     array.mount()?;
//!     array.write(1000, b"spanning a block boundary")?;
//!
//!     let mut buf = vec![0u8; 25];
//!     array.read(1000, &mut buf)?;
//!
//!     array.report_hit_rate();
//!     array.shutdown()
//! }
//! ```
//!
//! # 模块结构
//!
//! - [`error`] - 错误类型定义
//! - [`consts`] - 常量定义
//! - [`types`] - 几何、地址与操作码
//! - [`net`] - 传输接口与报文编解码
//! - [`block`] - 设备阵列客户端
//! - [`cache`] - 块缓存
//! - [`mdadm`] - 线性地址驱动
//!
//! # Features
//!
//! - `std`：启用基于 `std::io` 的 `StreamTransport`、
//!   TCP 连接和 `std::error::Error`。流传输的测试只在该特性下编译，
//!   完整测试需运行 `cargo test --features std`。

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

// ===== 核心模块 =====

/// 错误处理
pub mod error;

/// 常量定义
pub mod consts;

/// 数据结构定义
pub mod types;

/// 传输编解码
pub mod net;

/// 设备阵列客户端
pub mod block;

/// 块缓存
pub mod cache;

/// 线性地址驱动
pub mod mdadm;

/// 测试用设备阵列模拟器
#[cfg(test)]
pub(crate) mod mock;

// ===== 公共导出 =====

// 错误处理
pub use error::{Error, ErrorKind, Result};

// 数据结构
pub use types::{BlockAddr, BlockBuf, BlockKey, Command, Geometry, Opcode};

// 传输
pub use net::{Connection, Response, Transport};
#[cfg(feature = "std")]
pub use net::StreamTransport;

// 设备阵列客户端
pub use block::JbodClient;

// Cache
pub use cache::{BlockCache, CacheEntry, CacheFlags, CacheStats};

// 驱动
pub use mdadm::{DriverConfig, Mdadm};
