//! 设备阵列客户端
//!
//! 提供 mount/unmount/seek/读块/写块 操作，每个操作编码为一个操作码字，
//! 通过 net::Connection 与远端交换一个报文。
//! 这一层只处理整块，不知道块内偏移；块内偏移由 mdadm 地址转换层处理。

mod device;

pub use device::JbodClient;
