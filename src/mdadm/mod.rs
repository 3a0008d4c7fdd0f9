//! 线性地址存储驱动
//!
//! 这个模块把设备阵列呈现为一段连续的字节空间，是驱动对外的读写接口。

mod array;
mod types;

pub use array::Mdadm;
pub use types::DriverConfig;
