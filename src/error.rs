//! 错误类型定义
//!
//! 提供驱动各层（传输、设备阵列客户端、块缓存、地址转换）共用的错误类型。

use core::fmt;

/// 驱动操作错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    message: &'static str,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// I/O 错误（短读、短写、连接断开）
    Io,
    /// 无效参数（地址越界、长度超限、容量越界）
    InvalidInput,
    /// 无效状态（未挂载、重复挂载、缓存启用/禁用误用）
    InvalidState,
    /// 已存在
    AlreadyExists,
    /// 远端设备阵列拒绝了操作（响应状态码非零）
    Rejected,
    /// 响应报文格式错误
    Protocol,
}

impl Error {
    /// 创建新错误
    pub const fn new(kind: ErrorKind, message: &'static str) -> Self {
        Self { kind, message }
    }

    /// 创建带原因的错误（简化版，原因只写入日志）
    ///
    /// 注意：在 no_std 环境下无法保存 cause，只记录到 debug 日志
    pub fn with_cause(kind: ErrorKind, message: &'static str, cause: impl fmt::Debug) -> Self {
        log::debug!("{:?}: {} ({:?})", kind, message, cause);
        Self { kind, message }
    }

    /// 获取错误类型
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// 获取错误消息
    pub const fn message(&self) -> &'static str {
        self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof | std::io::ErrorKind::WriteZero => {
                Error::with_cause(ErrorKind::Io, "Transport closed mid-packet", err)
            }
            _ => Error::with_cause(ErrorKind::Io, "Transport I/O error", err),
        }
    }
}

/// Result 类型别名
pub type Result<T> = core::result::Result<T, Error>;
