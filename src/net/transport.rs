//! 字节流传输抽象
//!
//! 编解码层只依赖 [`Transport`]，因此核心库保持 `no_std`。

use crate::error::{Error, ErrorKind, Result};

/// 可靠字节流传输接口
///
/// 实现此 trait 以提供到远端设备阵列的连接。
/// 单次 `read`/`write` 允许只传输部分字节，完整报文由编解码层循环保证。
///
/// # 示例
///
/// ```rust,ignore
/// use mdadm_core::{Transport, Result};
///
/// struct MyLink {
///     // ...
/// }
///
/// impl Transport for MyLink {
///     fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
///         // 返回实际读取的字节数，0 表示对端关闭
///         Ok(0)
///     }
///
///     fn write(&mut self, buf: &[u8]) -> Result<usize> {
///         Ok(buf.len())
///     }
/// }
/// ```
pub trait Transport {
    /// 读取最多 `buf.len()` 字节
    ///
    /// # 返回
    ///
    /// 实际读取的字节数；返回 0 表示连接已关闭
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// 写入最多 `buf.len()` 字节
    ///
    /// # 返回
    ///
    /// 实际写入的字节数；返回 0 表示连接已关闭
    fn write(&mut self, buf: &[u8]) -> Result<usize>;

    /// 关闭连接
    ///
    /// 默认实现什么都不做
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// 读满 `buf`
///
/// 任何一次读取返回 0 都视为失败，不做部分恢复。
pub(crate) fn read_full<T: Transport + ?Sized>(transport: &mut T, buf: &mut [u8]) -> Result<()> {
    let mut done = 0;
    while done < buf.len() {
        let n = transport.read(&mut buf[done..])?;
        if n == 0 {
            log::warn!("[NET] short read: {}/{} bytes", done, buf.len());
            return Err(Error::new(ErrorKind::Io, "Short read from transport"));
        }
        done += n;
    }
    Ok(())
}

/// 写完 `buf`
pub(crate) fn write_full<T: Transport + ?Sized>(transport: &mut T, buf: &[u8]) -> Result<()> {
    let mut done = 0;
    while done < buf.len() {
        let n = transport.write(&buf[done..])?;
        if n == 0 {
            log::warn!("[NET] short write: {}/{} bytes", done, buf.len());
            return Err(Error::new(ErrorKind::Io, "Short write to transport"));
        }
        done += n;
    }
    Ok(())
}

#[cfg(feature = "std")]
mod stream {
    use super::Transport;
    use crate::error::Result;
    use std::io::{self, Read, Write};

    /// 基于 `std::io` 流的传输（通常是 `TcpStream`）
    pub struct StreamTransport<S> {
        stream: S,
    }

    impl<S: Read + Write> StreamTransport<S> {
        /// 包装一个流
        pub fn new(stream: S) -> Self {
            Self { stream }
        }

        /// 获取底层流的引用
        pub fn get_ref(&self) -> &S {
            &self.stream
        }

        /// 取回底层流
        pub fn into_inner(self) -> S {
            self.stream
        }
    }

    impl<S: Read + Write> Transport for StreamTransport<S> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            loop {
                match self.stream.read(buf) {
                    Ok(n) => return Ok(n),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        fn write(&mut self, buf: &[u8]) -> Result<usize> {
            loop {
                match self.stream.write(buf) {
                    Ok(n) => return Ok(n),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e.into()),
                }
            }
        }

        fn close(&mut self) -> Result<()> {
            self.stream.flush()?;
            Ok(())
        }
    }
}

#[cfg(feature = "std")]
pub use stream::StreamTransport;
