//! 传输编解码层
//!
//! net/transport.rs 定义字节流接口 [`Transport`] 以及读满/写完循环
//! net/packet.rs 负责报文头的大端编解码和块负载的收发
//!
//! [`Connection`] 把两者组合成“一个操作码换一个状态码”的交换原语，
//! 设备阵列客户端只通过它接触远端。

mod packet;
mod transport;

pub use packet::{decode_header, encode_header, recv_packet, send_packet, Response};
#[cfg(feature = "std")]
pub use transport::StreamTransport;
pub use transport::Transport;

use crate::error::{Error, ErrorKind, Result};
use crate::types::{BlockBuf, Opcode};

/// 到设备阵列的连接
///
/// 持有传输对象，每次 [`exchange`](Connection::exchange) 发送一个请求并接收一个响应。
/// 传输失败后连接处于不确定状态，需要调用者重新连接。
pub struct Connection<T: Transport> {
    transport: T,
    /// 已完成的交换次数
    exchanges: u64,
}

impl<T: Transport> Connection<T> {
    /// 使用已建立的传输创建连接
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            exchanges: 0,
        }
    }

    /// 交换一个报文
    ///
    /// 写块请求从 `block` 取负载；响应若带负载则写回 `block`。
    /// 响应回显的操作码与请求不一致时返回 `Protocol` 错误。
    /// 状态码原样交给调用者判断。
    pub fn exchange(&mut self, opcode: Opcode, mut block: Option<&mut BlockBuf>) -> Result<Response> {
        send_packet(&mut self.transport, opcode, block.as_deref())?;
        let response = recv_packet(&mut self.transport, block.as_deref_mut())?;

        if response.opcode != opcode {
            log::warn!(
                "[NET] response opcode {:#010x} does not match request {:#010x}",
                response.opcode.raw(),
                opcode.raw()
            );
            return Err(Error::new(
                ErrorKind::Protocol,
                "Response opcode does not echo the request",
            ));
        }

        self.exchanges += 1;
        Ok(response)
    }

    /// 已完成的交换次数
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// 获取传输的引用
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// 获取传输的可变引用
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// 断开连接
    pub fn disconnect(mut self) -> Result<()> {
        log::debug!("[NET] disconnect after {} exchanges", self.exchanges);
        self.transport.close()
    }

    /// 取回传输对象（不关闭）
    pub fn into_transport(self) -> T {
        self.transport
    }
}

#[cfg(feature = "std")]
impl Connection<StreamTransport<std::net::TcpStream>> {
    /// 通过 TCP 连接到设备阵列服务器
    ///
    /// # 示例
    ///
    /// ```rust,ignore
    /// use mdadm_core::{consts::{JBOD_SERVER, JBOD_PORT}, Connection};
    ///
    /// let conn = Connection::connect((JBOD_SERVER, JBOD_PORT))?;
    /// ```
    pub fn connect<A: std::net::ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = std::net::TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        log::debug!("[NET] connected to {:?}", stream.peer_addr().ok());
        Ok(Self::new(StreamTransport::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::JBOD_BLOCK_SIZE;
    use crate::mock::MockJbod;
    use crate::types::Command;

    #[test]
    fn test_exchange_round_trip() {
        let mut conn = Connection::new(MockJbod::new());
        let resp = conn
            .exchange(Opcode::encode(Command::Mount, 0, 0), None)
            .unwrap();
        assert!(resp.is_ok());
        assert!(!resp.has_block);
        assert_eq!(conn.exchanges(), 1);
    }

    #[test]
    fn test_exchange_with_chunked_transport() {
        let mock = MockJbod::new().with_chunk(3);
        let handle = mock.handle();
        let mut conn = Connection::new(mock);

        conn.exchange(Opcode::encode(Command::Mount, 0, 0), None).unwrap();
        let mut block = [0x5Au8; JBOD_BLOCK_SIZE];
        conn.exchange(Opcode::encode(Command::WriteBlock, 0, 0), Some(&mut block))
            .unwrap();
        // 写块后远端磁头前移，读回前重新定位
        conn.exchange(Opcode::encode(Command::SeekToBlock, 0, 0), None)
            .unwrap();

        let mut back = [0u8; JBOD_BLOCK_SIZE];
        let resp = conn
            .exchange(Opcode::encode(Command::ReadBlock, 0, 0), Some(&mut back))
            .unwrap();
        assert!(resp.has_block);
        assert_eq!(back, [0x5Au8; JBOD_BLOCK_SIZE]);
        assert_eq!(handle.block(0, 0), [0x5Au8; JBOD_BLOCK_SIZE]);
    }

    #[test]
    fn test_exchange_rejects_mismatched_echo() {
        let mock = MockJbod::new();
        mock.handle().corrupt_next_echo();
        let mut conn = Connection::new(mock);
        let err = conn
            .exchange(Opcode::encode(Command::Mount, 0, 0), None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(conn.exchanges(), 0);
    }

    #[test]
    fn test_disconnect_closes_transport() {
        let mock = MockJbod::new();
        let handle = mock.handle();
        let conn = Connection::new(mock);
        conn.disconnect().unwrap();
        assert!(handle.is_closed());
    }
}
